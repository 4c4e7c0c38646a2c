//! `FEAT` (spec.md §6): MUST enumerate EPSV, EPRT, MLSD, SIZE, MDTM, REST
//! STREAM, UTF8, and AUTH TLS / PBSZ / PROT when TLS is compiled in.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Feat;

#[async_trait]
impl CommandHandler for Feat {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut lines = vec!["Extensions supported:".to_string(), " EPSV".to_string(), " EPRT".to_string(), " MLSD".to_string(), " SIZE".to_string(), " MDTM".to_string(), " REST STREAM".to_string(), " UTF8".to_string()];
        if ctx.tls_available() {
            lines.push(" AUTH TLS".to_string());
            lines.push(" PBSZ".to_string());
            lines.push(" PROT".to_string());
        }
        lines.push("End".to_string());

        Ok(HandlerOutput::reply_only(Reply::multiline(ReplyCode::SYSTEM_STATUS, lines)))
    }
}

//! `PROT` (RFC 4217): `PROT P` enables TLS on the data channel for all
//! following transfers; `PROT C` disables it (spec.md §4.2). Per spec.md §9's
//! open question, this only updates session state — whether it actually
//! applies is decided at data-connection open time (`datachan::open`), not
//! retroactively to an already-negotiated PASV listener.

use crate::server::controlchan::command::ProtLevel;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Prot {
    pub level: ProtLevel,
}

#[async_trait]
impl CommandHandler for Prot {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        if self.level == ProtLevel::Private && !ctx.tls_available() {
            return Ok(HandlerOutput::reply_only(Reply::new(
                ReplyCode::COMMAND_NOT_IMPLEMENTED_FOR_PARAM,
                "TLS support is not configured",
            )));
        }

        let mut session = ctx.session.lock().await;
        session.data_tls = self.level == ProtLevel::Private;
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "PROT command successful")))
    }
}

//! `PBSZ` (RFC 4217): always replies 200, accepting any protection buffer
//! size since this server doesn't implement SSCN-style block-mode framing.
//! Required by spec.md §4.2 to be accepted after `AUTH TLS`.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Pbsz;

#[async_trait]
impl CommandHandler for Pbsz {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "PBSZ=0")))
    }
}

//! `ALLO` (RFC 959): historically reserved storage for the next STOR on
//! record-structured filesystems. Accepted and ignored, matching RFC 959's
//! own allowance that a server "may ignore" it on systems without that
//! need.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Allo;

#[async_trait]
impl CommandHandler for Allo {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::new(
            ReplyCode::COMMAND_SUPERFLUOUS,
            "ALLO not required",
        )))
    }
}

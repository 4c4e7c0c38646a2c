//! `MODE` (RFC 959): only stream mode (`S`) is supported.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Mode {
    pub code: String,
}

#[async_trait]
impl CommandHandler for Mode {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        if self.code == "S" {
            Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "Mode set to S")))
        } else {
            Ok(HandlerOutput::reply_only(Reply::new(
                ReplyCode::COMMAND_NOT_IMPLEMENTED_FOR_PARAM,
                "Only stream mode (S) is supported",
            )))
        }
    }
}

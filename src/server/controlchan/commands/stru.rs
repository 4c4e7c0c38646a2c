//! `STRU` (RFC 959): only file structure (`F`) is supported; anything else
//! (record, page) is 504, since this server exposes a plain byte stream.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Stru {
    pub code: String,
}

#[async_trait]
impl CommandHandler for Stru {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        if self.code == "F" {
            Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "Structure set to F")))
        } else {
            Ok(HandlerOutput::reply_only(Reply::new(
                ReplyCode::COMMAND_NOT_IMPLEMENTED_FOR_PARAM,
                "Only file structure (F) is supported",
            )))
        }
    }
}

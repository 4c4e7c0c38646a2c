//! `QUIT`: reply 221 and close the session.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Quit;

#[async_trait]
impl CommandHandler for Quit {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::quit(Reply::new(ReplyCode::CLOSING_CONTROL_CONNECTION, "Goodbye")))
    }
}

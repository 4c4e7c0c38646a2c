//! `NOOP`: accepted at any point, including during an active transfer
//! (spec.md §4.2: "continues to serve ... NOOP ... while the worker runs").

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Noop;

#[async_trait]
impl CommandHandler for Noop {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "NOOP ok")))
    }
}

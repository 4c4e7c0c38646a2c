//! `SYST`: always reports UNIX Type: L8, matching the numeric-UID/GID
//! listing style spec.md §4.4 mandates (no name-service dependency).

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Syst;

#[async_trait]
impl CommandHandler for Syst {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::SYSTEM_TYPE, "UNIX Type: L8")))
    }
}

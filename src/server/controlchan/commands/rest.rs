//! `REST` (spec.md §3, §8): sets a one-shot byte offset applied to the next
//! RETR/STOR/APPE, cleared after use or by any other transfer-unrelated
//! command.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Rest {
    pub offset: u64,
}

#[async_trait]
impl CommandHandler for Rest {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        if let Err(r) = super::require_login(&session) {
            return Ok(HandlerOutput::reply_only(r));
        }
        session.rest_offset = Some(self.offset);
        Ok(HandlerOutput::reply_only(Reply::new(
            ReplyCode::NEED_RNTO,
            format!("Restarting at {}. Send STOR or RETR to initiate transfer", self.offset),
        )))
    }
}

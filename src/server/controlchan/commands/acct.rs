//! `ACCT`: accepted syntactically (RFC 959 requires the verb exist) but this
//! server has no notion of a secondary account password, so it always
//! replies that no account is needed.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Acct;

#[async_trait]
impl CommandHandler for Acct {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_SUPERFLUOUS, "ACCT not required")))
    }
}

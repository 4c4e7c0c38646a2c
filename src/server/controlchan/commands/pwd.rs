//! `PWD` (spec.md §4.2): replies 257 with the virtual cwd, quoted per
//! RFC 959's convention of doubling embedded quotes.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Pwd;

#[async_trait]
impl CommandHandler for Pwd {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let session = ctx.session.lock().await;
        if let Err(r) = super::require_login(&session) {
            return Ok(HandlerOutput::reply_only(r));
        }
        let quoted = session.cwd.replace('"', "\"\"");
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::PATHNAME_CREATED, format!("\"{}\" is the current directory", quoted))))
    }
}

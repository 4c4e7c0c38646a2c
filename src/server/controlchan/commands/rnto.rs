//! `RNTO` (spec.md §4.2, §8): valid only immediately after `RNFR`; any
//! intervening command clears the pending source, so this sees `None` and
//! replies 503.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Rnto {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Rnto {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };
        if let Some(r) = super::account_read_only(&user) {
            return Ok(HandlerOutput::reply_only(r));
        }

        let source = match session.rename_from.take() {
            Some(p) => p,
            None => return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::BAD_SEQUENCE, "RNFR required first"))),
        };

        let resolver = super::resolver(&root);
        let dest = match resolver.resolve(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };

        match std::fs::rename(&source, &dest) {
            Ok(()) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_ACTION_OKAY, "Rename successful"))),
            Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Rename failed"))),
        }
    }
}

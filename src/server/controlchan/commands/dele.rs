//! `DELE` (spec.md §4.2): resolves through PathResolver; read-only users get
//! 550 on any mutating command.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Dele {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Dele {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };
        if let Some(r) = super::account_read_only(&user) {
            return Ok(HandlerOutput::reply_only(r));
        }

        let resolver = super::resolver(&root);
        let resolved = match resolver.resolve_existing(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };
        session.rename_from = None;

        match std::fs::remove_file(&resolved) {
            Ok(()) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_ACTION_OKAY, "File deleted"))),
            Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Could not delete file"))),
        }
    }
}

//! `CWD`/`XCWD` (spec.md §4.2): resolve via PathResolver and stat the
//! target: missing → 550, not a directory → 550, success → update cwd, 250.

use crate::fs::PathResolver;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Cwd {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Cwd {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (_user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };

        let resolver = super::resolver(&root);
        let resolved = match resolver.resolve_existing(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };
        if !resolved.is_dir() {
            return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Not a directory")));
        }

        let new_cwd = match PathResolver::normalize_virtual(&session.cwd, &self.path) {
            Ok(v) => v,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };
        session.cwd = new_cwd;
        session.rename_from = None;
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_ACTION_OKAY, "Directory successfully changed")))
    }
}

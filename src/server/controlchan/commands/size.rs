//! `SIZE` (RFC 3659, spec.md §4.2/§6): replies 213 with the file's size in
//! bytes. Binary-mode size; ASCII-mode size after CRLF translation is left
//! unspecified by RFC 3659 and not computed here.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Size {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Size {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let session = ctx.session.lock().await;
        let (_user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };

        let resolver = super::resolver(&root);
        let resolved = match resolver.resolve_existing(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };

        if resolved.is_dir() {
            return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "SIZE not allowed on a directory")));
        }

        match std::fs::metadata(&resolved) {
            Ok(meta) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_STATUS, meta.len().to_string()))),
            Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Could not stat file"))),
        }
    }
}

//! `MKD`/`XMKD` (spec.md §4.2): resolves through PathResolver; creates a
//! new directory, replying 257 with its (quoted) pathname on success.

use crate::fs::PathResolver;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Mkd {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Mkd {
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
        let host_path = match resolver.resolve(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };
        session.rename_from = None;

        match std::fs::create_dir(&host_path) {
            Ok(()) => {
                let virtual_path = PathResolver::normalize_virtual(&session.cwd, &self.path).unwrap_or_default();
                let quoted = virtual_path.replace('"', "\"\"");
                Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::PATHNAME_CREATED, format!("\"{}\" created", quoted))))
            }
            Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Could not create directory"))),
        }
    }
}

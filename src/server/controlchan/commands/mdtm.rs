//! `MDTM` (RFC 3659): replies 213 with the file's modification time,
//! `YYYYMMDDHHMMSS` in UTC, matching the `modify` fact DirectoryLister
//! produces for MLSD.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct Mdtm {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Mdtm {
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

        match std::fs::metadata(&resolved).and_then(|m| m.modified()) {
            Ok(mtime) => {
                let dt: DateTime<Utc> = mtime.into();
                Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_STATUS, dt.format("%Y%m%d%H%M%S").to_string())))
            }
            Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Could not stat file"))),
        }
    }
}

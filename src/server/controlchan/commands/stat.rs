//! `STAT` (spec.md §4.2: one of the commands interleaved with an active
//! transfer: "continues to serve ... STAT ... while the worker runs").
//! Without an argument, reports session status (211 multiline). With one,
//! behaves like `LIST`/stat over the control connection (212/213).

use crate::fs::directory_lister;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Stat {
    pub path: Option<String>,
}

#[async_trait]
impl CommandHandler for Stat {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let session = ctx.session.lock().await;

        let path = match &self.path {
            Some(p) => p.clone(),
            None => {
                let lines = vec![
                    "FTP server status:".to_string(),
                    format!(" Connected from {}", session.peer_addr),
                    match session.user() {
                        Some(u) => format!(" Logged in as {}", u.name),
                        None => " Not logged in".to_string(),
                    },
                    format!(" TYPE: {}", if session.transfer_mode == crate::transfer::TransferMode::Ascii { "ASCII" } else { "Binary" }),
                    format!(" Active transfer: {}", session.has_active_transfer()),
                    "End of status".to_string(),
                ];
                return Ok(HandlerOutput::reply_only(Reply::multiline(ReplyCode::SYSTEM_STATUS, lines)));
            }
        };

        let (_user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };
        let resolver = super::resolver(&root);
        let resolved = match resolver.resolve_existing(&session.cwd, &path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };

        if resolved.is_dir() {
            match directory_lister::list_dir(&resolved, false) {
                Ok(entries) => {
                    let listing = directory_lister::format_list(&entries, chrono::Utc::now());
                    let mut lines: Vec<String> = vec!["Status follows:".to_string()];
                    lines.extend(listing.lines().map(|l| format!(" {}", l)));
                    lines.push("End of status".to_string());
                    Ok(HandlerOutput::reply_only(Reply::multiline(ReplyCode::DIRECTORY_STATUS, lines)))
                }
                Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::LOCAL_ERROR, "Could not list directory"))),
            }
        } else {
            match std::fs::metadata(&resolved) {
                Ok(meta) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_STATUS, format!("{} bytes", meta.len())))),
                Err(_) => Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "No such file"))),
            }
        }
    }
}

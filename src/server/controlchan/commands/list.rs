//! `LIST` (spec.md §4.2, §4.4): Unix-style long listing of a directory (or,
//! if the argument names a file, a listing containing just that entry).

use crate::fs::directory_lister;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::datachan;
use crate::server::session::WorkerHandle;
use crate::transfer::{self, CancelFlag};
use async_trait::async_trait;
use tokio::sync::oneshot;

pub struct List {
    pub path: Option<String>,
}

#[async_trait]
impl CommandHandler for List {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (_user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };
        if session.has_active_transfer() {
            return Ok(HandlerOutput::reply_only(super::transfer_already_active()));
        }

        let target = match super::resolve_listing_target(&session, &root, &self.path) {
            Ok(p) => p,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };

        let entries = if target.is_dir() {
            match directory_lister::list_dir(&target, false) {
                Ok(e) => e,
                Err(_) => return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::LOCAL_ERROR, "Could not read directory"))),
            }
        } else {
            let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            match std::fs::metadata(&target) {
                Ok(metadata) => vec![directory_lister::Entry { name, metadata }],
                Err(_) => return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "No such file or directory"))),
            }
        };
        let listing = directory_lister::format_list(&entries, chrono::Utc::now()).into_bytes();

        let stream = match datachan::open(&mut session, ctx.config.passive_accept_timeout(), ctx.tls_acceptor.as_deref()).await {
            Ok(s) => s,
            Err(e) => return Ok(HandlerOutput::reply_only(super::data_channel_error_reply(e))),
        };

        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let (done_tx, done_rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            let outcome = transfer::send_listing(&listing, stream, worker_cancel).await;
            let _ = done_tx.send(outcome);
        });
        session.worker = Some(WorkerHandle { cancel, join });

        Ok(HandlerOutput::transfer(Reply::new(ReplyCode::OPENING_DATA_CONNECTION, "Opening data connection for LIST"), done_rx))
    }
}

//! `MLSD` (RFC 3659, spec.md §4.2/§4.4): `fact1=val1;fact2=val2; name`
//! listing lines with the `type`/`size`/`modify`/`perm` facts.

use crate::fs::directory_lister;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::datachan;
use crate::server::session::WorkerHandle;
use crate::transfer::{self, CancelFlag};
use async_trait::async_trait;
use tokio::sync::oneshot;

pub struct Mlsd {
    pub path: Option<String>,
}

#[async_trait]
impl CommandHandler for Mlsd {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (user, root) = match super::require_login(&session) {
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
        if !target.is_dir() {
            return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "MLSD requires a directory")));
        }

        let entries = match directory_lister::list_dir(&target, false) {
            Ok(e) => e,
            Err(_) => return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::LOCAL_ERROR, "Could not read directory"))),
        };
        let listing = directory_lister::format_mlsd(&entries, user.read_only).into_bytes();

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

        Ok(HandlerOutput::transfer(Reply::new(ReplyCode::OPENING_DATA_CONNECTION, "Opening data connection for MLSD"), done_rx))
    }
}

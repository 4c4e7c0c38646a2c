//! `RETR` (spec.md §4.2, §4.5): obtains a connected data socket, upgrades it
//! to TLS if `PROT P` is in effect, spawns a [`TransferEngine`] worker, and
//! replies 150 while the control loop keeps serving ABOR/STAT/NOOP/QUIT.
//!
//! [`TransferEngine`]: crate::transfer

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::datachan;
use crate::server::session::WorkerHandle;
use crate::transfer::{self, CancelFlag};
use async_trait::async_trait;
use tokio::sync::oneshot;

pub struct Retr {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Retr {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (_user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };
        if session.has_active_transfer() {
            return Ok(HandlerOutput::reply_only(super::transfer_already_active()));
        }

        let resolver = super::resolver(&root);
        let resolved = match resolver.resolve_existing(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };
        if resolved.is_dir() {
            return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Not a regular file")));
        }

        let offset = session.rest_offset.take().unwrap_or(0);
        let mode = session.transfer_mode;

        let stream = match datachan::open(&mut session, ctx.config.passive_accept_timeout(), ctx.tls_acceptor.as_deref()).await {
            Ok(s) => s,
            Err(e) => return Ok(HandlerOutput::reply_only(super::data_channel_error_reply(e))),
        };

        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let (done_tx, done_rx) = oneshot::channel();
        let metrics_enabled = ctx.metrics_enabled;
        let join = tokio::spawn(async move {
            let outcome = transfer::retrieve(&resolved, offset, mode, stream, worker_cancel).await;
            if metrics_enabled {
                if let transfer::TransferOutcome::Completed(n) = &outcome {
                    crate::metrics::handle().transfer_bytes_total.with_label_values(&["download"]).inc_by(*n);
                }
            }
            let _ = done_tx.send(outcome);
        });
        session.worker = Some(WorkerHandle { cancel, join });

        Ok(HandlerOutput::transfer(Reply::new(ReplyCode::OPENING_DATA_CONNECTION, "Opening data connection for RETR"), done_rx))
    }
}

//! `APPE` (spec.md §4.2, §4.5): like `STOR` but appends to an existing
//! file instead of truncating it.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::datachan;
use crate::server::session::WorkerHandle;
use crate::transfer::{self, CancelFlag, WriteKind};
use async_trait::async_trait;
use tokio::sync::oneshot;

pub struct Appe {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Appe {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        let (user, root) = match super::require_login(&session) {
            Ok(v) => v,
            Err(r) => return Ok(HandlerOutput::reply_only(r)),
        };
        if let Some(r) = super::account_read_only(&user) {
            return Ok(HandlerOutput::reply_only(r));
        }
        if session.has_active_transfer() {
            return Ok(HandlerOutput::reply_only(super::transfer_already_active()));
        }

        let resolver = super::resolver(&root);
        let dest = match resolver.resolve(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };
        session.rest_offset = None;

        let mode = session.transfer_mode;
        let ownership = user.ownership_override.map(|o| (o.uid, o.gid));

        let stream = match datachan::open(&mut session, ctx.config.passive_accept_timeout(), ctx.tls_acceptor.as_deref()).await {
            Ok(s) => s,
            Err(e) => return Ok(HandlerOutput::reply_only(super::data_channel_error_reply(e))),
        };

        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let (done_tx, done_rx) = oneshot::channel();
        let metrics_enabled = ctx.metrics_enabled;
        let join = tokio::spawn(async move {
            let outcome = transfer::store(&dest, WriteKind::Append, mode, stream, worker_cancel, ownership).await;
            if metrics_enabled {
                if let transfer::TransferOutcome::Completed(n) = &outcome {
                    crate::metrics::handle().transfer_bytes_total.with_label_values(&["upload"]).inc_by(*n);
                }
            }
            let _ = done_tx.send(outcome);
        });
        session.worker = Some(WorkerHandle { cancel, join });

        Ok(HandlerOutput::transfer(Reply::new(ReplyCode::OPENING_DATA_CONNECTION, "Opening data connection for APPE"), done_rx))
    }
}

//! `STOU` (spec.md §4.2, §4.5, §9): stores into a synthesized non-conflicting
//! unique name in the current directory. Replies 150 with the chosen name
//! in the text, per convention (clients that care parse it out of the
//! reply rather than out of band). After 100 failed attempts, 450 (spec.md
//! §9's suggested resolution of an otherwise-silent source).

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::datachan;
use crate::server::session::WorkerHandle;
use crate::transfer::{self, CancelFlag, WriteKind};
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Base filename `STOU` synthesizes against, since the command itself
/// carries no client-supplied name (spec.md §4.2 lists `STOU` with no
/// argument, unlike `STOR`).
const STOU_BASE_NAME: &str = "ftp";

pub struct Stou;

#[async_trait]
impl CommandHandler for Stou {
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
        let dir = resolver.to_host_path(&session.cwd);
        let dest = match transfer::unique_name(&dir, STOU_BASE_NAME) {
            Some(p) => p,
            None => return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::FILE_UNAVAILABLE_TRANSIENT, "Could not allocate a unique filename"))),
        };
        session.rest_offset = None;

        let mode = session.transfer_mode;
        let ownership = user.ownership_override.map(|o| (o.uid, o.gid));
        let reported_name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let stream = match datachan::open(&mut session, ctx.config.passive_accept_timeout(), ctx.tls_acceptor.as_deref()).await {
            Ok(s) => s,
            Err(e) => return Ok(HandlerOutput::reply_only(super::data_channel_error_reply(e))),
        };

        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let (done_tx, done_rx) = oneshot::channel();
        let metrics_enabled = ctx.metrics_enabled;
        let join = tokio::spawn(async move {
            let outcome = transfer::store(&dest, WriteKind::Store, mode, stream, worker_cancel, ownership).await;
            if metrics_enabled {
                if let transfer::TransferOutcome::Completed(n) = &outcome {
                    crate::metrics::handle().transfer_bytes_total.with_label_values(&["upload"]).inc_by(*n);
                }
            }
            let _ = done_tx.send(outcome);
        });
        session.worker = Some(WorkerHandle { cancel, join });

        Ok(HandlerOutput::transfer(
            Reply::new(ReplyCode::OPENING_DATA_CONNECTION, format!("FILE: {}", reported_name)),
            done_rx,
        ))
    }
}

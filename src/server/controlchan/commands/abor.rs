//! `ABOR` (spec.md §4.2, §8 scenario 6): cancels an in-flight transfer.
//! When a worker is active, its own 426 completion reply must reach the
//! client before this handler's 226, so the session keeps the worker handle
//! alive here and signals `wait_for_abort` for the control loop to order the
//! two replies; only QUIT/STAT/NOOP may otherwise be handled before a
//! transfer completes (spec.md §4.2).

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Abor;

#[async_trait]
impl CommandHandler for Abor {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let session = ctx.session.lock().await;
        let had_worker = session.has_active_transfer();
        if let Some(worker) = &session.worker {
            worker.abort();
        }
        drop(session);

        Ok(HandlerOutput::abort_wait(
            Reply::new(ReplyCode::CLOSING_DATA_CONNECTION, "ABOR OK"),
            had_worker,
        ))
    }
}

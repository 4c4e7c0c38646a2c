//! `RNFR` (spec.md §4.2, §8): records the resolved source; only RNTO is a
//! valid next command that uses it — any other command clears it (enforced
//! centrally by the control loop, see `ftpserver::run_session`).

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Rnfr {
    pub path: String,
}

#[async_trait]
impl CommandHandler for Rnfr {
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
        let resolved = match resolver.resolve_existing(&session.cwd, &self.path) {
            Ok(p) => p,
            Err(e) => return Ok(HandlerOutput::reply_only(super::path_error_reply(e))),
        };

        session.rename_from = Some(resolved);
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::NEED_RNTO, "Ready for RNTO")))
    }
}

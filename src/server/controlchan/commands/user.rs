//! `USER` (spec.md §4.2): `USER u` → if currently Authenticated, reset to
//! AwaitPass(u); else enter AwaitPass(u); reply 331.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::session::AuthState;
use async_trait::async_trait;

pub struct User {
    pub username: String,
}

#[async_trait]
impl CommandHandler for User {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;

        if ctx.config.force_tls && !session.control_tls {
            return Ok(HandlerOutput::reply_only(super::tls_required_for_user()));
        }

        session.auth_state = AuthState::AwaitPass(self.username.clone());
        session.rename_from = None;
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::NEED_PASSWORD, "Please specify the password")))
    }
}

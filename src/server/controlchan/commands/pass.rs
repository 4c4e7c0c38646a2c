//! `PASS` (spec.md §4.2): only valid in AwaitPass; `AuthGate.verify(user,
//! p, peer)`. Success → Authenticated, 230, cwd := user.home. Failure →
//! AwaitUser, 530, increment FailureCounter; if the peer just crossed the
//! bruteforce cap, close the session (spec.md §8 scenario 4).

use crate::auth::Outcome;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::session::AuthState;
use async_trait::async_trait;

pub struct Pass {
    pub password: String,
}

#[async_trait]
impl CommandHandler for Pass {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let (username, peer_ip) = {
            let session = ctx.session.lock().await;
            match &session.auth_state {
                AuthState::AwaitPass(u) => (u.clone(), session.peer_ip()),
                _ => {
                    return Ok(HandlerOutput::reply_only(Reply::new(
                        ReplyCode::BAD_SEQUENCE,
                        "Login with USER first",
                    )))
                }
            }
        };

        let outcome = ctx.auth_gate.verify(&username, &self.password, peer_ip).await;

        let mut session = ctx.session.lock().await;
        match outcome {
            Outcome::Success(account) => {
                session.cwd = "/".to_string();
                session.user_root = Some(account.home.clone());
                session.auth_state = AuthState::Authenticated(account);
                Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::USER_LOGGED_IN, "Login successful")))
            }
            Outcome::BadCredentials => {
                session.auth_state = AuthState::AwaitUser;
                let reply = Reply::new(ReplyCode::NOT_LOGGED_IN, "Login incorrect");
                if ctx.auth_gate.is_peer_blocked(peer_ip) {
                    Ok(HandlerOutput::quit(reply))
                } else {
                    Ok(HandlerOutput::reply_only(reply))
                }
            }
            Outcome::Blocked => {
                session.auth_state = AuthState::AwaitUser;
                Ok(HandlerOutput::quit(Reply::new(ReplyCode::NOT_LOGGED_IN, "Login incorrect")))
            }
        }
    }
}

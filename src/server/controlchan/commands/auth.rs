//! `AUTH TLS` (spec.md §4.2, RFC 4217): if TLS is enabled, reply 234 and
//! signal the control loop to upgrade the stream. The upgrade itself
//! happens between command lines (spec.md §4.7), so the handler only flips
//! `request_tls_upgrade`; [`super::super::super::ftpserver`] does the rest.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Auth;

#[async_trait]
impl CommandHandler for Auth {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        if !ctx.tls_available() {
            return Ok(HandlerOutput::reply_only(Reply::new(
                ReplyCode::COMMAND_NOT_IMPLEMENTED_FOR_PARAM,
                "TLS support is not configured",
            )));
        }

        let session = ctx.session.lock().await;
        if session.control_tls {
            return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::BAD_SEQUENCE, "Already using TLS")));
        }
        drop(session);

        // The control loop performs the handshake and sets `control_tls`
        // only once it actually succeeds (see `ftpserver::run_session`).
        Ok(HandlerOutput::tls_upgrade(Reply::new(
            ReplyCode::AUTH_OK_UPGRADE,
            "AUTH TLS successful, initiating TLS handshake",
        )))
    }
}

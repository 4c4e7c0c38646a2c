//! `CCC` (RFC 4217 Clear Command Channel): downgrading an already-negotiated
//! TLS control stream back to plaintext in place isn't supported by the TLS
//! library this crate uses (spec.md §4.7 only specifies the plaintext→TLS
//! direction). Accepted syntactically but always replies not-implemented.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Ccc;

#[async_trait]
impl CommandHandler for Ccc {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::new(
            ReplyCode::COMMAND_NOT_IMPLEMENTED,
            "CCC is not supported",
        )))
    }
}

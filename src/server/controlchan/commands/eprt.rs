//! `EPRT` (RFC 2428): same as PORT, but the address may be IPv4 or IPv6.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::session::DataChannelIntent;
use async_trait::async_trait;
use std::net::SocketAddr;

pub struct Eprt {
    pub addr: SocketAddr,
}

#[async_trait]
impl CommandHandler for Eprt {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        if let Err(r) = super::require_login(&session) {
            return Ok(HandlerOutput::reply_only(r));
        }

        session.discard_data_intent();
        session.data_intent = DataChannelIntent::Active { peer_addr: self.addr };
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "EPRT command successful")))
    }
}

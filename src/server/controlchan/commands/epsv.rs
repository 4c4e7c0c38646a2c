//! `EPSV` (RFC 2428, spec.md §4.2): opens the same kind of listener as
//! PASV, on whichever address family the control connection itself uses,
//! and replies 229 with `|||port|`.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::session::{DataChannelIntent, PassivePortGuard};
use async_trait::async_trait;
use tokio::net::TcpListener;

pub struct Epsv;

#[async_trait]
impl CommandHandler for Epsv {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mut session = ctx.session.lock().await;
        if let Err(r) = super::require_login(&session) {
            return Ok(HandlerOutput::reply_only(r));
        }

        let bind_ip = ctx.local_addr.ip();
        let (std_listener, port) = match ctx.port_allocator.acquire(bind_ip) {
            Some(v) => v,
            None => return Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::CANT_OPEN_DATA_CONNECTION, "No passive ports available"))),
        };
        std_listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(std_listener)?;

        session.discard_data_intent();
        session.passive_port_guard = Some(PassivePortGuard::new(port, ctx.port_allocator.clone()));
        session.data_intent = DataChannelIntent::Passive { listener, port };

        Ok(HandlerOutput::reply_only(Reply::new(
            ReplyCode::ENTERING_EXTENDED_PASSIVE_MODE,
            format!("Entering Extended Passive Mode (|||{}|)", port),
        )))
    }
}

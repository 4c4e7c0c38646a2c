//! `PASV` (spec.md §4.2, §4.8): opens a TCP listener on a PortAllocator-
//! provided port on the server's primary (or configured NAT) IPv4 address;
//! replies 227 with the `(h1,h2,h3,h4,p1,p2)` tuple.
//!
//! Grounded on the PASV handling pattern shown in
//! `other_examples/147d7430_bolcom-libunftp__src-server-commands-pasv.rs.rs`.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::session::{DataChannelIntent, PassivePortGuard};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use tokio::net::TcpListener;

pub struct Pasv;

#[async_trait]
impl CommandHandler for Pasv {
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

        let report_ip = match ctx.config.nat_ip {
            Some(IpAddr::V4(v4)) => v4,
            _ => match bind_ip {
                IpAddr::V4(v4) => v4,
                IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
            },
        };
        let [h1, h2, h3, h4] = report_ip.octets();
        let p1 = (port >> 8) as u8;
        let p2 = (port & 0xff) as u8;

        Ok(HandlerOutput::reply_only(Reply::new(
            ReplyCode::ENTERING_PASSIVE_MODE,
            format!("Entering Passive Mode ({},{},{},{},{},{})", h1, h2, h3, h4, p1, p2),
        )))
    }
}

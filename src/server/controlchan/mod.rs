//! SessionFSM (spec.md §4.2): owns the control stream, reads CRLF-terminated
//! command lines, dispatches each to a [`CommandHandler`], and interleaves
//! ABOR/STAT/NOOP/QUIT with a running transfer worker's completion.
//!
//! Grounded on `libunftp`'s `server::ftpserver::Server::handle_command`
//! dispatch match and its per-connection task in `listen()`/`process()`,
//! generalized from an `InternalMsg` channel + generic `StorageBackend` to
//! this crate's concrete oneshot completion channel (spec.md §4.5) and
//! filesystem (spec.md §1 Non-goals).

pub mod codec;
pub mod command;
pub mod commands;
pub mod error;
pub mod handler;
pub mod parse_error;
pub mod reply;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::server::net::PortAllocator;
use crate::server::session::{Session, SharedSession};
use crate::server::tls::MaybeTlsStream;
use crate::transfer::TransferOutcome;
use codec::FTPCodec;
use command::Command;
use error::{ControlChanError, ControlChanErrorKind};
use futures::{SinkExt, StreamExt};
use handler::{CommandContext, CommandHandler};
use log::{debug, info, warn};
use reply::{Reply, ReplyCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_native_tls::TlsAcceptor;
use tokio_util::codec::{Framed, FramedParts};

/// Maps one parsed [`Command`] to the [`CommandHandler`] that carries it
/// out. Mirrors `libunftp`'s `Command::Retr{..} => Box::new(commands::Retr)`
/// dispatch table (`server/ftpserver.rs`), one arm per verb.
fn build_handler(cmd: Command) -> Box<dyn CommandHandler> {
    match cmd {
        Command::User { username } => Box::new(commands::user::User { username }),
        Command::Pass { password } => Box::new(commands::pass::Pass { password }),
        Command::Auth => Box::new(commands::auth::Auth),
        Command::Pbsz => Box::new(commands::pbsz::Pbsz),
        Command::Ccc => Box::new(commands::ccc::Ccc),
        Command::Prot { level } => Box::new(commands::prot::Prot { level }),
        Command::Quit => Box::new(commands::quit::Quit),
        Command::Feat => Box::new(commands::feat::Feat),
        Command::Help => Box::new(commands::help::Help),
        Command::Noop => Box::new(commands::noop::Noop),
        Command::Syst => Box::new(commands::syst::Syst),
        Command::Stat { path } => Box::new(commands::stat::Stat { path }),
        Command::Acct => Box::new(commands::acct::Acct),
        Command::Pwd => Box::new(commands::pwd::Pwd),
        Command::Cwd { path } => Box::new(commands::cwd::Cwd { path }),
        Command::Cdup => Box::new(commands::cdup::Cdup),
        Command::Type { kind } => Box::new(commands::type_::Type { kind }),
        Command::Stru { code } => Box::new(commands::stru::Stru { code }),
        Command::Mode { code } => Box::new(commands::mode::Mode { code }),
        Command::Pasv => Box::new(commands::pasv::Pasv),
        Command::Epsv => Box::new(commands::epsv::Epsv),
        Command::Port { addr } => Box::new(commands::port::Port { addr }),
        Command::Eprt { addr } => Box::new(commands::eprt::Eprt { addr }),
        Command::Retr { path } => Box::new(commands::retr::Retr { path }),
        Command::Stor { path } => Box::new(commands::stor::Stor { path }),
        Command::Stou => Box::new(commands::stou::Stou),
        Command::Appe { path } => Box::new(commands::appe::Appe { path }),
        Command::List { path } => Box::new(commands::list::List { path }),
        Command::Nlst { path } => Box::new(commands::nlst::Nlst { path }),
        Command::Mlsd { path } => Box::new(commands::mlsd::Mlsd { path }),
        Command::Dele { path } => Box::new(commands::dele::Dele { path }),
        Command::Rmd { path } => Box::new(commands::rmd::Rmd { path }),
        Command::Mkd { path } => Box::new(commands::mkd::Mkd { path }),
        Command::Rnfr { path } => Box::new(commands::rnfr::Rnfr { path }),
        Command::Rnto { path } => Box::new(commands::rnto::Rnto { path }),
        Command::Size { path } => Box::new(commands::size::Size { path }),
        Command::Mdtm { path } => Box::new(commands::mdtm::Mdtm { path }),
        Command::Rest { offset } => Box::new(commands::rest::Rest { offset }),
        Command::Abor => Box::new(commands::abor::Abor),
        Command::Allo => Box::new(commands::allo::Allo),
    }
}

/// spec.md §4.2's authentication sub-machine allowlist, extended with
/// `PBSZ`/`PROT` — the spec's prose names only USER/PASS/AUTH/QUIT/FEAT/
/// HELP/NOOP/SYST, but also requires "PBSZ 0 must be accepted" right after
/// `AUTH TLS`, which in the conventional explicit-FTPS handshake
/// (AUTH TLS, PBSZ 0, PROT P, *then* USER/PASS over the encrypted channel)
/// happens before login. Decided here and recorded in DESIGN.md.
fn allowed_before_login(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::User { .. }
            | Command::Pass { .. }
            | Command::Auth
            | Command::Pbsz
            | Command::Prot { .. }
            | Command::Quit
            | Command::Feat
            | Command::Help
            | Command::Noop
            | Command::Syst
    )
}

/// spec.md §5: only this set may be processed while a transfer worker runs.
fn allowed_during_transfer(cmd: &Command) -> bool {
    matches!(cmd, Command::Abor | Command::Stat { .. } | Command::Noop | Command::Quit)
}

fn verb_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::User { .. } => "USER",
        Command::Pass { .. } => "PASS",
        Command::Auth => "AUTH",
        Command::Pbsz => "PBSZ",
        Command::Ccc => "CCC",
        Command::Prot { .. } => "PROT",
        Command::Quit => "QUIT",
        Command::Feat => "FEAT",
        Command::Help => "HELP",
        Command::Noop => "NOOP",
        Command::Syst => "SYST",
        Command::Stat { .. } => "STAT",
        Command::Acct => "ACCT",
        Command::Pwd => "PWD",
        Command::Cwd { .. } => "CWD",
        Command::Cdup => "CDUP",
        Command::Type { .. } => "TYPE",
        Command::Stru { .. } => "STRU",
        Command::Mode { .. } => "MODE",
        Command::Pasv => "PASV",
        Command::Epsv => "EPSV",
        Command::Port { .. } => "PORT",
        Command::Eprt { .. } => "EPRT",
        Command::Retr { .. } => "RETR",
        Command::Stor { .. } => "STOR",
        Command::Stou => "STOU",
        Command::Appe { .. } => "APPE",
        Command::List { .. } => "LIST",
        Command::Nlst { .. } => "NLST",
        Command::Mlsd { .. } => "MLSD",
        Command::Dele { .. } => "DELE",
        Command::Rmd { .. } => "RMD",
        Command::Mkd { .. } => "MKD",
        Command::Rnfr { .. } => "RNFR",
        Command::Rnto { .. } => "RNTO",
        Command::Size { .. } => "SIZE",
        Command::Mdtm { .. } => "MDTM",
        Command::Rest { .. } => "REST",
        Command::Abor => "ABOR",
        Command::Allo => "ALLO",
    }
}

/// spec.md §7's ProtocolError taxonomy, rendered onto the wire. `LineTooLong`
/// is the only kind fatal to the session (spec.md §4.2: "oversize lines
/// close the session with 500").
fn control_chan_error_reply(err: &ControlChanError) -> (Reply, bool) {
    match err.kind() {
        ControlChanErrorKind::UnknownCommand { command } => (Reply::new(ReplyCode::COMMAND_SYNTAX_ERROR, format!("'{}' not understood", command)), false),
        ControlChanErrorKind::InvalidCommand => (Reply::new(ReplyCode::PARAMETER_SYNTAX_ERROR, "Invalid number or type of parameters"), false),
        ControlChanErrorKind::Utf8Error => (Reply::new(ReplyCode::COMMAND_SYNTAX_ERROR, "Command contains invalid UTF-8"), false),
        ControlChanErrorKind::LineTooLong => (Reply::new(ReplyCode::COMMAND_SYNTAX_ERROR, "Command line too long"), true),
        ControlChanErrorKind::IoError | ControlChanErrorKind::InternalServerError | ControlChanErrorKind::AuthenticationError | ControlChanErrorKind::ControlChannelTimeout => {
            (Reply::new(ReplyCode::LOCAL_ERROR, "Internal server error"), true)
        }
    }
}

/// spec.md §7: "IOError on data transfer -> 426 if mid-transfer aborted,
/// 451 if local, 550 if file". We can't always distinguish "local" from
/// "file" from an `io::Error` alone, so a `NotFound` is reported as the
/// file-related 550 and anything else as the local 451.
fn transfer_outcome_reply(outcome: TransferOutcome) -> Reply {
    match outcome {
        TransferOutcome::Completed(_) => Reply::new(ReplyCode::CLOSING_DATA_CONNECTION, "Transfer complete"),
        TransferOutcome::Aborted => Reply::new(ReplyCode::CONNECTION_CLOSED_TRANSFER_ABORTED, "Connection closed; transfer aborted"),
        TransferOutcome::Error(e) if e.kind() == std::io::ErrorKind::NotFound => Reply::new(ReplyCode::FILE_UNAVAILABLE, "File unavailable"),
        TransferOutcome::Error(_) => Reply::new(ReplyCode::LOCAL_ERROR, "Local error in processing"),
    }
}

/// Everything a freshly accepted control connection needs to run its
/// session loop to completion (spec.md §4.2). Spawned once per connection
/// by [`crate::server::Server::listen_until`]; a panic inside only tears
/// down this task, never another session's (spec.md §7: "A per-session
/// panic/abort must not crash other sessions").
#[allow(clippy::too_many_arguments)]
pub async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    config: Arc<Config>,
    auth_gate: Arc<AuthGate>,
    port_allocator: Arc<PortAllocator>,
    tls_acceptor: Option<Arc<TlsAcceptor>>,
    metrics_enabled: bool,
) {
    if metrics_enabled {
        crate::metrics::handle().sessions_active.inc();
    }
    run_session_inner(stream, peer_addr, local_addr, config, auth_gate, port_allocator, tls_acceptor, metrics_enabled).await;
    if metrics_enabled {
        crate::metrics::handle().sessions_active.dec();
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_session_inner(
    stream: TcpStream,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    config: Arc<Config>,
    auth_gate: Arc<AuthGate>,
    port_allocator: Arc<PortAllocator>,
    tls_acceptor: Option<Arc<TlsAcceptor>>,
    metrics_enabled: bool,
) {
    let shared_session: SharedSession = Arc::new(Mutex::new(Session::new(peer_addr)));
    let mut framed = Framed::new(MaybeTlsStream::Plain(stream), FTPCodec::new());

    if framed.send(Reply::new(ReplyCode::SERVICE_READY, "unftpd ready")).await.is_err() {
        return;
    }
    debug!("session started for {}", peer_addr);

    let mut pending: Option<tokio::sync::oneshot::Receiver<TransferOutcome>> = None;

    loop {
        let idle_timeout = config.idle_timeout();

        tokio::select! {
            line = tokio::time::timeout(idle_timeout, framed.next()) => {
                let decoded = match line {
                    Err(_elapsed) => {
                        let _ = framed.send(Reply::new(ReplyCode::SERVICE_NOT_AVAILABLE, "Idle timeout, closing control connection")).await;
                        break;
                    }
                    Ok(None) => break,
                    Ok(Some(Err(io_err))) => {
                        debug!("control channel read error for {}: {}", peer_addr, io_err);
                        break;
                    }
                    Ok(Some(Ok(Err(parse_err)))) => {
                        let (reply, fatal) = control_chan_error_reply(&parse_err);
                        let _ = framed.send(reply).await;
                        if fatal {
                            break;
                        }
                        continue;
                    }
                    Ok(Some(Ok(Ok(cmd)))) => cmd,
                };

                {
                    let session_guard = shared_session.lock().await;
                    if !session_guard.is_authenticated() && !allowed_before_login(&decoded) {
                        drop(session_guard);
                        let _ = framed.send(Reply::new(ReplyCode::NOT_LOGGED_IN, "Please login with USER and PASS")).await;
                        continue;
                    }
                    if session_guard.has_active_transfer() && !allowed_during_transfer(&decoded) {
                        drop(session_guard);
                        let _ = framed.send(Reply::new(ReplyCode::BAD_SEQUENCE, "A transfer is in progress")).await;
                        continue;
                    }
                }

                if metrics_enabled {
                    crate::metrics::handle().commands_total.with_label_values(&[verb_label(&decoded)]).inc();
                }

                {
                    let mut session_guard = shared_session.lock().await;
                    if !matches!(decoded, Command::Rnfr { .. } | Command::Rnto { .. }) {
                        session_guard.rename_from = None;
                    }
                    if !matches!(decoded, Command::Rest { .. } | Command::Retr { .. } | Command::Stor { .. } | Command::Appe { .. }) {
                        session_guard.rest_offset = None;
                    }
                }

                let ctx = CommandContext {
                    session: shared_session.clone(),
                    auth_gate: auth_gate.clone(),
                    config: config.clone(),
                    port_allocator: port_allocator.clone(),
                    local_addr,
                    tls_acceptor: tls_acceptor.clone(),
                    metrics_enabled,
                };

                let handler = build_handler(decoded);
                let output = match handler.handle(&ctx).await {
                    Ok(o) => o,
                    Err(e) => {
                        warn!("command handler error for {}: {}", peer_addr, e);
                        let (reply, _fatal) = control_chan_error_reply(&e);
                        let _ = framed.send(reply).await;
                        continue;
                    }
                };

                if metrics_enabled {
                    let code_str = output.reply.code.to_string();
                    crate::metrics::handle().replies_total.with_label_values(&[code_str.as_str()]).inc();
                }

                if output.request_tls_upgrade {
                    if framed.send(output.reply).await.is_err() {
                        break;
                    }
                    let acceptor = match &tls_acceptor {
                        Some(a) => a.clone(),
                        None => break,
                    };
                    let parts = framed.into_parts();
                    match parts.io.upgrade_server(&acceptor).await {
                        Ok(upgraded) => {
                            let mut new_parts = FramedParts::new(upgraded, parts.codec);
                            new_parts.read_buf = parts.read_buf;
                            new_parts.write_buf = parts.write_buf;
                            framed = Framed::from_parts(new_parts);
                            shared_session.lock().await.control_tls = true;
                            info!("control channel for {} upgraded to TLS", peer_addr);
                        }
                        Err(e) => {
                            warn!("TLS handshake failed for {}: {}", peer_addr, e);
                            break;
                        }
                    }
                    continue;
                }

                if output.wait_for_abort {
                    if let Some(rx) = pending.take() {
                        if let Ok(outcome) = rx.await {
                            let _ = framed.send(transfer_outcome_reply(outcome)).await;
                        }
                        shared_session.lock().await.worker = None;
                    }
                    if framed.send(output.reply).await.is_err() {
                        break;
                    }
                    continue;
                }

                let should_quit = output.should_quit;
                if framed.send(output.reply).await.is_err() {
                    break;
                }
                if let Some(rx) = output.spawned_transfer {
                    pending = Some(rx);
                }
                if should_quit {
                    break;
                }
            }

            outcome = async { pending.as_mut().expect("guarded by is_some()").await }, if pending.is_some() => {
                pending = None;
                shared_session.lock().await.worker = None;
                let reply = match outcome {
                    Ok(o) => transfer_outcome_reply(o),
                    Err(_) => Reply::new(ReplyCode::LOCAL_ERROR, "Transfer worker vanished"),
                };
                if framed.send(reply).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!("session ended for {}", peer_addr);
}

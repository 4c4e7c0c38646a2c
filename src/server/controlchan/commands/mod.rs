//! One module per FTP verb, each holding a small struct carrying that verb's
//! parsed arguments and implementing [`CommandHandler`]. Mirrors `libunftp`'s
//! `server/controlchan/commands/*.rs` layout (one file per command, e.g.
//! `pwd.rs`, `abor.rs`, `allo.rs`, `type_.rs`), generalized from the
//! teacher's generic `StorageBackend<S, U>` plumbing to this crate's
//! concrete filesystem (spec.md §1 Non-goals: no virtual filesystem).

pub mod abor;
pub mod acct;
pub mod allo;
pub mod appe;
pub mod auth;
pub mod ccc;
pub mod cdup;
pub mod cwd;
pub mod dele;
pub mod eprt;
pub mod epsv;
pub mod feat;
pub mod help;
pub mod list;
pub mod mdtm;
pub mod mkd;
pub mod mlsd;
pub mod mode;
pub mod nlst;
pub mod noop;
pub mod pass;
pub mod pasv;
pub mod pbsz;
pub mod port;
pub mod prot;
pub mod pwd;
pub mod quit;
pub mod rest;
pub mod retr;
pub mod rmd;
pub mod rnfr;
pub mod rnto;
pub mod size;
pub mod stat;
pub mod stor;
pub mod stou;
pub mod stru;
pub mod syst;
pub mod type_;
pub mod user;

use super::reply::{Reply, ReplyCode};
use crate::config::UserAccount;
use crate::fs::{PathError, PathResolver};
use crate::server::datachan::DataChannelError;
use crate::server::session::Session;
use std::path::PathBuf;

pub(crate) fn not_logged_in() -> Reply {
    Reply::new(ReplyCode::NOT_LOGGED_IN, "Please login with USER and PASS")
}

/// spec.md §7: PathError always surfaces as 550, revealing nothing about
/// why (existence vs. permission vs. escape attempt are indistinguishable
/// to the client, per §4.3's "the client sees 550, revealing no structure
/// above the root").
pub(crate) fn path_error_reply(_err: PathError) -> Reply {
    Reply::new(ReplyCode::FILE_UNAVAILABLE, "No such file or directory")
}

/// Common prelude nearly every post-login command needs: the authenticated
/// account and a [`PathResolver`] rooted at it. Returns the 530 reply
/// directly when the session isn't authenticated yet, so callers can
/// `let (user, root) = match require_login(&session) { ... };`.
pub(crate) fn require_login(session: &Session) -> Result<(UserAccount, PathBuf), Reply> {
    match session.user() {
        Some(u) => {
            let root = session.user_root.clone().unwrap_or_else(|| u.home.clone());
            Ok((u.clone(), root))
        }
        None => Err(not_logged_in()),
    }
}

pub(crate) fn resolver(root: &PathBuf) -> PathResolver<'_> {
    PathResolver::new(root.as_path())
}

pub(crate) fn tls_required_for_user() -> Reply {
    Reply::new(ReplyCode::NOT_LOGGED_IN, "TLS required before login (force_tls is enabled)")
}

pub(crate) fn account_read_only(account: &UserAccount) -> Option<Reply> {
    if account.read_only {
        Some(Reply::new(ReplyCode::FILE_UNAVAILABLE, "Permission denied: account is read-only"))
    } else {
        None
    }
}

/// spec.md §7: ResourceError (port exhaustion, accept timeout) → 425.
pub(crate) fn data_channel_error_reply(err: DataChannelError) -> Reply {
    match err {
        DataChannelError::NoIntent => Reply::new(ReplyCode::BAD_SEQUENCE, "Use PASV/EPSV/PORT/EPRT first"),
        DataChannelError::AcceptTimeout => Reply::new(ReplyCode::CANT_OPEN_DATA_CONNECTION, "Timed out waiting for data connection"),
        DataChannelError::Io(_) => Reply::new(ReplyCode::CANT_OPEN_DATA_CONNECTION, "Could not open data connection"),
        DataChannelError::Tls => Reply::new(ReplyCode::CANT_OPEN_DATA_CONNECTION, "Data channel TLS handshake failed"),
    }
}

/// Rejects a new data command while a previous transfer is still in flight
/// (spec.md §3 invariant: "at most one data transfer in flight per session;
/// initiating a new data command while one is active is an error (425)").
pub(crate) fn transfer_already_active() -> Reply {
    Reply::new(ReplyCode::CANT_OPEN_DATA_CONNECTION, "Another transfer is already in progress")
}

/// `LIST`/`NLST`/`MLSD` (spec.md §4.2) all take an optional path defaulting
/// to the session's cwd; resolve it to a host path here so the three
/// handlers only differ in how they format what they find.
pub(crate) fn resolve_listing_target(session: &Session, root: &PathBuf, path: &Option<String>) -> Result<PathBuf, Reply> {
    let resolver = resolver(root);
    let target = path.as_deref().unwrap_or(".");
    resolver.resolve_existing(&session.cwd, target).map_err(path_error_reply)
}

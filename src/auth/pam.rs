//! PAM-backed authentication (spec.md §4.6 (b), §9 "Cancellation of
//! blocking PAM"). Grounded on `libunftp`'s optional `pam_auth` feature
//! (`pam-auth = { package = "pam", ... }`, gated by the `pam_auth` Cargo
//! feature). `pam::Authenticator::open_session`/`authenticate` are blocking
//! calls, so they run on `tokio::task::spawn_blocking` rather than the
//! session's control-reading task, exactly as spec.md requires ("a slow PAM
//! stack cannot stall the FSM").

use pam_auth::Client;

/// Runs a PAM `authenticate` call for `service` off the async runtime's
/// worker threads. If the session that initiated this call has already
/// gone away (dropped its completion channel) by the time this returns,
/// the result is simply discarded by the caller — spec.md §9 calls this out
/// explicitly ("if the session closes while PAM is in flight, the result is
/// discarded on arrival").
pub async fn authenticate(service: String, user: String, pass: String) -> std::io::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let mut client = match Client::with_password(&service) {
            Ok(c) => c,
            Err(_) => return false,
        };
        client.conversation_mut().set_credentials(&user, &pass);
        client.authenticate().is_ok()
    })
    .await
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

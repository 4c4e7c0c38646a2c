//! End-to-end coverage of spec.md §8's worked scenarios: a real `Server`
//! bound to a loopback port, driven with a raw `TcpStream` client (no FTP
//! client crate — the protocol is simple enough to speak directly, and it
//! keeps these tests honest about exactly what's on the wire).

use std::time::Duration;
use tempfile::tempdir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use unftpd_core::config::{AuthBackend, Config, UserAccount};
use unftpd_core::Server;

fn base_config(control_port: u16, passive_lo: u16, passive_hi: u16, home: std::path::PathBuf) -> Config {
    Config {
        control_port,
        max_sessions: 64,
        max_sessions_per_ip: 16,
        idle_timeout_s: 300,
        passive_port_lo: passive_lo,
        passive_port_hi: passive_hi,
        nat_ip: None,
        tls_cert_path: None,
        tls_key_path: None,
        force_tls: false,
        auth_backend: AuthBackend::Local,
        users: vec![UserAccount {
            name: "tester".into(),
            password: Some("s3cret".into()),
            home,
            ownership_override: None,
            read_only: false,
        }],
        bruteforce_threshold: 3,
        bruteforce_cooldown_s: 300,
        passive_accept_timeout_s: 5,
    }
}

/// Spawns `server` on its own task and returns a guard that shuts it down
/// (stops accepting new connections) on drop.
struct ServerGuard {
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn spawn_server(config: Config) -> ServerGuard {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let server = Server::new(config).expect("valid test config");
    tokio::spawn(async move {
        let _ = server.listen_until(async { let _ = rx.await; }).await;
    });
    ServerGuard { shutdown: Some(tx) }
}

/// Connects, retrying briefly in case the listener hasn't bound yet.
async fn connect_with_retry(port: u16) -> TcpStream {
    let addr = format!("127.0.0.1:{}", port);
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(&addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("could not connect to {}", addr);
}

struct ControlClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl ControlClient {
    async fn connect(port: u16) -> Self {
        let stream = connect_with_retry(port).await;
        let (r, w) = stream.into_split();
        ControlClient { reader: BufReader::new(r), writer: w }
    }

    async fn read_reply(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.expect("reading reply line");
        line.trim_end().to_string()
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await.expect("writing command");
    }

    async fn login(&mut self, user: &str, pass: &str) {
        let greeting = self.read_reply().await;
        assert!(greeting.starts_with("220"), "unexpected greeting: {}", greeting);
        self.send(&format!("USER {}", user)).await;
        assert!(self.read_reply().await.starts_with("331"));
        self.send(&format!("PASS {}", pass)).await;
        assert!(self.read_reply().await.starts_with("230"));
    }

    /// Issues `PASV`, returning the port the server is listening for the
    /// data connection on.
    async fn pasv(&mut self) -> u16 {
        self.send("PASV").await;
        let reply = self.read_reply().await;
        assert!(reply.starts_with("227"), "unexpected PASV reply: {}", reply);
        let open = reply.find('(').expect("PASV reply missing '('");
        let close = reply.find(')').expect("PASV reply missing ')'");
        let nums: Vec<u32> = reply[open + 1..close].split(',').map(|n| n.parse().unwrap()).collect();
        ((nums[4] << 8) | nums[5]) as u16
    }
}

#[tokio::test]
async fn greeting_login_and_quit() {
    let home = tempdir().unwrap();
    let _guard = spawn_server(base_config(21210, 21300, 21309, home.path().to_path_buf()));

    let mut client = ControlClient::connect(21210).await;
    client.login("tester", "s3cret").await;

    client.send("PWD").await;
    let reply = client.read_reply().await;
    assert!(reply.starts_with("257"), "unexpected PWD reply: {}", reply);

    client.send("QUIT").await;
    assert!(client.read_reply().await.starts_with("221"));
}

#[tokio::test]
async fn pasv_list_shows_uploaded_directory_entry() {
    let home = tempdir().unwrap();
    std::fs::write(home.path().join("hello.txt"), b"hi there\n").unwrap();
    let _guard = spawn_server(base_config(21211, 21310, 21319, home.path().to_path_buf()));

    let mut client = ControlClient::connect(21211).await;
    client.login("tester", "s3cret").await;

    let data_port = client.pasv().await;
    let mut data = connect_with_retry(data_port).await;

    client.send("LIST").await;
    assert!(client.read_reply().await.starts_with("150"));

    let mut listing = Vec::new();
    data.read_to_end(&mut listing).await.unwrap();
    assert!(client.read_reply().await.starts_with("226"));

    let listing = String::from_utf8(listing).unwrap();
    assert!(listing.contains("hello.txt"), "listing was: {:?}", listing);
}

#[tokio::test]
async fn rest_then_retr_starts_at_the_requested_offset() {
    let home = tempdir().unwrap();
    std::fs::write(home.path().join("data.bin"), b"0123456789abcdefghij").unwrap();
    let _guard = spawn_server(base_config(21212, 21320, 21329, home.path().to_path_buf()));

    let mut client = ControlClient::connect(21212).await;
    client.login("tester", "s3cret").await;
    client.send("TYPE I").await;
    assert!(client.read_reply().await.starts_with("200"));

    let data_port = client.pasv().await;
    let mut data = connect_with_retry(data_port).await;

    client.send("REST 10").await;
    assert!(client.read_reply().await.starts_with("350"));

    client.send("RETR data.bin").await;
    assert!(client.read_reply().await.starts_with("150"));

    let mut received = Vec::new();
    data.read_to_end(&mut received).await.unwrap();
    assert!(client.read_reply().await.starts_with("226"));

    assert_eq!(received, b"abcdefghij");
}

#[tokio::test]
async fn path_escape_above_root_is_not_found() {
    let home = tempdir().unwrap();
    let _guard = spawn_server(base_config(21213, 21330, 21339, home.path().to_path_buf()));

    let mut client = ControlClient::connect(21213).await;
    client.login("tester", "s3cret").await;

    client.send("RETR ../../etc/passwd").await;
    let reply = client.read_reply().await;
    assert!(reply.starts_with("550"), "expected 550, got: {}", reply);
}

#[tokio::test]
async fn bruteforce_lockout_closes_session_and_blocks_the_next_connection() {
    let home = tempdir().unwrap();
    let _guard = spawn_server(base_config(21214, 21340, 21349, home.path().to_path_buf()));

    let mut client = ControlClient::connect(21214).await;
    let greeting = client.read_reply().await;
    assert!(greeting.starts_with("220"));

    for attempt in 1..=3 {
        client.send("USER tester").await;
        assert!(client.read_reply().await.starts_with("331"));
        client.send("PASS wrong-password").await;
        let reply = client.read_reply().await;
        assert!(reply.starts_with("530"), "attempt {} unexpected reply: {}", attempt, reply);
    }

    // The third failure crossed bruteforce_threshold (3): the server closes
    // the session right after that reply (spec.md §8 scenario 4).
    let mut buf = [0u8; 1];
    let n = client.reader.read(&mut buf).await.unwrap();
    assert_eq!(n, 0, "server should have closed the session after lockout");

    // A brand new connection from the same peer is rejected before the
    // greeting is even sent.
    let mut rejected = connect_with_retry(21214).await;
    let mut buf = Vec::new();
    let n = rejected.read_to_end(&mut buf).await.unwrap();
    assert_eq!(n, 0, "locked-out peer should get no reply at all");
}

//! The FTP command set this server understands (spec.md §6): RFC 959 plus
//! EPSV/EPRT, MLSD, SIZE/MDTM/REST, FEAT, and AUTH/PBSZ/PROT.
//!
//! Grounded on `libunftp`'s `Command` enum (referenced throughout
//! `server/ftpserver.rs::handle_command`'s dispatch match) — same shape,
//! one variant per verb, struct-like variants carrying parsed arguments.

use super::parse_error::{ParseError, ParseErrorKind};
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
    /// Recognized as a syntactically valid TYPE code but not one this
    /// server implements (e.g. `E`, `N`); carries the raw code byte so the
    /// handler can reply 504 rather than failing parse with 501 (spec.md
    /// §4.2: "any other type -> 504").
    Other(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtLevel {
    /// Clear — data channel not protected.
    Clear,
    /// Private — data channel TLS-protected.
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User { username: String },
    Pass { password: String },
    Auth,
    Pbsz,
    Ccc,
    Prot { level: ProtLevel },
    Quit,
    Feat,
    Help,
    Noop,
    Syst,
    Stat { path: Option<String> },
    Acct,
    Pwd,
    Cwd { path: String },
    Cdup,
    Type { kind: TransferType },
    Stru { code: String },
    Mode { code: String },
    Pasv,
    Epsv,
    Port { addr: SocketAddr },
    Eprt { addr: SocketAddr },
    Retr { path: String },
    Stor { path: String },
    Stou,
    Appe { path: String },
    List { path: Option<String> },
    Nlst { path: Option<String> },
    Mlsd { path: Option<String> },
    Dele { path: String },
    Rmd { path: String },
    Mkd { path: String },
    Rnfr { path: String },
    Rnto { path: String },
    Size { path: String },
    Mdtm { path: String },
    Rest { offset: u64 },
    Abor,
    Allo,
}

fn split_verb(line: &str) -> (String, Option<&str>) {
    match line.find(' ') {
        Some(idx) => (line[..idx].to_ascii_uppercase(), Some(line[idx + 1..].trim_start())),
        None => (line.to_ascii_uppercase(), None),
    }
}

fn require_arg<'a>(arg: Option<&'a str>) -> Result<&'a str, ParseError> {
    match arg {
        Some(a) if !a.is_empty() => Ok(a),
        _ => Err(ParseError::new(ParseErrorKind::InvalidCommand)),
    }
}

/// Parses PORT's `h1,h2,h3,h4,p1,p2` argument, and EPRT's
/// `|af|addr|port|` argument (RFC 2428), into a `SocketAddr`.
fn parse_port_arg(arg: &str) -> Result<SocketAddr, ParseError> {
    let parts: Vec<&str> = arg.split(',').collect();
    if parts.len() != 6 {
        return Err(ParseError::new(ParseErrorKind::InvalidCommand));
    }
    let nums: Result<Vec<u8>, _> = parts.iter().map(|p| p.parse::<u8>()).collect();
    let nums = nums.map_err(|_| ParseError::new(ParseErrorKind::InvalidCommand))?;
    let ip = std::net::Ipv4Addr::new(nums[0], nums[1], nums[2], nums[3]);
    let port = (nums[4] as u16) << 8 | (nums[5] as u16);
    Ok(SocketAddr::new(std::net::IpAddr::V4(ip), port))
}

fn parse_eprt_arg(arg: &str) -> Result<SocketAddr, ParseError> {
    let delim = arg.chars().next().ok_or_else(|| ParseError::new(ParseErrorKind::InvalidCommand))?;
    let parts: Vec<&str> = arg.trim_matches(delim).split(delim).collect();
    if parts.len() != 3 {
        return Err(ParseError::new(ParseErrorKind::InvalidCommand));
    }
    let ip: std::net::IpAddr = parts[1].parse().map_err(|_| ParseError::new(ParseErrorKind::InvalidCommand))?;
    let port: u16 = parts[2].parse().map_err(|_| ParseError::new(ParseErrorKind::InvalidCommand))?;
    Ok(SocketAddr::new(ip, port))
}

/// Parses one already-decoded, CRLF-stripped command line (spec.md §4.2:
/// "Commands are case-insensitive; arguments preserve case").
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let (verb, arg) = split_verb(line);

    Ok(match verb.as_str() {
        "USER" => Command::User { username: require_arg(arg)?.to_string() },
        "PASS" => Command::Pass { password: arg.unwrap_or("").to_string() },
        "AUTH" => {
            let a = require_arg(arg)?;
            if a.eq_ignore_ascii_case("TLS") || a.eq_ignore_ascii_case("TLS-C") {
                Command::Auth
            } else {
                return Err(ParseError::new(ParseErrorKind::InvalidCommand));
            }
        }
        "PBSZ" => Command::Pbsz,
        "CCC" => Command::Ccc,
        "PROT" => {
            let a = require_arg(arg)?;
            let level = match a.to_ascii_uppercase().as_str() {
                "P" => ProtLevel::Private,
                "C" => ProtLevel::Clear,
                _ => return Err(ParseError::new(ParseErrorKind::InvalidCommand)),
            };
            Command::Prot { level }
        }
        "QUIT" => Command::Quit,
        "FEAT" => Command::Feat,
        "HELP" => Command::Help,
        "NOOP" => Command::Noop,
        "SYST" => Command::Syst,
        "STAT" => Command::Stat { path: arg.map(|s| s.to_string()) },
        "ACCT" => Command::Acct,
        "PWD" | "XPWD" => Command::Pwd,
        "CWD" | "XCWD" => Command::Cwd { path: require_arg(arg)?.to_string() },
        "CDUP" | "XCUP" => Command::Cdup,
        "TYPE" => {
            let a = require_arg(arg)?;
            let first = a.chars().next().unwrap().to_ascii_uppercase();
            let kind = match first {
                'A' => TransferType::Ascii,
                'I' | 'L' => TransferType::Binary,
                other => TransferType::Other(other),
            };
            Command::Type { kind }
        }
        "STRU" => Command::Stru { code: require_arg(arg)?.to_ascii_uppercase() },
        "MODE" => Command::Mode { code: require_arg(arg)?.to_ascii_uppercase() },
        "PASV" => Command::Pasv,
        "EPSV" => Command::Epsv,
        "PORT" => Command::Port { addr: parse_port_arg(require_arg(arg)?)? },
        "EPRT" => Command::Eprt { addr: parse_eprt_arg(require_arg(arg)?)? },
        "RETR" => Command::Retr { path: require_arg(arg)?.to_string() },
        "STOR" => Command::Stor { path: require_arg(arg)?.to_string() },
        "STOU" => Command::Stou,
        "APPE" => Command::Appe { path: require_arg(arg)?.to_string() },
        "LIST" => Command::List { path: arg.map(|s| s.to_string()) },
        "NLST" => Command::Nlst { path: arg.map(|s| s.to_string()) },
        "MLSD" => Command::Mlsd { path: arg.map(|s| s.to_string()) },
        "DELE" => Command::Dele { path: require_arg(arg)?.to_string() },
        "RMD" | "XRMD" => Command::Rmd { path: require_arg(arg)?.to_string() },
        "MKD" | "XMKD" => Command::Mkd { path: require_arg(arg)?.to_string() },
        "RNFR" => Command::Rnfr { path: require_arg(arg)?.to_string() },
        "RNTO" => Command::Rnto { path: require_arg(arg)?.to_string() },
        "SIZE" => Command::Size { path: require_arg(arg)?.to_string() },
        "MDTM" => Command::Mdtm { path: require_arg(arg)?.to_string() },
        "REST" => {
            let a = require_arg(arg)?;
            let offset = a.parse::<u64>().map_err(|_| ParseError::new(ParseErrorKind::InvalidCommand))?;
            Command::Rest { offset }
        }
        "ABOR" => Command::Abor,
        "ALLO" => Command::Allo,
        other => return Err(ParseError::new(ParseErrorKind::UnknownCommand { command: other.to_string() })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_and_pass() {
        assert_eq!(parse("USER admin").unwrap(), Command::User { username: "admin".into() });
        assert_eq!(parse("pass admin123").unwrap(), Command::Pass { password: "admin123".into() });
    }

    #[test]
    fn verb_is_case_insensitive_argument_case_preserved() {
        assert_eq!(parse("UsEr AdMiN").unwrap(), Command::User { username: "AdMiN".into() });
    }

    #[test]
    fn unknown_verb_errors() {
        let err = parse("BOGUS foo").unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnknownCommand { command } if command == "BOGUS"));
    }

    #[test]
    fn parses_port_argument() {
        let cmd = parse("PORT 10,0,0,5,195,80").unwrap();
        assert_eq!(cmd, Command::Port { addr: "10.0.0.5:50000".parse().unwrap() });
    }

    #[test]
    fn parses_eprt_argument() {
        let cmd = parse("EPRT |1|10.0.0.5|50000|").unwrap();
        assert_eq!(cmd, Command::Eprt { addr: "10.0.0.5:50000".parse().unwrap() });
    }

    #[test]
    fn parses_rest_offset() {
        assert_eq!(parse("REST 6").unwrap(), Command::Rest { offset: 6 });
    }

    #[test]
    fn type_i_is_binary() {
        assert_eq!(parse("TYPE I").unwrap(), Command::Type { kind: TransferType::Binary });
        assert_eq!(parse("TYPE A").unwrap(), Command::Type { kind: TransferType::Ascii });
    }

    #[test]
    fn type_e_parses_as_other_rather_than_failing() {
        assert_eq!(parse("TYPE E").unwrap(), Command::Type { kind: TransferType::Other('E') });
    }
}

//! FTPCodec (spec.md §4.2): reads CRLF-terminated command lines up to 4096
//! bytes; oversize lines close the session with 500. Encodes [`Reply`]
//! values back onto the wire.
//!
//! Grounded on `libunftp`'s `controlchan::FTPCodec`, used via
//! `codec.framed(tcp_stream)` in `server/ftpserver.rs`.

use super::command::{self, Command};
use super::error::{ControlChanError, ControlChanErrorKind};
use super::reply::Reply;
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// spec.md §4.2 and §8: "Command line of exactly 4096 bytes: accepted;
/// 4097: 500 and close."
pub const MAX_LINE_LEN: usize = 4096;

#[derive(Default)]
pub struct FTPCodec {
    // Set once an oversize line has been detected, so a subsequent decode
    // call surfaces the fatal error exactly once instead of looping.
    fatal: bool,
}

impl FTPCodec {
    pub fn new() -> Self {
        FTPCodec::default()
    }
}

impl Decoder for FTPCodec {
    type Item = Result<Command, ControlChanError>;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.fatal {
            return Ok(None);
        }

        if let Some(pos) = find_crlf(buf) {
            if pos > MAX_LINE_LEN {
                self.fatal = true;
                buf.advance(pos + 2);
                return Ok(Some(Err(ControlChanErrorKind::LineTooLong.into())));
            }

            let line = buf.split_to(pos);
            buf.advance(2); // skip CRLF

            return match std::str::from_utf8(&line) {
                Ok(s) => {
                    let s = s.trim_end_matches('\r');
                    if s.is_empty() {
                        // A bare CRLF with no verb: treat as a syntax error,
                        // not silence, so the client gets a reply per line.
                        Ok(Some(Err(ControlChanErrorKind::InvalidCommand.into())))
                    } else {
                        Ok(Some(command::parse(s).map_err(ControlChanError::from)))
                    }
                }
                Err(_) => Ok(Some(Err(ControlChanErrorKind::Utf8Error.into()))),
            };
        }

        if buf.len() > MAX_LINE_LEN + 1 {
            self.fatal = true;
            buf.clear();
            return Ok(Some(Err(ControlChanErrorKind::LineTooLong.into())));
        }

        Ok(None)
    }
}

fn find_crlf(buf: &BytesMut) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

impl Encoder<Reply> for FTPCodec {
    type Error = std::io::Error;

    fn encode(&mut self, reply: Reply, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(reply.render().as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_simple_command() {
        let mut codec = FTPCodec::new();
        let mut buf = BytesMut::from(&b"USER admin\r\n"[..]);
        let item = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(item.unwrap(), Command::User { username: "admin".into() });
        assert!(buf.is_empty());
    }

    #[test]
    fn incomplete_line_returns_none() {
        let mut codec = FTPCodec::new();
        let mut buf = BytesMut::from(&b"USER adm"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn line_of_exactly_4096_bytes_is_accepted() {
        let mut codec = FTPCodec::new();
        let payload = "A".repeat(MAX_LINE_LEN - 5); // "STAT " + payload = 4096 bytes
        let mut buf = BytesMut::from(format!("STAT {}\r\n", payload).as_bytes());
        let item = codec.decode(&mut buf).unwrap().unwrap();
        assert!(item.is_ok());
    }

    #[test]
    fn oversize_line_is_rejected() {
        let mut codec = FTPCodec::new();
        let payload = "A".repeat(MAX_LINE_LEN + 50);
        let mut buf = BytesMut::from(format!("USER {}\r\n", payload).as_bytes());
        let item = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(item.unwrap_err().kind(), ControlChanErrorKind::LineTooLong));
    }
}

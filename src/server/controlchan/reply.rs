//! FTP replies (spec.md §6): three-digit codes followed by `SP` and human
//! text, CRLF-terminated; multi-line replies use the `xyz-`/` xyz` framing.

use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ReplyCode(pub u16);

impl ReplyCode {
    pub const COMMAND_OKAY: ReplyCode = ReplyCode(200);
    pub const COMMAND_SUPERFLUOUS: ReplyCode = ReplyCode(202);
    pub const SYSTEM_STATUS: ReplyCode = ReplyCode(211);
    pub const DIRECTORY_STATUS: ReplyCode = ReplyCode(212);
    pub const FILE_STATUS: ReplyCode = ReplyCode(213);
    pub const HELP_MESSAGE: ReplyCode = ReplyCode(214);
    pub const SYSTEM_TYPE: ReplyCode = ReplyCode(215);
    pub const SERVICE_READY: ReplyCode = ReplyCode(220);
    pub const DATA_CONNECTION_ALREADY_OPEN: ReplyCode = ReplyCode(125);
    pub const OPENING_DATA_CONNECTION: ReplyCode = ReplyCode(150);
    pub const CLOSING_CONTROL_CONNECTION: ReplyCode = ReplyCode(221);
    pub const AUTH_OK_UPGRADE: ReplyCode = ReplyCode(234);
    pub const CLOSING_DATA_CONNECTION: ReplyCode = ReplyCode(226);
    pub const ENTERING_PASSIVE_MODE: ReplyCode = ReplyCode(227);
    pub const ENTERING_EXTENDED_PASSIVE_MODE: ReplyCode = ReplyCode(229);
    pub const USER_LOGGED_IN: ReplyCode = ReplyCode(230);
    pub const FILE_ACTION_OKAY: ReplyCode = ReplyCode(250);
    pub const PATHNAME_CREATED: ReplyCode = ReplyCode(257);
    pub const NEED_PASSWORD: ReplyCode = ReplyCode(331);
    pub const NEED_RNTO: ReplyCode = ReplyCode(350);
    pub const SERVICE_NOT_AVAILABLE: ReplyCode = ReplyCode(421);
    pub const CANT_OPEN_DATA_CONNECTION: ReplyCode = ReplyCode(425);
    pub const CONNECTION_CLOSED_TRANSFER_ABORTED: ReplyCode = ReplyCode(426);
    pub const FILE_UNAVAILABLE_TRANSIENT: ReplyCode = ReplyCode(450);
    pub const LOCAL_ERROR: ReplyCode = ReplyCode(451);
    pub const INSUFFICIENT_STORAGE: ReplyCode = ReplyCode(452);
    pub const COMMAND_SYNTAX_ERROR: ReplyCode = ReplyCode(500);
    pub const PARAMETER_SYNTAX_ERROR: ReplyCode = ReplyCode(501);
    pub const COMMAND_NOT_IMPLEMENTED: ReplyCode = ReplyCode(502);
    pub const BAD_SEQUENCE: ReplyCode = ReplyCode(503);
    pub const COMMAND_NOT_IMPLEMENTED_FOR_PARAM: ReplyCode = ReplyCode(504);
    pub const NOT_LOGGED_IN: ReplyCode = ReplyCode(530);
    pub const FILE_UNAVAILABLE: ReplyCode = ReplyCode(550);
    pub const PAGE_TYPE_UNKNOWN: ReplyCode = ReplyCode(551);
    pub const EXCEEDED_STORAGE_ALLOCATION: ReplyCode = ReplyCode(552);
    pub const BAD_FILE_NAME: ReplyCode = ReplyCode(553);
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reply to send on the control channel. `lines` holds every line after
/// the first; when non-empty, the reply is rendered using the
/// `xyz-first\r\n xyz-middle\r\nxyz last\r\n` multi-line framing RFC 959
/// describes.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: ReplyCode,
    pub first_line: String,
    pub extra_lines: Vec<String>,
}

impl Reply {
    pub fn new(code: ReplyCode, text: impl Into<String>) -> Self {
        Reply {
            code,
            first_line: text.into(),
            extra_lines: Vec::new(),
        }
    }

    pub fn multiline(code: ReplyCode, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut it = lines.into_iter();
        let first_line = it.next().map(Into::into).unwrap_or_default();
        Reply {
            code,
            first_line,
            extra_lines: it.map(Into::into).collect(),
        }
    }

    /// Renders the full CRLF-terminated reply text, ready to write to the
    /// control socket.
    pub fn render(&self) -> String {
        if self.extra_lines.is_empty() {
            format!("{} {}\r\n", self.code, self.first_line)
        } else {
            let mut out = format!("{}-{}\r\n", self.code, self.first_line);
            let (last, middle) = self.extra_lines.split_last().unwrap();
            for line in middle {
                out.push_str(&format!(" {}\r\n", line));
            }
            out.push_str(&format!("{} {}\r\n", self.code, last));
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_reply_renders_with_space() {
        let r = Reply::new(ReplyCode::USER_LOGGED_IN, "logged in");
        assert_eq!(r.render(), "230 logged in\r\n");
    }

    #[test]
    fn multiline_reply_uses_dash_then_space_framing() {
        let r = Reply::multiline(ReplyCode::COMMAND_NOT_IMPLEMENTED, vec!["Features:", " EPSV", " MLSD", "End"]);
        let rendered = r.render();
        assert!(rendered.starts_with("502-Features:\r\n"));
        assert!(rendered.contains("502 End\r\n"));
    }
}

//! LW2 text codec
//!
//! Inbound lines are matched against the fixed response grammars in a fixed
//! order; the first match wins. Outbound commands are brace-delimited text
//! followed by CRLF.

use bytes::{BufMut, Bytes, BytesMut};
use regex_lite::Regex;
use std::sync::OnceLock;

use crate::types::{Command, Response};
use crate::LINE_TERMINATOR;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn topology_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\(ALL\s+(.+)\s?\)\s*$")
}

fn error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)ERR04")
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)\(([IOP])NAME#(\d+)=([^)]*)\)$")
}

fn crosspoint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)\(O(\d+) I(\d+)\)")
}

fn identity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)\(i:\s*(.+)\)$")
}

/// Classify one framed line
pub fn decode_line(line: &str) -> Response {
    if let Some(caps) = topology_re().captures(line) {
        return decode_topology(&caps[1]).unwrap_or(Response::Unrecognized);
    }

    if error_re().is_match(line) {
        return Response::ErrorCode;
    }

    if let Some(caps) = name_re().captures(line) {
        let Ok(index) = caps[2].parse::<u32>() else {
            return Response::Unrecognized;
        };
        let name = caps[3].to_string();
        return match caps[1].as_bytes()[0].to_ascii_uppercase() {
            b'I' => Response::InputName { index, name },
            b'O' => Response::OutputName { index, name },
            _ => Response::PresetName { index, name },
        };
    }

    if let Some(caps) = crosspoint_re().captures(line) {
        return match (caps[1].parse(), caps[2].parse()) {
            (Ok(output), Ok(input)) => Response::Crosspoint { output, input },
            _ => Response::Unrecognized,
        };
    }

    if let Some(caps) = identity_re().captures(line) {
        return Response::Identity(caps[1].to_string());
    }

    Response::Unrecognized
}

/// Parse the whitespace-separated routed-input list of a topology line.
/// A trailing separator before `)` leaves no token, so nothing needs dropping.
fn decode_topology(body: &str) -> Option<Response> {
    body.split_whitespace()
        .map(|token| token.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()
        .map(Response::Topology)
}

/// Encode a command as wire bytes, terminator included
pub fn encode(command: &Command) -> Bytes {
    let text = command.to_string();
    let mut buf = BytesMut::with_capacity(text.len() + LINE_TERMINATOR.len());
    buf.put_slice(text.as_bytes());
    buf.put_slice(LINE_TERMINATOR);
    buf.freeze()
}

/// Encode several commands into one write
pub fn encode_all<'a>(commands: impl IntoIterator<Item = &'a Command>) -> Bytes {
    let mut buf = BytesMut::new();
    for command in commands {
        buf.put_slice(&encode(command));
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_trailing_separator() {
        assert_eq!(
            decode_line("(ALL 1 2 0 )"),
            Response::Topology(vec![1, 2, 0])
        );
    }

    #[test]
    fn test_topology_malformed_token() {
        assert_eq!(decode_line("(ALL 1 x 3)"), Response::Unrecognized);
    }

    #[test]
    fn test_greeting_bytes() {
        let greeting = encode_all(&[Command::Identify, Command::ViewConnections]);
        assert_eq!(&greeting[..], b"{i}\r\n{VC}\r\n");
    }
}

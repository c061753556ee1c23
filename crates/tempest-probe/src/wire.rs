//! Decoy request framing and reply classification.
//!
//! The invalid-handshake probe sends a request line that is syntactically
//! plausible HTTP but names a resource no target is expected to serve.
//! Whatever comes back is classified so the report can distinguish a
//! well-formed error response from raw bytes.

use bytes::Bytes;
use once_cell::sync::Lazy;

/// Resource path no server under test is expected to recognize.
pub const DECOY_PATH: &str = "/garbage";

/// The malformed-but-plausible request sent by the invalid-handshake
/// probe. The empty line makes it a complete HTTP/1.1 framed request.
pub static DECOY_REQUEST: Lazy<Bytes> =
    Lazy::new(|| Bytes::from(format!("GET {DECOY_PATH} HTTP/1.1\r\n\r\n")));

/// Shape of whatever the target sent back to the decoy request.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplyKind {
    /// A well-formed `HTTP/1.x NNN ...` status line.
    HttpStatus { code: u16 },
    /// Anything else.
    Raw,
}

/// Classifies the first line of a reply.
pub fn classify_reply(buf: &[u8]) -> ReplyKind {
    let line_end = buf
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(buf.len());
    let line = match std::str::from_utf8(&buf[..line_end]) {
        Ok(s) => s,
        Err(_) => return ReplyKind::Raw,
    };

    // "HTTP/1.1 400 Bad Request" -> version, code, optional reason
    let mut parts = line.split_whitespace();
    let version = match parts.next() {
        Some(v) if v.starts_with("HTTP/") => v,
        _ => return ReplyKind::Raw,
    };
    if version.len() <= "HTTP/".len() {
        return ReplyKind::Raw;
    }

    match parts.next().and_then(|c| c.parse::<u16>().ok()) {
        Some(code) if (100..=599).contains(&code) => ReplyKind::HttpStatus { code },
        _ => ReplyKind::Raw,
    }
}

/// Escaped preview of received bytes for report lines, truncated to
/// `limit` input bytes.
pub fn preview(buf: &[u8], limit: usize) -> String {
    let shown = &buf[..buf.len().min(limit)];
    let mut out: String = shown.escape_ascii().to_string();
    if buf.len() > limit {
        out.push_str("...");
    }
    out
}

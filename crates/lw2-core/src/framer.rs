//! CRLF line framing
//!
//! TCP hands over arbitrary chunks; a line (or its terminator) may be split
//! across any number of reads. The framer keeps the unterminated tail until the
//! rest arrives.

use bytes::{Buf, BytesMut};

use crate::LINE_TERMINATOR;

/// Splits a byte stream into CRLF-terminated lines
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
    /// Bytes already searched without finding a terminator
    scanned: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data` and return every line it completes, terminators stripped
    pub fn feed(&mut self, data: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(pos) = self.find_terminator() {
            let line = self.buf.split_to(pos);
            self.buf.advance(LINE_TERMINATOR.len());
            self.scanned = 0;
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Unterminated data held for the next read
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Drop any buffered partial line
    pub fn clear(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }

    fn find_terminator(&mut self) -> Option<usize> {
        // Back up one byte so a CR at the end of the previous chunk is re-checked.
        let start = self.scanned.saturating_sub(1);
        let found = self.buf[start..]
            .windows(LINE_TERMINATOR.len())
            .position(|w| w == LINE_TERMINATOR)
            .map(|p| start + p);
        if found.is_none() {
            self.scanned = self.buf.len();
        }
        found
    }
}

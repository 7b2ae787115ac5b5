//! Per-instruction trace records emitted in debug mode.

use std::fmt;

use crate::program::Op;

/// Cells shown on each side of the data pointer.
pub const TRACE_RADIUS: usize = 5;

/// Machine state captured right before an instruction takes effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub ip: usize,
    pub op: Op,
    pub ptr: usize,
    /// Tape address of `window[0]`.
    pub base: usize,
    pub window: Vec<u8>,
}

impl TraceRecord {
    pub(crate) fn capture(ip: usize, op: Op, ptr: usize, tape: &[u8]) -> Self {
        let base = ptr.saturating_sub(TRACE_RADIUS);
        let end = (ptr + TRACE_RADIUS + 1).min(tape.len());
        Self {
            ip,
            op,
            ptr,
            base,
            window: tape[base..end].to_vec(),
        }
    }

    /// Index of the current cell inside `window`.
    pub fn cursor(&self) -> usize {
        self.ptr - self.base
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = format!(
            "IP: {:4} | Cmd: {} | Ptr: {:4} | Memory: [",
            self.ip, self.op, self.ptr
        );
        let cells: Vec<String> = self.window.iter().map(|c| format!("{c:3}")).collect();
        writeln!(f, "{head}{}]", cells.join(" "))?;

        // Each rendered cell is three columns wide plus a separator.
        let marker = head.chars().count() + self.cursor() * 4;
        write!(f, "{}^^^", " ".repeat(marker))
    }
}

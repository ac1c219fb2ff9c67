use tracing::debug;

/// Label the reader firmware prints before the UID bytes.
pub const UID_LABEL: &str = "Card UID:";

/// Longest line kept while waiting for a newline. Anything longer is line
/// noise or a baud-rate mismatch and is discarded.
pub const MAX_LINE_LEN: usize = 256;

/// Collects raw serial bytes into complete lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
    /// Set while skipping the rest of an over-long line.
    overflowed: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(128),
            overflowed: false,
        }
    }

    /// Appends `bytes` and returns every line completed by them, trimmed.
    /// Blank lines are dropped; invalid UTF-8 is replaced, not rejected.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                if std::mem::take(&mut self.overflowed) {
                    continue;
                }
                let line = String::from_utf8_lossy(&self.buffer).trim().to_string();
                self.buffer.clear();
                if !line.is_empty() {
                    lines.push(line);
                }
            } else if self.buffer.len() >= MAX_LINE_LEN {
                debug!(limit = MAX_LINE_LEN, "Serial line too long; discarding partial line");
                self.buffer.clear();
                self.overflowed = true;
            } else if !self.overflowed {
                self.buffer.push(byte);
            }
        }
        lines
    }

    /// Drops any partial line, e.g. after the device went away mid-line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Extracts the UID from a reader line such as `Card UID: 04 A1 B2 C3`.
///
/// The label must be followed by one or more whitespace-separated two-digit
/// uppercase hex groups; parsing stops at the first token that is not one.
/// Any other line is diagnostic output and yields `None`.
pub fn parse_uid(line: &str) -> Option<String> {
    let (_, rest) = line.split_once(UID_LABEL)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let uid: String = rest
        .split_whitespace()
        .take_while(|group| is_hex_pair(group))
        .collect();

    (!uid.is_empty()).then_some(uid)
}

fn is_hex_pair(group: &str) -> bool {
    group.len() == 2
        && group
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

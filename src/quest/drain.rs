/// Splits the quest's standard output into complete lines
///
/// Bytes after the last line break are kept until a later chunk
/// terminates them, so a line is never delivered in pieces.
#[derive(Debug, Default)]
pub struct OutputDrainer {
    pending: Vec<u8>,
}

impl OutputDrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the lines it completed, in order
    ///
    /// Lines are trimmed and empty lines are dropped.
    pub fn drain(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_break) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_break + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete
            .split(|&b| b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Flush the unterminated fragment once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        let fragment = std::mem::take(&mut self.pending);
        decode_line(&fragment)
    }

    /// Number of buffered bytes waiting for a line break
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(bytes);
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_partial_line_until_terminated() {
        let mut drainer = OutputDrainer::new();

        assert_eq!(drainer.drain(b"line1\nline2\npart"), vec!["line1", "line2"]);
        assert_eq!(drainer.pending_len(), 4);

        assert_eq!(drainer.drain(b"ial\n"), vec!["partial"]);
        assert_eq!(drainer.pending_len(), 0);
    }

    #[test]
    fn drain_returns_nothing_without_line_break() {
        let mut drainer = OutputDrainer::new();

        assert!(drainer.drain(b"no newline yet").is_empty());
        assert!(drainer.drain(b" still").is_empty());
        assert_eq!(drainer.drain(b"\n"), vec!["no newline yet still"]);
    }

    #[test]
    fn drain_skips_blank_lines_and_trims() {
        let mut drainer = OutputDrainer::new();

        let lines = drainer.drain(b"  first  \n\n   \r\nsecond\r\n");

        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn drain_joins_utf8_sequence_split_across_chunks() {
        let mut drainer = OutputDrainer::new();
        let text = "épée\n".as_bytes();

        assert!(drainer.drain(&text[..1]).is_empty());
        assert_eq!(drainer.drain(&text[1..]), vec!["épée"]);
    }

    #[test]
    fn finish_flushes_fragment_once() {
        let mut drainer = OutputDrainer::new();
        drainer.drain(b"done\ntail");

        assert_eq!(drainer.finish(), Some("tail".to_string()));
        assert_eq!(drainer.finish(), None);
    }
}

/// Incremental newline splitter for a chunked response body.
///
/// Chunk boundaries fall anywhere, so the trailing partial line of each
/// chunk is carried over and completed by the next one. `feed` returns
/// every line completed by the incoming chunk; `finish` flushes whatever
/// remains once the stream is exhausted.
#[derive(Debug, Default)]
pub struct LineDecoder {
    carry: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the lines it completed, in order.
    ///
    /// Lines are split on `\n`; a trailing `\r` is stripped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut buf = std::mem::take(&mut self.carry);
        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let rest = buf.split_off(pos + 1);
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            lines.push(String::from_utf8_lossy(&buf).into_owned());
            buf = rest;
        }
        self.carry = buf;
        lines
    }

    /// Flush the unterminated final line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let mut buf = std::mem::take(&mut self.carry);
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Some(String::from_utf8_lossy(&buf).into_owned())
    }
}

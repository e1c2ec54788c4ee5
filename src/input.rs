use std::io::{self, BufRead};

#[derive(Debug, PartialEq, Eq)]
pub enum InputMessage {
    Line(String),
    Eof,
}

/// Reads command lines from a terminal or a redirected stream.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Returns the next line without its terminator. A final line with no
    /// newline is still returned. Bytes that are not valid UTF-8 are replaced.
    pub fn next_line(&mut self) -> io::Result<InputMessage> {
        self.buf.clear();

        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(InputMessage::Eof);
        }

        if self.buf.ends_with(b"\n") {
            self.buf.pop();
            if self.buf.ends_with(b"\r") {
                self.buf.pop();
            }
        }

        Ok(InputMessage::Line(
            String::from_utf8_lossy(&self.buf).into_owned(),
        ))
    }
}

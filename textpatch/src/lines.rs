//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Line splitting that preserves the original terminators.

use std::fmt;
use std::io::{self, BufRead};

/// Terminator of a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Final line of a stream that does not end in a terminator.
    None,
    Lf,
    Cr,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::None => "",
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// One physical line: its content plus the terminator it arrived with.
///
/// Equality covers both parts, so two lines with the same text but
/// different terminators do not compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    content: String,
    ending: LineEnding,
}

impl Line {
    pub fn new(content: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            content: content.into(),
            ending,
        }
    }

    /// Content without the terminator.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Drop the terminator, keeping the content.
    pub(crate) fn strip_ending(&mut self) {
        self.ending = LineEnding::None;
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.content, self.ending.as_str())
    }
}

/// Split in-memory text into terminator-preserving lines.
///
/// `join` of the result reproduces `text` exactly; a final line without a
/// terminator is kept with `LineEnding::None`.
pub fn split(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(Line::new(&text[start..i], LineEnding::Lf));
                i += 1;
                start = i;
            }
            b'\r' => {
                let ending = if bytes.get(i + 1) == Some(&b'\n') {
                    LineEnding::CrLf
                } else {
                    LineEnding::Cr
                };
                lines.push(Line::new(&text[start..i], ending));
                i += ending.as_str().len();
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(Line::new(&text[start..], LineEnding::None));
    }
    lines
}

/// Concatenate lines back into one string, terminators included.
pub fn join(lines: &[Line]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.content());
        text.push_str(line.ending().as_str());
    }
    text
}

/// Iterator over the lines of a reader.
///
/// Lazily yields one `Line` per physical line, terminators retained, so
/// that concatenating every item reproduces the input bytes. The iterator
/// is fused: after end of input or the first error it keeps returning
/// `None`. Input must be UTF-8; invalid data surfaces as an
/// `io::ErrorKind::InvalidData` error.
pub struct LineSplitter<R> {
    reader: R,
    done: bool,
}

impl<R: BufRead> LineSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<Line>> {
        let mut pending: Vec<u8> = Vec::new();
        let ending = loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                if pending.is_empty() {
                    return Ok(None);
                }
                break LineEnding::None;
            }
            let Some(at) = buf.iter().position(|&b| b == b'\n' || b == b'\r') else {
                let n = buf.len();
                pending.extend_from_slice(buf);
                self.reader.consume(n);
                continue;
            };
            pending.extend_from_slice(&buf[..at]);
            let terminator = buf[at];
            self.reader.consume(at + 1);
            if terminator == b'\n' {
                break LineEnding::Lf;
            }
            // The LF of a CRLF pair may sit in the next chunk.
            let next = self.reader.fill_buf()?;
            if next.first() == Some(&b'\n') {
                self.reader.consume(1);
                break LineEnding::CrLf;
            }
            break LineEnding::Cr;
        };
        let content = String::from_utf8(pending)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(Line { content, ending }))
    }
}

impl<R: BufRead> Iterator for LineSplitter<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

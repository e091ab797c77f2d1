//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Patch text scanning and header field extraction.

use std::io::BufRead;
use std::path::PathBuf;

use crate::context::read_context;
use crate::lines::{split, Line, LineSplitter};
use crate::types::{parse_date, DATE_UNKNOWN, DEV_NULL, ParseWarning, Patch};
use crate::unified::read_unified;

/// Parse patch text from a reader.
///
/// Parsing never fails as a whole: malformed pieces are skipped and
/// reported through [`Patch::warnings`]. A read error ends the parse
/// early with a `Truncated` warning covering whatever was lost.
pub fn parse<R: BufRead>(reader: R) -> Patch {
    let mut lines = Vec::new();
    let mut warnings = Vec::new();
    for item in LineSplitter::new(reader) {
        match item {
            Ok(line) => lines.push(line),
            Err(source) => {
                warnings.push(ParseWarning::Truncated {
                    line: lines.len() + 1,
                    source,
                });
                break;
            }
        }
    }
    scan(&lines, warnings)
}

/// Parse patch text already held in memory.
pub fn parse_str(text: &str) -> Patch {
    scan(&split(text), Vec::new())
}

/// Outer scan: find file sections by their header pairs, handing each to
/// the dialect parser, and skip everything in between. `Index:` lines
/// name the file the next section affects, overriding its header paths.
fn scan(lines: &[Line], warnings: Vec<ParseWarning>) -> Patch {
    let mut diffs = Vec::new();
    let mut warnings = warnings;
    let mut index_name: Option<String> = None;
    let mut pos = 0;
    while pos < lines.len() {
        let content = lines[pos].content();
        if let Some(rest) = content.strip_prefix("Index: ") {
            index_name = Some(rest.trim().to_string());
            pos += 1;
            continue;
        }
        if content.starts_with("--- ") {
            let (diff, new_pos) =
                read_unified(lines, pos, index_name.take().as_deref(), &mut warnings);
            diffs.extend(diff);
            pos = new_pos.max(pos + 1);
            continue;
        }
        if content.starts_with("*** ") {
            let (diff, new_pos) =
                read_context(lines, pos, index_name.take().as_deref(), &mut warnings);
            diffs.extend(diff);
            pos = new_pos.max(pos + 1);
            continue;
        }
        pos += 1;
    }
    Patch { diffs, warnings }
}

/// Tab-separated header fields, trimmed, empties dropped.
pub(crate) fn split_header(text: &str) -> Vec<String> {
    text.split('\t')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Path from a header's first field. `/dev/null` means the file does not
/// exist on this side. An `Index:` name takes precedence over a header
/// path that disagrees with it.
pub(crate) fn extract_path(args: &[String], index_name: Option<&str>) -> Option<PathBuf> {
    let token = args.first()?;
    if token == DEV_NULL {
        return None;
    }
    if let Some(name) = index_name {
        if name != token {
            log::debug!("header path {:?} overridden by index name {:?}", token, name);
            return Some(PathBuf::from(name));
        }
    }
    Some(PathBuf::from(token))
}

/// Timestamp from a header's second field, `DATE_UNKNOWN` when absent or
/// unreadable.
pub(crate) fn extract_date(args: &[String]) -> i64 {
    match args.get(1) {
        Some(token) => parse_date(token),
        None => DATE_UNKNOWN,
    }
}

/// Read a `start,length` pair following `marker`, ending at the next
/// space. A pair without a comma reads as start 1 with the lone number as
/// the second value. Anything unreadable yields the -1,-1 sentinel.
pub(crate) fn extract_pair(text: &str, marker: char) -> (i64, i64) {
    let Some(at) = text.find(marker) else {
        return (-1, -1);
    };
    let rest = &text[at + marker.len_utf8()..];
    let Some(end) = rest.find(' ') else {
        return (-1, -1);
    };
    let token = &rest[..end];
    let parsed: Result<(i64, i64), _> = match token.split_once(',') {
        Some((start, length)) => start.parse().and_then(|s| length.parse().map(|l| (s, l))),
        None => token.parse().map(|l| (1, l)),
    };
    parsed.unwrap_or((-1, -1))
}

/// Marker-stripped copy of a diff content line. The caller guarantees the
/// content starts with `width` bytes of ASCII marker.
pub(crate) fn payload(line: &Line, width: usize) -> Line {
    Line::new(&line.content()[width..], line.ending())
}

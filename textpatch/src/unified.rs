//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Unified diff sections.

use crate::lines::Line;
use crate::parser::{extract_date, extract_pair, extract_path, payload, split_header};
use crate::types::{FileDiff, Hunk, HunkLine, ParseWarning};

/// Escape-marker text that cancels the previous line's terminator.
const NO_NEWLINE_MARKER: &str = "No newline at end of file";

/// Read one unified file section starting at the `--- ` line at `start`.
///
/// Returns the parsed section, or `None` when the header pair is broken,
/// along with the position of the first line that does not belong to the
/// section. That line is left for the outer scan to reconsider.
pub(crate) fn read_unified(
    lines: &[Line],
    start: usize,
    index_name: Option<&str>,
    warnings: &mut Vec<ParseWarning>,
) -> (Option<FileDiff>, usize) {
    let old_args = split_header(&lines[start].content()[4..]);
    let mut pos = start + 1;
    if pos >= lines.len() || !lines[pos].content().starts_with("+++ ") {
        return (None, pos);
    }
    let new_args = split_header(&lines[pos].content()[4..]);
    pos += 1;

    let mut diff = FileDiff::new(
        extract_path(&old_args, index_name),
        extract_date(&old_args),
        extract_path(&new_args, index_name),
        extract_date(&new_args),
    );

    let mut old_range = (0, 0);
    let mut new_range = (0, 0);
    let mut buffered: Vec<HunkLine> = Vec::new();

    while pos < lines.len() {
        let line = &lines[pos];
        let content = line.content();
        // Blank separator lines inside a section carry no content.
        if content.is_empty() {
            pos += 1;
            continue;
        }
        match content.as_bytes()[0] {
            b'@' => {
                if !content.starts_with("@@ ") {
                    break;
                }
                flush_hunk(&mut diff, old_range, new_range, &mut buffered);
                old_range = extract_pair(content, '-');
                new_range = extract_pair(content, '+');
                if old_range.0 < 0 || new_range.0 < 0 {
                    log::debug!("unreadable hunk header {:?}", content);
                    warnings.push(ParseWarning::MalformedRange {
                        line: pos + 1,
                        header: content.to_string(),
                    });
                }
            }
            b' ' => buffered.push(HunkLine::Context(payload(line, 1))),
            b'+' => buffered.push(HunkLine::Add(payload(line, 1))),
            b'-' => buffered.push(HunkLine::Delete(payload(line, 1))),
            b'\\' => {
                if content.contains(NO_NEWLINE_MARKER) {
                    if let Some(last) = buffered.last_mut() {
                        last.line_mut().strip_ending();
                    }
                }
            }
            _ => break,
        }
        pos += 1;
    }

    flush_hunk(&mut diff, old_range, new_range, &mut buffered);
    diff.normalize();
    (Some(diff), pos)
}

fn flush_hunk(
    diff: &mut FileDiff,
    old_range: (i64, i64),
    new_range: (i64, i64),
    buffered: &mut Vec<HunkLine>,
) {
    if buffered.is_empty() {
        return;
    }
    diff.hunks.push(Hunk {
        old_start: old_range.0,
        old_length: old_range.1,
        new_start: new_range.0,
        new_length: new_range.1,
        lines: std::mem::take(buffered),
    });
}

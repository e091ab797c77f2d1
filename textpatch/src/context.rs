//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Context diff sections.

use std::sync::LazyLock;

use regex::Regex;

use crate::lines::Line;
use crate::parser::{extract_date, extract_pair, extract_path, payload, split_header};
use crate::types::{FileDiff, Hunk, HunkLine, ParseWarning};

/// Separator between context hunks; real diffs pad it to 15 stars or more.
const HUNK_SEPARATOR: &str = "***************";

static OLD_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\* \d+(?:,\d+)? \*\*\*\*").expect("invalid regex"));

static NEW_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- \d+(?:,\d+)? ----").expect("invalid regex"));

/// Read one context file section starting at the `*** ` line at `start`.
///
/// Each hunk's two sides are buffered separately and merged into the
/// unified hunk representation when the hunk ends. Returns the parsed
/// section, or `None` when the header pair is broken, along with the
/// position of the first line that does not belong to the section.
pub(crate) fn read_context(
    lines: &[Line],
    start: usize,
    index_name: Option<&str>,
    warnings: &mut Vec<ParseWarning>,
) -> (Option<FileDiff>, usize) {
    let old_args = split_header(&lines[start].content()[4..]);
    let mut pos = start + 1;
    if pos >= lines.len() || !lines[pos].content().starts_with("--- ") {
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

    let mut old_side: Vec<(u8, Line)> = Vec::new();
    let mut new_side: Vec<(u8, Line)> = Vec::new();
    let mut old_range = (0, 0);
    let mut new_range = (0, 0);
    let mut on_new_side = false;
    let mut hunk_line_number = pos + 1;

    while pos < lines.len() {
        let line = &lines[pos];
        let content = line.content();
        if content.starts_with(HUNK_SEPARATOR) {
            flush_hunk(
                &mut diff.hunks,
                warnings,
                old_range,
                new_range,
                &mut old_side,
                &mut new_side,
                hunk_line_number,
            );
            hunk_line_number = pos + 1;
            on_new_side = false;
            pos += 1;
            continue;
        }
        if OLD_RANGE_RE.is_match(content) {
            old_range = to_length(extract_pair(content, ' '));
            if old_range.0 < 0 {
                warnings.push(ParseWarning::MalformedRange {
                    line: pos + 1,
                    header: content.to_string(),
                });
            }
            on_new_side = false;
            pos += 1;
            continue;
        }
        if NEW_RANGE_RE.is_match(content) {
            new_range = to_length(extract_pair(content, ' '));
            if new_range.0 < 0 {
                warnings.push(ParseWarning::MalformedRange {
                    line: pos + 1,
                    header: content.to_string(),
                });
            }
            on_new_side = true;
            pos += 1;
            continue;
        }
        let bytes = content.as_bytes();
        if bytes.len() >= 2 && bytes[1] == b' ' && matches!(bytes[0], b' ' | b'+' | b'-' | b'!') {
            let side = if on_new_side {
                &mut new_side
            } else {
                &mut old_side
            };
            side.push((bytes[0], payload(line, 2)));
            pos += 1;
            continue;
        }
        break;
    }

    flush_hunk(
        &mut diff.hunks,
        warnings,
        old_range,
        new_range,
        &mut old_side,
        &mut new_side,
        hunk_line_number,
    );
    diff.normalize();
    (Some(diff), pos)
}

/// Inclusive start,end ranges become start,length.
fn to_length((start, end): (i64, i64)) -> (i64, i64) {
    if start < 0 {
        return (start, end);
    }
    (start, (end - start).saturating_add(1))
}

fn flush_hunk(
    hunks: &mut Vec<Hunk>,
    warnings: &mut Vec<ParseWarning>,
    old_range: (i64, i64),
    new_range: (i64, i64),
    old_side: &mut Vec<(u8, Line)>,
    new_side: &mut Vec<(u8, Line)>,
    line: usize,
) {
    if old_side.is_empty() && new_side.is_empty() {
        return;
    }
    match unify_sides(old_side, new_side) {
        Ok(lines) => hunks.push(Hunk {
            old_start: old_range.0,
            old_length: old_range.1,
            new_start: new_range.0,
            new_length: new_range.1,
            lines,
        }),
        Err(()) => {
            log::debug!("dropping context hunk at line {}: sides disagree", line);
            warnings.push(ParseWarning::ContextMismatch { line });
        }
    }
    old_side.clear();
    new_side.clear();
}

/// Merge the two sides of a context hunk into one tagged sequence.
///
/// Old-side `-` and `!` runs come out as deletions, new-side `+` and `!`
/// runs as additions. Lines the two sides share must be textually
/// identical; a side whose counterpart is omitted supplies context on its
/// own.
fn unify_sides(old: &[(u8, Line)], new: &[(u8, Line)]) -> Result<Vec<HunkLine>, ()> {
    let mut lines = Vec::new();
    let mut oi = 0;
    let mut ni = 0;
    while oi < old.len() || ni < new.len() {
        if oi < old.len() && old[oi].0 == b'-' {
            while oi < old.len() && old[oi].0 == b'-' {
                lines.push(HunkLine::Delete(old[oi].1.clone()));
                oi += 1;
            }
            continue;
        }
        if ni < new.len() && new[ni].0 == b'+' {
            while ni < new.len() && new[ni].0 == b'+' {
                lines.push(HunkLine::Add(new[ni].1.clone()));
                ni += 1;
            }
            continue;
        }
        if oi < old.len() && old[oi].0 == b'!' {
            while oi < old.len() && old[oi].0 == b'!' {
                lines.push(HunkLine::Delete(old[oi].1.clone()));
                oi += 1;
            }
        }
        if ni < new.len() && new[ni].0 == b'!' {
            while ni < new.len() && new[ni].0 == b'!' {
                lines.push(HunkLine::Add(new[ni].1.clone()));
                ni += 1;
            }
            continue;
        }
        match (old.get(oi), new.get(ni)) {
            (Some(o), Some(n)) => {
                if o.0 != n.0 || o.1 != n.1 {
                    return Err(());
                }
                lines.push(HunkLine::Context(o.1.clone()));
                oi += 1;
                ni += 1;
            }
            (Some(o), None) => {
                lines.push(HunkLine::Context(o.1.clone()));
                oi += 1;
            }
            (None, Some(n)) => {
                lines.push(HunkLine::Context(n.1.clone()));
                ni += 1;
            }
            (None, None) => break,
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::LineEnding;
    use crate::parser::parse_str;
    use std::path::PathBuf;

    fn lf(s: &str) -> Line {
        Line::new(s, LineEnding::Lf)
    }

    #[test]
    fn test_change_hunk_unifies_both_sides() {
        let text = concat!(
            "*** a/f.txt\tThu Sep 24 10:11:12 2020\n",
            "--- b/f.txt\tThu Sep 24 10:11:13 2020\n",
            "***************\n",
            "*** 1,3 ****\n",
            "  a\n",
            "! b\n",
            "  c\n",
            "--- 1,3 ----\n",
            "  a\n",
            "! B\n",
            "  c\n",
        );
        let patch = parse_str(text);
        assert!(patch.warnings.is_empty());
        assert_eq!(patch.diffs.len(), 1);
        let hunk = &patch.diffs[0].hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_length, hunk.new_start, hunk.new_length),
            (1, 3, 1, 3)
        );
        assert_eq!(
            hunk.lines,
            vec![
                HunkLine::Context(lf("a")),
                HunkLine::Delete(lf("b")),
                HunkLine::Add(lf("B")),
                HunkLine::Context(lf("c")),
            ]
        );
    }

    #[test]
    fn test_add_only_hunk_with_omitted_old_side() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "***************\n",
            "*** 1,2 ****\n",
            "--- 1,3 ----\n",
            "  a\n",
            "+ x\n",
            "  b\n",
        );
        let patch = parse_str(text);
        let hunk = &patch.diffs[0].hunks[0];
        assert_eq!((hunk.old_start, hunk.old_length), (1, 2));
        assert_eq!((hunk.new_start, hunk.new_length), (1, 3));
        assert_eq!(
            hunk.lines,
            vec![
                HunkLine::Context(lf("a")),
                HunkLine::Add(lf("x")),
                HunkLine::Context(lf("b")),
            ]
        );
    }

    #[test]
    fn test_delete_only_hunk_with_omitted_new_side() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "***************\n",
            "*** 1,3 ****\n",
            "  a\n",
            "- x\n",
            "  b\n",
            "--- 1,2 ----\n",
        );
        let patch = parse_str(text);
        let hunk = &patch.diffs[0].hunks[0];
        assert_eq!(
            hunk.lines,
            vec![
                HunkLine::Context(lf("a")),
                HunkLine::Delete(lf("x")),
                HunkLine::Context(lf("b")),
            ]
        );
    }

    #[test]
    fn test_context_mismatch_drops_hunk_with_warning() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "***************\n",
            "*** 1,2 ****\n",
            "  a\n",
            "! b\n",
            "--- 1,2 ----\n",
            "  z\n",
            "! B\n",
        );
        let patch = parse_str(text);
        assert_eq!(patch.diffs.len(), 1);
        assert!(patch.diffs[0].hunks.is_empty());
        assert_eq!(patch.warnings.len(), 1);
        assert!(matches!(patch.warnings[0], ParseWarning::ContextMismatch { .. }));
    }

    #[test]
    fn test_two_hunks_split_by_separator() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "***************\n",
            "*** 1,2 ****\n",
            "! a\n",
            "  b\n",
            "--- 1,2 ----\n",
            "! A\n",
            "  b\n",
            "***************\n",
            "*** 10,11 ****\n",
            "  x\n",
            "- y\n",
            "--- 10,10 ----\n",
        );
        let patch = parse_str(text);
        assert_eq!(patch.diffs[0].hunks.len(), 2);
        assert_eq!(patch.diffs[0].hunks[1].old_start, 10);
        // Inclusive 10,10 is a single line.
        assert_eq!(patch.diffs[0].hunks[1].new_length, 1);
    }

    #[test]
    fn test_separator_longer_than_minimum() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "********************\n",
            "*** 1,1 ****\n",
            "! a\n",
            "--- 1,1 ----\n",
            "! A\n",
        );
        let patch = parse_str(text);
        assert_eq!(patch.diffs[0].hunks.len(), 1);
    }

    #[test]
    fn test_single_number_range_reads_like_a_pair() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "***************\n",
            "*** 1,2 ****\n",
            "- x\n",
            "- y\n",
            "--- 0 ----\n",
        );
        let patch = parse_str(text);
        let hunk = &patch.diffs[0].hunks[0];
        // Lone 0 reads as the pair 1,0: an empty new side.
        assert_eq!((hunk.new_start, hunk.new_length), (1, 0));
        // One deleting hunk keeps the file identity.
        assert_eq!(patch.diffs[0].new_path, Some(PathBuf::from("a/f")));
    }

    #[test]
    fn test_inclusive_range_length_saturates_at_the_limit() {
        let text = concat!(
            "*** a/f\n",
            "--- b/f\n",
            "***************\n",
            "*** 0,9223372036854775807 ****\n",
            "- x\n",
            "--- 1,1 ----\n",
        );
        let patch = parse_str(text);
        let hunk = &patch.diffs[0].hunks[0];
        // The end-inclusive span is one line longer than the domain holds.
        assert_eq!((hunk.old_start, hunk.old_length), (0, i64::MAX));
    }

    #[test]
    fn test_next_file_header_ends_section() {
        let text = concat!(
            "*** a/f1\n",
            "--- b/f1\n",
            "***************\n",
            "*** 1,1 ****\n",
            "! a\n",
            "--- 1,1 ----\n",
            "! A\n",
            "*** a/f2\n",
            "--- b/f2\n",
            "***************\n",
            "*** 1,1 ****\n",
            "! x\n",
            "--- 1,1 ----\n",
            "! X\n",
        );
        let patch = parse_str(text);
        assert_eq!(patch.diffs.len(), 2);
        assert_eq!(patch.diffs[1].old_path, Some(PathBuf::from("a/f2")));
        assert_eq!(patch.diffs[1].hunks.len(), 1);
    }
}

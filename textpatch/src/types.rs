//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Core data types for diff parsing and application.

use std::fmt;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

use crate::lines::{Line, LineEnding};
use crate::options::PatchOptions;

/// Timestamp sentinel for "no date given", also used for `/dev/null` sides.
pub const DATE_UNKNOWN: i64 = 0;

/// Path sentinel meaning "no file on this side".
pub(crate) const DEV_NULL: &str = "/dev/null";

/// Header date formats, tried in order. Diffs in the wild carry either the
/// traditional ctime form or the slashed ISO-like form.
const DATE_FORMATS: [&str; 2] = ["%a %b %d %H:%M:%S %Y", "%Y/%m/%d %H:%M:%S"];

/// Parse a header date token into epoch milliseconds, `DATE_UNKNOWN` when
/// no known format matches.
pub(crate) fn parse_date(token: &str) -> i64 {
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(token, format) {
            return dt.and_utc().timestamp_millis();
        }
    }
    DATE_UNKNOWN
}

/// Render a stored timestamp in the traditional header form.
pub(crate) fn render_date(date: i64) -> Option<String> {
    if date == DATE_UNKNOWN {
        return None;
    }
    let dt = DateTime::from_timestamp_millis(date)?;
    Some(dt.naive_utc().format(DATE_FORMATS[0]).to_string())
}

/// One tagged content line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    /// Present in both files, used to anchor the hunk.
    Context(Line),
    /// Inserted by the patch.
    Add(Line),
    /// Removed by the patch.
    Delete(Line),
}

impl HunkLine {
    /// The tagged payload.
    pub fn line(&self) -> &Line {
        match self {
            HunkLine::Context(l) | HunkLine::Add(l) | HunkLine::Delete(l) => l,
        }
    }

    pub(crate) fn line_mut(&mut self) -> &mut Line {
        match self {
            HunkLine::Context(l) | HunkLine::Add(l) | HunkLine::Delete(l) => l,
        }
    }
}

/// One contiguous block of changes within a file diff.
///
/// Starts are 1-indexed as written in hunk headers; a header that could
/// not be read leaves all four range fields at the -1 sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: i64,
    pub old_length: i64,
    pub new_start: i64,
    pub new_length: i64,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Swap the direction of the edit: ranges exchanged, `Add` and
    /// `Delete` roles exchanged, `Context` kept.
    pub fn reverse(&mut self) {
        mem::swap(&mut self.old_start, &mut self.new_start);
        mem::swap(&mut self.old_length, &mut self.new_length);
        for line in &mut self.lines {
            *line = match line {
                HunkLine::Context(l) => HunkLine::Context(l.clone()),
                HunkLine::Add(l) => HunkLine::Delete(l.clone()),
                HunkLine::Delete(l) => HunkLine::Add(l.clone()),
            };
        }
    }
}

impl fmt::Display for Hunk {
    /// Rendered in the unified profile regardless of the dialect the hunk
    /// was read from. A line kept without terminator is followed by the
    /// no-newline escape marker.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_length, self.new_start, self.new_length
        )?;
        for hunk_line in &self.lines {
            let marker = match hunk_line {
                HunkLine::Context(_) => ' ',
                HunkLine::Add(_) => '+',
                HunkLine::Delete(_) => '-',
            };
            let line = hunk_line.line();
            write!(f, "{}{}", marker, line)?;
            if line.ending() == LineEnding::None {
                write!(f, "\n\\ No newline at end of file\n")?;
            }
        }
        Ok(())
    }
}

/// Classification of a file diff, derived from its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Addition,
    Deletion,
    Modification,
}

/// All changes a patch makes to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub old_path: Option<PathBuf>,
    pub old_date: i64,
    pub new_path: Option<PathBuf>,
    pub new_date: i64,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// A `None` path means the file does not exist on that side, so its
    /// timestamp is forced to `DATE_UNKNOWN`.
    pub fn new(
        old_path: Option<PathBuf>,
        old_date: i64,
        new_path: Option<PathBuf>,
        new_date: i64,
    ) -> Self {
        let old_date = if old_path.is_none() {
            DATE_UNKNOWN
        } else {
            old_date
        };
        let new_date = if new_path.is_none() {
            DATE_UNKNOWN
        } else {
            new_date
        };
        Self {
            old_path,
            old_date,
            new_path,
            new_date,
            hunks: Vec::new(),
        }
    }

    /// A missing old timestamp means the file is being created, a missing
    /// new timestamp that it is being removed.
    pub fn kind(&self) -> DiffKind {
        if self.old_date == DATE_UNKNOWN {
            DiffKind::Addition
        } else if self.new_date == DATE_UNKNOWN {
            DiffKind::Deletion
        } else {
            DiffKind::Modification
        }
    }

    /// Path the diff addresses, preferring the old side.
    pub fn path(&self) -> Option<&Path> {
        self.old_path.as_deref().or(self.new_path.as_deref())
    }

    /// Path with the configured number of leading segments removed. A
    /// strip count of zero, or one that reaches the last segment, leaves
    /// the path whole.
    pub fn target_path(&self, options: &PatchOptions) -> Option<PathBuf> {
        let path = self.path()?;
        let strip = options.strip_prefix_segments();
        if strip == 0 {
            return Some(path.to_path_buf());
        }
        let segments: Vec<_> = path.iter().collect();
        if strip >= segments.len() {
            return Some(path.to_path_buf());
        }
        Some(segments[strip..].iter().collect())
    }

    /// Swap the direction of the whole file diff.
    pub fn reverse(&mut self) {
        mem::swap(&mut self.old_path, &mut self.new_path);
        mem::swap(&mut self.old_date, &mut self.new_date);
        for hunk in &mut self.hunks {
            hunk.reverse();
        }
    }

    /// A lone hunk with an empty new side deletes content but keeps the
    /// file itself: fold the new identity back onto the old so the diff
    /// does not read as a removal of one file and creation of another.
    pub(crate) fn normalize(&mut self) {
        if self.hunks.len() == 1 && self.hunks[0].new_length == 0 {
            self.new_path = self.old_path.clone();
            self.new_date = self.old_date;
        }
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_file_header(f, "--- ", &self.old_path, self.old_date)?;
        write_file_header(f, "+++ ", &self.new_path, self.new_date)?;
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}

fn write_file_header(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    path: &Option<PathBuf>,
    date: i64,
) -> fmt::Result {
    match path {
        Some(p) => write!(f, "{}{}", prefix, p.display())?,
        None => write!(f, "{}{}", prefix, DEV_NULL)?,
    }
    match render_date(date) {
        Some(d) => writeln!(f, "\t{}", d),
        None => writeln!(f),
    }
}

/// Trouble the parser ran into and recovered from. Warnings accompany the
/// parsed diffs instead of aborting the parse.
#[derive(Error, Debug)]
pub enum ParseWarning {
    /// A hunk range header that could not be read as numbers.
    #[error("line {line}: malformed hunk range {header:?}")]
    MalformedRange { line: usize, header: String },
    /// Old and new sides of a context hunk disagree on a shared line.
    #[error("line {line}: old and new context lines disagree")]
    ContextMismatch { line: usize },
    /// Input ended early because the underlying reader failed.
    #[error("input truncated after line {line}: {source}")]
    Truncated { line: usize, source: io::Error },
}

/// Parser output: the file diffs in input order plus anything the parser
/// had to note along the way.
#[derive(Debug)]
pub struct Patch {
    pub diffs: Vec<FileDiff>,
    pub warnings: Vec<ParseWarning>,
}

/// Outcome of applying one file diff to a line buffer.
#[derive(Debug)]
pub struct ApplyResult {
    /// The patched line sequence.
    pub lines: Vec<Line>,
    /// Hunks that could not be placed, in input order. The rest of the
    /// patch is applied around them.
    pub failed: Vec<Hunk>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::LineEnding;

    fn lf(s: &str) -> Line {
        Line::new(s, LineEnding::Lf)
    }

    #[test]
    fn test_parse_date_formats_agree() {
        let traditional = parse_date("Thu Sep 24 10:11:12 2020");
        let slashed = parse_date("2020/09/24 10:11:12");
        assert_ne!(traditional, DATE_UNKNOWN);
        assert_eq!(traditional, slashed);
    }

    #[test]
    fn test_parse_date_garbage_is_unknown() {
        assert_eq!(parse_date("four score"), DATE_UNKNOWN);
        assert_eq!(parse_date(""), DATE_UNKNOWN);
    }

    #[test]
    fn test_render_date_round_trip() {
        let text = "Thu Sep 24 10:11:12 2020";
        assert_eq!(render_date(parse_date(text)).as_deref(), Some(text));
        assert_eq!(render_date(DATE_UNKNOWN), None);
    }

    #[test]
    fn test_kind_follows_dates() {
        let date = parse_date("Thu Sep 24 10:11:12 2020");
        let adds = FileDiff::new(None, DATE_UNKNOWN, Some("f".into()), date);
        assert_eq!(adds.kind(), DiffKind::Addition);
        let removes = FileDiff::new(Some("f".into()), date, None, DATE_UNKNOWN);
        assert_eq!(removes.kind(), DiffKind::Deletion);
        let modifies = FileDiff::new(Some("f".into()), date, Some("f".into()), date);
        assert_eq!(modifies.kind(), DiffKind::Modification);
    }

    #[test]
    fn test_missing_path_forces_unknown_date() {
        let diff = FileDiff::new(None, 123, Some("f".into()), 456);
        assert_eq!(diff.old_date, DATE_UNKNOWN);
        assert_eq!(diff.new_date, 456);
    }

    #[test]
    fn test_path_prefers_old_side() {
        let diff = FileDiff::new(Some("old".into()), 1, Some("new".into()), 2);
        assert_eq!(diff.path(), Some(Path::new("old")));
        let added = FileDiff::new(None, DATE_UNKNOWN, Some("new".into()), 2);
        assert_eq!(added.path(), Some(Path::new("new")));
    }

    #[test]
    fn test_target_path_stripping() {
        let diff = FileDiff::new(Some("a/b/c.txt".into()), 1, Some("a/b/c.txt".into()), 2);
        let mut options = PatchOptions::new();
        assert_eq!(diff.target_path(&options), Some(PathBuf::from("a/b/c.txt")));
        options.set_strip_prefix_segments(1);
        assert_eq!(diff.target_path(&options), Some(PathBuf::from("b/c.txt")));
        options.set_strip_prefix_segments(2);
        assert_eq!(diff.target_path(&options), Some(PathBuf::from("c.txt")));
        // Stripping everything would leave nothing, so the path is kept.
        options.set_strip_prefix_segments(3);
        assert_eq!(diff.target_path(&options), Some(PathBuf::from("a/b/c.txt")));
    }

    #[test]
    fn test_reverse_swaps_roles() {
        let date = parse_date("Thu Sep 24 10:11:12 2020");
        let mut diff = FileDiff::new(None, DATE_UNKNOWN, Some("f".into()), date);
        diff.hunks.push(Hunk {
            old_start: 0,
            old_length: 0,
            new_start: 1,
            new_length: 1,
            lines: vec![HunkLine::Add(lf("x"))],
        });
        diff.reverse();
        assert_eq!(diff.kind(), DiffKind::Deletion);
        assert_eq!(diff.old_path, Some(PathBuf::from("f")));
        assert_eq!(diff.hunks[0].old_start, 1);
        assert_eq!(diff.hunks[0].new_length, 0);
        assert_eq!(diff.hunks[0].lines, vec![HunkLine::Delete(lf("x"))]);
    }

    #[test]
    fn test_hunk_display_unified_profile() {
        let hunk = Hunk {
            old_start: 1,
            old_length: 3,
            new_start: 1,
            new_length: 3,
            lines: vec![
                HunkLine::Context(lf("a")),
                HunkLine::Delete(lf("b")),
                HunkLine::Add(lf("B")),
                HunkLine::Context(lf("c")),
            ],
        };
        assert_eq!(hunk.to_string(), "@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n");
    }

    #[test]
    fn test_hunk_display_no_newline_marker() {
        let hunk = Hunk {
            old_start: 1,
            old_length: 1,
            new_start: 1,
            new_length: 1,
            lines: vec![
                HunkLine::Delete(lf("old")),
                HunkLine::Add(Line::new("new", LineEnding::None)),
            ],
        };
        assert_eq!(
            hunk.to_string(),
            "@@ -1,1 +1,1 @@\n-old\n+new\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn test_file_diff_display_headers() {
        let date = parse_date("Thu Sep 24 10:11:12 2020");
        let diff = FileDiff::new(None, DATE_UNKNOWN, Some("b/new.txt".into()), date);
        assert_eq!(
            diff.to_string(),
            "--- /dev/null\n+++ b/new.txt\tThu Sep 24 10:11:12 2020\n"
        );
    }

    #[test]
    fn test_normalize_folds_lone_deletion_hunk() {
        let mut diff = FileDiff::new(Some("a/f".into()), 10, Some("b/f".into()), 20);
        diff.hunks.push(Hunk {
            old_start: 1,
            old_length: 2,
            new_start: 0,
            new_length: 0,
            lines: vec![HunkLine::Delete(lf("x")), HunkLine::Delete(lf("y"))],
        });
        diff.normalize();
        assert_eq!(diff.new_path, Some(PathBuf::from("a/f")));
        assert_eq!(diff.new_date, 10);
    }
}

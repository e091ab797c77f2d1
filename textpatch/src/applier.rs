//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Hunk application with positional fuzz recovery.

use crate::lines::Line;
use crate::options::PatchOptions;
use crate::types::{ApplyResult, FileDiff, Hunk, HunkLine};

/// Apply `diff` to a file's lines under `options`.
pub fn apply(diff: &FileDiff, lines: Vec<Line>, options: &PatchOptions) -> ApplyResult {
    PatchApplier::new(options, lines).apply(diff)
}

/// Applies one file's hunks to its line buffer.
///
/// Hunks are placed in order. Each is probed read-only at its expected
/// position first, then at growing offsets within the fuzz window, and
/// only a successful probe mutates the buffer. The net line delta of
/// every placed hunk shifts the expected position of the hunks after it;
/// a failed hunk leaves the shift untouched.
pub struct PatchApplier<'a> {
    options: &'a PatchOptions,
    lines: Vec<Line>,
    shift: i64,
    failed: Vec<Hunk>,
}

impl<'a> PatchApplier<'a> {
    pub fn new(options: &'a PatchOptions, lines: Vec<Line>) -> Self {
        Self {
            options,
            lines,
            shift: 0,
            failed: Vec::new(),
        }
    }

    /// Apply every hunk in file order. Failures are collected, not fatal.
    pub fn apply(mut self, diff: &FileDiff) -> ApplyResult {
        for hunk in &diff.hunks {
            self.apply_hunk(hunk);
        }
        ApplyResult {
            lines: self.lines,
            failed: self.failed,
        }
    }

    fn apply_hunk(&mut self, hunk: &Hunk) {
        match self.locate(hunk) {
            Some(shift) => {
                if shift != self.shift {
                    log::debug!(
                        "hunk at {} applied with offset {}",
                        hunk.old_start, shift - self.shift
                    );
                }
                self.materialize(hunk, shift);
                let delta = hunk.new_length.saturating_sub(hunk.old_length);
                self.shift = shift.saturating_add(delta);
            }
            None => {
                log::debug!(
                    "hunk at {} does not apply within fuzz {}",
                    hunk.old_start, self.options.fuzz()
                );
                self.failed.push(hunk.clone());
            }
        }
    }

    /// Find a shift at which the hunk's old side matches: the carried
    /// shift first, then nearer-before positions, then after. The first
    /// success wins and is carried forward.
    fn locate(&self, hunk: &Hunk) -> Option<i64> {
        if self.probe(hunk, self.shift) {
            return Some(self.shift);
        }
        let fuzz = self.options.fuzz() as i64;
        for delta in 1..fuzz {
            let shift = self.shift.saturating_sub(delta);
            if self.probe(hunk, shift) {
                return Some(shift);
            }
        }
        for delta in 1..fuzz {
            let shift = self.shift.saturating_add(delta);
            if self.probe(hunk, shift) {
                return Some(shift);
            }
        }
        None
    }

    /// Check without mutating whether the hunk fits at `shift`. Context
    /// and delete lines must appear in order; once at least one line of a
    /// kind has matched, later lines of that kind may scan forward past
    /// interlopers. Running off either end of the buffer fails.
    fn probe(&self, hunk: &Hunk, shift: i64) -> bool {
        let len = self.lines.len() as i64;
        let mut pos = base_index(hunk).saturating_add(shift);
        let mut context_matched = false;
        let mut delete_matched = false;
        for hunk_line in &hunk.lines {
            let (want, matched_before) = match hunk_line {
                HunkLine::Add(_) => continue,
                HunkLine::Context(want) => (want, &mut context_matched),
                HunkLine::Delete(want) => (want, &mut delete_matched),
            };
            loop {
                if pos < 0 || pos >= len {
                    return false;
                }
                if self.lines_match(want, &self.lines[pos as usize]) {
                    *matched_before = true;
                    pos += 1;
                    break;
                }
                if !*matched_before {
                    return false;
                }
                pos += 1;
            }
        }
        true
    }

    /// Rewrite the buffer with the hunk placed at `shift`. The probe has
    /// already succeeded there; the scans below retrace its path.
    fn materialize(&mut self, hunk: &Hunk, shift: i64) {
        let mut pos = base_index(hunk).saturating_add(shift).max(0) as usize;
        pos = pos.min(self.lines.len());
        for hunk_line in &hunk.lines {
            match hunk_line {
                HunkLine::Context(want) => {
                    while pos < self.lines.len() {
                        let matched = self.lines_match(want, &self.lines[pos]);
                        pos += 1;
                        if matched {
                            break;
                        }
                    }
                }
                HunkLine::Delete(want) => {
                    while pos < self.lines.len() {
                        if self.lines_match(want, &self.lines[pos]) {
                            self.lines.remove(pos);
                            break;
                        }
                        pos += 1;
                    }
                }
                HunkLine::Add(line) => {
                    let at = pos.min(self.lines.len());
                    self.lines.insert(at, line.clone());
                    pos = at + 1;
                }
            }
        }
    }

    fn lines_match(&self, expected: &Line, actual: &Line) -> bool {
        if self.options.ignore_whitespace() {
            eq_ignore_whitespace(expected.content(), actual.content())
        } else {
            expected == actual
        }
    }
}

/// 0-based nominal position of a 1-based hunk start. Starts at or below
/// zero, including the malformed-range sentinel, clamp to the top.
fn base_index(hunk: &Hunk) -> i64 {
    hunk.old_start.saturating_sub(1).max(0)
}

/// Equality after dropping every whitespace character from both sides.
fn eq_ignore_whitespace(a: &str, b: &str) -> bool {
    a.chars()
        .filter(|c| !c.is_whitespace())
        .eq(b.chars().filter(|c| !c.is_whitespace()))
}

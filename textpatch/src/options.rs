//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Session options for patch application.

/// Default width of the window searched around a hunk's expected
/// position. A fuzz of `n` tries offsets up to `n - 1` lines away.
pub const DEFAULT_FUZZ: usize = 2;

/// Options shared by a patching session. Setters report whether the
/// value actually changed so callers can invalidate cached previews.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    strip_prefix_segments: usize,
    fuzz: usize,
    ignore_whitespace: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            strip_prefix_segments: 0,
            fuzz: DEFAULT_FUZZ,
            ignore_whitespace: false,
        }
    }
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leading path segments removed when resolving diff paths.
    pub fn strip_prefix_segments(&self) -> usize {
        self.strip_prefix_segments
    }

    /// Width of the hunk placement search window.
    pub fn fuzz(&self) -> usize {
        self.fuzz
    }

    /// Whether line comparison disregards whitespace.
    pub fn ignore_whitespace(&self) -> bool {
        self.ignore_whitespace
    }

    pub fn set_strip_prefix_segments(&mut self, n: usize) -> bool {
        let changed = self.strip_prefix_segments != n;
        self.strip_prefix_segments = n;
        changed
    }

    pub fn set_fuzz(&mut self, fuzz: usize) -> bool {
        let changed = self.fuzz != fuzz;
        self.fuzz = fuzz;
        changed
    }

    pub fn set_ignore_whitespace(&mut self, ignore: bool) -> bool {
        let changed = self.ignore_whitespace != ignore;
        self.ignore_whitespace = ignore;
        changed
    }
}

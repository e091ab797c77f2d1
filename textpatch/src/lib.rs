//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the textpatch project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Parse unified and context diffs into one structured model and apply
//! them to in-memory line sequences.
//!
//! Both dialects normalize to the same [`Hunk`] representation, so the
//! applier never needs to know which format a patch arrived in. Lines
//! keep their original terminators end to end: splitting a file and
//! joining it again reproduces the input bytes exactly. Application is
//! tolerant by construction. Hunks that do not fit at their expected
//! position are retried within a small window, and the ones that still
//! fail are reported alongside the patched result instead of aborting.

mod applier;
mod context;
mod lines;
mod options;
mod parser;
mod types;
mod unified;

pub use applier::{apply, PatchApplier};
pub use lines::{join, split, Line, LineEnding, LineSplitter};
pub use options::{DEFAULT_FUZZ, PatchOptions};
pub use parser::{parse, parse_str};
pub use types::{ApplyResult, DATE_UNKNOWN, DiffKind, FileDiff, Hunk, HunkLine, ParseWarning, Patch};

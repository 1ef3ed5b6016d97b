// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Status channel: a small JSON record a run rewrites as it progresses.
//!
//! The writer side is [`StatusFile`]; observers use [`read_status`] and must
//! tolerate a record that does not exist yet or lacks any field.

mod file;
mod snapshot;
mod stopwatch;

pub use file::StatusFile;
pub use snapshot::{read_status, RunState, StatusSnapshot};
pub use stopwatch::{format_td, Stopwatch};

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Trajectory tables: append-only, frame-ordered storage of linked points.
//!
//! [`TableWriter`] is the only writer and is used by one run at a time.
//! [`TrackStore`] and [`TrackTable`] are read-only and tolerate a writer that
//! is still appending: they see every frame committed before they opened the
//! table, and treat a table without indices as possibly incomplete.

pub mod format;
mod index;
mod interpolate;
mod quality;
mod reader;
mod writer;

pub use format::TrackPoint;
pub use index::{FrameRun, TrackEntry};
pub use interpolate::InterpolatedPoint;
pub use quality::{compute_quality, QualitySample};
pub use reader::{TrackStore, TrackTable};
pub use writer::{rebuild_indices, IndexSummary, TableWriter};

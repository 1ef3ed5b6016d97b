// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tracking quality diagnostics.
//!
//! For frames sampled every `frame_interval` frames starting at the first
//! frame, reports how many points were tracked (`n`) and how many of the
//! tracks present in the first sampled frame are still present (`n_conserved`).
//! A steep drop in `n_conserved` usually means the search range is too small.

use std::collections::HashSet;

use crate::errors::StorageError;
use crate::storage::TrackTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySample {
    pub frame: u32,
    pub n: usize,
    pub n_conserved: usize,
}

pub fn compute_quality(table: &TrackTable, frame_interval: u32) -> Result<Vec<QualitySample>, StorageError> {
    let step = frame_interval.max(1);
    let range = table.frame_range()?;

    let mut origin: Option<HashSet<u32>> = None;
    let mut samples = Vec::new();
    for frame in range.step_by(step as usize) {
        let ids: HashSet<u32> = table.get_frame(frame)?.iter().map(|r| r.track_id).collect();
        let origin = origin.get_or_insert_with(|| ids.clone());
        samples.push(QualitySample {
            frame,
            n: ids.len(),
            n_conserved: ids.intersection(origin).count(),
        });
    }
    Ok(samples)
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Linking engine: per-frame point sets in, persistent track identities out.
//!
//! The pipeline only relies on the [`Linker`](crate::traits::Linker) contract.
//! [`NearestNeighborLinker`] is the built-in implementation.

mod nearest;

use std::path::PathBuf;

pub use nearest::NearestNeighborLinker;

use crate::features::Point;

/// A point annotated with its persistent track identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkedPoint {
    pub track_id: u32,
    pub point: Point,
}

/// One frame of linked points, in the same order as the frame's input points.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedFrame {
    pub frame: u32,
    pub image: PathBuf,
    pub points: Vec<LinkedPoint>,
}

impl LinkedFrame {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

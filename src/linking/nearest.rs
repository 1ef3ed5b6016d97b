// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::PipelineError;
use crate::features::{FrameFeatures, Point};
use crate::linking::{LinkedFrame, LinkedPoint};
use crate::traits::{FrameStream, LinkedStream, Linker};

/// Greedy nearest-neighbour linker.
///
/// Each frame, every (track, point) pair within the search radius is a
/// candidate; candidates are accepted shortest-first so each track and each
/// point is used at most once. Unmatched points start new tracks. A track that
/// has gone unmatched in more than `memory` consecutive input frames is
/// dropped; gaps in the frame numbers themselves do not count.
#[derive(Debug, Default)]
pub struct NearestNeighborLinker;

impl NearestNeighborLinker {
    pub fn new() -> Self {
        Self
    }
}

impl Linker for NearestNeighborLinker {
    fn link<'a>(&'a self, frames: FrameStream<'a>, search_range: f64, memory: u32) -> LinkedStream<'a> {
        Box::new(LinkIter {
            frames,
            search_range,
            memory,
            active: Vec::new(),
            next_id: 0,
            step: 0,
            previous_frame: None,
        })
    }

    fn name(&self) -> &'static str {
        "nearest_neighbor"
    }
}

struct ActiveTrack {
    id: u32,
    last: Point,
    /// Input step at which the track was last matched
    last_step: u64,
}

struct LinkIter<'a> {
    frames: FrameStream<'a>,
    search_range: f64,
    memory: u32,
    active: Vec<ActiveTrack>,
    next_id: u32,
    /// Number of frames consumed so far
    step: u64,
    previous_frame: Option<u32>,
}

impl LinkIter<'_> {
    fn link_frame(&mut self, features: FrameFeatures) -> Result<LinkedFrame, PipelineError> {
        let frame = features.frame;
        if let Some(previous) = self.previous_frame {
            if frame <= previous {
                return Err(PipelineError::Linking {
                    frame,
                    reason: format!("frames out of order: {} after {}", frame, previous),
                });
            }
        }
        self.previous_frame = Some(frame);
        self.step += 1;
        let step = self.step;

        // Forget tracks that have been missing for longer than the memory allows.
        let memory = u64::from(self.memory);
        self.active.retain(|t| step - t.last_step <= memory + 1);

        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for (ti, track) in self.active.iter().enumerate() {
            for (pi, point) in features.points.iter().enumerate() {
                let d = track.last.distance_to(point);
                if d <= self.search_range {
                    candidates.push((d, ti, pi));
                }
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then((a.1, a.2).cmp(&(b.1, b.2))));

        let mut track_taken = vec![false; self.active.len()];
        let mut assigned: Vec<Option<u32>> = vec![None; features.points.len()];
        for (_, ti, pi) in candidates {
            if track_taken[ti] || assigned[pi].is_some() {
                continue;
            }
            track_taken[ti] = true;
            assigned[pi] = Some(self.active[ti].id);
            self.active[ti].last = features.points[pi];
            self.active[ti].last_step = step;
        }

        let mut points = Vec::with_capacity(features.points.len());
        for (point, id) in features.points.iter().zip(assigned) {
            let track_id = match id {
                Some(id) => id,
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.active.push(ActiveTrack {
                        id,
                        last: *point,
                        last_step: step,
                    });
                    id
                }
            };
            points.push(LinkedPoint { track_id, point: *point });
        }

        Ok(LinkedFrame {
            frame,
            image: features.image,
            points,
        })
    }
}

impl Iterator for LinkIter<'_> {
    type Item = Result<LinkedFrame, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let features = match self.frames.next()? {
            Ok(features) => features,
            Err(e) => return Some(Err(e)),
        };
        Some(self.link_frame(features))
    }
}

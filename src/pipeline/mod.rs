// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Link-and-persist pipeline: an ordered image sequence in, a finished
//! trajectory table out.
//!
//! ```text
//! selection check → destination check → status "starting"
//!   → for each selected frame, in order:
//!        load image → detect + postprocess → linker → append + sync → status "working"
//!   → status "finishing" → build indices → status "done"
//! ```
//!
//! Frames are pulled through the linker one at a time, so memory use does not
//! grow with the length of the movie. The table is created when the first
//! linked frame arrives and every frame is durable before the next one is
//! read. Any error ends the run; the table written so far stays on disk
//! without indices and can be inspected or recovered with
//! [`rebuild_indices`](crate::storage::rebuild_indices).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::config::{TrackingParams, Window};
use crate::errors::{PipelineError, StorageError};
use crate::features::{extract_features, FrameFeatures, FrameImage};
use crate::linking::NearestNeighborLinker;
use crate::observability::messages::pipeline::{
    FrameLinked, PipelineCompleted, PipelineFailed, PipelineStarted,
};
use crate::observability::messages::StructuredLog;
use crate::status::{format_td, RunState, StatusFile, Stopwatch};
use crate::storage::{IndexSummary, TableWriter};
use crate::traits::{FeatureDetector, FrameStream, Linker};


/// Everything one run needs.
#[derive(Clone)]
pub struct PipelineRequest {
    /// Every image of the movie, in frame order. Frame `n` is `images[n - 1]`.
    pub images: Vec<PathBuf>,
    /// Trajectory table to create. Must not exist.
    pub output: PathBuf,
    pub params: TrackingParams,
    pub detector: Arc<dyn FeatureDetector>,
    /// Linking engine; the built-in nearest-neighbour linker when `None`.
    pub linker: Option<Arc<dyn Linker>>,
    /// 1-based frames to track, strictly increasing. Defaults to the window's
    /// frame limits, or every image.
    pub select_frames: Option<Vec<u32>>,
    pub window: Option<Window>,
    /// Where to keep the status record, if anywhere.
    pub status: Option<PathBuf>,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub output: PathBuf,
    pub frames: usize,
    pub rows: u64,
    pub tracks: usize,
    pub duration: Duration,
}

impl PipelineRequest {
    pub fn new(
        images: Vec<PathBuf>,
        output: impl Into<PathBuf>,
        params: TrackingParams,
        detector: Arc<dyn FeatureDetector>,
    ) -> Self {
        Self {
            images,
            output: output.into(),
            params,
            detector,
            linker: None,
            select_frames: None,
            window: None,
            status: None,
        }
    }

    pub fn with_linker(mut self, linker: Arc<dyn Linker>) -> Self {
        self.linker = Some(linker);
        self
    }

    pub fn with_selection(mut self, frames: Vec<u32>) -> Self {
        self.select_frames = Some(frames);
        self
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_status(mut self, path: impl Into<PathBuf>) -> Self {
        self.status = Some(path.into());
        self
    }

    /// The validated 1-based frame numbers this run will process.
    pub fn frame_selection(&self) -> Result<Vec<u32>, PipelineError> {
        let frames = match (&self.select_frames, &self.window) {
            (Some(frames), _) => frames.clone(),
            (None, Some(window)) => window.frame_selection(self.images.len()),
            (None, None) => (1..=self.images.len() as u32).collect(),
        };
        validate_selection(&frames, self.images.len())?;
        Ok(frames)
    }

    /// Run to completion on the calling thread.
    ///
    /// Checks `cancel` before each frame is read; a cancelled run fails with
    /// [`PipelineError::Aborted`] and leaves its partial table behind.
    pub fn run(&self, cancel: &CancellationToken) -> Result<PipelineSummary, PipelineError> {
        let frames = self.frame_selection()?;
        if self.output.exists() {
            return Err(PipelineError::DestinationExists(self.output.clone()));
        }

        let linker_name = self.linker.as_ref().map_or("nearest_neighbor", |l| l.name());
        let started = PipelineStarted {
            output: &self.output,
            frames: frames.len(),
            detector: self.detector.name(),
            linker: linker_name,
        };
        started.log();
        let _guard = started.span("run").entered();

        let result = self.link_and_persist(&frames, cancel);
        match &result {
            Ok(summary) => PipelineCompleted {
                output: &self.output,
                frames: summary.frames,
                rows: summary.rows,
                duration: summary.duration,
            }
            .log(),
            Err(e) => PipelineFailed {
                output: &self.output,
                error: e,
            }
            .log(),
        }
        result
    }

    fn link_and_persist(
        &self,
        frames: &[u32],
        cancel: &CancellationToken,
    ) -> Result<PipelineSummary, PipelineError> {
        let total = frames.len() as u64;
        let mut stopwatch = Stopwatch::start();
        let status = self.open_status(frames.len(), &stopwatch)?;
        if let Some(status) = &status {
            status.update(&json!({ "state": RunState::Starting }))?;
        }

        let default_linker = NearestNeighborLinker::new();
        let linker: &dyn Linker = match &self.linker {
            Some(linker) => linker.as_ref(),
            None => &default_linker,
        };
        let linked = linker.link(self.features(frames, cancel), self.params.search_range, self.params.memory);

        let mut writer: Option<TableWriter> = None;
        for item in linked {
            let frame = item?;

            if writer.is_none() {
                let hint = (frame.len() * self.images.len()) as u64;
                writer = Some(self.create_table(hint)?);
            }
            if let Some(table) = writer.as_mut() {
                table.append_frame(frame.frame, &frame.points)?;
            }
            stopwatch.lap();

            FrameLinked {
                frame: frame.frame,
                points: frame.len(),
                seconds_per_frame: stopwatch.mean_lap_time(),
            }
            .log();

            if let Some(status) = &status {
                status.update(&json!({
                    "state": RunState::Working,
                    "most_recent_frame": frame.frame,
                    "most_recent_image": frame.image,
                    "particle_count": frame.len(),
                    "seconds_per_frame": stopwatch.mean_lap_time(),
                    "elapsed_time": format_td(stopwatch.elapsed()),
                    "time_left": stopwatch.estimate_completion(total).map(format_td),
                }))?;
            }
        }

        if let Some(status) = &status {
            status.update(&json!({
                "state": RunState::Finishing,
                "seconds_per_frame": stopwatch.mean_lap_time(),
                "elapsed_time": format_td(stopwatch.elapsed()),
            }))?;
        }

        let writer = match writer {
            Some(writer) => writer,
            None => self.create_table(0)?,
        };
        let IndexSummary { rows, tracks, .. } = writer.finalize()?;

        if let Some(status) = &status {
            status.update(&json!({
                "state": RunState::Done,
                "seconds_per_frame": stopwatch.mean_lap_time(),
                "elapsed_time": format_td(stopwatch.elapsed()),
            }))?;
        }

        Ok(PipelineSummary {
            output: self.output.clone(),
            frames: frames.len(),
            rows,
            tracks,
            duration: stopwatch.elapsed(),
        })
    }

    /// Lazily load and detect each selected frame.
    fn features<'a>(&'a self, frames: &'a [u32], cancel: &'a CancellationToken) -> FrameStream<'a> {
        Box::new(frames.iter().map(move |&frame| {
            if cancel.is_cancelled() {
                return Err(PipelineError::Aborted { frame });
            }
            let path = &self.images[frame as usize - 1];
            let image = FrameImage::load(path, &self.params)?;
            let points = extract_features(
                self.detector.as_ref(),
                &image,
                &self.params,
                self.window.as_ref(),
            )
            .map_err(|reason| PipelineError::Detection { frame, reason })?;

            Ok(FrameFeatures {
                frame,
                image: path.clone(),
                points,
            })
        }))
    }

    fn open_status(&self, total_frames: usize, stopwatch: &Stopwatch) -> Result<Option<StatusFile>, PipelineError> {
        let Some(path) = &self.status else {
            return Ok(None);
        };
        let working_dir = std::env::current_dir().ok();
        let status = StatusFile::new(
            path,
            &json!({
                "total_frames": total_frames,
                "output": self.output,
                "working_dir": working_dir,
                "process_id": std::process::id(),
                "started": stopwatch.started_at().format("%c").to_string(),
            }),
        )?;
        Ok(Some(status))
    }

    /// Claim the output location, re-checking that nothing appeared there since the run started.
    fn create_table(&self, expected_rows: u64) -> Result<TableWriter, PipelineError> {
        if self.output.exists() {
            return Err(PipelineError::DestinationExists(self.output.clone()));
        }
        TableWriter::create(&self.output, expected_rows).map_err(|e| match e {
            StorageError::AlreadyExists(path) => PipelineError::DestinationExists(path),
            other => other.into(),
        })
    }
}

/// Frames must be 1-based, within the image list, and strictly increasing.
pub fn validate_selection(frames: &[u32], image_count: usize) -> Result<(), PipelineError> {
    if frames.is_empty() {
        return Err(PipelineError::EmptySelection);
    }
    let mut previous: Option<u32> = None;
    for &frame in frames {
        if frame == 0 || frame as usize > image_count {
            return Err(PipelineError::FrameSelectionOutOfRange {
                frame,
                available: image_count,
            });
        }
        if let Some(previous) = previous {
            if frame <= previous {
                return Err(PipelineError::FrameSelectionOrder { frame, previous });
            }
        }
        previous = Some(frame);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_rules() {
        assert!(validate_selection(&[1, 2, 5], 5).is_ok());
        assert!(matches!(
            validate_selection(&[], 5),
            Err(PipelineError::EmptySelection)
        ));
        assert!(matches!(
            validate_selection(&[0, 1], 5),
            Err(PipelineError::FrameSelectionOutOfRange { frame: 0, available: 5 })
        ));
        assert!(matches!(
            validate_selection(&[2, 6], 5),
            Err(PipelineError::FrameSelectionOutOfRange { frame: 6, .. })
        ));
        assert!(matches!(
            validate_selection(&[3, 3], 5),
            Err(PipelineError::FrameSelectionOrder { frame: 3, previous: 3 })
        ));
    }
}

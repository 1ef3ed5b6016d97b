// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Wall-clock progress of a run, counted in laps (one lap per frame).
#[derive(Debug, Clone)]
pub struct Stopwatch {
    started: Instant,
    started_at: DateTime<Local>,
    last_lap: Option<Instant>,
    laps: u64,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

impl Stopwatch {
    pub fn start() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            started_at: Local::now(),
            last_lap: None,
            laps: 0,
        }
    }

    /// Local time at which the stopwatch started.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn lap(&mut self) {
        self.lap_at(Instant::now());
    }

    pub fn lap_at(&mut self, now: Instant) {
        self.last_lap = Some(now);
        self.laps += 1;
    }

    pub fn laps(&self) -> u64 {
        self.laps
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Mean seconds per lap from the start to the most recent lap.
    pub fn mean_lap_time(&self) -> Option<f64> {
        let last = self.last_lap?;
        Some(last.duration_since(self.started).as_secs_f64() / self.laps as f64)
    }

    /// Time left for `total_laps`, or `None` once more laps than that were completed.
    pub fn estimate_completion(&self, total_laps: u64) -> Option<Duration> {
        if self.laps > total_laps {
            return None;
        }
        let mean = self.mean_lap_time()?;
        Some(Duration::from_secs_f64(mean * (total_laps - self.laps) as f64))
    }
}

/// Format a duration as `HH:MM:SS`, rounded to the nearest second.
///
/// Hours are not wrapped at 24.
pub fn format_td(duration: Duration) -> String {
    let s = duration.as_secs_f64().round() as u64;
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

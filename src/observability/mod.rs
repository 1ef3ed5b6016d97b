// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Log lines are never written as ad-hoc strings. Each event is a small struct
//! with a `Display` implementation for the human-readable message and a
//! [`StructuredLog`](messages::StructuredLog) implementation that emits it at
//! the right level with machine-readable fields attached.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::storage` - Trajectory table lifecycle
//! * `messages::pipeline` - Link-and-persist run progress and outcome
//! * `messages::orchestrator` - Fleet submission, abort and liveness
//!
//! # Usage
//!
//! ```rust
//! use bigtracks::observability::messages::StructuredLog;
//! use bigtracks::observability::messages::storage::IndicesRebuilt;
//! use std::path::Path;
//!
//! IndicesRebuilt {
//!     path: Path::new("run01/bigtracks.trk"),
//!     rows: 1200,
//!     frames: 100,
//!     tracks: 14,
//! }
//! .log();
//! ```
//!
//! The subscriber is installed by the binary; the library only emits events.

pub mod messages;

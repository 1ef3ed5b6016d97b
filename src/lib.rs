// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // fleet config, params, detector registry
pub mod errors;        // error handling
pub mod features;      // detection + merge/dedup
pub mod linking;       // built-in linking engine
pub mod observability;
pub mod orchestrator;  // fleet of work units
pub mod pipeline;      // link-and-persist
pub mod status;        // status channel
pub mod storage;       // trajectory table
pub mod traits;        // unified abstractions

#[cfg(test)]
mod test_support;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod params;
mod registry;
mod validation;
mod window;

pub mod consts;

pub use loader::{load_and_validate_config, load_config, load_params, FleetConfig};
pub use params::TrackingParams;
pub use registry::DetectorRegistry;
pub use validation::validate_fleet_config;
pub use window::{load_window, Window, WindowSpec};

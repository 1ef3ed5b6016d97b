// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fleet configuration validation.
//!
//! Checks run in a fixed order and every problem is collected, so a user
//! fixing a config file sees all of them at once:
//!
//! 1. **Units**: the fleet lists at least one unit and no unit twice
//! 2. **File names**: the trajectory table and status record do not collide
//! 3. **Quick parameters**: ranges serde cannot express (see [`TrackingParams::validate`])
//!
//! Per-unit parameter files are validated when the unit is prepared, since
//! they are read from the unit directory rather than from the fleet config.
//!
//! [`TrackingParams::validate`]: crate::config::TrackingParams::validate

use std::collections::HashSet;

use crate::config::FleetConfig;
use crate::errors::ValidationError;

pub fn validate_fleet_config(config: &FleetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(mut e) = validate_units(config) {
        errors.append(&mut e);
    }
    if let Err(e) = validate_filenames(config) {
        errors.push(e);
    }
    if let Some(params) = &config.quickparams {
        errors.extend(params.validate());
    }
    if config.max_concurrency == Some(0) {
        errors.push(ValidationError::InvalidParameter {
            name: "max_concurrency",
            reason: "must be at least 1".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_units(config: &FleetConfig) -> Result<(), Vec<ValidationError>> {
    if config.units.is_empty() {
        return Err(vec![ValidationError::NoUnits]);
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();
    for unit in &config.units {
        if !seen.insert(unit) && reported.insert(unit) {
            errors.push(ValidationError::DuplicateUnit {
                location: unit.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_filenames(config: &FleetConfig) -> Result<(), ValidationError> {
    if config.tracks_filename == config.status_filename {
        return Err(ValidationError::ConflictingFilenames {
            filename: config.tracks_filename.clone(),
        });
    }
    Ok(())
}

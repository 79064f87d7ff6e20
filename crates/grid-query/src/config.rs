//! Configuration for the query engine.

use serde::{Deserialize, Serialize};

/// Immutable limits and grid constants handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard ceiling on grid points returned by one box request.
    pub point_limit: usize,

    /// Maximum number of calendar days in a point-range request.
    pub max_days: u32,

    /// Nominal grid spacing in degrees, used for point-count estimates.
    pub grid_spacing_deg: f64,

    /// How many times the box stride may double after an actual overflow.
    pub max_stride_escalations: u32,

    /// Estimate a starting stride when the request gives none. Off by
    /// default: an unsampled box starts at stride 1.
    pub auto_stride: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            point_limit: 1_000_000,
            max_days: 31,
            grid_spacing_deg: 0.01,
            max_stride_escalations: 2,
            auto_stride: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `GHRSST_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("GHRSST_POINT_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.point_limit = limit;
            }
        }

        if let Ok(val) = std::env::var("GHRSST_MAX_DAYS") {
            if let Ok(days) = val.parse() {
                self.max_days = days;
            }
        }

        if let Ok(val) = std::env::var("GHRSST_DEG_PER_CELL") {
            if let Ok(deg) = val.parse() {
                self.grid_spacing_deg = deg;
            }
        }

        if let Ok(val) = std::env::var("GHRSST_STRIDE_ESCALATIONS") {
            if let Ok(n) = val.parse() {
                self.max_stride_escalations = n;
            }
        }

        if let Ok(val) = std::env::var("GHRSST_AUTO_STRIDE") {
            self.auto_stride = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.point_limit == 0 {
            return Err("point_limit must be > 0".to_string());
        }

        if self.max_days == 0 {
            return Err("max_days must be > 0".to_string());
        }

        if !(self.grid_spacing_deg.is_finite() && self.grid_spacing_deg > 0.0) {
            return Err("grid_spacing_deg must be a positive number".to_string());
        }

        if self.max_stride_escalations > 16 {
            return Err("max_stride_escalations must be <= 16".to_string());
        }

        Ok(())
    }
}

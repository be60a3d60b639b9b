use crate::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The viewing window, plus the time span used in parametric mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub t_min: f64,
    pub t_max: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            x_min: -10.0,
            x_max: 10.0,
            y_min: -10.0,
            y_max: 10.0,
            t_min: -10.0,
            t_max: 10.0,
        }
    }
}

impl Domain {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (axis, min, max) in [
            ("x", self.x_min, self.x_max),
            ("y", self.y_min, self.y_max),
            ("t", self.t_min, self.t_max),
        ] {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(DomainError::InvalidRange { axis, min, max });
            }
        }
        Ok(())
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.x_min..=self.x_max).contains(&point.x) && (self.y_min..=self.y_max).contains(&point.y)
    }

    /// Clamps each coordinate independently onto the window.
    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.x_min, self.x_max),
            y: point.y.clamp(self.y_min, self.y_max),
        }
    }
}

/// Largest accepted density: 500 samples per axis.
pub const MAX_DENSITY: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParameters {
    /// Grid resolution; `floor(density * 20)` samples per axis.
    pub density: f64,
    /// Divides the arrow scale, so larger values draw longer segments.
    pub line_length_scale: f64,
}

impl Default for FieldParameters {
    fn default() -> Self {
        Self {
            density: 1.0,
            line_length_scale: 1.0,
        }
    }
}

impl FieldParameters {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.density.is_finite() || self.density <= 0.0 || self.density > MAX_DENSITY {
            return Err(DomainError::InvalidDensity(self.density));
        }
        if !self.line_length_scale.is_finite() || self.line_length_scale <= 0.0 {
            return Err(DomainError::InvalidLineLength(self.line_length_scale));
        }
        Ok(())
    }

    pub fn samples_per_axis(&self) -> usize {
        ((self.density * 20.0).floor() as usize).max(1)
    }

    pub fn arrow_scale(&self) -> f64 {
        50.0 / self.line_length_scale
    }
}

//! Discretized slope and vector fields over the viewing window.

use crate::domain::{Domain, FieldParameters};
use crate::equation_engine::CompiledExpr;
use crate::error::FieldError;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// `dy/dx = f(x, y)`; needs the Y equation only.
    #[default]
    Standard,
    /// `dx/dt = g(x, y)`, `dy/dt = f(x, y)`; needs both equations.
    Parametric,
}

/// Grid coordinates and direction components, laid out like `meshgrid`:
/// row `r` holds `y = ys[r]`, column `c` holds `x = xs[c]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGrid {
    pub x: DMatrix<f64>,
    pub y: DMatrix<f64>,
    pub u: DMatrix<f64>,
    pub v: DMatrix<f64>,
    /// Arrow scale handed to the quiver plot, `50 / line_length_scale`.
    pub scale: f64,
}

impl FieldGrid {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// `n` evenly spaced values over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// Samples the field of `mode` over `domain`.
///
/// Returns `Ok(None)` when the mode's required equations are not all present;
/// the caller is expected to clear any field it is showing. A single failing
/// grid point fails the whole call.
pub fn sample_field(
    mode: Mode,
    x_eq: Option<&CompiledExpr>,
    y_eq: Option<&CompiledExpr>,
    domain: &Domain,
    params: &FieldParameters,
) -> Result<Option<FieldGrid>, FieldError> {
    let n = params.samples_per_axis();
    let xs = linspace(domain.x_min, domain.x_max, n);
    let ys = linspace(domain.y_min, domain.y_max, n);

    let direction: Box<dyn Fn(f64, f64) -> Result<(f64, f64), FieldError> + '_> =
        match (mode, x_eq, y_eq) {
            (Mode::Standard, _, Some(f)) => Box::new(move |x, y| {
                let slope = evaluate_at(f, x, y)?;
                Ok(unit_tangent(slope))
            }),
            (Mode::Parametric, Some(g), Some(f)) => {
                Box::new(move |x, y| Ok((evaluate_at(g, x, y)?, evaluate_at(f, x, y)?)))
            }
            _ => return Ok(None),
        };

    // Column-major, as DMatrix stores it.
    let size = xs.len() * ys.len();
    let (mut gx, mut gy) = (Vec::with_capacity(size), Vec::with_capacity(size));
    let (mut gu, mut gv) = (Vec::with_capacity(size), Vec::with_capacity(size));
    for &x in &xs {
        for &y in &ys {
            let (u, v) = direction(x, y)?;
            gx.push(x);
            gy.push(y);
            gu.push(u);
            gv.push(v);
        }
    }

    let (rows, cols) = (ys.len(), xs.len());
    Ok(Some(FieldGrid {
        x: DMatrix::from_vec(rows, cols, gx),
        y: DMatrix::from_vec(rows, cols, gy),
        u: DMatrix::from_vec(rows, cols, gu),
        v: DMatrix::from_vec(rows, cols, gv),
        scale: params.arrow_scale(),
    }))
}

fn evaluate_at(f: &CompiledExpr, x: f64, y: f64) -> Result<f64, FieldError> {
    f.evaluate(x, y)
        .map_err(|source| FieldError::EvaluationFailed { x, y, source })
}

/// `(1, slope) / sqrt(1 + slope^2)`. `hypot` keeps this finite for slopes
/// whose square would overflow; the result tends to `(0, ±1)`.
pub fn unit_tangent(slope: f64) -> (f64, f64) {
    let norm = 1.0_f64.hypot(slope);
    (1.0 / norm, slope / norm)
}

//! Error taxonomy for the slope field engine.
//!
//! Every error here is recoverable by the session: compile failures are
//! reported and leave state untouched, field failures clear the display and
//! integration failures only cut a half-trajectory short.

use thiserror::Error;

/// Failure while evaluating a compiled expression at a point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("{function}({argument}) is outside the function's domain")]
    Domain { function: &'static str, argument: f64 },
    #[error("expression produced a non-finite value")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("expression failed to evaluate at (1, 1): {0}")]
    EvaluationError(EvalError),
    #[error("expression does not produce a finite real number at (1, 1)")]
    InvalidResult,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("field evaluation failed at ({x}, {y}): {source}")]
    EvaluationFailed {
        x: f64,
        y: f64,
        #[source]
        source: EvalError,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("integration stopped at t = {at}: {reason}")]
    NumericFailure { at: f64, reason: String },
}

impl IntegrationError {
    pub(crate) fn numeric(at: f64, reason: impl Into<String>) -> Self {
        IntegrationError::NumericFailure {
            at,
            reason: reason.into(),
        }
    }
}

impl From<(f64, EvalError)> for IntegrationError {
    fn from((at, err): (f64, EvalError)) -> Self {
        IntegrationError::numeric(at, err.to_string())
    }
}

/// Rejected domain bounds, field parameters or integrator settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{axis} range must be finite with min < max (got {min}..{max})")]
    InvalidRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },
    #[error("density must be a finite number in (0, {max}] (got {0})", max = crate::domain::MAX_DENSITY)]
    InvalidDensity(f64),
    #[error("line length scale must be finite and positive (got {0})")]
    InvalidLineLength(f64),
    #[error("at most {max} samples per direction are allowed (got {0})", max = crate::trajectory::MAX_SAMPLES)]
    InvalidSampleCount(usize),
    #[error("integrator setting {name} must be finite and positive (got {value})")]
    InvalidIntegrator { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("the {0} equation role is not available in standard mode")]
    RoleDisabled(crate::session::Role),
    #[error("no equation named \"{0}\"")]
    UnknownEquation(String),
}

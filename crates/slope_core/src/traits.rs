use crate::error::EvalError;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our dynamical systems.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    /// Lossless for `f64`; any `Float` can hold the constants we use.
    fn lit(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Represents a planar flow `dstate/dt = F(t, state)`.
///
/// In standard mode the independent variable `t` is `x` and the state is
/// `[y]`; in parametric mode the state is `[x, y]`.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]) -> Result<(), EvalError>;
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Convergence order, used by the step-doubling error estimate.
    fn order(&self) -> i32;

    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), EvalError>;
}

pub mod domain;
pub mod equation_engine;
pub mod error;
pub mod field;
pub mod session;
pub mod solvers;
pub mod trajectory;
/// The `slope_core` crate is the numerical engine behind the slope field explorer.
///
/// Key components:
/// - **Equation Engine**: parses user expressions into a closed syntax tree and
///   evaluates them with a direct tree walk. Only `x`, `y`, `e`, `pi` and the
///   trigonometric functions are recognised.
/// - **Field**: samples slope fields (unit tangents) and vector fields on a grid.
/// - **Solvers**: RK4, Tsit5 and Euler steppers plus a step-doubling adaptive driver.
/// - **Trajectory**: lazy solution curves, clipped to the viewing window.
/// - **Session**: owns the equations, window and solution points, and redraws
///   through the `RenderSink` trait whenever any of them change.
pub mod traits;

pub use domain::{Domain, FieldParameters, Point};
pub use equation_engine::{compile, compile_with, CompiledExpr, Equation, VariableNaming};
pub use error::{CompileError, DomainError, EvalError, FieldError, IntegrationError, SessionError};
pub use field::{sample_field, FieldGrid, Mode};
pub use session::{Color, Component, Notifier, RenderSink, Role, Session, SessionSettings};
pub use trajectory::{IntegrationMethod, IntegratorSettings};

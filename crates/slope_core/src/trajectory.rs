//! Solution curves through user-chosen initial points.
//!
//! Trajectories are produced lazily: each half is an iterator that integrates
//! up to the next requested sample only when asked for it. A numerical failure
//! ends that iterator early; everything yielded before it stays valid.

use crate::domain::{Domain, Point};
use crate::equation_engine::{CompiledExpr, EquationSystem};
use crate::error::{DomainError, IntegrationError};
use crate::field::linspace;
use crate::solvers::{advance_fixed, Euler, StepDoubling, Tolerances, Tsit5, RK4};
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

/// Fewer samples than this make visibly polygonal curves.
pub const MIN_SAMPLES: usize = 500;

/// Upper bound on `samples_per_direction`.
pub const MAX_SAMPLES: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Step-doubling RK4 between requested samples.
    #[default]
    AdaptiveRk4,
    /// Step-doubling Tsit5 between requested samples.
    AdaptiveTsit5,
    /// Fixed-step explicit Euler. Much cheaper per step, but it drifts on
    /// stiff or strongly curved problems.
    Euler,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub method: IntegrationMethod,
    /// Requested samples per direction; raised to `MIN_SAMPLES` if lower.
    pub samples_per_direction: usize,
    pub rel_tol: f64,
    pub abs_tol: f64,
    /// Adaptive methods give up below this step size.
    pub min_step: f64,
    /// Step size of the Euler method.
    pub euler_step: f64,
    /// Hard cap on steps (accepted or rejected) per half-trajectory.
    pub max_steps: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::AdaptiveRk4,
            samples_per_direction: 1000,
            rel_tol: 1e-6,
            abs_tol: 1e-9,
            min_step: 1e-10,
            euler_step: 1e-3,
            max_steps: 2_000_000,
        }
    }
}

impl IntegratorSettings {
    /// Rejects sample counts above `MAX_SAMPLES` and tolerances or step
    /// sizes that are not finite and positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.samples_per_direction > MAX_SAMPLES {
            return Err(DomainError::InvalidSampleCount(self.samples_per_direction));
        }
        for (name, value) in [
            ("rel_tol", self.rel_tol),
            ("abs_tol", self.abs_tol),
            ("min_step", self.min_step),
            ("euler_step", self.euler_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::InvalidIntegrator { name, value });
            }
        }
        Ok(())
    }

    pub fn samples(&self) -> usize {
        self.samples_per_direction.max(MIN_SAMPLES)
    }
}

enum Driver {
    Rk4(StepDoubling<f64, RK4<f64>>),
    Tsit5(StepDoubling<f64, Tsit5<f64>>),
    Euler { stepper: Euler<f64>, step: f64 },
}

impl Driver {
    fn build(settings: &IntegratorSettings, dim: usize) -> Self {
        let tolerances = Tolerances {
            rel: settings.rel_tol,
            abs: settings.abs_tol,
        };
        match settings.method {
            IntegrationMethod::AdaptiveRk4 => Driver::Rk4(StepDoubling::new(
                RK4::new(dim),
                dim,
                tolerances,
                settings.min_step,
            )),
            IntegrationMethod::AdaptiveTsit5 => Driver::Tsit5(StepDoubling::new(
                Tsit5::new(dim),
                dim,
                tolerances,
                settings.min_step,
            )),
            IntegrationMethod::Euler => Driver::Euler {
                stepper: Euler::new(dim),
                step: settings.euler_step,
            },
        }
    }

    fn advance(
        &mut self,
        system: &EquationSystem<'_>,
        t: &mut f64,
        state: &mut [f64],
        t_end: f64,
        budget: &mut usize,
    ) -> Result<(), IntegrationError> {
        match self {
            Driver::Rk4(d) => d.advance(system, t, state, t_end, budget),
            Driver::Tsit5(d) => d.advance(system, t, state, t_end, budget),
            Driver::Euler { stepper, step } => {
                advance_fixed(stepper, system, t, state, t_end, *step, budget)
            }
        }
    }
}

/// Integrates a system through a list of requested sample times, one
/// sample per `next`.
struct FlowSamples<'a> {
    system: EquationSystem<'a>,
    driver: Driver,
    targets: Vec<f64>,
    next: usize,
    t: f64,
    state: [f64; 2],
    dim: usize,
    budget: usize,
    failure: Option<IntegrationError>,
}

impl<'a> FlowSamples<'a> {
    fn new(
        system: EquationSystem<'a>,
        settings: &IntegratorSettings,
        t0: f64,
        state: [f64; 2],
        targets: Vec<f64>,
    ) -> Self {
        let dim = DynamicalSystem::<f64>::dimension(&system);
        Self {
            system,
            driver: Driver::build(settings, dim),
            targets,
            next: 0,
            t: t0,
            state,
            dim,
            budget: settings.max_steps,
            failure: None,
        }
    }
}

impl Iterator for FlowSamples<'_> {
    type Item = (f64, [f64; 2]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.failure.is_some() {
            return None;
        }
        let target = *self.targets.get(self.next)?;
        let result = self.driver.advance(
            &self.system,
            &mut self.t,
            &mut self.state[..self.dim],
            target,
            &mut self.budget,
        );
        if let Err(err) = result {
            tracing::debug!(error = %err, "trajectory terminated early");
            self.failure = Some(err);
            return None;
        }
        self.next += 1;
        Some((self.t, self.state))
    }
}

/// One direction (increasing or decreasing x) of a standard-mode solution.
pub struct HalfTrajectory<'a> {
    samples: FlowSamples<'a>,
}

impl HalfTrajectory<'_> {
    /// Why the half stopped early, once it has.
    pub fn failure(&self) -> Option<&IntegrationError> {
        self.samples.failure.as_ref()
    }
}

impl Iterator for HalfTrajectory<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        self.samples.next().map(|(x, [y, _])| Point { x, y })
    }
}

/// Both halves of a standard-mode solution through a (clamped) point.
pub struct StandardTrajectory<'a> {
    pub start: Point,
    pub forward: HalfTrajectory<'a>,
    pub backward: HalfTrajectory<'a>,
    domain: Domain,
}

/// Solves `dy/dx = f(x, y)` through `init` towards both x-limits.
pub fn integrate_standard<'a>(
    f: &'a CompiledExpr,
    domain: &Domain,
    init: Point,
    settings: &IntegratorSettings,
) -> StandardTrajectory<'a> {
    let start = domain.clamp(init);
    let samples = settings.samples();
    let half = |x_end: f64| {
        let targets = if x_end == start.x {
            vec![start.x]
        } else {
            linspace(start.x, x_end, samples)
        };
        HalfTrajectory {
            samples: FlowSamples::new(
                EquationSystem::Slope(f),
                settings,
                start.x,
                [start.y, 0.0],
                targets,
            ),
        }
    };
    StandardTrajectory {
        start,
        forward: half(domain.x_max),
        backward: half(domain.x_min),
        domain: *domain,
    }
}

/// A clipped, ready-to-draw solution curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryPath {
    /// Disjoint on-screen pieces; a piece ends wherever the curve leaves the
    /// window.
    pub segments: Vec<Vec<Point>>,
    #[serde(skip)]
    pub failures: Vec<IntegrationError>,
}

impl TrajectoryPath {
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.segments.iter().flatten()
    }
}

impl StandardTrajectory<'_> {
    /// Runs both halves and joins them into one left-to-right curve.
    pub fn into_path(mut self) -> TrajectoryPath {
        let mut points: Vec<Point> = self.backward.by_ref().collect();
        points.reverse();
        // Both halves begin at the start point; keep it once.
        points.extend(self.forward.by_ref().skip(1));
        let failures = [self.backward.failure(), self.forward.failure()]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        TrajectoryPath {
            segments: clip_segments(points, &self.domain),
            failures,
        }
    }
}

/// Splits a curve into the runs that stay inside `domain`, dropping every
/// point outside it.
pub fn clip_segments(points: impl IntoIterator<Item = Point>, domain: &Domain) -> Vec<Vec<Point>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for point in points {
        if domain.contains(point) {
            current.push(point);
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimedPoint {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

/// Lazy `(t, x, y)` samples of a parametric solution.
pub struct ParametricSamples<'a> {
    samples: FlowSamples<'a>,
}

impl ParametricSamples<'_> {
    pub fn failure(&self) -> Option<&IntegrationError> {
        self.samples.failure.as_ref()
    }
}

impl Iterator for ParametricSamples<'_> {
    type Item = TimedPoint;

    fn next(&mut self) -> Option<TimedPoint> {
        self.samples.next().map(|(t, [x, y])| TimedPoint { t, x, y })
    }
}

/// Solves `dx/dt = g(x, y)`, `dy/dt = f(x, y)` through `init` over
/// `[t_min, t_max]`.
pub fn integrate_parametric<'a>(
    g: &'a CompiledExpr,
    f: &'a CompiledExpr,
    domain: &Domain,
    init: Point,
    settings: &IntegratorSettings,
) -> ParametricSamples<'a> {
    let start = domain.clamp(init);
    ParametricSamples {
        samples: FlowSamples::new(
            EquationSystem::Planar { dx: g, dy: f },
            settings,
            domain.t_min,
            [start.x, start.y],
            linspace(domain.t_min, domain.t_max, settings.samples()),
        ),
    }
}

/// A parametric solution split into what each plot needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParametricPath {
    /// Phase-plane curve, clipped to the window.
    pub plane: TrajectoryPath,
    /// `(t, x(t))`, never clipped.
    pub x_of_t: Vec<(f64, f64)>,
    /// `(t, y(t))`, never clipped.
    pub y_of_t: Vec<(f64, f64)>,
}

impl ParametricPath {
    pub fn collect(mut samples: ParametricSamples<'_>, domain: &Domain) -> Self {
        let timed: Vec<TimedPoint> = samples.by_ref().collect();
        let plane = TrajectoryPath {
            segments: clip_segments(timed.iter().map(|p| Point::new(p.x, p.y)), domain),
            failures: samples.failure().cloned().into_iter().collect(),
        };
        Self {
            plane,
            x_of_t: timed.iter().map(|p| (p.t, p.x)).collect(),
            y_of_t: timed.iter().map(|p| (p.t, p.y)).collect(),
        }
    }
}

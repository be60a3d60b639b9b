//! Session state: the equations, window and solution points currently on
//! screen, and the only place that decides when to recompute and redraw.

use crate::domain::{Domain, FieldParameters, Point};
use crate::equation_engine::{Equation, VariableNaming};
use crate::error::{CompileError, DomainError, SessionError};
use crate::field::{sample_field, FieldGrid, Mode};
use crate::trajectory::{
    integrate_parametric, integrate_standard, IntegratorSettings, ParametricPath, TrajectoryPath,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which derivative an equation stands for: `X` is dx/dt (parametric only),
/// `Y` is dy/dx or dy/dt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    X,
    Y,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::X => f.write_str("X"),
            Role::Y => f.write_str("Y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Solution curves cycle through these by insertion order.
pub const PALETTE: [Color; 6] = [
    Color::rgb(0x1f, 0x77, 0xb4),
    Color::rgb(0xff, 0x7f, 0x0e),
    Color::rgb(0x2c, 0xa0, 0x2c),
    Color::rgb(0xd6, 0x27, 0x28),
    Color::rgb(0x94, 0x67, 0xbd),
    Color::rgb(0x8c, 0x56, 0x4b),
];

/// The auxiliary parametric plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// `x(t)`
    X,
    /// `y(t)`
    Y,
}

/// The plotting surface.
pub trait RenderSink {
    fn clear(&mut self);
    fn draw_field(&mut self, grid: &FieldGrid);
    fn draw_path(&mut self, segments: &[Vec<Point>], color: Option<Color>);
    fn draw_component(&mut self, component: Component, samples: &[(f64, f64)], color: Option<Color>);
}

/// Where "invalid input" messages go.
pub trait Notifier {
    fn invalid_input(&mut self, message: &str);
}

impl Notifier for Vec<String> {
    fn invalid_input(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub mode: Mode,
    pub domain: Domain,
    pub parameters: FieldParameters,
    pub integrator: IntegratorSettings,
    pub naming: VariableNaming,
}

enum Solution {
    Standard(TrajectoryPath),
    Parametric(ParametricPath),
}

pub struct Session<R: RenderSink, N: Notifier> {
    mode: Mode,
    domain: Domain,
    parameters: FieldParameters,
    integrator: IntegratorSettings,
    naming: VariableNaming,
    /// Every successfully compiled equation, keyed by source text.
    equations: Vec<Equation>,
    x_role: Option<String>,
    y_role: Option<String>,
    points: Vec<Point>,
    /// False after the last field sample failed; nothing is drawn until the
    /// next successful recompute.
    field_ok: bool,
    renderer: R,
    notifier: N,
}

impl<R: RenderSink, N: Notifier> Session<R, N> {
    pub fn new(renderer: R, notifier: N, settings: SessionSettings) -> Result<Self, DomainError> {
        settings.domain.validate()?;
        settings.parameters.validate()?;
        settings.integrator.validate()?;
        let mut session = Self {
            mode: settings.mode,
            domain: settings.domain,
            parameters: settings.parameters,
            integrator: settings.integrator,
            naming: settings.naming,
            equations: Vec::new(),
            x_role: None,
            y_role: None,
            points: Vec::new(),
            field_ok: false,
            renderer,
            notifier,
        };
        session.recompute();
        Ok(session)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn parameters(&self) -> &FieldParameters {
        &self.parameters
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub fn solution_points(&self) -> &[Point] {
        &self.points
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// The equation assigned to `role`, whether or not the mode uses it.
    pub fn equation(&self, role: Role) -> Option<&Equation> {
        let key = match role {
            Role::X => self.x_role.as_deref(),
            Role::Y => self.y_role.as_deref(),
        }?;
        self.lookup(key)
    }

    fn lookup(&self, key: &str) -> Option<&Equation> {
        self.equations.iter().find(|eq| eq.source() == key)
    }

    /// The equations the current mode actually uses, `(dx, dy)`.
    fn active(&self) -> (Option<&Equation>, Option<&Equation>) {
        match self.mode {
            Mode::Standard => (None, self.equation(Role::Y)),
            Mode::Parametric => (self.equation(Role::X), self.equation(Role::Y)),
        }
    }

    fn is_complete(&self) -> bool {
        match self.active() {
            (_, None) => false,
            (None, Some(_)) => self.mode == Mode::Standard,
            (Some(_), Some(_)) => true,
        }
    }

    /// Compiles user input into the equation library. Failures are reported
    /// through the notifier and leave the session untouched.
    pub fn submit_expression(&mut self, text: &str) -> Result<(), CompileError> {
        match Equation::compile(text, self.naming) {
            Ok(equation) => {
                self.insert(equation);
                Ok(())
            }
            Err(err) => {
                self.notifier
                    .invalid_input(&format!("Invalid expression \"{text}\": {err}"));
                Err(err)
            }
        }
    }

    fn insert(&mut self, equation: Equation) {
        if self.lookup(equation.source()).is_none() {
            self.equations.push(equation);
        }
    }

    /// Puts `equation` in `role`, replacing whatever held it.
    pub fn set_equation(&mut self, role: Role, equation: Equation) -> Result<(), SessionError> {
        if role == Role::X && self.mode == Mode::Standard {
            return Err(SessionError::RoleDisabled(role));
        }
        let key = equation.source().to_string();
        self.insert(equation);
        self.assign(role, key);
        Ok(())
    }

    /// Puts the library equation with source text `key` in `role`.
    pub fn select_equation(&mut self, role: Role, key: &str) -> Result<(), SessionError> {
        if role == Role::X && self.mode == Mode::Standard {
            return Err(SessionError::RoleDisabled(role));
        }
        if self.lookup(key).is_none() {
            return Err(SessionError::UnknownEquation(key.to_string()));
        }
        self.assign(role, key.to_string());
        Ok(())
    }

    fn assign(&mut self, role: Role, key: String) {
        match role {
            Role::X => self.x_role = Some(key),
            Role::Y => self.y_role = Some(key),
        }
        self.recompute();
    }

    /// Deletes an equation from the library and from any role it holds.
    /// Returns false when no equation has that text.
    pub fn remove_equation(&mut self, text: &str) -> bool {
        let Some(index) = self.equations.iter().position(|eq| eq.source() == text) else {
            return false;
        };
        self.equations.remove(index);
        if self.x_role.as_deref() == Some(text) {
            self.x_role = None;
        }
        if self.y_role.as_deref() == Some(text) {
            self.y_role = None;
            if self.mode == Mode::Standard {
                self.points.clear();
            }
        }
        self.recompute();
        true
    }

    pub fn set_domain_or_parameters(
        &mut self,
        domain: Domain,
        parameters: FieldParameters,
    ) -> Result<(), SessionError> {
        domain.validate()?;
        parameters.validate()?;
        self.domain = domain;
        self.parameters = parameters;
        self.recompute();
        Ok(())
    }

    /// Retained points belong to the mode they were placed in and are
    /// discarded on a switch. Leaving parametric mode also drops the X
    /// equation, since standard mode has no use for it.
    pub fn switch_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        if self.mode == Mode::Parametric {
            self.x_role = None;
        }
        self.mode = mode;
        self.points.clear();
        self.recompute();
    }

    /// A click on the plot; `None` means it landed outside the data area.
    pub fn handle_click(&mut self, click: Option<(f64, f64)>) -> bool {
        match click {
            Some((x, y)) => self.add_solution_point(x, y),
            None => false,
        }
    }

    /// Clamps the point into the window, retains it and draws its solution.
    /// Returns false when the point was ignored: non-finite coordinates,
    /// missing equations, or an already retained point.
    pub fn add_solution_point(&mut self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        if !self.is_complete() {
            tracing::debug!(x, y, "solution point ignored: equations incomplete");
            return false;
        }
        let point = self.domain.clamp(Point::new(x, y));
        if self.points.contains(&point) {
            return false;
        }
        self.points.push(point);
        if self.field_ok {
            if let Some(solution) = self.solve(point) {
                self.draw_solution(self.points.len() - 1, &solution);
            }
        }
        true
    }

    pub fn clear_solution_points(&mut self) {
        self.points.clear();
        self.recompute();
    }

    /// Clears the display and redraws the field and every retained solution
    /// from scratch.
    pub fn recompute(&mut self) {
        self.renderer.clear();
        self.field_ok = false;

        let (x_eq, y_eq) = self.active();
        let sampled = sample_field(
            self.mode,
            x_eq.map(Equation::compiled),
            y_eq.map(Equation::compiled),
            &self.domain,
            &self.parameters,
        );
        match sampled {
            Ok(Some(grid)) => self.renderer.draw_field(&grid),
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "field evaluation failed; display cleared");
                return;
            }
        }
        self.field_ok = true;

        let solutions: Vec<Solution> = self
            .points
            .iter()
            .filter_map(|point| self.solve(*point))
            .collect();
        for (index, solution) in solutions.iter().enumerate() {
            self.draw_solution(index, solution);
        }
    }

    fn solve(&self, point: Point) -> Option<Solution> {
        match self.active() {
            (_, Some(f)) if self.mode == Mode::Standard => Some(Solution::Standard(
                integrate_standard(f.compiled(), &self.domain, point, &self.integrator)
                    .into_path(),
            )),
            (Some(g), Some(f)) => {
                let samples = integrate_parametric(
                    g.compiled(),
                    f.compiled(),
                    &self.domain,
                    point,
                    &self.integrator,
                );
                Some(Solution::Parametric(ParametricPath::collect(
                    samples,
                    &self.domain,
                )))
            }
            _ => None,
        }
    }

    fn draw_solution(&mut self, index: usize, solution: &Solution) {
        let color = Some(PALETTE[index % PALETTE.len()]);
        match solution {
            Solution::Standard(path) => self.renderer.draw_path(&path.segments, color),
            Solution::Parametric(path) => {
                self.renderer.draw_path(&path.plane.segments, color);
                self.renderer
                    .draw_component(Component::X, &path.x_of_t, color);
                self.renderer
                    .draw_component(Component::Y, &path.y_of_t, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, Component, RenderSink, Role, Session, SessionSettings, PALETTE};
    use crate::domain::{Domain, FieldParameters, Point};
    use crate::equation_engine::{Equation, VariableNaming};
    use crate::error::{CompileError, DomainError, EvalError, SessionError};
    use crate::field::{FieldGrid, Mode};
    use crate::trajectory::IntegratorSettings;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Clear,
        Field { cells: usize, scale: f64 },
        Path { segments: Vec<Vec<Point>>, color: Option<Color> },
        Component { component: Component, samples: usize },
    }

    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
    }

    impl Recorder {
        fn paths(&self) -> Vec<&Vec<Vec<Point>>> {
            self.commands
                .iter()
                .filter_map(|c| match c {
                    Command::Path { segments, .. } => Some(segments),
                    _ => None,
                })
                .collect()
        }

        fn has_field(&self) -> bool {
            self.commands
                .iter()
                .any(|c| matches!(c, Command::Field { .. }))
        }
    }

    impl RenderSink for Recorder {
        fn clear(&mut self) {
            self.commands.clear();
            self.commands.push(Command::Clear);
        }

        fn draw_field(&mut self, grid: &FieldGrid) {
            self.commands.push(Command::Field {
                cells: grid.len(),
                scale: grid.scale,
            });
        }

        fn draw_path(&mut self, segments: &[Vec<Point>], color: Option<Color>) {
            self.commands.push(Command::Path {
                segments: segments.to_vec(),
                color,
            });
        }

        fn draw_component(
            &mut self,
            component: Component,
            samples: &[(f64, f64)],
            _color: Option<Color>,
        ) {
            self.commands.push(Command::Component {
                component,
                samples: samples.len(),
            });
        }
    }

    type TestSession = Session<Recorder, Vec<String>>;

    fn session() -> TestSession {
        Session::new(Recorder::default(), Vec::new(), SessionSettings::default())
            .expect("default settings are valid")
    }

    fn standard_with(text: &str) -> TestSession {
        let mut session = session();
        session.submit_expression(text).expect("compiles");
        session.select_equation(Role::Y, text).expect("selects");
        session
    }

    fn parametric_circle() -> TestSession {
        let mut session = session();
        session.switch_mode(Mode::Parametric);
        let naming = VariableNaming::Cartesian;
        session
            .set_equation(Role::X, Equation::compile("-y", naming).expect("compiles"))
            .expect("sets X");
        session
            .set_equation(Role::Y, Equation::compile("x", naming).expect("compiles"))
            .expect("sets Y");
        session
    }

    #[test]
    fn invalid_expression_is_reported_and_not_stored() {
        let mut session = session();
        let err = session.submit_expression("x +").expect_err("should fail");
        assert!(matches!(err, CompileError::SyntaxError { .. }));
        assert!(session.equations().is_empty());
        assert_eq!(session.notifier().len(), 1);
        assert!(session.notifier()[0].contains("x +"));

        assert_eq!(
            session.submit_expression("x/0"),
            Err(CompileError::EvaluationError(EvalError::DivisionByZero))
        );
        assert!(session.equations().is_empty());
    }

    #[test]
    fn equations_are_deduplicated_by_text() {
        let mut session = session();
        session.submit_expression("x*y").expect("compiles");
        session.submit_expression("x*y").expect("compiles");
        session.submit_expression("y*x").expect("compiles");
        let sources: Vec<&str> = session.equations().iter().map(Equation::source).collect();
        assert_eq!(sources, vec!["x*y", "y*x"]);
    }

    #[test]
    fn selecting_y_draws_the_slope_field() {
        let session = standard_with("y");
        assert_eq!(
            session.renderer().commands,
            vec![
                Command::Clear,
                Command::Field {
                    cells: 400,
                    scale: 50.0
                }
            ]
        );
    }

    #[test]
    fn select_unknown_equation_fails() {
        let mut session = session();
        assert_eq!(
            session.select_equation(Role::Y, "x"),
            Err(SessionError::UnknownEquation("x".to_string()))
        );
    }

    #[test]
    fn x_role_is_disabled_in_standard_mode() {
        let mut session = session();
        let eq = Equation::compile("x", VariableNaming::Cartesian).expect("compiles");
        assert_eq!(
            session.set_equation(Role::X, eq),
            Err(SessionError::RoleDisabled(Role::X))
        );
        assert!(session.equation(Role::X).is_none());
    }

    #[test]
    fn solution_points_are_clamped_and_deduplicated() {
        let mut session = standard_with("x");
        assert!(session.add_solution_point(25.0, 0.0));
        assert_eq!(session.solution_points(), &[Point::new(10.0, 0.0)]);
        assert!(!session.add_solution_point(10.0, 0.0));
        assert!(!session.add_solution_point(30.0, 0.0));
        assert_eq!(session.solution_points().len(), 1);
        assert_eq!(session.renderer().paths().len(), 1);
    }

    #[test]
    fn click_outside_data_area_is_ignored() {
        let mut session = standard_with("x");
        assert!(!session.handle_click(None));
        assert!(session.solution_points().is_empty());
        assert!(session.handle_click(Some((0.0, 0.0))));
        assert_eq!(session.solution_points(), &[Point::new(0.0, 0.0)]);
        assert!(!session.handle_click(Some((f64::NAN, 1.0))));
    }

    #[test]
    fn points_need_the_mode_equations() {
        let mut session = session();
        assert!(!session.add_solution_point(1.0, 1.0));
        assert!(session.solution_points().is_empty());
    }

    #[test]
    fn parabola_solution_is_drawn_inside_the_window() {
        let mut session = standard_with("x");
        session.add_solution_point(0.0, 0.0);
        let paths = session.renderer().paths();
        assert_eq!(paths.len(), 1);
        let domain = *session.domain();
        for p in paths[0].iter().flatten() {
            assert!(domain.contains(*p));
            assert!((p.y - p.x * p.x / 2.0).abs() < 1e-6);
        }
        match &session.renderer().commands[2] {
            Command::Path { color, .. } => assert_eq!(*color, Some(PALETTE[0])),
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn domain_change_recomputes_everything() {
        let mut session = standard_with("x");
        session.add_solution_point(0.0, 0.0);
        session.add_solution_point(0.0, 2.0);
        let domain = Domain {
            x_min: -2.0,
            x_max: 2.0,
            ..Domain::default()
        };
        let params = FieldParameters {
            density: 0.5,
            line_length_scale: 2.0,
        };
        session
            .set_domain_or_parameters(domain, params)
            .expect("valid");
        let commands = &session.renderer().commands;
        assert_eq!(commands[0], Command::Clear);
        assert_eq!(
            commands[1],
            Command::Field {
                cells: 100,
                scale: 25.0
            }
        );
        assert_eq!(session.renderer().paths().len(), 2);
        for p in session.renderer().paths().into_iter().flatten().flatten() {
            assert!(p.x >= -2.0 && p.x <= 2.0);
        }
    }

    #[test]
    fn invalid_domain_leaves_state_unchanged() {
        let mut session = standard_with("x");
        let bad = Domain {
            x_min: 1.0,
            x_max: -1.0,
            ..Domain::default()
        };
        let result = session.set_domain_or_parameters(bad, FieldParameters::default());
        assert!(matches!(
            result,
            Err(SessionError::Domain(DomainError::InvalidRange { axis: "x", .. }))
        ));
        assert_eq!(*session.domain(), Domain::default());
    }

    #[test]
    fn removing_the_y_equation_in_standard_mode_drops_points() {
        let mut session = standard_with("x");
        session.add_solution_point(1.0, 1.0);
        assert!(session.remove_equation("x"));
        assert!(session.equation(Role::Y).is_none());
        assert!(session.solution_points().is_empty());
        assert_eq!(session.renderer().commands, vec![Command::Clear]);
        assert!(!session.remove_equation("x"));
    }

    #[test]
    fn clear_solution_points_keeps_the_field() {
        let mut session = standard_with("x");
        session.add_solution_point(1.0, 1.0);
        session.clear_solution_points();
        assert!(session.solution_points().is_empty());
        assert!(session.renderer().has_field());
        assert!(session.renderer().paths().is_empty());
    }

    #[test]
    fn failing_field_clears_display_and_suppresses_trajectories() {
        // With 5 samples per axis x = 0 is on the grid.
        let mut session = standard_with("1/x");
        session
            .set_domain_or_parameters(
                Domain::default(),
                FieldParameters {
                    density: 0.25,
                    line_length_scale: 1.0,
                },
            )
            .expect("valid");
        assert_eq!(session.renderer().commands, vec![Command::Clear]);
        assert!(session.add_solution_point(1.0, 1.0));
        assert_eq!(session.renderer().commands, vec![Command::Clear]);
    }

    #[test]
    fn parametric_mode_draws_plane_and_component_curves() {
        let mut session = parametric_circle();
        assert!(session.renderer().has_field());
        assert!(session.add_solution_point(1.0, 0.0));
        let commands = &session.renderer().commands;
        let tail = &commands[commands.len() - 2..];
        assert_eq!(
            tail,
            &[
                Command::Component {
                    component: Component::X,
                    samples: 1000
                },
                Command::Component {
                    component: Component::Y,
                    samples: 1000
                },
            ]
        );
    }

    #[test]
    fn parametric_needs_both_roles() {
        let mut session = session();
        session.switch_mode(Mode::Parametric);
        session
            .set_equation(
                Role::Y,
                Equation::compile("x", VariableNaming::Cartesian).expect("compiles"),
            )
            .expect("sets Y");
        assert!(!session.renderer().has_field());
        assert!(!session.add_solution_point(0.5, 0.5));
    }

    #[test]
    fn leaving_parametric_mode_drops_x_equation_and_points() {
        let mut session = parametric_circle();
        session.add_solution_point(1.0, 0.0);
        session.switch_mode(Mode::Standard);
        assert_eq!(session.mode(), Mode::Standard);
        assert!(session.equation(Role::X).is_none());
        assert_eq!(
            session.equation(Role::Y).map(Equation::source),
            Some("x")
        );
        assert!(session.solution_points().is_empty());
        // The X equation stays in the library for later use.
        assert_eq!(session.equations().len(), 2);
        assert!(session.renderer().has_field());
    }

    #[test]
    fn switching_to_the_current_mode_is_a_no_op() {
        let mut session = standard_with("x");
        session.add_solution_point(0.0, 0.0);
        session.switch_mode(Mode::Standard);
        assert_eq!(session.solution_points().len(), 1);
    }

    #[test]
    fn oversized_density_is_rejected_without_allocating() {
        let mut session = standard_with("x");
        let result = session.set_domain_or_parameters(
            Domain::default(),
            FieldParameters {
                density: 1e300,
                line_length_scale: 1.0,
            },
        );
        assert_eq!(
            result,
            Err(SessionError::Domain(DomainError::InvalidDensity(1e300)))
        );
        assert_eq!(*session.parameters(), FieldParameters::default());
        assert!(session.renderer().has_field());
    }

    #[test]
    fn integrator_settings_are_validated_on_construction() {
        let settings = |integrator| SessionSettings {
            integrator,
            ..SessionSettings::default()
        };
        let too_many = IntegratorSettings {
            samples_per_direction: usize::MAX,
            ..IntegratorSettings::default()
        };
        assert_eq!(
            Session::new(Recorder::default(), Vec::new(), settings(too_many)).err(),
            Some(DomainError::InvalidSampleCount(usize::MAX))
        );
        let zero_step = IntegratorSettings {
            euler_step: 0.0,
            ..IntegratorSettings::default()
        };
        assert!(matches!(
            Session::new(Recorder::default(), Vec::new(), settings(zero_step)),
            Err(DomainError::InvalidIntegrator {
                name: "euler_step",
                ..
            })
        ));
    }

    #[test]
    fn replacing_y_reintegrates_every_retained_point() {
        let mut session = standard_with("x");
        session.add_solution_point(0.0, 0.0);
        session.add_solution_point(0.0, 2.0);
        session
            .set_equation(
                Role::Y,
                Equation::compile("0", VariableNaming::Cartesian).expect("compiles"),
            )
            .expect("sets Y");
        assert_eq!(session.solution_points().len(), 2);
        let paths = session.renderer().paths();
        assert_eq!(paths.len(), 2);
        // Under dy/dx = 0 each solution is the horizontal line through its point.
        for (path, level) in paths.iter().zip([0.0, 2.0]) {
            for p in path.iter().flatten() {
                assert!((p.y - level).abs() < 1e-12, "{p:?} should be at y = {level}");
            }
        }
    }

    #[test]
    fn parametric_field_failure_clears_display() {
        let mut session = parametric_circle();
        session.add_solution_point(1.0, 0.0);
        session
            .set_equation(
                Role::X,
                Equation::compile("1/x", VariableNaming::Cartesian).expect("compiles"),
            )
            .expect("sets X");
        // 5 samples per axis put x = 0 on the grid.
        session
            .set_domain_or_parameters(
                Domain::default(),
                FieldParameters {
                    density: 0.25,
                    line_length_scale: 1.0,
                },
            )
            .expect("valid");
        assert_eq!(session.renderer().commands, vec![Command::Clear]);
        assert_eq!(session.solution_points().len(), 1);
    }

    #[test]
    fn parametric_naming_compiles_t_and_p() {
        let settings = SessionSettings {
            naming: VariableNaming::Parametric,
            ..SessionSettings::default()
        };
        let mut session =
            Session::new(Recorder::default(), Vec::new(), settings).expect("valid settings");
        session.submit_expression("t*P").expect("compiles");
        assert!(session.submit_expression("x*y").is_err());
    }
}

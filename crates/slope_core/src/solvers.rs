use crate::error::{EvalError, IntegrationError};
use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn order(&self) -> i32 {
        4
    }

    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), EvalError> {
        let half = T::lit(0.5);
        let sixth = T::lit(1.0 / 6.0);
        let two = T::lit(2.0);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1)?;

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2)?;

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3)?;

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4)?;

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Tsitouras 5/4 Solver
pub struct Tsit5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn order(&self) -> i32 {
        5
    }

    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), EvalError> {
        let t0 = *t;

        // Tsit5 Coefficients
        let c2 = T::lit(0.161);
        let c3 = T::lit(0.327);
        let c4 = T::lit(0.9);
        let c5 = T::lit(0.9800255409045097);
        let c6 = T::one();

        let a21 = T::lit(0.161);

        let a31 = T::lit(-0.008480655492356989);
        let a32 = T::lit(0.335480655492357);

        let a41 = T::lit(2.898);
        let a42 = T::lit(-6.359447987781783);
        let a43 = T::lit(4.361447987781783);

        let a51 = T::lit(5.325864858437957);
        let a52 = T::lit(-11.748883564062828);
        let a53 = T::lit(7.495539342889693);
        let a54 = T::lit(-0.09249506636030195);

        let a61 = T::lit(5.86145544294642);
        let a62 = T::lit(-12.92096931784711);
        let a63 = T::lit(8.159367898576159);
        let a64 = T::lit(-0.071584973281401);
        let a65 = T::lit(-0.02826857949054663);

        // b coefficients (5th order)
        let b1 = T::lit(0.09646076681806523);
        let b2 = T::lit(0.01);
        let b3 = T::lit(0.4798896504144996);
        let b4 = T::lit(1.379008574103742);
        let b5 = T::lit(-3.290069515436099);
        let b6 = T::lit(2.324710524099774);

        // k1
        system.apply(t0, state, &mut self.k1)?;

        // k2
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        system.apply(t0 + c2 * dt, &self.tmp, &mut self.k2)?;

        // k3
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        system.apply(t0 + c3 * dt, &self.tmp, &mut self.k3)?;

        // k4
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t0 + c4 * dt, &self.tmp, &mut self.k4)?;

        // k5
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t0 + c5 * dt, &self.tmp, &mut self.k5)?;

        // k6
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t0 + c6 * dt, &self.tmp, &mut self.k6)?;

        // Update State
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b2 * self.k2[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Explicit Euler. Cheap, first order, and it drifts visibly on stiff or
/// strongly curved fields; only used with a small fixed step.
pub struct Euler<T: Scalar> {
    slope: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            slope: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn order(&self) -> i32 {
        1
    }

    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), EvalError> {
        system.apply(*t, state, &mut self.slope)?;
        for i in 0..state.len() {
            state[i] = state[i] + dt * self.slope[i];
        }
        *t = *t + dt;
        Ok(())
    }
}

/// Error control for `StepDoubling`.
#[derive(Debug, Clone, Copy)]
pub struct Tolerances {
    pub rel: f64,
    pub abs: f64,
}

/// Adaptive driver around any one-step method.
///
/// Each trial step of size `h` is compared with two steps of `h / 2`; the
/// difference scaled by `2^p - 1` estimates the local error of the half-step
/// result. Evaluation failures inside a trial step are treated as rejections
/// so the step can shrink past a nearby singularity before giving up.
pub struct StepDoubling<T: Scalar, S: Steppable<T>> {
    stepper: S,
    tolerances: Tolerances,
    min_step: T,
    suggested: Option<T>,
    full: Vec<T>,
    half: Vec<T>,
}

impl<T: Scalar, S: Steppable<T>> StepDoubling<T, S> {
    pub fn new(stepper: S, dim: usize, tolerances: Tolerances, min_step: T) -> Self {
        Self {
            stepper,
            tolerances,
            min_step,
            suggested: None,
            full: vec![T::zero(); dim],
            half: vec![T::zero(); dim],
        }
    }

    /// Integrates from `*t` to exactly `t_end` (either direction), spending at
    /// most `*budget` trial steps.
    pub fn advance(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        t_end: T,
        budget: &mut usize,
    ) -> Result<(), IntegrationError> {
        let span = t_end - *t;
        if span.is_zero() {
            return Ok(());
        }
        let direction = span.signum();
        let half = T::lit(0.5);
        let divisor = T::lit(f64::from(2_i32.pow(self.stepper.order() as u32) - 1));
        let exponent = T::one() / T::lit(f64::from(self.stepper.order() + 1));
        let mut h = self.suggested.unwrap_or(span.abs()).min(span.abs());

        while (t_end - *t) * direction > T::zero() {
            if *budget == 0 {
                return Err(failure(*t, "step budget exhausted"));
            }
            *budget -= 1;

            let remaining = (t_end - *t).abs();
            let last = h >= remaining;
            let step = (if last { remaining } else { h }) * direction;

            let trial = self.trial(system, *t, state, step, half);
            let error = match &trial {
                Ok(()) => self.error_norm(state, divisor),
                Err(_) => T::infinity(),
            };

            if error <= T::one() {
                state.copy_from_slice(&self.half);
                *t = if last { t_end } else { *t + step };
                let growth = if error.is_zero() {
                    T::lit(5.0)
                } else {
                    (T::lit(0.9) * error.powf(-exponent)).min(T::lit(5.0))
                };
                h = step.abs() * growth;
                self.suggested = Some(h);
            } else {
                let shrink = if error.is_finite() {
                    (T::lit(0.9) * error.powf(-exponent)).max(T::lit(0.1))
                } else {
                    T::lit(0.25)
                };
                h = step.abs() * shrink;
                if h < self.min_step {
                    return Err(match trial {
                        Err(err) => IntegrationError::from((to_f64(*t), err)),
                        Ok(()) => failure(*t, "step size underflow"),
                    });
                }
            }
        }
        Ok(())
    }

    fn trial(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        step: T,
        half: T,
    ) -> Result<(), EvalError> {
        self.full.copy_from_slice(state);
        let mut tf = t;
        self.stepper.step(system, &mut tf, &mut self.full, step)?;

        self.half.copy_from_slice(state);
        let mut th = t;
        self.stepper.step(system, &mut th, &mut self.half, step * half)?;
        self.stepper.step(system, &mut th, &mut self.half, step * half)?;

        if self.half.iter().chain(self.full.iter()).all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(EvalError::NonFinite)
        }
    }

    fn error_norm(&self, state: &[T], divisor: T) -> T {
        let rel = T::lit(self.tolerances.rel);
        let abs = T::lit(self.tolerances.abs);
        let mut worst = T::zero();
        for i in 0..state.len() {
            let scale = abs + rel * state[i].abs().max(self.half[i].abs());
            let err = (self.half[i] - self.full[i]).abs() / divisor / scale;
            worst = worst.max(err);
        }
        worst
    }
}

/// Fixed-step driver: walks towards `t_end` with steps of at most `h`,
/// shortening the last one so `t_end` is hit exactly.
pub fn advance_fixed<T: Scalar>(
    stepper: &mut impl Steppable<T>,
    system: &impl DynamicalSystem<T>,
    t: &mut T,
    state: &mut [T],
    t_end: T,
    h: T,
    budget: &mut usize,
) -> Result<(), IntegrationError> {
    let direction = (t_end - *t).signum();
    while (t_end - *t) * direction > T::zero() {
        if *budget == 0 {
            return Err(failure(*t, "step budget exhausted"));
        }
        *budget -= 1;

        let remaining = (t_end - *t).abs();
        let last = h >= remaining;
        let step = (if last { remaining } else { h }) * direction;
        stepper
            .step(system, t, state, step)
            .map_err(|err| IntegrationError::from((to_f64(*t), err)))?;
        if last {
            *t = t_end;
        }
        if !state.iter().all(|v| v.is_finite()) {
            return Err(failure(*t, "state became non-finite"));
        }
    }
    Ok(())
}

fn to_f64<T: Scalar>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn failure<T: Scalar>(at: T, reason: &str) -> IntegrationError {
    IntegrationError::numeric(to_f64(at), reason)
}

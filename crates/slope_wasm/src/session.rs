//! WASM wrapper around the core session.

use crate::render::CommandBuffer;
use anyhow::{anyhow, bail, Context, Result};
use serde_wasm_bindgen::{from_value, to_value};
use slope_core::{Domain, FieldParameters, Mode, Notifier, Role, Session, SessionSettings};
use wasm_bindgen::prelude::*;

/// Forwards "invalid input" messages to a JavaScript callback, if one is set.
/// An exception thrown by the callback is held until the calling session
/// method reports it.
#[derive(Default)]
pub(crate) struct JsNotifier {
    callback: Option<js_sys::Function>,
    thrown: Option<JsValue>,
}

impl JsNotifier {
    fn take_thrown(&mut self) -> Option<JsValue> {
        self.thrown.take()
    }
}

impl Notifier for JsNotifier {
    fn invalid_input(&mut self, message: &str) {
        if let Some(callback) = &self.callback {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(message)) {
                self.thrown = Some(err);
            }
        }
    }
}

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

pub(crate) fn parse_role(name: &str) -> Result<Role> {
    match name {
        "x" | "X" => Ok(Role::X),
        "y" | "Y" => Ok(Role::Y),
        other => bail!("Unknown equation role: {other}"),
    }
}

pub(crate) fn parse_mode(name: &str) -> Result<Mode> {
    match name {
        "standard" => Ok(Mode::Standard),
        "parametric" => Ok(Mode::Parametric),
        other => bail!("Unknown mode: {other}"),
    }
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

#[wasm_bindgen]
pub struct WasmSession {
    session: Session<CommandBuffer, JsNotifier>,
}

#[wasm_bindgen]
impl WasmSession {
    /// `settings` may be `undefined` for the defaults, or a partial
    /// `SessionSettings` object.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<WasmSession, JsValue> {
        console_error_panic_hook::set_once();

        let settings: SessionSettings = if settings.is_undefined() || settings.is_null() {
            SessionSettings::default()
        } else {
            from_value(settings)
                .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?
        };
        let session = Session::new(CommandBuffer::default(), JsNotifier::default(), settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        Ok(WasmSession { session })
    }

    pub fn set_error_callback(&mut self, callback: js_sys::Function) {
        self.session.notifier_mut().callback = Some(callback);
    }

    /// Compiles and stores an expression. The error callback has already
    /// been told about a failure by the time this returns `Err`.
    pub fn submit_expression(&mut self, text: &str) -> Result<(), JsValue> {
        let result = self.session.submit_expression(text);
        let thrown = self.session.notifier_mut().take_thrown();
        result.map_err(|e| match thrown {
            Some(thrown) => JsValue::from_str(&format!(
                "{e}; error callback threw: {}",
                describe(&thrown)
            )),
            None => JsValue::from_str(&e.to_string()),
        })
    }

    pub fn select_equation(&mut self, role: &str, key: &str) -> Result<(), JsValue> {
        let role = parse_role(role).map_err(to_js)?;
        self.session
            .select_equation(role, key)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn remove_equation(&mut self, key: &str) -> bool {
        self.session.remove_equation(key)
    }

    pub fn switch_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = parse_mode(mode).map_err(to_js)?;
        self.session.switch_mode(mode);
        Ok(())
    }

    pub fn set_domain_or_parameters(
        &mut self,
        domain: JsValue,
        parameters: JsValue,
    ) -> Result<(), JsValue> {
        let (domain, parameters) = decode_window(domain, parameters).map_err(to_js)?;
        self.session
            .set_domain_or_parameters(domain, parameters)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Plot click in data coordinates; either coordinate is `undefined` when
    /// the click missed the data area.
    pub fn click(&mut self, x: Option<f64>, y: Option<f64>) -> bool {
        self.session.handle_click(x.zip(y))
    }

    pub fn clear_solution_points(&mut self) {
        self.session.clear_solution_points();
    }

    /// Source text of every stored equation, in insertion order.
    pub fn equations(&self) -> Vec<String> {
        self.session
            .equations()
            .iter()
            .map(|eq| eq.source().to_string())
            .collect()
    }

    /// Source text of the equation in `role`, if any.
    pub fn equation(&self, role: &str) -> Result<Option<String>, JsValue> {
        let role = parse_role(role).map_err(to_js)?;
        Ok(self
            .session
            .equation(role)
            .map(|eq| eq.source().to_string()))
    }

    /// Drains the render commands produced since the last call.
    pub fn take_commands(&mut self) -> Result<JsValue, JsValue> {
        let commands = self.session.renderer_mut().take();
        to_value(&commands).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn decode_window(domain: JsValue, parameters: JsValue) -> Result<(Domain, FieldParameters)> {
    let domain: Domain = from_value(domain)
        .map_err(|e| anyhow!(e.to_string()))
        .context("Invalid domain")?;
    let parameters: FieldParameters = from_value(parameters)
        .map_err(|e| anyhow!(e.to_string()))
        .context("Invalid field parameters")?;
    Ok((domain, parameters))
}

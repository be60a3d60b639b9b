//! The on-screen math keypad: a fixed label table shown a page at a time.

use wasm_bindgen::prelude::*;

/// Every keypad label, in page order.
pub const MATH_COMMANDS: [&str; 16] = [
    "pi", "sin", "cos", "E", "+", "-", "/", "*", //
    "tan", "arctan", "arcsin", "arccos", "^", "(", ")", "%",
];

pub const PAGE_SIZE: usize = 8;

fn page_count() -> usize {
    MATH_COMMANDS.len().div_ceil(PAGE_SIZE)
}

#[wasm_bindgen]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    page: usize,
}

#[wasm_bindgen]
impl Keypad {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Keypad {
        Keypad::default()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Moves `delta` pages, stopping at the first and last page.
    pub fn shift(&mut self, delta: i32) {
        let last = page_count().saturating_sub(1) as i64;
        self.page = (self.page as i64 + i64::from(delta)).clamp(0, last) as usize;
    }

    /// Labels of the buttons on the current page.
    pub fn labels(&self) -> Vec<String> {
        MATH_COMMANDS
            .iter()
            .skip(self.page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .map(|label| label.to_string())
            .collect()
    }

    /// The text a press of button `slot` inserts into the input box.
    pub fn label(&self, slot: usize) -> Option<String> {
        if slot >= PAGE_SIZE {
            return None;
        }
        MATH_COMMANDS
            .get(self.page * PAGE_SIZE + slot)
            .map(|label| label.to_string())
    }
}

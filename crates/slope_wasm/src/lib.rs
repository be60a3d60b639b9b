//! Browser bridge for `slope_core`.
//!
//! The JavaScript side owns layout and plotting. It feeds user input into a
//! `WasmSession`, replays the recorded `DrawCommand`s on its canvas, and reads
//! keypad labels from `Keypad`.

mod keypad;
mod render;
mod session;

pub use keypad::{Keypad, MATH_COMMANDS, PAGE_SIZE};
pub use render::{CommandBuffer, DrawCommand};
pub use session::WasmSession;

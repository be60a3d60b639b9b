//! Render commands recorded for the JavaScript plotting layer.

use nalgebra::DMatrix;
use serde::Serialize;
use slope_core::{Color, Component, FieldGrid, Point, RenderSink};

/// One drawing instruction. The front end replays the list returned by
/// `WasmSession::take_commands` in order; `clear` always comes first after a
/// full recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    /// Quiver plot. Arrays are row-major, `rows` y samples by `cols` x samples.
    Field {
        rows: usize,
        cols: usize,
        x: Vec<f64>,
        y: Vec<f64>,
        u: Vec<f64>,
        v: Vec<f64>,
        scale: f64,
    },
    Path {
        segments: Vec<Vec<[f64; 2]>>,
        color: Option<String>,
    },
    Component {
        component: Component,
        points: Vec<[f64; 2]>,
        color: Option<String>,
    },
}

#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

fn row_major(matrix: &DMatrix<f64>) -> Vec<f64> {
    matrix.transpose().as_slice().to_vec()
}

impl RenderSink for CommandBuffer {
    fn clear(&mut self) {
        // Anything not yet taken is stale once the display is cleared.
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_field(&mut self, grid: &FieldGrid) {
        self.commands.push(DrawCommand::Field {
            rows: grid.x.nrows(),
            cols: grid.x.ncols(),
            x: row_major(&grid.x),
            y: row_major(&grid.y),
            u: row_major(&grid.u),
            v: row_major(&grid.v),
            scale: grid.scale,
        });
    }

    fn draw_path(&mut self, segments: &[Vec<Point>], color: Option<Color>) {
        if segments.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Path {
            segments: segments
                .iter()
                .map(|segment| segment.iter().map(|p| [p.x, p.y]).collect())
                .collect(),
            color: color.map(Color::to_hex),
        });
    }

    fn draw_component(&mut self, component: Component, samples: &[(f64, f64)], color: Option<Color>) {
        self.commands.push(DrawCommand::Component {
            component,
            points: samples.iter().map(|&(t, value)| [t, value]).collect(),
            color: color.map(Color::to_hex),
        });
    }
}

//! Server-side chart rendering.

mod chart;

pub use chart::Chart;

//! Charts module - static map and interactive globe rendering

pub mod color;
mod globe;
pub mod projection;
mod renderer;

pub use globe::{hover_label, GlobeWriter, LayoutOverrides};
pub use renderer::StaticMapRenderer;

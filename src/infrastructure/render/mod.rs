//! Graph renderers turning a [`GraphSpec`](crate::domain::GraphSpec) into a
//! displayable artifact.

pub mod dot;
pub mod graphviz;

pub use dot::DotRenderer;
pub use graphviz::GraphvizRenderer;

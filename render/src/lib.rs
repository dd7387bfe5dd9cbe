//! Turns a [`GraphView`](storage::GraphView) into primitives a force-directed
//! graph surface can draw.

pub mod projection;
pub mod style;

pub use projection::{project, EdgePrimitive, Element, Layout, NodePrimitive, Projection};
pub use style::{default_style, StyleRule};

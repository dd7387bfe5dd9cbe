pub mod snapshot;
pub mod store;

pub use snapshot::{GraphSnapshot, MalformedGraph, MergeReport};
pub use store::{GraphStore, GraphView, StoreError};

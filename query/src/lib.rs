pub mod controller;
pub mod diagnostics;
pub mod dsl;
pub mod selection;
pub mod slot;

pub use controller::{Completion, QueryController, Settlement};
pub use diagnostics::Diagnostic;
pub use dsl::{QueryError, SearchMode, SearchRequest};
pub use selection::{SelectionHandler, SurfacePolicy, TapOutcome};
pub use slot::{Slot, SlotPhase, Ticket};

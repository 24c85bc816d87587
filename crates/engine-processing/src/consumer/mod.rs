pub mod coordinator;
pub mod trigger;

pub use coordinator::{BatchCoordinator, CoordinatorState, StreamSummary};

mod history;
mod model;
mod store;

pub use history::{Applied, CycleAction, CycleHistory, InvariantViolation};
pub use model::{Cycle, CycleId, CycleStatus};
pub use store::CycleStore;

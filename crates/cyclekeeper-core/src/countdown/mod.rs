mod display;
mod driver;
mod engine;

pub use display::CountdownDisplay;
pub use driver::{CountdownDriver, DriverCommand, DriverOutcome};
pub use engine::{elapsed_whole_seconds, Binding, CountdownEngine, EngineState, Sample};

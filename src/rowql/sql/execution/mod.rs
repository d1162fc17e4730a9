// Pipeline execution: value model, stage processors, and the engine that
// drives rows from a source through the clause chain to a writer.

pub mod engine;
pub mod processors;
pub mod types;

pub use engine::{PipelineEngine, RunResult};
pub use types::{OutputRow, Value};

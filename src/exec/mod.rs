//! Command resolution and execution

pub mod resolver;
pub mod runner;

pub use resolver::CommandResolver;
pub use runner::{CommandRunner, ExecutionOutcome, RunError, Shell};

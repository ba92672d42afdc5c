// Live order execution and the evaluation loop
pub mod executor;
pub mod scheduler;

pub use executor::{CycleOutcome, ExecutionAction, ExecutionDecision, Executor};
pub use scheduler::{run_loop, Scheduler};

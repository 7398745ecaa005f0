mod sampler;
mod scheduler;

pub use sampler::{run_cycle, Observation, ProgressSampler};
pub use scheduler::Scheduler;

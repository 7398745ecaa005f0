//! Core library for renderwatch.
//!
//! Derives a render-progress signal for a video editor by scraping its
//! accessibility surface: window titles, element values, progress indicator
//! widgets and menu labels. The pipeline is
//! [`Scheduler`](monitor::Scheduler) → [`ProgressSampler`](monitor::ProgressSampler)
//! → [`ProbeChain`](probes::ProbeChain) → [`extract`], with every result
//! committed through the [`StatusMachine`](state::StatusMachine).

pub mod automation;
pub mod config;
pub mod extract;
pub mod monitor;
pub mod notify;
pub mod probes;
pub mod process;
pub mod state;

pub use automation::{QueryError, Selector, UiQuery};
pub use config::{Config, Settings};
pub use monitor::{Observation, ProgressSampler, Scheduler};
pub use notify::{Notifier, NotifyError};
pub use probes::{ProbeChain, ProbeKind, Sample};
pub use process::LivenessCheck;
pub use state::{MonitorState, Status, StatusMachine, Transition};

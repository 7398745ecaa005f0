use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitor::Observation;

/// Render status of the watched application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The application is not running
    #[default]
    NotRunning,
    /// Running, no render in progress
    Idle,
    /// A render is in progress
    Rendering,
    /// Running, but its UI cannot be queried at all
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NotRunning => write!(f, "Not running"),
            Status::Idle => write!(f, "Idle"),
            Status::Rendering => write!(f, "Rendering"),
            Status::Error => write!(f, "Error"),
        }
    }
}

/// Read model published after every detection cycle.
///
/// Snapshots are cloned out of the state machine, so readers never see a
/// half-applied cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorState {
    pub status: Status,
    /// Progress in `[0, 100]`; 0 unless rendering
    pub progress: f64,
    pub eta: Option<String>,
    pub last_error: Option<String>,
    /// When the last cycle was committed
    pub last_update: Option<DateTime<Utc>>,
    /// Whether the previous cycle was rendering. Only the state machine
    /// touches this; it exists to catch the Rendering → Idle edge.
    #[serde(skip)]
    was_rendering: bool,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            status: Status::NotRunning,
            progress: 0.0,
            eta: None,
            last_error: None,
            last_update: None,
            was_rendering: false,
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.status == Status::Rendering
    }

    /// Whether the previous cycle was rendering
    pub fn was_rendering(&self) -> bool {
        self.was_rendering
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of applying one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: Status,
    pub current: Status,
    /// A render just finished; notify exactly once
    pub completed: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Single owner of [`MonitorState`].
///
/// Only the scheduler's commit task holds one of these, so no lock is
/// needed around the state.
#[derive(Debug, Default)]
pub struct StatusMachine {
    state: MonitorState,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state (borrowed)
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> MonitorState {
        self.state.clone()
    }

    /// Fold one cycle's observation into the state
    pub fn apply(&mut self, observation: Observation) -> Transition {
        self.apply_at(observation, Utc::now())
    }

    pub(crate) fn apply_at(&mut self, observation: Observation, now: DateTime<Utc>) -> Transition {
        let previous = self.state.status;
        let mut completed = false;
        let state = &mut self.state;

        match observation {
            Observation::NotRunning => {
                // A vanished process is not a finished render
                state.status = Status::NotRunning;
                state.progress = 0.0;
                state.eta = None;
                state.last_error = None;
                state.was_rendering = false;
            }
            Observation::Sampled(sample) => match sample.percentage {
                Some(percentage) => {
                    state.status = Status::Rendering;
                    state.progress = percentage;
                    state.eta = sample.eta;
                    state.last_error = None;
                    state.was_rendering = true;
                }
                None => {
                    state.status = Status::Idle;
                    state.progress = 0.0;
                    state.eta = None;
                    state.last_error = None;
                    if state.was_rendering {
                        completed = true;
                        state.was_rendering = false;
                    }
                }
            },
            Observation::Unauthorized { message } => {
                state.status = Status::Error;
                state.progress = 0.0;
                state.eta = None;
                state.last_error = Some(message);
                state.was_rendering = false;
            }
        }

        state.last_update = Some(now);

        Transition {
            previous,
            current: state.status,
            completed,
        }
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::NotificationSettings;
use crate::notify::{deliver, Notifier};
use crate::state::{MonitorState, StatusMachine};

use super::sampler::{Observation, ProgressSampler};

/// Holds the in-flight flag for one cycle; released on drop, whatever
/// happened to the cycle.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A finished cycle on its way to the commit task. The guard travels with
/// it so the next cycle cannot start before this one is committed.
struct CycleMessage {
    observation: Observation,
    _guard: InFlightGuard,
}

/// Everything needed to start a cycle; cheap to clone into the ticker task
#[derive(Clone)]
struct Dispatcher {
    sampler: Arc<ProgressSampler>,
    in_flight: Arc<AtomicBool>,
    cycle_tx: mpsc::Sender<CycleMessage>,
    runtime: Handle,
}

impl Dispatcher {
    /// Start a cycle unless one is already in flight
    fn dispatch(&self) -> bool {
        let Some(guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            trace!("detection cycle still in flight, skipping");
            return false;
        };

        let sampler = self.sampler.clone();
        let cycle_tx = self.cycle_tx.clone();
        let runtime = self.runtime.clone();

        self.runtime.spawn(async move {
            match runtime.spawn_blocking(move || sampler.run_cycle()).await {
                Ok(observation) => {
                    let message = CycleMessage {
                        observation,
                        _guard: guard,
                    };
                    if cycle_tx.send(message).await.is_err() {
                        debug!("commit task gone, dropping cycle");
                    }
                }
                Err(e) => warn!(error = %e, "detection cycle worker failed"),
            }
        });

        true
    }
}

/// Drives detection cycles and owns the committed state.
///
/// Cycles run on blocking workers. Their observations are committed one at
/// a time by a single task that owns the [`StatusMachine`] and publishes
/// snapshots on a watch channel. At most one cycle is ever in flight.
pub struct Scheduler {
    dispatcher: Dispatcher,
    interval: Duration,
    state_rx: watch::Receiver<MonitorState>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Scheduler {
    /// Create a scheduler and spawn its commit task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        sampler: ProgressSampler,
        notifier: Arc<dyn Notifier>,
        notifications: NotificationSettings,
        interval: Duration,
    ) -> Self {
        let runtime = Handle::current();
        let machine = StatusMachine::new();
        let (state_tx, state_rx) = watch::channel(machine.snapshot());
        let (cycle_tx, cycle_rx) = mpsc::channel(1);

        runtime.spawn(commit_loop(
            machine,
            cycle_rx,
            state_tx,
            notifier,
            notifications,
        ));

        Self {
            dispatcher: Dispatcher {
                sampler: Arc::new(sampler),
                in_flight: Arc::new(AtomicBool::new(false)),
                cycle_tx,
                runtime,
            },
            interval,
            state_rx,
            cancel: Mutex::new(None),
        }
    }

    /// Start the cadence: one cycle now, then one per interval.
    ///
    /// Any previous cadence is stopped first.
    pub fn start(&self) {
        let token = CancellationToken::new();
        if let Some(previous) = self.cancel.lock().replace(token.clone()) {
            previous.cancel();
        }

        let dispatcher = self.dispatcher.clone();
        let interval = self.interval;
        info!(interval_ms = interval.as_millis() as u64, "monitoring started");

        self.dispatcher.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        dispatcher.dispatch();
                    }
                }
            }
        });
    }

    /// Cancel future cycles. A cycle already in flight still commits.
    pub fn stop(&self) {
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
            info!("monitoring stopped");
        }
    }

    /// Whether a cadence is active
    pub fn is_started(&self) -> bool {
        self.cancel.lock().is_some()
    }

    /// Trigger one cycle now. Returns false if a cycle was already in flight.
    pub fn run_once(&self) -> bool {
        self.dispatcher.dispatch()
    }

    /// Receive every committed state
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state_rx.clone()
    }

    /// Latest committed state
    pub fn snapshot(&self) -> MonitorState {
        self.state_rx.borrow().clone()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Single writer of the monitor state
async fn commit_loop(
    mut machine: StatusMachine,
    mut cycle_rx: mpsc::Receiver<CycleMessage>,
    state_tx: watch::Sender<MonitorState>,
    notifier: Arc<dyn Notifier>,
    notifications: NotificationSettings,
) {
    while let Some(message) = cycle_rx.recv().await {
        let CycleMessage {
            observation,
            _guard,
        } = message;

        let transition = machine.apply(observation);
        if transition.changed() {
            info!(
                from = %transition.previous,
                to = %transition.current,
                "status changed"
            );
        }

        state_tx.send_replace(machine.snapshot());

        if transition.completed && notifications.enabled {
            let notifier = notifier.clone();
            let title = notifications.title.clone();
            let body = notifications.body.clone();
            tokio::task::spawn_blocking(move || deliver(notifier.as_ref(), &title, &body));
        }

        // Guard drops here, after the commit
    }

    debug!("commit task finished");
}

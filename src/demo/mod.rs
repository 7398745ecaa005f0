//! Scripted render for `renderwatch demo`.
//!
//! [`ScriptedQuery`] and [`ScriptedLiveness`] stand in for the automation
//! layer and the process listing, replaying [`scenario::default_scenario`]
//! against the wall clock so the real scheduler, state machine and notifier
//! run without an editor.

pub mod scenario;

use std::sync::Arc;
use std::time::{Duration, Instant};

use renderwatch_core::automation::{QueryError, Selector, UiQuery};
use renderwatch_core::process::LivenessCheck;

use scenario::{DemoFrame, DemoScenario};

/// A scenario bound to a start time
pub struct ScenarioClock {
    scenario: DemoScenario,
    start: Instant,
}

impl ScenarioClock {
    /// Start replaying now
    pub fn start(scenario: DemoScenario) -> Arc<Self> {
        Arc::new(Self {
            scenario,
            start: Instant::now(),
        })
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether the scenario has played out
    pub fn finished(&self) -> bool {
        self.elapsed() >= self.scenario.duration
    }

    fn frame_at(&self, elapsed: Duration) -> Option<&DemoFrame> {
        self.scenario.frame_at(elapsed)
    }

    fn current(&self) -> Option<&DemoFrame> {
        self.frame_at(self.elapsed())
    }
}

/// UI queries answered from the current frame. Only window titles exist;
/// every other selector reports a missing element.
pub struct ScriptedQuery {
    clock: Arc<ScenarioClock>,
}

impl ScriptedQuery {
    pub fn new(clock: Arc<ScenarioClock>) -> Self {
        Self { clock }
    }

    fn answer(frame: Option<&DemoFrame>, selector: &Selector) -> Result<String, QueryError> {
        match (frame, selector) {
            (Some(frame), Selector::WindowTitles) if frame.running => Ok(frame.titles.join("\n")),
            (Some(frame), _) if frame.running => Err(QueryError::ElementMissing(selector.to_string())),
            _ => Err(QueryError::Failed("application isn't running".to_string())),
        }
    }
}

impl UiQuery for ScriptedQuery {
    fn query(&self, selector: &Selector) -> Result<String, QueryError> {
        Self::answer(self.clock.current(), selector)
    }
}

/// Liveness from the current frame
pub struct ScriptedLiveness {
    clock: Arc<ScenarioClock>,
}

impl ScriptedLiveness {
    pub fn new(clock: Arc<ScenarioClock>) -> Self {
        Self { clock }
    }
}

impl LivenessCheck for ScriptedLiveness {
    fn is_running(&self) -> bool {
        self.clock.current().is_some_and(|frame| frame.running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use renderwatch_core::monitor::{run_cycle, Observation};
    use renderwatch_core::probes::{ProbeChain, ProbeKind, Sample};

    /// Answers for a fixed point in the scenario
    struct FixedQuery(Duration);

    impl UiQuery for FixedQuery {
        fn query(&self, selector: &Selector) -> Result<String, QueryError> {
            let scenario = scenario::default_scenario();
            ScriptedQuery::answer(scenario.frame_at(self.0), selector)
        }
    }

    struct Running;

    impl LivenessCheck for Running {
        fn is_running(&self) -> bool {
            true
        }
    }

    fn observe(at_secs: u64) -> Observation {
        run_cycle(
            &ProbeChain::default(),
            &FixedQuery(Duration::from_secs(at_secs)),
            &Running,
        )
    }

    #[test]
    fn test_idle_frame() {
        assert_eq!(observe(2), Observation::Sampled(Sample::idle()));
    }

    #[test]
    fn test_rendering_frames() {
        assert_eq!(
            observe(4),
            Observation::Sampled(Sample {
                percentage: Some(12.0),
                eta: Some("3 min".to_string()),
                source: Some(ProbeKind::Window),
            })
        );
        assert_eq!(
            observe(6),
            Observation::Sampled(Sample {
                percentage: Some(37.0),
                eta: Some("2:10".to_string()),
                source: Some(ProbeKind::Window),
            })
        );
        assert_eq!(
            observe(8),
            Observation::Sampled(Sample {
                percentage: Some(64.0),
                eta: Some("1m 20s".to_string()),
                source: Some(ProbeKind::Window),
            })
        );
    }

    #[test]
    fn test_liveness_follows_clock() {
        let clock = ScenarioClock::start(scenario::default_scenario());
        // Editor is launched two seconds in
        assert!(!ScriptedLiveness::new(clock.clone()).is_running());
        assert!(!clock.finished());
    }
}

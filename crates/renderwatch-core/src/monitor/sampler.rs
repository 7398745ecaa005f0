use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::automation::UiQuery;
use crate::probes::{ProbeChain, Sample};
use crate::process::LivenessCheck;

/// What one detection cycle saw
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The application is not running
    NotRunning,
    /// The probe chain ran; the sample may or may not carry a percentage
    Sampled(Sample),
    /// The application is running but its UI tree refused every query
    Unauthorized { message: String },
}

/// One full detection cycle: liveness first, then the probe chain.
///
/// Runs synchronously and may block for as long as the automation layer
/// takes; callers keep it off the state-owning task.
pub fn run_cycle(
    chain: &ProbeChain,
    query: &dyn UiQuery,
    liveness: &dyn LivenessCheck,
) -> Observation {
    if !liveness.is_running() {
        return Observation::NotRunning;
    }

    match chain.detect(query) {
        Ok(sample) => Observation::Sampled(sample),
        Err(e) => {
            warn!(error = %e, "UI tree not accessible");
            Observation::Unauthorized {
                message: e.to_string(),
            }
        }
    }
}

/// Owns the probe chain and the external seams a cycle needs
pub struct ProgressSampler {
    chain: ProbeChain,
    query: Arc<dyn UiQuery>,
    liveness: Arc<dyn LivenessCheck>,
}

impl ProgressSampler {
    pub fn new(
        chain: ProbeChain,
        query: Arc<dyn UiQuery>,
        liveness: Arc<dyn LivenessCheck>,
    ) -> Self {
        Self {
            chain,
            query,
            liveness,
        }
    }

    /// Run one cycle (blocking)
    pub fn run_cycle(&self) -> Observation {
        let started = Instant::now();
        let observation = run_cycle(&self.chain, self.query.as_ref(), self.liveness.as_ref());
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?observation,
            "detection cycle finished"
        );
        observation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::CannedQuery;
    use crate::automation::{QueryError, Selector};
    use crate::probes::ProbeKind;
    use pretty_assertions::assert_eq;

    struct Liveness(bool);

    impl LivenessCheck for Liveness {
        fn is_running(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_not_running_skips_queries() {
        let query = Arc::new(CannedQuery::new());
        let sampler = ProgressSampler::new(
            ProbeChain::default(),
            query.clone(),
            Arc::new(Liveness(false)),
        );
        assert_eq!(sampler.run_cycle(), Observation::NotRunning);
        assert!(query.calls().is_empty());
    }

    #[test]
    fn test_sampled_from_indicator() {
        let query = CannedQuery::new()
            .with(Selector::WindowTitles, "Final Cut Pro")
            .with(Selector::IndicatorValues, "0.5");
        let observation = run_cycle(&ProbeChain::default(), &query, &Liveness(true));
        assert_eq!(
            observation,
            Observation::Sampled(Sample {
                percentage: Some(50.0),
                eta: None,
                source: Some(ProbeKind::IndicatorMenu),
            })
        );
    }

    #[test]
    fn test_idle_when_nothing_found() {
        let query = CannedQuery::new().with(Selector::WindowTitles, "Final Cut Pro");
        let observation = run_cycle(&ProbeChain::default(), &query, &Liveness(true));
        assert_eq!(observation, Observation::Sampled(Sample::idle()));
    }

    #[test]
    fn test_unauthorized_reported() {
        let query = CannedQuery::new().failing(
            Selector::WindowTitles,
            QueryError::NotAuthorized("osascript is not allowed assistive access".to_string()),
        );
        let observation = run_cycle(&ProbeChain::default(), &query, &Liveness(true));
        assert!(matches!(observation, Observation::Unauthorized { .. }));
    }

    #[test]
    fn test_same_input_same_sample() {
        let query = CannedQuery::new().with(Selector::WindowTitles, "Rendering - 45% – about 3 min");
        let chain = ProbeChain::default();
        let first = run_cycle(&chain, &query, &Liveness(true));
        let second = run_cycle(&chain, &query, &Liveness(true));
        assert_eq!(first, second);
        assert_eq!(
            first,
            Observation::Sampled(Sample {
                percentage: Some(45.0),
                eta: Some("3 min".to_string()),
                source: Some(ProbeKind::Window),
            })
        );
    }
}

mod deep_scan;
mod indicator;
mod window;

pub use deep_scan::DeepScanProbe;
pub use indicator::IndicatorMenuProbe;
pub use window::WindowProbe;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::automation::{QueryError, Selector, UiQuery};
use crate::config::ProbeSettings;
use crate::extract::{extract_duration, normalize_candidate};

/// Raw candidate produced by a probe before extraction. `None` means the
/// probe found nothing to offer, which is not an error.
pub type ProbeResult = Option<String>;

/// Which probe produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Window,
    IndicatorMenu,
    DeepScan,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Window => write!(f, "window"),
            ProbeKind::IndicatorMenu => write!(f, "indicator/menu"),
            ProbeKind::DeepScan => write!(f, "deep scan"),
        }
    }
}

/// One detection cycle's result. A missing percentage means the editor is
/// not rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sample {
    /// Progress in `[0, 100]`
    pub percentage: Option<f64>,
    /// Remaining time as displayed by the editor ("2h 30m", "1:30:00")
    pub eta: Option<String>,
    /// Probe that produced the percentage
    pub source: Option<ProbeKind>,
}

impl Sample {
    /// Sample for a cycle where no probe produced a usable percentage
    pub fn idle() -> Self {
        Self::default()
    }

    /// Build a sample from a raw candidate, if it holds a usable percentage
    pub fn from_candidate(raw: &str, source: ProbeKind) -> Option<Self> {
        let percentage = normalize_candidate(raw)?;
        Some(Self {
            percentage: Some(percentage),
            eta: extract_duration(raw),
            source: Some(source),
        })
    }

    pub fn is_rendering(&self) -> bool {
        self.percentage.is_some()
    }
}

/// Strategy for finding a progress candidate in the foreign UI tree
pub trait Probe: Send + Sync {
    /// Identifies the probe in samples and logs
    fn kind(&self) -> ProbeKind;

    /// Look for a raw progress candidate.
    ///
    /// Per-element failures are absorbed and reported as `Ok(None)`. Only
    /// structural failures (see [`QueryError::is_structural`]) come back as
    /// `Err`.
    fn try_detect(&self, query: &dyn UiQuery) -> Result<ProbeResult, QueryError>;
}

/// Run a selector, absorbing everything but structural failures
pub(crate) fn query_lenient(
    query: &dyn UiQuery,
    selector: &Selector,
) -> Result<Option<String>, QueryError> {
    match query.query(selector) {
        Ok(output) => Ok(Some(output)),
        Err(e) if e.is_structural() => Err(e),
        Err(e) => {
            debug!(%selector, error = %e, "query miss");
            Ok(None)
        }
    }
}

/// Ordered fallback probes. The first candidate with an extractable
/// percentage wins.
pub struct ProbeChain {
    probes: Vec<Box<dyn Probe>>,
}

impl ProbeChain {
    /// Chain from an explicit probe list
    pub fn new(probes: Vec<Box<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// Window, then indicator/menu, then deep scan
    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self::new(vec![
            Box::new(WindowProbe::new(settings.background_tasks_window.clone())),
            Box::new(IndicatorMenuProbe::new(settings.menus.clone())),
            Box::new(DeepScanProbe::new(settings.progress_role.clone())),
        ])
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Run probes in order until one yields a usable percentage.
    ///
    /// Returns an idle sample when none do. `Err` only for structural
    /// failures, which stop the chain immediately.
    pub fn detect(&self, query: &dyn UiQuery) -> Result<Sample, QueryError> {
        for probe in &self.probes {
            let Some(raw) = probe.try_detect(query)? else {
                debug!(probe = %probe.kind(), "no candidate");
                continue;
            };

            match Sample::from_candidate(&raw, probe.kind()) {
                Some(sample) => {
                    debug!(probe = %probe.kind(), raw = %raw, percentage = ?sample.percentage, "progress found");
                    return Ok(sample);
                }
                None => debug!(probe = %probe.kind(), raw = %raw, "candidate without percentage"),
            }
        }

        Ok(Sample::idle())
    }
}

impl Default for ProbeChain {
    fn default() -> Self {
        Self::from_settings(&ProbeSettings::default())
    }
}

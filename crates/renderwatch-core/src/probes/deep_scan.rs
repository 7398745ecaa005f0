use crate::automation::{parse_items, QueryError, Selector, UiQuery};

use super::{query_lenient, Probe, ProbeKind, ProbeResult};

/// Last resort: every static text in every window, then anything in the
/// primary window carrying the progress indicator role.
pub struct DeepScanProbe {
    progress_role: String,
}

impl DeepScanProbe {
    pub fn new(progress_role: impl Into<String>) -> Self {
        Self {
            progress_role: progress_role.into(),
        }
    }
}

impl Probe for DeepScanProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::DeepScan
    }

    fn try_detect(&self, query: &dyn UiQuery) -> Result<ProbeResult, QueryError> {
        if let Some(output) = query_lenient(query, &Selector::StaticTexts)? {
            if let Some(text) = parse_items(&output).into_iter().find(|t| t.contains('%')) {
                return Ok(Some(text));
            }
        }

        let selector = Selector::RoleValues {
            role: self.progress_role.clone(),
        };
        Ok(query_lenient(query, &selector)?
            .and_then(|output| parse_items(&output).into_iter().next()))
    }
}

use crate::automation::{parse_elements, parse_items, QueryError, Selector, UiQuery};

use super::{query_lenient, Probe, ProbeKind, ProbeResult};

/// Window titles first, then the contents of the background tasks window.
///
/// Older editor releases put the render percentage straight into a window
/// title. Newer ones only show it inside the "Background Tasks" window, as
/// either the value or the description of some nested element.
pub struct WindowProbe {
    background_tasks_window: String,
}

impl WindowProbe {
    pub fn new(background_tasks_window: impl Into<String>) -> Self {
        Self {
            background_tasks_window: background_tasks_window.into(),
        }
    }
}

impl Probe for WindowProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Window
    }

    fn try_detect(&self, query: &dyn UiQuery) -> Result<ProbeResult, QueryError> {
        let Some(output) = query_lenient(query, &Selector::WindowTitles)? else {
            return Ok(None);
        };
        let titles = parse_items(&output);

        if let Some(title) = titles.iter().find(|t| t.contains('%')) {
            return Ok(Some(title.clone()));
        }

        if !titles.iter().any(|t| t == &self.background_tasks_window) {
            return Ok(None);
        }

        let selector = Selector::WindowElements {
            window: self.background_tasks_window.clone(),
        };
        let Some(output) = query_lenient(query, &selector)? else {
            return Ok(None);
        };

        let candidate = parse_elements(&output).into_iter().find_map(|element| {
            [element.value, element.description]
                .into_iter()
                .flatten()
                .find(|field| field.contains('%'))
        });
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::CannedQuery;

    fn probe() -> WindowProbe {
        WindowProbe::new("Background Tasks")
    }

    fn tasks_window() -> Selector {
        Selector::WindowElements {
            window: "Background Tasks".to_string(),
        }
    }

    #[test]
    fn test_title_with_percent_returned_verbatim() {
        let query = CannedQuery::new().with(
            Selector::WindowTitles,
            "Final Cut Pro\nSharing “Wedding” – 37%",
        );
        assert_eq!(
            probe().try_detect(&query).unwrap().as_deref(),
            Some("Sharing “Wedding” – 37%")
        );
        // Never descends when a title already matched
        assert_eq!(query.calls(), vec![Selector::WindowTitles]);
    }

    #[test]
    fn test_background_tasks_value() {
        let query = CannedQuery::new()
            .with(Selector::WindowTitles, "Final Cut Pro\nBackground Tasks")
            .with(tasks_window(), "Rendering 12%\tmissing value");
        assert_eq!(
            probe().try_detect(&query).unwrap().as_deref(),
            Some("Rendering 12%")
        );
    }

    #[test]
    fn test_background_tasks_description() {
        let query = CannedQuery::new()
            .with(Selector::WindowTitles, "Background Tasks")
            .with(
                tasks_window(),
                "Transcoding and Analysis\t\n0.5\tRendering: 50% complete",
            );
        assert_eq!(
            probe().try_detect(&query).unwrap().as_deref(),
            Some("Rendering: 50% complete")
        );
    }

    #[test]
    fn test_no_background_tasks_window() {
        let query = CannedQuery::new().with(Selector::WindowTitles, "Final Cut Pro");
        assert_eq!(probe().try_detect(&query).unwrap(), None);
        assert_eq!(query.calls(), vec![Selector::WindowTitles]);
    }

    #[test]
    fn test_vanished_window_is_no_candidate() {
        let query = CannedQuery::new()
            .with(Selector::WindowTitles, "Background Tasks")
            .failing(
                tasks_window(),
                QueryError::ElementMissing("window \"Background Tasks\"".to_string()),
            );
        assert_eq!(probe().try_detect(&query).unwrap(), None);
    }

    #[test]
    fn test_authorization_failure_propagates() {
        let query = CannedQuery::new().failing(
            Selector::WindowTitles,
            QueryError::NotAuthorized("(-1743)".to_string()),
        );
        assert!(probe().try_detect(&query).is_err());
    }
}

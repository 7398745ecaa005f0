use crate::automation::{parse_items, QueryError, Selector, UiQuery};

use super::{query_lenient, Probe, ProbeKind, ProbeResult};

/// Native progress indicator widgets, then menu item labels.
///
/// Indicator values are fractions in `[0, 1]`; scaling happens at
/// extraction.
pub struct IndicatorMenuProbe {
    /// Top-level menus scanned for a label containing `%`, in order
    menus: Vec<String>,
}

impl IndicatorMenuProbe {
    pub fn new(menus: Vec<String>) -> Self {
        Self { menus }
    }
}

impl Probe for IndicatorMenuProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::IndicatorMenu
    }

    fn try_detect(&self, query: &dyn UiQuery) -> Result<ProbeResult, QueryError> {
        if let Some(output) = query_lenient(query, &Selector::IndicatorValues)? {
            if let Some(value) = parse_items(&output).into_iter().next() {
                return Ok(Some(value));
            }
        }

        for menu in &self.menus {
            let selector = Selector::MenuItems { menu: menu.clone() };
            let Some(output) = query_lenient(query, &selector)? else {
                continue;
            };
            if let Some(label) = parse_items(&output).into_iter().find(|l| l.contains('%')) {
                return Ok(Some(label));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::CannedQuery;

    fn probe() -> IndicatorMenuProbe {
        IndicatorMenuProbe::new(vec!["Window".to_string(), "View".to_string()])
    }

    fn menu(name: &str) -> Selector {
        Selector::MenuItems {
            menu: name.to_string(),
        }
    }

    #[test]
    fn test_first_defined_indicator_value() {
        let query =
            CannedQuery::new().with(Selector::IndicatorValues, "missing value\n0.73\n0.10");
        assert_eq!(probe().try_detect(&query).unwrap().as_deref(), Some("0.73"));
    }

    #[test]
    fn test_menu_fallback_in_order() {
        let query = CannedQuery::new()
            .with(Selector::IndicatorValues, "")
            .with(menu("Window"), "Minimize\nZoom\nBackground Tasks (22%)")
            .with(menu("View"), "Playback 99%");
        assert_eq!(
            probe().try_detect(&query).unwrap().as_deref(),
            Some("Background Tasks (22%)")
        );
    }

    #[test]
    fn test_missing_menu_skipped() {
        let query = CannedQuery::new().with(menu("View"), "Show Render Progress 8%");
        assert_eq!(
            probe().try_detect(&query).unwrap().as_deref(),
            Some("Show Render Progress 8%")
        );
        assert_eq!(
            query.calls(),
            vec![Selector::IndicatorValues, menu("Window"), menu("View")]
        );
    }

    #[test]
    fn test_nothing_found() {
        let query = CannedQuery::new()
            .with(Selector::IndicatorValues, "missing value")
            .with(menu("Window"), "Minimize\nZoom")
            .with(menu("View"), "Zoom In");
        assert_eq!(probe().try_detect(&query).unwrap(), None);
    }
}

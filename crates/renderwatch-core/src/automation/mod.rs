mod osascript;

pub use osascript::OsascriptQuery;

use std::fmt;

use thiserror::Error;

/// A leaf query against the foreign application's UI tree.
///
/// Backends render each selector into whatever their automation layer
/// understands. Results come back as text, one item per line. Element
/// records are `value<TAB>description`. Undefined values are empty or the
/// literal `missing value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Titles of every top-level window of the target process
    WindowTitles,
    /// Every UI element under the named window, recursively
    WindowElements { window: String },
    /// Values of native progress indicator widgets across all windows
    IndicatorValues,
    /// Item labels of a top-level menu bar menu
    MenuItems { menu: String },
    /// Values of static text elements in every window and nested group
    StaticTexts,
    /// Values of elements with the given role in the primary window, recursively
    RoleValues { role: String },
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::WindowTitles => write!(f, "window titles"),
            Selector::WindowElements { window } => write!(f, "elements of window {:?}", window),
            Selector::IndicatorValues => write!(f, "progress indicator values"),
            Selector::MenuItems { menu } => write!(f, "items of menu {:?}", menu),
            Selector::StaticTexts => write!(f, "static text values"),
            Selector::RoleValues { role } => write!(f, "values of role {}", role),
        }
    }
}

/// Failure of a single UI tree query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The automation layer refused access (permission revoked or never granted)
    #[error("not authorized to query the UI tree: {0}")]
    NotAuthorized(String),

    /// The targeted window or element no longer exists
    #[error("element not found: {0}")]
    ElementMissing(String),

    /// The query did not finish within the configured timeout
    #[error("query timed out after {0}ms")]
    Timeout(u64),

    /// No automation backend on this platform
    #[error("UI automation unsupported: {0}")]
    Unsupported(String),

    /// Any other failure reported by the automation layer
    #[error("query failed: {0}")]
    Failed(String),
}

impl QueryError {
    /// Whether this failure means the UI tree cannot be queried at all.
    ///
    /// Only authorization failures are structural. Everything else is a
    /// per-element miss that the next cycle can recover from.
    pub fn is_structural(&self) -> bool {
        matches!(self, QueryError::NotAuthorized(_))
    }
}

/// Capability to query the foreign application's UI tree
pub trait UiQuery: Send + Sync {
    /// Run one selector and return its raw text output
    fn query(&self, selector: &Selector) -> Result<String, QueryError>;
}

impl<T: UiQuery + ?Sized> UiQuery for std::sync::Arc<T> {
    fn query(&self, selector: &Selector) -> Result<String, QueryError> {
        (**self).query(selector)
    }
}

/// A single element record from a [`Selector::WindowElements`] query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub value: Option<String>,
    pub description: Option<String>,
}

/// Split query output into its non-empty, defined items
pub fn parse_items(output: &str) -> Vec<String> {
    output.lines().filter_map(defined).collect()
}

/// Split query output into element records (`value<TAB>description`)
pub fn parse_elements(output: &str) -> Vec<ElementRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (value, description) = line.split_once('\t').unwrap_or((line, ""));
            ElementRecord {
                value: defined(value),
                description: defined(description),
            }
        })
        .collect()
}

/// Normalize one field, treating empty and `missing value` as undefined
fn defined(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed == "missing value" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

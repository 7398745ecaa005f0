use anyhow::{Context, Result};
use renderwatch_core::state::{MonitorState, Status};

/// Human-readable one-line summary of a state
pub fn format_status(state: &MonitorState) -> String {
    match state.status {
        Status::Rendering => {
            let mut line = format!("Rendering {}%", format_progress(state.progress));
            if let Some(eta) = &state.eta {
                line.push_str(&format!(" ({} left)", eta));
            }
            line
        }
        Status::Error => match &state.last_error {
            Some(error) => format!("Error: {}", error),
            None => "Error".to_string(),
        },
        status => status.to_string(),
    }
}

/// Whole percentages print without decimals, others with one
fn format_progress(progress: f64) -> String {
    if progress.fract() == 0.0 {
        format!("{:.0}", progress)
    } else {
        format!("{:.1}", progress)
    }
}

/// Prints committed states, skipping ones that look the same as the last.
///
/// Change is judged on the human-readable line, so a fresh `last_update`
/// alone never produces output.
#[derive(Debug, Default)]
pub struct StatusPrinter {
    json: bool,
    last: Option<String>,
}

impl StatusPrinter {
    pub fn new(json: bool) -> Self {
        Self { json, last: None }
    }

    /// The line to print for this state, if it differs from the last one
    pub fn render(&mut self, state: &MonitorState) -> Result<Option<String>> {
        let summary = format_status(state);
        if self.last.as_deref() == Some(summary.as_str()) {
            return Ok(None);
        }

        let line = if self.json {
            serde_json::to_string(state).context("Failed to serialize monitor state")?
        } else {
            summary.clone()
        };
        self.last = Some(summary);
        Ok(Some(line))
    }
}

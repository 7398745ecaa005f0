use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::trace;
use wait_timeout::ChildExt;

use super::{QueryError, Selector, UiQuery};

/// Shared AppleScript prelude: joins a list into linefeed-separated text
const JOIN_HANDLER: &str = r#"
on joinLines(theItems)
  set AppleScript's text item delimiters to linefeed
  set joined to theItems as text
  set AppleScript's text item delimiters to ""
  return joined
end joinLines
"#;

/// Recursive static text collector for windows and nested groups
const COLLECT_TEXTS_HANDLER: &str = r#"
on collectTexts(theContainer, out)
  tell application "System Events"
    try
      repeat with t in (static texts of theContainer)
        try
          set end of out to (value of t) as text
        end try
      end repeat
    end try
    try
      repeat with g in (groups of theContainer)
        my collectTexts(g, out)
      end repeat
    end try
  end tell
end collectTexts
"#;

/// UI tree queries through System Events, one `osascript` process per query
pub struct OsascriptQuery {
    /// System Events process name of the target application
    process_name: String,
    /// Per-query timeout
    timeout: Duration,
}

impl OsascriptQuery {
    /// Create a query backend for the named process
    pub fn new(process_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            process_name: process_name.into(),
            timeout,
        }
    }

    /// Build the script body and its extra arguments for a selector.
    ///
    /// Argument 1 is always the process name. User-controlled strings go
    /// through `argv`, never into the script text.
    fn script_for(&self, selector: &Selector) -> (String, Vec<String>) {
        let (body, extra) = match selector {
            Selector::WindowTitles => (
                r#"
      repeat with w in windows
        try
          set end of out to (name of w) as text
        end try
      end repeat"#
                    .to_string(),
                Vec::new(),
            ),
            Selector::WindowElements { window } => (
                r#"
      set winName to item 2 of argv
      repeat with e in (entire contents of window winName)
        set v to ""
        set d to ""
        try
          set v to (value of e) as text
        end try
        try
          set d to (description of e) as text
        end try
        set end of out to v & tab & d
      end repeat"#
                    .to_string(),
                vec![window.clone()],
            ),
            Selector::IndicatorValues => (
                r#"
      repeat with w in windows
        try
          repeat with p in (progress indicators of w)
            try
              set end of out to (value of p) as text
            end try
          end repeat
        end try
      end repeat"#
                    .to_string(),
                Vec::new(),
            ),
            Selector::MenuItems { menu } => (
                r#"
      set menuName to item 2 of argv
      repeat with m in (menu items of menu 1 of menu bar item menuName of menu bar 1)
        try
          set end of out to (name of m) as text
        end try
      end repeat"#
                    .to_string(),
                vec![menu.clone()],
            ),
            Selector::StaticTexts => (
                r#"
      repeat with w in windows
        my collectTexts(w, out)
      end repeat"#
                    .to_string(),
                Vec::new(),
            ),
            Selector::RoleValues { role } => (
                r#"
      set roleName to item 2 of argv
      repeat with e in (entire contents of window 1)
        try
          if (role of e) is roleName then
            set end of out to (value of e) as text
          end if
        end try
      end repeat"#
                    .to_string(),
                vec![role.clone()],
            ),
        };

        let script = format!(
            r#"{JOIN_HANDLER}{COLLECT_TEXTS_HANDLER}
on run argv
  set procName to item 1 of argv
  set out to {{}}
  tell application "System Events"
    tell process procName{body}
    end tell
  end tell
  return my joinLines(out)
end run
"#
        );

        let mut args = vec![self.process_name.clone()];
        args.extend(extra);
        (script, args)
    }

    /// Spawn osascript and collect its output within the timeout
    fn run(&self, script: &str, args: &[String]) -> Result<String, QueryError> {
        if !cfg!(target_os = "macos") {
            return Err(QueryError::Unsupported(
                "osascript requires macOS".to_string(),
            ));
        }

        let mut child = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .arg("--")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| QueryError::Failed(format!("failed to spawn osascript: {}", e)))?;

        // Drain pipes on their own threads so a large tree cannot block the child
        let stdout = drain(&mut child, Stream::Stdout);
        let stderr = drain(&mut child, Stream::Stderr);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(QueryError::Timeout(self.timeout.as_millis() as u64));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(QueryError::Failed(format!("failed to wait for osascript: {}", e)));
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if status.success() {
            Ok(stdout.trim_end().to_string())
        } else {
            Err(classify_failure(stderr.trim()))
        }
    }
}

impl UiQuery for OsascriptQuery {
    fn query(&self, selector: &Selector) -> Result<String, QueryError> {
        let (script, args) = self.script_for(selector);
        let result = self.run(&script, &args);
        trace!(%selector, ok = result.is_ok(), "osascript query");
        result
    }
}

enum Stream {
    Stdout,
    Stderr,
}

fn drain(child: &mut Child, stream: Stream) -> thread::JoinHandle<String> {
    let reader: Option<Box<dyn Read + Send>> = match stream {
        Stream::Stdout => child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
        Stream::Stderr => child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
    };

    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            let _ = reader.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Map osascript's stderr to a query error.
///
/// -1743: not authorized to send Apple events.
/// -25211: assistive access not granted.
/// -1728 / -1719: referenced object or index does not exist.
pub(crate) fn classify_failure(stderr: &str) -> QueryError {
    let lower = stderr.to_lowercase();
    if stderr.contains("-1743")
        || stderr.contains("-25211")
        || lower.contains("not allowed assistive access")
        || lower.contains("not authorized")
    {
        QueryError::NotAuthorized(stderr.to_string())
    } else if stderr.contains("-1728") || stderr.contains("-1719") {
        QueryError::ElementMissing(stderr.to_string())
    } else if stderr.is_empty() {
        QueryError::Failed("osascript exited with an error".to_string())
    } else {
        QueryError::Failed(stderr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OsascriptQuery {
        OsascriptQuery::new("Final Cut Pro", Duration::from_secs(5))
    }

    #[test]
    fn test_classify_authorization_failures() {
        let err = classify_failure(
            "execution error: Not authorized to send Apple events to System Events. (-1743)",
        );
        assert!(matches!(err, QueryError::NotAuthorized(_)));

        let err = classify_failure(
            "System Events got an error: osascript is not allowed assistive access. (-25211)",
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_classify_missing_element() {
        let err = classify_failure(
            "System Events got an error: Can’t get window \"Background Tasks\" of process \"Final Cut Pro\". (-1728)",
        );
        assert!(matches!(err, QueryError::ElementMissing(_)));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_classify_other() {
        assert!(matches!(classify_failure(""), QueryError::Failed(_)));
        assert!(matches!(
            classify_failure("syntax error"),
            QueryError::Failed(_)
        ));
    }

    #[test]
    fn test_script_passes_names_as_arguments() {
        let (script, args) = backend().script_for(&Selector::WindowElements {
            window: "Background \"Tasks\"".to_string(),
        });
        assert_eq!(
            args,
            vec![
                "Final Cut Pro".to_string(),
                "Background \"Tasks\"".to_string()
            ]
        );
        assert!(script.contains("entire contents of window winName"));
        assert!(!script.contains("Background"));
    }

    fn all_selectors() -> Vec<Selector> {
        vec![
            Selector::WindowTitles,
            Selector::WindowElements {
                window: "Background Tasks".to_string(),
            },
            Selector::IndicatorValues,
            Selector::StaticTexts,
            Selector::MenuItems {
                menu: "View".to_string(),
            },
            Selector::RoleValues {
                role: "AXProgressIndicator".to_string(),
            },
        ]
    }

    #[test]
    fn test_script_for_each_selector_has_run_handler() {
        for selector in &all_selectors() {
            let (script, args) = backend().script_for(selector);
            assert!(script.contains("on run argv"), "{}", selector);
            assert_eq!(args[0], "Final Cut Pro");
        }
    }

    #[test]
    fn test_handler_parameters_avoid_dictionary_terms() {
        // `items` and `container` are AppleScript/System Events terms and
        // break compilation or shadow the parameter
        for handler in [JOIN_HANDLER, COLLECT_TEXTS_HANDLER] {
            let signature = handler
                .lines()
                .find(|line| line.starts_with("on "))
                .unwrap();
            let open = signature.find('(').unwrap();
            let close = signature.find(')').unwrap();
            let params = &signature[open + 1..close];
            for param in params.split(',').map(str::trim) {
                assert!(
                    !["items", "container", "text", "window", "value"].contains(&param),
                    "reserved parameter name {:?} in {:?}",
                    param,
                    signature
                );
            }
        }
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_generated_scripts_compile() {
        for selector in &all_selectors() {
            let (script, _) = backend().script_for(selector);
            let out = tempfile::Builder::new().suffix(".scpt").tempfile().unwrap();
            let output = Command::new("osacompile")
                .arg("-o")
                .arg(out.path())
                .arg("-e")
                .arg(&script)
                .output()
                .unwrap();
            assert!(
                output.status.success(),
                "{} failed to compile: {}",
                selector,
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_unsupported_off_macos() {
        let err = backend().query(&Selector::WindowTitles).unwrap_err();
        assert!(matches!(err, QueryError::Unsupported(_)));
    }
}

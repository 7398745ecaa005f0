//! Liveness check for the watched application.

use parking_lot::Mutex;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use crate::config::TargetSettings;

/// Capability to tell whether the watched application is running
pub trait LivenessCheck: Send + Sync {
    fn is_running(&self) -> bool;
}

impl<T: LivenessCheck + ?Sized> LivenessCheck for std::sync::Arc<T> {
    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

/// One entry of a process listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEntry {
    pub name: String,
    /// Executable path, if readable
    pub exe: Option<String>,
    /// Bundle identifier, when the listing provides one
    pub bundle_id: Option<String>,
}

/// Decides whether a process entry is the watched application
#[derive(Debug, Clone)]
pub struct ProcessMatcher {
    display_names: Vec<String>,
    bundle_ids: Vec<String>,
}

impl ProcessMatcher {
    pub fn new(display_names: Vec<String>, bundle_ids: Vec<String>) -> Self {
        Self {
            display_names,
            bundle_ids,
        }
    }

    pub fn from_settings(target: &TargetSettings) -> Self {
        Self::new(target.display_names.clone(), target.bundle_ids.clone())
    }

    /// Match by bundle identifier, process name, or the `.app` bundle the
    /// executable lives in
    pub fn matches(&self, entry: &ProcessEntry) -> bool {
        if let Some(bundle_id) = &entry.bundle_id {
            if self.bundle_ids.iter().any(|id| id == bundle_id) {
                return true;
            }
        }

        if self.display_names.iter().any(|name| name == &entry.name) {
            return true;
        }

        // Covers localized or truncated process names
        if let Some(exe) = &entry.exe {
            return self
                .display_names
                .iter()
                .any(|name| exe.contains(&format!("/{}.app/", name)));
        }

        false
    }

    /// True if any entry of a listing matches
    pub fn any_running<'a>(&self, entries: impl IntoIterator<Item = &'a ProcessEntry>) -> bool {
        entries.into_iter().any(|entry| self.matches(entry))
    }
}

/// Liveness from a sysinfo process snapshot, refreshed on every call
pub struct SysinfoLiveness {
    system: Mutex<System>,
    matcher: ProcessMatcher,
}

impl SysinfoLiveness {
    pub fn new(matcher: ProcessMatcher) -> Self {
        Self {
            system: Mutex::new(System::new()),
            matcher,
        }
    }

    /// Snapshot of the current process listing
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(ProcessesToUpdate::All, refresh_kind());

        system
            .processes()
            .values()
            .map(|process| ProcessEntry {
                name: process.name().to_string_lossy().into_owned(),
                exe: process.exe().map(|p| p.to_string_lossy().into_owned()),
                bundle_id: None,
            })
            .collect()
    }
}

/// Names are always refreshed; the exe path is read once per process.
/// Nothing else is needed for matching.
fn refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::new().with_exe(UpdateKind::OnlyIfNotSet)
}

impl LivenessCheck for SysinfoLiveness {
    fn is_running(&self) -> bool {
        let entries = self.snapshot();
        self.matcher.any_running(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> ProcessMatcher {
        ProcessMatcher::from_settings(&TargetSettings::default())
    }

    fn entry(name: &str, exe: Option<&str>, bundle_id: Option<&str>) -> ProcessEntry {
        ProcessEntry {
            name: name.to_string(),
            exe: exe.map(str::to_string),
            bundle_id: bundle_id.map(str::to_string),
        }
    }

    #[test]
    fn test_match_by_display_name() {
        assert!(matcher().matches(&entry("Final Cut Pro", None, None)));
        assert!(!matcher().matches(&entry("Final Cut", None, None)));
    }

    #[test]
    fn test_match_by_bundle_id() {
        assert!(matcher().matches(&entry("FCP", None, Some("com.apple.FinalCut"))));
        assert!(!matcher().matches(&entry("Motion", None, Some("com.apple.motionapp"))));
    }

    #[test]
    fn test_match_by_app_bundle_path() {
        let e = entry(
            "Final Cut Pr",
            Some("/Applications/Final Cut Pro.app/Contents/MacOS/Final Cut Pro"),
            None,
        );
        assert!(matcher().matches(&e));

        let helper = entry(
            "Compressor",
            Some("/Applications/Compressor.app/Contents/MacOS/Compressor"),
            None,
        );
        assert!(!matcher().matches(&helper));
    }

    #[test]
    fn test_any_running() {
        let entries = vec![
            entry("launchd", None, None),
            entry("Final Cut Pro Trial", None, None),
        ];
        assert!(matcher().any_running(&entries));
        assert!(!matcher().any_running(&entries[..1]));
    }

    #[test]
    fn test_refresh_reads_only_exe_path() {
        let kind = refresh_kind();
        assert_eq!(kind.exe(), UpdateKind::OnlyIfNotSet);
        assert_eq!(kind.cmd(), UpdateKind::Never);
        assert_eq!(kind.environ(), UpdateKind::Never);
        assert!(!kind.cpu());
        assert!(!kind.memory());
        assert!(!kind.disk_usage());
    }

    #[test]
    fn test_sysinfo_liveness_does_not_find_missing_app() {
        let liveness = SysinfoLiveness::new(ProcessMatcher::new(
            vec!["renderwatch-test-no-such-process".to_string()],
            Vec::new(),
        ));
        assert!(!liveness.is_running());
    }
}

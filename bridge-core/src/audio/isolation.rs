//! Per-application isolation.
//!
//! When enabled, a periodic scan enumerates running process names on the
//! host and decides which configured app token ("primary" or "fallback")
//! is currently running, so capture can bind to whichever app produced it.
//! Platform enumeration follows the shape of a Toolhelp32-snapshot scan
//! (Windows) or a `/proc` walk (Linux); both just need process names.

use crate::config::IsolationConfig;

/// Enumerates the names of currently running processes.
pub trait ProcessEnumerator: Send + Sync {
    /// Returns lowercase process names (extension-stripped where applicable).
    fn running_process_names(&self) -> Vec<String>;
}

/// Resolves which configured app token is currently active, if any.
pub struct IsolationScanner {
    config: IsolationConfig,
    enumerator: Box<dyn ProcessEnumerator>,
}

impl IsolationScanner {
    /// Creates a scanner for `config` using `enumerator` to list processes.
    pub fn new(config: IsolationConfig, enumerator: Box<dyn ProcessEnumerator>) -> Self {
        Self { config, enumerator }
    }

    /// Returns `Some("primary")`, `Some("fallback")`, or `None` if neither
    /// configured app is currently running.
    #[must_use]
    pub fn active_target(&self) -> Option<&'static str> {
        if !self.config.enabled {
            return None;
        }
        let names = self.enumerator.running_process_names();
        let matches = |token: &Option<String>| {
            token.as_ref().is_some_and(|t| {
                let needle = t.to_ascii_lowercase();
                names.iter().any(|n| n.contains(&needle))
            })
        };
        if matches(&self.config.primary_app) {
            Some("primary")
        } else if matches(&self.config.fallback_app) {
            Some("fallback")
        } else {
            None
        }
    }

    /// Returns `true` if strict isolation is on and neither app is running,
    /// meaning the source should emit silence rather than ambient audio.
    #[must_use]
    pub fn should_force_silence(&self) -> bool {
        self.config.enabled && self.config.strict && self.active_target().is_none()
    }
}

#[cfg(target_os = "windows")]
pub use windows_impl::WindowsProcessEnumerator as NativeProcessEnumerator;

#[cfg(target_os = "windows")]
mod windows_impl {
    use super::ProcessEnumerator;
    use windows_sys::Win32::Foundation::{CloseHandle, INVALID_HANDLE_VALUE};
    use windows_sys::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };

    /// Enumerates processes via a Toolhelp32 snapshot.
    pub struct WindowsProcessEnumerator;

    impl ProcessEnumerator for WindowsProcessEnumerator {
        fn running_process_names(&self) -> Vec<String> {
            let mut names = Vec::new();
            unsafe {
                let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
                if snapshot == INVALID_HANDLE_VALUE {
                    return names;
                }

                let mut entry: PROCESSENTRY32W = std::mem::zeroed();
                entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as u32;

                if Process32FirstW(snapshot, &mut entry) != 0 {
                    loop {
                        let end = entry
                            .szExeFile
                            .iter()
                            .position(|&c| c == 0)
                            .unwrap_or(entry.szExeFile.len());
                        let name = String::from_utf16_lossy(&entry.szExeFile[..end]);
                        names.push(
                            name.strip_suffix(".exe")
                                .unwrap_or(&name)
                                .to_ascii_lowercase(),
                        );

                        if Process32NextW(snapshot, &mut entry) == 0 {
                            break;
                        }
                    }
                }

                CloseHandle(snapshot);
            }
            names
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux_impl::LinuxProcessEnumerator as NativeProcessEnumerator;

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::ProcessEnumerator;

    /// Enumerates processes by walking `/proc/<pid>/comm`.
    pub struct LinuxProcessEnumerator;

    impl ProcessEnumerator for LinuxProcessEnumerator {
        fn running_process_names(&self) -> Vec<String> {
            let mut names = Vec::new();
            let Ok(entries) = std::fs::read_dir("/proc") else {
                return names;
            };
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                let Some(pid_str) = file_name.to_str() else {
                    continue;
                };
                if pid_str.parse::<u32>().is_err() {
                    continue;
                }
                if let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) {
                    names.push(comm.trim().to_ascii_lowercase());
                }
            }
            names
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeEnumerator(Vec<String>);
    impl ProcessEnumerator for FakeEnumerator {
        fn running_process_names(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    fn config(primary: &str, fallback: Option<&str>, strict: bool) -> IsolationConfig {
        IsolationConfig {
            enabled: true,
            primary_app: Some(primary.into()),
            fallback_app: fallback.map(String::from),
            strict,
            scan_interval_ms: 1_000,
        }
    }

    #[test]
    fn disabled_isolation_never_reports_a_target() {
        let mut cfg = config("spotify", None, false);
        cfg.enabled = false;
        let scanner = IsolationScanner::new(cfg, Box::new(FakeEnumerator(vec!["spotify".into()])));
        assert_eq!(scanner.active_target(), None);
    }

    #[test]
    fn primary_app_running_is_detected() {
        let cfg = config("spotify", Some("chrome"), false);
        let scanner = IsolationScanner::new(
            cfg,
            Box::new(FakeEnumerator(vec!["spotify".into(), "explorer".into()])),
        );
        assert_eq!(scanner.active_target(), Some("primary"));
    }

    #[test]
    fn fallback_used_when_primary_absent() {
        let cfg = config("spotify", Some("chrome"), false);
        let scanner = IsolationScanner::new(cfg, Box::new(FakeEnumerator(vec!["chrome".into()])));
        assert_eq!(scanner.active_target(), Some("fallback"));
    }

    #[test]
    fn strict_mode_forces_silence_when_neither_running() {
        let cfg = config("spotify", Some("chrome"), true);
        let scanner = IsolationScanner::new(cfg, Box::new(FakeEnumerator(vec!["explorer".into()])));
        assert_eq!(scanner.active_target(), None);
        assert!(scanner.should_force_silence());
    }

    #[test]
    fn non_strict_mode_never_forces_silence() {
        let cfg = config("spotify", None, false);
        let scanner = IsolationScanner::new(cfg, Box::new(FakeEnumerator(vec![])));
        assert!(!scanner.should_force_silence());
    }
}

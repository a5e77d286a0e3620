//! Host platform queries.

/// Whether the current process runs with root privileges.
#[cfg(unix)]
pub fn is_elevated() -> bool {
  rustix::process::geteuid().is_root()
}

/// Whether the current process runs with root privileges.
#[cfg(not(unix))]
pub fn is_elevated() -> bool {
  false
}

/// Shell and flag used to run a capture script.
///
/// Capture scripts rely on `pipefail`, so this is bash rather than `/bin/sh`.
pub fn script_shell() -> (&'static str, &'static [&'static str]) {
  ("bash", &["-c"])
}

/// Shell used for the profile replace script, which is plain POSIX.
pub fn posix_shell() -> &'static str {
  "sh"
}

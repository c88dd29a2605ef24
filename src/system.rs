//! Identity of the running process.
//!
//! Lock files record who created them. These helpers provide the values
//! written into a lock file and the liveness checks used to tell a live
//! lock from one left behind by a crashed process.

use crate::error::{Error, Result};
use std::sync::LazyLock;

static USERNAME: LazyLock<String> = LazyLock::new(|| {
    let name = ["USERNAME", "USER"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| sanitize(&value))
        .find(|value| !value.is_empty())
        .unwrap_or_default();
    if name.is_empty() {
        log::warn!("Could not determine the system's username");
    }
    name
});

static FULL_USERNAME: LazyLock<String> = LazyLock::new(|| {
    let name = gecos_name().unwrap_or_default();
    if name.is_empty() {
        log::debug!("Full username unavailable, falling back to username");
        return USERNAME.clone();
    }
    name
});

static HOSTNAME: LazyLock<String> = LazyLock::new(|| match hostname::get() {
    Ok(name) => sanitize(&name.to_string_lossy()),
    Err(e) => {
        log::warn!("Could not determine the system's hostname: {}", e);
        String::new()
    }
});

static PROCESS_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|n| strip_deleted(&n.to_string_lossy())))
        .unwrap_or_default()
});

// Linux appends this marker to /proc/<pid>/exe once the binary is replaced.
fn strip_deleted(name: &str) -> String {
    name.strip_suffix(" (deleted)").unwrap_or(name).to_string()
}

fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r'], "").trim().to_string()
}

/// Login name of the current user.
pub fn username() -> &'static str {
    &USERNAME
}

/// Display name of the current user, or the login name if unknown.
pub fn full_username() -> &'static str {
    &FULL_USERNAME
}

pub fn hostname() -> &'static str {
    &HOSTNAME
}

pub fn pid() -> u32 {
    std::process::id()
}

/// File name of the running executable.
pub fn process_name() -> &'static str {
    &PROCESS_NAME
}

#[cfg(unix)]
fn gecos_name() -> Option<String> {
    let user = nix::unistd::User::from_uid(nix::unistd::getuid()).ok()??;
    let gecos = user.gecos.to_string_lossy();
    let name = gecos.split(',').next().map(sanitize)?;
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn gecos_name() -> Option<String> {
    None
}

/// Checks whether a process with the given pid exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| {
        Error::Other(anyhow::anyhow!("Process id {} is out of range", pid))
    })?;
    if raw <= 0 {
        return Ok(false);
    }

    match kill(Pid::from_raw(raw), None) {
        Ok(()) => Ok(true),
        // The process exists but belongs to someone else.
        Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(errno) => Err(Error::Other(anyhow::anyhow!(
            "Could not determine if process {} is running: {}",
            pid,
            errno
        ))),
    }
}

/// Without a portable liveness probe every recorded process counts as alive,
/// so locks are never classified as stale.
#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> Result<bool> {
    Ok(true)
}

/// Executable name of a running process, if it can be determined.
#[cfg(target_os = "linux")]
pub fn process_name_by_pid(pid: u32) -> Option<String> {
    let target = std::fs::read_link(format!("/proc/{}/exe", pid)).ok()?;
    Some(strip_deleted(&target.file_name()?.to_string_lossy()))
}

#[cfg(not(target_os = "linux"))]
pub fn process_name_by_pid(_pid: u32) -> Option<String> {
    None
}

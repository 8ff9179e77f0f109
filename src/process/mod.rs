use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::error::{Error, Result};

mod pid;
#[cfg(not(windows))]
use pid::parse_pidof;
#[cfg(windows)]
use pid::parse_tasklist;

/// Handle to the controlled process.
enum Bound {
    /// Launched by this controller.
    Spawned(Child),
    /// Found by name.
    Attached(u32),
}

impl Bound {
    fn pid(&self) -> u32 {
        match self {
            Bound::Spawned(child) => child.id(),
            Bound::Attached(pid) => *pid,
        }
    }

    /// Only an owned child can be checked directly. An attached pid may have
    /// exited or been reused, so it never counts as live and is re-resolved
    /// by name before use.
    fn is_live(&mut self) -> bool {
        match self {
            Bound::Spawned(child) => matches!(child.try_wait(), Ok(None)),
            Bound::Attached(_) => false,
        }
    }
}

/// Lifecycle control of a single named desktop process.
///
/// All operations serialize on one lock, so a `ping` followed by an
/// `attach` on the same instance observes a consistent view.
pub struct ProcessController {
    name: String,
    bound: Mutex<Option<Bound>>,
}

impl ProcessController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, Option<Bound>> {
        self.bound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) -> Result<u32> {
        let mut bound = self.lock();

        if find_pid(&self.name).is_ok() {
            return Err(Error::AlreadyRunning(self.name.clone()));
        }

        let mut command = Command::new(&self.name);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|source| Error::SpawnFailed {
            name: self.name.clone(),
            source,
        })?;

        let pid = child.id();
        info!(name = %self.name, pid, "spawned process");
        *bound = Some(Bound::Spawned(child));
        Ok(pid)
    }

    pub fn kill(&self) -> Result<u32> {
        let mut bound = self.lock();

        if !bound.as_mut().is_some_and(Bound::is_live) {
            self.bind(&mut bound).map_err(|e| Error::AttachFailed {
                name: self.name.clone(),
                source: Box::new(e),
            })?;
        }
        let Some(mut handle) = bound.take() else {
            return Err(Error::NotRunning {
                name: self.name.clone(),
                reason: "no process bound".to_string(),
            });
        };

        let pid = handle.pid();
        let result = match &mut handle {
            Bound::Spawned(child) => child
                .kill()
                .map(|_| {
                    // Reap the zombie.
                    let _ = child.wait();
                })
                .map_err(|e| Error::KillFailed {
                    pid,
                    reason: e.to_string(),
                }),
            Bound::Attached(pid) => terminate(*pid),
        };

        if let Err(e) = result {
            *bound = Some(handle);
            return Err(e);
        }

        info!(name = %self.name, pid, "killed process");
        Ok(pid)
    }

    /// Binds to the lowest pid currently running under the configured name.
    pub fn attach(&self) -> Result<u32> {
        let mut bound = self.lock();
        self.bind(&mut bound)
    }

    fn bind(&self, bound: &mut Option<Bound>) -> Result<u32> {
        let pid = find_pid(&self.name)?;
        debug!(name = %self.name, pid, "attached to process");
        *bound = Some(Bound::Attached(pid));
        Ok(pid)
    }

    /// Liveness probe. Leaves the bound handle untouched.
    pub fn ping(&self) -> Result<u32> {
        let _bound = self.lock();
        find_pid(&self.name)
    }

    #[cfg(test)]
    fn bound_pid(&self) -> Option<u32> {
        self.lock().as_ref().map(Bound::pid)
    }
}

#[cfg(not(windows))]
fn find_pid(name: &str) -> Result<u32> {
    let not_running = |reason: String| Error::NotRunning {
        name: name.to_string(),
        reason,
    };

    let output = Command::new("pidof")
        .arg(name)
        .output()
        .map_err(|e| not_running(format!("failed to run pidof: {e}")))?;

    if !output.status.success() {
        return Err(not_running("no matching process".to_string()));
    }

    parse_pidof(&String::from_utf8_lossy(&output.stdout)).map_err(not_running)
}

#[cfg(windows)]
fn find_pid(name: &str) -> Result<u32> {
    let not_running = |reason: String| Error::NotRunning {
        name: name.to_string(),
        reason,
    };

    let image = if name.ends_with(".exe") {
        name.to_string()
    } else {
        format!("{name}.exe")
    };

    let output = Command::new("tasklist.exe")
        .args(["/FI", &format!("IMAGENAME eq {image}"), "/FO", "CSV"])
        .output()
        .map_err(|e| not_running(format!("failed to run tasklist: {e}")))?;

    parse_tasklist(&String::from_utf8_lossy(&output.stdout)).map_err(not_running)
}

#[cfg(not(windows))]
fn terminate(pid: u32) -> Result<()> {
    let output = Command::new("kill")
        .args(["-KILL", &pid.to_string()])
        .output()
        .map_err(|e| Error::KillFailed {
            pid,
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::KillFailed {
            pid,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(windows)]
fn terminate(pid: u32) -> Result<()> {
    let output = Command::new("taskkill.exe")
        .args(["/PID", &pid.to_string(), "/F", "/T"])
        .output()
        .map_err(|e| Error::KillFailed {
            pid,
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::KillFailed {
            pid,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: &str = "sscc-test-no-such-process";

    #[test]
    fn test_ping_missing_process() {
        let controller = ProcessController::new(MISSING);
        assert!(matches!(controller.ping(), Err(Error::NotRunning { .. })));
        assert!(controller.bound_pid().is_none());
    }

    #[test]
    fn test_ping_and_attach_agree() {
        let controller = ProcessController::new(MISSING);
        assert_eq!(controller.ping().is_ok(), controller.attach().is_ok());
        assert!(controller.bound_pid().is_none());
    }

    #[test]
    fn test_kill_without_process_fails_to_attach() {
        let controller = ProcessController::new(MISSING);
        match controller.kill() {
            Err(Error::AttachFailed { name, source }) => {
                assert_eq!(name, MISSING);
                assert!(matches!(*source, Error::NotRunning { .. }));
            }
            other => panic!("expected AttachFailed, got {other:?}"),
        }
    }

    /// Copies of `sleep` under a name no other process uses.
    #[cfg(unix)]
    struct Sleepers {
        _dir: tempfile::TempDir,
        path: std::path::PathBuf,
        name: String,
        children: Vec<Child>,
    }

    #[cfg(unix)]
    impl Sleepers {
        fn new(tag: char) -> Self {
            // pidof matches on the 15-character comm name.
            let name = format!("ssccz{}{tag}", std::process::id() % 100_000);
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join(&name);
            std::fs::copy("/bin/sleep", &path).unwrap();
            Self {
                _dir: dir,
                path,
                name,
                children: Vec::new(),
            }
        }

        fn spawn(&mut self) -> u32 {
            let child = Command::new(&self.path).arg("60").spawn().unwrap();
            let pid = child.id();
            self.children.push(child);
            pid
        }

        fn reap_all(&mut self) {
            for mut child in self.children.drain(..) {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }

    #[cfg(unix)]
    impl Drop for Sleepers {
        fn drop(&mut self) {
            self.reap_all();
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_start_when_running() {
        let mut sleepers = Sleepers::new('a');
        sleepers.spawn();

        let controller = ProcessController::new(&sleepers.name);
        match controller.start() {
            Err(Error::AlreadyRunning(name)) => assert_eq!(name, sleepers.name),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
        assert!(controller.bound_pid().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_ping_and_attach_pick_lowest_pid() {
        let mut sleepers = Sleepers::new('b');
        let lowest = sleepers.spawn().min(sleepers.spawn());

        let controller = ProcessController::new(&sleepers.name);
        assert_eq!(controller.ping().unwrap(), lowest);
        assert!(controller.bound_pid().is_none());
        assert_eq!(controller.attach().unwrap(), lowest);
        assert_eq!(controller.bound_pid(), Some(lowest));
        assert_eq!(controller.attach().unwrap(), lowest);
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_attached_process() {
        let mut sleepers = Sleepers::new('c');
        let pid = sleepers.spawn();

        let controller = ProcessController::new(&sleepers.name);
        assert_eq!(controller.attach().unwrap(), pid);
        assert_eq!(controller.kill().unwrap(), pid);
        assert!(controller.bound_pid().is_none());

        let status = sleepers.children[0].wait().unwrap();
        assert!(!status.success());
        sleepers.reap_all();
        assert!(matches!(controller.ping(), Err(Error::NotRunning { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_after_attached_process_exited() {
        let mut sleepers = Sleepers::new('d');
        let pid = sleepers.spawn();

        let controller = ProcessController::new(&sleepers.name);
        assert_eq!(controller.attach().unwrap(), pid);

        sleepers.reap_all();
        assert!(controller.ping().is_err());

        match controller.kill() {
            Err(Error::AttachFailed { name, source }) => {
                assert_eq!(name, sleepers.name);
                assert!(matches!(*source, Error::NotRunning { .. }));
            }
            other => panic!("expected AttachFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_start_missing_executable() {
        let controller = ProcessController::new(MISSING);
        assert!(matches!(
            controller.start(),
            Err(Error::SpawnFailed { .. })
        ));
        assert!(controller.bound_pid().is_none());
    }
}

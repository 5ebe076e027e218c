//! Process liveness probing

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Returns true if the process is still alive.
///
/// Uses the null-signal probe: success means the process exists, and
/// `EPERM` means it exists but belongs to someone else, which still
/// counts as alive. Any other error means it is gone.
pub fn exists(pid: i32) -> bool {
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_exists() {
        assert!(exists(std::process::id() as i32));
    }

    #[test]
    fn init_exists() {
        // pid 1 always exists; from an unprivileged test it answers EPERM,
        // which must still count as alive.
        assert!(exists(1));
    }

    #[test]
    fn absurd_pid_does_not_exist() {
        assert!(!exists(i32::MAX));
    }
}

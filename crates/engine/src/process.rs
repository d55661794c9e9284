//! Process duplication, waiting, and abrupt termination

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use rew_core::{Result, RewError, StatusByte};
use std::io::{self, Write};

/// Which side of a duplication the caller ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Split {
    /// Original generation, holding the descendant's pid
    Parent(Pid),
    /// Freshly duplicated descendant
    Child,
}

/// Duplicate the calling generation
pub(crate) fn split(flush_stdio: bool) -> Result<Split> {
    if flush_stdio {
        flush_std_streams();
    }

    // SAFETY: the descendant keeps running ordinary Rust code, which is only
    // sound when no other thread holds a lock (allocator, stdio) at this
    // instant. The engine is documented as single-threaded for that reason.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => Ok(Split::Parent(child)),
        Ok(ForkResult::Child) => Ok(Split::Child),
        Err(errno) => Err(RewError::Fork(errno.into())),
    }
}

/// Block until `child` terminates and return the byte it reported
///
/// Waits for this specific pid so subprocesses spawned by user code are never
/// reaped here.
pub(crate) fn await_generation(child: Pid) -> Result<StatusByte> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return StatusByte::from_exit_code(code),
            Ok(WaitStatus::Signaled(pid, signal, _)) => {
                return Err(RewError::GenerationKilled {
                    pid: pid.as_raw(),
                    signal: signal.as_str().to_string(),
                })
            }
            // Stop/continue notifications are not terminations
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                return Err(RewError::Wait {
                    pid: child.as_raw(),
                    source: errno.into(),
                })
            }
        }
    }
}

/// Terminate the calling generation immediately with `status`
///
/// Skips destructors, unwinding and `atexit` handlers.
pub(crate) fn terminate(status: StatusByte, flush_stdio: bool) -> ! {
    if flush_stdio {
        flush_std_streams();
    }
    // SAFETY: _exit(2) ends the process without any user-space teardown
    unsafe { libc::_exit(status.exit_code()) }
}

fn flush_std_streams() {
    // Nothing useful to do with a failed flush here
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

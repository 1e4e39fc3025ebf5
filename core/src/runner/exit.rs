use std::process::ExitStatus;

/// Exit code reported for runs killed after exceeding their time budget.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Maps a child's status to a single code. A child killed by a signal on
/// unix reports `128 + signal`, like a shell does.
pub fn normalize_exit(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

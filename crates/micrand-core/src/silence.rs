//! Scoped suppression of native audio diagnostics.
//!
//! ALSA and friends write warnings straight to file descriptor 2 while
//! devices are enumerated or opened, which would pollute the service log on
//! every probe. The guard redirects stderr to `/dev/null` for its lifetime
//! and restores it unconditionally on drop, including the probe-failure
//! exit paths. Note that our own logging is muted for the same window, so
//! keep the scope tight.

/// RAII guard that silences stderr at the file-descriptor level.
///
/// No-op on non-Unix platforms and whenever the redirection itself fails.
pub struct StderrSilencer {
    #[cfg(unix)]
    saved: Option<libc::c_int>,
}

#[cfg(unix)]
impl StderrSilencer {
    /// Redirect stderr to `/dev/null` until the guard is dropped.
    pub fn activate() -> Self {
        // SAFETY: duplicates and swaps this process's own descriptors with
        // well-formed arguments; every acquired fd is closed on all paths.
        unsafe {
            let saved = libc::dup(libc::STDERR_FILENO);
            if saved < 0 {
                return Self { saved: None };
            }
            let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
            if devnull < 0 {
                libc::close(saved);
                return Self { saved: None };
            }
            if libc::dup2(devnull, libc::STDERR_FILENO) < 0 {
                libc::close(devnull);
                libc::close(saved);
                return Self { saved: None };
            }
            libc::close(devnull);
            Self { saved: Some(saved) }
        }
    }
}

#[cfg(unix)]
impl Drop for StderrSilencer {
    fn drop(&mut self) {
        if let Some(fd) = self.saved.take() {
            // SAFETY: restores the descriptor saved in activate() and closes
            // the duplicate. Runs on every exit path.
            unsafe {
                libc::dup2(fd, libc::STDERR_FILENO);
                libc::close(fd);
            }
        }
    }
}

#[cfg(not(unix))]
impl StderrSilencer {
    /// No diagnostic stream to redirect on this platform.
    pub fn activate() -> Self {
        Self {}
    }
}

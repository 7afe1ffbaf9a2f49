use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::debug;

/// Advisory write lock on a board directory.
///
/// Every `pb` command that changes `board.json` or `board.toml` holds it for
/// the duration of its load-modify-save cycle. The lock file names the
/// holder (`<pid> pb <command>`) so a waiting command can report it.
pub struct BoardLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("board is busy: {holder} holds {path}")]
    Timeout { path: PathBuf, holder: String },
}

impl BoardLock {
    /// Lock `board_dir` for `command`, waiting up to `timeout` for another
    /// holder.
    pub fn acquire(board_dir: &Path, command: &str, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = board_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    let mut file = file;
                    // the holder line is informational; the flock is the lock
                    let _ = file
                        .set_len(0)
                        .and_then(|_| writeln!(file, "{} pb {}", std::process::id(), command));
                    debug!(
                        "event=lock_acquired path={} command={}",
                        lock_path.display(),
                        command
                    );
                    return Ok(BoardLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    let holder = read_holder(&lock_path);
                    debug!("event=lock_timeout path={} holder=\"{}\"", lock_path.display(), holder);
                    return Err(LockError::Timeout {
                        path: lock_path,
                        holder,
                    });
                }
            }
        }
    }

    pub fn acquire_default(board_dir: &Path, command: &str) -> Result<Self, LockError> {
        Self::acquire(board_dir, command, Duration::from_secs(5))
    }
}

/// Holder line of a lock file, e.g. `4242 pb drop`
fn read_holder(lock_path: &Path) -> String {
    fs::read_to_string(lock_path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "another pb command".to_string())
}

impl Drop for BoardLock {
    fn drop(&mut self) {
        // flock is released with the file handle
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How long a session's thread mapping stays usable. Matches the assistant's
/// own session-staleness window.
const THREAD_TTL_HOURS: i64 = 24;

/// One session's notification destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadEntry {
    /// Slack thread timestamp the session's first notification started.
    pub thread_ts: String,
    pub updated_at: DateTime<Utc>,
}

/// File-backed map from session id to the chat thread its notifications
/// land in. Consulted only by the notification sink; the approval core
/// never reads it.
pub struct SessionThreadStore {
    path: PathBuf,
}

impl SessionThreadStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under `~/.gatehook/sessions/threads.json`.
    pub fn default_store() -> Self {
        Self::new(crate::config::sessions_dir().join("threads.json"))
    }

    /// Thread for `session_id`, if one was recorded within the TTL.
    pub fn thread_for(&self, session_id: &str) -> Result<Option<String>> {
        let entries = read_thread_file(&self.path)?;
        Ok(entries.get(session_id).and_then(|entry| {
            let age = Utc::now() - entry.updated_at;
            if age > Duration::hours(THREAD_TTL_HOURS) {
                None
            } else {
                Some(entry.thread_ts.clone())
            }
        }))
    }

    /// Record (or refresh) the thread for a session.
    pub fn record_thread(&self, session_id: &str, thread_ts: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Advisory lock against concurrent read-modify-write from a second
        // serve process.
        let _lock = FileLock::acquire(&self.path)?;

        let mut entries = read_thread_file(&self.path)?;
        entries.insert(
            session_id.to_string(),
            ThreadEntry {
                thread_ts: thread_ts.to_string(),
                updated_at: Utc::now(),
            },
        );
        write_thread_file(&self.path, &entries)
    }

    /// Drop entries older than the TTL. Returns how many were removed.
    pub fn cleanup_stale(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let _lock = FileLock::acquire(&self.path)?;

        let mut entries = read_thread_file(&self.path)?;
        let before = entries.len();
        let cutoff = Utc::now() - Duration::hours(THREAD_TTL_HOURS);
        entries.retain(|_, entry| entry.updated_at >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            write_thread_file(&self.path, &entries)?;
        }
        Ok(removed)
    }
}

fn read_thread_file(path: &Path) -> Result<HashMap<String, ThreadEntry>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let entries: HashMap<String, ThreadEntry> = serde_json::from_str(&contents)?;
    Ok(entries)
}

fn write_thread_file(path: &Path, entries: &HashMap<String, ThreadEntry>) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }
    set_file_permissions_0600(&tmp_path);
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Set file permissions to 0600 (owner read/write only).
#[cfg(unix)]
fn set_file_permissions_0600(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o600);
    let _ = fs::set_permissions(path, perms);
}

#[cfg(not(unix))]
fn set_file_permissions_0600(_path: &Path) {
    // No-op on non-Unix platforms
}

/// Advisory file lock using flock(2) on a .lock file.
struct FileLock {
    _file: fs::File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        flock_exclusive(&file)?;
        Ok(Self { _file: file })
    }
}

// When FileLock is dropped, the file is closed and the lock is released.

#[cfg(unix)]
fn flock_exclusive(file: &fs::File) -> Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX) };
    if ret != 0 {
        return Err(crate::error::GatehookError::Io(
            std::io::Error::last_os_error(),
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &fs::File) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_and_lookup() {
        let tmp = TempDir::new().unwrap();
        let store = SessionThreadStore::new(tmp.path().join("threads.json"));

        store.record_thread("session-1", "1700000000.000100").unwrap();
        assert_eq!(
            store.thread_for("session-1").unwrap().as_deref(),
            Some("1700000000.000100")
        );
        assert!(store.thread_for("session-2").unwrap().is_none());
    }

    #[test]
    fn stale_entries_expire() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("threads.json");
        let store = SessionThreadStore::new(path.clone());

        // Write an entry dated two days ago directly.
        let mut entries = HashMap::new();
        entries.insert(
            "old-session".to_string(),
            ThreadEntry {
                thread_ts: "1690000000.000001".into(),
                updated_at: Utc::now() - Duration::hours(48),
            },
        );
        write_thread_file(&path, &entries).unwrap();

        assert!(store.thread_for("old-session").unwrap().is_none());
        assert_eq!(store.cleanup_stale().unwrap(), 1);
        assert!(read_thread_file(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SessionThreadStore::new(tmp.path().join("absent.json"));
        assert!(store.thread_for("whatever").unwrap().is_none());
        assert_eq!(store.cleanup_stale().unwrap(), 0);
    }
}

//! File-backed session store.
//!
//! The session is persisted as one JSON document holding both the token and
//! the principal, so a restart restores exactly what was stored. Writes go
//! through a temporary file and a rename; a crash leaves either the old
//! document or the new one, never a token without its principal.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::{debug, warn};

use crate::domain::Session;
use crate::domain::ports::{SessionStore, SessionStoreError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Session store persisted to a single JSON file.
pub struct FileSessionStore {
    dir: Dir,
    file_name: String,
    path: PathBuf,
    writes: Mutex<()>,
}

impl FileSessionStore {
    /// Open (creating parent directories as needed) the store at `path`.
    ///
    /// The file itself is not created until a session is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Write`] when the path has no file name or
    /// the parent directory cannot be created or opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionStoreError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                SessionStoreError::write(format!("{} does not name a file", path.display()))
            })?
            .to_owned();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(|error| {
            SessionStoreError::write(format!("create {}: {error}", parent.display()))
        })?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
            SessionStoreError::write(format!("open {}: {error}", parent.display()))
        })?;
        Ok(Self {
            dir,
            file_name,
            path: path.to_path_buf(),
            writes: Mutex::new(()),
        })
    }

    /// Location of the session document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        let contents = serde_json::to_string_pretty(session)
            .map_err(|error| SessionStoreError::write(error.to_string()))?;
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        write_atomic(&self.dir, &self.file_name, &contents)
            .map_err(|error| SessionStoreError::write(format!("{}: {error}", self.path.display())))?;
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    fn get_session(&self) -> Option<Session> {
        let contents = match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "unreadable session file; treating as signed out");
                return None;
            }
        };
        serde_json::from_str(&contents)
            .inspect_err(|error| {
                warn!(path = %self.path.display(), %error, "malformed session file; treating as signed out");
            })
            .ok()
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(SessionStoreError::clear(format!(
                "{}: {error}",
                self.path.display()
            ))),
        }
    }
}

/// Write `contents` to `file_name` in `dir` via a sibling temp file.
fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(".{file_name}.tmp.{}.{nanos}.{counter}", std::process::id());

    if let Err(error) = write_new_file(dir, &tmp_name, contents) {
        discard(dir, &tmp_name);
        return Err(error);
    }
    if let Err(error) = replace(dir, &tmp_name, file_name) {
        discard(dir, &tmp_name);
        return Err(error);
    }
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        debug!("directory sync unsupported; rename already visible");
    }
    Ok(())
}

fn write_new_file(dir: &Dir, name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(name, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(windows)]
fn replace(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    match dir.remove_file(target) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    dir.rename(tmp_name, dir, target)
}

#[cfg(not(windows))]
fn replace(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target)
}

fn discard(dir: &Dir, name: &str) {
    if let Err(error) = dir.remove_file(name) {
        debug!(%error, "temporary session file already gone");
    }
}

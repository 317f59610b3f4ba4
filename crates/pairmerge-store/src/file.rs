use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pairmerge_protocol::MessageCodec;
use pairmerge_types::{Message, PersistedState, WorkerId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{MailboxTransport, OutputSink, StateStore};

/// Replace `path` with `bytes` in one rename.
///
/// Readers see either the old content or the new content, never a torn
/// write.
fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn ensure_dir(dir: &Path) -> StoreResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(StoreError::DirectoryNotFound(dir.to_path_buf()))
    }
}

/// Mailbox slots as files: `<dir>/<slot>.msg`.
///
/// A missing file is an empty slot. Messages are framed with
/// [`MessageCodec`].
#[derive(Debug, Clone)]
pub struct FileMailbox {
    dir: PathBuf,
}

impl FileMailbox {
    /// Open a mailbox directory. The directory must exist.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the file backing `slot`.
    pub fn slot_path(&self, slot: &str) -> StoreResult<PathBuf> {
        if slot.is_empty() || slot.contains(['/', '\\']) || slot == "." || slot == ".." {
            return Err(StoreError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{slot}.msg")))
    }
}

impl MailboxTransport for FileMailbox {
    fn write(&self, slot: &str, message: &Message) -> StoreResult<()> {
        let path = self.slot_path(slot)?;
        let bytes = MessageCodec::encode(message)?;
        write_atomic(&path, &bytes)?;
        debug!(slot, tag = %message.tag, len = message.checkpoints.len(), "slot written");
        Ok(())
    }

    fn read(&self, slot: &str) -> StoreResult<Option<Message>> {
        let path = self.slot_path(slot)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        fs::remove_file(&path)?;
        let message =
            MessageCodec::decode(&bytes).map_err(|source| StoreError::CorruptMessage {
                slot: slot.to_string(),
                source,
            })?;
        debug!(slot, tag = %message.tag, len = message.checkpoints.len(), "slot consumed");
        Ok(Some(message))
    }

    fn clear(&self, slot: &str) -> StoreResult<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Append-only output file.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Create (or truncate) the output file for a fresh job.
    pub fn create(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        File::create(&path)?;
        Self::open(path)
    }

    /// Open the output file for appending, creating it if missing. Existing
    /// content is kept, which is what a resumed job needs.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back everything written so far.
    pub fn contents(&self) -> StoreResult<String> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

impl OutputSink for FileSink {
    fn append(&self, bytes: &[u8]) -> StoreResult<()> {
        let mut file = self.file.lock().expect("sink mutex poisoned");
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink").field("path", &self.path).finish()
    }
}

/// One JSON document per worker: `<dir>/state_<id>.json`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Open a state directory. The directory must exist.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn state_path(&self, worker: WorkerId) -> PathBuf {
        self.dir.join(format!("state_{}.json", worker.as_key()))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, worker: WorkerId) -> StoreResult<Option<PersistedState>> {
        let path = self.state_path(worker);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state = serde_json::from_str(&text).map_err(|e| StoreError::CorruptState {
            worker,
            reason: e.to_string(),
        })?;
        Ok(Some(state))
    }

    fn save(&self, worker: WorkerId, state: &PersistedState) -> StoreResult<()> {
        let json = serde_json::to_vec(state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.state_path(worker), &json)
    }

    fn clear(&self, worker: WorkerId) -> StoreResult<()> {
        match fs::remove_file(self.state_path(worker)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

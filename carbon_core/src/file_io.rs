//! # File I/O Module
//!
//! Handles ledger file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Serialize writers sharing one ledger file (OS lock, plus a
//!   `.lock` file saying who holds it)
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Ledgers are saved as JSON. Lock files add a `.lock` extension and carry
//! metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use carbon_core::calculator::calculate;
//! use carbon_core::file_io::{load_or_create_ledger, save_ledger, LedgerLock};
//! use std::path::Path;
//!
//! let path = Path::new("ledger.json");
//!
//! // Hold the lock across the read-modify-write
//! let lock = LedgerLock::acquire(path, "ana@example.com")?;
//! let mut ledger = load_or_create_ledger(path)?;
//! ledger.insert("ana@example.com", calculate("water", 12.0, "m3", None, "direct"));
//! save_ledger(&ledger, path)?;
//!
//! // Lock is released when dropped
//! drop(lock);
//! # Ok::<(), carbon_core::errors::CarbonError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CarbonError, CarbonResult};
use crate::ledger::{EmissionLedger, SCHEMA_VERSION};

/// Lock file metadata stored in `.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

/// Get the hostname of the current machine
fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Ledger lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level advisory locking (via fs2), which decides who may write
/// 2. A `.lock` file with metadata so other users can see who holds it
///
/// The OS lock dies with its process, so a `.lock` file left behind by a
/// killed writer never blocks the next one.
#[derive(Debug)]
pub struct LedgerLock {
    ledger_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl LedgerLock {
    /// Acquire an exclusive lock on a ledger file.
    ///
    /// # Returns
    ///
    /// * `Ok(LedgerLock)` - Lock acquired successfully
    /// * `Err(CarbonError::FileLocked)` - Another process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CarbonResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        ensure_parent_dir(path)?;

        // No truncate: the holder's metadata must survive a failed attempt.
        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                CarbonError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        // Non-blocking: fail fast instead of queueing behind another writer
        if lock_file.try_lock_exclusive().is_err() {
            return Err(match read_lock_info(&lock_path) {
                Ok(holder) => CarbonError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", holder.user_id, holder.machine),
                    holder.locked_at.to_rfc3339(),
                ),
                Err(_) => CarbonError::file_locked(path.display().to_string(), "another process", "unknown"),
            });
        }

        // We hold the OS lock, so whatever metadata is there is left over.
        if let Ok(previous) = read_lock_info(&lock_path) {
            warn!(
                path = %path.display(),
                holder = %previous.user_id,
                pid = previous.pid,
                "replacing stale ledger lock file"
            );
        }

        let lock_json = serde_json::to_string_pretty(&info)?;

        overwrite(&mut lock_file, lock_json.as_bytes()).map_err(|e| {
            CarbonError::file_error("write lock", lock_path.display().to_string(), e.to_string())
        })?;

        lock_file.sync_all().map_err(|e| {
            CarbonError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        debug!(path = %path.display(), user = %info.user_id, "acquired ledger lock");

        Ok(LedgerLock {
            ledger_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a ledger is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if another handle holds the OS lock, `None`
    /// if the ledger is free (even when a leftover `.lock` file exists).
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        let handle = OpenOptions::new().read(true).write(true).open(&lock_path).ok()?;
        if handle.try_lock_exclusive().is_ok() {
            let _ = handle.unlock();
            return None;
        }
        read_lock_info(&lock_path).ok()
    }

    /// Path to the locked ledger file
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        // OS lock goes with _lock_file
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Get the lock file path for a ledger file
fn lock_path_for(ledger_path: &Path) -> PathBuf {
    let mut lock_path = ledger_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

/// Get the temp file path used during atomic saves
fn tmp_path_for(ledger_path: &Path) -> PathBuf {
    let mut tmp_path = ledger_path.to_path_buf();
    let extension = tmp_path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp_path.set_extension(extension);
    tmp_path
}

fn ensure_parent_dir(path: &Path) -> CarbonResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CarbonError::file_error("create directory", parent.display().to_string(), e.to_string())
        })?;
    }
    Ok(())
}

fn overwrite(file: &mut File, contents: &[u8]) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(contents)
}

fn read_lock_info(lock_path: &Path) -> CarbonResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    Ok(serde_json::from_str(&contents)?)
}

fn read_to_string(path: &Path, operation: &str) -> CarbonResult<String> {
    let mut file = File::open(path)
        .map_err(|e| CarbonError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CarbonError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Save a ledger with atomic write semantics.
///
/// 1. Serialize to JSON
/// 2. Write to a temporary file next to the target
/// 3. Sync to disk
/// 4. Rename over the target (atomic on most filesystems)
pub fn save_ledger(ledger: &EmissionLedger, path: &Path) -> CarbonResult<()> {
    let json = serde_json::to_string_pretty(ledger)?;

    ensure_parent_dir(path)?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CarbonError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CarbonError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CarbonError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CarbonError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), records = ledger.len(), "saved ledger");
    Ok(())
}

/// Load a ledger from a file.
///
/// # Returns
///
/// * `Ok(EmissionLedger)` - Successfully loaded ledger
/// * `Err(CarbonError::VersionMismatch)` - File version is incompatible
/// * `Err(CarbonError::SerializationError)` - Invalid JSON
/// * `Err(CarbonError::FileError)` - I/O error
pub fn load_ledger(path: &Path) -> CarbonResult<EmissionLedger> {
    let contents = read_to_string(path, "read")?;

    let ledger: EmissionLedger = serde_json::from_str(&contents).map_err(|e| {
        CarbonError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    validate_version(&ledger.meta.version)?;

    info!(path = %path.display(), records = ledger.len(), "loaded ledger");
    Ok(ledger)
}

/// Load a ledger, or start an empty one if the file does not exist yet.
pub fn load_or_create_ledger(path: &Path) -> CarbonResult<EmissionLedger> {
    if path.exists() {
        load_ledger(path)
    } else {
        debug!(path = %path.display(), "no ledger file, starting empty");
        Ok(EmissionLedger::new())
    }
}

/// Validate that a file version is compatible with the current schema.
///
/// Major versions must match; while the schema is 0.x the file's minor
/// version must not be newer than ours.
fn validate_version(file_version: &str) -> CarbonResult<()> {
    let mismatch = || CarbonError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(SCHEMA_VERSION).map_err(|e| CarbonError::Internal {
        message: format!("bad schema version constant: {e}"),
    })?;

    if file.major != current.major {
        return Err(mismatch());
    }

    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::calculate;
    use tempfile::TempDir;

    fn temp_ledger_path(dir: &TempDir) -> PathBuf {
        dir.path().join("ledger.json")
    }

    #[test]
    fn test_lock_path_generation() {
        let ledger_path = Path::new("/path/to/ledger.json");
        assert_eq!(lock_path_for(ledger_path), Path::new("/path/to/ledger.json.lock"));
        assert_eq!(tmp_path_for(ledger_path), Path::new("/path/to/ledger.json.tmp"));
        assert_eq!(lock_path_for(Path::new("/path/ledger")), Path::new("/path/ledger.lock"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("test@example.com");
        assert_eq!(info.user_id, "test@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);

        let mut ledger = EmissionLedger::new();
        ledger.insert("u1", calculate("materials", 2.0, "ton", Some("steel"), "direct"));
        ledger.insert("u2", calculate("water", 3.0, "m3", None, "other"));
        save_ledger(&ledger, &path).unwrap();

        let loaded = load_ledger(&path).unwrap();
        assert_eq!(loaded.next_id, 3);
        assert_eq!(loaded.records, ledger.records);
        assert_eq!(loaded.for_user("u1")[0].result.emissions_kg, 4600.0);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);

        save_ledger(&EmissionLedger::new(), &path).unwrap();

        assert!(!tmp_path_for(&path).exists());
        assert!(path.exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("ledger.json");

        save_ledger(&EmissionLedger::new(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_or_create_missing_file() {
        let dir = TempDir::new().unwrap();
        let ledger = load_or_create_ledger(&temp_ledger_path(&dir)).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.next_id, 1);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);
        fs::write(&path, "{ not json").unwrap();

        let err = load_ledger(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_missing_file_is_file_error() {
        let dir = TempDir::new().unwrap();
        let err = load_ledger(&temp_ledger_path(&dir)).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);

        let lock = LedgerLock::acquire(&path, "test@example.com").unwrap();
        assert_eq!(lock.info.user_id, "test@example.com");
        assert_eq!(lock.ledger_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());
    }

    fn write_lock_file(path: &Path, info: &LockInfo) {
        fs::write(lock_path_for(path), serde_json::to_string(info).unwrap()).unwrap();
    }

    #[test]
    fn test_old_lock_file_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);

        write_lock_file(
            &path,
            &LockInfo {
                user_id: "old@example.com".to_string(),
                machine: "elsewhere".to_string(),
                pid: 1,
                locked_at: Utc::now() - chrono::Duration::hours(25),
            },
        );
        assert!(LedgerLock::check(&path).is_none());

        let lock = LedgerLock::acquire(&path, "new@example.com").unwrap();
        assert_eq!(lock.info.user_id, "new@example.com");
    }

    #[test]
    fn test_fresh_lock_file_of_dead_process_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);

        // Left behind by a writer killed before Drop ran: recent timestamp,
        // unknown machine, no OS lock held.
        write_lock_file(
            &path,
            &LockInfo {
                user_id: "ana".to_string(),
                machine: "unknown".to_string(),
                pid: 999_999,
                locked_at: Utc::now(),
            },
        );
        assert!(LedgerLock::check(&path).is_none());

        let lock = LedgerLock::acquire(&path, "bruno").unwrap();
        let on_disk = read_lock_info(&lock_path_for(&path)).unwrap();
        assert_eq!(on_disk.user_id, "bruno");
        assert_eq!(on_disk.pid, std::process::id());
        drop(lock);
    }

    #[cfg(unix)]
    #[test]
    fn test_held_lock_blocks_and_keeps_holder_info() {
        let dir = TempDir::new().unwrap();
        let path = temp_ledger_path(&dir);

        let held = LedgerLock::acquire(&path, "ana").unwrap();

        let err = LedgerLock::acquire(&path, "bruno").unwrap_err();
        match &err {
            CarbonError::FileLocked { locked_by, .. } => assert!(locked_by.starts_with("ana ("), "{locked_by}"),
            other => panic!("expected FileLocked, got {other:?}"),
        }
        assert!(err.is_recoverable());

        // The failed attempt left the holder's metadata intact
        assert_eq!(LedgerLock::check(&path).map(|info| info.user_id), Some("ana".to_string()));

        drop(held);
        assert!(LedgerLock::check(&path).is_none());
        assert!(LedgerLock::acquire(&path, "bruno").is_ok());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());

        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}

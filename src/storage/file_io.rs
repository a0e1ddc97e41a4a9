//! File I/O utilities with atomic writes
//!
//! Key files are written to a temp file in the same directory, synced and
//! renamed into place, so a crash never leaves half a key behind. Every key
//! file write is owner read/write only.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use zeroize::Zeroizing;

use crate::error::{KeyFileError, KeyFileResult};

/// Permission bits for key files (owner read/write only)
pub const KEY_FILE_MODE: u32 = 0o600;

/// Read a key file's raw contents
///
/// A missing file is an I/O error, not an empty key.
pub fn read_key_file<P: AsRef<Path>>(path: P) -> KeyFileResult<Zeroizing<Vec<u8>>> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = Zeroizing::new(Vec::new());
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Write key file contents atomically with owner-only permissions
pub fn write_key_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> KeyFileResult<()> {
    write_atomic(path.as_ref(), contents, Some(KEY_FILE_MODE))
}

/// Size of a key file in bytes, or `None` if it does not exist
///
/// Any error other than "not found" is returned.
pub fn key_file_size<P: AsRef<Path>>(path: P) -> KeyFileResult<Option<u64>> {
    match fs::metadata(path.as_ref()) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> KeyFileResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        KeyFileError::Config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> KeyFileResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let contents = serde_json::to_vec_pretty(data)?;
    write_atomic(path.as_ref(), &contents, None)
}

fn write_atomic(path: &Path, contents: &[u8], mode: Option<u32>) -> KeyFileResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Temp file in the same directory keeps the rename atomic
    let temp_path = temp_path_for(path)?;

    let result = write_temp(&temp_path, contents, mode).and_then(|()| {
        fs::rename(&temp_path, path)?;
        Ok(())
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, contents: &[u8], mode: Option<u32>) -> KeyFileResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }

    let mut file = options.open(temp_path)?;

    // A stale temp file keeps its old mode through open(); force it
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            file.set_permissions(fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

fn temp_path_for(path: &Path) -> KeyFileResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )
    })?;

    let mut temp_name = OsString::from(name);
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

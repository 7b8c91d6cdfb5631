//! Atomic persistence for sealed files and key files.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use getrandom::fill;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A file on disk that is only ever replaced whole.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    /// Replaces the file with `data`.
    ///
    /// The bytes go to a fresh sibling temp file which is fsynced and then
    /// renamed over the target, so a crash leaves either the old or the new
    /// contents, never a partial write. Parent directories are created. On
    /// Unix the file is created with mode `0600`.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        let parent = self.parent();
        fs::create_dir_all(parent)?;

        let tmp_path = self.random_tmp_path()?;
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // keys and plaintext are readable by the owner only
            options.mode(0o600);
        }
        let mut tmp_file = options.open(&tmp_path)?;

        tmp_file.write_all(data)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = atomic_replace(&tmp_path, &self.path) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!("failed to remove {}: {cleanup}", tmp_path.display());
            }
            return Err(e.into());
        }

        sync_dir(parent)?;
        debug!(len = data.len(), "wrote {}", self.path.display());
        Ok(())
    }

    fn parent(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// `<name>.tmp.<16 hex digits>` next to the target.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| {
            Error::InvalidInput(format!("{} does not name a file", self.path.display()))
        })?;

        let mut suffix = [0u8; 8];
        fill(&mut suffix).map_err(|e| Error::backend("OS random generator", e))?;
        let suffix: String = suffix.iter().map(|b| format!("{b:02x}")).collect();

        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(format!(".tmp.{suffix}"));
        Ok(self.parent().join(tmp_name))
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_replace(from: &Path, to: &Path) -> io::Result<()> {
    // rename(2) is atomic within one filesystem; the temp file is a sibling.
    fs::rename(from, to)
}

#[cfg(target_os = "windows")]
fn atomic_replace(from: &Path, to: &Path) -> io::Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

    if !to.exists() {
        return fs::rename(from, to);
    }

    fn wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    let target = wide(to.as_os_str());
    let replacement = wide(from.as_os_str());

    // SAFETY: both buffers are NUL-terminated UTF-16 and outlive the call;
    // ReplaceFileW does not keep the pointers.
    let ok = unsafe {
        ReplaceFileW(
            target.as_ptr(),
            replacement.as_ptr(),
            std::ptr::null(),
            REPLACEFILE_WRITE_THROUGH,
            std::ptr::null(),
            std::ptr::null(),
        )
    };

    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

// Directories cannot be opened for fsync on Windows; ReplaceFileW writes through.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("out.slbx"));

        storage.save(b"sealed bytes").unwrap();
        assert!(storage.exists());
        assert_eq!(storage.load().unwrap(), b"sealed bytes");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("missing.slbx"));

        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(Error::Io(_))));
    }

    #[test]
    fn save_replaces_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.slbx");
        let storage = Storage::new(&path);

        storage.save(b"first").unwrap();
        storage.save(b"second").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        Storage::new(dir.path().join("out.slbx")).save(b"x").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["out.slbx"]);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("key.bin");

        Storage::new(&nested).save(&[0u8; 32]).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn tmp_paths_are_unique_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.slbx");
        let storage = Storage::new(&path);

        let a = storage.random_tmp_path().unwrap();
        let b = storage.random_tmp_path().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.parent(), path.parent());
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("out.slbx.tmp."));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("key.bin");
        Storage::new(&path).save(&[7u8; 32]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        let storage = Storage::new("/");
        assert!(matches!(
            storage.random_tmp_path(),
            Err(Error::InvalidInput(_))
        ));
    }
}

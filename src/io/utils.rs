//! Utilities for input/output.

use super::OverwriteMode;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// An output path that is only populated once all writing has succeeded.
///
/// Output goes to a file in a temporary directory next to the target,
/// which is moved into place by [`AtomicOutputPath::perform_replace`].
/// If the object is dropped before that, the temporary directory is removed
/// and the target is left untouched. The file is created normally, so its
/// permissions follow the process umask.
#[derive(Debug)]
pub struct AtomicOutputPath {
    target_path: PathBuf,
    temporary_file: fs::File,
    temporary_path: PathBuf,
    temporary_dir: TempDir,
}

impl AtomicOutputPath {
    /// Creates a temporary output file next to the given target path, creating
    /// any missing parent directories.
    pub fn new<P: AsRef<Path>>(target_path: P) -> io::Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();
        let directory = match target_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory)?;

        let file_name = target_path
            .file_name()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Output path {} has no file name", target_path.display()),
                )
            })?
            .to_string_lossy()
            .into_owned();

        let temporary_dir = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempdir_in(&directory)?;
        let temporary_path = temporary_dir.path().join(&file_name);
        let temporary_file = fs::File::create(&temporary_path)?;

        Ok(Self {
            target_path,
            temporary_dir,
            temporary_path,
            temporary_file,
        })
    }

    /// Returns the path where the output will end up.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Returns the path of the temporary file being written to.
    pub fn temporary_path(&self) -> &Path {
        &self.temporary_path
    }

    /// Returns the open temporary file.
    pub fn temporary_file_mut(&mut self) -> &mut fs::File {
        &mut self.temporary_file
    }

    /// Determines whether the target may be written under the given overwrite mode.
    pub fn write_allowed(&self, overwrite_mode: OverwriteMode) -> bool {
        overwrite_mode == OverwriteMode::Always || !self.target_path.exists()
    }

    /// Moves the temporary file to the target path, replacing any existing file.
    pub fn perform_replace(self) -> io::Result<()> {
        let Self {
            target_path,
            temporary_dir,
            temporary_path,
            temporary_file,
        } = self;
        drop(temporary_file);
        fs::rename(&temporary_path, &target_path)?;
        temporary_dir.close()
    }
}

//! File-backed save storage for headless runs.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use voidecho_game::{SAVE_KEY_PREFIX, SaveStorage};

#[derive(Debug, thiserror::Error)]
pub enum FileStorageError {
    #[error("save io error: {0}")]
    Io(#[from] io::Error),
}

/// Stores each slot as one JSON file under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{SAVE_KEY_PREFIX}{slot}.json"))
    }
}

impl SaveStorage for FileStorage {
    type Error = FileStorageError;

    fn save_blob(&self, slot: &str, blob: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(slot), blob)?;
        Ok(())
    }

    fn load_blob(&self, slot: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_save(&self, slot: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

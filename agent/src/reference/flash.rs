//! A file-backed reference [`FlashStreamer`].

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::contracts::{FlashError, FlashStreamer};

pub struct FileFlashStreamer {
    path: PathBuf,
    file: Option<File>,
    bytes_written: usize,
}

impl FileFlashStreamer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFlashStreamer {
            path: path.into(),
            file: None,
            bytes_written: 0,
        }
    }
}

impl FlashStreamer for FileFlashStreamer {
    fn init(&mut self) -> Result<(), FlashError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|error| FlashError::Append(error.to_string()))?;
        self.file = Some(file);
        self.bytes_written = 0;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8], is_final: bool) -> Result<(), FlashError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| FlashError::Append("append before init".into()))?;
        file.write_all(bytes)
            .map_err(|error| FlashError::Append(error.to_string()))?;
        self.bytes_written += bytes.len();
        if is_final {
            file.flush()
                .map_err(|error| FlashError::Append(error.to_string()))?;
        }
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

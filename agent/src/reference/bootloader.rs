//! A file-backed reference [`Bootloader`].
//!
//! Confirmation state is a marker file next to the alternate slot file;
//! `request_upgrade` just records that it was asked for, since there is no
//! real MCU to reboot in this environment.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::contracts::{Bootloader, BootloaderError, UpgradeMode};

pub struct FileBootloader {
    confirmed_marker: PathBuf,
    alt_slot_size: usize,
    image_version: String,
    upgrade_requested: AtomicBool,
    erase_log: Mutex<Vec<()>>,
}

impl FileBootloader {
    pub fn new(confirmed_marker: impl Into<PathBuf>, alt_slot_size: usize, image_version: impl Into<String>) -> Self {
        FileBootloader {
            confirmed_marker: confirmed_marker.into(),
            alt_slot_size,
            image_version: image_version.into(),
            upgrade_requested: AtomicBool::new(false),
            erase_log: Mutex::new(Vec::new()),
        }
    }

    /// Whether [`Bootloader::request_upgrade`] has been called since construction.
    pub fn upgrade_requested(&self) -> bool {
        self.upgrade_requested.load(Ordering::SeqCst)
    }

    /// Number of times the alternate slot has been erased.
    pub fn erase_count(&self) -> usize {
        self.erase_log.lock().expect("erase log poisoned").len()
    }
}

impl Bootloader for FileBootloader {
    fn is_image_confirmed(&self) -> Result<bool, BootloaderError> {
        Ok(self.confirmed_marker.exists())
    }

    fn write_image_confirmed(&self) -> Result<(), BootloaderError> {
        std::fs::write(&self.confirmed_marker, b"confirmed")
            .map_err(|error| BootloaderError::Failed(error.to_string()))
    }

    fn erase_alt_slot(&self) -> Result<(), BootloaderError> {
        self.erase_log.lock().expect("erase log poisoned").push(());
        Ok(())
    }

    fn alt_slot_size(&self) -> usize {
        self.alt_slot_size
    }

    fn request_upgrade(&self, _mode: UpgradeMode) -> Result<(), BootloaderError> {
        self.upgrade_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn image_version(&self) -> String {
        self.image_version.clone()
    }
}

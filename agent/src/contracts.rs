//! External collaborator contracts.
//!
//! These are deliberately out of the core's scope: the bootloader, the
//! non-volatile key/value store, the flash-streaming writer, and the
//! device identity source are all hardware- or platform-specific. The
//! core only depends on these trait boundaries, never on a concrete
//! implementation. [`crate::reference`] provides file-backed
//! implementations used by the test suite and the demo binary.

use thiserror::Error;

/// Error surfaced by a [`KeyValueStore`] implementation.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key/value store i/o error: {0}")]
    Io(String),
}

/// Non-volatile key/value storage used for a single persisted 32-bit
/// integer (the last-installed action id, at key [`crate::store::ACTION_ID_KEY`]).
pub trait KeyValueStore: Send + Sync {
    /// Reads the raw bit pattern stored at `key`, or `None` if nothing has
    /// ever been written there.
    fn read_u32(&self, key: u32) -> Result<Option<u32>, KvError>;

    /// Writes `value` at `key`, replacing whatever was there before.
    fn write_u32(&self, key: u32, value: u32) -> Result<(), KvError>;
}

/// Error surfaced by a [`Bootloader`] implementation.
#[derive(Debug, Error)]
pub enum BootloaderError {
    #[error("bootloader operation failed: {0}")]
    Failed(String),
}

/// The boot mode passed to [`Bootloader::request_upgrade`]. The source only
/// ever requests a one-shot test boot of the freshly staged image; there is
/// no permanent-upgrade variant reachable from the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeMode {
    Test,
}

/// Primitives implemented by the bootloader driving the device's single-image
/// slotted flash layout.
pub trait Bootloader: Send + Sync {
    /// Whether the currently running image has been marked permanent.
    fn is_image_confirmed(&self) -> Result<bool, BootloaderError>;

    /// Promotes the currently running image to permanent.
    fn write_image_confirmed(&self) -> Result<(), BootloaderError>;

    /// Erases the alternate (non-running) flash slot.
    fn erase_alt_slot(&self) -> Result<(), BootloaderError>;

    /// Capacity, in bytes, of the alternate flash slot.
    fn alt_slot_size(&self) -> usize;

    /// Arms a one-shot boot attempt of the freshly staged image.
    fn request_upgrade(&self, mode: UpgradeMode) -> Result<(), BootloaderError>;

    /// Version string of the image currently running.
    fn image_version(&self) -> String;
}

/// Error surfaced by a [`FlashStreamer`] implementation.
#[derive(Debug, Error)]
pub enum FlashError {
    #[error("flash append failed: {0}")]
    Append(String),
}

/// Sequential writer that appends artifact bytes into the alternate flash
/// slot as they arrive off the wire.
pub trait FlashStreamer: Send {
    /// Prepares the alternate slot for a fresh write (erase, reset offset).
    fn init(&mut self) -> Result<(), FlashError>;

    /// Appends `bytes`. `is_final` is set on the call carrying the last
    /// slice of the response body, so the last write can flush.
    fn append(&mut self, bytes: &[u8], is_final: bool) -> Result<(), FlashError>;

    /// Total bytes written so far.
    fn bytes_written(&self) -> usize;
}

/// Device identity and firmware version source. Returns `Option<String>`
/// rather than a C-style `(buf, len) -> bool` out-param pair, tightening the
/// type instead of checking a sentinel at every call site.
pub trait DeviceIdentity: Send + Sync {
    /// Opaque printable token uniquely identifying the device (used as `VIN`).
    fn device_id(&self) -> Option<String>;

    /// Printable version string of the running image.
    fn firmware_version(&self) -> Option<String>;
}

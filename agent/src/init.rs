//! C8: boot-time confirmation — runs once, before the poll loop starts.

use tracing::{info, warn};

use crate::contracts::{Bootloader, DeviceIdentity, KeyValueStore};
use crate::store::ActionIdStore;

/// Checks whether the currently running image has been confirmed; if not,
/// confirms it and erases the alternate slot so a stale staged image can't
/// be mistaken for a fresh one on the next cycle. The persisted action id is
/// read only to log it — the first poll cycle is the one that compares it
/// against the server.
pub fn init(
    kv: &dyn KeyValueStore,
    bootloader: &dyn Bootloader,
    identity: &dyn DeviceIdentity,
) -> Result<(), crate::error::InitError> {
    let store = ActionIdStore::new(kv);
    let persisted_action_id = store.read()?;
    let firmware_version = identity.firmware_version().unwrap_or_default();

    info!(
        persisted_action_id,
        firmware_version, "starting up"
    );

    if bootloader.is_image_confirmed()? {
        info!("running image already confirmed");
        return Ok(());
    }

    warn!("running image unconfirmed at startup; confirming and erasing alternate slot");
    bootloader.write_image_confirmed()?;
    bootloader.erase_alt_slot()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{FileBootloader, InMemoryKeyValueStore, StaticIdentity};

    #[test]
    fn confirms_and_erases_when_unconfirmed() {
        let dir = tempfile::tempdir().unwrap();
        let kv = InMemoryKeyValueStore::default();
        let bootloader = FileBootloader::new(dir.path().join("confirmed"), 4096, "1.0.0");
        let identity = StaticIdentity::new("dev01", "1.0.0");

        init(&kv, &bootloader, &identity).unwrap();

        assert!(bootloader.is_image_confirmed().unwrap());
        assert_eq!(bootloader.erase_count(), 1);
    }

    #[test]
    fn leaves_confirmed_image_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let kv = InMemoryKeyValueStore::default();
        let bootloader = FileBootloader::new(dir.path().join("confirmed"), 4096, "1.0.0");
        bootloader.write_image_confirmed().unwrap();
        let identity = StaticIdentity::new("dev01", "1.0.0");

        init(&kv, &bootloader, &identity).unwrap();

        assert_eq!(bootloader.erase_count(), 0);
    }
}

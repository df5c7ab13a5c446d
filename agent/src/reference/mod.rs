//! Reference (non-production) implementations of the four external
//! contracts from [`crate::contracts`].
//!
//! None of this runs on a real device: a real build substitutes a flash
//! driver, a bootloader shim talking to the slot headers, and a hardware
//! identity source. These exist so the orchestrator's state machine can be
//! exercised end to end — by the integration tests in `agent/tests/` and by
//! the `agentd` demo binary — without real flash or bootloader hardware.

pub mod bootloader;
pub mod flash;
pub mod identity;
pub mod kv;

pub use bootloader::FileBootloader;
pub use flash::FileFlashStreamer;
pub use identity::StaticIdentity;
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore};

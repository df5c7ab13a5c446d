//! The outcome taxonomy produced by a single [`crate::orchestrator::probe`] cycle.

use std::fmt;

use thiserror::Error;

use crate::contracts::{BootloaderError, KvError};

/// Terminal result of one poll cycle. Exactly one variant is produced per
/// call to [`crate::orchestrator::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCode {
    /// The deployment already matched the persisted action id; feedback acked.
    Ok,
    /// No `deploymentBase` link was present.
    NoUpdate,
    /// The server requested cancellation; acked.
    CancelUpdate,
    /// An artifact was staged and the bootloader armed for test boot.
    UpdateInstalled,
    /// The running image was not confirmed at cycle start.
    UnconfirmedImage,
    /// Artifact too large, flash append failure, or upgrade request rejected.
    DownloadError,
    /// Resolve, connect, or request failure.
    NetworkingError,
    /// Malformed or unexpected server document.
    MetadataError,
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeCode::Ok => "Ok",
            OutcomeCode::NoUpdate => "NoUpdate",
            OutcomeCode::CancelUpdate => "CancelUpdate",
            OutcomeCode::UpdateInstalled => "UpdateInstalled",
            OutcomeCode::UnconfirmedImage => "UnconfirmedImage",
            OutcomeCode::DownloadError => "DownloadError",
            OutcomeCode::NetworkingError => "NetworkingError",
            OutcomeCode::MetadataError => "MetadataError",
        };
        f.write_str(s)
    }
}

/// Failure of the one-shot boot-time confirmation path (C8).
#[derive(Debug, Error)]
pub enum InitError {
    #[error("persistent store error")]
    Store(#[from] KvError),

    #[error("bootloader error")]
    Bootloader(#[from] BootloaderError),
}

//! C4: typed encodings/decodings of the server's control, deployment,
//! cancel, config, and feedback documents.

mod control;
mod deployment;
mod feedback;

pub use control::{ControlLinks, ControlResponse, Link, Polling, PollingConfig};
pub use deployment::{Artifact, ArtifactLinks, Chunk, DeploymentBody, DeploymentResponse, Hashes};
pub use feedback::{
    ConfigData, ConfigMessage, Execution, FeedbackMessage, FeedbackResult, FeedbackStatus, Finished,
};

//! C5: descriptor parser — sleep interval, `cancelAction` id, `deploymentBase`
//! suffix, and deployment/artifact validation.

use thiserror::Error;

use crate::protocol::DeploymentResponse;

pub const CANCEL_ACTION_MARKER: &str = "cancelAction/";
pub const DEPLOYMENT_BASE_MARKER: &str = "deploymentBase/";
pub const DOWNLOAD_HTTP_MARKER: &str = "/DEFAULT/controller/v1";
pub const MAX_LINK_SUFFIX_LEN: usize = 49;
pub const MAX_DOWNLOAD_PATH_LEN: usize = 199;
const EXPECTED_CHUNK_PART: &str = "bApp";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("cancelAction link missing the `cancelAction/` marker")]
    MalformedCancelUrl,
    #[error("cancelAction suffix exceeds {MAX_LINK_SUFFIX_LEN} bytes")]
    CancelUrlTooLong,
    #[error("cancelAction id is not a positive integer")]
    InvalidCancelActionId,
    #[error("deploymentBase link missing the `deploymentBase/` marker")]
    MalformedDeploymentBaseUrl,
    #[error("deployment has {0} chunks, expected exactly one")]
    WrongChunkCount(usize),
    #[error("unexpected chunk part {0:?}, expected \"bApp\"")]
    UnexpectedPart(String),
    #[error("chunk has {0} artifacts, expected exactly one")]
    WrongArtifactCount(usize),
    #[error("artifact size {size} exceeds alternate slot capacity {capacity}")]
    ArtifactTooLarge { size: u64, capacity: usize },
    #[error("download-http link missing the `{DOWNLOAD_HTTP_MARKER}` marker")]
    MalformedDownloadLink,
}

/// Decodes the control response's `sleep` string.
///
/// Must be exactly 8 characters, `HH:MM:SS`. Any other length, or a
/// total of zero or less, is treated as malformed and ignored (the
/// caller logs and keeps the current [`crate::config::AgentConfig`]
/// poll interval).
pub fn decode_sleep_seconds(sleep: &str) -> Option<u64> {
    if sleep.len() != 8 {
        return None;
    }
    let bytes = sleep.as_bytes();
    if bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    let hours: u64 = sleep.get(0..2)?.parse().ok()?;
    let minutes: u64 = sleep.get(3..5)?.parse().ok()?;
    let seconds: u64 = sleep.get(6..8)?.parse().ok()?;
    let total = hours * 3600 + minutes * 60 + seconds;
    if total == 0 {
        None
    } else {
        Some(total)
    }
}

enum MarkerError {
    Missing,
    TooLong,
}

fn find_marker_suffix(url: &str, marker: &str, max_len: usize) -> Result<&str, MarkerError> {
    let index = url.find(marker).ok_or(MarkerError::Missing)?;
    let suffix = &url[index..];
    if suffix.len() > max_len {
        return Err(MarkerError::TooLong);
    }
    Ok(suffix)
}

/// Extracts the `cancelAction` id from a `cancelAction` link's `href`.
pub fn extract_cancel_action_id(href: &str) -> Result<i32, DescriptorError> {
    let suffix = find_marker_suffix(href, CANCEL_ACTION_MARKER, MAX_LINK_SUFFIX_LEN).map_err(|e| {
        match e {
            MarkerError::Missing => DescriptorError::MalformedCancelUrl,
            MarkerError::TooLong => DescriptorError::CancelUrlTooLong,
        }
    })?;

    let mut segments = suffix.splitn(2, '/');
    segments.next(); // "cancelAction"
    let rest = segments.next().ok_or(DescriptorError::MalformedCancelUrl)?;
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    let id: i32 = digits
        .parse()
        .map_err(|_| DescriptorError::MalformedCancelUrl)?;
    if id <= 0 {
        return Err(DescriptorError::InvalidCancelActionId);
    }
    Ok(id)
}

/// Extracts the `deploymentBase` path suffix. Returns an empty string if
/// `href` is `None` (link absent, which the orchestrator treats as
/// `NoUpdate`, not an error).
pub fn extract_deployment_base_suffix(href: Option<&str>) -> Result<String, DescriptorError> {
    let Some(href) = href else {
        return Ok(String::new());
    };
    find_marker_suffix(href, DEPLOYMENT_BASE_MARKER, MAX_LINK_SUFFIX_LEN)
        .map(|suffix| suffix.to_string())
        .map_err(|_| DescriptorError::MalformedDeploymentBaseUrl)
}

/// Validates a deployment descriptor's shape and returns its single
/// artifact: exactly one chunk, `part == "bApp"`, exactly one artifact,
/// artifact size within the alternate slot's capacity.
pub fn validate_single_artifact<'a>(
    deployment: &'a DeploymentResponse,
    alt_slot_size: usize,
) -> Result<&'a crate::protocol::Artifact, DescriptorError> {
    let chunks = &deployment.deployment.chunks;
    if chunks.len() != 1 {
        return Err(DescriptorError::WrongChunkCount(chunks.len()));
    }
    let chunk = &chunks[0];
    if chunk.part != EXPECTED_CHUNK_PART {
        return Err(DescriptorError::UnexpectedPart(chunk.part.clone()));
    }
    if chunk.artifacts.len() != 1 {
        return Err(DescriptorError::WrongArtifactCount(chunk.artifacts.len()));
    }
    let artifact = &chunk.artifacts[0];
    if artifact.size as usize > alt_slot_size {
        return Err(DescriptorError::ArtifactTooLarge {
            size: artifact.size,
            capacity: alt_slot_size,
        });
    }
    Ok(artifact)
}

/// Extracts the download path (from `/DEFAULT/controller/v1...` onward)
/// from a `download-http` link's `href`. The download is always issued
/// against the same host session as the rest of the cycle; a cross-host
/// artifact server is not supported.
pub fn extract_download_path(href: &str) -> Result<String, DescriptorError> {
    let suffix = find_marker_suffix(href, DOWNLOAD_HTTP_MARKER, MAX_DOWNLOAD_PATH_LEN)
        .map_err(|_| DescriptorError::MalformedDownloadLink)?;
    Ok(suffix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_sleep() {
        assert_eq!(decode_sleep_seconds("00:05:00"), Some(300));
        assert_eq!(decode_sleep_seconds("01:00:00"), Some(3600));
    }

    #[test]
    fn rejects_malformed_sleep_lengths() {
        assert_eq!(decode_sleep_seconds("5m"), None);
        assert_eq!(decode_sleep_seconds("00:00:00"), None);
        assert_eq!(decode_sleep_seconds("aa:bb:cc"), None);
    }

    #[test]
    fn extracts_cancel_action_id() {
        let href = "https://example.invalid/DEFAULT/controller/v1/dev01-x/cancelAction/7";
        assert_eq!(extract_cancel_action_id(href).unwrap(), 7);
    }

    #[test]
    fn rejects_non_positive_cancel_action_id() {
        let href = "https://example.invalid/cancelAction/0";
        assert_eq!(
            extract_cancel_action_id(href).unwrap_err(),
            DescriptorError::InvalidCancelActionId
        );
    }

    #[test]
    fn rejects_missing_cancel_marker() {
        let href = "https://example.invalid/no-marker-here";
        assert_eq!(
            extract_cancel_action_id(href).unwrap_err(),
            DescriptorError::MalformedCancelUrl
        );
    }

    #[test]
    fn absent_deployment_base_link_is_empty_not_error() {
        assert_eq!(extract_deployment_base_suffix(None).unwrap(), "");
    }

    #[test]
    fn extracts_deployment_base_suffix() {
        let href = "https://example.invalid/dev01-x/deploymentBase/42";
        assert_eq!(
            extract_deployment_base_suffix(Some(href)).unwrap(),
            "deploymentBase/42"
        );
    }

    #[test]
    fn extracts_download_path() {
        let href = "https://example.invalid/DEFAULT/controller/v1/dev01/deploymentBase/42/artifacts/app.bin";
        assert_eq!(
            extract_download_path(href).unwrap(),
            "/DEFAULT/controller/v1/dev01/deploymentBase/42/artifacts/app.bin"
        );
    }

    #[test]
    fn rejects_download_link_without_marker() {
        let href = "https://example.invalid/artifacts/app.bin";
        assert_eq!(
            extract_download_path(href).unwrap_err(),
            DescriptorError::MalformedDownloadLink
        );
    }
}

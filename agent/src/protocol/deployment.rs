//! The deployment descriptor (`DeploymentResponse`).

use serde::Deserialize;

use super::control::Link;

/// Document returned by `GET <BASE>/<board>-<devid>/<deploymentBase>`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentResponse {
    /// Parses to an [`ActionId`](crate::store). Non-numeric or non-positive
    /// values are a metadata error, checked by the orchestrator.
    pub id: String,
    pub deployment: DeploymentBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentBody {
    /// Advisory download policy token (e.g. `"forced"`).
    pub download: String,
    /// Advisory update policy token.
    pub update: String,
    /// Non-empty; the orchestrator requires exactly one.
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chunk {
    /// Must equal `"bApp"`; any other value is a metadata error.
    pub part: String,
    pub name: String,
    pub version: String,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub filename: String,
    pub size: u64,
    pub hashes: Hashes,
    #[serde(rename = "_links")]
    pub links: ArtifactLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hashes {
    pub sha1: String,
    pub md5: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactLinks {
    #[serde(rename = "download-http")]
    pub download_http: Link,
    #[serde(rename = "md5sum-http")]
    pub md5sum_http: Option<Link>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        r#"{
            "id": "42",
            "deployment": {
                "download": "forced",
                "update": "forced",
                "chunks": [
                    {
                        "part": "bApp",
                        "name": "app",
                        "version": "1.2.3",
                        "artifacts": [
                            {
                                "filename": "app.bin",
                                "size": 1024,
                                "hashes": {"sha1": "a", "md5": "b", "sha256": "c"},
                                "_links": {
                                    "download-http": {"href": "https://example.invalid/DEFAULT/controller/v1/dev01/deploymentBase/42/artifacts/app.bin"}
                                }
                            }
                        ]
                    }
                ]
            }
        }"#
    }

    #[test]
    fn decodes_a_single_chunk_deployment() {
        let deployment: DeploymentResponse = serde_json::from_str(sample()).unwrap();
        assert_eq!(deployment.id, "42");
        assert_eq!(deployment.deployment.chunks.len(), 1);
        assert_eq!(deployment.deployment.chunks[0].part, "bApp");
        assert_eq!(deployment.deployment.chunks[0].artifacts[0].size, 1024);
    }
}

//! OCI Distribution Specification types.
//!
//! Only the parts needed to list tags and read an image's creation time
//! are modelled: tag lists, image manifests, indexes and the image config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media types the client accepts for manifests.
pub struct MediaType;

impl MediaType {
    /// OCI image manifest media type.
    pub const OCI_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index media type.
    pub const OCI_INDEX: &'static str = "application/vnd.oci.image.index.v1+json";

    /// Docker image manifest (schema 2) media type.
    pub const DOCKER_MANIFEST: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker manifest list media type.
    pub const DOCKER_MANIFEST_LIST: &'static str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Value of the `Accept` header for manifest requests.
    #[must_use]
    pub fn manifest_accept() -> String {
        [
            Self::OCI_MANIFEST,
            Self::DOCKER_MANIFEST,
            Self::OCI_INDEX,
            Self::DOCKER_MANIFEST_LIST,
        ]
        .join(", ")
    }
}

/// OCI content descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    #[serde(default)]
    pub media_type: String,

    /// Digest of the targeted content.
    pub digest: String,

    /// Size in bytes of the content.
    #[serde(default)]
    pub size: u64,

    /// Platform of an index entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// Platform an index entry was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// CPU architecture.
    pub architecture: String,
    /// Operating system.
    pub os: String,
    /// Architecture variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// A manifest document as returned by `/v2/<name>/manifests/<reference>`.
///
/// Image manifests carry a `config`; indexes and manifest lists carry
/// `manifests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDocument {
    /// Schema version (always 2).
    #[serde(default)]
    pub schema_version: u32,

    /// Media type of this manifest, when the registry includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Configuration descriptor of an image manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Descriptor>,

    /// Entries of an index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifests: Option<Vec<Descriptor>>,
}

impl ManifestDocument {
    /// Returns true if this document is an index or manifest list.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.manifests.is_some()
    }

    /// Picks the index entry used to read a creation time.
    ///
    /// Prefers `linux/amd64`, falling back to the first entry.
    #[must_use]
    pub fn preferred_entry(&self) -> Option<&Descriptor> {
        let entries = self.manifests.as_deref()?;
        entries
            .iter()
            .find(|d| {
                d.platform
                    .as_ref()
                    .is_some_and(|p| p.os == "linux" && p.architecture == "amd64")
            })
            .or_else(|| entries.first())
    }
}

/// The subset of the image config blob this crate reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// Response from the `/v2/<name>/tags/list` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagList {
    /// Repository name.
    #[serde(default)]
    pub name: String,

    /// List of tags. Some registries send `null` for an empty repository.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Error response from registry API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// List of errors.
    pub errors: Vec<RegistryApiError>,
}

/// Individual error from registry API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryApiError {
    /// Error code.
    pub code: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// Formats a response body as `CODE: message`, falling back to the raw text.
    #[must_use]
    pub fn describe(body: &str) -> String {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|r| !r.errors.is_empty())
            .map_or_else(
                || body.trim().to_string(),
                |r| {
                    r.errors
                        .iter()
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .collect::<Vec<_>>()
                        .join("; ")
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_manifest() {
        let json = r#"{
            "schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "config": {
                "mediaType": "application/vnd.oci.image.config.v1+json",
                "digest": "sha256:cfg",
                "size": 1234
            },
            "layers": []
        }"#;
        let doc: ManifestDocument = serde_json::from_str(json).unwrap();
        assert!(!doc.is_index());
        assert_eq!(doc.config.unwrap().digest, "sha256:cfg");
    }

    #[test]
    fn test_index_prefers_linux_amd64() {
        let json = r#"{
            "schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.index.v1+json",
            "manifests": [
                {"digest": "sha256:arm", "size": 1, "platform": {"architecture": "arm64", "os": "linux"}},
                {"digest": "sha256:amd", "size": 1, "platform": {"architecture": "amd64", "os": "linux"}}
            ]
        }"#;
        let doc: ManifestDocument = serde_json::from_str(json).unwrap();
        assert!(doc.is_index());
        assert_eq!(doc.preferred_entry().unwrap().digest, "sha256:amd");
    }

    #[test]
    fn test_index_falls_back_to_first() {
        let json = r#"{"manifests": [{"digest": "sha256:only", "size": 1}]}"#;
        let doc: ManifestDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.preferred_entry().unwrap().digest, "sha256:only");
    }

    #[test]
    fn test_image_config_created() {
        let cfg: ImageConfig =
            serde_json::from_str(r#"{"created": "2024-03-01T12:30:00.123456789Z", "os": "linux"}"#)
                .unwrap();
        assert_eq!(
            cfg.created.unwrap().to_rfc3339(),
            "2024-03-01T12:30:00.123456789+00:00"
        );

        let cfg: ImageConfig = serde_json::from_str(r#"{"os": "linux"}"#).unwrap();
        assert!(cfg.created.is_none());
    }

    #[test]
    fn test_tag_list_deserialization() {
        let json = r#"{"name": "acme/app", "tags": ["v1.0.0", "latest"]}"#;
        let tags: TagList = serde_json::from_str(json).unwrap();
        assert_eq!(tags.name, "acme/app");
        assert_eq!(tags.tags.unwrap().len(), 2);

        let empty: TagList = serde_json::from_str(r#"{"name": "acme/app", "tags": null}"#).unwrap();
        assert!(empty.tags.is_none());
    }

    #[test]
    fn test_describe_error_body() {
        let body = r#"{"errors":[{"code":"UNSUPPORTED","message":"The operation is unsupported."}]}"#;
        assert_eq!(
            ErrorResponse::describe(body),
            "UNSUPPORTED: The operation is unsupported."
        );
        assert_eq!(ErrorResponse::describe("plain text\n"), "plain text");
    }
}

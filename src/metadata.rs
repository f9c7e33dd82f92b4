//! Package Metadata
//!
//! Wire types for the remote API and the normalized metadata value shown in
//! the host's plugin-information dialog. Deserialization is deliberately
//! loose: any absent optional field becomes an empty string, and nothing
//! here decides whether an update exists.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Update-check response: the endpoint should return the latest version and
/// a download URL. Either may be missing; the merge layer decides what that
/// means.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Normalized plugin information, empty-string defaults throughout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageMetadata {
    pub name: String,
    pub slug: String,
    pub version: String,
    pub author: String,
    pub author_profile: String,
    pub requires: String,
    pub tested: String,
    pub last_updated: String,
    pub homepage: String,
    pub description: String,
    pub installation: String,
    pub changelog: String,
    #[serde(alias = "FAQ")]
    pub faq: String,
    pub download_link: String,
}

/// Raw plugin-information response. A `key_error` marker means the licensed
/// call was rejected and the body carries no usable metadata.
#[derive(Debug, Deserialize)]
pub struct PluginInfoResponse {
    #[serde(default)]
    pub key_error: Option<Value>,
    #[serde(flatten)]
    pub metadata: PackageMetadata,
}

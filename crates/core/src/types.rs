//! Value types shared across the workspace

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of media manager a configured instance talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Radarr,
    Sonarr,
}

impl ServiceType {
    /// Returns the lowercase name used in config tables and guide paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
        }
    }

    /// Returns true if the service exposes release profiles
    pub fn supports_release_profiles(&self) -> bool {
        matches!(self, Self::Sonarr)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radarr => write!(f, "Radarr"),
            Self::Sonarr => write!(f, "Sonarr"),
        }
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radarr" => Ok(Self::Radarr),
            "sonarr" => Ok(Self::Sonarr),
            other => Err(format!("unknown service type: {}", other)),
        }
    }
}

/// Name of one configured service instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceName(String);

impl InstanceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable guide-assigned identifier of a desired record
///
/// Guide identifiers are compared case-insensitively, so the key is stored
/// lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ContentKey(String);

impl ContentKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(key.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContentKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ContentKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned identifier of a remote record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Numeric(i64),
    Opaque(String),
}

impl RemoteId {
    /// Reads the identifier out of a remote document's `id` field
    pub fn from_document(document: &serde_json::Value) -> Option<Self> {
        match document.get("id")? {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Numeric),
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::Opaque(s.clone())),
            _ => None,
        }
    }

    /// Returns the numeric form, if the service uses integer identifiers
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Opaque(_) => None,
        }
    }

    /// Returns the identifier as a JSON value suitable for a payload `id` field
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Numeric(n) => serde_json::Value::from(*n),
            Self::Opaque(s) => serde_json::Value::from(s.clone()),
        }
    }
}

impl From<i64> for RemoteId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Opaque(s) => write!(f, "{}", s),
        }
    }
}

/// Kind of remote entity a batch operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    CustomFormat,
    QualityProfile,
    ReleaseProfile,
    Tag,
}

impl RecordKind {
    /// Resource segment of the service's v3 REST API
    pub fn api_resource(&self) -> &'static str {
        match self {
            Self::CustomFormat => "customformat",
            Self::QualityProfile => "qualityprofile",
            Self::ReleaseProfile => "releaseprofile",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomFormat => write!(f, "custom format"),
            Self::QualityProfile => write!(f, "quality profile"),
            Self::ReleaseProfile => write!(f, "release profile"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

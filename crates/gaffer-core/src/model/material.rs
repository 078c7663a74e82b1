use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier that the catalog may encode as a JSON string or number.
///
/// The original JSON form is preserved when the value is sent back to the portal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarId {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier.
    Text(String),
}

impl Display for ScalarId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(formatter, "{value}"),
            Self::Text(value) => formatter.write_str(value),
        }
    }
}

impl From<&str> for ScalarId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for ScalarId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Tracked delivery request for a title, as returned by request search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequest {
    /// Request identifier used to look up materials.
    pub request_id: ScalarId,
    /// Lifecycle status reported by the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_status: Option<String>,
    /// Source type the request was filed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

/// Material lifecycle status. Only `ACTIVE` is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MaterialStatus {
    /// Material is current and downloadable.
    Active,
    /// Any other status, kept verbatim.
    Other(String),
}

impl MaterialStatus {
    /// Status used when the catalog omits one.
    pub const UNKNOWN: &'static str = "UNKNOWN";
}

impl Default for MaterialStatus {
    fn default() -> Self {
        Self::Other(Self::UNKNOWN.to_string())
    }
}

impl From<String> for MaterialStatus {
    fn from(value: String) -> Self {
        if value == "ACTIVE" {
            Self::Active
        } else {
            Self::Other(value)
        }
    }
}

impl From<MaterialStatus> for String {
    fn from(value: MaterialStatus) -> Self {
        match value {
            MaterialStatus::Active => "ACTIVE".to_string(),
            MaterialStatus::Other(other) => other,
        }
    }
}

/// Location sub-object of a material file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    /// Transfer source identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// File sub-object of a material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Deliverable file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where the file lives on the transfer service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<FileLocation>,
}

/// Attributes derived from a material's optional sub-objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialFilter {
    /// Material language; serialized even when absent.
    #[serde(default)]
    pub language: Option<String>,
    /// Root asset identifier; `Some(None)` for a root asset without an id, sent as null.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub amp_asset_id: Option<Option<ScalarId>>,
    /// Transfer source identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_location_url: Option<String>,
    /// File name, unique within a deduplicated set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Title the material belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<ScalarId>,
}

/// One deliverable file candidate, flattened from the catalog response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Lifecycle status.
    #[serde(default)]
    pub status: MaterialStatus,
    /// Request this material was delivered against.
    #[serde(default)]
    pub source_request_id: Option<ScalarId>,
    /// Free-form category string, possibly carrying channel configuration.
    pub material_type: String,
    /// Raw file sub-object, kept for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    /// Derived attributes.
    #[serde(default)]
    pub material_filter: MaterialFilter,
}

impl Material {
    /// Material type used when the catalog omits one.
    pub const UNKNOWN_TYPE: &'static str = "UNKNOWN";

    /// Whether the status is `ACTIVE`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, MaterialStatus::Active)
    }

    /// File name from the derived filter, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.material_filter.file_name.as_deref()
    }
}

/// Member that is present, possibly as null.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filter attributes forwarded to manifest resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
    /// Material language; serialized even when absent.
    #[serde(default)]
    pub language: Option<String>,
    /// Root asset identifier; `Some(None)` for a root asset without an id, sent as null.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub amp_asset_id: Option<Option<ScalarId>>,
    /// Transfer source identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_location_url: Option<String>,
    /// Title the material belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<ScalarId>,
}

/// Sanitized material sent to manifest setup.
///
/// The type has no status, file info, or file name, so a request can never carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequest {
    /// Request this material was delivered against.
    pub source_request_id: Option<ScalarId>,
    /// Material type.
    pub material_type: String,
    /// Remaining filter attributes.
    pub material_filter: RequestFilter,
}

impl From<&Material> for MaterialRequest {
    fn from(material: &Material) -> Self {
        let filter = &material.material_filter;
        Self {
            source_request_id: material.source_request_id.clone(),
            material_type: material.material_type.clone(),
            material_filter: RequestFilter {
                language: filter.language.clone(),
                amp_asset_id: filter.amp_asset_id.clone(),
                file_location_url: filter.file_location_url.clone(),
                movie_id: filter.movie_id.clone(),
            },
        }
    }
}

//! Request search, material search and flattening of the material payload.
//!
//! # Design
//! - Request search is a plain cookie-authenticated JSON POST; material search is a
//!   bearer-authenticated subscription read up to its first data frame.
//! - Raw payloads are decoded into private structs whose every member is optional;
//!   `__typename` and other unknown members are ignored by construction.

use gaffer_core::{FileInfo, FileLocation, Material, MaterialFilter, MaterialStatus, ScalarId};
use gaffer_core::SourceRequest;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::endpoints::PortalEndpoints;
use crate::error::{PortalError, PortalResult};
use crate::http::PortalClient;
use crate::queries;
use crate::reauth::Credentials;
use crate::sse::read_first_data_frame;

const REQUEST_STATUS_ALL: &str = "all";

/// Material search result: the payload as received plus the flattened records.
#[derive(Debug, Clone)]
pub struct MaterialSearch {
    /// Payload of the first data frame.
    pub raw: Value,
    /// One record per material, in payload order.
    pub materials: Vec<Material>,
}

/// Catalog endpoints of the portal.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: PortalClient,
    endpoints: PortalEndpoints,
    source_type: String,
    request_limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestSearchResponse {
    #[serde(default)]
    source_request: Option<Vec<SourceRequest>>,
}

impl CatalogClient {
    /// Catalog client searching requests of `source_type`, at most `request_limit` at once.
    #[must_use]
    pub fn new(
        http: PortalClient,
        endpoints: PortalEndpoints,
        source_type: impl Into<String>,
        request_limit: u32,
    ) -> Self {
        Self {
            http,
            endpoints,
            source_type: source_type.into(),
            request_limit,
        }
    }

    /// Every source request filed for `title_id`, in a single page.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::EmptyResponse`] when the response lacks `sourceRequest`,
    /// and transport, status or decoding errors otherwise.
    pub async fn search_requests(
        &self,
        credentials: &Credentials,
        title_id: &str,
    ) -> PortalResult<Vec<SourceRequest>> {
        let url = &self.endpoints.request_search;
        let body = self.request_search_body(title_id);
        let response = self
            .http
            .send(
                "search_requests",
                url,
                self.http
                    .post_xhr(url, &self.endpoints, &credentials.session, &body),
            )
            .await?;
        let bytes = response.bytes().await.map_err(|source| PortalError::Http {
            operation: "search_requests",
            url: url.to_string(),
            source,
        })?;
        let decoded: RequestSearchResponse =
            serde_json::from_slice(&bytes).map_err(|source| PortalError::Json {
                operation: "search_requests",
                source,
            })?;

        let requests = decoded.source_request.ok_or(PortalError::EmptyResponse {
            operation: "search_requests",
        })?;
        info!(title_id, requests = requests.len(), "source requests found");
        Ok(requests)
    }

    /// Materials delivered against `request_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::EmptyResponse`] when the stream closes without a data
    /// frame, and transport, status or decoding errors otherwise.
    pub async fn search_assets(
        &self,
        credentials: &Credentials,
        request_ids: &[ScalarId],
    ) -> PortalResult<MaterialSearch> {
        let token = credentials.bearer()?;
        let body = json!({
            "operationName": queries::DOWNLOAD_MATERIALS_OPERATION,
            "variables": { "sourceRequestIds": request_ids },
            "query": queries::download_materials(),
        });
        let url = &self.endpoints.gateway;
        let response = self
            .http
            .send(
                "search_assets",
                url,
                self.http
                    .subscribe(&self.endpoints, &credentials.session, token, &body),
            )
            .await?;
        let raw = read_first_data_frame("search_assets", url.as_str(), response).await?;
        let materials = extract_asset_info(&raw)?;
        info!(materials = materials.len(), "materials found");
        Ok(MaterialSearch { raw, materials })
    }

    fn request_search_body(&self, title_id: &str) -> Value {
        json!({
            "dataset": {
                "and": [
                    { "or": [{ "field": "requestStatus", "eq": REQUEST_STATUS_ALL }] },
                    { "or": [{ "field": "movieIds", "eq": title_id }] },
                    { "or": [{ "field": "sourceType", "eq": self.source_type }] },
                ]
            },
            "queryConfig": {
                "start": 0,
                "limit": self.request_limit,
                "includeAllFields": false,
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct DownloadMaterialsPayload {
    #[serde(default, rename = "sr_downloadMaterials")]
    groups: Option<Vec<RawGroup>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroup {
    #[serde(default)]
    source_request_id: Option<ScalarId>,
    #[serde(default)]
    materials: Option<Vec<RawMaterial>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMaterial {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default, rename = "type")]
    material_type: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    root_amp_asset: Option<RawAmpAsset>,
    #[serde(default)]
    file: Option<RawFile>,
    #[serde(default)]
    movie: Option<RawMovie>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAmpAsset {
    #[serde(default)]
    asset_id: Option<RawAssetId>,
}

#[derive(Debug, Deserialize)]
struct RawAssetId {
    #[serde(default)]
    id: Option<ScalarId>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<RawLocation>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMovie {
    #[serde(default)]
    movie_id: Option<ScalarId>,
}

impl RawMaterial {
    fn into_material(self, source_request_id: Option<&ScalarId>) -> Option<Material> {
        let status = match self.status {
            None | Some(Value::Null) => MaterialStatus::default(),
            Some(Value::String(status)) => MaterialStatus::from(status),
            Some(other) => {
                warn!(
                    status = %other,
                    material_type = self.material_type.as_deref().unwrap_or(Material::UNKNOWN_TYPE),
                    "skipping material with a non-text status"
                );
                return None;
            }
        };
        let file_info = self.file.map(|file| FileInfo {
            name: file.name,
            location: file.location.map(|location| FileLocation { url: location.url }),
        });
        let material_filter = MaterialFilter {
            language: self.language,
            amp_asset_id: self
                .root_amp_asset
                .map(|asset| asset.asset_id.and_then(|asset_id| asset_id.id)),
            file_location_url: file_info
                .as_ref()
                .and_then(|file| file.location.as_ref())
                .and_then(|location| location.url.clone()),
            file_name: file_info.as_ref().and_then(|file| file.name.clone()),
            movie_id: self.movie.and_then(|movie| movie.movie_id),
        };

        Some(Material {
            status,
            source_request_id: source_request_id.cloned(),
            material_type: self
                .material_type
                .unwrap_or_else(|| Material::UNKNOWN_TYPE.to_string()),
            file_info,
            material_filter,
        })
    }
}

/// Flatten a material search payload into one record per material.
///
/// A payload without `sr_downloadMaterials` yields no records. Missing sub-objects
/// leave the derived attributes unset; a root asset without an id records a null
/// `ampAssetId`. A material whose status is not text is skipped.
///
/// # Errors
///
/// Returns [`PortalError::Json`] when a present member has the wrong shape.
pub fn extract_asset_info(raw: &Value) -> PortalResult<Vec<Material>> {
    let payload = DownloadMaterialsPayload::deserialize(raw).map_err(|source| {
        PortalError::Json {
            operation: "extract_asset_info",
            source,
        }
    })?;
    let Some(groups) = payload.groups else {
        debug!("payload carries no material groups");
        return Ok(Vec::new());
    };

    let materials = groups
        .into_iter()
        .flat_map(|group| {
            let request_id = group.source_request_id;
            group
                .materials
                .unwrap_or_default()
                .into_iter()
                .filter_map(move |material| material.into_material(request_id.as_ref()))
        })
        .collect();
    Ok(materials)
}

//! Manifest setup: sanitized material requests in, transfer batches out.
//!
//! # Design
//! - The payload must carry `sr_setupDownloadSessionsForMaterials` and a non-null
//!   session; anything else is a [`PortalError::Manifest`].
//! - Per-material errors reported by the portal are logged and never abort resolution.
//! - A batch missing its host or token is skipped with a warning; the remaining batches
//!   stand on their own.

use gaffer_core::{MaterialRequest, TransferBatch, TransportToken};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::endpoints::PortalEndpoints;
use crate::error::{PortalError, PortalResult};
use crate::http::PortalClient;
use crate::queries;
use crate::reauth::Credentials;
use crate::sse::read_first_data_frame;

const SETUP_FIELD: &str = "sr_setupDownloadSessionsForMaterials";

/// Resolved manifest: the payload as received plus the batches built from it.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Payload of the first data frame.
    pub raw: Value,
    /// Independent transfer batches, in payload order.
    pub batches: Vec<TransferBatch>,
}

/// Turns material requests into transfer batches.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    http: PortalClient,
    endpoints: PortalEndpoints,
    default_user: String,
}

#[derive(Debug, Deserialize)]
struct SetupPayload {
    #[serde(default, rename = "sr_setupDownloadSessionsForMaterials")]
    setup: Option<SetupResult>,
}

#[derive(Debug, Deserialize)]
struct SetupResult {
    #[serde(default)]
    errors: Option<Vec<SetupError>>,
    #[serde(default)]
    session: Option<DownloadSession>,
}

#[derive(Debug, Deserialize)]
struct SetupError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    material: Option<ErrorMaterial>,
}

#[derive(Debug, Deserialize)]
struct ErrorMaterial {
    #[serde(default, rename = "type")]
    material_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadSession {
    #[serde(default)]
    aspera_batches: Option<Vec<RawBatch>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBatch {
    #[serde(default)]
    aspera_host: Option<String>,
    #[serde(default)]
    aspera_transport_token: Option<String>,
    #[serde(default)]
    aspera_user: Option<String>,
    #[serde(default)]
    aspera_batch_uuid: Option<String>,
    #[serde(default)]
    file_downloads: Option<Vec<RawFileDownload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFileDownload {
    #[serde(default)]
    aspera_source: Option<String>,
    #[serde(default)]
    destination_path: Option<String>,
}

impl ManifestResolver {
    /// Resolver that falls back to `default_user` when a batch names no user.
    #[must_use]
    pub fn new(
        http: PortalClient,
        endpoints: PortalEndpoints,
        default_user: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoints,
            default_user: default_user.into(),
        }
    }

    /// Set up download sessions for `requests`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Manifest`] when the setup member or its session is absent,
    /// [`PortalError::EmptyResponse`] when the stream carries no data frame, and
    /// transport, status or decoding errors otherwise.
    pub async fn resolve(
        &self,
        credentials: &Credentials,
        requests: &[MaterialRequest],
    ) -> PortalResult<Manifest> {
        let token = credentials.bearer()?;
        let body = json!({
            "operationName": queries::MANIFESTS_OPERATION,
            "variables": { "requests": requests },
            "query": queries::manifests(),
        });
        let url = &self.endpoints.gateway;
        let response = self
            .http
            .send(
                "resolve_manifest",
                url,
                self.http
                    .subscribe(&self.endpoints, &credentials.session, token, &body),
            )
            .await?;
        let raw = read_first_data_frame("resolve_manifest", url.as_str(), response).await?;
        let batches = self.batches_from(&raw)?;
        info!(
            batches = batches.len(),
            files = batches.iter().map(|batch| batch.pairs().len()).sum::<usize>(),
            "manifest resolved"
        );
        Ok(Manifest { raw, batches })
    }

    /// Build batches from a manifest payload.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Manifest`] when the setup member or its session is absent
    /// and [`PortalError::Json`] when a present member has the wrong shape.
    pub fn batches_from(&self, raw: &Value) -> PortalResult<Vec<TransferBatch>> {
        let payload = SetupPayload::deserialize(raw).map_err(|source| PortalError::Json {
            operation: "resolve_manifest",
            source,
        })?;
        let setup = payload
            .setup
            .ok_or(PortalError::Manifest { field: SETUP_FIELD })?;

        for error in setup.errors.unwrap_or_default() {
            let message = error.message.unwrap_or_default();
            let material_type = error
                .material
                .and_then(|material| material.material_type)
                .unwrap_or_default();
            warn!(%message, %material_type, "portal reported a material error");
        }

        let session = setup
            .session
            .ok_or(PortalError::Manifest { field: "session" })?;
        Ok(session
            .aspera_batches
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw_batch| self.build_batch(raw_batch))
            .collect())
    }

    fn build_batch(&self, raw: RawBatch) -> Option<TransferBatch> {
        let user = raw
            .aspera_user
            .unwrap_or_else(|| self.default_user.clone());
        let batch = TransferBatch::new(
            raw.aspera_host.unwrap_or_default(),
            TransportToken::new(raw.aspera_transport_token.unwrap_or_default()),
            user,
        );
        let mut batch = match batch {
            Ok(batch) => batch.with_batch_id(raw.aspera_batch_uuid),
            Err(err) => {
                warn!(error = %err, "skipping unusable manifest batch");
                return None;
            }
        };

        for download in raw.file_downloads.unwrap_or_default() {
            match (download.aspera_source, download.destination_path) {
                (Some(source), Some(destination)) => {
                    batch.push_pair(source, &destination);
                }
                _ => warn!(host = %batch.host, "skipping file entry without source or destination"),
            }
        }
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::base_config;
    use anyhow::Result;
    use gaffer_core::{AccessToken, Session, StoredCookie};
    use gaffer_test_support::builders::MaterialBuilder;
    use gaffer_test_support::fixtures::{MANIFEST_SSE, manifest_errors_only};
    use httpmock::MockServer;
    use httpmock::prelude::*;

    fn resolver(server: &MockServer) -> Result<ManifestResolver> {
        let config = base_config(server);
        Ok(ManifestResolver::new(
            PortalClient::new(&config.http)?,
            PortalEndpoints::from_config(&config.portal, &config.oauth)?,
            config.transfer.user.clone(),
        ))
    }

    fn offline() -> Result<ManifestResolver> {
        let config = gaffer_config::GafferConfig::default();
        Ok(ManifestResolver::new(
            PortalClient::new(&config.http)?,
            PortalEndpoints::from_config(&config.portal, &config.oauth)?,
            TransferBatch::DEFAULT_USER,
        ))
    }

    #[tokio::test]
    async fn resolve_builds_one_batch_from_the_stream() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/subscriptions/sse")
                .header("authorization", "Bearer bearer-1");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(MANIFEST_SSE);
        });
        let credentials = Credentials {
            session: Session::from_cookies(vec![StoredCookie::new("sid", "abc")]),
            token: Some(AccessToken::new("bearer-1")),
        };
        let requests = vec![MaterialRequest::from(
            &MaterialBuilder::new("DIALOGUE_LIST")
                .file("81635402_DL_en.pdf")
                .language("en")
                .request("sr-1002")
                .build(),
        )];

        let manifest = resolver(&server)?.resolve(&credentials, &requests).await?;

        mock.assert();
        assert_eq!(manifest.batches.len(), 1);
        let batch = &manifest.batches[0];
        assert_eq!(batch.host, "ats-eu.example.com");
        assert_eq!(batch.token.expose(), "ATV3_token");
        assert_eq!(batch.user, TransferBatch::DEFAULT_USER);
        assert_eq!(batch.batch_id.as_deref(), Some("batch-1"));
        let destinations: Vec<&str> = batch
            .pairs()
            .iter()
            .map(|pair| pair.destination.as_str())
            .collect();
        assert_eq!(
            destinations,
            ["81635402/81635402_PM_51_it.wav", "81635402/81635402_DL_en.pdf"]
        );
        assert!(manifest.raw.get(SETUP_FIELD).is_some());
        Ok(())
    }

    #[test]
    fn missing_setup_member_is_a_manifest_error() -> Result<()> {
        let result = offline()?.batches_from(&json!({ "something_else": {} }));
        assert!(matches!(
            result,
            Err(PortalError::Manifest { field: SETUP_FIELD })
        ));
        Ok(())
    }

    #[test]
    fn errors_without_session_are_a_manifest_error() -> Result<()> {
        let result = offline()?.batches_from(&manifest_errors_only("material not ready"));
        assert!(matches!(
            result,
            Err(PortalError::Manifest { field: "session" })
        ));
        Ok(())
    }

    #[test]
    fn reported_errors_do_not_abort_resolution() -> Result<()> {
        let payload = json!({ SETUP_FIELD: {
            "errors": [{ "message": "no file", "material": { "type": "DME_2_0_CH" } }],
            "session": { "asperaBatches": [{
                "asperaHost": "ats.example",
                "asperaTransportToken": "tok",
                "asperaUser": "custom",
                "fileDownloads": [{ "asperaSource": "/a", "destinationPath": "t/a.wav" }],
            }]},
        }});
        let batches = offline()?.batches_from(&payload)?;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].user, "custom");
        assert_eq!(batches[0].pairs().len(), 1);
        Ok(())
    }

    #[test]
    fn unusable_batches_and_entries_are_skipped() -> Result<()> {
        let payload = json!({ SETUP_FIELD: {
            "errors": null,
            "session": { "asperaBatches": [
                { "asperaTransportToken": "tok", "fileDownloads": [] },
                {
                    "asperaHost": "ats.example",
                    "asperaTransportToken": "tok",
                    "fileDownloads": [
                        { "asperaSource": "/a", "destinationPath": "/t/a.wav" },
                        { "asperaSource": "/b", "destinationPath": "t/a.wav/" },
                        { "destinationPath": "t/c.wav" },
                        { "asperaSource": "/d", "destinationPath": "t/d.wav" },
                    ],
                },
            ]},
        }});
        let batches = offline()?.batches_from(&payload)?;

        assert_eq!(batches.len(), 1);
        let sources: Vec<&str> = batches[0]
            .pairs()
            .iter()
            .map(|pair| pair.source.as_str())
            .collect();
        assert_eq!(sources, ["/a", "/d"]);
        let destinations: Vec<&str> = batches[0]
            .pairs()
            .iter()
            .map(|pair| pair.destination.as_str())
            .collect();
        assert_eq!(destinations, ["t/a.wav", "t/d.wav"]);
        Ok(())
    }

    #[test]
    fn batch_without_files_is_kept_empty() -> Result<()> {
        let payload = json!({ SETUP_FIELD: {
            "session": { "asperaBatches": [
                { "asperaHost": "ats.example", "asperaTransportToken": "tok" },
            ]},
        }});
        let batches = offline()?.batches_from(&payload)?;
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
        Ok(())
    }
}

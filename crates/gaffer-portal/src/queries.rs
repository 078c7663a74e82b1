//! GraphQL subscription documents sent to the gateway.

pub(crate) const DOWNLOAD_MATERIALS_OPERATION: &str = "downloadMaterialsSubscription";
pub(crate) const MANIFESTS_OPERATION: &str = "downloadMaterialsManifestsSubscription";

const DOWNLOAD_MATERIALS: &str = r"
subscription downloadMaterialsSubscription($sourceRequestIds: [ID!]!) {
  sr_downloadMaterials(sourceRequestIds: $sourceRequestIds) {
    sourceRequestId
    materials {
      ...DownloadableMaterialFields
      __typename
    }
    __typename
  }
}
";

const MANIFESTS: &str = r"
subscription downloadMaterialsManifestsSubscription($requests: [SRDownloadMaterialRequest!]!) {
  sr_setupDownloadSessionsForMaterials(requests: $requests) {
    errors {
      message
      material {
        ...DownloadableMaterialFields
        __typename
      }
      __typename
    }
    session {
      asperaBatches {
        asperaHost
        asperaBatchUuid
        asperaTransportToken
        utsUuid
        ... on SRAsperaDownloadBatch {
          fileDownloads {
            asperaSource
            correlationId
            destinationPath
            fileIdUuid
            __typename
          }
          __typename
        }
        __typename
      }
      utsUuid
      __typename
    }
    __typename
  }
}
";

const MATERIAL_FIELDS: &str = r"
fragment DownloadableMaterialFields on SRMaterial {
  createdDate
  language
  qcStatus
  status
  subType
  type
  videoLanguage
  watermarkState
  rootAmpAsset {
    assetId {
      id
      version
      __typename
    }
    __typename
  }
  ampAsset {
    assetId {
      id
      __typename
    }
    __typename
  }
  file {
    name
    location {
      url
      __typename
    }
    __typename
  }
  materialType {
    category
    displayName
    type
    __typename
  }
  movie {
    internalTitle
    movieId
    __typename
  }
  __typename
}
";

/// Material search document, fragment included.
pub(crate) fn download_materials() -> String {
    format!("{DOWNLOAD_MATERIALS}{MATERIAL_FIELDS}")
}

/// Manifest setup document, fragment included.
pub(crate) fn manifests() -> String {
    format!("{MANIFESTS}{MATERIAL_FIELDS}")
}

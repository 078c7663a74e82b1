//! Canned portal payloads mirroring the shapes the live endpoints return.

use serde_json::{Value, json};

/// Title identifier the canned payloads describe.
pub const TITLE_ID: &str = "81635402";

/// Request-search response with two source requests.
pub const SOURCE_REQUESTS_JSON: &str = include_str!("../fixtures/source_requests.json");

/// Material subscription stream: keep-alive, empty data frame, one data frame with three
/// materials (two `ACTIVE`, one `INACTIVE`), then a completion frame.
pub const DOWNLOAD_MATERIALS_SSE: &str = include_str!("../fixtures/download_materials.sse");

/// Manifest subscription stream with one batch of two files.
pub const MANIFEST_SSE: &str = include_str!("../fixtures/manifest.sse");

/// Request identifiers contained in [`SOURCE_REQUESTS_JSON`].
pub const REQUEST_IDS: [&str; 2] = ["sr-1001", "sr-1002"];

/// Raw catalog material object with `__typename` noise, as the subscription returns it.
#[must_use]
pub fn raw_material(material_type: &str, status: &str, file_name: Option<&str>) -> Value {
    let mut material = json!({
        "status": status,
        "type": material_type,
        "language": "en",
        "__typename": "SRMaterial",
    });
    if let Some(name) = file_name {
        material["file"] = json!({
            "name": name,
            "location": { "url": format!("aspera://{name}"), "__typename": "SRLocation" },
            "__typename": "SRFile",
        });
    }
    material
}

/// Wrap material groups in the subscription payload envelope.
#[must_use]
pub fn download_materials_payload(groups: &[(&str, Vec<Value>)]) -> Value {
    let groups: Vec<Value> = groups
        .iter()
        .map(|(request_id, materials)| {
            json!({
                "sourceRequestId": request_id,
                "materials": materials,
                "__typename": "SRDownloadMaterials",
            })
        })
        .collect();
    json!({ "sr_downloadMaterials": groups })
}

/// Render payloads as an event stream, each preceded by a keep-alive frame.
#[must_use]
pub fn event_stream(payloads: &[Value]) -> String {
    let mut body = String::new();
    for payload in payloads {
        body.push_str("data: {\"type\":\"ka\"}\n\n");
        body.push_str("data: ");
        body.push_str(&json!({ "data": payload }).to_string());
        body.push_str("\n\n");
    }
    body
}

/// Manifest payload with per-material errors and no session.
#[must_use]
pub fn manifest_errors_only(message: &str) -> Value {
    json!({
        "sr_setupDownloadSessionsForMaterials": {
            "errors": [{ "message": message, "material": { "type": "DIALOGUE_LIST" } }],
            "session": null,
        }
    })
}

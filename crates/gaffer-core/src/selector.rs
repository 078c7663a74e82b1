//! Selection policy: reduce the catalog's candidates to the minimal set worth fetching.
//!
//! # Design
//! - Pure functions over owned vectors; no I/O, no logging beyond debug traces.
//! - `select_best` is all-or-nothing per bucket: the first non-empty bucket in a group's
//!   chain is taken whole and the rest of the chain is ignored.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{CategorizedAssetSet, Category, CategoryGroup, Material, MaterialRequest};

/// Keep only materials whose status is `ACTIVE`.
#[must_use]
pub fn filter_active(materials: Vec<Material>) -> Vec<Material> {
    materials.into_iter().filter(Material::is_active).collect()
}

/// Keep the first material per file name. Materials without a file name always pass.
#[must_use]
pub fn dedupe_by_filename(materials: Vec<Material>) -> Vec<Material> {
    let mut seen = HashSet::new();
    materials
        .into_iter()
        .filter(|material| match material.file_name() {
            Some(name) => seen.insert(name.to_string()),
            None => true,
        })
        .collect()
}

/// Sort materials into category buckets; unrecognized types are dropped.
#[must_use]
pub fn categorize(materials: Vec<Material>) -> CategorizedAssetSet {
    let mut set = CategorizedAssetSet::new();
    for material in materials {
        match Category::classify(&material.material_type) {
            Some(category) => set.insert(category, material),
            None => debug!(
                material_type = %material.material_type,
                "material type matches no category; dropping"
            ),
        }
    }
    set
}

/// Union of the first non-empty bucket of every group's fallback chain.
#[must_use]
pub fn select_best(categorized: &CategorizedAssetSet) -> Vec<Material> {
    let mut selected = Vec::new();
    for group in CategoryGroup::ALL {
        let chosen = group
            .chain()
            .iter()
            .copied()
            .find(|category| !categorized.bucket(*category).is_empty());
        if let Some(category) = chosen {
            debug!(group = group.as_str(), bucket = category.as_str(), "bucket selected");
            selected.extend_from_slice(categorized.bucket(category));
        }
    }
    selected
}

/// Strip status, file info, and file name before the records go to manifest setup.
#[must_use]
pub fn sanitize_for_transfer(materials: &[Material]) -> Vec<MaterialRequest> {
    materials.iter().map(MaterialRequest::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaterialFilter, MaterialStatus, ScalarId};
    use serde_json::Value;

    fn material(material_type: &str, file_name: Option<&str>, status: &str) -> Material {
        Material {
            status: MaterialStatus::from(status.to_string()),
            source_request_id: Some(ScalarId::from("sr-1")),
            material_type: material_type.to_string(),
            file_info: None,
            material_filter: MaterialFilter {
                language: Some("en".to_string()),
                file_name: file_name.map(str::to_string),
                file_location_url: file_name.map(|name| format!("aspera://{name}")),
                ..MaterialFilter::default()
            },
        }
    }

    fn named(material_type: &str, file_name: &str) -> Material {
        material(material_type, Some(file_name), "ACTIVE")
    }

    #[test]
    fn filter_active_drops_other_statuses() {
        let kept = filter_active(vec![
            material("FINAL_PROXY", Some("a"), "ACTIVE"),
            material("FINAL_PROXY", Some("b"), "INACTIVE"),
            material("FINAL_PROXY", Some("c"), "UNKNOWN"),
            material("DIALOGUE_LIST", Some("d"), "ACTIVE"),
        ]);
        let names: Vec<_> = kept.iter().filter_map(Material::file_name).collect();
        assert_eq!(names, vec!["a", "d"]);
    }

    #[test]
    fn dedupe_keeps_first_and_all_unnamed() {
        let deduped = dedupe_by_filename(vec![
            material("FINAL_PROXY", Some("a.mov"), "ACTIVE"),
            material("LOCKED_PROXY", None, "ACTIVE"),
            material("DIALOGUE_LIST", Some("a.mov"), "ACTIVE"),
            material("SERVICING_PROXY", None, "ACTIVE"),
            material("DME_5_1_CH", Some("b.wav"), "ACTIVE"),
        ]);
        assert_eq!(deduped.len(), 4);
        assert_eq!(deduped[0].material_type, "FINAL_PROXY");
        assert_eq!(deduped.iter().filter(|m| m.file_name().is_none()).count(), 2);

        let mut names: Vec<_> = deduped.iter().filter_map(Material::file_name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn categorize_routes_channel_specific_print_master() {
        let set = categorize(vec![
            named("PRINT_MASTER_5_1_CH", "pm51.wav"),
            named("PRINT_MASTER", "generic.wav"),
            named("TEXTLESS", "textless.mov"),
        ]);
        assert_eq!(set.bucket(Category::PrintMaster51).len(), 1);
        assert_eq!(set.bucket(Category::PrintMaster20).len(), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn higher_priority_bucket_wins_whole() {
        let mut set = CategorizedAssetSet::new();
        set.set_bucket(Category::FinalProxy, vec![named("FINAL_PROXY", "a")]);
        set.set_bucket(
            Category::ProxyWithSubtitles,
            vec![
                named("PROXY_WITH_SUBTITLES", "b"),
                named("PROXY_WITH_SUBTITLES", "c"),
            ],
        );
        set.set_bucket(Category::LockedProxy, Vec::new());

        let selected = select_best(&set);
        let names: Vec<_> = selected.iter().filter_map(Material::file_name).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn empty_buckets_fall_through() {
        let mut set = CategorizedAssetSet::new();
        set.set_bucket(Category::FinalProxy, Vec::new());
        set.set_bucket(Category::ProxyWithSubtitles, Vec::new());
        set.set_bucket(Category::LockedProxy, vec![named("LOCKED_PROXY", "d")]);

        let selected = select_best(&set);
        let names: Vec<_> = selected.iter().filter_map(Material::file_name).collect();
        assert_eq!(names, vec!["d"]);
    }

    #[test]
    fn chosen_bucket_is_taken_in_full_across_groups() {
        let set = categorize(vec![
            named("DIALOGUE_LIST", "dl-en.pdf"),
            named("DIALOGUE_LIST", "dl-fr.pdf"),
            named("AS_BROADCAST_SCRIPT", "script.pdf"),
            named("PRINT_MASTER_2_0_CH", "pm20.wav"),
            named("DME_5_1_CH", "dme51.wav"),
            named("DME_2_0_CH", "dme20.wav"),
        ]);
        let selected = select_best(&set);
        let names: Vec<_> = selected.iter().filter_map(Material::file_name).collect();
        assert_eq!(
            names,
            vec!["dl-en.pdf", "dl-fr.pdf", "pm20.wav", "dme51.wav"]
        );
    }

    #[test]
    fn select_best_on_empty_set_is_empty() {
        assert!(select_best(&CategorizedAssetSet::new()).is_empty());
    }

    #[test]
    fn sanitized_records_carry_no_transient_keys() -> Result<(), serde_json::Error> {
        let requests = sanitize_for_transfer(&[
            named("PRINT_MASTER_5_1_CH", "pm51.wav"),
            material("DIALOGUE_LIST", None, "ACTIVE"),
        ]);
        let value = serde_json::to_value(&requests)?;
        let Value::Array(items) = value else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 2);
        for item in items {
            assert!(item.get("status").is_none());
            assert!(item.get("fileInfo").is_none());
            assert!(item["materialFilter"].get("fileName").is_none());
            assert!(item.get("materialType").is_some());
        }
        Ok(())
    }
}

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::Material;

/// Category bucket a material is sorted into by its `materialType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Final conformed proxy.
    #[serde(rename = "FINAL_PROXY")]
    FinalProxy,
    /// Proxy with burned-in subtitles.
    #[serde(rename = "PROXY_WITH_SUBTITLES")]
    ProxyWithSubtitles,
    /// Picture-locked proxy.
    #[serde(rename = "LOCKED_PROXY")]
    LockedProxy,
    /// Servicing proxy.
    #[serde(rename = "SERVICING_PROXY")]
    ServicingProxy,
    /// Dialogue list.
    #[serde(rename = "DIALOGUE_LIST")]
    DialogueList,
    /// As-broadcast script.
    #[serde(rename = "AS_BROADCAST_SCRIPT")]
    AsBroadcastScript,
    /// Surround print master.
    #[serde(rename = "PRINT_MASTER_5_1_CH")]
    PrintMaster51,
    /// Stereo print master.
    #[serde(rename = "PRINT_MASTER_2_0_CH")]
    PrintMaster20,
    /// Surround dialogue/music/effects stems.
    #[serde(rename = "DME_5_1_CH")]
    Dme51,
    /// Stereo dialogue/music/effects stems.
    #[serde(rename = "DME_2_0_CH")]
    Dme20,
}

impl Category {
    /// Categorization precedence, most specific token first.
    pub const PRECEDENCE: [Self; 10] = [
        Self::ProxyWithSubtitles,
        Self::ServicingProxy,
        Self::LockedProxy,
        Self::FinalProxy,
        Self::PrintMaster51,
        Self::PrintMaster20,
        Self::Dme51,
        Self::Dme20,
        Self::AsBroadcastScript,
        Self::DialogueList,
    ];

    /// Token matched against `materialType`; also the serialized bucket name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinalProxy => "FINAL_PROXY",
            Self::ProxyWithSubtitles => "PROXY_WITH_SUBTITLES",
            Self::LockedProxy => "LOCKED_PROXY",
            Self::ServicingProxy => "SERVICING_PROXY",
            Self::DialogueList => "DIALOGUE_LIST",
            Self::AsBroadcastScript => "AS_BROADCAST_SCRIPT",
            Self::PrintMaster51 => "PRINT_MASTER_5_1_CH",
            Self::PrintMaster20 => "PRINT_MASTER_2_0_CH",
            Self::Dme51 => "DME_5_1_CH",
            Self::Dme20 => "DME_2_0_CH",
        }
    }

    /// First category in precedence order whose token occurs in `material_type`.
    #[must_use]
    pub fn classify(material_type: &str) -> Option<Self> {
        Self::PRECEDENCE
            .into_iter()
            .find(|category| material_type.contains(category.as_str()))
    }
}

impl Display for Category {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Semantic group with a fallback chain of buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryGroup {
    /// Review copies of the picture.
    Proxy,
    /// Dialogue lists and scripts.
    DialogueList,
    /// Print master mixes.
    PrintMaster,
    /// Dialogue/music/effects stems.
    Dme,
}

impl CategoryGroup {
    /// Groups in output order.
    pub const ALL: [Self; 4] = [Self::Proxy, Self::DialogueList, Self::PrintMaster, Self::Dme];

    /// Buckets in priority order; the first non-empty one wins.
    #[must_use]
    pub const fn chain(self) -> &'static [Category] {
        match self {
            Self::Proxy => &[
                Category::FinalProxy,
                Category::ProxyWithSubtitles,
                Category::LockedProxy,
                Category::ServicingProxy,
            ],
            Self::DialogueList => &[Category::DialogueList, Category::AsBroadcastScript],
            Self::PrintMaster => &[Category::PrintMaster51, Category::PrintMaster20],
            Self::Dme => &[Category::Dme51, Category::Dme20],
        }
    }

    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::DialogueList => "dialogue_list",
            Self::PrintMaster => "print_master",
            Self::Dme => "dme",
        }
    }
}

/// Materials bucketed by category. Transient; serialized only for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorizedAssetSet {
    buckets: BTreeMap<Category, Vec<Material>>,
}

impl CategorizedAssetSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a material to a bucket, preserving insertion order.
    pub fn insert(&mut self, category: Category, material: Material) {
        self.buckets.entry(category).or_default().push(material);
    }

    #[cfg(test)]
    pub(crate) fn set_bucket(&mut self, category: Category, materials: Vec<Material>) {
        self.buckets.insert(category, materials);
    }

    /// Bucket contents; empty when nothing was categorized there.
    #[must_use]
    pub fn bucket(&self, category: Category) -> &[Material] {
        self.buckets.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Total materials across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether every bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefers_specific_tokens() {
        assert_eq!(
            Category::classify("PRINT_MASTER_5_1_CH"),
            Some(Category::PrintMaster51)
        );
        assert_eq!(
            Category::classify("FINAL_PROXY_WITH_SUBTITLES"),
            Some(Category::ProxyWithSubtitles)
        );
        assert_eq!(
            Category::classify("PIVOT_DIALOGUE_LIST"),
            Some(Category::DialogueList)
        );
        assert_eq!(Category::classify("PRINT_MASTER"), None);
        assert_eq!(Category::classify("TRAILER"), None);
    }

    #[test]
    fn bucket_names_classify_to_themselves() {
        for category in Category::PRECEDENCE {
            assert_eq!(Category::classify(category.as_str()), Some(category));
        }
    }

    #[test]
    fn every_chain_member_is_classifiable() {
        for group in CategoryGroup::ALL {
            for category in group.chain() {
                assert_eq!(Category::classify(category.as_str()), Some(*category));
            }
        }
    }

    #[test]
    fn serialized_keys_use_bucket_names() -> Result<(), serde_json::Error> {
        let mut set = CategorizedAssetSet::new();
        set.set_bucket(Category::PrintMaster51, Vec::new());
        let value = serde_json::to_value(&set)?;
        assert!(value.get("PRINT_MASTER_5_1_CH").is_some());
        assert!(set.is_empty());
        Ok(())
    }
}

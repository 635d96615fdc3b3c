use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// User-chosen filter values. `None` on a dimension selects every candidate
/// value, `Some(vec![])` selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub chapters: Option<Vec<String>>,
    #[serde(default)]
    pub sub_topics: Option<Vec<String>>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub sessions: Option<Vec<String>>,
}

/// Cascaded candidate values and the selection that is actually in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub chapters: Vec<String>,
    pub sub_topics: Vec<String>,
    pub topics: Vec<String>,
    /// Empty when the question source has no session column.
    pub sessions: Vec<String>,
    pub selected_chapters: Vec<String>,
    pub selected_sub_topics: Vec<String>,
    pub selected_topics: Vec<String>,
    pub selected_sessions: Vec<String>,
}

impl FilterOptions {
    pub fn signature(&self) -> FilterSignature {
        FilterSignature {
            chapters: self.selected_chapters.iter().cloned().collect(),
            sub_topics: self.selected_sub_topics.iter().cloned().collect(),
            topics: self.selected_topics.iter().cloned().collect(),
            sessions: self.selected_sessions.iter().cloned().collect(),
        }
    }
}

/// Change-detection key for the active question set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSignature {
    pub chapters: BTreeSet<String>,
    pub sub_topics: BTreeSet<String>,
    pub topics: BTreeSet<String>,
    pub sessions: BTreeSet<String>,
}

impl FilterSignature {
    /// Whether moving from `self` to `other` invalidates the sampled set.
    pub fn differs_from(&self, other: &FilterSignature, policy: InvalidationPolicy) -> bool {
        match policy {
            InvalidationPolicy::AllFilters => self != other,
            InvalidationPolicy::ChapterOnly => self.chapters != other.chapters,
        }
    }
}

/// Which part of the signature decides whether questions are resampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Any change to chapter, sub-topic, topic or session selection.
    #[default]
    AllFilters,
    /// Only chapter changes; sub-topic/topic edits keep the current set.
    ChapterOnly,
}

impl FromStr for InvalidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all_filters" | "all" => Ok(Self::AllFilters),
            "chapter_only" | "chapter" => Ok(Self::ChapterOnly),
            other => Err(format!("unknown invalidation policy: {}", other)),
        }
    }
}

use std::collections::HashSet;

use crate::models::filter::{FilterOptions, FilterSelection};
use crate::models::question::QuestionRecord;

/// Unique values in first-appearance order.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

/// Keeps the requested values that are still candidates; `None` keeps all.
fn effective(candidates: &[String], requested: Option<&Vec<String>>) -> Vec<String> {
    match requested {
        None => candidates.to_vec(),
        Some(requested) => candidates
            .iter()
            .filter(|candidate| requested.contains(candidate))
            .cloned()
            .collect(),
    }
}

/// Derives the cascading chapter → sub-topic → topic option lists and the
/// selection in effect for each dimension.
pub fn filter_options(records: &[QuestionRecord], selection: &FilterSelection) -> FilterOptions {
    let chapters = unique(records.iter().map(|r| r.chapter.as_str()));
    let selected_chapters = effective(&chapters, selection.chapters.as_ref());

    let in_chapters: Vec<&QuestionRecord> = records
        .iter()
        .filter(|r| selected_chapters.contains(&r.chapter))
        .collect();
    let sub_topics = unique(in_chapters.iter().map(|r| r.sub_topic.as_str()));
    let selected_sub_topics = effective(&sub_topics, selection.sub_topics.as_ref());

    let in_sub_topics: Vec<&QuestionRecord> = in_chapters
        .into_iter()
        .filter(|r| selected_sub_topics.contains(&r.sub_topic))
        .collect();
    let topics = unique(in_sub_topics.iter().map(|r| r.topic.as_str()));
    let selected_topics = effective(&topics, selection.topics.as_ref());

    // Session tags are an independent dimension, offered from the whole table.
    let sessions = unique(records.iter().filter_map(|r| r.session.as_deref()));
    let selected_sessions = effective(&sessions, selection.sessions.as_ref());

    FilterOptions {
        chapters,
        sub_topics,
        topics,
        sessions,
        selected_chapters,
        selected_sub_topics,
        selected_topics,
        selected_sessions,
    }
}

/// Records matching every selected dimension.
pub fn apply_filters<'a>(
    records: &'a [QuestionRecord],
    options: &FilterOptions,
) -> Vec<&'a QuestionRecord> {
    records
        .iter()
        .filter(|r| options.selected_chapters.contains(&r.chapter))
        .filter(|r| options.selected_sub_topics.contains(&r.sub_topic))
        .filter(|r| options.selected_topics.contains(&r.topic))
        .filter(|r| match &r.session {
            Some(session) => options.selected_sessions.contains(session),
            None => true,
        })
        .collect()
}

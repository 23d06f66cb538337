use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::collaborators::ResourceRegistry;
use crate::error::{Result, SessionError};

/// Free-text input with its `@resource` mentions pulled out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub query: String,
    pub resources: Vec<String>,
}

fn mention_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention regex compiles"))
}

/// Collect `@name` mentions in order of appearance (duplicates kept) and
/// strip them from the query.
pub fn parse_query(raw: &str) -> ParsedQuery {
    let regex = mention_regex();

    let resources = regex
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    let query = regex.replace_all(raw, "").trim().to_string();

    ParsedQuery { query, resources }
}

/// Explicit names, then mentions, then the single alias; first occurrence wins.
pub fn merge_resources(explicit: &[String], mentioned: &[String], single: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    explicit
        .iter()
        .map(String::as_str)
        .chain(mentioned.iter().map(String::as_str))
        .chain(single)
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Fall back to every registered resource when nothing was named
pub async fn resolve_resources(merged: Vec<String>, registry: &dyn ResourceRegistry) -> Result<Vec<String>> {
    if !merged.is_empty() {
        return Ok(merged);
    }

    let all = registry
        .list_resources()
        .await
        .map_err(SessionError::Registry)?;
    if all.is_empty() {
        return Err(SessionError::EmptyResourceSet);
    }

    tracing::debug!(count = all.len(), "No resources named, using all registered");
    Ok(all.into_iter().map(|r| r.name).collect())
}

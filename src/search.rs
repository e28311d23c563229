//! Recursive value search over the document tree.

use crate::value::{Map, Value};
use std::collections::BTreeMap;

/// Options controlling how leaf values are compared.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Match when the stringified needle occurs anywhere inside the
    /// stringified leaf, instead of requiring equality.
    pub substring: bool,
    /// When false, both string forms are lowercased before comparing.
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            substring: false,
            case_sensitive: true,
        }
    }
}

/// Walk the tree (or the subtree under `key`) and collect every leaf
/// matching `needle`, keyed by its full root-relative `/`-joined path.
///
/// Maps descend per entry and arrays descend per element with the numeric
/// index as the path segment. There is no short-circuit: all matches are
/// collected. A `key` that is absent from the tree logs a warning and
/// returns an empty result.
pub fn search(
    tree: &Map,
    needle: &Value,
    key: Option<&str>,
    options: SearchOptions,
) -> BTreeMap<String, Value> {
    let mut results = BTreeMap::new();
    match key {
        Some(key) => match tree.get(key) {
            Some(node) => walk(node, needle, key, options, &mut results),
            None => tracing::warn!(key, "search key not found"),
        },
        None => {
            for (child_key, child) in tree {
                walk(child, needle, child_key, options, &mut results);
            }
        }
    }
    if results.is_empty() {
        tracing::info!(needle = %needle, "search found no matches");
    }
    results
}

fn walk(
    node: &Value,
    needle: &Value,
    path: &str,
    options: SearchOptions,
    results: &mut BTreeMap<String, Value>,
) {
    match node {
        Value::Map(map) => {
            for (key, child) in map {
                walk(child, needle, &format!("{path}/{key}"), options, results);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, needle, &format!("{path}/{index}"), options, results);
            }
        }
        leaf => {
            if matches(leaf, needle, options) {
                results.insert(path.to_string(), leaf.clone());
            }
        }
    }
}

fn matches(leaf: &Value, needle: &Value, options: SearchOptions) -> bool {
    let mut leaf_form = leaf.to_string();
    let mut needle_form = needle.to_string();
    if !options.case_sensitive {
        leaf_form = leaf_form.to_lowercase();
        needle_form = needle_form.to_lowercase();
    }
    if options.substring {
        leaf_form.contains(&needle_form)
    } else {
        leaf == needle || leaf_form == needle_form
    }
}

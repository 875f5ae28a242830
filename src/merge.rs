//! Per-image deduplication of accepted plates.
//!
//! Two readings are the same plate when one is a substring of the other; the
//! longer reading wins.

/// Fold `items` in order, keeping only readings not contained in another.
///
/// An item whose key lies inside an already kept key is dropped. Otherwise
/// every kept item whose key lies inside the new key is removed and the new
/// item is appended.
pub fn merge_by<T, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut kept: Vec<T> = Vec::new();
    for item in items {
        let text = key(&item);
        if kept.iter().any(|existing| key(existing).contains(text)) {
            tracing::debug!(plate = text, "dropping reading contained in another");
            continue;
        }
        kept.retain(|existing| !text.contains(key(existing)));
        kept.push(item);
    }
    kept
}

pub fn merge(readings: Vec<String>) -> Vec<String> {
    merge_by(readings, |s| s.as_str())
}

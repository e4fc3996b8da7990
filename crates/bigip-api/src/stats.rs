// Stats-response normalization.
//
// `/stats` endpoints return a nested map keyed by the object's self-link,
// with the object identity encoded as `~partition~name[:qualifier]` in the
// second-to-last path segment. This module flattens that shape into one
// record per entry, decoding the composite key.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// One flattened stats entry.
///
/// `partition` is absent when the key carried no partition marker; callers
/// must treat that as the default partition, not as missing data.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRecord {
    pub name: String,
    pub partition: Option<String>,
    /// The entry's `nestedStats` object, kept loosely typed because the
    /// attribute set varies by category and TMOS version.
    pub stats: Value,
}

#[derive(Debug, Deserialize)]
struct StatsEnvelope {
    entries: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsEntry {
    nested_stats: Value,
}

/// Normalize a raw `/stats` payload into flat records.
///
/// Output order follows the payload's own entry order. Re-running on the
/// same payload yields identical records.
pub fn normalize_stats(payload: &Value) -> Result<Vec<StatsRecord>, Error> {
    let envelope: StatsEnvelope =
        serde_json::from_value(payload.clone()).map_err(|e| Error::Deserialization {
            message: format!("stats payload has no usable 'entries' map: {e}"),
            body: payload.to_string(),
        })?;

    let mut records = Vec::with_capacity(envelope.entries.len());
    for (key, value) in &envelope.entries {
        let entry: StatsEntry =
            serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                message: format!("stats entry {key:?} has no 'nestedStats' object: {e}"),
                body: value.to_string(),
            })?;
        let (name, partition) = decode_entry_key(key);
        records.push(StatsRecord {
            name,
            partition,
            stats: entry.nested_stats,
        });
    }
    Ok(records)
}

/// Decode an entry key into `(name, partition)`.
///
/// The identity token is the second-to-last path segment of the key
/// (e.g. `.../~Common~pool1/stats`). A leading `~` introduces the
/// partition; a `:` in the remaining name trims an appliance-internal
/// qualifier (seen on cm stats, where keys carry `group:member`).
fn decode_entry_key(key: &str) -> (String, Option<String>) {
    let mut segments = key.rsplit('/');
    segments.next();
    let token = segments.next().unwrap_or(key);

    let (partition, raw) = match token.strip_prefix('~') {
        Some(rest) => match rest.split_once('~') {
            Some((partition, name)) => (Some(partition.to_owned()), name),
            None => (None, rest),
        },
        None => (None, token),
    };

    let name = raw.split(':').next().unwrap_or(raw);
    (name.to_owned(), partition)
}

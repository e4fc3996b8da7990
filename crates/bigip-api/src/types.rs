//! Typed response models for the iControl REST listings consumed by the
//! topology layer. Field names use camelCase via serde renames; anything
//! with a variable field set stays as opaque JSON.

use serde::Deserialize;

/// Collection envelope shared by `mgmt/tm/<module>/<category>` listings.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    // An explicit default fn keeps the derive from inferring T: Default.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

// ── Data groups ──────────────────────────────────────────────────────

/// An internal data group -- from `GET mgmt/tm/ltm/data-group/internal`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGroup {
    pub name: String,
    /// Owning administrative partition.
    #[serde(default = "default_partition")]
    pub partition: String,
    #[serde(rename = "type", default)]
    pub group_type: Option<String>,
    #[serde(default)]
    pub records: Vec<DataGroupRecord>,
}

/// One key/value record of a data group.
#[derive(Debug, Clone, Deserialize)]
pub struct DataGroupRecord {
    /// The match key (host/path prefix for proxy-pass groups).
    pub name: String,
    /// The record value; absent for bare keys.
    #[serde(default)]
    pub data: Option<String>,
}

// ── iRules ───────────────────────────────────────────────────────────

/// An iRule definition -- from `GET mgmt/tm/ltm/rule`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IruleDefinition {
    pub name: String,
    #[serde(default = "default_partition")]
    pub partition: String,
    /// The raw rule body. Absent for system rules the API hides.
    #[serde(default)]
    pub api_anonymous: Option<String>,
}

fn default_partition() -> String {
    "Common".to_owned()
}

// Resource catalog for iControl REST object categories.
//
// Each API module (ltm, net, cm) owns a closed set of category names
// mapping to `mgmt/tm/<module>/<category>` paths. Lookups are validated
// here, before any network call, so a typo never produces an HTTP 404
// that looks like an appliance problem.

use std::fmt;

use crate::error::Error;

/// Local Traffic Manager object categories (`mgmt/tm/ltm/...`).
pub const LTM_CATEGORIES: &[&str] = &[
    "auth",
    "cipher",
    "data-group",
    "dns",
    "global-settings",
    "html-rule",
    "message-routing",
    "monitor",
    "persistence",
    "profile",
    "tacdb",
    "default-node-monitor",
    "eviction-policy",
    "ifile",
    "nat",
    "node",
    "policy",
    "policy-strategy",
    "pool",
    "rule",
    "rule-profiler",
    "snat",
    "snat-translation",
    "snatpool",
    "traffic-class",
    "traffic-matching-criteria",
    "virtual",
    "virtual-address",
];

/// Network object categories (`mgmt/tm/net/...`).
pub const NET_CATEGORIES: &[&str] = &[
    "bwc",
    "cos",
    "fdb",
    "ipsec",
    "rate-shaping",
    "routing",
    "sfc",
    "tunnels",
    "address-list",
    "arp",
    "dag-globals",
    "dns-resolver",
    "interface",
    "lacp-globals",
    "lldp-globals",
    "multicast-globals",
    "ndp",
    "packet-filter",
    "packet-filter-trusted",
    "port-list",
    "port-mirror",
    "route",
    "route-domain",
    "router-advertisement",
    "self",
    "self-allow",
    "service-policy",
    "stp",
    "stp-globals",
    "timer-policy",
    "trunk",
    "vlan",
    "vlan-group",
    "wccp",
];

/// Cluster management object categories (`mgmt/tm/cm/...`).
pub const CM_CATEGORIES: &[&str] = &[
    "device",
    "device-group",
    "sync-status",
    "traffic-group",
    "trust-domain",
];

/// The three iControl REST API namespaces partitioning object categories.
///
/// A category name is only meaningful within one module -- there is no
/// cross-module fallback ("interface" is a `net` category and nothing else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Local Traffic Manager: pools, nodes, virtual servers, rules, ...
    Ltm,
    /// Network: vlans, interfaces, routes, self IPs, ...
    Net,
    /// Cluster management: devices, device groups, traffic groups.
    Cm,
}

impl Module {
    /// The URL path segment for this module.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Ltm => "ltm",
            Self::Net => "net",
            Self::Cm => "cm",
        }
    }

    /// The closed category set registered for this module.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Ltm => LTM_CATEGORIES,
            Self::Net => NET_CATEGORIES,
            Self::Cm => CM_CATEGORIES,
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Resolve an object category to its relative REST path.
///
/// Returns `mgmt/tm/<module>/<category>` or `Error::UnknownCategory`
/// listing the module's valid set. Never performs I/O.
pub fn resolve(module: Module, category: &str) -> Result<String, Error> {
    let valid = module.categories();
    if !valid.contains(&category) {
        return Err(Error::UnknownCategory {
            module,
            category: category.to_owned(),
            valid,
        });
    }
    Ok(format!("mgmt/tm/{}/{category}", module.path_segment()))
}

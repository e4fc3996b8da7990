// bigip-core: topology layer on top of bigip-api.
//
// Turns raw listings from the management API into graph mutation intents:
// iRule switch statements become ordered routing intents, proxy-pass data
// groups become synthesized virtual-server nodes and pool edges. The graph
// itself is an external collaborator reached through `TopologyGraph`.

pub mod cache;
pub mod error;
pub mod graph;
pub mod irule;
pub mod proxy_pass;

pub use cache::SessionCache;
pub use error::CoreError;
pub use graph::{Component, MemoryGraph, TopologyGraph, Urn};
pub use irule::{RouterRule, RuleBodies, extract_router_rules};
pub use proxy_pass::ProxyPassResolver;

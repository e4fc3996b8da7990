// Data-group proxy-pass resolution.
//
// ProxyPass-style iRules consult a data group mapping host/path prefixes
// to `<serverside-descriptor> <pool>` values. None of that appears in the
// flat virtual-server listings, so this resolver cross-references the
// records against already-discovered pool/virtual-server nodes and
// synthesizes the implied graph edges. Everything here fails soft: a
// stale data-group reference must not abort the whole poll.

use tracing::{debug, warn};

use bigip_api::BigIpClient;
use bigip_api::types::DataGroup;

use crate::cache::SessionCache;
use crate::error::CoreError;
use crate::graph::{Component, TopologyGraph, Urn};

/// URN domain for components synthesized by this resolver.
const URN_DOMAIN: &str = "bigip";

/// Resolves proxy-pass data groups into graph mutation intents.
///
/// Data-group records are fetched once and cached for the lifetime of
/// the resolver (one poll cycle): topology within a cycle is assumed
/// stable, and one listing call covers every rule that references a
/// group.
#[derive(Debug, Default)]
pub struct ProxyPassResolver {
    groups: SessionCache<DataGroup>,
    loaded: bool,
}

impl ProxyPassResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one data-group reference into graph mutations.
    ///
    /// For each record whose key starts with `host_filter`, synthesizes
    /// the serverside virtual-server node and the pool edges implied by
    /// the record value. `virtual_server_urn` is the already-discovered
    /// virtual server the originating rule is attached to; `rule_name`
    /// is added as a label on each referenced pool.
    ///
    /// Returns the number of mutations applied. Re-running the same
    /// resolution applies zero.
    pub async fn resolve(
        &mut self,
        client: &BigIpClient,
        graph: &mut dyn TopologyGraph,
        data_group: &str,
        virtual_server_urn: &Urn,
        host_filter: &str,
        rule_name: &str,
    ) -> Result<usize, CoreError> {
        let Some(group) = self.group(client, data_group).await? else {
            warn!(data_group, rule_name, "data group not found, skipping proxy-pass resolution");
            return Ok(0);
        };

        let mut mutations = 0;
        for record in &group.records {
            if !record.name.starts_with(host_filter) {
                continue;
            }

            let value = record.data.as_deref().unwrap_or_default();
            let tokens: Vec<&str> = value.split_whitespace().collect();
            let &[serverside, pool] = tokens.as_slice() else {
                warn!(
                    data_group,
                    key = %record.name,
                    value,
                    "record value is not '<serverside> <pool>', skipping"
                );
                continue;
            };

            let pool_path = normalize_pool_path(pool, &group.partition);

            // The serverside node is named by the descriptor's first
            // path segment; the rest addresses a location inside it.
            let server_name = serverside.split('/').next().unwrap_or(serverside);
            let server_urn = Urn::component(URN_DOMAIN, "virtual-server", server_name);
            if graph.ensure_component(Component::new(
                server_urn.clone(),
                "virtual-server",
                server_name,
            )) {
                debug!(%server_urn, "synthesized serverside virtual server");
                mutations += 1;
            }

            let pool_urn = Urn::component(URN_DOMAIN, "pool", &pool_path);
            if !graph.component_exists(&pool_urn) {
                warn!(
                    data_group,
                    pool = %pool_path,
                    "referenced pool was never discovered, skipping edges"
                );
                continue;
            }

            if let Some(component) = graph.get_component_mut(&pool_urn) {
                component.labels.insert(rule_name.to_owned());
            }

            if graph.ensure_relation(&pool_urn, &server_urn) {
                mutations += 1;
            }

            if graph.component_exists(virtual_server_urn) {
                if graph.ensure_relation(virtual_server_urn, &pool_urn) {
                    mutations += 1;
                }
            } else {
                warn!(
                    %virtual_server_urn,
                    pool = %pool_path,
                    "originating virtual server missing from graph, skipping its pool edge"
                );
            }
        }
        Ok(mutations)
    }

    async fn group(
        &mut self,
        client: &BigIpClient,
        name: &str,
    ) -> Result<Option<DataGroup>, CoreError> {
        if !self.loaded {
            let groups = client.get_data_group_internal().await?;
            debug!(count = groups.len(), "caching data groups for the session");
            for group in groups {
                self.groups.populate(group.name.clone(), Some(group));
            }
            self.loaded = true;
        }
        if !self.groups.is_populated(name) {
            self.groups.populate(name, None);
        }
        Ok(self.groups.lookup(name).and_then(Clone::clone))
    }
}

/// Absolute appliance path for a pool: records under a non-default
/// partition reference their pools relative to it.
fn normalize_pool_path(pool: &str, partition: &str) -> String {
    if pool.starts_with('/') {
        pool.to_owned()
    } else if partition == "Common" {
        format!("/Common/{pool}")
    } else {
        format!("/{partition}/{pool}")
    }
}

// iRule switch-statement routing extraction.
//
// Recovers `(uri_pattern, host_override, pool)` routing intents from a
// rule body without executing it: no expression evaluation, no variable
// semantics, only enough structural recognition of the switch statement
// keyed on the request path. The scanner is an explicit three-phase
// pipeline (noise filter, block assembler, field extractor) so each phase
// is independently testable.

use tracing::debug;

use bigip_api::BigIpClient;

use crate::cache::SessionCache;
use crate::error::CoreError;

/// One routing intent extracted from a switch case, in source order.
///
/// Order matters: the first matching case wins at runtime on the
/// appliance, so the extractor preserves source order and never
/// deduplicates (duplicate `default` blocks are legal). Blocks in a
/// `default` arm carry `"default"` as their pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterRule {
    pub uri_pattern: String,
    pub host_override: Option<String>,
    pub pool: String,
}

/// Pool-selection directive inside a case body.
const POOL_PREFIX: &str = "pool ";
/// Host-rewrite directive inside a case body.
const HOST_REWRITE_PREFIX: &str = "HTTP::header replace Host ";

/// Line prefixes carrying no routing information. Conditionals,
/// switch/when headers, URI inspection, redirects, persistence, and
/// variable assignments would otherwise confuse block boundary
/// detection.
const NOISE_PREFIXES: &[&str] = &[
    "#",
    "when ",
    "switch",
    "if ",
    "elseif",
    "else",
    "} else",
    "HTTP::uri",
    "[HTTP::uri",
    "HTTP::redirect",
    "persist ",
    "set ",
];

/// Extract the ordered routing intents from a raw rule body.
///
/// Blocks without a `pool` clause are dropped (they carry no routing
/// information); content before the first recognizable case opener is
/// `MalformedRule`, except a bare `}` left behind when the noise filter
/// flattens a nested conditional block.
pub fn extract_router_rules(text: &str) -> Result<Vec<RouterRule>, CoreError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !is_noise(line))
        .collect();

    let blocks = assemble_blocks(&lines)?;

    let mut rules = Vec::new();
    for block in &blocks {
        if let Some(rule) = extract_fields(block) {
            rules.push(rule);
        }
    }
    Ok(rules)
}

// ── Phase 1: noise filter ────────────────────────────────────────────

fn is_noise(line: &str) -> bool {
    line.is_empty() || NOISE_PREFIXES.iter().any(|p| line.starts_with(p))
}

// ── Phase 2: block assembler ─────────────────────────────────────────

/// Group filtered lines into raw case blocks, source order preserved.
///
/// A block runs from its opener to the next opener; a one-line closed
/// block (`"pattern" { body }` or `default { body }`) is exploded into
/// opener plus `;`-separated body statements in place.
fn assemble_blocks(lines: &[&str]) -> Result<Vec<Vec<String>>, CoreError> {
    let mut blocks: Vec<Vec<String>> = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for &line in lines {
        if is_closed_block(line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            blocks.push(explode_closed_block(line));
        } else if is_block_opener(line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(vec![line.to_owned()]);
        } else if let Some(block) = current.as_mut() {
            block.push(line.to_owned());
        } else if line == "}" {
            // Artifact of a nested block flattened by the noise filter.
        } else {
            return Err(CoreError::MalformedRule {
                line: line.to_owned(),
            });
        }
    }
    if let Some(block) = current.take() {
        blocks.push(block);
    }
    Ok(blocks)
}

fn starts_case(line: &str) -> bool {
    line.starts_with('"') || line.starts_with("default")
}

fn is_closed_block(line: &str) -> bool {
    starts_case(line) && line.contains('{') && line.ends_with('}')
}

fn is_block_opener(line: &str) -> bool {
    starts_case(line) && line.contains('{')
}

fn explode_closed_block(line: &str) -> Vec<String> {
    let mut block = vec![line.to_owned()];
    if let (Some(open), Some(close)) = (line.find('{'), line.rfind('}')) {
        if open < close {
            for statement in line[open + 1..close].split(';') {
                let statement = statement.trim();
                if !statement.is_empty() {
                    block.push(statement.to_owned());
                }
            }
        }
    }
    block
}

// ── Phase 3: field extractor ─────────────────────────────────────────

/// Pull the routing fields out of one assembled block.
///
/// Emits a rule only when a pool clause is present; pure default/no-op
/// blocks yield `None` and are dropped, not emitted with an empty pool.
fn extract_fields(block: &[String]) -> Option<RouterRule> {
    let (opener, body) = block.split_first()?;
    let uri_pattern = pattern_token(opener)?;

    let mut host_override = None;
    let mut pool = None;
    for line in body {
        if let Some(rest) = line.strip_prefix(HOST_REWRITE_PREFIX) {
            host_override = Some(rest.trim().trim_matches('"').to_owned());
        } else if let Some(rest) = line.strip_prefix(POOL_PREFIX) {
            pool = Some(rest.trim().trim_matches('"').to_owned());
        }
    }

    pool.map(|pool| RouterRule {
        uri_pattern,
        host_override,
        pool,
    })
}

fn pattern_token(opener: &str) -> Option<String> {
    if let Some(rest) = opener.strip_prefix('"') {
        rest.split('"').next().map(str::to_owned)
    } else if opener.starts_with("default") {
        Some("default".to_owned())
    } else {
        None
    }
}

// ── Rule-body cache ──────────────────────────────────────────────────

/// Fetch-once-per-session memo of rule bodies, keyed by rule name.
///
/// The full rule listing is pulled on first access and indexed; absent
/// names are cached as misses so stale references cost one fetch total.
#[derive(Debug, Default)]
pub struct RuleBodies {
    cache: SessionCache<String>,
    loaded: bool,
}

impl RuleBodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw body of the named rule, or `None` if the appliance has no
    /// such rule (or hides its body, as it does for system rules).
    pub async fn body(
        &mut self,
        client: &BigIpClient,
        name: &str,
    ) -> Result<Option<String>, CoreError> {
        if !self.loaded {
            let rules = client.get_rules().await?;
            debug!(count = rules.len(), "caching rule bodies for the session");
            for rule in rules {
                if let Some(body) = rule.api_anonymous {
                    self.cache.populate(rule.name, Some(body));
                }
            }
            self.loaded = true;
        }
        if !self.cache.is_populated(name) {
            self.cache.populate(name, None);
        }
        Ok(self.cache.lookup(name).and_then(Clone::clone))
    }

    /// Fetch the named rule's body and extract its routing intents.
    pub async fn router_rules(
        &mut self,
        client: &BigIpClient,
        name: &str,
    ) -> Result<Option<Vec<RouterRule>>, CoreError> {
        match self.body(client, name).await? {
            Some(body) => Ok(Some(extract_router_rules(&body)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rule(pattern: &str, host: Option<&str>, pool: &str) -> RouterRule {
        RouterRule {
            uri_pattern: pattern.to_owned(),
            host_override: host.map(str::to_owned),
            pool: pool.to_owned(),
        }
    }

    #[test]
    fn extracts_one_line_cases_and_multi_line_default_in_source_order() {
        let text = r#"
when HTTP_REQUEST {
  switch -glob [string tolower [HTTP::uri]] {
    "/app*" { HTTP::header replace Host "app.internal" ; pool app_pool }
    "/api*" { pool api_pool }
    "/static*" { pool static_pool }
    default {
      HTTP::header replace Host "www.internal"
      pool fallback_pool
    }
  }
}
"#;

        let rules = extract_router_rules(text).unwrap();
        assert_eq!(
            rules,
            vec![
                rule("/app*", Some("app.internal"), "app_pool"),
                rule("/api*", None, "api_pool"),
                rule("/static*", None, "static_pool"),
                rule("default", Some("www.internal"), "fallback_pool"),
            ]
        );
    }

    #[test]
    fn pool_less_blocks_are_dropped_not_emitted_empty() {
        let text = r#"
switch [HTTP::uri] {
  "/health" { HTTP::redirect "https://status.example.com/" }
  "/app*" { pool app_pool }
  default {
    HTTP::redirect "https://www.example.com/"
  }
}
"#;

        let rules = extract_router_rules(text).unwrap();
        assert_eq!(rules, vec![rule("/app*", None, "app_pool")]);
    }

    #[test]
    fn duplicate_defaults_are_kept_in_order() {
        // Later duplicate defaults are legal in the source language; the
        // first one with a pool wins at runtime, so order must survive.
        let text = r#"
switch [HTTP::uri] {
  default { pool first_pool }
  "/x*" { pool x_pool }
  default { pool second_pool }
}
"#;

        let rules = extract_router_rules(text).unwrap();
        assert_eq!(
            rules,
            vec![
                rule("default", None, "first_pool"),
                rule("/x*", None, "x_pool"),
                rule("default", None, "second_pool"),
            ]
        );
    }

    #[test]
    fn multi_line_case_collects_host_and_pool() {
        let text = r#"
switch -glob [HTTP::uri] {
  "/legacy/*" {
    HTTP::header replace Host "legacy.internal.example.com"
    pool legacy_pool
  }
}
"#;

        let rules = extract_router_rules(text).unwrap();
        assert_eq!(
            rules,
            vec![rule(
                "/legacy/*",
                Some("legacy.internal.example.com"),
                "legacy_pool"
            )]
        );
    }

    #[test]
    fn content_before_first_opener_is_malformed() {
        let text = "pool orphan_pool\n\"/x*\" { pool x_pool }\n";

        match extract_router_rules(text) {
            Err(CoreError::MalformedRule { line }) => assert_eq!(line, "pool orphan_pool"),
            other => panic!("expected MalformedRule, got: {other:?}"),
        }
    }

    #[test]
    fn leading_bare_brace_is_tolerated() {
        // A nested conditional inside a case leaves a dangling `}` once
        // the noise filter strips its opener.
        let text = r#"
}
"/app*" { pool app_pool }
"#;

        let rules = extract_router_rules(text).unwrap();
        assert_eq!(rules, vec![rule("/app*", None, "app_pool")]);
    }

    #[test]
    fn noise_lines_never_become_blocks() {
        let text = r#"
when HTTP_REQUEST {
  set host [HTTP::host]
  if { [HTTP::uri] starts_with "/private" } {
    HTTP::redirect "https://login.example.com/"
  }
  persist source_addr
  switch [HTTP::uri] {
    "/app*" { pool app_pool }
  }
}
"#;

        let rules = extract_router_rules(text).unwrap();
        assert_eq!(rules, vec![rule("/app*", None, "app_pool")]);
    }

    #[test]
    fn empty_input_extracts_nothing() {
        assert_eq!(extract_router_rules("").unwrap(), vec![]);
        assert_eq!(extract_router_rules("# comment only\n").unwrap(), vec![]);
    }
}

//! Category taxonomy flattening

use crate::model::CategoryNode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One node of the raw taxonomy as published by the site
#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub no: Option<String>,
    #[serde(default)]
    pub des: Option<String>,
    #[serde(default)]
    pub n: Vec<RawCategory>,
}

/// Flattens a taxonomy tree into nodes sorted by code
///
/// Walks depth-first, recording each node's parent code and name. Nodes
/// without a code are not emitted; their children are still visited with an
/// absent parent.
pub fn flatten_categories(
    roots: &[RawCategory],
    source: &str,
    stamped_at: DateTime<Utc>,
) -> Vec<CategoryNode> {
    let mut out = Vec::new();
    flatten_into(roots, None, source, stamped_at, &mut out);
    out.sort_by(|a, b| a.code.cmp(&b.code));
    out
}

fn flatten_into(
    nodes: &[RawCategory],
    parent: Option<(&str, &str)>,
    source: &str,
    stamped_at: DateTime<Utc>,
    out: &mut Vec<CategoryNode>,
) {
    for node in nodes {
        let code = node.no.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let name = node.des.as_deref().unwrap_or("");

        if let Some(code) = code {
            out.push(CategoryNode {
                code: code.to_string(),
                name: name.to_string(),
                parent_code: parent.map(|(c, _)| c.to_string()),
                parent_name: parent.map(|(_, n)| n.to_string()),
                source: source.to_string(),
                created_at: stamped_at,
                updated_at: stamped_at,
            });
        }

        if !node.n.is_empty() {
            flatten_into(&node.n, code.map(|c| (c, name)), source, stamped_at, out);
        }
    }
}

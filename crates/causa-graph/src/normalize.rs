//! Identifier normalization.
//!
//! Graph exports escape hierarchical names so they are valid Graphviz IDs:
//!
//! - nodes: `n___sensing__lidar__top__velodyne_node`
//! - topics: `topic_3A__sensing__lidar__top__velodyne_packets`
//!
//! A doubled underscore encodes the path separator and `_3A_` encodes `:`.
//! Live introspection already returns native names (`/sensing/lidar/...`),
//! so those only need a kind tag.
//!
//! Normalization never fails: identifiers matching no scheme become
//! [`EntityKind::Unknown`] with the raw string as their path.

use crate::{EntityId, EntityKind};

/// Prefix marking an escaped node identifier.
pub const NODE_PREFIX: &str = "n___";

/// Prefix marking an escaped topic identifier.
pub const TOPIC_PREFIX: &str = "topic_3A__";

/// Encoded form of the `/` path separator.
pub const ENCODED_SEPARATOR: &str = "__";

/// Encoded form of `:`.
pub const ENCODED_COLON: &str = "_3A_";

/// Normalize an escaped identifier from a static export.
///
/// A raw name starting with `/` is taken as a direct topic name.
pub fn normalize(raw: &str) -> EntityId {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix(NODE_PREFIX).filter(|r| !r.is_empty()) {
        return EntityId::node(unescape(rest));
    }
    if let Some(rest) = raw.strip_prefix(TOPIC_PREFIX).filter(|r| !r.is_empty()) {
        return EntityId::topic(unescape(rest));
    }
    if let Some(rest) = raw.strip_prefix('/').filter(|r| !r.is_empty()) {
        return EntityId::topic(rest);
    }
    log::debug!("unrecognised identifier '{raw}', classifying as unknown");
    EntityId::unknown(raw)
}

/// Tag a native name from live introspection with its kind.
pub fn normalize_live(kind: EntityKind, name: &str) -> EntityId {
    let name = name.trim();
    match kind {
        EntityKind::Node | EntityKind::Topic => EntityId::new(kind, name.trim_start_matches('/')),
        EntityKind::Unknown => EntityId::unknown(name),
    }
}

/// Re-encode an id into its static-export form.
///
/// Inverse of [`normalize`] for paths whose segments do not begin or end
/// with `_` and contain no doubled underscores.
pub fn encode(id: &EntityId) -> String {
    match id.kind {
        EntityKind::Node => format!("{NODE_PREFIX}{}", escape(&id.path)),
        EntityKind::Topic => format!("{TOPIC_PREFIX}{}", escape(&id.path)),
        EntityKind::Unknown => id.path.clone(),
    }
}

fn unescape(escaped: &str) -> String {
    // Colon first: `_3A_` may sit directly against a separator.
    escaped
        .replace(ENCODED_COLON, ":")
        .replace(ENCODED_SEPARATOR, "/")
}

fn escape(path: &str) -> String {
    path.replace(':', ENCODED_COLON).replace('/', ENCODED_SEPARATOR)
}

// ============================================================================
// Tests
// ============================================================================

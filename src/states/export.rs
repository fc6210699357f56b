//! Snapshot encoding and Graphviz rendering.

use crate::error::{Result, StatesError};
use crate::types::SnapshotEncoding;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use super::types::{KnownState, StateChange, StatesSnapshot};

/// Node id for the unset from-state. No recorded state can use it, since
/// the empty token is the unset sentinel.
const START_NODE: &str = "";

pub(super) fn encode_snapshot(
    snapshot: &StatesSnapshot,
    encoding: SnapshotEncoding,
) -> Result<Vec<u8>> {
    match encoding {
        SnapshotEncoding::Json => Ok(serde_json::to_vec_pretty(snapshot)?),
        SnapshotEncoding::MessagePack => Ok(rmp_serde::to_vec_named(snapshot)?),
    }
}

pub(super) fn decode_snapshot(bytes: &[u8], encoding: SnapshotEncoding) -> Result<StatesSnapshot> {
    match encoding {
        SnapshotEncoding::Json => serde_json::from_slice(bytes)
            .map_err(|e| StatesError::Deserialization(e.to_string())),
        SnapshotEncoding::MessagePack => Ok(rmp_serde::from_slice(bytes)?),
    }
}

/// Render a digraph with one node per known or observed state and one edge
/// per distinct `from -> to` pair, labelled with how often it was seen.
pub(super) fn render_dot(name: &str, changes: &[StateChange]) -> String {
    let mut edges: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    let mut extra_nodes: BTreeSet<&str> = BTreeSet::new();

    for change in changes {
        let from = change.from.as_str();
        *edges.entry((from, change.to.as_str())).or_default() += 1;

        for state in [from, change.to.as_str()] {
            if state != START_NODE && KnownState::parse(state).is_none() {
                extra_nodes.insert(state);
            }
        }
    }

    let mut dot = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(dot, "digraph \"{}\" {{", escape(name));
    for state in KnownState::ALL {
        let _ = writeln!(dot, "  \"{0}\" [label=\"{0}\"];", state.as_str());
    }
    for state in extra_nodes {
        let _ = writeln!(dot, "  \"{0}\" [label=\"{0}\", style=dashed];", escape(state));
    }
    if edges.keys().any(|(from, _)| *from == START_NODE) {
        let _ = writeln!(dot, "  \"{0}\" [shape=point, label=\"\"];", START_NODE);
    }
    for ((from, to), count) in edges {
        let _ = writeln!(
            dot,
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            escape(from),
            escape(to),
            count
        );
    }
    dot.push_str("}\n");
    dot
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

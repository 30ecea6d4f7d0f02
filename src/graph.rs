use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{Result, bail};

use crate::host::{NodeId, NodeTree};

/// Kahn ordering of a node tree's nodes along its links.
pub fn topo_sort(tree: &NodeTree) -> Result<Vec<NodeId>> {
    let mut indeg: HashMap<NodeId, usize> =
        tree.nodes.iter().map(|(key, _)| (NodeId(key), 0usize)).collect();

    let mut outgoing: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for l in &tree.links {
        if !indeg.contains_key(&l.from_node) || !indeg.contains_key(&l.to_node) {
            bail!(
                "'{}': link references missing node: {} -> {}",
                tree.name,
                l.from_node.0,
                l.to_node.0
            );
        }
        *indeg.entry(l.to_node).or_default() += 1;
        outgoing.entry(l.from_node).or_default().push(l.to_node);
    }

    let mut starts: Vec<NodeId> = indeg
        .iter()
        .filter_map(|(id, d)| if *d == 0 { Some(*id) } else { None })
        .collect();
    starts.sort();
    let mut q: VecDeque<NodeId> = starts.into();
    let mut order = Vec::with_capacity(tree.nodes.len());

    while let Some(n) = q.pop_front() {
        order.push(n);
        if let Some(nexts) = outgoing.get(&n) {
            for m in nexts {
                let entry = indeg.entry(*m).or_default();
                *entry -= 1;
                if *entry == 0 {
                    q.push_back(*m);
                }
            }
        }
    }

    if order.len() != tree.nodes.len() {
        bail!("'{}': node graph has a cycle", tree.name);
    }
    Ok(order)
}

/// Every node that feeds `start`, directly or transitively (including `start`).
pub fn upstream_reachable(tree: &NodeTree, start: NodeId) -> HashSet<NodeId> {
    let mut incoming: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for l in &tree.links {
        incoming.entry(l.to_node).or_default().push(l.from_node);
    }

    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        if let Some(froms) = incoming.get(&n) {
            stack.extend(froms.iter().copied());
        }
    }
    seen
}

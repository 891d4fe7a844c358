use std::collections::{HashSet, VecDeque};

use crate::graph::{Graph, NodeId};

/// Result of subgraph extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgraphResult {
    /// Size of the bounded BFS node set the edges were drawn from.
    pub node_count: usize,
    /// `(origin, destination)` for every edge leaving that node set.
    pub edges: Vec<(NodeId, NodeId)>,
}

/// Degree information for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeResult {
    pub node_id: NodeId,
    pub out_degree: usize,
    pub in_degree: usize,
}

/// BFS neighborhood: every node reachable from `start` within `max_depth`
/// hops, paired with its hop distance.
///
/// Output is in discovery order: distance ascending, and within a level in
/// the order parents enumerated their edges. The start node comes first at
/// distance 0. Unknown start yields an empty result.
pub fn bfs_neighborhood(graph: &Graph, start: NodeId, max_depth: u32) -> Vec<(NodeId, u32)> {
    if !graph.contains(start) {
        return Vec::new();
    }

    // Sized by what is reached, not by node_count.
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();
    let mut order = Vec::new();

    visited.insert(start);
    queue.push_back((start, 0));

    while let Some((current, depth)) = queue.pop_front() {
        order.push((current, depth));
        if depth >= max_depth {
            continue;
        }

        for &next in graph.neighbors_out(current) {
            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }

    order
}

/// Pre-order DFS from `start`, visiting each reachable node once.
///
/// Children are entered in adjacency order. Uses an explicit stack of
/// `(node, next_edge_index)` frames, so long chains cannot overflow the call
/// stack.
pub fn dfs_preorder(graph: &Graph, start: NodeId) -> Vec<NodeId> {
    if !graph.contains(start) {
        return Vec::new();
    }

    let mut visited = vec![false; graph.node_count()];
    let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
    let mut order = vec![start];
    visited[start as usize] = true;

    while let Some((node, next_edge)) = stack.last_mut() {
        let neighbors = graph.neighbors_out(*node);

        match neighbors[*next_edge..]
            .iter()
            .position(|&n| !visited[n as usize])
        {
            Some(skip) => {
                let child = neighbors[*next_edge + skip];
                *next_edge += skip + 1;
                visited[child as usize] = true;
                order.push(child);
                stack.push((child, 0));
            }
            None => {
                stack.pop();
            }
        }
    }

    order
}

/// Extract the edges leaving the node set reachable from `start` within
/// `max_depth` hops.
///
/// Phase 1: bounded BFS to discover the node set.
/// Phase 2: for each discovered node, in discovery order, emit all of its
/// outgoing edges in adjacency order. The destination need not be in the set.
pub fn extract_subgraph(graph: &Graph, start: NodeId, max_depth: u32) -> SubgraphResult {
    let reached = bfs_neighborhood(graph, start, max_depth);

    let edge_total: usize = reached
        .iter()
        .map(|&(n, _)| graph.neighbors_out(n).len())
        .sum();
    let mut edges = Vec::with_capacity(edge_total);
    for &(origin, _) in &reached {
        edges.extend(graph.neighbors_out(origin).iter().map(|&to| (origin, to)));
    }

    SubgraphResult {
        node_count: reached.len(),
        edges,
    }
}

/// The node with the largest out-degree. Ties go to the smallest id.
/// None on an empty graph.
pub fn max_degree_node(graph: &Graph) -> Option<DegreeResult> {
    let mut best: Option<(NodeId, usize)> = None;
    for id in node_ids(graph) {
        let degree = graph.neighbors_out(id).len();
        if best.map_or(true, |(_, d)| degree > d) {
            best = Some((id, degree));
        }
    }
    best.map(|(id, _)| degree_of(graph, id))
}

/// Return nodes ranked by out-degree.
///
/// If `top_n` is 0, returns all nodes. Otherwise returns the top N by
/// out-degree (descending). Ties are broken by node ID (ascending).
pub fn degree_centrality(graph: &Graph, top_n: usize) -> Vec<DegreeResult> {
    let mut results: Vec<DegreeResult> = node_ids(graph)
        .map(|id| degree_of(graph, id))
        .collect();

    results.sort_by(|a, b| {
        b.out_degree
            .cmp(&a.out_degree)
            .then(a.node_id.cmp(&b.node_id))
    });

    if top_n > 0 && top_n < results.len() {
        results.truncate(top_n);
    }

    results
}

fn node_ids(graph: &Graph) -> impl Iterator<Item = NodeId> {
    (0..graph.node_count()).map(|i| i as NodeId)
}

fn degree_of(graph: &Graph, id: NodeId) -> DegreeResult {
    DegreeResult {
        node_id: id,
        out_degree: graph.neighbors_out(id).len(),
        in_degree: graph.in_degree(id).unwrap_or(0),
    }
}

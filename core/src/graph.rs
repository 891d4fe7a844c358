use std::mem::size_of;

/// Node identifier. Ids are dense: a graph with `node_count` nodes holds
/// exactly the ids `0..node_count`.
pub type NodeId = u32;

/// Per-entry storage constants used by the memory estimate.
pub const OFFSET_BYTES: u64 = size_of::<u64>() as u64;
pub const TARGET_BYTES: u64 = size_of::<NodeId>() as u64;
pub const IN_DEGREE_BYTES: u64 = size_of::<u32>() as u64;

/// Immutable directed graph in compressed sparse row form.
///
/// `targets[offsets[n]..offsets[n + 1]]` are the destinations of node `n`'s
/// outgoing edges, in the order they were added. Parallel edges and
/// self-loops are kept as-is.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    offsets: Vec<u64>,
    targets: Vec<NodeId>,
    in_degrees: Vec<u32>,
}

impl Graph {
    /// An empty graph: no nodes, no edges, no allocation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.in_degrees.len()
    }

    pub fn edge_count(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_degrees.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        (id as usize) < self.node_count()
    }

    /// Outgoing edge targets for a node. Empty for ids outside the graph.
    pub fn neighbors_out(&self, id: NodeId) -> &[NodeId] {
        if !self.contains(id) {
            return &[];
        }
        let i = id as usize;
        &self.targets[self.offsets[i] as usize..self.offsets[i + 1] as usize]
    }

    pub fn out_degree(&self, id: NodeId) -> Option<usize> {
        self.contains(id).then(|| self.neighbors_out(id).len())
    }

    pub fn in_degree(&self, id: NodeId) -> Option<usize> {
        self.in_degrees.get(id as usize).map(|&d| d as usize)
    }

    /// Iterate `(origin, target)` pairs for every edge, origins ascending.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        (0..self.node_count())
            .map(|i| i as NodeId)
            .flat_map(move |n| self.neighbors_out(n).iter().map(move |&t| (n, t)))
    }

    /// Estimated footprint of the CSR arrays in bytes.
    pub fn memory_usage(&self) -> u64 {
        estimate_bytes(self.node_count(), self.edge_count())
    }
}

/// Closed-form footprint for a graph with the given counts:
/// `8 * (nodes + 1) + 4 * edges + 4 * nodes`, or 0 for an empty graph.
pub fn estimate_bytes(node_count: usize, edge_count: usize) -> u64 {
    if node_count == 0 {
        return 0;
    }
    let nodes = node_count as u64;
    (nodes + 1) * OFFSET_BYTES + edge_count as u64 * TARGET_BYTES + nodes * IN_DEGREE_BYTES
}

/// Stages edges, then builds a [`Graph`] in one allocation per array.
///
/// The node count is the running maximum id seen plus one, so an edge
/// mentioning id `k` brings nodes `0..=k` into existence.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    edges: Vec<(NodeId, NodeId)>,
    max_id: Option<NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(edge_count: usize) -> Self {
        Self {
            edges: Vec::with_capacity(edge_count),
            max_id: None,
        }
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let hi = from.max(to);
        self.max_id = Some(self.max_id.map_or(hi, |m| m.max(hi)));
        self.edges.push((from, to));
    }

    /// Node count the built graph will have.
    pub fn node_count(&self) -> usize {
        self.max_id.map_or(0, |m| m as usize + 1)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Footprint of the graph `build()` would produce.
    pub fn estimated_bytes(&self) -> u64 {
        estimate_bytes(self.node_count(), self.edge_count())
    }

    /// Counting pass sizes each row, fill pass places targets. Row order is
    /// the order edges were added.
    pub fn build(self) -> Graph {
        let node_count = self.node_count();
        if node_count == 0 {
            return Graph::new();
        }

        let mut offsets = vec![0u64; node_count + 1];
        let mut in_degrees = vec![0u32; node_count];
        for &(from, to) in &self.edges {
            offsets[from as usize + 1] += 1;
            in_degrees[to as usize] += 1;
        }
        for i in 1..=node_count {
            offsets[i] += offsets[i - 1];
        }

        let mut cursor: Vec<u64> = offsets[..node_count].to_vec();
        let mut targets: Vec<NodeId> = vec![0; self.edges.len()];
        for &(from, to) in &self.edges {
            let slot = &mut cursor[from as usize];
            targets[*slot as usize] = to;
            *slot += 1;
        }

        Graph {
            offsets,
            targets,
            in_degrees,
        }
    }
}

impl FromIterator<(NodeId, NodeId)> for Graph {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeId)>>(iter: I) -> Self {
        let mut builder = GraphBuilder::new();
        for (from, to) in iter {
            builder.add_edge(from, to);
        }
        builder.build()
    }
}

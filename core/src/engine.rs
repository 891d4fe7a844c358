use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{ConfigError, LoadError};
use crate::graph::{Graph, NodeId};
use crate::load::{load_edge_list, LoadReport};
use crate::traversal;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Snapshot of the loaded graph, as reported by [`SparseGraphEngine::statistics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub memory_mb: f64,
    pub load_duration_seconds: f64,
}

impl GraphStatistics {
    /// Flat key/value view with stable keys.
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("num_nodes", self.num_nodes as f64),
            ("num_edges", self.num_edges as f64),
            ("memory_mb", self.memory_mb),
            ("load_duration_seconds", self.load_duration_seconds),
        ])
    }
}

/// Owns one sparse graph and answers queries over it.
///
/// Starts empty. `load` builds a complete new graph and swaps it in; on any
/// failure the current graph stays. Queries never fail: invalid node ids get
/// a per-operation sentinel (`-1` for degrees, empty for sequences).
///
/// Not internally synchronized. `load` takes `&mut self`, so sharing an
/// engine between threads needs an outer lock such as `Mutex` or `RwLock`.
#[derive(Debug, Default)]
pub struct SparseGraphEngine {
    graph: Graph,
    config: EngineConfig,
    source: Option<PathBuf>,
    load_duration: Duration,
}

impl SparseGraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Load an edge-list file, replacing the current graph.
    ///
    /// Returns false if the file cannot be opened or read (or exceeds the
    /// memory cap); the previous graph is kept in that case.
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        match self.try_load(path) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "edge list load failed, keeping previous graph");
                false
            }
        }
    }

    /// Like [`load`](Self::load), with the failure reason.
    pub fn try_load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
        let path = path.as_ref();
        let (graph, report) = load_edge_list(path, &self.config)?;

        self.graph = graph;
        self.source = Some(path.to_path_buf());
        self.load_duration = report.duration;
        Ok(report)
    }

    /// Path of the most recent successful load.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Seconds spent parsing and building on the last successful load.
    /// 0.0 before any load has succeeded.
    pub fn load_duration_seconds(&self) -> f64 {
        self.load_duration.as_secs_f64()
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Out-degree of `node`, or -1 if `node` is negative or `>= num_nodes()`.
    pub fn degree(&self, node: i64) -> i64 {
        self.node_id(node)
            .and_then(|id| self.graph.out_degree(id))
            .map_or(-1, |d| d as i64)
    }

    /// In-degree of `node`, or -1 if `node` is negative or `>= num_nodes()`.
    pub fn in_degree(&self, node: i64) -> i64 {
        self.node_id(node)
            .and_then(|id| self.graph.in_degree(id))
            .map_or(-1, |d| d as i64)
    }

    /// Outgoing neighbors of `node` in load order. Empty for invalid ids.
    pub fn neighbors(&self, node: i64) -> &[NodeId] {
        self.node_id(node)
            .map(|id| self.graph.neighbors_out(id))
            .unwrap_or_default()
    }

    /// `(node, out_degree)` of the most connected node, lowest id on ties.
    /// `(-1, -1)` when the graph has no nodes.
    pub fn node_with_max_degree(&self) -> (i64, i64) {
        match traversal::max_degree_node(&self.graph) {
            Some(best) => {
                debug!(node = best.node_id, degree = best.out_degree, "max out-degree node");
                (best.node_id as i64, best.out_degree as i64)
            }
            None => (-1, -1),
        }
    }

    /// The `top_n` nodes by out-degree (all nodes if `top_n` is 0).
    pub fn top_degree_nodes(&self, top_n: usize) -> Vec<traversal::DegreeResult> {
        traversal::degree_centrality(&self.graph, top_n)
    }

    /// `(node, distance)` pairs within `max_depth` hops of `start`, in
    /// discovery order. Empty for an invalid start.
    pub fn bfs(&self, start: i64, max_depth: u32) -> Vec<(NodeId, u32)> {
        let Some(start) = self.node_id(start) else {
            return Vec::new();
        };
        let t = Instant::now();
        let result = traversal::bfs_neighborhood(&self.graph, start, max_depth);
        debug!(
            start,
            max_depth,
            found = result.len(),
            elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
            "bfs complete"
        );
        result
    }

    /// Pre-order DFS from `start`. Empty for an invalid start.
    pub fn dfs(&self, start: i64) -> Vec<NodeId> {
        let Some(start) = self.node_id(start) else {
            return Vec::new();
        };
        let t = Instant::now();
        let result = traversal::dfs_preorder(&self.graph, start);
        debug!(
            start,
            visited = result.len(),
            elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
            "dfs complete"
        );
        result
    }

    /// Every edge whose origin is in `bfs(start, max_depth)`.
    pub fn subgraph_edges(&self, start: i64, max_depth: u32) -> Vec<(NodeId, NodeId)> {
        let Some(start) = self.node_id(start) else {
            return Vec::new();
        };
        let result = traversal::extract_subgraph(&self.graph, start, max_depth);
        debug!(
            start,
            max_depth,
            nodes = result.node_count,
            edges = result.edges.len(),
            "subgraph extracted"
        );
        result.edges
    }

    /// Estimated footprint of the adjacency storage. See [`crate::estimate_bytes`].
    pub fn memory_used_bytes(&self) -> u64 {
        self.graph.memory_usage()
    }

    pub fn memory_used_megabytes(&self) -> f64 {
        self.memory_used_bytes() as f64 / BYTES_PER_MB
    }

    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            num_nodes: self.num_nodes(),
            num_edges: self.num_edges(),
            memory_mb: self.memory_used_megabytes(),
            load_duration_seconds: self.load_duration_seconds(),
        }
    }

    fn node_id(&self, node: i64) -> Option<NodeId> {
        NodeId::try_from(node)
            .ok()
            .filter(|&id| self.graph.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn dataset(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn loaded(text: &str) -> SparseGraphEngine {
        let file = dataset(text);
        let mut engine = SparseGraphEngine::new();
        assert!(engine.load(file.path()));
        engine
    }

    fn sample() -> SparseGraphEngine {
        loaded("0 1\n0 2\n1 3\n")
    }

    // A small graph with cycles, parallel edges and a self-loop.
    fn tangled() -> SparseGraphEngine {
        loaded("# tangled\n0 1\n0 4\n1 2\n2 0\n2 3\n3 3\n4 1\n4 1\n5 0\n")
    }

    #[test]
    fn test_fresh_engine_is_empty() {
        let engine = SparseGraphEngine::new();
        assert_eq!(engine.num_nodes(), 0);
        assert_eq!(engine.num_edges(), 0);
        assert_eq!(engine.load_duration_seconds(), 0.0);
        assert_eq!(engine.memory_used_bytes(), 0);
        assert!(engine.source().is_none());
    }

    #[test]
    fn test_sample_scenario() {
        let engine = sample();
        assert_eq!(engine.num_nodes(), 4);
        assert_eq!(engine.num_edges(), 3);
        assert_eq!(engine.degree(0), 2);
        assert_eq!(engine.degree(3), 0);
        assert_eq!(engine.bfs(0, 1), vec![(0, 0), (1, 1), (2, 1)]);
        assert_eq!(engine.bfs(0, 2), vec![(0, 0), (1, 1), (2, 1), (3, 2)]);
        assert_eq!(engine.dfs(0), vec![0, 1, 3, 2]);
        assert_eq!(engine.node_with_max_degree(), (0, 2));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = SparseGraphEngine::new();
        assert!(!engine.load(dir.path().join("does_not_exist.txt")));
        assert_eq!(engine.num_nodes(), 0);
        assert_eq!(engine.num_edges(), 0);
    }

    #[test]
    fn test_failed_load_keeps_previous_graph() {
        let mut engine = sample();
        let before = engine.load_duration_seconds();
        let dir = tempfile::tempdir().unwrap();
        assert!(!engine.load(dir.path().join("missing.txt")));
        assert_eq!(engine.num_nodes(), 4);
        assert_eq!(engine.num_edges(), 3);
        assert_eq!(engine.load_duration_seconds(), before);
        assert_eq!(engine.dfs(0), vec![0, 1, 3, 2]);
    }

    #[test]
    fn test_try_load_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = SparseGraphEngine::new();
        let err = engine.try_load(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn test_memory_cap_rejects_and_keeps_graph() {
        let config = EngineConfig::from_json(r#"{"max_memory_mb": 1}"#).unwrap();
        let mut engine = SparseGraphEngine::with_config(config).unwrap();
        let small = dataset("0 1\n");
        assert!(engine.load(small.path()));

        let large = dataset("0 500000\n");
        let err = engine.try_load(large.path()).unwrap_err();
        assert!(matches!(err, LoadError::MemoryLimit { .. }));
        assert_eq!(engine.num_nodes(), 2);
    }

    #[test]
    fn test_default_engine_has_no_memory_cap() {
        let mut engine = SparseGraphEngine::new();
        assert_eq!(engine.config().memory_limit_bytes(), None);
        // Would exceed a 1 MB cap; the default engine must still accept it
        let wide = dataset("0 500000\n");
        assert!(engine.load(wide.path()));
        assert_eq!(engine.num_nodes(), 500_001);
        assert_eq!(engine.num_edges(), 1);
    }

    #[test]
    fn test_read_failure_keeps_previous_graph() {
        let mut engine = sample();
        let before = engine.load_duration_seconds();
        let dir = tempfile::tempdir().unwrap();
        // A directory opens on Linux but fails on read
        let err = engine.try_load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. } | LoadError::Open { .. }));
        assert_eq!(engine.num_nodes(), 4);
        assert_eq!(engine.num_edges(), 3);
        assert_eq!(engine.bfs(0, 2), vec![(0, 0), (1, 1), (2, 1), (3, 2)]);
        assert_eq!(engine.load_duration_seconds(), before);
        assert_ne!(engine.source(), Some(dir.path()));
    }

    #[test]
    fn test_reload_replaces_graph() {
        let mut engine = sample();
        let next = dataset("5 6\n");
        assert!(engine.load(next.path()));
        assert_eq!(engine.num_nodes(), 7);
        assert_eq!(engine.num_edges(), 1);
        assert_eq!(engine.degree(0), 0);
        assert_eq!(engine.neighbors(5), &[6]);
        assert_eq!(engine.source(), Some(next.path()));
    }

    #[test]
    fn test_empty_file_is_successful_empty_load() {
        let engine = loaded("# nothing here\n\n");
        assert_eq!(engine.num_nodes(), 0);
        assert_eq!(engine.num_edges(), 0);
        assert_eq!(engine.node_with_max_degree(), (-1, -1));
        assert!(engine.bfs(0, 3).is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let engine = loaded("0 1\ngarbage\n1\n-3 4\n1 2\n");
        assert_eq!(engine.num_edges(), 2);
        assert_eq!(engine.num_nodes(), 3);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = EngineConfig {
            comment_prefix: '7',
            ..EngineConfig::default()
        };
        assert!(SparseGraphEngine::with_config(config).is_err());
    }

    #[test]
    fn test_custom_comment_prefix() {
        let config = EngineConfig::from_json(r#"{"comment_prefix": "%"}"#).unwrap();
        let mut engine = SparseGraphEngine::with_config(config).unwrap();
        let file = dataset("% header\n# not a comment here\n0 1\n");
        let report = engine.try_load(file.path()).unwrap();
        assert_eq!(report.skipped_lines, 1);
        assert_eq!(engine.num_edges(), 1);
    }

    #[test]
    fn test_degree_sentinel() {
        let engine = sample();
        assert_eq!(engine.degree(-1), -1);
        assert_eq!(engine.degree(4), -1);
        assert_eq!(engine.degree(i64::MAX), -1);
        assert_eq!(engine.degree(i64::MIN), -1);
        assert_eq!(engine.in_degree(-1), -1);
        assert_eq!(engine.in_degree(3), 1);
    }

    #[test]
    fn test_neighbors_match_degree() {
        let engine = tangled();
        for node in 0..engine.num_nodes() as i64 {
            assert_eq!(engine.neighbors(node).len() as i64, engine.degree(node));
        }
        assert!(engine.neighbors(-1).is_empty());
        assert!(engine.neighbors(engine.num_nodes() as i64).is_empty());
    }

    #[test]
    fn test_neighbors_keep_duplicates_and_order() {
        let engine = tangled();
        assert_eq!(engine.neighbors(4), &[1, 1]);
        assert_eq!(engine.neighbors(2), &[0, 3]);
    }

    #[test]
    fn test_bfs_depth_zero_every_node() {
        let engine = tangled();
        for node in 0..engine.num_nodes() as i64 {
            assert_eq!(engine.bfs(node, 0), vec![(node as NodeId, 0)]);
        }
    }

    #[test]
    fn test_bfs_invalid_start() {
        let engine = sample();
        assert!(engine.bfs(-1, 2).is_empty());
        assert!(engine.bfs(4, 2).is_empty());
    }

    #[test]
    fn test_bfs_distance_bounds() {
        let engine = tangled();
        for depth in 0..4 {
            let result = engine.bfs(5, depth);
            let distances: Vec<u32> = result.iter().map(|&(_, d)| d).collect();
            assert_eq!(distances.iter().filter(|&&d| d == 0).count(), 1);
            assert_eq!(result[0], (5, 0));
            assert_eq!(distances.iter().min(), Some(&0));
            assert!(distances.iter().all(|&d| d <= depth));
            assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_dfs_properties() {
        let engine = tangled();
        for node in 0..engine.num_nodes() as i64 {
            let order = engine.dfs(node);
            assert_eq!(order[0], node as NodeId);
            let unique: HashSet<_> = order.iter().collect();
            assert_eq!(unique.len(), order.len());
        }
        assert!(engine.dfs(-5).is_empty());
        assert!(engine.dfs(6).is_empty());
    }

    #[test]
    fn test_dfs_tangled_order() {
        let engine = tangled();
        assert_eq!(engine.dfs(5), vec![5, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_subgraph_edges_origins_in_bfs() {
        let engine = tangled();
        for depth in 0..3 {
            let nodes: HashSet<NodeId> = engine.bfs(0, depth).iter().map(|&(n, _)| n).collect();
            let edges = engine.subgraph_edges(0, depth);
            assert!(edges.iter().all(|(o, _)| nodes.contains(o)));
            let expected: usize = nodes.iter().map(|&n| engine.degree(n as i64) as usize).sum();
            assert_eq!(edges.len(), expected);
        }
    }

    #[test]
    fn test_subgraph_edges_sample() {
        let engine = sample();
        assert_eq!(engine.subgraph_edges(0, 1), vec![(0, 1), (0, 2), (1, 3)]);
        assert!(engine.subgraph_edges(-1, 1).is_empty());
    }

    #[test]
    fn test_max_degree_tie_breaks_low_id() {
        let engine = loaded("3 0\n3 1\n1 2\n1 0\n");
        assert_eq!(engine.node_with_max_degree(), (1, 2));
    }

    #[test]
    fn test_top_degree_nodes() {
        let engine = tangled();
        let top = engine.top_degree_nodes(2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].node_id, top[0].out_degree), (0, 2));
        assert_eq!((top[1].node_id, top[1].out_degree), (2, 2));
    }

    #[test]
    fn test_memory_accounting() {
        let engine = sample();
        let bytes = engine.memory_used_bytes();
        assert!(bytes > 0);
        assert_eq!(engine.memory_used_megabytes(), bytes as f64 / (1024.0 * 1024.0));
        assert_eq!(bytes, crate::estimate_bytes(4, 3));
    }

    #[test]
    fn test_memory_grows_with_graph() {
        let small = sample();
        let more_edges = loaded("0 1\n0 2\n1 3\n2 3\n");
        let more_nodes = loaded("0 1\n0 2\n1 4\n");
        assert!(more_edges.memory_used_bytes() > small.memory_used_bytes());
        assert!(more_nodes.memory_used_bytes() > small.memory_used_bytes());
    }

    #[test]
    fn test_statistics() {
        let engine = sample();
        let stats = engine.statistics();
        assert_eq!(stats.num_nodes, engine.num_nodes());
        assert_eq!(stats.num_edges, engine.num_edges());
        assert_eq!(stats.memory_mb, engine.memory_used_megabytes());
        assert!(stats.load_duration_seconds >= 0.0);

        let map = stats.as_map();
        assert_eq!(map["num_nodes"], 4.0);
        assert_eq!(map["num_edges"], 3.0);
        assert!(map.contains_key("memory_mb"));
    }

    #[test]
    fn test_statistics_serialize() {
        let engine = sample();
        let json = serde_json::to_value(engine.statistics()).unwrap();
        assert_eq!(json["num_nodes"], 4);
        assert_eq!(json["num_edges"], 3);
        assert!(json["memory_mb"].is_f64());
    }

    #[test]
    fn test_statistics_empty_engine() {
        let stats = SparseGraphEngine::new().statistics();
        assert_eq!(stats.num_nodes, 0);
        assert_eq!(stats.memory_mb, 0.0);
    }

    #[test]
    fn test_engine_behind_mutex() {
        use std::sync::{Arc, Mutex};

        let file = dataset("0 1\n1 2\n");
        let engine = Arc::new(Mutex::new(SparseGraphEngine::new()));
        let loader = {
            let engine = Arc::clone(&engine);
            let path = file.path().to_path_buf();
            std::thread::spawn(move || {
                let loaded = engine.lock().unwrap().load(path);
                loaded
            })
        };
        assert!(loader.join().unwrap());
        assert_eq!(engine.lock().unwrap().dfs(0), vec![0, 1, 2]);
    }
}

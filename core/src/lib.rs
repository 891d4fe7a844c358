//! sparse-graph-core: In-memory sparse graph engine.
//!
//! Loads a directed graph from a plain `origin destination` edge list into
//! compressed sparse row storage and answers read-only structural queries:
//! degrees, neighbors, most-connected node, bounded BFS, DFS, subgraph edge
//! extraction and memory accounting.
//!
//! [`SparseGraphEngine`] is the entry point. The lower-level [`Graph`] and
//! traversal functions are exported for benchmarking and testing.

mod config;
mod engine;
mod error;
mod graph;
mod load;
mod traversal;

pub use config::{EngineConfig, MAX_MEMORY_MB_CEILING, SUGGESTED_MAX_MEMORY_MB};
pub use engine::{GraphStatistics, SparseGraphEngine};
pub use error::{ConfigError, LoadError};
pub use graph::{
    estimate_bytes, Graph, GraphBuilder, NodeId, IN_DEGREE_BYTES, OFFSET_BYTES, TARGET_BYTES,
};
pub use load::{
    classify_line, load_edge_list, parse_edge_line, read_edge_list, EdgeLine, LoadReport,
    ParsedEdgeList, MAX_NODE_ID,
};
pub use traversal::{
    bfs_neighborhood, degree_centrality, dfs_preorder, extract_subgraph, max_degree_node,
    DegreeResult, SubgraphResult,
};

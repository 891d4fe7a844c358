use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::LoadError;
use crate::graph::{Graph, GraphBuilder, NodeId};

/// Summary of a completed load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub node_count: usize,
    pub edge_count: usize,
    /// Non-blank, non-comment lines that did not parse as an edge.
    pub skipped_lines: usize,
    /// Parse-and-build time.
    pub duration: Duration,
}

/// Largest id a dataset may use. Keeps `node_count` within `NodeId` range.
pub const MAX_NODE_ID: NodeId = NodeId::MAX - 1;

/// What a single dataset line holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLine {
    Edge(NodeId, NodeId),
    /// Blank or comment line.
    Skip,
    Malformed,
}

/// Classify one dataset line.
///
/// An edge needs its first two whitespace-separated tokens to be integers in
/// `0..=MAX_NODE_ID`. Tokens after the second are ignored.
pub fn classify_line(line: &str, comment_prefix: char) -> EdgeLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with(comment_prefix) {
        return EdgeLine::Skip;
    }
    let mut tokens = line.split_whitespace();
    let mut next_id = || {
        tokens
            .next()?
            .parse::<NodeId>()
            .ok()
            .filter(|&id| id <= MAX_NODE_ID)
    };
    match (next_id(), next_id()) {
        (Some(from), Some(to)) => EdgeLine::Edge(from, to),
        _ => EdgeLine::Malformed,
    }
}

/// Parse one dataset line as `origin destination`. None for anything that
/// is not an edge.
pub fn parse_edge_line(line: &str, comment_prefix: char) -> Option<(NodeId, NodeId)> {
    match classify_line(line, comment_prefix) {
        EdgeLine::Edge(from, to) => Some((from, to)),
        EdgeLine::Skip | EdgeLine::Malformed => None,
    }
}

/// Edges parsed from a dataset, not yet laid out.
#[derive(Debug)]
pub struct ParsedEdgeList {
    pub builder: GraphBuilder,
    pub skipped_lines: usize,
}

/// Read an edge list from any buffered source.
///
/// Malformed lines (including invalid UTF-8) are counted and skipped. Only an
/// I/O failure aborts the read.
pub fn read_edge_list<R: BufRead>(
    mut reader: R,
    config: &EngineConfig,
) -> std::io::Result<ParsedEdgeList> {
    let mut builder = GraphBuilder::new();
    let mut skipped_lines = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            skipped_lines += 1;
            continue;
        };
        match classify_line(line, config.comment_prefix) {
            EdgeLine::Edge(from, to) => builder.add_edge(from, to),
            EdgeLine::Skip => {}
            EdgeLine::Malformed => skipped_lines += 1,
        }
    }

    Ok(ParsedEdgeList {
        builder,
        skipped_lines,
    })
}

/// Parse and build a graph from an edge-list file.
///
/// The memory cap in `config` is checked against the final counts before the
/// CSR arrays are allocated. The staged edge list is not part of that check.
pub fn load_edge_list(path: &Path, config: &EngineConfig) -> Result<(Graph, LoadReport), LoadError> {
    let start = Instant::now();

    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = read_edge_list(BufReader::new(file), config).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let estimated_bytes = parsed.builder.estimated_bytes();
    if let Some(limit_bytes) = config.memory_limit_bytes() {
        if estimated_bytes > limit_bytes {
            return Err(LoadError::MemoryLimit {
                estimated_bytes,
                limit_bytes,
            });
        }
    }

    if parsed.skipped_lines > 0 {
        debug!(
            path = %path.display(),
            skipped = parsed.skipped_lines,
            "skipped malformed edge lines"
        );
    }

    let graph = parsed.builder.build();
    let duration = start.elapsed();

    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        memory_mb = graph.memory_usage() as f64 / 1_048_576.0,
        elapsed_ms = duration.as_secs_f64() * 1000.0,
        "edge list loaded"
    );

    let report = LoadReport {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        skipped_lines: parsed.skipped_lines,
        duration,
    };
    Ok((graph, report))
}

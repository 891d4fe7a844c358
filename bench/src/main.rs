use sparse_graph_core::{Graph, GraphBuilder, NodeId, SparseGraphEngine};
use std::time::Instant;
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sparse_graph_core=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");

    if mode == "help" || mode == "--help" {
        println!("Usage: sparse-graph-bench [mode] [node_count]");
        println!("       sparse-graph-bench file <edge_list_path>");
        println!();
        println!("Modes:");
        println!("  all         Run all generators and benchmark each (default)");
        println!("  tree        Branching tree (deep paths)");
        println!("  scalefree   Preferential attachment via edge sampling (hub-and-spoke)");
        println!("  random      Erdos-Renyi uniform random edges");
        println!("  barbell     Two dense clusters connected by a thin bridge");
        println!("  file        Load an edge-list dataset through the engine");
        println!();
        println!("Default node_count: 1000000");
        return;
    }

    println!("sparse-graph-bench");
    println!("==================");
    println!();

    if mode == "file" {
        match args.get(2) {
            Some(path) => run_file(path),
            None => eprintln!("file mode needs a path. Use --help for options."),
        }
        return;
    }

    let node_count: NodeId = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1_000_000);

    let generators: Vec<(&str, fn(NodeId) -> Graph)> = match mode {
        "tree" => vec![("Branching tree", gen_tree)],
        "scalefree" => vec![("Scale-free (edge sampling)", gen_scale_free)],
        "random" => vec![("Erdos-Renyi random", gen_random)],
        "barbell" => vec![("Barbell (cluster-bridge-cluster)", gen_barbell)],
        "all" => vec![
            ("Branching tree", gen_tree as fn(NodeId) -> Graph),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (cluster-bridge-cluster)", gen_barbell),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        println!("--- {} ---", name);
        println!("Target: {} nodes", node_count);
        let t = Instant::now();
        let graph = generate(name, generator, node_count);
        println!(
            "Generated in {:.2}s: {} nodes, {} edges, ~{:.1}MB",
            t.elapsed().as_secs_f64(),
            graph.node_count(),
            graph.edge_count(),
            graph.memory_usage() as f64 / 1_048_576.0
        );
        run_queries(&graph);
    }
}

fn generate(name: &str, generator: fn(NodeId) -> Graph, node_count: NodeId) -> Graph {
    let t = Instant::now();
    let graph = generator(node_count);
    info!(
        generator = name,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
        "graph generated"
    );
    graph
}

fn run_file(path: &str) {
    let mut engine = SparseGraphEngine::new();
    if !engine.load(path) {
        eprintln!("Could not load '{}'", path);
        return;
    }
    println!("Loaded in {:.3}s", engine.load_duration_seconds());
    match serde_json::to_string_pretty(&engine.statistics()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Could not serialize statistics: {}", e),
    }
    run_queries(engine.graph());
}

fn run_queries(graph: &Graph) {
    if graph.is_empty() {
        println!("(empty graph)");
        println!();
        return;
    }

    let t = Instant::now();
    let hub = sparse_graph_core::max_degree_node(graph);
    let elapsed = t.elapsed();
    let start = match hub {
        Some(h) => {
            println!(
                "Max out-degree: node {} (degree {}) in {:.1}ms",
                h.node_id,
                h.out_degree,
                elapsed.as_secs_f64() * 1000.0
            );
            h.node_id
        }
        None => 0,
    };

    println!();
    println!("{:>8} {:>12} {:>12} {:>10}", "depth", "found", "sub-edges", "time");
    println!("{:->8} {:->12} {:->12} {:->10}", "", "", "", "");

    for depth in [1, 2, 3, 5, 10, 20] {
        let t = Instant::now();
        let found = sparse_graph_core::bfs_neighborhood(graph, start, depth);
        let sub = sparse_graph_core::extract_subgraph(graph, start, depth);
        let elapsed = t.elapsed();
        println!(
            "{:>8} {:>12} {:>12} {:>8.1}ms",
            depth,
            found.len(),
            sub.edges.len(),
            elapsed.as_secs_f64() * 1000.0
        );
        if found.len() >= graph.node_count() {
            println!("{:>8} (entire graph reached)", "");
            break;
        }
    }

    println!();
    let t = Instant::now();
    let order = sparse_graph_core::dfs_preorder(graph, start);
    println!(
        "DFS from {}: {} nodes in {:.1}ms",
        start,
        order.len(),
        t.elapsed().as_secs_f64() * 1000.0
    );
    println!();
}

// ---------------------------------------------------------------------------
// Generators: O(n + edges), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
}

/// Each node spawns three children, level by level. Depth grows as log3(n).
fn gen_tree(node_count: NodeId) -> Graph {
    let mut builder = GraphBuilder::with_capacity(node_count as usize);
    let mut next_id: NodeId = 1;
    let mut frontier: Vec<NodeId> = vec![0];

    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * 3);
        for &parent in &frontier {
            for _ in 0..3 {
                if next_id >= node_count {
                    break;
                }
                builder.add_edge(parent, next_id);
                next_frontier.push(next_id);
                next_id += 1;
            }
        }
        frontier = next_frontier;
    }

    builder.build()
}

/// Preferential attachment by sampling an endpoint of a random existing edge,
/// so well-connected nodes attract more edges.
fn gen_scale_free(node_count: NodeId) -> Graph {
    let edges_per_node = 10u64;
    let n = node_count as u64;
    let mut builder = GraphBuilder::with_capacity((n * edges_per_node) as usize);
    let mut rng = FastRng::new(12345);
    let mut endpoints: Vec<NodeId> = Vec::with_capacity((n * edges_per_node * 2) as usize);

    let seed: NodeId = 5.min(node_count);
    for i in 0..seed {
        for j in (i + 1)..seed {
            builder.add_edge(i, j);
            endpoints.extend([i, j]);
        }
    }

    for new_node in seed..node_count {
        let attach = edges_per_node.min(new_node as u64);
        for _ in 0..attach {
            if endpoints.is_empty() {
                break;
            }
            let target = endpoints[rng.next(endpoints.len() as u64) as usize];
            if target != new_node {
                builder.add_edge(new_node, target);
                endpoints.extend([new_node, target]);
            }
        }
    }

    builder.build()
}

/// Roughly ten uniformly random edges per node.
fn gen_random(node_count: NodeId) -> Graph {
    let n = node_count as u64;
    let target_edges = n * 10;
    let mut builder = GraphBuilder::with_capacity(target_edges as usize);
    let mut rng = FastRng::new(54321);

    for _ in 0..target_edges {
        let from = rng.next(n) as NodeId;
        let to = rng.next(n) as NodeId;
        if from != to {
            builder.add_edge(from, to);
        }
    }

    builder.build()
}

/// Two dense clusters joined by a ten-node chain. Every path between the
/// clusters runs through the bridge.
fn gen_barbell(node_count: NodeId) -> Graph {
    let bridge_len: NodeId = 10;
    let cluster = node_count.saturating_sub(bridge_len) / 2;
    if cluster < 2 {
        return gen_tree(node_count);
    }
    let mut builder = GraphBuilder::with_capacity(cluster as usize * 40 + bridge_len as usize + 1);
    let mut rng = FastRng::new(99999);

    let b_start = cluster + bridge_len;
    for base in [0, b_start] {
        for i in 0..cluster {
            for _ in 0..20u32.min(cluster - 1) {
                let target = rng.next(cluster as u64) as NodeId;
                if target != i {
                    builder.add_edge(base + i, base + target);
                }
            }
        }
    }

    // Chain from the last node of cluster A through the bridge into cluster B
    let mut prev = cluster - 1;
    for id in cluster..=b_start {
        builder.add_edge(prev, id);
        prev = id;
    }

    builder.build()
}

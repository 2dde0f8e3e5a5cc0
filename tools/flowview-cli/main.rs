use clap::{Parser, Subcommand};
use flowview::prelude::*;
use serde_json::{Map, Value, json};
use std::fs;
use std::time::Instant;

// --- Fixture Transport ---
// Serves flow records from a recorded backend response, filtering and
// ordering them the way the backend would.

struct FixtureTransport {
    flows: Vec<Value>,
}

impl FixtureTransport {
    fn from_file(path: &str) -> std::result::Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Could not read response file '{}': {}", path, e))?;
        let response: Value = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse response file '{}': {}", path, e))?;

        // Accept either a full response body or a bare list of flow records.
        let flows = match response {
            Value::Array(flows) => flows,
            mut body => match body.pointer_mut("/data/flow").map(Value::take) {
                Some(Value::Array(flows)) => flows,
                _ => return Err(format!("'{}' contains no flow records", path)),
            },
        };
        Ok(Self { flows })
    }
}

impl Transport for FixtureTransport {
    fn execute(&self, query: &QueryDescription) -> std::result::Result<Value, TransportError> {
        let mut flows: Vec<Value> = self
            .flows
            .iter()
            .filter(|flow| query.predicate.matches(flow, &query.variables))
            .cloned()
            .collect();
        if let Some(order) = &query.order_by {
            flows.sort_by(|a, b| order.compare(a, b));
        }
        Ok(json!({ "data": { "flow": flows } }))
    }
}

/// Resolve a stored flow and print its snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a recorded backend response (or a JSON list of flow records)
    #[arg(short, long)]
    response: String,

    /// Print the rendered query document before resolving
    #[arg(long)]
    show_query: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    lookup: Lookup,
}

#[derive(Subcommand, Debug)]
enum Lookup {
    /// Look up a flow by its id
    Id { flow_id: String },
    /// Look up an unarchived flow by name
    Name {
        flow_name: String,
        /// Only search this project
        #[arg(short, long, conflicts_with = "no_project")]
        project: Option<String>,
        /// Only search flows that belong to no project
        #[arg(long)]
        no_project: bool,
        /// Use the most recently updated flow when several match
        #[arg(long)]
        most_recent: bool,
    },
    /// Look up a flow by the structure of a serialized graph file
    Definition {
        graph_path: String,
        /// Allow archived flows to match
        #[arg(long)]
        allow_archived: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let transport =
        FixtureTransport::from_file(&cli.response).unwrap_or_else(|e| exit_with_error(&e));

    if cli.show_query {
        let query = build_query(&cli.lookup)
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid lookup: {}", e)));
        let request = query.to_graphql();
        println!("{}", request.query);
        if !request.variables.is_empty() {
            println!(
                "variables: {}",
                serde_json::to_string_pretty(&request.variables).unwrap_or_default()
            );
        }
        println!();
    }

    let start = Instant::now();
    let view = resolve(&transport, &cli.lookup)
        .unwrap_or_else(|e| exit_with_error(&format!("Lookup failed: {}", e)));
    let duration = start.elapsed();

    print_view(&view);
    println!("\nResolved in {:?}", duration);
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn project_filter(project: &Option<String>, no_project: bool) -> ProjectFilter {
    match (project, no_project) {
        (Some(name), _) => ProjectFilter::named(name.as_str()),
        (None, true) => ProjectFilter::Unassigned,
        (None, false) => ProjectFilter::Any,
    }
}

fn load_graph(path: &str) -> std::result::Result<FlowGraph, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Could not read graph file '{}': {}", path, e))?;
    let raw: Map<String, Value> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse graph file '{}': {}", path, e))?;
    FlowGraph::from_serialized(&raw).map_err(|e| format!("Invalid graph in '{}': {}", path, e))
}

fn build_query(lookup: &Lookup) -> std::result::Result<QueryDescription, String> {
    match lookup {
        Lookup::Id { flow_id } => QueryDescription::by_id(flow_id).map_err(|e| e.to_string()),
        Lookup::Name {
            flow_name,
            project,
            no_project,
            ..
        } => Ok(QueryDescription::by_name(
            flow_name,
            &project_filter(project, *no_project),
        )),
        Lookup::Definition {
            graph_path,
            allow_archived,
        } => {
            let graph = load_graph(graph_path)?;
            QueryDescription::by_definition(&graph, *allow_archived).map_err(|e| e.to_string())
        }
    }
}

fn resolve(transport: &FixtureTransport, lookup: &Lookup) -> std::result::Result<FlowView, String> {
    match lookup {
        Lookup::Id { flow_id } => {
            FlowView::resolve_by_id(transport, flow_id).map_err(|e| e.to_string())
        }
        Lookup::Name {
            flow_name,
            project,
            no_project,
            most_recent,
        } => FlowView::resolve_by_name(
            transport,
            flow_name,
            &project_filter(project, *no_project),
            *most_recent,
        )
        .map_err(|e| e.to_string()),
        Lookup::Definition {
            graph_path,
            allow_archived,
        } => {
            let graph = load_graph(graph_path)?;
            FlowView::resolve_by_definition(transport, &graph, *allow_archived)
                .map_err(|e| e.to_string())
        }
    }
}

fn print_view(view: &FlowView) {
    println!("{}", view);
    let project = view.project_name().unwrap_or("<none>");
    println!("  -> Project:         {}", project);
    println!("  -> Archived:        {}", view.archived());
    println!("  -> Backend version: {}", view.backend_version());
    println!("  -> Storage:         {}", view.storage());
    if let Some(location) = view.storage().flow_location(view.name()) {
        println!("  -> Location:        {}", location);
    }
    let settings = Value::Object(view.settings().clone());
    let run_config = Value::Object(view.run_config().clone());
    println!("  -> Settings:        {}", settings);
    println!("  -> Run config:      {}", run_config);

    let graph = view.graph();
    println!("\n--- Graph '{}' ---", graph.name);
    println!("Nodes: {}  Edges: {}", graph.nodes.len(), graph.edges.len());
    match graph.topological_order() {
        Ok(order) => {
            for node in order {
                let upstream: Vec<&str> = graph
                    .upstream(&node.id)
                    .into_iter()
                    .map(|n| n.id.as_str())
                    .collect();
                if upstream.is_empty() {
                    println!("  {} [{}]", node.id, node.operation_type);
                } else {
                    let sources = upstream.join(", ");
                    println!("  {} [{}] <- {}", node.id, node.operation_type, sources);
                }
            }
        }
        Err(e) => println!("  (graph cannot be ordered: {})", e),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

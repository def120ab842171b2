use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use flowlens::client::ExecutionApi;
use flowlens::client::http::HttpApi;
use flowlens::compiler::core::DagBuilder;
use flowlens::compiler::loader;
use flowlens::config::ClientConfig;
use flowlens::runtime::graph::{Graph, Node};
use flowlens::runtime::inspector::Inspector;
use flowlens::runtime::storage::InMemoryApi;
use flowlens::runtime::summary::node_summary;
use flowlens::runtime::timeline::{bounds, timeline};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inspect workflow executions as graphs", long_about = None)]
struct Cli {
    /// Client config file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server API root, overrides config and environment
    #[arg(long, global = true)]
    server: Option<String>,

    /// Serve data from a fixture file instead of a server
    #[arg(long, global = true)]
    offline: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the execution graph of a workflow run
    Graph {
        execution_id: String,
    },
    /// Print the graph of a workflow definition
    Definition {
        /// Definition file (JSON or YAML)
        #[arg(long, short, conflicts_with = "name")]
        file: Option<PathBuf>,

        /// Definition name on the server
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        version: Option<u32>,
    },
    /// Print the detail rows of one task in an execution
    Summary {
        execution_id: String,
        task_ref: String,
    },
    /// Print the execution timeline
    Timeline {
        execution_id: String,
    },
    /// Print the workflow variables of an execution
    Variables {
        execution_id: String,
    },
    /// Print the workflow input of an execution
    Input {
        execution_id: String,
    },
    /// Print the workflow output of an execution
    Output {
        execution_id: String,
    },
    /// Print one task result (latest attempt unless --task-id is given)
    Task {
        execution_id: String,
        task_ref: String,
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Print the input of one task
    TaskInput {
        execution_id: String,
        task_ref: String,
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Print the output of one task
    TaskOutput {
        execution_id: String,
        task_ref: String,
        #[arg(long)]
        task_id: Option<String>,
    },
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn build_api(cli: &Cli) -> Result<Arc<dyn ExecutionApi>> {
    if let Some(path) = &cli.offline {
        info!("Serving data from fixture: {}", path.display());
        let fixture = loader::load_fixture(path)?;
        return Ok(Arc::new(InMemoryApi::from_fixture(fixture)));
    }
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.server.clone(), None)?;
    info!("Using server: {}", config.base_url);
    Ok(Arc::new(HttpApi::new(&config)?))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_graph(graph: &Graph) {
    if graph.is_empty() {
        println!("(empty graph)");
        return;
    }
    let mut printed = HashSet::new();
    for root in graph.root_nodes() {
        print_node(graph, root, 0, &mut printed);
    }
}

fn print_node<'a>(graph: &'a Graph, node: &'a Node, depth: usize, printed: &mut HashSet<&'a str>) {
    let indent = "  ".repeat(depth);
    let reference = node.reference_name();
    if !printed.insert(reference) {
        println!("{}{} ^", indent, reference);
        return;
    }
    let attempts = node.results().len();
    let marker = if node.is_dynamic() { " [dynamic]" } else { "" };
    println!(
        "{}{} ({}) {}{}{}",
        indent,
        reference,
        node.task_type(),
        node.status_label(),
        if attempts > 1 { format!(" x{}", attempts) } else { String::new() },
        marker,
    );
    for child in graph.children(reference) {
        print_node(graph, child, depth + 1, printed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Graph { execution_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            let (snapshot, graph) = inspector.execution_graph(execution_id).await?;
            println!("{} {} [{}]", snapshot.execution.workflow_name, execution_id, snapshot.execution.status);
            print_graph(&graph);
        }

        Commands::Definition { file, name, version } => {
            let graph = match (file, name) {
                (Some(path), _) => {
                    let def = loader::load_workflow_def(path)?;
                    info!("Loaded definition: {} v{}", def.name, def.version);
                    DagBuilder::from_definition_only(&def)
                }
                (None, Some(name)) => {
                    let inspector = Inspector::new(build_api(&cli)?);
                    inspector.definition_graph(name, *version).await?
                }
                (None, None) => bail!("either --file or --name is required"),
            };
            print_graph(&graph);
        }

        Commands::Summary { execution_id, task_ref } => {
            let inspector = Inspector::new(build_api(&cli)?);
            let (_, graph) = inspector.execution_graph(execution_id).await?;
            let Some(node) = graph.node_for(task_ref) else {
                bail!("task reference {} not found in execution {}", task_ref, execution_id);
            };
            for row in node_summary(node, now_ms()) {
                println!("{:<26}{}", row.label, row.value);
            }
        }

        Commands::Timeline { execution_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            let snapshot = inspector.execution_and_tasks(execution_id).await?;
            let spans = timeline(&snapshot.tasks, now_ms());
            let Some((origin, end)) = bounds(&spans) else {
                println!("(no task has started)");
                return Ok(());
            };
            println!("total {}ms", end - origin);
            for span in spans {
                println!(
                    "+{:>8}ms {:>8}ms{} {:<12} {}",
                    span.start_ms - origin,
                    span.duration_ms(),
                    if span.open { "+" } else { " " },
                    span.status.as_str(),
                    span.reference,
                );
            }
        }

        Commands::Variables { execution_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            print_json(&inspector.api().variables(execution_id).await?)?;
        }

        Commands::Input { execution_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            print_json(&inspector.api().input(execution_id).await?)?;
        }

        Commands::Output { execution_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            print_json(&inspector.api().output(execution_id).await?)?;
        }

        Commands::Task { execution_id, task_ref, task_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            let task = inspector.api().task(execution_id, task_ref, task_id.as_deref()).await?;
            print_json(&task)?;
        }

        Commands::TaskInput { execution_id, task_ref, task_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            let input = inspector.api().task_input(execution_id, task_ref, task_id.as_deref()).await?;
            print_json(&input)?;
        }

        Commands::TaskOutput { execution_id, task_ref, task_id } => {
            let inspector = Inspector::new(build_api(&cli)?);
            let output = inspector.api().task_output(execution_id, task_ref, task_id.as_deref()).await?;
            print_json(&output)?;
        }
    }

    Ok(())
}

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use testdeck::api::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, ScriptUpload};
use testdeck::config::ConfigError;
use testdeck::models::NodeStatus;
use testdeck::{ApiClient, ApiError, ClientConfig, ConnectionStatus, RealtimeClient, RealtimeError, SocketEvent};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Realtime(#[from] RealtimeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no route matches `{0}`")]
    UnknownRoute(String),
    #[error("could not subscribe to task {0}: socket not connected")]
    NotSubscribed(i64),
}

#[derive(Parser, Debug)]
#[command(name = "testdeck", about = "Test management platform API and realtime CLI")]
struct Cli {
    #[arg(long, env = "TESTDECK_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "TESTDECK_SOCKET_URL")]
    socket_url: Option<String>,

    /// Disable realtime reconnection.
    #[arg(long, default_value_t = false)]
    no_reconnect: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the console route table.
    Routes,
    /// Resolve a console path and print the data its screen loads.
    Open { path: String },
    Api(ApiCommand),
    /// Subscribe to a task and print its realtime events as JSON lines.
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApiSubcommand {
    #[command(subcommand)]
    Scripts(ScriptSubcommand),
    #[command(subcommand)]
    Plans(PlanSubcommand),
    #[command(subcommand)]
    PlanExecutions(PlanExecutionSubcommand),
    #[command(subcommand)]
    Nodes(NodeSubcommand),
    #[command(subcommand)]
    Tasks(TaskSubcommand),
    #[command(subcommand)]
    Results(ResultSubcommand),
    #[command(subcommand)]
    Reports(ReportSubcommand),
    #[command(subcommand)]
    ExecutionResults(ExecutionResultSubcommand),
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    size: u32,
}

#[derive(Args, Debug)]
struct ScriptArgs {
    #[arg(long)]
    name: String,
    /// Script file to upload.
    #[arg(long)]
    file: PathBuf,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    parameters: Option<String>,
    #[arg(long, default_value = "PYTHON")]
    script_type: String,
    #[arg(long, default_value_t = 300)]
    timeout: u32,
    #[arg(long, default_value_t = 0)]
    retry_count: u32,
}

#[derive(Subcommand, Debug)]
enum ScriptSubcommand {
    List(PageArgs),
    Get { id: i64 },
    Create(ScriptArgs),
    Update {
        id: i64,
        #[command(flatten)]
        script: ScriptArgs,
    },
    Delete { id: i64 },
    Execute { id: i64 },
    Download {
        #[arg(long)]
        file_path: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PlanSubcommand {
    List(PageArgs),
    Get { id: i64 },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PlanExecutionSubcommand {
    Execute {
        #[arg(long)]
        plan_id: i64,
        #[arg(long)]
        node_id: i64,
    },
    Get { id: i64 },
    ByPlan { plan_id: i64 },
    Logs {
        execution_id: i64,
        /// Fetch one page instead of every log.
        #[arg(long)]
        page: Option<u32>,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    DownloadLog {
        #[arg(long)]
        plan_id: i64,
        #[arg(long)]
        execution_id: i64,
        #[arg(long)]
        script_id: i64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum NodeSubcommand {
    List,
    Get { id: i64 },
    Available,
    Status { node_id: String, status: String },
    Delete { node_id: String },
}

#[derive(Subcommand, Debug)]
enum TaskSubcommand {
    List,
    Get { id: i64 },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Execute { id: i64 },
    Start { id: i64 },
    Stop { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ResultSubcommand {
    List,
    Get { id: i64 },
    ByTask { task_id: i64 },
}

#[derive(Subcommand, Debug)]
enum ReportSubcommand {
    List(PageArgs),
    Get { id: i64 },
    ByExecution { execution_id: i64 },
    Generate { execution_id: i64 },
    Delete { id: i64 },
    Search {
        #[arg(long)]
        plan_name: String,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand, Debug)]
enum ExecutionResultSubcommand {
    ByScript { script_id: i64 },
    Last { script_id: i64 },
    Get { id: i64 },
    Delete { id: i64 },
    DownloadLog {
        id: i64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long)]
    task_id: i64,

    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), help = "Stop after this many events (at least 1)")]
    max_events: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(url) = &cli.socket_url {
        config = config.with_socket_url(url);
    }
    if cli.no_reconnect {
        config = config.with_reconnect(false);
    }

    match cli.command {
        Command::Routes => run_routes(),
        Command::Open { path } => run_open(&config, &path).await,
        Command::Api(api) => run_api(&ApiClient::new(&config)?, api.command).await,
        Command::Watch(args) => run_watch(&config, args).await,
    }
}

// =============================================================================
// ROUTES
// =============================================================================

fn run_routes() -> Result<(), CliError> {
    for route in testdeck::routes::routes() {
        println!("{:<20} {:<20} {}", route.path, route.name, route.component);
    }
    Ok(())
}

async fn run_open(config: &ClientConfig, path: &str) -> Result<(), CliError> {
    let matched = testdeck::resolve(path).ok_or_else(|| CliError::UnknownRoute(path.to_owned()))?;
    let client = ApiClient::new(config)?;
    let data = testdeck::load_view(&client, matched.view).await?;
    print_json(&json!({
        "route": matched.route.name,
        "title": matched.view.title(),
        "data": data,
    }))
}

// =============================================================================
// API
// =============================================================================

async fn run_api(client: &ApiClient, command: ApiSubcommand) -> Result<(), CliError> {
    match command {
        ApiSubcommand::Scripts(command) => run_scripts(client, command).await,
        ApiSubcommand::Plans(command) => run_plans(client, command).await,
        ApiSubcommand::PlanExecutions(command) => run_plan_executions(client, command).await,
        ApiSubcommand::Nodes(command) => run_nodes(client, command).await,
        ApiSubcommand::Tasks(command) => run_tasks(client, command).await,
        ApiSubcommand::Results(command) => run_results(client, command).await,
        ApiSubcommand::Reports(command) => run_reports(client, command).await,
        ApiSubcommand::ExecutionResults(command) => run_execution_results(client, command).await,
    }
}

async fn run_scripts(client: &ApiClient, command: ScriptSubcommand) -> Result<(), CliError> {
    let scripts = client.scripts();
    match command {
        ScriptSubcommand::List(page) => print_json(&scripts.list(page.page, page.size).await?),
        ScriptSubcommand::Get { id } => print_json(&scripts.get(id).await?),
        ScriptSubcommand::Create(args) => print_json(&scripts.create(script_upload(args)?).await?),
        ScriptSubcommand::Update { id, script } => print_json(&scripts.update(id, script_upload(script)?).await?),
        ScriptSubcommand::Delete { id } => {
            scripts.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        ScriptSubcommand::Execute { id } => print_json(&scripts.execute(id).await?),
        ScriptSubcommand::Download { file_path, output } => {
            let source = scripts.download(&file_path).await?;
            write_output(source.as_bytes(), output.as_deref())
        }
    }
}

fn script_upload(args: ScriptArgs) -> Result<ScriptUpload, CliError> {
    let content = std::fs::read(&args.file)?;
    let file_name = args
        .file
        .file_name()
        .map_or_else(|| args.file.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(ScriptUpload {
        name: args.name,
        description: args.description,
        parameters: args.parameters,
        script_type: args.script_type,
        timeout: args.timeout,
        retry_count: args.retry_count,
        file_name,
        content,
    })
}

async fn run_plans(client: &ApiClient, command: PlanSubcommand) -> Result<(), CliError> {
    let plans = client.plans();
    match command {
        PlanSubcommand::List(page) => print_json(&plans.list(page.page, page.size).await?),
        PlanSubcommand::Get { id } => print_json(&plans.get(id).await?),
        PlanSubcommand::Create { data } => print_json(&plans.create(&parse_body(&data)?).await?),
        PlanSubcommand::Update { id, data } => print_json(&plans.update(id, &parse_body(&data)?).await?),
        PlanSubcommand::Delete { id } => {
            plans.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_plan_executions(client: &ApiClient, command: PlanExecutionSubcommand) -> Result<(), CliError> {
    let executions = client.plan_executions();
    match command {
        PlanExecutionSubcommand::Execute { plan_id, node_id } => {
            print_json(&executions.execute(plan_id, node_id).await?)
        }
        PlanExecutionSubcommand::Get { id } => print_json(&executions.get(id).await?),
        PlanExecutionSubcommand::ByPlan { plan_id } => print_json(&executions.by_plan(plan_id).await?),
        PlanExecutionSubcommand::Logs { execution_id, page: Some(page), size } => {
            print_json(&executions.logs_page(execution_id, page, size).await?)
        }
        PlanExecutionSubcommand::Logs { execution_id, page: None, .. } => {
            print_json(&executions.logs(execution_id).await?)
        }
        PlanExecutionSubcommand::DownloadLog { plan_id, execution_id, script_id, output } => {
            let log = executions.download_log(plan_id, execution_id, script_id).await?;
            write_output(&log, output.as_deref())
        }
    }
}

async fn run_nodes(client: &ApiClient, command: NodeSubcommand) -> Result<(), CliError> {
    let nodes = client.nodes();
    match command {
        NodeSubcommand::List => print_json(&nodes.list().await?),
        NodeSubcommand::Get { id } => print_json(&nodes.get(id).await?),
        NodeSubcommand::Available => print_json(&nodes.available().await?),
        NodeSubcommand::Status { node_id, status } => {
            let status = NodeStatus::from(status.to_ascii_uppercase());
            print_json(&nodes.update_status(&node_id, &status).await?)
        }
        NodeSubcommand::Delete { node_id } => {
            nodes.delete(&node_id).await?;
            print_json(&json!({ "deleted": node_id }))
        }
    }
}

async fn run_tasks(client: &ApiClient, command: TaskSubcommand) -> Result<(), CliError> {
    let tasks = client.tasks();
    match command {
        TaskSubcommand::List => print_json(&tasks.list().await?),
        TaskSubcommand::Get { id } => print_json(&tasks.get(id).await?),
        TaskSubcommand::Create { data } => print_json(&tasks.create(&parse_body(&data)?).await?),
        TaskSubcommand::Update { id, data } => print_json(&tasks.update(id, &parse_body(&data)?).await?),
        TaskSubcommand::Execute { id } => print_json(&tasks.execute(id).await?),
        TaskSubcommand::Start { id } => print_json(&tasks.start(id).await?),
        TaskSubcommand::Stop { id } => print_json(&tasks.stop(id).await?),
        TaskSubcommand::Delete { id } => {
            tasks.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_results(client: &ApiClient, command: ResultSubcommand) -> Result<(), CliError> {
    let results = client.results();
    match command {
        ResultSubcommand::List => print_json(&results.list().await?),
        ResultSubcommand::Get { id } => print_json(&results.get(id).await?),
        ResultSubcommand::ByTask { task_id } => print_json(&results.by_task(task_id).await?),
    }
}

async fn run_reports(client: &ApiClient, command: ReportSubcommand) -> Result<(), CliError> {
    let reports = client.reports();
    match command {
        ReportSubcommand::List(page) => print_json(&reports.list(page.page, page.size).await?),
        ReportSubcommand::Get { id } => print_json(&reports.get(id).await?),
        ReportSubcommand::ByExecution { execution_id } => print_json(&reports.by_execution(execution_id).await?),
        ReportSubcommand::Generate { execution_id } => print_json(&reports.generate(execution_id).await?),
        ReportSubcommand::Delete { id } => {
            reports.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        ReportSubcommand::Search { plan_name, page } => {
            print_json(&reports.search(&plan_name, page.page, page.size).await?)
        }
    }
}

async fn run_execution_results(client: &ApiClient, command: ExecutionResultSubcommand) -> Result<(), CliError> {
    let results = client.execution_results();
    match command {
        ExecutionResultSubcommand::ByScript { script_id } => print_json(&results.by_script(script_id).await?),
        ExecutionResultSubcommand::Last { script_id } => print_json(&results.last_by_script(script_id).await?),
        ExecutionResultSubcommand::Get { id } => print_json(&results.get(id).await?),
        ExecutionResultSubcommand::Delete { id } => {
            results.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        ExecutionResultSubcommand::DownloadLog { id, output } => {
            let log = results.download_log(id).await?;
            write_output(&log, output.as_deref())
        }
    }
}

// =============================================================================
// WATCH
// =============================================================================

async fn run_watch(config: &ClientConfig, args: WatchArgs) -> Result<(), CliError> {
    let client = RealtimeClient::new(config)?;
    let (events_tx, mut events) = mpsc::unbounded_channel::<(SocketEvent, Value)>();
    for event in SocketEvent::ALL {
        let events_tx = events_tx.clone();
        client.on(event, move |data| {
            let _ = events_tx.send((event, data.clone()));
        });
    }
    drop(events_tx);

    client.connect().await?;
    if !client.subscribe_to_task_results(args.task_id) {
        client.disconnect().await;
        return Err(CliError::NotSubscribed(args.task_id));
    }
    tracing::info!(task_id = args.task_id, "watching task results");

    let mut status = client.watch_status();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut seen = 0u64;

    loop {
        tokio::select! {
            received = events.recv() => {
                let Some((event, data)) = received else { break };
                println!("{}", json!({ "event": event.as_str(), "data": data }));
                seen += 1;
                if args.max_events.is_some_and(|max| seen >= max) {
                    break;
                }
            }
            changed = status.changed() => {
                if changed.is_err() || *status.borrow() == ConnectionStatus::Disconnected {
                    tracing::warn!("realtime connection ended");
                    break;
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    client.unsubscribe_from_task_results(args.task_id);
    client.disconnect().await;
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn parse_body(data: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str::<Value>(data)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn write_output(bytes: &[u8], output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes)?;
            eprintln!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => print!("{}", String::from_utf8_lossy(bytes)),
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use crate::demo::{run_demo, DemoArgs};
use crate::infra::{open_store, print_scores, print_summaries, read_answers, resolve_database};
use crate::server;
use clap::{Args, Parser, Subcommand};
use facility_scoring::error::AppError;
use facility_scoring::workflows::facility::{
    FacilityFilter, FacilityScoringService, ScoringConfig, ScoringEngine, SubmissionId,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "Facility Scoring",
    about = "Score proposed logistics facilities and manage stored submissions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score an answer set without storing it
    Score(ScoreArgs),
    /// Validate, score, and store an answer set
    Submit(SubmitArgs),
    /// List the latest submission per facility code
    List(ListArgs),
    /// Export stored submissions as CSV
    Export(ExportArgs),
    /// Walk through scoring and latest-wins storage with a sample proposal
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Keep submissions in memory instead of SQLite
    #[arg(long)]
    pub(crate) in_memory: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding the answer set
    pub(crate) answers: PathBuf,
    /// Print the full result as JSON, including per-check credit
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// JSON file holding the answer set
    pub(crate) answers: PathBuf,
    /// SQLite database path (defaults to APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// SQLite database path (defaults to APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Restrict the listing to these facility codes
    #[arg(long = "facility-code", value_delimiter = ',')]
    pub(crate) facility_codes: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// SQLite database path (defaults to APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Restrict the export to these facility codes
    #[arg(long = "facility-code", value_delimiter = ',')]
    pub(crate) facility_codes: Vec<String>,
    /// Export only these submission ids
    #[arg(long, value_delimiter = ',')]
    pub(crate) ids: Vec<i64>,
    /// Write the CSV here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Submit(args) => run_submit(args),
        Command::List(args) => run_list(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let answers = read_answers(&args.answers)?;
    let result = ScoringEngine::new(ScoringConfig::default()).score(&answers);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_scores(&result);
    }
    Ok(())
}

fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let answers = read_answers(&args.answers)?;
    let store = open_store(&resolve_database(args.database)?)?;
    let service = FacilityScoringService::new(Arc::new(store), ScoringConfig::default());

    let receipt = service.submit(answers)?;
    let verb = if receipt.was_update { "Updated" } else { "Stored" };
    println!(
        "{verb} submission {} for {}",
        receipt.id.0,
        receipt
            .facility_code
            .as_ref()
            .map(|code| code.as_str())
            .unwrap_or("(no facility code)")
    );
    print_scores(&receipt.scores);
    Ok(())
}

fn run_list(args: ListArgs) -> Result<(), AppError> {
    let store = open_store(&resolve_database(args.database)?)?;
    let service = FacilityScoringService::new(Arc::new(store), ScoringConfig::default());

    let summaries = service.summaries(&filter_from(&args.facility_codes))?;
    print_summaries(&summaries);
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let store = open_store(&resolve_database(args.database)?)?;
    let service = FacilityScoringService::new(Arc::new(store), ScoringConfig::default());

    let selected: BTreeSet<SubmissionId> = args.ids.into_iter().map(SubmissionId).collect();
    let csv = service.export_csv(&filter_from(&args.facility_codes), &selected)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, csv)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn filter_from(codes: &[String]) -> FacilityFilter {
    FacilityFilter::parse_list(&codes.join(","))
}

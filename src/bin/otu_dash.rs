use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use otu_dash::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use otu_dash::document::Document;
use otu_dash::domain::SubjectId;
use otu_dash::error::DashError;
use otu_dash::output::{JsonOutput, JsonRenderer, OutputMode};
use otu_dash::ranking;
use otu_dash::render::{self, RenderOptions};
use otu_dash::selector;
use otu_dash::session::Session;
use otu_dash::tui::Dashboard;

#[derive(Parser)]
#[command(name = "otu-dash")]
#[command(about = "Per-subject microbiome dashboard: top OTUs, bubble chart and demographics")]
#[command(version, author)]
struct Cli {
    /// Sample document: a path or an http(s) URL, optionally gzip-compressed
    #[arg(long, global = true)]
    data: Option<String>,

    #[arg(long, global = true)]
    config: Option<String>,

    /// Number of taxa in the bar chart
    #[arg(long, global = true)]
    top: Option<usize>,

    /// Reject documents with duplicate subject ids
    #[arg(long, global = true)]
    strict: bool,

    #[arg(long, global = true)]
    non_interactive: bool,

    /// Subject selected when the dashboard opens
    #[arg(long)]
    subject: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List subject ids")]
    Subjects,
    #[command(about = "Print the full dashboard plan for a subject")]
    Show(SubjectArgs),
    #[command(about = "Print the demographic panel for a subject")]
    Metadata(SubjectArgs),
    #[command(about = "Print the top OTUs for a subject, smallest first")]
    Bar(SubjectArgs),
    #[command(about = "Print every OTU for a subject, largest first")]
    Bubble(SubjectArgs),
    #[command(about = "Print each panel as one JSON line")]
    Panels(SubjectArgs),
    #[command(about = "Write the dashboard plan for a subject to a file")]
    Export(ExportArgs),
}

#[derive(Args)]
struct SubjectArgs {
    subject: String,
}

#[derive(Args)]
struct ExportArgs {
    subject: String,

    #[arg(long, short)]
    output: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<DashError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DashError) -> u8 {
    match error {
        DashError::SubjectNotFound { .. } | DashError::InvalidSubjectId(_) => 2,
        DashError::FetchHttp(_) | DashError::FetchStatus { .. } => 3,
        DashError::ShapeMismatch { .. }
        | DashError::DuplicateRecord { .. }
        | DashError::EmptyDocument => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            data: cli.data,
            top_k: cli.top,
            strict: cli.strict,
            initial_subject: cli.subject,
        },
    )?;
    let document = Document::load(&config.data, config.strict)?;
    let options = RenderOptions {
        top_k: config.top_k,
    };

    match cli.command {
        Some(command) => run_command(command, &document, &options),
        None => match output_mode {
            OutputMode::Interactive => run_dashboard(&document, &config, options),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `otu-dash --help`)",
            )),
        },
    }
}

fn run_dashboard(
    document: &Document,
    config: &ResolvedConfig,
    options: RenderOptions,
) -> miette::Result<()> {
    let mut session = Session::new(document, options, config.initial_subject.as_ref())?;
    let mut dashboard = Dashboard::new();
    dashboard.run(&mut session)
}

fn run_command(
    command: Commands,
    document: &Document,
    options: &RenderOptions,
) -> miette::Result<()> {
    match command {
        Commands::Subjects => {
            JsonOutput::print_subjects(selector::subjects(document)).into_diagnostic()
        }
        Commands::Show(args) => {
            let plan = render::render(document, &parse_subject(&args.subject)?, options)?;
            JsonOutput::print_plan(&plan).into_diagnostic()
        }
        Commands::Metadata(args) => {
            let record = selector::find_metadata(document, &parse_subject(&args.subject)?)?;
            JsonOutput::print_metadata(&render::metadata_lines(record)).into_diagnostic()
        }
        Commands::Bar(args) => {
            let sample = selector::find_sample(document, &parse_subject(&args.subject)?)?;
            let bar = ranking::for_bar_chart(sample, options.top_k)?;
            JsonOutput::print_observations(&bar).into_diagnostic()
        }
        Commands::Bubble(args) => {
            let sample = selector::find_sample(document, &parse_subject(&args.subject)?)?;
            let bubble = ranking::for_bubble_chart(sample)?;
            JsonOutput::print_observations(&bubble).into_diagnostic()
        }
        Commands::Panels(args) => {
            let plan = render::render(document, &parse_subject(&args.subject)?, options)?;
            let mut renderer = JsonRenderer::new(std::io::stdout().lock());
            render::present(&plan, &mut renderer)?;
            Ok(())
        }
        Commands::Export(args) => {
            let plan = render::render(document, &parse_subject(&args.subject)?, options)?;
            JsonOutput::export_plan(&plan, &args.output)?;
            Ok(())
        }
    }
}

fn parse_subject(raw: &str) -> Result<SubjectId, DashError> {
    raw.parse()
}

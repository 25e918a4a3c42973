use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use player_rank::config::{parse_filter, parse_weight, Config, RankingOverrides};
use player_rank::ranking::{
    default_columns, export_columns, project, rank_table, validate_ranking_config,
    weighted_metrics, InvalidValuePolicy, MetricValues, NormalizationMethod, RankError,
    RankingConfig,
};
use player_rank::table::RecordTable;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_RANKING: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank players from a CSV file (default if no subcommand)
    Rank(RankArgs),
    /// Show the normalized weight of every metric
    Weights(OverrideArgs),
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "player-rank")]
#[command(about = "Rank players by weighted, normalized metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/player-rank/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(flatten)]
    rank: RankArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
struct RankArgs {
    /// CSV file to rank (defaults to `input` from the config file)
    input: Option<PathBuf>,

    /// Write the full ranked table (all input columns + Score + Rank) as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Show only the top N players
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Columns to show, comma separated (e.g. "Player,Squad,Score,Rank")
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Show normalized metric values instead of raw ones
    #[arg(long)]
    normalized: bool,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug, Clone)]
struct OverrideArgs {
    /// Normalization method
    #[arg(short, long, value_enum)]
    method: Option<Method>,

    /// Set a metric's raw weight, NAME=WEIGHT (repeatable)
    #[arg(short, long = "weight", value_parser = parse_weight_arg)]
    weights: Vec<(String, f64)>,

    /// Rank a metric lower-is-better (repeatable)
    #[arg(short, long = "reverse")]
    reverse: Vec<String>,

    /// Keep rows whose COLUMN is one of the values, COLUMN=V1,V2 (repeatable)
    #[arg(short, long = "filter", value_parser = parse_filter_arg)]
    filters: Vec<(String, Vec<String>)>,

    /// What to do with non-numeric metric cells
    #[arg(long, value_enum)]
    on_invalid: Option<OnInvalid>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Table,
    Tsv,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Method {
    MinMax,
    ZScore,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum OnInvalid {
    Fail,
    Drop,
}

fn parse_weight_arg(s: &str) -> Result<(String, f64), String> {
    parse_weight(s).map_err(|e| e.to_string())
}

fn parse_filter_arg(s: &str) -> Result<(String, Vec<String>), String> {
    parse_filter(s).map_err(|e| e.to_string())
}

impl From<&OverrideArgs> for RankingOverrides {
    fn from(args: &OverrideArgs) -> Self {
        RankingOverrides {
            method: args.method.map(|m| match m {
                Method::MinMax => NormalizationMethod::MinMax,
                Method::ZScore => NormalizationMethod::ZScore,
            }),
            weights: args.weights.clone(),
            reverse: args.reverse.clone(),
            filters: args.filters.clone(),
            invalid_values: args.on_invalid.map(|p| match p {
                OnInvalid::Fail => InvalidValuePolicy::Fail,
                OnInvalid::Drop => InvalidValuePolicy::Drop,
            }),
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "player_rank=debug,info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Exit code for an engine error
fn exit_code(err: &RankError) -> i32 {
    match err {
        RankError::MissingColumns { .. } | RankError::InvalidMetricValue { .. } => EXIT_INPUT,
        RankError::ZeroWeightTotal | RankError::UnknownMetric(_) | RankError::EmptyResult => {
            EXIT_RANKING
        }
        RankError::InvalidWeight { .. } | RankError::DuplicateMetric(_) => EXIT_CONFIG,
    }
}

/// Apply command-line overrides and validate the result, exiting on failure.
fn effective_ranking(config: &Config, overrides: &OverrideArgs) -> RankingConfig {
    let ranking = match RankingOverrides::from(overrides).apply(&config.ranking) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    if let Err(errors) = validate_ranking_config(&ranking) {
        eprintln!("Ranking config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    ranking
}

/// Load the config file, exiting with EXIT_CONFIG on failure.
fn load_config_or_exit(path: Option<String>) -> Config {
    match player_rank::config::load_config(path.map(PathBuf::from)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Rank(cli.rank));

    match command {
        Commands::Init => {
            let path = cli.config.map(PathBuf::from);
            if let Err(e) = player_rank::config::init::run_init_wizard(path) {
                eprintln!("Init failed: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
        Commands::Weights(overrides) => {
            let config = load_config_or_exit(cli.config);
            let ranking = effective_ranking(&config, &overrides);
            match weighted_metrics(&ranking) {
                Ok(metrics) => println!(
                    "{}",
                    player_rank::output::format_weights(
                        &metrics,
                        ranking.method,
                        player_rank::output::should_use_colors()
                    )
                ),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(exit_code(&e));
                }
            }
        }
        Commands::Rank(args) => {
            let config = load_config_or_exit(cli.config);
            run_rank(&config, &args);
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

fn run_rank(config: &Config, args: &RankArgs) {
    let start_time = Instant::now();
    let ranking = effective_ranking(config, &args.overrides);

    let input = match args.input.clone().or_else(|| config.input.as_ref().map(PathBuf::from)) {
        Some(path) => path,
        None => {
            eprintln!("No input CSV given. Pass a file or set `input` in the config file.");
            std::process::exit(EXIT_INPUT);
        }
    };

    let table = match player_rank::table::read_csv(&input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };
    info!("Loaded {} rows from {}", table.len(), input.display());

    let display_columns = args
        .columns
        .clone()
        .or_else(|| config.display.columns.clone())
        .unwrap_or_else(|| default_columns(&ranking));
    let values = if args.normalized {
        MetricValues::Normalized
    } else {
        config.display.values
    };
    let limit = args.limit.or(config.display.limit);

    let (display, export) = match rank_table(&table, &ranking) {
        Ok(ranked) => {
            let display = project(&ranked, &display_columns, values);
            let export = project(&ranked, &export_columns(&ranked.columns), MetricValues::Raw);
            match display.and_then(|d| export.map(|e| (d, e))) {
                Ok(tables) => tables,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(exit_code(&e));
                }
            }
        }
        Err(e) if e.is_recoverable() => {
            info!("No players match the selected filters");
            (
                RecordTable::new(display_columns),
                RecordTable::new(export_columns(&table.columns)),
            )
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    if let Some(ref path) = args.output {
        if let Err(e) = player_rank::table::write_csv(path, &export) {
            eprintln!("Export failed: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
        info!("Wrote {} ranked rows to {}", export.len(), path.display());
    }

    let mut shown = display;
    if let Some(n) = limit {
        shown.rows.truncate(n);
    }

    let rendered = match args.format {
        Format::Table => player_rank::output::format_ranked_table(
            &shown,
            player_rank::output::should_use_colors(),
        ),
        Format::Tsv => player_rank::output::format_tsv(&shown),
        Format::Json => match player_rank::output::format_json(&shown) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialize results: {}", e);
                std::process::exit(EXIT_INPUT);
            }
        },
    };
    println!("{}", rendered);

    let shown_rows = shown.len();
    debug!("Total: {} rows in {:?}", shown_rows, start_time.elapsed());
}

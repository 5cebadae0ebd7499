//! NeuroFlux CLI - Command-line interface for NeuroFlux
//!
//! Commands:
//! - prepare: Build a labeled band-power dataset from class directories
//! - inspect: Summarize a saved dataset
//! - boards: List supported boards
//! - windows: Show the window schedule for a recording length

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use neuroflux::pipeline::{BuildReport, DatasetBuilder};
use neuroflux::types::Band;
use neuroflux::{
    BoardId, ClassLayout, DatasetFile, ExtractError, ExtractionConfig, Label,
    WindowedFeatureExtractor, NEUROFLUX_VERSION,
};

/// NeuroFlux - Windowed EEG band-power features for mental-state classifiers
#[derive(Parser)]
#[command(name = "neuroflux")]
#[command(version = NEUROFLUX_VERSION)]
#[command(about = "Turn labeled EEG recordings into band-power datasets", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a labeled dataset from per-class directories of recordings
    Prepare {
        /// Directory containing one sub-directory per class
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Metric label: reads `<metric>` (class 0) and `not_<metric>` (class 1)
        #[arg(long, conflicts_with_all = ["first", "second"])]
        metric: Option<String>,

        /// Directory of the first class (label 0)
        #[arg(long, requires = "second")]
        first: Option<String>,

        /// Directory of the second class (label 1)
        #[arg(long, requires = "first")]
        second: Option<String>,

        /// Board slug (muse2, cyton, ganglion, muse2016, unicorn), menu number or `id:<brainflow id>`
        #[arg(short, long)]
        board: String,

        /// Comma-separated electrode names to exclude (overrides the config)
        #[arg(long, value_delimiter = ',')]
        blacklist: Option<Vec<String>>,

        /// Extraction config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Dataset output path
        #[arg(short, long, default_value = "dataset.json")]
        output: PathBuf,

        /// Print the build report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a saved dataset
    Inspect {
        /// Dataset file written by `prepare`
        #[arg(short, long)]
        dataset: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported boards
    Boards {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show window start positions for a recording length
    Windows {
        /// Number of samples in the recording
        #[arg(long)]
        samples: usize,

        /// Sampling rate in Hz
        #[arg(long)]
        sampling_rate: u32,

        /// Extraction config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialise logging: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), NeuroCliError> {
    match cli.command {
        Commands::Prepare {
            data_dir,
            metric,
            first,
            second,
            board,
            blacklist,
            config,
            output,
            json,
        } => {
            let layout = resolve_layout(metric, first, second)?;
            cmd_prepare(
                &data_dir,
                layout,
                &board,
                blacklist,
                config.as_deref(),
                &output,
                json,
            )
        }

        Commands::Inspect { dataset, json } => cmd_inspect(&dataset, json),

        Commands::Boards { json } => cmd_boards(json),

        Commands::Windows {
            samples,
            sampling_rate,
            config,
        } => cmd_windows(samples, sampling_rate, config.as_deref()),
    }
}

fn resolve_layout(
    metric: Option<String>,
    first: Option<String>,
    second: Option<String>,
) -> Result<ClassLayout, NeuroCliError> {
    match (metric, first, second) {
        (Some(metric), None, None) => Ok(ClassLayout::metric(metric)?),
        (None, Some(first), Some(second)) => Ok(ClassLayout::pair(first, second)?),
        _ => Err(NeuroCliError::InvalidArguments(
            "pass either --metric or both --first and --second".to_string(),
        )),
    }
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig, NeuroCliError> {
    match path {
        Some(path) => Ok(ExtractionConfig::load(path)?),
        None => Ok(ExtractionConfig::default()),
    }
}

fn cmd_prepare(
    data_dir: &Path,
    layout: ClassLayout,
    board: &str,
    blacklist: Option<Vec<String>>,
    config: Option<&Path>,
    output: &Path,
    json: bool,
) -> Result<(), NeuroCliError> {
    let board: BoardId = board.parse()?;
    let mut config = load_config(config)?;

    if let Some(names) = blacklist {
        config.blacklist = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
    }

    let builder = DatasetBuilder::new(board, layout.clone(), config);
    let built = builder.build(data_dir)?;

    if built.dataset.is_empty() {
        warn!("no windows were extracted, the saved dataset is empty");
    }

    let file = built.to_file(board, &layout);
    file.save(output)?;

    let summary = PrepareSummary {
        output: output.to_path_buf(),
        dataset_id: file.dataset_id.to_string(),
        board: board.as_str().to_string(),
        first_class: layout.first_class(),
        second_class: layout.second_class(),
        channels: built.channels.clone(),
        report: built.report,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_prepare_summary(&summary);
    }

    Ok(())
}

fn print_prepare_summary(summary: &PrepareSummary) {
    println!("Dataset Report");
    println!("==============");
    println!("Output:       {}", summary.output.display());
    println!("Dataset ID:   {}", summary.dataset_id);
    println!("Board:        {}", summary.board);
    println!("Channels:     {:?}", summary.channels);
    println!("Files read:   {}", summary.report.files_read);
    println!(
        "1st Class ({}): {} windows",
        summary.first_class, summary.report.first_class_windows
    );
    println!(
        "2nd Class ({}): {} windows",
        summary.second_class, summary.report.second_class_windows
    );

    if !summary.report.skipped.is_empty() {
        println!("\nSkipped files:");
        for skipped in &summary.report.skipped {
            println!("  - {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}

fn cmd_inspect(path: &Path, json: bool) -> Result<(), NeuroCliError> {
    let file = DatasetFile::load(path)?;
    let dataset = file.dataset()?;
    let (first_count, second_count) = dataset.class_counts();

    let report = InspectReport {
        dataset_id: file.dataset_id.to_string(),
        created_at: file.created_at.to_rfc3339(),
        producer: format!("{} {}", file.producer.name, file.producer.version),
        board: file.board.as_str().to_string(),
        channels: file.channels.clone(),
        classes: vec![
            ClassSummary {
                name: file.classes.first.clone(),
                label: Label::First.as_u8(),
                windows: first_count,
                mean: dataset.class_mean(Label::First).map(|m| m.to_vec()),
            },
            ClassSummary {
                name: file.classes.second.clone(),
                label: Label::Second.as_u8(),
                windows: second_count,
                mean: dataset.class_mean(Label::Second).map(|m| m.to_vec()),
            },
        ],
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Dataset {}", report.dataset_id);
        println!("=======");
        println!("Created:  {}", report.created_at);
        println!("Producer: {}", report.producer);
        println!("Board:    {}", report.board);
        println!("Channels: {:?}", report.channels);

        let bands: Vec<&str> = Band::ALL.iter().map(|b| b.as_str()).collect();
        for class in &report.classes {
            println!(
                "\nClass {} ({}): {} windows",
                class.label, class.name, class.windows
            );
            match &class.mean {
                Some(mean) => {
                    for (band, value) in bands.iter().zip(mean) {
                        println!("  {:<6} {:.4}", band, value);
                    }
                }
                None => println!("  (no samples)"),
            }
        }
    }

    Ok(())
}

fn cmd_boards(json: bool) -> Result<(), NeuroCliError> {
    let boards: Vec<BoardSummary> = BoardId::ALL
        .iter()
        .map(|board| {
            let desc = board.descriptor();
            BoardSummary {
                menu: board.menu_number(),
                slug: board.as_str().to_string(),
                name: desc.name.to_string(),
                brainflow_id: desc.brainflow_id,
                sampling_rate: desc.sampling_rate,
                eeg_channels: desc.eeg_channels.to_vec(),
                eeg_names: desc
                    .eeg_names
                    .map(|names| names.iter().map(|n| n.to_string()).collect()),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&boards)?);
    } else {
        println!("Supported boards");
        println!("----------------");
        for board in &boards {
            println!(
                "{}: {:<18} slug={:<9} id={:<3} {} Hz  EEG rows {:?}  names {}",
                board.menu,
                board.name,
                board.slug,
                board.brainflow_id,
                board.sampling_rate,
                board.eeg_channels,
                board
                    .eeg_names
                    .as_ref()
                    .map(|n| n.join(","))
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    Ok(())
}

fn cmd_windows(
    samples: usize,
    sampling_rate: u32,
    config: Option<&Path>,
) -> Result<(), NeuroCliError> {
    let config = load_config(config)?;
    let extractor = WindowedFeatureExtractor::new(config);
    let schedule = extractor.schedule(samples, sampling_rate)?;

    let mut total = 0;
    for (spec, starts) in &schedule {
        total += starts.len();
        println!(
            "{:>5.2}s overlap {:.3}: {} windows {:?}",
            spec.seconds,
            spec.overlap,
            starts.len(),
            starts
        );
    }
    println!("total: {} windows", total);

    Ok(())
}

// Error types

#[derive(Debug)]
enum NeuroCliError {
    Extract(ExtractError),
    Json(serde_json::Error),
    InvalidArguments(String),
}

impl From<ExtractError> for NeuroCliError {
    fn from(e: ExtractError) -> Self {
        NeuroCliError::Extract(e)
    }
}

impl From<serde_json::Error> for NeuroCliError {
    fn from(e: serde_json::Error) -> Self {
        NeuroCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<NeuroCliError> for CliError {
    fn from(e: NeuroCliError) -> Self {
        match e {
            NeuroCliError::Extract(e) => {
                let hint = match &e {
                    ExtractError::UnsupportedBoard(_) => "Run 'neuroflux boards' for valid boards",
                    ExtractError::InvalidConfig(_) => "Check window lengths and overlaps",
                    ExtractError::InvalidDataset(_) => "Regenerate the dataset with 'neuroflux prepare'",
                    ExtractError::NoChannels => "Remove names from the blacklist",
                    ExtractError::Io { .. } => "Check file paths and permissions",
                    _ => "Check the data directory layout",
                };
                CliError {
                    code: "EXTRACT_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            NeuroCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            NeuroCliError::InvalidArguments(msg) => CliError {
                code: "INVALID_ARGUMENTS".to_string(),
                message: msg,
                hint: Some("Run 'neuroflux prepare --help'".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct PrepareSummary {
    output: PathBuf,
    dataset_id: String,
    board: String,
    first_class: String,
    second_class: String,
    channels: Vec<usize>,
    report: BuildReport,
}

#[derive(serde::Serialize)]
struct InspectReport {
    dataset_id: String,
    created_at: String,
    producer: String,
    board: String,
    channels: Vec<usize>,
    classes: Vec<ClassSummary>,
}

#[derive(serde::Serialize)]
struct ClassSummary {
    name: String,
    label: u8,
    windows: usize,
    mean: Option<Vec<f64>>,
}

#[derive(serde::Serialize)]
struct BoardSummary {
    menu: usize,
    slug: String,
    name: String,
    brainflow_id: i32,
    sampling_rate: u32,
    eeg_channels: Vec<usize>,
    eeg_names: Option<Vec<String>>,
}

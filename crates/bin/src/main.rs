//! Retention CLI binary.
//!
//! Provides command-line interface for cohort retention analysis.

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use retention::cohort::CategoryActivity;
use retention::data::{ActivityTable, CategoryTable, LoadConfig, detect_columns, load_csv};
use retention::output::{
    AsciiTable, ClientListExport, ClientQuery, ExportError, ExportFormat, Exporter,
};
use retention::{AnalysisConfig, CohortAnalysis, ValueType};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retention")]
#[command(about = "Retention: cohort analysis of client activity", long_about = None)]
#[command(version)]
struct Cli {
    /// Log every build step
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Activity CSV file
    file: PathBuf,

    /// Period column (detected from the headers when omitted)
    #[arg(long)]
    period_col: Option<String>,

    /// Client column (detected from the headers when omitted)
    #[arg(long)]
    client_col: Option<String>,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Count activity rows instead of distinct clients in the cohort matrix
    #[arg(long)]
    records: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Overview, churn table and retention summary
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,

        /// Number of cohorts in each ranking
        #[arg(long, default_value = "5")]
        top: usize,
    },

    /// Print or export one matrix
    Matrix {
        #[command(flatten)]
        input: InputArgs,

        /// Which matrix
        #[arg(long, value_enum)]
        kind: MatrixKind,

        /// Output format
        #[arg(long, value_enum, default_value_t = TableFormat::Text)]
        format: TableFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the clients behind a matrix cell
    Clients {
        #[command(flatten)]
        input: InputArgs,

        /// Which client set
        #[arg(long, value_enum)]
        query: QueryKind,

        /// Cohort period label
        #[arg(long)]
        cohort: String,

        /// Target period label (not used by churn)
        #[arg(long)]
        target: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TableFormat::Text)]
        format: TableFormat,
    },

    /// Network churn against activity in other categories
    Network {
        #[command(flatten)]
        input: InputArgs,

        /// CSV of activity in other categories
        #[arg(long)]
        categories: PathBuf,

        /// Category column of the categories file
        #[arg(long)]
        category_col: Option<String>,

        /// Show where this cohort's churned clients went
        #[arg(long)]
        cohort: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TableFormat::Text)]
        format: TableFormat,
    },

    /// Write every matrix, the churn table and a JSON report
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Number of cohorts in each summary ranking
        #[arg(long, default_value = "5")]
        top: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatrixKind {
    Cohort,
    Accumulation,
    Percent,
    Inflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QueryKind {
    Cohort,
    Accumulation,
    Churn,
    Inflow,
}

impl From<QueryKind> for ClientQuery {
    fn from(kind: QueryKind) -> Self {
        match kind {
            QueryKind::Cohort => Self::Cohort,
            QueryKind::Accumulation => Self::Accumulation,
            QueryKind::Churn => Self::Churn,
            QueryKind::Inflow => Self::Inflow,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Analyze { input, format, top } => {
            let analysis = load_analysis(&input)?;
            print_analysis(&analysis, &dataset_name(&input.file), format, top)?;
        }
        Commands::Matrix {
            input,
            kind,
            format,
            output,
        } => {
            let analysis = load_analysis(&input)?;
            let rendered = match kind {
                MatrixKind::Cohort => render(analysis.cohort_matrix(), format)?,
                MatrixKind::Accumulation => render(analysis.accumulation_matrix(), format)?,
                MatrixKind::Percent => render(analysis.percent_matrix(), format)?,
                MatrixKind::Inflow => render(analysis.inflow_matrix(), format)?,
            };
            write_output(&rendered, output.as_deref())?;
        }
        Commands::Clients {
            input,
            query,
            cohort,
            target,
            format,
        } => {
            let analysis = load_analysis(&input)?;
            let list = ClientListExport::from_query(
                analysis.context(),
                query.into(),
                &cohort,
                target.as_deref(),
            )?;
            match format {
                TableFormat::Text => {
                    for client in &list.clients {
                        println!("{client}");
                    }
                    eprintln!("{} client(s)", list.len());
                }
                TableFormat::Csv => print!("{}", list.export_to_string(ExportFormat::Csv)?),
                TableFormat::Json => {
                    println!("{}", list.export_to_string(ExportFormat::PrettyJson)?);
                }
            }
        }
        Commands::Network {
            input,
            categories,
            category_col,
            cohort,
            format,
        } => {
            let analysis = load_analysis(&input)?;
            let activity = load_categories(&categories, category_col, &input)?;
            print!("{}", render(&analysis.network_churn(&activity), format)?);

            if let Some(cohort) = cohort {
                let presence = analysis
                    .category_presence(&activity, &cohort)
                    .ok_or_else(|| format!("Unknown cohort period: {cohort}"))?;
                match format {
                    TableFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&presence)?);
                    }
                    TableFormat::Text | TableFormat::Csv => {
                        println!();
                        print!("{}", presence.to_ascii_table());
                    }
                }
            }
        }
        Commands::Export {
            input,
            out_dir,
            top,
        } => {
            let analysis = load_analysis(&input)?;
            export_all(&analysis, &dataset_name(&input.file), &out_dir, top)?;
        }
    }

    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn load_config(input: &InputArgs) -> Result<LoadConfig, Box<dyn Error>> {
    let delimiter = u8::try_from(input.delimiter)
        .map_err(|_| format!("Delimiter must be a single-byte character: {:?}", input.delimiter))?;
    Ok(LoadConfig {
        delimiter,
        ..LoadConfig::default()
    })
}

fn load_analysis(input: &InputArgs) -> Result<CohortAnalysis, Box<dyn Error>> {
    let pb = spinner(format!("Loading {}...", input.file.display()));

    let result = build_analysis(input, &pb);
    match &result {
        Ok(analysis) => pb.finish_with_message(format!(
            "Analyzed {} periods ({})",
            analysis.periods().len(),
            analysis.period_kind()
        )),
        Err(_) => pb.finish_with_message("Failed!"),
    }
    result
}

fn build_analysis(input: &InputArgs, pb: &ProgressBar) -> Result<CohortAnalysis, Box<dyn Error>> {
    let frame = load_csv(&input.file, &load_config(input)?)?;
    let detected = detect_columns(&frame);
    let period_col = input
        .period_col
        .clone()
        .map_or_else(|| detected.require_period().map(str::to_string), Ok)?;
    let client_col = input
        .client_col
        .clone()
        .map_or_else(|| detected.require_client().map(str::to_string), Ok)?;
    tracing::debug!(%period_col, %client_col, rows = frame.height(), "using columns");

    pb.set_message("Building cohorts...");
    let table = ActivityTable::new(frame, period_col, client_col)?;
    let config = AnalysisConfig {
        value_type: if input.records {
            ValueType::Records
        } else {
            ValueType::Clients
        },
    };
    Ok(CohortAnalysis::run(&table, &config)?)
}

fn load_categories(
    path: &Path,
    category_col: Option<String>,
    input: &InputArgs,
) -> Result<CategoryActivity, Box<dyn Error>> {
    let frame = load_csv(path, &load_config(input)?)?;
    let detected = detect_columns(&frame);
    let category_col =
        category_col.map_or_else(|| detected.require_category().map(str::to_string), Ok)?;
    let client_col = detected.require_client()?.to_string();

    let table = CategoryTable::new(frame, category_col, detected.period, client_col)?;
    let activity = CategoryActivity::from_table(&table)?;
    tracing::debug!(
        categories = activity.len(),
        has_periods = activity.has_periods(),
        "loaded category activity"
    );
    Ok(activity)
}

fn render<T: AsciiTable + Exporter>(value: &T, format: TableFormat) -> Result<String, ExportError> {
    match format {
        TableFormat::Text => Ok(value.to_ascii_table()),
        TableFormat::Csv => value.export_to_string(ExportFormat::Csv),
        TableFormat::Json => value.export_to_string(ExportFormat::PrettyJson),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn print_analysis(
    analysis: &CohortAnalysis,
    dataset: &str,
    format: SummaryFormat,
    top: usize,
) -> Result<(), Box<dyn Error>> {
    match format {
        SummaryFormat::Json => {
            println!("{}", analysis.report(dataset, top)?.to_json()?);
        }
        SummaryFormat::Markdown => {
            println!("# Cohort analysis: {dataset}\n");
            println!("{}", analysis.overview().to_markdown());
            println!("{}", analysis.summary(top).to_markdown());
        }
        SummaryFormat::Text => {
            println!("\n{}", analysis.overview().to_ascii_table());
            println!("{}", analysis.churn_table().to_ascii_table());
            println!("{}", analysis.summary(top).to_ascii_table());
        }
    }
    Ok(())
}

fn export_all(
    analysis: &CohortAnalysis,
    dataset: &str,
    out_dir: &Path,
    top: usize,
) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(out_dir)?;
    let csv = ExportFormat::Csv;

    let files: [(&str, &dyn Exporter); 5] = [
        ("cohort_matrix", analysis.cohort_matrix()),
        ("accumulation_matrix", analysis.accumulation_matrix()),
        ("accumulation_percent_matrix", analysis.percent_matrix()),
        ("inflow_matrix", analysis.inflow_matrix()),
        ("churn_table", analysis.churn_table()),
    ];
    for (name, value) in files {
        let path = out_dir.join(format!("{name}.{}", csv.extension()));
        value.export_to_file(&path, csv)?;
        println!("  {}", path.display());
    }

    let path = out_dir.join("report.json");
    analysis.report(dataset, top)?.write_to(&path)?;
    println!("  {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_matrix_command() {
        let cli = Cli::try_parse_from([
            "retention",
            "matrix",
            "sales.csv",
            "--kind",
            "percent",
            "--format",
            "csv",
            "--delimiter",
            ";",
        ])
        .unwrap();

        match cli.command {
            Commands::Matrix {
                input,
                kind,
                format,
                output,
            } => {
                assert_eq!(input.file, PathBuf::from("sales.csv"));
                assert_eq!(input.delimiter, ';');
                assert_eq!(kind, MatrixKind::Percent);
                assert_eq!(format, TableFormat::Csv);
                assert!(output.is_none());
            }
            _ => panic!("expected matrix command"),
        }
    }

    #[test]
    fn test_parse_clients_command() {
        let cli = Cli::try_parse_from([
            "retention",
            "clients",
            "sales.csv",
            "--query",
            "churn",
            "--cohort",
            "2024-янв",
            "--records",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Clients {
                input,
                query,
                cohort,
                target,
                ..
            } => {
                assert!(input.records);
                assert_eq!(ClientQuery::from(query), ClientQuery::Churn);
                assert_eq!(cohort, "2024-янв");
                assert!(target.is_none());
            }
            _ => panic!("expected clients command"),
        }
    }

    #[test]
    fn test_multibyte_delimiter_is_rejected() {
        let input = InputArgs {
            file: PathBuf::from("sales.csv"),
            period_col: None,
            client_col: None,
            delimiter: '№',
            records: false,
        };
        assert!(load_config(&input).is_err());
    }

    #[test]
    fn test_dataset_name() {
        assert_eq!(dataset_name(Path::new("/data/sales.csv")), "sales.csv");
    }
}

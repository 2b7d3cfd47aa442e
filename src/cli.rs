use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::schema::NoteLayer;

#[derive(Debug, Parser)]
#[command(author, version, about = "Analyze fragrance catalogs from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Headline figures for the catalog and the filtered view
    Overview(OverviewArgs),
    /// List the distinct brands, countries and genders with their default selections
    Domains(DomainsArgs),
    /// Mean, median, standard deviation and count for a numeric column
    Stats(StatsArgs),
    /// Rows with the highest values of a numeric column
    Top(TopArgs),
    /// Rank groups (e.g. brands) by the mean of a numeric column
    Rank(RankArgs),
    /// Most frequent values of a column
    Counts(CountsArgs),
    /// Most frequent olfactory notes per layer
    Notes(NotesArgs),
    /// Equal-width histogram of a numeric column
    Histogram(HistogramArgs),
    /// Every dashboard section computed from a single load
    Dashboard(DashboardArgs),
    /// Column role mapping for non-standard catalogs
    #[command(subcommand)]
    Schema(SchemaCommand),
}

#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Semicolon-delimited catalog to analyze
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file mapping column roles to header names
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Field delimiter (supports ';', ',', 'tab', '|')
    #[arg(long, value_parser = parse_delimiter, default_value = ";")]
    pub delimiter: u8,
    /// Character encoding of the input file (defaults to latin1)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Accept a comma as decimal separator in numeric columns
    #[arg(long = "decimal-comma")]
    pub decimal_comma: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Brands to include (repeatable or comma separated)
    #[arg(long = "brand", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub brands: Vec<String>,
    /// Countries to include (repeatable or comma separated)
    #[arg(long = "country", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub countries: Vec<String>,
    /// Genders to include (repeatable or comma separated)
    #[arg(long = "gender", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub genders: Vec<String>,
    /// Brands selected when none are given (0 = all)
    #[arg(long = "default-brands", default_value_t = 5)]
    pub default_brands: usize,
    /// Countries selected when none are given (0 = all)
    #[arg(long = "default-countries", default_value_t = 10)]
    pub default_countries: usize,
    /// Genders selected when none are given (0 = all)
    #[arg(long = "default-genders", default_value_t = 0)]
    pub default_genders: usize,
    /// Skip categorical filtering and analyze every row
    #[arg(long = "all-rows")]
    pub all_rows: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct DomainsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Numeric columns to summarize (defaults to the rating value column)
    #[arg(short = 'C', long = "columns", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Numeric column to rank by (defaults to the rating value column)
    #[arg(long = "by")]
    pub by: Option<String>,
    /// Number of rows to return
    #[arg(short = 'n', long = "top", default_value_t = 10)]
    pub top: usize,
    /// Columns to show (defaults to name, brand and the ranked column)
    #[arg(short = 'C', long = "columns", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Column to group by (defaults to the brand column)
    #[arg(long = "group")]
    pub group: Option<String>,
    /// Numeric column to average (defaults to the rating value column)
    #[arg(long = "value")]
    pub value: Option<String>,
    /// Number of groups to return
    #[arg(short = 'n', long = "top", default_value_t = 15)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct CountsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Column to count (defaults to the brand column)
    #[arg(short = 'C', long = "column")]
    pub column: Option<String>,
    /// Number of values to return
    #[arg(short = 'n', long = "top", default_value_t = 15)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct NotesArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Note layers to rank (defaults to all three)
    #[arg(long = "layer", value_enum, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub layers: Vec<NoteLayer>,
    /// Number of notes per layer
    #[arg(short = 'n', long = "top", default_value_t = 15)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct HistogramArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Numeric column to bin (defaults to the rating value column)
    #[arg(short = 'C', long = "column")]
    pub column: Option<String>,
    /// Number of bins
    #[arg(long, default_value_t = 30)]
    pub bins: usize,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Rows in the top-rated and most-reviewed lists
    #[arg(long = "top-rows", default_value_t = 10)]
    pub top_rows: usize,
    /// Entries in brand, country and note rankings
    #[arg(long = "top-groups", default_value_t = 15)]
    pub top_groups: usize,
}

#[derive(Debug, Subcommand)]
pub enum SchemaCommand {
    /// Write the default column role mapping as YAML
    Init(SchemaInitArgs),
}

#[derive(Debug, Args)]
pub struct SchemaInitArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

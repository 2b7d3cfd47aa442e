//! Command handlers: load, filter, query, then print as text or JSON.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::{
        CountsArgs, DashboardArgs, DatasetArgs, DomainsArgs, HistogramArgs, NotesArgs,
        OutputFormat, OverviewArgs, RankArgs, SchemaInitArgs, SelectionArgs, StatsArgs, TopArgs,
    },
    data::{NumberStyle, format_metric, format_number},
    filter::{self, DefaultLimits, DimensionReport, FilterOutcome, Selections},
    io_utils,
    loader::{DatasetLoader, LoadOptions},
    notes::{self, LayerRanking},
    render::{self, Align},
    schema::{ColumnKind, DatasetSchema, Dimension, NoteLayer},
    stats::{self, GroupRank, HistogramBin, Overview, Summary, ValueCount},
    table::{Row, Table},
};

/// A loaded catalog and the filtered view every query runs against.
struct Session {
    loader: DatasetLoader,
    full: Arc<Table>,
    outcome: FilterOutcome,
}

impl Session {
    fn open(dataset: &DatasetArgs, selection: &SelectionArgs) -> Result<Self> {
        let options = load_options(dataset)?;
        info!(
            "Loading '{}' with delimiter '{}' and encoding {}",
            dataset.input.display(),
            io_utils::printable_delimiter(options.delimiter),
            options.encoding.name()
        );
        let mut loader = DatasetLoader::new(options);
        let full = loader.load(&dataset.input)?;
        let outcome = apply_selection(&full, loader.schema(), selection);
        Ok(Self {
            loader,
            full,
            outcome,
        })
    }

    fn schema(&self) -> &DatasetSchema {
        self.loader.schema()
    }

    fn filtered(&self) -> &Table {
        &self.outcome.table
    }
}

fn load_options(dataset: &DatasetArgs) -> Result<LoadOptions> {
    let schema = match &dataset.schema {
        Some(path) => DatasetSchema::load(path)
            .with_context(|| format!("Loading schema from {path:?}"))?,
        None => DatasetSchema::default(),
    };
    Ok(LoadOptions {
        delimiter: dataset.delimiter,
        encoding: io_utils::resolve_encoding(dataset.input_encoding.as_deref())?,
        number_style: if dataset.decimal_comma {
            NumberStyle::DecimalComma
        } else {
            NumberStyle::Standard
        },
        schema,
    })
}

pub fn selections_from_args(args: &SelectionArgs) -> (Selections, DefaultLimits) {
    let collect = |values: &[String]| -> BTreeSet<String> {
        values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    };
    let limit = |value: usize| (value > 0).then_some(value);
    (
        Selections {
            brand: collect(&args.brands),
            country: collect(&args.countries),
            gender: collect(&args.genders),
        },
        DefaultLimits {
            brand: limit(args.default_brands),
            country: limit(args.default_countries),
            gender: limit(args.default_genders),
        },
    )
}

fn apply_selection(table: &Table, schema: &DatasetSchema, args: &SelectionArgs) -> FilterOutcome {
    if args.all_rows {
        return FilterOutcome {
            table: table.clone(),
            matched: table.len(),
            fell_back: false,
            dimensions: Vec::new(),
        };
    }
    let (selections, limits) = selections_from_args(args);
    let outcome = filter::apply(table, schema, &selections, &limits);
    info!(
        "Filtered to {} of {} row(s){}",
        outcome.table.len(),
        table.len(),
        if outcome.fell_back {
            " (no match; showing all rows)"
        } else {
            ""
        }
    );
    outcome
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn heading(title: &str) {
    println!("\n== {title} ==");
}

#[derive(Debug, Serialize)]
struct RowsView<'a> {
    columns: Vec<String>,
    rows: &'a [Row],
}

impl<'a> From<&'a Table> for RowsView<'a> {
    fn from(table: &'a Table) -> Self {
        Self {
            columns: table.headers(),
            rows: table.rows(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FilterView<'a> {
    matched: usize,
    rows: usize,
    fell_back: bool,
    dimensions: &'a [DimensionReport],
}

impl<'a> From<&'a FilterOutcome> for FilterView<'a> {
    fn from(outcome: &'a FilterOutcome) -> Self {
        Self {
            matched: outcome.matched,
            rows: outcome.table.len(),
            fell_back: outcome.fell_back,
            dimensions: &outcome.dimensions,
        }
    }
}

fn print_overview(overview: &Overview) {
    let rows = vec![
        vec!["Total Fragrances".to_string(), overview.total.to_string()],
        vec!["Unique Brands".to_string(), overview.unique_brands.to_string()],
        vec!["Avg Rating".to_string(), format_metric(overview.average_rating)],
        vec!["Countries".to_string(), overview.countries.to_string()],
        vec!["Filtered Results".to_string(), overview.filtered.to_string()],
    ];
    render::print_table(
        &["metric".to_string(), "value".to_string()],
        &rows,
        &[Align::Left, Align::Right],
    );
}

fn print_filter(outcome: &FilterOutcome) {
    if outcome.dimensions.is_empty() {
        println!("No categorical filter applied ({} rows)", outcome.table.len());
        return;
    }
    let rows = outcome
        .dimensions
        .iter()
        .map(|report| {
            vec![
                report.dimension.label().to_string(),
                format!("{}/{}", report.selected.len(), report.domain_size),
                (if report.defaulted { "default" } else { "explicit" }).to_string(),
                report.selected.join(", "),
            ]
        })
        .collect::<Vec<_>>();
    render::print_table(
        &[
            "dimension".to_string(),
            "selected".to_string(),
            "source".to_string(),
            "values".to_string(),
        ],
        &rows,
        &[Align::Left, Align::Right],
    );
    if outcome.fell_back {
        println!("Filter matched no rows; statistics use all {} rows", outcome.table.len());
    } else {
        println!("Filtered rows: {}", outcome.matched);
    }
}

fn print_summaries(summaries: &[(String, Summary)]) {
    let rows = summaries
        .iter()
        .map(|(column, summary)| {
            vec![
                column.clone(),
                summary.count.to_string(),
                format_metric(summary.mean),
                format_metric(summary.median),
                format_metric(summary.std_dev),
                format_metric(summary.min),
                format_metric(summary.max),
            ]
        })
        .collect::<Vec<_>>();
    let headers = ["column", "count", "mean", "median", "std_dev", "min", "max"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let mut alignments = vec![Align::Left];
    alignments.extend([Align::Right; 6]);
    render::print_table(&headers, &rows, &alignments);
}

fn print_rows(table: &Table) {
    let alignments = table
        .columns()
        .iter()
        .map(|column| match column.kind {
            ColumnKind::Numeric => Align::Right,
            ColumnKind::Text => Align::Left,
        })
        .collect::<Vec<_>>();
    render::print_table(&table.headers(), &table.display_rows(), &alignments);
}

fn print_value_counts(label: &str, counts: &[ValueCount]) {
    let rows = counts
        .iter()
        .map(|entry| vec![entry.value.clone(), entry.count.to_string()])
        .collect::<Vec<_>>();
    render::print_table(
        &[label.to_string(), "count".to_string()],
        &rows,
        &[Align::Left, Align::Right],
    );
}

fn print_group_ranks(label: &str, ranks: &[GroupRank]) {
    let rows = ranks
        .iter()
        .map(|entry| {
            vec![
                entry.key.clone(),
                format!("{:.2}", entry.mean),
                entry.count.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render::print_table(
        &[label.to_string(), "mean".to_string(), "count".to_string()],
        &rows,
        &[Align::Left, Align::Right, Align::Right],
    );
}

fn print_histogram(bins: &[HistogramBin]) {
    let rows = bins
        .iter()
        .map(|bin| {
            vec![
                format_number(bin.lower),
                format_number(bin.upper),
                bin.count.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render::print_table(
        &["lower".to_string(), "upper".to_string(), "count".to_string()],
        &rows,
        &[Align::Right, Align::Right, Align::Right],
    );
}

fn print_layers(rankings: &[LayerRanking]) {
    for ranking in rankings {
        heading(&format!("{} notes", capitalize(ranking.layer.label())));
        let rows = ranking
            .tokens
            .iter()
            .map(|entry| vec![entry.token.clone(), entry.count.to_string()])
            .collect::<Vec<_>>();
        render::print_table(
            &["note".to_string(), "count".to_string()],
            &rows,
            &[Align::Left, Align::Right],
        );
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn overview(args: &OverviewArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let overview = stats::overview(&session.full, session.filtered(), session.schema());
    match args.output.format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct View<'a> {
                overview: &'a Overview,
                filter: FilterView<'a>,
            }
            emit_json(&View {
                overview: &overview,
                filter: FilterView::from(&session.outcome),
            })
        }
        OutputFormat::Text => {
            print_overview(&overview);
            heading("Filters");
            print_filter(&session.outcome);
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct DomainView {
    dimension: Dimension,
    column: String,
    values: Vec<String>,
    defaults: Vec<String>,
}

pub fn domains(args: &DomainsArgs) -> Result<()> {
    let options = load_options(&args.dataset)?;
    let mut loader = DatasetLoader::new(options);
    let table = loader.load(&args.dataset.input)?;
    let (_, limits) = selections_from_args(&args.selection);
    let views = Dimension::ALL
        .iter()
        .map(|&dimension| {
            let column = loader.schema().dimension_column(dimension);
            DomainView {
                dimension,
                column: column.to_string(),
                values: table.domain(column),
                defaults: filter::default_selection(&table, column, limits.get(dimension))
                    .into_iter()
                    .collect(),
            }
        })
        .collect::<Vec<_>>();
    match args.output.format {
        OutputFormat::Json => emit_json(&views),
        OutputFormat::Text => {
            for view in &views {
                heading(&format!("{} ({})", view.dimension.label(), view.column));
                let rows = view
                    .values
                    .iter()
                    .map(|value| {
                        let marker = if view.defaults.contains(value) { "*" } else { "" };
                        vec![value.clone(), marker.to_string()]
                    })
                    .collect::<Vec<_>>();
                render::print_table(&["value".to_string(), "default".to_string()], &rows, &[]);
            }
            Ok(())
        }
    }
}

pub fn summary_stats(args: &StatsArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let columns = if args.columns.is_empty() {
        vec![session.schema().rating_value.clone()]
    } else {
        args.columns.clone()
    };
    let summaries = columns
        .iter()
        .map(|column| {
            stats::summarize(session.filtered(), column)
                .map(|summary| (column.clone(), summary))
                .with_context(|| format!("Summarizing column '{column}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    info!("Computed summary statistics for {} column(s)", summaries.len());
    match args.output.format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct View<'a> {
                column: &'a str,
                #[serde(flatten)]
                summary: &'a Summary,
            }
            emit_json(
                &summaries
                    .iter()
                    .map(|(column, summary)| View { column, summary })
                    .collect::<Vec<_>>(),
            )
        }
        OutputFormat::Text => {
            print_summaries(&summaries);
            Ok(())
        }
    }
}

fn default_top_columns(schema: &DatasetSchema, table: &Table, by: &str) -> Vec<String> {
    [schema.name.as_str(), schema.brand.as_str(), by]
        .into_iter()
        .filter(|column| table.column_index(column).is_some())
        .map(str::to_string)
        .collect()
}

pub fn top(args: &TopArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let by = args
        .by
        .clone()
        .unwrap_or_else(|| session.schema().rating_value.clone());
    let columns = if args.columns.is_empty() {
        default_top_columns(session.schema(), session.filtered(), &by)
    } else {
        args.columns.clone()
    };
    let ranked = stats::top_n(session.filtered(), &by, args.top, &columns)
        .with_context(|| format!("Ranking rows by '{by}'"))?;
    match args.output.format {
        OutputFormat::Json => emit_json(&RowsView::from(&ranked)),
        OutputFormat::Text => {
            print_rows(&ranked);
            Ok(())
        }
    }
}

pub fn rank(args: &RankArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let group = args
        .group
        .clone()
        .unwrap_or_else(|| session.schema().brand.clone());
    let value = args
        .value
        .clone()
        .unwrap_or_else(|| session.schema().rating_value.clone());
    let ranks = stats::group_rank(session.filtered(), &group, &value, args.top)
        .with_context(|| format!("Ranking '{group}' by mean '{value}'"))?;
    match args.output.format {
        OutputFormat::Json => emit_json(&ranks),
        OutputFormat::Text => {
            print_group_ranks(&group, &ranks);
            Ok(())
        }
    }
}

pub fn counts(args: &CountsArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let column = args
        .column
        .clone()
        .unwrap_or_else(|| session.schema().brand.clone());
    let counts = stats::value_counts(session.filtered(), &column, args.top)
        .with_context(|| format!("Counting values of '{column}'"))?;
    match args.output.format {
        OutputFormat::Json => emit_json(&counts),
        OutputFormat::Text => {
            print_value_counts(&column, &counts);
            Ok(())
        }
    }
}

pub fn notes(args: &NotesArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let layers: &[NoteLayer] = if args.layers.is_empty() {
        &NoteLayer::ALL
    } else {
        &args.layers
    };
    let rankings = layers
        .iter()
        .map(|&layer| notes::top_notes(session.filtered(), session.schema(), layer, args.top))
        .collect::<Vec<_>>();
    match args.output.format {
        OutputFormat::Json => emit_json(&rankings),
        OutputFormat::Text => {
            print_layers(&rankings);
            Ok(())
        }
    }
}

pub fn histogram(args: &HistogramArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let column = args
        .column
        .clone()
        .unwrap_or_else(|| session.schema().rating_value.clone());
    let bins = stats::histogram(session.filtered(), &column, args.bins)
        .with_context(|| format!("Binning '{column}'"))?;
    match args.output.format {
        OutputFormat::Json => emit_json(&bins),
        OutputFormat::Text => {
            if bins.is_empty() {
                println!("No rating data available");
            } else {
                print_histogram(&bins);
            }
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct Dashboard<'a> {
    overview: Overview,
    filter: FilterView<'a>,
    rating_summary: Summary,
    rating_histogram: Vec<HistogramBin>,
    gender_counts: Vec<ValueCount>,
    top_rated: RowsView<'a>,
    most_reviewed: RowsView<'a>,
    top_brands: Vec<ValueCount>,
    brand_ratings: Vec<GroupRank>,
    top_countries: Vec<ValueCount>,
    country_ratings: Vec<GroupRank>,
    notes: Vec<LayerRanking>,
}

pub fn dashboard(args: &DashboardArgs) -> Result<()> {
    let session = Session::open(&args.dataset, &args.selection)?;
    let schema = session.schema();
    let table = session.filtered();
    let rating = schema.rating_value.as_str();
    let reviews = schema.rating_count.as_str();

    let top_rated = stats::top_n(
        table,
        rating,
        args.top_rows,
        &default_top_columns(schema, table, rating),
    )
    .with_context(|| format!("Ranking rows by '{rating}'"))?;
    let most_reviewed = stats::top_n(
        table,
        reviews,
        args.top_rows,
        &default_top_columns(schema, table, reviews),
    )
    .with_context(|| format!("Ranking rows by '{reviews}'"))?;

    let dashboard = Dashboard {
        overview: stats::overview(&session.full, table, schema),
        filter: FilterView::from(&session.outcome),
        rating_summary: stats::summarize(table, rating)
            .with_context(|| format!("Summarizing column '{rating}'"))?,
        rating_histogram: stats::histogram(table, rating, 30)
            .with_context(|| format!("Binning '{rating}'"))?,
        gender_counts: stats::value_counts(table, &schema.gender, usize::MAX)
            .with_context(|| format!("Counting values of '{}'", schema.gender))?,
        top_rated: RowsView::from(&top_rated),
        most_reviewed: RowsView::from(&most_reviewed),
        top_brands: stats::value_counts(table, &schema.brand, args.top_groups)
            .with_context(|| format!("Counting values of '{}'", schema.brand))?,
        brand_ratings: stats::group_rank(table, &schema.brand, rating, args.top_groups)
            .with_context(|| format!("Ranking '{}' by mean '{rating}'", schema.brand))?,
        top_countries: stats::value_counts(table, &schema.country, args.top_groups)
            .with_context(|| format!("Counting values of '{}'", schema.country))?,
        country_ratings: stats::group_rank(table, &schema.country, rating, args.top_groups)
            .with_context(|| format!("Ranking '{}' by mean '{rating}'", schema.country))?,
        notes: notes::top_notes_by_layer(table, schema, args.top_groups),
    };
    info!(
        "Built dashboard over {} of {} row(s) (cache builds: {})",
        table.len(),
        session.full.len(),
        session.loader.cache().builds()
    );

    match args.output.format {
        OutputFormat::Json => emit_json(&dashboard),
        OutputFormat::Text => {
            heading("Overview");
            print_overview(&dashboard.overview);
            heading("Filters");
            print_filter(&session.outcome);
            heading("Ratings");
            print_summaries(&[(rating.to_string(), dashboard.rating_summary)]);
            heading("Rating distribution");
            if dashboard.rating_histogram.is_empty() {
                println!("No rating data available");
            } else {
                print_histogram(&dashboard.rating_histogram);
            }
            heading("Fragrances by gender");
            print_value_counts(&schema.gender, &dashboard.gender_counts);
            heading(&format!("Top {} highest rated", args.top_rows));
            print_rows(&top_rated);
            heading(&format!("Top {} most reviewed", args.top_rows));
            print_rows(&most_reviewed);
            heading(&format!("Top {} brands", args.top_groups));
            print_value_counts(&schema.brand, &dashboard.top_brands);
            heading(&format!("Top {} brands by avg rating", args.top_groups));
            print_group_ranks(&schema.brand, &dashboard.brand_ratings);
            heading(&format!("Top {} countries", args.top_groups));
            print_value_counts(&schema.country, &dashboard.top_countries);
            heading(&format!("Top {} countries by avg rating", args.top_groups));
            print_group_ranks(&schema.country, &dashboard.country_ratings);
            print_layers(&dashboard.notes);
            Ok(())
        }
    }
}

pub fn schema_init(args: &SchemaInitArgs) -> Result<()> {
    let schema = DatasetSchema::default();
    match &args.output {
        Some(path) => {
            schema
                .save(path)
                .with_context(|| format!("Writing schema to {path:?}"))?;
            info!("Default schema written to {:?}", path);
        }
        None => print!("{}", schema.to_yaml_string()?),
    }
    Ok(())
}

//! Check-in KNN CLI Module
//!
//! Command-line interface for training, tuning and inspecting check-in data.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::optimizer::{GridSearchConfig, ParamGrid, ParamSet};
use crate::preprocessing::{CheckinData, CheckinLoader};
use crate::utils::DataLoader;
use crate::training::{SearchSpec, TrainEngine, TrainingConfig, TrainingReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "checkin-knn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict check-in places with k-nearest neighbors")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that reads check-in data
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Check-in CSV (row_id, x, y, accuracy, time, place_id)
    #[arg(short, long)]
    pub data: PathBuf,

    /// JSON training configuration; explicit flags override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Drop places with this many check-ins or fewer
    #[arg(long)]
    pub min_count: Option<usize>,

    /// Field separator (default: inferred from the file extension)
    #[arg(long)]
    pub delimiter: Option<char>,
}

/// Options shared by train and search
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Fraction of rows held out for testing
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Seed for the hold-out split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Distance metric (euclidean, manhattan, cosine, minkowski)
    #[arg(long)]
    pub metric: Option<String>,

    /// Minkowski power (implies the minkowski metric)
    #[arg(long = "minkowski-p")]
    pub p: Option<f64>,

    /// Write the full report as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit a single classifier and score it on the hold-out set
    Train {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Number of neighbors
        #[arg(short = 'k', long)]
        neighbors: Option<usize>,

        /// Vote weighting (uniform, distance)
        #[arg(long)]
        weights: Option<String>,
    },

    /// Tune hyperparameters with grid search cross-validation
    Search {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Candidate neighbor counts
        #[arg(short = 'k', long, value_delimiter = ',')]
        neighbors: Vec<usize>,

        /// Candidate vote weightings
        #[arg(long, value_delimiter = ',')]
        weights: Vec<String>,

        /// Number of cross-validation folds
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Parallel workers (1 = sequential, 0 = all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show what the check-in filters keep
    Info {
        #[command(flatten)]
        data: DataArgs,
    },
}

// ─── Configuration ─────────────────────────────────────────────────────────────

/// Neighbor counts searched when neither flags nor config name a grid
const DEFAULT_NEIGHBOR_GRID: [i64; 3] = [3, 5, 10];

fn base_config(data: &DataArgs) -> anyhow::Result<TrainingConfig> {
    let mut config = match &data.config {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(count) = data.min_count {
        config.filter.min_place_count = count;
    }
    Ok(config)
}

fn apply_run_args(mut config: TrainingConfig, run: &RunArgs) -> anyhow::Result<TrainingConfig> {
    if let Some(test_size) = run.test_size {
        config.test_size = test_size;
    }
    if let Some(seed) = run.seed {
        config.random_state = seed;
    }

    let mut params = ParamSet::new();
    if let Some(metric) = &run.metric {
        params.insert("metric", metric.as_str());
    }
    if let Some(p) = run.p {
        params.insert("p", p);
    }
    if !params.is_empty() {
        config.knn = config.knn.with_params(&params)?;
    }
    Ok(config)
}

fn checkin_loader(config: &TrainingConfig, data: &DataArgs) -> anyhow::Result<CheckinLoader> {
    let loader = CheckinLoader::new(config.filter.clone());
    match data.delimiter {
        None => Ok(loader),
        Some(c) if c.is_ascii() => Ok(loader.with_loader(DataLoader::new().with_delimiter(c as u8))),
        Some(c) => anyhow::bail!("Delimiter must be a single ASCII character, got '{}'", c),
    }
}

fn load_checkins(loader: &CheckinLoader, path: &Path) -> anyhow::Result<CheckinData> {
    step_run("Loading check-ins");
    let start = Instant::now();
    let data = loader.load_csv(path)?;
    step_done(&format!(
        "{} of {} rows, {} places in {:?}",
        data.stats.rows_kept,
        data.stats.rows_read,
        data.stats.places_kept,
        start.elapsed()
    ));
    info!(rows_read = data.stats.rows_read, rows_kept = data.stats.rows_kept, "Loaded check-ins");
    Ok(data)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data: &DataArgs,
    run: &RunArgs,
    neighbors: Option<usize>,
    weights: Option<&str>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = apply_run_args(base_config(data)?, run)?;
    if let Some(k) = neighbors {
        config.knn.n_neighbors = k;
    }
    if let Some(w) = weights {
        config.knn.weights = w.parse()?;
    }
    config.search = None;

    let checkins = load_checkins(&checkin_loader(&config, data)?, &data.data)?;

    step_run(&format!("Training {}", format!("k={}", config.knn.n_neighbors).cyan()));
    let (_, report) = TrainEngine::new(config).run(&checkins.dataset)?;
    step_done(&format!("{:.3}s", report.training_time_secs));

    print_report(&report);
    write_json(&report, run.json.as_deref())
}

pub fn cmd_search(
    data: &DataArgs,
    run: &RunArgs,
    neighbors: &[usize],
    weights: &[String],
    cv_folds: Option<usize>,
    jobs: Option<usize>,
) -> anyhow::Result<()> {
    section("Grid Search");

    let mut config = apply_run_args(base_config(data)?, run)?;
    let SearchSpec { mut grid, mut cv } = config.search.take().unwrap_or_else(|| SearchSpec {
        grid: ParamGrid::new().with_param("n_neighbors", DEFAULT_NEIGHBOR_GRID),
        cv: GridSearchConfig::default(),
    });

    if !neighbors.is_empty() {
        grid.add("n_neighbors", neighbors.iter().copied());
    }
    if !weights.is_empty() {
        grid.add("weights", weights.iter().map(String::as_str));
    }
    if let Some(folds) = cv_folds {
        cv.cv_folds = folds;
    }
    if let Some(n_jobs) = jobs {
        cv.n_jobs = n_jobs;
    }

    for name in grid.names() {
        let values: Vec<String> = grid.values(name).unwrap_or_default().iter().map(|v| v.to_string()).collect();
        println!("  {:<16} {}", muted(name), values.join(", "));
    }

    let n_candidates = grid.n_combinations();
    let n_folds = cv.cv_folds;
    let config = config.with_search(grid, cv);
    config.validate()?;

    let checkins = load_checkins(&checkin_loader(&config, data)?, &data.data)?;

    step_run(&format!(
        "Searching {} candidates × {} folds",
        n_candidates.to_string().cyan(),
        n_folds.to_string().cyan()
    ));
    let (_, report) = TrainEngine::new(config).run(&checkins.dataset)?;
    step_done(&format!("{:.3}s", report.training_time_secs));
    info!(test_accuracy = report.test_accuracy, "Grid search finished");

    print_report(&report);
    write_json(&report, run.json.as_deref())
}

pub fn cmd_info(data: &DataArgs) -> anyhow::Result<()> {
    section("Data Info");

    let config = base_config(data)?;
    let loader = checkin_loader(&config, data)?;
    let checkins = load_checkins(&loader, &data.data)?;
    let stats = &checkins.stats;
    let filter = loader.filter();

    println!();
    println!("  {:<16} {}", muted("File"), data.data.display());
    println!("  {:<16} {}", muted("Rows read"), stats.rows_read);
    println!(
        "  {:<16} {} {}",
        muted("In window"),
        stats.rows_in_bounds,
        dim(&format!("x in {:?}, y in {:?}", filter.x_range, filter.y_range))
    );
    println!(
        "  {:<16} {} {}",
        muted("Kept"),
        stats.rows_kept,
        dim(&format!("places with > {} check-ins", filter.min_place_count))
    );
    println!("  {:<16} {} kept, {} dropped", muted("Places"), stats.places_kept, stats.places_dropped);
    println!("  {:<16} {}", muted("Features"), checkins.dataset.feature_names.join(", "));
    println!();

    Ok(())
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn print_report(report: &TrainingReport<i64>) {
    println!();
    println!("  {:<16} {}", muted("Train / test"), format!("{} / {}", report.n_train, report.n_test).white());
    println!("  {:<16} {}", muted("Places"), report.n_classes.to_string().white());
    println!(
        "  {:<16} k={} {:?} {:?}",
        muted("Classifier"),
        report.knn.n_neighbors,
        report.knn.weights,
        report.knn.metric
    );

    if let Some(search) = &report.search {
        section("Candidates");
        let fold_header: String = (0..search.n_folds).map(|f| format!("{:>8}", format!("fold{}", f))).collect();
        println!("  {:<5} {:<36} {:>8} {:>8}{}", muted("Rank"), muted("Params"), muted("Mean"), muted("Std"), muted(&fold_header));

        for candidate in &search.cv_results {
            let folds: String = candidate.fold_scores.iter().map(|s| format!("{:>8.4}", s)).collect();
            let line = format!(
                "{:<5} {:<36} {:>8.4} {:>8.4}{}",
                candidate.rank,
                candidate.params.to_string(),
                candidate.mean_score,
                candidate.std_score,
                folds
            );
            if candidate.params == search.best_params {
                println!("  {}", line.white().bold());
            } else {
                println!("  {}", line);
            }
        }

        println!();
        println!("  {:<16} {}", muted("Best params"), search.best_params.to_string().cyan());
        println!("  {:<16} {}", muted("Best CV score"), format!("{:.4}", search.best_score).white().bold());
    }

    println!("  {:<16} {}", muted("Test accuracy"), format!("{:.4}", report.test_accuracy).white().bold());
    println!();
}

fn write_json(report: &TrainingReport<i64>, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
        step_ok(&format!("Report written to {}", path.display()));
    }
    Ok(())
}

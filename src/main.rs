// Entry point and interactive report menu.
//
// - Option [1] loads the reference CSVs and prints load diagnostics.
// - Option [2] writes the coverage report.
// - Option [3] asks for a month and writes its per-division breakdown.
// - Option [4] writes the comprehensive evaluation, one ranking per metric
//   and a JSON summary.
// Every report first moves overdue tasks to `finished`.
use anyhow::Result;
use clap::Parser;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::error;
use tracing_subscriber::EnvFilter;

use unit_scorecard::config::AppConfig;
use unit_scorecard::types::RankMetric;
use unit_scorecard::util::format_int;
use unit_scorecard::{
    coverage, evaluation, lifecycle, loader, monthly, output, EvaluationFilter, MemoryStore,
};

// Loaded once, reused by every report in the session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { store: None }));

struct AppState {
    store: Option<Arc<MemoryStore>>,
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Report Selection (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Parse `YYYY-MM` into `(year, month)`.
fn parse_period(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.trim().split_once('-')?;
    let year = y.parse::<i32>().ok()?;
    let month = m.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
    Some((year, month))
}

fn loaded_store() -> Option<Arc<MemoryStore>> {
    match APP_STATE.lock() {
        Ok(state) => state.store.clone(),
        Err(_) => None,
    }
}

fn handle_load(cfg: &AppConfig) {
    match loader::load_directory(&cfg.data_dir) {
        Ok((store, report)) => {
            println!(
                "Loaded {} divisions, {} municipalities, {} tasks, {} deliveries ({} rows read)",
                format_int(report.divisions),
                format_int(report.municipalities),
                format_int(report.tasks),
                format_int(report.deliveries),
                format_int(report.total_rows)
            );
            if report.parse_errors > 0 || report.orphan_deliveries > 0 {
                println!(
                    "Note: {} rows skipped due to parse/validation errors, {} orphan deliveries.",
                    format_int(report.parse_errors),
                    format_int(report.orphan_deliveries)
                );
            }
            println!();
            if let Ok(mut state) = APP_STATE.lock() {
                state.store = Some(Arc::new(store));
            }
        }
        Err(e) => eprintln!("Failed to load data: {:#}\n", e),
    }
}

fn handle_coverage(cfg: &AppConfig, store: &MemoryStore) -> Result<()> {
    let perf = coverage::compute_unit_performance(store)?;
    let rows = coverage::coverage_rows(&perf);
    let file = cfg.output_dir.join("report_coverage.csv");
    output::write_csv(&file, &rows)?;
    println!("Task Coverage by Municipality\n");
    output::preview_table_rows(&rows, 5);
    println!("(Full table exported to {})\n", file.display());
    Ok(())
}

fn handle_monthly(cfg: &AppConfig, store: &MemoryStore) -> Result<()> {
    let Some((year, month)) = parse_period(&prompt("Period (YYYY-MM): ")) else {
        println!("Invalid period. Expected YYYY-MM.\n");
        return Ok(());
    };
    let report = monthly::compute_monthly_performance(store, year, month)?;
    let rows = monthly::monthly_rows(&report);
    let file = cfg
        .output_dir
        .join(format!("report_monthly_{}.csv", report.period_label));
    output::write_csv(&file, &rows)?;
    println!("Monthly Breakdown {}\n", report.period_label);
    output::preview_table_rows(&rows, 8);
    println!("(Full table exported to {})\n", file.display());
    Ok(())
}

fn handle_evaluation(cfg: &AppConfig, store: &MemoryStore) -> Result<()> {
    let filter = EvaluationFilter::all();
    let evals = evaluation::evaluate_all_units(store, &filter)?;
    let rows = evaluation::evaluation_rows(&evals);
    let file = cfg.output_dir.join("report_evaluation.csv");
    output::write_csv(&file, &rows)?;
    println!("Comprehensive Evaluation (by Composite Score)\n");
    output::preview_table_rows(&rows, 5);
    println!("(Full table exported to {})\n", file.display());

    for metric in RankMetric::ALL {
        let ranking = evaluation::rank_evaluations(&evals, metric);
        let rows = evaluation::ranking_rows(&ranking, metric);
        let file = cfg.output_dir.join(format!("ranking_{}.csv", metric));
        output::write_csv(&file, &rows)?;
        println!("Top Municipalities by {}\n", metric);
        output::preview_table_rows(&rows, 3);
    }

    let summary = evaluation::summarize(&evals);
    output::write_json(&cfg.output_dir.join("summary.json"), &summary)?;
    println!("Summary Stats (summary.json):");
    println!("{}\n", serde_json::to_string(&summary)?);
    Ok(())
}

fn run_report(cfg: &AppConfig, choice: &str) {
    let Some(store) = loaded_store() else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };
    lifecycle::refresh_task_statuses(&*store, cfg.reference_now());
    let result = match choice {
        "2" => handle_coverage(cfg, &store),
        "3" => handle_monthly(cfg, &store),
        _ => handle_evaluation(cfg, &store),
    };
    if let Err(e) = result {
        error!(error = %e, "report generation failed");
        eprintln!("Report failed: {:#}\n", e);
    }
}

fn main() -> Result<()> {
    let cfg = AppConfig::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .init();

    if !Path::new(&cfg.output_dir).is_dir() {
        std::fs::create_dir_all(&cfg.output_dir)?;
    }

    loop {
        println!("Select Report:");
        println!("[1] Load the data");
        println!("[2] Coverage by municipality");
        println!("[3] Monthly breakdown");
        println!("[4] Comprehensive evaluation and rankings\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_load(&cfg),
            choice @ ("2" | "3" | "4") => {
                println!();
                run_report(&cfg, choice);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
    Ok(())
}

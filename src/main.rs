use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use upf_scanner::{
    load_config, AnalysisResult, ImageSource, LabelReport, LabelScanner, MissingIngredientsResult,
    ScanError,
};

/// Photograph an ingredients list, find out what's really inside.
#[derive(Debug, Parser)]
#[command(name = "upf-scanner", version, about)]
struct Cli {
    /// Photo of the ingredients list (JPEG, PNG or WebP)
    image: String,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Show the raw model reply when it cannot be parsed
    #[arg(long)]
    raw: bool,

    /// Model to use (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a TOML config file
    #[arg(long, env = "UPF_SCANNER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize report: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_report(&report);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err.user_message());
            if cli.raw {
                if let Some(raw) = err.raw_response() {
                    eprintln!("\n--- raw response ---\n{}", raw);
                }
            }
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: &Cli) -> Result<LabelReport, ScanError> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }

    let scanner = LabelScanner::from_config(&config)?;
    scanner.scan(&ImageSource::Path(cli.image.clone())).await
}

fn exit_code(err: &ScanError) -> u8 {
    match err {
        ScanError::Configuration(_) | ScanError::Config(_) | ScanError::Builder(_) => 2,
        ScanError::ImageRead(_) | ScanError::UnsupportedImage(_) => 3,
        ScanError::Transport { .. } => 4,
        ScanError::ContentBlocked { .. } => 5,
        ScanError::MalformedJson { .. } | ScanError::SchemaMismatch { .. } => 6,
    }
}

fn print_report(report: &LabelReport) {
    match report {
        LabelReport::Analysis(result) => print_analysis(result),
        LabelReport::MissingIngredients(missing) => print_missing(missing),
    }
}

fn print_missing(missing: &MissingIngredientsResult) {
    println!("No ingredients list found");
    println!("{}", missing.message);
}

fn print_analysis(result: &AnalysisResult) {
    println!("Verdict");
    println!("  {}", result.verdict);
    println!();

    println!(
        "Simple: {}%   Ultra processed: {}%",
        result.stats.simple_pct, result.stats.ultra_processed_pct
    );
    println!("  [{}]", progress_bar(result.stats.simple_pct, 30));
    println!("  {} ingredients in total", result.stats.total_count);
    println!();

    println!("Heaviest ingredients (top 3 by weight)");
    for (i, item) in result.top_3_by_mass.iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
    println!();

    println!("Ultra-processed ingredients");
    for item in &result.lists.ultra {
        println!("  - {}", item);
    }
    println!();

    println!("Simple ingredients");
    for item in &result.lists.simple {
        println!("  - {}", item);
    }

    let issues = result.validation_issues();
    if !issues.is_empty() {
        println!();
        println!("Warnings");
        for issue in issues {
            println!("  ! {}", issue);
        }
    }
}

fn progress_bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

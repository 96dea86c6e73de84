use std::path::{Path, PathBuf};

use serde::Deserialize;

use retriage::cli::{Cli, Commands, ConfigAction};
use retriage::config::Config;
use retriage::engine::Engine;
use retriage::error::{Result, RetriageError};
use retriage::index::ReportFields;

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Detect {
            id,
            reports,
            program,
            limit,
            json,
        } => {
            cmd_detect(cli.config, &reports, &id, program.as_deref(), limit, json)?;
        }
        Commands::Batch {
            ids,
            reports,
            program,
            json,
        } => {
            cmd_batch(cli.config, &reports, &ids, program.as_deref(), json)?;
        }
        Commands::Clusters {
            reports,
            program,
            threshold,
            json,
        } => {
            cmd_clusters(cli.config, &reports, program.as_deref(), threshold, json)?;
        }
        Commands::Stats { reports } => {
            cmd_stats(cli.config, &reports)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("retriage=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// One line of the system-of-record export: an id plus the raw fields
#[derive(Debug, Deserialize)]
struct RawReport {
    id: String,
    #[serde(flatten)]
    fields: ReportFields,
}

/// Rebuild the engine corpus from a JSONL export
fn build_engine(config_path: Option<PathBuf>, reports_path: &Path) -> Result<Engine> {
    let config = load_config(config_path)?;
    let engine = Engine::new(config);

    let content = std::fs::read_to_string(reports_path).map_err(|e| RetriageError::Io {
        source: e,
        context: format!("Failed to read reports file: {:?}", reports_path),
    })?;

    let mut count = 0usize;
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawReport = serde_json::from_str(line).map_err(|e| RetriageError::Json {
            source: e,
            context: format!("{}:{}", reports_path.display(), line_no + 1),
        })?;
        engine.add_report(raw.id, &raw.fields);
        count += 1;
    }

    tracing::info!(reports = count, "corpus rebuilt from {}", reports_path.display());
    Ok(engine)
}

fn cmd_detect(
    config_path: Option<PathBuf>,
    reports_path: &Path,
    id: &str,
    program: Option<&str>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let engine = build_engine(config_path, reports_path)?;
    let result = engine.detect_duplicates(id, program, limit)?;

    if json {
        println!("{}", to_json(&result)?);
        return Ok(());
    }

    println!("Duplicate candidates for {}", result.query_id);
    println!("  Checked in {} ms", result.detection_time_ms);

    if result.matches.is_empty() {
        println!("  No candidates found");
        return Ok(());
    }

    println!();
    println!("  {:<20} {:>8} {:>8} {:>8} {:>8} {:>8}  dup?", "report", "overall", "title", "descr", "code", "url");
    for m in &result.matches {
        println!(
            "  {:<20} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3}  {}",
            m.report_id,
            m.overall_score,
            m.title_similarity,
            m.description_similarity,
            m.code_similarity,
            m.url_similarity,
            if m.is_duplicate { "yes" } else { "no" },
        );
    }

    Ok(())
}

fn cmd_batch(
    config_path: Option<PathBuf>,
    reports_path: &Path,
    ids: &[String],
    program: Option<&str>,
    json: bool,
) -> Result<()> {
    let engine = build_engine(config_path, reports_path)?;
    let results = engine.batch_detect(ids, program);

    if json {
        println!("{}", to_json(&results)?);
        return Ok(());
    }

    println!("Batch detection: {} of {} ids processed", results.len(), ids.len());
    for result in &results {
        match &result.highest_match {
            Some(best) => println!(
                "  {} -> {} (overall {:.3}, duplicate: {})",
                result.query_id,
                best.report_id,
                best.overall_score,
                if best.is_duplicate { "yes" } else { "no" },
            ),
            None => println!("  {} -> no candidates", result.query_id),
        }
    }

    Ok(())
}

fn cmd_clusters(
    config_path: Option<PathBuf>,
    reports_path: &Path,
    program: Option<&str>,
    threshold: Option<f64>,
    json: bool,
) -> Result<()> {
    let engine = build_engine(config_path, reports_path)?;
    let clusters = engine.find_duplicate_clusters(program, threshold);

    if json {
        println!("{}", to_json(&clusters)?);
        return Ok(());
    }

    if clusters.is_empty() {
        println!("No duplicate clusters found");
        return Ok(());
    }

    println!("{} duplicate cluster(s)", clusters.len());
    for (i, cluster) in clusters.iter().enumerate() {
        let members: Vec<&str> = cluster.reports.iter().map(String::as_str).collect();
        println!("  #{}: {} reports: {}", i + 1, cluster.len(), members.join(", "));
    }

    Ok(())
}

fn cmd_stats(config_path: Option<PathBuf>, reports_path: &Path) -> Result<()> {
    let engine = build_engine(config_path, reports_path)?;
    let stats = engine.get_statistics();

    println!("Corpus statistics");
    println!("=================");
    println!("Reports indexed: {}", stats.reports_indexed);
    println!("Unique terms:    {}", stats.unique_terms);
    println!("\nThresholds:");
    println!("  overall:     {:.2}", stats.thresholds.overall);
    println!("  title:       {:.2}", stats.thresholds.title);
    println!("  description: {:.2}", stats.thresholds.description);
    println!("  code:        {:.2}", stats.thresholds.code);
    println!("  url:         {:.2}", stats.thresholds.url);

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("{}", to_json(&config)?);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RetriageError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            // Load already runs the validator
            let _ = Config::load(&path)?;
            println!("✓ Configuration is valid");
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'retriage config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| RetriageError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })
}

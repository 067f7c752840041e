//! Jumplab - force-plate jump trial analysis
//!
//! Segments jump trials into discrete events and normalizes each jump onto
//! a canonical time axis for cross-trial comparison.

use jumplab::app::cli::{Cli, Commands, ConfigAction};
use jumplab::app::config::Config;
use jumplab::batch::{BatchOptions, BatchRunner};
use jumplab::normalize::TimeNormalizer;
use jumplab::segmentation::detect_jumps;
use jumplab::series::{load_trial_csv, Condition};
use jumplab::table::JumpTable;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Run {
            data_dir,
            output,
            participants,
            serial,
            no_charts,
        } => {
            run_batch(data_dir, output, participants, serial, no_charts, &config)?;
        }
        Commands::Segment {
            input,
            condition,
            participant,
            tables_dir,
        } => {
            run_segment(&input, condition, &participant, tables_dir, &config)?;
        }
        Commands::Normalize {
            input,
            condition,
            participant,
            tables_dir,
            output,
        } => {
            run_normalize(&input, condition, &participant, &tables_dir, output, &config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn run_batch(
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    participants: Vec<String>,
    serial: bool,
    no_charts: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let batch = &config.batch;
    let options = BatchOptions {
        data_dir: data_dir.unwrap_or_else(|| batch.data_dir.clone()),
        output_dir: output.unwrap_or_else(|| batch.output_dir.clone()),
        participants: if participants.is_empty() {
            batch.participants.clone()
        } else {
            participants
        },
        parallel: batch.parallel && !serial,
        render_charts: batch.render_charts && !no_charts,
        chart_channels: batch.chart_channels.clone(),
    };

    info!(
        data_dir = %options.data_dir.display(),
        output_dir = %options.output_dir.display(),
        "starting batch"
    );

    let runner = BatchRunner::new(
        config.segmentation.clone(),
        config.normalization.clone(),
        options,
    );
    let summary = runner.run()?;

    println!("\nBatch complete");
    println!("  Run id:            {}", summary.run_id);
    println!("  Units processed:   {}", summary.processed_units);
    println!("  Units failed:      {}", summary.failed_units);
    println!("  Jumps detected:    {}", summary.total_jumps);
    println!("  Jumps normalized:  {}", summary.normalized_jumps);
    println!("  Jumps skipped:     {}", summary.skipped_jumps);

    for unit in summary.units.iter().filter(|u| u.error.is_some()) {
        let condition = unit
            .condition
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  FAILED {} / {}: {}",
            unit.participant,
            condition,
            unit.error.as_deref().unwrap_or("unknown error")
        );
    }

    if summary.processed_units == 0 && summary.failed_units > 0 {
        anyhow::bail!("every unit failed, see log for details");
    }
    Ok(())
}

fn run_segment(
    input: &Path,
    condition: Condition,
    participant: &str,
    tables_dir: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    info!("Segmenting {:?}", input);

    let series = load_trial_csv(input)?;
    let jumps = detect_jumps(&series, condition, &config.segmentation)?;

    println!("{} jumps detected in {}:", jumps.len(), input.display());
    for jump in &jumps {
        println!("Jump {}:", jump.index);
        println!("  Window start (buffered): {:.3} s", jump.start_ana);
        println!("  Takeoff:                 {:.3} s", jump.takeoff_time);
        println!("  Landing:                 {:.3} s", jump.landing_time);
        println!("  Window end (buffered):   {:.3} s", jump.end_ana);
        println!("  Flight duration:         {:.3} s", jump.flight_duration);
        if jump.clipped {
            println!("  (window clipped at series boundary)");
        }
    }

    if let Some(dir) = tables_dir {
        let mut table = JumpTable::new(participant);
        table.extend(jumps);
        let path = table.save(&dir)?;
        println!("Saved jump table to {}", path.display());
    }

    Ok(())
}

fn run_normalize(
    input: &Path,
    condition: Condition,
    participant: &str,
    tables_dir: &Path,
    output: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    info!("Normalizing {:?}", input);

    let series = load_trial_csv(input)?;
    let table = JumpTable::load(tables_dir, participant)?;
    let records = table.jumps_for(condition);
    if records.is_empty() {
        anyhow::bail!(
            "no jump table entries for {} {} in {}",
            participant,
            condition,
            tables_dir.display()
        );
    }

    let normalizer = TimeNormalizer::new(config.normalization.clone());
    let mut normalized = Vec::new();
    let mut skipped = 0usize;
    for &record in &records {
        match normalizer.normalize(&series, record)? {
            Some(jump) => normalized.push(jump),
            None => {
                warn!(key = %record.key(), "insufficient data for this jump, skipped");
                skipped += 1;
            }
        }
    }

    if normalized.is_empty() {
        anyhow::bail!("all {} jumps were skipped, nothing to write", records.len());
    }

    let output_path = output.unwrap_or_else(|| {
        input.with_file_name(format!("{participant}_{condition}_normalized.csv"))
    });
    jumplab::batch::write_normalized_csv(&output_path, &normalized)?;

    println!("Normalized {} of {} jumps", normalized.len(), records.len());
    if skipped > 0 {
        println!("  Skipped (insufficient data): {skipped}");
    }
    println!("  Output: {}", output_path.display());

    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bigtracks::config::load_and_validate_config;
use bigtracks::orchestrator::{render_board, FleetOrchestrator};
use bigtracks::storage::{rebuild_indices, TrackTable};

const DEFAULT_WATCH_SECONDS: u64 = 10;

fn usage(program: &str) -> String {
    format!(
        "Usage: {0} run <fleet.yaml> [--clear]\n\
         \x20      {0} run-one <fleet.yaml> <index> [--clear]\n\
         \x20      {0} status <fleet.yaml>\n\
         \x20      {0} watch <fleet.yaml> [seconds]\n\
         \x20      {0} reindex <table>\n\
         \x20      {0} inspect <table>",
        program
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("bigtracks");
    let clear = args.iter().any(|a| a == "--clear");
    let positional: Vec<&str> = args
        .iter()
        .skip(1)
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"))
        .collect();

    match positional.as_slice() {
        ["run", config] => run_fleet(config, clear).await,
        ["run-one", config, index] => {
            let index: usize = index
                .parse()
                .with_context(|| format!("'{}' is not a unit index", index))?;
            run_one(config, index, clear)
        }
        ["status", config] => show_status(config),
        ["watch", config] => watch(config, DEFAULT_WATCH_SECONDS).await,
        ["watch", config, seconds] => {
            let seconds: u64 = seconds
                .parse()
                .with_context(|| format!("'{}' is not a number of seconds", seconds))?;
            watch(config, seconds.max(1)).await
        }
        ["reindex", table] => reindex(table),
        ["inspect", table] => inspect(table),
        _ => bail!(usage(program)),
    }
}

async fn run_fleet(config_file: &str, clear: bool) -> Result<()> {
    let config = load_and_validate_config(config_file)?;
    let mut orchestrator = FleetOrchestrator::in_process(config);
    println!(
        "🚀 Tracking {} unit(s), at most {} at a time",
        orchestrator.units().len(),
        orchestrator.config().concurrency()
    );

    let mut failed = 0;
    for (index, result) in orchestrator.start_all(clear).await.into_iter().enumerate() {
        if let Err(e) = result {
            failed += 1;
            eprintln!("❌ Unit {} not started: {}", index, e);
        }
    }

    for (index, result) in orchestrator.wait_all().await {
        match result {
            Ok(summary) => println!(
                "✅ Unit {}: {} frames, {} rows, {} tracks in {:?}",
                index, summary.frames, summary.rows, summary.tracks, summary.duration
            ),
            Err(e) => {
                failed += 1;
                eprintln!("❌ Unit {} failed: {}", index, e);
            }
        }
    }

    println!();
    println!("{}", render_board(&orchestrator.status_board()));
    if failed > 0 {
        bail!("{} unit(s) did not finish", failed);
    }
    Ok(())
}

fn run_one(config_file: &str, index: usize, clear: bool) -> Result<()> {
    let config = load_and_validate_config(config_file)?;
    let orchestrator = FleetOrchestrator::in_process(config);
    let location = orchestrator.unit(index)?.location.clone();

    let summary = orchestrator
        .run_inline(index, clear)
        .with_context(|| format!("unit {} ({})", index, location.display()))?;
    println!(
        "✅ {}: {} frames, {} rows, {} tracks in {:?}",
        summary.output.display(),
        summary.frames,
        summary.rows,
        summary.tracks,
        summary.duration
    );
    Ok(())
}

fn show_status(config_file: &str) -> Result<()> {
    let config = load_and_validate_config(config_file)?;
    let orchestrator = FleetOrchestrator::in_process(config);
    println!("{}", render_board(&orchestrator.status_board()));
    Ok(())
}

async fn watch(config_file: &str, seconds: u64) -> Result<()> {
    let config = load_and_validate_config(config_file)?;
    let orchestrator = FleetOrchestrator::in_process(config);
    let interval = Duration::from_secs(seconds);

    loop {
        // Clear the terminal and home the cursor.
        print!("\x1b[2J\x1b[H");
        println!("{}", chrono::Local::now().format("%c"));
        println!("{}", render_board(&orchestrator.status_board()));

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn reindex(table: &str) -> Result<()> {
    let summary = rebuild_indices(table)?;
    println!(
        "🔧 {}: indexed {} rows, {} frames, {} tracks",
        table, summary.rows, summary.frames, summary.tracks
    );
    Ok(())
}

fn inspect(table: &str) -> Result<()> {
    let table = TrackTable::open(table)?;
    let rows = table.get_all()?;
    let tracks: BTreeSet<u32> = rows.iter().map(|r| r.track_id).collect();

    println!("📋 Table: {}", table.path().display());
    println!("   Rows:    {} (expected {})", table.row_count(), table.expected_rows());
    println!("   Tracks:  {}", tracks.len());
    if rows.is_empty() {
        println!("   Frames:  none");
    } else {
        let range = table.frame_range()?;
        println!(
            "   Frames:  {} ({}..={})",
            table.frames()?.len(),
            range.start(),
            range.end()
        );
    }
    println!(
        "   Indexed: {}",
        if table.is_indexed() { "yes" } else { "no (run did not finish)" }
    );
    Ok(())
}

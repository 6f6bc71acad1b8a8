// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scadforge CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use scadforge::diagnostics::Severity;
use scadforge::{BoundingBox, CacheStats, Kernel, KernelConfig, LogSink, MemorySink, Model, TracingSink};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scadforge")]
#[command(about = "OpenSCAD-compatible script interpreter and CSG kernel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./scadforge.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a SCAD file and print a model summary
    Render {
        /// Input SCAD file
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Print script messages after the summary instead of logging them
        #[arg(long)]
        show_log: bool,
    },

    /// Print the canonical construction tree of a SCAD file
    Tree {
        /// Input SCAD file
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Serialize)]
struct RenderSummary<'a> {
    file: &'a Path,
    faces: usize,
    closed: bool,
    volume: f64,
    bounding_box: BoundingBox,
    materials: Vec<String>,
    cache: CacheStats,
    render_ms: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    log: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            let mut config = KernelConfig::from_file(path)?;
            config.apply_env();
            config
        }
        None => KernelConfig::load()?,
    };

    match &cli.command {
        Commands::Render {
            input,
            json,
            show_log,
        } => render_command(config, input, *json, *show_log, cli.verbose),
        Commands::Tree { input } => tree_command(config, input),
        Commands::Version => {
            println!("scadforge v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
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

fn render_command(config: KernelConfig, input: &Path, json: bool, show_log: bool, verbose: bool) -> Result<()> {
    if !input.exists() {
        eprintln!("{} Input file not found: {}", "Error:".red().bold(), input.display());
        std::process::exit(1);
    }
    if verbose {
        println!("{} {}", "Rendering:".bold(), input.display().to_string().cyan());
    }

    let memory = MemorySink::new();
    let sink: &dyn LogSink = if show_log { &memory } else { &TracingSink };

    let mut kernel = Kernel::with_config(config);
    let start = Instant::now();
    let model = kernel.render_file(sink, input)?;
    let elapsed = start.elapsed();

    let summary = RenderSummary {
        file: input,
        faces: model.len(),
        closed: model.is_closed(),
        volume: model.volume(),
        bounding_box: model.bounding_box(),
        materials: model.materials(),
        cache: kernel.cache_stats(),
        render_ms: elapsed.as_secs_f64() * 1000.0,
        log: memory.take(),
    };

    if json {
        let text = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", text);
    } else {
        print_summary(&summary, &model);
    }
    Ok(())
}

fn print_summary(summary: &RenderSummary<'_>, model: &Model) {
    println!("{} {}", "Rendered:".bold(), summary.file.display().to_string().cyan());
    println!("  Faces:     {}", summary.faces);
    println!(
        "  Closed:    {}",
        if summary.closed { "yes".green() } else { "no".yellow() }
    );
    println!("  Volume:    {:.4}", summary.volume);
    if model.is_empty() {
        println!("  Bounds:    {}", "empty".yellow());
    } else {
        let bbox = &summary.bounding_box;
        println!(
            "  Bounds:    [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
        );
    }
    if !summary.materials.is_empty() {
        println!("  Materials: {}", summary.materials.join(", "));
    }
    println!(
        "  Cache:     {} hits, {} misses ({:.1}%)",
        summary.cache.hits,
        summary.cache.misses,
        summary.cache.hit_rate()
    );
    println!("  Time:      {:.2} ms", summary.render_ms);

    if !summary.log.is_empty() {
        println!("\n{}", "Log:".bold());
        for message in &summary.log {
            let line = match Severity::of(message) {
                Severity::Error => message.red(),
                Severity::Warning => message.yellow(),
                Severity::Debug => message.dimmed(),
                Severity::Info => message.normal(),
            };
            println!("  {}", line);
        }
    }
}

fn tree_command(config: KernelConfig, input: &Path) -> Result<()> {
    let kernel = Kernel::with_config(config);
    let nodes = kernel.evaluate_file(&TracingSink, input)?;
    for node in &nodes {
        print!("{}", node.to_openscad());
    }
    Ok(())
}

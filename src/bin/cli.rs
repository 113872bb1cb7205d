// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshcut CLI

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use meshcut::geometry::{analyze, surface_area, volume};
use meshcut::{export_stl, import_stl, split_pieces, Mesh, MeshCutter, Plane, SliceConfig};
use nalgebra::Vector3;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "meshcut")]
#[command(about = "Slice triangle meshes with planes and cap the cut", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut a mesh with one or more planes and write every piece
    Slice {
        /// Input STL file
        input: PathBuf,

        /// Cut plane as nx,ny,nz,d (points p with n·p = d lie on it); repeat for more cuts
        #[arg(short, long = "plane", required = true, value_parser = parse_plane, allow_hyphen_values = true)]
        planes: Vec<Plane>,

        /// Output directory for piece_<n>.stl files
        #[arg(short, long, default_value = "pieces")]
        output: PathBuf,

        /// Configuration file (defaults to ./meshcut.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print a JSON report instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print geometry statistics of a mesh
    Stats {
        /// Input STL file
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Serialize)]
struct PieceReport {
    index: usize,
    path: PathBuf,
    vertices: usize,
    triangles: usize,
    volume: f64,
    surface_area: f64,
}

#[derive(Serialize)]
struct SliceReport {
    input: PathBuf,
    planes: Vec<[f64; 4]>,
    pieces: Vec<PieceReport>,
}

fn parse_plane(s: &str) -> Result<Plane> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid plane '{}': expected nx,ny,nz,d", s))?;
    if values.len() != 4 {
        bail!("Invalid plane '{}': expected 4 numbers, got {}", s, values.len());
    }
    Ok(Plane::new(Vector3::new(values[0], values[1], values[2]), values[3])?)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Slice {
            input,
            planes,
            output,
            config,
            json,
        } => slice_command(&input, &planes, &output, config.as_deref(), json),
        Commands::Stats { input, json } => stats_command(&input, json),
        Commands::Version => {
            println!("meshcut v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SliceConfig> {
    match path {
        Some(path) => {
            let mut config = SliceConfig::from_file(path)?;
            config.apply_env_overrides()?;
            Ok(config)
        }
        None => SliceConfig::load(),
    }
}

fn slice_command(
    input: &Path,
    planes: &[Plane],
    output: &Path,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    if !input.exists() {
        eprintln!("{} Input file not found: {:?}", "Error:".red(), input);
        std::process::exit(1);
    }

    let config = load_config(config)?;
    let mesh = import_stl(input)?;
    let mut cutter = MeshCutter::with_config(config);

    let progress = if planes.len() > 1 && !json {
        let pb = ProgressBar::new(planes.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = std::time::Instant::now();
    let mut pieces: Vec<Mesh> = vec![mesh];
    for (i, plane) in planes.iter().enumerate() {
        if let Some(ref pb) = progress {
            pb.set_message(format!("plane {}", i + 1));
        }
        pieces = split_pieces(&mut cutter, &pieces, plane)
            .with_context(|| format!("Failed to apply plane {}", i + 1))?
            .into_pieces();
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }
    log::info!("Sliced into {} piece(s) in {:.2?}", pieces.len(), start.elapsed());

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {:?}", output))?;

    let mut report = SliceReport {
        input: input.to_path_buf(),
        planes: planes
            .iter()
            .map(|p| {
                let n = p.normal();
                [n.x, n.y, n.z, p.distance()]
            })
            .collect(),
        pieces: Vec::with_capacity(pieces.len()),
    };
    for (index, piece) in pieces.iter().enumerate() {
        let path = output.join(format!("piece_{}.stl", index));
        export_stl(piece, &path)?;
        report.pieces.push(PieceReport {
            index,
            path,
            vertices: piece.vertex_count(),
            triangles: piece.triangle_count(),
            volume: volume(piece),
            surface_area: surface_area(piece),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} piece(s) written to {:?}",
        "Success:".green(),
        report.pieces.len(),
        output
    );
    for piece in &report.pieces {
        println!(
            "  {} {:>8} tris  volume {:>12.6}  area {:>12.6}",
            format!("piece_{}", piece.index).bold(),
            piece.triangles,
            piece.volume,
            piece.surface_area
        );
    }

    Ok(())
}

fn stats_command(input: &Path, json: bool) -> Result<()> {
    let mesh = import_stl(input)?;
    let stats = analyze(&mesh);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        stats.print();
    }

    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Biodata — profile page with a Download-as-PDF action.
//
// Entry point. Initialises logging, parses the command line, and dispatches
// to the service layer.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use biodata_core::PageStrategy;
use biodata_core::error::Result;
use biodata_core::human_errors::humanize_error;
use biodata_document::PdfReader;
use biodata_document::integrity::hash_bytes;
use clap::{Parser, Subcommand, ValueEnum};

use services::app_services::{AppServices, ExportOverrides};

#[derive(Parser, Debug)]
#[command(name = "biodata", author, version, about)]
struct Cli {
    /// Settings file (defaults to config.json in the data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a profile and download it as biodata.pdf
    Export {
        /// Path to the profile JSON
        #[arg(short, long)]
        profile: PathBuf,
        /// Directory the PDF is saved into
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Ask where to save through the native dialog
        #[arg(long)]
        dialog: bool,
        /// Viewport width in CSS pixels
        #[arg(long)]
        viewport: Option<u32>,
        /// Gallery image shown in the preview (0-indexed)
        #[arg(long)]
        select: Option<usize>,
        /// How the snapshot is split across pages
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Directory image sources are resolved against
        #[arg(long)]
        assets: Option<PathBuf>,
        /// TrueType font for text
        #[arg(long)]
        font: Option<PathBuf>,
        /// Device pixels per CSS pixel
        #[arg(long)]
        scale: Option<f32>,
        /// Store the effective settings in the data directory
        #[arg(long)]
        save_config: bool,
    },
    /// Report page count and page size of a PDF
    Inspect {
        /// Path to PDF file
        pdf: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// One image shifted per page
    Reposition,
    /// One cropped slice per page
    Crop,
}

impl From<StrategyArg> for PageStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Reposition => PageStrategy::Reposition,
            StrategyArg::Crop => PageStrategy::Crop,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "biodata starting");

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            let human = humanize_error(&err);
            tracing::error!(error = %err, "command failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Export {
            profile,
            out_dir,
            dialog,
            viewport,
            select,
            strategy,
            assets,
            font,
            scale,
            save_config,
        } => {
            let mut services = AppServices::init(cli.config.as_deref())?;
            services.apply_overrides(ExportOverrides {
                output_dir: out_dir,
                save_dialog: dialog,
                viewport_width: viewport,
                page_strategy: strategy.map(PageStrategy::from),
                asset_root: assets,
                font_path: font,
                capture_scale: scale,
            })?;
            if save_config {
                let path = services.save_config()?;
                println!("Settings saved to {}", path.display());
            }

            match services.export_profile(&profile, select).await? {
                Some(receipt) => {
                    let shown = receipt
                        .location
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| receipt.filename.clone());
                    println!(
                        "Saved {shown} ({} page{}, sha256 {})",
                        receipt.page_count,
                        if receipt.page_count == 1 { "" } else { "s" },
                        receipt.sha256
                    );
                    Ok(ExitCode::SUCCESS)
                }
                // The host has already shown the alert.
                None => Ok(ExitCode::FAILURE),
            }
        }
        Command::Inspect { pdf } => {
            inspect(&pdf)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn inspect(path: &Path) -> Result<()> {
    let reader = PdfReader::open(path)?;
    let bytes = std::fs::read(path)?;

    println!("File:   {}", path.display());
    if let Some(title) = reader.title() {
        println!("Title:  {title}");
    }
    println!("Pages:  {}", reader.page_count());
    if reader.page_count() > 0 {
        let (width, height) = reader.page_size_mm(1)?;
        println!("Size:   {width:.1} x {height:.1} mm");
    }
    println!("Images: {}", reader.image_count());
    println!("SHA256: {}", hash_bytes(&bytes));
    Ok(())
}

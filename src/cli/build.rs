//! Build command implementation

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::compiler::Compiler;
use crate::utils::{display_path, format_duration, format_size};

/// Build the project for production
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Keep files from previous builds in the output directory
    #[arg(long)]
    pub no_clean: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = Arc::new(super::load_config(config_path)?);

        eprintln!("{} Building project...", "→".blue());

        let mut compiler = Compiler::new(config.clone());
        if !self.no_clean {
            compiler.clean()?;
        }

        let stats = compiler.compile()?;
        if stats.has_errors() {
            for error in &stats.errors {
                eprintln!("  {} {}", "✗".red(), error);
            }
            anyhow::bail!("Build failed with {} error(s)", stats.errors.len());
        }

        let manifest_path = compiler.emit_manifest(&stats)?;

        eprintln!(
            "\n{} Built {} asset(s) in {}\n",
            "✓".green().bold(),
            stats.assets.len(),
            format_duration(start.elapsed())
        );

        let output_dir = config.output_dir();
        for asset in &stats.assets {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                display_path(&config.root, &output_dir.join(&asset.name)).cyan(),
                format_size(asset.size).dimmed()
            );
        }

        eprintln!(
            "\n  {} manifest {}\n",
            "•".dimmed(),
            display_path(&config.root, &manifest_path).cyan()
        );

        Ok(())
    }
}

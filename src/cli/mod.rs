//! Command-line interface for Dace
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `start`: Development mode with watch compilation and hot reload
//! - `build`: Production build
//! - `serve`: Production server over an existing build

mod build;
mod serve;
mod start;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::Config;
use crate::manifest::ManifestSource;
use crate::pages::Routes;
use crate::render::{DocumentOptions, Renderer};
use crate::state::State;

pub use build::BuildCommand;
pub use serve::ServeCommand;
pub use start::StartCommand;

/// Dace - development scaffold for server-rendered web UIs
#[derive(Parser, Debug)]
#[command(name = "dace")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to dace.toml config file
    #[arg(short, long, global = true, default_value = "dace.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile in watch mode and start the development servers
    Start(StartCommand),

    /// Build the project for production
    Build(BuildCommand),

    /// Serve a production build
    Serve(ServeCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Start(cmd) => cmd.execute(&self.config).await,
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Serve(cmd) => cmd.execute(&self.config).await,
        }
    }
}

/// Load the configuration, clearing the terminal before reporting a bad file
fn load_config(path: &str) -> Result<Config> {
    Config::load(path).map_err(|e| {
        let _ = console::Term::stderr().clear_screen();
        eprintln!("{} Invalid {} file.", "✗".red().bold(), path);
        e
    })
}

/// Render pipeline for the built-in pages
fn build_renderer(
    config: &Config,
    manifest: ManifestSource,
    body_suffix: Option<String>,
) -> Renderer {
    let options = DocumentOptions {
        default_title: config
            .project
            .title
            .clone()
            .or_else(|| Some(config.project.name.clone())),
        body_suffix,
    };

    Renderer::new(
        Arc::new(Routes::standard(config)),
        State::from_config(&config.state),
        manifest,
        options,
    )
}

/// Print the Dace banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◆".cyan(),
        "Dace".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

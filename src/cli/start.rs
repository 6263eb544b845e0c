//! Development command: watch compilation plus app and asset servers

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::compiler::{emit_manifest, Compiler, Stats, WatchOptions};
use crate::config::Mode;
use crate::manifest::{LiveManifest, Manifest, ManifestSource};
use crate::ports::choose_ports;
use crate::server::{
    app_router, asset_router, client_script, serve, AssetMount, HmrMessage, HMR_PATH,
};
use crate::utils::format_duration;

/// Compile in watch mode and start the development servers
#[derive(Args, Debug)]
pub struct StartCommand {
    /// App server port; the asset server uses the next free one
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Disable hot reload notifications
    #[arg(long)]
    pub no_hmr: bool,
}

impl StartCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Arc::new(super::load_config(config_path)?);

        let host = self.host.clone().unwrap_or_else(|| config.dev.host.clone());
        let ports = choose_ports(&host, self.port.unwrap_or(config.dev.port))?;
        let hmr = config.dev.hmr && !self.no_hmr;
        let mode = Mode::from_env_or(Mode::Development);

        let mut compiler = Compiler::new(config.clone()).with_hot_updates(hmr);
        let stats = initial_compile(&mut compiler)?;

        // Assets are served by the asset server, so live URLs point at it
        let asset_origin = format!("http://{}:{}", host, ports.assets);
        let live = LiveManifest::new();
        live.publish(dev_manifest(&stats, &asset_origin));

        let (hmr_tx, _) = broadcast::channel::<HmrMessage>(100);

        let watch_options = WatchOptions {
            ignore: config.dev.watch_ignore.clone(),
            ..WatchOptions::default()
        };
        {
            let config = config.clone();
            let live = live.clone();
            let hmr_tx = hmr_tx.clone();
            let asset_origin = asset_origin.clone();

            compiler.watch(watch_options, move |rebuild| {
                match &rebuild.result {
                    Ok(stats) => {
                        report(stats);
                        live.publish(dev_manifest(stats, &asset_origin));
                        if let Err(e) = emit_manifest(&config, stats) {
                            error!("{:#}", e);
                        }
                    }
                    Err(e) => error!("Compilation failed: {:#}", e),
                }
                let _ = hmr_tx.send(HmrMessage::for_rebuild(&rebuild));
            })?;
        }

        let mount = AssetMount {
            public_path: config.output.public_path.clone(),
            dir: config.output_dir(),
        };

        let (manifest, app_assets) = match mode {
            Mode::Development => (ManifestSource::Live(live), None),
            Mode::Production => (
                ManifestSource::Disk(config.manifest_path()),
                Some(mount.clone()),
            ),
        };

        let hmr_client =
            hmr.then(|| client_script(&format!("ws://{}:{}{}", host, ports.assets, HMR_PATH)));

        let app = app_router(super::build_renderer(&config, manifest, hmr_client), app_assets);
        let assets = asset_router(mount, hmr_tx);

        eprintln!(
            "{} App running at {}",
            "→".blue(),
            format!("http://{}:{}", host, ports.app).cyan().underline()
        );
        eprintln!("  {} Assets served from {}", "•".dimmed(), asset_origin.cyan());
        if hmr {
            eprintln!("  {} Hot reload {}", "•".dimmed(), "enabled".green());
        }
        eprintln!("  {} Press {} to stop\n", "•".dimmed(), "Ctrl+C".yellow());

        tokio::try_join!(
            serve(app, &host, ports.app, "App"),
            serve(assets, &host, ports.assets, "Asset"),
        )?;

        Ok(())
    }
}

/// First compilation, behind a spinner
fn initial_compile(compiler: &mut Compiler) -> Result<Stats> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Compiling...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = compiler.compile();
    spinner.finish_and_clear();

    let stats = result?;
    compiler.emit_manifest(&stats)?;
    report(&stats);
    Ok(stats)
}

/// Manifest whose public path points at the asset server
fn dev_manifest(stats: &Stats, asset_origin: &str) -> Manifest {
    let mut manifest = stats.to_manifest();
    if manifest.public_path.starts_with('/') {
        manifest.public_path = format!("{}{}", asset_origin, manifest.public_path);
    }
    manifest
}

fn report(stats: &Stats) {
    if stats.has_errors() {
        eprintln!("{} Failed to compile.", "✗".red().bold());
        for error in &stats.errors {
            eprintln!("  {} {}", "•".dimmed(), error);
        }
    } else {
        eprintln!(
            "{} Compiled {} asset(s) in {}",
            "✓".green().bold(),
            stats.assets.len(),
            format_duration(Duration::from_millis(stats.time))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ChunkAssets, ChunkMap};

    fn stats(public_path: &str) -> Stats {
        let mut chunks = ChunkMap::new();
        chunks.insert("main", ChunkAssets::Single("main.js".to_string()));
        Stats {
            hash: "h".to_string(),
            public_path: public_path.to_string(),
            assets_by_chunk_name: chunks,
            assets: Vec::new(),
            errors: Vec::new(),
            time: 0,
        }
    }

    #[test]
    fn test_dev_manifest_points_at_asset_server() {
        let manifest = dev_manifest(&stats("/static/"), "http://localhost:3001");
        assert_eq!(manifest.public_path, "http://localhost:3001/static/");

        let refs = crate::chunks::resolve_chunks(&manifest, "js");
        assert_eq!(refs[0].url, "http://localhost:3001/static/main.js");
    }

    #[test]
    fn test_dev_manifest_keeps_absolute_public_path() {
        let manifest = dev_manifest(&stats("https://cdn.example.com/"), "http://localhost:3001");
        assert_eq!(manifest.public_path, "https://cdn.example.com/");
    }
}

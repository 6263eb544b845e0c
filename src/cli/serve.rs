//! Production server command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::config::{Mode, MODE_ENV};
use crate::manifest::ManifestSource;
use crate::server::{app_router, serve, AssetMount};

/// Serve a production build
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Port to listen on (defaults to dev.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (defaults to dev.host)
    #[arg(long)]
    pub host: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = super::load_config(config_path)?;

        // Without a compiler there is no live manifest to serve from
        if Mode::from_env_or(Mode::Production) == Mode::Development {
            anyhow::bail!(
                "`dace serve` only runs production builds; unset {} or use `dace start`",
                MODE_ENV
            );
        }

        let host = self.host.clone().unwrap_or_else(|| config.dev.host.clone());
        let port = self.port.unwrap_or(config.dev.port);

        let manifest = ManifestSource::Disk(config.manifest_path());

        let mount = AssetMount {
            public_path: config.output.public_path.clone(),
            dir: config.output_dir(),
        };
        let router = app_router(super::build_renderer(&config, manifest, None), Some(mount));

        eprintln!(
            "{} Serving {} at {}\n",
            "→".blue(),
            config.project.name.bold(),
            format!("http://{}:{}", host, port).cyan().underline()
        );

        serve(router, &host, port, "App").await
    }
}

//! Watch mode: recompile when project files change

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::new_debouncer;
use tracing::{debug, error};

use super::{Compiler, Stats};

/// Directories never worth recompiling for
const DEFAULT_IGNORES: &[&str] = &[".git/**", "node_modules/**", "target/**"];

/// Watch settings
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub debounce: Duration,
    /// Extra glob patterns, relative to the project root
    pub ignore: Vec<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            ignore: Vec::new(),
        }
    }
}

/// Outcome of a recompilation triggered by file changes
#[derive(Debug)]
pub struct Rebuild {
    pub changed: Vec<PathBuf>,
    pub result: Result<Stats>,
}

impl Rebuild {
    /// Only stylesheets changed, so the client can swap styles in place
    pub fn css_only(&self) -> bool {
        !self.changed.is_empty()
            && self.changed.iter().all(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("css"))
                    .unwrap_or(false)
            })
    }
}

/// Decides which changed paths trigger a rebuild
struct WatchFilter {
    root: PathBuf,
    output_dir: PathBuf,
    ignore: GlobSet,
}

impl WatchFilter {
    fn new(root: PathBuf, output_dir: PathBuf, extra: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_IGNORES.iter().copied().chain(extra.iter().map(String::as_str)) {
            builder.add(
                Glob::new(pattern)
                    .with_context(|| format!("Invalid watch ignore pattern: {}", pattern))?,
            );
        }

        Ok(Self {
            root,
            output_dir,
            ignore: builder.build()?,
        })
    }

    fn is_watched(&self, path: &Path) -> bool {
        if path.starts_with(&self.output_dir) {
            return false;
        }
        match path.strip_prefix(&self.root) {
            Ok(relative) => !self.ignore.is_match(relative),
            Err(_) => false,
        }
    }
}

impl Compiler {
    /// Recompile on every relevant change, reporting each rebuild.
    ///
    /// The watcher runs on its own thread for the rest of the process.
    pub fn watch<F>(mut self, options: WatchOptions, mut on_rebuild: F) -> Result<()>
    where
        F: FnMut(Rebuild) + Send + 'static,
    {
        let root = self.config.root.clone();
        let filter = WatchFilter::new(root.clone(), self.config.output_dir(), &options.ignore)?;

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(options.debounce, tx)?;
        debouncer.watcher().watch(&root, RecursiveMode::Recursive)?;

        std::thread::spawn(move || {
            // Keep debouncer alive for the duration of the watcher
            let _debouncer = debouncer;

            loop {
                match rx.recv() {
                    Ok(Ok(events)) => {
                        let changed: Vec<PathBuf> = events
                            .into_iter()
                            .map(|event| event.path)
                            .filter(|path| filter.is_watched(path))
                            .collect();

                        if changed.is_empty() {
                            continue;
                        }

                        debug!("{} file(s) changed, recompiling", changed.len());
                        let result = self.compile();
                        on_rebuild(Rebuild { changed, result });
                    }
                    Ok(Err(e)) => {
                        error!("Watch error: {:?}", e);
                    }
                    Err(_) => {
                        // Channel closed, exit
                        break;
                    }
                }
            }
        });

        Ok(())
    }
}

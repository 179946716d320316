//! Synapse - a terminal markdown editor with live, selective rendering.
//!
//! # Usage
//!
//! ```bash
//! synapse notes/today.md
//! synapse --vault ~/notes today.md
//! synapse --server http://localhost:8000 inbox/today.md
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use synapse::app::App;
use synapse::autosave::DEFAULT_AUTOSAVE_MS;
use synapse::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use synapse::keymap::{Keymap, Platform};
use synapse::perf;
use synapse::vault::{DocumentStore, HttpStore, LocalVault};

/// A terminal markdown editor that renders as you type
#[derive(Parser, Debug)]
#[command(name = "synapse", version, about, long_about = None)]
struct Cli {
    /// Document to edit, relative to the vault
    #[arg(value_name = "PATH")]
    path: String,

    /// Vault directory documents are resolved against (default: current directory)
    #[arg(long, value_name = "DIR")]
    vault: Option<PathBuf>,

    /// Vault server base URL; overrides --vault
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Quiet period in milliseconds before an edit is saved
    #[arg(long, value_name = "MS")]
    autosave_ms: Option<u64>,

    /// Only save on an explicit save command
    #[arg(long)]
    no_autosave: bool,

    /// JSON file with key binding overrides
    #[arg(long, value_name = "FILE")]
    keymap: Option<PathBuf>,

    /// Enable performance timing on stderr
    #[arg(long)]
    perf: bool,

    /// Write reflow and render debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn open_store(flags: &ConfigFlags) -> Result<Arc<dyn DocumentStore>> {
    if let Some(server) = &flags.server {
        let store = HttpStore::new(server)
            .with_context(|| format!("Invalid vault server {server}"))?;
        return Ok(Arc::new(store));
    }
    let root = flags.vault.clone().unwrap_or_else(|| PathBuf::from("."));
    let vault = LocalVault::open(&root)
        .with_context(|| format!("Cannot open vault {}", root.display()))?;
    Ok(Arc::new(vault))
}

fn load_keymap(flags: &ConfigFlags) -> Result<Keymap> {
    let mut keymap = Keymap::defaults(Platform::current());
    if let Some(path) = &flags.keymap {
        let count = keymap
            .merge_file(path)
            .with_context(|| format!("Failed to load keymap {}", path.display()))?;
        tracing::debug!(count, path = %path.display(), "loaded key bindings");
    }
    Ok(keymap)
}

fn main() -> Result<()> {
    // Logs go to stderr so they never land in the alternate screen buffer
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("SYNAPSE_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let store = open_store(&effective)?;
    let keymap = load_keymap(&effective)?;
    let autosave = if effective.no_autosave {
        None
    } else {
        Some(effective.autosave_ms.unwrap_or(DEFAULT_AUTOSAVE_MS))
    };

    let mut app = App::new(cli.path, store)
        .with_keymap(keymap)
        .with_autosave(autosave);

    let result = app.run().context("Application error");
    perf::report();
    result
}

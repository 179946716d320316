//! Persistent default flags.
//!
//! Defaults live in an rc file of whitespace-separated `--flag value`
//! tokens: a global one under the platform config directory and a local
//! `.synapserc` override. CLI flags win over local, local over global.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    /// Local vault directory documents are resolved against.
    pub vault: Option<PathBuf>,
    /// Base URL of a vault server; takes precedence over `vault`.
    pub server: Option<String>,
    pub autosave_ms: Option<u64>,
    pub no_autosave: bool,
    /// JSON file with key binding overrides.
    pub keymap: Option<PathBuf>,
    pub perf: bool,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Combine with `other`, whose options win where both are set.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            vault: other.vault.clone().or_else(|| self.vault.clone()),
            server: other.server.clone().or_else(|| self.server.clone()),
            autosave_ms: other.autosave_ms.or(self.autosave_ms),
            no_autosave: self.no_autosave || other.no_autosave,
            keymap: other.keymap.clone().or_else(|| self.keymap.clone()),
            perf: self.perf || other.perf,
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("synapse").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("synapse")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("synapse").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("synapse").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".synapserc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# synapse defaults (saved with --save)".to_string()];
    if let Some(vault) = &flags.vault {
        lines.push(format!("--vault {}", vault.display()));
    }
    if let Some(server) = &flags.server {
        lines.push(format!("--server {server}"));
    }
    if let Some(ms) = flags.autosave_ms {
        lines.push(format!("--autosave-ms {ms}"));
    }
    if flags.no_autosave {
        lines.push("--no-autosave".to_string());
    }
    if let Some(keymap) = &flags.keymap {
        lines.push(format!("--keymap {}", keymap.display()));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the flags synapse knows out of a token list. Unknown tokens and
/// positional arguments are ignored; a malformed `--autosave-ms` value is
/// dropped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--vault" | "--server" | "--autosave-ms" | "--keymap" | "--render-debug-log"
        );
        let value = if takes_value && inline.is_none() {
            i += 1;
            tokens.get(i).cloned()
        } else {
            inline
        };
        match (name, value) {
            ("--no-autosave", _) => flags.no_autosave = true,
            ("--perf", _) => flags.perf = true,
            ("--vault", Some(v)) => flags.vault = Some(PathBuf::from(v)),
            ("--server", Some(v)) => flags.server = Some(v),
            ("--autosave-ms", Some(v)) => flags.autosave_ms = v.parse().ok(),
            ("--keymap", Some(v)) => flags.keymap = Some(PathBuf::from(v)),
            ("--render-debug-log", Some(v)) => flags.render_debug_log = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::FragmentError;

pub const CONFIG_FILE: &str = "erlscope.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings read from `erlscope.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub format: OutputFormat,
    pub start_line: u32,
    pub loader_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self { format: OutputFormat::Text, start_line: 1, loader_dir: PathBuf::from(".") }
    }
}

// ---- TOML deserialization types ----

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    output: TomlOutput,
    #[serde(default)]
    lexer: TomlLexer,
    #[serde(default)]
    loader: TomlLoader,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlOutput {
    format: Option<OutputFormat>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlLexer {
    start_line: Option<u32>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlLoader {
    dir: Option<String>,
}

impl Config {
    /// Parse config text. A relative `[loader] dir` is resolved against
    /// `base_dir`.
    pub fn from_toml(content: &str, path: &Path, base_dir: &Path) -> Result<Self, FragmentError> {
        let raw: TomlConfig = toml::from_str(content).map_err(|e| {
            FragmentError::config(format!("{CONFIG_FILE}: invalid syntax: {e}"), path.to_path_buf())
        })?;

        let defaults = Config::default();
        let start_line = raw.lexer.start_line.unwrap_or(defaults.start_line);
        if start_line == 0 {
            return Err(FragmentError::config(
                format!("{CONFIG_FILE}: [lexer] start_line must be at least 1"),
                path.to_path_buf(),
            ));
        }

        Ok(Self {
            format: raw.output.format.unwrap_or(defaults.format),
            start_line,
            loader_dir: raw.loader.dir.map_or(defaults.loader_dir, |dir| base_dir.join(dir)),
        })
    }

    pub fn load(path: &Path) -> Result<Self, FragmentError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FragmentError::config(format!("{CONFIG_FILE}: could not read file: {e}"), path.to_path_buf())
        })?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::from_toml(&content, path, base_dir)
    }

    /// Load `erlscope.toml` from `start_dir` or the nearest ancestor,
    /// stopping at a repository root. Defaults when none is found.
    pub fn discover(start_dir: &Path) -> Result<Self, FragmentError> {
        match find_config_walk(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

fn find_config_walk(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        // .git may be a file for worktrees
        if dir.join(".git").exists() {
            return None;
        }
        if !dir.pop() {
            return None;
        }
    }
}

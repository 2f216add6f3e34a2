use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::latex::CompilerSettings;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Application configuration loaded from environment variables.
/// Only malformed values are fatal; the Gemini key may be absent.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub allowed_origins: Vec<String>,
    pub latex_compiler: String,
    pub latex_extra_args: Vec<String>,
    pub compile_timeout_secs: u64,
    pub max_concurrent_compiles: usize,
    pub compile_workdir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let compile_timeout_secs: u64 = parse_or(&get, "COMPILE_TIMEOUT_SECS", 60)?;
        ensure!(
            compile_timeout_secs > 0,
            "COMPILE_TIMEOUT_SECS must be greater than zero"
        );

        let max_concurrent_compiles: usize = parse_or(&get, "MAX_CONCURRENT_COMPILES", 4)?;
        ensure!(
            max_concurrent_compiles > 0,
            "MAX_CONCURRENT_COMPILES must be greater than zero"
        );

        Ok(Config {
            gemini_api_key: get("GEMINI_API_KEY"),
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            allowed_origins: get("ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            latex_compiler: get("LATEX_COMPILER").unwrap_or_else(|| "pdflatex".to_string()),
            latex_extra_args: get("LATEX_EXTRA_ARGS")
                .map(|args| args.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            compile_timeout_secs,
            max_concurrent_compiles,
            compile_workdir: get("COMPILE_WORKDIR").map(PathBuf::from),
        })
    }

    pub fn compiler_settings(&self) -> CompilerSettings {
        CompilerSettings {
            program: self.latex_compiler.clone(),
            extra_args: self.latex_extra_args.clone(),
            timeout: Duration::from_secs(self.compile_timeout_secs),
            max_concurrent: self.max_concurrent_compiles,
            workspace_root: self.compile_workdir.clone(),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

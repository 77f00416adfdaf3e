use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::env;

/// Which storage backend the process writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Local directory (standalone server variant).
    Disk,
    /// Object-storage bucket (cloud-function variant).
    Bucket,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub storage_dir: String,
    pub bucket: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Camera image gallery server")]
pub struct Args {
    /// Host to bind to (overrides GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GALLERY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend to use (overrides GALLERY_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Directory where images are stored (overrides GALLERY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Bucket name for the bucket backend (overrides GALLERY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("GALLERY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("GALLERY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing GALLERY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading GALLERY_PORT"),
        };
        let env_backend = match env::var("GALLERY_BACKEND") {
            Ok(value) => Some(parse_backend(&value)?),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading GALLERY_BACKEND"),
        };
        let env_storage = env::var("GALLERY_STORAGE_DIR").unwrap_or_else(|_| "./uploads".into());
        let env_bucket = env::var("GALLERY_BUCKET").ok();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            backend: args
                .backend
                .or(env_backend)
                .unwrap_or(BackendKind::Disk),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            bucket: args.bucket.or(env_bucket),
        };

        if cfg.backend == BackendKind::Bucket && cfg.bucket.is_none() {
            bail!("bucket backend selected but no bucket configured (--bucket or GALLERY_BUCKET)");
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_backend(value: &str) -> Result<BackendKind> {
    match value.to_ascii_lowercase().as_str() {
        "disk" => Ok(BackendKind::Disk),
        "bucket" => Ok(BackendKind::Bucket),
        other => bail!("unknown GALLERY_BACKEND value `{}` (expected disk or bucket)", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing_is_case_insensitive() {
        assert_eq!(parse_backend("disk").unwrap(), BackendKind::Disk);
        assert_eq!(parse_backend("Bucket").unwrap(), BackendKind::Bucket);
        assert!(parse_backend("tape").is_err());
    }
}

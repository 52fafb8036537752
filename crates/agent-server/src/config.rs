//! Server Configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use agent_mcp::LaunchSpec;
use support_desk::{DATABASE_WORKER, EMAIL_WORKER};

/// A worker to start at boot
#[derive(Clone, Debug, Deserialize)]
pub struct WorkerEntry {
    pub name: String,
    #[serde(flatten)]
    pub launch: LaunchSpec,
}

/// HTTP server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Directory served for every path no route claims
    pub static_dir: PathBuf,

    /// Workers in start order
    pub workers: Vec<WorkerEntry>,

    pub max_tool_rounds: usize,
    pub max_tokens: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            static_dir: PathBuf::from("public"),
            workers: default_workers(Path::new(".")),
            max_tool_rounds: 10,
            max_tokens: 4096,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(addr) => addr,
            Err(_) => {
                let port: u16 = env_parse("PORT")?.unwrap_or(3000);
                format!("0.0.0.0:{port}")
            }
        };

        let workers = match std::env::var("WORKERS_FILE") {
            Ok(path) => load_workers(Path::new(&path))?,
            Err(_) => {
                let bin_dir = match std::env::var("WORKER_BIN_DIR") {
                    Ok(dir) => PathBuf::from(dir),
                    Err(_) => executable_dir()?,
                };
                default_workers(&bin_dir)
            }
        };

        Ok(Self {
            bind_addr,
            static_dir: std::env::var("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
            workers,
            max_tool_rounds: env_parse("MAX_TOOL_ROUNDS")?.unwrap_or(defaults.max_tool_rounds),
            max_tokens: env_parse("MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
        })
    }
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(key)
        .ok()
        .map(|v| v.parse::<T>().with_context(|| format!("{key} has an invalid value '{v}'")))
        .transpose()
}

/// The database and email workers, built next to the server binary
fn default_workers(bin_dir: &Path) -> Vec<WorkerEntry> {
    [(DATABASE_WORKER, "database-worker"), (EMAIL_WORKER, "email-worker")]
        .into_iter()
        .map(|(name, binary)| WorkerEntry {
            name: name.into(),
            launch: LaunchSpec::new(bin_dir.join(binary).to_string_lossy()),
        })
        .collect()
}

fn executable_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the server executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("server executable has no parent directory")
}

fn load_workers(path: &Path) -> anyhow::Result<Vec<WorkerEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workers file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid workers file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workers_in_start_order() {
        let workers = default_workers(Path::new("/opt/support/bin"));
        let names: Vec<_> = workers.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["database", "email"]);
        assert_eq!(workers[0].launch.command, "/opt/support/bin/database-worker");
    }

    #[test]
    fn test_workers_file_shape() {
        let entries: Vec<WorkerEntry> = serde_json::from_str(
            r#"[
                {"name": "database", "command": "node", "args": ["mcp-servers/database-server.js"]},
                {"name": "email", "command": "./email-worker", "env": {"RUST_LOG": "debug"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries[0].launch.args, vec!["mcp-servers/database-server.js"]);
        assert_eq!(entries[1].launch.env["RUST_LOG"], "debug");
        assert!(entries[1].launch.cwd.is_none());
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.max_tool_rounds, 10);
        assert_eq!(config.max_tokens, 4096);
    }
}

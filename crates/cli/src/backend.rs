// Table host selection: a local CSV file or a project on a server.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colcheck_config::Settings;
use colcheck_core::TableHost;
use colcheck_engine::{MemoryHost, Table};
use colcheck_refine_client::RefineClient;

use crate::CliError;

pub enum Backend {
    Memory(MemoryHost),
    Refine { client: RefineClient, url: String },
}

/// Where the table lives, as given on the command line.
#[derive(Debug, Clone)]
pub enum Source {
    Csv(PathBuf),
    Project { id: String, host: Option<String> },
}

impl Backend {
    pub fn open(source: &Source, settings: &Settings) -> Result<Self, CliError> {
        match source {
            Source::Csv(path) => Ok(Backend::Memory(MemoryHost::new(load_csv(path)?))),
            Source::Project { id, host } => {
                let url = host.clone().unwrap_or_else(|| settings.host_url.clone());
                let timeout = Duration::from_secs(settings.timeout_secs);
                let client = RefineClient::new(&url, id, timeout, settings.retries)
                    .map_err(|e| CliError::host(&e, Some(&url)))?;
                log::debug!("project {} on {}", id, url);
                Ok(Backend::Refine { client, url })
            }
        }
    }

    pub fn host(&mut self) -> &mut dyn TableHost {
        match self {
            Backend::Memory(host) => host,
            Backend::Refine { client, .. } => client,
        }
    }

    /// Server URL, for hints.
    pub fn url(&self) -> Option<&str> {
        match self {
            Backend::Memory(_) => None,
            Backend::Refine { url, .. } => Some(url),
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            Backend::Memory(host) => Some(host.table()),
            Backend::Refine { .. } => None,
        }
    }
}

pub fn load_csv(path: &Path) -> Result<Table, CliError> {
    let file = File::open(path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    let table = Table::from_csv(file).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    log::debug!("{}: {} rows, {} columns", path.display(), table.row_count(), table.columns().len());
    Ok(table)
}

pub fn write_csv(table: &Table, path: &Path) -> Result<(), CliError> {
    let file = File::create(path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    table
        .write_csv(BufWriter::new(file))
        .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))
}

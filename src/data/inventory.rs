/// Saved-sample inventory kept in a JSON file
///
/// Stands in for the remote inventory service: the set of saved sample ids
/// is read once at start-up and rewritten whenever it changes. Failures are
/// logged and never reach the viewer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use visor_core::{Inventory, SampleId};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("inventory file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InventoryFile {
    saved: BTreeSet<SampleId>,
}

#[derive(Debug, Clone)]
pub struct JsonInventory {
    path: PathBuf,
}

impl JsonInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `inventory.json` in the platform data directory, or the working
    /// directory when none is known.
    pub fn default_location() -> Self {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| Path::new(&h).join(".local/share")))
            .map(|d| d.join("visor"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("inventory.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeSet<SampleId>, InventoryError> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        let file: InventoryFile = serde_json::from_str(&json)?;
        Ok(file.saved)
    }

    fn write(&self, ids: &BTreeSet<SampleId>) -> Result<(), InventoryError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = InventoryFile { saved: ids.clone() };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl Inventory for JsonInventory {
    fn fetch_status(&mut self) -> BTreeSet<SampleId> {
        match self.read() {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("Could not read {}: {}", self.path.display(), e);
                BTreeSet::new()
            }
        }
    }

    fn persist(&mut self, ids: &BTreeSet<SampleId>) {
        match self.write(ids) {
            Ok(()) => log::debug!("inventory saved ({} ids)", ids.len()),
            Err(e) => log::error!("Could not write {}: {}", self.path.display(), e),
        }
    }
}

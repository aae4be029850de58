//! SpoolCarrier - writes every payload to disk as JSON

use contracts::{Carrier, ContractError};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, instrument};

/// Envelope written per delivery
#[derive(Serialize)]
struct SpoolEntry<'a, P: ?Sized> {
    seq: u64,
    address: Option<&'a str>,
    payload: &'a P,
}

/// Carrier that spools payloads into a directory
///
/// Each delivery becomes `<seq>.json`, `seq` counting up from 1 per carrier.
pub struct SpoolCarrier {
    name: String,
    base_path: PathBuf,
    next_seq: AtomicU64,
}

impl SpoolCarrier {
    /// Create a new SpoolCarrier, creating `base_path` if missing
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            name: name.into(),
            base_path,
            next_seq: AtomicU64::new(1),
        })
    }

    /// Output directory
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn write_entry<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        address: Option<&str>,
    ) -> std::io::Result<PathBuf> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let path = self.base_path.join(format!("{:06}.json", seq));
        let file = File::create(&path)?;
        let entry = SpoolEntry {
            seq,
            address,
            payload,
        };
        serde_json::to_writer_pretty(file, &entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(path)
    }
}

impl<P> Carrier<P> for SpoolCarrier
where
    P: Serialize + ?Sized,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "spool_carrier_send", skip(self, payload), fields(carrier = %self.name))]
    fn send(&self, payload: &P, address: Option<&str>) -> Result<(), ContractError> {
        match self.write_entry(payload, address) {
            Ok(path) => {
                debug!(carrier = %self.name, path = %path.display(), "Spooled");
                Ok(())
            }
            Err(e) => {
                error!(carrier = %self.name, error = %e, "Spool write failed");
                Err(ContractError::delivery(&self.name, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_spool_writes_numbered_files() {
        let dir = tempdir().unwrap();
        let carrier = SpoolCarrier::new("spool", dir.path().join("out")).unwrap();

        Carrier::<str>::send(&carrier, "Hello A", Some("070")).unwrap();
        Carrier::<str>::send(&carrier, "Hello B", None).unwrap();

        let first = fs::read_to_string(carrier.base_path().join("000001.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["payload"], "Hello A");
        assert_eq!(value["address"], "070");
        assert!(carrier.base_path().join("000002.json").exists());
    }

    #[test]
    fn test_spool_write_failure_is_delivery_error() {
        let dir = tempdir().unwrap();
        let carrier = SpoolCarrier::new("spool", dir.path()).unwrap();
        fs::remove_dir_all(dir.path()).unwrap();

        let err = Carrier::<str>::send(&carrier, "x", None).unwrap_err();
        assert!(err.is_delivery());
    }
}

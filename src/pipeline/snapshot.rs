//! JSON snapshots of paired satellite data, for offline replay
use std::path::Path;

use log::info;

use crate::{
    epoch::{group, EpochData, SatelliteDatum},
    error::Error,
};

/// Serializes these [SatelliteDatum]s
pub fn to_string(data: &[SatelliteDatum]) -> Result<String, Error> {
    serde_json::to_string_pretty(data).map_err(|e| Error::Snapshot(e.to_string()))
}

/// Deserializes [SatelliteDatum]s
pub fn from_str(content: &str) -> Result<Vec<SatelliteDatum>, Error> {
    serde_json::from_str(content).map_err(|e| Error::Snapshot(e.to_string()))
}

/// Dumps these [SatelliteDatum]s to a file
pub fn dump<P: AsRef<Path>>(path: P, data: &[SatelliteDatum]) -> Result<(), Error> {
    std::fs::write(path.as_ref(), to_string(data)?)?;
    info!(
        "snapshot: {} satellites dumped to {}",
        data.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Loads [SatelliteDatum]s from a file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<SatelliteDatum>, Error> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let data = from_str(&content)?;
    info!(
        "snapshot: {} satellites loaded from {}",
        data.len(),
        path.as_ref().display()
    );
    Ok(data)
}

/// Groups loaded data into [EpochData], ordered by time of week
pub fn replay(data: Vec<SatelliteDatum>) -> Vec<EpochData> {
    group(data)
}

//! Liveness heartbeat
//!
//! A timestamp marker overwritten once per control cycle, regardless of
//! state. External monitoring watches its age; the controller never reads
//! it back and a write failure must not disturb a control decision.

use chrono::Utc;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct Heartbeat {
    path: PathBuf,
}

impl Heartbeat {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the marker with the current timestamp. The file is
    /// flushed to disk before returning so a crash right after the call
    /// cannot leave a stale-but-fresh-looking marker.
    pub fn beat(&self) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        writeln!(file, "{}", Utc::now().to_rfc3339())?;
        file.sync_all()
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// On-disk shape of the log: `{"pairs": [[source, thumbnail], ...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PairDocument {
    pairs: Vec<(String, String)>,
}

/// JSON record of every (source, thumbnail) pair written.
///
/// The whole document is rewritten after each new pair by writing a temporary file
/// next to it and renaming it over the old one, so an interruption leaves either the
/// previous or the new document in place.
#[derive(Debug)]
pub struct PairLog {
    path: PathBuf,
    document: PairDocument,
}

impl PairLog {
    /// Open a log, loading any pairs already recorded at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let document = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => PairDocument::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PairDocument::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pairs in the order they were recorded
    pub fn pairs(&self) -> &[(String, String)] {
        &self.document.pairs
    }

    /// Append a pair and rewrite the log
    pub fn record(&mut self, source: &Path, thumbnail: &Path) -> Result<()> {
        self.document.pairs.push((
            source.to_string_lossy().into_owned(),
            thumbnail.to_string_lossy().into_owned(),
        ));
        self.save()
    }

    fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".pairs")
            .suffix(".json")
            .tempfile_in(dir)?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.document)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

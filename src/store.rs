use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use urlencoding::encode;

use crate::error::{MatrixError, MatrixResult};
use crate::model::SavedMatrix;

/// Persistence for saved matrices, one document per (department, line).
///
/// `save` replaces any prior document for the pair wholesale; there is no
/// version check, so the last writer wins.
pub trait MatrixStore {
    fn load(&self, department_id: &str, line_id: &str) -> MatrixResult<Option<SavedMatrix>>;

    fn save(&mut self, matrix: &SavedMatrix) -> MatrixResult<()>;
}

/// Store kept in memory, mostly for tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<(String, String), SavedMatrix>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl MatrixStore for MemoryStore {
    fn load(&self, department_id: &str, line_id: &str) -> MatrixResult<Option<SavedMatrix>> {
        Ok(self
            .documents
            .get(&(department_id.to_string(), line_id.to_string()))
            .cloned())
    }

    fn save(&mut self, matrix: &SavedMatrix) -> MatrixResult<()> {
        self.documents.insert(
            (matrix.department_id.clone(), matrix.line_id.clone()),
            matrix.clone(),
        );
        Ok(())
    }
}

/// Store writing one gzip-compressed bincode file per (department, line).
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> MatrixResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("matrix store opened at {}", dir.display());
        Ok(Self { dir })
    }

    /// File holding the document for a pair.
    ///
    /// Each id is percent-encoded, so `+` never appears inside a component
    /// and distinct pairs never share a file.
    pub fn path_for(&self, department_id: &str, line_id: &str) -> PathBuf {
        self.dir.join(format!(
            "{}+{}.bin.gz",
            encode(department_id),
            encode(line_id)
        ))
    }
}

impl MatrixStore for FileStore {
    fn load(&self, department_id: &str, line_id: &str) -> MatrixResult<Option<SavedMatrix>> {
        let path = self.path_for(department_id, line_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let decoder = GzDecoder::new(file);
        let mut reader = BufReader::new(decoder);

        let matrix: SavedMatrix = deserialize_from(&mut reader)
            .map_err(|e| MatrixError::Deserialize(e.to_string()))?;
        if matrix.department_id != department_id || matrix.line_id != line_id {
            warn!(
                "{} holds the matrix for {}/{}, not {}/{}",
                path.display(),
                matrix.department_id,
                matrix.line_id,
                department_id,
                line_id
            );
            return Ok(None);
        }
        debug!(
            "loaded {} saved entries from {}",
            matrix.entries.len(),
            path.display()
        );
        Ok(Some(matrix))
    }

    fn save(&mut self, matrix: &SavedMatrix) -> MatrixResult<()> {
        let path = self.path_for(&matrix.department_id, &matrix.line_id);
        let tmp = path.with_extension("gz.tmp");

        {
            let file = File::create(&tmp)?;
            let encoder = GzEncoder::new(file, Compression::default());
            let mut writer = BufWriter::new(encoder);
            serialize_into(&mut writer, matrix)
                .map_err(|e| MatrixError::Serialize(e.to_string()))?;
            let encoder = writer
                .into_inner()
                .map_err(|e| MatrixError::Storage(e.to_string()))?;
            encoder.finish()?.flush()?;
        }
        // Replace in one step so a failed write never leaves half a document.
        fs::rename(&tmp, &path)?;

        info!(
            "saved {} entries for department {} line {}",
            matrix.entries.len(),
            matrix.department_id,
            matrix.line_id
        );
        Ok(())
    }
}

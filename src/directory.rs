use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{MatrixError, MatrixResult};
use crate::level::LevelScale;
use crate::model::{Department, Line, Station};

/// Source of the organisational data the matrix is built from.
///
/// Every call may fail; callers treat a failure as "no data".
pub trait Directory {
    fn departments(&self) -> MatrixResult<Vec<Department>>;

    /// Lines belonging to a department, in catalog order.
    fn lines(&self, department_id: &str) -> MatrixResult<Vec<Line>>;

    /// Stations configured on a line, in catalog order.
    fn stations(&self, line_id: &str) -> MatrixResult<Vec<Station>>;

    /// Configured skill level labels. An empty list means "unconfigured".
    fn level_labels(&self) -> MatrixResult<Vec<String>>;
}

/// Load the station columns for a line.
///
/// This is a passthrough of the catalog; the order is preserved as given.
pub fn load_stations<D: Directory + ?Sized>(
    directory: &D,
    line_id: &str,
) -> MatrixResult<Vec<Station>> {
    let stations = directory.stations(line_id)?;
    debug!("line {} has {} stations", line_id, stations.len());
    Ok(stations)
}

/// Load the configured level scale, falling back to the default scale.
pub fn load_scale<D: Directory + ?Sized>(directory: &D) -> LevelScale {
    match directory.level_labels() {
        Ok(labels) => LevelScale::new(labels),
        Err(e) => {
            debug!("level labels unavailable ({}), using default scale", e);
            LevelScale::default()
        }
    }
}

/// Station as listed in a directory fixture, tagged with its line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStation {
    pub line_id: String,
    pub id: String,
    pub name: String,
}

/// In-memory directory, loadable from a JSON fixture.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryDirectory {
    pub departments: Vec<Department>,
    pub lines: Vec<Line>,
    pub stations: Vec<LineStation>,
    pub level_labels: Vec<String>,
}

impl MemoryDirectory {
    /// Read a directory fixture from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> MatrixResult<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let directory: MemoryDirectory = serde_json::from_reader(reader)
            .map_err(|e| MatrixError::Deserialize(e.to_string()))?;
        debug!(
            "loaded directory with {} departments from {}",
            directory.departments.len(),
            path.as_ref().display()
        );
        Ok(directory)
    }

    pub fn from_json_str(json: &str) -> MatrixResult<Self> {
        serde_json::from_str(json).map_err(|e| MatrixError::Deserialize(e.to_string()))
    }
}

impl Directory for MemoryDirectory {
    fn departments(&self) -> MatrixResult<Vec<Department>> {
        Ok(self.departments.clone())
    }

    fn lines(&self, department_id: &str) -> MatrixResult<Vec<Line>> {
        Ok(self
            .lines
            .iter()
            .filter(|l| l.department_id == department_id)
            .cloned()
            .collect())
    }

    fn stations(&self, line_id: &str) -> MatrixResult<Vec<Station>> {
        Ok(self
            .stations
            .iter()
            .filter(|s| s.line_id == line_id)
            .map(|s| Station::new(s.id.clone(), s.name.clone()))
            .collect())
    }

    fn level_labels(&self) -> MatrixResult<Vec<String>> {
        Ok(self.level_labels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "departments": [{"id": "d1", "name": "Assembly", "students": []}],
        "lines": [
            {"id": "l1", "name": "Line 1", "departmentId": "d1"},
            {"id": "l2", "name": "Line 2", "departmentId": "d2"}
        ],
        "stations": [
            {"lineId": "l1", "id": "s2", "name": "Weld"},
            {"lineId": "l2", "id": "s9", "name": "Other"},
            {"lineId": "l1", "id": "s1", "name": "Press"}
        ]
    }"#;

    #[test]
    fn stations_keep_catalog_order() {
        let dir = MemoryDirectory::from_json_str(FIXTURE).unwrap();
        let stations = load_stations(&dir, "l1").unwrap();
        let ids: Vec<&str> = stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s2", "s1"]);
        assert!(load_stations(&dir, "missing").unwrap().is_empty());
    }

    #[test]
    fn lines_are_filtered_by_department() {
        let dir = MemoryDirectory::from_json_str(FIXTURE).unwrap();
        let lines = dir.lines("d1").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, "l1");
    }

    #[test]
    fn unconfigured_levels_use_default_scale() {
        let dir = MemoryDirectory::from_json_str(FIXTURE).unwrap();
        assert_eq!(load_scale(&dir), LevelScale::default());
    }
}

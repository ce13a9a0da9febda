use log::debug;
use uuid::Uuid;

use crate::error::{MatrixError, MatrixResult};
use crate::level::{FALLBACK_LEVEL, LevelScale};
use crate::model::{Criticality, MatrixRow, RosterEntry, RowIdentity, SkillCell, Station};
use crate::reconcile::default_cell;

/// The working grid: rows of the selected line plus the station columns.
///
/// All edits are local and synchronous. A failed edit leaves the grid
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatrixGrid {
    rows: Vec<MatrixRow>,
    stations: Vec<Station>,
    scale: LevelScale,
}

impl MatrixGrid {
    pub fn new(rows: Vec<MatrixRow>, stations: Vec<Station>, scale: LevelScale) -> Self {
        Self {
            rows,
            stations,
            scale,
        }
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn scale(&self) -> &LevelScale {
        &self.scale
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, row: usize) -> MatrixResult<&mut MatrixRow> {
        self.rows.get_mut(row).ok_or(MatrixError::RowOutOfRange(row))
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> MatrixResult<&mut SkillCell> {
        self.row_mut(row)?
            .cells
            .get_mut(col)
            .ok_or(MatrixError::ColumnOutOfRange { row, col })
    }

    fn level_label(&self, label: &str) -> MatrixResult<String> {
        self.scale
            .canonical(label)
            .map(str::to_string)
            .ok_or_else(|| MatrixError::UnknownLevel(label.to_string()))
    }

    /// Set the current skill level of one cell.
    pub fn set_level(&mut self, row: usize, col: usize, level: &str) -> MatrixResult<()> {
        let level = self.level_label(level)?;
        self.cell_mut(row, col)?.level = level;
        Ok(())
    }

    /// Set the minimum required level of one cell.
    pub fn set_min_level(&mut self, row: usize, col: usize, level: &str) -> MatrixResult<()> {
        let level = self.level_label(level)?;
        self.cell_mut(row, col)?.min_level = level;
        Ok(())
    }

    pub fn set_criticality(
        &mut self,
        row: usize,
        col: usize,
        criticality: Criticality,
    ) -> MatrixResult<()> {
        self.cell_mut(row, col)?.criticality = criticality;
        Ok(())
    }

    /// Set the free-text classification code of a row.
    pub fn set_classification(&mut self, row: usize, code: &str) -> MatrixResult<()> {
        self.row_mut(row)?.classification = code.trim().to_string();
        Ok(())
    }

    /// Assign a station to a row. An empty id clears the assignment.
    pub fn set_assigned_station(&mut self, row: usize, station_id: &str) -> MatrixResult<()> {
        let station_id = station_id.trim();
        let assigned = if station_id.is_empty() {
            None
        } else if self.stations.iter().any(|s| s.id == station_id) {
            Some(station_id.to_string())
        } else {
            return Err(MatrixError::UnknownStation(station_id.to_string()));
        };
        self.row_mut(row)?.assigned_station = assigned;
        Ok(())
    }

    /// Give a manual row the identity of a roster person.
    ///
    /// Every cell is reset to the person's default level; levels entered
    /// before the assignment are discarded. Roster-backed rows are refused.
    pub fn assign_person(&mut self, row: usize, person: &RosterEntry) -> MatrixResult<()> {
        let cells: Vec<SkillCell> = self
            .stations
            .iter()
            .map(|s| default_cell(s, &self.scale, &person.default_level))
            .collect();

        let target = self.row_mut(row)?;
        let RowIdentity::Manual { temporary_id, .. } = &target.identity else {
            return Err(MatrixError::NotManual(row));
        };
        let temporary_id = temporary_id.clone();

        target.identity = RowIdentity::Manual {
            temporary_id,
            person_id: Some(person.person_id.clone()),
        };
        target.name = person.name.clone();
        target.unit = person.unit_label();
        target.role = Some(person.role);
        target.joined = person.joined.clone();
        target.cells = cells;

        debug!("row {} assigned to person {}", row, person.person_id);
        Ok(())
    }

    /// Append a blank manual row and return its index.
    ///
    /// The row is assigned to the first station, like a new roster row.
    pub fn add_manual_row(&mut self) -> usize {
        let cells = self
            .stations
            .iter()
            .map(|s| default_cell(s, &self.scale, FALLBACK_LEVEL))
            .collect();

        self.rows.push(MatrixRow {
            ordinal: self.rows.len() + 1,
            identity: RowIdentity::Manual {
                temporary_id: Uuid::new_v4().to_string(),
                person_id: None,
            },
            name: String::new(),
            unit: String::new(),
            role: None,
            classification: String::new(),
            joined: String::new(),
            assigned_station: self.stations.first().map(|s| s.id.clone()),
            cells,
        });

        self.rows.len() - 1
    }
}

//! Page-level controller for the skill matrix.
//!
//! A [`MatrixSession`] owns the selection, the working grid and the form
//! metadata. It fetches from a [`Directory`] and a [`MatrixStore`], and
//! re-runs [`reconcile`] only when the fingerprint of its inputs changes.
//!
//! The session moves between three states: no line selected (empty grid,
//! actions disabled), loaded (grid editable) and saving (grid frozen until
//! the outstanding save finishes, successfully or not).

use log::{debug, info, warn};
use std::fmt;

use crate::directory::{Directory, load_scale, load_stations};
use crate::edit::MatrixGrid;
use crate::error::{MatrixError, MatrixResult};
use crate::export::{ReportInput, export_filename, to_csv, to_text};
use crate::level::LevelScale;
use crate::model::{
    Department, FooterMeta, HeaderMeta, Line, RosterEntry, SavedMatrix, Station,
};
use crate::reconcile::{InputFingerprint, ReconcileInput, reconcile};
use crate::roster::resolve_roster;
use crate::store::MatrixStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NoLineSelected,
    Loaded,
    Saving,
}

/// Message shown to the user after an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Success(m) | Notice::Info(m) => f.write_str(m),
            Notice::Error(m) => write!(f, "error: {}", m),
        }
    }
}

/// A rendered file ready to be offered for download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct MatrixSession {
    departments: Vec<Department>,
    lines: Vec<Line>,
    department_id: Option<String>,
    line_id: Option<String>,
    scale: LevelScale,
    roster: Vec<RosterEntry>,
    stations: Vec<Station>,
    saved: Option<SavedMatrix>,
    grid: MatrixGrid,
    header: HeaderMeta,
    footer: FooterMeta,
    fingerprint: Option<InputFingerprint>,
    state: SessionState,
}

impl Default for MatrixSession {
    fn default() -> Self {
        Self::new(HeaderMeta::default(), FooterMeta::default())
    }
}

impl MatrixSession {
    /// Create a session with the given default form metadata.
    pub fn new(header: HeaderMeta, footer: FooterMeta) -> Self {
        Self {
            departments: Vec::new(),
            lines: Vec::new(),
            department_id: None,
            line_id: None,
            scale: LevelScale::default(),
            roster: Vec::new(),
            stations: Vec::new(),
            saved: None,
            grid: MatrixGrid::default(),
            header,
            footer,
            fingerprint: None,
            state: SessionState::NoLineSelected,
        }
    }

    /// Fetch the department list and the level scale.
    ///
    /// A failed fetch leaves the department list empty.
    pub fn load_directory<D: Directory + ?Sized>(&mut self, directory: &D) {
        self.departments = directory.departments().unwrap_or_else(|e| {
            warn!("failed to fetch departments: {}", e);
            Vec::new()
        });
        self.scale = load_scale(directory);
        debug!("{} departments available", self.departments.len());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn department_id(&self) -> Option<&str> {
        self.department_id.as_deref()
    }

    pub fn line_id(&self) -> Option<&str> {
        self.line_id.as_deref()
    }

    pub fn scale(&self) -> &LevelScale {
        &self.scale
    }

    pub fn grid(&self) -> &MatrixGrid {
        &self.grid
    }

    pub fn header(&self) -> &HeaderMeta {
        &self.header
    }

    pub fn footer(&self) -> &FooterMeta {
        &self.footer
    }

    pub fn header_mut(&mut self) -> &mut HeaderMeta {
        &mut self.header
    }

    pub fn footer_mut(&mut self) -> &mut FooterMeta {
        &mut self.footer
    }

    /// Select a department. Any selected line is cleared.
    pub fn select_department<D: Directory + ?Sized>(
        &mut self,
        directory: &D,
        department_id: &str,
    ) -> MatrixResult<()> {
        if self.state == SessionState::Saving {
            return Err(MatrixError::SaveInProgress);
        }
        self.department_id = Some(department_id.to_string());
        self.line_id = None;
        self.stations.clear();
        self.saved = None;

        self.lines = directory.lines(department_id).unwrap_or_else(|e| {
            warn!("failed to fetch lines for {}: {}", department_id, e);
            Vec::new()
        });
        self.roster = resolve_roster(department_id, &self.departments, &self.scale);
        self.state = SessionState::NoLineSelected;
        self.fingerprint = None;
        self.recompute();
        Ok(())
    }

    /// Select a line of the current department and load its matrix.
    pub fn select_line<D, S>(
        &mut self,
        directory: &D,
        store: &S,
        line_id: &str,
    ) -> MatrixResult<()>
    where
        D: Directory + ?Sized,
        S: MatrixStore + ?Sized,
    {
        if self.department_id.is_none() {
            return Err(MatrixError::NoLineSelected);
        }
        if self.state == SessionState::Saving {
            return Err(MatrixError::SaveInProgress);
        }
        self.line_id = Some(line_id.to_string());
        self.state = SessionState::Loaded;
        self.fetch_line(directory, store);
        // A new selection always starts from a fresh grid.
        self.fingerprint = None;
        self.recompute();
        Ok(())
    }

    /// Re-fetch everything for the current selection.
    ///
    /// Returns true when the working grid was recomputed; unchanged inputs
    /// keep the grid and any unsaved edits.
    pub fn refresh<D, S>(&mut self, directory: &D, store: &S) -> bool
    where
        D: Directory + ?Sized,
        S: MatrixStore + ?Sized,
    {
        if self.state == SessionState::Saving {
            return false;
        }
        self.load_directory(directory);
        if let Some(department_id) = self.department_id.clone() {
            self.lines = directory.lines(&department_id).unwrap_or_default();
            self.roster = resolve_roster(&department_id, &self.departments, &self.scale);
        }
        if self.line_id.is_some() {
            self.fetch_line(directory, store);
        }
        self.recompute()
    }

    fn fetch_line<D, S>(&mut self, directory: &D, store: &S)
    where
        D: Directory + ?Sized,
        S: MatrixStore + ?Sized,
    {
        let (Some(department_id), Some(line_id)) = (&self.department_id, &self.line_id) else {
            return;
        };

        self.stations = load_stations(directory, line_id).unwrap_or_else(|e| {
            warn!("failed to fetch stations for line {}: {}", line_id, e);
            Vec::new()
        });
        self.saved = store.load(department_id, line_id).unwrap_or_else(|e| {
            warn!("failed to fetch saved matrix for {}/{}: {}", department_id, line_id, e);
            None
        });
    }

    /// Reconcile again if any input changed since the last run.
    fn recompute(&mut self) -> bool {
        let input = ReconcileInput {
            line_selected: self.line_id.is_some(),
            roster: &self.roster,
            stations: &self.stations,
            scale: &self.scale,
            saved: self.saved.as_ref(),
        };
        let fingerprint = input.fingerprint();
        if self.fingerprint == Some(fingerprint) {
            return false;
        }

        let reconciled = reconcile(&input);
        if let Some(header) = reconciled.header {
            self.header = header;
        }
        if let Some(footer) = reconciled.footer {
            self.footer = footer;
        }
        self.grid = MatrixGrid::new(reconciled.rows, self.stations.clone(), self.scale.clone());
        self.fingerprint = Some(fingerprint);
        true
    }

    /// The working grid, for editing.
    pub fn grid_mut(&mut self) -> MatrixResult<&mut MatrixGrid> {
        match self.state {
            SessionState::NoLineSelected => Err(MatrixError::NoLineSelected),
            SessionState::Saving => Err(MatrixError::SaveInProgress),
            SessionState::Loaded => Ok(&mut self.grid),
        }
    }

    /// Append a blank manual row ("Add Operator").
    pub fn add_operator(&mut self) -> MatrixResult<usize> {
        Ok(self.grid_mut()?.add_manual_row())
    }

    /// Assign a roster person to a manual row.
    pub fn assign_person(&mut self, row: usize, person_id: &str) -> MatrixResult<()> {
        let person = self
            .roster
            .iter()
            .find(|p| p.person_id == person_id)
            .cloned()
            .ok_or_else(|| MatrixError::UnknownPerson(person_id.to_string()))?;
        self.grid_mut()?.assign_person(row, &person)
    }

    /// Freeze the grid and serialize it for saving.
    pub fn begin_save(&mut self) -> MatrixResult<SavedMatrix> {
        match self.state {
            SessionState::NoLineSelected => return Err(MatrixError::NoLineSelected),
            SessionState::Saving => return Err(MatrixError::SaveInProgress),
            SessionState::Loaded => {}
        }
        let (Some(department_id), Some(line_id)) = (&self.department_id, &self.line_id) else {
            return Err(MatrixError::NoLineSelected);
        };

        let document = SavedMatrix::from_rows(
            department_id,
            line_id,
            self.grid.rows(),
            &self.header,
            &self.footer,
        );
        self.state = SessionState::Saving;
        Ok(document)
    }

    /// Unfreeze the grid once the save request has completed.
    ///
    /// On success the saved document becomes the new reconciliation input,
    /// provided it belongs to the current selection. On failure the grid is
    /// left exactly as it was so the user can retry.
    pub fn finish_save(&mut self, document: SavedMatrix, result: MatrixResult<()>) -> Notice {
        self.state = if self.line_id.is_some() {
            SessionState::Loaded
        } else {
            SessionState::NoLineSelected
        };
        match result {
            Ok(()) => {
                info!(
                    "saved skill matrix for {}/{}",
                    document.department_id, document.line_id
                );
                if self.is_selected(&document.department_id, &document.line_id) {
                    self.saved = Some(document);
                    self.recompute();
                } else {
                    debug!("saved matrix is not for the current selection; grid kept");
                }
                Notice::Success("Skill matrix saved".to_string())
            }
            Err(e) => {
                warn!("failed to save skill matrix: {}", e);
                Notice::Error(format!("Failed to save skill matrix: {}", e))
            }
        }
    }

    fn is_selected(&self, department_id: &str, line_id: &str) -> bool {
        self.department_id.as_deref() == Some(department_id)
            && self.line_id.as_deref() == Some(line_id)
    }

    /// Save the working grid ("Save Data").
    pub fn save<S: MatrixStore + ?Sized>(&mut self, store: &mut S) -> Notice {
        let document = match self.begin_save() {
            Ok(document) => document,
            Err(e) => return Notice::Error(e.to_string()),
        };
        let result = store.save(&document);
        self.finish_save(document, result)
    }

    fn department_name(&self) -> &str {
        let id = self.department_id.as_deref().unwrap_or_default();
        self.departments
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.as_str())
            .unwrap_or(id)
    }

    fn line_name(&self) -> &str {
        let id = self.line_id.as_deref().unwrap_or_default();
        self.lines
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.as_str())
            .unwrap_or(id)
    }

    fn report(&self) -> ReportInput<'_> {
        ReportInput {
            department: self.department_name(),
            line: self.line_name(),
            rows: self.grid.rows(),
            stations: self.grid.stations(),
            scale: &self.scale,
            header: &self.header,
            footer: &self.footer,
        }
    }

    fn no_data() -> Notice {
        Notice::Info("No data to export. Select a department and line first.".to_string())
    }

    /// Render the workbook ("Export Excel").
    #[cfg(feature = "xlsx")]
    pub fn export(&self) -> Result<ExportFile, Notice> {
        if self.grid.is_empty() {
            return Err(Self::no_data());
        }
        let bytes = crate::export::to_xlsx(&self.report())
            .map_err(|e| Notice::Error(format!("Failed to export skill matrix: {}", e)))?;
        Ok(ExportFile {
            filename: export_filename(self.department_name(), self.line_name()),
            bytes,
        })
    }

    /// Render the table as CSV, named like the workbook.
    pub fn export_csv(&self) -> Result<ExportFile, Notice> {
        if self.grid.is_empty() {
            return Err(Self::no_data());
        }
        let csv = to_csv(&self.report())
            .map_err(|e| Notice::Error(format!("Failed to export skill matrix: {}", e)))?;
        let filename = export_filename(self.department_name(), self.line_name())
            .replace(".xlsx", ".csv");
        Ok(ExportFile {
            filename,
            bytes: csv.into_bytes(),
        })
    }

    /// Text rendition of the form ("Print").
    pub fn print(&self) -> Result<String, Notice> {
        if self.line_id.is_none() {
            return Err(Notice::Info("Select a department and line first.".to_string()));
        }
        Ok(to_text(&self.report()))
    }
}

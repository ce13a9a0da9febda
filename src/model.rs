use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A person listed on a department record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub joined: Option<String>,
}

/// An enrollment unit with an optional instructor and its students.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub instructor: Option<Person>,
    #[serde(default)]
    pub students: Vec<Person>,
}

/// A production line belonging to a department.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: String,
    pub name: String,
    pub department_id: String,
}

/// One machine or work-station on a line; a column of the matrix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Instructor.
    #[serde(rename = "TNR")]
    Tnr,
    /// Trainee.
    #[serde(rename = "EMP")]
    Emp,
}

impl Role {
    pub fn tag(&self) -> &'static str {
        match self {
            Role::Tnr => "TNR",
            Role::Emp => "EMP",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A person eligible to appear in the matrix, derived from a department.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RosterEntry {
    pub person_id: String,
    pub name: String,
    pub role: Role,
    pub default_level: String,
    /// Join date already formatted for display.
    pub joined: String,
    pub units: Vec<String>,
}

impl RosterEntry {
    /// Units joined for display, e.g. `"Assembly, Paint"`.
    pub fn unit_label(&self) -> String {
        self.units.join(", ")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criticality {
    Critical,
    #[default]
    #[serde(rename = "Non-Critical")]
    NonCritical,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Critical => "Critical",
            Criticality::NonCritical => "Non-Critical",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "critical" | "c" => Ok(Criticality::Critical),
            "non-critical" | "noncritical" | "nc" => Ok(Criticality::NonCritical),
            other => Err(format!("unknown criticality: {}", other)),
        }
    }
}

/// One (person, station) pair in the working grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SkillCell {
    pub station_id: String,
    pub station_name: String,
    pub criticality: Criticality,
    pub min_level: String,
    pub level: String,
}

/// Where a row's identity comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowIdentity {
    /// Backed by a member of the selected department's roster.
    RosterBacked { person_id: String },
    /// Added ad hoc. `person_id` is set once a roster person is assigned.
    Manual {
        temporary_id: String,
        person_id: Option<String>,
    },
}

impl RowIdentity {
    pub fn person_id(&self) -> Option<&str> {
        match self {
            RowIdentity::RosterBacked { person_id } => Some(person_id),
            RowIdentity::Manual { person_id, .. } => person_id.as_deref(),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, RowIdentity::Manual { .. })
    }
}

/// One person's skill record across all stations of the selected line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatrixRow {
    pub ordinal: usize,
    pub identity: RowIdentity,
    pub name: String,
    pub unit: String,
    pub role: Option<Role>,
    pub classification: String,
    pub joined: String,
    pub assigned_station: Option<String>,
    pub cells: Vec<SkillCell>,
}

/// Header block of the printed form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderMeta {
    pub form_no: String,
    pub revision_no: String,
    pub revision_date: String,
    pub page_no: String,
}

impl Default for HeaderMeta {
    fn default() -> Self {
        Self {
            form_no: "SM-01".to_string(),
            revision_no: "00".to_string(),
            revision_date: String::new(),
            page_no: "1 of 1".to_string(),
        }
    }
}

/// One line of the revision-history table. Free text, not enforced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevisionRecord {
    pub revision_no: String,
    pub date: String,
    pub description: String,
    pub approved_by: String,
}

/// Footer block of the printed form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterMeta {
    pub guidelines: String,
    pub legend_note: String,
    pub revisions: Vec<RevisionRecord>,
}

impl Default for FooterMeta {
    fn default() -> Self {
        Self {
            guidelines: [
                "1. The skill matrix shall be reviewed every six months.",
                "2. Operators below the minimum level shall work under supervision only.",
                "3. Critical stations shall be staffed by operators at or above the minimum level.",
            ]
            .join("\n"),
            legend_note: "Skill levels are assessed by the line instructor.".to_string(),
            revisions: Vec::new(),
        }
    }
}

/// Persisted form of a cell: the station is referenced by id only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCell {
    pub station_id: String,
    #[serde(default)]
    pub criticality: Criticality,
    pub min_level: String,
    pub level: String,
}

impl From<&SkillCell> for SavedCell {
    fn from(cell: &SkillCell) -> Self {
        Self {
            station_id: cell.station_id.clone(),
            criticality: cell.criticality,
            min_level: cell.min_level.clone(),
            level: cell.level.clone(),
        }
    }
}

/// Persisted form of a row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEntry {
    pub ordinal: usize,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub temporary_id: Option<String>,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub joined: String,
    #[serde(default)]
    pub assigned_station: Option<String>,
    #[serde(default)]
    pub cells: Vec<SavedCell>,
}

impl SavedEntry {
    pub fn cell(&self, station_id: &str) -> Option<&SavedCell> {
        self.cells.iter().find(|c| c.station_id == station_id)
    }

    /// Stable identity of a manual entry.
    ///
    /// Documents written without a temporary id fall back to one derived from
    /// the saved ordinal so that reloading stays deterministic.
    pub fn manual_key(&self) -> String {
        self.temporary_id
            .clone()
            .unwrap_or_else(|| format!("manual-{}", self.ordinal))
    }
}

impl From<&MatrixRow> for SavedEntry {
    fn from(row: &MatrixRow) -> Self {
        let (person_id, temporary_id, manual) = match &row.identity {
            RowIdentity::RosterBacked { person_id } => (Some(person_id.clone()), None, false),
            RowIdentity::Manual {
                temporary_id,
                person_id,
            } => (person_id.clone(), Some(temporary_id.clone()), true),
        };

        Self {
            ordinal: row.ordinal,
            person_id,
            temporary_id,
            manual,
            name: row.name.clone(),
            unit: row.unit.clone(),
            role: row.role,
            classification: row.classification.clone(),
            joined: row.joined.clone(),
            assigned_station: row.assigned_station.clone(),
            cells: row.cells.iter().map(SavedCell::from).collect(),
        }
    }
}

/// The persisted matrix for one (department, line) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatrix {
    pub department_id: String,
    pub line_id: String,
    #[serde(default)]
    pub entries: Vec<SavedEntry>,
    #[serde(default)]
    pub header: Option<HeaderMeta>,
    #[serde(default)]
    pub footer: Option<FooterMeta>,
}

impl SavedMatrix {
    /// Serialize a working grid wholesale.
    pub fn from_rows(
        department_id: &str,
        line_id: &str,
        rows: &[MatrixRow],
        header: &HeaderMeta,
        footer: &FooterMeta,
    ) -> Self {
        Self {
            department_id: department_id.to_string(),
            line_id: line_id.to_string(),
            entries: rows.iter().map(SavedEntry::from).collect(),
            header: Some(header.clone()),
            footer: Some(footer.clone()),
        }
    }

    /// Saved entry for a roster person.
    ///
    /// The person's non-manual entry wins; failing that, a manual entry
    /// assigned to them is used.
    pub fn roster_entry(&self, person_id: &str) -> Option<&SavedEntry> {
        self.entries
            .iter()
            .find(|e| !e.manual && e.person_id.as_deref() == Some(person_id))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.person_id.as_deref() == Some(person_id))
            })
    }
}

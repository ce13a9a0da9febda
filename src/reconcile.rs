//! Merge of the live roster and station catalog with a saved matrix.
//!
//! [`reconcile`] is a pure function of its inputs. It is re-run from scratch
//! whenever any input changes; [`InputFingerprint`] lets a caller tell
//! whether that is the case without comparing the inputs field by field.

use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::level::{FALLBACK_LEVEL, LevelScale};
use crate::model::{
    Criticality, FooterMeta, HeaderMeta, MatrixRow, Role, RosterEntry, RowIdentity, SavedEntry,
    SavedMatrix, SkillCell, Station,
};

/// Everything the working grid is computed from.
#[derive(Clone, Copy, Debug, Hash)]
pub struct ReconcileInput<'a> {
    pub line_selected: bool,
    pub roster: &'a [RosterEntry],
    pub stations: &'a [Station],
    pub scale: &'a LevelScale,
    pub saved: Option<&'a SavedMatrix>,
}

/// The working grid plus the header and footer found in the saved document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub rows: Vec<MatrixRow>,
    pub header: Option<HeaderMeta>,
    pub footer: Option<FooterMeta>,
}

/// Hash of a [`ReconcileInput`], used to skip recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputFingerprint(u64);

impl ReconcileInput<'_> {
    pub fn fingerprint(&self) -> InputFingerprint {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        InputFingerprint(hasher.finish())
    }
}

/// Build the working grid.
///
/// Roster members come first, in roster order, each carrying over the saved
/// values for stations that still exist. Saved manual rows whose person is not
/// on the roster are appended after them. Missing data always resolves to a
/// default; this never fails.
pub fn reconcile(input: &ReconcileInput<'_>) -> Reconciled {
    if !input.line_selected {
        return Reconciled::default();
    }

    let mut rows = Vec::with_capacity(input.roster.len());

    for person in input.roster {
        let saved = input.saved.and_then(|doc| doc.roster_entry(&person.person_id));
        rows.push(MatrixRow {
            ordinal: rows.len() + 1,
            identity: RowIdentity::RosterBacked {
                person_id: person.person_id.clone(),
            },
            name: person.name.clone(),
            unit: person.unit_label(),
            role: Some(person.role),
            classification: saved.map(|e| e.classification.clone()).unwrap_or_default(),
            joined: person.joined.clone(),
            assigned_station: assigned_station(saved, input.stations),
            cells: cells_for(saved, input.stations, input.scale, &person.default_level),
        });
    }

    let mut manual_count = 0;
    if let Some(doc) = input.saved {
        let on_roster: HashSet<&str> = input
            .roster
            .iter()
            .map(|p| p.person_id.as_str())
            .collect();
        let mut seen: HashSet<String> = HashSet::new();

        for entry in doc.entries.iter().filter(|e| e.manual) {
            if entry
                .person_id
                .as_deref()
                .is_some_and(|id| on_roster.contains(id))
            {
                continue;
            }
            let key = entry.manual_key();
            if !seen.insert(key.clone()) {
                continue;
            }

            let default_level = manual_default_level(entry.role, input.scale);
            rows.push(MatrixRow {
                ordinal: rows.len() + 1,
                identity: RowIdentity::Manual {
                    temporary_id: key,
                    person_id: entry.person_id.clone(),
                },
                name: entry.name.clone(),
                unit: entry.unit.clone(),
                role: entry.role,
                classification: entry.classification.clone(),
                joined: entry.joined.clone(),
                assigned_station: assigned_station(Some(entry), input.stations),
                cells: cells_for(Some(entry), input.stations, input.scale, default_level),
            });
            manual_count += 1;
        }
    }

    debug!(
        "reconciled {} rows ({} manual) over {} stations",
        rows.len(),
        manual_count,
        input.stations.len()
    );

    Reconciled {
        rows,
        header: input.saved.and_then(|d| d.header.clone()),
        footer: input.saved.and_then(|d| d.footer.clone()),
    }
}

/// One cell per current station, carrying over saved values where present.
pub fn cells_for(
    saved: Option<&SavedEntry>,
    stations: &[Station],
    scale: &LevelScale,
    default_level: &str,
) -> Vec<SkillCell> {
    stations
        .iter()
        .map(|station| match saved.and_then(|e| e.cell(&station.id)) {
            Some(cell) => SkillCell {
                station_id: station.id.clone(),
                station_name: station.name.clone(),
                criticality: cell.criticality,
                min_level: cell.min_level.clone(),
                level: cell.level.clone(),
            },
            None => default_cell(station, scale, default_level),
        })
        .collect()
}

pub fn default_cell(station: &Station, scale: &LevelScale, level: &str) -> SkillCell {
    SkillCell {
        station_id: station.id.clone(),
        station_name: station.name.clone(),
        criticality: Criticality::NonCritical,
        min_level: scale.min().to_string(),
        level: level.to_string(),
    }
}

/// Default level for a person with the given role.
pub fn default_level_for(role: Role, scale: &LevelScale) -> &str {
    match role {
        Role::Tnr => scale.max(),
        Role::Emp => scale.min(),
    }
}

fn manual_default_level(role: Option<Role>, scale: &LevelScale) -> &str {
    match role {
        Some(role) => default_level_for(role, scale),
        None => FALLBACK_LEVEL,
    }
}

// A saved station that has since left the catalog falls back to the first one.
fn assigned_station(saved: Option<&SavedEntry>, stations: &[Station]) -> Option<String> {
    saved
        .and_then(|e| e.assigned_station.as_deref())
        .filter(|id| stations.iter().any(|s| s.id == *id))
        .map(str::to_string)
        .or_else(|| stations.first().map(|s| s.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SavedCell;

    fn person(id: &str, role: Role, scale: &LevelScale) -> RosterEntry {
        RosterEntry {
            person_id: id.to_string(),
            name: format!("Person {}", id),
            role,
            default_level: default_level_for(role, scale).to_string(),
            joined: String::new(),
            units: vec!["Assembly".to_string()],
        }
    }

    fn stations(ids: &[&str]) -> Vec<Station> {
        ids.iter().map(|id| Station::new(*id, id.to_uppercase())).collect()
    }

    fn saved_cell(station: &str, level: &str) -> SavedCell {
        SavedCell {
            station_id: station.to_string(),
            criticality: Criticality::Critical,
            min_level: "L-3".to_string(),
            level: level.to_string(),
        }
    }

    fn saved_entry(person: Option<&str>, manual: bool, cells: Vec<SavedCell>) -> SavedEntry {
        SavedEntry {
            ordinal: 1,
            person_id: person.map(str::to_string),
            temporary_id: manual.then(|| format!("tmp-{}", person.unwrap_or("blank"))),
            manual,
            name: "Saved".to_string(),
            unit: "Old unit".to_string(),
            role: None,
            classification: "A".to_string(),
            joined: String::new(),
            assigned_station: Some("b".to_string()),
            cells,
        }
    }

    fn document(entries: Vec<SavedEntry>) -> SavedMatrix {
        SavedMatrix {
            department_id: "d1".to_string(),
            line_id: "l1".to_string(),
            entries,
            header: None,
            footer: None,
        }
    }

    #[test]
    fn nothing_without_a_line() {
        let scale = LevelScale::default();
        let roster = vec![person("t", Role::Tnr, &scale)];
        let stations = stations(&["a"]);
        let out = reconcile(&ReconcileInput {
            line_selected: false,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: None,
        });
        assert!(out.rows.is_empty());
    }

    #[test]
    fn instructor_only_with_three_stations() {
        let scale = LevelScale::default();
        let roster = vec![person("t", Role::Tnr, &scale)];
        let stations = stations(&["a", "b", "c"]);
        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: None,
        });

        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.ordinal, 1);
        assert_eq!(row.assigned_station.as_deref(), Some("a"));
        assert_eq!(row.cells.len(), 3);
        for cell in &row.cells {
            assert_eq!(cell.criticality, Criticality::NonCritical);
            assert_eq!(cell.min_level, "L-1");
            assert_eq!(cell.level, "L-5");
        }
    }

    #[test]
    fn removed_station_is_dropped_and_new_one_defaulted() {
        let scale = LevelScale::default();
        let roster = vec![person("p", Role::Emp, &scale)];
        let stations = stations(&["b", "c"]);
        let doc = document(vec![saved_entry(
            Some("p"),
            false,
            vec![saved_cell("a", "L-4"), saved_cell("b", "L-3")],
        )]);

        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: Some(&doc),
        });

        let cells = &out.rows[0].cells;
        let ids: Vec<&str> = cells.iter().map(|c| c.station_id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
        assert_eq!(cells[0].level, "L-3");
        assert_eq!(cells[0].criticality, Criticality::Critical);
        assert_eq!(cells[0].min_level, "L-3");
        assert_eq!(cells[1].level, "L-1");
        assert_eq!(cells[1].criticality, Criticality::NonCritical);
        assert_eq!(out.rows[0].classification, "A");
        assert_eq!(out.rows[0].assigned_station.as_deref(), Some("b"));
        // Display fields come from the roster, not the saved entry.
        assert_eq!(out.rows[0].unit, "Assembly");
    }

    #[test]
    fn stale_assigned_station_falls_back_to_first() {
        let scale = LevelScale::default();
        let roster = vec![person("p", Role::Emp, &scale)];
        let stations = stations(&["x", "y"]);
        let doc = document(vec![saved_entry(Some("p"), false, vec![])]);
        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: Some(&doc),
        });
        assert_eq!(out.rows[0].assigned_station.as_deref(), Some("x"));
    }

    #[test]
    fn manual_rows_follow_roster_rows() {
        let scale = LevelScale::default();
        let roster = vec![person("p", Role::Emp, &scale)];
        let stations = stations(&["b", "c"]);
        let doc = document(vec![
            saved_entry(None, true, vec![saved_cell("b", "L-2"), saved_cell("z", "L-5")]),
            saved_entry(Some("gone"), true, vec![]),
        ]);

        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: Some(&doc),
        });

        assert_eq!(out.rows.len(), 3);
        assert_eq!(
            out.rows.iter().map(|r| r.ordinal).collect::<Vec<_>>(),
            [1, 2, 3]
        );
        let blank = &out.rows[1];
        assert!(blank.identity.is_manual());
        assert_eq!(blank.cells.len(), 2);
        assert_eq!(blank.cells[0].level, "L-2");
        assert_eq!(blank.cells[1].level, FALLBACK_LEVEL);
        assert_eq!(out.rows[2].identity.person_id(), Some("gone"));
    }

    #[test]
    fn roster_row_wins_over_manual_duplicate() {
        let scale = LevelScale::default();
        let roster = vec![person("p", Role::Emp, &scale)];
        let stations = stations(&["b"]);
        let doc = document(vec![
            saved_entry(Some("p"), false, vec![saved_cell("b", "L-4")]),
            saved_entry(Some("p"), true, vec![saved_cell("b", "L-2")]),
        ]);

        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: Some(&doc),
        });

        assert_eq!(out.rows.len(), 1);
        assert!(!out.rows[0].identity.is_manual());
        assert_eq!(out.rows[0].cells[0].level, "L-4");
    }

    #[test]
    fn departed_roster_person_is_dropped() {
        let scale = LevelScale::default();
        let roster: Vec<RosterEntry> = Vec::new();
        let stations = stations(&["b"]);
        let doc = document(vec![saved_entry(Some("left"), false, vec![])]);
        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &stations,
            scale: &scale,
            saved: Some(&doc),
        });
        assert!(out.rows.is_empty());
    }

    #[test]
    fn saved_header_and_footer_are_returned() {
        let scale = LevelScale::default();
        let mut doc = document(vec![]);
        doc.header = Some(HeaderMeta {
            form_no: "F-9".to_string(),
            ..HeaderMeta::default()
        });
        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &[],
            stations: &[],
            scale: &scale,
            saved: Some(&doc),
        });
        assert_eq!(out.header.unwrap().form_no, "F-9");
        assert!(out.footer.is_none());
    }

    #[test]
    fn no_stations_means_no_assigned_station() {
        let scale = LevelScale::default();
        let roster = vec![person("p", Role::Emp, &scale)];
        let out = reconcile(&ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations: &[],
            scale: &scale,
            saved: None,
        });
        assert!(out.rows[0].cells.is_empty());
        assert!(out.rows[0].assigned_station.is_none());
    }

    #[test]
    fn fingerprint_tracks_inputs() {
        let scale = LevelScale::default();
        let roster = vec![person("p", Role::Emp, &scale)];
        let a = stations(&["a"]);
        let b = stations(&["b"]);
        let input = |stations: &[Station]| ReconcileInput {
            line_selected: true,
            roster: &roster,
            stations,
            scale: &scale,
            saved: None,
        }
        .fingerprint();
        assert_eq!(input(&a), input(&a));
        assert_ne!(input(&a), input(&b));
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;

use crate::level::LevelScale;
use crate::model::{Department, Person, Role, RosterEntry};

/// Derive the roster of a department.
///
/// The instructor comes first, tagged `TNR` with the highest level as the
/// default, followed by every student in record order, tagged `EMP` with the
/// lowest level. An unknown department yields an empty roster.
///
/// # Arguments
/// * `department_id` - Department to resolve
/// * `departments` - Previously fetched department records
/// * `scale` - Configured skill levels
pub fn resolve_roster(
    department_id: &str,
    departments: &[Department],
    scale: &LevelScale,
) -> Vec<RosterEntry> {
    let Some(department) = departments.iter().find(|d| d.id == department_id) else {
        debug!("department {} not found, roster is empty", department_id);
        return Vec::new();
    };

    let mut roster = Vec::with_capacity(department.students.len() + 1);

    if let Some(instructor) = &department.instructor {
        roster.push(entry(instructor, Role::Tnr, scale.max(), department));
    }
    for student in &department.students {
        roster.push(entry(student, Role::Emp, scale.min(), department));
    }

    debug!(
        "resolved {} roster entries for department {}",
        roster.len(),
        department_id
    );
    roster
}

fn entry(person: &Person, role: Role, default_level: &str, department: &Department) -> RosterEntry {
    RosterEntry {
        person_id: person.id.clone(),
        name: person.name.clone(),
        role,
        default_level: default_level.to_string(),
        joined: person
            .joined
            .as_deref()
            .map(format_join_date)
            .unwrap_or_default(),
        units: vec![department.name.clone()],
    }
}

/// Format a join date for display as `DD-MM-YYYY`.
///
/// Accepts plain ISO dates, RFC 3339 timestamps and naive timestamps.
/// Anything else is returned unchanged.
pub fn format_join_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.date())
        });

    match date {
        Some(d) => d.format("%d-%m-%Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, name: &str) -> Person {
        Person {
            id: id.to_string(),
            name: name.to_string(),
            joined: Some("2024-03-01".to_string()),
        }
    }

    fn department(students: usize, with_instructor: bool) -> Department {
        Department {
            id: "d1".to_string(),
            name: "Assembly".to_string(),
            instructor: with_instructor.then(|| person("t1", "Trainer")),
            students: (0..students)
                .map(|i| person(&format!("s{}", i), &format!("Student {}", i)))
                .collect(),
        }
    }

    #[test]
    fn instructor_comes_first() {
        let scale = LevelScale::default();
        for n in 0..5 {
            let roster = resolve_roster("d1", &[department(n, true)], &scale);
            assert_eq!(roster.len(), n + 1);
            assert_eq!(roster[0].role, Role::Tnr);
            assert_eq!(roster[0].person_id, "t1");
            assert_eq!(roster[0].default_level, "L-5");
            for (i, e) in roster[1..].iter().enumerate() {
                assert_eq!(e.role, Role::Emp);
                assert_eq!(e.person_id, format!("s{}", i));
                assert_eq!(e.default_level, "L-1");
            }
        }
    }

    #[test]
    fn unknown_or_empty_department() {
        let scale = LevelScale::default();
        assert!(resolve_roster("nope", &[department(3, true)], &scale).is_empty());
        assert!(resolve_roster("d1", &[department(0, false)], &scale).is_empty());
    }

    #[test]
    fn roster_carries_unit_and_join_date() {
        let roster = resolve_roster("d1", &[department(1, false)], &LevelScale::default());
        assert_eq!(roster[0].unit_label(), "Assembly");
        assert_eq!(roster[0].joined, "01-03-2024");
    }

    #[test]
    fn join_date_formats() {
        assert_eq!(format_join_date("2023-12-31"), "31-12-2023");
        assert_eq!(format_join_date("2023-12-31T10:00:00Z"), "31-12-2023");
        assert_eq!(format_join_date("2023-12-31T10:00:00.000"), "31-12-2023");
        assert_eq!(format_join_date("last spring"), "last spring");
    }
}

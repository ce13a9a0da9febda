use crate::error::{MatrixError, MatrixResult};
use crate::level::{LevelScale, short_label};
use crate::model::{Criticality, FooterMeta, HeaderMeta, MatrixRow, Station};

/// Attribute columns printed before the station columns.
pub const FIXED_HEADERS: [&str; 7] = [
    "S.No",
    "Name",
    "Unit",
    "Role",
    "Code",
    "Joined",
    "Assigned Station",
];

/// Signature block at the foot of the form.
pub const SIGNATURES: [&str; 3] = ["Prepared By", "Reviewed By", "Approved By"];

/// Everything printed on the skill matrix form.
#[derive(Clone, Copy, Debug)]
pub struct ReportInput<'a> {
    pub department: &'a str,
    pub line: &'a str,
    pub rows: &'a [MatrixRow],
    pub stations: &'a [Station],
    pub scale: &'a LevelScale,
    pub header: &'a HeaderMeta,
    pub footer: &'a FooterMeta,
}

/// File name offered for the workbook download.
///
/// # Examples
/// ```
/// use skill_matrix::export::export_filename;
///
/// assert_eq!(export_filename("Assembly", "Line 1"), "SkillMatrix_Assembly_Line_1.xlsx");
/// ```
pub fn export_filename(department: &str, line: &str) -> String {
    format!(
        "SkillMatrix_{}_{}.xlsx",
        file_component(department),
        file_component(line)
    )
}

fn file_component(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Meaning of a level, printed in the legend.
pub fn level_description(label: &str) -> &'static str {
    match short_label(label).as_str() {
        "L-0" => "Not trained",
        "L-1" => "Under training",
        "L-2" => "Can work under supervision",
        "L-3" => "Can work independently",
        "L-4" => "Can work independently and train others",
        "L-5" => "Expert, can certify others",
        _ => "",
    }
}

fn station_name<'a>(stations: &'a [Station], id: Option<&str>) -> &'a str {
    id.and_then(|id| stations.iter().find(|s| s.id == id))
        .map(|s| s.name.as_str())
        .unwrap_or("")
}

fn fixed_values(row: &MatrixRow, stations: &[Station]) -> [String; 7] {
    [
        row.ordinal.to_string(),
        row.name.clone(),
        row.unit.clone(),
        row.role.map(|r| r.tag().to_string()).unwrap_or_default(),
        row.classification.clone(),
        row.joined.clone(),
        station_name(stations, row.assigned_station.as_deref()).to_string(),
    ]
}

/// Render the matrix table as CSV
///
/// One line per row, with the fixed attribute columns followed by one column
/// per station holding the short level label. Fields containing commas,
/// quotes or newlines are quoted.
///
/// # Arguments
/// * `report` - Rows and stations to render
///
/// # Returns
/// * `MatrixResult<String>` - CSV content, or `NothingToExport` for an empty grid
pub fn to_csv(report: &ReportInput<'_>) -> MatrixResult<String> {
    if report.rows.is_empty() {
        return Err(MatrixError::NothingToExport);
    }

    let mut csv_content = String::new();

    let headers = FIXED_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain(report.stations.iter().map(|s| s.name.clone()));
    push_csv_line(&mut csv_content, headers);

    for row in report.rows {
        let values = fixed_values(row, report.stations)
            .into_iter()
            .chain(row.cells.iter().map(|c| short_label(&c.level)));
        push_csv_line(&mut csv_content, values);
    }

    Ok(csv_content)
}

fn push_csv_line(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, value) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            let escaped = value.replace('"', "\"\"");
            out.push_str(&format!("\"{}\"", escaped));
        } else {
            out.push_str(&value);
        }
    }
    out.push('\n');
}

/// Plain-text rendition of the form, used for printing.
pub fn to_text(report: &ReportInput<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "SKILL MATRIX    Form No: {}  Rev: {}  Rev Date: {}  Page: {}\n",
        report.header.form_no,
        report.header.revision_no,
        report.header.revision_date,
        report.header.page_no
    ));
    out.push_str(&format!(
        "Department: {}    Line: {}\n\n",
        report.department, report.line
    ));

    out.push_str(&format!(
        "{:<5}{:<24}{:<16}{:<6}{:<8}{:<12}{:<18}",
        FIXED_HEADERS[0],
        FIXED_HEADERS[1],
        FIXED_HEADERS[2],
        FIXED_HEADERS[3],
        FIXED_HEADERS[4],
        FIXED_HEADERS[5],
        FIXED_HEADERS[6]
    ));
    for station in report.stations {
        out.push_str(&format!("{:<12}", station.name));
    }
    out.push('\n');

    for row in report.rows {
        let v = fixed_values(row, report.stations);
        out.push_str(&format!(
            "{:<5}{:<24}{:<16}{:<6}{:<8}{:<12}{:<18}",
            v[0], v[1], v[2], v[3], v[4], v[5], v[6]
        ));
        for cell in &row.cells {
            let mark = match cell.criticality {
                Criticality::Critical => "*",
                Criticality::NonCritical => "",
            };
            out.push_str(&format!("{:<12}", format!("{}{}", short_label(&cell.level), mark)));
        }
        out.push('\n');
    }

    out.push_str("\nLegend (* = critical station):\n");
    for label in report.scale.labels() {
        out.push_str(&format!("  {:<6}{}\n", short_label(label), level_description(label)));
    }
    if !report.footer.legend_note.is_empty() {
        out.push_str(&format!("  {}\n", report.footer.legend_note));
    }
    if !report.footer.guidelines.is_empty() {
        out.push_str(&format!("\nGuidelines:\n{}\n", report.footer.guidelines));
    }
    out
}

#[cfg(feature = "xlsx")]
pub use workbook::to_xlsx;

#[cfg(feature = "xlsx")]
mod workbook {
    use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

    use super::*;

    const STATION_WIDTH: f64 = 11.0;
    const FIXED_WIDTHS: [f64; 7] = [6.0, 24.0, 16.0, 7.0, 8.0, 12.0, 16.0];

    struct Formats {
        title: Format,
        meta: Format,
        header: Format,
        section: Format,
        text: Format,
        centered: Format,
        critical: Format,
        wrapped: Format,
        signature: Format,
    }

    impl Formats {
        fn new() -> Self {
            let text = Format::new().set_border(FormatBorder::Thin);
            Self {
                title: Format::new()
                    .set_bold()
                    .set_font_size(16)
                    .set_align(FormatAlign::Center)
                    .set_align(FormatAlign::VerticalCenter)
                    .set_border(FormatBorder::Medium),
                meta: Format::new().set_bold().set_border(FormatBorder::Thin),
                header: Format::new()
                    .set_bold()
                    .set_text_wrap()
                    .set_align(FormatAlign::Center)
                    .set_align(FormatAlign::VerticalCenter)
                    .set_background_color(0xD9E1F2)
                    .set_border(FormatBorder::Thin),
                section: Format::new()
                    .set_bold()
                    .set_background_color(0xF2F2F2)
                    .set_border(FormatBorder::Thin),
                centered: text.clone().set_align(FormatAlign::Center),
                critical: Format::new()
                    .set_bold()
                    .set_align(FormatAlign::Center)
                    .set_background_color(0xFFC7CE)
                    .set_border(FormatBorder::Thin),
                wrapped: text
                    .clone()
                    .set_text_wrap()
                    .set_align(FormatAlign::Top),
                signature: Format::new()
                    .set_bold()
                    .set_align(FormatAlign::Center)
                    .set_border(FormatBorder::Thin),
                text,
            }
        }
    }

    // rust_xlsxwriter refuses single-cell merges.
    fn merge(
        sheet: &mut Worksheet,
        row: u32,
        first: u16,
        last: u16,
        text: &str,
        format: &Format,
    ) -> Result<(), XlsxError> {
        if first == last {
            sheet.write_string_with_format(row, first, text, format)?;
        } else {
            sheet.merge_range(row, first, row, last, text, format)?;
        }
        Ok(())
    }

    /// Render the skill matrix form as an XLSX workbook
    ///
    /// The layout is fixed: title and header block, the matrix table, the
    /// level legend, guidelines, the revision history and the signature
    /// block. Critical cells are shaded.
    ///
    /// # Arguments
    /// * `report` - Rows, stations and form metadata to render
    ///
    /// # Returns
    /// * `MatrixResult<Vec<u8>>` - Workbook bytes, or `NothingToExport` for an empty grid
    pub fn to_xlsx(report: &ReportInput<'_>) -> MatrixResult<Vec<u8>> {
        if report.rows.is_empty() {
            return Err(MatrixError::NothingToExport);
        }

        let mut workbook = Workbook::new();
        let mut worksheet = Worksheet::new();
        worksheet.set_name("Skill Matrix")?;
        worksheet.set_landscape();

        write_form(&mut worksheet, report, &Formats::new())?;

        workbook.push_worksheet(worksheet);
        let buffer = workbook.save_to_buffer()?;
        log::info!(
            "exported {} rows over {} stations ({} bytes)",
            report.rows.len(),
            report.stations.len(),
            buffer.len()
        );
        Ok(buffer)
    }

    fn write_form(
        sheet: &mut Worksheet,
        report: &ReportInput<'_>,
        f: &Formats,
    ) -> Result<(), XlsxError> {
        let fixed = FIXED_HEADERS.len() as u16;
        let last_col = fixed + report.stations.len() as u16 - 1;

        for (col, width) in FIXED_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }
        for i in 0..report.stations.len() as u16 {
            sheet.set_column_width(fixed + i, STATION_WIDTH)?;
        }

        // Title and header block
        sheet.set_row_height(0, 28)?;
        merge(sheet, 0, 0, last_col, "SKILL MATRIX", &f.title)?;
        let left = [
            format!("Department: {}", report.department),
            format!("Line: {}", report.line),
            format!("Total Operators: {}", report.rows.len()),
            format!("Stations: {}", report.stations.len()),
        ];
        let right = [
            format!("Form No: {}", report.header.form_no),
            format!("Revision No: {}", report.header.revision_no),
            format!("Revision Date: {}", report.header.revision_date),
            format!("Page: {}", report.header.page_no),
        ];
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let row = 1 + i as u32;
            merge(sheet, row, 0, 2, l, &f.meta)?;
            merge(sheet, row, 3, last_col, r, &f.meta)?;
        }

        // Matrix table
        let header_row = 6;
        sheet.set_row_height(header_row, 30)?;
        for (col, title) in FIXED_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(header_row, col as u16, *title, &f.header)?;
        }
        for (i, station) in report.stations.iter().enumerate() {
            sheet.write_string_with_format(header_row, fixed + i as u16, &station.name, &f.header)?;
        }

        let mut row = header_row + 1;
        for entry in report.rows {
            let values = fixed_values(entry, report.stations);
            sheet.write_number_with_format(row, 0, entry.ordinal as f64, &f.centered)?;
            for (col, value) in values.iter().enumerate().skip(1) {
                sheet.write_string_with_format(row, col as u16, value, &f.text)?;
            }
            for (i, cell) in entry.cells.iter().enumerate() {
                let format = match cell.criticality {
                    Criticality::Critical => &f.critical,
                    Criticality::NonCritical => &f.centered,
                };
                sheet.write_string_with_format(
                    row,
                    fixed + i as u16,
                    &short_label(&cell.level),
                    format,
                )?;
            }
            row += 1;
        }

        // Legend
        row += 1;
        merge(sheet, row, 0, last_col, "LEGEND", &f.section)?;
        row += 1;
        for label in report.scale.labels() {
            sheet.write_string_with_format(row, 0, &short_label(label), &f.centered)?;
            merge(sheet, row, 1, last_col, level_description(label), &f.text)?;
            row += 1;
        }
        merge(sheet, row, 0, last_col, "Shaded cells mark critical stations.", &f.text)?;
        row += 1;
        if !report.footer.legend_note.is_empty() {
            merge(sheet, row, 0, last_col, &report.footer.legend_note, &f.text)?;
            row += 1;
        }

        // Guidelines
        row += 1;
        merge(sheet, row, 0, last_col, "GUIDELINES", &f.section)?;
        row += 1;
        let lines = report.footer.guidelines.lines().count().max(1);
        sheet.set_row_height(row, 15 * lines as u32)?;
        merge(sheet, row, 0, last_col, &report.footer.guidelines, &f.wrapped)?;
        row += 1;

        // Revision history
        row += 1;
        merge(sheet, row, 0, last_col, "REVISION HISTORY", &f.section)?;
        row += 1;
        sheet.write_string_with_format(row, 0, "Rev No", &f.header)?;
        sheet.write_string_with_format(row, 1, "Date", &f.header)?;
        merge(sheet, row, 2, 5, "Description", &f.header)?;
        merge(sheet, row, 6, last_col, "Approved By", &f.header)?;
        row += 1;
        for record in &report.footer.revisions {
            sheet.write_string_with_format(row, 0, &record.revision_no, &f.centered)?;
            sheet.write_string_with_format(row, 1, &record.date, &f.centered)?;
            merge(sheet, row, 2, 5, &record.description, &f.text)?;
            merge(sheet, row, 6, last_col, &record.approved_by, &f.text)?;
            row += 1;
        }

        // Signatures
        row += 2;
        let span = (last_col + 1) / 3;
        for (i, title) in SIGNATURES.iter().enumerate() {
            let first = span * i as u16;
            let last = if i == SIGNATURES.len() - 1 {
                last_col
            } else {
                first + span - 1
            };
            sheet.set_row_height(row, 36)?;
            merge(sheet, row, first, last, "", &f.text)?;
            merge(sheet, row + 1, first, last, title, &f.signature)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, RowIdentity, SkillCell};

    fn row(ordinal: usize, name: &str) -> MatrixRow {
        MatrixRow {
            ordinal,
            identity: RowIdentity::RosterBacked {
                person_id: format!("p{}", ordinal),
            },
            name: name.to_string(),
            unit: "Assembly".to_string(),
            role: Some(Role::Emp),
            classification: String::new(),
            joined: "01-02-2024".to_string(),
            assigned_station: Some("a".to_string()),
            cells: vec![SkillCell {
                station_id: "a".to_string(),
                station_name: "Press".to_string(),
                criticality: Criticality::Critical,
                min_level: "L-1".to_string(),
                level: "L3".to_string(),
            }],
        }
    }

    fn report<'a>(
        rows: &'a [MatrixRow],
        stations: &'a [Station],
        scale: &'a LevelScale,
        header: &'a HeaderMeta,
        footer: &'a FooterMeta,
    ) -> ReportInput<'a> {
        ReportInput {
            department: "Assembly",
            line: "Line 1",
            rows,
            stations,
            scale,
            header,
            footer,
        }
    }

    #[test]
    fn filenames() {
        assert_eq!(export_filename("Paint", "L2"), "SkillMatrix_Paint_L2.xlsx");
        assert_eq!(export_filename("A/B", "x y"), "SkillMatrix_A_B_x_y.xlsx");
    }

    #[test]
    fn csv_quotes_and_labels() {
        let rows = vec![row(1, "Rao, K")];
        let stations = vec![Station::new("a", "Press")];
        let (scale, header, footer) = (
            LevelScale::default(),
            HeaderMeta::default(),
            FooterMeta::default(),
        );
        let csv = to_csv(&report(&rows, &stations, &scale, &header, &footer)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "S.No,Name,Unit,Role,Code,Joined,Assigned Station,Press"
        );
        assert_eq!(lines[1], "1,\"Rao, K\",Assembly,EMP,,01-02-2024,Press,L-3");
    }

    #[test]
    fn empty_grid_is_not_exported() {
        let stations = vec![Station::new("a", "Press")];
        let (scale, header, footer) = (
            LevelScale::default(),
            HeaderMeta::default(),
            FooterMeta::default(),
        );
        let input = report(&[], &stations, &scale, &header, &footer);
        assert!(matches!(to_csv(&input), Err(MatrixError::NothingToExport)));
        #[cfg(feature = "xlsx")]
        assert!(matches!(to_xlsx(&input), Err(MatrixError::NothingToExport)));
    }

    #[test]
    fn text_marks_critical_cells() {
        let rows = vec![row(1, "Asha")];
        let stations = vec![Station::new("a", "Press")];
        let (scale, header, footer) = (
            LevelScale::default(),
            HeaderMeta::default(),
            FooterMeta::default(),
        );
        let text = to_text(&report(&rows, &stations, &scale, &header, &footer));
        assert!(text.contains("L-3*"));
        assert!(text.contains("Department: Assembly"));
        assert!(text.contains("Under training"));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn workbook_is_a_zip_archive() {
        let rows = vec![row(1, "Asha"), row(2, "Ravi")];
        let stations = vec![Station::new("a", "Press")];
        let scale = LevelScale::default();
        let header = HeaderMeta::default();
        let mut footer = FooterMeta::default();
        footer.revisions.push(crate::model::RevisionRecord {
            revision_no: "01".to_string(),
            date: "01-01-2025".to_string(),
            description: "First issue".to_string(),
            approved_by: "QA".to_string(),
        });

        let bytes = to_xlsx(&report(&rows, &stations, &scale, &header, &footer)).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn workbook_without_stations() {
        let mut only = row(1, "Asha");
        only.cells.clear();
        only.assigned_station = None;
        let rows = vec![only];
        let scale = LevelScale::default();
        let header = HeaderMeta::default();
        let footer = FooterMeta::default();
        let bytes = to_xlsx(&report(&rows, &[], &scale, &header, &footer)).unwrap();
        assert!(!bytes.is_empty());
    }
}

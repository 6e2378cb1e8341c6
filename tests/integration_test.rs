//! Integration tests for the ISEF Scout pipeline
//! Tests page parsing, categorization and student extraction using fixture files

use isef_scout::categorize::categorize_projects;
use isef_scout::email::{extract_university_from_awards, generate_email_guesses};
use isef_scout::parse::{parse_finalist_name, parse_project};
use isef_scout::students::{annotate_majors, parse_people_grid, students_from_html, students_from_tables};
use isef_scout::table::{format_winners, render_table};
use isef_scout::winners::parse_student_name;
use isef_scout::{WinnerRecord, WinnersFile};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture {:?}", path))
}

/// Write a minimal .docx whose body is `body_xml`
fn write_docx(path: &Path, body_xml: &str) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body_xml
    );
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
}

fn table_row(cells: &[&str]) -> String {
    let cells: String = cells
        .iter()
        .map(|c| format!("<w:tc>{}</w:tc>", paragraph(c)))
        .collect();
    format!("<w:tr>{}</w:tr>", cells)
}

fn escape(html: &str) -> String {
    html.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[test]
fn test_project_page_fixture() {
    let html = fixture("project_page.html");
    let project = parse_project(&html, 12345).expect("fixture is a project page");

    assert_eq!(project.id, 12345);
    assert_eq!(
        project.title.as_deref(),
        Some("Catalytic Conversion of Plastic Waste into Hydrogen Fuel")
    );
    assert_eq!(project.category.as_deref(), Some("Chemistry"));
    assert_eq!(project.year.as_deref(), Some("2022"));
    assert_eq!(project.booth.as_deref(), Some("CHEM042"));
    assert_eq!(project.country.as_deref(), Some("United States of America"));
    assert!(project.abstract_text.as_deref().unwrap_or("").starts_with("Plastic waste accumulates"));
    assert_eq!(
        project.awards,
        vec![
            "Second Award of $2,000".to_string(),
            "Tuition scholarship to Drexel University".to_string(),
        ]
    );

    assert_eq!(parse_finalist_name(&html).as_deref(), Some("Doe, Jane Marie"));
}

#[test]
fn test_not_found_fixture() {
    assert!(parse_project(&fixture("not_found_page.html"), 1).is_none());
}

#[test]
fn test_parsed_project_flows_into_categories_and_guesses() {
    let html = fixture("project_page.html");
    let mut projects = vec![parse_project(&html, 1).unwrap()];

    let stats = categorize_projects(&mut projects);
    assert_eq!(stats.total, 1);
    assert_eq!(projects[0].primary_category.as_deref(), Some("Chemistry"));
    assert_eq!(projects[0].categories.first().map(String::as_str), Some("Chemistry"));

    let university = extract_university_from_awards(&projects[0].awards).unwrap();
    assert_eq!(university, "Drexel University");

    let name = parse_finalist_name(&html).unwrap();
    let (first, last) = parse_student_name(&name).unwrap();
    assert_eq!(
        generate_email_guesses(&first, &last, &university),
        vec!["jane.doe@drexel.edu".to_string(), "janedoe@drexel.edu".to_string()]
    );
}

#[test]
fn test_people_grid_fixture() {
    let mut students = parse_people_grid(&fixture("people_grid.html"), "2028.docx");
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].last, "Turing");
    assert_eq!(students[0].year, "2028");
    assert_eq!(students[1].email, "grace.hopper@yale.edu");

    let distribution = annotate_majors(&mut students);
    assert_eq!(students[0].major, "Mathematics");
    assert_eq!(students[1].major, "Computer Science");
    assert_eq!(distribution.len(), 2);
}

#[test]
fn test_students_from_docx_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("2026.docx");
    let body = format!(
        "{}<w:tbl>{}{}{}</w:tbl>",
        paragraph("Roster"),
        table_row(&["Uni", "Year", "First", "Last", "Major", "Notes"]),
        table_row(&["MIT", "", "Ada", "Lovelace", "Mathematics", "ISEF 2021"]),
        table_row(&["", "", "", "", "", ""]),
    );
    write_docx(&path, &body);

    let students = students_from_tables(&[path, dir.path().join("missing.docx")]);
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].uni, "MIT");
    assert_eq!(students[0].year, "2026");
    assert_eq!(students[0].notes, "ISEF 2021");
    assert_eq!(students[0].source_file, "2026.docx");
}

#[test]
fn test_students_from_docx_html_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("yale.docx");

    let body: String = fixture("people_grid.html")
        .lines()
        .map(|line| paragraph(&escape(line.trim())))
        .collect();
    write_docx(&path, &body);

    let students = students_from_html(&[path]);
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].last, "Hopper");
    assert_eq!(students[0].year, "2027");
    assert_eq!(students[1].last, "Turing");
    assert_eq!(students[1].source_file, "yale.docx");
}

#[test]
fn test_winners_table() {
    let mut winners = WinnersFile::new();
    winners.insert(
        "12345".to_string(),
        WinnerRecord {
            student_name: "Doe, Jane Marie".to_string(),
            year: Some("2022".to_string()),
            category: Some("Chemistry".to_string()),
            awards: vec!["Tuition scholarship to Drexel University".to_string()],
            emails: vec!["jane.doe@drexel.edu".to_string()],
            ..Default::default()
        },
    );

    let table = render_table(&format_winners(&winners));
    assert!(table.contains(
        "Tuition scholarship to Drexel University\t2022\tJane Marie\tDoe\tChemistry\tjane.doe@drexel.edu\t"
    ));
    assert!(table.contains("With emails: 1"));
}

//! Student directory extraction from Word exports
//!
//! A `.docx` is a zip archive; only `word/document.xml` is read. Two export
//! shapes exist: real Word tables (one student per row) and directory pages
//! whose HTML was pasted in as plain paragraphs.

use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::parse::stripped_text;
use crate::types::Student;

/// Files read when none are given on the command line
pub const DEFAULT_DOCX_FILES: &[&str] = &["grad.docx", "2026.docx", "2027.docx", "2028.docx", "2029.docx"];

const DIRECTORY_UNIVERSITY: &str = "Yale";

const ACADEMIC_KEYWORDS: &[&str] = &[
    "Engineering", "Science", "Studies", "Arts", "Economics", "Biology",
    "Chemistry", "Physics", "Mathematics", "Computer", "History",
    "Literature", "Philosophy", "Psychology", "Sociology", "Political",
    "Affairs", "Business", "Law", "Medicine", "Architecture", "Music",
    "Theater", "Film", "Statistics", "Anthropology", "Linguistics",
    "Neuroscience", "Molecular", "Environmental", "Biomedical",
    "Electrical", "Mechanical", "Chemical", "Civil", "Aerospace",
];

/// Note fragments that are never a major
const NOT_A_MAJOR: &[&str] = &[
    "Residential College:", "NetID", "UPI", "/",
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

static FOUR_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})").expect("valid year regex"));

/// "CT" or "CT 06511"
static STATE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}( \d{5})?$").expect("valid state code regex"));

/// Text content of a Word document body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxContent {
    /// Top-level tables as rows of cell texts
    pub tables: Vec<Vec<Vec<String>>>,
    /// Non-blank top-level paragraphs, trimmed
    pub paragraphs: Vec<String>,
}

pub fn read_docx(path: &Path) -> Result<DocxContent> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{:?} is not a docx archive", path))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .with_context(|| format!("{:?} has no word/document.xml", path))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .with_context(|| format!("Failed to read document body of {:?}", path))?;

    parse_document_xml(&xml)
}

/// Parse WordprocessingML into tables and paragraphs
///
/// A cell's text is its paragraphs joined by newlines. Tables nested inside
/// a cell are skipped.
pub fn parse_document_xml(xml: &str) -> Result<DocxContent> {
    let mut reader = Reader::from_str(xml);
    let mut content = DocxContent::default();

    let mut table_depth = 0usize;
    let mut table: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table.clear();
                    }
                }
                b"tr" if table_depth == 1 => row.clear(),
                b"tc" if table_depth == 1 => cell.clear(),
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|e| anyhow!("Bad text in document.xml: {}", e))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => match table_depth {
                    0 => {
                        let text = paragraph.trim();
                        if !text.is_empty() {
                            content.paragraphs.push(text.to_string());
                        }
                    }
                    1 => cell.push(std::mem::take(&mut paragraph)),
                    _ => {}
                },
                b"tc" if table_depth == 1 => row.push(cell.join("\n").trim().to_string()),
                b"tr" if table_depth == 1 => table.push(std::mem::take(&mut row)),
                b"tbl" => {
                    if table_depth == 1 {
                        content.tables.push(std::mem::take(&mut table));
                    }
                    table_depth = table_depth.saturating_sub(1);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parse error at {}: {}", reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(content)
}

/// Row of at least four cells: uni, year, first, last, then optional major and notes
pub fn parse_student_record(row: &[String]) -> Option<Student> {
    if row.len() < 4 {
        return None;
    }

    let cell = |i: usize| row.get(i).map(|c| c.trim().to_string()).unwrap_or_default();

    Some(Student {
        uni: cell(0),
        year: cell(1),
        first: cell(2),
        last: cell(3),
        major: cell(4),
        notes: cell(5),
        ..Default::default()
    })
}

/// First run of four digits in a file name, e.g. `2026.docx` -> `2026`
pub fn extract_year_from_filename(name: &str) -> String {
    FOUR_DIGITS_RE
        .find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Students from the tables of each file. Unreadable files are reported and skipped.
pub fn students_from_tables(files: &[PathBuf]) -> Vec<Student> {
    let mut students = Vec::new();

    for path in files {
        let content = match read_docx(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error processing {:?}: {:#}", path, e);
                continue;
            }
        };

        let source_file = file_label(path);
        let file_year = extract_year_from_filename(&source_file);
        info!("{}: {} table(s), {} paragraph(s)", source_file, content.tables.len(), content.paragraphs.len());

        students.extend(students_in_tables(&content.tables, &source_file, &file_year));
    }

    students
}

/// Every non-blank data row (the first row of each table is its header)
fn students_in_tables(tables: &[Vec<Vec<String>>], source_file: &str, file_year: &str) -> Vec<Student> {
    tables
        .iter()
        .filter(|table| table.len() >= 2)
        .flat_map(|table| table.iter().skip(1))
        .filter(|row| row.len() >= 2 && row.iter().any(|cell| !cell.trim().is_empty()))
        .filter_map(|row| parse_student_record(row))
        .map(|mut student| {
            if student.year.is_empty() {
                student.year = file_year.to_string();
            }
            student.source_file = source_file.to_string();
            student
        })
        .collect()
}

/// Students from directory cards pasted into each file, sorted by year then last name
pub fn students_from_html(files: &[PathBuf]) -> Vec<Student> {
    let mut students = Vec::new();

    for path in files {
        let content = match read_docx(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error processing {:?}: {:#}", path, e);
                continue;
            }
        };

        let source_file = file_label(path);
        let found = parse_people_grid(&content.paragraphs.join(" "), &source_file);
        info!("{}: parsed {} student(s)", source_file, found.len());
        students.extend(found);
    }

    students.sort_by(|a, b| (&a.year, &a.last).cmp(&(&b.year, &b.last)));
    students
}

/// Cards of a people-grid page; cards without a last name or email are dropped
pub fn parse_people_grid(html: &str, source_file: &str) -> Vec<Student> {
    let document = Html::parse_document(html);
    let Ok(cards) = Selector::parse("div.peoplegrid_person__AF9Sl") else {
        return vec![];
    };

    document
        .select(&cards)
        .map(|card| parse_person_card(&card))
        .filter(|s| !s.last.is_empty() && !s.email.is_empty())
        .map(|mut s| {
            s.source_file = source_file.to_string();
            s
        })
        .collect()
}

fn first_text(card: &ElementRef, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    card.select(&sel).next().map(|el| stripped_text(&el))
}

fn parse_person_card(card: &ElementRef) -> Student {
    let mut student = Student { uni: DIRECTORY_UNIVERSITY.to_string(), ..Default::default() };

    if let Some(name) = first_text(card, "h3.peoplegrid_name__h8uVB") {
        match name.split_once(',') {
            Some((last, first)) => {
                student.last = last.trim().to_string();
                student.first = first.trim().to_string();
            }
            None => student.last = name,
        }
    }

    if let Some(email) = first_text(card, r#"a[href^="mailto:"]"#) {
        student.email = email;
    }

    if let Some(year) = first_text(card, r#"div[title="Graduation Year"] span"#) {
        student.year = year;
    }

    let mut notes = Vec::new();
    if let Some(college) = first_text(card, r#"div[title="Residential College"] span"#) {
        notes.push(format!("Residential College: {}", college));
    }

    if let Ok(chips) = Selector::parse("button.chip_chip__dJvnn") {
        notes.extend(
            card.select(&chips)
                .map(|chip| stripped_text(&chip))
                .filter(|text| !text.is_empty()),
        );
    }

    student.notes = notes.join(" | ");
    student
}

/// First `|`-separated note fragment that reads like a field of study
pub fn extract_major_from_notes(notes: &str) -> String {
    notes
        .split('|')
        .map(str::trim)
        .filter(|part| !NOT_A_MAJOR.iter().any(|skip| part.contains(skip)))
        .filter(|part| !STATE_CODE_RE.is_match(part))
        .filter(|part| !part.contains(','))
        .find(|part| ACADEMIC_KEYWORDS.iter().any(|kw| part.contains(kw)))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Set every student's major from their notes
///
/// Returns the major distribution, most common first; students without a
/// major count as "Undeclared".
pub fn annotate_majors(students: &mut [Student]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for student in students.iter_mut() {
        student.major = extract_major_from_notes(&student.notes);
        let key = if student.major.is_empty() { "Undeclared" } else { student.major.as_str() };
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts.into_iter().collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    distribution
}

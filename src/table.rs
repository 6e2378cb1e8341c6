//! Tab-separated winners table for pasting into a spreadsheet

use regex::Regex;
use std::sync::LazyLock;

use crate::types::WinnersFile;

const UNIVERSITY_PATTERNS: &[&str] = &[
    r"(?i)([\w\s]+University(?: of [\w\s]+)?)",
    r"(?i)([\w\s]+Institute(?: of [\w\s]+)?)",
    r"(?i)([\w\s]+College)",
    r"(?i)(MIT|Stanford|Harvard|Yale|Princeton|Cornell|Columbia|Penn State|UC Berkeley|UCLA|USC|Caltech|Carnegie Mellon)",
];

static UNIVERSITY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    UNIVERSITY_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid institution regex"))
        .collect()
});

/// Notes longer than this are cut and end in "..."
const NOTES_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub uni: String,
    pub year: String,
    pub first: String,
    pub last: String,
    pub major: String,
    pub email: String,
    pub notes: String,
}

/// `"Last, First"` into (last, first); without a comma the whole name is the first name
pub fn parse_name(name: &str) -> (String, String) {
    match name.split_once(',') {
        Some((last, first)) => (last.trim().to_string(), first.trim().to_string()),
        None => (String::new(), name.to_string()),
    }
}

/// First institution named in any award, without a leading "The " or "A "
pub fn extract_university(awards: &[String]) -> String {
    for award in awards {
        for re in UNIVERSITY_RES.iter() {
            if let Some(m) = re.captures(award).and_then(|caps| caps.get(1)) {
                let uni = m.as_str().trim();
                let uni = uni
                    .strip_prefix("The ")
                    .or_else(|| uni.strip_prefix("A "))
                    .unwrap_or(uni);
                return uni.to_string();
            }
        }
    }

    String::new()
}

pub fn format_winners(winners: &WinnersFile) -> Vec<TableRow> {
    winners
        .values()
        .map(|winner| {
            let (last, first) = parse_name(&winner.student_name);
            TableRow {
                uni: extract_university(&winner.awards),
                year: winner.year.clone().unwrap_or_default(),
                first,
                last,
                major: winner.category.clone().unwrap_or_default(),
                email: winner.emails.first().cloned().unwrap_or_default(),
                notes: winner.awards.join("; "),
            }
        })
        .collect()
}

pub fn render_table(rows: &[TableRow]) -> String {
    let rule = "-".repeat(120);
    let mut out = String::new();

    out.push_str("Uni\tYear\tFirst\tLast\tMajor\tEmail\tNotes\n");
    out.push_str(&format!("{}\n", rule));

    for row in rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            row.uni,
            row.year,
            row.first,
            row.last,
            row.major,
            row.email,
            truncate_notes(&row.notes)
        ));
    }

    out.push_str(&format!("{}\n\n", rule));
    out.push_str(&format!("Total winners: {}\n", rows.len()));
    out.push_str(&format!(
        "With emails: {}\n",
        rows.iter().filter(|r| !r.email.is_empty()).count()
    ));
    out
}

fn truncate_notes(notes: &str) -> String {
    if notes.chars().count() > NOTES_MAX_CHARS {
        format!("{}...", notes.chars().take(NOTES_MAX_CHARS).collect::<String>())
    } else {
        notes.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WinnerRecord;

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_name("Doe, Jane"), ("Doe".to_string(), "Jane".to_string()));
        assert_eq!(parse_name("Jane Doe"), (String::new(), "Jane Doe".to_string()));
        assert_eq!(parse_name(""), (String::new(), String::new()));
    }

    #[test]
    fn test_extract_university() {
        let awards = vec![
            "First Award of $5,000".to_string(),
            "Scholarship to the University of Arizona".to_string(),
        ];
        assert_eq!(extract_university(&awards), "Scholarship to the University of Arizona");

        let awards = vec!["The Drexel University Award".to_string()];
        assert_eq!(extract_university(&awards), "Drexel University");

        let awards = vec!["Internship at MIT".to_string()];
        assert_eq!(extract_university(&awards), "MIT");

        assert_eq!(extract_university(&[]), "");
    }

    #[test]
    fn test_format_and_render() {
        let mut winners = WinnersFile::new();
        winners.insert(
            "1".to_string(),
            WinnerRecord {
                student_name: "Doe, Jane".to_string(),
                year: Some("2021".to_string()),
                category: Some("Chemistry".to_string()),
                emails: vec!["jane@mit.edu".to_string(), "jd@mit.edu".to_string()],
                awards: vec!["x".repeat(150)],
                ..Default::default()
            },
        );
        winners.insert(
            "2".to_string(),
            WinnerRecord { student_name: "Solo".to_string(), ..Default::default() },
        );

        let rows = format_winners(&winners);
        assert_eq!(rows[0].email, "jane@mit.edu");
        assert_eq!(rows[0].last, "Doe");
        assert_eq!(rows[1].first, "Solo");

        let table = render_table(&rows);
        let expected_notes = format!("{}...", "x".repeat(100));
        assert!(table.starts_with("Uni\tYear\tFirst\tLast\tMajor\tEmail\tNotes\n"));
        assert!(table.contains(&format!("\t2021\tJane\tDoe\tChemistry\tjane@mit.edu\t{}\n", expected_notes)));
        assert!(table.contains("Total winners: 2\n"));
        assert!(table.contains("With emails: 1\n"));
    }
}

//! Email address extraction and guessing

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static UNIVERSITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]+ )*University( of [A-Z][a-z]+)?").expect("valid university regex")
});

/// Domains that only ever show up as page chrome on search results
const JUNK_DOMAINS: &[&str] = &[
    "example.com", "test.com", "google.com", "facebook.com",
    "twitter.com", "instagram.com", "youtube.com",
];

/// Fragments marking role or placeholder addresses
const JUNK_MARKERS: &[&str] = &[
    "example.com", "domain.com", "email.com", "test.com",
    "noreply", "no-reply", "support", "info", "contact",
    "facebook.com", "twitter.com", "instagram.com",
];

/// Known student address templates, checked in this order
pub const UNIVERSITY_EMAIL_FORMATS: &[(&str, &[&str])] = &[
    ("Arizona State University", &["{first}.{last}@asu.edu", "{first}{last}@asu.edu"]),
    ("University of Arizona", &["{first}{last}@arizona.edu", "{first}.{last}@email.arizona.edu", "{first}.{last}@arizona.edu"]),
    ("Drexel University", &["{first}.{last}@drexel.edu", "{first}{last}@drexel.edu"]),
    ("MIT", &["{first}{last}@mit.edu", "{first}@mit.edu"]),
    ("Stanford", &["{first}{last}@stanford.edu", "{first}@stanford.edu"]),
    ("Harvard", &["{first}{last}@college.harvard.edu", "{first}_{last}@college.harvard.edu"]),
    ("Yale", &["{first}.{last}@yale.edu", "{first}{last}@yale.edu"]),
    ("Princeton", &["{first}{last}@princeton.edu", "{first}@princeton.edu"]),
    ("Caltech", &["{first}{last}@caltech.edu", "{first}@caltech.edu"]),
    ("UC Berkeley", &["{first}{last}@berkeley.edu", "{first}_{last}@berkeley.edu", "{first}.{last}@berkeley.edu"]),
    ("UCLA", &["{first}{last}@ucla.edu", "{first}@ucla.edu"]),
    ("USC", &["{first}{last}@usc.edu", "{first}@usc.edu"]),
    ("Cornell", &["{first}{last}@cornell.edu", "{first}@cornell.edu"]),
    ("Carnegie Mellon", &["{first}{last}@cmu.edu", "{first}@andrew.cmu.edu"]),
    ("University of Michigan", &["{first}{last}@umich.edu", "{first}@umich.edu"]),
    ("Georgia Tech", &["{first}{last}@gatech.edu", "{first}@gatech.edu"]),
    ("Northwestern", &["{first}{last}@northwestern.edu", "{first}.{last}@northwestern.edu"]),
    ("Duke", &["{first}{last}@duke.edu", "{first}.{last}@duke.edu"]),
    ("Columbia", &["{first}{last}@columbia.edu", "{first}@columbia.edu"]),
    ("Penn State", &["{first}{last}@psu.edu", "{first}@psu.edu"]),
    ("University of Texas", &["{first}{last}@utexas.edu", "{first}.{last}@utexas.edu"]),
    ("University of Washington", &["{first}{last}@uw.edu", "{first}@uw.edu"]),
];

/// Every distinct address in `text`, sorted
pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Drop addresses whose domain belongs to a search engine or social network
pub fn filter_junk_domains(emails: impl IntoIterator<Item = String>) -> Vec<String> {
    emails
        .into_iter()
        .filter(|email| {
            let lower = email.to_lowercase();
            let domain = lower.split_once('@').map(|(_, d)| d).unwrap_or("");
            !JUNK_DOMAINS.iter().any(|junk| domain.contains(junk))
        })
        .collect()
}

/// Drop placeholder and role addresses (`info@`, `noreply@`, ...)
pub fn filter_junk_addresses(emails: impl IntoIterator<Item = String>) -> Vec<String> {
    emails
        .into_iter()
        .filter(|email| {
            let lower = email.to_lowercase();
            !JUNK_MARKERS.iter().any(|junk| lower.contains(junk))
        })
        .collect()
}

pub fn is_known_university(name: &str) -> bool {
    UNIVERSITY_EMAIL_FORMATS.iter().any(|(uni, _)| *uni == name)
}

/// Guess the university a scholarship or tuition award points to
pub fn extract_university_from_awards(awards: &[String]) -> Option<String> {
    for award in awards {
        let lower = award.to_lowercase();
        if !lower.contains("scholarship") && !lower.contains("tuition") {
            continue;
        }

        if let Some((name, _)) = UNIVERSITY_EMAIL_FORMATS
            .iter()
            .find(|(name, _)| lower.contains(&name.to_lowercase()))
        {
            return Some(name.to_string());
        }

        if lower.contains("university") {
            if let Some(m) = UNIVERSITY_RE.find(award) {
                return Some(m.as_str().to_string());
            }
        }
    }

    None
}

/// Candidate addresses from the university's known templates
pub fn generate_email_guesses(first_name: &str, last_name: &str, university: &str) -> Vec<String> {
    let Some((_, formats)) = UNIVERSITY_EMAIL_FORMATS.iter().find(|(uni, _)| *uni == university) else {
        return vec![];
    };

    let first = squash_name(first_name);
    let last = squash_name(last_name);

    formats
        .iter()
        .map(|fmt| fmt.replace("{first}", &first).replace("{last}", &last))
        .collect()
}

fn squash_name(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "")
}

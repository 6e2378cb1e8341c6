//! Regex parsing of LinkedIn search result snippets
//!
//! Nothing here touches the network; `search` feeds these functions the raw
//! result pages.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

const ELITE_SCHOOLS: &str = "MIT|Stanford|Harvard|Yale|Princeton|Caltech|Cornell|Columbia|Duke";

/// Majors in the order they are tried
const MAJOR_PATTERNS: &[&str] = &[
    r"(?i)studying ([\w\s]+) at",
    r"(?i)(Computer Science|Engineering|Biology|Chemistry|Physics|Mathematics|Biomedical Engineering|Mechanical Engineering|Electrical Engineering|Chemical Engineering) student",
    r"(?i)majoring in ([\w\s&]+)",
    r"(?i)(\w+ Engineering) major",
];

/// At most this many profile links are kept per search
pub const MAX_PROFILES: usize = 3;

static PROFILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https://[a-z]+\.linkedin\.com/in/[^&]+)").expect("valid profile url regex")
});

static CLASS_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(202[5-9])").expect("valid class year regex"));

static MAJOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_all(MAJOR_PATTERNS.iter().copied()));

static SNIPPET_UNIVERSITY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let elite = format!(r"(?i)at ({})", ELITE_SCHOOLS);
    compile_all([
        elite.as_str(),
        r"(?i)at ([\w\s]+ University)",
        r"(?i)University of ([\w\s]+)",
    ])
});

static PROFILE_UNIVERSITY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let elite = format!(r"(?i)({})", ELITE_SCHOOLS);
    compile_all([
        r"(?i)([\w\s]+ University)",
        elite.as_str(),
        r"(?i)University of ([\w\s]+)",
    ])
});

fn compile_all<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Vec<Regex> {
    patterns
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("valid snippet regex"))
        .collect()
}

/// Canonical profile url inside a (possibly redirect-wrapped) result link
pub fn profile_url(href: &str) -> Option<String> {
    PROFILE_URL_RE
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Result links pointing at LinkedIn profiles, in page order
pub fn profile_links(html: &str) -> Vec<String> {
    let mut links = linkedin_hrefs(html);
    links.truncate(MAX_PROFILES);
    links
}

/// Every link on the page that mentions a LinkedIn profile path
pub fn linkedin_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return vec![];
    };

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("linkedin.com/in/"))
        .map(str::to_string)
        .collect()
}

/// Class-of year written as `'27`-style two digit suffix of 2025..2029
pub fn graduation_year(text: &str) -> Option<String> {
    CLASS_YEAR_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn major(text: &str) -> Option<String> {
    MAJOR_RES.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

/// University from phrasing like "student at Duke" in a raw snippet
pub fn university_from_snippet(text: &str) -> Option<String> {
    SNIPPET_UNIVERSITY_RES
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().replacen("at ", "", 1).trim().to_string())
}

/// University named anywhere in the visible text of a result page
pub fn university_from_profile_text(text: &str) -> Option<String> {
    PROFILE_UNIVERSITY_RES
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().trim().to_string())
}

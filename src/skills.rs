//! Skill tags derived from a project's title and abstract

use std::collections::BTreeSet;

/// Tags attached to a winner record
pub const MAX_SKILLS: usize = 5;

const SKILL_GROUPS: &[(&str, &[&str])] = &[
    ("Machine Learning", &["machine learning", "ml", "neural network", "deep learning"]),
    ("Data Analysis", &["data analysis", "statistics", "data science", "analytics"]),
    ("Programming", &["programming", "coding", "python", "java", "c++"]),
    ("AI", &["artificial intelligence", "ai", "computer vision", "nlp"]),
    ("Robotics", &["robotics", "robot", "autonomous"]),
    ("Biochemistry", &["biochemistry", "molecular", "protein", "enzyme"]),
    ("Chemistry", &["chemistry", "chemical", "synthesis", "compound"]),
    ("Biology", &["biology", "biological", "cell", "dna", "genetic"]),
    ("Physics", &["physics", "quantum", "optics", "mechanics"]),
    ("Engineering", &["engineering", "design", "prototype", "system"]),
    ("Environmental Science", &["environmental", "climate", "sustainability", "ecosystem"]),
    ("Biomedical", &["biomedical", "medical", "health", "disease"]),
    ("Research", &["research", "experiment", "study", "investigation"]),
    ("Algorithm Design", &["algorithm", "optimization", "computational"]),
    ("Web Development", &["web", "app", "software development"]),
];

const SKILL_PHRASES: &[&str] = &[
    "machine learning", "deep learning", "neural networks", "ai", "artificial intelligence",
    "data analysis", "statistics", "biostatistics", "computational biology",
    "programming", "python", "java", "c++", "matlab", "r programming",
    "robotics", "computer vision", "image processing", "signal processing",
    "molecular biology", "genetics", "biochemistry", "cell biology",
    "organic chemistry", "inorganic chemistry", "analytical chemistry",
    "physics simulation", "quantum mechanics", "optics", "astrophysics",
    "engineering design", "mechanical engineering", "electrical engineering",
    "biomedical engineering", "environmental science", "sustainability",
    "mathematical modeling", "algorithm design", "optimization",
    "web development", "mobile development", "app development",
    "research methodology", "experimental design", "data visualization",
];

/// Keywords this short only count as whole words, so "ai" does not match "said"
const WHOLE_WORD_MAX_LEN: usize = 3;

/// Broad skill groups hit by the project text, plus its category
pub fn extract_skill_groups(title: &str, abstract_text: &str, category: &str) -> Vec<String> {
    let text = format!("{} {}", title, abstract_text).to_lowercase();

    let mut skills: BTreeSet<String> = SKILL_GROUPS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| mentions(&text, kw)))
        .map(|(name, _)| name.to_string())
        .collect();

    if !category.is_empty() {
        skills.insert(category.to_string());
    }

    skills.into_iter().take(MAX_SKILLS).collect()
}

/// Specific skill phrases found in the project text, title-cased, plus its category
pub fn extract_skill_phrases(title: &str, abstract_text: &str, category: &str) -> Vec<String> {
    let text = format!("{} {}", title, abstract_text).to_lowercase();

    let mut skills: BTreeSet<String> = SKILL_PHRASES
        .iter()
        .filter(|phrase| mentions(&text, phrase))
        .map(|phrase| title_case(phrase))
        .collect();

    if !category.is_empty() {
        skills.insert(category.to_string());
    }

    skills.into_iter().take(MAX_SKILLS).collect()
}

fn mentions(text: &str, keyword: &str) -> bool {
    if keyword.chars().count() > WHOLE_WORD_MAX_LEN {
        return text.contains(keyword);
    }

    text.split(|c: char| !c.is_alphanumeric() && c != '+')
        .any(|word| word == keyword)
}

/// Uppercase the first letter of each word: "r programming" -> "R Programming"
fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

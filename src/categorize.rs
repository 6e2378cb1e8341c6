//! Project categorization
//!
//! The primary category comes from the booth id prefix. Cross-listings come
//! from keyword hits in the title and abstract.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::Project;

/// Booth id prefix -> category, current codes first, then legacy ones
const BOOTH_TO_CATEGORY: &[(&str, &str)] = &[
    ("ANIM", "Animal Sciences"),
    ("BEHA", "Behavioral & Social Sciences"),
    ("BICM", "Biomedical & Health Sciences"),
    ("BITS", "Biochemistry"),
    ("CBIO", "Computational Biology & Bioinformatics"),
    ("CELL", "Cellular & Molecular Biology"),
    ("CHEM", "Chemistry"),
    ("COMP", "Computational Science"),
    ("EAEV", "Earth & Environmental Sciences"),
    ("ENEV", "Environmental Engineering"),
    ("ENER", "Energy: Sustainable Materials & Design"),
    ("ENSI", "Engineering Technology: Statics & Dynamics"),
    ("ENBM", "Biomedical Engineering"),
    ("ENMC", "Engineering: Materials & Chemical"),
    ("ENMT", "Engineering: Mechanical"),
    ("EBED", "Embedded Systems"),
    ("MATH", "Mathematics"),
    ("MCRO", "Microbiology"),
    ("PHYS", "Physics"),
    ("ROBT", "Robotics & Intelligent Machines"),
    ("SOFT", "Software Systems"),
    ("PLNT", "Plant Sciences"),
    ("MEHE", "Biomedical & Health Sciences"),
    ("MEDH", "Biomedical & Health Sciences"),
    ("ENSC", "Earth & Environmental Sciences"),
    ("CSE", "Software Systems"),
    ("CS", "Software Systems"),
    ("EEM", "Engineering: Mechanical"),
    ("ENGR", "Engineering: Mechanical"),
    ("PHYA", "Physics"),
    ("ENTE", "Energy: Sustainable Materials & Design"),
    ("ET", "Energy: Sustainable Materials & Design"),
    ("BOT", "Plant Sciences"),
    ("ZOOL", "Animal Sciences"),
    ("BSS", "Behavioral & Social Sciences"),
    ("EAPS", "Earth & Environmental Sciences"),
    ("ENMA", "Environmental Engineering"),
];

/// Older category names as they appear on the site -> current name
const LEGACY_CATEGORY_NAMES: &[(&str, &str)] = &[
    ("Biomedical and Health Sciences", "Biomedical & Health Sciences"),
    ("Robotics and Intelligent Machines", "Robotics & Intelligent Machines"),
    ("Computational Biology and Bioinformatics", "Computational Biology & Bioinformatics"),
    ("Energy: Sustainable Materials and Design", "Energy: Sustainable Materials & Design"),
    ("Materials Science", "Engineering: Materials & Chemical"),
    ("Translational Medical Science", "Biomedical & Health Sciences"),
    ("Systems Software", "Software Systems"),
    ("Energy: Chemical", "Energy: Sustainable Materials & Design"),
    ("Energy: Physical", "Energy: Sustainable Materials & Design"),
    ("Physics and Astronomy", "Physics"),
    ("Earth and Environmental Sciences", "Earth & Environmental Sciences"),
    ("Cellular and Molecular Biology", "Cellular & Molecular Biology"),
    ("Engineering Mechanics", "Engineering: Mechanical"),
    ("Technology Enhances the Arts", "Software Systems"),
];

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Animal Sciences", &[
        "animal", "mammal", "bird", "fish", "insect", "reptile", "amphibian",
        "veterinary", "livestock", "wildlife", "zoo", "pet", "canine", "feline",
        "rodent", "mouse", "rat", "monkey", "primate", "behavior", "ecology",
        "predator", "prey", "migration", "habitat", "species", "population",
    ]),
    ("Behavioral & Social Sciences", &[
        "psychology", "behavior", "cognitive", "social", "memory", "learning",
        "perception", "emotion", "stress", "anxiety", "depression", "mental health",
        "survey", "questionnaire", "interview", "demographic", "economic",
        "education", "decision", "bias", "attitude", "personality", "motivation",
    ]),
    ("Biomedical & Health Sciences", &[
        "disease", "patient", "clinical", "diagnosis", "treatment", "therapy",
        "medical", "health", "hospital", "symptom", "drug", "pharmaceutical",
        "pathology", "epidemiology", "public health", "nutrition", "diet",
        "obesity", "diabetes", "cardiovascular", "hypertension", "inflammation",
    ]),
    ("Biochemistry", &[
        "enzyme", "protein", "amino acid", "metabolism", "biochemical",
        "molecular weight", "purification", "assay", "kinetics", "substrate",
        "inhibitor", "catalyst", "reaction", "pathway", "synthesis", "degradation",
        "lipid", "carbohydrate", "nucleotide", "cofactor", "vitamin",
    ]),
    ("Computational Biology & Bioinformatics", &[
        "bioinformatics", "genomics", "proteomics", "sequence", "alignment",
        "phylogenetic", "gene expression", "microarray", "rna-seq", "chip-seq",
        "database", "pipeline", "algorithm", "prediction", "modeling",
        "network", "systems biology", "omics", "annotation", "variant",
    ]),
    ("Cellular & Molecular Biology", &[
        "cell", "cellular", "molecular", "gene", "dna", "rna", "protein",
        "expression", "transcription", "translation", "mutation", "genome",
        "chromosome", "nucleus", "mitochondria", "membrane", "receptor",
        "signaling", "apoptosis", "proliferation", "differentiation", "stem cell",
    ]),
    ("Chemistry", &[
        "chemical", "reaction", "synthesis", "compound", "molecule", "element",
        "acid", "base", "ph", "solution", "concentration", "titration",
        "spectroscopy", "chromatography", "organic", "inorganic", "analytical",
        "polymer", "catalyst", "oxidation", "reduction", "bonding",
    ]),
    ("Computational Science", &[
        "algorithm", "simulation", "model", "computer", "software", "code",
        "programming", "data", "analysis", "machine learning", "artificial intelligence",
        "neural network", "deep learning", "optimization", "parallel", "gpu",
        "numerical", "computational", "visualization", "big data",
    ]),
    ("Earth & Environmental Sciences", &[
        "environment", "ecology", "ecosystem", "climate", "weather", "atmosphere",
        "ocean", "marine", "aquatic", "water", "soil", "geology", "mineral",
        "earthquake", "volcano", "fossil", "biodiversity", "conservation",
        "pollution", "contamination", "sustainability", "carbon", "greenhouse",
    ]),
    ("Environmental Engineering", &[
        "water treatment", "wastewater", "filtration", "purification", "remediation",
        "pollution control", "air quality", "emissions", "waste management",
        "recycling", "sustainable", "renewable", "green", "environmental",
        "bioremediation", "phytoremediation", "desalination", "sewage",
    ]),
    ("Energy: Sustainable Materials & Design", &[
        "energy", "solar", "wind", "renewable", "battery", "fuel cell",
        "photovoltaic", "turbine", "power", "electricity", "efficiency",
        "storage", "biofuel", "hydrogen", "sustainable", "green energy",
        "thermal", "heat", "insulation", "led", "lighting",
    ]),
    ("Engineering Technology: Statics & Dynamics", &[
        "structure", "bridge", "building", "load", "stress", "strain",
        "force", "tension", "compression", "beam", "truss", "foundation",
        "stability", "vibration", "dynamics", "mechanics", "construction",
        "civil engineering", "architectural", "design",
    ]),
    ("Biomedical Engineering", &[
        "prosthetic", "implant", "medical device", "biomaterial", "tissue engineering",
        "rehabilitation", "assistive", "diagnostic device", "biosensor", "imaging",
        "mri", "ultrasound", "ecg", "eeg", "bionic", "orthopedic", "surgical",
        "wearable", "health monitor", "drug delivery",
    ]),
    ("Engineering: Materials & Chemical", &[
        "material", "nanoparticle", "nanomaterial", "composite", "polymer",
        "ceramic", "metal", "alloy", "coating", "surface", "corrosion",
        "strength", "durability", "thermal", "electrical", "optical",
        "characterization", "synthesis", "fabrication", "processing",
    ]),
    ("Engineering: Mechanical", &[
        "mechanical", "machine", "robot", "motor", "gear", "pump", "valve",
        "actuator", "mechanism", "automation", "cad", "3d print", "manufacturing",
        "design", "prototype", "testing", "aerodynamic", "fluid", "thermal",
        "vehicle", "drone", "aircraft",
    ]),
    ("Embedded Systems", &[
        "embedded", "microcontroller", "arduino", "raspberry pi", "sensor",
        "iot", "internet of things", "wireless", "bluetooth", "wifi",
        "real-time", "firmware", "hardware", "circuit", "pcb", "gpio",
        "actuator", "control system", "monitoring", "automation",
    ]),
    ("Mathematics", &[
        "mathematical", "equation", "theorem", "proof", "algorithm", "optimization",
        "statistics", "probability", "regression", "correlation", "analysis",
        "graph theory", "number theory", "geometry", "topology", "algebra",
        "calculus", "differential", "integral", "matrix", "vector",
    ]),
    ("Microbiology", &[
        "bacteria", "virus", "fungus", "yeast", "microbe", "microbial",
        "antibiotic", "antimicrobial", "infection", "pathogen", "culture",
        "colony", "growth", "fermentation", "biofilm", "probiotic",
        "gut microbiome", "e. coli", "salmonella", "staphylococcus",
    ]),
    ("Physics", &[
        "physics", "quantum", "particle", "wave", "frequency", "wavelength",
        "electromagnetic", "magnetic", "electric", "voltage", "current",
        "resistance", "capacitor", "inductor", "optics", "lens", "laser",
        "radiation", "nuclear", "thermodynamics", "entropy", "momentum",
    ]),
    ("Robotics & Intelligent Machines", &[
        "robot", "robotic", "autonomous", "navigation", "path planning",
        "computer vision", "object detection", "tracking", "lidar", "slam",
        "manipulator", "gripper", "locomotion", "humanoid", "swarm",
        "artificial intelligence", "machine learning", "control",
    ]),
    ("Software Systems", &[
        "software", "app", "application", "website", "web", "mobile",
        "database", "api", "framework", "programming", "code", "algorithm",
        "user interface", "ux", "cloud", "security", "encryption",
        "network", "server", "client", "browser", "operating system",
    ]),
    ("Plant Sciences", &[
        "plant", "seed", "germination", "growth", "root", "stem", "leaf",
        "flower", "fruit", "photosynthesis", "chlorophyll", "fertilizer",
        "soil", "irrigation", "agriculture", "crop", "harvest", "yield",
        "hydroponics", "aquaponics", "greenhouse", "botanical",
    ]),
];

/// A single hit on one of these is enough to cross-list
const STRONG_KEYWORDS: &[(&str, &[&str])] = &[
    ("Plant Sciences", &["photosynthesis", "germination", "chlorophyll", "hydroponics"]),
    ("Microbiology", &["bacteria", "virus", "antibiotic", "pathogen", "biofilm"]),
    ("Robotics & Intelligent Machines", &["robot", "robotic", "autonomous navigation"]),
    ("Embedded Systems", &["arduino", "raspberry pi", "microcontroller", "iot"]),
    ("Biomedical Engineering", &["prosthetic", "implant", "medical device", "biosensor"]),
    ("Environmental Engineering", &["wastewater", "water treatment", "bioremediation"]),
];

const OTHER: &str = "Other";

/// Leading letters of a booth id: `EBED001T` -> `EBED`
pub fn extract_booth_prefix(booth: &str) -> Option<&str> {
    let end = booth
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(booth.len());

    if end == 0 {
        None
    } else {
        Some(&booth[..end])
    }
}

pub fn category_for_prefix(prefix: &str) -> Option<&'static str> {
    BOOTH_TO_CATEGORY
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, c)| *c)
}

/// Primary category: booth prefix, then the site category (renamed if legacy)
pub fn primary_category(project: &Project) -> String {
    let booth = project.booth.as_deref().unwrap_or("");
    if let Some(category) = extract_booth_prefix(booth).and_then(category_for_prefix) {
        return category.to_string();
    }

    let existing = project.category.as_deref().unwrap_or("");
    if let Some((_, renamed)) = LEGACY_CATEGORY_NAMES.iter().find(|(old, _)| *old == existing) {
        return renamed.to_string();
    }

    if existing.is_empty() {
        OTHER.to_string()
    } else {
        existing.to_string()
    }
}

/// Other categories whose keywords show up in the title and abstract
pub fn find_cross_listings(project: &Project, primary: &str) -> BTreeSet<String> {
    let text = format!(
        "{} {}",
        project.title.as_deref().unwrap_or(""),
        project.abstract_text.as_deref().unwrap_or("")
    )
    .to_lowercase();

    let mut cross_listings = BTreeSet::new();

    for (category, keywords) in CATEGORY_KEYWORDS {
        if *category == primary {
            continue;
        }

        let matches = keywords.iter().filter(|kw| text.contains(*kw)).count();

        if matches >= 2 {
            cross_listings.insert(category.to_string());
        } else if matches == 1 && has_strong_keyword(category, &text) {
            cross_listings.insert(category.to_string());
        }
    }

    cross_listings
}

fn has_strong_keyword(category: &str, text: &str) -> bool {
    STRONG_KEYWORDS
        .iter()
        .find(|(c, _)| *c == category)
        .is_some_and(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
}

/// Distribution figures printed after a categorization run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryStats {
    pub total: usize,
    pub primary_counts: BTreeMap<String, usize>,
    pub multi_category: usize,
    pub average_categories: f64,
    pub max_categories: usize,
    /// Number of categories -> number of projects
    pub distribution: BTreeMap<usize, usize>,
}

impl CategoryStats {
    /// Primary categories by descending count
    pub fn top_primary(&self, n: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .primary_counts
            .iter()
            .map(|(c, n)| (c.as_str(), *n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts.truncate(n);
        counts
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Primary category distribution:\n");
        for (category, count) in self.top_primary(20) {
            out.push_str(&format!("  {}: {}\n", category, count));
        }

        let share = if self.total > 0 {
            self.multi_category as f64 * 100.0 / self.total as f64
        } else {
            0.0
        };
        out.push_str("\nCross-listing statistics:\n");
        out.push_str(&format!(
            "  Projects with multiple categories: {} ({:.1}%)\n",
            self.multi_category, share
        ));
        out.push_str(&format!("  Average categories per project: {:.2}\n", self.average_categories));
        out.push_str(&format!("  Maximum categories on single project: {}\n", self.max_categories));
        out.push_str("\n  Distribution by number of categories:\n");
        for (n, count) in &self.distribution {
            out.push_str(&format!("    {} categories: {} projects\n", n, count));
        }
        out
    }
}

/// Assign `primary_category` and `categories` to every project
pub fn categorize_projects(projects: &mut [Project]) -> CategoryStats {
    let mut stats = CategoryStats { total: projects.len(), ..Default::default() };

    for project in projects.iter_mut() {
        let primary = primary_category(project);
        let cross_listings = find_cross_listings(project, &primary);

        let mut categories = Vec::with_capacity(cross_listings.len() + 1);
        categories.push(primary.clone());
        categories.extend(cross_listings);

        *stats.primary_counts.entry(primary.clone()).or_default() += 1;
        *stats.distribution.entry(categories.len()).or_default() += 1;
        if categories.len() > 1 {
            stats.multi_category += 1;
        }
        stats.max_categories = stats.max_categories.max(categories.len());

        project.primary_category = Some(primary);
        project.categories = categories;
    }

    if stats.total > 0 {
        let sum: usize = projects.iter().map(|p| p.categories.len()).sum();
        stats.average_categories = sum as f64 / stats.total as f64;
    }

    stats
}

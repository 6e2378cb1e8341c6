//! ISEF Scout Library
//!
//! Scraping, categorization and contact enrichment for science fair abstracts

pub mod categorize;
pub mod config;
pub mod crawl;
pub mod email;
pub mod fetch;
pub mod linkedin;
pub mod parse;
pub mod search;
pub mod skills;
pub mod storage;
pub mod students;
pub mod table;
pub mod types;
pub mod winners;

pub use types::*;

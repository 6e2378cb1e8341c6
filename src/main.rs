use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use isef_scout::categorize;
use isef_scout::config::Config;
use isef_scout::crawl::Crawler;
use isef_scout::storage::{self, Store};
use isef_scout::students;
use isef_scout::table;
use isef_scout::winners::WinnerPipeline;

#[derive(Parser)]
#[command(name = "isef_scout", about = "Science fair abstracts scraper and contact finder", version)]
struct Cli {
    /// Root directory holding config/ and the data directory
    #[arg(long, global = true, env = "ROOT", default_value = ".")]
    root: PathBuf,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape abstract pages into projects.json
    Scrape {
        /// First project id (defaults to scrape.start_id)
        start: Option<u32>,
        /// Last project id, inclusive (defaults to scrape.end_id)
        end: Option<u32>,
        /// Requests in flight
        #[arg(long)]
        workers: Option<usize>,
        /// New projects per flush to disk
        #[arg(long)]
        batch_size: Option<usize>,
        /// One id at a time, resuming from progress.json
        #[arg(long)]
        sequential: bool,
    },
    /// Assign primary and cross-listed categories
    Categorize,
    /// Search the web for award winners' email addresses
    Emails {
        /// Process at most this many winners
        #[arg(long)]
        limit: Option<usize>,
        /// Search again for winners already in winner_emails.json
        #[arg(long)]
        all: bool,
    },
    /// University-aware email search for winners without an address
    SmartEmails,
    /// Copy category and country from projects into winner records
    MergeWinners,
    /// Add skills and LinkedIn majors to winner records
    EnhanceWinners,
    /// Profile recent award winners
    RecentWinners {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Extract students from tables in .docx files
    StudentsDocx { files: Vec<PathBuf> },
    /// Extract students from directory HTML pasted into .docx files
    StudentsHtml { files: Vec<PathBuf> },
    /// Derive majors from student notes
    StudentMajors,
    /// Print the winners table as tab-separated text
    Table,
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "isef_scout=debug" } else { "isef_scout=info" };
    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.root)?;
    let store = Store::from_config(&config);

    match cli.command {
        Commands::Scrape { start, end, workers, batch_size, sequential } => {
            let start = start.unwrap_or(config.scrape.start_id);
            let end = end.unwrap_or(config.scrape.end_id);
            let crawler = Crawler::new(&config)?;

            let summary = if sequential {
                crawler.scrape_range(start, end).await?
            } else {
                crawler
                    .scrape_parallel(
                        start,
                        end,
                        workers.unwrap_or(config.scrape.workers),
                        batch_size.unwrap_or(config.scrape.batch_size),
                    )
                    .await?
            };

            println!("Attempted: {}", summary.attempted);
            println!("New projects: {}", summary.found);
            println!("Total projects: {}", summary.total);
        }
        Commands::Categorize => {
            let mut projects = store.require_projects()?;
            println!("Loaded {} projects", projects.len());

            let stats = categorize::categorize_projects(&mut projects);
            store.save_categorized(&projects)?;
            store.save_projects(&projects)?;

            print!("{}", stats.render());
            println!("Saved to {:?}", store.path(storage::CATEGORIZED_FILE));
        }
        Commands::Emails { limit, all } => {
            let pipeline = WinnerPipeline::new(&config)?;
            let stats = pipeline.scrape_winner_emails(limit, !all).await?;

            println!("\n=== Complete ===");
            println!("Award winners: {}", stats.winners);
            println!("Processed: {}", stats.processed);
            println!("Already had records: {}", stats.skipped_existing);
            println!("No student name: {}", stats.without_name);
            println!("Total results: {}", stats.total_records);
            println!("Results saved to: {:?}", store.path(storage::WINNERS_FILE));
        }
        Commands::SmartEmails => {
            let pipeline = WinnerPipeline::new(&config)?;
            let stats = pipeline.smart_email_pass().await?;

            println!("Skipped {} winners (already had emails)", stats.skipped);
            println!("Processed {} winners, found emails for {}", stats.processed, stats.found);
            println!("{}/{} winners now have emails", stats.with_emails, stats.total_records);
        }
        Commands::MergeWinners => {
            let pipeline = WinnerPipeline::new(&config)?;
            let merged = pipeline.merge_project_fields()?;
            println!("Enhanced {} winner records with category data", merged);
        }
        Commands::EnhanceWinners => {
            let pipeline = WinnerPipeline::new(&config)?;
            let total = store.load_winners()?.len();
            let enhanced = pipeline.enhance_with_skills().await?;
            println!("Enhanced {}/{} winners with skills and major information", enhanced, total);
        }
        Commands::RecentWinners { limit } => {
            let pipeline = WinnerPipeline::new(&config)?;
            let stats = pipeline
                .recent_winners(limit.unwrap_or(config.winners.recent_limit))
                .await?;

            println!("Recent award winners: {}", stats.candidates);
            println!("Processed: {}", stats.processed);
            println!("With university: {}/{}", stats.with_university, stats.processed);
            println!("With emails: {}/{}", stats.with_emails, stats.processed);
            println!("With major: {}/{}", stats.with_major, stats.processed);
            println!("Saved to: {:?}", store.path(storage::RECENT_WINNERS_FILE));
        }
        Commands::StudentsDocx { files } => {
            let files = docx_inputs(&cli.root, files);
            let students = students::students_from_tables(&files);
            store.save_students(&students)?;

            println!("Total students extracted: {}", students.len());
            println!("Saved to {:?}", store.path(storage::STUDENTS_FILE));
        }
        Commands::StudentsHtml { files } => {
            let files = docx_inputs(&cli.root, files);
            let students = students::students_from_html(&files);
            store.save_students(&students)?;

            println!("Total students extracted: {}", students.len());
            let mut by_year = std::collections::BTreeMap::new();
            for student in &students {
                *by_year.entry(student.year.as_str()).or_insert(0usize) += 1;
            }
            println!("\nStudents by graduation year:");
            for (year, count) in by_year {
                println!("  {}: {}", year, count);
            }
        }
        Commands::StudentMajors => {
            let mut students = store.load_students()?;
            let distribution = students::annotate_majors(&mut students);
            store.save_students(&students)?;

            println!("Processed {} student records", students.len());
            println!("\nMajor distribution (top 20):");
            for (major, count) in distribution.iter().take(20) {
                println!("  {}: {}", major, count);
            }
        }
        Commands::Table => {
            let winners = store.load_winners()?;
            let rows = table::format_winners(&winners);
            print!("{}", table::render_table(&rows));
        }
    }

    Ok(())
}

/// Files named on the command line, or the default exports under the root
fn docx_inputs(root: &Path, files: Vec<PathBuf>) -> Vec<PathBuf> {
    if files.is_empty() {
        students::DEFAULT_DOCX_FILES.iter().map(|f| root.join(f)).collect()
    } else {
        files
    }
}

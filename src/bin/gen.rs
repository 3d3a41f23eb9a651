//! holidaybits-gen: CLI tool for building and querying packed holiday calendars.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use holidaybits::range::is_weekday;
use holidaybits::{
    BuildConfig, CalendarProvider, DateListProvider, HolidayCalendar, IndexEntry, MatrixBuilder,
    WeekdayRange,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "holidaybits-gen")]
#[command(author = "The holidaybits developers")]
#[command(version = "0.1.0")]
#[command(about = "Build and query bit-packed holiday calendars", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build holidays.bin and holidays.yaml from a YAML list of holiday dates
    Build {
        /// Input holiday source (country -> dates, or country -> subdivision -> dates)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the artifact pair
        #[arg(short, long, default_value = "data")]
        output_dir: PathBuf,

        /// First calendar date (inclusive)
        #[arg(long, default_value = "1970-01-01")]
        start: NaiveDate,

        /// Last calendar date (exclusive)
        #[arg(long, default_value = "2050-01-01")]
        end: NaiveDate,

        /// Worker threads (defaults to available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Look up one date
    Query {
        /// Directory holding holidays.bin and holidays.yaml
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Country id, e.g. AU
        country: String,

        /// Date to look up (YYYY-MM-DD)
        date: NaiveDate,

        /// Subdivision id, e.g. NSW (country default when omitted)
        #[arg(short, long)]
        subdivision: Option<String>,
    },

    /// Print index metadata and jurisdictions
    Inspect {
        /// Directory holding holidays.bin and holidays.yaml
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            input,
            output_dir,
            start,
            end,
            workers,
            verbose,
        } => build(&input, &output_dir, start, end, workers, verbose),
        Commands::Query {
            data_dir,
            country,
            date,
            subdivision,
        } => query(&data_dir, &country, subdivision.as_deref(), date),
        Commands::Inspect { data_dir } => inspect(&data_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build(
    input: &PathBuf,
    output_dir: &PathBuf,
    start: NaiveDate,
    end: NaiveDate,
    workers: Option<usize>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("Reading holiday source: {:?}", input);
    }

    let provider = DateListProvider::load(input)?;
    let mut config = BuildConfig::with_range(WeekdayRange::new(start, end)?);
    if let Some(workers) = workers {
        config = config.workers(workers);
    }

    if verbose {
        println!(
            "Building {} countries over {} weekdays [{}, {})",
            provider.supported_countries().len(),
            config.range.len(),
            start,
            end
        );
    }

    let paths = MatrixBuilder::new(config).publish(&provider, output_dir)?;

    println!("    {:?}", paths.artifact);
    println!("    {:?}", paths.index);
    println!("done.");
    Ok(())
}

fn query(
    data_dir: &PathBuf,
    country: &str,
    subdivision: Option<&str>,
    date: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let calendar = HolidayCalendar::open_dir(data_dir)?;
    let label = match subdivision {
        Some(sub) => format!("{}/{}", country, sub),
        None => country.to_string(),
    };

    let kind = day_kind(&calendar, country, subdivision, date)?;
    println!("{} {}: {}", label, date, kind);
    Ok(())
}

/// "weekend", "holiday" or "business day".
fn day_kind(
    calendar: &HolidayCalendar,
    country: &str,
    subdivision: Option<&str>,
    date: NaiveDate,
) -> holidaybits::Result<&'static str> {
    if !is_weekday(date) {
        // Still validates the jurisdiction and the range
        calendar.is_business_day(country, subdivision, date)?;
        return Ok("weekend");
    }
    if calendar.is_holiday(country, subdivision, date)? {
        Ok("holiday")
    } else {
        Ok("business day")
    }
}

fn inspect(data_dir: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let calendar = HolidayCalendar::open_dir(data_dir)?;
    let index = calendar.index();
    let meta = index.metadata();

    println!("Range:            [{}, {})", meta.start, meta.end);
    println!("Weekdays:         {}", meta.column_count);
    println!("Rows:             {} ({} padded)", index.row_count(), meta.padded_row_count);
    println!("Row bytes:        {}", index.layout().row_bytes());
    println!("Artifact bytes:   {}", index.layout().byte_len());
    if let Some(checksum) = index.checksum() {
        println!("SHA-256:          {}", checksum);
    }

    println!("\nDefaults:");
    for (country, sub) in &meta.defaults {
        println!("  {} -> {}", country, sub);
    }

    println!("\nJurisdictions:");
    for (country, entry) in index.entries() {
        match entry {
            IndexEntry::Row(row) => println!("  {:<8} row {}", country, row),
            IndexEntry::Subdivisions(subs) => {
                for (sub, row) in subs {
                    println!("  {:<8} row {}", format!("{}/{}", country, sub), row);
                }
            }
        }
    }
    Ok(())
}

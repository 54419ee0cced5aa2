use anyhow::{Context, Result};
use carsearch::common_scraper::{run_scraper, ScrapeOptions};
use carsearch::config::{self, ServiceAccountKey, Settings};
use carsearch::criteria::read_criteria;
use carsearch::fetch::HttpFetcher;
use carsearch::models::RESULT_COLUMNS;
use carsearch::query::{build_search_url, RESULTS_URL};
use carsearch::sheets::{ensure_headers, SheetsClient};
use carsearch::sink::{CsvMirror, RowSink, SheetSink};
use carsearch::tui::ScraperTUI;
use carsearch::{debug, debug_println};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "CarSearch - appends cars.com listings to a Google Sheet")]
struct Args {
    /// Name of the spreadsheet holding both worksheets
    #[clap(long, default_value = config::DEFAULT_SPREADSHEET)]
    spreadsheet: String,

    /// Worksheet that receives one row per listing
    #[clap(long, default_value = config::DEFAULT_RESULTS_WORKSHEET)]
    results_worksheet: String,

    /// Worksheet holding the search criteria in column B
    #[clap(long, default_value = config::DEFAULT_CRITERIA_WORKSHEET)]
    criteria_worksheet: String,

    /// Seconds to wait after each results page
    #[clap(long, default_value = "5")]
    page_delay_secs: u64,

    /// Seconds to wait after each appended listing
    #[clap(long, default_value = "2")]
    listing_delay_secs: u64,

    /// Stop after this many result pages (default: until a page is empty)
    #[clap(short, long)]
    max_pages: Option<usize>,

    /// Also write every appended row to this CSV file
    #[clap(long)]
    csv: Option<String>,

    /// Plain line output instead of the live progress display
    #[clap(long)]
    plain: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

impl Args {
    fn into_settings(self) -> Settings {
        Settings {
            spreadsheet: self.spreadsheet,
            results_worksheet: self.results_worksheet,
            criteria_worksheet: self.criteria_worksheet,
            page_delay: Duration::from_secs(self.page_delay_secs),
            listing_delay: Duration::from_secs(self.listing_delay_secs),
            max_pages: self.max_pages,
            csv_mirror: self.csv,
            plain: self.plain,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    debug::init(args.debug);
    let settings = args.into_settings();

    println!("CarSearch - Vehicle Listing Scraper");
    println!("===================================");

    if dotenv_loaded {
        debug_println!("Loaded variables from .env");
    }

    let key = ServiceAccountKey::from_env().context("Google service account credentials are incomplete")?;
    let client = SheetsClient::new(key)?;
    println!("Authenticating as {}", client.service_account());

    let spreadsheet = client.open(&settings.spreadsheet)?;

    let mut results = spreadsheet.worksheet(&settings.results_worksheet)?;
    let added = ensure_headers(&mut results, &RESULT_COLUMNS)?;
    if !added.is_empty() {
        println!("Added missing columns: {}", added.join(", "));
    }

    let criteria_sheet = spreadsheet.worksheet(&settings.criteria_worksheet)?;
    let criteria = read_criteria(&criteria_sheet)?;
    debug_println!("Search criteria: {:?}", criteria);

    let search_url = build_search_url(RESULTS_URL, &criteria);
    let fetcher = HttpFetcher::new()?;
    let options = ScrapeOptions {
        listing_delay: settings.listing_delay,
        page_delay: settings.page_delay,
        max_pages: settings.max_pages,
    };

    let mut display = ScraperTUI::new();
    if settings.plain {
        println!("Searching: {}", search_url);
    }

    let sheet_sink = SheetSink::new(&mut results);
    let mut sink: Box<dyn RowSink + '_> = match &settings.csv_mirror {
        Some(path) => {
            let mirror = CsvMirror::open(sheet_sink, path)?;
            println!("Mirroring rows to {}", mirror.path().display());
            Box::new(mirror)
        }
        None => Box::new(sheet_sink),
    };

    let tui = if settings.plain { None } else { Some(&mut display) };
    let summary = run_scraper(&fetcher, sink.as_mut(), &search_url, &options, tui)?;

    if settings.plain {
        println!("\n=== Summary ===");
        println!("Pages fetched: {}", summary.pages);
        println!("Rows appended: {}", summary.appended);
        println!("Duplicates skipped: {}", summary.duplicates);
        println!("Rows with missing details: {}", summary.degraded);
    } else {
        display.show_final_summary(&summary)?;
    }

    Ok(())
}

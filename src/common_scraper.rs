use crate::fetch::PageFetcher;
use crate::models::{DetailFields, Listing};
use crate::parser::{parse_detail_page, parse_listing_cards};
use crate::query::page_url;
use crate::sink::RowSink;
use crate::tui::{ListingStatus, ScraperTUI};
use crate::{debug_eprintln, debug_println};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Pause after each appended listing.
    pub listing_delay: Duration,
    /// Pause after each results page.
    pub page_delay: Duration,
    /// Stop after this many pages even if listings keep coming.
    pub max_pages: Option<usize>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            listing_delay: Duration::from_secs(2),
            page_delay: Duration::from_secs(5),
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeSummary {
    pub pages: usize,
    pub appended: usize,
    pub duplicates: usize,
    /// Appended rows missing at least one detail-page field.
    pub degraded: usize,
    pub detail_failures: usize,
}

/// Walks the result pages of `search_url` until one comes back empty,
/// enriching and appending each listing not seen earlier in this run.
///
/// A failed results-page fetch, an unparsable card or a refused append ends
/// the run with an error; rows appended before that stay where they are.
/// A failed detail-page fetch only costs that listing its detail fields.
pub fn run_scraper<F: PageFetcher + ?Sized>(
    fetcher: &F,
    sink: &mut dyn RowSink,
    search_url: &str,
    options: &ScrapeOptions,
    mut tui: Option<&mut ScraperTUI>,
) -> Result<ScrapeSummary> {
    let mut summary = ScrapeSummary::default();
    let mut processed_links: HashSet<String> = HashSet::new();
    let mut page = 1;

    if let Some(tui) = tui.as_mut() {
        tui.show_search(search_url)?;
    }

    loop {
        if let Some(max) = options.max_pages {
            if page > max {
                println!("Reached maximum number of pages ({}), stopping", max);
                break;
            }
        }

        if let Some(tui) = tui.as_mut() {
            tui.start_page(page)?;
        }

        let url = page_url(search_url, page);
        let html = fetcher
            .fetch(&url)
            .with_context(|| format!("Failed to fetch results page {}", page))?;
        let cards = parse_listing_cards(&html)
            .with_context(|| format!("Failed to parse results page {}", page))?;
        summary.pages += 1;

        match tui.as_mut() {
            Some(tui) => tui.page_loaded(page, cards.len())?,
            None => println!("Page {}: {} listings", page, cards.len()),
        }

        if cards.is_empty() {
            debug_println!("No listings on page {}, stopping", page);
            break;
        }

        for card in cards {
            if processed_links.contains(&card.detail_link) {
                debug_println!("Skipping already processed listing: {}", card.detail_link);
                summary.duplicates += 1;
                if let Some(tui) = tui.as_mut() {
                    tui.finish_listing(&card.title, ListingStatus::Duplicate)?;
                }
                continue;
            }

            if let Some(tui) = tui.as_mut() {
                tui.start_listing(&card.title)?;
            }

            let details = match fetcher.fetch(&card.detail_link) {
                Ok(body) => parse_detail_page(&body),
                Err(e) => {
                    let message = format!("Error fetching details for {}: {:#}", card.detail_link, e);
                    match tui.as_mut() {
                        Some(tui) => tui.listing_error(&message)?,
                        None => eprintln!("{}", message),
                    }
                    summary.detail_failures += 1;
                    DetailFields::default()
                }
            };

            let listing = Listing::new(card, details);
            sink.append_row(&listing.to_row())
                .with_context(|| format!("Failed to append listing {}", listing.detail_link))?;
            processed_links.insert(listing.detail_link.clone());
            summary.appended += 1;

            let status = if listing.is_partial() {
                summary.degraded += 1;
                ListingStatus::Partial
            } else {
                ListingStatus::Appended
            };

            match tui.as_mut() {
                Some(tui) => tui.finish_listing(&listing.title, status)?,
                None => println!("  + {} ({})", listing.title, listing.detail_link),
            }

            pause(options.listing_delay);
        }

        page += 1;
        pause(options.page_delay);
    }

    if summary.detail_failures > 0 {
        debug_eprintln!("{} detail pages could not be fetched", summary.detail_failures);
    }

    Ok(summary)
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

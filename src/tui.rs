use crate::common_scraper::ScrapeSummary;
use crossterm::{
    cursor::MoveToPreviousLine,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io;

const TITLE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListingStatus {
    /// Row written with every field present.
    Appended,
    /// Row written, some detail fields are missing.
    Partial,
    /// Link already handled earlier in this run.
    Duplicate,
}

/// Live progress lines: one per results page, one per listing.
pub struct ScraperTUI {
    listing_line_open: bool,
}

impl ScraperTUI {
    pub fn new() -> Self {
        Self {
            listing_line_open: false,
        }
    }

    pub fn show_search(&mut self, search_url: &str) -> io::Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("🔎 {}\n", search_url)),
            ResetColor
        )
    }

    pub fn start_page(&mut self, page: usize) -> io::Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(Color::White),
            Print(format!("⏳ Page {}: fetching...\n", page)),
            ResetColor
        )
    }

    pub fn page_loaded(&mut self, page: usize, cards: usize) -> io::Result<()> {
        execute!(
            io::stdout(),
            MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine),
        )?;

        let (color, text) = if cards == 0 {
            (Color::DarkGrey, format!("✓ Page {}: no listings, done\n", page))
        } else {
            (Color::White, format!("📄 Page {}: {} listings\n", page, cards))
        };

        execute!(io::stdout(), SetForegroundColor(color), Print(text), ResetColor)
    }

    pub fn start_listing(&mut self, title: &str) -> io::Result<()> {
        self.listing_line_open = true;
        execute!(
            io::stdout(),
            SetForegroundColor(Color::White),
            Print(format!("  🔄 {}\n", Self::truncate(title))),
            ResetColor
        )
    }

    /// Replaces the in-progress listing line with an error. The listing's
    /// final line then goes below it instead of over it.
    pub fn listing_error(&mut self, message: &str) -> io::Result<()> {
        if self.listing_line_open {
            execute!(
                io::stdout(),
                MoveToPreviousLine(1),
                Clear(ClearType::CurrentLine),
            )?;
        }
        self.listing_line_open = false;

        execute!(
            io::stdout(),
            SetForegroundColor(Color::Red),
            Print(format!("  ❌ {}\n", message)),
            ResetColor
        )
    }

    pub fn finish_listing(&mut self, title: &str, status: ListingStatus) -> io::Result<()> {
        if self.listing_line_open && status != ListingStatus::Duplicate {
            execute!(
                io::stdout(),
                MoveToPreviousLine(1),
                Clear(ClearType::CurrentLine),
            )?;
        }
        self.listing_line_open = false;

        let (color, icon) = match status {
            ListingStatus::Appended => (Color::Green, "✅"),
            ListingStatus::Partial => (Color::Yellow, "⚠️ "),
            ListingStatus::Duplicate => (Color::DarkGrey, "⏭️ "),
        };

        execute!(
            io::stdout(),
            SetForegroundColor(color),
            Print(format!("  {} {}\n", icon, Self::truncate(title))),
            ResetColor
        )
    }

    pub fn show_final_summary(&mut self, summary: &ScrapeSummary) -> io::Result<()> {
        execute!(
            io::stdout(),
            Print("─".repeat(80)),
            Print("\n"),
            SetForegroundColor(Color::Green),
            Print(format!("✅ {} rows appended", summary.appended)),
            ResetColor
        )?;

        if summary.degraded > 0 {
            execute!(
                io::stdout(),
                SetForegroundColor(Color::Yellow),
                Print(format!(", {} with missing details", summary.degraded)),
                ResetColor
            )?;
        }

        execute!(
            io::stdout(),
            SetForegroundColor(Color::DarkGrey),
            Print(format!(
                " | {} duplicates skipped | {} pages\n",
                summary.duplicates, summary.pages
            )),
            ResetColor
        )
    }

    fn truncate(title: &str) -> String {
        if title.chars().count() > TITLE_WIDTH {
            let cut: String = title.chars().take(TITLE_WIDTH - 3).collect();
            format!("{}...", cut)
        } else {
            title.to_string()
        }
    }
}

impl Default for ScraperTUI {
    fn default() -> Self {
        Self::new()
    }
}

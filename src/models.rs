/// Placeholder written for any field that could not be found.
pub const NOT_AVAILABLE: &str = "N/A";

pub const SITE_ROOT: &str = "https://www.cars.com";

/// Column layout of the results worksheet, in row order.
pub const RESULT_COLUMNS: [&str; 12] = [
    "Title",
    "Price",
    "Dealer Name",
    "Mileage",
    "Miles From",
    "Link",
    "History Report",
    "Color",
    "Interior Color",
    "Phone",
    "VIN",
    "Stock #",
];

/// What a search-results card tells us about a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingCard {
    pub title: String,
    pub price: String,
    pub dealer_name: String,
    pub mileage: Option<String>,
    pub miles_from: String,
    pub detail_link: String,
}

/// Enrichment fields from the vehicle detail page. Each one is found or not
/// independently of the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub history_report_link: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub phone: Option<String>,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub title: String,
    pub price: String,
    pub dealer_name: String,
    pub mileage: Option<String>,
    pub miles_from: String,
    pub detail_link: String,
    pub history_report_link: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub phone: Option<String>,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
}

impl Listing {
    pub fn new(card: ListingCard, details: DetailFields) -> Self {
        Self {
            title: card.title,
            price: card.price,
            dealer_name: card.dealer_name,
            mileage: card.mileage,
            miles_from: card.miles_from,
            detail_link: card.detail_link,
            history_report_link: details.history_report_link,
            exterior_color: details.exterior_color,
            interior_color: details.interior_color,
            phone: details.phone,
            vin: details.vin,
            stock_number: details.stock_number,
        }
    }

    /// One value per entry of [`RESULT_COLUMNS`], absent fields as `N/A`.
    pub fn to_row(&self) -> Vec<String> {
        let or_na = |field: &Option<String>| field.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        vec![
            self.title.clone(),
            self.price.clone(),
            self.dealer_name.clone(),
            or_na(&self.mileage),
            self.miles_from.clone(),
            self.detail_link.clone(),
            or_na(&self.history_report_link),
            or_na(&self.exterior_color),
            or_na(&self.interior_color),
            or_na(&self.phone),
            or_na(&self.vin),
            or_na(&self.stock_number),
        ]
    }

    /// True when at least one detail-page field is missing.
    pub fn is_partial(&self) -> bool {
        [
            &self.history_report_link,
            &self.exterior_color,
            &self.interior_color,
            &self.phone,
            &self.vin,
            &self.stock_number,
        ]
        .iter()
        .any(|field| field.is_none())
    }
}

/// Turns a site-relative href into an absolute URL.
pub fn absolute_link(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", SITE_ROOT, href)
    } else {
        format!("{}/{}", SITE_ROOT, href)
    }
}

use crate::models::{absolute_link, DetailFields, ListingCard, NOT_AVAILABLE};
use anyhow::{Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const CARD_SELECTOR: &str = "div.vehicle-card-main.js-gallery-click-card";
const TITLE_SELECTOR: &str = "h2.title";
const PRICE_SELECTOR: &str = "span.primary-price";
const DEALER_SELECTOR: &str = "div.dealer-name";
const MILEAGE_SELECTOR: &str = "div.mileage";
const MILES_FROM_SELECTOR: &str = "div.miles-from";
const LINK_SELECTOR: &str = "a.vehicle-card-link";

const DEEPLINK_SELECTOR: &str = "div.vehicle-deeplink";
const PHONE_SELECTOR: &str = "a#mobile-call-button";
const HISTORY_PROVIDERS: [&str; 2] = ["carfax", "autocheck"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Whitespace-collapsed text of an element, `None` when it has none.
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First element under `scope` matching `css`.
pub fn select_element<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    scope.select(&selector(css)).next()
}

/// Text of the first element under `scope` matching `css`.
pub fn select_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_element(scope, css).and_then(element_text)
}

/// Attribute of the first element under `scope` matching `css`.
pub fn select_attr(scope: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    scope
        .select(&selector(css))
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Value of a `<dt>term</dt>` entry: the text of the next `<dd>` in document order.
pub fn definition_value(document: &Html, term: &str) -> Option<String> {
    let mut term_seen = false;
    for element in document.select(&selector("dt, dd")) {
        match element.value().name() {
            "dt" if !term_seen => {
                term_seen = element_text(element).as_deref() == Some(term);
            }
            "dd" if term_seen => return element_text(element),
            _ => {}
        }
    }
    None
}

/// Parses every listing card on a results page. A card missing one of its
/// required elements is an error; mileage alone may be absent. A required
/// element that is present but blank reads as `N/A`.
pub fn parse_listing_cards(html: &str) -> Result<Vec<ListingCard>> {
    let document = Html::parse_document(html);
    let mut cards = Vec::new();

    for (index, card) in document.select(&selector(CARD_SELECTOR)).enumerate() {
        let required = |css: &str, what: &str| {
            select_element(card, css)
                .map(|el| element_text(el).unwrap_or_else(|| NOT_AVAILABLE.to_string()))
                .with_context(|| format!("Listing card {} has no {}", index + 1, what))
        };

        let title = required(TITLE_SELECTOR, "title")?;
        let price = required(PRICE_SELECTOR, "price")?;
        let dealer_name = required(DEALER_SELECTOR, "dealer name")?;
        let mileage = select_text(card, MILEAGE_SELECTOR);
        let miles_from = required(MILES_FROM_SELECTOR, "distance")?;
        let href = select_attr(card, LINK_SELECTOR, "href")
            .with_context(|| format!("Listing card {} ('{}') has no detail link", index + 1, title))?;

        cards.push(ListingCard {
            title,
            price,
            dealer_name,
            mileage,
            miles_from,
            detail_link: absolute_link(&href),
        });
    }

    Ok(cards)
}

/// Extracts the enrichment fields from a vehicle detail page.
pub fn parse_detail_page(html: &str) -> DetailFields {
    let document = Html::parse_document(html);
    let root = document.root_element();

    DetailFields {
        history_report_link: history_report_link(root),
        exterior_color: definition_value(&document, "Exterior color"),
        interior_color: definition_value(&document, "Interior color"),
        phone: select_attr(root, PHONE_SELECTOR, "href").map(|href| strip_tel_prefix(&href)),
        vin: definition_value(&document, "VIN"),
        stock_number: definition_value(&document, "Stock #"),
    }
}

fn history_report_link(root: ElementRef<'_>) -> Option<String> {
    let deeplink = root.select(&selector(DEEPLINK_SELECTOR)).find(|el| {
        let text = el.text().collect::<String>().to_lowercase();
        HISTORY_PROVIDERS.iter().any(|p| text.contains(p))
    })?;

    select_attr(deeplink, "a", "href").map(|href| absolute_link(&href))
}

/// `tel:+13105550100` -> `+13105550100`. Hrefs without the scheme are kept.
pub fn strip_tel_prefix(href: &str) -> String {
    let re = Regex::new(r"(?i)^\s*tel:(//)?").unwrap();
    re.replace(href, "").trim().to_string()
}

#[cfg(test)]
pub mod fixtures {
    pub fn card(link: &str, mileage: Option<&str>) -> String {
        let mileage = mileage
            .map(|m| format!(r#"<div class="mileage">{}</div>"#, m))
            .unwrap_or_default();
        format!(
            r#"<div class="vehicle-card-main js-gallery-click-card">
                 <a class="vehicle-card-link js-gallery-click-link" href="{link}">
                   <h2 class="title">2020 Toyota Camry SE</h2>
                 </a>
                 {mileage}
                 <div class="price-section"><span class="primary-price">$21,995</span></div>
                 <div class="vehicle-dealer">
                   <div class="dealer-name"><strong>Beverly Hills Toyota</strong></div>
                   <div class="miles-from">
                     3 mi. from 90210
                   </div>
                 </div>
               </div>"#
        )
    }

    pub fn results_page(cards: &[String]) -> String {
        format!(
            r#"<html><body><div class="vehicle-cards">{}</div></body></html>"#,
            cards.join("\n")
        )
    }

    pub fn detail_page() -> String {
        r#"<html><body>
             <div class="vehicle-deeplink"><a href="/vehicle-history/window-sticker/">Window sticker</a></div>
             <div class="vehicle-deeplink"><a href="/carfax/report/?vin=4T1G11AK0LU000001">Free CARFAX Report</a></div>
             <a id="mobile-call-button" href="tel:(310) 555-0100">Call</a>
             <dl class="fancy-description-list">
               <dt>Exterior color</dt><dd>Midnight Black Metallic</dd>
               <dt>Interior color</dt><dd>Black</dd>
               <dt>Drivetrain</dt><dd>Front-wheel Drive</dd>
               <dt>VIN</dt><dd>4T1G11AK0LU000001</dd>
               <dt>Stock #</dt><dd> P1234 </dd>
             </dl>
           </body></html>"#
            .to_string()
    }
}

use crate::criteria::SearchCriteria;

pub const RESULTS_URL: &str = "https://www.cars.com/shopping/results/";

/// Builds the results-page URL for a search. Values are interpolated as
/// given; multi-valued fields are comma joined under an array-style key.
pub fn build_search_url(base: &str, criteria: &SearchCriteria) -> String {
    format!(
        "{}?maximum_distance={}&zip={}&stock_type={}&makes%5B%5D={}&models%5B%5D={}&year_min={}&year_max={}&list_price_min={}&list_price_max={}&mileage_max={}",
        base,
        criteria.maximum_distance,
        criteria.zip_code,
        criteria.stock_type,
        criteria.makes.join(","),
        criteria.models.join(","),
        criteria.minimum_year,
        criteria.maximum_year,
        criteria.minimum_price,
        criteria.maximum_price,
        criteria.maximum_mileage,
    )
}

pub fn page_url(search_url: &str, page: usize) -> String {
    format!("{}&page={}", search_url, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            maximum_distance: "50".to_string(),
            zip_code: "90210".to_string(),
            stock_type: "used".to_string(),
            makes: vec!["Toyota".to_string()],
            models: vec!["Camry".to_string()],
            minimum_year: "2018".to_string(),
            maximum_year: "2023".to_string(),
            minimum_price: "10000".to_string(),
            maximum_price: "25000".to_string(),
            maximum_mileage: "60000".to_string(),
        }
    }

    fn query_pairs(url: &str) -> Vec<(String, String)> {
        let (_, query) = url.split_once('?').unwrap();
        query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (k.to_string(), v.to_string())
            })
            .collect()
    }

    #[test]
    fn each_parameter_appears_once() {
        let url = build_search_url(RESULTS_URL, &criteria());
        let pairs = query_pairs(&url);

        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "maximum_distance",
                "zip",
                "stock_type",
                "makes%5B%5D",
                "models%5B%5D",
                "year_min",
                "year_max",
                "list_price_min",
                "list_price_max",
                "mileage_max",
            ]
        );
        assert_eq!(
            url,
            "https://www.cars.com/shopping/results/?maximum_distance=50&zip=90210&stock_type=used&makes%5B%5D=Toyota&models%5B%5D=Camry&year_min=2018&year_max=2023&list_price_min=10000&list_price_max=25000&mileage_max=60000"
        );
    }

    #[test]
    fn multi_values_are_comma_joined() {
        let mut c = criteria();
        c.makes = vec!["Toyota".to_string(), "Honda".to_string()];
        c.models = vec!["Camry".to_string(), "Accord".to_string()];

        let pairs = query_pairs(&build_search_url(RESULTS_URL, &c));
        assert!(pairs.contains(&("makes%5B%5D".to_string(), "Toyota,Honda".to_string())));
        assert!(pairs.contains(&("models%5B%5D".to_string(), "Camry,Accord".to_string())));
    }

    #[test]
    fn build_is_deterministic() {
        assert_eq!(
            build_search_url(RESULTS_URL, &criteria()),
            build_search_url(RESULTS_URL, &criteria())
        );
    }

    #[test]
    fn page_number_is_appended() {
        assert_eq!(page_url("https://x/?a=1", 3), "https://x/?a=1&page=3");
    }
}

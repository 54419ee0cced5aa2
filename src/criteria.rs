use crate::sheets::SheetTab;
use anyhow::{bail, Result};

/// Rows the criteria worksheet must have before any cell is read.
pub const REQUIRED_ROWS: usize = 11;

const VALUE_COLUMN: usize = 2;

/// Search parameters as the user typed them. Values are not validated; they
/// flow into the query string as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub maximum_distance: String,
    pub zip_code: String,
    pub stock_type: String,
    pub makes: Vec<String>,
    pub models: Vec<String>,
    pub minimum_year: String,
    pub maximum_year: String,
    pub minimum_price: String,
    pub maximum_price: String,
    pub maximum_mileage: String,
}

/// Reads column B, rows 2 through 11, of the criteria worksheet.
pub fn read_criteria<S: SheetTab + ?Sized>(sheet: &S) -> Result<SearchCriteria> {
    if sheet.row_count() < REQUIRED_ROWS {
        bail!("Insufficient criteria values. Please make sure all criteria are provided.");
    }

    let value = |row: usize| -> Result<String> {
        Ok(sheet.cell(row, VALUE_COLUMN)?.unwrap_or_default())
    };

    Ok(SearchCriteria {
        maximum_distance: value(2)?,
        zip_code: value(3)?,
        stock_type: value(4)?,
        makes: split_list(&value(5)?),
        models: split_list(&value(6)?),
        minimum_year: value(7)?,
        maximum_year: value(8)?,
        minimum_price: value(9)?,
        maximum_price: value(10)?,
        maximum_mileage: value(11)?,
    })
}

/// Splits a comma separated cell, keeping order and entries untouched.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::memory::MemorySheet;

    fn criteria_sheet() -> MemorySheet {
        MemorySheet::new(
            "Criteria",
            vec![
                vec!["Criterion", "Value"],
                vec!["Maximum distance", "50"],
                vec!["Zip", "90210"],
                vec!["Stock type", "used"],
                vec!["Makes", "Toyota"],
                vec!["Models", "Camry"],
                vec!["Year min", "2018"],
                vec!["Year max", "2023"],
                vec!["Price min", "10000"],
                vec!["Price max", "25000"],
                vec!["Mileage max", "60000"],
            ],
        )
    }

    #[test]
    fn reads_fixed_cells() {
        let criteria = read_criteria(&criteria_sheet()).unwrap();

        assert_eq!(criteria.maximum_distance, "50");
        assert_eq!(criteria.zip_code, "90210");
        assert_eq!(criteria.stock_type, "used");
        assert_eq!(criteria.makes, vec!["Toyota"]);
        assert_eq!(criteria.models, vec!["Camry"]);
        assert_eq!(criteria.minimum_year, "2018");
        assert_eq!(criteria.maximum_year, "2023");
        assert_eq!(criteria.minimum_price, "10000");
        assert_eq!(criteria.maximum_price, "25000");
        assert_eq!(criteria.maximum_mileage, "60000");
    }

    #[test]
    fn multi_valued_cells_split_in_order() {
        let mut sheet = criteria_sheet();
        sheet.rows[4][1] = "Toyota,Honda".to_string();
        sheet.rows[5][1] = "Camry,Accord,civic".to_string();

        let criteria = read_criteria(&sheet).unwrap();
        assert_eq!(criteria.makes, vec!["Toyota", "Honda"]);
        assert_eq!(criteria.models, vec!["Camry", "Accord", "civic"]);
    }

    #[test]
    fn short_sheet_is_rejected() {
        let mut sheet = criteria_sheet();
        sheet.grid_rows = 10;

        let err = read_criteria(&sheet).unwrap_err();
        assert!(err.to_string().starts_with("Insufficient criteria values"));
    }

    #[test]
    fn values_are_not_validated() {
        let mut sheet = criteria_sheet();
        sheet.rows[2][1] = "not-a-zip".to_string();
        sheet.rows[10][1] = String::new();

        let criteria = read_criteria(&sheet).unwrap();
        assert_eq!(criteria.zip_code, "not-a-zip");
        assert_eq!(criteria.maximum_mileage, "");
    }

    #[test]
    fn split_keeps_entries_verbatim() {
        assert_eq!(split_list("a, b,,c"), vec!["a", " b", "", "c"]);
        assert_eq!(split_list(""), vec![""]);
    }
}

use serde::Serialize;

pub const VALUE_COLUMN: &str = "four_star_value_of_item_in_subprofile";
pub const EXPORT_FILE_NAME: &str = "four_star_value.csv";
pub const EXPORT_MEDIA_TYPE: &str = "text/csv";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationInput {
    pub mainstream_allocation: f64,
    pub outputs_required: u32,
    pub three_star_activity: f64,
    pub four_star_activity: f64,
}

/// Header names plus rows of raw cell text, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeSummary {
    pub rows_read: usize,
    pub rows_valued: usize,
    pub rows_blank: usize,
    pub rows_dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: &'static str,
    pub media_type: &'static str,
    pub data: Vec<u8>,
}

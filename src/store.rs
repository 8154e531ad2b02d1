// Record store - the authoritative list of expenses
// Owns validation, totals, and CSV save/load. The table UI is a projection
// of this store, never the other way around.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Suggested categories offered by the entry form. The store itself accepts
/// any non-empty category so that CSV files written elsewhere still load.
pub const CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Bills",
    "Rent",
    "Health",
    "Education",
    "Shopping",
    "Entertainment",
    "Other",
];

/// One expense entry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Record {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
}

impl Record {
    /// Amount as rendered in the table and in saved files.
    pub fn amount_text(&self) -> String {
        format_amount(self.amount)
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Some field was empty after trimming.
    MissingField,
    /// Amount was not a number, or was not strictly positive.
    InvalidAmount,
    /// Date was not a valid calendar date in YYYY-MM-DD form.
    InvalidDate,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField => write!(f, "Missing data: please fill all fields"),
            ValidationError::InvalidAmount => {
                write!(f, "Invalid amount: enter a positive number")
            }
            ValidationError::InvalidDate => {
                write!(f, "Invalid date: use YYYY-MM-DD")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a dash-separated, all-numeric Y-M-D string naming a real calendar
/// date. Rejects day 31 of a 30-day month, month 13, and so on.
pub fn validate_date(date: &str) -> bool {
    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() != 3 {
        return false;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return false;
    }
    let (y, m, d) = (parts[0].parse(), parts[1].parse(), parts[2].parse());
    match (y, m, d) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    }
}

/// Render an amount the way the table and the CSV file show it.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

// ============================================================================
// STORE
// ============================================================================

/// In-memory ordered collection of expense records.
///
/// Records keep insertion order; duplicates are allowed and distinguished
/// only by position. Deletion matches the rendered 4-tuple and removes the
/// earliest match, mirroring how the table identifies rows.
#[derive(Debug, Default, Clone)]
pub struct ExpenseStore {
    records: Vec<Record>,
}

impl ExpenseStore {
    pub fn new() -> Self {
        ExpenseStore {
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate the four raw form values and append a new record.
    ///
    /// All inputs are trimmed first. Errors are distinct per cause so the
    /// user knows which field to fix. The stored amount keeps full parsed
    /// precision; 2-decimal rounding happens only at display/save time.
    pub fn add(
        &mut self,
        date: &str,
        category: &str,
        description: &str,
        amount_text: &str,
    ) -> std::result::Result<&Record, ValidationError> {
        let date = date.trim();
        let category = category.trim();
        let description = description.trim();
        let amount_text = amount_text.trim();

        if date.is_empty() || category.is_empty() || description.is_empty() || amount_text.is_empty()
        {
            return Err(ValidationError::MissingField);
        }

        let amount: f64 = amount_text
            .parse()
            .map_err(|_| ValidationError::InvalidAmount)?;
        if !(amount > 0.0) {
            return Err(ValidationError::InvalidAmount);
        }

        if !validate_date(date) {
            return Err(ValidationError::InvalidDate);
        }

        self.records.push(Record {
            date: date.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            amount,
        });
        Ok(self.records.last().unwrap())
    }

    /// Remove the first record whose rendered 4-tuple matches.
    ///
    /// Identity is structural: two identical rows are indistinguishable, and
    /// deleting either from the table removes the earliest-inserted match.
    /// Returns the removed record, or None when nothing matched.
    pub fn remove_matching(
        &mut self,
        date: &str,
        category: &str,
        description: &str,
        amount_text: &str,
    ) -> Option<Record> {
        let pos = self.records.iter().position(|r| {
            r.date == date
                && r.category == category
                && r.description == description
                && r.amount_text() == amount_text
        })?;
        Some(self.records.remove(pos))
    }

    /// Sum of all stored amounts. Recomputed on every call; at the expected
    /// record counts this is cheaper than keeping a cache correct.
    pub fn total(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }

    pub fn total_text(&self) -> String {
        format_amount(self.total())
    }

    // ========================================================================
    // CSV SAVE / LOAD
    // ========================================================================

    /// Write the store as CSV: fixed header, then one row per record in
    /// insertion order, amounts with exactly two decimals. The csv writer
    /// quotes fields containing the delimiter, so free-text descriptions
    /// survive a round-trip.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["date", "category", "description", "amount"])?;
        for r in &self.records {
            wtr.write_record([
                r.date.as_str(),
                r.category.as_str(),
                r.description.as_str(),
                r.amount_text().as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.save(file)
    }

    /// Replace the store contents with records parsed from CSV.
    ///
    /// The first line is consumed as a header and discarded without checking
    /// its names; remaining rows are read positionally. A row is skipped
    /// whole when any trimmed field is empty, the date fails the same check
    /// as `add`, or the amount does not parse as a positive number. Skips are
    /// silent; the accepted count is returned.
    pub fn load<R: Read>(&mut self, reader: R) -> usize {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut loaded = Vec::new();

        for result in rdr.deserialize::<(String, String, String, String)>() {
            let (date, category, description, amount_text) = match result {
                Ok(row) => row,
                Err(_) => continue,
            };
            let date = date.trim();
            let category = category.trim();
            let description = description.trim();
            let amount_text = amount_text.trim();

            if date.is_empty()
                || category.is_empty()
                || description.is_empty()
                || amount_text.is_empty()
            {
                continue;
            }
            if !validate_date(date) {
                continue;
            }
            let amount: f64 = match amount_text.parse() {
                Ok(a) => a,
                Err(_) => continue,
            };
            // Same positivity rule as add(), applied uniformly at load.
            if !(amount > 0.0) {
                continue;
            }

            loaded.push(Record {
                date: date.to_string(),
                category: category.to_string(),
                description: description.to_string(),
                amount,
            });
        }

        let count = loaded.len();
        self.records = loaded;
        count
    }

    /// Load from a file path. On an open failure the store is untouched.
    pub fn load_from_path(&mut self, path: &Path) -> Result<usize> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(self.load(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn store_with(entries: &[(&str, &str, &str, &str)]) -> ExpenseStore {
        let mut store = ExpenseStore::new();
        for (d, c, desc, a) in entries {
            store.add(d, c, desc, a).expect("test entry should be valid");
        }
        store
    }

    #[test]
    fn test_add_valid_record() {
        let mut store = ExpenseStore::new();
        let rec = store.add("2024-01-15", "Food", "Lunch", "12.50").unwrap();
        assert_eq!(rec.amount, 12.5);
        assert_eq!(rec.amount_text(), "12.50");
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_text(), "12.50");
    }

    #[test]
    fn test_add_trims_whitespace() {
        let mut store = ExpenseStore::new();
        let rec = store
            .add(" 2024-01-15 ", " Food ", "  Lunch  ", " 12.5 ")
            .unwrap();
        assert_eq!(rec.date, "2024-01-15");
        assert_eq!(rec.description, "Lunch");
    }

    #[test]
    fn test_add_keeps_full_precision() {
        let mut store = ExpenseStore::new();
        let rec = store.add("2024-01-15", "Food", "Lunch", "12.505").unwrap();
        assert_eq!(rec.amount, 12.505);
        // Display rounds, storage does not
        assert_eq!(rec.amount_text(), "12.51");
    }

    #[test]
    fn test_add_missing_field() {
        let mut store = ExpenseStore::new();
        assert_eq!(
            store.add("", "Food", "Lunch", "12.50"),
            Err(ValidationError::MissingField)
        );
        assert_eq!(
            store.add("2024-01-15", "Food", "   ", "12.50"),
            Err(ValidationError::MissingField)
        );
        assert_eq!(store.len(), 0);
        assert_eq!(store.total(), 0.0);
    }

    #[test]
    fn test_add_invalid_amount() {
        let mut store = ExpenseStore::new();
        for bad in ["abc", "-3", "0", "0.0"] {
            assert_eq!(
                store.add("2024-01-15", "Food", "Lunch", bad),
                Err(ValidationError::InvalidAmount),
                "amount {:?} should be rejected",
                bad
            );
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_add_invalid_date() {
        let mut store = ExpenseStore::new();
        for bad in [
            "2024/01/15",
            "15-01-2024",
            "2024-13-01",
            "2024-02-30",
            "2024-04-31",
            "2024-0a-15",
            "2024-01",
        ] {
            assert_eq!(
                store.add(bad, "Food", "Lunch", "12.50"),
                Err(ValidationError::InvalidDate),
                "date {:?} should be rejected",
                bad
            );
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_leap_day() {
        assert!(validate_date("2024-02-29"));
        assert!(!validate_date("2023-02-29"));
    }

    #[test]
    fn test_rejected_add_leaves_total_unchanged() {
        let mut store = store_with(&[("2024-01-15", "Food", "Lunch", "12.50")]);
        assert_eq!(
            store.add("2024-01-16", "Transport", "Bus", "-3"),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_text(), "12.50");
    }

    #[test]
    fn test_remove_matching_earliest_duplicate() {
        let mut store = store_with(&[
            ("2024-01-15", "Food", "Lunch", "12.50"),
            ("2024-01-15", "Food", "Lunch", "12.50"),
            ("2024-01-16", "Transport", "Bus", "3.00"),
        ]);
        let removed = store
            .remove_matching("2024-01-15", "Food", "Lunch", "12.50")
            .unwrap();
        assert_eq!(removed.amount, 12.5);
        assert_eq!(store.len(), 2);
        // One duplicate remains, total drops by exactly one lunch
        assert_eq!(store.total_text(), "15.50");
        assert_eq!(store.records()[0].date, "2024-01-15");
    }

    #[test]
    fn test_remove_matching_not_found() {
        let mut store = store_with(&[("2024-01-15", "Food", "Lunch", "12.50")]);
        assert!(store
            .remove_matching("2024-01-15", "Food", "Dinner", "12.50")
            .is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_matches_formatted_amount() {
        let mut store = store_with(&[("2024-01-15", "Food", "Lunch", "12.5")]);
        // The table renders 12.5 as "12.50"; removal goes by the rendered form
        assert!(store
            .remove_matching("2024-01-15", "Food", "Lunch", "12.50")
            .is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_writes_header_and_two_decimals() {
        let store = store_with(&[("2024-01-15", "Food", "Lunch", "12.5")]);
        let mut buf = Vec::new();
        store.save(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "date,category,description,amount\n2024-01-15,Food,Lunch,12.50\n");
    }

    #[test]
    fn test_round_trip() {
        let store = store_with(&[
            ("2024-01-15", "Food", "Lunch", "12.50"),
            ("2024-01-16", "Transport", "Bus fare", "3.00"),
            ("2024-01-17", "Other", "Misc", "7.25"),
        ]);
        let mut buf = Vec::new();
        store.save(&mut buf).unwrap();

        let mut reloaded = ExpenseStore::new();
        let count = reloaded.load(Cursor::new(buf));
        assert_eq!(count, 3);
        assert_eq!(reloaded.len(), store.len());
        for (a, b) in store.records().iter().zip(reloaded.records()) {
            assert_eq!(a.date, b.date);
            assert_eq!(a.category, b.category);
            assert_eq!(a.description, b.description);
            assert_eq!(a.amount_text(), b.amount_text());
        }
    }

    #[test]
    fn test_round_trip_description_with_delimiter() {
        let store = store_with(&[("2024-01-15", "Food", "Lunch, with dessert", "12.50")]);
        let mut buf = Vec::new();
        store.save(&mut buf).unwrap();

        let mut reloaded = ExpenseStore::new();
        assert_eq!(reloaded.load(Cursor::new(buf)), 1);
        assert_eq!(reloaded.records()[0].description, "Lunch, with dessert");
    }

    #[test]
    fn test_load_skips_bad_rows() {
        let csv = "date,category,description,amount\n\
                   2024-01-15,Food,Lunch,12.50\n\
                   2024-01-16,Transport,,3.00\n\
                   2024-13-01,Bills,Electricity,40.00\n\
                   2024-01-17,Health,Pharmacy,abc\n\
                   2024-01-18,Other,Refund,-5.00\n\
                   2024-01-19,Other,Zero,0\n";
        let mut store = ExpenseStore::new();
        let count = store.load(Cursor::new(csv));
        assert_eq!(count, 1);
        assert_eq!(store.records()[0].description, "Lunch");
    }

    #[test]
    fn test_load_does_not_validate_header_names() {
        let csv = "anything,goes,here,whatever\n2024-01-15,Food,Lunch,12.50\n";
        let mut store = ExpenseStore::new();
        assert_eq!(store.load(Cursor::new(csv)), 1);
    }

    #[test]
    fn test_load_replaces_store_contents() {
        let mut store = store_with(&[("2020-05-05", "Rent", "May rent", "900.00")]);
        let csv = "date,category,description,amount\n2024-01-15,Food,Lunch,12.50\n";
        assert_eq!(store.load(Cursor::new(csv)), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].category, "Food");
    }

    #[test]
    fn test_load_accepts_category_outside_suggestions() {
        let csv = "date,category,description,amount\n2024-01-15,Groceries,Weekly shop,55.10\n";
        let mut store = ExpenseStore::new();
        assert_eq!(store.load(Cursor::new(csv)), 1);
        assert!(!CATEGORIES.contains(&"Groceries"));
    }

    #[test]
    fn test_save_and_load_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");

        let store = store_with(&[("2024-01-15", "Food", "Lunch", "12.50")]);
        store.save_to_path(&path).unwrap();

        let mut reloaded = ExpenseStore::new();
        assert_eq!(reloaded.load_from_path(&path).unwrap(), 1);
        assert_eq!(reloaded.total_text(), "12.50");
    }

    #[test]
    fn test_load_from_missing_path_leaves_store_untouched() {
        let mut store = store_with(&[("2024-01-15", "Food", "Lunch", "12.50")]);
        assert!(store
            .load_from_path(Path::new("/no/such/file.csv"))
            .is_err());
        assert_eq!(store.len(), 1);
    }
}

// View projection - the sortable table rows
// Rows are rendered copies of store records. Sorting reorders the display
// only; the store keeps insertion order, which deletion and save depend on.

use crate::store::Record;

/// One table row: the rendered 4-tuple the user sees and selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: String,
}

impl DisplayRow {
    pub fn from_record(record: &Record) -> Self {
        DisplayRow {
            date: record.date.clone(),
            category: record.category.clone(),
            description: record.description.clone(),
            amount: record.amount_text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Category,
    Description,
    Amount,
}

impl SortColumn {
    pub fn title(&self) -> &str {
        match self {
            SortColumn::Date => "Date",
            SortColumn::Category => "Category",
            SortColumn::Description => "Description",
            SortColumn::Amount => "Amount",
        }
    }

    fn index(&self) -> usize {
        match self {
            SortColumn::Date => 0,
            SortColumn::Category => 1,
            SortColumn::Description => 2,
            SortColumn::Amount => 3,
        }
    }
}

/// Per-column sort direction state.
///
/// Every column starts ascending. Sorting a column applies its pending
/// direction, then flips the flag for that column only, so each heading
/// toggles independently of the others.
#[derive(Debug, Default, Clone)]
pub struct SortState {
    descending: [bool; 4],
}

impl SortState {
    pub fn new() -> Self {
        SortState::default()
    }

    /// Sort rows by the given column and advance that column's toggle.
    /// Returns true when the applied direction was descending.
    pub fn sort(&mut self, rows: &mut [DisplayRow], column: SortColumn) -> bool {
        let descending = self.descending[column.index()];

        match column {
            // Dates are YYYY-MM-DD, so plain string order is date order
            SortColumn::Date => rows.sort_by(|a, b| a.date.cmp(&b.date)),
            SortColumn::Category => {
                rows.sort_by(|a, b| a.category.to_lowercase().cmp(&b.category.to_lowercase()))
            }
            SortColumn::Description => rows.sort_by(|a, b| {
                a.description
                    .to_lowercase()
                    .cmp(&b.description.to_lowercase())
            }),
            SortColumn::Amount => rows.sort_by(|a, b| {
                let x: f64 = a.amount.parse().unwrap_or(0.0);
                let y: f64 = b.amount.parse().unwrap_or(0.0);
                x.total_cmp(&y)
            }),
        }
        if descending {
            rows.reverse();
        }

        self.descending[column.index()] = !descending;
        descending
    }
}

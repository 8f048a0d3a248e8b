//! Derived listing view: records, filters and the current page

use crate::error::Error;
use crate::listing::filter::{FilterField, FilterState};
use crate::listing::pagination::PaginationState;
use crate::property::PropertyRecord;

/// Owns the loaded records and the user's filter choices.
///
/// The filtered index list is rebuilt only when one of its inputs changes,
/// and every rebuild sends the view back to page 1.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    records: Vec<PropertyRecord>,
    filters: FilterState,
    filtered: Vec<usize>,
    pagination: PaginationState,
}

impl ListingQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            filters: FilterState::default(),
            filtered: Vec::new(),
            pagination: PaginationState::new(page_size),
        }
    }

    pub fn with_records(page_size: usize, records: Vec<PropertyRecord>) -> Self {
        let mut query = Self::new(page_size);
        query.set_records(records);
        query
    }

    pub fn set_records(&mut self, records: Vec<PropertyRecord>) {
        self.records = records;
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        if filters != self.filters {
            self.filters = filters;
            self.recompute();
        }
    }

    /// Apply one dropdown selection; see [`FilterState::select`]
    pub fn select(&mut self, field: FilterField, value: &str) -> Result<(), Error> {
        if self.filters.select(field, value)? {
            self.recompute();
        }
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(FilterState::default());
    }

    /// Page numbers outside `1..=total_pages()` show an empty page
    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.current_page = page;
    }

    fn recompute(&mut self) {
        self.filtered = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.filters.matches(record))
            .map(|(index, _)| index)
            .collect();
        self.pagination.reset();
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered(&self) -> Vec<&PropertyRecord> {
        self.filtered.iter().map(|&index| &self.records[index]).collect()
    }

    /// Records on the current page
    pub fn visible(&self) -> Vec<&PropertyRecord> {
        self.pagination
            .slice(&self.filtered)
            .iter()
            .map(|&index| &self.records[index])
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.filtered.len())
    }

    /// Result counter above the grid
    pub fn summary(&self) -> String {
        format!("{} appear from {} Results", self.visible().len(), self.filtered_count())
    }
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self::new(12)
    }
}

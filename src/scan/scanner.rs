//! Paginated scanner
//!
//! Walks a [`TableSource`] from the first page to the last, carrying the
//! continuation cursor between calls.

use super::types::{Page, ScanState, TableSource};
use crate::error::Result;
use futures::Stream;
use tracing::{debug, info};

/// Lazy page-by-page scan of one table
pub struct Scanner<S: TableSource> {
    source: S,
    cursor: Option<S::Cursor>,
    state: ScanState,
}

impl<S: TableSource> Scanner<S> {
    /// Create a scanner positioned before the first page
    pub fn new(source: S) -> Self {
        Self {
            source,
            cursor: None,
            state: ScanState::new(),
        }
    }

    /// Table being scanned
    pub fn table_name(&self) -> &str {
        self.source.table_name()
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Progress so far
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Fetch the next page, or `None` once the source returned no cursor
    ///
    /// An error leaves the scanner where it was; the caller decides whether
    /// the run survives it.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.state.done {
            return Ok(None);
        }

        debug!(
            table = self.source.table_name(),
            page = self.state.pages_fetched + 1,
            "Requesting scan page"
        );
        let response = self.source.scan_page(self.cursor.clone()).await?;

        let is_last = response.is_last();
        self.cursor = response.next_cursor;
        self.state.add_page(response.items.len());

        info!(
            table = self.source.table_name(),
            page = self.state.pages_fetched,
            items = response.items.len(),
            "Retrieved a batch of items"
        );

        if is_last {
            self.state.mark_done();
            info!(
                table = self.source.table_name(),
                pages = self.state.pages_fetched,
                records = self.state.records_fetched,
                "Scan completed"
            );
        }

        Ok(Some(Page {
            number: self.state.pages_fetched,
            records: response.items,
        }))
    }

    /// Consume the scanner into a stream of pages
    pub fn pages(self) -> impl Stream<Item = Result<Page>> {
        futures::stream::try_unfold(self, |mut scanner| async move {
            let page = scanner.next_page().await?;
            Ok(page.map(|page| (page, scanner)))
        })
    }
}

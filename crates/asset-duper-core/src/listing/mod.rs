//! Lazy record streams feeding the inventory builder. Every source yields
//! `Result<String, Error>` items, one raw key or path per item.

pub mod csv_column;
pub mod reference_list;
pub mod walk;

pub use csv_column::CsvColumnSource;
pub use reference_list::ReferenceListSource;
pub use walk::WalkSource;

use crate::error::Error;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// One page of a remote object listing.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub keys: Vec<String>,
    /// Token for the following page, `None` on the last page.
    pub next_continuation: Option<String>,
}

/// Page-based access to an object-store listing. Implemented by the SDK binding.
pub trait ObjectLister {
    fn list_page(&mut self, prefix: &str, continuation: Option<&str>) -> Result<ListingPage, Error>;
}

/// Flattens an [`ObjectLister`] into a stream of keys, fetching the next page
/// only once the buffered one has been drained. Fused after the last page or
/// the first error.
pub struct PagedKeys<L> {
    lister: L,
    prefix: String,
    continuation: Option<String>,
    buffer: VecDeque<String>,
    pages_fetched: usize,
    done: bool,
}

impl<L: ObjectLister> PagedKeys<L> {
    pub fn new(lister: L, prefix: &str) -> Self {
        Self {
            lister,
            prefix: prefix.to_string(),
            continuation: None,
            buffer: VecDeque::new(),
            pages_fetched: 0,
            done: false,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn fetch_page(&mut self) -> Result<(), Error> {
        let page = self
            .lister
            .list_page(&self.prefix, self.continuation.as_deref())?;
        self.pages_fetched += 1;
        trace!(
            "Fetched page {} with {} keys under '{}'",
            self.pages_fetched,
            page.keys.len(),
            self.prefix
        );
        self.buffer.extend(page.keys);
        match page.next_continuation {
            Some(token) => self.continuation = Some(token),
            None => {
                debug!("Listing exhausted after {} pages", self.pages_fetched);
                self.done = true;
            }
        }
        Ok(())
    }
}

impl<L: ObjectLister> Iterator for PagedKeys<L> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.buffer.pop_front() {
                return Some(Ok(key));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

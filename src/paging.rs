//! Server-issued continuation tokens and the page-by-page execution loop.

use bytes::Bytes;
use tracing::debug;

use crate::codec::FromCqlValue;
use crate::error::CqlMiddlewareDbError;
use crate::results::QueryResult;
use crate::session::Session;
use crate::statement::Statement;

/// Opaque continuation token for a truncated result set.
///
/// The bytes belong to the database. They are carried, stored and handed back exactly as
/// received; this type offers no way to inspect their structure or modify them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PagingState(Bytes);

impl PagingState {
    /// Rehydrate a token previously captured with [`PagingState::as_bytes`].
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        PagingState(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for PagingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PagingState({} bytes)", self.0.len())
    }
}

/// Drives a statement through every page of its result.
///
/// Each [`PageIter::next_page`] executes the statement, waits for the page, and copies the page's
/// paging state back onto the statement. That copy is the only mutation between pages; bound
/// values are left untouched. Once a page reports no more pages the iterator is finished and the
/// statement's token is cleared, so the next run starts from the first page again.
///
/// A token already on the statement when iteration starts is honored, which lets a caller resume
/// from a stored [`PagingState`].
pub struct PageIter<'s> {
    session: &'s Session,
    statement: &'s mut Statement,
    pages_fetched: usize,
    finished: bool,
}

impl<'s> PageIter<'s> {
    pub(crate) fn new(session: &'s Session, statement: &'s mut Statement) -> Self {
        Self {
            session,
            statement,
            pages_fetched: 0,
            finished: false,
        }
    }

    /// Fetch the next page, or `None` after the final page.
    ///
    /// # Errors
    ///
    /// Returns the failure of the page's execute future. The iterator is finished afterwards;
    /// nothing is retried.
    pub fn next_page(&mut self) -> Option<Result<QueryResult, CqlMiddlewareDbError>> {
        if self.finished {
            return None;
        }
        let outcome = self.session.execute(self.statement).result();
        match &outcome {
            Ok(page) => {
                self.pages_fetched += 1;
                // Clears the token on the final page so the statement can be paged again.
                self.finished = !self.statement.set_paging_state_from(page);
                debug!(
                    page = self.pages_fetched,
                    rows = page.row_count(),
                    more = page.has_more_pages(),
                    "fetched page"
                );
            }
            Err(_) => self.finished = true,
        }
        Some(outcome)
    }

    /// Number of pages fetched so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain every remaining page, decoding the first column of each row.
    ///
    /// # Errors
    ///
    /// Returns the first execute failure or decode error.
    pub fn rows_collect<T: FromCqlValue>(mut self) -> Result<Vec<T>, CqlMiddlewareDbError> {
        let mut out = Vec::new();
        while let Some(page) = self.next_page() {
            let page = page?;
            for row in page.rows() {
                out.push(row.get::<T>(0)?);
            }
        }
        Ok(out)
    }
}

impl Iterator for PageIter<'_> {
    type Item = Result<QueryResult, CqlMiddlewareDbError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page()
    }
}

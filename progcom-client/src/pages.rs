//! Lazy consumption of paginated listings
//!
//! [`PageCursor`] is a pull-based iterator over the raw records of a
//! cursor chain: advancing drains an in-memory buffer, then refills from
//! the `next` URL. Elements are yielded in upstream order, one page at a
//! time, and a record is fully parsed before the consumer observes it.
//! Cancellation is checked before each element.
//!
//! [`Paged`] layers reference expansion and typed deserialization on top.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use progcom_common::{Error, Result};

use crate::expand::Expander;
use crate::fetcher::{PageEnvelope, PageSource};

/// Pull-based cursor over the raw JSON records of a paginated listing.
pub struct PageCursor {
    source: Arc<dyn PageSource>,
    endpoint: String,
    count: u64,
    buffer: VecDeque<Value>,
    next_url: Option<String>,
    yielded: u64,
    pages_fetched: u32,
    cancel: CancellationToken,
}

impl PageCursor {
    /// Build a cursor from the already-fetched first page.
    pub fn new(
        source: Arc<dyn PageSource>,
        endpoint: impl Into<String>,
        first: PageEnvelope,
        cancel: CancellationToken,
    ) -> PageCursor {
        PageCursor {
            source,
            endpoint: endpoint.into(),
            count: first.count,
            buffer: first.results.into(),
            next_url: first.next,
            yielded: 0,
            pages_fetched: 1,
            cancel,
        }
    }

    /// Total count declared by the upstream on the first page.
    pub fn declared_count(&self) -> u64 {
        self.count
    }

    /// Records yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Pages requested so far, including the first.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Advance to the next raw record, fetching the next page when the
    /// buffer runs dry. Returns `None` once the chain is exhausted.
    pub async fn next(&mut self) -> Option<Result<Value>> {
        if self.cancel.is_cancelled() {
            return Some(Err(Error::Cancelled));
        }
        loop {
            if let Some(value) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(value));
            }
            let url = self.next_url.take()?;
            match self.source.next_page(&url).await {
                Ok(page) => {
                    self.pages_fetched += 1;
                    self.buffer = page.results.into();
                    self.next_url = page.next;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Drain the cursor. An upstream truncation (fewer records than the
    /// declared count) is surfaced as a wire error.
    pub async fn collect_values(mut self) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(self.count as usize);
        while let Some(item) = self.next().await {
            values.push(item?);
        }
        if self.yielded != self.count {
            return Err(Error::WireError {
                path: self.endpoint.clone(),
                cause: format!(
                    "upstream truncated listing: declared {} records, yielded {}",
                    self.count, self.yielded
                ),
            });
        }
        Ok(values)
    }
}

/// Typed lazy sequence over a paginated listing, with transparent
/// reference expansion.
///
/// In lenient mode, records that do not match the expected schema are
/// logged and dropped; otherwise the sequence terminates with
/// [`Error::WireError`].
pub struct Paged<T> {
    cursor: PageCursor,
    expander: Option<Expander>,
    event: String,
    lenient: bool,
    dropped: u64,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Paged<T> {
    pub(crate) fn new(
        cursor: PageCursor,
        expander: Option<Expander>,
        event: impl Into<String>,
        lenient: bool,
    ) -> Paged<T> {
        Paged {
            cursor,
            expander,
            event: event.into(),
            lenient,
            dropped: 0,
            _marker: PhantomData,
        }
    }

    /// Total count declared by the upstream.
    pub fn declared_count(&self) -> u64 {
        self.cursor.declared_count()
    }

    /// Records dropped in lenient mode.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Pages requested so far, including the first.
    pub fn pages_fetched(&self) -> u32 {
        self.cursor.pages_fetched()
    }

    /// Advance to the next typed record.
    pub async fn next(&mut self) -> Option<Result<T>> {
        loop {
            let value = match self.cursor.next().await? {
                Ok(value) => value,
                Err(e) => return Some(Err(e)),
            };
            let value = if let Some(expander) = &self.expander {
                match expander.expand(&self.event, value).await {
                    Ok(value) => value,
                    Err(e) => return Some(Err(e)),
                }
            } else {
                value
            };
            match serde_json::from_value::<T>(value) {
                Ok(record) => return Some(Ok(record)),
                Err(e) => {
                    let err = Error::WireError {
                        path: self.cursor.endpoint().to_string(),
                        cause: e.to_string(),
                    };
                    if self.lenient {
                        tracing::warn!(
                            endpoint = self.cursor.endpoint(),
                            error = %err,
                            "dropping wire-invalid record (lenient mode)"
                        );
                        self.dropped += 1;
                        continue;
                    }
                    return Some(Err(err));
                }
            }
        }
    }

    /// Materialize the remaining sequence. Outside lenient mode an
    /// upstream truncation is surfaced as a wire error.
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(self.cursor.declared_count() as usize);
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        let raw_yielded = self.cursor.yielded();
        if raw_yielded != self.cursor.declared_count() {
            let err = Error::WireError {
                path: self.cursor.endpoint().to_string(),
                cause: format!(
                    "upstream truncated listing: declared {} records, yielded {}",
                    self.cursor.declared_count(),
                    raw_yielded
                ),
            };
            if !self.lenient {
                return Err(err);
            }
            tracing::warn!(endpoint = self.cursor.endpoint(), error = %err, "count mismatch");
        }
        Ok(records)
    }
}

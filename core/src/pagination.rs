//! Manual pagination over `Link: <...>; rel="next"` responses.
//!
//! # Design
//! The next page is never fetched on its own. [`Request::each_page`] hands the
//! callback an [`Advance`] token and waits for it: calling
//! [`Advance::next`] fetches the following page, dropping the token ends the
//! walk. The token is `Send + 'static`, so a caller may hand it to another
//! task and advance later.
//!
//! Every page request started from a request is linked to it, so aborting
//! the first request also aborts whichever page is in flight.

use std::fmt;

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// Permission to fetch the next page.
pub struct Advance {
    tx: Option<oneshot::Sender<()>>,
}

impl Advance {
    fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A token that does nothing, handed out alongside errors.
    pub(crate) fn noop() -> Self {
        Self { tx: None }
    }

    /// Fetch the next page, if the current response links one.
    pub fn next(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl fmt::Debug for Advance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advance")
            .field("armed", &self.tx.is_some())
            .finish()
    }
}

impl Request {
    /// Walk the pages starting at this request.
    ///
    /// The callback receives each page (or the failure that ended the walk)
    /// with an [`Advance`] token. Resolves once a page has no `next`
    /// relation, a token is dropped without advancing, or a page fails.
    pub async fn each_page<F>(&self, mut callback: F)
    where
        F: FnMut(std::result::Result<&Response, &Error>, Advance),
    {
        let mut current = self.clone();
        loop {
            let response = match current.send().await {
                Ok(response) => response,
                Err(err) => {
                    callback(Err(&err), Advance::noop());
                    return;
                }
            };

            let (advance, advanced) = Advance::channel();
            callback(Ok(&response), advance);
            if advanced.await.is_err() {
                trace!(id = current.id(), "pagination stopped by caller");
                return;
            }
            self.unlink_next_page();

            let Some(next) = response.next_page() else {
                trace!(id = current.id(), "no next page");
                return;
            };
            self.link_next_page(&next);
            current = next;
        }
    }

    /// Pull-based pagination starting at this request.
    pub fn pages(&self) -> PageStream {
        PageStream {
            head: self.clone(),
            next: Some(self.clone()),
        }
    }
}

/// Lazily fetches one page per call, following `next` links.
#[derive(Debug)]
pub struct PageStream {
    head: Request,
    next: Option<Request>,
}

impl PageStream {
    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once a page without a `next` relation has been
    /// returned. After an error the stream is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Response>> {
        let Some(request) = self.next.take() else {
            return Ok(None);
        };
        if request.id() != self.head.id() {
            self.head.link_next_page(&request);
        }
        let response = request.send().await?;
        self.next = response.next_page();
        Ok(Some(response))
    }

    /// Fetch every remaining page.
    pub async fn collect(mut self) -> Result<Vec<Response>> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn advance_signals_its_receiver() {
        let (advance, rx) = Advance::channel();
        advance.next();
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn dropped_advance_closes_its_receiver() {
        let (advance, rx) = Advance::channel();
        drop(advance);
        assert!(rx.await.is_err());
    }

    #[test]
    fn noop_advance_is_harmless() {
        let advance = Advance::noop();
        assert!(format!("{advance:?}").contains("false"));
        advance.next();
    }
}

//! Typed notifications a request emits while it is in flight and when it
//! settles.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RequestError;
use crate::response::Response;

/// The fixed set of notifications a [`Request`](crate::Request) emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Response,
    Error,
    DownloadProgress,
    UploadProgress,
}

/// Transfer progress reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Total size in bytes, when the peer announced it.
    pub total: Option<u64>,
    pub transferred: u64,
    /// `100 * transferred / total`, when the total is known and non-zero.
    pub percent: Option<f64>,
}

impl Progress {
    pub fn new(total: Option<u64>, transferred: u64) -> Self {
        let percent = total
            .filter(|total| *total > 0)
            .map(|total| 100.0 * transferred as f64 / total as f64);
        Self {
            total,
            transferred,
            percent,
        }
    }
}

/// A notification delivered to listeners.
#[derive(Debug, Clone, Copy)]
pub enum RequestEvent<'a> {
    Response(&'a Response),
    Error(&'a RequestError),
    DownloadProgress(Progress),
    UploadProgress(Progress),
}

impl RequestEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            RequestEvent::Response(_) => EventKind::Response,
            RequestEvent::Error(_) => EventKind::Error,
            RequestEvent::DownloadProgress(_) => EventKind::DownloadProgress,
            RequestEvent::UploadProgress(_) => EventKind::UploadProgress,
        }
    }
}

pub(crate) type Listener = Arc<dyn Fn(&RequestEvent<'_>) + Send + Sync>;

/// Listener registry of one request. Fan-out is synchronous and in
/// subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Mutex<Vec<(EventKind, Listener)>>,
}

impl Listeners {
    pub(crate) fn add(&self, kind: EventKind, listener: Listener) {
        self.entries.lock().push((kind, listener));
    }

    pub(crate) fn emit(&self, event: &RequestEvent<'_>) {
        let kind = event.kind();
        // Listeners run outside the lock so they may subscribe further.
        let matching: Vec<Listener> = self
            .entries
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in matching {
            listener(event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn progress_percent_needs_a_total() {
        assert_eq!(Progress::new(Some(200), 50).percent, Some(25.0));
        assert_eq!(Progress::new(None, 50).percent, None);
        assert_eq!(Progress::new(Some(0), 0).percent, None);
    }

    #[test]
    fn emit_only_reaches_matching_kind() {
        let listeners = Listeners::default();
        let downloads = Arc::new(AtomicUsize::new(0));
        let uploads = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&downloads);
        listeners.add(
            EventKind::DownloadProgress,
            Arc::new(move |_: &RequestEvent<'_>| {
                d.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let u = Arc::clone(&uploads);
        listeners.add(
            EventKind::UploadProgress,
            Arc::new(move |_: &RequestEvent<'_>| {
                u.fetch_add(1, Ordering::SeqCst);
            }),
        );

        listeners.emit(&RequestEvent::DownloadProgress(Progress::new(Some(10), 5)));
        listeners.emit(&RequestEvent::DownloadProgress(Progress::new(Some(10), 10)));

        assert_eq!(downloads.load(Ordering::SeqCst), 2);
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
    }
}

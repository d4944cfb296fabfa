// ── Reactive snapshot stream ──
//
// Subscription type for consuming snapshot changes from the DeviceStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::DeviceSnapshot;

type Published = Option<Arc<DeviceSnapshot>>;

/// A subscription to the device snapshot.
///
/// `None` means no full read has succeeded yet.
pub struct SnapshotStream {
    current: Published,
    receiver: watch::Receiver<Published>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Published>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation time or at the last `changed()`.
    pub fn current(&self) -> Option<&Arc<DeviceSnapshot>> {
        self.current.as_ref()
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> Published {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Published> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current.clone_from(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding every published snapshot, starting with the
/// current one.
pub struct SnapshotWatchStream {
    inner: WatchStream<Published>,
}

impl Stream for SnapshotWatchStream {
    type Item = Published;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

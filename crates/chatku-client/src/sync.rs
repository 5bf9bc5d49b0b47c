//! Keeps the message list on screen in step with the document feed,
//! falling back to the local cache whenever the feed cannot deliver.
//!
//! Every `on_update` call carries the complete ordered list and must
//! replace whatever the UI currently shows.
//!
//! Start-up order is fixed: the feed listener is attached first, then the
//! cache is read and replayed, then live events are drained. Snapshots
//! arriving while the cache is being read wait in the subscription
//! buffer, so a cache replay can never overwrite newer live data.

use std::sync::Arc;

use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chatku_shared::{sort_messages, Message};
use chatku_store::MessageCache;

use crate::ports::{DocumentFeed, FeedEvent, FeedSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Attached, no live snapshot yet.
    Connecting,
    /// The last thing the feed delivered was a snapshot.
    Live,
    /// The last thing the feed delivered was an error; the UI is showing
    /// cached data.
    Offline,
    Stopped,
}

#[derive(Clone)]
pub struct Synchronizer {
    feed: Arc<dyn DocumentFeed>,
    cache: MessageCache,
}

impl Synchronizer {
    pub fn new(feed: Arc<dyn DocumentFeed>, cache: MessageCache) -> Self {
        Self { feed, cache }
    }

    /// Attach to the feed and start delivering updates.
    ///
    /// Must be called from inside a tokio runtime. Dropping the returned
    /// handle has the same effect as [`SyncHandle::stop`].
    pub fn start<F>(&self, on_update: F) -> SyncHandle
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(SyncStatus::Connecting);

        let subscription = self.feed.subscribe();
        let cache = self.cache.clone();

        let task = tokio::spawn(run(subscription, cache, on_update, stop_rx, status_tx));

        SyncHandle {
            stop_tx: Some(stop_tx),
            status_rx,
            task: Some(task),
        }
    }

    /// One-shot read of the feed. The result replaces the cache; if the
    /// read fails the cached list is returned instead.
    pub async fn fetch_once(&self) -> Vec<Message> {
        match self.feed.fetch().await {
            Ok(mut messages) => {
                sort_messages(&mut messages);
                self.cache.save(&messages).await;
                debug!(count = messages.len(), "Fetched messages");
                messages
            }
            Err(e) => {
                warn!(error = %e, "Fetch failed, serving cached messages");
                self.cache.load().await
            }
        }
    }
}

async fn run<F>(
    mut subscription: FeedSubscription,
    cache: MessageCache,
    mut on_update: F,
    mut stop_rx: oneshot::Receiver<()>,
    status_tx: watch::Sender<SyncStatus>,
) where
    F: FnMut(Vec<Message>) + Send + 'static,
{
    let cached = cache.load().await;
    if stop_requested(&mut stop_rx) {
        finish(subscription, &status_tx);
        return;
    }
    if !cached.is_empty() {
        debug!(count = cached.len(), "Replaying cached messages");
        on_update(cached);
    }

    loop {
        tokio::select! {
            biased;

            // Fires on an explicit stop and when the handle is dropped.
            _ = &mut stop_rx => break,

            event = subscription.next() => match event {
                Some(FeedEvent::Snapshot(mut messages)) => {
                    sort_messages(&mut messages);
                    cache.save(&messages).await;
                    if stop_requested(&mut stop_rx) {
                        break;
                    }
                    status_tx.send_replace(SyncStatus::Live);
                    debug!(count = messages.len(), "Live snapshot");
                    on_update(messages);
                }
                Some(FeedEvent::Error(e)) => {
                    warn!(error = %e, "Feed error, falling back to cache");
                    status_tx.send_replace(SyncStatus::Offline);
                    let cached = cache.load().await;
                    if stop_requested(&mut stop_rx) {
                        break;
                    }
                    if !cached.is_empty() {
                        on_update(cached);
                    }
                }
                None => {
                    debug!("Feed closed the subscription");
                    break;
                }
            },
        }
    }

    finish(subscription, &status_tx);
}

/// A stop that arrived while cache I/O was awaited. A dropped handle
/// counts as a stop. Must not be called once the receiver has completed.
fn stop_requested(stop_rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn finish(subscription: FeedSubscription, status_tx: &watch::Sender<SyncStatus>) {
    // Dropping the subscription here detaches the listener.
    drop(subscription);
    status_tx.send_replace(SyncStatus::Stopped);
    info!("Synchronizer stopped");
}

/// Controls a running [`Synchronizer`].
pub struct SyncHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    status_rx: watch::Receiver<SyncStatus>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Detach from the feed. Cache I/O already under way finishes, but
    /// its result is not delivered: no `on_update` call follows `stop`.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Stop and wait until the background task has finished, including
    /// any in-flight cache I/O.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Synchronizer task ended abnormally");
            }
        }
    }

    pub fn status(&self) -> SyncStatus {
        *self.status_rx.borrow()
    }

    /// A receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chatku_shared::{FeedError, ServerTimestamp};
    use chatku_shared::constants::MESSAGES_STORAGE_KEY;
    use chatku_store::{KeyValueStore, MemoryStore, StoreError};
    use tokio::sync::mpsc;

    use super::*;
    use crate::backend::memory::MemoryFeed;

    fn msg(id: &str, text: &str, user: &str, seconds: i64) -> Message {
        Message {
            id: id.into(),
            text: text.into(),
            user: user.into(),
            image_url: None,
            created_at: Some(ServerTimestamp::new(seconds, 0)),
        }
    }

    fn setup() -> (Arc<MemoryFeed>, MessageCache, Synchronizer) {
        let feed = Arc::new(MemoryFeed::new());
        let cache = MessageCache::new(Arc::new(MemoryStore::new()));
        let sync = Synchronizer::new(feed.clone(), cache.clone());
        (feed, cache, sync)
    }

    fn collector() -> (
        impl FnMut(Vec<Message>) + Send + 'static,
        mpsc::UnboundedReceiver<Vec<Message>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |messages| {
                let _ = tx.send(messages);
            },
            rx,
        )
    }

    async fn next_update(rx: &mut mpsc::UnboundedReceiver<Vec<Message>>) -> Vec<Message> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("callback dropped")
    }

    #[tokio::test]
    async fn cached_then_live_scenario() {
        let (feed, cache, sync) = setup();
        let alice = msg("1", "hi", "Alice", 100);
        let bob = msg("2", "yo", "Bob", 200);
        cache.save(&[alice.clone()]).await;
        feed.set_offline(true);

        let (cb, mut rx) = collector();
        let handle = sync.start(cb);

        assert_eq!(next_update(&mut rx).await, vec![alice.clone()]);

        feed.replace_all(vec![alice.clone(), bob.clone()]);
        feed.set_offline(false);

        // the offline fallback may replay the cache once more first
        let mut last = next_update(&mut rx).await;
        while last.len() != 2 {
            last = next_update(&mut rx).await;
        }
        assert_eq!(last, vec![alice.clone(), bob.clone()]);
        assert_eq!(handle.status(), SyncStatus::Live);
        assert_eq!(cache.load().await, vec![alice, bob]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn feed_error_after_save_replays_cache() {
        let (feed, _cache, sync) = setup();
        let first = msg("1", "hi", "Alice", 100);
        feed.replace_all(vec![first.clone()]);

        let (cb, mut rx) = collector();
        let handle = sync.start(cb);
        assert_eq!(next_update(&mut rx).await, vec![first.clone()]);

        feed.emit_error(FeedError::Unavailable("network down".into()));
        assert_eq!(next_update(&mut rx).await, vec![first]);
        assert_eq!(handle.status(), SyncStatus::Offline);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn feed_error_with_empty_cache_sends_nothing() {
        let (feed, _cache, sync) = setup();
        feed.set_offline(true);

        let (cb, mut rx) = collector();
        let mut handle = sync.start(cb);

        let mut status = handle.watch_status();
        status
            .wait_for(|s| *s == SyncStatus::Offline)
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        handle.stop();
    }

    #[tokio::test]
    async fn snapshots_are_sorted() {
        let (feed, _cache, sync) = setup();
        let mut pending = msg("p", "sending", "Alice", 0);
        pending.created_at = None;
        feed.replace_all(vec![
            pending,
            msg("b", "b", "Bob", 200),
            msg("a", "a", "Ani", 100),
        ]);

        let (cb, mut rx) = collector();
        let handle = sync.start(cb);

        let ids: Vec<_> = next_update(&mut rx).await.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["a", "b", "p"]);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn stop_detaches_listener() {
        let (feed, _cache, sync) = setup();
        let (cb, mut rx) = collector();
        let handle = sync.start(cb);

        // initial (empty) snapshot
        assert!(next_update(&mut rx).await.is_empty());
        assert_eq!(feed.subscriber_count(), 1);

        handle.shutdown().await;
        feed.replace_all(vec![msg("1", "late", "Alice", 100)]);

        assert_eq!(feed.subscriber_count(), 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_handle_stops() {
        let (feed, _cache, sync) = setup();
        let (cb, mut rx) = collector();
        let handle = sync.start(cb);
        next_update(&mut rx).await;

        drop(handle);
        // the task drops the callback (and with it the sender) on exit
        assert!(tokio::time::timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await
        .is_ok());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn fetch_once_refreshes_cache_or_falls_back() {
        let (feed, cache, sync) = setup();
        let m = msg("1", "hi", "Alice", 100);
        feed.replace_all(vec![m.clone()]);

        assert_eq!(sync.fetch_once().await, vec![m.clone()]);
        assert_eq!(cache.load().await, vec![m.clone()]);

        feed.set_offline(true);
        assert_eq!(sync.fetch_once().await, vec![m]);
    }

    /// Writes land, but only after a delay.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for SlowStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn stop_during_cache_write_suppresses_update() {
        let feed = Arc::new(MemoryFeed::new());
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_millis(300),
        });
        let sync = Synchronizer::new(feed.clone(), MessageCache::new(store.clone()));

        let (cb, mut rx) = collector();
        let mut handle = sync.start(cb);
        assert!(handle.is_running());

        // the initial snapshot is now being saved
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();

        tokio::time::timeout(Duration::from_secs(2), async {
            while handle.is_running() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("synchronizer did not stop");

        assert_eq!(handle.status(), SyncStatus::Stopped);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        // the write that was under way still completed
        assert_eq!(
            store.inner.get(MESSAGES_STORAGE_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_finishes_task() {
        let (_feed, _cache, sync) = setup();
        let (cb, mut rx) = collector();
        let handle = sync.start(cb);
        next_update(&mut rx).await;
        assert!(handle.is_running());

        let status = handle.watch_status();
        handle.shutdown().await;
        assert_eq!(*status.borrow(), SyncStatus::Stopped);
    }
}

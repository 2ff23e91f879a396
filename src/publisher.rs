//! Multicast fan-out of fetched articles.
//!
//! ```text
//! FetchJob ──publish(batch)──► [dispatch queue] ──► dispatcher thread
//!                                                     ├─► [queue S1] ──► Subscription 1
//!                                                     ├─► [queue S2] ──► Subscription 2
//!                                                     └─► ...
//! ```
//!
//! Registrations travel through the same queue as batches, so a subscriber
//! only ever sees batches published after `subscribe()` returned.  Every
//! hand-off on the publish path is a non-blocking `try_send`; a slow
//! subscriber loses articles instead of stalling the scheduler.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::source::Article;

/// Opaque identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Max batches waiting for the dispatcher before new ones are dropped.
    pub dispatch_capacity: usize,
    /// Per-subscriber buffer, in articles.
    pub subscriber_capacity: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            dispatch_capacity: 64,
            subscriber_capacity: 256,
        }
    }
}

/// Point-in-time publisher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub subscribers: usize,
    pub batches_published: u64,
    pub articles_delivered: u64,
    /// Articles a full subscriber queue could not take.
    pub dropped_articles: u64,
    /// Whole batches rejected because the dispatch queue was full.
    pub dropped_batches: u64,
}

#[derive(Debug, Default)]
struct Counters {
    subscribers: AtomicUsize,
    batches_published: AtomicU64,
    articles_delivered: AtomicU64,
    dropped_articles: AtomicU64,
    dropped_batches: AtomicU64,
}

enum DispatchMsg {
    Batch(Arc<[Article]>),
    Register {
        id: SubscriptionId,
        tx: Sender<Article>,
    },
    Unregister {
        id: SubscriptionId,
    },
    Shutdown,
}

/// Broadcast point for articles.
///
/// Owns a dedicated dispatcher thread that is shut down and joined on drop.
pub struct Publisher {
    cfg: PublisherConfig,
    tx: Sender<DispatchMsg>,
    next_id: AtomicU64,
    counters: Arc<Counters>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Publisher {
    pub fn new(cfg: PublisherConfig) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<DispatchMsg>(cfg.dispatch_capacity.max(1));
        let counters = Arc::new(Counters::default());

        let thread_counters = Arc::clone(&counters);
        let join = thread::Builder::new()
            .name("news-publisher".to_string())
            .spawn(move || dispatch_loop(rx, thread_counters))?;

        Ok(Self {
            cfg,
            tx,
            next_id: AtomicU64::new(1),
            counters,
            join: Mutex::new(Some(join)),
        })
    }

    /// Register a new subscriber.  Only articles published after this call
    /// returns are delivered; there is no replay.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (article_tx, article_rx) = bounded::<Article>(self.cfg.subscriber_capacity.max(1));

        // Blocking send: a registration must not be lost, and the dispatcher
        // never blocks, so the queue drains promptly.
        if self
            .tx
            .send(DispatchMsg::Register { id, tx: article_tx })
            .is_err()
        {
            warn!(%id, "publisher dispatcher is gone; subscription will never receive");
        }

        Subscription {
            id,
            rx: article_rx,
            control_tx: self.tx.clone(),
            unregistered: AtomicBool::new(false),
        }
    }

    /// Remove a registration.  Unknown or already-removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let _ = self.tx.send(DispatchMsg::Unregister { id });
    }

    /// Hand a batch to the dispatcher without blocking.
    ///
    /// Returns `false` (and counts a dropped batch) when the dispatch queue is
    /// full.
    pub fn publish(&self, batch: Vec<Article>) -> bool {
        if batch.is_empty() {
            return true;
        }
        match self.tx.try_send(DispatchMsg::Batch(batch.into())) {
            Ok(()) => {
                self.counters.batches_published.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped_batches.fetch_add(1, Ordering::Relaxed);
                warn!("publisher dispatch queue full; dropping batch");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.dropped_batches.fetch_add(1, Ordering::Relaxed);
                warn!("publisher dispatcher has exited; dropping batch");
                false
            }
        }
    }

    pub fn stats(&self) -> PublisherStats {
        PublisherStats {
            subscribers: self.counters.subscribers.load(Ordering::Relaxed),
            batches_published: self.counters.batches_published.load(Ordering::Relaxed),
            articles_delivered: self.counters.articles_delivered.load(Ordering::Relaxed),
            dropped_articles: self.counters.dropped_articles.load(Ordering::Relaxed),
            dropped_batches: self.counters.dropped_batches.load(Ordering::Relaxed),
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        let _ = self.tx.send(DispatchMsg::Shutdown);
        if let Ok(mut guard) = self.join.lock() {
            if let Some(join) = guard.take() {
                let _ = join.join();
            }
        }
    }
}

fn dispatch_loop(rx: Receiver<DispatchMsg>, counters: Arc<Counters>) {
    let mut subscribers: HashMap<SubscriptionId, Sender<Article>> = HashMap::new();

    for msg in rx.iter() {
        match msg {
            DispatchMsg::Register { id, tx } => {
                subscribers.insert(id, tx);
                debug!(%id, "subscriber registered");
            }
            DispatchMsg::Unregister { id } => {
                if subscribers.remove(&id).is_some() {
                    debug!(%id, "subscriber removed");
                }
            }
            DispatchMsg::Batch(batch) => {
                subscribers.retain(|id, tx| deliver(*id, tx, &batch, &counters));
            }
            DispatchMsg::Shutdown => break,
        }
        counters.subscribers.store(subscribers.len(), Ordering::Relaxed);
    }

    counters.subscribers.store(0, Ordering::Relaxed);
}

/// Push one batch into a subscriber's queue in feed order.  Returns `false`
/// when the subscriber has gone away.
fn deliver(id: SubscriptionId, tx: &Sender<Article>, batch: &[Article], counters: &Counters) -> bool {
    for article in batch {
        match tx.try_send(article.clone()) {
            Ok(()) => {
                counters.articles_delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) => {
                counters.dropped_articles.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(%id, "subscriber disconnected");
                return false;
            }
        }
    }
    true
}

/// Receiving end of one registration.
///
/// Dropping it unregisters the subscriber.
pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<Article>,
    control_tx: Sender<DispatchMsg>,
    unregistered: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Block until the next article arrives or the publisher shuts down.
    pub fn recv(&self) -> Option<Article> {
        self.rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Article> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<Article> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently buffered without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = Article> + '_ {
        self.rx.try_iter()
    }

    /// Idempotent unregistration.  Batches published after this returns are
    /// not delivered to this handle.
    pub fn unsubscribe(&self) {
        if self.unregistered.swap(true, Ordering::AcqRel) {
            return;
        }
        // Same queue as batches, so it cannot be reordered behind a later
        // publish.  Blocks only while the dispatcher drains a full queue.
        let _ = self
            .control_tx
            .send(DispatchMsg::Unregister { id: self.id });
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("buffered", &self.rx.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// In-process change-notice fan-out keyed by subject.
// Subscribers register bounded queues per connection; publish never waits on
// a slow consumer and a full queue drops the notice for that consumer only.
use ahash::RandomState;
use arc_swap::ArcSwap;
use hashbrown::HashMap;
use marquee_common::{EventKind, Notice, Subject};
use parking_lot::Mutex;
use slab::Slab;
use std::sync::{Arc, Weak};
use tokio::sync::{RwLock, mpsc};

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("queue capacity must be non-zero")]
    InvalidCapacity,
    #[error("connection is closed")]
    ConnectionClosed,
}

const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug)]
struct SubjectState {
    // Snapshot used by the publish hot path: lock-free read, no allocation.
    subscribers_snapshot: ArcSwap<Vec<SubscriberEntry>>,
    // Inner registry mutated only on subscribe/unsubscribe paths.
    subscribers: Mutex<Slab<mpsc::Sender<Notice>>>,
}

#[derive(Debug, Clone)]
struct SubscriberEntry {
    id: usize,
    sender: mpsc::Sender<Notice>,
}

impl SubjectState {
    fn new() -> Self {
        Self {
            subscribers_snapshot: ArcSwap::from_pointee(Vec::new()),
            subscribers: Mutex::new(Slab::new()),
        }
    }

    fn register_subscriber(&self, sender: mpsc::Sender<Notice>) -> usize {
        let mut senders = self.subscribers.lock();
        let id = senders.insert(sender);
        self.rebuild_snapshot(&senders);
        id
    }

    fn remove_subscriber(&self, id: usize) {
        let mut senders = self.subscribers.lock();
        if senders.contains(id) {
            senders.remove(id);
            self.rebuild_snapshot(&senders);
        }
    }

    fn remove_subscribers(&self, ids: &[usize]) {
        let mut senders = self.subscribers.lock();
        let mut removed = false;
        for id in ids {
            if senders.contains(*id) {
                senders.remove(*id);
                removed = true;
            }
        }
        if removed {
            self.rebuild_snapshot(&senders);
        }
    }

    #[inline]
    fn snapshot(&self) -> Arc<Vec<SubscriberEntry>> {
        self.subscribers_snapshot.load_full()
    }

    fn rebuild_snapshot(&self, senders: &Slab<mpsc::Sender<Notice>>) {
        let mut snapshot = Vec::with_capacity(senders.len());
        for (id, sender) in senders.iter() {
            snapshot.push(SubscriberEntry {
                id,
                sender: sender.clone(),
            });
        }
        self.subscribers_snapshot.store(Arc::new(snapshot));
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// RAII handle that unregisters one subject subscription on drop.
#[derive(Debug)]
struct SubscriptionGuard {
    subject_state: Weak<SubjectState>,
    subscriber_id: usize,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(subject_state) = self.subject_state.upgrade() {
            subject_state.remove_subscriber(self.subscriber_id);
        }
    }
}

/// Lifecycle of a consumer connection.
///
/// `Connecting` until the first subject is attached, `Subscribed` while at
/// least one subscribe has happened, `Closed` once released. `Closed` is
/// terminal; there is no transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Subscribed,
    Closed,
}

/// One consumer's end of the fan-out.
///
/// All subjects a connection subscribes to feed a single bounded queue, so
/// notices for any one subject are observed in publish order. Dropping the
/// connection releases every subscription.
#[derive(Debug)]
pub struct Connection {
    receiver: mpsc::Receiver<Notice>,
    // Cloned into each subject registry on subscribe; taken on close so the
    // channel can drain to completion.
    sender: Option<mpsc::Sender<Notice>>,
    guards: Vec<SubscriptionGuard>,
    state: ConnectionState,
}

impl Connection {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    pub async fn recv(&mut self) -> Option<Notice> {
        if self.is_closed() {
            return None;
        }
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> std::result::Result<Notice, mpsc::error::TryRecvError> {
        if self.is_closed() {
            return Err(mpsc::error::TryRecvError::Disconnected);
        }
        self.receiver.try_recv()
    }

    /// Release every subscription. Idempotent and never blocks; queued
    /// notices that were not yet consumed are discarded.
    pub fn close(&mut self) {
        self.guards.clear();
        self.sender = None;
        self.state = ConnectionState::Closed;
    }
}

/// Subject-keyed notice hub.
///
/// ```
/// use marquee_common::{EventKind, Notice, Subject, ids::MenuId};
/// use marquee_notify::Notifier;
///
/// let rt = tokio::runtime::Runtime::new().expect("rt");
/// rt.block_on(async {
///     let notifier = Notifier::new();
///     let mut conn = notifier.connection();
///     let subject = Subject::menu(MenuId::new(1));
///     notifier.subscribe(&mut conn, subject.clone()).await.expect("subscribe");
///     notifier.publish(&subject, EventKind::MenuUpdated).await;
///     let notice = conn.recv().await.expect("recv");
///     assert_eq!(notice, Notice::menu_updated(MenuId::new(1)));
/// });
/// ```
#[derive(Debug)]
pub struct Notifier {
    // Map of subject -> live subscriber registry. Entries are created on
    // first subscribe and pruned once the last subscriber is gone.
    subjects: RwLock<HashMap<Subject, Arc<SubjectState>, RandomState>>,
    // Per-connection bounded queue depth.
    queue_capacity: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            subjects: RwLock::new(HashMap::with_hasher(RandomState::new())),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(NotifyError::InvalidCapacity);
        }
        self.queue_capacity = capacity;
        Ok(self)
    }

    /// Open a consumer connection with its own bounded queue.
    pub fn connection(&self) -> Connection {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        Connection {
            receiver,
            sender: Some(sender),
            guards: Vec::new(),
            state: ConnectionState::Connecting,
        }
    }

    /// Attach the connection to a subject. Duplicate subscriptions are
    /// accepted; each one just delivers into the same queue.
    pub async fn subscribe(&self, connection: &mut Connection, subject: Subject) -> Result<()> {
        let sender = connection
            .sender
            .as_ref()
            .ok_or(NotifyError::ConnectionClosed)?
            .clone();
        // Register while still holding the map lock: `prune_if_empty` also
        // takes it, so an empty entry cannot be pruned between the lookup
        // and the registration.
        let (subject_state, subscriber_id) = {
            let mut subjects = self.subjects.write().await;
            let subject_state = Arc::clone(subjects.entry(subject).or_insert_with(|| {
                let state = Arc::new(SubjectState::new());
                metrics::gauge!("marquee_notify_subjects").increment(1.0);
                state
            }));
            let subscriber_id = subject_state.register_subscriber(sender);
            (subject_state, subscriber_id)
        };
        connection.guards.push(SubscriptionGuard {
            subject_state: Arc::downgrade(&subject_state),
            subscriber_id,
        });
        connection.state = ConnectionState::Subscribed;
        Ok(())
    }

    /// Fan a notice out to the subject's current subscribers.
    ///
    /// Never blocks: a full queue drops the notice for that subscriber only,
    /// a closed queue unregisters the subscriber. Returns the number of
    /// queues the notice actually landed in.
    pub async fn publish(&self, subject: &Subject, kind: EventKind) -> usize {
        let Some(subject_state) = self.subjects.read().await.get(subject).cloned() else {
            return 0;
        };

        let notice = Notice {
            kind,
            subject: subject.clone(),
        };
        let snapshot = subject_state.snapshot();
        let mut closed_subscribers = Vec::new();
        let mut sent = 0usize;
        for subscriber in snapshot.iter() {
            match subscriber.sender.try_reserve() {
                Ok(permit) => {
                    permit.send(notice.clone());
                    sent += 1;
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    metrics::counter!("marquee_notify_dropped_total").increment(1);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed_subscribers.push(subscriber.id);
                }
            }
        }

        if !closed_subscribers.is_empty() {
            closed_subscribers.sort_unstable();
            closed_subscribers.dedup();
            subject_state.remove_subscribers(&closed_subscribers);
        }
        if subject_state.subscriber_count() == 0 {
            self.prune_if_empty(subject).await;
        }
        metrics::counter!("marquee_notify_published_total").increment(1);
        sent
    }

    pub async fn subscriber_count(&self, subject: &Subject) -> usize {
        match self.subjects.read().await.get(subject) {
            Some(state) => state.subscriber_count(),
            None => 0,
        }
    }

    pub async fn subject_count(&self) -> usize {
        self.subjects.read().await.len()
    }

    async fn prune_if_empty(&self, subject: &Subject) {
        let mut subjects = self.subjects.write().await;
        // Re-check under the write lock; a subscriber may have raced in.
        let empty = subjects
            .get(subject)
            .is_some_and(|state| state.subscriber_count() == 0);
        if empty {
            subjects.remove(subject);
            metrics::gauge!("marquee_notify_subjects").decrement(1.0);
        }
    }
}

//! # Subscriber Sets
//!
//! Ordered lists of callbacks interested in one variant, or in every variant of
//! a group.
//!
//! Sets are copy-on-write: `add` and `remove` swap in a new list under a short
//! write lock, while delivery clones the current `Arc` and iterates it with no
//! lock held. A callback added during a delivery pass may or may not see that
//! pass; the list itself is never observed half-updated.
//!
//! Each callback runs in isolation. An `Err` (or, when enabled, a panic) from one
//! subscriber is logged and counted, and delivery continues with the next.

use crate::error::constants::{
    ERR_SUBSCRIBERS_READ_LOCK, ERR_SUBSCRIBERS_WRITE_LOCK, ERR_SUBSCRIBER_PANICKED,
};
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::GroupId;
use crate::protocol::event_group::{EventGroup, Variant};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{error, warn};

/// Callback invoked with every delivered value of a group.
pub type Callback<G> = dyn Fn(&G) -> Result<()> + Send + Sync + 'static;

/// What a subscription is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionTarget {
    /// One variant, by kind
    Variant(u64),
    /// Every variant of the group
    Group,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub group: GroupId,
    pub target: SubscriptionTarget,
    pub seq: u64,
}

/// How callbacks are isolated during delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// Contain panicking callbacks with `catch_unwind`
    pub catch_panics: bool,
    /// Log each failed callback at `warn`
    pub log_failures: bool,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            catch_panics: true,
            log_failures: true,
        }
    }
}

/// Outcome of delivering one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub group: &'static str,
    pub kind: u64,
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    fn new(group: &'static str, kind: u64) -> Self {
        Self {
            group,
            kind,
            delivered: 0,
            failed: 0,
        }
    }

    /// Total callbacks invoked.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

struct Entry<G> {
    seq: u64,
    callback: Arc<Callback<G>>,
}

impl<G> Clone for Entry<G> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Copy-on-write list of callbacks, kept in subscription order.
pub struct SubscriberSet<G> {
    entries: RwLock<Arc<Vec<Entry<G>>>>,
}

impl<G> Default for SubscriberSet<G> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }
}

impl<G: 'static> SubscriberSet<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback under sequence number `seq`.
    pub fn add(&self, seq: u64, callback: Arc<Callback<G>>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| {
            error!("{ERR_SUBSCRIBERS_WRITE_LOCK}");
            ProtocolError::LockPoisoned
        })?;
        Arc::make_mut(&mut entries).push(Entry { seq, callback });
        Ok(())
    }

    /// Remove the callback registered under `seq`. Returns whether one was found.
    pub fn remove(&self, seq: u64) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| {
            error!("{ERR_SUBSCRIBERS_WRITE_LOCK}");
            ProtocolError::LockPoisoned
        })?;
        let Some(position) = entries.iter().position(|entry| entry.seq == seq) else {
            return Ok(false);
        };
        Arc::make_mut(&mut entries).remove(position);
        Ok(true)
    }

    fn snapshot(&self) -> Result<Arc<Vec<Entry<G>>>> {
        let entries = self.entries.read().map_err(|_| {
            error!("{ERR_SUBSCRIBERS_READ_LOCK}");
            ProtocolError::LockPoisoned
        })?;
        Ok(Arc::clone(&entries))
    }

    pub fn len(&self) -> usize {
        self.snapshot().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback in subscription order, accumulating into `report`.
    pub fn deliver(
        &self,
        value: &G,
        policy: DeliveryPolicy,
        report: &mut DeliveryReport,
    ) -> Result<()> {
        let entries = self.snapshot()?;
        for entry in entries.iter() {
            match invoke(&*entry.callback, value, policy) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    if policy.log_failures {
                        warn!(
                            group = report.group,
                            kind = report.kind,
                            subscriber = entry.seq,
                            error = %err,
                            "Subscriber failed"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn invoke<G>(callback: &Callback<G>, value: &G, policy: DeliveryPolicy) -> Result<()> {
    if !policy.catch_panics {
        return callback(value);
    }
    panic::catch_unwind(AssertUnwindSafe(|| callback(value)))
        .unwrap_or_else(|payload| Err(ProtocolError::Subscriber(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("{ERR_SUBSCRIBER_PANICKED}: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("{ERR_SUBSCRIBER_PANICKED}: {message}")
    } else {
        ERR_SUBSCRIBER_PANICKED.to_string()
    }
}

/// Every subscriber set of one registered group: one per declared kind, plus
/// the group-wide set.
pub struct GroupSubscribers<G> {
    group: GroupId,
    variants: Vec<SubscriberSet<G>>,
    all: SubscriberSet<G>,
    next_seq: AtomicU64,
}

impl<G: EventGroup> GroupSubscribers<G> {
    pub fn new(group: GroupId, variant_count: usize) -> Self {
        Self {
            group,
            variants: (0..variant_count).map(|_| SubscriberSet::new()).collect(),
            all: SubscriberSet::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    fn variant_set(&self, kind: u64) -> Option<&SubscriberSet<G>> {
        usize::try_from(kind).ok().and_then(|i| self.variants.get(i))
    }

    fn next_id(&self, target: SubscriptionTarget) -> SubscriptionId {
        SubscriptionId {
            group: self.group,
            target,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Subscribe to one variant. The callback only ever sees values of `V`.
    pub fn subscribe_variant<V, F>(&self, callback: F) -> Result<SubscriptionId>
    where
        V: Variant<Group = G>,
        F: Fn(&V) -> Result<()> + Send + Sync + 'static,
    {
        let set = self
            .variant_set(V::KIND)
            .ok_or(ProtocolError::KindOutOfRange {
                group: G::NAME,
                kind: V::KIND,
                variants: self.variants.len(),
            })?;
        let id = self.next_id(SubscriptionTarget::Variant(V::KIND));
        let callback: Arc<Callback<G>> = Arc::new(move |value: &G| match V::from_group(value) {
            Some(variant) => callback(variant),
            None => Ok(()),
        });
        set.add(id.seq, callback)?;
        Ok(id)
    }

    /// Subscribe to every variant of the group.
    pub fn subscribe_all<F>(&self, callback: F) -> Result<SubscriptionId>
    where
        F: Fn(&G) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id(SubscriptionTarget::Group);
        self.all.add(id.seq, Arc::new(callback))?;
        Ok(id)
    }

    pub fn unsubscribe(&self, target: SubscriptionTarget, seq: u64) -> Result<bool> {
        match target {
            SubscriptionTarget::Variant(kind) => match self.variant_set(kind) {
                Some(set) => set.remove(seq),
                None => Ok(false),
            },
            SubscriptionTarget::Group => self.all.remove(seq),
        }
    }

    /// Number of callbacks that would see a value of `kind`.
    pub fn subscriber_count(&self, kind: u64) -> usize {
        self.variant_set(kind).map_or(0, SubscriberSet::len) + self.all.len()
    }

    /// Deliver to the variant's subscribers, then to the group-wide ones.
    pub fn deliver(&self, value: &G, policy: DeliveryPolicy) -> Result<DeliveryReport> {
        let kind = value.kind();
        let mut report = DeliveryReport::new(G::NAME, kind);
        if let Some(set) = self.variant_set(kind) {
            set.deliver(value, policy, &mut report)?;
        }
        self.all.deliver(value, policy, &mut report)?;
        Ok(report)
    }
}

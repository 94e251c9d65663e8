//! # Dispatch Table
//!
//! Maps runtime group identifiers to registered event groups and routes decoded
//! values to their subscribers.
//!
//! Registration happens on a [`DispatchTableBuilder`]. `build` freezes the group
//! map into a [`DispatchTable`], so lookups on the hot path take no lock. Only the
//! subscriber sets stay mutable, and those are copy-on-write.
//!
//! ```rust
//! use eventwire::event_group;
//! use eventwire::protocol::dispatcher::DispatchTableBuilder;
//!
//! event_group! {
//!     pub enum ChatEvent {
//!         Say { text: String },
//!     }
//! }
//!
//! let mut builder = DispatchTableBuilder::new();
//! builder.register::<ChatEvent>(7).unwrap();
//! let table = builder.build();
//!
//! table.subscribe::<Say, _>(|say| {
//!     println!("{}", say.text);
//!     Ok(())
//! }).unwrap();
//!
//! let (group, bytes) = table.to_vec(&ChatEvent::from(Say { text: "Hi".into() })).unwrap();
//! let report = table.dispatch_incoming(group, &bytes).unwrap();
//! assert_eq!(report.delivered, 1);
//! ```

use crate::config::EventwireConfig;
use crate::core::codec::DecodeLimits;
use crate::error::constants::{ERR_MALFORMED_MESSAGE, ERR_UNKNOWN_GROUP, ERR_UNKNOWN_VARIANT};
use crate::error::{ProtocolError, Result};
use crate::protocol::event_group::{EventGroup, GroupCodec, Variant};
use crate::protocol::subscribers::{
    DeliveryPolicy, DeliveryReport, GroupSubscribers, SubscriptionId,
};
use crate::utils::metrics::DispatchMetrics;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Out-of-band identifier of a registered event group.
pub type GroupId = u32;

/// Group-specific operations behind a type-erased table entry.
trait ErasedGroup: Send + Sync {
    fn name(&self) -> &'static str;

    fn dispatch(
        &self,
        bytes: &[u8],
        limits: DecodeLimits,
        policy: DeliveryPolicy,
    ) -> Result<DeliveryReport>;

    fn unsubscribe(&self, id: &SubscriptionId) -> Result<bool>;

    fn as_any(&self) -> &dyn Any;
}

struct GroupEntry<G: EventGroup> {
    codec: GroupCodec<G>,
    subscribers: GroupSubscribers<G>,
}

impl<G: EventGroup> ErasedGroup for GroupEntry<G> {
    fn name(&self) -> &'static str {
        G::NAME
    }

    fn dispatch(
        &self,
        bytes: &[u8],
        limits: DecodeLimits,
        policy: DeliveryPolicy,
    ) -> Result<DeliveryReport> {
        let value = self.codec.from_bytes_with_limits(bytes, limits)?;
        self.subscribers.deliver(&value, policy)
    }

    fn unsubscribe(&self, id: &SubscriptionId) -> Result<bool> {
        self.subscribers.unsubscribe(id.target, id.seq)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Collects group registrations before the table is frozen.
pub struct DispatchTableBuilder {
    groups: HashMap<GroupId, Box<dyn ErasedGroup>>,
    by_type: HashMap<TypeId, GroupId>,
    configured: HashMap<String, GroupId>,
    limits: DecodeLimits,
    policy: DeliveryPolicy,
}

impl Default for DispatchTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTableBuilder {
    /// Builder with unbounded decode limits and the default delivery policy.
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            by_type: HashMap::new(),
            configured: HashMap::new(),
            limits: DecodeLimits::UNBOUNDED,
            policy: DeliveryPolicy::default(),
        }
    }

    /// Builder taking decode limits, delivery policy and group identifiers from
    /// `config`. The configuration is validated first.
    pub fn with_config(config: &EventwireConfig) -> Result<Self> {
        config.validate_strict()?;
        Ok(Self {
            configured: config
                .dispatch
                .groups
                .iter()
                .map(|(name, id)| (name.clone(), *id))
                .collect(),
            limits: config.codec.limits(),
            policy: config.dispatch.policy(),
            ..Self::new()
        })
    }

    pub fn limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register `G` under `id`.
    ///
    /// Registering the same group under the same identifier again is a no-op.
    /// Reusing an identifier for another group fails with
    /// [`ProtocolError::DuplicateGroup`]; registering a group under a second
    /// identifier fails with [`ProtocolError::DuplicateGroupType`]. The group's
    /// schema is validated here.
    pub fn register<G: EventGroup>(&mut self, id: GroupId) -> Result<&mut Self> {
        if let Some(&existing) = self.by_type.get(&TypeId::of::<G>()) {
            if existing == id {
                return Ok(self);
            }
            return Err(ProtocolError::DuplicateGroupType(G::NAME));
        }
        if self.groups.contains_key(&id) {
            return Err(ProtocolError::DuplicateGroup(id));
        }

        let codec = GroupCodec::<G>::new()?;
        let subscribers = GroupSubscribers::new(id, codec.schema().variant_count());
        debug!(
            group = G::NAME,
            id,
            variants = codec.schema().variant_count(),
            width = %codec.width(),
            "Registered event group"
        );
        self.groups
            .insert(id, Box::new(GroupEntry { codec, subscribers }));
        self.by_type.insert(TypeId::of::<G>(), id);
        Ok(self)
    }

    /// Register `G` under the next unused identifier, counting up from 0 in
    /// registration order.
    pub fn register_next<G: EventGroup>(&mut self) -> Result<GroupId> {
        if let Some(&existing) = self.by_type.get(&TypeId::of::<G>()) {
            return Ok(existing);
        }
        let id = self.groups.keys().max().map_or(0, |max| max.saturating_add(1));
        self.register::<G>(id)?;
        Ok(id)
    }

    /// Register `G` under the identifier configured for its name in
    /// `[dispatch.groups]`.
    pub fn register_configured<G: EventGroup>(&mut self) -> Result<GroupId> {
        let id = *self.configured.get(G::NAME).ok_or_else(|| {
            ProtocolError::ConfigError(format!(
                "No identifier configured for event group {}",
                G::NAME
            ))
        })?;
        self.register::<G>(id)?;
        Ok(id)
    }

    /// Freeze the registrations.
    pub fn build(self) -> DispatchTable {
        info!(groups = self.groups.len(), "Dispatch table built");
        DispatchTable {
            groups: self.groups,
            by_type: self.by_type,
            limits: self.limits,
            policy: self.policy,
            metrics: DispatchMetrics::new(),
        }
    }
}

/// Immutable group map with mutable subscriber sets.
///
/// `DispatchTable` is `Send + Sync`; share it behind an `Arc`.
pub struct DispatchTable {
    groups: HashMap<GroupId, Box<dyn ErasedGroup>>,
    by_type: HashMap<TypeId, GroupId>,
    limits: DecodeLimits,
    policy: DeliveryPolicy,
    metrics: DispatchMetrics,
}

impl DispatchTable {
    fn entry<G: EventGroup>(&self) -> Result<(GroupId, &GroupEntry<G>)> {
        let id = self.group_id::<G>().ok_or(ProtocolError::GroupNotRegistered(G::NAME))?;
        self.groups
            .get(&id)
            .and_then(|group| group.as_any().downcast_ref::<GroupEntry<G>>())
            .map(|entry| (id, entry))
            .ok_or(ProtocolError::GroupNotRegistered(G::NAME))
    }

    /// Decode one message of group `id` and deliver it.
    ///
    /// `bytes` must hold exactly one message: the kind followed by the variant's
    /// fields. Unknown groups, unknown kinds and malformed fields drop the message
    /// and return the error; none of them affect later calls.
    #[instrument(level = "trace", skip(self, bytes), fields(len = bytes.len()))]
    pub fn dispatch_incoming(&self, id: GroupId, bytes: &[u8]) -> Result<DeliveryReport> {
        self.metrics.message_received(bytes.len());

        let Some(group) = self.groups.get(&id) else {
            self.metrics.unknown_group();
            warn!(group_id = id, "{ERR_UNKNOWN_GROUP}");
            return Err(ProtocolError::UnknownGroup(id));
        };

        match group.dispatch(bytes, self.limits, self.policy) {
            Ok(report) => {
                self.metrics.delivery(&report);
                Ok(report)
            }
            Err(err @ ProtocolError::UnknownVariant { .. }) => {
                self.metrics.unknown_variant();
                warn!(group = group.name(), group_id = id, error = %err, "{ERR_UNKNOWN_VARIANT}");
                Err(err)
            }
            Err(err) => {
                self.metrics.decode_error();
                warn!(group = group.name(), group_id = id, error = %err, "{ERR_MALFORMED_MESSAGE}");
                Err(err)
            }
        }
    }

    /// Deliver a locally constructed value without going through bytes.
    pub fn publish<G: EventGroup>(&self, value: &G) -> Result<DeliveryReport> {
        let (_, entry) = self.entry::<G>()?;
        let kind = value.kind();
        if !entry.codec.schema().is_registered(kind) {
            return Err(ProtocolError::KindOutOfRange {
                group: G::NAME,
                kind,
                variants: entry.codec.schema().variant_count(),
            });
        }
        self.metrics.message_published();
        let report = entry.subscribers.deliver(value, self.policy)?;
        self.metrics.delivery(&report);
        Ok(report)
    }

    pub fn publish_variant<V: Variant>(&self, value: V) -> Result<DeliveryReport> {
        self.publish(&value.into_group())
    }

    /// Subscribe to variant `V`.
    pub fn subscribe<V, F>(&self, callback: F) -> Result<SubscriptionId>
    where
        V: Variant,
        F: Fn(&V) -> Result<()> + Send + Sync + 'static,
    {
        let (_, entry) = self.entry::<V::Group>()?;
        entry.subscribers.subscribe_variant::<V, F>(callback)
    }

    /// Subscribe to every variant of group `G`.
    pub fn subscribe_group<G, F>(&self, callback: F) -> Result<SubscriptionId>
    where
        G: EventGroup,
        F: Fn(&G) -> Result<()> + Send + Sync + 'static,
    {
        let (_, entry) = self.entry::<G>()?;
        entry.subscribers.subscribe_all(callback)
    }

    /// Remove a subscription. Returns whether it was still present.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> Result<bool> {
        match self.groups.get(&id.group) {
            Some(group) => group.unsubscribe(id),
            None => Ok(false),
        }
    }

    /// Codec of a registered group.
    pub fn codec<G: EventGroup>(&self) -> Result<&GroupCodec<G>> {
        self.entry::<G>().map(|(_, entry)| &entry.codec)
    }

    /// Serialize `value` into `buffer`, returning its group identifier and the
    /// number of bytes written.
    pub fn encode<G: EventGroup>(&self, value: &G, buffer: &mut [u8]) -> Result<(GroupId, usize)> {
        let (id, entry) = self.entry::<G>()?;
        Ok((id, entry.codec.serialize_into(value, buffer)?))
    }

    pub fn to_vec<G: EventGroup>(&self, value: &G) -> Result<(GroupId, Vec<u8>)> {
        let (id, entry) = self.entry::<G>()?;
        Ok((id, entry.codec.to_vec(value)?))
    }

    pub fn group_id<G: EventGroup>(&self) -> Option<GroupId> {
        self.by_type.get(&TypeId::of::<G>()).copied()
    }

    pub fn group_name(&self, id: GroupId) -> Option<&'static str> {
        self.groups.get(&id).map(|group| group.name())
    }

    /// Registered identifiers in ascending order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<_> = self.groups.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}

//! Shared broadcast registry.
//!
//! Two concurrent maps, shared between orchestrators behind an `Arc`:
//!
//! - `broadcasts`: TxId → state. A transaction is broadcast at most once per
//!   process; a second attempt with the same signed bytes is answered from
//!   the registry, or waits for the attempt already in flight to settle.
//! - `slots`: (source, tick) → TxId. One submission per source per tick; a
//!   second submission from the same source moves to the next free tick.
//!
//! `DashMap` shards its locks, so unrelated submissions never contend.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;

use crate::crypto::keys::PublicKey;
use crate::transaction::{TickNumber, TxId};
use crate::transport::BroadcastReceipt;

/// Where a transaction stands in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastState {
    /// Some orchestrator is broadcasting it right now.
    InFlight,
    /// The remote accepted it.
    Done(BroadcastReceipt),
}

/// How an in-flight broadcast ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Pending,
    Accepted(BroadcastReceipt),
    Released,
}

#[derive(Debug)]
enum Tracked {
    InFlight(watch::Sender<Settlement>),
    Done(BroadcastReceipt),
}

impl Tracked {
    fn state(&self) -> BroadcastState {
        match self {
            Self::InFlight(_) => BroadcastState::InFlight,
            Self::Done(receipt) => BroadcastState::Done(*receipt),
        }
    }
}

/// Result of [`BroadcastRegistry::claim`].
#[derive(Debug)]
pub enum Claim {
    /// The caller owns the broadcast and must `complete` or `release` it.
    Acquired,
    /// Another caller is broadcasting it; wait on the handle before polling.
    InFlight(BroadcastWaiter),
    /// The remote already accepted it.
    Done(BroadcastReceipt),
}

/// Resolves once the owner of an in-flight broadcast completes or releases
/// it.
#[derive(Debug)]
pub struct BroadcastWaiter {
    settlement: watch::Receiver<Settlement>,
}

impl BroadcastWaiter {
    /// The receipt if the owner's broadcast was accepted, `None` if the claim
    /// was released and the transaction never reached the remote.
    pub async fn settled(mut self) -> Option<BroadcastReceipt> {
        loop {
            match *self.settlement.borrow_and_update() {
                Settlement::Accepted(receipt) => return Some(receipt),
                Settlement::Released => return None,
                Settlement::Pending => {}
            }
            if self.settlement.changed().await.is_err() {
                // Owner gone without settling.
                return match *self.settlement.borrow() {
                    Settlement::Accepted(receipt) => Some(receipt),
                    _ => None,
                };
            }
        }
    }
}

/// Process-wide dedup and slot bookkeeping.
#[derive(Debug, Default)]
pub struct BroadcastRegistry {
    broadcasts: DashMap<TxId, Tracked>,
    slots: DashMap<(PublicKey, TickNumber), TxId>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim the right to broadcast `id`.
    pub fn claim(&self, id: TxId) -> Claim {
        match self.broadcasts.entry(id) {
            Entry::Occupied(existing) => match existing.get() {
                Tracked::InFlight(owner) => Claim::InFlight(BroadcastWaiter {
                    settlement: owner.subscribe(),
                }),
                Tracked::Done(receipt) => Claim::Done(*receipt),
            },
            Entry::Vacant(slot) => {
                let (owner, _) = watch::channel(Settlement::Pending);
                slot.insert(Tracked::InFlight(owner));
                Claim::Acquired
            }
        }
    }

    /// Record a successful broadcast and wake anyone waiting on it.
    pub fn complete(&self, id: TxId, receipt: BroadcastReceipt) {
        if let Some(Tracked::InFlight(owner)) = self.broadcasts.insert(id, Tracked::Done(receipt)) {
            owner.send_replace(Settlement::Accepted(receipt));
        }
    }

    /// Drop a claim whose broadcast failed, so a later attempt may retry.
    /// Waiters are told the transaction was never sent. Completed broadcasts
    /// are never released.
    pub fn release(&self, id: &TxId) {
        let removed = self
            .broadcasts
            .remove_if(id, |_, tracked| matches!(tracked, Tracked::InFlight(_)));
        if let Some((_, Tracked::InFlight(owner))) = removed {
            owner.send_replace(Settlement::Released);
        }
    }

    /// State of `id`, if known.
    pub fn state(&self, id: &TxId) -> Option<BroadcastState> {
        self.broadcasts.get(id).map(|entry| entry.state())
    }

    /// Receipt of a completed broadcast.
    pub fn receipt(&self, id: &TxId) -> Option<BroadcastReceipt> {
        match self.state(id)? {
            BroadcastState::Done(receipt) => Some(receipt),
            BroadcastState::InFlight => None,
        }
    }

    /// Reserve the first free tick in `preferred..preferred + max_probes`
    /// for `source`. The slot is recorded against `placeholder` until
    /// [`Self::bind_slot`] attaches the real transaction ID.
    pub fn reserve_slot(
        &self,
        source: &PublicKey,
        preferred: TickNumber,
        max_probes: u32,
        placeholder: TxId,
    ) -> Option<TickNumber> {
        (0..max_probes)
            .map_while(|offset| preferred.checked_add(offset))
            .find(|tick| match self.slots.entry((*source, *tick)) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(placeholder);
                    true
                }
            })
    }

    /// Attach the signed transaction's ID to a reserved slot.
    pub fn bind_slot(&self, source: &PublicKey, tick: TickNumber, id: TxId) {
        if let Some(mut slot) = self.slots.get_mut(&(*source, tick)) {
            *slot = id;
        }
    }

    /// Give a slot back (the submission ended before anything was sent).
    pub fn release_slot(&self, source: &PublicKey, tick: TickNumber) {
        self.slots.remove(&(*source, tick));
    }

    /// The transaction holding a slot.
    pub fn slot_holder(&self, source: &PublicKey, tick: TickNumber) -> Option<TxId> {
        self.slots.get(&(*source, tick)).map(|entry| *entry)
    }

    /// Forget slots for ticks the network has already passed.
    pub fn prune_slots_before(&self, tick: TickNumber) -> usize {
        let before = self.slots.len();
        self.slots.retain(|(_, slot_tick), _| *slot_tick >= tick);
        before.saturating_sub(self.slots.len())
    }

    /// Number of known broadcasts (in flight or done).
    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.len()
    }

    /// Number of reserved slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

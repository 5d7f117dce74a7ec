// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wrapper registry.
//!
//! The registry associates `(owner, event type, original listener, options key)`
//! with the wrapper listener that was registered natively in its place. It
//! guarantees at most one wrapper per tuple and hands the exact same wrapper
//! instance back on removal, since native primitives compare listener identity.
//!
//! Owners are not owned by the registry. It keeps a [`Weak`] handle per owner
//! and reclaims the entries of owners that have been dropped, either on demand
//! through [`WrapperRegistry::prune`] or automatically when a new owner is
//! first seen and the number of tracked owners has doubled since the last
//! sweep. The weak handle keeps the owner's allocation reserved, so an owner
//! id is never reused while the registry still tracks it.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::fmt;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::listener::{Listener, ListenerId};
use crate::options::OptionsKey;

/// Identity of an owner object.
///
/// Derived from the address of the owner's `Rc` allocation, which the registry
/// keeps reserved through a [`Weak`] handle while it has entries for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(usize);

impl OwnerId {
    /// Returns the identity of `owner`.
    #[must_use]
    pub fn of<T: ?Sized>(owner: &Rc<T>) -> Self {
        Self(Rc::as_ptr(owner).cast::<()>().addr())
    }
}

/// Composite registry key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    /// The owner the listener was registered on.
    pub owner: OwnerId,
    /// The event type.
    pub event_type: String,
    /// The caller's original listener.
    pub listener: ListenerId,
    /// The canonical options key.
    pub options: OptionsKey,
}

impl RegistryKey {
    fn new(owner: OwnerId, event_type: &str, listener: ListenerId, options: OptionsKey) -> Self {
        Self {
            owner,
            event_type: event_type.into(),
            listener,
            options,
        }
    }
}

/// A registered wrapper and what it was registered with.
pub struct RegistryEntry<E> {
    wrapper: Listener<E>,
    original: Listener<E>,
    capture: bool,
}

impl<E> RegistryEntry<E> {
    /// The wrapper passed to native registration.
    #[must_use]
    pub fn wrapper(&self) -> &Listener<E> {
        &self.wrapper
    }

    /// The caller's original listener.
    #[must_use]
    pub fn original(&self) -> &Listener<E> {
        &self.original
    }

    /// The capture flag passed to native registration.
    #[must_use]
    pub fn capture(&self) -> bool {
        self.capture
    }
}

impl<E> fmt::Debug for RegistryEntry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("wrapper", &self.wrapper)
            .field("original", &self.original)
            .field("capture", &self.capture)
            .finish()
    }
}

/// Result of [`WrapperRegistry::get_or_create`].
#[derive(Debug)]
pub enum Registration<E> {
    /// A new wrapper was synthesized; the caller must register it natively.
    Created(Listener<E>),
    /// A wrapper already existed; it is already registered natively.
    Existing(Listener<E>),
}

impl<E> Registration<E> {
    /// The wrapper, new or existing.
    #[must_use]
    pub fn wrapper(&self) -> &Listener<E> {
        match self {
            Self::Created(wrapper) | Self::Existing(wrapper) => wrapper,
        }
    }

    /// Returns `true` if the wrapper was created by this call.
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Owner count below which registering a new owner never triggers a sweep.
const MIN_SWEEP_OWNERS: usize = 16;

struct OwnerSlot<T: ?Sized> {
    owner: Weak<T>,
    entries: usize,
}

/// Registry of wrapper listeners across owners.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use understory_listener_options::{Listener, OptionsKey, WrapperRegistry};
///
/// let owner = Rc::new(());
/// let listener = Listener::<()>::from_fn(|_| {});
/// let mut registry = WrapperRegistry::<(), ()>::new();
///
/// let first = registry.get_or_create(&owner, "click", &listener, OptionsKey::NO_CANCEL, || {
///     Listener::from_fn(|_| {})
/// });
/// let second = registry.get_or_create(&owner, "click", &listener, OptionsKey::NO_CANCEL, || {
///     unreachable!("the first wrapper is reused")
/// });
/// assert!(first.is_created());
/// assert!(!second.is_created());
/// assert!(first.wrapper().ptr_eq(second.wrapper()));
///
/// let entry = registry
///     .take_and_remove(&owner, "click", &listener, OptionsKey::NO_CANCEL)
///     .unwrap();
/// assert!(entry.wrapper().ptr_eq(first.wrapper()));
/// assert!(registry.is_empty());
/// ```
pub struct WrapperRegistry<T: ?Sized, E> {
    entries: HashMap<RegistryKey, RegistryEntry<E>>,
    owners: HashMap<OwnerId, OwnerSlot<T>>,
    /// Tracked owner count at which the next new owner triggers a sweep.
    sweep_at: usize,
    sweeps: usize,
}

impl<T: ?Sized, E> Default for WrapperRegistry<T, E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            owners: HashMap::new(),
            sweep_at: MIN_SWEEP_OWNERS,
            sweeps: 0,
        }
    }
}

impl<T: ?Sized, E> WrapperRegistry<T, E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, across all owners.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of owners with at least one entry.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of entries registered on `owner`.
    #[must_use]
    pub fn len_for(&self, owner: &Rc<T>) -> usize {
        self.owners
            .get(&OwnerId::of(owner))
            .map_or(0, |slot| slot.entries)
    }

    /// Looks up the entry for a tuple without modifying the registry.
    #[must_use]
    pub fn get(
        &self,
        owner: &Rc<T>,
        event_type: &str,
        listener: &Listener<E>,
        options: OptionsKey,
    ) -> Option<&RegistryEntry<E>> {
        let key = RegistryKey::new(OwnerId::of(owner), event_type, listener.id(), options);
        self.entries.get(&key)
    }

    /// Returns the wrapper for a tuple, synthesizing it with `factory` if absent.
    ///
    /// Repeated calls with the same tuple return the same wrapper instance until
    /// it is removed with [`take_and_remove`](Self::take_and_remove). The entry
    /// records the capture flag from `options` for native removal.
    pub fn get_or_create(
        &mut self,
        owner: &Rc<T>,
        event_type: &str,
        listener: &Listener<E>,
        options: OptionsKey,
        factory: impl FnOnce() -> Listener<E>,
    ) -> Registration<E> {
        let owner_id = OwnerId::of(owner);
        if !self.owners.contains_key(&owner_id) && self.owners.len() >= self.sweep_at {
            self.prune();
        }

        let key = RegistryKey::new(owner_id, event_type, listener.id(), options);
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => Registration::Existing(occupied.get().wrapper.clone()),
            Entry::Vacant(vacant) => {
                let wrapper = factory();
                vacant.insert(RegistryEntry {
                    wrapper: wrapper.clone(),
                    original: listener.clone(),
                    capture: options.contains(OptionsKey::CAPTURE),
                });
                self.owners
                    .entry(owner_id)
                    .or_insert_with(|| OwnerSlot {
                        owner: Rc::downgrade(owner),
                        entries: 0,
                    })
                    .entries += 1;
                Registration::Created(wrapper)
            }
        }
    }

    /// Removes and returns the entry for a tuple, if present.
    ///
    /// `None` means the tuple was never wrapped (or was already removed); the
    /// caller should then fall back to unregistering `listener` itself.
    pub fn take_and_remove(
        &mut self,
        owner: &Rc<T>,
        event_type: &str,
        listener: &Listener<E>,
        options: OptionsKey,
    ) -> Option<RegistryEntry<E>> {
        let owner_id = OwnerId::of(owner);
        let key = RegistryKey::new(owner_id, event_type, listener.id(), options);
        let entry = self.entries.remove(&key)?;
        if let Some(slot) = self.owners.get_mut(&owner_id) {
            slot.entries = slot.entries.saturating_sub(1);
            if slot.entries == 0 {
                self.owners.remove(&owner_id);
            }
        }
        Some(entry)
    }

    /// Drops every entry whose owner is no longer alive.
    ///
    /// Returns the number of entries reclaimed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.owners.retain(|_, slot| slot.owner.strong_count() > 0);
        let owners = &self.owners;
        self.entries.retain(|key, _| owners.contains_key(&key.owner));
        self.sweep_at = (self.owners.len() * 2).max(MIN_SWEEP_OWNERS);
        self.sweeps += 1;
        before - self.entries.len()
    }
}

impl<T: ?Sized, E> fmt::Debug for WrapperRegistry<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperRegistry")
            .field("entries", &self.entries.len())
            .field("owners", &self.owners.len())
            .field("sweeps", &self.sweeps)
            .finish_non_exhaustive()
    }
}

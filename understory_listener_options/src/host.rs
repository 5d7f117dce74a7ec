// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interfaces consumed from the host dispatch engine.
//!
//! This crate never dispatches events itself. A host exposes three things:
//!
//! - [`NativeTarget`]: the native registration and removal primitives of an
//!   event target (the "owner" of registered listeners).
//! - [`HostEvent`]: the native cancelable attribute, the native
//!   default-action suppression primitive, and an [`EmulationState`] slot that
//!   stands in for the event's extensible property bag.
//! - [`OptionsSource`]: the structured options argument, read field by field so
//!   a capability probe can observe which fields the host consults.

use core::cell::Cell;

use crate::listener::Listener;

/// A structured listener options argument as a native primitive reads it.
///
/// A host that only understands the capture flag calls [`capture`](Self::capture)
/// and never touches the other fields. A host with native support for an
/// option reads the corresponding field, which is what the capability probe
/// detects.
pub trait OptionsSource {
    /// The capture flag, if specified.
    fn capture(&self) -> Option<bool>;
    /// The may-cancel flag, if specified.
    fn may_cancel(&self) -> Option<bool>;
    /// The passive flag, if specified.
    fn passive(&self) -> Option<bool>;
}

/// Native listener registration primitives of a dispatch target.
///
/// Implementations are expected to compare listeners by [`Listener::id`] and to
/// treat removal of an unknown listener/capture pair as a silent no-op.
pub trait NativeTarget<E> {
    /// Registers `listener` for `event_type`.
    fn add_listener(&self, event_type: &str, listener: &Listener<E>, options: &dyn OptionsSource);

    /// Unregisters `listener` for `event_type` in the given capture phase.
    fn remove_listener(&self, event_type: &str, listener: &Listener<E>, capture: bool);
}

/// A host event as seen by the dispatch interceptor.
pub trait HostEvent {
    /// The event type, used for diagnostics.
    fn event_type(&self) -> &str;

    /// The native cancelable attribute.
    fn native_cancelable(&self) -> bool;

    /// The native default-action suppression primitive.
    fn native_prevent_default(&self);

    /// Per-event slot for the emulated attribute override and passive marker.
    fn emulation(&self) -> &EmulationState;

    /// The observable cancelable attribute, honoring an emulated override.
    fn cancelable(&self) -> bool {
        self.emulation()
            .cancelable_override()
            .unwrap_or_else(|| self.native_cancelable())
    }

    /// Whether the listener currently running was registered as passive.
    fn in_passive_listener(&self) -> bool {
        self.emulation().passive()
    }
}

/// Transient emulation state carried by an event.
///
/// Both fields are only set for the synchronous extent of one wrapped listener
/// invocation. An event that was never touched by a wrapper reports no
/// override and a cleared passive marker.
#[derive(Debug, Default)]
pub struct EmulationState {
    cancelable: Cell<Option<bool>>,
    passive: Cell<bool>,
}

impl EmulationState {
    /// Creates a cleared state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cancelable: Cell::new(None),
            passive: Cell::new(false),
        }
    }

    /// The emulated cancelable override, if one is active.
    #[must_use]
    #[inline]
    pub fn cancelable_override(&self) -> Option<bool> {
        self.cancelable.get()
    }

    /// The transient passive marker.
    #[must_use]
    #[inline]
    pub fn passive(&self) -> bool {
        self.passive.get()
    }

    /// Returns `true` when no override or marker is active.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.cancelable.get().is_none() && !self.passive.get()
    }

    pub(crate) fn replace_cancelable(&self, value: Option<bool>) -> Option<bool> {
        self.cancelable.replace(value)
    }

    pub(crate) fn replace_passive(&self, value: bool) -> bool {
        self.passive.replace(value)
    }
}

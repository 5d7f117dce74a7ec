// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch interception: the wrapper listener body and the suppression gate.
//!
//! An [`EmulatedListener`] stands in for the caller's listener at native
//! registration. Each time the host delivers an event to it, it opens a
//! [`DispatchScope`] on the event's [`EmulationState`], forwards the event to
//! the original listener, and closes the scope when the listener returns or
//! unwinds.
//!
//! Within a scope:
//!
//! - may-cancel emulation: if the event is natively cancelable, the observable
//!   cancelable attribute is overridden to `false`.
//! - passive emulation: the passive marker is set.
//!
//! [`suppress_default_action`] consults the same state: it ignores the call
//! (and emits a notice) when the marker is set or the effective cancelable
//! attribute is `false`, and delegates to the native primitive otherwise.
//!
//! ## Re-entrancy
//!
//! Scopes save the previous state on entry and put it back on exit, so strictly
//! nested dispatch of the same event through wrapped listeners observes the
//! innermost listener's flags and the outer listener's flags again afterwards.
//! A listener that was *not* wrapped and runs nested inside a wrapped one sees
//! the outer listener's flags; that interleaving is not supported.

use crate::diagnostics::{Diagnostics, IgnoredReason, Notice};
use crate::host::{EmulationState, HostEvent};
use crate::listener::{EventHandler, Listener};
use crate::options::OptionFlags;

/// Restores an event's emulation state when dropped.
#[derive(Debug)]
#[must_use = "the emulated flags are cleared as soon as the scope is dropped"]
pub struct DispatchScope<'a> {
    state: &'a EmulationState,
    prev_cancelable: Option<bool>,
    prev_passive: bool,
}

impl<'a> DispatchScope<'a> {
    /// Applies the `emulated` options to `event` until the scope is dropped.
    pub fn enter<E: HostEvent + ?Sized>(event: &'a E, emulated: OptionFlags) -> Self {
        let state = event.emulation();
        let forbid_cancel =
            emulated.contains(OptionFlags::MAY_CANCEL) && event.native_cancelable();
        let prev_cancelable = state.replace_cancelable(forbid_cancel.then_some(false));
        let prev_passive = state.replace_passive(emulated.contains(OptionFlags::PASSIVE));
        Self {
            state,
            prev_cancelable,
            prev_passive,
        }
    }
}

impl Drop for DispatchScope<'_> {
    fn drop(&mut self) {
        self.state.replace_cancelable(self.prev_cancelable);
        self.state.replace_passive(self.prev_passive);
    }
}

/// The synthesized wrapper listener.
pub struct EmulatedListener<E> {
    listener: Listener<E>,
    emulated: OptionFlags,
}

impl<E: HostEvent + 'static> EmulatedListener<E> {
    /// Wraps `listener`, emulating the given options around each delivery.
    #[must_use]
    pub fn new(listener: Listener<E>, emulated: OptionFlags) -> Self {
        Self { listener, emulated }
    }

    /// Converts the wrapper into a listener handle with its own identity.
    #[must_use]
    pub fn into_listener(self) -> Listener<E> {
        Listener::handler(self)
    }
}

impl<E> EmulatedListener<E> {
    /// The wrapped listener.
    #[must_use]
    pub fn original(&self) -> &Listener<E> {
        &self.listener
    }

    /// The options emulated around each delivery.
    #[must_use]
    pub fn emulated(&self) -> OptionFlags {
        self.emulated
    }
}

impl<E: HostEvent> EventHandler<E> for EmulatedListener<E> {
    fn handle_event(&self, event: &E) {
        let _scope = DispatchScope::enter(event, self.emulated);
        self.listener.invoke(event);
    }
}

impl<E> core::fmt::Debug for EmulatedListener<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EmulatedListener")
            .field("listener", &self.listener)
            .field("emulated", &self.emulated)
            .finish()
    }
}

/// Why `event` may not have its default action suppressed right now, if at all.
#[must_use]
pub fn suppression_blocked<E: HostEvent + ?Sized>(event: &E) -> Option<IgnoredReason> {
    if event.in_passive_listener() {
        Some(IgnoredReason::PassiveListener)
    } else if !event.cancelable() {
        Some(IgnoredReason::NotCancelable)
    } else {
        None
    }
}

/// The default-action suppression gate.
///
/// Returns `true` if the call was delegated to the native primitive. Otherwise
/// a [`Notice::SuppressionIgnored`] is sent to `diagnostics` and the default
/// action is left alone.
pub fn suppress_default_action<E: HostEvent + ?Sized>(
    event: &E,
    diagnostics: &dyn Diagnostics,
) -> bool {
    match suppression_blocked(event) {
        Some(reason) => {
            diagnostics.notice(Notice::SuppressionIgnored {
                event_type: event.event_type().into(),
                reason,
            });
            false
        }
        None => {
            event.native_prevent_default();
            true
        }
    }
}

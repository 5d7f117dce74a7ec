// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_listener_options --heading-base-level=0

//! Understory Listener Options: emulated may-cancel and passive listener options.
//!
//! ## Overview
//!
//! Some dispatch engines only understand a capture boolean when a listener is
//! registered, and silently ignore any richer option fields. This crate lets
//! code written against the richer options observe the same dispatch-time
//! behavior on such engines: a listener registered with `may_cancel: false` or
//! `passive: true` cannot suppress the default action of the events it
//! receives.
//!
//! It does not dispatch events. It interposes on three host primitives:
//! registration, removal, and default-action suppression. Delivery stays with
//! the host.
//!
//! ## Components
//!
//! - Capability probe ([`probe_native_support`]): runs once, when the adapter is
//!   built, and records which option fields the host's registration primitive
//!   reads. Options the host understands are never emulated; if it understands
//!   all of them the adapter is a pure pass-through.
//! - Option normalizer ([`normalize`]): turns an absent, boolean, or structured
//!   options argument into [`CanonicalOptions`] and an injective [`OptionsKey`].
//! - Wrapper registry ([`WrapperRegistry`]): at most one wrapper per
//!   `(owner, event type, listener, key)`, handed back verbatim on removal.
//! - Dispatch interceptor ([`EmulatedListener`]): sets the emulated flags on the
//!   event for exactly the duration of one listener call, restoring them even
//!   if the listener panics.
//! - Suppression gate ([`ListenerOptionsAdapter::prevent_default`]): ignores the
//!   call, with a [`Notice`], while the effective flags forbid it.
//!
//! ## Option defaults
//!
//! | Field | Default | Emulated when |
//! |-------|---------|---------------|
//! | `capture` | `false` | never |
//! | `may_cancel` | `true` | `false` and unsupported natively |
//! | `passive` | `false` | `true` and unsupported natively |
//!
//! A legacy boolean is a capture flag: `true` and
//! `OptionFields::new().with_capture(true)` are the same registration.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//!
//! use understory_listener_options::{
//!     EmulationState, HostEvent, Listener, ListenerOptionsAdapter, NativeTarget, OptionFields,
//!     OptionsSource,
//! };
//!
//! // A host that only understands the capture flag.
//! #[derive(Default)]
//! struct Target {
//!     listeners: RefCell<Vec<(String, Listener<Event>)>>,
//! }
//!
//! impl NativeTarget<Event> for Target {
//!     fn add_listener(&self, ty: &str, listener: &Listener<Event>, _: &dyn OptionsSource) {
//!         self.listeners.borrow_mut().push((ty.into(), listener.clone()));
//!     }
//!     fn remove_listener(&self, ty: &str, listener: &Listener<Event>, _: bool) {
//!         self.listeners
//!             .borrow_mut()
//!             .retain(|(t, l)| t != ty || !l.ptr_eq(listener));
//!     }
//! }
//!
//! impl Target {
//!     fn dispatch(&self, event: &Event) {
//!         let snapshot: Vec<_> = self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
//!         for listener in snapshot {
//!             listener.invoke(event);
//!         }
//!     }
//! }
//!
//! struct Event {
//!     prevented: Cell<bool>,
//!     emulation: EmulationState,
//! }
//!
//! impl HostEvent for Event {
//!     fn event_type(&self) -> &str { "click" }
//!     fn native_cancelable(&self) -> bool { true }
//!     fn native_prevent_default(&self) { self.prevented.set(true); }
//!     fn emulation(&self) -> &EmulationState { &self.emulation }
//! }
//!
//! let adapter = Rc::new(ListenerOptionsAdapter::<Target, Event>::new(&Target::default()));
//! let owner = Rc::new(Target::default());
//!
//! let gate = adapter.clone();
//! let listener = Listener::from_fn(move |e: &Event| {
//!     gate.prevent_default(e);
//! });
//! let options = OptionFields::new().with_may_cancel(false);
//! adapter.add_listener(&owner, "click", &listener, options);
//!
//! let event = Event { prevented: Cell::new(false), emulation: EmulationState::new() };
//! owner.dispatch(&event);
//! assert!(!event.prevented.get());
//!
//! adapter.remove_listener(&owner, "click", &listener, options);
//! assert!(owner.listeners.borrow().is_empty());
//! ```
//!
//! ## Ownership
//!
//! Owners are passed as `Rc<T>` and tracked weakly. Wrappers of an owner that
//! has been dropped are reclaimed by [`ListenerOptionsAdapter::prune`], and
//! automatically when a new owner registers its first wrapper after the number
//! of tracked owners has doubled since the last sweep.
//!
//! ## Features
//!
//! - `tracing` (default): enables [`TracingDiagnostics`], which becomes the
//!   default diagnostics sink. Without it, notices are discarded unless a sink
//!   is configured.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod adapter;
mod diagnostics;
mod host;
mod intercept;
mod listener;
mod options;
mod probe;
mod registry;

pub use adapter::{AdapterBuilder, ListenerOptionsAdapter};
#[cfg(feature = "tracing")]
pub use diagnostics::TracingDiagnostics;
pub use diagnostics::{
    Diagnostics, IgnoredReason, Notice, RecordingDiagnostics, SilentDiagnostics,
};
pub use host::{EmulationState, HostEvent, NativeTarget, OptionsSource};
pub use intercept::{
    DispatchScope, EmulatedListener, suppress_default_action, suppression_blocked,
};
pub use listener::{EventHandler, Listener, ListenerId};
pub use options::{
    CanonicalOptions, ListenerOptions, Normalized, OptionFields, OptionFlags, OptionsKey,
    normalize,
};
pub use probe::{PROBE_EVENT_TYPE, RecordingOptions, probe_native_support};
pub use registry::{OwnerId, Registration, RegistryEntry, RegistryKey, WrapperRegistry};

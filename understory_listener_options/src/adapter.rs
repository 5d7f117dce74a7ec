// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The adapter that sits between callers and a host's native primitives.
//!
//! A [`ListenerOptionsAdapter`] is created once per host, typically right where
//! the host's native targets become available. Construction runs the capability
//! probe exactly once; from then on the adapter replaces the three native entry
//! points:
//!
//! - [`add_listener`](ListenerOptionsAdapter::add_listener) normalizes the
//!   options, wraps the listener if an option needs emulating, and registers
//!   the wrapper (or the listener itself) natively.
//! - [`remove_listener`](ListenerOptionsAdapter::remove_listener) resolves the
//!   same wrapper and removes exactly that instance natively, falling back to
//!   removing the raw listener.
//! - [`prevent_default`](ListenerOptionsAdapter::prevent_default) gates the
//!   native suppression primitive on the effective flags of the running
//!   listener.
//!
//! When the host understands every emulable option, all three are direct
//! pass-through calls and no wrappers are ever created.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use crate::diagnostics::{Diagnostics, Notice, default_diagnostics};
use crate::host::{HostEvent, NativeTarget};
use crate::intercept::{EmulatedListener, suppress_default_action};
use crate::listener::Listener;
use crate::options::{ListenerOptions, OptionFlags, normalize};
use crate::probe::probe_native_support;
use crate::registry::{Registration, WrapperRegistry};

/// Emulates may-cancel and passive listener options on top of `T`.
///
/// `T` is the host's target type and `E` its event type. Owners are passed as
/// `Rc<T>` so the adapter can track them weakly.
pub struct ListenerOptionsAdapter<T: ?Sized, E> {
    native: OptionFlags,
    registry: RefCell<WrapperRegistry<T, E>>,
    diagnostics: Box<dyn Diagnostics>,
}

impl<T, E> ListenerOptionsAdapter<T, E>
where
    T: NativeTarget<E> + ?Sized,
    E: HostEvent + 'static,
{
    /// Probes `probe_target` and builds an adapter with the default diagnostics.
    ///
    /// `probe_target` should be a throwaway target; see
    /// [`probe_native_support`].
    #[must_use]
    pub fn new(probe_target: &T) -> Self {
        Self::builder().probe(probe_target).build()
    }

    /// Returns a builder for configuring an adapter.
    #[must_use]
    pub fn builder() -> AdapterBuilder<T, E> {
        AdapterBuilder::new()
    }

    /// Options the host supports natively.
    #[must_use]
    #[inline]
    pub fn native_support(&self) -> OptionFlags {
        self.native
    }

    /// Returns `true` if nothing needs emulating on this host.
    #[must_use]
    #[inline]
    pub fn is_pass_through(&self) -> bool {
        self.native.is_all()
    }

    /// Registers `listener` on `owner` for `event_type`.
    ///
    /// Registering the same listener again with options that normalize to the
    /// same key reuses the existing wrapper and performs no native call.
    pub fn add_listener(
        &self,
        owner: &Rc<T>,
        event_type: &str,
        listener: &Listener<E>,
        options: impl Into<ListenerOptions>,
    ) {
        let normalized = normalize(options.into(), self.native);
        let fields = normalized.options.to_fields();
        if !normalized.needs_wrapping() {
            owner.add_listener(event_type, listener, &fields);
            return;
        }

        let registration = self.registry.borrow_mut().get_or_create(
            owner,
            event_type,
            listener,
            normalized.key,
            || EmulatedListener::new(listener.clone(), normalized.emulated).into_listener(),
        );
        if let Registration::Created(wrapper) = registration {
            owner.add_listener(event_type, &wrapper, &fields);
        }
    }

    /// Unregisters `listener` from `owner` for `event_type`.
    ///
    /// `options` may be any value that normalizes to the key used at
    /// registration. If no wrapper matches, the raw listener is removed natively
    /// instead, which is a no-op if it was never registered that way.
    pub fn remove_listener(
        &self,
        owner: &Rc<T>,
        event_type: &str,
        listener: &Listener<E>,
        options: impl Into<ListenerOptions>,
    ) {
        let normalized = normalize(options.into(), self.native);
        let capture = normalized.options.capture;
        if normalized.needs_wrapping() {
            let entry = self.registry.borrow_mut().take_and_remove(
                owner,
                event_type,
                listener,
                normalized.key,
            );
            if let Some(entry) = entry {
                owner.remove_listener(event_type, entry.wrapper(), entry.capture());
                return;
            }
            self.diagnostics.notice(Notice::RemovalFallback {
                event_type: event_type.into(),
                listener: listener.id(),
                capture,
            });
        }
        owner.remove_listener(event_type, listener, capture);
    }

    /// Suppresses the default action of `event`, unless the running listener
    /// may not.
    ///
    /// Returns `true` if the call reached the native primitive.
    pub fn prevent_default(&self, event: &E) -> bool {
        if self.is_pass_through() {
            event.native_prevent_default();
            return true;
        }
        suppress_default_action(event, &*self.diagnostics)
    }

    /// The wrapper registered for a tuple, if any.
    #[must_use]
    pub fn wrapper_for(
        &self,
        owner: &Rc<T>,
        event_type: &str,
        listener: &Listener<E>,
        options: impl Into<ListenerOptions>,
    ) -> Option<Listener<E>> {
        let normalized = normalize(options.into(), self.native);
        self.registry
            .borrow()
            .get(owner, event_type, listener, normalized.key)
            .map(|entry| entry.wrapper().clone())
    }

    /// Number of live wrappers across all owners.
    #[must_use]
    pub fn wrapper_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Number of live wrappers registered on `owner`.
    #[must_use]
    pub fn wrapper_count_for(&self, owner: &Rc<T>) -> usize {
        self.registry.borrow().len_for(owner)
    }

    /// Reclaims wrappers of owners that have been dropped.
    ///
    /// Returns the number of wrappers reclaimed.
    pub fn prune(&self) -> usize {
        self.registry.borrow_mut().prune()
    }
}

impl<T: ?Sized, E> fmt::Debug for ListenerOptionsAdapter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerOptionsAdapter")
            .field("native", &self.native)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ListenerOptionsAdapter`].
///
/// Without [`probe`](Self::probe) or [`native_support`](Self::native_support),
/// the built adapter emulates every option.
pub struct AdapterBuilder<T: ?Sized, E> {
    native: OptionFlags,
    diagnostics: Option<Box<dyn Diagnostics>>,
    marker: PhantomData<fn(&T, &E)>,
}

impl<T, E> AdapterBuilder<T, E>
where
    T: NativeTarget<E> + ?Sized,
    E: HostEvent + 'static,
{
    /// Creates a builder that emulates everything and uses default diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            native: OptionFlags::empty(),
            diagnostics: None,
            marker: PhantomData,
        }
    }

    /// Runs the capability probe against `target`.
    #[must_use]
    pub fn probe(mut self, target: &T) -> Self {
        self.native = probe_native_support(target);
        self
    }

    /// Uses a known support answer instead of probing.
    #[must_use]
    pub fn native_support(mut self, native: OptionFlags) -> Self {
        self.native = native;
        self
    }

    /// Sends notices to `diagnostics`.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Some(Box::new(diagnostics));
        self
    }

    /// Builds the adapter.
    #[must_use]
    pub fn build(self) -> ListenerOptionsAdapter<T, E> {
        ListenerOptionsAdapter {
            native: self.native,
            registry: RefCell::new(WrapperRegistry::new()),
            diagnostics: self.diagnostics.unwrap_or_else(default_diagnostics),
        }
    }
}

impl<T, E> Default for AdapterBuilder<T, E>
where
    T: NativeTarget<E> + ?Sized,
    E: HostEvent + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, E> fmt::Debug for AdapterBuilder<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterBuilder")
            .field("native", &self.native)
            .field("custom_diagnostics", &self.diagnostics.is_some())
            .finish_non_exhaustive()
    }
}

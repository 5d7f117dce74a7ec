// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener handles with identity semantics.
//!
//! Dispatch engines compare listeners by identity, not by behavior. A
//! [`Listener`] is a cheap, clonable handle around one shared allocation:
//! clones share a [`ListenerId`], while two listeners built from identical
//! closures get two distinct ids and are registered independently.
//!
//! Both listener shapes a host may accept, a plain callback and an object with
//! a `handle_event` method ([`EventHandler`]), convert into the same handle at
//! construction time and are invoked through [`Listener::invoke`].

use alloc::rc::Rc;
use core::fmt;

/// An object-form listener.
///
/// Implement this for types that carry their own state and want to be
/// registered as a listener without wrapping them in a closure.
pub trait EventHandler<E> {
    /// Handle one delivery of `event`.
    fn handle_event(&self, event: &E);
}

/// Stable identity of a [`Listener`].
///
/// The id is derived from the address of the listener's shared allocation. It
/// stays unique for as long as any clone of the listener is alive, which the
/// wrapper registry guarantees by holding a clone of every original listener
/// it has an entry for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(usize);

enum ListenerKind<E> {
    Callback(Rc<dyn Fn(&E)>),
    Handler(Rc<dyn EventHandler<E>>),
}

/// A listener handle, compared by identity.
///
/// ```
/// use understory_listener_options::Listener;
///
/// let a = Listener::<u32>::from_fn(|_| {});
/// let b = Listener::<u32>::from_fn(|_| {});
///
/// assert_eq!(a.id(), a.clone().id());
/// assert_ne!(a.id(), b.id());
/// ```
pub struct Listener<E> {
    kind: ListenerKind<E>,
}

impl<E: 'static> Listener<E> {
    /// Creates a listener from a plain callback.
    pub fn from_fn(callback: impl Fn(&E) + 'static) -> Self {
        Self {
            kind: ListenerKind::Callback(Rc::new(callback)),
        }
    }

    /// Creates a listener from an owned handler object.
    pub fn handler(handler: impl EventHandler<E> + 'static) -> Self {
        Self::from_handler(Rc::new(handler))
    }

    /// Creates a listener from a shared handler object.
    ///
    /// Listeners created from clones of the same `Rc` share one identity.
    pub fn from_handler(handler: Rc<dyn EventHandler<E>>) -> Self {
        Self {
            kind: ListenerKind::Handler(handler),
        }
    }
}

impl<E> Listener<E> {
    /// Delivers `event` to the underlying callback or handler.
    pub fn invoke(&self, event: &E) {
        match &self.kind {
            ListenerKind::Callback(callback) => callback(event),
            ListenerKind::Handler(handler) => handler.handle_event(event),
        }
    }

    /// Returns the identity of this listener.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        let addr = match &self.kind {
            ListenerKind::Callback(callback) => Rc::as_ptr(callback).cast::<()>().addr(),
            ListenerKind::Handler(handler) => Rc::as_ptr(handler).cast::<()>().addr(),
        };
        ListenerId(addr)
    }

    /// Returns `true` if both handles refer to the same listener.
    #[must_use]
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Returns `true` if this listener was built from a handler object.
    #[must_use]
    pub fn is_handler(&self) -> bool {
        matches!(self.kind, ListenerKind::Handler(_))
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            ListenerKind::Callback(callback) => ListenerKind::Callback(Rc::clone(callback)),
            ListenerKind::Handler(handler) => ListenerKind::Handler(Rc::clone(handler)),
        };
        Self { kind }
    }
}

impl<E> PartialEq for Listener<E> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<E> Eq for Listener<E> {}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_handler() {
            "handler"
        } else {
            "callback"
        };
        f.debug_struct("Listener")
            .field("id", &self.id())
            .field("kind", &kind)
            .finish()
    }
}

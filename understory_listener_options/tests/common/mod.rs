// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal host dispatch engine shared by the integration tests.

#![allow(
    missing_docs,
    reason = "Integration-test helper module; not part of the public API."
)]
#![allow(
    dead_code,
    reason = "Each test binary uses a different subset of the mock host."
)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_listener_options::{
    EmulationState, HostEvent, Listener, ListenerOptionsAdapter, NativeTarget, OptionFlags,
    OptionsSource, RecordingDiagnostics,
};

pub type Adapter = ListenerOptionsAdapter<MockTarget, MockEvent>;

#[derive(Debug)]
pub struct MockEvent {
    event_type: String,
    cancelable: bool,
    default_prevented: Cell<bool>,
    native_passive: Cell<bool>,
    emulation: EmulationState,
}

impl MockEvent {
    pub fn new(event_type: &str, cancelable: bool) -> Self {
        Self {
            event_type: event_type.into(),
            cancelable,
            default_prevented: Cell::new(false),
            native_passive: Cell::new(false),
            emulation: EmulationState::new(),
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl HostEvent for MockEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn native_cancelable(&self) -> bool {
        self.cancelable
    }

    fn native_prevent_default(&self) {
        if self.cancelable && !self.native_passive.get() {
            self.default_prevented.set(true);
        }
    }

    fn emulation(&self) -> &EmulationState {
        &self.emulation
    }
}

struct Registered {
    event_type: String,
    listener: Listener<MockEvent>,
    capture: bool,
    passive: bool,
}

/// A dispatch target that behaves like a DOM node: listeners are deduplicated
/// on `(type, listener, capture)`, capture listeners run first, and only the
/// options in `native` are read from structured arguments.
#[derive(Default)]
pub struct MockTarget {
    native: OptionFlags,
    listeners: RefCell<Vec<Registered>>,
    adds: Cell<usize>,
    removes: Cell<usize>,
}

impl MockTarget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_native_support(native: OptionFlags) -> Rc<Self> {
        Rc::new(Self {
            native,
            ..Self::default()
        })
    }

    /// Native add calls, including ones deduplicated by the target.
    pub fn add_calls(&self) -> usize {
        self.adds.get()
    }

    /// Native remove calls, including ones that matched nothing.
    pub fn remove_calls(&self) -> usize {
        self.removes.get()
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    pub fn registered(&self, event_type: &str) -> Vec<(Listener<MockEvent>, bool)> {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.event_type == event_type)
            .map(|r| (r.listener.clone(), r.capture))
            .collect()
    }

    pub fn dispatch(&self, event: &MockEvent) {
        let snapshot: Vec<(Listener<MockEvent>, bool)> = {
            let listeners = self.listeners.borrow();
            let mut matching: Vec<&Registered> = listeners
                .iter()
                .filter(|r| r.event_type == event.event_type)
                .collect();
            // Stable: capture listeners first, each phase in registration order.
            matching.sort_by_key(|r| !r.capture);
            matching
                .into_iter()
                .map(|r| (r.listener.clone(), r.passive))
                .collect()
        };
        for (listener, passive) in snapshot {
            event.native_passive.set(passive);
            listener.invoke(event);
            event.native_passive.set(false);
        }
    }
}

impl NativeTarget<MockEvent> for MockTarget {
    fn add_listener(
        &self,
        event_type: &str,
        listener: &Listener<MockEvent>,
        options: &dyn OptionsSource,
    ) {
        self.adds.set(self.adds.get() + 1);
        let capture = options.capture().unwrap_or(false);
        if self.native.contains(OptionFlags::MAY_CANCEL) {
            // Native may-cancel is modeled by the event's own cancelable flag.
            let _ = options.may_cancel();
        }
        let passive = self.native.contains(OptionFlags::PASSIVE)
            && options.passive().unwrap_or(false);

        let mut listeners = self.listeners.borrow_mut();
        let duplicate = listeners.iter().any(|r| {
            r.event_type == event_type && r.listener.ptr_eq(listener) && r.capture == capture
        });
        if !duplicate {
            listeners.push(Registered {
                event_type: event_type.into(),
                listener: listener.clone(),
                capture,
                passive,
            });
        }
    }

    fn remove_listener(&self, event_type: &str, listener: &Listener<MockEvent>, capture: bool) {
        self.removes.set(self.removes.get() + 1);
        self.listeners.borrow_mut().retain(|r| {
            !(r.event_type == event_type && r.listener.ptr_eq(listener) && r.capture == capture)
        });
    }
}

/// An adapter that emulates everything and records its notices.
pub fn emulating_adapter() -> (Rc<Adapter>, Rc<RecordingDiagnostics>) {
    adapter_with(OptionFlags::empty())
}

pub fn adapter_with(native: OptionFlags) -> (Rc<Adapter>, Rc<RecordingDiagnostics>) {
    let diagnostics = Rc::new(RecordingDiagnostics::new());
    let adapter = Adapter::builder()
        .probe(&MockTarget::with_native_support(native))
        .diagnostics(diagnostics.clone())
        .build();
    (Rc::new(adapter), diagnostics)
}

/// A listener that counts its calls and tries to suppress the default action.
pub fn cancelling_listener(adapter: &Rc<Adapter>) -> (Listener<MockEvent>, Rc<Cell<u32>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let gate = Rc::downgrade(adapter);
    let listener = Listener::from_fn(move |e: &MockEvent| {
        counter.set(counter.get() + 1);
        if let Some(adapter) = gate.upgrade() {
            adapter.prevent_default(e);
        }
    });
    (listener, calls)
}

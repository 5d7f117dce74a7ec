// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot capability probe.
//!
//! The probe registers a throwaway listener on a throwaway target with a
//! [`RecordingOptions`] argument. Every field read by the native primitive is
//! recorded; a host that reads the may-cancel or passive field understands it
//! and needs no emulation for it.

use core::cell::Cell;

use crate::host::{NativeTarget, OptionsSource};
use crate::listener::Listener;
use crate::options::OptionFlags;

/// Event type used for the probe registration.
pub const PROBE_EVENT_TYPE: &str = "test";

/// An options argument that records which emulable fields were read.
///
/// The reported values are the baseline ones, so a host that does read them
/// registers an ordinary listener.
#[derive(Debug, Default)]
pub struct RecordingOptions {
    read: Cell<OptionFlags>,
}

impl RecordingOptions {
    /// Creates a recorder with nothing read yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The emulable fields read so far.
    #[must_use]
    pub fn observed(&self) -> OptionFlags {
        self.read.get()
    }

    fn mark(&self, flag: OptionFlags) {
        self.read.set(self.read.get() | flag);
    }
}

impl OptionsSource for RecordingOptions {
    fn capture(&self) -> Option<bool> {
        Some(false)
    }

    fn may_cancel(&self) -> Option<bool> {
        self.mark(OptionFlags::MAY_CANCEL);
        Some(true)
    }

    fn passive(&self) -> Option<bool> {
        self.mark(OptionFlags::PASSIVE);
        Some(false)
    }
}

/// Determines which emulable options `target`'s native primitive understands.
///
/// `target` should be a throwaway object; the probe listener is removed again
/// before returning.
pub fn probe_native_support<T, E>(target: &T) -> OptionFlags
where
    T: NativeTarget<E> + ?Sized,
    E: 'static,
{
    let options = RecordingOptions::new();
    let listener = Listener::from_fn(|_: &E| {});
    target.add_listener(PROBE_EVENT_TYPE, &listener, &options);
    target.remove_listener(PROBE_EVENT_TYPE, &listener, false);
    options.observed()
}

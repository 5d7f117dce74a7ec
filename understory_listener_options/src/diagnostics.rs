// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-fatal diagnostic notices.
//!
//! Nothing in this crate fails. The two situations a caller may want to hear
//! about are reported as [`Notice`]s through a [`Diagnostics`] sink:
//!
//! - [`Notice::SuppressionIgnored`]: a listener tried to suppress the default
//!   action of an event whose effective flags forbid it; the call was a no-op.
//! - [`Notice::RemovalFallback`]: a removal did not match a wrapper, so the raw
//!   listener was handed to native removal instead.
//!
//! With the `tracing` feature, [`TracingDiagnostics`] is the default sink.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::listener::ListenerId;

/// Why a suppression attempt was ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IgnoredReason {
    /// The effective cancelable attribute is `false`.
    NotCancelable,
    /// The running listener was registered as passive.
    PassiveListener,
}

impl IgnoredReason {
    /// A short stable name, suitable for structured log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotCancelable => "not_cancelable",
            Self::PassiveListener => "passive_listener",
        }
    }

    /// A human-readable description of the ignored call.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::NotCancelable => {
                "ignored attempt to prevent the default action of a non-cancelable event"
            }
            Self::PassiveListener => {
                "ignored attempt to prevent the default action inside a passive listener"
            }
        }
    }
}

/// A diagnostic notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A default-action suppression call was ignored.
    SuppressionIgnored {
        /// Type of the event.
        event_type: String,
        /// Why the call was ignored.
        reason: IgnoredReason,
    },
    /// Removal found no wrapper and fell back to native removal of the listener.
    RemovalFallback {
        /// Type passed to the removal call.
        event_type: String,
        /// The listener passed to the removal call.
        listener: ListenerId,
        /// Capture flag used for native removal.
        capture: bool,
    },
}

/// A sink for [`Notice`]s.
pub trait Diagnostics {
    /// Called once per notice.
    fn notice(&self, notice: Notice);
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
    fn notice(&self, notice: Notice) {
        (**self).notice(notice);
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for Rc<D> {
    fn notice(&self, notice: Notice) {
        (**self).notice(notice);
    }
}

/// Discards every notice.
#[derive(Copy, Clone, Debug, Default)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn notice(&self, _notice: Notice) {}
}

/// Keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingDiagnostics {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded notices, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Removes and returns the recorded notices.
    pub fn take(&self) -> Vec<Notice> {
        self.notices.take()
    }

    /// Number of recorded notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.borrow().is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn notice(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

/// Forwards notices to `tracing`.
///
/// Ignored suppression attempts are logged at `WARN`, removal fallbacks at
/// `DEBUG`.
#[cfg(feature = "tracing")]
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingDiagnostics;

#[cfg(feature = "tracing")]
impl Diagnostics for TracingDiagnostics {
    fn notice(&self, notice: Notice) {
        match notice {
            Notice::SuppressionIgnored { event_type, reason } => {
                tracing::warn!(
                    target: "understory_listener_options",
                    event_type = %event_type,
                    reason = reason.as_str(),
                    "{}",
                    reason.describe()
                );
            }
            Notice::RemovalFallback {
                event_type,
                listener,
                capture,
            } => {
                tracing::debug!(
                    target: "understory_listener_options",
                    event_type = %event_type,
                    listener = ?listener,
                    capture,
                    "no wrapper registered; removing listener natively"
                );
            }
        }
    }
}

/// The sink used when none is configured.
pub(crate) fn default_diagnostics() -> Box<dyn Diagnostics> {
    #[cfg(feature = "tracing")]
    {
        Box::new(TracingDiagnostics)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Box::new(SilentDiagnostics)
    }
}

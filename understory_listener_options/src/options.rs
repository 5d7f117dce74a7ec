// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Option normalization.
//!
//! The options argument of a registration call is one of three shapes: absent,
//! a legacy capture boolean, or a structured record ([`OptionFields`]). All of
//! them normalize to one fixed-shape [`CanonicalOptions`] record and an
//! injective [`OptionsKey`], so two raw shapes with the same meaning resolve to
//! the same wrapper.
//!
//! Defaults differ per field:
//!
//! | Field | Default | Departure that needs emulation |
//! |-------|---------|--------------------------------|
//! | `capture` | `false` | never |
//! | `may_cancel` | `true` | `false` |
//! | `passive` | `false` | `true` |
//!
//! Normalization is total: every input has a canonical form.

use crate::host::OptionsSource;

bitflags::bitflags! {
    /// A set of emulable listener options.
    ///
    /// Used both for the options a host supports natively and for the options a
    /// particular registration needs emulated.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct OptionFlags: u8 {
        /// The may-cancel option.
        const MAY_CANCEL = 0b0000_0001;
        /// The passive option.
        const PASSIVE    = 0b0000_0010;
    }
}

bitflags::bitflags! {
    /// Registry key derived from [`CanonicalOptions`].
    ///
    /// One bit per canonical field, so the mapping is injective over every
    /// combination.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct OptionsKey: u8 {
        /// Registered for the capture phase.
        const CAPTURE   = 0b0000_0001;
        /// Registered with `may_cancel: false`.
        const NO_CANCEL = 0b0000_0010;
        /// Registered with `passive: true`.
        const PASSIVE   = 0b0000_0100;
    }
}

impl OptionsKey {
    /// Recovers the canonical options this key was derived from.
    #[must_use]
    pub const fn options(self) -> CanonicalOptions {
        CanonicalOptions {
            capture: self.contains(Self::CAPTURE),
            may_cancel: !self.contains(Self::NO_CANCEL),
            passive: self.contains(Self::PASSIVE),
        }
    }
}

/// The structured options record.
///
/// Unspecified fields fall back to their defaults during normalization.
///
/// ```
/// use understory_listener_options::{CanonicalOptions, OptionFields};
///
/// let fields = OptionFields::new().with_capture(true).with_may_cancel(false);
/// let canonical = CanonicalOptions::from(fields);
/// assert!(canonical.capture);
/// assert!(!canonical.may_cancel);
/// assert!(!canonical.passive);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OptionFields {
    /// Capture-phase registration.
    pub capture: Option<bool>,
    /// Whether the listener may suppress the default action.
    pub may_cancel: Option<bool>,
    /// Whether the listener is passive.
    pub passive: Option<bool>,
}

impl OptionFields {
    /// Creates a record with every field unspecified.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capture: None,
            may_cancel: None,
            passive: None,
        }
    }

    /// Sets the capture field.
    #[must_use]
    pub const fn with_capture(mut self, capture: bool) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Sets the may-cancel field.
    #[must_use]
    pub const fn with_may_cancel(mut self, may_cancel: bool) -> Self {
        self.may_cancel = Some(may_cancel);
        self
    }

    /// Sets the passive field.
    #[must_use]
    pub const fn with_passive(mut self, passive: bool) -> Self {
        self.passive = Some(passive);
        self
    }

    /// Which emulable fields were given explicitly.
    ///
    /// Informational: wrapping depends only on the effective values, so
    /// `with_may_cancel(true)` and an unspecified field register alike.
    ///
    /// ```
    /// use understory_listener_options::{OptionFields, OptionFlags};
    ///
    /// let fields = OptionFields::new().with_capture(true).with_may_cancel(true);
    /// assert_eq!(fields.explicit(), OptionFlags::MAY_CANCEL);
    /// assert!(OptionFields::new().explicit().is_empty());
    /// ```
    #[must_use]
    pub fn explicit(&self) -> OptionFlags {
        let mut flags = OptionFlags::empty();
        flags.set(OptionFlags::MAY_CANCEL, self.may_cancel.is_some());
        flags.set(OptionFlags::PASSIVE, self.passive.is_some());
        flags
    }
}

impl OptionsSource for OptionFields {
    fn capture(&self) -> Option<bool> {
        self.capture
    }

    fn may_cancel(&self) -> Option<bool> {
        self.may_cancel
    }

    fn passive(&self) -> Option<bool> {
        self.passive
    }
}

/// The raw options argument of a registration or removal call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListenerOptions {
    /// No options argument.
    #[default]
    Absent,
    /// Legacy capture-only boolean.
    Capture(bool),
    /// Structured options record.
    Fields(OptionFields),
}

impl From<bool> for ListenerOptions {
    fn from(capture: bool) -> Self {
        Self::Capture(capture)
    }
}

impl From<OptionFields> for ListenerOptions {
    fn from(fields: OptionFields) -> Self {
        Self::Fields(fields)
    }
}

impl From<Option<bool>> for ListenerOptions {
    fn from(capture: Option<bool>) -> Self {
        capture.map_or(Self::Absent, Self::Capture)
    }
}

/// Fixed-shape normalized options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalOptions {
    /// Capture-phase registration.
    pub capture: bool,
    /// Whether the listener may suppress the default action.
    pub may_cancel: bool,
    /// Whether the listener is passive.
    pub passive: bool,
}

impl Default for CanonicalOptions {
    fn default() -> Self {
        Self::BASELINE
    }
}

impl CanonicalOptions {
    /// The options of a listener registered with no options argument.
    pub const BASELINE: Self = Self {
        capture: false,
        may_cancel: true,
        passive: false,
    };

    /// Returns the registry key for these options.
    #[must_use]
    pub fn key(self) -> OptionsKey {
        let mut key = OptionsKey::empty();
        key.set(OptionsKey::CAPTURE, self.capture);
        key.set(OptionsKey::NO_CANCEL, !self.may_cancel);
        key.set(OptionsKey::PASSIVE, self.passive);
        key
    }

    /// The emulable options whose value departs from the baseline.
    #[must_use]
    pub fn departures(self) -> OptionFlags {
        let mut flags = OptionFlags::empty();
        flags.set(OptionFlags::MAY_CANCEL, !self.may_cancel);
        flags.set(OptionFlags::PASSIVE, self.passive);
        flags
    }

    /// Returns a fully specified options record for the native primitive.
    #[must_use]
    pub const fn to_fields(self) -> OptionFields {
        OptionFields {
            capture: Some(self.capture),
            may_cancel: Some(self.may_cancel),
            passive: Some(self.passive),
        }
    }
}

impl From<ListenerOptions> for CanonicalOptions {
    fn from(raw: ListenerOptions) -> Self {
        match raw {
            ListenerOptions::Absent => Self::BASELINE,
            ListenerOptions::Capture(capture) => Self {
                capture,
                ..Self::BASELINE
            },
            ListenerOptions::Fields(fields) => Self::from(fields),
        }
    }
}

impl From<OptionFields> for CanonicalOptions {
    fn from(fields: OptionFields) -> Self {
        Self {
            capture: fields.capture.unwrap_or(Self::BASELINE.capture),
            may_cancel: fields.may_cancel.unwrap_or(Self::BASELINE.may_cancel),
            passive: fields.passive.unwrap_or(Self::BASELINE.passive),
        }
    }
}

/// The result of normalizing a raw options argument against a host.
///
/// `options`, `key` and `emulated` drive registration. `explicit` is reported
/// for callers that need to tell an explicit default from an omitted field,
/// for example when forwarding options to another host; it never affects the
/// key or whether the listener is wrapped.
///
/// ```
/// use understory_listener_options::{normalize, ListenerOptions, OptionFields, OptionFlags};
///
/// let stated = normalize(OptionFields::new().with_may_cancel(true).into(), OptionFlags::empty());
/// let omitted = normalize(ListenerOptions::Absent, OptionFlags::empty());
/// assert_eq!(stated.key, omitted.key);
/// assert_eq!(stated.explicit, OptionFlags::MAY_CANCEL);
/// assert!(omitted.explicit.is_empty());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Normalized {
    /// Canonical options.
    pub options: CanonicalOptions,
    /// Registry key for [`options`](Self::options).
    pub key: OptionsKey,
    /// Emulable fields that were given explicitly. Informational only.
    pub explicit: OptionFlags,
    /// Options this registration needs emulated on this host.
    pub emulated: OptionFlags,
}

impl Normalized {
    /// Whether the listener must be replaced by a wrapper.
    #[must_use]
    #[inline]
    pub fn needs_wrapping(&self) -> bool {
        !self.emulated.is_empty()
    }
}

/// Normalizes `raw` for a host that supports the `native` options itself.
///
/// ```
/// use understory_listener_options::{normalize, ListenerOptions, OptionFields, OptionFlags};
///
/// let plain = normalize(ListenerOptions::Capture(true), OptionFlags::empty());
/// let fields = normalize(OptionFields::new().with_capture(true).into(), OptionFlags::empty());
/// assert_eq!(plain.key, fields.key);
/// assert!(!plain.needs_wrapping());
///
/// let no_cancel = OptionFields::new().with_may_cancel(false);
/// assert!(normalize(no_cancel.into(), OptionFlags::empty()).needs_wrapping());
/// assert!(!normalize(no_cancel.into(), OptionFlags::MAY_CANCEL).needs_wrapping());
/// ```
#[must_use]
pub fn normalize(raw: ListenerOptions, native: OptionFlags) -> Normalized {
    let options = CanonicalOptions::from(raw);
    let explicit = match raw {
        ListenerOptions::Fields(fields) => fields.explicit(),
        ListenerOptions::Absent | ListenerOptions::Capture(_) => OptionFlags::empty(),
    };
    Normalized {
        options,
        key: options.key(),
        explicit,
        emulated: options.departures().difference(native),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    fn all_canonical() -> impl Iterator<Item = CanonicalOptions> {
        (0_u8..8).map(|bits| CanonicalOptions {
            capture: bits & 1 != 0,
            may_cancel: bits & 2 != 0,
            passive: bits & 4 != 0,
        })
    }

    #[test]
    fn key_is_injective_and_invertible() {
        let keys: HashSet<OptionsKey> = all_canonical().map(CanonicalOptions::key).collect();
        assert_eq!(keys.len(), 8);
        for options in all_canonical() {
            assert_eq!(options.key().options(), options);
        }
    }

    #[test]
    fn absent_and_false_share_the_baseline() {
        let absent = normalize(ListenerOptions::Absent, OptionFlags::empty());
        let legacy = normalize(false.into(), OptionFlags::empty());
        let empty = normalize(OptionFields::new().into(), OptionFlags::empty());
        assert_eq!(absent.options, CanonicalOptions::BASELINE);
        assert_eq!(absent.key, legacy.key);
        assert_eq!(absent.key, empty.key);
        assert_eq!(absent.key, OptionsKey::empty());
        assert!(!absent.needs_wrapping());
    }

    #[test]
    fn may_cancel_defaults_to_true_in_records() {
        let n = normalize(
            OptionFields::new().with_passive(false).into(),
            OptionFlags::empty(),
        );
        assert!(n.options.may_cancel);
        assert!(!n.needs_wrapping());
        assert_eq!(n.explicit, OptionFlags::PASSIVE);
    }

    #[test]
    fn explicit_may_cancel_true_matches_absent() {
        let explicit = normalize(
            OptionFields::new().with_may_cancel(true).into(),
            OptionFlags::empty(),
        );
        let absent = normalize(ListenerOptions::Absent, OptionFlags::empty());
        assert_eq!(explicit.key, absent.key);
        assert_eq!(explicit.explicit, OptionFlags::MAY_CANCEL);
        assert!(absent.explicit.is_empty());
    }

    #[test]
    fn departures_drive_wrapping() {
        let passive = normalize(
            OptionFields::new().with_passive(true).into(),
            OptionFlags::empty(),
        );
        assert_eq!(passive.emulated, OptionFlags::PASSIVE);

        let both = normalize(
            OptionFields::new()
                .with_passive(true)
                .with_may_cancel(false)
                .into(),
            OptionFlags::PASSIVE,
        );
        assert_eq!(both.emulated, OptionFlags::MAY_CANCEL);
        assert!(both.needs_wrapping());

        let native = normalize(
            OptionFields::new()
                .with_passive(true)
                .with_may_cancel(false)
                .into(),
            OptionFlags::all(),
        );
        assert!(!native.needs_wrapping());
        assert_eq!(native.key, OptionsKey::NO_CANCEL | OptionsKey::PASSIVE);
    }

    #[test]
    fn option_bool_converts_to_absent_or_capture() {
        assert_eq!(ListenerOptions::from(None), ListenerOptions::Absent);
        assert_eq!(
            ListenerOptions::from(Some(true)),
            ListenerOptions::Capture(true)
        );
    }

    #[test]
    fn native_fields_are_fully_specified() {
        let fields = CanonicalOptions::BASELINE.to_fields();
        assert_eq!(fields.capture(), Some(false));
        assert_eq!(fields.may_cancel(), Some(true));
        assert_eq!(fields.passive(), Some(false));
    }
}

// SPDX-License-Identifier: GPL-3.0-only
//! Correlation between direct-channel displays and instrumentation
//! identities.
//!
//! The two enumeration mechanisms share no identifier. The only bridge
//! is a heuristic: the device interface path
//! `\\?\DISPLAY#ACME1234#9&abcdef9&0&UID12345#{guid}` transforms into
//! `DISPLAY\ACME1234\9&abcdef9&0&UID12345`, which is expected to be a
//! leading substring of the instrumentation instance path
//! `DISPLAY\ACME1234\9&abcdef9&0&UID12345_0`. Best effort only: nothing
//! guarantees the match is unique.

use tracing::debug;

use crate::monitor::{InstrumentationLink, Monitor};

/// Derive the correlation key from a device interface path.
///
/// Strips a leading `\\?\` if present, then copies characters mapping
/// `#` to `\`; a `#` immediately followed by `{` ends the key (the
/// brace-delimited GUID suffix is discarded). An empty input yields an
/// empty key, meaning "undeterminable".
pub fn derive_key(device_path: &str) -> String {
    let path = device_path.strip_prefix(r"\\?\").unwrap_or(device_path);
    let mut key = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '#' {
            if chars.peek() == Some(&'{') {
                break;
            }
            key.push('\\');
        } else {
            key.push(c);
        }
    }
    key
}

/// Bind instrumentation identities to entities.
///
/// For each identity string, in backend order, the first entity in
/// index order with a non-empty key, no existing binding, and whose key
/// is a leading substring of the identity receives the binding. One
/// binding per identity; a bound entity is never rebound. When derived
/// prefixes collide this picks whichever identity arrives first, by
/// design; the heuristic does not attempt to detect the ambiguity.
pub fn bind_identities<'a, I>(monitors: &mut [Monitor], identities: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for identity in identities {
        let candidate = monitors.iter_mut().find(|m| {
            !m.correlation_key.is_empty()
                && m.link.is_none()
                && identity.starts_with(m.correlation_key.as_str())
        });
        if let Some(monitor) = candidate {
            debug!(
                index = monitor.index,
                instance = identity,
                "bound instrumentation identity"
            );
            monitor.link = Some(InstrumentationLink::new(identity.to_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::{DevicePaths, NativeHandle, PhysicalDisplay};

    fn entity(index: usize, key: &str) -> Monitor {
        Monitor::new(
            index,
            PhysicalDisplay {
                handle: NativeHandle(index as isize),
                description: format!("Display {index}"),
            },
            r"\\.\DISPLAY1".into(),
            DevicePaths::default(),
            key.to_owned(),
        )
    }

    #[test]
    fn derives_key_from_interface_path() {
        assert_eq!(
            derive_key(
                r"\\?\DISPLAY#ACME1234#9&abcdef9&0&UID12345#{abcdef01-abcd-abcd-abcd-abcdef012345}"
            ),
            r"DISPLAY\ACME1234\9&abcdef9&0&UID12345"
        );
    }

    #[test]
    fn derives_key_without_volume_prefix() {
        assert_eq!(derive_key("DISPLAY#ACME#1#{guid}"), r"DISPLAY\ACME\1");
    }

    #[test]
    fn separator_without_brace_becomes_backslash_to_the_end() {
        assert_eq!(derive_key(r"\\?\A#B#C"), r"A\B\C");
    }

    #[test]
    fn empty_path_yields_empty_key() {
        assert_eq!(derive_key(""), "");
    }

    #[test]
    fn binds_first_matching_entity_in_index_order() {
        let mut monitors = vec![
            entity(0, r"DISPLAY\ACME1234\9&abcdef9&0&UID12345"),
            entity(1, r"DISPLAY\OTHR5678\1&00000000&0&UID99999"),
        ];
        bind_identities(
            &mut monitors,
            [r"DISPLAY\ACME1234\9&abcdef9&0&UID12345_0"],
        );
        assert_eq!(
            monitors[0].link.as_ref().map(|l| l.instance.as_str()),
            Some(r"DISPLAY\ACME1234\9&abcdef9&0&UID12345_0")
        );
        assert!(monitors[1].link.is_none());
    }

    #[test]
    fn binding_is_idempotent_across_repeated_identify_passes() {
        let mut monitors = vec![entity(0, r"DISPLAY\ACME1234\9&abcdef9&0&UID12345")];
        let identities = [r"DISPLAY\ACME1234\9&abcdef9&0&UID12345_0"];
        bind_identities(&mut monitors, identities);
        bind_identities(&mut monitors, identities);
        assert_eq!(
            monitors[0].link.as_ref().map(|l| l.instance.as_str()),
            Some(r"DISPLAY\ACME1234\9&abcdef9&0&UID12345_0")
        );
    }

    #[test]
    fn bound_entity_never_rebinds_to_a_later_identity() {
        let mut monitors = vec![entity(0, r"DISPLAY\ACME")];
        bind_identities(&mut monitors, [r"DISPLAY\ACME_0", r"DISPLAY\ACME_1"]);
        assert_eq!(
            monitors[0].link.as_ref().map(|l| l.instance.as_str()),
            Some(r"DISPLAY\ACME_0")
        );
    }

    #[test]
    fn colliding_prefixes_bind_in_entity_index_order() {
        // Two entities derive the same prefix; the first identity goes
        // to the lower index, the second to the next unbound entity.
        let mut monitors = vec![entity(0, r"DISPLAY\ACME"), entity(1, r"DISPLAY\ACME")];
        bind_identities(&mut monitors, [r"DISPLAY\ACME_0", r"DISPLAY\ACME_1"]);
        assert_eq!(
            monitors[0].link.as_ref().map(|l| l.instance.as_str()),
            Some(r"DISPLAY\ACME_0")
        );
        assert_eq!(
            monitors[1].link.as_ref().map(|l| l.instance.as_str()),
            Some(r"DISPLAY\ACME_1")
        );
    }

    #[test]
    fn empty_key_never_binds() {
        let mut monitors = vec![entity(0, "")];
        bind_identities(&mut monitors, [r"DISPLAY\ACME_0"]);
        assert!(monitors[0].link.is_none());
    }
}

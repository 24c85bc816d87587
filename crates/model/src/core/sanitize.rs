//! Removal of UTF-16 surrogate code points.
//!
//! Upstream text can carry unpaired surrogates (0xD800..=0xDFFF), which no
//! well-formed encoding accepts. Everything here is pure: surrogates are
//! dropped, every other character is kept in its original order.

use crate::core::value::Value;
use std::borrow::Cow;

const SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDFFF;
const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

/// Decodes UTF-16 code units, dropping every unpaired surrogate.
///
/// A well-formed high/low pair encodes a single supplementary character and
/// is kept.
pub fn strip_surrogates(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .filter_map(Result::ok)
        .collect()
}

/// Returns a copy of `value` in which no text contains a surrogate.
///
/// Mappings keep their keys and key order, sequences keep their length and
/// order, scalars are returned as they are. The value is an owned tree, so
/// recursion always terminates.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Utf16(units) => Value::String(strip_surrogates(&units)),
        Value::Map(map) => Value::Map(map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sanitize).collect()),
        other => other,
    }
}

/// Removes `\uXXXX` escapes that denote an unpaired surrogate from JSON text.
///
/// Strict JSON decoders reject such escapes. Escaped high/low pairs and all
/// other escapes are left alone.
pub fn strip_surrogate_escapes(json: &str) -> Cow<'_, str> {
    if !json.contains("\\u") {
        return Cow::Borrowed(json);
    }

    let bytes = json.as_bytes();
    let mut out = String::new();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }

        match escaped_unit(bytes, i) {
            Some(unit) if HIGH_SURROGATES.contains(&unit) => {
                if let Some(next) = escaped_unit(bytes, i + 6)
                    && LOW_SURROGATES.contains(&next)
                {
                    i += 12;
                    continue;
                }
                out.push_str(&json[copied..i]);
                i += 6;
                copied = i;
            }
            Some(unit) if SURROGATES.contains(&unit) => {
                out.push_str(&json[copied..i]);
                i += 6;
                copied = i;
            }
            // any other escape, including `\\`, spans two bytes at least
            _ => i += 2,
        }
    }

    if copied == 0 {
        return Cow::Borrowed(json);
    }
    out.push_str(&json[copied..]);
    Cow::Owned(out)
}

fn escaped_unit(bytes: &[u8], at: usize) -> Option<u16> {
    if bytes.get(at) != Some(&b'\\') || bytes.get(at + 1) != Some(&b'u') {
        return None;
    }
    let hex = bytes.get(at + 2..at + 6)?;
    if !hex.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u16::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()
}

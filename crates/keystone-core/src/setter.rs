//! The setter registry.
//!
//! [`setter`] maps a field's [`Slot`] to a converter that parses a raw string
//! and stores the result in the field. Sequence converters reuse the scalar
//! converters for each element.

use std::num::IntErrorKind;
use std::time::Duration;

use crate::error::{ParseError, UnsupportedType};
use crate::value::{Kind, Sequence, Slot};

/// Converts a raw string and stores it into the field it was built for.
pub type Setter<'a> = Box<dyn FnMut(&str) -> Result<(), ParseError> + 'a>;

/// Returns a converter for the given slot.
///
/// Fails for slots without a converter: unsupported types and sequences whose
/// elements are not scalars.
pub fn setter(slot: Slot<'_>) -> Result<Setter<'_>, UnsupportedType> {
    let set: Setter<'_> = match slot {
        Slot::Text(target) => Box::new(move |raw: &str| {
            raw.clone_into(target);
            Ok(())
        }),
        Slot::Bool(target) => assign(target, parse_bool),
        Slot::F32(target) => assign(target, parse_f32),
        Slot::F64(target) => assign(target, parse_f64),
        Slot::I8(target) => assign(target, |raw| parse_int(raw, "i8")),
        Slot::I16(target) => assign(target, |raw| parse_int(raw, "i16")),
        Slot::I32(target) => assign(target, |raw| parse_int(raw, "i32")),
        Slot::I64(target) => assign(target, |raw| parse_int(raw, "i64")),
        Slot::Isize(target) => assign(target, |raw| parse_int(raw, "isize")),
        Slot::U8(target) => assign(target, |raw| parse_uint(raw, "u8")),
        Slot::U16(target) => assign(target, |raw| parse_uint(raw, "u16")),
        Slot::U32(target) => assign(target, |raw| parse_uint(raw, "u32")),
        Slot::U64(target) => assign(target, |raw| parse_uint(raw, "u64")),
        Slot::Usize(target) => assign(target, |raw| parse_uint(raw, "usize")),
        Slot::Duration(target) => assign(target, parse_duration),
        Slot::Sequence(seq) => return sequence_setter(seq),
        Slot::Unsupported(type_name) => return Err(UnsupportedType { type_name }),
    };
    Ok(set)
}

fn assign<'a, T, F>(target: &'a mut T, parse: F) -> Setter<'a>
where
    T: 'a,
    F: Fn(&str) -> Result<T, ParseError> + 'a,
{
    Box::new(move |raw: &str| {
        *target = parse(raw)?;
        Ok(())
    })
}

fn sequence_setter(seq: &mut dyn Sequence) -> Result<Setter<'_>, UnsupportedType> {
    match seq.element_kind() {
        // Byte sequences take the raw bytes rather than a comma separated list.
        Kind::U8 => Ok(Box::new(move |raw: &str| {
            let bytes = raw.as_bytes();
            seq.fill(bytes.len(), &mut |index: usize, slot: Slot<'_>| match slot {
                Slot::U8(byte) => {
                    *byte = bytes[index];
                    Ok(())
                }
                other => Err(ParseError::UnsupportedElement {
                    type_name: other.type_name(),
                }),
            })
        })),
        kind if kind.is_scalar() => Ok(Box::new(move |raw: &str| {
            if raw.trim().is_empty() {
                return seq.fill(0, &mut |_: usize, _: Slot<'_>| Ok(()));
            }
            let tokens: Vec<&str> = raw.split(',').collect();
            seq.fill(tokens.len(), &mut |index: usize, slot: Slot<'_>| {
                let mut set = setter(slot).map_err(|e| ParseError::UnsupportedElement {
                    type_name: e.type_name,
                })?;
                set(tokens[index]).map_err(|source| ParseError::Element {
                    index,
                    source: Box::new(source),
                })
            })
        })),
        _ => Err(UnsupportedType {
            type_name: seq.type_name(),
        }),
    }
}

/// Parse a boolean literal: `1 t T TRUE true True 0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, ParseError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseError::InvalidBool {
            value: raw.to_string(),
        }),
    }
}

fn parse_f64(raw: &str) -> Result<f64, ParseError> {
    let value: f64 = raw.parse().map_err(|_| ParseError::InvalidNumber {
        value: raw.to_string(),
        type_name: "f64",
    })?;
    check_float_range(raw, value.is_infinite(), "f64")?;
    Ok(value)
}

fn parse_f32(raw: &str) -> Result<f32, ParseError> {
    let value: f32 = raw.parse().map_err(|_| ParseError::InvalidNumber {
        value: raw.to_string(),
        type_name: "f32",
    })?;
    check_float_range(raw, value.is_infinite(), "f32")?;
    Ok(value)
}

// A finite literal that parses to infinity overflowed the type.
fn check_float_range(raw: &str, infinite: bool, type_name: &'static str) -> Result<(), ParseError> {
    let spelled_infinite = raw
        .trim_start_matches(|c: char| c == '+' || c == '-')
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("inf"));
    if infinite && !spelled_infinite {
        return Err(ParseError::OutOfRange {
            value: raw.to_string(),
            type_name,
        });
    }
    Ok(())
}

/// Parse a signed integer literal, range-checked against `T`.
///
/// Accepts an optional sign, the base prefixes `0x`, `0o`, `0b`, a bare
/// leading `0` for octal, and `_` separators between digits.
pub fn parse_int<T: TryFrom<i128>>(raw: &str, type_name: &'static str) -> Result<T, ParseError> {
    let value = parse_integer(raw, type_name, true)?;
    T::try_from(value).map_err(|_| ParseError::OutOfRange {
        value: raw.to_string(),
        type_name,
    })
}

/// Parse an unsigned integer literal, range-checked against `T`.
///
/// Same grammar as [`parse_int`], without a `-` sign.
pub fn parse_uint<T: TryFrom<i128>>(raw: &str, type_name: &'static str) -> Result<T, ParseError> {
    let value = parse_integer(raw, type_name, false)?;
    T::try_from(value).map_err(|_| ParseError::OutOfRange {
        value: raw.to_string(),
        type_name,
    })
}

fn parse_integer(raw: &str, type_name: &'static str, signed: bool) -> Result<i128, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        value: raw.to_string(),
        type_name,
    };
    let out_of_range = || ParseError::OutOfRange {
        value: raw.to_string(),
        type_name,
    };

    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') if signed => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (radix, digits, prefixed) = split_radix(body);
    let digits = strip_separators(digits, prefixed).ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    let magnitude = u128::from_str_radix(&digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => out_of_range(),
        _ => invalid(),
    })?;
    let magnitude = i128::try_from(magnitude).map_err(|_| out_of_range())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn split_radix(body: &str) -> (u32, &str, bool) {
    let bytes = body.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return (10, body, false);
    }
    match bytes[1] {
        b'x' | b'X' => (16, &body[2..], true),
        b'o' | b'O' => (8, &body[2..], true),
        b'b' | b'B' => (2, &body[2..], true),
        _ => (8, &body[1..], true),
    }
}

// `_` may only follow a digit or the base prefix, and may not end the literal.
fn strip_separators(digits: &str, prefixed: bool) -> Option<String> {
    let mut cleaned = String::with_capacity(digits.len());
    let mut after_digit = prefixed;
    let mut trailing = false;
    for c in digits.chars() {
        if c == '_' {
            if !after_digit {
                return None;
            }
            after_digit = false;
            trailing = true;
        } else {
            cleaned.push(c);
            after_digit = true;
            trailing = false;
        }
    }
    (!trailing).then_some(cleaned)
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Parse a duration literal such as `300ms`, `1.5h` or `2h45m`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0`
/// is accepted. Negative durations are rejected. Terms are checked against
/// that unit set and rewritten into a form [`humantime::parse_duration`]
/// accepts, which then does the arithmetic.
pub fn parse_duration(raw: &str) -> Result<Duration, ParseError> {
    let invalid = |reason: &'static str| ParseError::InvalidDuration {
        value: raw.to_string(),
        reason,
    };

    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let normalized = normalize_duration(rest).map_err(invalid)?;
    let duration = humantime::parse_duration(&normalized).map_err(|err| match err {
        humantime::DurationError::NumberOverflow => invalid("overflow"),
        _ => invalid("malformed duration"),
    })?;

    if negative && !duration.is_zero() {
        return Err(invalid("negative durations are not supported"));
    }
    // Durations are bounded by what fits in 64 bits of nanoseconds.
    if u64::try_from(duration.as_nanos()).is_err() {
        return Err(invalid("overflow"));
    }
    Ok(duration)
}

// Split `rest` into `<number><unit>` terms and join them with spaces.
// Fractional terms are folded into whole nanoseconds and `µs` becomes `us`.
fn normalize_duration(mut rest: &str) -> Result<String, &'static str> {
    let mut terms = Vec::new();
    while !rest.is_empty() {
        let whole_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (whole, after) = rest.split_at(whole_len);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after) => {
                let len = after.bytes().take_while(u8::is_ascii_digit).count();
                after.split_at(len)
            }
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err("expected a number");
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_len);
        let (unit, scale) = match unit {
            "ns" => ("ns", 1),
            "us" | "\u{b5}s" | "\u{3bc}s" => ("us", NANOS_PER_MICRO),
            "ms" => ("ms", NANOS_PER_MILLI),
            "s" => ("s", NANOS_PER_SECOND),
            "m" => ("m", 60 * NANOS_PER_SECOND),
            "h" => ("h", 3_600 * NANOS_PER_SECOND),
            "" => return Err("missing unit"),
            _ => return Err("unknown unit"),
        };

        if fraction.is_empty() {
            let whole = if whole.is_empty() { "0" } else { whole };
            terms.push(format!("{whole}{unit}"));
        } else {
            terms.push(format!("{}ns", fractional_nanos(whole, fraction, scale)?));
        }
        rest = next;
    }
    Ok(terms.join(" "))
}

// Digits beyond nanosecond precision are dropped.
fn fractional_nanos(whole: &str, fraction: &str, scale: u128) -> Result<u128, &'static str> {
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| "overflow")?
    };
    let mut numerator: u128 = 0;
    let mut denominator: u128 = 1;
    for digit in fraction.bytes().take(18) {
        numerator = numerator * 10 + u128::from(digit - b'0');
        denominator *= 10;
    }
    whole
        .checked_mul(scale)
        .and_then(|nanos| nanos.checked_add(numerator * scale / denominator))
        .ok_or("overflow")
}

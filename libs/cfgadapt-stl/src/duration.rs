use chrono::TimeDelta;
use serde_json::Value;

use cfgadapt_api::adapter::{DecodeAdapter, EncodeAdapter};
use cfgadapt_api::error::AdaptError;
use cfgadapt_api::value::{ParamType, ParamValue};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are ignored; they are below a nanosecond for
/// every unit.
const MAX_FRACTION_DIGITS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("invalid duration '{0}'")]
    Invalid(String),

    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },

    #[error("duration '{0}' out of range")]
    Overflow(String),
}

/// Parse a duration string: an optional sign followed by one or more
/// `<number><unit>` terms, e.g. `"300ms"`, `"-1.5h"`, `"2h45m"`.
///
/// Units: `ns`, `us` (`µs`, `μs`), `ms`, `s`, `m`, `h`. A bare `"0"` is accepted.
/// The result must fit in a signed 64-bit count of nanoseconds.
pub fn parse_duration(input: &str) -> Result<TimeDelta, DurationError> {
    let (neg, mut s) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if s == "0" {
        return Ok(TimeDelta::zero());
    }
    if s.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !s.is_empty() {
        let int_len = leading_digits(s);
        let int_part = &s[..int_len];
        s = &s[int_len..];

        let mut frac_part = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = leading_digits(rest);
            frac_part = &rest[..frac_len];
            s = &rest[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        let unit = &s[..unit_len];
        s = &s[unit_len..];
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let whole = parse_digits(int_part).ok_or_else(overflow)?;
        let mut term = whole.checked_mul(scale).ok_or_else(overflow)?;
        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
            let frac = parse_digits(digits).ok_or_else(overflow)?;
            // Truncates toward zero below one nanosecond.
            term = term
                .checked_add(frac * scale / 10u128.pow(digits.len() as u32))
                .ok_or_else(overflow)?;
        }
        total = total.checked_add(term).ok_or_else(overflow)?;
    }

    let limit = if neg {
        i64::MAX as u128 + 1
    } else {
        i64::MAX as u128
    };
    if total > limit {
        return Err(overflow());
    }
    let nanos = if neg {
        (-(total as i128)) as i64
    } else {
        total as i64
    };
    Ok(TimeDelta::nanoseconds(nanos))
}

/// Render a duration in the form accepted by [`parse_duration`].
///
/// Below one second a single unit is used with a fraction (`"1.5µs"`, `"250ms"`);
/// from one second upwards the form is `[<h>h][<m>m]<s>[.<frac>]s` with leading
/// zero units omitted (`"1h0m0s"`, `"1m30s"`, `"2.5s"`). Zero is `"0s"`.
pub fn format_duration(d: TimeDelta) -> String {
    let nanos = i128::from(d.num_seconds()) * NANOS_PER_SEC as i128 + i128::from(d.subsec_nanos());
    let sign = if nanos < 0 { "-" } else { "" };
    let u = nanos.unsigned_abs();

    if u == 0 {
        return "0s".to_string();
    }

    if u < NANOS_PER_SEC {
        let (body, unit) = if u < NANOS_PER_MICRO {
            (u.to_string(), "ns")
        } else if u < NANOS_PER_MILLI {
            (with_fraction(u, 3), "µs")
        } else {
            (with_fraction(u, 6), "ms")
        };
        return format!("{sign}{body}{unit}");
    }

    let secs = u / NANOS_PER_SEC;
    let seconds = with_fraction((secs % 60) * NANOS_PER_SEC + u % NANOS_PER_SEC, 9);
    let minutes = secs / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{sign}{hours}h{}m{seconds}s", minutes % 60)
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

/// `v / 10^prec` with the remainder as a decimal fraction, trailing zeros trimmed.
fn with_fraction(v: u128, prec: usize) -> String {
    let div = 10u128.pow(prec as u32);
    let (whole, rem) = (v / div, v % div);
    if rem == 0 {
        return whole.to_string();
    }
    let digits = format!("{rem:0prec$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// `None` on overflow. An empty string is zero.
fn parse_digits(digits: &str) -> Option<u128> {
    digits.bytes().try_fold(0u128, |acc, b| {
        acc.checked_mul(10)?.checked_add(u128::from(b - b'0'))
    })
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "\u{00b5}s" | "\u{03bc}s" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Decodes a config string into `ParamValue::Duration`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToDuration;

impl DecodeAdapter for StringToDuration {
    fn decode(&self, from: &Value, to: ParamType) -> Result<ParamValue, AdaptError> {
        match (from, to) {
            (Value::String(s), ParamType::Duration) => parse_duration(s)
                .map(ParamValue::Duration)
                .map_err(AdaptError::conversion),
            _ => Err(AdaptError::NotApplicable),
        }
    }
}

/// Encodes `ParamValue::Duration` as its canonical string.
///
/// Durations beyond the signed 64-bit nanosecond range fail with
/// [`DurationError::Overflow`], since no config string could decode back to them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationToCfg;

impl EncodeAdapter for DurationToCfg {
    fn encode(&self, from: &ParamValue) -> Result<Value, AdaptError> {
        match from {
            ParamValue::Duration(d) => match d.num_nanoseconds() {
                Some(_) => Ok(Value::String(format_duration(*d))),
                None => Err(AdaptError::conversion(DurationError::Overflow(
                    format_duration(*d),
                ))),
            },
            _ => Err(AdaptError::NotApplicable),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parses_simple_and_compound_terms() {
        assert_eq!(parse_duration("1s").unwrap(), TimeDelta::seconds(1));
        assert_eq!(parse_duration("0").unwrap(), TimeDelta::zero());
        assert_eq!(parse_duration("-0").unwrap(), TimeDelta::zero());
        assert_eq!(
            parse_duration("2h30m").unwrap(),
            TimeDelta::minutes(150)
        );
        assert_eq!(
            parse_duration("1h2m3s4ms5us6ns").unwrap(),
            TimeDelta::nanoseconds(3_723_004_005_006)
        );
        assert_eq!(parse_duration("+5m").unwrap(), TimeDelta::minutes(5));
        assert_eq!(parse_duration("-1.5h").unwrap(), TimeDelta::minutes(-90));
        assert_eq!(parse_duration(".5s").unwrap(), TimeDelta::milliseconds(500));
        assert_eq!(parse_duration("1.s").unwrap(), TimeDelta::seconds(1));
        assert_eq!(parse_duration("3µs").unwrap(), TimeDelta::microseconds(3));
        assert_eq!(parse_duration("3μs").unwrap(), TimeDelta::microseconds(3));
    }

    #[test]
    fn fractions_truncate_below_a_nanosecond() {
        assert_eq!(
            parse_duration("1.0000000019s").unwrap(),
            TimeDelta::nanoseconds(1_000_000_001)
        );
        assert_eq!(
            parse_duration("0.1234567890123456789123ms").unwrap(),
            TimeDelta::nanoseconds(123_456)
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            parse_duration("dogs").unwrap_err(),
            DurationError::Invalid("dogs".into())
        );
        assert!(matches!(parse_duration(""), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("-"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration(".s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("10"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(parse_duration("1s5"), Err(DurationError::MissingUnit(_))));
        assert_eq!(
            parse_duration("3days").unwrap_err(),
            DurationError::UnknownUnit {
                unit: "days".into(),
                input: "3days".into()
            }
        );
    }

    #[test]
    fn range_is_signed_64_bit_nanoseconds() {
        assert_eq!(
            parse_duration("9223372036854775807ns").unwrap(),
            TimeDelta::nanoseconds(i64::MAX)
        );
        assert_eq!(
            parse_duration("-9223372036854775808ns").unwrap(),
            TimeDelta::nanoseconds(i64::MIN)
        );
        assert!(matches!(
            parse_duration("9223372036854775808ns"),
            Err(DurationError::Overflow(_))
        ));
        assert!(matches!(
            parse_duration("3000000h"),
            Err(DurationError::Overflow(_))
        ));
        assert!(matches!(
            parse_duration("999999999999999999999999999999999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
        assert_eq!(format_duration(TimeDelta::hours(1)), "1h0m0s");
        assert_eq!(format_duration(TimeDelta::seconds(1)), "1s");
        assert_eq!(format_duration(TimeDelta::seconds(90)), "1m30s");
        assert_eq!(format_duration(TimeDelta::milliseconds(2_500)), "2.5s");
        assert_eq!(format_duration(TimeDelta::milliseconds(250)), "250ms");
        assert_eq!(format_duration(TimeDelta::nanoseconds(1_500)), "1.5µs");
        assert_eq!(format_duration(TimeDelta::nanoseconds(12)), "12ns");
        assert_eq!(format_duration(TimeDelta::minutes(-90)), "-1h30m0s");
        assert_eq!(
            format_duration(TimeDelta::nanoseconds(i64::MIN)),
            "-2562047h47m16.854775808s"
        );
    }

    #[test]
    fn adapters_match_only_their_pattern() {
        let got = StringToDuration
            .decode(&Value::from("1s"), ParamType::Duration)
            .unwrap();
        assert_eq!(got, ParamValue::Duration(TimeDelta::seconds(1)));

        let err = StringToDuration
            .decode(&Value::from("dogs"), ParamType::Duration)
            .unwrap_err();
        assert!(!err.is_not_applicable());

        for to in [ParamType::Timestamp, ParamType::Ip, ParamType::Str] {
            assert!(StringToDuration
                .decode(&Value::from("dogs"), to)
                .unwrap_err()
                .is_not_applicable());
        }
        assert!(StringToDuration
            .decode(&Value::from(5), ParamType::Duration)
            .unwrap_err()
            .is_not_applicable());

        assert_eq!(
            DurationToCfg
                .encode(&ParamValue::Duration(TimeDelta::seconds(1)))
                .unwrap(),
            Value::from("1s")
        );
        assert!(DurationToCfg
            .encode(&ParamValue::Str("1s".into()))
            .unwrap_err()
            .is_not_applicable());
    }

    #[test]
    fn encoding_refuses_durations_the_grammar_cannot_hold() {
        let d = TimeDelta::seconds(10_000_000_000);
        let err = DurationToCfg.encode(&ParamValue::Duration(d)).unwrap_err();
        assert!(!err.is_not_applicable());
        assert!(err.to_string().contains("2777777h46m40s"), "{err}");

        let max = TimeDelta::nanoseconds(i64::MAX);
        let encoded = DurationToCfg.encode(&ParamValue::Duration(max)).unwrap();
        assert_eq!(
            StringToDuration.decode(&encoded, ParamType::Duration).unwrap(),
            ParamValue::Duration(max)
        );
    }

    proptest! {
        #[test]
        fn round_trips(nanos in any::<i64>()) {
            let d = TimeDelta::nanoseconds(nanos);
            prop_assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }

        #[test]
        fn round_trips_whole_seconds(secs in -1_000_000i64..1_000_000) {
            let d = TimeDelta::seconds(secs);
            prop_assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }
}

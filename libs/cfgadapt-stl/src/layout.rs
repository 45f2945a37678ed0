//! Reference-date timestamp layouts.
//!
//! A layout is written as the reference time `Mon Jan 2 15:04:05 MST 2006`
//! (UTC offset `-0700`) would look in the desired format, e.g. `"2006-01-02"`
//! or `"02 Jan 06 15:04 -0700"`. Each recognized token of the reference time
//! stands for the corresponding field; everything else is literal text.
//!
//! | token | field |
//! |---|---|
//! | `2006` `06` | year, two-digit year |
//! | `01` `1` `Jan` `January` | month |
//! | `02` `2` `_2` | day of month (zero, none, space padded) |
//! | `002` `__2` | day of year (zero, space padded) |
//! | `Mon` `Monday` | weekday |
//! | `15` `03` `3` | hour (24h, 12h padded, 12h) |
//! | `04` `4` `05` `5` | minute, second |
//! | `PM` `pm` | AM/PM marker |
//! | `MST` | zone: `UTC` at offset zero, otherwise `-0700` style |
//! | `-0700` `-07:00` `-07` `-07:00:00` | UTC offset |
//! | `Z0700` `Z07:00` | UTC offset, `Z` for UTC |
//! | `.000` `.000000` `.000000000` | fractional seconds, exactly as many digits |
//! | `.999` `.999999` `.999999999` | fractional seconds, truncated, trailing zeros dropped |
//!
//! An underscore directly before `2006` is literal.
//!
//! Parsing is a little more lenient than formatting:
//!
//! - a 12-hour hour without an AM/PM marker is taken as written, so `12` is noon;
//! - seconds may carry a fraction even when the layout has none;
//! - weekday names are checked for spelling, not against the date;
//! - `MST` accepts a numeric offset or an upper-case abbreviation, the latter
//!   read as UTC.

use std::fmt::Write as _;
use std::iter;

use chrono::format::{Fixed, Item, Numeric, Pad, Parsed, parse_and_remainder};
use chrono::{DateTime, FixedOffset, Timelike};

pub const RFC3339: &str = "2006-01-02T15:04:05Z07:00";
pub const RFC3339_NANO: &str = "2006-01-02T15:04:05.999999999Z07:00";
pub const RFC1123Z: &str = "Mon, 02 Jan 2006 15:04:05 -0700";
pub const RFC822Z: &str = "02 Jan 06 15:04 -0700";
pub const KITCHEN: &str = "3:04PM";
pub const DATE_TIME: &str = "2006-01-02 15:04:05";
pub const DATE_ONLY: &str = "2006-01-02";
pub const TIME_ONLY: &str = "15:04:05";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed parsing time '{input}' as '{layout}': {source}")]
pub struct TimeParseError {
    pub input: String,
    pub layout: String,
    #[source]
    pub source: LayoutMismatch,
}

/// Why an input does not fit a layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutMismatch {
    #[error(transparent)]
    Field(#[from] chrono::ParseError),

    #[error("bad {0}")]
    Bad(&'static str),

    #[error("extra text '{0}'")]
    Extra(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed formatting time with layout '{layout}'")]
pub struct TimeFormatError {
    pub layout: String,
}

/// One compiled piece of a layout.
#[derive(Debug, Clone)]
enum Token {
    /// Literal text and fields chrono handles the same way in both directions.
    Item(Item<'static>),
    /// `03` / `3`.
    Hour12(Pad),
    /// `05` / `5`.
    Second(Pad),
    /// `Mon` / `Monday`.
    Weekday(Fixed),
    /// `MST`.
    Zone,
    /// `.000…` (`trim == false`) or `.999…` (`trim == true`).
    Fraction { digits: usize, trim: bool },
}

/// A compiled timestamp layout. Immutable once built.
#[derive(Debug, Clone)]
pub struct Layout {
    source: String,
    tokens: Vec<Token>,
}

impl Layout {
    pub fn new(layout: &str) -> Self {
        Self {
            source: layout.to_string(),
            tokens: compile(layout),
        }
    }

    /// The layout string this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parse `input` with this layout.
    ///
    /// Fields the layout does not carry default to zero: year 0, January,
    /// day 1, 00:00:00. A layout without an offset yields UTC.
    pub fn parse(&self, input: &str) -> Result<DateTime<FixedOffset>, TimeParseError> {
        self.parse_fields(input).map_err(|source| TimeParseError {
            input: input.to_string(),
            layout: self.source.clone(),
            source,
        })
    }

    /// Render `t` with this layout.
    pub fn format(&self, t: &DateTime<FixedOffset>) -> Result<String, TimeFormatError> {
        let mut out = String::new();
        for token in &self.tokens {
            format_token(&mut out, token, t).map_err(|_| TimeFormatError {
                layout: self.source.clone(),
            })?;
        }
        Ok(out)
    }

    fn parse_fields(&self, input: &str) -> Result<DateTime<FixedOffset>, LayoutMismatch> {
        let mut parsed = Parsed::new();
        let mut hour12 = None;
        let mut rest = input;
        let mut tokens = self.tokens.iter().peekable();

        while let Some(token) = tokens.next() {
            rest = match token {
                Token::Item(item) => parse_and_remainder(&mut parsed, rest, iter::once(item))?,
                Token::Hour12(pad) => {
                    let (hour, tail) = two_digits(rest, *pad, 12).ok_or(LayoutMismatch::Bad("hour"))?;
                    hour12 = Some(hour);
                    tail
                }
                Token::Second(pad) => {
                    let second = Item::Numeric(Numeric::Second, *pad);
                    let tail = parse_and_remainder(&mut parsed, rest, iter::once(second))?;
                    match (tokens.peek(), fraction(tail, None)) {
                        (Some(Token::Fraction { .. }), _) | (_, None) => tail,
                        (_, Some((nanos, tail))) => {
                            parsed.set_nanosecond(nanos)?;
                            tail
                        }
                    }
                }
                Token::Weekday(name) => {
                    let mut scratch = Parsed::new();
                    parse_and_remainder(&mut scratch, rest, iter::once(Item::Fixed(name.clone())))?
                }
                Token::Zone if rest.starts_with(['+', '-']) => {
                    let offset = Item::Fixed(Fixed::TimezoneOffset);
                    parse_and_remainder(&mut parsed, rest, iter::once(offset))?
                }
                Token::Zone => {
                    let len = rest.bytes().take_while(u8::is_ascii_uppercase).count();
                    if len < 3 {
                        return Err(LayoutMismatch::Bad("time zone"));
                    }
                    &rest[len..]
                }
                Token::Fraction { digits, trim } => {
                    let width = (!trim).then_some(*digits);
                    match fraction(rest, width) {
                        Some((nanos, tail)) => {
                            parsed.set_nanosecond(nanos)?;
                            tail
                        }
                        None if *trim => rest,
                        None => return Err(LayoutMismatch::Bad("fractional second")),
                    }
                }
            };
        }
        if !rest.is_empty() {
            return Err(LayoutMismatch::Extra(rest.to_string()));
        }

        if let Some(hour) = hour12 {
            let hour = match parsed.hour_div_12() {
                Some(1) if hour < 12 => hour + 12,
                Some(0) if hour == 12 => 0,
                _ => hour,
            };
            parsed.set_hour(i64::from(hour))?;
        }
        fill_defaults(&mut parsed)?;

        if parsed.offset().is_some() {
            Ok(parsed.to_datetime()?)
        } else {
            let naive = parsed.to_naive_datetime_with_offset(0)?;
            Ok(naive.and_utc().fixed_offset())
        }
    }
}

fn format_token(out: &mut String, token: &Token, t: &DateTime<FixedOffset>) -> std::fmt::Result {
    let item = match token {
        Token::Item(item) => item.clone(),
        Token::Hour12(pad) => Item::Numeric(Numeric::Hour12, *pad),
        Token::Second(pad) => Item::Numeric(Numeric::Second, *pad),
        Token::Weekday(name) => Item::Fixed(name.clone()),
        Token::Zone if t.offset().local_minus_utc() == 0 => return out.write_str("UTC"),
        Token::Zone => Item::Fixed(Fixed::TimezoneOffset),
        Token::Fraction { digits, trim } => {
            let nanos = format!("{:09}", t.nanosecond() % 1_000_000_000);
            let mut frac = &nanos[..*digits];
            if *trim {
                frac = frac.trim_end_matches('0');
                if frac.is_empty() {
                    return Ok(());
                }
            }
            return write!(out, ".{frac}");
        }
    };
    write!(out, "{}", t.format_with_items(iter::once(item)))
}

fn fill_defaults(parsed: &mut Parsed) -> chrono::ParseResult<()> {
    if parsed.year().is_none() && parsed.year_mod_100().is_none() {
        parsed.set_year(0)?;
    }
    if parsed.ordinal().is_none() {
        if parsed.month().is_none() {
            parsed.set_month(1)?;
        }
        if parsed.day().is_none() {
            parsed.set_day(1)?;
        }
    }
    if parsed.hour_mod_12().is_none() {
        // No hour at all, or a bare AM/PM marker.
        let pm = parsed.hour_div_12() == Some(1);
        parsed.set_hour(if pm { 12 } else { 0 })?;
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    Ok(())
}

/// One or two leading digits (exactly two for `Pad::Zero`) no larger than `max`.
fn two_digits(s: &str, pad: Pad, max: u32) -> Option<(u32, &str)> {
    let len = match pad {
        Pad::Zero => 2,
        _ => s.bytes().take(2).take_while(u8::is_ascii_digit).count(),
    };
    let digits = s.get(..len).filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))?;
    let value: u32 = digits.parse().ok()?;
    (value <= max).then_some((value, &s[len..]))
}

/// A `.` and a digit run: exactly `width` digits, or the whole run when
/// `width` is `None`. Digits past nanoseconds are dropped.
fn fraction(s: &str, width: Option<usize>) -> Option<(i64, &str)> {
    let digits = s.strip_prefix('.')?;
    let run = digits.bytes().take_while(u8::is_ascii_digit).count();
    let len = width.unwrap_or(run);
    if len == 0 || run < len {
        return None;
    }

    let mut nanos = 0i64;
    for b in digits.bytes().take(len.min(9)) {
        nanos = nanos * 10 + i64::from(b - b'0');
    }
    for _ in len..9 {
        nanos *= 10;
    }
    Some((nanos, &digits[len..]))
}

/// Reference tokens, longest first where one is a prefix of another.
const TOKENS: &[(&str, Token)] = &[
    ("January", Token::Item(Item::Fixed(Fixed::LongMonthName))),
    ("Monday", Token::Weekday(Fixed::LongWeekdayName)),
    ("-07:00:00", Token::Item(Item::Fixed(Fixed::TimezoneOffsetDoubleColon))),
    ("Z07:00", Token::Item(Item::Fixed(Fixed::TimezoneOffsetColonZ))),
    ("-07:00", Token::Item(Item::Fixed(Fixed::TimezoneOffsetColon))),
    ("Z0700", Token::Item(Item::Fixed(Fixed::TimezoneOffsetZ))),
    ("-0700", Token::Item(Item::Fixed(Fixed::TimezoneOffset))),
    ("2006", Token::Item(Item::Numeric(Numeric::Year, Pad::Zero))),
    ("002", Token::Item(Item::Numeric(Numeric::Ordinal, Pad::Zero))),
    ("__2", Token::Item(Item::Numeric(Numeric::Ordinal, Pad::Space))),
    ("-07", Token::Item(Item::Fixed(Fixed::TimezoneOffsetTripleColon))),
    ("Jan", Token::Item(Item::Fixed(Fixed::ShortMonthName))),
    ("Mon", Token::Weekday(Fixed::ShortWeekdayName)),
    ("MST", Token::Zone),
    ("01", Token::Item(Item::Numeric(Numeric::Month, Pad::Zero))),
    ("02", Token::Item(Item::Numeric(Numeric::Day, Pad::Zero))),
    ("_2", Token::Item(Item::Numeric(Numeric::Day, Pad::Space))),
    ("03", Token::Hour12(Pad::Zero)),
    ("04", Token::Item(Item::Numeric(Numeric::Minute, Pad::Zero))),
    ("05", Token::Second(Pad::Zero)),
    ("06", Token::Item(Item::Numeric(Numeric::YearMod100, Pad::Zero))),
    ("15", Token::Item(Item::Numeric(Numeric::Hour, Pad::Zero))),
    ("PM", Token::Item(Item::Fixed(Fixed::UpperAmPm))),
    ("pm", Token::Item(Item::Fixed(Fixed::LowerAmPm))),
    ("1", Token::Item(Item::Numeric(Numeric::Month, Pad::None))),
    ("2", Token::Item(Item::Numeric(Numeric::Day, Pad::None))),
    ("3", Token::Hour12(Pad::None)),
    ("4", Token::Item(Item::Numeric(Numeric::Minute, Pad::None))),
    ("5", Token::Second(Pad::None)),
];

fn compile(layout: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = layout;

    while !rest.is_empty() {
        // `_2006` is an underscore followed by the year, not `_2` then `006`.
        if rest.starts_with("_2006") {
            literal.push('_');
            rest = &rest[1..];
            continue;
        }

        let matched = fraction_token(rest).or_else(|| {
            TOKENS
                .iter()
                .find(|(text, _)| rest.starts_with(text))
                .map(|(text, token)| (text.len(), token.clone()))
        });

        match matched {
            Some((len, token)) => {
                if !literal.is_empty() {
                    let text = std::mem::take(&mut literal);
                    tokens.push(Token::Item(Item::OwnedLiteral(text.into())));
                }
                tokens.push(token);
                rest = &rest[len..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    literal.push(c);
                }
                rest = chars.as_str();
            }
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Item(Item::OwnedLiteral(literal.into())));
    }
    tokens
}

/// `.000`, `.999999` and friends: a dot, then a run of one repeated `0` or
/// `9` not followed by another digit. Runs longer than nine count as nine.
fn fraction_token(s: &str) -> Option<(usize, Token)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'.') {
        return None;
    }
    let digit = *bytes.get(1)?;
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let run = bytes[1..].iter().take_while(|&&b| b == digit).count();
    if bytes.get(1 + run).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let token = Token::Fraction {
        digits: run.min(9),
        trim: digit == b'9',
    };
    Some((1 + run, token))
}

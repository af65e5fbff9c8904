//! Timestamp formatting utilities
//!
//! Record times are rendered in several shapes: the token patterns used by
//! text templates (`YYYY-MM-DD HH:mm:ss.SSS Z`), ISO 8601 for JSON output,
//! and the `H:MM:SS.ffffff` form used for elapsed durations.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;
use std::time::Duration;

/// Standardized timestamp format options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    /// ISO 8601 with microseconds and offset: `2025-01-08T10:30:45.123456+07:00`
    Iso8601,

    /// ISO 8601 to the second with compact offset: `2025-01-08T10:30:45+0700`
    ///
    /// Used for the `timestamp` key of JSON log lines.
    IsoSeconds,

    /// Token pattern, see [`TimePattern`]
    Pattern(TimePattern),

    /// Raw strftime format
    Custom(String),
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Pattern(TimePattern::default())
    }
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string(),
            TimestampFormat::IsoSeconds => datetime.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            TimestampFormat::Pattern(pattern) => pattern.render(datetime),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}

/// Seconds since the Unix epoch with microsecond precision
#[must_use]
pub fn unix_seconds(datetime: &DateTime<Local>) -> f64 {
    datetime.timestamp_micros() as f64 / 1_000_000.0
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TimeToken {
    Literal(String),
    Strftime(&'static str),
    /// Fractional seconds truncated to N digits
    Fraction(usize),
}

// Longest tokens first so `YYYY` wins over `YY`
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DDDD", "%j"),
    ("DDD", "%-j"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("d", "%u"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
    ("zz", "%Z"),
    ("X", "%s"),
];

/// Compiled time pattern
///
/// Tokens: `YYYY YY MMMM MMM MM M DDDD DDD DD D dddd ddd d HH H hh h mm m
/// ss s S..SSSSSSSSS A Z ZZ zz X`. Text inside `[...]` is literal. A
/// trailing `!UTC` renders in UTC instead of local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePattern {
    tokens: Vec<TimeToken>,
    utc: bool,
}

impl Default for TimePattern {
    fn default() -> Self {
        Self::parse("YYYY-MM-DDTHH:mm:ss.SSSSSSZZ")
    }
}

impl TimePattern {
    pub fn parse(pattern: &str) -> Self {
        let (pattern, utc) = match pattern.strip_suffix("!UTC") {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        'outer: while !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix('[') {
                if let Some(end) = stripped.find(']') {
                    literal.push_str(&stripped[..end]);
                    rest = &stripped[end + 1..];
                    continue;
                }
            }

            let run = rest.chars().take_while(|c| *c == 'S').count();
            if run > 0 {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(TimeToken::Fraction(run.min(9)));
                rest = &rest[run..];
                continue;
            }

            for &(token, spec) in TOKENS {
                if let Some(stripped) = rest.strip_prefix(token) {
                    flush_literal(&mut literal, &mut tokens);
                    tokens.push(TimeToken::Strftime(spec));
                    rest = stripped;
                    continue 'outer;
                }
            }

            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                literal.push(c);
            }
            rest = chars.as_str();
        }
        flush_literal(&mut literal, &mut tokens);

        Self { tokens, utc }
    }

    pub fn render(&self, datetime: &DateTime<Local>) -> String {
        if self.utc {
            self.render_in(&datetime.with_timezone(&Utc))
        } else {
            self.render_in(datetime)
        }
    }

    fn render_in<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                TimeToken::Literal(text) => out.push_str(text),
                TimeToken::Strftime(spec) => out.push_str(&datetime.format(spec).to_string()),
                TimeToken::Fraction(digits) => {
                    let nanos = format!("{:09}", datetime.timestamp_subsec_nanos() % 1_000_000_000);
                    out.push_str(&nanos[..*digits]);
                }
            }
        }
        out
    }
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<TimeToken>) {
    if !literal.is_empty() {
        tokens.push(TimeToken::Literal(std::mem::take(literal)));
    }
}

/// Render a duration as `H:MM:SS[.ffffff]`, prefixed by `N day(s), `
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let micros = elapsed.subsec_micros();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{} day{}, ", days, if days == 1 { "" } else { "s" }));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_datetime() -> DateTime<Local> {
        // 2025-01-08 10:30:45.123456 local
        let naive = NaiveDate::from_ymd_opt(2025, 1, 8)
            .and_then(|d| d.and_hms_micro_opt(10, 30, 45, 123_456))
            .expect("valid datetime");
        Local.from_local_datetime(&naive).single().expect("unambiguous")
    }

    #[test]
    fn test_pattern_tokens() {
        let pattern = TimePattern::parse("YYYY-MM-DD HH:mm:ss.SSS");
        assert_eq!(pattern.render(&fixed_datetime()), "2025-01-08 10:30:45.123");
    }

    #[test]
    fn test_pattern_fraction_digits() {
        let dt = fixed_datetime();
        assert_eq!(TimePattern::parse("S").render(&dt), "1");
        assert_eq!(TimePattern::parse("SSSSSS").render(&dt), "123456");
        assert_eq!(TimePattern::parse("SSSSSSSSS").render(&dt), "123456000");
    }

    #[test]
    fn test_pattern_offset_tokens() {
        let dt = fixed_datetime();
        let colon = TimePattern::parse("Z").render(&dt);
        let compact = TimePattern::parse("ZZ").render(&dt);
        assert_eq!(colon, dt.format("%:z").to_string());
        assert_eq!(compact, dt.format("%z").to_string());
        assert_eq!(compact, colon.replace(':', ""));
    }

    #[test]
    fn test_pattern_literals_and_names() {
        let dt = fixed_datetime();
        assert_eq!(TimePattern::parse("[at] HH[h]").render(&dt), "at 10h");
        assert_eq!(TimePattern::parse("MMM D, YYYY").render(&dt), "Jan 8, 2025");
        assert_eq!(TimePattern::parse("dddd").render(&dt), "Wednesday");
        assert_eq!(TimePattern::parse("hh A").render(&dt), "10 AM");
    }

    #[test]
    fn test_pattern_utc_suffix() {
        let dt = fixed_datetime();
        let rendered = TimePattern::parse("HH:mm Z!UTC").render(&dt);
        assert!(rendered.ends_with("+00:00"));
    }

    #[test]
    fn test_iso_formats() {
        let dt = fixed_datetime();
        let iso = TimestampFormat::Iso8601.format(&dt);
        assert!(iso.starts_with("2025-01-08T10:30:45.123456"));
        let seconds = TimestampFormat::IsoSeconds.format(&dt);
        assert!(seconds.starts_with("2025-01-08T10:30:45"));
        assert!(!seconds.contains('.'));
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_unix_seconds() {
        let dt = fixed_datetime();
        let secs = unix_seconds(&dt);
        assert!((secs - dt.timestamp() as f64 - 0.123456).abs() < 1e-6);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_micros(3_723_000_500)), "1:02:03.000500");
        assert_eq!(format_elapsed(Duration::from_secs(86_400 + 5)), "1 day, 0:00:05");
        assert_eq!(format_elapsed(Duration::from_secs(2 * 86_400)), "2 days, 0:00:00");
    }
}

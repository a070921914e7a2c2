// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of evsched.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Schedule directive parsing
//!
//! A schedule line is either a price ceiling (`12p`) or a clock window
//! (`9-17`, `9:30-17:5`, `22.15-23`). Only the head line of the queue is
//! ever parsed.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// The single rule that drives one evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleDirective {
    /// Charge while the current unit price is at or below the ceiling
    PriceThreshold { ceiling_pence: u32 },

    /// Charge while the wall clock is inside `[start, end]`
    TimeWindow { start: NaiveTime, end: NaiveTime },
}

impl fmt::Display for ScheduleDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceThreshold { ceiling_pence } => write!(f, "{ceiling_pence}p"),
            Self::TimeWindow { start, end } => {
                write!(f, "{}-{}", start.format("%H:%M"), end.format("%H:%M"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveParseError {
    #[error("unrecognised directive '{0}'")]
    Unrecognised(String),

    #[error("price ceiling out of range in '{0}'")]
    PriceOutOfRange(String),

    #[error("invalid time '{value}' in '{line}': {reason}")]
    InvalidTime {
        line: String,
        value: String,
        reason: &'static str,
    },
}

/// Parse the head of a schedule queue.
///
/// Returns `Ok(None)` for an empty queue or a blank head line.
pub fn parse_head<S: AsRef<str>>(
    lines: &[S],
) -> Result<Option<ScheduleDirective>, DirectiveParseError> {
    let Some(head) = lines.first() else {
        return Ok(None);
    };

    let head = head.as_ref().trim();
    if head.is_empty() {
        return Ok(None);
    }

    parse_line(head).map(Some)
}

/// Parse a single directive line. Price ceilings take priority over windows.
///
/// Only the start of the line is classified; text after a complete directive
/// (`15p cheap`, `9-17 weekdays`) is ignored.
pub fn parse_line(line: &str) -> Result<ScheduleDirective, DirectiveParseError> {
    let line = line.trim();

    if let Some(ceiling_pence) = parse_price(line)? {
        return Ok(ScheduleDirective::PriceThreshold { ceiling_pence });
    }

    let unrecognised = || DirectiveParseError::Unrecognised(line.to_owned());

    let (start, rest) = scan_clock(line).ok_or_else(unrecognised)?;
    let rest = rest.trim_start().strip_prefix('-').ok_or_else(unrecognised)?;
    let (end, trailing) = scan_clock(rest.trim_start()).ok_or_else(unrecognised)?;

    let trailing = trailing.trim();
    if !trailing.is_empty() {
        debug!("Ignoring '{}' after window in '{}'", trailing, line);
    }

    let start = start.to_time(line)?;
    let end = end.to_time(line)?;

    if start > end {
        warn!(
            "Window '{}' starts after it ends and will never be active",
            line
        );
    }

    Ok(ScheduleDirective::TimeWindow { start, end })
}

/// Leading `<digits>p` -> ceiling in pence. `Ok(None)` when the line has another shape.
fn parse_price(line: &str) -> Result<Option<u32>, DirectiveParseError> {
    let Some((digits, rest)) = leading_digits(line, usize::MAX) else {
        return Ok(None);
    };
    if !rest.starts_with('p') {
        return Ok(None);
    }

    digits
        .parse::<u32>()
        .map(Some)
        .map_err(|_| DirectiveParseError::PriceOutOfRange(line.to_owned()))
}

/// Clock field as written, e.g. `9`, `9:30` or `22.15`
#[derive(Debug, Clone, Copy)]
struct ClockField<'a> {
    text: &'a str,
    hour: &'a str,
    minute: Option<&'a str>,
}

impl ClockField<'_> {
    fn to_time(self, line: &str) -> Result<NaiveTime, DirectiveParseError> {
        let invalid = |reason: &'static str| DirectiveParseError::InvalidTime {
            line: line.to_owned(),
            value: self.text.to_owned(),
            reason,
        };

        let hour: u32 = self
            .hour
            .parse()
            .map_err(|_| invalid("hour must be one or two digits"))?;
        let minute: u32 = match self.minute {
            Some(minute) => minute
                .parse()
                .map_err(|_| invalid("minute must be one or two digits"))?,
            None => 0,
        };

        if hour > 23 {
            return Err(invalid("hour must be between 0 and 23"));
        }
        if minute > 59 {
            return Err(invalid("minute must be between 0 and 59"));
        }

        NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| invalid("not a valid time of day"))
    }
}

/// Leading `H[:M]` or `H[.M]`, one or two digits each, and the unscanned rest
fn scan_clock(input: &str) -> Option<(ClockField<'_>, &str)> {
    let (hour, after_hour) = leading_digits(input, 2)?;
    let (minute, rest) = match after_hour
        .strip_prefix([':', '.'])
        .and_then(|s| leading_digits(s, 2))
    {
        Some((minute, rest)) => (Some(minute), rest),
        None => (None, after_hour),
    };

    let (text, _) = input.split_at(input.len() - rest.len());
    Some((ClockField { text, hour, minute }, rest))
}

/// Split off up to `max` leading ASCII digits, `None` if there are none
fn leading_digits(input: &str, max: usize) -> Option<(&str, &str)> {
    let len = input
        .bytes()
        .take(max)
        .take_while(u8::is_ascii_digit)
        .count();
    (len > 0).then(|| input.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_price_lines() {
        for n in [0_u32, 1, 7, 12, 15, 35, 100, 4_000_000_000] {
            let line = format!("{n}p");
            assert_eq!(
                parse_line(&line),
                Ok(ScheduleDirective::PriceThreshold { ceiling_pence: n }),
                "line {line}"
            );
        }
    }

    #[test]
    fn test_price_overflow_is_an_error() {
        assert!(matches!(
            parse_line("99999999999p"),
            Err(DirectiveParseError::PriceOutOfRange(_))
        ));
    }

    #[test]
    fn test_whole_hour_window() {
        assert_eq!(
            parse_line("9-17"),
            Ok(ScheduleDirective::TimeWindow {
                start: hm(9, 0),
                end: hm(17, 0),
            })
        );
    }

    #[test]
    fn test_window_with_minutes() {
        assert_eq!(
            parse_line("9:30-17:5"),
            Ok(ScheduleDirective::TimeWindow {
                start: hm(9, 30),
                end: hm(17, 5),
            })
        );
    }

    #[test]
    fn test_window_with_dot_separator_and_spaces() {
        assert_eq!(
            parse_line(" 22.15 - 23:45 "),
            Ok(ScheduleDirective::TimeWindow {
                start: hm(22, 15),
                end: hm(23, 45),
            })
        );
    }

    #[test]
    fn test_out_of_range_fields_fail() {
        for line in ["24-25", "9:60-10", "9-10:75", "99-100"] {
            assert!(
                matches!(
                    parse_line(line),
                    Err(DirectiveParseError::InvalidTime { .. })
                ),
                "line {line}"
            );
        }
    }

    #[test]
    fn test_garbage_is_unrecognised() {
        assert_eq!(
            parse_line("charge tonight"),
            Err(DirectiveParseError::Unrecognised("charge tonight".to_owned()))
        );
        assert!(parse_line("p").is_err());
        assert!(parse_line("12x").is_err());
        assert!(parse_line("123-4").is_err());
        assert!(parse_line("9:605-10").is_err());
        assert!(parse_line("-17").is_err());
    }

    #[test]
    fn test_text_after_price_is_ignored() {
        for line in ["15p cheap", "15pence", "15p # agile"] {
            assert_eq!(
                parse_line(line),
                Ok(ScheduleDirective::PriceThreshold { ceiling_pence: 15 }),
                "line {line}"
            );
        }
    }

    #[test]
    fn test_text_after_window_is_ignored() {
        assert_eq!(
            parse_line("9-17 weekdays"),
            Ok(ScheduleDirective::TimeWindow {
                start: hm(9, 0),
                end: hm(17, 0),
            })
        );
        assert_eq!(
            parse_line("22:30-23:45 # overnight top-up"),
            Ok(ScheduleDirective::TimeWindow {
                start: hm(22, 30),
                end: hm(23, 45),
            })
        );
    }

    #[test]
    fn test_annotated_head_line() {
        let lines = ["9.30-12 school run", "15p"];
        assert_eq!(
            parse_head(&lines),
            Ok(Some(ScheduleDirective::TimeWindow {
                start: hm(9, 30),
                end: hm(12, 0),
            }))
        );
    }

    #[test]
    fn test_inverted_window_is_kept_as_written() {
        assert_eq!(
            parse_line("22-6"),
            Ok(ScheduleDirective::TimeWindow {
                start: hm(22, 0),
                end: hm(6, 0),
            })
        );
    }

    #[test]
    fn test_parse_head_only_reads_first_line() {
        let lines = vec!["15p".to_owned(), "not a directive".to_owned()];
        assert_eq!(
            parse_head(&lines),
            Ok(Some(ScheduleDirective::PriceThreshold { ceiling_pence: 15 }))
        );
    }

    #[test]
    fn test_parse_head_empty() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(parse_head(&empty), Ok(None));
        assert_eq!(parse_head(&["   "]), Ok(None));
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let directive = parse_line("7:5-8").unwrap();
        assert_eq!(directive.to_string(), "07:05-08:00");
        assert_eq!(parse_line(&directive.to_string()), Ok(directive));
    }
}

//! Built-in predicates.
//!
//! Every function here has the [`BuiltinFn`](crate::registry::BuiltinFn)
//! signature. None of them mutate the bag; see [`crate::mutators`] for the
//! ones that do.

use crate::error::Result;
use crate::registry::RuleContext;
use crate::types::Arg;
use crate::value::{
    char_len, contains_loose, element_count, is_blank, is_blank_opt, loose_cmp, loose_eq,
    numeric as numeric_of, scalar_text, size_of,
};
use chrono::format::{ParseErrorKind, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{LazyLock, RwLock};

// ─── Cached regexes ─────────────────────────────────────────────────────────

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]|-?[1-9][0-9]*)$").unwrap());

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]|[1-9][0-9]*)$").unwrap());

static MULTI_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+,)*\d+$").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

static ALPHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());

static ALPHA_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

static ALPHA_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

fn matches(re: &Regex, value: &Value) -> bool {
    scalar_text(value).is_some_and(|text| re.is_match(&text))
}

fn other_value(ctx: &RuleContext<'_>, args: &[Arg]) -> Result<Value> {
    let other = ctx.text_arg(args, 0)?;
    Ok(ctx.value(&other).cloned().unwrap_or(Value::Null))
}

// ─── Presence ───────────────────────────────────────────────────────────────

pub(crate) fn required(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(!is_blank(value))
}

/// When the other field is filled in, this one must be too.
pub(crate) fn required_with(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let other = ctx.text_arg(args, 0)?;
    Ok(is_blank_opt(ctx.value(&other)) || !is_blank(value))
}

/// When the other field is blank, this one must be filled in.
pub(crate) fn required_without(
    ctx: &mut RuleContext<'_>,
    value: &Value,
    args: &[Arg],
) -> Result<bool> {
    let other = ctx.text_arg(args, 0)?;
    Ok(!is_blank_opt(ctx.value(&other)) || !is_blank(value))
}

pub(crate) fn accepted(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(match value {
        Value::String(s) => matches!(s.as_str(), "yes" | "on" | "1"),
        Value::Number(n) => n.as_i64() == Some(1),
        Value::Bool(b) => *b,
        _ => false,
    })
}

pub(crate) fn boolean(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1"),
        _ => false,
    })
}

// ─── Literal comparison ─────────────────────────────────────────────────────

fn compare_to_arg(
    ctx: &RuleContext<'_>,
    value: &Value,
    args: &[Arg],
    accept: fn(Ordering) -> bool,
) -> Result<bool> {
    let expected = ctx.arg(args, 0)?.to_value();
    Ok(loose_cmp(value, &expected).is_some_and(accept))
}

pub(crate) fn eq(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    Ok(loose_eq(value, &ctx.arg(args, 0)?.to_value()))
}

pub(crate) fn not_eq(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    Ok(!loose_eq(value, &ctx.arg(args, 0)?.to_value()))
}

pub(crate) fn lt(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_arg(ctx, value, args, Ordering::is_lt)
}

pub(crate) fn lte(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_arg(ctx, value, args, Ordering::is_le)
}

pub(crate) fn gt(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_arg(ctx, value, args, Ordering::is_gt)
}

pub(crate) fn gte(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_arg(ctx, value, args, Ordering::is_ge)
}

// ─── Cross-field comparison ─────────────────────────────────────────────────

fn compare_to_field(
    ctx: &RuleContext<'_>,
    value: &Value,
    args: &[Arg],
    accept: fn(Ordering) -> bool,
) -> Result<bool> {
    let other = other_value(ctx, args)?;
    Ok(loose_cmp(value, &other).is_some_and(accept))
}

pub(crate) fn eq_than(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    Ok(loose_eq(value, &other_value(ctx, args)?))
}

pub(crate) fn not_eq_than(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    Ok(!loose_eq(value, &other_value(ctx, args)?))
}

pub(crate) fn lt_than(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_field(ctx, value, args, Ordering::is_lt)
}

pub(crate) fn lte_than(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_field(ctx, value, args, Ordering::is_le)
}

pub(crate) fn gt_than(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_field(ctx, value, args, Ordering::is_gt)
}

pub(crate) fn gte_than(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_to_field(ctx, value, args, Ordering::is_ge)
}

// ─── Size ───────────────────────────────────────────────────────────────────

fn within(measure: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    match measure {
        Some(m) => min.is_none_or(|min| m >= min) && max.is_none_or(|max| m <= max),
        None => false,
    }
}

pub(crate) fn min(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let bound = ctx.number_arg(args, 0)?;
    Ok(within(size_of(value), Some(bound), None))
}

pub(crate) fn max(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let bound = ctx.number_arg(args, 0)?;
    Ok(within(size_of(value), None, Some(bound)))
}

pub(crate) fn between(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let (lo, hi) = (ctx.number_arg(args, 0)?, ctx.number_arg(args, 1)?);
    Ok(within(size_of(value), Some(lo), Some(hi)))
}

pub(crate) fn length(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let expected = ctx.number_arg(args, 0)?;
    Ok(char_len(value).is_some_and(|len| len as f64 == expected))
}

pub(crate) fn length_min(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let bound = ctx.number_arg(args, 0)?;
    Ok(within(char_len(value).map(|n| n as f64), Some(bound), None))
}

pub(crate) fn length_max(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let bound = ctx.number_arg(args, 0)?;
    Ok(within(char_len(value).map(|n| n as f64), None, Some(bound)))
}

pub(crate) fn length_between(
    ctx: &mut RuleContext<'_>,
    value: &Value,
    args: &[Arg],
) -> Result<bool> {
    let (lo, hi) = (ctx.number_arg(args, 0)?, ctx.number_arg(args, 1)?);
    Ok(within(char_len(value).map(|n| n as f64), Some(lo), Some(hi)))
}

pub(crate) fn count_min(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let bound = ctx.number_arg(args, 0)?;
    Ok(within(element_count(value).map(|n| n as f64), Some(bound), None))
}

pub(crate) fn count_max(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let bound = ctx.number_arg(args, 0)?;
    Ok(within(element_count(value).map(|n| n as f64), None, Some(bound)))
}

pub(crate) fn count_between(
    ctx: &mut RuleContext<'_>,
    value: &Value,
    args: &[Arg],
) -> Result<bool> {
    let (lo, hi) = (ctx.number_arg(args, 0)?, ctx.number_arg(args, 1)?);
    Ok(within(element_count(value).map(|n| n as f64), Some(lo), Some(hi)))
}

// ─── Type and format ────────────────────────────────────────────────────────

pub(crate) fn arr(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.is_array() || value.is_object())
}

pub(crate) fn numeric(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(numeric_of(value).is_some())
}

/// Whole number, negatives allowed, no leading zeros.
pub(crate) fn integer(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(matches(&INTEGER_RE, value))
}

/// Non-negative whole number, no leading zeros.
pub(crate) fn number(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(matches(&NUMBER_RE, value))
}

/// Comma-separated non-negative whole numbers, e.g. `1,2,30`.
pub(crate) fn multi_number(
    _ctx: &mut RuleContext<'_>,
    value: &Value,
    _args: &[Arg],
) -> Result<bool> {
    Ok(matches(&MULTI_NUMBER_RE, value))
}

pub(crate) fn ip(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.as_str().is_some_and(|s| s.parse::<IpAddr>().is_ok()))
}

pub(crate) fn ipv4(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.as_str().is_some_and(|s| s.parse::<Ipv4Addr>().is_ok()))
}

pub(crate) fn ipv6(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.as_str().is_some_and(|s| s.parse::<Ipv6Addr>().is_ok()))
}

pub(crate) fn email(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.as_str().is_some_and(|s| EMAIL_RE.is_match(s)))
}

pub(crate) fn ascii(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(scalar_text(value).is_some_and(|s| s.is_ascii()))
}

pub(crate) fn url(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.as_str().is_some_and(|s| URL_RE.is_match(s)))
}

pub(crate) fn alpha(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(value.as_str().is_some_and(|s| ALPHA_RE.is_match(s)))
}

pub(crate) fn alpha_num(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(matches(&ALPHA_NUM_RE, value))
}

pub(crate) fn alpha_dash(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(matches(&ALPHA_DASH_RE, value))
}

/// `regex:<pattern>`. The pattern may be delimited (`/^a+$/i`); trailing
/// `i`, `m`, `s`, `x` flags are honoured, `u` is implied.
pub(crate) fn regex(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let raw = ctx.text_arg(args, 0)?;
    let re = cached_pattern(&raw).map_err(|e| ctx.invalid(e))?;
    Ok(matches(&re, value))
}

const PATTERN_CACHE_LIMIT: usize = 256;

static PATTERN_CACHE: LazyLock<RwLock<HashMap<String, Regex>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// [`compile_pattern`] memoized by the raw pattern text. Failures are not
/// cached; the cache is emptied once it holds `PATTERN_CACHE_LIMIT` patterns.
fn cached_pattern(raw: &str) -> std::result::Result<Regex, String> {
    let cached = PATTERN_CACHE
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(raw)
        .cloned();
    if let Some(re) = cached {
        return Ok(re);
    }
    let re = compile_pattern(raw)?;
    let mut cache = PATTERN_CACHE.write().unwrap_or_else(|e| e.into_inner());
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(raw.to_string(), re.clone());
    Ok(re)
}

/// Compile a pattern that is either bare or wrapped in delimiters with flags.
pub fn compile_pattern(raw: &str) -> std::result::Result<Regex, String> {
    let (pattern, flags) = split_delimited(raw).unwrap_or((raw, ""));
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => &mut builder,
            other => return Err(format!("unsupported pattern flag '{}'", other)),
        };
    }
    builder.build().map_err(|e| e.to_string())
}

fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let open = raw.chars().next()?;
    if !matches!(open, '/' | '#' | '~' | '!' | '@' | '%' | '`') {
        return None;
    }
    let body = &raw[open.len_utf8()..];
    let end = body.rfind(open)?;
    let flags = &body[end + open.len_utf8()..];
    if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((&body[..end], flags))
}

// ─── Sets ───────────────────────────────────────────────────────────────────

/// Candidate members from rule arguments: a single list argument contributes
/// its items, a single map argument its keys, otherwise every argument counts.
fn members(args: &[Arg]) -> Vec<Value> {
    match args {
        [Arg::List(items)] => items.iter().map(Arg::to_value).collect(),
        [Arg::Map(entries)] => entries
            .iter()
            .map(|(key, _)| Value::String(key.clone()))
            .collect(),
        _ => args.iter().map(Arg::to_value).collect(),
    }
}

/// Items of a list value; keys of a map value.
fn items_of(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => Some(map.keys().map(|k| Value::String(k.clone())).collect()),
        _ => None,
    }
}

pub(crate) fn in_list(_ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    Ok(contains_loose(&members(args), value))
}

pub(crate) fn not_in_list(_ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    Ok(!contains_loose(&members(args), value))
}

pub(crate) fn list_contains(
    ctx: &mut RuleContext<'_>,
    value: &Value,
    args: &[Arg],
) -> Result<bool> {
    let needle = ctx.arg(args, 0)?.to_value();
    Ok(items_of(value).is_some_and(|items| contains_loose(&items, &needle)))
}

/// Substring test; both sides must be text.
pub(crate) fn contains(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let needle = ctx.text_arg(args, 0)?;
    Ok(value.as_str().is_some_and(|s| s.contains(needle.as_str())))
}

/// Every element of the value is one of the arguments. A scalar value is
/// checked as a single element.
pub(crate) fn subset(_ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let parent = members(args);
    Ok(match value {
        Value::Array(items) => items.iter().all(|item| contains_loose(&parent, item)),
        Value::Object(map) => map.values().all(|item| contains_loose(&parent, item)),
        scalar => contains_loose(&parent, scalar),
    })
}

/// A list (or map) whose values are pairwise distinct.
pub(crate) fn contains_unique(
    _ctx: &mut RuleContext<'_>,
    value: &Value,
    _args: &[Arg],
) -> Result<bool> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => return Ok(false),
    };
    Ok(items
        .iter()
        .enumerate()
        .all(|(i, a)| items[i + 1..].iter().all(|b| a != b)))
}

// ─── Dates ──────────────────────────────────────────────────────────────────

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Seconds since the epoch for a date or date-time string. Values without a
/// zone are read as UTC.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
    }
    None
}

fn timestamp_of(value: &Value) -> Option<i64> {
    value.as_str().and_then(parse_timestamp)
}

pub(crate) fn date(_ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(timestamp_of(value).is_some())
}

/// `date_format:<fmt>` with single-letter format codes, e.g. `Y-m-d H:i:s`.
pub(crate) fn date_format(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let format = translate_date_format(&ctx.text_arg(args, 0)?);
    let Some(text) = value.as_str() else {
        return Ok(false);
    };
    let mut parsed = Parsed::new();
    if chrono::format::parse(&mut parsed, text, StrftimeItems::new(&format)).is_err() {
        return Ok(false);
    }
    // Formats without a full date are fine; a full date must exist.
    match parsed.to_naive_date() {
        Ok(_) => Ok(true),
        Err(e) => Ok(e.kind() == ParseErrorKind::NotEnough),
    }
}

/// Translate single-letter date format codes (`Y-m-d H:i:s`) to chrono
/// specifiers. Unknown letters are kept literally; `\` escapes the next
/// character.
pub fn translate_date_format(letters: &str) -> String {
    let mut out = String::with_capacity(letters.len() * 2);
    let mut chars = letters.chars();
    while let Some(c) = chars.next() {
        let spec = match c {
            'Y' => "%Y",
            'y' => "%y",
            'm' | 'n' => "%m",
            'd' | 'j' => "%d",
            'H' | 'G' => "%H",
            'h' | 'g' => "%I",
            'i' => "%M",
            's' => "%S",
            'A' | 'a' => "%p",
            'D' => "%a",
            'l' => "%A",
            'M' => "%b",
            'F' => "%B",
            'U' => "%s",
            'O' => "%z",
            'P' => "%:z",
            '%' => "%%",
            '\\' => {
                if let Some(escaped) = chars.next() {
                    if escaped == '%' {
                        out.push_str("%%");
                    } else {
                        out.push(escaped);
                    }
                }
                continue;
            }
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

fn compare_dates(
    ctx: &RuleContext<'_>,
    value: &Value,
    args: &[Arg],
    accept: fn(Ordering) -> bool,
) -> Result<bool> {
    let other = ctx.text_arg(args, 0)?;
    Ok(match (timestamp_of(value), parse_timestamp(&other)) {
        (Some(a), Some(b)) => accept(a.cmp(&b)),
        _ => false,
    })
}

pub(crate) fn before(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_dates(ctx, value, args, Ordering::is_lt)
}

pub(crate) fn after(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    compare_dates(ctx, value, args, Ordering::is_gt)
}

/// Seconds from the other field's date to this field's date.
fn span_from_other(ctx: &RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<Option<f64>> {
    let other = other_value(ctx, args)?;
    Ok(match (timestamp_of(value), timestamp_of(&other)) {
        (Some(a), Some(b)) => Some((a - b) as f64),
        _ => None,
    })
}

/// `time_scope_max:<other>,<seconds>`: at most `seconds` after the other field.
pub(crate) fn time_scope_max(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let period = ctx.number_arg(args, 1)?;
    Ok(span_from_other(ctx, value, args)?.is_some_and(|span| span <= period))
}

/// `time_scope_min:<other>,<seconds>`: at least `seconds` after the other field.
pub(crate) fn time_scope_min(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let period = ctx.number_arg(args, 1)?;
    Ok(span_from_other(ctx, value, args)?.is_some_and(|span| span >= period))
}

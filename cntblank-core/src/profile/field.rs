use super::datetime::parse_datetime;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Header of the 14-column display row produced by [`Field::format`].
pub const REPORT_COLUMNS: [&str; 14] = [
    "seq",
    "Name",
    "#Blank",
    "%Blank",
    "MinLength",
    "MaxLength",
    "#Int",
    "#Float",
    "#Bool",
    "#Time",
    "Minimum",
    "Maximum",
    "#True",
    "#False",
];

const TIME_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

// no printable ASCII, no half-width katakana/hangul/symbols
static RE_FULL_WIDTH: OnceLock<Regex> = OnceLock::new();

fn re_full_width() -> &'static Regex {
    RE_FULL_WIDTH.get_or_init(|| {
        Regex::new(r"^[^\x{0020}-\x{007E}\x{FF61}-\x{FF9F}\x{FFA0}-\x{FFDC}\x{FFE8}-\x{FFEE}0-9a-zA-Z]+$")
            .unwrap()
    })
}

pub fn is_full_width(s: &str) -> bool {
    re_full_width().is_match(s)
}

pub fn parse_int(s: &str) -> Option<i64> {
    s.parse().ok()
}

pub fn parse_float(s: &str) -> Option<f64> {
    s.parse().ok()
}

/// Exactly these tokens count as booleans; "yes", "on" and friends do not.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Smallest and largest value seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Extent<T> {
    pub fn new(v: T) -> Self {
        Self { min: v, max: v }
    }

    /// widen `slot` to cover `v`, creating it on the first value
    pub fn include(slot: &mut Option<Self>, v: T) {
        match slot {
            Some(e) => {
                if v < e.min {
                    e.min = v;
                }
                if v > e.max {
                    e.max = v;
                }
            }
            None => *slot = Some(Self::new(v)),
        }
    }
}

/// Running statistics for one column.
///
/// Every extent is `None` until its counter becomes nonzero, so an empty
/// column never reports a minimum or maximum.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// 1-based column position
    pub seq: usize,
    pub name: String,
    pub blank: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Extent<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_range: Option<Extent<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_range: Option<Extent<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<Extent<DateTime<FixedOffset>>>,
    pub true_count: u64,
    pub false_count: u64,
    pub int_type: u64,
    pub float_type: u64,
    pub bool_type: u64,
    pub time_type: u64,
    #[serde(skip)]
    pub full_width: u64,
}

impl Field {
    pub fn new(seq: usize, name: impl Into<String>) -> Self {
        Self {
            seq,
            name: name.into(),
            ..Self::default()
        }
    }

    /// A column first seen after `prior_records` rows: it was blank in all of them.
    pub fn backfilled(seq: usize, prior_records: u64) -> Self {
        Self {
            blank: prior_records,
            ..Self::new(seq, column_name(seq))
        }
    }

    /// Fold one cell into the statistics. Returns true when the cell was blank.
    pub fn fold(&mut self, cell: &str) -> bool {
        let val = cell.trim();
        if val.is_empty() {
            self.blank += 1;
            return true;
        }
        Extent::include(&mut self.length, val.chars().count());
        if is_full_width(val) {
            self.full_width += 1;
        }
        // independent checks: "1" is an int, a float and a bool at once
        if let Some(v) = parse_int(val) {
            self.int_type += 1;
            Extent::include(&mut self.int_range, v);
        }
        if let Some(v) = parse_float(val) {
            self.float_type += 1;
            Extent::include(&mut self.float_range, v);
        }
        if let Some(v) = parse_bool(val) {
            self.bool_type += 1;
            if v {
                self.true_count += 1;
            } else {
                self.false_count += 1;
            }
        }
        if let Some(v) = parse_datetime(val) {
            self.time_type += 1;
            Extent::include(&mut self.time_range, v);
        }
        false
    }

    /// Render as the 14 display columns, given the report's record count.
    pub fn format(&self, total: u64) -> [String; 14] {
        let count = |n: u64| if n > 0 { n.to_string() } else { String::new() };
        let (minimum, maximum) = self.display_range();
        let (trues, falses) = if self.bool_type > 0 {
            (self.true_count.to_string(), self.false_count.to_string())
        } else {
            (String::new(), String::new())
        };
        [
            self.seq.to_string(),
            self.name.clone(),
            self.blank.to_string(),
            blank_ratio(self.blank, total),
            self.length.map(|l| l.min.to_string()).unwrap_or_default(),
            self.length.map(|l| l.max.to_string()).unwrap_or_default(),
            count(self.int_type),
            count(self.float_type),
            count(self.bool_type),
            count(self.time_type),
            minimum,
            maximum,
            trues,
            falses,
        ]
    }

    /// Minimum and maximum as displayed: times win over numbers only when
    /// more cells parsed as times than as floats. With both ints and floats,
    /// each side shows the integer when it is `<=` the float, the float otherwise.
    fn display_range(&self) -> (String, String) {
        if self.time_type > self.float_type {
            if let Some(t) = self.time_range {
                return (
                    t.min.format(TIME_DISPLAY).to_string(),
                    t.max.format(TIME_DISPLAY).to_string(),
                );
            }
        }
        match (self.int_range, self.float_range) {
            (Some(i), Some(f)) => (
                if i.min as f64 <= f.min {
                    i.min.to_string()
                } else {
                    format!("{:.4}", f.min)
                },
                if i.max as f64 <= f.max {
                    i.max.to_string()
                } else {
                    format!("{:.4}", f.max)
                },
            ),
            (None, Some(f)) => (format!("{:.4}", f.min), format!("{:.4}", f.max)),
            (Some(i), None) => (i.min.to_string(), i.max.to_string()),
            (None, None) => (String::new(), String::new()),
        }
    }
}

/// synthesized name for a column with no usable header
pub fn column_name(seq: usize) -> String {
    format!("Column{seq:03}")
}

fn blank_ratio(blank: u64, total: u64) -> String {
    if total == 0 {
        return String::new();
    }
    format!("{:.4}", blank as f64 / total as f64)
}

//! Field-level readers over untyped JSON.
//!
//! Each reader records a [`FieldViolation`] instead of returning early, so a
//! single pass over the input reports every problem at once. A JSON `null` is
//! treated the same as an absent field.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::FieldViolation;
use crate::models::{ComponentAmounts, IncomeComponentType};

/// Largest amount accepted for any monetary or hour figure.
///
/// Keeps every product and sum the rulesets compute well inside the range of
/// [`Decimal`].
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Accumulates violations for one validation pass.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldViolation::new(path, reason));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_inner(self) -> Vec<FieldViolation> {
        self.0
    }
}

/// A JSON object being read at a known path.
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    /// Opens `value` as an object, recording a violation if it is not one.
    pub(crate) fn open(value: &'a Value, path: &str, violations: &mut Violations) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                map,
                path: path.to_string(),
            }),
            _ => {
                violations.push(display_path(path), "must be an object");
                None
            }
        }
    }

    /// Full path of a child key.
    pub(crate) fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn missing(&self, key: &str, violations: &mut Violations) {
        violations.push(self.path_of(key), "is required");
    }

    pub(crate) fn required_string(&self, key: &str, violations: &mut Violations) -> Option<String> {
        match self.get(key) {
            None => {
                self.missing(key, violations);
                None
            }
            Some(value) => self.string_value(key, value, violations),
        }
    }

    pub(crate) fn optional_string(&self, key: &str, violations: &mut Violations) -> Option<String> {
        self.get(key)
            .and_then(|value| self.string_value(key, value, violations))
    }

    fn string_value(&self, key: &str, value: &Value, violations: &mut Violations) -> Option<String> {
        match value.as_str().map(str::trim) {
            Some("") => {
                violations.push(self.path_of(key), "must not be empty");
                None
            }
            Some(s) => Some(s.to_string()),
            None => {
                violations.push(self.path_of(key), "must be a string");
                None
            }
        }
    }

    /// Reads a boolean, falling back to `default` when absent.
    pub(crate) fn bool_or(&self, key: &str, default: bool, violations: &mut Violations) -> bool {
        self.optional_bool(key, violations).unwrap_or(default)
    }

    pub(crate) fn optional_bool(&self, key: &str, violations: &mut Violations) -> Option<bool> {
        match self.get(key) {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                violations.push(self.path_of(key), "must be a boolean");
                None
            }
        }
    }

    /// Reads a required non-negative decimal.
    pub(crate) fn required_amount(&self, key: &str, violations: &mut Violations) -> Option<Decimal> {
        match self.get(key) {
            None => {
                self.missing(key, violations);
                None
            }
            Some(value) => amount_value(value, &self.path_of(key), violations),
        }
    }

    /// Reads an optional non-negative decimal.
    pub(crate) fn optional_amount(&self, key: &str, violations: &mut Violations) -> Option<Decimal> {
        self.get(key)
            .and_then(|value| amount_value(value, &self.path_of(key), violations))
    }

    pub(crate) fn required_date(&self, key: &str, violations: &mut Violations) -> Option<NaiveDate> {
        match self.get(key) {
            None => {
                self.missing(key, violations);
                None
            }
            Some(value) => date_value(value, &self.path_of(key), violations),
        }
    }

    pub(crate) fn optional_date(&self, key: &str, violations: &mut Violations) -> Option<NaiveDate> {
        self.get(key)
            .and_then(|value| date_value(value, &self.path_of(key), violations))
    }

    /// Reads an optional non-negative whole number.
    pub(crate) fn optional_count(&self, key: &str, violations: &mut Violations) -> Option<u32> {
        let value = self.get(key)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                violations.push(self.path_of(key), "must be a non-negative integer");
                None
            }
        }
    }

    /// Reads a required calendar year.
    pub(crate) fn required_year(&self, key: &str, violations: &mut Violations) -> Option<i32> {
        let Some(value) = self.get(key) else {
            self.missing(key, violations);
            return None;
        };
        match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
            Some(year) if (1900..=9999).contains(&year) => Some(year),
            _ => {
                violations.push(self.path_of(key), "must be a four-digit year");
                None
            }
        }
    }

    /// Reads a required value restricted to a closed set of names.
    pub(crate) fn required_enum<T>(
        &self,
        key: &str,
        allowed: &[(&str, T)],
        violations: &mut Violations,
    ) -> Option<T>
    where
        T: Copy,
    {
        let Some(value) = self.get(key) else {
            self.missing(key, violations);
            return None;
        };
        let found = value
            .as_str()
            .and_then(|s| allowed.iter().find(|(name, _)| *name == s))
            .map(|(_, v)| *v);
        if found.is_none() {
            let names: Vec<&str> = allowed.iter().map(|(name, _)| *name).collect();
            violations.push(
                self.path_of(key),
                format!("must be one of {}", names.join(", ")),
            );
        }
        found
    }

    /// Reads a component-keyed amount map.
    ///
    /// Unknown component names and negative amounts are violations; the
    /// remaining valid entries are still returned.
    pub(crate) fn components(
        &self,
        key: &str,
        required: bool,
        violations: &mut Violations,
    ) -> Option<ComponentAmounts> {
        let Some(value) = self.get(key) else {
            if required {
                self.missing(key, violations);
            }
            return None;
        };
        let path = self.path_of(key);
        let Value::Object(entries) = value else {
            violations.push(path, "must be an object keyed by income component");
            return None;
        };

        let mut amounts = ComponentAmounts::new();
        for (name, amount) in entries {
            let entry_path = format!("{}.{}", path, name);
            let component = IncomeComponentType::parse(name);
            if component.is_none() {
                violations.push(
                    entry_path.clone(),
                    "is not an income component (BASE, OVERTIME, BONUS, COMMISSION, \
                     SHIFT_DIFF, TIPS, OTHER)",
                );
            }
            if amount.is_null() {
                continue;
            }
            let parsed = amount_value(amount, &entry_path, violations);
            if let (Some(component), Some(parsed)) = (component, parsed) {
                amounts.set(component, parsed);
            }
        }
        Some(amounts)
    }

    /// Returns the elements of an array field with their paths.
    ///
    /// Absent optional arrays read as empty.
    pub(crate) fn array(
        &self,
        key: &str,
        required: bool,
        violations: &mut Violations,
    ) -> Vec<(String, &'a Value)> {
        let path = self.path_of(key);
        match self.get(key) {
            None => {
                if required {
                    self.missing(key, violations);
                }
                Vec::new()
            }
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (format!("{}[{}]", path, i), item))
                .collect(),
            Some(_) => {
                violations.push(path, "must be an array");
                Vec::new()
            }
        }
    }
}

impl<'a> Fields<'a> {
    /// Returns the elements of a required array that must not be empty.
    pub(crate) fn non_empty_array(
        &self,
        key: &str,
        noun: &str,
        violations: &mut Violations,
    ) -> Vec<(String, &'a Value)> {
        let items = self.array(key, true, violations);
        if items.is_empty() && matches!(self.get(key), Some(Value::Array(_))) {
            violations.push(self.path_of(key), format!("must contain at least one {}", noun));
        }
        items
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}

/// Parses a JSON number or numeric string into a normalized, non-negative
/// decimal.
fn amount_value(value: &Value, path: &str, violations: &mut Violations) -> Option<Decimal> {
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    match parsed {
        None => {
            violations.push(path, "must be a number");
            None
        }
        Some(d) if d.is_sign_negative() && !d.is_zero() => {
            violations.push(path, "must be non-negative");
            None
        }
        Some(d) if d > MAX_AMOUNT => {
            violations.push(path, format!("must not exceed {}", MAX_AMOUNT));
            None
        }
        Some(d) => Some(d.normalize()),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parses an ISO-8601 date or timestamp, keeping only the calendar date.
fn date_value(value: &Value, path: &str, violations: &mut Violations) -> Option<NaiveDate> {
    let parsed = value.as_str().map(str::trim).and_then(parse_iso_date);
    if parsed.is_none() {
        violations.push(path, "must be an ISO-8601 date (YYYY-MM-DD)");
    }
    parsed
}

pub(crate) fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

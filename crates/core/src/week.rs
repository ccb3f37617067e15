//! Week keys and the week axis.
//!
//! The axis is authoritative input from the backend snapshot. Nothing in
//! this module computes calendar weeks; it only orders and labels the keys
//! it was given.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Monday-anchored week identifier (`YYYY-MM-DD`), ordered as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(String);

impl WeekKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the key as a calendar date, if it is one.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }

    /// Short column label ("Jan 08"). Keys that are not dates label as themselves.
    pub fn label(&self) -> String {
        match self.date() {
            Some(d) => d.format("%b %d").to_string(),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WeekKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WeekKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for WeekKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The ordered week columns of one grid session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekAxis {
    keys: Vec<WeekKey>,
    index: HashMap<WeekKey, usize>,
}

impl WeekAxis {
    /// Build an axis from backend-supplied keys, kept in the given order.
    /// Duplicate keys keep their first position.
    pub fn new(keys: Vec<WeekKey>) -> Self {
        let mut index = HashMap::with_capacity(keys.len());
        let mut unique = Vec::with_capacity(keys.len());
        for key in keys {
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key.clone(), unique.len());
            unique.push(key);
        }
        Self { keys: unique, index }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[WeekKey] {
        &self.keys
    }

    pub fn get(&self, pos: usize) -> Option<&WeekKey> {
        self.keys.get(pos)
    }

    pub fn position(&self, key: &WeekKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &WeekKey) -> bool {
        self.index.contains_key(key)
    }

    /// The week after `key` in axis order.
    pub fn next(&self, key: &WeekKey) -> Option<&WeekKey> {
        self.position(key).and_then(|p| self.keys.get(p + 1))
    }

    /// The week before `key` in axis order.
    pub fn prev(&self, key: &WeekKey) -> Option<&WeekKey> {
        self.position(key)
            .and_then(|p| p.checked_sub(1))
            .and_then(|p| self.keys.get(p))
    }

    /// Weeks between two positions, inclusive, in either order.
    /// Out-of-range ends are clamped to the axis.
    pub fn span(&self, a: usize, b: usize) -> &[WeekKey] {
        if self.keys.is_empty() {
            return &[];
        }
        let last = self.keys.len() - 1;
        let lo = a.min(b).min(last);
        let hi = a.max(b).min(last);
        &self.keys[lo..=hi]
    }

    /// Move `delta` columns from `key`, clamped to the axis ends.
    pub fn offset(&self, key: &WeekKey, delta: isize) -> Option<&WeekKey> {
        let pos = self.position(key)? as isize;
        let target = (pos + delta).clamp(0, self.keys.len() as isize - 1);
        self.keys.get(target as usize)
    }

    pub fn labels(&self) -> Vec<String> {
        self.keys.iter().map(WeekKey::label).collect()
    }
}

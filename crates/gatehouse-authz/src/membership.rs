//! Loosely typed membership identifier lists.
//!
//! # Purpose
//! Role payloads carry permission identifiers the way browser forms submit
//! them: a single value or an array, numbers or numeric strings, with blanks
//! mixed in. [`IdList::normalize`] turns that into a clean list of ids.
//!
//! # Rules
//! - A scalar becomes a one-element list.
//! - Falsy entries are dropped: `null`, `false`, `0`, `""`, `"0"`.
//! - Positive integers and strings holding positive integers are kept.
//! - Anything else (`true`, negative numbers, fractions, words) is rejected
//!   with [`AuthzError::InvalidIdentifier`].
//! - Duplicates are removed; first-occurrence order is kept.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// 2^63; `i64::MAX as f64` rounds up to this value, so the bound is exclusive.
const I64_CEILING: f64 = 9_223_372_036_854_775_808.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl IdValue {
    /// `Ok(None)` for falsy entries, `Ok(Some(id))` for usable ids.
    fn resolve(&self) -> AuthzResult<Option<i64>> {
        match self {
            IdValue::Null | IdValue::Bool(false) => Ok(None),
            IdValue::Bool(true) => Err(AuthzError::InvalidIdentifier("true".to_string())),
            IdValue::Int(0) => Ok(None),
            IdValue::Int(value) if *value > 0 => Ok(Some(*value)),
            IdValue::Int(value) => Err(AuthzError::InvalidIdentifier(value.to_string())),
            IdValue::Float(value) if *value == 0.0 => Ok(None),
            IdValue::Float(value)
                if *value > 0.0 && value.fract() == 0.0 && *value < I64_CEILING =>
            {
                Ok(Some(*value as i64))
            }
            IdValue::Float(value) => Err(AuthzError::InvalidIdentifier(value.to_string())),
            IdValue::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                match trimmed.parse::<i64>() {
                    Ok(0) => Ok(None),
                    Ok(value) if value > 0 => Ok(Some(value)),
                    _ => Err(AuthzError::InvalidIdentifier(raw.clone())),
                }
            }
        }
    }
}

impl From<i64> for IdValue {
    fn from(value: i64) -> Self {
        IdValue::Int(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    Many(Vec<IdValue>),
    One(IdValue),
}

impl Default for IdList {
    fn default() -> Self {
        IdList::Many(Vec::new())
    }
}

impl From<Vec<i64>> for IdList {
    fn from(ids: Vec<i64>) -> Self {
        IdList::Many(ids.into_iter().map(IdValue::Int).collect())
    }
}

impl IdList {
    pub fn normalize(&self) -> AuthzResult<Vec<i64>> {
        let values: &[IdValue] = match self {
            IdList::Many(values) => values,
            IdList::One(value) => std::slice::from_ref(value),
        };
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(values.len());
        for value in values {
            if let Some(id) = value.resolve()?
                && seen.insert(id)
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

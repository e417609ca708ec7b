//! Document query model
//!
//! A [`Filter`] is a conjunction of per-field conditions over dotted paths
//! (`"album.release_date"` reaches into nested objects). Comparisons cover
//! what the pipeline queries need: equality, inequality and ordered
//! comparisons over numbers and strings (ISO dates compare correctly as
//! strings).

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::store::Document;

/// One field condition
#[derive(Debug, Clone)]
pub enum Cmp {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
}

/// Conjunction of field conditions; an empty filter matches everything
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Cmp)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), Cmp::Eq(value.into())));
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), Cmp::Ne(value.into())));
        self
    }

    pub fn gt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), Cmp::Gt(value.into())));
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), Cmp::Gte(value.into())));
        self
    }

    pub fn lt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), Cmp::Lt(value.into())));
        self
    }

    /// True when every condition holds for `doc`
    ///
    /// A missing field fails `Eq` and the ordered comparisons but satisfies
    /// `Ne`.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, cmp)| {
            let actual = lookup(doc, field);
            match cmp {
                Cmp::Eq(expected) => actual == Some(expected),
                Cmp::Ne(expected) => actual != Some(expected),
                Cmp::Gt(bound) => ordered(actual, bound, |o| o == Ordering::Greater),
                Cmp::Gte(bound) => ordered(actual, bound, |o| o != Ordering::Less),
                Cmp::Lt(bound) => ordered(actual, bound, |o| o == Ordering::Less),
            }
        })
    }
}

fn ordered(actual: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    actual
        .and_then(|value| compare(value, bound))
        .map(accept)
        .unwrap_or(false)
}

/// Sort order on a single dotted field
#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Sort `docs` in place; documents missing the field go last
    pub fn apply(&self, docs: &mut [Document]) {
        docs.sort_by(|a, b| {
            let left = lookup(a, &self.field);
            let right = lookup(b, &self.field);
            let ordering = match (left, right) {
                (Some(l), Some(r)) => compare(l, r).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if self.descending && left.is_some() && right.is_some() {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

/// Resolve a dotted path inside a document
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

/// Compare two JSON scalars: numbers numerically, strings lexically
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(l), Value::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => None,
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Keep only the named dotted paths of `doc`, rebuilding nested structure
pub fn project(doc: &Document, fields: &[&str]) -> Document {
    let mut out = Map::new();
    for path in fields {
        if let Some(value) = lookup(doc, path) {
            insert_path(&mut out, path, value.clone());
        }
    }
    Value::Object(out)
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(nested) = entry {
                insert_path(nested, rest, value);
            }
        }
    }
}

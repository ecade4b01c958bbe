//! Per-invocation state: desired fields, resolved references, results.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// A remote object as a JSON mapping.
pub type Object = Map<String, Value>;

/// Target state of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetState {
    #[default]
    Present,
    Absent,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::Present => "present",
            TargetState::Absent => "absent",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(TargetState::Present),
            "absent" => Ok(TargetState::Absent),
            other => Err(format!("invalid state '{other}', expected present or absent")),
        }
    }
}

/// Fields the caller wants set.
///
/// A field that is absent (or `null`) means "leave alone", never "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredState {
    name: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Desired state for the object with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        match value.into() {
            Value::Null => {
                self.fields.remove(&field);
            }
            value => {
                self.fields.insert(field, value);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when the field is missing or carries nothing usable.
    pub fn is_blank(&self, field: &str) -> bool {
        match self.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }
}

/// Borrow a JSON array of strings, or `None` if the value is anything else.
pub fn string_list(value: &Value) -> Option<Vec<&str>> {
    value.as_array()?.iter().map(Value::as_str).collect()
}

/// Outcome of resolving one reference field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Id(String),
    /// In user input order.
    Ids(Vec<String>),
    /// Speculative lookup failed for the given value; presence unknown.
    Unresolved(String),
}

impl Resolution {
    /// Value to send to the remote store, if resolved.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Resolution::Id(id) => Some(Value::String(id.clone())),
            Resolution::Ids(ids) => Some(Value::from(ids.clone())),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Resolved reference fields of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDeps {
    entries: BTreeMap<&'static str, Resolution>,
}

impl ResolvedDeps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, resolution: Resolution) {
        self.entries.insert(field, resolution);
    }

    pub fn get(&self, field: &str) -> Option<&Resolution> {
        self.entries.get(field)
    }
}

/// Result of one `apply`, as reported across the CLI boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    pub changed: bool,
    pub id: Option<String>,
    pub object: Option<Object>,
}

impl ApplyResult {
    pub fn new(changed: bool, object: Option<Object>) -> Self {
        let id = object
            .as_ref()
            .and_then(|o| o.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            changed,
            id,
            object,
        }
    }
}

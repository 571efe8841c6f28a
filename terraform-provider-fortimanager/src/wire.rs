//! Flatten/expand between FortiManager wire objects and Terraform state
//!
//! FortiManager keys are dashed (`link-cost-factor`) while Terraform
//! attributes are underscored (`link_cost_factor`). Every resource describes
//! its attributes as a list of [`Field`]s and this module does the copying in
//! both directions.

use crate::schema::{AttributeType, NestedBlock, SchemaAttribute, SchemaBlock};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use thiserror::Error;

/// Conversion errors
#[derive(Error, Debug, PartialEq)]
pub enum WireError {
    #[error("{field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: String,
    },
}

fn mismatch(field: &Field, expected: &'static str, actual: &Value) -> WireError {
    WireError::TypeMismatch {
        field: field.name.to_string(),
        expected,
        actual: actual.to_string(),
    }
}

/// Shape of a field's value
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Int,
    /// Ordered list, e.g. an address/netmask pair
    StringList,
    StringSet,
    IntSet,
    /// Repeated nested block, sorted by `key` on request
    Block {
        fields: Vec<Field>,
        key: &'static str,
    },
}

/// One attribute of a resource or nested block
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    wire: Option<&'static str>,
    pub kind: FieldKind,
    description: Option<&'static str>,
    pub required: bool,
    pub sensitive: bool,
    pub force_new: bool,
    pub read_only: bool,
}

impl Field {
    fn of(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            wire: None,
            kind,
            description: None,
            required: false,
            sensitive: false,
            force_new: false,
            read_only: false,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::of(name, FieldKind::String)
    }

    pub fn int(name: &'static str) -> Self {
        Self::of(name, FieldKind::Int)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::of(name, FieldKind::StringList)
    }

    pub fn string_set(name: &'static str) -> Self {
        Self::of(name, FieldKind::StringSet)
    }

    pub fn int_set(name: &'static str) -> Self {
        Self::of(name, FieldKind::IntSet)
    }

    pub fn block(name: &'static str, key: &'static str, fields: Vec<Field>) -> Self {
        Self::of(name, FieldKind::Block { fields, key })
    }

    /// Use a wire key that is not simply the dashed attribute name
    pub fn wire(mut self, wire: &'static str) -> Self {
        self.wire = Some(wire);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Reported by FortiManager, never sent
    #[cfg(test)]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn wire_name(&self) -> String {
        match self.wire {
            Some(wire) => wire.to_string(),
            None => self.name.replace('_', "-"),
        }
    }

    /// Add this field to a schema block, as an attribute or nested block
    pub fn add_to_schema(&self, block: SchemaBlock) -> SchemaBlock {
        let attr = match &self.kind {
            FieldKind::Block { fields, .. } => {
                let mut nested = fields
                    .iter()
                    .fold(SchemaBlock::new(), |block, field| field.add_to_schema(block));
                if let Some(description) = self.description {
                    nested = nested.with_description(description);
                }
                return block.with_block(self.name, NestedBlock::list(nested));
            }
            FieldKind::String => SchemaAttribute::string(),
            FieldKind::Int => SchemaAttribute::number(),
            FieldKind::StringList => SchemaAttribute::list(AttributeType::String),
            FieldKind::StringSet => SchemaAttribute::set(AttributeType::String),
            FieldKind::IntSet => SchemaAttribute::set(AttributeType::Number),
        };

        let mut attr = if self.required {
            attr.required()
        } else if self.read_only {
            attr.computed()
        } else if self.sensitive {
            attr.optional()
        } else {
            attr.optional().computed()
        };
        if self.sensitive {
            attr = attr.sensitive();
        }
        if self.force_new {
            attr = attr.force_new();
        }
        if let Some(description) = self.description {
            attr = attr.with_description(description);
        }
        block.with_attribute(self.name, attr)
    }
}

/// Ordering applied to nested block entries after a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Off,
    Lexical,
    Natural,
}

impl SortMode {
    /// Parse a `dynamic_sort_subtable` value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "false" => Some(SortMode::Off),
            "true" => Some(SortMode::Lexical),
            "natural" => Some(SortMode::Natural),
            _ => None,
        }
    }
}

/// Options for [`refresh_object`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Populate nested blocks even if the prior state has none
    pub importing: bool,
    pub sort: SortMode,
}

/// True for values Terraform treats as "not set"
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_int(value: &Value) -> Option<Option<i64>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => s.trim().parse().ok().map(Some),
        _ => None,
    }
}

fn int_value(n: i64) -> Value {
    Value::Number(Number::from(n))
}

// ============================================================================
// Flatten (wire -> state)
// ============================================================================

/// Convert one wire value into its state representation
pub fn flatten_value(field: &Field, value: &Value) -> Result<Value, WireError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match &field.kind {
        FieldKind::String => match value {
            // Enumerations sometimes come back as a one-element list
            Value::Array(items) if items.is_empty() => Ok(Value::Null),
            Value::Array(items) if items.len() == 1 => flatten_value(field, &items[0]),
            other => scalar_string(other)
                .map(Value::String)
                .ok_or_else(|| mismatch(field, "string", other)),
        },
        FieldKind::Int => match value {
            Value::Array(items) if items.len() == 1 => flatten_value(field, &items[0]),
            other => scalar_int(other)
                .map(|n| n.map(int_value).unwrap_or(Value::Null))
                .ok_or_else(|| mismatch(field, "integer", other)),
        },
        FieldKind::StringList | FieldKind::StringSet => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    scalar_string(item)
                        .map(Value::String)
                        .ok_or_else(|| mismatch(field, "list of strings", item))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::String(s) if s.is_empty() => Ok(Value::Array(Vec::new())),
            other => scalar_string(other)
                .map(|s| Value::Array(vec![Value::String(s)]))
                .ok_or_else(|| mismatch(field, "list of strings", other)),
        },
        FieldKind::IntSet => {
            let items = match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match scalar_int(item) {
                    Some(Some(n)) => out.push(int_value(n)),
                    Some(None) => {}
                    None => return Err(mismatch(field, "list of integers", item)),
                }
            }
            Ok(Value::Array(out))
        }
        FieldKind::Block { fields, .. } => {
            let mut entries = Vec::new();
            for item in block_items(field, value)? {
                entries.push(Value::Object(flatten_fields(
                    fields,
                    item,
                    None,
                    RefreshOptions::default(),
                )?));
            }
            Ok(Value::Array(entries))
        }
    }
}

fn block_items<'a>(field: &Field, value: &'a Value) -> Result<Vec<&'a Map<String, Value>>, WireError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(object) => Ok(vec![object]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| mismatch(field, "list of objects", item))
            })
            .collect(),
        other => Err(mismatch(field, "list of objects", other)),
    }
}

fn flatten_fields(
    fields: &[Field],
    wire: &Map<String, Value>,
    prior: Option<&Map<String, Value>>,
    options: RefreshOptions,
) -> Result<Map<String, Value>, WireError> {
    let mut out = Map::new();

    for field in fields {
        let prior_value = prior.and_then(|p| p.get(field.name));

        // FortiManager only ever returns these encrypted
        if field.sensitive {
            out.insert(
                field.name.to_string(),
                prior_value.cloned().unwrap_or(Value::Null),
            );
            continue;
        }

        let raw = wire.get(&field.wire_name());

        if let FieldKind::Block { fields: nested, key } = &field.kind {
            let configured = prior_value.map(|v| !is_zero(v)).unwrap_or(false);
            if !options.importing && !configured {
                out.insert(
                    field.name.to_string(),
                    prior_value.cloned().unwrap_or(Value::Null),
                );
                continue;
            }

            let prior_entries: Vec<&Map<String, Value>> = prior_value
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_object).collect())
                .unwrap_or_default();

            let key_wire = nested
                .iter()
                .find(|f| f.name == *key)
                .map(Field::wire_name)
                .unwrap_or_else(|| key.replace('_', "-"));

            let mut entries = Vec::new();
            let items = match raw {
                Some(value) => block_items(field, value)?,
                None => Vec::new(),
            };
            for (index, item) in items.into_iter().enumerate() {
                let matching = item
                    .get(&key_wire)
                    .and_then(|k| {
                        prior_entries.iter().copied().find(|p| {
                            p.get(*key).and_then(scalar_string) == scalar_string(k)
                        })
                    })
                    .or_else(|| prior_entries.get(index).copied());
                entries.push(Value::Object(flatten_fields(nested, item, matching, options)?));
            }
            sort_entries(&mut entries, key, options.sort);
            out.insert(field.name.to_string(), Value::Array(entries));
            continue;
        }

        let value = match raw {
            Some(value) => flatten_value(field, value)?,
            None => Value::Null,
        };
        out.insert(field.name.to_string(), value);
    }

    Ok(out)
}

/// Flatten a read response into state
///
/// Sensitive attributes keep their prior value. Nested blocks are only
/// written when the prior state configures them, or when importing.
pub fn refresh_object(
    fields: &[Field],
    response: &Map<String, Value>,
    prior: Option<&Map<String, Value>>,
    options: RefreshOptions,
) -> Result<Map<String, Value>, WireError> {
    flatten_fields(fields, response, prior, options)
}

fn sort_entries(entries: &mut [Value], key: &str, mode: SortMode) {
    if mode == SortMode::Off {
        return;
    }
    entries.sort_by(|a, b| {
        let a = a.get(key).unwrap_or(&Value::Null);
        let b = b.get(key).unwrap_or(&Value::Null);
        if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
            return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        }
        let a = scalar_string(a).unwrap_or_default();
        let b = scalar_string(b).unwrap_or_default();
        match mode {
            SortMode::Natural => natural_cmp(&a, &b),
            _ => a.cmp(&b),
        }
    });
}

/// Compare strings treating runs of digits as numbers ("port2" < "port10")
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut run_a = String::new();
                while let Some(c) = a.peek().copied().filter(char::is_ascii_digit) {
                    run_a.push(c);
                    a.next();
                }
                let mut run_b = String::new();
                while let Some(c) = b.peek().copied().filter(char::is_ascii_digit) {
                    run_b.push(c);
                    b.next();
                }
                let run_a = run_a.trim_start_matches('0');
                let run_b = run_b.trim_start_matches('0');
                let ord = run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

// ============================================================================
// Expand (state -> wire)
// ============================================================================

/// Convert one state value into its wire representation
///
/// Returns `None` for a null scalar, which is left out of the payload.
pub fn expand_value(field: &Field, value: &Value) -> Result<Option<Value>, WireError> {
    match &field.kind {
        FieldKind::String => match value {
            Value::Null => Ok(None),
            other => scalar_string(other)
                .map(|s| Some(Value::String(s)))
                .ok_or_else(|| mismatch(field, "string", other)),
        },
        FieldKind::Int => match value {
            Value::Null => Ok(None),
            other => scalar_int(other)
                .map(|n| n.map(int_value))
                .ok_or_else(|| mismatch(field, "integer", other)),
        },
        FieldKind::StringList | FieldKind::StringSet => match value {
            Value::Null => Ok(Some(Value::Array(Vec::new()))),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    scalar_string(item)
                        .map(Value::String)
                        .ok_or_else(|| mismatch(field, "list of strings", item))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(Value::Array(items))),
            other => Err(mismatch(field, "list of strings", other)),
        },
        FieldKind::IntSet => match value {
            Value::Null => Ok(Some(Value::Array(Vec::new()))),
            Value::Array(items) => items
                .iter()
                .map(|item| match scalar_int(item) {
                    Some(Some(n)) => Ok(int_value(n)),
                    _ => Err(mismatch(field, "list of integers", item)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(Value::Array(items))),
            other => Err(mismatch(field, "list of integers", other)),
        },
        FieldKind::Block { fields, .. } => {
            let mut entries = Vec::new();
            for item in block_items(field, value)? {
                entries.push(Value::Object(expand_fields(fields, item)?));
            }
            Ok(Some(Value::Array(entries)))
        }
    }
}

/// Expand every non-null member of a nested block entry
fn expand_fields(fields: &[Field], state: &Map<String, Value>) -> Result<Map<String, Value>, WireError> {
    let mut out = Map::new();
    for field in fields.iter().filter(|f| !f.read_only) {
        let value = match state.get(field.name) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };
        if let Some(expanded) = expand_value(field, value)? {
            out.insert(field.wire_name(), expanded);
        }
    }
    Ok(out)
}

/// Equality as Terraform sees it: sets ignore order, numbers ignore representation
fn same_value(field: &Field, a: &Value, b: &Value) -> bool {
    match (&field.kind, a, b) {
        (FieldKind::StringSet | FieldKind::IntSet, Value::Array(x), Value::Array(y)) => {
            let mut x: Vec<String> = x.iter().filter_map(scalar_string).collect();
            let mut y: Vec<String> = y.iter().filter_map(scalar_string).collect();
            x.sort();
            y.sort();
            x == y
        }
        (FieldKind::Int, Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        // An empty string or list is what an unset attribute looks like
        (_, Value::Null, other) | (_, other, Value::Null) => match other {
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            other => other.is_null(),
        },
        _ => a == b,
    }
}

/// Build the request payload from planned state
///
/// An attribute is sent when it holds a non-zero value or when it differs
/// from `prior`. Read-only attributes are never sent.
pub fn assemble_object(
    fields: &[Field],
    planned: &Map<String, Value>,
    prior: Option<&Map<String, Value>>,
) -> Result<Map<String, Value>, WireError> {
    let mut payload = Map::new();

    for field in fields.iter().filter(|f| !f.read_only) {
        let value = planned.get(field.name).unwrap_or(&Value::Null);
        let changed = prior
            .map(|p| !same_value(field, p.get(field.name).unwrap_or(&Value::Null), value))
            .unwrap_or(false);

        if is_zero(value) && !changed {
            continue;
        }
        if let Some(expanded) = expand_value(field, value)? {
            payload.insert(field.wire_name(), expanded);
        }
    }

    Ok(payload)
}

//! Typed argument schemas and call-time validation.

use jsonschema::JSONSchema;
use jsonschema::error::ValidationErrorKind;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Primitive type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// A JSON number, optionally bounded (bounds are inclusive).
    Number { min: Option<f64>, max: Option<f64> },
    String,
    Boolean,
}

impl FieldKind {
    pub fn number_in(min: f64, max: f64) -> Self {
        FieldKind::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Number { .. } => "number",
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub description: Option<String>,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            required: true,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Ordered set of argument declarations for one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    fields: Vec<FieldSpec>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Later declarations with the same name replace earlier ones.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    /// Render as a JSON Schema object, properties in declaration order.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(field.kind.type_name()));
            if let FieldKind::Number { min, max } = field.kind {
                if let Some(min) = min {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    prop.insert("maximum".into(), json!(max));
                }
            }
            if let Some(description) = &field.description {
                prop.insert("description".into(), json!(description));
            }
            properties.insert(field.name.clone(), Value::Object(prop));
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Compile the rendered JSON Schema into a reusable validator.
    pub fn compile(&self) -> Result<CompiledSchema, SchemaError> {
        let validator = JSONSchema::compile(&self.to_json_schema())
            .map_err(|e| SchemaError(e.to_string()))?;
        Ok(CompiledSchema {
            declared: self.fields.iter().map(|f| f.name.clone()).collect(),
            validator,
        })
    }
}

/// A generated schema the validator refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument schema: {0}")]
pub struct SchemaError(String);

/// Validator for one tool's arguments, compiled at registration.
pub struct CompiledSchema {
    declared: Vec<String>,
    validator: JSONSchema,
}

impl CompiledSchema {
    /// Check `arguments` against the schema.
    ///
    /// Missing or `null` arguments count as an empty object. Every offending
    /// field is reported, in declaration order. On success only declared
    /// fields are kept.
    pub fn validate(&self, arguments: Option<&Value>) -> Result<ToolArguments, ValidationError> {
        let empty = Value::Object(Map::new());
        let instance = match arguments {
            None | Some(Value::Null) => &empty,
            Some(value) => value,
        };

        if let Err(errors) = self.validator.validate(instance) {
            let mut fields: Vec<FieldError> = errors
                .map(|error| FieldError::new(&offending_field(&error), error.to_string()))
                .collect();
            fields.sort_by_key(|f| self.position(&f.field));
            return Err(ValidationError { fields });
        }

        let normalized = match instance {
            Value::Object(object) => self
                .declared
                .iter()
                .filter_map(|name| object.get(name).map(|value| (name.clone(), value.clone())))
                .collect(),
            _ => Map::new(),
        };
        Ok(ToolArguments(normalized))
    }

    /// Sort key: whole-object errors first, then declaration order.
    fn position(&self, field: &str) -> usize {
        if field.is_empty() {
            return 0;
        }
        self.declared
            .iter()
            .position(|name| name == field)
            .map_or(usize::MAX, |i| i + 1)
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}

/// Top-level argument an error is about; empty for the arguments object itself.
fn offending_field(error: &jsonschema::ValidationError<'_>) -> String {
    if let ValidationErrorKind::Required { property } = &error.kind {
        return property
            .as_str()
            .map_or_else(|| property.to_string(), str::to_string);
    }
    let path = error.instance_path.to_string();
    path.trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Arguments that passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(pub Map<String, Value>);

impl ToolArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    /// Fetch a number the schema declared as required.
    pub fn require_number(&self, name: &str) -> Result<f64, ValidationError> {
        self.number(name)
            .ok_or_else(|| ValidationError::single(name, "required number is missing"))
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Arguments rejected before the tool ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid arguments: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.field.is_empty() {
                f.message.clone()
            } else {
                format!("{}: {}", f.field, f.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

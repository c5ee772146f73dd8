//! Argument schemas and the validation/coercion applied before a handler runs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use super::{Arguments, ToolError};

/// Primitive type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    /// Convert `value` to this type, or `None` if it is not convertible.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamType::String, Value::String(_)) => Some(value.clone()),
            (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (ParamType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::from(i))
                } else {
                    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
                    n.as_f64()
                        .filter(|f| {
                            f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                        })
                        .map(|f| Value::from(f as i64))
                }
            }
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

            (ParamType::Number, Value::Number(_)) => Some(value.clone()),
            (ParamType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),

            (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamType::Boolean, Value::String(s)) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }

            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    /// Inclusive lower bound, integers only.
    pub minimum: Option<i64>,
    pub description: Option<String>,
}

impl ParamSpec {
    /// An optional parameter without a default.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default: None,
            minimum: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn check(&self, raw: &Value) -> Result<Value, ToolError> {
        let value = self.ty.coerce(raw).ok_or_else(|| {
            ToolError::invalid_argument(
                &self.name,
                format!("expected {}, got {}", self.ty, describe(raw)),
            )
        })?;

        if let (Some(minimum), Some(i)) = (self.minimum, value.as_i64()) {
            if i < minimum {
                return Err(ToolError::invalid_argument(
                    &self.name,
                    format!("must be at least {}, got {}", minimum, i),
                ));
            }
        }

        Ok(value)
    }
}

/// Ordered set of parameter declarations for one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSchema {
    params: Vec<ParamSpec>,
}

impl ArgSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.retain(|p| p.name != spec.name);
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Validate raw arguments, returning coerced values with defaults filled in.
    ///
    /// Parameters are checked in declaration order, then unknown names in
    /// sorted order; the first violation is reported. `null` counts as absent.
    pub fn validate(&self, args: &Arguments) -> Result<ToolArgs, ToolError> {
        let mut values = Map::new();

        for spec in &self.params {
            match args.get(&spec.name).filter(|v| !v.is_null()) {
                Some(raw) => {
                    values.insert(spec.name.clone(), spec.check(raw)?);
                }
                None if spec.required => {
                    return Err(ToolError::invalid_argument(
                        &spec.name,
                        "missing required parameter",
                    ));
                }
                None => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }

        let mut unknown: Vec<&String> = args.keys().filter(|k| self.get(k).is_none()).collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(ToolError::invalid_argument(name.as_str(), "unknown parameter"));
        }

        Ok(ToolArgs { values })
    }

    /// JSON Schema object describing the arguments, as published to MCP clients.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for spec in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(spec.ty.as_str()));
            if let Some(description) = &spec.description {
                prop.insert("description".into(), json!(description));
            }
            if let Some(default) = &spec.default {
                prop.insert("default".into(), default.clone());
            }
            if let Some(minimum) = spec.minimum {
                prop.insert("minimum".into(), json!(minimum));
            }
            properties.insert(spec.name.clone(), Value::Object(prop));
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), json!(required));
        schema.insert("additionalProperties".into(), json!(false));
        schema
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validated, coerced and defaults-filled arguments handed to a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Result<&str, ToolError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected string"))
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, ToolError> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected integer"))
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, ToolError> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected number"))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ToolError> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected boolean"))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

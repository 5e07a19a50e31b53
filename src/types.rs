//! Core types: the normalized index and typed views over schema nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SpecError;

/// Model name used for endpoints that return raw file content.
pub const FILE_MODEL_NAME: &str = "_File";

/// Response code whose schema determines a GET operation's model.
pub const SUCCESS_RESPONSE_CODE: &str = "200";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract the model name from a `$ref` such as `#/definitions/NetworkObject`.
pub fn model_name_from_ref(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Location of a model inside the raw document, used in [`SpecError`] paths.
pub(crate) fn definition_pointer(name: &str) -> String {
    format!("/definitions/{}", escape_pointer(name))
}

/// Escape a key for use as a JSON Pointer segment (`~` → `~0`, `/` → `~1`).
pub(crate) fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// HTTP verbs that take part in model-name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    /// DELETE, PATCH, HEAD, ... never carry a model.
    Other,
}

impl HttpMethod {
    /// Parse a method key case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "get" => HttpMethod::Get,
            "post" => HttpMethod::Post,
            "put" => HttpMethod::Put,
            _ => HttpMethod::Other,
        }
    }
}

/// Where a URL parameter lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
}

impl ParamLocation {
    /// Parse the `in` field of a Swagger parameter.
    ///
    /// Returns `None` for `body`, `header`, `formData` and anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            _ => None,
        }
    }
}

/// Simplified view of a Swagger document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIndex {
    /// Model definitions, copied verbatim from `definitions`.
    pub models: Map<String, Value>,
    /// Operations keyed by `operationId`.
    pub operations: IndexMap<String, Operation>,
}

impl NormalizedIndex {
    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operations.get(operation_id)
    }

    /// Look up a model by name.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::UnknownModel` if `definitions` has no such entry.
    pub fn model(&self, name: &str) -> Result<&Value, SpecError> {
        lookup_model(&self.models, name)
    }
}

pub(crate) fn lookup_model<'a>(
    models: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a Value, SpecError> {
    models.get(name).ok_or_else(|| SpecError::UnknownModel {
        name: name.to_string(),
    })
}

/// One HTTP operation of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Lowercase HTTP verb.
    pub method: String,
    /// `basePath` followed by the path template.
    pub url: String,
    /// Model in `models`, [`FILE_MODEL_NAME`], or `None`.
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<OperationParams>,
}

impl Operation {
    /// Whether the endpoint works with raw files rather than a model.
    pub fn is_file(&self) -> bool {
        self.model_name.as_deref() == Some(FILE_MODEL_NAME)
    }

    pub fn params(&self, location: ParamLocation) -> Option<&IndexMap<String, ParamSpec>> {
        self.parameters.as_ref().map(|p| p.bucket(location))
    }
}

/// Path and query parameters of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationParams {
    pub path: IndexMap<String, ParamSpec>,
    pub query: IndexMap<String, ParamSpec>,
}

impl OperationParams {
    pub fn bucket(&self, location: ParamLocation) -> &IndexMap<String, ParamSpec> {
        match location {
            ParamLocation::Path => &self.path,
            ParamLocation::Query => &self.query,
        }
    }

    pub(crate) fn bucket_mut(
        &mut self,
        location: ParamLocation,
    ) -> &mut IndexMap<String, ParamSpec> {
        match location {
            ParamLocation::Path => &mut self.path,
            ParamLocation::Query => &mut self.query,
        }
    }
}

/// A parameter reduced to its declared type and whether it must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
}

/// Scalar types a leaf value can be checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleType {
    String,
    Boolean,
    Integer,
    Number,
    /// Any other declared type; no value satisfies it.
    Other(String),
}

impl SimpleType {
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => SimpleType::String,
            "boolean" => SimpleType::Boolean,
            "integer" => SimpleType::Integer,
            "number" => SimpleType::Number,
            other => SimpleType::Other(other.to_string()),
        }
    }

    /// The declared type name, as reported in `expected_type`.
    pub fn name(&self) -> &str {
        match self {
            SimpleType::String => "string",
            SimpleType::Boolean => "boolean",
            SimpleType::Integer => "integer",
            SimpleType::Number => "number",
            SimpleType::Other(name) => name,
        }
    }

    /// Check a value against this type.
    ///
    /// Booleans never count as integers or numbers, and `5.0` is a number
    /// but not an integer.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (SimpleType::String, Value::String(_)) => true,
            (SimpleType::Boolean, Value::Bool(_)) => true,
            (SimpleType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (SimpleType::Number, Value::Number(_)) => true,
            _ => false,
        }
    }
}

/// Shape of a model node, as far as structural validation cares.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    /// `type: string` with an `enum` list.
    Enum { values: &'a [Value] },
    /// `type: object`.
    Object {
        required: Vec<&'a str>,
        properties: Option<&'a Map<String, Value>>,
    },
    /// `allOf` alias; validation accepts anything against it.
    Composition { target: &'a str },
    /// Any other shape; validation accepts anything against it.
    Opaque,
}

impl<'a> NodeKind<'a> {
    /// Classify a model node found at `location` in the raw document.
    ///
    /// # Errors
    ///
    /// Returns `SpecError` when a present keyword has the wrong JSON type.
    pub fn of(node: &'a Value, location: &str) -> Result<Self, SpecError> {
        match node.get("type").and_then(Value::as_str) {
            Some("string") if node.get("enum").is_some() => {
                let values = expect_array(&node["enum"], &format!("{}/enum", location))?;
                Ok(NodeKind::Enum { values })
            }
            Some("object") => {
                let required = match node.get("required") {
                    None => Vec::new(),
                    Some(value) => {
                        let path = format!("{}/required", location);
                        expect_array(value, &path)?
                            .iter()
                            .map(|name| expect_str(name, &path))
                            .collect::<Result<Vec<_>, _>>()?
                    }
                };
                let properties = node
                    .get("properties")
                    .map(|value| expect_object(value, &format!("{}/properties", location)))
                    .transpose()?;
                Ok(NodeKind::Object {
                    required,
                    properties,
                })
            }
            _ => match composition_target(node, location)? {
                Some(target) => Ok(NodeKind::Composition { target }),
                None => Ok(NodeKind::Opaque),
            },
        }
    }
}

/// The `$ref` of the first `allOf` entry, if the node is a composition.
pub(crate) fn composition_target<'a>(
    node: &'a Value,
    location: &str,
) -> Result<Option<&'a str>, SpecError> {
    let Some(all_of) = node.get("allOf") else {
        return Ok(None);
    };
    let path = format!("{}/allOf", location);
    let first = expect_array(all_of, &path)?
        .first()
        .and_then(|entry| entry.get("$ref"))
        .ok_or_else(|| SpecError::MissingField {
            path: format!("{}/0", path),
            field: "$ref".to_string(),
        })?;
    expect_str(first, &format!("{}/0/$ref", path)).map(Some)
}

/// Target of an `object` property.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectTarget<'a> {
    /// `$ref` to a model in `definitions`.
    Ref(&'a str),
    /// The property schema itself describes the object.
    Inline(&'a Value),
}

/// Declared type of a property schema.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind<'a> {
    Object(ObjectTarget<'a>),
    Array { items: &'a Value },
    Simple(SimpleType),
}

impl<'a> PropertyKind<'a> {
    /// Classify a property schema found at `location` in the raw document.
    ///
    /// A schema without `type` but with `$ref` is an object reference.
    ///
    /// # Errors
    ///
    /// Returns `SpecError` for a schema with neither `type` nor `$ref`,
    /// or an `array` without `items`.
    pub fn of(schema: &'a Value, location: &str) -> Result<Self, SpecError> {
        let reference = schema
            .get("$ref")
            .map(|r| expect_str(r, &format!("{}/$ref", location)))
            .transpose()?;

        let declared = match schema.get("type") {
            Some(value) => Some(expect_str(value, &format!("{}/type", location))?),
            None => None,
        };

        match (declared, reference) {
            (Some("object"), Some(reference)) | (None, Some(reference)) => {
                Ok(PropertyKind::Object(ObjectTarget::Ref(reference)))
            }
            (Some("object"), None) => Ok(PropertyKind::Object(ObjectTarget::Inline(schema))),
            (Some("array"), _) => {
                let items = schema.get("items").ok_or_else(|| SpecError::MissingField {
                    path: location.to_string(),
                    field: "items".to_string(),
                })?;
                Ok(PropertyKind::Array { items })
            }
            (Some(other), _) => Ok(PropertyKind::Simple(SimpleType::parse(other))),
            (None, None) => Err(SpecError::MissingField {
                path: location.to_string(),
                field: "type".to_string(),
            }),
        }
    }
}

pub(crate) fn expect_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, SpecError> {
    value.as_object().ok_or_else(|| invalid(path, "object", value))
}

pub(crate) fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], SpecError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| invalid(path, "array", value))
}

pub(crate) fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, SpecError> {
    value.as_str().ok_or_else(|| invalid(path, "string", value))
}

fn invalid(path: &str, expected: &'static str, value: &Value) -> SpecError {
    SpecError::InvalidType {
        path: path.to_string(),
        expected,
        actual: json_type_name(value).to_string(),
    }
}

//! Spec normalization - reduces a Swagger 2.0 document to an operation index.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::SpecError;
use crate::types::{
    composition_target, definition_pointer, escape_pointer, expect_array, expect_object,
    expect_str, json_type_name, lookup_model, model_name_from_ref, HttpMethod, NormalizedIndex,
    Operation, OperationParams, ParamLocation, ParamSpec, FILE_MODEL_NAME, SUCCESS_RESPONSE_CODE,
};

/// Normalize a Swagger 2.0 document.
///
/// Models are copied verbatim from `definitions`. Every operation under
/// `paths` is keyed by its `operationId` and reduced to its method, full URL,
/// model name, and path/query parameters.
///
/// # Errors
///
/// Returns `SpecError` if an operation lacks an `operationId`, a `$ref`
/// names an undefined model, or a structural keyword has the wrong type.
pub fn normalize(spec: &Value) -> Result<NormalizedIndex, SpecError> {
    let base_path = match spec.get("basePath") {
        Some(value) => expect_str(value, "/basePath")?,
        None => "",
    };
    let models = match spec.get("definitions") {
        Some(value) => expect_object(value, "/definitions")?.clone(),
        None => Map::new(),
    };

    let mut operations = IndexMap::new();
    if let Some(paths) = spec.get("paths") {
        let resolver = ModelResolver { models: &models };
        for (path, item) in expect_object(paths, "/paths")? {
            let location = format!("/paths/{}", escape_pointer(path));
            for (method, raw) in expect_object(item, &location)? {
                // Vendor extensions and path-level `parameters` are not operations
                if method.starts_with("x-") || !raw.is_object() {
                    continue;
                }
                let location = format!("{}/{}", location, method);
                let (operation_id, operation) =
                    resolver.operation(base_path, path, method, raw, &location)?;

                debug!(
                    operation_id,
                    method = %operation.method,
                    url = %operation.url,
                    model = ?operation.model_name,
                    "normalized operation"
                );
                operations.insert(operation_id.to_string(), operation);
            }
        }
    }

    Ok(NormalizedIndex { models, operations })
}

/// Resolve a `$ref` to the name of its terminal model.
///
/// Composition (`allOf`) models are followed through their first entry
/// until a non-composition model is reached.
///
/// # Errors
///
/// Returns `SpecError::UnknownModel` for a dangling reference, or
/// `SpecError::CompositionCycle` if the chain loops.
pub fn resolve_model_ref(
    models: &Map<String, Value>,
    reference: &str,
) -> Result<String, SpecError> {
    ModelResolver { models }.resolve(reference)
}

struct ModelResolver<'a> {
    models: &'a Map<String, Value>,
}

impl<'a> ModelResolver<'a> {
    fn operation<'v>(
        &self,
        base_path: &str,
        path: &str,
        method: &str,
        raw: &'v Value,
        location: &str,
    ) -> Result<(&'v str, Operation), SpecError> {
        let operation_id = match raw.get("operationId") {
            Some(value) => expect_str(value, &format!("{}/operationId", location))?,
            None => {
                return Err(SpecError::MissingOperationId {
                    method: method.to_string(),
                    path: path.to_string(),
                })
            }
        };

        let parameters = raw
            .get("parameters")
            .map(|params| simplify_params(params, &format!("{}/parameters", location)))
            .transpose()?;

        let operation = Operation {
            method: method.to_lowercase(),
            url: format!("{}{}", base_path, path),
            model_name: self.model_name(method, raw, location)?,
            parameters,
        };
        Ok((operation_id, operation))
    }

    fn model_name(
        &self,
        method: &str,
        raw: &Value,
        location: &str,
    ) -> Result<Option<String>, SpecError> {
        match HttpMethod::parse(method) {
            HttpMethod::Get => self.from_responses(raw, location),
            HttpMethod::Post | HttpMethod::Put => match self.from_body(raw, location)? {
                Some(name) => Ok(Some(name)),
                None => self.from_responses(raw, location),
            },
            HttpMethod::Other => Ok(None),
        }
    }

    /// Model of the `in: body` parameter, if there is one with a `$ref` schema.
    fn from_body(&self, raw: &Value, location: &str) -> Result<Option<String>, SpecError> {
        let Some(params) = raw.get("parameters") else {
            return Ok(None);
        };
        let path = format!("{}/parameters", location);
        let body = expect_array(params, &path)?
            .iter()
            .find(|param| param.get("in").and_then(Value::as_str) == Some("body"));

        match body.and_then(|param| param.pointer("/schema/$ref")) {
            Some(reference) => {
                let reference = expect_str(reference, &format!("{}/schema/$ref", path))?;
                self.resolve(reference).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Model of the `200` response schema.
    fn from_responses(&self, raw: &Value, location: &str) -> Result<Option<String>, SpecError> {
        let Some(schema) = raw
            .get("responses")
            .and_then(|responses| responses.get(SUCCESS_RESPONSE_CODE))
            .and_then(|response| response.get("schema"))
        else {
            return Ok(None);
        };
        let path = format!("{}/responses/{}/schema", location, SUCCESS_RESPONSE_CODE);

        if let Some(reference) = schema.get("$ref") {
            let reference = expect_str(reference, &format!("{}/$ref", path))?;
            return self.resolve(reference).map(Some);
        }
        // Paginated list envelope: { items: { type: array, items: { $ref } } }
        if let Some(reference) = schema.pointer("/properties/items/items/$ref") {
            let reference =
                expect_str(reference, &format!("{}/properties/items/items/$ref", path))?;
            return self.resolve(reference).map(Some);
        }
        if schema.get("type").and_then(Value::as_str) == Some("file") {
            return Ok(Some(FILE_MODEL_NAME.to_string()));
        }
        Ok(None)
    }

    fn resolve(&self, reference: &str) -> Result<String, SpecError> {
        let mut name = model_name_from_ref(reference);
        let mut visited: Vec<&str> = Vec::new();

        loop {
            let model = lookup_model(self.models, name)?;
            let Some(target) = composition_target(model, &definition_pointer(name))? else {
                debug!(reference, model = name, "resolved model reference");
                return Ok(name.to_string());
            };
            visited.push(name);
            name = model_name_from_ref(target);
            if visited.contains(&name) {
                return Err(SpecError::CompositionCycle {
                    name: visited[0].to_string(),
                });
            }
        }
    }
}

/// Split parameters into `path` and `query` buckets, dropping the rest.
fn simplify_params(params: &Value, location: &str) -> Result<OperationParams, SpecError> {
    let mut simplified = OperationParams::default();

    for (i, param) in expect_array(params, location)?.iter().enumerate() {
        let location = format!("{}/{}", location, i);
        let param = expect_object(param, &location)?;

        let Some(position) = param.get("in") else {
            if param.contains_key("$ref") {
                warn!(%location, "skipping parameter reference outside definitions");
                continue;
            }
            return Err(missing(&location, "in"));
        };
        let Some(bucket) = ParamLocation::parse(expect_str(position, &format!("{}/in", location))?)
        else {
            continue;
        };

        let name = param.get("name").ok_or_else(|| missing(&location, "name"))?;
        let name = expect_str(name, &format!("{}/name", location))?;
        let param_type = param.get("type").ok_or_else(|| missing(&location, "type"))?;
        let param_type = expect_str(param_type, &format!("{}/type", location))?;
        let required = match param.get("required") {
            Some(Value::Bool(required)) => *required,
            Some(other) => {
                return Err(SpecError::InvalidType {
                    path: format!("{}/required", location),
                    expected: "boolean",
                    actual: json_type_name(other).to_string(),
                })
            }
            None => false,
        };

        simplified.bucket_mut(bucket).insert(
            name.to_string(),
            ParamSpec {
                param_type: param_type.to_string(),
                required,
            },
        );
    }

    Ok(simplified)
}

fn missing(path: &str, field: &str) -> SpecError {
    SpecError::MissingField {
        path: path.to_string(),
        field: field.to_string(),
    }
}

//! Request data and URL parameter validation against a normalized index.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{SpecError, ValidateError};
use crate::report::{field_path, index_path, Report};
use crate::types::{
    definition_pointer, escape_pointer, model_name_from_ref, NodeKind, NormalizedIndex,
    ObjectTarget, Operation, ParamLocation, ParamSpec, PropertyKind, SimpleType,
    FILE_MODEL_NAME,
};

/// Validates payloads for the operations of a [`NormalizedIndex`].
///
/// The validator only borrows the index, so any number of validators and
/// calls can share one index across threads.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    index: &'a NormalizedIndex,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(index: &'a NormalizedIndex) -> Self {
        Self { index }
    }

    /// Validate a request body for a POST/PUT operation.
    ///
    /// `data` defaults to an empty object when omitted.
    ///
    /// # Errors
    ///
    /// Usage faults (empty operation name, non-object data, unknown
    /// operation) short-circuit. Otherwise every missing required field and
    /// type mismatch is collected into `ValidateError::Invalid`. A dangling
    /// model reference, or an operation without a model, is `ValidateError::Spec`.
    pub fn validate_body(
        &self,
        operation_id: &str,
        data: Option<&Value>,
    ) -> Result<(), ValidateError> {
        let empty = Value::Object(Map::new());
        let data = data.unwrap_or(&empty);
        let operation = self.precondition(operation_id, data, "data")?;
        trace!(operation_id, "validating body");

        let model_name = match operation.model_name.as_deref() {
            Some(name) if name != FILE_MODEL_NAME => name,
            _ => {
                return Err(SpecError::NoModel {
                    operation: operation_id.to_string(),
                }
                .into())
            }
        };

        into_result(self.validate_model(model_name, data)?)
    }

    /// Validate parameters for the query part of the URL.
    ///
    /// # Errors
    ///
    /// See [`SchemaValidator::validate_params`].
    pub fn validate_query_params(
        &self,
        operation_id: &str,
        params: Option<&Value>,
    ) -> Result<(), ValidateError> {
        self.validate_params(operation_id, params, ParamLocation::Query)
    }

    /// Validate parameters for the path part of the URL.
    ///
    /// # Errors
    ///
    /// See [`SchemaValidator::validate_params`].
    pub fn validate_path_params(
        &self,
        operation_id: &str,
        params: Option<&Value>,
    ) -> Result<(), ValidateError> {
        self.validate_params(operation_id, params, ParamLocation::Path)
    }

    /// Validate flat URL parameters against one parameter bucket.
    ///
    /// # Errors
    ///
    /// Usage faults short-circuit; missing required parameters and type
    /// mismatches are collected into `ValidateError::Invalid`.
    pub fn validate_params(
        &self,
        operation_id: &str,
        params: Option<&Value>,
        location: ParamLocation,
    ) -> Result<(), ValidateError> {
        let empty = Value::Object(Map::new());
        let params = params.unwrap_or(&empty);
        let operation = self.precondition(operation_id, params, "params")?;
        trace!(operation_id, ?location, "validating parameters");

        match (operation.params(location), params.as_object()) {
            (Some(declared), Some(params)) => into_result(check_params(declared, params)),
            _ => Ok(()),
        }
    }

    /// Run structural validation of `data` against a named model.
    ///
    /// Returns the findings without interpreting them, which is handy for
    /// checking a single subtree.
    ///
    /// # Errors
    ///
    /// Returns `SpecError` if the model, or any model it references, is
    /// missing or malformed.
    pub fn validate_model(&self, model_name: &str, data: &Value) -> Result<Report, SpecError> {
        let model = self.index.model(model_name)?;
        self.check_node(model, &definition_pointer(model_name), data, "")
    }

    fn precondition(
        &self,
        operation_id: &str,
        value: &Value,
        argument: &'static str,
    ) -> Result<&'a Operation, ValidateError> {
        if operation_id.is_empty() {
            return Err(ValidateError::EmptyOperationName);
        }
        if !value.is_object() {
            return Err(ValidateError::NotAMapping { argument });
        }
        self.index
            .operation(operation_id)
            .ok_or_else(|| ValidateError::UnsupportedOperation {
                operation: operation_id.to_string(),
            })
    }

    /// Check `data` against a model node. `path` already names the field the
    /// node describes, so enum and object mismatches are reported at `path`.
    fn check_node(
        &self,
        node: &Value,
        location: &str,
        data: &Value,
        path: &str,
    ) -> Result<Report, SpecError> {
        let mut report = Report::default();

        match NodeKind::of(node, location)? {
            NodeKind::Enum { values } => {
                if !values.contains(data) {
                    report.push_invalid(path.to_string(), "enum", data.clone());
                }
            }
            NodeKind::Object {
                required,
                properties,
            } => {
                let Value::Object(data) = data else {
                    report.push_invalid(path.to_string(), "object", data.clone());
                    return Ok(report);
                };

                for name in required {
                    if !data.contains_key(name) {
                        report.push_required(field_path(path, name));
                    }
                }

                for (name, schema) in properties.into_iter().flatten() {
                    if let Some(value) = data.get(name) {
                        let location =
                            format!("{}/properties/{}", location, escape_pointer(name));
                        let path = field_path(path, name);
                        report.merge(self.check_property(schema, &location, value, &path)?);
                    }
                }
            }
            NodeKind::Composition { .. } | NodeKind::Opaque => {}
        }

        Ok(report)
    }

    fn check_property(
        &self,
        schema: &Value,
        location: &str,
        value: &Value,
        path: &str,
    ) -> Result<Report, SpecError> {
        match PropertyKind::of(schema, location)? {
            PropertyKind::Object(ObjectTarget::Ref(reference)) => {
                let name = model_name_from_ref(reference);
                let model = self.index.model(name)?;
                self.check_node(model, &definition_pointer(name), value, path)
            }
            PropertyKind::Object(ObjectTarget::Inline(node)) => {
                self.check_node(node, location, value, path)
            }
            PropertyKind::Array { items } => {
                let mut report = Report::default();
                match value {
                    Value::Array(elements) => {
                        let location = format!("{}/items", location);
                        for (i, element) in elements.iter().enumerate() {
                            let path = index_path(path, i);
                            report.merge(self.check_property(items, &location, element, &path)?);
                        }
                    }
                    other => report.push_invalid(path.to_string(), "array", other.clone()),
                }
                Ok(report)
            }
            PropertyKind::Simple(expected) => Ok(check_simple(&expected, value, path)),
        }
    }
}

fn check_simple(expected: &SimpleType, value: &Value, path: &str) -> Report {
    let mut report = Report::default();
    if !expected.accepts(value) {
        report.push_invalid(path.to_string(), expected.name(), value.clone());
    }
    report
}

fn check_params(declared: &IndexMap<String, ParamSpec>, params: &Map<String, Value>) -> Report {
    let mut report = Report::default();

    for (name, spec) in declared {
        match params.get(name) {
            Some(value) => {
                let expected = SimpleType::parse(&spec.param_type);
                report.merge(check_simple(&expected, value, name));
            }
            None if spec.required => report.push_required(name.clone()),
            None => {}
        }
    }

    report
}

fn into_result(report: Report) -> Result<(), ValidateError> {
    if report.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use serde_json::json;

    fn index() -> NormalizedIndex {
        normalize(&json!({
            "basePath": "/api",
            "definitions": {
                "Item": {
                    "type": "object",
                    "required": ["id"],
                    "properties": { "id": { "type": "string" } }
                },
                "Status": { "type": "string", "enum": ["ACTIVE", "INACTIVE"] },
                "Holder": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "count": { "type": "integer" },
                        "ratio": { "type": "number" },
                        "enabled": { "type": "boolean" },
                        "status": { "type": "object", "$ref": "#/definitions/Status" },
                        "items": { "type": "array", "items": { "type": "object", "$ref": "#/definitions/Item" } },
                        "matrix": { "type": "array", "items": { "type": "array", "items": { "type": "integer" } } },
                        "meta": { "type": "object", "required": ["key"] }
                    }
                }
            },
            "paths": {
                "/holders": {
                    "post": {
                        "operationId": "addHolder",
                        "parameters": [
                            { "in": "body", "name": "body", "schema": { "$ref": "#/definitions/Holder" } },
                            { "in": "query", "name": "dryRun", "type": "boolean", "required": true },
                            { "in": "query", "name": "limit", "type": "integer" }
                        ],
                        "responses": {}
                    }
                },
                "/holders/{id}": {
                    "delete": {
                        "operationId": "deleteHolder",
                        "parameters": [{ "in": "path", "name": "id", "type": "string", "required": true }]
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn empty_object_node_reports_required() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator.validate_model("Item", &json!({})).unwrap();
        assert_eq!(report.required, vec!["id"]);
        assert!(report.invalid_type.is_empty());
    }

    #[test]
    fn simple_type_mismatches() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator
            .validate_model(
                "Holder",
                &json!({ "name": 1, "count": true, "ratio": false, "enabled": "yes" }),
            )
            .unwrap();

        let found: Vec<_> = report
            .invalid_type
            .iter()
            .map(|e| (e.path.as_str(), e.expected_type.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("name", "string"),
                ("count", "integer"),
                ("ratio", "number"),
                ("enabled", "boolean")
            ]
        );
    }

    #[test]
    fn enum_violation_is_reported_at_field() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator
            .validate_model("Holder", &json!({ "name": "n", "status": "UNKNOWN" }))
            .unwrap();
        assert_eq!(report.invalid_type.len(), 1);
        assert_eq!(report.invalid_type[0].path, "status");
        assert_eq!(report.invalid_type[0].expected_type, "enum");
        assert_eq!(report.invalid_type[0].actually_value, json!("UNKNOWN"));
    }

    #[test]
    fn enum_at_root() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator.validate_model("Status", &json!("ACTIVE")).unwrap();
        assert!(report.is_empty());
        let report = validator.validate_model("Status", &json!("active")).unwrap();
        assert_eq!(report.invalid_type[0].path, "");
    }

    #[test]
    fn nested_arrays_index_paths() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator
            .validate_model("Holder", &json!({ "name": "n", "matrix": [[1, 2], [3, "x"], 4] }))
            .unwrap();
        let found: Vec<_> = report
            .invalid_type
            .iter()
            .map(|e| (e.path.as_str(), e.expected_type.as_str()))
            .collect();
        assert_eq!(found, vec![("matrix[1][1]", "integer"), ("matrix[2]", "array")]);
    }

    #[test]
    fn object_expected_stops_descending() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator
            .validate_model("Holder", &json!({ "name": "n", "items": ["a"] }))
            .unwrap();
        assert!(report.required.is_empty());
        assert_eq!(report.invalid_type[0].path, "items[0]");
        assert_eq!(report.invalid_type[0].expected_type, "object");
    }

    #[test]
    fn inline_object_property() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator
            .validate_model("Holder", &json!({ "name": "n", "meta": {} }))
            .unwrap();
        assert_eq!(report.required, vec!["meta.key"]);
    }

    #[test]
    fn undeclared_properties_are_ignored() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let report = validator
            .validate_model("Holder", &json!({ "name": "n", "extra": [1, 2, 3] }))
            .unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn body_preconditions_short_circuit() {
        let index = index();
        let validator = SchemaValidator::new(&index);

        assert_eq!(
            validator.validate_body("", Some(&json!([]))).unwrap_err(),
            ValidateError::EmptyOperationName
        );
        assert_eq!(
            validator.validate_body("nope", Some(&json!([]))).unwrap_err(),
            ValidateError::NotAMapping { argument: "data" }
        );
        assert_eq!(
            validator.validate_body("nope", None).unwrap_err(),
            ValidateError::UnsupportedOperation {
                operation: "nope".into()
            }
        );
    }

    #[test]
    fn body_defaults_to_empty_object() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        let err = validator.validate_body("addHolder", None).unwrap_err();
        assert_eq!(err.report().unwrap().required, vec!["name"]);
    }

    #[test]
    fn body_without_model_is_a_spec_fault() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        assert_eq!(
            validator.validate_body("deleteHolder", None).unwrap_err(),
            ValidateError::Spec(SpecError::NoModel {
                operation: "deleteHolder".into()
            })
        );
    }

    #[test]
    fn query_params() {
        let index = index();
        let validator = SchemaValidator::new(&index);

        assert!(validator
            .validate_query_params("addHolder", Some(&json!({ "dryRun": true })))
            .is_ok());

        let err = validator
            .validate_query_params("addHolder", Some(&json!({ "limit": "10" })))
            .unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.required, vec!["dryRun"]);
        assert_eq!(report.invalid_type[0].path, "limit");
        assert_eq!(report.invalid_type[0].expected_type, "integer");
    }

    #[test]
    fn params_preconditions() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        assert_eq!(
            validator
                .validate_path_params("deleteHolder", Some(&json!("id")))
                .unwrap_err(),
            ValidateError::NotAMapping { argument: "params" }
        );
    }

    #[test]
    fn empty_bucket_trivially_succeeds() {
        let index = index();
        let validator = SchemaValidator::new(&index);
        assert!(validator.validate_path_params("addHolder", None).is_ok());
        assert!(validator.validate_query_params("deleteHolder", None).is_ok());
    }

    #[test]
    fn spec_fault_location_escapes_property_names() {
        let index = normalize(&json!({
            "definitions": {
                "Slashed": {
                    "type": "object",
                    "properties": { "a/b~c": { "type": "array" } }
                }
            }
        }))
        .unwrap();
        let validator = SchemaValidator::new(&index);

        let err = validator
            .validate_model("Slashed", &json!({ "a/b~c": [] }))
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::MissingField {
                path: "/definitions/Slashed/properties/a~1b~0c".into(),
                field: "items".into()
            }
        );
    }

    #[test]
    fn validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaValidator<'static>>();
        assert_send_sync::<NormalizedIndex>();
    }
}

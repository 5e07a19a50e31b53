//! Swagger Index
//!
//! Normalizes a Swagger (OpenAPI 2.0) document into a compact index of
//! operations and models, and validates request bodies and URL parameters
//! against that index.
//!
//! # Example
//!
//! ```
//! use swagger_index::{normalize, SchemaValidator, ValidateError};
//! use serde_json::json;
//!
//! let spec = json!({
//!     "basePath": "/api",
//!     "definitions": {
//!         "Network": {
//!             "type": "object",
//!             "required": ["name"],
//!             "properties": { "name": { "type": "string" } }
//!         }
//!     },
//!     "paths": {
//!         "/networks": {
//!             "post": {
//!                 "operationId": "addNetwork",
//!                 "parameters": [
//!                     { "in": "body", "name": "body", "schema": { "$ref": "#/definitions/Network" } }
//!                 ]
//!             }
//!         }
//!     }
//! });
//!
//! let index = normalize(&spec).unwrap();
//! assert_eq!(index.operations["addNetwork"].url, "/api/networks");
//!
//! let validator = SchemaValidator::new(&index);
//! assert!(validator.validate_body("addNetwork", Some(&json!({ "name": "lan" }))).is_ok());
//!
//! match validator.validate_body("addNetwork", Some(&json!({}))) {
//!     Err(ValidateError::Invalid { report }) => assert_eq!(report.required, vec!["name"]),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```
//!
//! # Model Names
//!
//! | Method | Source of `modelName` |
//! |--------|-----------------------|
//! | `get` | `$ref` of the `200` response schema (or its `items.items` envelope) |
//! | `post`, `put` | `$ref` of the body parameter, else as for `get` |
//! | other | `null` |
//!
//! A `200` response of `type: file` yields the `_File` sentinel.

mod error;
mod loader;
mod normalizer;
mod report;
mod types;
mod validator;

pub use error::{LoadError, SpecError, ValidateError};
pub use loader::{load_json, load_json_str};
pub use normalizer::{normalize, resolve_model_ref};
pub use report::{InvalidType, Report};
pub use types::{
    json_type_name, model_name_from_ref, HttpMethod, NodeKind, NormalizedIndex, ObjectTarget,
    Operation, OperationParams, ParamLocation, ParamSpec, PropertyKind, SimpleType,
    FILE_MODEL_NAME, SUCCESS_RESPONSE_CODE,
};
pub use validator::SchemaValidator;

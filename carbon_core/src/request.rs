//! # Requests and Responses
//!
//! Validation of incoming JSON request bodies and the response envelope the
//! calculation results are returned in.
//!
//! The engine accepts any strings; this module is where caller input is
//! checked before it gets there:
//!
//! - the body must be a JSON object
//! - `category`, `quantity`, `unit` and `scope` are required, checked in that order
//! - `quantity` may be a JSON number or a numeric string, must be finite and
//!   must not be negative
//! - `subcategory` is optional and may be `null`
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::request::EmissionRequest;
//! use serde_json::json;
//!
//! let body = json!({
//!     "category": "energy",
//!     "quantity": "120.5",
//!     "unit": "kwh",
//!     "subcategory": "solar",
//!     "scope": "direct"
//! });
//! let request = EmissionRequest::from_json(&body).unwrap();
//! assert_eq!(request.quantity, 120.5);
//!
//! let bad = json!({ "category": "energy", "quantity": "lots", "unit": "kwh", "scope": "direct" });
//! let err = EmissionRequest::from_json(&bad).unwrap_err();
//! assert_eq!(err.status_code(), 400);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CarbonError, CarbonResult};
use crate::scope::DEFAULT_SCOPE;

/// Fields a request body must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 4] = ["category", "quantity", "unit", "scope"];

/// Validated input for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRequest {
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl EmissionRequest {
    /// Request with no subcategory and the default scope.
    pub fn new(category: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        EmissionRequest {
            category: category.into(),
            quantity,
            unit: unit.into(),
            subcategory: None,
            scope: default_scope(),
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Parse and validate a raw request body.
    pub fn from_json_str(body: &str) -> CarbonResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| CarbonError::invalid_request(format!("Invalid JSON body: {e}")))?;
        Self::from_json(&value)
    }

    /// Validate a decoded request body.
    pub fn from_json(body: &Value) -> CarbonResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| CarbonError::invalid_request("Request body must be a JSON object"))?;

        if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| !object.contains_key(**field)) {
            return Err(CarbonError::missing_field(*missing));
        }

        let category = required_string(object, "category")?;
        let quantity = parse_quantity(&object["quantity"])?;
        let unit = required_string(object, "unit")?;
        let scope = required_string(object, "scope")?;
        let subcategory = optional_string(object, "subcategory")?;

        if quantity < 0.0 {
            return Err(CarbonError::invalid_input(
                "quantity",
                quantity.to_string(),
                "Quantity must not be negative",
            ));
        }

        Ok(EmissionRequest {
            category,
            quantity,
            unit,
            subcategory,
            scope,
        })
    }
}

/// Convert a JSON value to a finite quantity.
///
/// Accepts numbers and numeric strings (surrounding whitespace ignored).
/// Everything else, including booleans, `null` and non-finite values, is an
/// [`CarbonError::InvalidQuantity`].
pub fn parse_quantity(value: &Value) -> CarbonResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(q) if q.is_finite() => Ok(q),
        _ => Err(CarbonError::invalid_quantity(display_value(value))),
    }
}

fn required_string(object: &Map<String, Value>, field: &str) -> CarbonResult<String> {
    match &object[field] {
        Value::String(s) => Ok(s.clone()),
        other => Err(CarbonError::invalid_input(field, display_value(other), "Expected a string")),
    }
}

fn optional_string(object: &Map<String, Value>, field: &str) -> CarbonResult<Option<String>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CarbonError::invalid_input(
            field,
            display_value(other),
            "Expected a string or null",
        )),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Response envelope.
///
/// Success serializes as `{"success": true, "data": ...}`; failure as
/// `{"success": false, "error": "...", "code": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn err(error: &CarbonError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.error_code().to_string()),
        }
    }
}

impl<T> From<CarbonResult<T>> for ApiResponse<T> {
    fn from(result: CarbonResult<T>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(e) => ApiResponse::err(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_body() -> Value {
        json!({
            "category": "transport",
            "quantity": 10,
            "unit": "km",
            "subcategory": "gasoline_car",
            "scope": "indirect"
        })
    }

    #[test]
    fn test_valid_request() {
        let request = EmissionRequest::from_json(&full_body()).unwrap();
        assert_eq!(
            request,
            EmissionRequest::new("transport", 10.0, "km")
                .with_subcategory("gasoline_car")
                .with_scope("indirect")
        );
    }

    #[test]
    fn test_missing_fields_in_order() {
        let err = EmissionRequest::from_json(&json!({})).unwrap_err();
        assert_eq!(err, CarbonError::missing_field("category"));

        let mut body = full_body();
        body.as_object_mut().unwrap().remove("unit");
        body.as_object_mut().unwrap().remove("scope");
        let err = EmissionRequest::from_json(&body).unwrap_err();
        assert_eq!(err, CarbonError::missing_field("unit"));
    }

    #[test]
    fn test_scope_is_required() {
        let mut body = full_body();
        body.as_object_mut().unwrap().remove("scope");
        let err = EmissionRequest::from_json(&body).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_subcategory_optional() {
        let mut body = full_body();
        body.as_object_mut().unwrap().remove("subcategory");
        assert_eq!(EmissionRequest::from_json(&body).unwrap().subcategory, None);

        body["subcategory"] = Value::Null;
        assert_eq!(EmissionRequest::from_json(&body).unwrap().subcategory, None);

        body["subcategory"] = json!(42);
        let err = EmissionRequest::from_json(&body).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_quantity_forms() {
        assert_eq!(parse_quantity(&json!(2.5)).unwrap(), 2.5);
        assert_eq!(parse_quantity(&json!(3)).unwrap(), 3.0);
        assert_eq!(parse_quantity(&json!(" 42.0 ")).unwrap(), 42.0);
        assert_eq!(parse_quantity(&json!("1e3")).unwrap(), 1000.0);
    }

    #[test]
    fn test_non_numeric_quantity() {
        for bad in [json!("ten"), json!(""), json!(true), json!(null), json!([1]), json!("inf"), json!("NaN")] {
            let err = parse_quantity(&bad).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_QUANTITY", "{bad}");
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let mut body = full_body();
        body["quantity"] = json!(-5);
        let err = EmissionRequest::from_json(&body).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_non_string_category() {
        let mut body = full_body();
        body["category"] = json!(7);
        let err = EmissionRequest::from_json(&body).unwrap_err();
        assert_eq!(
            err,
            CarbonError::invalid_input("category", "7", "Expected a string")
        );
    }

    #[test]
    fn test_body_must_be_object() {
        let err = EmissionRequest::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REQUEST");

        let err = EmissionRequest::from_json_str("{not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_unknown_values_accepted() {
        let body = json!({
            "category": "unknown_cat",
            "quantity": "3",
            "unit": "x",
            "scope": "whatever"
        });
        let request = EmissionRequest::from_json(&body).unwrap();
        assert_eq!(request.category, "unknown_cat");
        assert_eq!(request.scope, "whatever");
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let request: EmissionRequest =
            serde_json::from_str(r#"{"category":"water","quantity":1.0,"unit":"m3"}"#).unwrap();
        assert_eq!(request.scope, "direct");
        assert_eq!(request.subcategory, None);
    }

    #[test]
    fn test_envelope_shapes() {
        let ok: ApiResponse<u32> = ApiResponse::ok(7);
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"success": true, "data": 7}));

        let err: ApiResponse<u32> = Err(CarbonError::missing_field("unit")).into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "success": false,
                "error": "Missing required field: unit",
                "code": "MISSING_FIELD"
            })
        );
    }
}

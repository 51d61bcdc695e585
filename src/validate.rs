//! Declarative request validation
//!
//! Both pipelines describe their required fields as a [`Schema`] consumed by
//! one generic routine. Validation is a pure function of the payload: it
//! returns an ordered list of human-readable issues, empty meaning
//! "proceed". Point-level checks only run once the top-level checks pass,
//! so callers never see redundant noise for the same mistake.

use serde_json::Value;

/// Expected type of a top-level request field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Array,
    Integer,
    PositiveInteger,
    String,
}

impl FieldKind {
    fn expected_name(&self) -> &'static str {
        match self {
            FieldKind::Array => "array",
            FieldKind::Integer | FieldKind::PositiveInteger => "integer",
            FieldKind::String => "string",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Array => value.is_array(),
            FieldKind::Integer | FieldKind::PositiveInteger => {
                value.is_i64() || value.is_u64()
            }
            FieldKind::String => value.is_string(),
        }
    }
}

/// One required top-level field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Required shape of a request payload
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
    /// Fields every historical point must carry, checked on the first point
    pub point_fields: &'static [&'static str],
}

/// Schema for the demand forecast operation
pub fn demand_schema() -> Schema {
    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "historicalData",
            kind: FieldKind::Array,
        },
        FieldSpec {
            name: "futurePeriods",
            kind: FieldKind::PositiveInteger,
        },
        FieldSpec {
            name: "locationId",
            kind: FieldKind::String,
        },
        FieldSpec {
            name: "modelId",
            kind: FieldKind::String,
        },
    ];
    Schema {
        fields: FIELDS,
        point_fields: &["date", "demand"],
    }
}

/// Schema for the supplier performance operation
pub fn supplier_schema() -> Schema {
    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "historicalData",
            kind: FieldKind::Array,
        },
        FieldSpec {
            name: "futurePeriods",
            kind: FieldKind::PositiveInteger,
        },
        FieldSpec {
            name: "supplierId",
            kind: FieldKind::String,
        },
    ];
    Schema {
        fields: FIELDS,
        point_fields: &["date", "qualityRating", "leadTimeReliability"],
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a payload against a schema, returning all issues found
pub fn validate(payload: &Value, schema: &Schema) -> Vec<String> {
    let mut issues = Vec::new();

    let object = match payload.as_object() {
        Some(object) => object,
        None => {
            issues.push("Request body must be a JSON object".to_string());
            return issues;
        }
    };

    for field in schema.fields {
        match object.get(field.name) {
            None => issues.push(format!("Missing required field: {}", field.name)),
            Some(value) if !field.kind.matches(value) => issues.push(format!(
                "Invalid type for {}: expected {}, got {}",
                field.name,
                field.kind.expected_name(),
                json_type_name(value)
            )),
            Some(value) if field.kind == FieldKind::PositiveInteger => {
                if value.as_i64().map_or(false, |n| n <= 0) {
                    issues.push(format!(
                        "Invalid value for {}: must be a positive integer",
                        field.name
                    ));
                }
            }
            Some(_) => {}
        }
    }

    if issues.is_empty() {
        let points = object["historicalData"]
            .as_array()
            .expect("validated above");
        if points.is_empty() {
            issues.push("historicalData array is empty".to_string());
        }
    }

    if issues.is_empty() {
        let sample = &object["historicalData"].as_array().expect("validated above")[0];
        match sample.as_object() {
            Some(point) => {
                for field in schema.point_fields {
                    if !point.contains_key(*field) {
                        issues.push(format!(
                            "Missing required field in historicalData points: {field}"
                        ));
                    }
                }
            }
            None => issues.push("historicalData points must be objects".to_string()),
        }
    }

    issues
}

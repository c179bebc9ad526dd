//! Schema contract and validation adapter.
//!
//! Any conforming validator is accepted through the [`Schema`] trait: given
//! raw JSON input it produces either a typed output or a non-empty ordered
//! issue list, synchronously or as a pending future. The [`validate`] adapter
//! normalizes both shapes behind a single awaited call, which keeps the
//! registry agnostic to whichever validation library a user installs.

use crate::error::{Issue, ValidationError};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;

/// What a single parse attempt produced.
pub type ParseOutcome<T> = std::result::Result<T, Vec<Issue>>;

/// Result kind of a [`Schema::parse`] call.
///
/// Synchronous validators return `Ready`; validators that need to suspend
/// (remote uniqueness checks and the like) return `Pending`. The adapter
/// awaits only in the `Pending` case.
pub enum Validation<T> {
    Ready(ParseOutcome<T>),
    Pending(BoxFuture<'static, ParseOutcome<T>>),
}

/// An opaque validator producing a typed value or an issue list from raw input.
pub trait Schema: Send + Sync {
    /// The validated, typed output.
    type Output;

    /// Check `input`, producing the typed output or the ordered issues.
    fn parse(&self, input: Value) -> Validation<Self::Output>;
}

/// Normalize a schema's outcome into one awaited contract.
///
/// Fails with a [`ValidationError`] carrying the full ordered issue list.
/// No retries; failure is always surfaced to the caller of the operation.
pub async fn validate<S>(schema: &S, input: Value) -> std::result::Result<S::Output, ValidationError>
where
    S: Schema + ?Sized,
{
    let outcome = match schema.parse(input) {
        Validation::Ready(outcome) => outcome,
        Validation::Pending(fut) => fut.await,
    };
    outcome.map_err(ValidationError::new)
}

/// Field types supported by [`ObjectSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Timestamp,
    /// Arbitrary nested JSON
    Json,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Bool => write!(f, "Bool"),
            FieldType::Timestamp => write!(f, "Timestamp"),
            FieldType::Json => write!(f, "Json"),
        }
    }
}

/// Definition of one field in an [`ObjectSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Whether this field is required
    pub required: bool,
}

impl FieldDef {
    /// Create a new required field definition.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    /// Create a new optional field definition.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }

    /// Check a value against this field, appending any issues in order.
    fn check(&self, value: Option<&Value>, issues: &mut Vec<Issue>) {
        match value {
            None | Some(Value::Null) if self.required => {
                issues.push(Issue::at(self.name.as_str(), "missing required field"));
            }
            None | Some(Value::Null) => {}
            Some(v) => self.check_type(v, issues),
        }
    }

    fn check_type(&self, value: &Value, issues: &mut Vec<Issue>) {
        let valid = match self.field_type {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_f64() || value.is_i64() || value.is_u64(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Timestamp => value.is_u64() || value.is_i64(),
            FieldType::Json => true, // Any JSON is valid
        };

        if !valid {
            issues.push(Issue::at(
                self.name.as_str(),
                format!(
                    "expected {}, got {}",
                    self.field_type,
                    json_type_name(value)
                ),
            ));
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Declarative object validator.
///
/// Checks every field and accumulates all issues in field order, so a caller
/// sees the complete failure picture in one pass. Unknown fields pass
/// through untouched. On success the raw input is returned as the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    /// Field definitions
    pub fields: Vec<FieldDef>,
}

impl ObjectSchema {
    /// Create an object schema from field definitions.
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// Builder-style method to add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

impl Schema for ObjectSchema {
    type Output = Value;

    fn parse(&self, input: Value) -> Validation<Value> {
        let Some(obj) = input.as_object() else {
            return Validation::Ready(Err(vec![Issue::new("input must be an object")]));
        };

        let mut issues = Vec::new();
        for field in &self.fields {
            field.check(obj.get(&field.name), &mut issues);
        }

        if issues.is_empty() {
            Validation::Ready(Ok(input))
        } else {
            Validation::Ready(Err(issues))
        }
    }
}

/// Serde-driven validator producing a typed output directly.
///
/// Deserialization failure becomes a single issue carrying serde's message.
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Create a typed schema for `T`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedSchema").finish()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Send + Sync,
{
    type Output = T;

    fn parse(&self, input: Value) -> Validation<T> {
        Validation::Ready(
            serde_json::from_value(input).map_err(|err| vec![Issue::new(err.to_string())]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> ObjectSchema {
        ObjectSchema::new(vec![
            FieldDef::required("name", FieldType::String),
            FieldDef::required("age", FieldType::Int),
            FieldDef::optional("email", FieldType::String),
        ])
    }

    #[tokio::test]
    async fn valid_payload_passes_through() {
        let schema = user_schema();
        let input = json!({"name": "Alice", "age": 30});
        let output = validate(&schema, input.clone()).await.unwrap();
        assert_eq!(output, input);

        let with_optional = json!({"name": "Bob", "age": 25, "email": "bob@example.com"});
        assert!(validate(&schema, with_optional).await.is_ok());
    }

    #[tokio::test]
    async fn missing_required_field() {
        let schema = user_schema();
        let err = validate(&schema, json!({"name": "Alice"})).await.unwrap_err();

        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].path.as_deref(), Some("age"));
        assert_eq!(err.issues()[0].message, "missing required field");
    }

    #[tokio::test]
    async fn null_required_field_rejected() {
        let schema = user_schema();
        let err = validate(&schema, json!({"name": null, "age": 30}))
            .await
            .unwrap_err();
        assert_eq!(err.issues()[0].path.as_deref(), Some("name"));
    }

    #[tokio::test]
    async fn issues_accumulate_in_field_order() {
        let schema = user_schema();
        let err = validate(&schema, json!({"name": 7, "age": "thirty"}))
            .await
            .unwrap_err();

        assert_eq!(err.issues().len(), 2);
        assert_eq!(err.issues()[0].path.as_deref(), Some("name"));
        assert_eq!(err.issues()[0].message, "expected String, got Int");
        assert_eq!(err.issues()[1].path.as_deref(), Some("age"));
        assert_eq!(err.issues()[1].message, "expected Int, got String");
    }

    #[tokio::test]
    async fn non_object_input_rejected() {
        let schema = user_schema();
        let err = validate(&schema, json!([1, 2, 3])).await.unwrap_err();
        assert_eq!(err.issues()[0].message, "input must be an object");
        assert!(err.issues()[0].path.is_none());
    }

    #[tokio::test]
    async fn json_field_accepts_any() {
        let schema = ObjectSchema::new(vec![FieldDef::required("data", FieldType::Json)]);

        for input in [
            json!({"data": "string"}),
            json!({"data": 123}),
            json!({"data": true}),
            json!({"data": [1, 2, 3]}),
            json!({"data": {"nested": "object"}}),
        ] {
            assert!(validate(&schema, input).await.is_ok());
        }
    }

    #[tokio::test]
    async fn typed_schema_deserializes() {
        #[derive(Debug, Clone, PartialEq, serde::Deserialize)]
        struct CreateUser {
            id: u64,
            name: String,
        }

        let schema = TypedSchema::<CreateUser>::new();
        let user = validate(&schema, json!({"id": 1, "name": "Jean"}))
            .await
            .unwrap();
        assert_eq!(
            user,
            CreateUser {
                id: 1,
                name: "Jean".into()
            }
        );

        let err = validate(&schema, json!({"id": "one", "name": "Jean"}))
            .await
            .unwrap_err();
        assert_eq!(err.issues().len(), 1);
    }

    /// A validator that suspends before reporting, exercising the
    /// `Validation::Pending` path of the adapter.
    struct DeferredSchema;

    impl Schema for DeferredSchema {
        type Output = Value;

        fn parse(&self, input: Value) -> Validation<Value> {
            Validation::Pending(Box::pin(async move {
                tokio::task::yield_now().await;
                if input.get("ok").and_then(Value::as_bool).unwrap_or(false) {
                    Ok(input)
                } else {
                    Err(vec![Issue::at("ok", "must be true")])
                }
            }))
        }
    }

    #[tokio::test]
    async fn pending_validator_awaited() {
        let schema = DeferredSchema;

        let output = validate(&schema, json!({"ok": true})).await.unwrap();
        assert_eq!(output, json!({"ok": true}));

        let err = validate(&schema, json!({"ok": false})).await.unwrap_err();
        assert_eq!(err.issues()[0].path.as_deref(), Some("ok"));
    }

    #[test]
    fn field_type_display() {
        assert_eq!(FieldType::String.to_string(), "String");
        assert_eq!(FieldType::Int.to_string(), "Int");
        assert_eq!(FieldType::Json.to_string(), "Json");
    }

    #[test]
    fn object_schema_serialization() {
        let schema = user_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: ObjectSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn well_typed_objects_always_validate(name in ".*", age in any::<i64>()) {
                let schema = user_schema();
                let input = json!({"name": name, "age": age});
                let outcome = match schema.parse(input.clone()) {
                    Validation::Ready(outcome) => outcome,
                    Validation::Pending(_) => unreachable!("object schema is synchronous"),
                };
                prop_assert_eq!(outcome.unwrap(), input);
            }

            #[test]
            fn mistyped_age_always_rejected(name in ".*", age in ".*") {
                let schema = user_schema();
                let input = json!({"name": name, "age": age});
                let outcome = match schema.parse(input) {
                    Validation::Ready(outcome) => outcome,
                    Validation::Pending(_) => unreachable!("object schema is synchronous"),
                };
                let issues = outcome.unwrap_err();
                prop_assert_eq!(issues[0].path.as_deref(), Some("age"));
            }
        }
    }
}

use serde::{Deserialize, Serialize}; // Stored documents & DTO conversion
use serde_json::{Map, Value}; // Incoming payloads are raw JSON objects
use std::fmt;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid field value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
    #[error("Missing required field '{0}'")]
    MissingField(String),
}

// --- Disco ID ---

/// Opaque record identifier. Each store decides how it is minted and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoId(String);

impl DiscoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<String> for DiscoId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<DiscoId> for String {
    fn from(id: DiscoId) -> Self {
        id.0
    }
}
impl fmt::Display for DiscoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Schema Definition ---

pub const NAME_FIELD: &str = "name";
pub const QUANTITY_FIELD: &str = "quantity";

/// Defines the type of a field in the record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Non-empty JSON string.
    Text,
    /// JSON number with an integral value that fits in an `i64`.
    Integer,
}

/// Defines a single field within the record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub field_type: FieldType,
    /// Required fields must be present and non-null on every full write.
    pub optional: bool,
}

impl FieldDefinition {
    /// Checks a present, non-null value against the declared type.
    fn check(&self, value: &Value) -> Result<(), DomainError> {
        match self.field_type {
            FieldType::Text => match value.as_str() {
                Some(text) if !text.is_empty() => Ok(()),
                Some(_) => Err(self.invalid("Expected a non-empty text string".to_string())),
                None => Err(self.invalid(format!("Expected a text string, got {}", value))),
            },
            FieldType::Integer => match integer_value(value) {
                Some(_) => Ok(()),
                None => Err(self.invalid(format!("Expected an integer number, got {}", value))),
            },
        }
    }

    fn invalid(&self, reason: String) -> DomainError {
        DomainError::InvalidFieldValue {
            field: self.name.to_string(),
            reason,
        }
    }
}

/// Reads an integral JSON number, accepting floats without a fractional part (`17.0`).
/// Values outside the `i64` range are rejected, never clamped.
fn integer_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    // `i64::MAX as f64` rounds up to 2^63, which itself does not fit.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// The shape every stored disco must satisfy.
///
/// Validation happens at write time only. Fields not declared here are ignored,
/// including any client-supplied `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoSchema {
    fields: Vec<FieldDefinition>,
}

impl Default for DiscoSchema {
    fn default() -> Self {
        DiscoSchema {
            fields: vec![
                FieldDefinition {
                    name: NAME_FIELD,
                    field_type: FieldType::Text,
                    optional: false,
                },
                FieldDefinition {
                    name: QUANTITY_FIELD,
                    field_type: FieldType::Integer,
                    optional: false,
                },
            ],
        }
    }
}

impl DiscoSchema {
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Gets a field definition by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Validates a complete payload (create or replace).
    /// A `null` value counts as missing.
    pub fn validate(&self, payload: &Map<String, Value>) -> Result<DiscoFields, DomainError> {
        for field in &self.fields {
            match payload.get(field.name).filter(|value| !value.is_null()) {
                Some(value) => field.check(value)?,
                None if field.optional => {}
                None => return Err(DomainError::MissingField(field.name.to_string())),
            }
        }

        let patch = DiscoPatch::read(payload);
        match (patch.name, patch.quantity) {
            (Some(name), Some(quantity)) => Ok(DiscoFields { name, quantity }),
            (None, _) => Err(DomainError::MissingField(NAME_FIELD.to_string())),
            (_, None) => Err(DomainError::MissingField(QUANTITY_FIELD.to_string())),
        }
    }

    /// Validates a partial payload. Absent and `null` fields are skipped;
    /// present fields must still have the declared type.
    pub fn patch(&self, payload: &Map<String, Value>) -> Result<DiscoPatch, DomainError> {
        for field in &self.fields {
            if let Some(value) = payload.get(field.name).filter(|value| !value.is_null()) {
                field.check(value)?;
            }
        }
        Ok(DiscoPatch::read(payload))
    }

    /// Re-checks already typed fields, e.g. the result of a merge.
    pub fn check(&self, fields: &DiscoFields) -> Result<(), DomainError> {
        self.validate(&fields.to_map()).map(|_| ())
    }
}

// --- Disco Record ---

/// The user-editable part of a disco.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DiscoFields {
    pub name: String,
    pub quantity: i64,
}

impl DiscoFields {
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(NAME_FIELD.to_string(), Value::from(self.name.clone()));
        map.insert(QUANTITY_FIELD.to_string(), Value::from(self.quantity));
        map
    }
}

/// Field-level update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
}

impl DiscoPatch {
    fn read(payload: &Map<String, Value>) -> Self {
        DiscoPatch {
            name: payload
                .get(NAME_FIELD)
                .and_then(Value::as_str)
                .map(str::to_owned),
            quantity: payload.get(QUANTITY_FIELD).and_then(integer_value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none()
    }
}

/// A stored disco: identifier plus validated fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Disco {
    id: DiscoId,
    #[serde(flatten)]
    fields: DiscoFields,
}

impl Disco {
    pub fn new(id: DiscoId, fields: DiscoFields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &DiscoId {
        &self.id
    }

    pub fn fields(&self) -> &DiscoFields {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn quantity(&self) -> i64 {
        self.fields.quantity
    }

    /// Keeps the identifier, swaps every field.
    pub fn replaced(&self, fields: DiscoFields) -> Self {
        Self::new(self.id.clone(), fields)
    }

    /// Merges a patch; fields the patch does not carry keep their value.
    pub fn patched(&self, patch: DiscoPatch) -> Self {
        let mut fields = self.fields.clone();
        if let Some(name) = patch.name {
            fields.name = name;
        }
        if let Some(quantity) = patch.quantity {
            fields.quantity = quantity;
        }
        Self::new(self.id.clone(), fields)
    }
}

use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// A document type stored in its own collection.
///
/// Implementors declare where they live, which indexes the collection
/// carries, and how a document is validated before any write.
pub trait Schema: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    fn indexes() -> Vec<IndexSpec>;

    fn validate(&self) -> Result<(), ValidationError>;

    fn id(&self) -> Option<ObjectId>;

    fn set_id(&mut self, id: ObjectId);

    /// Sets `created_at` and `updated_at` for a fresh insert.
    fn stamp_created(&mut self, now: i64);
}

// ==================== INDEXES ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKey {
    Ascending,
    Text,
}

/// Declarative index definition, shared by every store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<(String, IndexKey)>,
    pub unique: bool,
    pub sparse: bool,
}

impl IndexSpec {
    /// Single or compound ascending index named the way MongoDB names them
    /// (`field_1_other_1`).
    pub fn ascending(fields: &[&str]) -> Self {
        let name = fields
            .iter()
            .map(|f| format!("{}_1", f))
            .collect::<Vec<_>>()
            .join("_");

        Self {
            name,
            keys: fields
                .iter()
                .map(|f| (f.to_string(), IndexKey::Ascending))
                .collect(),
            unique: false,
            sparse: false,
        }
    }

    pub fn text(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keys: fields
                .iter()
                .map(|f| (f.to_string(), IndexKey::Text))
                .collect(),
            unique: false,
            sparse: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    pub fn is_text(&self) -> bool {
        self.keys.iter().any(|(_, k)| *k == IndexKey::Text)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(f, _)| f.as_str())
    }

    /// Key document in MongoDB's `createIndexes` shape.
    pub fn key_document(&self) -> Document {
        let mut keys = doc! {};
        for (field, kind) in &self.keys {
            match kind {
                IndexKey::Ascending => keys.insert(field.clone(), 1),
                IndexKey::Text => keys.insert(field.clone(), "text"),
            };
        }
        keys
    }
}

// ==================== VALIDATION ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every constraint a document violated, reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub collection: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(collection: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            collection: collection.to_string(),
            errors: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed: ", self.collection)?;
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Collects field errors for one document.
pub struct Validator {
    collection: &'static str,
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            errors: Vec::new(),
        }
    }

    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.error(field, "is required");
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.error(field, "is required");
        } else if !is_email(value) {
            self.error(field, format!("'{}' is not a valid email address", value));
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.error(field, format!("must be between {} and {}", min, max));
        }
    }

    pub fn date(&mut self, field: &str, value: &str) {
        if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            self.error(field, format!("'{}' is not a YYYY-MM-DD date", value));
        }
    }

    pub fn optional_date(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.date(field, v);
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                collection: self.collection.to_string(),
                errors: self.errors,
            })
        }
    }
}

fn is_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

// ==================== ENUM FIELDS ====================

/// A field restricted to a fixed set of string values.
pub trait EnumField: Sized + Copy + 'static {
    const VALUES: &'static [&'static str];

    fn as_str(&self) -> &'static str;

    fn from_value(value: &str) -> Option<Self>;
}

/// Parses a raw payload value into an enum field, reporting the allowed
/// values on failure.
pub fn parse_enum<E: EnumField>(
    collection: &str,
    field: &str,
    value: &str,
) -> Result<E, ValidationError> {
    E::from_value(value).ok_or_else(|| {
        ValidationError::single(
            collection,
            field,
            format!(
                "'{}' is not a valid value (expected one of: {})",
                value,
                E::VALUES.join(", ")
            ),
        )
    })
}

/// Declares a string-valued enum with serde, `Display` and `EnumField`
/// impls sharing one value table.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $crate::models::schema::EnumField for $name {
            const VALUES: &'static [&'static str] = &[$($value),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            fn from_value(value: &str) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::models::schema::EnumField::as_str(self))
            }
        }
    };
}

pub(crate) use string_enum;

// ==================== TIMESTAMPS ====================

pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

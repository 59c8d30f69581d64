//! Destination shape descriptions.
//!
//! A destination type describes itself through [`Shape::kind`]. Record-shaped
//! destinations additionally implement [`Describe`], listing each field's declared
//! name, canonical (serialized) name, and [`Kind`]. The canonical name must match
//! the name serde uses for the field, since the final decode goes through
//! `serde_json`.
//!
//! [`Kind::Record`] stores a [`RecordRef`] whose field list is built on demand, so
//! self-referential destination types describe themselves without recursing
//! forever.
//!
//! ```
//! use databridge::{record_shape, schema::{Kind, Shape}};
//!
//! #[derive(serde::Deserialize)]
//! struct Person {
//!     #[serde(rename = "First_Name")]
//!     first_name: String,
//!     age: i64,
//! }
//!
//! record_shape!(Person {
//!     first_name as "First_Name": String,
//!     age: i64,
//! });
//!
//! assert!(matches!(Person::kind(), Kind::Record(_)));
//! ```

use std::{collections::BTreeMap, collections::HashMap, fmt};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// Instant with offset, emitted as RFC 3339.
    Timestamp,
    /// Wall-clock date and time without offset.
    LocalDateTime,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// Untyped destination; values pass through untouched.
    Any,
    /// Untyped single record. A dataset narrows to its first row.
    Map,
    String,
    Boolean,
    Integer,
    Unsigned,
    Float,
    Temporal(TemporalKind),
    Optional(Box<Kind>),
    Record(RecordRef),
    Collection(Box<Kind>),
}

impl Kind {
    pub fn of<T: Shape + ?Sized>() -> Kind {
        T::kind()
    }

    pub fn record<T: Describe + ?Sized>() -> Kind {
        Kind::Record(RecordRef::of::<T>())
    }

    /// The record reference behind a record or optional-record kind.
    pub fn record_ref(&self) -> Option<&RecordRef> {
        match self {
            Kind::Record(record) => Some(record),
            Kind::Optional(inner) => match inner.as_ref() {
                Kind::Record(record) => Some(record),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Kind::Any => "any".to_string(),
            Kind::Map => "map".to_string(),
            Kind::String => "string".to_string(),
            Kind::Boolean => "boolean".to_string(),
            Kind::Integer => "integer".to_string(),
            Kind::Unsigned => "unsigned".to_string(),
            Kind::Float => "float".to_string(),
            Kind::Temporal(TemporalKind::Timestamp) => "timestamp".to_string(),
            Kind::Temporal(TemporalKind::LocalDateTime) => "datetime".to_string(),
            Kind::Temporal(TemporalKind::Date) => "date".to_string(),
            Kind::Optional(inner) => format!("optional<{}>", inner.describe()),
            Kind::Record(record) => format!("record<{}>", record.type_name()),
            Kind::Collection(inner) => format!("collection<{}>", inner.describe()),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Lazy handle to a record type's field list.
#[derive(Clone, Copy)]
pub struct RecordRef {
    type_name: &'static str,
    build: fn() -> RecordShape,
}

impl RecordRef {
    pub fn of<T: Describe + ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            build: T::describe,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> RecordShape {
        (self.build)()
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordRef").field(&self.type_name).finish()
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name as declared on the type.
    pub name: String,
    /// External name the field is matched and re-emitted under.
    pub canonical: String,
    pub kind: Kind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordShape {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, canonical: impl Into<String>, kind: Kind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            canonical: canonical.into(),
            kind,
        });
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn by_canonical(&self, canonical: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.canonical == canonical)
    }
}

pub trait Shape {
    fn kind() -> Kind;
}

pub trait Describe {
    fn describe() -> RecordShape;
}

/// Implements [`Describe`] and [`Shape`] for a record-shaped type.
///
/// Each entry is `field: Type` or `field as "CanonicalName": Type`. Fields the
/// destination skips during deserialization should simply be left out.
#[macro_export]
macro_rules! record_shape {
    ($ty:ty { $($field:ident $(as $canonical:literal)? : $fty:ty),* $(,)? }) => {
        impl $crate::schema::Describe for $ty {
            fn describe() -> $crate::schema::RecordShape {
                $crate::schema::RecordShape::new(::std::any::type_name::<$ty>())
                    $(.field(
                        stringify!($field),
                        $crate::__canonical_name!($field $($canonical)?),
                        <$fty as $crate::schema::Shape>::kind(),
                    ))*
            }
        }

        impl $crate::schema::Shape for $ty {
            fn kind() -> $crate::schema::Kind {
                $crate::schema::Kind::record::<$ty>()
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __canonical_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident $canonical:literal) => {
        $canonical
    };
}

macro_rules! impl_shape {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Shape for $ty {
                fn kind() -> Kind {
                    $kind
                }
            }
        )+
    };
}

impl_shape!(Kind::String => String, str, char);
impl_shape!(Kind::Boolean => bool);
impl_shape!(Kind::Integer => i8, i16, i32, i64, i128, isize);
impl_shape!(Kind::Unsigned => u8, u16, u32, u64, u128, usize);
impl_shape!(Kind::Float => f32, f64);
impl_shape!(Kind::Temporal(TemporalKind::Timestamp) => DateTime<Utc>, DateTime<FixedOffset>);
impl_shape!(Kind::Temporal(TemporalKind::LocalDateTime) => NaiveDateTime);
impl_shape!(Kind::Temporal(TemporalKind::Date) => NaiveDate);
impl_shape!(Kind::Any => serde_json::Value);
impl_shape!(Kind::Map => serde_json::Map<String, serde_json::Value>);

impl<T: Shape> Shape for Option<T> {
    fn kind() -> Kind {
        Kind::Optional(Box::new(T::kind()))
    }
}

impl<T: Shape + ?Sized> Shape for Box<T> {
    fn kind() -> Kind {
        T::kind()
    }
}

impl<T: Shape> Shape for Vec<T> {
    fn kind() -> Kind {
        Kind::Collection(Box::new(T::kind()))
    }
}

impl<T> Shape for BTreeMap<String, T> {
    fn kind() -> Kind {
        Kind::Map
    }
}

impl<T, S> Shape for HashMap<String, T, S> {
    fn kind() -> Kind {
        Kind::Map
    }
}

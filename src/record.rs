//! Record metadata: field descriptors, field values and the `Record` trait.
//!
//! A record is a typed row definition with exactly one `Long` identifier field.
//! Implementations are normally generated by [`record!`](crate::record!), which
//! plays the role of the declarative tag: the `#[id]` marker on a field sets the
//! identifier flag in the generated descriptor.

use crate::error::{AppError, ConfigError};
use serde::{Serialize, Serializer};
use std::fmt;

/// Primitive type of a record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Long,
    Boolean,
    Float,
    Double,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Integer => "Integer",
            FieldType::Long => "Long",
            FieldType::Boolean => "Boolean",
            FieldType::Float => "Float",
            FieldType::Double => "Double",
        }
    }

    /// Zero value used when an input mapping has no entry for a field.
    pub fn zero(self) -> FieldValue {
        match self {
            FieldType::String => FieldValue::String(String::new()),
            FieldType::Integer => FieldValue::Integer(0),
            FieldType::Long => FieldValue::Long(0),
            FieldType::Boolean => FieldValue::Boolean(false),
            FieldType::Float => FieldValue::Float(0.0),
            FieldType::Double => FieldValue::Double(0.0),
        }
    }

    /// Convert a raw string (query or decoded body value) into a value of this type.
    /// Booleans accept `true`/`false` in any case; numbers are decimal.
    pub fn parse(self, field: &str, raw: &str) -> Result<FieldValue, AppError> {
        let fail = || AppError::Conversion {
            field: field.to_string(),
            value: raw.to_string(),
            target: self.as_str().to_string(),
        };
        Ok(match self {
            FieldType::String => FieldValue::String(raw.to_string()),
            FieldType::Integer => FieldValue::Integer(raw.parse().map_err(|_| fail())?),
            FieldType::Long => FieldValue::Long(raw.parse().map_err(|_| fail())?),
            FieldType::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    FieldValue::Boolean(true)
                } else if raw.eq_ignore_ascii_case("false") {
                    FieldValue::Boolean(false)
                } else {
                    return Err(fail());
                }
            }
            FieldType::Float => FieldValue::Float(raw.parse().map_err(|_| fail())?),
            FieldType::Double => FieldValue::Double(raw.parse().map_err(|_| fail())?),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value held by a stored instance.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i32),
    Long(i64),
    Boolean(bool),
    Float(f32),
    Double(f64),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Long(_) => FieldType::Long,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Double(_) => FieldType::Double,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(n) => Some(*n),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::String(v) => serializer.serialize_str(v),
            FieldValue::Integer(v) => serializer.serialize_i32(*v),
            FieldValue::Long(v) => serializer.serialize_i64(*v),
            FieldValue::Boolean(v) => serializer.serialize_bool(*v),
            FieldValue::Float(v) => serializer.serialize_f64(widen(*v)),
            FieldValue::Double(v) => serializer.serialize_f64(*v),
        }
    }
}

/// f32 -> f64 through the shortest decimal form, so `0.1f32` stays `0.1`.
fn widen(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for FieldValue {
                fn from(v: $type) -> Self {
                    FieldValue::$variant(v)
                }
            }

            impl TryFrom<FieldValue> for $type {
                type Error = FieldValue;

                fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
                    match value {
                        FieldValue::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    String => String,
    i32 => Integer,
    i64 => Long,
    bool => Boolean,
    f32 => Float,
    f64 => Double,
);

/// Metadata for one record field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    /// Carries the identifier marker.
    pub identifier: bool,
}

/// Reflected shape of a record type: qualified name, table name and ordered fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordType {
    pub name: &'static str,
    pub table: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordType {
    pub fn new(name: &'static str, table: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        RecordType {
            name,
            table,
            fields,
        }
    }

    /// The single identifier field. Fails unless exactly one field is marked and it is a `Long`.
    pub fn identifier(&self) -> Result<&FieldDescriptor, ConfigError> {
        let marked: Vec<&FieldDescriptor> = self.fields.iter().filter(|f| f.identifier).collect();
        match marked.as_slice() {
            [] => Err(ConfigError::MissingIdentifier {
                record: self.name.to_string(),
            }),
            [id] if id.ty != FieldType::Long => Err(ConfigError::IdentifierType {
                record: self.name.to_string(),
                field: id.name.to_string(),
                found: id.ty.to_string(),
            }),
            [id] => Ok(id),
            many => Err(ConfigError::MultipleIdentifiers {
                record: self.name.to_string(),
                fields: many.iter().map(|f| f.name).collect::<Vec<_>>().join(", "),
            }),
        }
    }

    /// Non-identifier fields in declaration order.
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.identifier)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Read access to named field values of some object.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// A record type whose instances live in the entity store.
pub trait Record: FieldSource + Default + Clone + Serialize + Send + Sync + 'static {
    /// Fully qualified type name.
    const NAME: &'static str;

    fn record_type() -> RecordType;

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), AppError>;

    /// Build a value of this record from any field source, copying every descriptor field.
    fn from_source(source: &dyn FieldSource) -> Result<Self, AppError> {
        let mut out = Self::default();
        for field in Self::record_type().fields {
            let value = source.field(field.name).ok_or_else(|| AppError::FieldMapping {
                record: Self::NAME.to_string(),
                detail: format!("source has no field {}", field.name),
            })?;
            out.set_field(field.name, value)?;
        }
        Ok(out)
    }
}

#[doc(hidden)]
pub fn is_identifier_marker(marker: &str) -> bool {
    marker == "id"
}

#[doc(hidden)]
pub fn convert_field<V>(record: &str, field: &str, value: FieldValue) -> Result<V, AppError>
where
    V: TryFrom<FieldValue, Error = FieldValue>,
{
    V::try_from(value).map_err(|v| AppError::FieldMapping {
        record: record.to_string(),
        detail: format!("field {} cannot hold a {} value", field, v.field_type()),
    })
}

#[doc(hidden)]
pub fn unknown_field(record: &str, field: &str) -> AppError {
    AppError::FieldMapping {
        record: record.to_string(),
        detail: format!("no field named {}", field),
    }
}

/// Rust type backing a [`FieldType`] variant.
#[macro_export]
macro_rules! field_type {
    (String) => { ::std::string::String };
    (Integer) => { i32 };
    (Long) => { i64 };
    (Boolean) => { bool };
    (Float) => { f32 };
    (Double) => { f64 };
}

/// Declare a record struct and its `Record` implementation.
///
/// ```ignore
/// component_sdk::record! {
///     pub struct Employee in "employees" {
///         #[id] id: Long,
///         name: String,
///         email: String,
///     }
/// }
/// ```
///
/// The calling crate must depend on `serde`.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $( $(#[$marker:ident])? $field:ident : $kind:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
        $vis struct $name {
            $( pub $field: $crate::field_type!($kind), )*
        }

        impl $crate::record::FieldSource for $name {
            fn field(&self, name: &str) -> ::core::option::Option<$crate::record::FieldValue> {
                match name {
                    $(
                        stringify!($field) => ::core::option::Option::Some(
                            $crate::record::FieldValue::from(::core::clone::Clone::clone(&self.$field)),
                        ),
                    )*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::record::Record for $name {
            const NAME: &'static str = concat!(module_path!(), "::", stringify!($name));

            fn record_type() -> $crate::record::RecordType {
                $crate::record::RecordType::new(
                    <Self as $crate::record::Record>::NAME,
                    $table,
                    vec![
                        $(
                            $crate::record::FieldDescriptor {
                                name: stringify!($field),
                                ty: $crate::record::FieldType::$kind,
                                identifier: false $( || $crate::record::is_identifier_marker(stringify!($marker)) )?,
                            },
                        )*
                    ],
                )
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::record::FieldValue,
            ) -> ::core::result::Result<(), $crate::error::AppError> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = $crate::record::convert_field(
                                <Self as $crate::record::Record>::NAME,
                                name,
                                value,
                            )?;
                            ::core::result::Result::Ok(())
                        }
                    )*
                    _ => ::core::result::Result::Err($crate::record::unknown_field(
                        <Self as $crate::record::Record>::NAME,
                        name,
                    )),
                }
            }
        }
    };
}

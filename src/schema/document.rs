// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! The `Document` trait and its declarative `impl_document!` macro

use std::sync::Arc;

use super::descriptor::{DocumentLayout, FieldSpec};
use super::types::FieldValue;
use crate::core::errors::ConfigError;

/// A caller-defined record stored in a collection.
///
/// Implementations declare their fields once through [`Document::field_specs`]; the
/// mapping layer reads values with [`Document::field_value`] when marshalling and writes
/// them into `Default` instances with [`Document::set_field_value`] when unmarshalling.
/// Most types use [`impl_document!`](crate::impl_document) instead of a hand-written impl.
pub trait Document: Default + Send + Sync + 'static {
    /// Type name, used to derive the default collection name
    fn type_name() -> &'static str;

    /// Declared fields in declaration order
    fn field_specs() -> Vec<FieldSpec>;

    /// Current value of a declared field
    fn field_value(&self, name: &str) -> Option<FieldValue>;

    /// Assign a declared field. `Err` hands the value back when the name is unknown
    /// or the value kind does not fit the field.
    fn set_field_value(&mut self, name: &str, value: FieldValue) -> Result<(), FieldValue>;

    /// Memoized layout of this type
    fn layout() -> Result<Arc<DocumentLayout>, ConfigError> {
        DocumentLayout::of::<Self>()
    }
}

/// Implement [`Document`] for a struct from a field table.
///
/// ```
/// use proximadb_orm::impl_document;
///
/// #[derive(Debug, Default, Clone)]
/// struct Article {
///     id: i64,
///     title: String,
///     embedding: Vec<f32>,
///     score: f32,
/// }
///
/// impl_document!(Article {
///     id: i64 => "in,out,primary-key",
///     title: String => "in,out,max-length=512",
///     embedding: Vec<f32> => "in,dimension=768,indexed",
///     score: f32 => "score",
/// });
/// ```
#[macro_export]
macro_rules! impl_document {
    ($ty:ident { $($field:ident : $fty:ty => $tags:literal),* $(,)? }) => {
        impl $crate::schema::Document for $ty {
            fn type_name() -> &'static str {
                stringify!($ty)
            }

            fn field_specs() -> ::std::vec::Vec<$crate::schema::FieldSpec> {
                ::std::vec![
                    $(
                        $crate::schema::FieldSpec::new(
                            stringify!($field),
                            <$fty as $crate::schema::FieldKind>::SEMANTIC_TYPE,
                            $tags,
                        )
                    ),*
                ]
            }

            fn field_value(&self, name: &str) -> ::std::option::Option<$crate::schema::FieldValue> {
                match name {
                    $(
                        stringify!($field) => ::std::option::Option::Some(
                            <$fty as $crate::schema::FieldKind>::to_field_value(&self.$field),
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_field_value(
                &mut self,
                name: &str,
                value: $crate::schema::FieldValue,
            ) -> ::std::result::Result<(), $crate::schema::FieldValue> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = <$fty as $crate::schema::FieldKind>::from_field_value(value)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    _ => ::std::result::Result::Err(value),
                }
            }
        }
    };
}

//! # Schema Module
//!
//! Type descriptors, the per-table field registry built from a header row, and
//! the name-indexed registry that `Object` descriptors resolve against.
use std::collections::HashMap;
use thiserror::Error;

mod descriptor;

pub use descriptor::Composite;
pub use descriptor::ContainerKind;
pub use descriptor::GenericArgs;
pub use descriptor::TypeDescriptor;

/// Errors related to schema lookup and descriptor parsing.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A header names a field the schema does not declare (schema, field)
    #[error("Unknown field '{1}' in schema '{0}'")]
    UnknownField(String, String),

    /// An object descriptor names a schema that is not registered
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Invalid type descriptor '{0}'")]
    InvalidTypeDescriptor(String),
}

/// A named, typed field.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: TypeDescriptor,
}

impl Field {
    pub fn new(name: &str, kind: TypeDescriptor) -> Self {
        Field { name: name.to_owned(), kind }
    }
}

/// Ordered set of uniquely named fields for one logical table or object type.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub name: String,
    fields: Vec<Field>,
    indexes: HashMap<String, usize>,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Schema {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Builds a schema from `(field name, descriptor text)` pairs.
    pub fn parse(name: &str, fields: &[(&str, &str)]) -> Result<Self, SchemaError> {
        let mut schema = Schema::new(name);
        for (field, kind) in fields {
            schema.insert(Field::new(field, TypeDescriptor::parse(kind)?));
        }
        Ok(schema)
    }

    /// Adds a field, replacing the descriptor of an existing field with the same name.
    pub fn insert(&mut self, field: Field) {
        match self.indexes.get(&field.name) {
            Some(index) => self.fields[*index] = field,
            None => {
                self.indexes.insert(field.name.to_owned(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    /// Builder-style [`Schema::insert`].
    pub fn with_field(mut self, name: &str, kind: TypeDescriptor) -> Self {
        self.insert(Field::new(name, kind));
        self
    }

    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> Result<&Field, SchemaError> {
        self.find_field(name)
            .ok_or_else(|| SchemaError::UnknownField(self.name.to_owned(), name.to_owned()))
    }

    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.indexes.get(name).map(|index| &self.fields[*index])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Resolves every header name once, so rows can be read positionally.
    pub fn prepare_header_fields<S: AsRef<str>>(&self, header: &[S]) -> Result<Vec<&Field>, SchemaError> {
        header.iter().map(|name| self.get_field(name.as_ref())).collect()
    }
}

/// Name-indexed registry of schemas; the target of `Object(name)` descriptors.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    schemas: HashMap<String, Schema>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its own name, replacing any previous one.
    pub fn register(&mut self, schema: Schema) {
        self.schemas.insert(schema.name.to_owned(), schema);
    }

    /// Builder-style [`TypeRegistry::register`].
    pub fn with(mut self, schema: Schema) -> Self {
        self.register(schema);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Schema, SchemaError> {
        self.schemas
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_owned()))
    }
}

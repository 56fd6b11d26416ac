use crate::schema::SchemaError;
use std::fmt::Display;

/// Container shape of a composite descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    List,
    Dictionary,
}

impl ContainerKind {
    /// Number of type arguments the container needs.
    pub const fn arity(&self) -> usize {
        match self {
            ContainerKind::Array | ContainerKind::List => 1,
            ContainerKind::Dictionary => 2,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Array => "Array",
            ContainerKind::List => "List",
            ContainerKind::Dictionary => "Dictionary",
        }
    }
}

/// Recursive description of a field's shape.
///
/// `Object` names a schema in a [`TypeRegistry`](crate::schema::TypeRegistry) instead of owning
/// it, so named types may refer to each other.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
    Array(Box<TypeDescriptor>),
    List(Box<TypeDescriptor>),
    Dictionary(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// Built through [`TypeDescriptor::generic`], which checks the argument count.
    Generic(ContainerKind, GenericArgs),
    Object(String),
}

/// Type arguments of a [`TypeDescriptor::Generic`], always as many as its container's arity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericArgs(Vec<TypeDescriptor>);

impl GenericArgs {
    pub fn as_slice(&self) -> &[TypeDescriptor] {
        &self.0
    }
}

/// The container view of a composite descriptor: what to build and from which element types.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Composite<'a> {
    Sequence(ContainerKind, &'a TypeDescriptor),
    Dictionary(&'a TypeDescriptor, &'a TypeDescriptor),
    Object(&'a str),
}

impl TypeDescriptor {
    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    pub fn dictionary(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Dictionary(Box::new(key), Box::new(value))
    }

    pub fn object(name: &str) -> Self {
        TypeDescriptor::Object(name.to_owned())
    }

    /// Builds a generic container, failing unless `args` has exactly the container's arity.
    pub fn generic(kind: ContainerKind, args: Vec<TypeDescriptor>) -> Result<Self, SchemaError> {
        if args.len() != kind.arity() {
            Err(SchemaError::InvalidTypeDescriptor(format!(
                "{} takes {} type argument(s), got {}",
                kind.as_str(),
                kind.arity(),
                args.len()
            )))?
        }
        Ok(TypeDescriptor::Generic(kind, GenericArgs(args)))
    }

    /// Returns true for kinds whose value spans multiple source cells.
    pub fn is_composite(&self) -> bool {
        self.as_composite().is_some()
    }

    /// Returns the container view of a composite kind, `None` for primitives.
    pub fn as_composite(&self) -> Option<Composite<'_>> {
        match self {
            TypeDescriptor::Array(element) => Some(Composite::Sequence(ContainerKind::Array, element)),
            TypeDescriptor::List(element) => Some(Composite::Sequence(ContainerKind::List, element)),
            TypeDescriptor::Dictionary(key, value) => Some(Composite::Dictionary(key, value)),
            TypeDescriptor::Generic(kind, args) => match (kind, args.as_slice()) {
                (ContainerKind::Array | ContainerKind::List, [element]) => Some(Composite::Sequence(*kind, element)),
                (ContainerKind::Dictionary, [key, value]) => Some(Composite::Dictionary(key, value)),
                _ => None,
            },
            TypeDescriptor::Object(name) => Some(Composite::Object(name)),
            _ => None,
        }
    }

    /// Parses the textual descriptor syntax.
    ///
    /// Supports (case-insensitive keywords):
    /// - `int`, `long`, `float`, `double`, `bool`, `string` and their aliases
    /// - `T[]` for arrays, `List<T>` for lists
    /// - `Dictionary<K, V>` (also `Dict<K, V>`, `Map<K, V>`) for dictionaries
    /// - any other identifier as a named object type
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let text = text.trim();
        if text.is_empty() {
            Err(SchemaError::InvalidTypeDescriptor(text.to_owned()))?
        }
        if let Some(element) = text.strip_suffix("[]") {
            return Ok(TypeDescriptor::array(Self::parse(element)?));
        }
        if let Some((name, args)) = text.strip_suffix('>').and_then(|it| it.split_once('<')) {
            let args = split_type_arguments(args)
                .ok_or_else(|| SchemaError::InvalidTypeDescriptor(text.to_owned()))?
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()?;
            let kind = match name.trim().to_ascii_uppercase().as_str() {
                "LIST" => ContainerKind::List,
                "ARRAY" => ContainerKind::Array,
                "DICTIONARY" | "DICT" | "MAP" => ContainerKind::Dictionary,
                _ => Err(SchemaError::InvalidTypeDescriptor(text.to_owned()))?,
            };
            let mut args = Self::generic(kind, args)
                .map_err(|_| SchemaError::InvalidTypeDescriptor(text.to_owned()))?
                .into_args();
            return Ok(match kind {
                ContainerKind::Array => TypeDescriptor::array(args.remove(0)),
                ContainerKind::List => TypeDescriptor::list(args.remove(0)),
                ContainerKind::Dictionary => {
                    let value = args.remove(1);
                    TypeDescriptor::dictionary(args.remove(0), value)
                }
            });
        }
        match text.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" | "INT32" => Ok(Self::Int),
            "LONG" | "BIGINT" | "INT64" => Ok(Self::Long),
            "FLOAT" | "SINGLE" => Ok(Self::Float),
            "DOUBLE" | "DECIMAL" | "NUMBER" => Ok(Self::Double),
            "BOOL" | "BOOLEAN" => Ok(Self::Boolean),
            "STRING" | "STR" | "TEXT" | "VARCHAR" => Ok(Self::String),
            _ if is_identifier(text) => Ok(Self::Object(text.to_owned())),
            _ => Err(SchemaError::InvalidTypeDescriptor(text.to_owned())),
        }
    }

    fn into_args(self) -> Vec<TypeDescriptor> {
        match self {
            TypeDescriptor::Generic(_, args) => args.0,
            _ => Vec::new(),
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDescriptor::Int => write!(f, "int"),
            TypeDescriptor::Long => write!(f, "long"),
            TypeDescriptor::Float => write!(f, "float"),
            TypeDescriptor::Double => write!(f, "double"),
            TypeDescriptor::Boolean => write!(f, "bool"),
            TypeDescriptor::String => write!(f, "string"),
            TypeDescriptor::Array(element) => write!(f, "{}[]", element),
            TypeDescriptor::List(element) => write!(f, "List<{}>", element),
            TypeDescriptor::Dictionary(key, value) => write!(f, "Dictionary<{}, {}>", key, value),
            TypeDescriptor::Generic(kind, args) => {
                let args = args.as_slice().iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{}<{}>", kind.as_str(), args.join(", "))
            }
            TypeDescriptor::Object(name) => write!(f, "{}", name),
        }
    }
}

/// Splits `K, List<V>` at top-level commas; `None` on unbalanced brackets.
fn split_type_arguments(text: &str) -> Option<Vec<&str>> {
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut args = Vec::new();
    for (index, char) in text.char_indices() {
        match char {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                args.push(&text[start..index]);
                start = index + 1;
            }
            _ => (),
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(&text[start..]);
    Some(args)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().map(|char| char.is_alphabetic() || char == '_').unwrap_or(false)
        && chars.all(|char| char.is_alphanumeric() || char == '_' || char == '.')
}

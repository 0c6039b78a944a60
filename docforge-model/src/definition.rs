use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved object type holding read operations.
pub const QUERY_TYPE: &str = "Query";

/// Reserved object type holding write operations.
pub const MUTATION_TYPE: &str = "Mutation";

/// A declared type as written in the schema, e.g. `[Person!]!`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeReference {
    Named(String),
    NonNull(Box<TypeReference>),
    List(Box<TypeReference>),
}

impl TypeReference {
    /// Shorthand for a nullable named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps this type in a non-null modifier.
    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    /// Wraps this type in a list modifier.
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// True when the outermost modifier is non-null.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// True when the type is a list once an outer non-null is stripped.
    pub fn is_list(&self) -> bool {
        matches!(self.nullable(), Self::List(_))
    }

    /// The type with one outer non-null modifier removed, if present.
    pub fn nullable(&self) -> &TypeReference {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// The element type of a list, ignoring an outer non-null.
    pub fn list_item(&self) -> Option<&TypeReference> {
        match self.nullable() {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// The innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// A directive attached to a type or field, e.g. `@auth(ownerField: "userId")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    /// Constant arguments in declaration order.
    #[serde(default)]
    pub arguments: Vec<(String, serde_json::Value)>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Adds a constant argument.
    pub fn with_argument(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

/// An argument of a `Query` or `Mutation` field, or a field of an input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    pub name: String,
    pub ty: TypeReference,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>, ty: TypeReference) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A field of an object or input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeReference,
    /// Declared arguments, in order. Only operation fields carry any.
    #[serde(default)]
    pub arguments: Vec<ArgumentDefinition>,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeReference) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Appends an argument.
    pub fn with_argument(mut self, name: impl Into<String>, ty: TypeReference) -> Self {
        self.arguments.push(ArgumentDefinition::new(name, ty));
        self
    }
}

/// What sort of definition a [`TypeDefinition`] is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Object,
    Input,
    Scalar,
    /// An enum with its values in declaration order.
    Enum(Vec<String>),
}

/// A named type declared in the schema, with fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: DefinitionKind,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

impl TypeDefinition {
    /// An object type with no fields yet.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DefinitionKind::Object,
            fields: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Attaches a directive.
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// `Query` and `Mutation` hold operations, not records.
    pub fn is_operation_namespace(&self) -> bool {
        self.name == QUERY_TYPE || self.name == MUTATION_TYPE
    }

    /// True for object types backed by a storage collection.
    pub fn is_entity(&self) -> bool {
        self.kind == DefinitionKind::Object && !self.is_operation_namespace()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|directive| directive.name == name)
    }
}

/// The parsed interface description: every declared type, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub types: Vec<TypeDefinition>,
}

impl SchemaDocument {
    pub fn new(types: Vec<TypeDefinition>) -> Self {
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|ty| ty.name == name)
    }

    /// Storage-backed object types, in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.iter().filter(|ty| ty.is_entity())
    }

    pub fn query(&self) -> Option<&TypeDefinition> {
        self.get(QUERY_TYPE)
    }

    pub fn mutation(&self) -> Option<&TypeDefinition> {
        self.get(MUTATION_TYPE)
    }

    pub fn is_entity(&self, name: &str) -> bool {
        self.get(name).is_some_and(TypeDefinition::is_entity)
    }

    /// True when `name` is a custom scalar declared with `scalar Name`.
    pub fn is_custom_scalar(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|ty| ty.kind == DefinitionKind::Scalar)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|ty| matches!(ty.kind, DefinitionKind::Enum(_)))
    }
}

//! Host metadata descriptors.
//!
//! These structures describe types as the host runtime sees them: declared
//! members, base types, generic parameters, enum values and the declarative
//! constraints attached to members. They are produced by an ingestion adapter
//! (see [`crate::parser`]) and consumed by [`crate::builder`], which never
//! inspects the host runtime itself.

use crate::error::ParseError;
use indexmap::IndexMap;
use std::fmt;

/// Source of host type descriptors.
pub trait MetadataProvider {
    /// Looks up a type by its fully qualified name.
    fn resolve(&self, full_name: &str) -> Option<&TypeDescriptor>;

    /// Looks up a type name as written inside `namespace`.
    ///
    /// The name is tried as fully qualified first, then relative to
    /// `namespace` and each of its parents.
    fn resolve_relative(&self, name: &str, namespace: &str) -> Option<&TypeDescriptor> {
        if let Some(found) = self.resolve(name) {
            return Some(found);
        }
        let mut scope = namespace;
        loop {
            if scope.is_empty() {
                return None;
            }
            if let Some(found) = self.resolve(&format!("{scope}.{name}")) {
                return Some(found);
            }
            scope = scope.rfind('.').map_or("", |idx| &scope[..idx]);
        }
    }
}

/// In-memory collection of type descriptors keyed by full name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: IndexMap<String, TypeDescriptor>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type descriptor.
    ///
    /// # Errors
    /// Returns `ParseError::DuplicateDefinition` if a type with the same full
    /// name was already added.
    pub fn add(&mut self, descriptor: TypeDescriptor) -> Result<(), ParseError> {
        let full_name = descriptor.full_name();
        if self.types.contains_key(&full_name) {
            return Err(ParseError::duplicate("type", full_name));
        }
        self.types.insert(full_name, descriptor);
        Ok(())
    }

    /// Returns the number of types in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }
}

impl MetadataProvider for Catalog {
    fn resolve(&self, full_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(full_name)
    }
}

/// Kind of a declared host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Class (reference type with single inheritance).
    Class,
    /// Interface.
    Interface,
    /// Enumeration.
    Enum,
}

impl TypeKind {
    /// Parses a kind from its metadata name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "class" | "struct" | "record" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

/// A declared host type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Simple name, without namespace.
    pub name: String,
    /// Declaring namespace (may be empty).
    pub namespace: String,
    /// Output module override; defaults to the namespace.
    pub module: Option<String>,
    /// Declaration kind.
    pub kind: TypeKind,
    /// Base type, if any.
    pub base: Option<TypeRef>,
    /// Generic type parameter names in declaration order.
    pub generic_parameters: Vec<String>,
    /// Declared members (not including inherited ones).
    pub members: Vec<MemberDescriptor>,
    /// Enum values (enums only).
    pub enum_values: Vec<EnumValueDescriptor>,
    /// Whether the type is hidden from output.
    pub ignored: bool,
}

impl TypeDescriptor {
    /// Creates a new descriptor with no members.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            module: None,
            kind,
            base: None,
            generic_parameters: Vec::new(),
            members: Vec::new(),
            enum_values: Vec::new(),
            ignored: false,
        }
    }

    /// Returns the fully qualified name.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns the output module name.
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.namespace)
    }
}

/// An enum value as declared on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    /// Identifier.
    pub name: String,
    /// Numeric value.
    pub value: i64,
    /// Display label override.
    pub display_name: Option<String>,
}

/// Member category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Property.
    Property,
    /// Field.
    Field,
}

/// A declared member (property or field).
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Member name.
    pub name: String,
    /// Property or field.
    pub kind: MemberKind,
    /// Declared type.
    pub type_ref: TypeRef,
    /// Display name override.
    pub display_name: Option<String>,
    /// Display prompt (placeholder text).
    pub prompt: Option<String>,
    /// UI hint.
    pub ui_hint: Option<UiHint>,
    /// Data-type annotation such as `Percentage` or `EmailAddress`.
    pub data_type: Option<String>,
    /// Serialized name override.
    pub json_name: Option<String>,
    /// Excluded from serialization.
    pub json_ignore: bool,
    /// Excluded from persistence mapping.
    pub not_mapped: bool,
    /// Literal value of a constant field.
    pub constant: Option<String>,
    /// Declarative constraints in declaration order.
    pub constraints: Vec<Constraint>,
}

impl MemberDescriptor {
    /// Creates a member descriptor with no annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: MemberKind, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            type_ref,
            display_name: None,
            prompt: None,
            ui_hint: None,
            data_type: None,
            json_name: None,
            json_ignore: false,
            not_mapped: false,
            constant: None,
            constraints: Vec::new(),
        }
    }
}

/// UI hint: a free-form hint key plus control parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiHint {
    /// Hint key (`hidden`, `password`, `textarea`, ...).
    pub hint: String,
    /// Control parameters such as `colSpan`.
    pub parameters: IndexMap<String, String>,
}

/// A declarative constraint attached to a member.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Constraint kind and raw parameters.
    pub kind: ConstraintKind,
    /// Explicit error message.
    pub message: Option<String>,
}

impl Constraint {
    /// Creates a constraint with the default message.
    #[must_use]
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

/// Constraint kinds with parameters as written in the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Value must be present.
    Required,
    /// Serialization contract marks the member as required.
    DataMemberRequired,
    /// Numeric range.
    Range {
        /// Lower bound.
        minimum: String,
        /// Upper bound.
        maximum: String,
        /// Operand type (`int` or `double`).
        operand: Option<String>,
    },
    /// String length bounds.
    StringLength {
        /// Minimum length.
        minimum: Option<String>,
        /// Maximum length.
        maximum: String,
    },
    /// Full-match regular expression.
    RegularExpression {
        /// Pattern.
        pattern: String,
    },
    /// Must equal another member.
    Compare {
        /// Other member name.
        other: String,
    },
    /// E-mail address.
    EmailAddress,
    /// Absolute URL.
    Url,
    /// Phone number.
    Phone,
    /// Credit card number.
    CreditCard,
    /// Custom validator function (`module#function`).
    Custom {
        /// Validator reference.
        validator: String,
    },
}

/// A type expression as written in host metadata.
///
/// `T[]` is represented as `Array<T>`; a trailing `?` sets `nullable`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Type name, possibly namespace qualified.
    pub name: String,
    /// Generic arguments in declaration order.
    pub arguments: Vec<TypeRef>,
    /// Nullable annotation.
    pub nullable: bool,
}

/// Name used for `T[]` array syntax.
pub const ARRAY_TYPE_NAME: &str = "Array";

impl TypeRef {
    /// Creates a non-generic, non-nullable type reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            nullable: false,
        }
    }

    /// Parses a type expression such as `List<Address>`, `int?` or `string[]`.
    ///
    /// # Errors
    /// Returns `ParseError::InvalidTypeExpression` if the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self, ParseError> {
        let mut parser = TypeExprParser {
            src: expression,
            pos: 0,
        };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != expression.len() {
            return Err(ParseError::type_expression(
                expression,
                format!("unexpected input at offset {}", parser.pos),
            ));
        }
        Ok(parsed)
    }

    /// Returns true if this is the optional-value wrapper `Nullable<T>`.
    #[must_use]
    pub fn is_optional_wrapper(&self) -> bool {
        matches!(self.name.as_str(), "Nullable" | "System.Nullable") && self.arguments.len() == 1
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == ARRAY_TYPE_NAME && self.arguments.len() == 1 {
            write!(f, "{}[]", self.arguments[0])?;
        } else {
            f.write_str(&self.name)?;
            if !self.arguments.is_empty() {
                f.write_str("<")?;
                for (i, arg) in self.arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")?;
            }
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

struct TypeExprParser<'a> {
    src: &'a str,
    pos: usize,
}

impl TypeExprParser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::type_expression(self.src, message)
    }

    fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '`') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let mut current = TypeRef::named(&self.src[start..self.pos]);

        self.skip_ws();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                current.arguments.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or '>'")),
                }
            }
        }

        loop {
            self.skip_ws();
            if self.src[self.pos..].starts_with("[]") {
                self.pos += 2;
                current = TypeRef {
                    name: ARRAY_TYPE_NAME.to_string(),
                    arguments: vec![current],
                    nullable: false,
                };
            } else if self.peek() == Some('?') {
                self.pos += 1;
                current.nullable = true;
            } else {
                break;
            }
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_type() {
        let parsed = TypeRef::parse("string").expect("Failed to parse");
        assert_eq!(parsed, TypeRef::named("string"));
    }

    #[test]
    fn test_parse_nested_generics() {
        let parsed = TypeRef::parse("Dictionary<string, List<Sample.Address>>")
            .expect("Failed to parse");
        assert_eq!(parsed.name, "Dictionary");
        assert_eq!(parsed.arguments.len(), 2);
        assert_eq!(parsed.arguments[1].name, "List");
        assert_eq!(parsed.arguments[1].arguments[0].name, "Sample.Address");
    }

    #[test]
    fn test_parse_array_and_nullable_suffixes() {
        let parsed = TypeRef::parse("int?[]").expect("Failed to parse");
        assert_eq!(parsed.name, ARRAY_TYPE_NAME);
        assert!(!parsed.nullable);
        assert!(parsed.arguments[0].nullable);

        let parsed = TypeRef::parse("int[]?").expect("Failed to parse");
        assert!(parsed.nullable);
        assert_eq!(parsed.to_string(), "int[]?");
    }

    #[test]
    fn test_parse_rejects_malformed_expression() {
        assert!(TypeRef::parse("List<int").is_err());
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("int>").is_err());
    }

    #[test]
    fn test_optional_wrapper() {
        let parsed = TypeRef::parse("Nullable<int>").expect("Failed to parse");
        assert!(parsed.is_optional_wrapper());
        assert!(!TypeRef::named("int").is_optional_wrapper());
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let mut catalog = Catalog::new();
        catalog
            .add(TypeDescriptor::new("Person", "Sample", TypeKind::Class))
            .expect("first add");
        let result = catalog.add(TypeDescriptor::new("Person", "Sample", TypeKind::Class));
        assert!(matches!(result, Err(ParseError::DuplicateDefinition { .. })));
    }

    #[test]
    fn test_resolve_relative_walks_parent_namespaces() {
        let mut catalog = Catalog::new();
        catalog
            .add(TypeDescriptor::new("Address", "Sample", TypeKind::Class))
            .expect("add");

        let found = catalog
            .resolve_relative("Address", "Sample.People.Detail")
            .expect("should resolve");
        assert_eq!(found.full_name(), "Sample.Address");
        assert!(catalog.resolve_relative("Missing", "Sample").is_none());
    }
}

//! Type graph for code generation.
//!
//! The graph is a flat arena of [`TypeNode`]s addressed by [`TypeId`]. A type
//! that appears in several places (member type, collection element, base type)
//! is stored once and referenced by id, so identity rather than structure
//! decides whether two uses refer to the same type.

use crate::metadata::{MemberKind, UiHint};
use crate::rules::{RuleTarget, ValidationRule};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, HashSet};

/// UI hint key that hides a member from forms.
pub const UI_HINT_HIDDEN: &str = "hidden";

/// UI hint control parameter holding a column span.
pub const UI_HINT_COL_SPAN: &str = "colSpan";

/// UI hint key offering a fixed list of choices.
pub const UI_HINT_SELECT: &str = "select";

/// UI hint parameter naming the type that declares the choices.
pub const UI_HINT_TYPE_CONTAINING_OPTIONS: &str = "typeContainingOptions";

/// UI hint parameter naming the constant holding the choices.
pub const UI_HINT_NAME_OF_OPTIONS: &str = "nameOfOptions";

/// Index of a node in a [`TypeGraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A use of a type: the referenced node plus its generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeUse {
    /// Referenced node.
    pub id: TypeId,
    /// Generic arguments in declaration order.
    pub arguments: Vec<TypeUse>,
}

impl TypeUse {
    /// Creates a use without generic arguments.
    #[must_use]
    pub const fn plain(id: TypeId) -> Self {
        Self {
            id,
            arguments: Vec::new(),
        }
    }
}

/// Primitive categories of the host type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemKind {
    /// Text.
    String,
    /// Any numeric type.
    Number,
    /// Boolean.
    Bool,
    /// Date and time.
    Date,
    /// Anything the builder could not categorize.
    Unknown,
}

impl SystemKind {
    /// Maps a host primitive name to its category.
    #[must_use]
    pub fn from_host_name(name: &str) -> Option<Self> {
        let simple = name.strip_prefix("System.").unwrap_or(name);
        match simple {
            "string" | "String" | "char" | "Char" | "Guid" | "TimeSpan" | "Uri" => {
                Some(Self::String)
            }
            "int" | "Int32" | "long" | "Int64" | "short" | "Int16" | "byte" | "Byte"
            | "sbyte" | "SByte" | "uint" | "UInt32" | "ulong" | "UInt64" | "ushort"
            | "UInt16" | "decimal" | "Decimal" | "double" | "Double" | "float" | "Single" => {
                Some(Self::Number)
            }
            "bool" | "Boolean" => Some(Self::Bool),
            "DateTime" | "DateTimeOffset" | "DateOnly" => Some(Self::Date),
            "object" | "Object" | "dynamic" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Returns the TypeScript type for this category.
    #[must_use]
    pub const fn ts_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Date => "Date",
            Self::Unknown => "any",
        }
    }
}

/// A node of the type graph.
#[derive(Debug, Clone)]
pub enum TypeNode {
    /// Primitive type.
    System(SystemKind),
    /// Ordered homogeneous collection of the element type.
    Collection(TypeUse),
    /// Enumeration.
    Enum(EnumType),
    /// Interface.
    Interface(ObjectType),
    /// Class.
    Class(ObjectType),
    /// Type parameter of the enclosing generic declaration.
    GenericParameter(String),
}

impl TypeNode {
    /// Returns the object type of a class or interface.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Class(o) | Self::Interface(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the enum type.
    #[must_use]
    pub const fn as_enum(&self) -> Option<&EnumType> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true for classes, interfaces and enums.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        matches!(self, Self::Class(_) | Self::Interface(_) | Self::Enum(_))
    }

    /// Returns true if this is a class.
    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    /// Returns the header shared by declared types.
    #[must_use]
    pub fn declaration(&self) -> Option<&Declaration> {
        match self {
            Self::Class(o) | Self::Interface(o) => Some(&o.declaration),
            Self::Enum(e) => Some(&e.declaration),
            _ => None,
        }
    }
}

/// Name and placement of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Simple host name (may carry a generic arity suffix such as `` Page`1 ``).
    pub name: String,
    /// Fully qualified host name.
    pub full_name: String,
    /// Output namespace.
    pub namespace: String,
    /// Output module inside the namespace.
    pub module: String,
    /// Hidden from output.
    pub ignored: bool,
}

impl Declaration {
    /// Returns the name used in generated code.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.split('`').next().unwrap_or(&self.name)
    }
}

/// Class or interface.
#[derive(Debug, Clone)]
pub struct ObjectType {
    /// Name and placement.
    pub declaration: Declaration,
    /// Base type (single inheritance).
    pub base: Option<TypeUse>,
    /// Generic type parameters in declaration order.
    pub generic_parameters: Vec<String>,
    /// Own members keyed by name, in declaration order.
    pub members: IndexMap<String, Member>,
}

/// Enumeration.
#[derive(Debug, Clone)]
pub struct EnumType {
    /// Name and placement.
    pub declaration: Declaration,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
}

/// A single enum entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Identifier.
    pub name: String,
    /// Numeric value.
    pub value: i64,
    /// Display label override.
    pub display_name: Option<String>,
}

impl EnumValue {
    /// Returns the label shown to users.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Literal value of a constant field.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Text literal.
    Text(String),
    /// Numeric literal.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// Array literal of a constant collection.
    List(Vec<ConstantValue>),
}

/// Constant list supplying the choices of a `select` hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsSource {
    /// Type declaring the constant.
    pub owner: TypeId,
    /// Host name of the constant member.
    pub member: String,
}

/// A property or field.
#[derive(Debug, Clone)]
pub struct Member {
    /// Host member name.
    pub name: String,
    /// Declaring type.
    pub owner: TypeId,
    /// Property or field.
    pub kind: MemberKind,
    /// Declared type with nullability unwrapped.
    pub ty: TypeUse,
    /// Accepts null.
    pub nullable: bool,
    /// Carries a required constraint.
    pub required: bool,
    /// Literal value of a constant field.
    pub constant: Option<ConstantValue>,
    /// Display name override.
    pub display_name: Option<String>,
    /// Display prompt.
    pub prompt: Option<String>,
    /// UI hint.
    pub ui_hint: Option<UiHint>,
    /// Choices named by a `select` hint.
    pub options: Option<OptionsSource>,
    /// Data-type annotation.
    pub data_type: Option<String>,
    /// Serialized name override.
    pub json_name: Option<String>,
    /// Excluded from output.
    pub ignored: bool,
    /// Validation rules in declaration order.
    pub rules: Vec<ValidationRule>,
}

impl Member {
    /// Returns the name shown to users.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns true if the UI hint hides the member.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.ui_hint
            .as_ref()
            .is_some_and(|hint| hint.hint == UI_HINT_HIDDEN)
    }

    /// Returns the column width requested through the `colSpan` hint parameter.
    ///
    /// `None` means the wildcard `*` (auto width). Missing or unusable values
    /// fall back to `default_width`; results are capped at `max_width`.
    #[must_use]
    pub fn col_span_hint(&self, default_width: usize, max_width: usize) -> Option<usize> {
        let Some(raw) = self
            .ui_hint
            .as_ref()
            .and_then(|hint| hint.parameters.get(UI_HINT_COL_SPAN))
        else {
            return Some(default_width);
        };

        if raw.trim() == "*" {
            return None;
        }

        match raw.trim().parse::<usize>() {
            Ok(span) if span > 0 => Some((span * default_width).min(max_width)),
            _ => Some(default_width),
        }
    }
}

/// Which member categories to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberFilter {
    /// Emit properties.
    pub properties: bool,
    /// Emit fields.
    pub fields: bool,
}

impl MemberFilter {
    /// Properties and fields.
    pub const ALL: Self = Self {
        properties: true,
        fields: true,
    };

    /// Returns true if members of `kind` pass the filter.
    #[must_use]
    pub const fn allows(self, kind: MemberKind) -> bool {
        match kind {
            MemberKind::Property => self.properties,
            MemberKind::Field => self.fields,
        }
    }

    /// Returns true if no category is enabled.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.properties && !self.fields
    }
}

/// Types emitted into one output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Declared types in construction order.
    pub types: Vec<TypeId>,
}

/// Modules emitted into one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Namespace name.
    pub name: String,
    /// Modules sorted by name.
    pub modules: Vec<Module>,
}

impl Namespace {
    /// Iterates over all types of all modules.
    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.modules.iter().flat_map(|m| m.types.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InternKey {
    System(SystemKind),
    Collection(TypeUse),
    Generic(String),
}

/// Arena of type nodes reachable from one root type.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    root: Option<TypeId>,
    completed: HashSet<TypeId>,
    interned: HashMap<InternKey, TypeId>,
}

impl TypeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn replace(&mut self, id: TypeId, node: TypeNode) {
        self.nodes[id.0] = node;
    }

    pub(crate) fn mark_completed(&mut self, id: TypeId) {
        self.completed.insert(id);
    }

    pub(crate) fn set_root(&mut self, id: TypeId) {
        self.root = Some(id);
    }

    fn intern(&mut self, key: InternKey, node: TypeNode) -> TypeId {
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = self.push(node);
        self.completed.insert(id);
        self.interned.insert(key, id);
        id
    }

    pub(crate) fn intern_system(&mut self, kind: SystemKind) -> TypeId {
        self.intern(InternKey::System(kind), TypeNode::System(kind))
    }

    pub(crate) fn intern_collection(&mut self, element: TypeUse) -> TypeId {
        self.intern(
            InternKey::Collection(element.clone()),
            TypeNode::Collection(element),
        )
    }

    pub(crate) fn intern_generic(&mut self, name: &str) -> TypeId {
        self.intern(
            InternKey::Generic(name.to_string()),
            TypeNode::GenericParameter(name.to_string()),
        )
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this graph.
    #[must_use]
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0]
    }

    /// Returns the root type requested by the caller.
    #[must_use]
    pub const fn root(&self) -> Option<TypeId> {
        self.root
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (TypeId(i), n))
    }

    /// Returns true once the node at `id` has been fully constructed.
    #[must_use]
    pub fn is_completed(&self, id: TypeId) -> bool {
        self.completed.contains(&id)
    }

    /// Returns the class or interface at `id`.
    #[must_use]
    pub fn object(&self, id: TypeId) -> Option<&ObjectType> {
        self.node(id).as_object()
    }

    /// Returns the declaration header of the declared type at `id`.
    #[must_use]
    pub fn declaration(&self, id: TypeId) -> Option<&Declaration> {
        self.node(id).declaration()
    }

    /// Returns the base chain of `id`, nearest ancestor first.
    #[must_use]
    pub fn base_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = self.object(id).and_then(|o| o.base.as_ref()).map(|b| b.id);
        while let Some(base) = current {
            if base == id || chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = self.object(base).and_then(|o| o.base.as_ref()).map(|b| b.id);
        }
        chain
    }

    /// Returns own and inherited members, base-first with overrides last.
    ///
    /// Ignored members and members rejected by `filter` are excluded. A member
    /// redeclared by a derived type replaces the inherited one and moves to the
    /// end of the list.
    #[must_use]
    pub fn merged_members(&self, id: TypeId, filter: MemberFilter) -> Vec<&Member> {
        let mut lineage = self.base_chain(id);
        lineage.reverse();
        lineage.push(id);

        let mut merged: IndexMap<&str, &Member> = IndexMap::new();
        for owner in lineage {
            let Some(object) = self.object(owner) else {
                continue;
            };
            for member in object.members.values() {
                merged.shift_remove(member.name.as_str());
                if !member.ignored && filter.allows(member.kind) {
                    merged.insert(member.name.as_str(), member);
                }
            }
        }
        merged.into_values().collect()
    }

    /// Classifies a type use for validation rule applicability.
    #[must_use]
    pub fn rule_target(&self, ty: &TypeUse) -> RuleTarget {
        match self.node(ty.id) {
            TypeNode::System(SystemKind::String) => RuleTarget::Text,
            TypeNode::System(SystemKind::Number) => RuleTarget::Numeric,
            TypeNode::System(SystemKind::Bool) => RuleTarget::Boolean,
            TypeNode::System(SystemKind::Date) => RuleTarget::Date,
            TypeNode::System(SystemKind::Unknown) | TypeNode::GenericParameter(_) => {
                RuleTarget::Unknown
            }
            TypeNode::Collection(_) => RuleTarget::Collection,
            TypeNode::Enum(_) => RuleTarget::Enum,
            TypeNode::Interface(_) | TypeNode::Class(_) => RuleTarget::Object,
        }
    }

    /// Groups declared types by namespace and module, both sorted by name.
    #[must_use]
    pub fn namespaces(&self) -> Vec<Namespace> {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<TypeId>>> = BTreeMap::new();
        for (id, node) in self.iter() {
            if let Some(declaration) = node.declaration() {
                grouped
                    .entry(declaration.namespace.as_str())
                    .or_default()
                    .entry(declaration.module.as_str())
                    .or_default()
                    .push(id);
            }
        }

        grouped
            .into_iter()
            .map(|(name, modules)| Namespace {
                name: name.to_string(),
                modules: modules
                    .into_iter()
                    .map(|(name, types)| Module {
                        name: name.to_string(),
                        types,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Converts a string to camelCase.
#[must_use]
pub fn to_camel_case(s: &str) -> String {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    // Leading acronyms are lowered as a block: "URLPath" -> "urlPath".
    let upper_run = s.chars().take_while(|c| c.is_uppercase()).count();
    if upper_run > 1 {
        let lowered = if upper_run == s.chars().count() {
            upper_run
        } else {
            upper_run - 1
        };
        return s
            .chars()
            .enumerate()
            .map(|(i, c)| if i < lowered { c.to_ascii_lowercase() } else { c })
            .collect();
    }

    first.to_lowercase().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MemberKind;

    fn member(name: &str, owner: TypeId, ty: TypeId) -> Member {
        Member {
            name: name.to_string(),
            owner,
            kind: MemberKind::Property,
            ty: TypeUse::plain(ty),
            nullable: false,
            required: false,
            constant: None,
            display_name: None,
            prompt: None,
            ui_hint: None,
            options: None,
            data_type: None,
            json_name: None,
            ignored: false,
            rules: Vec::new(),
        }
    }

    fn declaration(name: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            full_name: format!("Sample.{name}"),
            namespace: "Sample".to_string(),
            module: "Sample".to_string(),
            ignored: false,
        }
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("FirstName"), "firstName");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("URLPath"), "urlPath");
        assert_eq!(to_camel_case("ID"), "id");
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn test_system_kind_from_host_name() {
        assert_eq!(SystemKind::from_host_name("int"), Some(SystemKind::Number));
        assert_eq!(
            SystemKind::from_host_name("System.DateTime"),
            Some(SystemKind::Date)
        );
        assert_eq!(SystemKind::from_host_name("Guid"), Some(SystemKind::String));
        assert_eq!(SystemKind::from_host_name("Person"), None);
    }

    #[test]
    fn test_interning_shares_nodes() {
        let mut graph = TypeGraph::new();
        let a = graph.intern_system(SystemKind::String);
        let b = graph.intern_system(SystemKind::String);
        assert_eq!(a, b);

        let list_a = graph.intern_collection(TypeUse::plain(a));
        let list_b = graph.intern_collection(TypeUse::plain(b));
        assert_eq!(list_a, list_b);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_merged_members_override_last() {
        let mut graph = TypeGraph::new();
        let text = graph.intern_system(SystemKind::String);
        let number = graph.intern_system(SystemKind::Number);

        let base = graph.push(TypeNode::Class(ObjectType {
            declaration: declaration("Base"),
            base: None,
            generic_parameters: Vec::new(),
            members: IndexMap::new(),
        }));
        let derived = graph.push(TypeNode::Class(ObjectType {
            declaration: declaration("Derived"),
            base: Some(TypeUse::plain(base)),
            generic_parameters: Vec::new(),
            members: IndexMap::new(),
        }));

        let mut base_members = IndexMap::new();
        base_members.insert("Id".to_string(), member("Id", base, number));
        base_members.insert("Name".to_string(), member("Name", base, text));
        graph.replace(
            base,
            TypeNode::Class(ObjectType {
                declaration: declaration("Base"),
                base: None,
                generic_parameters: Vec::new(),
                members: base_members,
            }),
        );

        let mut derived_members = IndexMap::new();
        derived_members.insert("Name".to_string(), member("Name", derived, text));
        derived_members.insert("Code".to_string(), member("Code", derived, text));
        graph.replace(
            derived,
            TypeNode::Class(ObjectType {
                declaration: declaration("Derived"),
                base: Some(TypeUse::plain(base)),
                generic_parameters: Vec::new(),
                members: derived_members,
            }),
        );

        let merged = graph.merged_members(derived, MemberFilter::ALL);
        let names: Vec<&str> = merged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Name", "Code"]);
        assert_eq!(merged[1].owner, derived);
        assert_eq!(graph.base_chain(derived), vec![base]);
    }

    #[test]
    fn test_col_span_hint() {
        let mut graph = TypeGraph::new();
        let text = graph.intern_system(SystemKind::String);
        let mut m = member("Notes", text, text);
        assert_eq!(m.col_span_hint(3, 12), Some(3));

        let mut hint = UiHint::default();
        hint.parameters
            .insert(UI_HINT_COL_SPAN.to_string(), "2".to_string());
        m.ui_hint = Some(hint.clone());
        assert_eq!(m.col_span_hint(3, 12), Some(6));
        assert_eq!(m.col_span_hint(8, 12), Some(12));

        hint.parameters
            .insert(UI_HINT_COL_SPAN.to_string(), "*".to_string());
        m.ui_hint = Some(hint);
        assert_eq!(m.col_span_hint(3, 12), None);
    }

    #[test]
    fn test_declaration_display_name_strips_arity() {
        let mut d = declaration("Page`1");
        assert_eq!(d.display_name(), "Page");
        d.name = "Person".to_string();
        assert_eq!(d.display_name(), "Person");
    }
}

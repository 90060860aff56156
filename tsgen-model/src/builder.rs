//! Type graph construction.
//!
//! [`GraphBuilder`] walks host metadata from a root type and materializes every
//! reachable type exactly once. Declared types are reserved in the arena before
//! their members are resolved, so mutually referencing types terminate.

use crate::error::ModelError;
use crate::graph::{
    ConstantValue, Declaration, EnumType, EnumValue, Member, ObjectType, OptionsSource, SystemKind,
    TypeGraph, TypeId, TypeNode, TypeUse, UI_HINT_NAME_OF_OPTIONS, UI_HINT_SELECT,
    UI_HINT_TYPE_CONTAINING_OPTIONS,
};
use crate::metadata::{
    ARRAY_TYPE_NAME, MemberDescriptor, MetadataProvider, TypeDescriptor, TypeKind, TypeRef,
};
use crate::rules::rules_from_constraints;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Host generic types treated as ordered collections of their single argument.
const COLLECTION_TYPES: &[&str] = &[
    "List",
    "IList",
    "ICollection",
    "IEnumerable",
    "IReadOnlyList",
    "IReadOnlyCollection",
    "Collection",
    "HashSet",
    "ISet",
    "SortedSet",
    "LinkedList",
    "Queue",
    "Stack",
    "ImmutableArray",
    "ImmutableList",
];

/// Builds the type graph reachable from `root`.
///
/// # Arguments
/// * `provider` - Source of host type descriptors
/// * `root` - Fully qualified name of the root type
///
/// # Errors
/// Returns `ModelError` if the root is unknown or an invariant is violated.
pub fn build_graph<P>(provider: &P, root: &str) -> Result<TypeGraph, ModelError>
where
    P: MetadataProvider + ?Sized,
{
    GraphBuilder::new(provider).build(root)
}

/// Names visible while resolving type references of one declaration.
struct Scope<'d> {
    namespace: &'d str,
    generic_parameters: &'d [String],
}

/// Builder that materializes host types into a [`TypeGraph`].
pub struct GraphBuilder<'p, P: MetadataProvider + ?Sized> {
    provider: &'p P,
    graph: TypeGraph,
    visited: HashMap<String, TypeId>,
    base_stack: Vec<String>,
}

impl<'p, P: MetadataProvider + ?Sized> GraphBuilder<'p, P> {
    /// Creates a builder reading from `provider`.
    #[must_use]
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            graph: TypeGraph::new(),
            visited: HashMap::new(),
            base_stack: Vec::new(),
        }
    }

    /// Builds the graph for `root` and consumes the builder.
    ///
    /// # Errors
    /// Returns `ModelError::RootNotFound` if the provider does not know `root`,
    /// or the first construction error encountered.
    pub fn build(mut self, root: &str) -> Result<TypeGraph, ModelError> {
        let provider = self.provider;
        let descriptor = provider
            .resolve(root)
            .ok_or_else(|| ModelError::RootNotFound {
                name: root.to_string(),
            })?;

        debug!("building type graph from root '{}'", root);
        let id = self.build_declared(descriptor)?;
        self.graph.set_root(id);
        debug!(
            "type graph for '{}' holds {} nodes",
            root,
            self.graph.len()
        );
        Ok(self.graph)
    }

    fn build_declared(&mut self, descriptor: &'p TypeDescriptor) -> Result<TypeId, ModelError> {
        let full_name = descriptor.full_name();
        if let Some(&id) = self.visited.get(&full_name) {
            return Ok(id);
        }

        let declaration = Declaration {
            name: descriptor.name.clone(),
            full_name: full_name.clone(),
            namespace: descriptor.namespace.clone(),
            module: descriptor.module_name().to_string(),
            ignored: descriptor.ignored,
        };

        if descriptor.kind == TypeKind::Enum {
            let values = descriptor
                .enum_values
                .iter()
                .map(|v| EnumValue {
                    name: v.name.clone(),
                    value: v.value,
                    display_name: v.display_name.clone(),
                })
                .collect();
            let id = self
                .graph
                .push(TypeNode::Enum(EnumType { declaration, values }));
            self.visited.insert(full_name, id);
            self.graph.mark_completed(id);
            return Ok(id);
        }

        let header = ObjectType {
            declaration,
            base: None,
            generic_parameters: descriptor.generic_parameters.clone(),
            members: IndexMap::new(),
        };
        let interface = descriptor.kind == TypeKind::Interface;
        let id = self.graph.push(object_node(interface, header.clone()));
        self.visited.insert(full_name.clone(), id);
        debug!("materializing {:?} '{}'", descriptor.kind, full_name);

        let scope = Scope {
            namespace: &descriptor.namespace,
            generic_parameters: &descriptor.generic_parameters,
        };

        let base = match &descriptor.base {
            Some(base_ref) => self.build_base(descriptor, &full_name, base_ref, &scope)?,
            None => None,
        };

        let mut members: IndexMap<String, Member> = IndexMap::new();
        for member in &descriptor.members {
            if members.contains_key(&member.name) {
                return Err(ModelError::DuplicateMember {
                    type_name: full_name,
                    member: member.name.clone(),
                });
            }
            let built = self.build_member(id, member, &scope)?;
            members.insert(member.name.clone(), built);
        }

        let object = ObjectType {
            base,
            members,
            ..header
        };
        self.graph.replace(id, object_node(interface, object));
        self.graph.mark_completed(id);
        Ok(id)
    }

    fn build_base(
        &mut self,
        descriptor: &'p TypeDescriptor,
        full_name: &str,
        base_ref: &TypeRef,
        scope: &Scope<'_>,
    ) -> Result<Option<TypeUse>, ModelError> {
        let provider = self.provider;
        let lookup = generic_lookup_name(base_ref);
        let Some(base_descriptor) = provider.resolve_relative(&lookup, &descriptor.namespace)
        else {
            warn!(
                "base type '{}' of '{}' is unknown, dropping it",
                base_ref, full_name
            );
            return Ok(None);
        };

        if base_descriptor.kind != descriptor.kind {
            return Err(ModelError::InvalidBase {
                type_name: full_name.to_string(),
                base: base_descriptor.full_name(),
            });
        }

        let base_name = base_descriptor.full_name();
        if base_name == full_name || self.base_stack.contains(&base_name) {
            let mut path = self.base_stack.clone();
            path.push(full_name.to_string());
            path.push(base_name);
            return Err(ModelError::CircularBase {
                path: path.join(" -> "),
            });
        }

        self.base_stack.push(full_name.to_string());
        let base_id = self.build_declared(base_descriptor);
        self.base_stack.pop();
        let base_id = base_id?;

        let arguments = base_ref
            .arguments
            .iter()
            .map(|arg| self.resolve_use(arg, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(TypeUse {
            id: base_id,
            arguments,
        }))
    }

    fn build_member(
        &mut self,
        owner: TypeId,
        descriptor: &MemberDescriptor,
        scope: &Scope<'_>,
    ) -> Result<Member, ModelError> {
        let (nullable, unwrapped) = normalize_nullability(&descriptor.type_ref);
        let ty = self.resolve_use(unwrapped, scope)?;
        let rules = rules_from_constraints(descriptor)?;
        let required = rules.iter().any(|r| r.is_required());
        let constant = descriptor
            .constant
            .as_deref()
            .map(|raw| constant_value(&self.graph, &ty, raw));
        let options = self.build_options(descriptor, scope)?;

        Ok(Member {
            name: descriptor.name.clone(),
            owner,
            kind: descriptor.kind,
            ty,
            nullable,
            required,
            constant,
            display_name: descriptor.display_name.clone(),
            prompt: descriptor.prompt.clone(),
            ui_hint: descriptor.ui_hint.clone(),
            options,
            data_type: descriptor.data_type.clone(),
            json_name: descriptor.json_name.clone(),
            ignored: descriptor.json_ignore || descriptor.not_mapped,
            rules,
        })
    }

    /// Materializes the type that declares the choices of a `select` hint.
    fn build_options(
        &mut self,
        descriptor: &MemberDescriptor,
        scope: &Scope<'_>,
    ) -> Result<Option<OptionsSource>, ModelError> {
        let Some(hint) = &descriptor.ui_hint else {
            return Ok(None);
        };
        let Some(container) = hint.parameters.get(UI_HINT_TYPE_CONTAINING_OPTIONS) else {
            return Ok(None);
        };
        let invalid = |message: String| ModelError::InvalidUiHint {
            member: descriptor.name.clone(),
            message,
        };
        if hint.hint != UI_HINT_SELECT {
            return Err(invalid(format!(
                "'{UI_HINT_TYPE_CONTAINING_OPTIONS}' requires the '{UI_HINT_SELECT}' hint"
            )));
        }
        let Some(member) = hint.parameters.get(UI_HINT_NAME_OF_OPTIONS) else {
            return Err(invalid(format!("missing parameter '{UI_HINT_NAME_OF_OPTIONS}'")));
        };

        let owner = self.resolve_use(&TypeRef::parse(container)?, scope)?;
        if self.graph.object(owner.id).is_none() {
            return Err(invalid(format!("'{container}' is not a class or interface")));
        }
        Ok(Some(OptionsSource {
            owner: owner.id,
            member: member.clone(),
        }))
    }

    fn resolve_use(&mut self, type_ref: &TypeRef, scope: &Scope<'_>) -> Result<TypeUse, ModelError> {
        if type_ref.is_optional_wrapper() {
            return self.resolve_use(&type_ref.arguments[0], scope);
        }

        let simple = simple_name(&type_ref.name);
        let is_collection = type_ref.name == ARRAY_TYPE_NAME || COLLECTION_TYPES.contains(&simple);
        if is_collection && type_ref.arguments.len() == 1 {
            let element = self.resolve_use(&type_ref.arguments[0], scope)?;
            return Ok(TypeUse::plain(self.graph.intern_collection(element)));
        }

        if type_ref.arguments.is_empty() {
            if let Some(kind) = SystemKind::from_host_name(&type_ref.name) {
                return Ok(TypeUse::plain(self.graph.intern_system(kind)));
            }
            if scope.generic_parameters.iter().any(|p| p == &type_ref.name) {
                return Ok(TypeUse::plain(self.graph.intern_generic(&type_ref.name)));
            }
        }

        let provider = self.provider;
        let lookup = generic_lookup_name(type_ref);
        if let Some(descriptor) = provider.resolve_relative(&lookup, scope.namespace) {
            let id = self.build_declared(descriptor)?;
            let arguments = type_ref
                .arguments
                .iter()
                .map(|arg| self.resolve_use(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(TypeUse { id, arguments });
        }

        warn!(
            "host type '{}' cannot be mapped, emitting it as any",
            type_ref
        );
        Ok(TypeUse::plain(self.graph.intern_system(SystemKind::Unknown)))
    }
}

/// Wraps a class or interface body. Enums never reach this point.
fn object_node(interface: bool, object: ObjectType) -> TypeNode {
    if interface {
        TypeNode::Interface(object)
    } else {
        TypeNode::Class(object)
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Host metadata names generic declarations with an arity suffix (`` Page`1 ``).
fn generic_lookup_name(type_ref: &TypeRef) -> String {
    if type_ref.arguments.is_empty() || type_ref.name.contains('`') {
        type_ref.name.clone()
    } else {
        format!("{}`{}", type_ref.name, type_ref.arguments.len())
    }
}

/// Splits nullability off a type reference.
///
/// `Nullable<T>` and `T?` both yield `(true, T)`.
fn normalize_nullability(type_ref: &TypeRef) -> (bool, &TypeRef) {
    if type_ref.is_optional_wrapper() {
        let (_, inner) = normalize_nullability(&type_ref.arguments[0]);
        return (true, inner);
    }
    (type_ref.nullable, type_ref)
}

/// Interprets a raw constant by its declared type. Collection constants are
/// comma separated.
fn constant_value(graph: &TypeGraph, ty: &TypeUse, raw: &str) -> ConstantValue {
    match graph.node(ty.id) {
        TypeNode::Collection(element) => ConstantValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| constant_value(graph, element, item))
                .collect(),
        ),
        TypeNode::System(SystemKind::Number) | TypeNode::Enum(_) => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| ConstantValue::Text(raw.to_string()), ConstantValue::Number),
        TypeNode::System(SystemKind::Bool) => match raw.trim() {
            "true" | "True" => ConstantValue::Bool(true),
            "false" | "False" => ConstantValue::Bool(false),
            _ => ConstantValue::Text(raw.to_string()),
        },
        _ => ConstantValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemberFilter;
    use crate::parser::parse_metadata;

    const PERSON_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
    <type name="Entity" namespace="Sample.Core" kind="class">
        <member name="Id" type="int"/>
    </type>
    <type name="Person" namespace="Sample.People" kind="class" base="Sample.Core.Entity">
        <member name="Name" type="string">
            <required/>
            <stringLength maximum="50"/>
        </member>
        <member name="Age" type="int?">
            <range minimum="20" maximum="120" operand="int"/>
        </member>
        <member name="Gender" type="Gender"/>
        <member name="Addresses" type="List&lt;Address&gt;"/>
        <member name="Manager" type="Person?"/>
        <member name="Tags" type="string[]"/>
        <member name="Blob" type="System.IO.Stream"/>
    </type>
    <type name="Address" namespace="Sample.People" kind="class">
        <member name="Resident" type="Person"/>
        <member name="City" type="string"/>
    </type>
    <type name="Gender" namespace="Sample.People" kind="enum">
        <value name="Male" value="0"/>
        <value name="Female" value="1"/>
    </type>
</metadata>
"#;

    fn build(xml: &str, root: &str) -> Result<TypeGraph, ModelError> {
        let catalog = parse_metadata(xml).expect("Failed to parse");
        build_graph(&catalog, root)
    }

    fn find(graph: &TypeGraph, name: &str) -> TypeId {
        graph
            .iter()
            .find(|(_, n)| n.declaration().is_some_and(|d| d.name == name))
            .map(|(id, _)| id)
            .expect("type not in graph")
    }

    #[test]
    fn test_build_person_graph() {
        let graph = build(PERSON_XML, "Sample.People.Person").expect("Failed to build");
        let person = find(&graph, "Person");
        assert_eq!(graph.root(), Some(person));

        let object = graph.object(person).expect("Person is a class");
        assert_eq!(object.members.len(), 7);
        let base = object.base.as_ref().expect("Person has a base");
        assert_eq!(base.id, find(&graph, "Entity"));

        let name = &object.members["Name"];
        assert!(name.required);
        assert_eq!(name.rules.len(), 2);

        let age = &object.members["Age"];
        assert!(age.nullable);
        assert!(matches!(
            graph.node(age.ty.id),
            TypeNode::System(SystemKind::Number)
        ));

        let manager = &object.members["Manager"];
        assert!(manager.nullable);
        assert_eq!(manager.ty.id, person);

        let blob = &object.members["Blob"];
        assert!(matches!(
            graph.node(blob.ty.id),
            TypeNode::System(SystemKind::Unknown)
        ));
    }

    #[test]
    fn test_types_are_shared_by_identity() {
        let graph = build(PERSON_XML, "Sample.People.Person").expect("Failed to build");
        let person = find(&graph, "Person");
        let address = find(&graph, "Address");

        let addresses = &graph.object(person).expect("class").members["Addresses"];
        let TypeNode::Collection(element) = graph.node(addresses.ty.id) else {
            panic!("Addresses should be a collection");
        };
        assert_eq!(element.id, address);

        let resident = &graph.object(address).expect("class").members["Resident"];
        assert_eq!(resident.ty.id, person);

        let declared = graph.iter().filter(|(_, n)| n.is_declared()).count();
        assert_eq!(declared, 4);
    }

    #[test]
    fn test_merged_members_include_base() {
        let graph = build(PERSON_XML, "Sample.People.Person").expect("Failed to build");
        let person = find(&graph, "Person");
        let merged = graph.merged_members(person, MemberFilter::ALL);
        assert_eq!(merged[0].name, "Id");
        assert_eq!(merged.len(), 8);
    }

    #[test]
    fn test_root_not_found() {
        let err = build(PERSON_XML, "Sample.Missing").expect_err("Expected missing root");
        assert!(matches!(err, ModelError::RootNotFound { .. }));
    }

    #[test]
    fn test_circular_base_is_fatal() {
        let xml = r#"<metadata>
    <type name="A" namespace="N" kind="class" base="B"/>
    <type name="B" namespace="N" kind="class" base="A"/>
</metadata>"#;
        let err = build(xml, "N.A").expect_err("Expected cycle");
        assert!(matches!(err, ModelError::CircularBase { .. }));
    }

    #[test]
    fn test_mutual_member_references_terminate() {
        let xml = r#"<metadata>
    <type name="A" namespace="N" kind="class"><member name="B" type="B"/></type>
    <type name="B" namespace="N" kind="class" base="A"><member name="A" type="A"/></type>
</metadata>"#;
        let graph = build(xml, "N.A").expect("Failed to build");
        assert_eq!(graph.iter().filter(|(_, n)| n.is_declared()).count(), 2);
    }

    #[test]
    fn test_declared_kinds_map_to_nodes() {
        let xml = r#"<metadata>
    <type name="Named" namespace="N" kind="interface"><member name="Name" type="string"/></type>
    <type name="Item" namespace="N" kind="class" base="Named">
        <member name="Level" type="Level"/>
    </type>
    <type name="Level" namespace="N" kind="enum"><value name="Low" value="0"/></type>
</metadata>"#;
        let graph = build(xml, "N.Item").expect("Failed to build");
        assert!(matches!(graph.node(find(&graph, "Named")), TypeNode::Interface(_)));
        assert!(matches!(graph.node(find(&graph, "Item")), TypeNode::Class(_)));
        assert!(matches!(graph.node(find(&graph, "Level")), TypeNode::Enum(_)));
    }

    #[test]
    fn test_class_cannot_derive_from_enum() {
        let xml = r#"<metadata>
    <type name="E" namespace="N" kind="enum"><value name="X" value="0"/></type>
    <type name="C" namespace="N" kind="class" base="E"/>
</metadata>"#;
        let err = build(xml, "N.C").expect_err("Expected invalid base");
        assert!(matches!(err, ModelError::InvalidBase { .. }));
    }

    #[test]
    fn test_generic_declaration() {
        let xml = r#"<metadata>
    <type name="Page`1" namespace="N" kind="class">
        <genericParameter name="T"/>
        <member name="Items" type="List&lt;T&gt;"/>
        <member name="Total" type="int"/>
    </type>
    <type name="Holder" namespace="N" kind="class">
        <member name="People" type="Page&lt;Item&gt;"/>
    </type>
    <type name="Item" namespace="N" kind="class"/>
</metadata>"#;
        let graph = build(xml, "N.Holder").expect("Failed to build");
        let holder = find(&graph, "Holder");
        let people = &graph.object(holder).expect("class").members["People"];
        assert_eq!(people.ty.id, find(&graph, "Page`1"));
        assert_eq!(people.ty.arguments.len(), 1);
        assert_eq!(people.ty.arguments[0].id, find(&graph, "Item"));

        let page = graph.object(people.ty.id).expect("class");
        let TypeNode::Collection(element) = graph.node(page.members["Items"].ty.id) else {
            panic!("Items should be a collection");
        };
        assert!(matches!(
            graph.node(element.id),
            TypeNode::GenericParameter(name) if name == "T"
        ));
    }

    const OPTIONS_XML: &str = r#"<metadata>
    <type name="Address" namespace="Sample.People" kind="class">
        <member name="Country" type="string" uiHint="select">
            <uiHintParameter name="typeContainingOptions" value="Sample.Lookups.Countries"/>
            <uiHintParameter name="nameOfOptions" value="All"/>
        </member>
    </type>
    <type name="Countries" namespace="Sample.Lookups" kind="class">
        <member name="All" kind="field" type="string[]" constant="Spain, France,Italy"/>
    </type>
</metadata>"#;

    #[test]
    fn test_select_hint_materializes_options_owner() {
        let graph = build(OPTIONS_XML, "Sample.People.Address").expect("Failed to build");
        let address = graph.object(find(&graph, "Address")).expect("class");
        let options = address.members["Country"].options.as_ref().expect("options");
        assert_eq!(options.owner, find(&graph, "Countries"));
        assert_eq!(options.member, "All");

        let countries = graph.object(options.owner).expect("class");
        assert_eq!(
            countries.members["All"].constant,
            Some(ConstantValue::List(vec![
                ConstantValue::Text("Spain".to_string()),
                ConstantValue::Text("France".to_string()),
                ConstantValue::Text("Italy".to_string()),
            ]))
        );
    }

    #[test]
    fn test_options_without_select_hint_is_rejected() {
        let xml = OPTIONS_XML.replace("uiHint=\"select\"", "uiHint=\"textarea\"");
        let err = build(&xml, "Sample.People.Address").expect_err("Expected invalid hint");
        assert!(matches!(err, ModelError::InvalidUiHint { .. }));

        let xml = OPTIONS_XML.replace("<uiHintParameter name=\"nameOfOptions\" value=\"All\"/>", "");
        let err = build(&xml, "Sample.People.Address").expect_err("Expected missing name");
        assert!(matches!(err, ModelError::InvalidUiHint { .. }));
    }

    #[test]
    fn test_constant_and_ignored_members() {
        let xml = r#"<metadata>
    <type name="Limits" namespace="N" kind="class">
        <member name="Max" kind="field" type="int" constant="10"/>
        <member name="Secret" type="string" jsonIgnore="true"/>
    </type>
</metadata>"#;
        let graph = build(xml, "N.Limits").expect("Failed to build");
        let limits = graph.object(find(&graph, "Limits")).expect("class");
        assert_eq!(
            limits.members["Max"].constant,
            Some(ConstantValue::Number(10.0))
        );
        assert!(limits.members["Secret"].ignored);
    }
}

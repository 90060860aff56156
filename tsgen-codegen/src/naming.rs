//! Generated type and member names.

use crate::options::{GeneratorLayer, GeneratorOptions};
use std::collections::{HashMap, HashSet};
use tsgen_model::graph::to_camel_case;
use tsgen_model::{Member, Module, Namespace, TypeGraph, TypeId, TypeNode};

/// Name and visibility of an emitted type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// Name used in generated code.
    pub name: String,
    /// Whether the declaration carries `export`.
    pub exported: bool,
}

/// Names of all emitted types of a graph.
///
/// Within one naming scope (a module when namespaces are wrapped, otherwise
/// the whole file) the first type in emission order claims its name; later
/// types with the same name are emitted unexported under a suffixed name.
/// A type whose name equals a symbol generated for a class of the same scope
/// (`<Class>Resolver`, `<Class>Form`, `<Class>FormData`) is suffixed as well.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: HashMap<TypeId, TypeName>,
}

impl NameTable {
    /// Assigns names to every emitted type.
    #[must_use]
    pub fn build(graph: &TypeGraph, namespaces: &[Namespace], options: &GeneratorOptions) -> Self {
        let suffixes = generated_suffixes(&options.layer);
        let mut names = HashMap::new();
        for namespace in namespaces {
            let groups = namespace_order(graph, namespace, options.enable_namespace);
            let scopes: Vec<Vec<TypeId>> = if options.enable_namespace {
                groups.into_iter().map(|group| group.types).collect()
            } else {
                vec![groups.into_iter().flat_map(|group| group.types).collect()]
            };
            for ids in scopes {
                name_scope(graph, &ids, suffixes, &mut names);
            }
        }
        Self { names }
    }

    /// Returns the name of an emitted type.
    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&TypeName> {
        self.names.get(&id)
    }

    /// Returns true if the type at `id` is emitted.
    #[must_use]
    pub fn is_emitted(&self, id: TypeId) -> bool {
        self.names.contains_key(&id)
    }
}

fn name_scope(
    graph: &TypeGraph,
    ids: &[TypeId],
    suffixes: &[&str],
    names: &mut HashMap<TypeId, TypeName>,
) {
    let mut claimed: HashSet<String> = HashSet::new();
    for &id in ids {
        let Some(declaration) = graph.declaration(id) else {
            continue;
        };
        let base = declaration.display_name();
        let entry = if claimed.contains(base) {
            TypeName {
                name: next_free(base, |candidate| claimed.contains(candidate)),
                exported: false,
            }
        } else {
            TypeName {
                name: base.to_string(),
                exported: true,
            }
        };
        claimed.insert(entry.name.clone());
        names.insert(id, entry);
    }

    if suffixes.is_empty() {
        return;
    }
    // Renaming a class changes its generated symbols, so repeat until stable.
    loop {
        let generated: HashSet<String> = ids
            .iter()
            .filter(|&&id| graph.node(id).is_class())
            .filter_map(|id| names.get(id))
            .flat_map(|entry| suffixes.iter().map(move |suffix| format!("{}{suffix}", entry.name)))
            .collect();
        let Some(&clashing) = ids
            .iter()
            .find(|&&id| names.get(&id).is_some_and(|entry| generated.contains(&entry.name)))
        else {
            break;
        };
        let Some(entry) = names.get(&clashing).cloned() else {
            break;
        };
        let name = next_free(&entry.name, |candidate| {
            claimed.contains(candidate) || generated.contains(candidate)
        });
        claimed.insert(name.clone());
        names.insert(
            clashing,
            TypeName {
                name,
                exported: entry.exported,
            },
        );
    }
}

fn next_free(base: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Suffixes of the symbols the active layer generates next to each class.
fn generated_suffixes(layer: &GeneratorLayer) -> &'static [&'static str] {
    match layer {
        GeneratorLayer::Plain => &[],
        GeneratorLayer::Resolver => &["Resolver"],
        GeneratorLayer::Form(_) => &["Resolver", "FormData", "Form"],
    }
}

/// Emitted types of one module written as a contiguous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionGroup<'a> {
    /// Module the types belong to.
    pub module: &'a str,
    /// Types in emission order.
    pub types: Vec<TypeId>,
}

/// Returns the emitted types of a module: enums, then interfaces, then
/// classes, each sorted by display name.
///
/// A base declared in the same module is moved ahead of its derived types,
/// since class declarations are not hoisted.
#[must_use]
pub fn emission_order(graph: &TypeGraph, module: &Module) -> Vec<TypeId> {
    bases_first(graph, &sorted_by_name(graph, module))
}

/// Returns the emitted types of a namespace file grouped by module.
///
/// Every base declared in the file is emitted before its derived types, also
/// when the two live in different modules. With `wrap_modules` each module
/// forms a single group and modules holding bases come first, ties broken by
/// module name; a cycle between modules falls back to name order. Without it
/// the types of the whole file are ordered together and grouped into runs of
/// the same module.
#[must_use]
pub fn namespace_order<'a>(
    graph: &TypeGraph,
    namespace: &'a Namespace,
    wrap_modules: bool,
) -> Vec<EmissionGroup<'a>> {
    if wrap_modules {
        return wrapped_module_order(graph, namespace);
    }

    let mut module_of: HashMap<TypeId, &'a str> = HashMap::new();
    let mut sorted = Vec::new();
    for module in &namespace.modules {
        for id in sorted_by_name(graph, module) {
            module_of.insert(id, module.name.as_str());
            sorted.push(id);
        }
    }

    let mut groups: Vec<EmissionGroup<'a>> = Vec::new();
    for id in bases_first(graph, &sorted) {
        let Some(&module) = module_of.get(&id) else {
            continue;
        };
        match groups.last_mut() {
            Some(group) if group.module == module => group.types.push(id),
            _ => groups.push(EmissionGroup {
                module,
                types: vec![id],
            }),
        }
    }
    groups
}

fn wrapped_module_order<'a>(graph: &TypeGraph, namespace: &'a Namespace) -> Vec<EmissionGroup<'a>> {
    let mut pending: Vec<EmissionGroup<'a>> = namespace
        .modules
        .iter()
        .map(|module| EmissionGroup {
            module: module.name.as_str(),
            types: emission_order(graph, module),
        })
        .filter(|group| !group.types.is_empty())
        .collect();

    let module_of: HashMap<TypeId, &'a str> = pending
        .iter()
        .flat_map(|group| group.types.iter().map(move |&id| (id, group.module)))
        .collect();
    let requires: HashMap<&'a str, HashSet<&'a str>> = pending
        .iter()
        .map(|group| {
            let bases = group
                .types
                .iter()
                .flat_map(|&id| graph.base_chain(id))
                .filter_map(|base| module_of.get(&base).copied())
                .filter(|&module| module != group.module)
                .collect();
            (group.module, bases)
        })
        .collect();

    let mut ordered: Vec<EmissionGroup<'a>> = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|group| {
                requires.get(group.module).is_none_or(|bases| {
                    bases
                        .iter()
                        .all(|base| ordered.iter().any(|done| done.module == *base))
                })
            })
            .unwrap_or(0);
        ordered.push(pending.remove(ready));
    }
    ordered
}

/// Moves every ancestor found in `sorted` ahead of its first derived type.
fn bases_first(graph: &TypeGraph, sorted: &[TypeId]) -> Vec<TypeId> {
    let mut ordered = Vec::with_capacity(sorted.len());
    for &id in sorted {
        for ancestor in graph.base_chain(id).into_iter().rev() {
            if sorted.contains(&ancestor) && !ordered.contains(&ancestor) {
                ordered.push(ancestor);
            }
        }
        if !ordered.contains(&id) {
            ordered.push(id);
        }
    }
    ordered
}

fn sorted_by_name(graph: &TypeGraph, module: &Module) -> Vec<TypeId> {
    let rank = |node: &TypeNode| match node {
        TypeNode::Enum(_) => 0,
        TypeNode::Interface(_) => 1,
        _ => 2,
    };

    let mut ids: Vec<TypeId> = module
        .types
        .iter()
        .copied()
        .filter(|&id| graph.declaration(id).is_some_and(|d| !d.ignored))
        .collect();
    ids.sort_by(|&a, &b| {
        let name_a = graph.declaration(a).map_or("", |d| d.display_name());
        let name_b = graph.declaration(b).map_or("", |d| d.display_name());
        rank(graph.node(a))
            .cmp(&rank(graph.node(b)))
            .then_with(|| name_a.cmp(name_b))
    });
    ids
}

/// Returns the name of a member in generated code.
///
/// A serialized-name override wins over camelCase conversion.
#[must_use]
pub fn member_name(member: &Member, options: &GeneratorOptions) -> String {
    if let Some(json_name) = &member.json_name {
        return json_name.clone();
    }
    if options.camel_case {
        to_camel_case(&member.name)
    } else {
        member.name.clone()
    }
}

/// Returns the first segment of a dotted module name.
#[must_use]
pub fn module_root(module: &str) -> &str {
    module.split('.').next().unwrap_or(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsgen_model::{build_graph, parse_metadata};

    const XML: &str = r#"<metadata>
    <type name="Order" namespace="Shop" kind="class">
        <member name="Status" type="Status"/>
        <member name="Outcome" type="Result"/>
        <member name="Paged" type="Result&lt;int&gt;"/>
        <member name="ShippingAddress" type="string" jsonName="ship_to"/>
    </type>
    <type name="Status" namespace="Shop" kind="enum">
        <value name="Open" value="0"/>
    </type>
    <type name="Result" namespace="Shop" kind="class"/>
    <type name="Result`1" namespace="Shop" kind="class">
        <genericParameter name="T"/>
    </type>
</metadata>"#;

    fn setup(options: &GeneratorOptions) -> (TypeGraph, NameTable) {
        let catalog = parse_metadata(XML).expect("Failed to parse");
        let graph = build_graph(&catalog, "Shop.Order").expect("Failed to build");
        let table = NameTable::build(&graph, &graph.namespaces(), options);
        (graph, table)
    }

    fn find(graph: &TypeGraph, full_name: &str) -> TypeId {
        graph
            .iter()
            .find(|(_, n)| n.declaration().is_some_and(|d| d.full_name == full_name))
            .map(|(id, _)| id)
            .expect("type not in graph")
    }

    #[test]
    fn test_emission_order() {
        let (graph, _) = setup(&GeneratorOptions::default());
        let namespace = graph
            .namespaces()
            .into_iter()
            .find(|n| n.name == "Shop")
            .expect("namespace");
        let module = &namespace.modules[0];
        let names: Vec<&str> = emission_order(&graph, module)
            .into_iter()
            .filter_map(|id| graph.declaration(id).map(|d| d.display_name()))
            .collect();
        assert_eq!(names, vec!["Status", "Order", "Result", "Result"]);
    }

    #[test]
    fn test_base_is_emitted_before_derived() {
        let xml = r#"<metadata>
    <type name="Employee" namespace="Staff" kind="class" base="Person"/>
    <type name="Person" namespace="Staff" kind="class"/>
</metadata>"#;
        let catalog = parse_metadata(xml).expect("Failed to parse");
        let graph = build_graph(&catalog, "Staff.Employee").expect("Failed to build");
        let namespaces = graph.namespaces();
        let names: Vec<&str> = emission_order(&graph, &namespaces[0].modules[0])
            .into_iter()
            .filter_map(|id| graph.declaration(id).map(|d| d.display_name()))
            .collect();
        assert_eq!(names, vec!["Person", "Employee"]);
    }

    const SPLIT_XML: &str = r#"<metadata>
    <type name="Employee" namespace="Staff" module="Alpha" kind="class" base="Staff.Person">
        <member name="Badge" type="string"/>
    </type>
    <type name="Intern" namespace="Staff" module="Alpha" kind="class"/>
    <type name="Person" namespace="Staff" module="Zeta" kind="class">
        <member name="Name" type="string"/>
    </type>
</metadata>"#;

    fn split_order(wrap_modules: bool) -> Vec<(String, Vec<String>)> {
        let catalog = parse_metadata(SPLIT_XML).expect("Failed to parse");
        let graph = build_graph(&catalog, "Staff.Employee").expect("Failed to build");
        let namespaces = graph.namespaces();
        let namespace = namespaces
            .iter()
            .find(|n| n.name == "Staff")
            .expect("namespace");
        namespace_order(&graph, namespace, wrap_modules)
            .into_iter()
            .map(|group| {
                let names = group
                    .types
                    .iter()
                    .filter_map(|&id| graph.declaration(id).map(|d| d.display_name().to_string()))
                    .collect();
                (group.module.to_string(), names)
            })
            .collect()
    }

    #[test]
    fn test_base_in_later_module_is_emitted_first() {
        let groups = split_order(false);
        let flat: Vec<&str> = groups
            .iter()
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .collect();
        let person = flat.iter().position(|&n| n == "Person").expect("Person");
        let employee = flat.iter().position(|&n| n == "Employee").expect("Employee");
        assert!(person < employee, "{flat:?}");
        assert_eq!(groups[0].0, "Zeta");
    }

    #[test]
    fn test_wrapped_module_with_base_comes_first() {
        let groups = split_order(true);
        let modules: Vec<&str> = groups.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(modules, vec!["Zeta", "Alpha"]);
        assert_eq!(groups[0].1, vec!["Person"]);
    }

    #[test]
    fn test_type_named_like_generated_symbol_is_renamed() {
        let xml = r#"<metadata>
    <type name="Person" namespace="Shop" kind="class">
        <member name="Check" type="PersonResolver"/>
        <member name="Kind" type="PersonForm"/>
    </type>
    <type name="PersonResolver" namespace="Shop" kind="class"/>
    <type name="PersonForm" namespace="Shop" kind="enum">
        <value name="Short" value="0"/>
    </type>
</metadata>"#;
        let catalog = parse_metadata(xml).expect("Failed to parse");
        let graph = build_graph(&catalog, "Shop.Person").expect("Failed to build");
        let namespaces = graph.namespaces();
        let name_of = |table: &NameTable, full_name: &str| {
            table
                .get(find(&graph, full_name))
                .map(|n| n.name.clone())
                .expect("named")
        };

        let plain = NameTable::build(&graph, &namespaces, &GeneratorOptions::default());
        assert_eq!(name_of(&plain, "Shop.PersonResolver"), "PersonResolver");
        assert_eq!(name_of(&plain, "Shop.PersonForm"), "PersonForm");

        let layout = crate::options::FormLayout::new(3).expect("valid layout");
        let options = GeneratorOptions::default().with_layer(GeneratorLayer::Form(layout));
        let table = NameTable::build(&graph, &namespaces, &options);
        assert_eq!(name_of(&table, "Shop.Person"), "Person");
        assert_eq!(name_of(&table, "Shop.PersonResolver"), "PersonResolver1");
        assert_eq!(name_of(&table, "Shop.PersonForm"), "PersonForm1");
        assert!(table.get(find(&graph, "Shop.PersonResolver")).expect("named").exported);
    }

    #[test]
    fn test_member_name() {
        let (graph, _) = setup(&GeneratorOptions::default());
        let order = graph.object(find(&graph, "Shop.Order")).expect("class");
        let camel = GeneratorOptions::default();
        let raw = GeneratorOptions::default().with_camel_case(false);

        assert_eq!(member_name(&order.members["Status"], &camel), "status");
        assert_eq!(member_name(&order.members["Status"], &raw), "Status");
        assert_eq!(member_name(&order.members["ShippingAddress"], &camel), "ship_to");
    }

    #[test]
    fn test_shadowed_type_is_renamed() {
        let (graph, table) = setup(&GeneratorOptions::default());
        let first = table.get(find(&graph, "Shop.Result")).expect("named");
        assert_eq!(first.name, "Result");
        assert!(first.exported);

        let shadowed = table.get(find(&graph, "Shop.Result`1")).expect("named");
        assert_eq!(shadowed.name, "Result1");
        assert!(!shadowed.exported);
    }

    #[test]
    fn test_module_root() {
        assert_eq!(module_root("Sample.People"), "Sample");
        assert_eq!(module_root("Sample"), "Sample");
    }
}

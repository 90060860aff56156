//! react-hook-form resolvers.
//!
//! For every class the layer writes
//!
//! ```text
//! export const PersonResolver: Resolver<Person> = async (values) => { ... };
//! ```
//!
//! which runs the validation rules of the class's own members, keeps the
//! first error of each member and, when the class extends an emitted class,
//! merges the base class resolver's result.

use super::rules::{applicable_rules, collect_rule_imports, write_member_checks};
use super::types::{property_access, property_key};
use super::{BaseEmitter, ClassEmitter, EmitScope};
use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use crate::error::CodegenError;
use crate::generator::GeneratedFile;
use crate::imports::{ImportCollector, ImportSource};
use std::collections::BTreeSet;
use tracing::debug;
use tsgen_model::TypeId;

/// Package providing the resolver contract.
pub const REACT_HOOK_FORM: &str = "react-hook-form";

/// Returns the name of the resolver generated for `type_name`.
#[must_use]
pub fn resolver_name(type_name: &str) -> String {
    format!("{type_name}Resolver")
}

/// Layer adding a resolver after each class.
#[derive(Debug, Clone, Default)]
pub struct ResolverEmitter<E = BaseEmitter> {
    inner: E,
}

impl<E: ClassEmitter> ResolverEmitter<E> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: E) -> Self {
        Self { inner }
    }

    /// Returns the wrapped layer.
    #[must_use]
    pub const fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: ClassEmitter> ClassEmitter for ResolverEmitter<E> {
    fn local_symbols(&self, scope: &EmitScope<'_>) -> Vec<String> {
        let mut symbols = self.inner.local_symbols(scope);
        for id in scope.emitted_classes() {
            if let Some(name) = scope.names.get(id) {
                symbols.push(resolver_name(&name.name));
            }
        }
        symbols
    }

    fn collect_imports(&self, scope: &EmitScope<'_>, imports: &mut ImportCollector) {
        self.inner.collect_imports(scope, imports);

        let classes = scope.emitted_classes();
        if classes.is_empty() {
            return;
        }

        let library = ImportSource::Library(REACT_HOOK_FORM.to_string());
        imports.request(library.clone(), "Resolver");
        imports.request(library.clone(), "FieldError");
        imports.request(library.clone(), "FieldErrors");

        for id in classes {
            if let Some(base) = scope.emitted_base(id) {
                imports.request(library.clone(), "ResolverOptions");
                scope.collect_type_imports(base, imports);
                if let Some(base_name) = scope.names.get(base.id) {
                    scope.request_symbol(base.id, &resolver_name(&base_name.name), imports);
                }
            }
            for member in scope.declared_members(id) {
                collect_rule_imports(member, imports);
            }
        }
    }

    fn emit_class(
        &self,
        scope: &EmitScope<'_>,
        id: TypeId,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        self.inner.emit_class(scope, id, w)?;
        w.blank_line();
        write_resolver(scope, id, w)
    }

    fn file_extension(&self, scope: &EmitScope<'_>) -> &'static str {
        self.inner.file_extension(scope)
    }

    fn helper_modules(&self, requested: &BTreeSet<String>) -> Vec<(String, GeneratedFile)> {
        self.inner.helper_modules(requested)
    }
}

fn write_resolver(scope: &EmitScope<'_>, id: TypeId, w: &mut CodeWriter) -> Result<(), CodegenError> {
    let library = ImportSource::Library(REACT_HOOK_FORM.to_string());
    let resolver = scope.import_alias(&library, "Resolver")?;
    let field_error = scope.import_alias(&library, "FieldError")?;
    let field_errors = scope.import_alias(&library, "FieldErrors")?;

    let name = scope.type_name(id)?;
    let instance = scope.instance_type(id)?;
    debug!(class = name, "emitting resolver");

    // Constants are static and never part of the validated values.
    let members: Vec<_> = scope
        .declared_members(id)
        .into_iter()
        .filter(|member| member.constant.is_none())
        .collect();
    let checked: Vec<_> = members
        .iter()
        .map(|&member| (member, applicable_rules(scope, member)))
        .filter(|(_, rules)| !rules.is_empty())
        .collect();

    let header = format!(
        "{}const {}: {resolver}<{instance}> = async (values) =>",
        scope.export_prefix(id),
        resolver_name(name)
    );
    w.block_with(&format!("{header} {{"), "};", |w| {
        if !checked.is_empty() {
            w.block_with("const errorBuffer = {", "};", |w| {
                for (i, (member, _)) in checked.iter().enumerate() {
                    let separator = if i + 1 < checked.len() { "," } else { "" };
                    cw_writeln!(
                        w,
                        "{}: [] as {field_error}[]{separator}",
                        property_key(&scope.member_name(member))
                    );
                }
                Ok::<(), CodegenError>(())
            })?;
            w.blank_line();
            for (member, rules) in &checked {
                write_member_checks(scope, id, member, rules, w)?;
            }
            w.blank_line();
        }

        cw_writeln!(w, "const returnValues = {{}} as {instance};");
        cw_writeln!(w, "const returnErrors: {field_errors}<{instance}> = {{}};");
        w.blank_line();

        for member in &members {
            let member_name = scope.member_name(member);
            let bucket = property_access("errorBuffer", &member_name);
            let value = property_access("values", &member_name);
            let returned = property_access("returnValues", &member_name);
            if checked.iter().any(|(m, _)| std::ptr::eq(*m, *member)) {
                w.block_with(&format!("if ({bucket}.length === 0) {{"), "} else {", |w| {
                    cw_writeln!(w, "{returned} = {value};");
                    Ok::<(), CodegenError>(())
                })?;
                {
                    let _indent = w.indent();
                    cw_writeln!(
                        w,
                        "{} = {bucket}[0];",
                        property_access("returnErrors", &member_name)
                    );
                }
                w.writeln("}");
            } else {
                cw_writeln!(w, "{returned} = {value};");
            }
        }
        if !members.is_empty() {
            w.blank_line();
        }

        match scope.emitted_base(id) {
            Some(base) => {
                let options = scope.import_alias(&library, "ResolverOptions")?;
                let base_instance = scope.instance_type(base.id)?;
                let base_resolver =
                    scope.symbol_ref(base.id, &resolver_name(scope.type_name(base.id)?))?;
                cw_writeln!(
                    w,
                    "const baseResults = await {base_resolver}(values, undefined, {{}} as {options}<{base_instance}>);"
                );
                w.blank_line();
                w.block_with("return {", "};", |w| {
                    w.writeln("values: { ...baseResults.values, ...returnValues },");
                    w.writeln("errors: { ...baseResults.errors, ...returnErrors }");
                    Ok::<(), CodegenError>(())
                })
            }
            None => w.block_with("return {", "};", |w| {
                w.writeln("values: returnValues,");
                w.writeln("errors: returnErrors");
                Ok::<(), CodegenError>(())
            }),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NameTable;
    use crate::options::GeneratorOptions;
    use tsgen_model::{build_graph, parse_metadata};

    fn emit(xml: &str, root: &str) -> String {
        let catalog = parse_metadata(xml).expect("Failed to parse");
        let graph = build_graph(&catalog, root).expect("Failed to build");
        let options = GeneratorOptions::default();
        let namespaces = graph.namespaces();
        let names = NameTable::build(&graph, &namespaces, &options);
        let emitter = ResolverEmitter::new(BaseEmitter::new());

        let empty = crate::imports::ImportTable::default();
        let probe = EmitScope::new(&graph, &options, &names, &namespaces[0], &empty);
        let mut collector = ImportCollector::new();
        for local in probe.local_names().into_iter().chain(emitter.local_symbols(&probe)) {
            collector.reserve(local);
        }
        emitter.collect_imports(&probe, &mut collector);
        let imports = collector.finish();

        let scope = EmitScope::new(&graph, &options, &names, &namespaces[0], &imports);
        let id = graph.root().expect("root");
        let mut w = CodeWriter::default();
        write_resolver(&scope, id, &mut w).expect("Failed to emit");
        w.into_string()
    }

    #[test]
    fn test_resolver_without_rules_copies_values() {
        let xml = r#"<metadata>
    <type name="Note" namespace="Notes" kind="class">
        <member name="Text" type="string"/>
    </type>
</metadata>"#;
        assert_eq!(
            emit(xml, "Notes.Note"),
            "export const NoteResolver: Resolver<Note> = async (values) => {\n\
             \tconst returnValues = {} as Note;\n\
             \tconst returnErrors: FieldErrors<Note> = {};\n\
             \n\
             \treturnValues.text = values.text;\n\
             \n\
             \treturn {\n\
             \t\tvalues: returnValues,\n\
             \t\terrors: returnErrors\n\
             \t};\n\
             };\n"
        );
    }

    #[test]
    fn test_inapplicable_rule_gets_no_bucket() {
        let xml = r#"<metadata>
    <type name="Note" namespace="Notes" kind="class">
        <member name="Text" type="string">
            <range minimum="1" maximum="5"/>
        </member>
    </type>
</metadata>"#;
        let resolver = emit(xml, "Notes.Note");
        assert!(!resolver.contains("errorBuffer"));
        assert!(resolver.contains("\treturnValues.text = values.text;\n"));
    }

    #[test]
    fn test_first_error_is_reported() {
        let xml = r#"<metadata>
    <type name="Login" namespace="Auth" kind="class">
        <member name="Password" type="string">
            <required/>
            <stringLength minimum="8" maximum="64"/>
            <regularExpression pattern="[A-Za-z0-9]+"/>
        </member>
    </type>
</metadata>"#;
        let resolver = emit(xml, "Auth.Login");
        assert!(resolver.contains("\t\tpassword: [] as FieldError[]\n"));
        assert!(resolver.contains("\t\tif (values.password.length < 8) {"));
        assert!(resolver.contains("\t\tif (!new RegExp('^(?:[A-Za-z0-9]+)$').test(values.password)) {"));
        assert!(resolver.contains(
            "\tif (errorBuffer.password.length === 0) {\n\
             \t\treturnValues.password = values.password;\n\
             \t} else {\n\
             \t\treturnErrors.password = errorBuffer.password[0];\n\
             \t}\n"
        ));
    }
}

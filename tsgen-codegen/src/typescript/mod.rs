//! TypeScript emitters.
//!
//! Output is produced by a stack of [`ClassEmitter`] layers. [`BaseEmitter`]
//! writes type declarations; [`ResolverEmitter`] wraps another layer and adds
//! a validation resolver after every class; [`FormEmitter`] wraps a resolver
//! layer and adds a form component. Each layer calls the layer it wraps first
//! and then appends its own output, imports and local symbols.

pub mod declarations;
pub mod form;
pub mod resolver;
pub mod rules;
pub mod types;

pub use declarations::BaseEmitter;
pub use form::{BOOTSTRAP_UTILS, FormEmitter};
pub use resolver::ResolverEmitter;

use crate::code_writer::CodeWriter;
use crate::error::CodegenError;
use crate::generator::GeneratedFile;
use crate::imports::{ImportCollector, ImportSource, ImportTable};
use crate::naming::{self, NameTable};
use crate::options::GeneratorOptions;
use std::collections::BTreeSet;
use tsgen_model::{Member, Namespace, TypeGraph, TypeId, TypeNode, TypeUse};

/// Extension of plain TypeScript files.
pub const TS_EXTENSION: &str = ".ts";

/// Extension of TypeScript files containing JSX.
pub const TSX_EXTENSION: &str = ".tsx";

/// One layer of the emission pipeline.
pub trait ClassEmitter {
    /// Returns names this layer declares in the file besides the types.
    fn local_symbols(&self, scope: &EmitScope<'_>) -> Vec<String>;

    /// Requests every symbol this layer's output references.
    fn collect_imports(&self, scope: &EmitScope<'_>, imports: &mut ImportCollector);

    /// Writes the output for the class at `id`.
    ///
    /// # Errors
    /// Returns `CodegenError` if a referenced symbol was never resolved.
    fn emit_class(
        &self,
        scope: &EmitScope<'_>,
        id: TypeId,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError>;

    /// Returns the extension of the file generated for `scope`.
    fn file_extension(&self, _scope: &EmitScope<'_>) -> &'static str {
        TS_EXTENSION
    }

    /// Synthesizes the helper modules that some file imported.
    fn helper_modules(&self, _requested: &BTreeSet<String>) -> Vec<(String, GeneratedFile)> {
        Vec::new()
    }
}

/// Everything an emitter needs to know about the file being generated.
#[derive(Debug, Clone, Copy)]
pub struct EmitScope<'a> {
    /// The type graph.
    pub graph: &'a TypeGraph,
    /// Generator options.
    pub options: &'a GeneratorOptions,
    /// Names of all emitted types.
    pub names: &'a NameTable,
    /// Namespace emitted into this file.
    pub namespace: &'a Namespace,
    /// Resolved imports of this file.
    pub imports: &'a ImportTable,
    module: Option<&'a str>,
}

impl<'a> EmitScope<'a> {
    /// Creates a scope for one namespace file.
    #[must_use]
    pub const fn new(
        graph: &'a TypeGraph,
        options: &'a GeneratorOptions,
        names: &'a NameTable,
        namespace: &'a Namespace,
        imports: &'a ImportTable,
    ) -> Self {
        Self {
            graph,
            options,
            names,
            namespace,
            imports,
            module: None,
        }
    }

    /// Returns a copy of this scope positioned inside `module`.
    #[must_use]
    pub const fn in_module(&self, module: &'a str) -> Self {
        Self {
            module: Some(module),
            ..*self
        }
    }

    /// Returns the emitted types of all modules in emission order.
    #[must_use]
    pub fn emitted_types(&self) -> Vec<TypeId> {
        naming::namespace_order(self.graph, self.namespace, self.options.enable_namespace)
            .into_iter()
            .flat_map(|group| group.types)
            .collect()
    }

    /// Returns the emitted classes in emission order.
    #[must_use]
    pub fn emitted_classes(&self) -> Vec<TypeId> {
        self.emitted_types()
            .into_iter()
            .filter(|&id| self.graph.node(id).is_class())
            .collect()
    }

    /// Returns true if the file emits at least one class.
    #[must_use]
    pub fn has_classes(&self) -> bool {
        !self.emitted_classes().is_empty()
    }

    /// Returns the names the base declarations introduce into the file.
    #[must_use]
    pub fn local_names(&self) -> Vec<String> {
        let mut locals: Vec<String> = self
            .emitted_types()
            .into_iter()
            .filter_map(|id| self.names.get(id).map(|n| n.name.clone()))
            .collect();
        if self.options.enable_namespace {
            for module in &self.namespace.modules {
                locals.push(naming::module_root(&module.name).to_string());
            }
        }
        locals
    }

    /// Returns true if the type at `id` is emitted somewhere in the output.
    #[must_use]
    pub fn is_emitted(&self, id: TypeId) -> bool {
        self.names.is_emitted(id)
    }

    /// Returns the generated name of an emitted type.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if the type is not emitted.
    pub fn type_name(&self, id: TypeId) -> Result<&'a str, CodegenError> {
        self.names
            .get(id)
            .map(|n| n.name.as_str())
            .ok_or_else(|| CodegenError::generation(format!("type {id:?} has no generated name")))
    }

    /// Returns `"export "` for exported types and `""` otherwise.
    #[must_use]
    pub fn export_prefix(&self, id: TypeId) -> &'static str {
        match self.names.get(id) {
            Some(name) if name.exported => "export ",
            _ => "",
        }
    }

    /// Returns the generated name of a member.
    #[must_use]
    pub fn member_name(&self, member: &Member) -> String {
        naming::member_name(member, self.options)
    }

    /// Returns the nearest emitted ancestor of a class or interface.
    ///
    /// Ignored ancestors are skipped; their members are inlined into the
    /// derived declaration instead.
    #[must_use]
    pub fn emitted_base(&self, id: TypeId) -> Option<&'a TypeUse> {
        let mut current = self.graph.object(id).and_then(|o| o.base.as_ref());
        let mut seen = vec![id];
        while let Some(base) = current {
            if self.is_emitted(base.id) {
                return Some(base);
            }
            if seen.contains(&base.id) {
                return None;
            }
            seen.push(base.id);
            current = self.graph.object(base.id).and_then(|o| o.base.as_ref());
        }
        None
    }

    /// Returns the members a declaration writes itself, sorted by name.
    ///
    /// Members of the emitted base are carried by `extends`.
    #[must_use]
    pub fn declared_members(&self, id: TypeId) -> Vec<&'a Member> {
        let mut owners = vec![id];
        let mut current = self.graph.object(id).and_then(|o| o.base.as_ref());
        while let Some(base) = current {
            if self.is_emitted(base.id) || owners.contains(&base.id) {
                break;
            }
            owners.push(base.id);
            current = self.graph.object(base.id).and_then(|o| o.base.as_ref());
        }

        let mut members: Vec<&'a Member> = self
            .graph
            .merged_members(id, self.options.member_filter())
            .into_iter()
            .filter(|m| owners.contains(&m.owner))
            .collect();
        members.sort_by_cached_key(|m| self.member_name(m));
        members
    }

    /// Returns own and inherited members, sorted by name.
    #[must_use]
    pub fn all_members(&self, id: TypeId) -> Vec<&'a Member> {
        let mut members = self.graph.merged_members(id, self.options.member_filter());
        members.sort_by_cached_key(|m| self.member_name(m));
        members
    }

    /// Returns the required members without a default value, sorted by name.
    #[must_use]
    pub fn constructor_params(&self, id: TypeId) -> Vec<&'a Member> {
        self.all_members(id)
            .into_iter()
            .filter(|m| m.required && m.constant.is_none() && self.default_value(m).is_none())
            .collect()
    }

    /// Returns a reference to `symbol`, declared next to the type at `owner`.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if the symbol lives in another file
    /// and was never imported.
    pub fn symbol_ref(&self, owner: TypeId, symbol: &str) -> Result<String, CodegenError> {
        let declaration = self
            .graph
            .declaration(owner)
            .ok_or_else(|| CodegenError::generation(format!("type {owner:?} is not declared")))?;

        if declaration.namespace == self.namespace.name {
            return Ok(match self.module {
                Some(module) if self.options.enable_namespace && module != declaration.module => {
                    format!("{}.{symbol}", declaration.module)
                }
                _ => symbol.to_string(),
            });
        }

        let source = ImportSource::Namespace(declaration.namespace.clone());
        if self.options.enable_namespace {
            let root = naming::module_root(&declaration.module);
            let rest = &declaration.module[root.len()..];
            let alias = self.import_alias(&source, root)?;
            Ok(format!("{alias}{rest}.{symbol}"))
        } else {
            Ok(self.import_alias(&source, symbol)?.to_string())
        }
    }

    /// Requests the import needed to reference `symbol` next to `owner`.
    pub fn request_symbol(&self, owner: TypeId, symbol: &str, imports: &mut ImportCollector) {
        let Some(declaration) = self.graph.declaration(owner) else {
            return;
        };
        if declaration.namespace == self.namespace.name {
            return;
        }
        let source = ImportSource::Namespace(declaration.namespace.clone());
        if self.options.enable_namespace {
            imports.request(source, naming::module_root(&declaration.module));
        } else {
            imports.request(source, symbol);
        }
    }

    /// Returns the local name of an imported symbol.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if the symbol was never requested.
    pub fn import_alias(&self, source: &ImportSource, symbol: &str) -> Result<&'a str, CodegenError> {
        self.imports.alias(source, symbol).ok_or_else(|| {
            CodegenError::generation(format!(
                "symbol '{symbol}' from '{}' was not imported into '{}'",
                source.path(),
                self.namespace.name
            ))
        })
    }

    /// Returns the type used where an emitted class appears as a whole,
    /// with `any` for each generic parameter.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if the type is not emitted or was
    /// never imported.
    pub fn instance_type(&self, id: TypeId) -> Result<String, CodegenError> {
        let name = self.symbol_ref(id, self.type_name(id)?)?;
        let arity = self
            .graph
            .object(id)
            .map_or(0, |o| o.generic_parameters.len());
        if arity == 0 {
            Ok(name.to_string())
        } else {
            Ok(format!("{name}<{}>", vec!["any"; arity].join(", ")))
        }
    }
}

/// Writes the imports and all modules of one namespace file.
///
/// # Errors
/// Returns the first error reported by a layer.
pub fn emit_namespace<E>(
    emitter: &E,
    scope: &EmitScope<'_>,
    w: &mut CodeWriter,
) -> Result<(), CodegenError>
where
    E: ClassEmitter + ?Sized,
{
    scope.imports.write_to(w);
    if !scope.imports.is_empty() {
        w.blank_line();
    }

    let groups = naming::namespace_order(
        scope.graph,
        scope.namespace,
        scope.options.enable_namespace,
    );
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            w.blank_line();
        }

        let module_scope = scope.in_module(group.module);
        if scope.options.enable_namespace {
            w.block(&format!("export namespace {}", group.module), |w| {
                emit_module_types(emitter, &module_scope, &group.types, w)
            })?;
        } else {
            emit_module_types(emitter, &module_scope, &group.types, w)?;
        }
    }
    Ok(())
}

fn emit_module_types<E>(
    emitter: &E,
    scope: &EmitScope<'_>,
    ids: &[TypeId],
    w: &mut CodeWriter,
) -> Result<(), CodegenError>
where
    E: ClassEmitter + ?Sized,
{
    for (i, &id) in ids.iter().enumerate() {
        if i > 0 {
            w.blank_line();
        }
        match scope.graph.node(id) {
            TypeNode::Enum(_) => declarations::emit_enum(scope, id, w)?,
            TypeNode::Interface(_) => declarations::emit_interface(scope, id, w)?,
            TypeNode::Class(_) => emitter.emit_class(scope, id, w)?,
            _ => {}
        }
    }
    Ok(())
}

//! Generation driver.
//!
//! Runs in two passes per namespace. The first pass reserves local names and
//! lets every layer request its imports; the second pass writes the file
//! against the frozen import table. Files are produced in dependency order,
//! followed by any helper modules a file imported.

use crate::code_writer::CodeWriter;
use crate::error::CodegenError;
use crate::imports::{ImportCollector, ImportTable, dependency_order};
use crate::naming::NameTable;
use crate::options::{GeneratorLayer, GeneratorOptions};
use crate::typescript::{BaseEmitter, ClassEmitter, EmitScope, FormEmitter, ResolverEmitter, emit_namespace};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tsgen_model::{Namespace, TypeGraph};

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File extension including the dot.
    pub extension: String,
    /// File content.
    pub source: String,
    /// Synthesized helper module rather than a namespace.
    pub helper: bool,
}

impl GeneratedFile {
    /// Returns the file name for the output unit `name`.
    #[must_use]
    pub fn file_name(&self, name: &str) -> String {
        format!("{name}{}", self.extension)
    }
}

/// Result of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedOutput {
    /// Files keyed by namespace or helper module name, in emission order.
    pub files: IndexMap<String, GeneratedFile>,
    /// Namespace of the root type.
    pub root_namespace: Option<String>,
}

impl GeneratedOutput {
    /// Returns the file generated for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.get(name)
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if nothing was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every file into `dir` and returns the written paths.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if a file cannot be written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, CodegenError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.files.len());
        for (name, file) in &self.files {
            let path = dir.join(file.file_name(name));
            std::fs::write(&path, &file.source)?;
            written.push(path);
        }
        Ok(written)
    }
}

impl fmt::Display for GeneratedOutput {
    /// Concatenates all namespace files; helper modules are left out.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for file in self.files.values().filter(|file| !file.helper) {
            if !first {
                writeln!(f)?;
            }
            first = false;
            f.write_str(&file.source)?;
        }
        Ok(())
    }
}

/// Generator producing TypeScript from a type graph.
pub struct Generator<'a> {
    graph: &'a TypeGraph,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    /// Creates a generator.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` if the options are invalid.
    pub fn new(graph: &'a TypeGraph, options: GeneratorOptions) -> Result<Self, CodegenError> {
        options.validate()?;
        Ok(Self { graph, options })
    }

    /// Returns the options in use.
    #[must_use]
    pub const fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generates all files with the layers selected in the options.
    ///
    /// # Errors
    /// Returns `CodegenError` if a layer fails.
    pub fn generate(&self) -> Result<GeneratedOutput, CodegenError> {
        match &self.options.layer {
            GeneratorLayer::Plain => self.generate_with(&BaseEmitter::new()),
            GeneratorLayer::Resolver => self.generate_with(&ResolverEmitter::new(BaseEmitter::new())),
            GeneratorLayer::Form(layout) => self.generate_with(&FormEmitter::new(
                ResolverEmitter::new(BaseEmitter::new()),
                layout.clone(),
            )),
        }
    }

    /// Generates all files with a custom layer stack.
    ///
    /// # Errors
    /// Returns `CodegenError` if a layer fails.
    pub fn generate_with<E>(&self, emitter: &E) -> Result<GeneratedOutput, CodegenError>
    where
        E: ClassEmitter + ?Sized,
    {
        let namespaces = self.graph.namespaces();
        let names = NameTable::build(self.graph, &namespaces, &self.options);

        let mut planned: Vec<(&Namespace, ImportTable)> = Vec::new();
        for namespace in &namespaces {
            if let Some(table) = self.plan_imports(emitter, &names, namespace) {
                planned.push((namespace, table));
            }
        }

        let dependencies: BTreeMap<String, BTreeSet<String>> = planned
            .iter()
            .map(|(namespace, table)| {
                let imported = table.namespaces().map(str::to_string).collect();
                (namespace.name.clone(), imported)
            })
            .collect();

        let mut files = IndexMap::new();
        let mut requested_helpers = BTreeSet::new();
        for name in dependency_order(&dependencies) {
            let Some((namespace, table)) = planned.iter().find(|(ns, _)| ns.name == name) else {
                continue;
            };
            requested_helpers.extend(table.helpers().map(str::to_string));

            let scope = EmitScope::new(self.graph, &self.options, &names, namespace, table);
            let mut w = CodeWriter::default();
            emit_namespace(emitter, &scope, &mut w)?;
            debug!(namespace = %name, "namespace emitted");

            files.insert(
                name,
                GeneratedFile {
                    extension: emitter.file_extension(&scope).to_string(),
                    source: w.into_string(),
                    helper: false,
                },
            );
        }

        for (name, file) in emitter.helper_modules(&requested_helpers) {
            if files.contains_key(&name) {
                warn!(module = %name, "helper module shadows a namespace, skipped");
                continue;
            }
            files.insert(name, file);
        }

        let root_namespace = self
            .graph
            .root()
            .and_then(|id| self.graph.declaration(id))
            .map(|declaration| declaration.namespace.clone());

        Ok(GeneratedOutput {
            files,
            root_namespace,
        })
    }

    /// Collects the imports of one namespace, or `None` if it emits nothing.
    fn plan_imports<E>(&self, emitter: &E, names: &NameTable, namespace: &Namespace) -> Option<ImportTable>
    where
        E: ClassEmitter + ?Sized,
    {
        let empty = ImportTable::default();
        let probe = EmitScope::new(self.graph, &self.options, names, namespace, &empty);
        if probe.emitted_types().is_empty() {
            return None;
        }

        let mut imports = ImportCollector::new();
        for local in probe.local_names() {
            imports.reserve(local);
        }
        for local in emitter.local_symbols(&probe) {
            imports.reserve(local);
        }
        emitter.collect_imports(&probe, &mut imports);
        Some(imports.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsgen_model::{build_graph, parse_metadata};

    fn file(source: &str, helper: bool) -> GeneratedFile {
        GeneratedFile {
            extension: ".ts".to_string(),
            source: source.to_string(),
            helper,
        }
    }

    #[test]
    fn test_display_skips_helper_modules() {
        let mut output = GeneratedOutput::default();
        output.files.insert("Core".to_string(), file("a\n", false));
        output.files.insert("App".to_string(), file("b\n", false));
        output.files.insert("Utils".to_string(), file("helper\n", true));

        assert_eq!(output.len(), 3);
        assert_eq!(output.to_string(), "a\n\nb\n");
        assert_eq!(output.get("App").map(|f| f.file_name("App")), Some("App.ts".to_string()));
    }

    #[test]
    fn test_generate_with_custom_stack() {
        let xml = r#"<metadata>
    <type name="Tag" namespace="Blog" kind="class">
        <member name="Label" type="string"><required/></member>
    </type>
</metadata>"#;
        let catalog = parse_metadata(xml).expect("Failed to parse");
        let graph = build_graph(&catalog, "Blog.Tag").expect("Failed to build");
        let generator = Generator::new(&graph, GeneratorOptions::default()).expect("valid options");

        let plain = generator.generate().expect("Failed to generate");
        let layered = generator
            .generate_with(&ResolverEmitter::new(BaseEmitter::new()))
            .expect("Failed to generate");

        assert_eq!(plain.root_namespace.as_deref(), Some("Blog"));
        assert!(!plain.to_string().contains("TagResolver"));
        assert!(layered.to_string().contains("export const TagResolver"));
        assert!(layered.to_string().contains(plain.to_string().trim_end()));
    }

    #[test]
    fn test_write_to_dir() {
        let mut output = GeneratedOutput::default();
        output.files.insert("Core".to_string(), file("export class A {\n}\n", false));

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let written = output.write_to_dir(dir.path()).expect("Failed to write");
        assert_eq!(written, vec![dir.path().join("Core.ts")]);
        let content = std::fs::read_to_string(&written[0]).expect("Failed to read");
        assert_eq!(content, "export class A {\n}\n");
    }
}

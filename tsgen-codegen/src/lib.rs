//! # tsgen Codegen
//!
//! TypeScript generation from a tsgen type graph.
//!
//! This crate provides:
//! - Type declarations (enums, interfaces, classes)
//! - react-hook-form resolvers built from validation rules
//! - React + Bootstrap form components
//! - Cross-file import resolution and namespace ordering

pub mod code_writer;
pub mod error;
pub mod generator;
pub mod imports;
pub mod naming;
pub mod options;
pub mod typescript;

pub use code_writer::CodeWriter;
pub use error::CodegenError;
pub use generator::{GeneratedFile, GeneratedOutput, Generator};
pub use options::{FormLayout, GeneratorLayer, GeneratorOptions};
pub use typescript::{BaseEmitter, ClassEmitter, FormEmitter, ResolverEmitter};

use std::path::Path;
use tsgen_model::{MetadataProvider, TypeGraph};

/// Generates TypeScript for an already built type graph.
///
/// # Errors
/// Returns `CodegenError` if the options are invalid or generation fails.
pub fn generate(graph: &TypeGraph, options: &GeneratorOptions) -> Result<GeneratedOutput, CodegenError> {
    Generator::new(graph, options.clone())?.generate()
}

/// Builds the graph reachable from `root` and generates TypeScript for it.
///
/// # Arguments
/// * `provider` - Source of host type metadata
/// * `root` - Full name of the root type
/// * `options` - Generator options
///
/// # Errors
/// Returns `CodegenError` if the options are invalid, the graph cannot be
/// built or validated, or generation fails.
pub fn generate_for<P>(
    provider: &P,
    root: &str,
    options: &GeneratorOptions,
) -> Result<GeneratedOutput, CodegenError>
where
    P: MetadataProvider + ?Sized,
{
    options.validate()?;
    let graph = tsgen_model::build_graph(provider, root)?;
    tsgen_model::validate_graph(&graph)?;
    generate(&graph, options)
}

/// Generates TypeScript from an XML metadata document.
///
/// # Arguments
/// * `xml` - Metadata document content
/// * `root` - Full name of the root type
/// * `options` - Generator options
///
/// # Errors
/// Returns `CodegenError` if parsing or generation fails.
pub fn generate_from_xml(
    xml: &str,
    root: &str,
    options: &GeneratorOptions,
) -> Result<GeneratedOutput, CodegenError> {
    let catalog = tsgen_model::parse_metadata(xml)?;
    generate_for(&catalog, root, options)
}

/// Generates TypeScript from an XML metadata file.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(
    path: &Path,
    root: &str,
    options: &GeneratorOptions,
) -> Result<GeneratedOutput, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_xml(&xml, root, options)
}

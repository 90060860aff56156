//! # tsgen
//!
//! TypeScript generation from .NET type metadata.
//!
//! tsgen walks the types reachable from a root type and writes one
//! TypeScript file per namespace, optionally layered with
//! [react-hook-form](https://react-hook-form.com) resolvers and React forms.
//!
//! ## Features
//!
//! - **Type declarations** - `const enum`s, interfaces and classes with
//!   default values and constructors for required members
//! - **Resolvers** - Validation attributes compiled into runtime checks
//! - **Forms** - Bootstrap grid layouts, optionally wrapped in a modal
//! - **Imports** - Cross-namespace imports with collision-free aliases
//!
//! ## Quick Start
//!
//! ```ignore
//! use tsgen::prelude::*;
//!
//! let options = GeneratorOptions::default().with_layer("withform(3)".parse()?);
//! let output = generate_from_xml(&xml, "Sample.Person", &options)?;
//! output.write_to_dir(Path::new("generated"))?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`model`] - Metadata parsing, type graph and validation rules
//! - [`codegen`] - TypeScript emitters and the generation driver

pub mod prelude;

/// Metadata parsing, type graph and validation rules.
pub mod model {
    pub use tsgen_model::*;
}

/// TypeScript generation.
pub mod codegen {
    pub use tsgen_codegen::*;
}

// Re-export commonly used items at the crate root
pub use tsgen_codegen::{
    CodegenError, FormLayout, GeneratedFile, GeneratedOutput, Generator, GeneratorLayer,
    GeneratorOptions, generate, generate_for, generate_from_file, generate_from_xml,
};
pub use tsgen_model::{Catalog, MetadataProvider, TypeGraph, build_graph, parse_metadata};

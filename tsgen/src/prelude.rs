//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use tsgen::prelude::*;
//! ```

// Model types
pub use tsgen_model::error::{ModelError, ParseError};
pub use tsgen_model::{
    Catalog, Member, MetadataProvider, RuleKind, TypeDescriptor, TypeGraph, TypeId, TypeNode,
    ValidationRule, build_graph, parse_metadata, validate_graph,
};

// Generation
pub use tsgen_codegen::{
    BaseEmitter, ClassEmitter, CodegenError, FormEmitter, FormLayout, GeneratedFile,
    GeneratedOutput, Generator, GeneratorLayer, GeneratorOptions, ResolverEmitter, generate,
    generate_for, generate_from_file, generate_from_xml,
};

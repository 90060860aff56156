//! # tsgen Model
//!
//! Host type metadata and the type graph consumed by the TypeScript emitters.
//!
//! This crate provides:
//! - Host metadata descriptors and an XML metadata parser
//! - The type graph (classes, interfaces, enums, collections, primitives)
//! - Validation rules attached to members
//! - Graph construction from a root type and graph validation

pub mod builder;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod parser;
pub mod rules;
pub mod validation;

pub use builder::{GraphBuilder, build_graph};
pub use error::{ModelError, ParseError};
pub use graph::{
    ConstantValue, Declaration, EnumType, EnumValue, Member, MemberFilter, Module, Namespace, ObjectType,
    OptionsSource, SystemKind, TypeGraph, TypeId, TypeNode, TypeUse,
};
pub use metadata::{
    Catalog, Constraint, ConstraintKind, EnumValueDescriptor, MemberDescriptor, MemberKind,
    MetadataProvider, TypeDescriptor, TypeKind, TypeRef, UiHint,
};
pub use parser::parse_metadata;
pub use rules::{RangeOperand, RuleKind, RuleTarget, ValidationRule, ValidatorRef};
pub use validation::validate_graph;

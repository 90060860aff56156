//! TypeScript type expressions, default values and literal escaping.

use super::EmitScope;
use crate::error::CodegenError;
use crate::imports::ImportCollector;
use tracing::warn;
use tsgen_model::rules::format_number;
use tsgen_model::{ConstantValue, Member, SystemKind, TypeId, TypeNode, TypeUse};

impl EmitScope<'_> {
    /// Renders a type use as a TypeScript type expression.
    ///
    /// References to ignored types and generic instantiations with the wrong
    /// number of arguments degrade to `any`.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if a foreign type was never imported.
    pub fn ts_type(&self, ty: &TypeUse) -> Result<String, CodegenError> {
        match self.graph.node(ty.id) {
            TypeNode::System(kind) => Ok(kind.ts_type().to_string()),
            TypeNode::GenericParameter(name) => Ok(name.clone()),
            TypeNode::Collection(element) => Ok(format!("{}[]", self.ts_type(element)?)),
            TypeNode::Enum(_) | TypeNode::Interface(_) | TypeNode::Class(_) => {
                if !self.is_emitted(ty.id) {
                    warn!(type_id = ty.id.index(), "reference to an ignored type emitted as any");
                    return Ok("any".to_string());
                }
                if self.arity(ty.id) != ty.arguments.len() {
                    warn!(
                        type_id = ty.id.index(),
                        expected = self.arity(ty.id),
                        found = ty.arguments.len(),
                        "malformed generic instantiation emitted as any"
                    );
                    return Ok("any".to_string());
                }

                let name = self.symbol_ref(ty.id, self.type_name(ty.id)?)?;
                if ty.arguments.is_empty() {
                    return Ok(name);
                }
                let arguments = ty
                    .arguments
                    .iter()
                    .map(|argument| self.ts_type(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{name}<{}>", arguments.join(", ")))
            }
        }
    }

    /// Renders the declared type of a member, including `| null`.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` if a foreign type was never imported.
    pub fn member_type(&self, member: &Member) -> Result<String, CodegenError> {
        let ty = self.ts_type(&member.ty)?;
        if member.nullable {
            Ok(format!("{ty} | null"))
        } else {
            Ok(ty)
        }
    }

    /// Requests the imports needed to render `ty`.
    pub fn collect_type_imports(&self, ty: &TypeUse, imports: &mut ImportCollector) {
        match self.graph.node(ty.id) {
            TypeNode::System(_) | TypeNode::GenericParameter(_) => {}
            TypeNode::Collection(element) => self.collect_type_imports(element, imports),
            TypeNode::Enum(_) | TypeNode::Interface(_) | TypeNode::Class(_) => {
                let Some(name) = self.names.get(ty.id) else {
                    return;
                };
                if self.arity(ty.id) != ty.arguments.len() {
                    return;
                }
                self.request_symbol(ty.id, &name.name, imports);
                for argument in &ty.arguments {
                    self.collect_type_imports(argument, imports);
                }
            }
        }
    }

    /// Returns the initializer of a required member, if its type has one.
    #[must_use]
    pub fn default_value(&self, member: &Member) -> Option<&'static str> {
        if member.nullable {
            return Some("null");
        }
        match self.graph.node(member.ty.id) {
            TypeNode::Enum(_) => Some("0"),
            TypeNode::Collection(_) => Some("[]"),
            TypeNode::System(SystemKind::String) => Some("\"\""),
            TypeNode::System(SystemKind::Number) => Some("0"),
            TypeNode::System(SystemKind::Bool) => Some("false"),
            _ => None,
        }
    }

    fn arity(&self, id: TypeId) -> usize {
        self.graph
            .object(id)
            .map_or(0, |object| object.generic_parameters.len())
    }
}

/// Renders a constant as a TypeScript literal.
#[must_use]
pub fn literal(value: &ConstantValue) -> String {
    match value {
        ConstantValue::Text(text) => double_quoted(text),
        ConstantValue::Number(number) => format_number(*number),
        ConstantValue::Bool(flag) => flag.to_string(),
        ConstantValue::List(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

/// Returns `text` as a single-quoted string literal.
#[must_use]
pub fn single_quoted(text: &str) -> String {
    quoted(text, '\'')
}

/// Returns `text` as a double-quoted string literal.
#[must_use]
pub fn double_quoted(text: &str) -> String {
    quoted(text, '"')
}

fn quoted(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Returns `text` safe for use as JSX element content.
///
/// Text containing markup characters becomes a string expression.
#[must_use]
pub fn jsx_text(text: &str) -> String {
    if text.contains(['<', '>', '{', '}']) {
        format!("{{{}}}", single_quoted(text))
    } else {
        text.to_string()
    }
}

/// Escapes `text` for a double-quoted JSX attribute.
#[must_use]
pub fn attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Returns true if `name` is usable as a JavaScript identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Returns the property `name` of `object`, bracketed when `name` is not an
/// identifier.
#[must_use]
pub fn property_access(object: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", double_quoted(name))
    }
}

/// Returns `name` as an object or class property key.
#[must_use]
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        double_quoted(name)
    }
}

/// Returns an identifier derived from `name` for use as a parameter.
#[must_use]
pub fn parameter_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '$' { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$') {
        out.insert(0, '_');
    }
    out
}

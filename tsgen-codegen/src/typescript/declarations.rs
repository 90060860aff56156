//! Enum, interface and class declarations.

use super::types::{literal, parameter_name, property_access, property_key};
use super::{ClassEmitter, EmitScope};
use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use crate::error::CodegenError;
use crate::imports::ImportCollector;
use tracing::debug;
use tsgen_model::{Member, ObjectType, TypeId, TypeNode};

/// Layer writing plain type declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseEmitter;

impl BaseEmitter {
    /// Creates the declaration layer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ClassEmitter for BaseEmitter {
    fn local_symbols(&self, _scope: &EmitScope<'_>) -> Vec<String> {
        Vec::new()
    }

    fn collect_imports(&self, scope: &EmitScope<'_>, imports: &mut ImportCollector) {
        for id in scope.emitted_types() {
            let node = scope.graph.node(id);
            if node.as_object().is_none() {
                continue;
            }
            if let Some(base) = scope.emitted_base(id) {
                scope.collect_type_imports(base, imports);
            }
            for member in scope.declared_members(id) {
                scope.collect_type_imports(&member.ty, imports);
            }
            if node.is_class() {
                for member in scope.constructor_params(id) {
                    scope.collect_type_imports(&member.ty, imports);
                }
            }
        }
    }

    fn emit_class(
        &self,
        scope: &EmitScope<'_>,
        id: TypeId,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        let object = object(scope, id)?;
        let header = header(scope, "class", id, object)?;
        debug!(class = %object.declaration.full_name, "emitting class");

        w.block(&header, |w| {
            for member in scope.declared_members(id) {
                write_class_member(scope, member, w)?;
            }
            write_constructor(scope, id, w)
        })
    }
}

/// Writes a `const enum` with its values in declaration order.
///
/// # Errors
/// Returns `CodegenError::Generation` if `id` is not an emitted enum.
pub fn emit_enum(scope: &EmitScope<'_>, id: TypeId, w: &mut CodeWriter) -> Result<(), CodegenError> {
    let TypeNode::Enum(enum_type) = scope.graph.node(id) else {
        return Err(CodegenError::generation(format!("type {id:?} is not an enum")));
    };
    let name = scope.type_name(id)?;
    let header = format!("{}const enum {name}", scope.export_prefix(id));

    w.block(&header, |w| {
        let count = enum_type.values.len();
        for (i, value) in enum_type.values.iter().enumerate() {
            let separator = if i + 1 < count { "," } else { "" };
            cw_writeln!(w, "{} = {}{separator}", value.name, value.value);
        }
        Ok(())
    })
}

/// Writes an interface with its declared members.
///
/// # Errors
/// Returns `CodegenError::Generation` if `id` is not an emitted interface.
pub fn emit_interface(
    scope: &EmitScope<'_>,
    id: TypeId,
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    let object = object(scope, id)?;
    let header = header(scope, "interface", id, object)?;

    w.block(&header, |w| {
        for member in scope.declared_members(id) {
            let optional = if member.required { "" } else { "?" };
            cw_writeln!(
                w,
                "{}{optional}: {};",
                property_key(&scope.member_name(member)),
                scope.member_type(member)?
            );
        }
        Ok(())
    })
}

fn object<'a>(scope: &EmitScope<'a>, id: TypeId) -> Result<&'a ObjectType, CodegenError> {
    scope
        .graph
        .object(id)
        .ok_or_else(|| CodegenError::generation(format!("type {id:?} is not a class or interface")))
}

fn header(
    scope: &EmitScope<'_>,
    keyword: &str,
    id: TypeId,
    object: &ObjectType,
) -> Result<String, CodegenError> {
    let mut header = format!("{}{keyword} {}", scope.export_prefix(id), scope.type_name(id)?);
    if !object.generic_parameters.is_empty() {
        header.push('<');
        header.push_str(&object.generic_parameters.join(", "));
        header.push('>');
    }
    if let Some(base) = scope.emitted_base(id) {
        header.push_str(" extends ");
        header.push_str(&scope.ts_type(base)?);
    }
    Ok(header)
}

fn write_class_member(
    scope: &EmitScope<'_>,
    member: &Member,
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    let name = property_key(&scope.member_name(member));
    if let Some(constant) = &member.constant {
        cw_writeln!(w, "static readonly {name} = {};", literal(constant));
        return Ok(());
    }

    let ty = scope.member_type(member)?;
    if !member.required {
        cw_writeln!(w, "{name}?: {ty};");
    } else if let Some(default) = scope.default_value(member) {
        cw_writeln!(w, "{name}: {ty} = {default};");
    } else {
        cw_writeln!(w, "{name}: {ty};");
    }
    Ok(())
}

fn write_constructor(scope: &EmitScope<'_>, id: TypeId, w: &mut CodeWriter) -> Result<(), CodegenError> {
    let params = scope.constructor_params(id);
    let base_params = scope
        .emitted_base(id)
        .map(|base| scope.constructor_params(base.id))
        .unwrap_or_default();
    if params.is_empty() && base_params.is_empty() {
        return Ok(());
    }

    let declared: Vec<String> = scope
        .declared_members(id)
        .iter()
        .map(|m| scope.member_name(m))
        .collect();
    let names: Vec<String> = params.iter().map(|m| scope.member_name(m)).collect();
    let signature = params
        .iter()
        .zip(&names)
        .map(|(member, name)| {
            Ok(format!("{}: {}", parameter_name(name), scope.member_type(member)?))
        })
        .collect::<Result<Vec<_>, CodegenError>>()?;

    w.blank_line();
    w.block(&format!("constructor({})", signature.join(", ")), |w| {
        if scope.emitted_base(id).is_some() {
            // Base parameters the derived class no longer requires are left unset.
            let forwarded: Vec<String> = base_params
                .iter()
                .map(|m| {
                    let name = scope.member_name(m);
                    if names.contains(&name) {
                        parameter_name(&name)
                    } else {
                        "undefined as any".to_string()
                    }
                })
                .collect();
            cw_writeln!(w, "super({});", forwarded.join(", "));
        }
        for name in names.iter().filter(|name| declared.contains(name)) {
            cw_writeln!(w, "{} = {};", property_access("this", name), parameter_name(name));
        }
        Ok::<(), CodegenError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportTable;
    use crate::naming::NameTable;
    use crate::options::GeneratorOptions;
    use tsgen_model::{build_graph, parse_metadata};

    const XML: &str = r#"<metadata>
    <type name="Shape" namespace="Draw" kind="enum">
        <value name="Circle" value="1"/>
        <value name="Square" value="4"/>
    </type>
    <type name="INamed" namespace="Draw" kind="interface">
        <member name="Label" type="string"><required/></member>
        <member name="Note" type="string"/>
    </type>
    <type name="Figure" namespace="Draw" kind="class">
        <member name="Created" type="DateTime"><required/></member>
        <member name="Kind" type="Shape"/>
        <member name="Named" type="INamed"/>
    </type>
    <type name="Circle" namespace="Draw" kind="class" base="Figure">
        <member name="Center" type="DateTime"><required/></member>
        <member name="Radius" type="double"><required/></member>
        <member name="Unit" kind="field" type="string" constant="px"/>
    </type>
</metadata>"#;

    fn emit(options: &GeneratorOptions, full_name: &str) -> String {
        let catalog = parse_metadata(XML).expect("Failed to parse");
        let graph = build_graph(&catalog, "Draw.Circle").expect("Failed to build");
        let namespaces = graph.namespaces();
        let names = NameTable::build(&graph, &namespaces, options);
        let imports = ImportTable::default();
        let scope = EmitScope::new(&graph, options, &names, &namespaces[0], &imports);
        let id = graph
            .iter()
            .find(|(_, n)| n.declaration().is_some_and(|d| d.full_name == full_name))
            .map(|(id, _)| id)
            .expect("type not in graph");

        let mut w = CodeWriter::default();
        match graph.node(id) {
            TypeNode::Enum(_) => emit_enum(&scope, id, &mut w).expect("Failed to emit"),
            TypeNode::Interface(_) => emit_interface(&scope, id, &mut w).expect("Failed to emit"),
            _ => BaseEmitter::new()
                .emit_class(&scope, id, &mut w)
                .expect("Failed to emit"),
        }
        w.into_string()
    }

    #[test]
    fn test_enum_keeps_declared_values() {
        assert_eq!(
            emit(&GeneratorOptions::default(), "Draw.Shape"),
            "export const enum Shape {\n\tCircle = 1,\n\tSquare = 4\n}\n"
        );
    }

    #[test]
    fn test_interface_members() {
        assert_eq!(
            emit(&GeneratorOptions::default(), "Draw.INamed"),
            "export interface INamed {\n\tlabel: string;\n\tnote?: string;\n}\n"
        );
    }

    #[test]
    fn test_derived_constructor_forwards_base_params() {
        assert_eq!(
            emit(&GeneratorOptions::default(), "Draw.Circle"),
            "export class Circle extends Figure {\n\
             \tcenter: Date;\n\
             \tradius: number = 0;\n\
             \n\
             \tconstructor(center: Date, created: Date) {\n\
             \t\tsuper(created);\n\
             \t\tthis.center = center;\n\
             \t}\n\
             }\n"
        );
    }

    #[test]
    fn test_constant_fields_are_static() {
        let options = GeneratorOptions::default().with_members(true, true);
        let circle = emit(&options, "Draw.Circle");
        assert!(circle.contains("\tstatic readonly unit = \"px\";\n"));
    }

    #[test]
    fn test_base_constructor() {
        let figure = emit(&GeneratorOptions::default(), "Draw.Figure");
        assert!(figure.contains("\tkind?: Shape;\n\tnamed?: INamed;\n"));
        assert!(figure.contains("\tconstructor(created: Date) {\n\t\tthis.created = created;\n\t}\n"));
        assert!(!figure.contains("super("));
    }
}

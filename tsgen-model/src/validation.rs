//! Type graph validation.

use crate::error::ModelError;
use crate::graph::{MemberFilter, ObjectType, TypeGraph, TypeId, TypeNode};
use crate::rules::RuleKind;
use std::collections::HashSet;

/// Validates a built type graph.
///
/// # Arguments
/// * `graph` - Graph returned by the builder
///
/// # Errors
/// Returns `ModelError` describing the first violated invariant.
pub fn validate_graph(graph: &TypeGraph) -> Result<(), ModelError> {
    if graph.root().is_none() {
        return Err(ModelError::Validation {
            message: "type graph has no root".to_string(),
        });
    }

    for (id, node) in graph.iter() {
        match node {
            TypeNode::Enum(e) => {
                let mut names = HashSet::new();
                let mut values = HashSet::new();
                for value in &e.values {
                    if !names.insert(&value.name) {
                        return Err(ModelError::Validation {
                            message: format!(
                                "duplicate value name '{}' in enum '{}'",
                                value.name, e.declaration.full_name
                            ),
                        });
                    }
                    if !values.insert(value.value) {
                        return Err(ModelError::Validation {
                            message: format!(
                                "duplicate value {} in enum '{}'",
                                value.value, e.declaration.full_name
                            ),
                        });
                    }
                }
            }
            TypeNode::Class(object) | TypeNode::Interface(object) => {
                validate_object(graph, id, object)?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn validate_object(graph: &TypeGraph, id: TypeId, object: &ObjectType) -> Result<(), ModelError> {
    if !graph.is_completed(id) {
        return Err(ModelError::IncompleteBase {
            type_name: object.declaration.full_name.clone(),
        });
    }

    if let Some(base) = &object.base {
        let base_node = graph.node(base.id);
        if base_node.as_object().is_none() {
            return Err(ModelError::InvalidBase {
                type_name: object.declaration.full_name.clone(),
                base: base_node
                    .declaration()
                    .map_or_else(|| format!("{:?}", base.id), |d| d.full_name.clone()),
            });
        }
        if !graph.is_completed(base.id) {
            return Err(ModelError::IncompleteBase {
                type_name: object.declaration.full_name.clone(),
            });
        }
        if graph.base_chain(base.id).contains(&id) {
            return Err(ModelError::CircularBase {
                path: object.declaration.full_name.clone(),
            });
        }
    }

    let visible: HashSet<&str> = graph
        .merged_members(id, MemberFilter::ALL)
        .into_iter()
        .map(|m| m.name.as_str())
        .collect();

    for member in object.members.values() {
        if let Some(options) = &member.options {
            let constant = graph
                .merged_members(options.owner, MemberFilter::ALL)
                .into_iter()
                .any(|m| m.name == options.member && m.constant.is_some());
            if !constant {
                return Err(ModelError::InvalidUiHint {
                    member: format!("{}.{}", object.declaration.full_name, member.name),
                    message: format!(
                        "options '{}' are not a constant of the declaring type",
                        options.member
                    ),
                });
            }
        }
        for rule in &member.rules {
            let RuleKind::Compare { other } = &rule.kind else {
                continue;
            };
            if !visible.contains(other.as_str()) {
                return Err(ModelError::Validation {
                    message: format!(
                        "member '{}' of '{}' compares against unknown member '{}'",
                        member.name, object.declaration.full_name, other
                    ),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::parser::parse_metadata;

    fn check(xml: &str, root: &str) -> Result<(), ModelError> {
        let catalog = parse_metadata(xml).expect("Failed to parse");
        let graph = build_graph(&catalog, root).expect("Failed to build");
        validate_graph(&graph)
    }

    #[test]
    fn test_valid_graph() {
        let xml = r#"<metadata>
    <type name="Account" namespace="N" kind="class">
        <member name="Password" type="string"/>
        <member name="Confirm" type="string"><compare other="Password"/></member>
    </type>
</metadata>"#;
        assert!(check(xml, "N.Account").is_ok());
    }

    #[test]
    fn test_compare_against_inherited_member() {
        let xml = r#"<metadata>
    <type name="Base" namespace="N" kind="class">
        <member name="Password" type="string"/>
    </type>
    <type name="Account" namespace="N" kind="class" base="Base">
        <member name="Confirm" type="string"><compare other="Password"/></member>
    </type>
</metadata>"#;
        assert!(check(xml, "N.Account").is_ok());
    }

    #[test]
    fn test_unknown_compare_target() {
        let xml = r#"<metadata>
    <type name="Account" namespace="N" kind="class">
        <member name="Confirm" type="string"><compare other="Missing"/></member>
    </type>
</metadata>"#;
        let err = check(xml, "N.Account").expect_err("Expected validation error");
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn test_select_options_must_be_constant() {
        let xml = r#"<metadata>
    <type name="Address" namespace="N" kind="class">
        <member name="Country" type="string" uiHint="select">
            <uiHintParameter name="typeContainingOptions" value="Lookups"/>
            <uiHintParameter name="nameOfOptions" value="Countries"/>
        </member>
    </type>
    <type name="Lookups" namespace="N" kind="class">
        <member name="Countries" type="string[]" OPTIONS/>
    </type>
</metadata>"#;
        let constant = xml.replace("OPTIONS", "kind=\"field\" constant=\"Spain,France\"");
        assert!(check(&constant, "N.Address").is_ok());

        let plain = xml.replace("OPTIONS", "");
        let err = check(&plain, "N.Address").expect_err("Expected invalid hint");
        assert!(matches!(err, ModelError::InvalidUiHint { .. }));
    }

    #[test]
    fn test_duplicate_enum_value() {
        let xml = r#"<metadata>
    <type name="Holder" namespace="N" kind="class">
        <member name="Color" type="Color"/>
    </type>
    <type name="Color" namespace="N" kind="enum">
        <value name="Red" value="1"/>
        <value name="Blue" value="1"/>
    </type>
</metadata>"#;
        let err = check(xml, "N.Holder").expect_err("Expected validation error");
        assert!(err.to_string().contains("duplicate value 1"));
    }

    #[test]
    fn test_empty_graph_has_no_root() {
        let graph = TypeGraph::new();
        assert!(validate_graph(&graph).is_err());
    }
}

//! XML metadata parser.
//!
//! Reads a metadata document describing host types into a [`Catalog`]:
//!
//! ```xml
//! <metadata>
//!     <type name="Person" namespace="Sample" kind="class">
//!         <member name="Name" type="string" displayName="Full name">
//!             <required/>
//!             <stringLength maximum="50"/>
//!         </member>
//!     </type>
//! </metadata>
//! ```

use crate::error::ParseError;
use crate::metadata::{
    Catalog, Constraint, ConstraintKind, EnumValueDescriptor, MemberDescriptor, MemberKind,
    TypeDescriptor, TypeKind, TypeRef, UiHint,
};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;

/// Parses a metadata document from a string.
///
/// # Arguments
/// * `xml` - Metadata document content
///
/// # Returns
/// Catalog of all declared types or parse error.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or contains invalid metadata.
pub fn parse_metadata(xml: &str) -> Result<Catalog, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut catalog: Option<Catalog> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match name {
                    "metadata" if catalog.is_none() => catalog = Some(Catalog::new()),
                    "type" => {
                        if let Some(catalog) = catalog.as_mut() {
                            let descriptor = parse_type(&mut reader, e)?;
                            catalog.add(descriptor)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match name {
                    "metadata" if catalog.is_none() => catalog = Some(Catalog::new()),
                    "type" => {
                        if let Some(catalog) = catalog.as_mut() {
                            catalog.add(parse_type_header(e)?)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    catalog.ok_or_else(|| ParseError::InvalidStructure {
        message: "No metadata element found".to_string(),
    })
}

/// Parses the attributes of a type element.
fn parse_type_header(e: &BytesStart<'_>) -> Result<TypeDescriptor, ParseError> {
    let mut name = None;
    let mut namespace = String::new();
    let mut module = None;
    let mut kind = TypeKind::Class;
    let mut base = None;
    let mut ignored = false;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(&attr)?;
        let value = value.as_str();

        match key {
            "name" => name = Some(value.to_string()),
            "namespace" => namespace = value.to_string(),
            "module" => module = Some(value.to_string()),
            "kind" => {
                kind = TypeKind::parse(value)
                    .ok_or_else(|| ParseError::invalid_attr("type", "kind", value))?
            }
            "base" => base = Some(TypeRef::parse(value)?),
            "ignored" => ignored = parse_bool("type", "ignored", value)?,
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("type", "name"))?;
    let mut descriptor = TypeDescriptor::new(name, namespace, kind);
    descriptor.module = module;
    descriptor.base = base;
    descriptor.ignored = ignored;
    Ok(descriptor)
}

/// Parses a type element with children.
fn parse_type(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<TypeDescriptor, ParseError> {
    let mut descriptor = parse_type_header(e)?;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                match tag_name {
                    "member" => {
                        let member = parse_member(reader, e)?;
                        push_member(&mut descriptor, member)?;
                    }
                    _ => {
                        let mut skip = Vec::new();
                        reader.read_to_end_into(QName(&name_bytes), &mut skip)?;
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                match tag_name {
                    "member" => {
                        let member = parse_member_header(e)?;
                        push_member(&mut descriptor, member)?;
                    }
                    "genericParameter" => {
                        let name = required_attr(e, "genericParameter", "name")?;
                        descriptor.generic_parameters.push(name);
                    }
                    "value" => descriptor.enum_values.push(parse_enum_value(e)?),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(descriptor)
}

fn push_member(descriptor: &mut TypeDescriptor, member: MemberDescriptor) -> Result<(), ParseError> {
    if descriptor.members.iter().any(|m| m.name == member.name) {
        return Err(ParseError::duplicate(
            "member",
            format!("{}.{}", descriptor.full_name(), member.name),
        ));
    }
    descriptor.members.push(member);
    Ok(())
}

/// Parses an enum value element.
fn parse_enum_value(e: &BytesStart<'_>) -> Result<EnumValueDescriptor, ParseError> {
    let mut name = None;
    let mut value = None;
    let mut display_name = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let raw = attr_value(&attr)?;
        let raw = raw.as_str();

        match key {
            "name" => name = Some(raw.to_string()),
            "value" => {
                value = Some(
                    raw.parse()
                        .map_err(|_| ParseError::invalid_attr("value", "value", raw))?,
                )
            }
            "displayName" => display_name = Some(raw.to_string()),
            _ => {}
        }
    }

    Ok(EnumValueDescriptor {
        name: name.ok_or_else(|| ParseError::missing_attr("value", "name"))?,
        value: value.ok_or_else(|| ParseError::missing_attr("value", "value"))?,
        display_name,
    })
}

/// Parses the attributes of a member element.
fn parse_member_header(e: &BytesStart<'_>) -> Result<MemberDescriptor, ParseError> {
    let mut name = None;
    let mut kind = MemberKind::Property;
    let mut type_ref = None;
    let mut display_name = None;
    let mut prompt = None;
    let mut ui_hint = None;
    let mut data_type = None;
    let mut json_name = None;
    let mut json_ignore = false;
    let mut not_mapped = false;
    let mut constant = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(&attr)?;
        let value = value.as_str();

        match key {
            "name" => name = Some(value.to_string()),
            "kind" => {
                kind = match value {
                    "property" => MemberKind::Property,
                    "field" => MemberKind::Field,
                    _ => return Err(ParseError::invalid_attr("member", "kind", value)),
                }
            }
            "type" => type_ref = Some(TypeRef::parse(value)?),
            "displayName" => display_name = Some(value.to_string()),
            "prompt" => prompt = Some(value.to_string()),
            "uiHint" => {
                ui_hint = Some(UiHint {
                    hint: value.to_string(),
                    ..UiHint::default()
                })
            }
            "dataType" => data_type = Some(value.to_string()),
            "jsonName" => json_name = Some(value.to_string()),
            "jsonIgnore" => json_ignore = parse_bool("member", "jsonIgnore", value)?,
            "notMapped" => not_mapped = parse_bool("member", "notMapped", value)?,
            "constant" => constant = Some(value.to_string()),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("member", "name"))?;
    let type_ref = type_ref.ok_or_else(|| ParseError::missing_attr("member", "type"))?;

    let mut member = MemberDescriptor::new(name, kind, type_ref);
    member.display_name = display_name;
    member.prompt = prompt;
    member.ui_hint = ui_hint;
    member.data_type = data_type;
    member.json_name = json_name;
    member.json_ignore = json_ignore;
    member.not_mapped = not_mapped;
    member.constant = constant;
    Ok(member)
}

/// Parses a member element with constraint children.
fn parse_member(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<MemberDescriptor, ParseError> {
    let mut member = parse_member_header(e)?;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                if tag_name == "uiHintParameter" {
                    let key = required_attr(e, tag_name, "name")?;
                    let value = required_attr(e, tag_name, "value")?;
                    member
                        .ui_hint
                        .get_or_insert_with(UiHint::default)
                        .parameters
                        .insert(key, value);
                } else if let Some(constraint) = parse_constraint(tag_name, e)? {
                    member.constraints.push(constraint);
                }
            }
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let mut skip = Vec::new();
                reader.read_to_end_into(QName(&name_bytes), &mut skip)?;
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(member)
}

/// Parses a constraint element. Returns `None` for unrecognized elements.
fn parse_constraint(tag_name: &str, e: &BytesStart<'_>) -> Result<Option<Constraint>, ParseError> {
    let message = optional_attr(e, "message")?;

    let kind = match tag_name {
        "required" => ConstraintKind::Required,
        "dataMember" => {
            let is_required = optional_attr(e, "isRequired")?
                .map(|v| parse_bool(tag_name, "isRequired", &v))
                .transpose()?
                .unwrap_or(false);
            if !is_required {
                return Ok(None);
            }
            ConstraintKind::DataMemberRequired
        }
        "range" => ConstraintKind::Range {
            minimum: required_attr(e, tag_name, "minimum")?,
            maximum: required_attr(e, tag_name, "maximum")?,
            operand: optional_attr(e, "operand")?,
        },
        "stringLength" => ConstraintKind::StringLength {
            minimum: optional_attr(e, "minimum")?,
            maximum: required_attr(e, tag_name, "maximum")?,
        },
        "regularExpression" => ConstraintKind::RegularExpression {
            pattern: required_attr(e, tag_name, "pattern")?,
        },
        "compare" => ConstraintKind::Compare {
            other: required_attr(e, tag_name, "other")?,
        },
        "emailAddress" => ConstraintKind::EmailAddress,
        "url" => ConstraintKind::Url,
        "phone" => ConstraintKind::Phone,
        "creditCard" => ConstraintKind::CreditCard,
        "custom" => ConstraintKind::Custom {
            validator: required_attr(e, tag_name, "validator")?,
        },
        _ => return Ok(None),
    };

    Ok(Some(Constraint { kind, message }))
}

fn optional_attr(e: &BytesStart<'_>, attribute: &str) -> Result<Option<String>, ParseError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == attribute.as_bytes() {
            return attr_value(&attr).map(Some);
        }
    }
    Ok(None)
}

/// Decodes an attribute value and resolves its XML entities.
fn attr_value(attr: &Attribute<'_>) -> Result<String, ParseError> {
    let raw = std::str::from_utf8(&attr.value)?;
    Ok(unescape(raw)?.into_owned())
}

fn required_attr(e: &BytesStart<'_>, element: &str, attribute: &str) -> Result<String, ParseError> {
    optional_attr(e, attribute)?.ok_or_else(|| ParseError::missing_attr(element, attribute))
}

fn parse_bool(element: &str, attribute: &str, value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::invalid_attr(element, attribute, value)),
    }
}

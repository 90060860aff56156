//! React form components.
//!
//! After each resolver the layer writes a `<Name>FormData` props type and a
//! `<Name>Form` component laid out on a Bootstrap grid. Styling helpers come
//! from the synthesized [`BOOTSTRAP_UTILS`] module.

use super::resolver::{REACT_HOOK_FORM, resolver_name};
use super::types::{attribute, jsx_text, property_access};
use super::{ClassEmitter, EmitScope, ResolverEmitter, TSX_EXTENSION};
use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use crate::error::CodegenError;
use crate::generator::GeneratedFile;
use crate::imports::{ImportCollector, ImportSource};
use crate::options::{FormLayout, GRID_WIDTH};
use std::collections::BTreeSet;
use tracing::debug;
use tsgen_model::graph::{UI_HINT_COL_SPAN, UI_HINT_HIDDEN, to_camel_case};
use tsgen_model::{Member, MemberFilter, OptionsSource, RuleKind, SystemKind, TypeId, TypeNode};

/// Name of the synthesized styling helper module.
pub const BOOTSTRAP_UTILS: &str = "BootstrapUtils";

const REACT: &str = "react";
const REACTSTRAP: &str = "reactstrap";

const BOOTSTRAP_UTILS_SOURCE: &str = "\
import { FieldError } from 'react-hook-form';

export const getClassName = (isValidated: boolean | undefined, error: FieldError | undefined): string =>
\terror ? 'form-control is-invalid' : (isValidated ? 'form-control is-valid' : 'form-control');

export const getCheckBoxClassName = (isValidated: boolean | undefined, error: FieldError | undefined): string =>
\terror ? 'form-check-input is-invalid' : (isValidated ? 'form-check-input is-valid' : 'form-check-input');

export const getErrorMessage = (error: FieldError | undefined) =>
\terror && <span className=\"invalid-feedback\">{error.message}</span>;
";

/// Layer adding a form component after each resolver.
#[derive(Debug, Clone)]
pub struct FormEmitter<E = ResolverEmitter> {
    inner: E,
    layout: FormLayout,
}

impl<E: ClassEmitter> FormEmitter<E> {
    /// Wraps `inner`, laying forms out with `layout`.
    #[must_use]
    pub const fn new(inner: E, layout: FormLayout) -> Self {
        Self { inner, layout }
    }

    /// Returns the grid layout.
    #[must_use]
    pub const fn layout(&self) -> &FormLayout {
        &self.layout
    }
}

impl<E: ClassEmitter> ClassEmitter for FormEmitter<E> {
    fn local_symbols(&self, scope: &EmitScope<'_>) -> Vec<String> {
        let mut symbols = self.inner.local_symbols(scope);
        for id in scope.emitted_classes() {
            if let Some(name) = scope.names.get(id) {
                symbols.push(format!("{}FormData", name.name));
                symbols.push(format!("{}Form", name.name));
            }
        }
        symbols
    }

    fn collect_imports(&self, scope: &EmitScope<'_>, imports: &mut ImportCollector) {
        self.inner.collect_imports(scope, imports);

        let classes = scope.emitted_classes();
        if classes.is_empty() {
            return;
        }

        imports.request(ImportSource::Library(REACT.to_string()), "useId");
        let library = ImportSource::Library(REACT_HOOK_FORM.to_string());
        imports.request(library.clone(), "useForm");
        imports.request(library, "SubmitHandler");

        let helpers = ImportSource::Helper(BOOTSTRAP_UTILS.to_string());
        imports.request(helpers.clone(), "getClassName");
        imports.request(helpers.clone(), "getErrorMessage");
        let has_checkbox = classes
            .iter()
            .flat_map(|&id| form_members(scope, id))
            .any(|member| !member.is_hidden() && is_bool(scope, member));
        if has_checkbox {
            imports.request(helpers, "getCheckBoxClassName");
        }

        for member in classes.iter().flat_map(|&id| form_members(scope, id)) {
            let Some(options) = member.options.as_ref().filter(|_| !member.is_hidden()) else {
                continue;
            };
            if let Some(owner) = scope.names.get(options.owner) {
                scope.request_symbol(options.owner, &owner.name, imports);
            }
        }

        if self.layout.modal_title().is_some() {
            let reactstrap = ImportSource::Library(REACTSTRAP.to_string());
            for symbol in ["Modal", "ModalHeader", "ModalBody"] {
                imports.request(reactstrap.clone(), symbol);
            }
        }
    }

    fn emit_class(
        &self,
        scope: &EmitScope<'_>,
        id: TypeId,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        self.inner.emit_class(scope, id, w)?;
        w.blank_line();
        FormWriter {
            scope,
            layout: &self.layout,
            id,
        }
        .write(w)
    }

    fn file_extension(&self, scope: &EmitScope<'_>) -> &'static str {
        if scope.has_classes() {
            TSX_EXTENSION
        } else {
            self.inner.file_extension(scope)
        }
    }

    fn helper_modules(&self, requested: &BTreeSet<String>) -> Vec<(String, GeneratedFile)> {
        let mut modules = self.inner.helper_modules(requested);
        if requested.contains(BOOTSTRAP_UTILS) {
            modules.push((
                BOOTSTRAP_UTILS.to_string(),
                GeneratedFile {
                    extension: TSX_EXTENSION.to_string(),
                    source: BOOTSTRAP_UTILS_SOURCE.to_string(),
                    helper: true,
                },
            ));
        }
        modules
    }
}

/// One cell of the form grid.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'m> {
    /// Member edited in the cell.
    pub member: &'m Member,
    /// Width in grid columns; `None` for an auto-width cell.
    pub width: Option<usize>,
}

/// Assigns visible members to grid rows, left to right.
///
/// A cell takes the width of its column unless its member carries a
/// `colSpan` hint. A row ends when it holds `columns` cells or the next cell
/// would overflow the grid.
#[must_use]
pub fn layout_rows<'m>(members: &[&'m Member], layout: &FormLayout) -> Vec<Vec<Cell<'m>>> {
    let widths = layout.column_widths();
    let average = layout.average_width();

    let mut rows = Vec::new();
    let mut row: Vec<Cell<'m>> = Vec::new();
    let mut used = 0;

    for &member in members {
        if row.len() >= layout.columns() {
            rows.push(std::mem::take(&mut row));
            used = 0;
        }
        let mut width = cell_width(member, &widths, row.len(), average);
        if !row.is_empty() && used + width.unwrap_or(average) > GRID_WIDTH {
            rows.push(std::mem::take(&mut row));
            used = 0;
            width = cell_width(member, &widths, 0, average);
        }
        used += width.unwrap_or(average);
        row.push(Cell { member, width });
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

fn cell_width(member: &Member, widths: &[usize], position: usize, average: usize) -> Option<usize> {
    let hinted = member
        .ui_hint
        .as_ref()
        .is_some_and(|hint| hint.parameters.contains_key(UI_HINT_COL_SPAN));
    if hinted {
        member.col_span_hint(average, GRID_WIDTH)
    } else {
        Some(widths.get(position).copied().unwrap_or(average))
    }
}

fn form_members<'a>(scope: &EmitScope<'a>, id: TypeId) -> Vec<&'a Member> {
    scope
        .all_members(id)
        .into_iter()
        .filter(|member| member.constant.is_none())
        .collect()
}

/// Returns the expression holding the choices of a `select` hint.
fn options_ref(scope: &EmitScope<'_>, options: &OptionsSource) -> Result<String, CodegenError> {
    let constant = scope
        .graph
        .merged_members(options.owner, MemberFilter::ALL)
        .into_iter()
        .find(|m| m.name == options.member && m.constant.is_some())
        .ok_or_else(|| {
            CodegenError::generation(format!("options '{}' are not a constant", options.member))
        })?;
    let owner = scope.symbol_ref(options.owner, scope.type_name(options.owner)?)?;
    Ok(property_access(&owner, &scope.member_name(constant)))
}

fn is_bool(scope: &EmitScope<'_>, member: &Member) -> bool {
    matches!(scope.graph.node(member.ty.id), TypeNode::System(SystemKind::Bool))
}

/// Returns the `type` attribute of a member's input.
///
/// An explicit UI hint wins, then the member type, then format rules.
#[must_use]
pub fn input_type(scope: &EmitScope<'_>, member: &Member) -> String {
    if let Some(hint) = member
        .ui_hint
        .as_ref()
        .map(|hint| hint.hint.trim())
        .filter(|hint| !hint.is_empty())
    {
        return hint.to_string();
    }

    let by_type = match scope.graph.node(member.ty.id) {
        TypeNode::System(SystemKind::Number) => Some("number"),
        TypeNode::System(SystemKind::Bool) => Some("checkbox"),
        TypeNode::System(SystemKind::Date) => Some("date"),
        _ => None,
    };
    if let Some(kind) = by_type {
        return kind.to_string();
    }

    let has = |probe: fn(&RuleKind) -> bool| member.rules.iter().any(|rule| probe(&rule.kind));
    let kind = if has(|k| matches!(k, RuleKind::Url)) {
        "url"
    } else if has(|k| matches!(k, RuleKind::EmailAddress)) {
        "email"
    } else if has(|k| matches!(k, RuleKind::Phone)) {
        "tel"
    } else {
        "text"
    };
    kind.to_string()
}

struct FormWriter<'s, 'a> {
    scope: &'s EmitScope<'a>,
    layout: &'s FormLayout,
    id: TypeId,
}

impl FormWriter<'_, '_> {
    fn write(&self, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let scope = self.scope;
        let name = scope.type_name(self.id)?;
        let instance = scope.instance_type(self.id)?;
        let prop = to_camel_case(name);
        let export = scope.export_prefix(self.id);
        debug!(class = name, "emitting form");

        let library = ImportSource::Library(REACT_HOOK_FORM.to_string());
        let use_form = scope.import_alias(&library, "useForm")?;
        let submit_handler = scope.import_alias(&library, "SubmitHandler")?;
        let use_id = scope.import_alias(&ImportSource::Library(REACT.to_string()), "useId")?;
        let has_required_params = !scope.constructor_params(self.id).is_empty();

        w.block_with(&format!("{export}type {name}FormData = {{"), "};", |w| {
            let optional = if has_required_params { "" } else { "?" };
            cw_writeln!(w, "{prop}{optional}: {instance},");
            if self.layout.modal_title().is_some() {
                w.writeln("isOpen: boolean,");
                w.writeln("toggle: () => void,");
            }
            cw_writeln!(w, "onSubmit: {submit_handler}<{instance}>");
            Ok::<(), CodegenError>(())
        })?;
        w.blank_line();

        let members = form_members(scope, self.id);
        let (hidden, visible): (Vec<&Member>, Vec<&Member>) = members
            .into_iter()
            .partition(|member| member.is_hidden());

        w.block_with(
            &format!("{export}const {name}Form = (props: {name}FormData) => {{"),
            "};",
            |w| {
                cw_writeln!(w, "const formId = {use_id}();");
                cw_writeln!(
                    w,
                    "const {{ register, handleSubmit, formState: {{ errors, touchedFields, isSubmitting }} }} = {use_form}<{instance}>({{"
                );
                {
                    let _indent = w.indent();
                    w.writeln("mode: 'onTouched',");
                    cw_writeln!(w, "resolver: {},", resolver_name(name));
                    if has_required_params {
                        cw_writeln!(w, "defaultValues: props.{prop}");
                    } else {
                        cw_writeln!(w, "defaultValues: props.{prop} ?? new {}()", scope.symbol_ref(self.id, name)?);
                    }
                }
                w.writeln("});");
                w.blank_line();

                match self.layout.modal_title() {
                    Some(title) => {
                        let reactstrap = ImportSource::Library(REACTSTRAP.to_string());
                        let modal = scope.import_alias(&reactstrap, "Modal")?;
                        let header = scope.import_alias(&reactstrap, "ModalHeader")?;
                        let body = scope.import_alias(&reactstrap, "ModalBody")?;
                        w.block_with(
                            &format!("return <{modal} isOpen={{props.isOpen}} toggle={{props.toggle}}>"),
                            &format!("</{modal}>;"),
                            |w| {
                                cw_writeln!(
                                    w,
                                    "<{header} toggle={{props.toggle}}>{}</{header}>",
                                    jsx_text(title)
                                );
                                w.block_with(&format!("<{body}>"), &format!("</{body}>"), |w| {
                                    self.write_form(w, &hidden, &visible, "</form>")
                                })
                            },
                        )
                    }
                    None => {
                        w.write("return ");
                        self.write_form(w, &hidden, &visible, "</form>;")
                    }
                }
            },
        )
    }

    fn write_form(
        &self,
        w: &mut CodeWriter,
        hidden: &[&Member],
        visible: &[&Member],
        closing: &str,
    ) -> Result<(), CodegenError> {
        w.block_with("<form onSubmit={handleSubmit(props.onSubmit)}>", closing, |w| {
            for member in hidden {
                let name = self.scope.member_name(member);
                cw_writeln!(w, "<input type=\"{UI_HINT_HIDDEN}\" {{...register(\"{name}\")}} />");
            }
            for row in layout_rows(visible, self.layout) {
                w.block_with("<div className=\"row mb-3\">", "</div>", |w| {
                    for cell in &row {
                        self.write_cell(w, cell)?;
                    }
                    Ok::<(), CodegenError>(())
                })?;
            }
            write_button_row(w);
            Ok(())
        })
    }

    fn write_cell(&self, w: &mut CodeWriter, cell: &Cell<'_>) -> Result<(), CodegenError> {
        let scope = self.scope;
        let member = cell.member;
        let name = scope.member_name(member);
        let label = jsx_text(member.display_name());
        let element_id = format!("{{formId + \"-{name}\"}}");
        let class = match cell.width {
            Some(width) => format!("form-group col-md-{width}"),
            None => "form-group col-md".to_string(),
        };
        let placeholder = member
            .prompt
            .as_deref()
            .map(|prompt| format!(" placeholder=\"{}\"", attribute(prompt)))
            .unwrap_or_default();
        let input_type = attribute(&input_type(scope, member));
        let helpers = ImportSource::Helper(BOOTSTRAP_UTILS.to_string());
        let touched = property_access("touchedFields", &name);
        let error = property_access("errors", &name);
        let class_name = format!(
            "{}({touched}, {error})",
            scope.import_alias(&helpers, "getClassName")?
        );
        let error_message = scope.import_alias(&helpers, "getErrorMessage")?;
        let options = member
            .options
            .as_ref()
            .map(|options| options_ref(scope, options))
            .transpose()?;

        w.block_with(&format!("<div className=\"{class}\">"), "</div>", |w| {
            if let Some(source) = &options {
                cw_writeln!(w, "<label htmlFor={element_id}>{label}:</label>");
                w.block_with(
                    &format!("<select className={{{class_name}}} id={element_id} {{...register(\"{name}\")}}>"),
                    "</select>",
                    |w| {
                        if !member.required {
                            cw_writeln!(w, "<option value=\"\">Select a {label}</option>");
                        }
                        cw_writeln!(
                            w,
                            "{{{source}.map((option) => <option key={{String(option)}} value={{String(option)}}>{{String(option)}}</option>)}}"
                        );
                        Ok::<(), CodegenError>(())
                    },
                )?;
            } else {
                match scope.graph.node(member.ty.id) {
                    TypeNode::Enum(enum_type) => {
                        cw_writeln!(w, "<label htmlFor={element_id}>{label}:</label>");
                        w.block_with(
                            &format!("<select className={{{class_name}}} id={element_id} {{...register(\"{name}\")}}>"),
                            "</select>",
                            |w| {
                                if !member.required {
                                    cw_writeln!(w, "<option value=\"\">Select a {label}</option>");
                                }
                                for value in &enum_type.values {
                                    cw_writeln!(
                                        w,
                                        "<option value=\"{}\">{}</option>",
                                        value.value,
                                        jsx_text(value.display_label())
                                    );
                                }
                                Ok::<(), CodegenError>(())
                            },
                        )?;
                    }
                    TypeNode::System(SystemKind::Bool) => {
                        let checkbox_class = scope.import_alias(&helpers, "getCheckBoxClassName")?;
                        cw_writeln!(
                            w,
                            "<input type=\"{input_type}\" className={{{checkbox_class}({touched}, {error})}} id={element_id} {{...register(\"{name}\")}} />"
                        );
                        cw_writeln!(w, "<label className=\"form-check-label\" htmlFor={element_id}>{label}</label>");
                    }
                    node => {
                        let register_options = match node {
                            TypeNode::System(SystemKind::Number) => ", { valueAsNumber: true }",
                            TypeNode::System(SystemKind::Date) => ", { valueAsDate: true }",
                            _ => "",
                        };
                        cw_writeln!(w, "<label htmlFor={element_id}>{label}:</label>");
                        cw_writeln!(
                            w,
                            "<input type=\"{input_type}\" className={{{class_name}}} id={element_id}{placeholder} {{...register(\"{name}\"{register_options})}} />"
                        );
                    }
                }
            }
            cw_writeln!(w, "{{{error_message}({error})}}");
            Ok(())
        })
    }
}

fn write_button_row(w: &mut CodeWriter) {
    w.writeln("<div className=\"row\">");
    {
        let _indent = w.indent();
        w.writeln("<div className=\"form-group col-md-12\">");
        {
            let _indent = w.indent();
            w.writeln("<button className=\"btn btn-primary\" type=\"submit\" disabled={isSubmitting}>Submit</button>");
            w.writeln("<button className=\"btn btn-secondary mx-1\" type=\"reset\" disabled={isSubmitting}>Reset</button>");
        }
        w.writeln("</div>");
    }
    w.writeln("</div>");
}

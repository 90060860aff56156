//! Runtime checks for validation rules.
//!
//! Every check reads `values.<member>` and pushes `{ type, message }` onto
//! `errorBuffer.<member>`. The emptiness check of a required member runs
//! first; all other rules only run on non-empty values.

use super::EmitScope;
use super::types::{property_access, single_quoted};
use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use crate::error::CodegenError;
use crate::imports::{ImportCollector, ImportSource};
use tracing::warn;
use tsgen_model::rules::format_number;
use tsgen_model::{Member, MemberFilter, RuleKind, RuleTarget, TypeId, ValidationRule};

const EMAIL_PATTERN: &str = r"/^[^@\s]+@[^@\s]+$/";
const URL_PATTERN: &str = r"/^(https?|ftp):\/\/[^\s/$.?#][^\s]*$/i";
const PHONE_PATTERN: &str = r"/^\+?[0-9][0-9\s().-]{5,}[0-9]$/";

/// Returns the rules of `member` that can be checked against its type.
///
/// Rules that do not apply to the member's type are logged and skipped.
#[must_use]
pub fn applicable_rules<'m>(scope: &EmitScope<'_>, member: &'m Member) -> Vec<&'m ValidationRule> {
    let target = scope.graph.rule_target(&member.ty);
    member
        .rules
        .iter()
        .filter(|rule| {
            let applicable = rule.is_applicable(target);
            if !applicable {
                warn!(
                    member = %member.name,
                    rule = rule.error_type(),
                    ?target,
                    "validation rule does not apply to member type, skipped"
                );
            }
            applicable
        })
        .collect()
}

/// Requests the custom validator functions referenced by `member`.
pub fn collect_rule_imports(member: &Member, imports: &mut ImportCollector) {
    for rule in &member.rules {
        if let RuleKind::Custom { validator } = &rule.kind {
            imports.request(
                ImportSource::Library(validator.module.clone()),
                &validator.function,
            );
        }
    }
}

/// Returns a condition that holds when `value` is empty.
#[must_use]
pub fn empty_condition(value: &str, target: RuleTarget) -> String {
    let missing = format!("{value} === undefined || {value} === null");
    match target {
        RuleTarget::Text => format!("{missing} || {value}.trim() === ''"),
        RuleTarget::Numeric => format!("{missing} || Number.isNaN({value})"),
        RuleTarget::Unknown => format!("{missing} || {value} === ''"),
        _ => format!("{missing} || ({value} as unknown) === ''"),
    }
}

/// Writes the checks of one member.
///
/// # Arguments
/// * `scope` - Current file scope
/// * `owner` - Class whose resolver is being written
/// * `member` - Checked member
/// * `rules` - Applicable rules of the member, in declaration order
/// * `w` - Output writer
///
/// # Errors
/// Returns `CodegenError` if a compare target or a custom validator cannot be
/// resolved.
pub fn write_member_checks(
    scope: &EmitScope<'_>,
    owner: TypeId,
    member: &Member,
    rules: &[&ValidationRule],
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    let name = scope.member_name(member);
    let check = MemberCheck {
        scope,
        owner,
        member,
        value: property_access("values", &name),
        bucket: property_access("errorBuffer", &name),
    };
    let empty = empty_condition(&check.value, scope.graph.rule_target(&member.ty));
    let required = rules.iter().find(|rule| rule.is_required());
    let others: Vec<&ValidationRule> = rules
        .iter()
        .copied()
        .filter(|rule| !rule.is_required())
        .collect();

    match required {
        Some(required) if others.is_empty() => w.block(&format!("if ({empty})"), |w| {
            check.push(w, required.error_type(), &check.message(required)?);
            Ok(())
        }),
        Some(required) => {
            w.block_with(&format!("if ({empty}) {{"), "} else {", |w| {
                check.push(w, required.error_type(), &check.message(required)?);
                Ok::<(), CodegenError>(())
            })?;
            {
                let _indent = w.indent();
                for rule in &others {
                    check.write_rule(rule, w)?;
                }
            }
            w.writeln("}");
            Ok(())
        }
        None => w.block(&format!("if (!({empty}))"), |w| {
            for rule in &others {
                check.write_rule(rule, w)?;
            }
            Ok(())
        }),
    }
}

struct MemberCheck<'s, 'a> {
    scope: &'s EmitScope<'a>,
    owner: TypeId,
    member: &'s Member,
    value: String,
    bucket: String,
}

impl MemberCheck<'_, '_> {
    fn push(&self, w: &mut CodeWriter, error_type: &str, message: &str) {
        cw_writeln!(
            w,
            "{}.push({{ type: '{error_type}', message: {} }});",
            self.bucket,
            single_quoted(message)
        );
    }

    fn message(&self, rule: &ValidationRule) -> Result<String, CodegenError> {
        let other = match &rule.kind {
            RuleKind::Compare { other } => Some(self.compare_target(other)?.display_name()),
            _ => None,
        };
        Ok(rule.render_message(self.member.display_name(), other))
    }

    fn compare_target(&self, other: &str) -> Result<&Member, CodegenError> {
        self.scope
            .graph
            .merged_members(self.owner, MemberFilter::ALL)
            .into_iter()
            .find(|m| m.name == other)
            .ok_or_else(|| {
                CodegenError::generation(format!(
                    "member '{}' is compared with unknown member '{other}'",
                    self.member.name
                ))
            })
    }

    fn guarded(
        &self,
        w: &mut CodeWriter,
        condition: &str,
        error_type: &str,
        message: &str,
    ) -> Result<(), CodegenError> {
        w.block(&format!("if ({condition})"), |w| {
            self.push(w, error_type, message);
            Ok(())
        })
    }

    fn write_rule(&self, rule: &ValidationRule, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let value = &self.value;
        let message = self.message(rule)?;
        let error_type = rule.error_type();

        match &rule.kind {
            RuleKind::Required => self.guarded(
                w,
                &empty_condition(value, RuleTarget::Unknown),
                error_type,
                &message,
            ),
            RuleKind::Range { .. } => {
                let Some((minimum, maximum)) = rule.effective_bounds() else {
                    return Ok(());
                };
                self.guarded(w, &format!("{value} < {}", format_number(minimum)), "min", &message)?;
                self.guarded(w, &format!("{value} > {}", format_number(maximum)), "max", &message)
            }
            RuleKind::StringLength { minimum, maximum } => {
                self.guarded(w, &format!("{value}.length > {maximum}"), "maxLength", &message)?;
                match minimum {
                    Some(minimum) => self.guarded(
                        w,
                        &format!("{value}.length < {minimum}"),
                        "minLength",
                        &message,
                    ),
                    None => Ok(()),
                }
            }
            RuleKind::RegularExpression { pattern } => {
                let anchored = single_quoted(&format!("^(?:{pattern})$"));
                self.guarded(
                    w,
                    &format!("!new RegExp({anchored}).test({value})"),
                    error_type,
                    &message,
                )
            }
            RuleKind::EmailAddress => {
                self.guarded(w, &format!("!{EMAIL_PATTERN}.test({value})"), error_type, &message)
            }
            RuleKind::Url => {
                self.guarded(w, &format!("!{URL_PATTERN}.test({value})"), error_type, &message)
            }
            RuleKind::Phone => {
                self.guarded(w, &format!("!{PHONE_PATTERN}.test({value})"), error_type, &message)
            }
            RuleKind::CreditCard => {
                w.writeln("if (!((card: string) => {");
                {
                    let _indent = w.indent();
                    write_luhn_body(w);
                }
                cw_writeln!(w, "}})(String({value}))) {{");
                {
                    let _indent = w.indent();
                    self.push(w, error_type, &message);
                }
                w.writeln("}");
                Ok(())
            }
            RuleKind::Compare { other } => {
                let other_name = self.scope.member_name(self.compare_target(other)?);
                self.guarded(
                    w,
                    &format!("{value} !== {}", property_access("values", &other_name)),
                    error_type,
                    &message,
                )
            }
            RuleKind::Custom { validator } => {
                let function = self.scope.import_alias(
                    &ImportSource::Library(validator.module.clone()),
                    &validator.function,
                )?;
                self.guarded(
                    w,
                    &format!("!{function}({value}, values)"),
                    error_type,
                    &message,
                )
            }
        }
    }
}

fn write_luhn_body(w: &mut CodeWriter) {
    w.writeln("const digits = card.replace(/[\\s-]/g, '');");
    w.writeln("if (!/^[0-9]+$/.test(digits)) {");
    {
        let _indent = w.indent();
        w.writeln("return false;");
    }
    w.writeln("}");
    w.writeln("let sum = 0;");
    w.writeln("for (let i = 0; i < digits.length; i++) {");
    {
        let _indent = w.indent();
        w.writeln("let digit = Number(digits[digits.length - 1 - i]);");
        w.writeln("if (i % 2 === 1) {");
        {
            let _indent = w.indent();
            w.writeln("digit = digit * 2 > 9 ? digit * 2 - 9 : digit * 2;");
        }
        w.writeln("}");
        w.writeln("sum += digit;");
    }
    w.writeln("}");
    w.writeln("return sum % 10 === 0;");
}

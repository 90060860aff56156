//! Validation rules attached to members.
//!
//! Rules are built from declarative host constraints by [`rules_from_constraints`]
//! and carry everything the resolver emitter needs: parameters, an optional
//! explicit message, the default message template and the error type tag.

use crate::error::ModelError;
use crate::metadata::{ConstraintKind, MemberDescriptor};

/// Data-type annotation that turns range bounds into fractions.
pub const PERCENTAGE_DATA_TYPE: &str = "Percentage";

/// Numeric interpretation of range bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOperand {
    /// Whole numbers.
    Integer,
    /// Floating point numbers.
    Double,
}

impl RangeOperand {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "int" | "Int32" | "System.Int32" | "long" | "Int64" | "System.Int64" => {
                Some(Self::Integer)
            }
            "double" | "Double" | "System.Double" | "decimal" | "Decimal" | "float" => {
                Some(Self::Double)
            }
            _ => None,
        }
    }
}

/// Reference to a user-supplied validator function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatorRef {
    /// Module the function is imported from.
    pub module: String,
    /// Exported function name.
    pub function: String,
}

impl ValidatorRef {
    /// Parses `module#function`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (module, function) = s.split_once('#')?;
        let (module, function) = (module.trim(), function.trim());
        if module.is_empty() || function.is_empty() {
            return None;
        }
        Some(Self {
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

/// Kind of a validation rule with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Value must be present.
    Required,
    /// Inclusive numeric range.
    Range {
        /// Lower bound as declared.
        minimum: f64,
        /// Upper bound as declared.
        maximum: f64,
        /// Operand type.
        operand: RangeOperand,
        /// Bounds are percentages and compare against fractions.
        percentage: bool,
    },
    /// Inclusive length bounds.
    StringLength {
        /// Minimum length.
        minimum: Option<usize>,
        /// Maximum length.
        maximum: usize,
    },
    /// Whole-value regular expression match.
    RegularExpression {
        /// Pattern.
        pattern: String,
    },
    /// Must equal another member.
    Compare {
        /// Other member name.
        other: String,
    },
    /// E-mail address.
    EmailAddress,
    /// Absolute URL.
    Url,
    /// Phone number.
    Phone,
    /// Credit card number.
    CreditCard,
    /// User-supplied validator.
    Custom {
        /// Function to call.
        validator: ValidatorRef,
    },
}

/// Shape of the member a rule is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    /// Text.
    Text,
    /// Number.
    Numeric,
    /// Boolean.
    Boolean,
    /// Date.
    Date,
    /// Enum.
    Enum,
    /// Collection.
    Collection,
    /// Class or interface.
    Object,
    /// Untyped.
    Unknown,
}

/// A validation rule with an optional explicit message.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    /// Kind and parameters.
    pub kind: RuleKind,
    /// Explicit message template overriding the default.
    pub message: Option<String>,
}

impl ValidationRule {
    /// Creates a rule with the default message.
    #[must_use]
    pub const fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Sets the explicit message template.
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Returns true for the required rule.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self.kind, RuleKind::Required)
    }

    /// Returns true if the rule can be checked against a member of `target`.
    #[must_use]
    pub const fn is_applicable(&self, target: RuleTarget) -> bool {
        if matches!(target, RuleTarget::Unknown) {
            return true;
        }
        match self.kind {
            RuleKind::Required | RuleKind::Compare { .. } | RuleKind::Custom { .. } => true,
            RuleKind::Range { .. } => matches!(target, RuleTarget::Numeric),
            RuleKind::StringLength { .. }
            | RuleKind::RegularExpression { .. }
            | RuleKind::EmailAddress
            | RuleKind::Url
            | RuleKind::Phone
            | RuleKind::CreditCard => matches!(target, RuleTarget::Text),
        }
    }

    /// Returns the error type tag reported to the form library.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self.kind {
            RuleKind::Required => "required",
            RuleKind::Range { .. } => "min",
            RuleKind::StringLength { .. } => "maxLength",
            RuleKind::RegularExpression { .. }
            | RuleKind::EmailAddress
            | RuleKind::Url
            | RuleKind::Phone
            | RuleKind::CreditCard => "pattern",
            RuleKind::Compare { .. } | RuleKind::Custom { .. } => "validate",
        }
    }

    /// Returns the default message template.
    ///
    /// `{0}` is the member display name; `{1}` and `{2}` are rule parameters.
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self.kind {
            RuleKind::Required => "The {0} field is required.",
            RuleKind::Range { .. } => "The field {0} must be between {1} and {2}.",
            RuleKind::StringLength { minimum: None, .. } => {
                "The field {0} must be a string with a maximum length of {1}."
            }
            RuleKind::StringLength {
                minimum: Some(_), ..
            } => {
                "The field {0} must be a string with a minimum length of {2} and a maximum length of {1}."
            }
            RuleKind::RegularExpression { .. } => {
                "The field {0} must match the regular expression '{1}'."
            }
            RuleKind::Compare { .. } => "'{0}' and '{1}' do not match.",
            RuleKind::EmailAddress => "The {0} field is not a valid e-mail address.",
            RuleKind::Url => {
                "The {0} field is not a valid fully-qualified http, https, or ftp URL."
            }
            RuleKind::Phone => "The {0} field is not a valid phone number.",
            RuleKind::CreditCard => "The {0} field is not a valid credit card number.",
            RuleKind::Custom { .. } => "{0} is not valid.",
        }
    }

    /// Returns the bounds compared at runtime.
    ///
    /// Percentage ranges are scaled to fractions.
    #[must_use]
    pub fn effective_bounds(&self) -> Option<(f64, f64)> {
        match self.kind {
            RuleKind::Range {
                minimum,
                maximum,
                percentage,
                ..
            } => {
                if percentage {
                    Some((minimum / 100.0, maximum / 100.0))
                } else {
                    Some((minimum, maximum))
                }
            }
            _ => None,
        }
    }

    /// Renders the error message for a member.
    ///
    /// # Arguments
    /// * `display_name` - Display name of the validated member
    /// * `other_display_name` - Display name of the compared member, for compare rules
    #[must_use]
    pub fn render_message(&self, display_name: &str, other_display_name: Option<&str>) -> String {
        let template = self
            .message
            .as_deref()
            .unwrap_or_else(|| self.default_message());

        let args: Vec<String> = match &self.kind {
            RuleKind::Range {
                minimum, maximum, ..
            } => vec![format_number(*minimum), format_number(*maximum)],
            RuleKind::StringLength { minimum, maximum } => vec![
                maximum.to_string(),
                minimum.map(|m| m.to_string()).unwrap_or_default(),
            ],
            RuleKind::RegularExpression { pattern } => vec![pattern.clone()],
            RuleKind::Compare { other } => {
                vec![other_display_name.unwrap_or(other).to_string()]
            }
            _ => Vec::new(),
        };

        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(display_name);
        all.extend(args.iter().map(String::as_str));
        format_message(template, &all)
    }
}

/// Substitutes `{n}` placeholders with positional arguments.
///
/// Unknown placeholders are left untouched.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Formats a bound without a trailing `.0` for whole numbers.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Builds the validation rules for a member from its declarative constraints.
///
/// Rules keep declaration order. A required constraint and a required
/// serialization flag collapse into a single required rule.
///
/// # Errors
/// Returns `ModelError::InvalidConstraint` if a constraint parameter cannot be
/// interpreted.
pub fn rules_from_constraints(
    member: &MemberDescriptor,
) -> Result<Vec<ValidationRule>, ModelError> {
    let percentage = member
        .data_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case(PERCENTAGE_DATA_TYPE));

    let mut rules: Vec<ValidationRule> = Vec::with_capacity(member.constraints.len());
    for constraint in &member.constraints {
        let kind = match &constraint.kind {
            ConstraintKind::Required | ConstraintKind::DataMemberRequired => {
                if rules.iter().any(ValidationRule::is_required) {
                    continue;
                }
                RuleKind::Required
            }
            ConstraintKind::Range {
                minimum,
                maximum,
                operand,
            } => {
                let operand = match operand.as_deref() {
                    None => RangeOperand::Double,
                    Some(raw) => RangeOperand::parse(raw).ok_or_else(|| {
                        ModelError::constraint(
                            &member.name,
                            format!("unsupported range operand '{raw}'"),
                        )
                    })?,
                };
                let minimum = parse_bound(&member.name, "minimum", minimum)?;
                let maximum = parse_bound(&member.name, "maximum", maximum)?;
                if minimum > maximum {
                    return Err(ModelError::constraint(
                        &member.name,
                        "range minimum exceeds maximum",
                    ));
                }
                RuleKind::Range {
                    minimum,
                    maximum,
                    operand,
                    percentage,
                }
            }
            ConstraintKind::StringLength { minimum, maximum } => {
                let maximum = parse_length(&member.name, "maximum", maximum)?;
                let minimum = minimum
                    .as_deref()
                    .map(|raw| parse_length(&member.name, "minimum", raw))
                    .transpose()?
                    .filter(|&m| m > 0);
                RuleKind::StringLength { minimum, maximum }
            }
            ConstraintKind::RegularExpression { pattern } => RuleKind::RegularExpression {
                pattern: pattern.clone(),
            },
            ConstraintKind::Compare { other } => RuleKind::Compare {
                other: other.clone(),
            },
            ConstraintKind::EmailAddress => RuleKind::EmailAddress,
            ConstraintKind::Url => RuleKind::Url,
            ConstraintKind::Phone => RuleKind::Phone,
            ConstraintKind::CreditCard => RuleKind::CreditCard,
            ConstraintKind::Custom { validator } => RuleKind::Custom {
                validator: ValidatorRef::parse(validator).ok_or_else(|| {
                    ModelError::constraint(
                        &member.name,
                        format!("validator '{validator}' is not of the form module#function"),
                    )
                })?,
            },
        };
        rules.push(ValidationRule::new(kind).with_message(constraint.message.clone()));
    }
    Ok(rules)
}

fn parse_bound(member: &str, which: &str, raw: &str) -> Result<f64, ModelError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModelError::constraint(member, format!("invalid range {which} '{raw}'")))
}

fn parse_length(member: &str, which: &str, raw: &str) -> Result<usize, ModelError> {
    raw.trim().parse::<usize>().map_err(|_| {
        ModelError::constraint(member, format!("invalid string length {which} '{raw}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Constraint, MemberKind, TypeRef};

    fn member_with(constraints: Vec<Constraint>) -> MemberDescriptor {
        let mut member = MemberDescriptor::new("Age", MemberKind::Property, TypeRef::named("int"));
        member.constraints = constraints;
        member
    }

    #[test]
    fn test_format_message() {
        assert_eq!(
            format_message("The field {0} must be between {1} and {2}.", &["Age", "0", "5"]),
            "The field Age must be between 0 and 5."
        );
        assert_eq!(format_message("{0} and {3}", &["A"]), "A and {3}");
        assert_eq!(format_message("{x}", &["A"]), "{x}");
    }

    #[test]
    fn test_range_default_message() {
        let rule = ValidationRule::new(RuleKind::Range {
            minimum: 0.0,
            maximum: 150.0,
            operand: RangeOperand::Integer,
            percentage: false,
        });
        assert_eq!(
            rule.render_message("Age", None),
            "The field Age must be between 0 and 150."
        );
        assert_eq!(rule.error_type(), "min");
    }

    #[test]
    fn test_string_length_messages() {
        let max_only = ValidationRule::new(RuleKind::StringLength {
            minimum: None,
            maximum: 50,
        });
        assert_eq!(
            max_only.render_message("Name", None),
            "The field Name must be a string with a maximum length of 50."
        );

        let both = ValidationRule::new(RuleKind::StringLength {
            minimum: Some(2),
            maximum: 50,
        });
        assert_eq!(
            both.render_message("Name", None),
            "The field Name must be a string with a minimum length of 2 and a maximum length of 50."
        );
    }

    #[test]
    fn test_explicit_message_wins() {
        let rule = ValidationRule::new(RuleKind::Required)
            .with_message(Some("Please enter {0}".to_string()));
        assert_eq!(rule.render_message("Email", None), "Please enter Email");
    }

    #[test]
    fn test_compare_uses_other_display_name() {
        let rule = ValidationRule::new(RuleKind::Compare {
            other: "Password".to_string(),
        });
        assert_eq!(
            rule.render_message("Confirm", Some("Your password")),
            "'Confirm' and 'Your password' do not match."
        );
    }

    #[test]
    fn test_applicability() {
        let range = ValidationRule::new(RuleKind::Range {
            minimum: 0.0,
            maximum: 1.0,
            operand: RangeOperand::Double,
            percentage: false,
        });
        assert!(range.is_applicable(RuleTarget::Numeric));
        assert!(!range.is_applicable(RuleTarget::Text));
        assert!(range.is_applicable(RuleTarget::Unknown));

        let email = ValidationRule::new(RuleKind::EmailAddress);
        assert!(email.is_applicable(RuleTarget::Text));
        assert!(!email.is_applicable(RuleTarget::Boolean));

        assert!(ValidationRule::new(RuleKind::Required).is_applicable(RuleTarget::Enum));
    }

    #[test]
    fn test_percentage_bounds_are_scaled() {
        let mut member = member_with(vec![Constraint::new(ConstraintKind::Range {
            minimum: "0".to_string(),
            maximum: "50".to_string(),
            operand: Some("double".to_string()),
        })]);
        member.data_type = Some("Percentage".to_string());

        let rules = rules_from_constraints(&member).expect("Failed to build rules");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].effective_bounds(), Some((0.0, 0.5)));
        assert_eq!(
            rules[0].render_message("Rate", None),
            "The field Rate must be between 0 and 50."
        );
    }

    #[test]
    fn test_required_collapses() {
        let member = member_with(vec![
            Constraint::new(ConstraintKind::Required),
            Constraint::new(ConstraintKind::DataMemberRequired),
        ]);
        let rules = rules_from_constraints(&member).expect("Failed to build rules");
        assert_eq!(rules.len(), 1);
        assert!(rules[0].is_required());
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let member = member_with(vec![Constraint::new(ConstraintKind::Range {
            minimum: "abc".to_string(),
            maximum: "10".to_string(),
            operand: None,
        })]);
        let err = rules_from_constraints(&member).expect_err("Expected invalid range");
        assert!(matches!(err, ModelError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_custom_validator_reference() {
        let member = member_with(vec![Constraint::new(ConstraintKind::Custom {
            validator: "./validators#isAdult".to_string(),
        })]);
        let rules = rules_from_constraints(&member).expect("Failed to build rules");
        assert_eq!(
            rules[0].kind,
            RuleKind::Custom {
                validator: ValidatorRef {
                    module: "./validators".to_string(),
                    function: "isAdult".to_string(),
                }
            }
        );

        let bad = member_with(vec![Constraint::new(ConstraintKind::Custom {
            validator: "isAdult".to_string(),
        })]);
        assert!(rules_from_constraints(&bad).is_err());
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let member = member_with(vec![
            Constraint::new(ConstraintKind::StringLength {
                minimum: None,
                maximum: "10".to_string(),
            }),
            Constraint::new(ConstraintKind::Required),
            Constraint::new(ConstraintKind::EmailAddress),
        ]);
        let rules = rules_from_constraints(&member).expect("Failed to build rules");
        let tags: Vec<&str> = rules.iter().map(ValidationRule::error_type).collect();
        assert_eq!(tags, vec!["maxLength", "required", "pattern"]);
    }
}

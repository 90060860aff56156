//! Generator configuration.

use crate::error::CodegenError;
use std::fmt;
use std::str::FromStr;
use tsgen_model::MemberFilter;

/// Width of the form grid in columns.
pub const GRID_WIDTH: usize = 12;

/// Longest accepted modal title.
pub const MAX_MODAL_TITLE_LEN: usize = 256;

const FORM_DIRECTIVE: &str = "withform(";

const FORM_DIRECTIVE_HELP: &str = "expected withform(<column count>[,<modal title>]) with a column count of 1 to 12 and a title of at most 256 characters";

/// Grid layout of generated forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLayout {
    columns: usize,
    modal_title: Option<String>,
}

impl FormLayout {
    /// Creates a layout with `columns` columns per row.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` if `columns` is not in `1..=12`.
    pub fn new(columns: usize) -> Result<Self, CodegenError> {
        if columns == 0 || columns > GRID_WIDTH {
            return Err(CodegenError::config(format!(
                "column count {columns} is outside 1..={GRID_WIDTH}"
            )));
        }
        Ok(Self {
            columns,
            modal_title: None,
        })
    }

    /// Wraps the form in a modal dialog with the given title.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` if the title is longer than 256 characters.
    pub fn with_modal_title(mut self, title: impl Into<String>) -> Result<Self, CodegenError> {
        let title = title.into();
        if title.chars().count() > MAX_MODAL_TITLE_LEN {
            return Err(CodegenError::config(format!(
                "modal title exceeds {MAX_MODAL_TITLE_LEN} characters"
            )));
        }
        self.modal_title = Some(title);
        Ok(self)
    }

    /// Returns the number of columns per row.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the modal title, if the form is wrapped in a modal.
    #[must_use]
    pub fn modal_title(&self) -> Option<&str> {
        self.modal_title.as_deref()
    }

    /// Returns the default cell width.
    #[must_use]
    pub const fn average_width(&self) -> usize {
        GRID_WIDTH / self.columns
    }

    /// Returns the width of each column; the last one absorbs the remainder.
    #[must_use]
    pub fn column_widths(&self) -> Vec<usize> {
        let average = self.average_width();
        let mut widths = vec![average; self.columns];
        if let Some(last) = widths.last_mut() {
            *last += GRID_WIDTH % self.columns;
        }
        widths
    }

    fn validate(&self) -> Result<(), CodegenError> {
        let checked = Self::new(self.columns)?;
        match &self.modal_title {
            Some(title) => checked.with_modal_title(title.clone()).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// Which emitter layers run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeneratorLayer {
    /// Type declarations only.
    #[default]
    Plain,
    /// Declarations plus a resolver per class.
    Resolver,
    /// Declarations, resolvers and a form component per class.
    Form(FormLayout),
}

impl FromStr for GeneratorLayer {
    type Err = CodegenError;

    /// Parses `plain`, `withresolver` or `withform(<cols>[,<title>])`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let directive = s.trim();
        let lowered = directive.to_ascii_lowercase();
        if lowered.is_empty() || lowered == "plain" {
            return Ok(Self::Plain);
        }
        if lowered == "withresolver" {
            return Ok(Self::Resolver);
        }
        if !lowered.starts_with(FORM_DIRECTIVE) {
            return Err(CodegenError::config(format!(
                "unknown generator directive '{directive}'"
            )));
        }

        let Some(arguments) = directive[FORM_DIRECTIVE.len()..].strip_suffix(')') else {
            return Err(CodegenError::config(format!(
                "malformed directive '{directive}': {FORM_DIRECTIVE_HELP}"
            )));
        };

        let (columns, title) = match arguments.split_once(',') {
            Some((columns, title)) => (columns.trim(), Some(title.trim())),
            None => (arguments.trim(), None),
        };

        let columns: usize = columns.parse().map_err(|_| {
            CodegenError::config(format!(
                "malformed directive '{directive}': {FORM_DIRECTIVE_HELP}"
            ))
        })?;

        let layout = FormLayout::new(columns)?;
        let layout = match title {
            Some(title) if !title.is_empty() => layout.with_modal_title(title)?,
            _ => layout,
        };
        Ok(Self::Form(layout))
    }
}

impl fmt::Display for GeneratorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Resolver => f.write_str("withresolver"),
            Self::Form(layout) => match layout.modal_title() {
                Some(title) => write!(f, "withform({},{})", layout.columns(), title),
                None => write!(f, "withform({})", layout.columns()),
            },
        }
    }
}

/// Options controlling TypeScript generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Wrap each module in `export namespace <Module> { ... }`.
    pub enable_namespace: bool,
    /// Emit properties.
    pub emit_properties: bool,
    /// Emit fields.
    pub emit_fields: bool,
    /// Convert member names to camelCase.
    pub camel_case: bool,
    /// Emitter layers.
    pub layer: GeneratorLayer,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            enable_namespace: false,
            emit_properties: true,
            emit_fields: false,
            camel_case: true,
            layer: GeneratorLayer::Plain,
        }
    }
}

impl GeneratorOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets namespace wrapping.
    #[must_use]
    pub const fn with_namespace(mut self, enable: bool) -> Self {
        self.enable_namespace = enable;
        self
    }

    /// Sets which member categories are emitted.
    #[must_use]
    pub const fn with_members(mut self, properties: bool, fields: bool) -> Self {
        self.emit_properties = properties;
        self.emit_fields = fields;
        self
    }

    /// Sets camelCase member naming.
    #[must_use]
    pub const fn with_camel_case(mut self, camel_case: bool) -> Self {
        self.camel_case = camel_case;
        self
    }

    /// Sets the emitter layers.
    #[must_use]
    pub fn with_layer(mut self, layer: GeneratorLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Returns the member filter implied by the enabled categories.
    #[must_use]
    pub const fn member_filter(&self) -> MemberFilter {
        MemberFilter {
            properties: self.emit_properties,
            fields: self.emit_fields,
        }
    }

    /// Checks the options before any emission starts.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` describing the first invalid setting.
    pub fn validate(&self) -> Result<(), CodegenError> {
        if let GeneratorLayer::Form(layout) = &self.layer {
            layout.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            "plain".parse::<GeneratorLayer>().expect("Failed to parse"),
            GeneratorLayer::Plain
        );
        assert_eq!(
            "WithResolver".parse::<GeneratorLayer>().expect("Failed to parse"),
            GeneratorLayer::Resolver
        );

        let GeneratorLayer::Form(layout) = "withForm(4)".parse().expect("Failed to parse") else {
            panic!("expected form layer");
        };
        assert_eq!(layout.columns(), 4);
        assert_eq!(layout.modal_title(), None);

        let GeneratorLayer::Form(layout) = "withform(3, Edit person)"
            .parse()
            .expect("Failed to parse")
        else {
            panic!("expected form layer");
        };
        assert_eq!(layout.columns(), 3);
        assert_eq!(layout.modal_title(), Some("Edit person"));
    }

    #[test]
    fn test_parse_rejects_bad_directives() {
        for directive in ["withform(0)", "withform(13)", "withform(x)", "withform(4", "bogus"] {
            let err = directive
                .parse::<GeneratorLayer>()
                .expect_err("Expected config error");
            assert!(matches!(err, CodegenError::Config { .. }), "{directive}");
        }

        let long = format!("withform(2,{})", "t".repeat(257));
        assert!(long.parse::<GeneratorLayer>().is_err());
    }

    #[test]
    fn test_column_widths() {
        let widths = FormLayout::new(5).expect("valid").column_widths();
        assert_eq!(widths, vec![2, 2, 2, 2, 4]);
        assert_eq!(widths.iter().sum::<usize>(), GRID_WIDTH);

        assert_eq!(FormLayout::new(4).expect("valid").column_widths(), vec![3; 4]);
        assert_eq!(FormLayout::new(1).expect("valid").column_widths(), vec![12]);
    }

    #[test]
    fn test_layer_display_round_trip() {
        let layer: GeneratorLayer = "withform(6,Title)".parse().expect("Failed to parse");
        assert_eq!(layer.to_string(), "withform(6,Title)");
    }

    #[test]
    fn test_default_options() {
        let options = GeneratorOptions::default();
        assert!(options.emit_properties);
        assert!(!options.emit_fields);
        assert!(options.camel_case);
        assert!(!options.enable_namespace);
        assert_eq!(options.layer, GeneratorLayer::Plain);
        assert!(options.validate().is_ok());
    }
}

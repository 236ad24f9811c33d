//! Sectioned configuration files.
//!
//! ```text
//! # comments like this
//! [size]
//! width = 17
//! height = 42
//! ```
//!
//! Blank lines are ignored, as is whitespace around the `=` and at either end
//! of a line. Sections and their keys are declared before parsing; each key is
//! bound to a `String` that receives the value. Referencing an undeclared
//! section or key is an error.

use std::{collections::HashMap, io::BufRead};

/// Configuration parse error.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{line}: Unknown config section [{section}]")]
    UnknownSection { line: usize, section: String },
    #[error("{line}: Invalid Assignment")]
    InvalidAssignment { line: usize },
    #[error("{line}: No section specified")]
    NoSection { line: usize },
    #[error("{line}: Section [{section}] has no variable '{key}'")]
    UnknownKey {
        line: usize,
        section: String,
        key: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Line number (1-based) the error refers to, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::UnknownSection { line, .. }
            | Self::InvalidAssignment { line }
            | Self::NoSection { line }
            | Self::UnknownKey { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }
}

type Fields<'a> = HashMap<String, &'a mut String>;

/// Declared config schema.
///
/// ```
/// use sidgate_core::Configuration;
///
/// let (mut width, mut height) = (String::new(), String::new());
/// let mut cfg = Configuration::new();
/// cfg.section("size").bind("width", &mut width).bind("height", &mut height);
/// cfg.parse_str("[size]\nwidth = 17\nheight = 42\n").unwrap();
/// assert_eq!(width, "17");
/// ```
#[derive(Default)]
pub struct Configuration<'a> {
    sections: HashMap<String, Fields<'a>>,
}

/// Builder for the keys of a single section.
pub struct SectionBuilder<'c, 'a> {
    fields: &'c mut Fields<'a>,
}

impl<'a> SectionBuilder<'_, 'a> {
    /// Bind `key` to `target`.
    pub fn bind(&mut self, key: impl Into<String>, target: &'a mut String) -> &mut Self {
        self.fields.insert(key.into(), target);
        self
    }
}

impl<'a> Configuration<'a> {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a section, or reopen one declared earlier.
    pub fn section(&mut self, name: impl Into<String>) -> SectionBuilder<'_, 'a> {
        SectionBuilder {
            fields: self.sections.entry(name.into()).or_default(),
        }
    }

    /// Parse a config file, storing values into the bound targets.
    ///
    /// # Errors
    /// Returns error on the first malformed line or I/O failure. Targets
    /// assigned before the failing line keep their new values.
    pub fn parse<R: BufRead>(mut self, reader: R) -> Result<(), ParseError> {
        let mut active: Option<String> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                let name = name.trim();
                if !self.sections.contains_key(name) {
                    return Err(ParseError::UnknownSection {
                        line: line_no,
                        section: name.to_string(),
                    });
                }
                active = Some(name.to_string());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ParseError::InvalidAssignment { line: line_no });
            };
            let Some(section) = active.as_deref() else {
                return Err(ParseError::NoSection { line: line_no });
            };
            let key = key.trim();

            let target = self
                .sections
                .get_mut(section)
                .and_then(|fields| fields.get_mut(key))
                .ok_or_else(|| ParseError::UnknownKey {
                    line: line_no,
                    section: section.to_string(),
                    key: key.to_string(),
                })?;
            **target = value.trim().to_string();
        }

        Ok(())
    }

    /// Parse config text held in memory.
    ///
    /// # Errors
    /// See [`Configuration::parse`].
    pub fn parse_str(self, text: &str) -> Result<(), ParseError> {
        self.parse(text.as_bytes())
    }
}

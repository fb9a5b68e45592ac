use crate::error::{FormatError, ParseWarning};
use crate::lexer::{Line, LineScanner, Token};
use miette::{NamedSource, SourceSpan};
use regex::Regex;
use std::sync::{Arc, OnceLock};

fn version_pattern() -> &'static Regex {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    VERSION.get_or_init(|| Regex::new(r"^V(\d+(?:\.\d+)?)$").expect("version pattern is valid"))
}

/// Line-oriented cursor shared by the GeoCast and GeoScene grammars.
///
/// Every `expect_*` helper reads the next significant line and turns a
/// mismatch into a [`FormatError`] pointing at the offending line or token.
/// Unknown lines are recorded as [`ParseWarning`]s instead.
#[derive(Debug)]
pub(crate) struct LineParser<'a> {
    source: Arc<NamedSource<String>>,
    scanner: LineScanner<'a>,
    warnings: Vec<ParseWarning>,
}

impl<'a> LineParser<'a> {
    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        Self {
            source: Arc::new(NamedSource::new(name, source_text.to_string())),
            scanner: LineScanner::new(source_text),
            warnings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }

    pub fn peek_tag(&mut self) -> Option<&'a str> {
        self.scanner.peek_tag()
    }

    pub fn peek_line(&mut self) -> Option<Line<'a>> {
        self.scanner.peek_line()
    }

    pub fn next_line(&mut self) -> Option<Line<'a>> {
        self.scanner.consume_line()
    }

    /// Consumes the next significant line, whatever it holds.
    pub fn expect_line(&mut self, expected: &str) -> Result<Line<'a>, FormatError> {
        match self.scanner.consume_line() {
            Some(line) => Ok(line),
            None => Err(self.err_eof(expected)),
        }
    }

    /// Consumes the next significant line, which must start with `tag`.
    pub fn expect_tag(&mut self, tag: &str) -> Result<Line<'a>, FormatError> {
        let line = self.peek_line().ok_or_else(|| self.err_eof(tag))?;
        if line.tag() != Some(tag) {
            return Err(self.err_unexpected(&line, tag));
        }
        self.scanner.consume_line();
        Ok(line)
    }

    /// Reads a `<magic> V<major>.<minor>` signature and returns the version.
    pub fn expect_signature(&mut self, magic: &str) -> Result<String, FormatError> {
        let line = self.peek_line().ok_or_else(|| self.err_eof(magic))?;
        let version = match (line.tag(), line.token(1)) {
            (Some(tag), Some(token)) if tag == magic => version_pattern()
                .captures(token.text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            _ => None,
        };
        match version {
            Some(version) => {
                self.scanner.consume_line();
                Ok(version)
            }
            None => Err(FormatError::BadSignature {
                src: self.src(),
                span: span_of(&line),
                expected: magic.to_string(),
                line: line.number,
            }),
        }
    }

    /// Checks a fixed label inside a line, e.g. the `FODAngle` of `ViewSlice`.
    pub fn expect_label(
        &self,
        line: &Line<'a>,
        index: usize,
        accepted: &[&str],
        construct: &str,
    ) -> Result<(), FormatError> {
        let token = self.token(line, index, accepted.join(" or ").as_str())?;
        if accepted.contains(&token.text) {
            return Ok(());
        }
        Err(FormatError::UnrecognizedTag {
            src: self.src(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            construct: construct.to_string(),
            expected: accepted.join(" or "),
            found: token.text.to_string(),
            line: line.number,
        })
    }

    pub fn word(&self, line: &Line<'a>, index: usize, field: &str) -> Result<&'a str, FormatError> {
        self.token(line, index, field).map(|t| t.text)
    }

    pub fn number(&self, line: &Line<'a>, index: usize, field: &str) -> Result<f64, FormatError> {
        let token = self.token(line, index, field)?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| self.err_number(line, index, field))
    }

    pub fn integer(&self, line: &Line<'a>, index: usize, field: &str) -> Result<i64, FormatError> {
        let token = self.token(line, index, field)?;
        token
            .text
            .parse::<i64>()
            .map_err(|_| self.err_number(line, index, field))
    }

    pub fn warn(&mut self, warning: ParseWarning) {
        log::debug!("[{}] {}", self.source.name(), warning);
        self.warnings.push(warning);
    }

    pub fn warn_unrecognized(&mut self, line: &Line<'a>, context: &'static str) {
        self.warn(ParseWarning::UnrecognizedLine {
            context,
            line: line.number,
            text: line.text.trim().to_string(),
        });
    }

    fn token<'l>(
        &self,
        line: &'l Line<'a>,
        index: usize,
        field: &str,
    ) -> Result<&'l Token<'a>, FormatError> {
        line.token(index).ok_or_else(|| FormatError::MissingField {
            src: self.src(),
            span: (line.pos_end, 0).into(),
            field: field.to_string(),
            line: line.number,
        })
    }

    pub fn src(&self) -> NamedSource<String> {
        (*self.source).clone()
    }

    pub fn err_unexpected(&self, line: &Line<'a>, expected: &str) -> FormatError {
        FormatError::UnexpectedTag {
            src: self.src(),
            span: span_of(line),
            expected: expected.to_string(),
            found: line.tag().unwrap_or_default().to_string(),
            line: line.number,
        }
    }

    fn err_number(&self, line: &Line<'a>, index: usize, field: &str) -> FormatError {
        let (span, found): (SourceSpan, String) = match line.token(index) {
            Some(t) => ((t.pos_start, t.pos_end - t.pos_start).into(), t.text.to_string()),
            None => (span_of(line), String::new()),
        };
        FormatError::InvalidNumber {
            src: self.src(),
            span,
            field: field.to_string(),
            found,
            line: line.number,
        }
    }

    pub fn err_eof(&self, expected: &str) -> FormatError {
        let pos = self.scanner.end_offset();
        FormatError::UnexpectedEof {
            src: self.src(),
            span: (pos, 0).into(),
            expected: expected.to_string(),
        }
    }
}

pub(crate) fn span_of(line: &Line<'_>) -> SourceSpan {
    (line.pos_start, line.pos_end - line.pos_start).into()
}

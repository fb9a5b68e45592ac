use crate::ast::{CollectionKind, SlotCoordinate};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum GeoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Slot(#[from] SlotError),
}

/// A structural problem that stops the current document from being read.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum FormatError {
    #[error("Invalid signature on line {line}, expected `{expected} V<major>.<minor>`")]
    #[diagnostic(
        code(format::bad_signature),
        help("The first significant line names the document kind and its version, e.g. `GeoCast V1.0`.")
    )]
    BadSignature {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected the {expected} signature here")]
        span: SourceSpan,
        expected: String,
        line: usize,
    },

    #[error("Expected `{expected}` on line {line}, found `{found}`")]
    #[diagnostic(
        code(format::unexpected_tag),
        help("Required lines appear in a fixed order; this line is out of place or misspelled.")
    )]
    UnexpectedTag {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}")]
        span: SourceSpan,
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Unrecognized {construct} tag `{found}` on line {line}, expected `{expected}`")]
    #[diagnostic(
        code(format::unrecognized_tag),
        help("Field labels inside a line are fixed literals at fixed positions.")
    )]
    UnrecognizedTag {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}")]
        span: SourceSpan,
        construct: String,
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Line {line} is missing the {field} field")]
    #[diagnostic(code(format::missing_field))]
    MissingField {
        #[source_code]
        src: NamedSource<String>,
        #[label("{field} should follow here")]
        span: SourceSpan,
        field: String,
        line: usize,
    },

    #[error("Invalid {field} `{found}` on line {line}")]
    #[diagnostic(code(format::invalid_number), help("Expected a decimal number."))]
    InvalidNumber {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a valid {field}")]
        span: SourceSpan,
        field: String,
        found: String,
        line: usize,
    },

    #[error("Unexpected end of document, expected `{expected}`")]
    #[diagnostic(
        code(format::unexpected_eof),
        help("The document ended before all required lines were read.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("Document ended here")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Sequence on line {line} starts at {start}, after its end {end}")]
    #[diagnostic(code(format::invalid_sequence))]
    InvalidSequence {
        #[source_code]
        src: NamedSource<String>,
        #[label("Start must not exceed end")]
        span: SourceSpan,
        start: i64,
        end: i64,
        line: usize,
    },

    #[error("Sequence on line {line} spans {start}..={end}, more than {limit} frames")]
    #[diagnostic(
        code(format::sequence_too_long),
        help("Every frame gets its own image path and camera slot; raise the parser's frame limit if this range is intended.")
    )]
    SequenceTooLong {
        #[source_code]
        src: NamedSource<String>,
        #[label("Too many frames")]
        span: SourceSpan,
        start: i64,
        end: i64,
        limit: usize,
        line: usize,
    },
}

/// Raised by a [`crate::resolver::CastFetcher`] when a document cannot be
/// retrieved. The slot that asked for it stays pending.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("Failed to fetch `{path}`: {reason}")]
#[diagnostic(
    code(fetch::failed),
    help("Fetches are not retried; wrap the fetcher to add a retry policy.")
)]
pub struct FetchError {
    pub path: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SlotError {
    #[error("Camera slot {coordinate} is already resolved")]
    #[diagnostic(code(slot::already_resolved))]
    AlreadyResolved { coordinate: SlotCoordinate },

    #[error("Camera slot {coordinate} does not exist")]
    #[diagnostic(code(slot::out_of_range))]
    OutOfRange { coordinate: SlotCoordinate },
}

/// Something odd but harmless found while parsing. Reading continues.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ParseWarning {
    #[error("Skipped unrecognized line {line} in {context}: `{text}`")]
    #[diagnostic(code(warning::unrecognized_line), severity(Warning))]
    UnrecognizedLine {
        context: &'static str,
        line: usize,
        text: String,
    },

    #[error("Unsupported projection `{kind}` on line {line}, the rest of the document was not read")]
    #[diagnostic(
        code(warning::unsupported_projection),
        severity(Warning),
        help("Known projections are `Ortho` and `Perspective`.")
    )]
    UnsupportedProjection { kind: String, line: usize },

    #[error("Match group {group} names unknown {collection} `{name}`")]
    #[diagnostic(code(warning::unknown_match_name), severity(Warning))]
    UnknownMatchName {
        group: i64,
        collection: CollectionKind,
        name: String,
    },
}

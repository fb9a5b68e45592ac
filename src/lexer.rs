/// A whitespace-delimited word on a line, with its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl<'a> Token<'a> {
    pub fn new(text: &'a str, pos_start: usize, pos_end: usize) -> Token<'a> {
        Token {
            text,
            pos_start,
            pos_end,
        }
    }
}

/// One significant line of a GeoScene or GeoCast document.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<'a> {
    /// 1-based line number, used in diagnostics.
    pub number: usize,
    /// The line without its terminator (`\n` or `\r\n`).
    pub text: &'a str,
    pub pos_start: usize,
    pub pos_end: usize,
    pub tokens: Vec<Token<'a>>,
}

impl<'a> Line<'a> {
    fn new(number: usize, text: &'a str, pos_start: usize) -> Line<'a> {
        Line {
            number,
            text,
            pos_start,
            pos_end: pos_start + text.len(),
            tokens: tokenize(text, pos_start),
        }
    }

    /// The leading word of the line, which names the construct it starts.
    pub fn tag(&self) -> Option<&'a str> {
        self.tokens.first().map(|t| t.text)
    }

    pub fn token(&self, index: usize) -> Option<&Token<'a>> {
        self.tokens.get(index)
    }
}

/// Returns true for lines that carry no content: empty, whitespace only,
/// or a `#` comment.
pub fn is_blank(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Skips forward from `index` past blank and comment lines.
///
/// Returns `index` unchanged when it already points at content or lies
/// outside `lines`.
pub fn advance_past_blank(lines: &[&str], mut index: usize) -> usize {
    while index < lines.len() && is_blank(lines[index]) {
        index += 1;
    }
    index
}

fn tokenize(text: &str, offset: usize) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token::new(&text[s..i], offset + s, offset + i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token::new(&text[s..], offset + s, offset + text.len()));
    }
    tokens
}

/// Cursor over the lines of a document.
///
/// Blank and comment lines are never returned. `peek_line` looks at the next
/// significant line without consuming it, so a nested block can end on a line
/// it does not recognize and leave that line for the enclosing loop.
#[derive(Debug)]
pub struct LineScanner<'a> {
    input: &'a str,
    lines: Vec<&'a str>,
    offsets: Vec<usize>,
    position: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut offsets = Vec::new();
        let mut offset = 0;
        for raw in input.split_inclusive('\n') {
            lines.push(raw.trim_end_matches('\n').trim_end_matches('\r'));
            offsets.push(offset);
            offset += raw.len();
        }
        Self {
            input,
            lines,
            offsets,
            position: 0,
        }
    }

    /// Index of the next physical line to be examined.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte offset one past the end of the input, for end-of-file spans.
    pub fn end_offset(&self) -> usize {
        self.input.len()
    }

    pub fn is_at_end(&mut self) -> bool {
        self.skip_blank();
        self.position >= self.lines.len()
    }

    pub fn peek_line(&mut self) -> Option<Line<'a>> {
        self.skip_blank();
        self.lines
            .get(self.position)
            .copied()
            .map(|text| Line::new(self.position + 1, text, self.offsets[self.position]))
    }

    pub fn peek_tag(&mut self) -> Option<&'a str> {
        self.skip_blank();
        self.lines
            .get(self.position)
            .copied()
            .and_then(|text| text.split_whitespace().next())
    }

    pub fn consume_line(&mut self) -> Option<Line<'a>> {
        let line = self.peek_line()?;
        self.position += 1;
        Some(line)
    }

    fn skip_blank(&mut self) {
        self.position = advance_past_blank(&self.lines, self.position);
    }
}

//! The scanner: text to tokens, trivia, and indentation flags.
//!
//! One `scan()` call advances past leading whitespace and trivia, sets
//! the token accessors, and returns the token kind. Indentation is
//! classified at each line start and surfaces as [`TokenFlags`] on the
//! following token; the parser uses those flags to delimit indented
//! lists without explicit braces.
//!
//! Entering a `>` or `[>` token switches to a prose sub-scanner that
//! emits `Prose*` fragment tokens with embedded `` `terminal` `` and
//! `|nonterminal|` symbols between fragments.
//!
//! All mutable state lives in one cloneable struct, so speculation is
//! snapshot/restore plus truncation of the trivia and diagnostic sinks.

use gram_diagnostic::{codes, CancelToken, Canceled, Diagnostics, Span};
use gram_syntax::{Name, StringInterner, SyntaxKind, Token, TokenFlags, Trivia, TriviaKind};
use tracing::trace;

use crate::cursor::Cursor;
use crate::entities::decode_entity;

/// Prose sub-scanner state.
#[derive(Clone, Copy, Debug)]
struct ProseMode {
    /// `[> ... ]` prose; ends at `]` or a blank line. Line prose ends at
    /// the line terminator.
    bracketed: bool,
    /// An embedded terminal or nonterminal has been emitted.
    seen_symbol: bool,
    /// No fragment or symbol has been emitted yet.
    at_start: bool,
}

/// Everything `speculate` must be able to restore.
#[derive(Clone, Debug)]
struct ScannerState<'a> {
    cursor: Cursor<'a>,
    /// Start of the whitespace/trivia run before the current token.
    start_pos: u32,
    /// Start of the current token itself.
    token_pos: u32,
    token: SyntaxKind,
    token_value: String,
    token_flags: TokenFlags,
    /// Index into the trivia pool where the current token's leading
    /// trivia begins.
    token_trivia_start: usize,
    /// Baseline indent width, established by the first line after a
    /// blank line or file start.
    insignificant_indent: u32,
    /// Width of the currently open indented block, 0 if none.
    significant_indent: u32,
    /// Running indent width since the last line terminator.
    current_indent: u32,
    /// The next non-whitespace character is the first on its line.
    pending_line_start: bool,
    /// The next line start re-establishes the baseline.
    baseline_pending: bool,
    prose: Option<ProseMode>,
}

/// The scanner.
///
/// Construction takes the full text and borrows the diagnostics sink for
/// the scanner's lifetime; the parser reports its own diagnostics through
/// [`Scanner::diagnostics`].
pub struct Scanner<'a> {
    filename: &'a str,
    text: &'a str,
    interner: &'a StringInterner,
    diagnostics: &'a mut Diagnostics,
    cancel: CancelToken,
    state: ScannerState<'a>,
    /// All trivia in file order. Speculation truncates back to its
    /// watermark on restore.
    trivia: Vec<Trivia>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        filename: &'a str,
        text: &'a str,
        interner: &'a StringInterner,
        diagnostics: &'a mut Diagnostics,
        cancel: CancelToken,
    ) -> Self {
        Scanner {
            filename,
            text,
            interner,
            diagnostics,
            cancel,
            state: ScannerState {
                cursor: Cursor::new(text),
                start_pos: 0,
                token_pos: 0,
                token: SyntaxKind::Unknown,
                token_value: String::new(),
                token_flags: TokenFlags::empty(),
                token_trivia_start: 0,
                insignificant_indent: 0,
                significant_indent: 0,
                current_indent: 0,
                pending_line_start: true,
                baseline_pending: true,
                prose: None,
            },
            trivia: Vec::new(),
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────

    pub fn filename(&self) -> &str {
        self.filename
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Kind of the most recently scanned token.
    pub fn token(&self) -> SyntaxKind {
        self.state.token
    }

    /// Start of the current token.
    pub fn token_pos(&self) -> u32 {
        self.state.token_pos
    }

    /// Start of the whitespace/trivia run before the current token.
    pub fn start_pos(&self) -> u32 {
        self.state.start_pos
    }

    /// Current scan position (end of the current token).
    pub fn pos(&self) -> u32 {
        self.state.cursor.pos()
    }

    pub fn token_span(&self) -> Span {
        Span::new(self.state.token_pos, self.pos())
    }

    pub fn current_token(&self) -> Token {
        Token::new(self.state.token, self.token_span())
    }

    /// Raw source text of the current token.
    pub fn token_text(&self) -> &'a str {
        self.state
            .cursor
            .slice(self.state.token_pos, self.pos())
    }

    /// Cooked value of the current token: entity-decoded, escape-resolved
    /// literal content, or the identifier text.
    pub fn token_value(&self) -> &str {
        &self.state.token_value
    }

    /// The cooked token value, interned.
    pub fn token_name(&self) -> Name {
        self.interner.intern(&self.state.token_value)
    }

    pub fn token_flags(&self) -> TokenFlags {
        self.state.token_flags
    }

    /// Leading trivia of the current token, in source order.
    pub fn token_trivia(&self) -> &[Trivia] {
        &self.trivia[self.state.token_trivia_start..]
    }

    /// Every piece of trivia seen so far, in file order.
    pub fn all_trivia(&self) -> &[Trivia] {
        &self.trivia
    }

    /// The diagnostics sink, for callers that report between scans.
    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        self.diagnostics
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    // ─── Scanning ─────────────────────────────────────────────────────

    /// Advance to and return the next token's kind.
    pub fn scan(&mut self) -> Result<SyntaxKind, Canceled> {
        self.cancel.check()?;
        self.state.start_pos = self.state.cursor.pos();
        self.state.token_value.clear();
        self.state.token_flags = TokenFlags::empty();
        self.state.token_trivia_start = self.trivia.len();

        if self.state.prose.is_some() {
            if let Some(kind) = self.scan_prose() {
                self.state.token = kind;
                return Ok(kind);
            }
            // Prose ended at a line boundary; resume normal scanning.
        }
        let kind = self.scan_token();
        self.state.token = kind;
        Ok(kind)
    }

    fn scan_token(&mut self) -> SyntaxKind {
        loop {
            self.state.token_pos = self.state.cursor.pos();
            let Some(c) = self.state.cursor.current() else {
                return self.at_eof();
            };
            match c {
                ' ' | '\t' => {
                    self.state.cursor.advance();
                    if self.state.pending_line_start {
                        self.state.current_indent += 1;
                    }
                }
                '\n' | '\r' => self.line_terminator(),
                '/' if self.state.cursor.peek() == Some('/') => {
                    self.begin_line();
                    self.single_line_comment();
                }
                '/' if self.state.cursor.peek() == Some('*') => {
                    self.begin_line();
                    self.multi_line_comment();
                }
                '<' => {
                    self.begin_line();
                    match self.less_than() {
                        Some(kind) => return kind,
                        None => {} // HTML trivia, keep scanning
                    }
                }
                _ => {
                    self.begin_line();
                    return self.simple_token(c);
                }
            }
        }
    }

    fn at_eof(&mut self) -> SyntaxKind {
        if self.state.significant_indent > 0 {
            self.state.token_flags |= TokenFlags::PRECEDING_DEDENT;
            self.state.significant_indent = 0;
        }
        SyntaxKind::EndOfFileToken
    }

    fn line_terminator(&mut self) {
        let line_was_blank = self.state.pending_line_start;
        self.state.cursor.eat_line_terminator();
        self.state.token_flags |= TokenFlags::PRECEDING_LINE_TERMINATOR;
        if line_was_blank {
            self.state.token_flags |= TokenFlags::PRECEDING_BLANK_LINE;
            self.state.baseline_pending = true;
            if self.state.significant_indent > 0 {
                self.state.token_flags |= TokenFlags::PRECEDING_DEDENT;
                self.state.significant_indent = 0;
            }
        }
        self.state.pending_line_start = true;
        self.state.current_indent = 0;
    }

    /// Classify the indentation of a freshly started line. Runs once per
    /// line, on the first non-whitespace content.
    fn begin_line(&mut self) {
        if !self.state.pending_line_start {
            return;
        }
        self.state.pending_line_start = false;
        if self.state.baseline_pending {
            self.state.insignificant_indent = self.state.current_indent;
            self.state.baseline_pending = false;
        }
        if self.state.current_indent <= self.state.insignificant_indent {
            if self.state.significant_indent > 0 {
                self.state.token_flags |= TokenFlags::PRECEDING_DEDENT;
                self.state.significant_indent = 0;
            }
        } else if self.state.significant_indent == 0 {
            self.state.significant_indent = self.state.current_indent;
            self.state.token_flags |= TokenFlags::PRECEDING_INDENT;
        } else if self.state.current_indent > self.state.significant_indent {
            // Deeper than the open block: same logical line, wrapped.
            self.state.token_flags |= TokenFlags::LINE_CONTINUATION;
        }
    }

    // ─── Trivia ───────────────────────────────────────────────────────

    fn single_line_comment(&mut self) {
        let start = self.state.cursor.pos();
        self.state
            .cursor
            .advance_while(|c| !matches!(c, '\n' | '\r'));
        self.trivia.push(Trivia::new(
            TriviaKind::SingleLineComment,
            Span::new(start, self.state.cursor.pos()),
            None,
        ));
    }

    fn multi_line_comment(&mut self) {
        let start = self.state.cursor.pos();
        self.state.cursor.advance(); // /
        self.state.cursor.advance(); // *
        let mut terminated = false;
        while let Some(c) = self.state.cursor.current() {
            if c == '*' && self.state.cursor.peek() == Some('/') {
                self.state.cursor.advance();
                self.state.cursor.advance();
                terminated = true;
                break;
            }
            if matches!(c, '\n' | '\r') {
                // Comments may span lines; crossing one still counts as a
                // line terminator for the following token.
                self.line_terminator();
                self.state.pending_line_start = false;
            } else {
                self.state.cursor.advance();
            }
        }
        let span = Span::new(start, self.state.cursor.pos());
        if !terminated {
            self.diagnostics
                .report_at(span, codes::UNTERMINATED_COMMENT, vec![]);
        }
        self.trivia
            .push(Trivia::new(TriviaKind::MultiLineComment, span, None));
    }

    /// Dispatch for `<`: HTML trivia (returns `None`), a Unicode
    /// character literal, or the `<!` / `<-` operators.
    fn less_than(&mut self) -> Option<SyntaxKind> {
        match self.state.cursor.peek() {
            Some('!') => {
                self.state.cursor.advance_bytes(2);
                Some(SyntaxKind::LessThanExclamationToken)
            }
            Some('-') => {
                self.state.cursor.advance_bytes(2);
                Some(SyntaxKind::LessThanMinusToken)
            }
            Some('/') => {
                self.html_trivia(TriviaKind::HtmlCloseTag);
                None
            }
            // Lowercase tag name: HTML markup (`<ins>`, `<del>`, ...).
            // Unicode character names are uppercase (`<TAB>`, `<NBSP>`).
            Some(c) if c.is_ascii_lowercase() => {
                self.html_trivia(TriviaKind::HtmlOpenTag);
                None
            }
            Some(c) if c.is_uppercase() => Some(self.unicode_character_literal()),
            _ => {
                let start = self.state.cursor.pos();
                self.state.cursor.advance();
                self.diagnostics.report_at(
                    Span::new(start, self.state.cursor.pos()),
                    codes::INVALID_CHARACTER,
                    vec![],
                );
                Some(SyntaxKind::Unknown)
            }
        }
    }

    fn html_trivia(&mut self, kind: TriviaKind) {
        let start = self.state.cursor.pos();
        self.state.cursor.advance(); // <
        if kind == TriviaKind::HtmlCloseTag {
            self.state.cursor.advance(); // /
        }
        let name_start = self.state.cursor.pos();
        self.state
            .cursor
            .advance_while(|c| c.is_ascii_alphanumeric());
        let tag = self
            .interner
            .intern(self.state.cursor.slice(name_start, self.state.cursor.pos()));
        // Skip to the closing `>`; tags never span lines.
        self.state
            .cursor
            .advance_while(|c| !matches!(c, '>' | '\n' | '\r'));
        let terminated = self.state.cursor.eat('>');
        let span = Span::new(start, self.state.cursor.pos());
        if !terminated {
            self.diagnostics
                .report_at(span, codes::UNTERMINATED_HTML_TRIVIA, vec![]);
        }
        self.trivia.push(Trivia::new(kind, span, Some(tag)));
    }

    // ─── Tokens ───────────────────────────────────────────────────────

    fn simple_token(&mut self, c: char) -> SyntaxKind {
        match c {
            '@' => self.single(SyntaxKind::AtToken),
            '{' => self.single(SyntaxKind::OpenBraceToken),
            '}' => self.single(SyntaxKind::CloseBraceToken),
            '[' => {
                self.state.cursor.advance();
                if self.state.cursor.eat('>') {
                    self.state.prose = Some(ProseMode {
                        bracketed: true,
                        seen_symbol: false,
                        at_start: true,
                    });
                    SyntaxKind::OpenBracketGreaterThanToken
                } else {
                    SyntaxKind::OpenBracketToken
                }
            }
            ']' => self.single(SyntaxKind::CloseBracketToken),
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            ',' => self.single(SyntaxKind::CommaToken),
            '+' => self.single(SyntaxKind::PlusToken),
            '~' => self.single(SyntaxKind::TildeToken),
            '?' => self.single(SyntaxKind::QuestionToken),
            '∈' => self.single(SyntaxKind::ElementOfToken),
            '∉' => self.single(SyntaxKind::NotAnElementOfToken),
            ':' => {
                self.state.cursor.advance();
                if self.state.cursor.eat(':') {
                    if self.state.cursor.eat(':') {
                        SyntaxKind::ColonColonColonToken
                    } else {
                        SyntaxKind::ColonColonToken
                    }
                } else {
                    SyntaxKind::ColonToken
                }
            }
            '=' => {
                self.state.cursor.advance();
                if self.state.cursor.eat('=') {
                    SyntaxKind::EqualsEqualsToken
                } else {
                    SyntaxKind::EqualsToken
                }
            }
            '!' => {
                self.state.cursor.advance();
                if self.state.cursor.eat('=') {
                    SyntaxKind::ExclamationEqualsToken
                } else {
                    self.invalid_character()
                }
            }
            '>' => {
                self.state.cursor.advance();
                self.state.prose = Some(ProseMode {
                    bracketed: false,
                    seen_symbol: false,
                    at_start: true,
                });
                SyntaxKind::GreaterThanToken
            }
            '#' => self.link_reference(),
            '`' => self.terminal_literal(),
            '"' => self.string_literal(),
            '0'..='9' => self.number_literal(),
            _ if is_identifier_start(c) => self.identifier(),
            _ => self.invalid_character(),
        }
    }

    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.state.cursor.advance();
        kind
    }

    fn invalid_character(&mut self) -> SyntaxKind {
        // token_pos already sits on the offending character; it may have
        // been consumed by a two-character probe.
        if self.state.cursor.pos() == self.state.token_pos {
            self.state.cursor.advance();
        }
        self.diagnostics.report_at(
            Span::new(self.state.token_pos, self.state.cursor.pos()),
            codes::INVALID_CHARACTER,
            vec![],
        );
        SyntaxKind::Unknown
    }

    fn identifier(&mut self) -> SyntaxKind {
        let mut value = std::mem::take(&mut self.state.token_value);
        while let Some(c) = self.state.cursor.current() {
            if is_identifier_part(c) {
                value.push(c);
                self.state.cursor.advance();
            } else if c == '&' {
                // An entity that decodes to an identifier character
                // continues the identifier.
                match decode_entity(&self.state.cursor) {
                    Some(decoded) if is_identifier_part(decoded.value) => {
                        value.push(decoded.value);
                        self.state.cursor.advance_bytes(decoded.len);
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }
        self.state.token_value = value;
        SyntaxKind::keyword_from_str(&self.state.token_value).unwrap_or(SyntaxKind::Identifier)
    }

    fn number_literal(&mut self) -> SyntaxKind {
        let start = self.state.cursor.pos();
        self.state.cursor.advance_while(|c| c.is_ascii_digit());
        let digits = self.state.cursor.slice(start, self.state.cursor.pos());
        self.state.token_value.push_str(digits);
        SyntaxKind::NumberLiteral
    }

    /// `#link-id` on a right-hand side.
    fn link_reference(&mut self) -> SyntaxKind {
        self.state.cursor.advance(); // #
        let start = self.state.cursor.pos();
        self.state
            .cursor
            .advance_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        let id = self.state.cursor.slice(start, self.state.cursor.pos());
        self.state.token_value.push_str(id);
        SyntaxKind::HashToken
    }

    fn terminal_literal(&mut self) -> SyntaxKind {
        self.state.cursor.advance(); // `
        // ``` is the terminal whose text is a single backtick.
        if self.state.cursor.current() == Some('`') && self.state.cursor.peek() == Some('`') {
            self.state.cursor.advance_bytes(2);
            self.state.token_value.push('`');
            return SyntaxKind::TerminalLiteral;
        }
        let mut value = std::mem::take(&mut self.state.token_value);
        loop {
            match self.state.cursor.current() {
                None | Some('\n' | '\r') => {
                    self.diagnostics.report_at(
                        Span::new(self.state.token_pos, self.state.cursor.pos()),
                        codes::UNTERMINATED_TERMINAL_LITERAL,
                        vec![],
                    );
                    break;
                }
                Some('`') => {
                    self.state.cursor.advance();
                    break;
                }
                Some('&') => self.entity_into(&mut value),
                Some(c) => {
                    value.push(c);
                    self.state.cursor.advance();
                }
            }
        }
        self.state.token_value = value;
        SyntaxKind::TerminalLiteral
    }

    fn string_literal(&mut self) -> SyntaxKind {
        self.state.cursor.advance(); // "
        let mut value = std::mem::take(&mut self.state.token_value);
        loop {
            match self.state.cursor.current() {
                None | Some('\n' | '\r') => {
                    self.diagnostics.report_at(
                        Span::new(self.state.token_pos, self.state.cursor.pos()),
                        codes::UNTERMINATED_STRING_LITERAL,
                        vec![],
                    );
                    break;
                }
                Some('"') => {
                    self.state.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.state.cursor.advance();
                    match self.state.cursor.current() {
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('0') => value.push('\0'),
                        Some(c) => value.push(c),
                        None => continue, // EOF handled at loop top
                    }
                    self.state.cursor.advance();
                }
                Some('&') => self.entity_into(&mut value),
                Some(c) => {
                    value.push(c);
                    self.state.cursor.advance();
                }
            }
        }
        self.state.token_value = value;
        SyntaxKind::StringLiteral
    }

    /// `<NAME>` — a named code point like `<TAB>` or `<NBSP>`.
    fn unicode_character_literal(&mut self) -> SyntaxKind {
        self.state.cursor.advance(); // <
        let mut value = std::mem::take(&mut self.state.token_value);
        loop {
            match self.state.cursor.current() {
                None | Some('\n' | '\r') => {
                    self.diagnostics.report_at(
                        Span::new(self.state.token_pos, self.state.cursor.pos()),
                        codes::UNTERMINATED_UNICODE_LITERAL,
                        vec![],
                    );
                    break;
                }
                Some('>') => {
                    self.state.cursor.advance();
                    break;
                }
                Some('&') => self.entity_into(&mut value),
                Some(c) => {
                    value.push(c);
                    self.state.cursor.advance();
                }
            }
        }
        self.state.token_value = value;
        SyntaxKind::UnicodeCharacterLiteral
    }

    /// Decode an entity at the cursor into `value`, or fall back to the
    /// raw text with a diagnostic when it merely looks like one.
    fn entity_into(&mut self, value: &mut String) {
        if let Some(decoded) = decode_entity(&self.state.cursor) {
            value.push(decoded.value);
            self.state.cursor.advance_bytes(decoded.len);
            return;
        }
        let start = self.state.cursor.pos();
        let mut probe = self.state.cursor;
        probe.advance(); // &
        probe.advance_while(|c| c == '#' || c.is_ascii_alphanumeric());
        if probe.pos() > start + 1 && probe.eat(';') {
            let raw = probe.slice(start, probe.pos());
            self.diagnostics.report_at(
                Span::new(start, probe.pos()),
                codes::INVALID_CHARACTER_ENTITY,
                vec![raw.to_string()],
            );
            value.push_str(raw);
            self.state.cursor = probe;
        } else {
            value.push('&');
            self.state.cursor.advance();
        }
    }

    // ─── Prose ────────────────────────────────────────────────────────

    /// One token of the prose sub-scanner. Returns `None` when prose
    /// ended at a line boundary and the caller should resume normal
    /// scanning.
    fn scan_prose(&mut self) -> Option<SyntaxKind> {
        let mode = self.state.prose?;
        if mode.at_start {
            self.state
                .cursor
                .advance_while(|c| c == ' ' || c == '\t');
        }
        self.state.token_pos = self.state.cursor.pos();
        match self.state.cursor.current() {
            None => {
                if mode.bracketed {
                    self.diagnostics.report_at(
                        Span::new(self.state.token_pos, self.state.token_pos),
                        codes::UNTERMINATED_PROSE,
                        vec![],
                    );
                }
                self.state.prose = None;
                None
            }
            Some('\n' | '\r') if !mode.bracketed => {
                self.state.prose = None;
                None
            }
            Some(']') if mode.bracketed => {
                self.state.prose = None;
                self.state.cursor.advance();
                Some(SyntaxKind::CloseBracketToken)
            }
            Some('`') => {
                self.mark_prose_symbol();
                Some(self.terminal_literal())
            }
            Some('|') => {
                self.mark_prose_symbol();
                Some(self.prose_nonterminal())
            }
            Some(_) => self.prose_fragment(mode),
        }
    }

    fn mark_prose_symbol(&mut self) {
        if let Some(mode) = &mut self.state.prose {
            mode.seen_symbol = true;
            mode.at_start = false;
        }
    }

    /// `|Name|` inside prose.
    fn prose_nonterminal(&mut self) -> SyntaxKind {
        self.state.cursor.advance(); // |
        let kind = self.identifier();
        if !self.state.cursor.eat('|') {
            self.diagnostics.report_at(
                Span::new(self.state.token_pos, self.state.cursor.pos()),
                codes::TOKEN_EXPECTED,
                vec!["|".to_string()],
            );
        }
        if kind == SyntaxKind::Identifier && self.state.token_value.is_empty() {
            self.diagnostics.report_at(
                Span::new(self.state.token_pos, self.state.cursor.pos()),
                codes::IDENTIFIER_EXPECTED,
                vec![],
            );
        }
        SyntaxKind::Identifier
    }

    fn prose_fragment(&mut self, mode: ProseMode) -> Option<SyntaxKind> {
        let mut value = std::mem::take(&mut self.state.token_value);
        let mut reached_end = false;
        let mut exit = false;
        loop {
            match self.state.cursor.current() {
                None => {
                    if mode.bracketed {
                        self.diagnostics.report_at(
                            Span::new(self.state.token_pos, self.state.cursor.pos()),
                            codes::UNTERMINATED_PROSE,
                            vec![],
                        );
                    }
                    reached_end = true;
                    exit = true;
                    break;
                }
                Some('\n' | '\r') => {
                    if !mode.bracketed {
                        // Line prose: the terminator is not consumed, so
                        // the next scan classifies the new line normally.
                        reached_end = true;
                        exit = true;
                        break;
                    }
                    if self.next_line_is_blank() {
                        self.diagnostics.report_at(
                            Span::new(self.state.token_pos, self.state.cursor.pos()),
                            codes::UNTERMINATED_PROSE,
                            vec![],
                        );
                        reached_end = true;
                        exit = true;
                        break;
                    }
                    // Multi-line prose joins continuation lines.
                    self.state.cursor.eat_line_terminator();
                    self.state
                        .cursor
                        .advance_while(|c| c == ' ' || c == '\t');
                    value.push('\n');
                }
                Some(']') if mode.bracketed => {
                    reached_end = true;
                    break;
                }
                Some('`' | '|') => break,
                Some('&') => self.entity_into(&mut value),
                Some(c) => {
                    value.push(c);
                    self.state.cursor.advance();
                }
            }
        }
        self.state.token_value = value;
        if exit {
            self.state.prose = None;
        } else if let Some(prose) = &mut self.state.prose {
            prose.at_start = false;
        }

        if self.state.token_value.is_empty() {
            // Nothing to emit; handle whatever stopped us.
            return if self.state.prose.is_some() {
                self.scan_prose()
            } else {
                None
            };
        }
        let kind = match (mode.at_start, mode.seen_symbol, reached_end) {
            (true, false, true) => SyntaxKind::ProseFull,
            (_, _, true) => SyntaxKind::ProseTail,
            (true, false, false) => SyntaxKind::ProseHead,
            _ => SyntaxKind::ProseMiddle,
        };
        Some(kind)
    }

    /// True when the upcoming line (after the terminator at the cursor)
    /// is blank.
    fn next_line_is_blank(&self) -> bool {
        let mut probe = self.state.cursor;
        probe.eat_line_terminator();
        probe.advance_while(|c| c == ' ' || c == '\t');
        probe.is_eof() || probe.at_line_terminator()
    }

    // ─── Speculation ──────────────────────────────────────────────────

    /// Capture the full mutable state, including the trivia and
    /// diagnostic watermarks.
    pub fn snapshot(&self) -> ScannerSnapshot<'a> {
        ScannerSnapshot {
            state: self.state.clone(),
            trivia_len: self.trivia.len(),
            diagnostic_mark: self.diagnostics.mark(),
        }
    }

    /// Roll back to a snapshot, discarding trivia and diagnostics
    /// reported since it was taken.
    pub fn restore(&mut self, snapshot: ScannerSnapshot<'a>) {
        trace!(
            pos = self.state.cursor.pos(),
            restore_to = snapshot.state.cursor.pos(),
            "scanner restored"
        );
        self.state = snapshot.state;
        self.trivia.truncate(snapshot.trivia_len);
        self.diagnostics.rollback(snapshot.diagnostic_mark);
    }

    /// Run `f` speculatively. State is restored unless `f` returned
    /// `Some` and this is not a lookahead; diagnostics and trivia
    /// produced during a restored speculation are discarded.
    pub fn speculate<T>(
        &mut self,
        is_lookahead: bool,
        f: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        let snapshot = self.snapshot();
        let result = f(self);
        if result.is_none() || is_lookahead {
            self.restore(snapshot);
        }
        result
    }

    /// Re-scan from `pos`, then restore the scanner completely.
    ///
    /// The cursor rewinds to the start of the whitespace run before
    /// `pos` so line-start indentation is reclassified when `pos` is the
    /// first content on its line.
    pub fn scan_range<T>(&mut self, pos: u32, f: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = self.snapshot();

        let bytes = self.text.as_bytes();
        let mut start = (pos as usize).min(bytes.len());
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }
        let at_line_start = start == 0 || matches!(bytes[start - 1], b'\n' | b'\r');
        trace!(pos, resume_from = start, "scan_range");

        self.state.cursor = Cursor::at(self.text, start as u32);
        self.state.start_pos = start as u32;
        self.state.token_pos = start as u32;
        self.state.token = SyntaxKind::Unknown;
        self.state.token_value.clear();
        self.state.token_flags = TokenFlags::empty();
        self.state.current_indent = 0;
        self.state.pending_line_start = at_line_start;
        self.state.prose = None;

        let result = f(self);

        self.restore(snapshot);
        result
    }
}

/// Opaque state capture for [`Scanner::restore`].
pub struct ScannerSnapshot<'a> {
    state: ScannerState<'a>,
    trivia_len: usize,
    diagnostic_mark: usize,
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gram_diagnostic::LineMap;
    use pretty_assertions::assert_eq;

    struct Harness {
        interner: StringInterner,
        diagnostics: Diagnostics,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                interner: StringInterner::new(),
                diagnostics: Diagnostics::new(),
            }
        }

        fn scanner<'a>(&'a mut self, text: &'a str) -> Scanner<'a> {
            let map = LineMap::new(text);
            self.diagnostics.set_source_file("test.grammar", &map);
            Scanner::new(
                "test.grammar",
                text,
                &self.interner,
                &mut self.diagnostics,
                CancelToken::new(),
            )
        }
    }

    fn scan_all(text: &str) -> (Vec<(SyntaxKind, String)>, String) {
        let mut harness = Harness::new();
        let mut tokens = Vec::new();
        {
            let mut scanner = harness.scanner(text);
            loop {
                let kind = scanner.scan().unwrap();
                tokens.push((kind, scanner.token_value().to_string()));
                if kind == SyntaxKind::EndOfFileToken {
                    break;
                }
            }
        }
        (tokens, harness.diagnostics.format(None))
    }

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        scan_all(text).0.into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn punctuation_and_keywords() {
        assert_eq!(
            kinds("A : one of"),
            vec![
                SyntaxKind::Identifier,
                SyntaxKind::ColonToken,
                SyntaxKind::OneKeyword,
                SyntaxKind::OfKeyword,
                SyntaxKind::EndOfFileToken,
            ]
        );
        assert_eq!(
            kinds(":: ::: == != <! <- ∈ ∉"),
            vec![
                SyntaxKind::ColonColonToken,
                SyntaxKind::ColonColonColonToken,
                SyntaxKind::EqualsEqualsToken,
                SyntaxKind::ExclamationEqualsToken,
                SyntaxKind::LessThanExclamationToken,
                SyntaxKind::LessThanMinusToken,
                SyntaxKind::ElementOfToken,
                SyntaxKind::NotAnElementOfToken,
                SyntaxKind::EndOfFileToken,
            ]
        );
    }

    #[test]
    fn prose_line_scans_as_one_fragment() {
        let (tokens, diagnostics) = scan_all("SourceCharacter ::\n\t> any Unicode code point\n");
        assert_eq!(diagnostics, "");
        assert_eq!(
            tokens,
            vec![
                (SyntaxKind::Identifier, "SourceCharacter".to_string()),
                (SyntaxKind::ColonColonToken, String::new()),
                (SyntaxKind::GreaterThanToken, String::new()),
                (SyntaxKind::ProseFull, "any Unicode code point".to_string()),
                (SyntaxKind::EndOfFileToken, String::new()),
            ]
        );
    }

    #[test]
    fn prose_with_embedded_symbols() {
        let (tokens, _) = scan_all("> the `*` token or |Expression| here\n");
        assert_eq!(
            tokens,
            vec![
                (SyntaxKind::GreaterThanToken, String::new()),
                (SyntaxKind::ProseHead, "the ".to_string()),
                (SyntaxKind::TerminalLiteral, "*".to_string()),
                (SyntaxKind::ProseMiddle, " token or ".to_string()),
                (SyntaxKind::Identifier, "Expression".to_string()),
                (SyntaxKind::ProseTail, " here".to_string()),
                (SyntaxKind::EndOfFileToken, String::new()),
            ]
        );
    }

    #[test]
    fn bracketed_prose_ends_at_close_bracket() {
        let (tokens, diagnostics) = scan_all("[> some text]");
        assert_eq!(diagnostics, "");
        assert_eq!(
            tokens,
            vec![
                (SyntaxKind::OpenBracketGreaterThanToken, String::new()),
                (SyntaxKind::ProseFull, "some text".to_string()),
                (SyntaxKind::CloseBracketToken, String::new()),
                (SyntaxKind::EndOfFileToken, String::new()),
            ]
        );
    }

    #[test]
    fn bracketed_prose_blank_line_is_unterminated() {
        let (tokens, diagnostics) = scan_all("[> first\n\nA: `b`\n");
        assert_eq!(tokens[1].0, SyntaxKind::ProseFull);
        assert!(diagnostics.contains("GM1005"));
        // Scanning continues normally after the blank line.
        assert!(tokens.iter().any(|(k, v)| *k == SyntaxKind::Identifier && v == "A"));
    }

    #[test]
    fn indentation_flags() {
        let text = "A ::\n  `a`\n  `b`\nB ::\n";
        let mut harness = Harness::new();
        let mut scanner = harness.scanner(text);

        assert_eq!(scanner.scan().unwrap(), SyntaxKind::Identifier); // A
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::ColonColonToken);
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::TerminalLiteral); // `a`
        assert!(scanner.token_flags().contains(TokenFlags::PRECEDING_INDENT));
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::TerminalLiteral); // `b`
        assert!(scanner
            .token_flags()
            .contains(TokenFlags::PRECEDING_LINE_TERMINATOR));
        assert!(!scanner.token_flags().contains(TokenFlags::PRECEDING_INDENT));
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::Identifier); // B
        assert!(scanner.token_flags().contains(TokenFlags::PRECEDING_DEDENT));
    }

    #[test]
    fn blank_line_closes_open_block() {
        let text = "A ::\n  `a`\n\n  `b`\n";
        let mut harness = Harness::new();
        let mut scanner = harness.scanner(text);
        for _ in 0..3 {
            scanner.scan().unwrap();
        }
        // `b` follows a blank line; the block around `a` force-closed and
        // the blank line reset the baseline.
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::TerminalLiteral);
        let flags = scanner.token_flags();
        assert!(flags.contains(TokenFlags::PRECEDING_BLANK_LINE));
        assert!(flags.contains(TokenFlags::PRECEDING_DEDENT));
        assert!(!flags.contains(TokenFlags::PRECEDING_INDENT));
    }

    #[test]
    fn deeper_indent_is_line_continuation() {
        let text = "A ::\n  `a`\n      `b`\n";
        let mut harness = Harness::new();
        let mut scanner = harness.scanner(text);
        for _ in 0..3 {
            scanner.scan().unwrap();
        }
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::TerminalLiteral);
        assert!(scanner.token_flags().contains(TokenFlags::LINE_CONTINUATION));
    }

    #[test]
    fn comments_and_html_are_trivia() {
        let text = "// header\nA : <ins>`x`</ins> /* inline */ B\n";
        let mut harness = Harness::new();
        let mut scanner = harness.scanner(text);
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::Identifier);
        assert_eq!(scanner.token_trivia().len(), 1);
        assert_eq!(
            scanner.token_trivia()[0].kind,
            TriviaKind::SingleLineComment
        );
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::ColonToken);
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::TerminalLiteral);
        assert_eq!(scanner.token_trivia()[0].kind, TriviaKind::HtmlOpenTag);
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::Identifier); // B
        let kinds: Vec<_> = scanner.token_trivia().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TriviaKind::HtmlCloseTag, TriviaKind::MultiLineComment]
        );
        assert_eq!(scanner.all_trivia().len(), 4);
    }

    #[test]
    fn literals_cook_entities_and_escapes() {
        let (tokens, diagnostics) = scan_all("`&ldquo;` \"a\\nb\" <TAB>");
        assert_eq!(diagnostics, "");
        assert_eq!(
            tokens,
            vec![
                (SyntaxKind::TerminalLiteral, "\u{201C}".to_string()),
                (SyntaxKind::StringLiteral, "a\nb".to_string()),
                (SyntaxKind::UnicodeCharacterLiteral, "TAB".to_string()),
                (SyntaxKind::EndOfFileToken, String::new()),
            ]
        );
    }

    #[test]
    fn triple_backtick_is_a_backtick_terminal() {
        let (tokens, _) = scan_all("```");
        assert_eq!(tokens[0], (SyntaxKind::TerminalLiteral, "`".to_string()));
    }

    #[test]
    fn unterminated_literals_report() {
        let (_, diagnostics) = scan_all("`abc\n");
        assert!(diagnostics.contains("GM1002"));
        let (_, diagnostics) = scan_all("\"abc");
        assert!(diagnostics.contains("GM1001"));
        let (_, diagnostics) = scan_all("/* forever");
        assert!(diagnostics.contains("GM1004"));
    }

    #[test]
    fn invalid_entity_reports_and_keeps_raw_text() {
        let (tokens, diagnostics) = scan_all("`a&bogus12;b`");
        assert_eq!(tokens[0].1, "a&bogus12;b");
        assert!(diagnostics.contains("GM1006"));
        // A bare ampersand is not an entity and not an error.
        let (tokens, diagnostics) = scan_all("`a & b`");
        assert_eq!(tokens[0].1, "a & b");
        assert_eq!(diagnostics, "");
    }

    #[test]
    fn link_reference_token() {
        let (tokens, _) = scan_all("#sec-example");
        assert_eq!(tokens[0], (SyntaxKind::HashToken, "sec-example".to_string()));
    }

    #[test]
    fn canceled_scan_fails_fast() {
        let mut harness = Harness::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let interner = StringInterner::new();
        let mut scanner = Scanner::new(
            "test.grammar",
            "A : B",
            &interner,
            &mut harness.diagnostics,
            cancel,
        );
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn lookahead_speculation_always_restores() {
        let mut harness = Harness::new();
        let mut scanner = harness.scanner("A B C");
        scanner.scan().unwrap();
        assert_eq!(scanner.token_value(), "A");
        let seen = scanner.speculate(true, |s| {
            s.scan().ok().map(|_| s.token_value().to_string())
        });
        assert_eq!(seen.as_deref(), Some("B"));
        assert_eq!(scanner.token_value(), "A");
        assert_eq!(scanner.scan().unwrap(), SyntaxKind::Identifier);
        assert_eq!(scanner.token_value(), "B");
    }

    #[test]
    fn failed_tentative_speculation_rolls_back_diagnostics() {
        let mut harness = Harness::new();
        let before;
        {
            let mut scanner = harness.scanner("A `unterminated\n");
            scanner.scan().unwrap();
            before = scanner.diagnostics().len();
            let result: Option<()> = scanner.speculate(false, |s| {
                s.scan().ok(); // reports unterminated terminal
                None
            });
            assert_eq!(result, None);
            assert_eq!(scanner.diagnostics().len(), before);
        }
    }

    #[test]
    fn successful_tentative_speculation_commits() {
        let mut harness = Harness::new();
        let mut scanner = harness.scanner("A B");
        scanner.scan().unwrap();
        let committed = scanner.speculate(false, |s| s.scan().ok());
        assert_eq!(committed, Some(SyntaxKind::Identifier));
        assert_eq!(scanner.token_value(), "B");
    }

    #[test]
    fn scan_range_rescans_and_restores() {
        let mut harness = Harness::new();
        let text = "A ::\n  `a`\n";
        let mut scanner = harness.scanner(text);
        while scanner.scan().unwrap() != SyntaxKind::EndOfFileToken {}
        let end = scanner.pos();

        // Position 7 is the backtick on the indented line.
        let (kind, flags) = scanner.scan_range(7, |s| {
            let kind = s.scan().unwrap();
            (kind, s.token_flags())
        });
        assert_eq!(kind, SyntaxKind::TerminalLiteral);
        assert!(flags.contains(TokenFlags::PRECEDING_INDENT));
        // Fully restored afterwards.
        assert_eq!(scanner.pos(), end);
        assert_eq!(scanner.token(), SyntaxKind::EndOfFileToken);
    }
}

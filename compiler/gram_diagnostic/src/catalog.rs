//! The diagnostic message catalog.
//!
//! A catalog maps a numeric code to a severity and a message template.
//! Templates use `{0}`-style placeholders filled from the arguments of a
//! reported occurrence. The compiler's own catalog is [`catalog()`];
//! constructing a catalog rejects duplicate codes so the table stays
//! unambiguous.

use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;

/// Severity attached to a catalog entry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Message,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Message => write!(f, "message"),
        }
    }
}

/// One catalog entry: `code -> (severity, template)`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Message {
    pub code: u32,
    pub severity: Severity,
    pub template: &'static str,
}

impl Message {
    pub const fn new(code: u32, severity: Severity, template: &'static str) -> Self {
        Message {
            code,
            severity,
            template,
        }
    }
}

/// Error constructing a catalog.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum CatalogError {
    /// Two entries share a code.
    CodeInUse(u32),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::CodeInUse(code) => write!(f, "Code {code} is already in use"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// An immutable code → message table.
#[derive(Debug, Default)]
pub struct MessageCatalog {
    messages: FxHashMap<u32, Message>,
}

impl MessageCatalog {
    /// Build a catalog, rejecting duplicate codes.
    pub fn from_messages(
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Self, CatalogError> {
        let mut map = FxHashMap::default();
        for message in messages {
            let code = message.code;
            if map.insert(code, message).is_some() {
                return Err(CatalogError::CodeInUse(code));
            }
        }
        Ok(MessageCatalog { messages: map })
    }

    pub fn get(&self, code: u32) -> Option<&Message> {
        self.messages.get(&code)
    }

    pub fn severity_of(&self, code: u32) -> Severity {
        self.get(code).map_or(Severity::Error, |m| m.severity)
    }

    /// Render a template, substituting `{0}`, `{1}`, ... with `args`.
    pub fn format_message(&self, code: u32, args: &[String]) -> String {
        let template = self.get(code).map_or("Unknown diagnostic.", |m| m.template);
        format_template(template, args)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Substitute `{N}` placeholders in a template.
pub(crate) fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '{' {
            if let Some(close) = template[i..].find('}') {
                let inner = &template[i + 1..i + close];
                if let Ok(index) = inner.parse::<usize>() {
                    if let Some(arg) = args.get(index) {
                        out.push_str(arg);
                    }
                    // Skip to the closing brace.
                    while let Some(&(j, _)) = chars.peek() {
                        if j > i + close {
                            break;
                        }
                        chars.next();
                    }
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// The compiler's built-in message catalog.
///
/// Codes are grouped by phase: 1xxx scan/parse, 2xxx semantic.
pub fn catalog() -> &'static MessageCatalog {
    static CATALOG: OnceLock<MessageCatalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // the built-in table has no duplicate codes
        MessageCatalog::from_messages(builtin_messages()).unwrap()
    })
}

fn builtin_messages() -> Vec<Message> {
    use crate::diagnostics::codes;
    use Severity::{Error, Warning};
    vec![
        Message::new(codes::INVALID_CHARACTER, Error, "Invalid character."),
        Message::new(
            codes::UNTERMINATED_STRING_LITERAL,
            Error,
            "Unterminated string literal.",
        ),
        Message::new(
            codes::UNTERMINATED_TERMINAL_LITERAL,
            Error,
            "Unterminated terminal literal.",
        ),
        Message::new(
            codes::UNTERMINATED_UNICODE_LITERAL,
            Error,
            "Unterminated Unicode character literal.",
        ),
        Message::new(codes::UNTERMINATED_COMMENT, Error, "Unterminated comment."),
        Message::new(codes::UNTERMINATED_PROSE, Error, "Unterminated prose."),
        Message::new(
            codes::UNTERMINATED_HTML_TRIVIA,
            Error,
            "Unterminated HTML trivia.",
        ),
        Message::new(
            codes::INVALID_CHARACTER_ENTITY,
            Error,
            "Invalid character entity: '{0}'.",
        ),
        Message::new(codes::DIGIT_EXPECTED, Error, "Digit expected."),
        Message::new(codes::UNEXPECTED_TOKEN, Error, "Unexpected token: '{0}'."),
        Message::new(codes::TOKEN_EXPECTED, Error, "'{0}' expected."),
        Message::new(codes::IDENTIFIER_EXPECTED, Error, "Identifier expected."),
        Message::new(
            codes::STRING_LITERAL_EXPECTED,
            Error,
            "String literal expected.",
        ),
        Message::new(
            codes::NUMBER_LITERAL_EXPECTED,
            Error,
            "Number literal expected.",
        ),
        Message::new(
            codes::TERMINAL_LITERAL_EXPECTED,
            Error,
            "Terminal literal expected.",
        ),
        Message::new(codes::PRODUCTION_EXPECTED, Error, "Production expected."),
        Message::new(codes::INVALID_SYMBOL, Error, "Invalid symbol."),
        Message::new(codes::INVALID_ASSERTION, Error, "Invalid assertion."),
        Message::new(codes::CANNOT_FIND_NAME, Error, "Cannot find name: '{0}'."),
        Message::new(
            codes::DUPLICATE_IDENTIFIER,
            Error,
            "Duplicate identifier: '{0}'.",
        ),
        Message::new(
            codes::DUPLICATE_TERMINAL,
            Error,
            "Duplicate terminal: '{0}'.",
        ),
        Message::new(
            codes::MISSING_PARAMETER,
            Error,
            "Production '{0}' is missing parameter '{1}'.",
        ),
        Message::new(
            codes::UNKNOWN_PARAMETER,
            Error,
            "Production '{0}' does not have a parameter named '{1}'.",
        ),
        Message::new(codes::DUPLICATE_ARGUMENT, Error, "Duplicate argument: '{0}'."),
        Message::new(
            codes::MISSING_ARGUMENT,
            Error,
            "There is no argument given for parameter '{0}'.",
        ),
        Message::new(
            codes::CANNOT_FIND_PARAMETER,
            Error,
            "Cannot find parameter '{0}' in the enclosing production.",
        ),
        Message::new(codes::UNUSED_PARAMETER, Warning, "Parameter '{0}' is unused."),
        Message::new(
            codes::DEFINE_KEY_EXPECTED,
            Error,
            "'@define' key expected.",
        ),
        Message::new(
            codes::INVALID_DEFINE_KEY,
            Error,
            "Invalid '@define' key: '{0}'.",
        ),
        Message::new(
            codes::INVALID_DEFINE_VALUE,
            Error,
            "Invalid '@define' value: '{0}'; expected 'true', 'false', or 'default'.",
        ),
        Message::new(
            codes::LINE_NUMBER_EXPECTED,
            Error,
            "'@line' number or 'default' expected.",
        ),
    ]
}

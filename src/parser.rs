use crate::error::{ParseError, ParseErrorKind};
use crate::model::{Entry, ParseOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

impl QuoteState {
    fn opened_by(ch: char) -> Option<Self> {
        match ch {
            '\'' => Some(Self::SingleQuoted),
            '"' => Some(Self::DoubleQuoted),
            _ => None,
        }
    }

    fn delimiter(self) -> Option<char> {
        match self {
            Self::Unquoted => None,
            Self::SingleQuoted => Some('\''),
            Self::DoubleQuoted => Some('"'),
        }
    }
}

/// Classify a single line of `.env` text.
///
/// The line is scanned once, left to right. Outside quotes whitespace is
/// dropped, `#` ends the line and the first `=` separates key from value.
/// Inside quotes every character is kept, and `\n`, `\r` and `\<any>` are
/// unescaped. A value's closing quote ends the scan.
///
/// A value whose quote is never closed is still returned, prefixed with the
/// quote character and flagged through [`Entry::unterminated_quote`].
pub fn parse_line(line: &str) -> ParseOutcome {
    parse_numbered_line(line, 1)
}

/// Parse one line in isolation into its key and value.
///
/// Blank and comment lines are reported as errors of kind
/// [`ParseErrorKind::Blank`] and [`ParseErrorKind::Comment`].
pub fn parse_pair(line: &str) -> Result<(String, String), ParseError> {
    match parse_line(line) {
        ParseOutcome::Entry(entry) => Ok((entry.key, entry.value)),
        ParseOutcome::Blank => Err(ParseError::new(1, ParseErrorKind::Blank)),
        ParseOutcome::Comment => Err(ParseError::new(1, ParseErrorKind::Comment)),
        ParseOutcome::Malformed => Err(ParseError::new(1, ParseErrorKind::InvalidSyntax)),
    }
}

pub(crate) fn parse_numbered_line(line: &str, line_num: u32) -> ParseOutcome {
    let line = line.trim();
    if line.starts_with('#') {
        return ParseOutcome::Comment;
    }
    if line.is_empty() {
        return ParseOutcome::Blank;
    }
    if !line.contains('=') {
        return ParseOutcome::Malformed;
    }

    let mut buf = String::with_capacity(line.len());
    let mut key: Option<String> = None;
    let mut quote = QuoteState::Unquoted;
    let mut escaped = false;

    for ch in line.chars() {
        if let Some(closing) = quote.delimiter() {
            if escaped {
                buf.push(match ch {
                    'n' => '\n',
                    'r' => '\r',
                    other => other,
                });
                escaped = false;
                continue;
            }
            if ch == '\\' {
                escaped = true;
                continue;
            }
            if ch == closing {
                quote = QuoteState::Unquoted;
                if key.is_some() {
                    break;
                }
                continue;
            }
            buf.push(ch);
            continue;
        }

        if buf.is_empty()
            && let Some(opened) = QuoteState::opened_by(ch)
        {
            quote = opened;
            continue;
        }
        if ch.is_whitespace() {
            continue;
        }
        if ch == '#' {
            break;
        }
        if ch == '=' && key.is_none() {
            key = Some(std::mem::take(&mut buf));
            continue;
        }
        buf.push(ch);
    }

    // `=` only ever appeared inside a quoted key.
    let Some(key) = key else {
        return ParseOutcome::Malformed;
    };

    let unterminated = quote.delimiter();
    let value = match unterminated {
        Some(open) => {
            let mut marked = String::with_capacity(buf.len() + 1);
            marked.push(open);
            marked.push_str(&buf);
            marked
        }
        None => buf,
    };

    ParseOutcome::Entry(Entry {
        key,
        value,
        line: line_num,
        unterminated_quote: unterminated.is_some(),
    })
}

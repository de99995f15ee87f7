//! Row codec for the comma-separated logs.
//!
//! Text cells are wrapped in double quotes with embedded quotes doubled.
//! Commas inside quoted cells are kept as-is; splitting is quote-aware.
//!
//! Rows are line-delimited, so a CR or LF inside a text cell is written as a
//! single space. Such cells read back with spaces where the breaks were;
//! chat messages never carry line breaks, so nothing else is lost.

use spinbot_common::traits::LogField;

const QUOTE: char = '"';
const SEPARATOR: char = ',';

/// Encodes one row, without the trailing newline.
pub fn encode_row(fields: &[LogField]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        match field {
            LogField::Plain(v) => out.push_str(v),
            LogField::Text(v) => {
                out.push(QUOTE);
                for c in v.chars() {
                    match c {
                        QUOTE => out.push_str("\"\""),
                        '\r' | '\n' => out.push(' '),
                        other => out.push(other),
                    }
                }
                out.push(QUOTE);
            }
        }
    }
    out
}

/// Encodes the header row from column names.
pub fn encode_header(columns: &[&str]) -> String {
    columns.join(",")
}

/// Splits one row into unquoted cells. Returns `None` when a quoted cell is
/// never closed or garbage follows a closing quote.
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut after_closing_quote = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    current.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                    after_closing_quote = true;
                }
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            SEPARATOR => {
                fields.push(std::mem::take(&mut current));
                after_closing_quote = false;
            }
            QUOTE if current.is_empty() && !after_closing_quote => {
                in_quotes = true;
            }
            _ if after_closing_quote => return None,
            other => current.push(other),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

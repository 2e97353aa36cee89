// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter.

use tea_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        ("'{'", _) => Some("blocks start with '{'"),
        ("'}'", TokenKind::Eof) => Some("every '{' needs a matching '}'"),
        ("'}'", TokenKind::Text(_)) => Some("close the block inside a code region"),

        ("'('", _) => Some("parameter and argument lists need parentheses"),
        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),

        ("'='", TokenKind::As) => Some("'as' goes after the value: x = value as Type"),
        ("'in'", TokenKind::Assign) => Some("syntax: foreach (x in items)"),

        ("expression", TokenKind::Assign) => Some("put the value after '='"),
        ("expression", TokenKind::Semi) => Some("statement is incomplete"),
        ("expression", TokenKind::Text(_)) => Some("the code region ended before the expression"),
        ("expression", _) => Some("try a value, variable, or function call"),

        ("a name", TokenKind::Number(_)) => Some("names can't start with a number"),
        ("a name", k) if is_reserved(k) => Some("reserved words can't be used as names"),
        ("a name", _) => Some("names start with a letter or '_'"),

        ("'template'", _) => Some("a template starts with: template name(Type param, ...)"),
        ("type", _) => Some("try a class name like 'String' or 'int[]'"),

        _ => None,
    }
}

fn is_reserved(kind: &TokenKind) -> bool {
    let name = kind.display_name();
    name.len() > 2 && name.starts_with('\'') && name[1..].starts_with(|c: char| c.is_ascii_lowercase())
}

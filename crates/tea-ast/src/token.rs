// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Token definitions for the scanner.

use crate::SourceInfo;

/// A token produced by the scanner. Never mutated once emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub info: SourceInfo,
}

impl Token {
    pub fn new(kind: TokenKind, info: SourceInfo) -> Self {
        Self { kind, info }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Decoded numeric literal payload.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberLit {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl NumberLit {
    pub fn is_zero(&self) -> bool {
        match *self {
            NumberLit::Int(v) => v == 0,
            NumberLit::Long(v) => v == 0,
            NumberLit::Float(v) => v == 0.0,
            NumberLit::Double(v) => v == 0.0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            NumberLit::Int(v) => v as f64,
            NumberLit::Long(v) => v as f64,
            NumberLit::Float(v) => v as f64,
            NumberLit::Double(v) => v,
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Special
    Eof,
    Comment(String),
    /// Boundary marker emitted at `<%` when tooling tokens are enabled.
    EnterCode,
    /// Boundary marker emitted at `%>` when tooling tokens are enabled.
    EnterText,
    /// A run of raw template text between code regions.
    Text(String),

    // Literals
    String(String),
    Number(NumberLit),

    // Identifier
    Ident(String),

    // Reserved words
    And,
    As,
    Break,
    Call,
    Continue,
    Define,
    Else,
    False,
    Foreach,
    If,
    Import,
    In,
    Isa,
    Not,
    Null,
    Or,
    Return,
    Reverse,
    Template,
    True,

    // Brackets
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    /// `#(`
    HashParen,
    /// `##(`
    HashHashParen,

    // Operators
    Comma,
    Semi,
    Colon,
    Dot,
    DotDot,
    Ellipsis,
    Question,
    QuestionDot,
    QuestionBracket,
    Plus,
    Minus,
    Star,
    StarDot,
    Slash,
    Percent,
    Amp,
    Assign,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Eof => "end of file",
            TokenKind::Comment(_) => "a comment",
            TokenKind::EnterCode => "'<%'",
            TokenKind::EnterText => "'%>'",
            TokenKind::Text(_) => "template text",

            TokenKind::String(_) => "a string",
            TokenKind::Number(_) => "a number",
            TokenKind::Ident(_) => "a name",

            TokenKind::And => "'and'",
            TokenKind::As => "'as'",
            TokenKind::Break => "'break'",
            TokenKind::Call => "'call'",
            TokenKind::Continue => "'continue'",
            TokenKind::Define => "'define'",
            TokenKind::Else => "'else'",
            TokenKind::False => "'false'",
            TokenKind::Foreach => "'foreach'",
            TokenKind::If => "'if'",
            TokenKind::Import => "'import'",
            TokenKind::In => "'in'",
            TokenKind::Isa => "'isa'",
            TokenKind::Not => "'not'",
            TokenKind::Null => "'null'",
            TokenKind::Or => "'or'",
            TokenKind::Return => "'return'",
            TokenKind::Reverse => "'reverse'",
            TokenKind::Template => "'template'",
            TokenKind::True => "'true'",

            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::HashParen => "'#('",
            TokenKind::HashHashParen => "'##('",

            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Question => "'?'",
            TokenKind::QuestionDot => "'?.'",
            TokenKind::QuestionBracket => "'?['",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::StarDot => "'*.'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Amp => "'&'",
            TokenKind::Assign => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Spaceship => "'<=>'",
        }
    }

    /// Reserved words, dispatched on first character.
    pub fn reserved(word: &str) -> Option<TokenKind> {
        let kind = match word.as_bytes().first()? {
            b'a' => match word {
                "and" => TokenKind::And,
                "as" => TokenKind::As,
                _ => return None,
            },
            b'b' if word == "break" => TokenKind::Break,
            b'c' => match word {
                "call" => TokenKind::Call,
                "continue" => TokenKind::Continue,
                _ => return None,
            },
            b'd' if word == "define" => TokenKind::Define,
            b'e' if word == "else" => TokenKind::Else,
            b'f' => match word {
                "false" => TokenKind::False,
                "foreach" => TokenKind::Foreach,
                _ => return None,
            },
            b'i' => match word {
                "if" => TokenKind::If,
                "import" => TokenKind::Import,
                "in" => TokenKind::In,
                "isa" => TokenKind::Isa,
                _ => return None,
            },
            b'n' => match word {
                "not" => TokenKind::Not,
                "null" => TokenKind::Null,
                _ => return None,
            },
            b'o' if word == "or" => TokenKind::Or,
            b'r' => match word {
                "return" => TokenKind::Return,
                "reverse" => TokenKind::Reverse,
                _ => return None,
            },
            b't' => match word {
                "template" => TokenKind::Template,
                "true" => TokenKind::True,
                _ => return None,
            },
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_word_dispatch() {
        assert_eq!(TokenKind::reserved("foreach"), Some(TokenKind::Foreach));
        assert_eq!(TokenKind::reserved("isa"), Some(TokenKind::Isa));
        assert_eq!(TokenKind::reserved("in"), Some(TokenKind::In));
        assert_eq!(TokenKind::reserved("inside"), None);
        assert_eq!(TokenKind::reserved("Template"), None);
        assert_eq!(TokenKind::reserved(""), None);
    }
}

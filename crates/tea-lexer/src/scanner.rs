// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The scanner: a text/code state machine over a logos tokenizer.

use logos::Logos;
use tea_ast::token::{NumberLit, Token, TokenKind};
use tea_ast::{LineMap, SourceInfo};
use tea_diagnostics::Reporter;

use crate::error::LexError;
use crate::literal::{decode_number, unescape, valid_number_len, NumberError};

const OPEN_TAG: &str = "<%";

/// Result of scanning a quoted string in a logos callback.
#[derive(Debug, Clone, PartialEq, Default)]
struct StrScan {
    value: String,
    /// (offset from token start, problem)
    problems: Vec<(usize, StrProblem)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StrProblem {
    Escape(char),
    Newline,
    Unterminated,
}

/// Raw code-mode tokens. Literal payloads are decoded in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\x0C]+")]
enum RawToken {
    #[token("%>")]
    CloseTag,

    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment(CommentEnd),

    // Brackets
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("#(")]
    HashParen,
    #[token("##(")]
    HashHashParen,

    // Operators, longest match wins
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("...")]
    Ellipsis,
    #[token("?")]
    Question,
    #[token("?.")]
    QuestionDot,
    #[token("?[")]
    QuestionBracket,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("*.")]
    StarDot,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("<=>")]
    Spaceship,

    // Literals
    #[regex(r"0[xX][0-9a-fA-F]+[lL]?", priority = 6)]
    #[regex(r"[0-9]+[lL]", priority = 6)]
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?[fFdD]?", priority = 6)]
    Number,
    /// Anything that starts like a number but runs into letters.
    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9a-zA-Z_]+)?", priority = 2)]
    BadNumber,

    #[token("\"", |lex| quoted(lex, '"'))]
    #[token("'", |lex| quoted(lex, '\''))]
    Str(StrScan),

    // Reserved words are split out after the match.
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Word,
}

/// Scan a quoted string body. Tags are not recognized inside strings.
fn quoted(lex: &mut logos::Lexer<RawToken>, quote: char) -> StrScan {
    let mut scan = StrScan::default();
    let mut consumed = 0;
    let mut chars = lex.remainder().chars();

    loop {
        match chars.next() {
            None => {
                scan.problems.push((1 + consumed, StrProblem::Unterminated));
                break;
            }
            Some('\n') => {
                // Leave the newline for the whitespace skipper.
                scan.problems.push((1 + consumed, StrProblem::Newline));
                break;
            }
            Some(c) if c == quote => {
                consumed += c.len_utf8();
                break;
            }
            Some('\\') => {
                consumed += 1;
                match chars.next() {
                    None => {
                        scan.problems.push((1 + consumed, StrProblem::Unterminated));
                        break;
                    }
                    Some('\n') => {
                        scan.problems.push((1 + consumed, StrProblem::Newline));
                        break;
                    }
                    Some(e) => {
                        match unescape(e) {
                            Some(v) => scan.value.push(v),
                            None => {
                                scan.problems.push((1 + consumed, StrProblem::Escape(e)));
                                scan.value.push(e);
                            }
                        }
                        consumed += e.len_utf8();
                    }
                }
            }
            Some(c) => {
                consumed += c.len_utf8();
                scan.value.push(c);
            }
        }
    }

    lex.bump(consumed);
    scan
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CommentEnd {
    Closed,
    RanOff,
}

/// Skip to the closing `*/`, or to the end of input.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> CommentEnd {
    match lex.remainder().find("*/") {
        Some(idx) => {
            lex.bump(idx + 2);
            CommentEnd::Closed
        }
        None => {
            let len = lex.remainder().len();
            lex.bump(len);
            CommentEnd::RanOff
        }
    }
}

/// Which state the scanner starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Raw template text until the first `<%`.
    Text,
    /// Code from the first character, as in an embedded snippet.
    Code,
}

/// Turns template source into tokens on demand.
///
/// Tokens can be pushed back without limit. Once the end is reached every
/// further read returns the same EOF token.
pub struct Scanner<'a> {
    source: &'a str,
    lexer: logos::Lexer<'a, RawToken>,
    line_map: LineMap,
    mode: ScanMode,
    pushback: Vec<Token>,
    eof: Token,
    at_end: bool,
    emit_comments: bool,
    reporter: &'a Reporter,
    errors: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, reporter: &'a Reporter) -> Self {
        let line_map = LineMap::new(source);
        let (end_line, _) = line_map.line_col(source.len());
        Self {
            source,
            lexer: RawToken::lexer(source),
            line_map,
            mode: ScanMode::Text,
            pushback: Vec::new(),
            eof: Token::new(TokenKind::Eof, SourceInfo::new(end_line, source.len(), source.len())),
            at_end: false,
            emit_comments: false,
            reporter,
            errors: 0,
        }
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Also emit comment tokens and the `<%`/`%>` boundary markers.
    pub fn emit_comments(mut self, emit: bool) -> Self {
        self.emit_comments = emit;
        self
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn reporter(&self) -> &'a Reporter {
        self.reporter
    }

    /// Number of lexical errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn read_token(&mut self) -> Token {
        match self.pushback.pop() {
            Some(token) => token,
            None => self.scan(),
        }
    }

    pub fn peek_token(&mut self) -> &Token {
        if self.pushback.is_empty() {
            let token = self.scan();
            self.pushback.push(token);
        }
        self.pushback.last().unwrap_or(&self.eof)
    }

    pub fn unread_token(&mut self, token: Token) {
        self.pushback.push(token);
    }

    /// Scan everything that remains, including the final EOF token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.read_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn info(&self, start: usize, end: usize) -> SourceInfo {
        let (line, _) = self.line_map.line_col(start);
        SourceInfo::new(line, start, end)
    }

    fn error(&mut self, error: LexError) {
        self.errors += 1;
        tracing::debug!(%error, "lexical error");
        self.reporter.report_error(&error);
    }

    fn scan(&mut self) -> Token {
        loop {
            if self.at_end {
                return self.eof.clone();
            }
            let next = match self.mode {
                ScanMode::Text => self.scan_text(),
                ScanMode::Code => self.scan_code(),
            };
            if let Some(token) = next {
                return token;
            }
        }
    }

    /// Raw text up to the next open tag.
    fn scan_text(&mut self) -> Option<Token> {
        let start = self.lexer.span().end;
        let rest = self.lexer.remainder();
        if rest.is_empty() {
            self.at_end = true;
            return None;
        }
        match rest.find(OPEN_TAG) {
            Some(0) => {
                self.lexer.bump(OPEN_TAG.len());
                self.mode = ScanMode::Code;
                self.emit_comments
                    .then(|| Token::new(TokenKind::EnterCode, self.info(start, start + OPEN_TAG.len())))
            }
            Some(idx) => {
                let text = rest[..idx].to_string();
                self.lexer.bump(idx);
                Some(Token::new(TokenKind::Text(text), self.info(start, start + idx)))
            }
            None => {
                let text = rest.to_string();
                self.lexer.bump(rest.len());
                Some(Token::new(TokenKind::Text(text), self.info(start, start + rest.len())))
            }
        }
    }

    fn scan_code(&mut self) -> Option<Token> {
        let Some(result) = self.lexer.next() else {
            self.at_end = true;
            return None;
        };
        let span = self.lexer.span();
        let slice = self.lexer.slice();
        let info = self.info(span.start, span.end);

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                let ch = self.source[span.start..].chars().next().unwrap_or('?');
                self.error(LexError::IllegalChar { ch, info });
                return None;
            }
        };

        let kind = match raw {
            RawToken::CloseTag => {
                self.mode = ScanMode::Text;
                return self.emit_comments.then(|| Token::new(TokenKind::EnterText, info));
            }
            RawToken::LineComment => {
                let text = slice[2..].to_string();
                return self.emit_comments.then(|| Token::new(TokenKind::Comment(text), info));
            }
            RawToken::BlockComment(end) => {
                let terminated = end == CommentEnd::Closed;
                if !terminated {
                    self.error(LexError::UnterminatedComment { info });
                }
                let body = slice.get(2..slice.len().saturating_sub(2)).unwrap_or("");
                let text = if terminated { body } else { &slice[2..] }.to_string();
                return self.emit_comments.then(|| Token::new(TokenKind::Comment(text), info));
            }

            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::HashParen => TokenKind::HashParen,
            RawToken::HashHashParen => TokenKind::HashHashParen,

            RawToken::Comma => TokenKind::Comma,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::DotDot => TokenKind::DotDot,
            RawToken::Ellipsis => TokenKind::Ellipsis,
            RawToken::Question => TokenKind::Question,
            RawToken::QuestionDot => TokenKind::QuestionDot,
            RawToken::QuestionBracket => TokenKind::QuestionBracket,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::StarDot => TokenKind::StarDot,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Assign => TokenKind::Assign,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::BangEq => TokenKind::BangEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Spaceship => TokenKind::Spaceship,

            RawToken::Number => match decode_number(slice) {
                Ok(value) => TokenKind::Number(value),
                Err(NumberError::OutOfRange) => {
                    let text = slice.to_string();
                    self.error(LexError::NumberOutOfRange { text, info });
                    TokenKind::Number(NumberLit::Int(0))
                }
                Err(NumberError::Invalid) => {
                    let text = slice.to_string();
                    self.error(LexError::InvalidNumber { text, info });
                    TokenKind::Number(NumberLit::Int(0))
                }
            },
            RawToken::BadNumber => {
                let valid = valid_number_len(slice);
                let value = decode_number(&slice[..valid]).unwrap_or(NumberLit::Int(0));
                let text = slice.to_string();
                self.error(LexError::InvalidNumber { text, info: info.with_detail(span.start + valid) });
                TokenKind::Number(value)
            }
            RawToken::Str(scan) => {
                for (offset, problem) in scan.problems {
                    let at = info.with_detail(span.start + offset);
                    let error = match problem {
                        StrProblem::Escape(ch) => LexError::InvalidEscape { ch, info: at },
                        StrProblem::Newline => LexError::NewlineInString { info: at },
                        StrProblem::Unterminated => LexError::UnterminatedString { info: at },
                    };
                    self.error(error);
                }
                TokenKind::String(scan.value)
            }
            RawToken::Word => {
                TokenKind::reserved(slice).unwrap_or_else(|| TokenKind::Ident(slice.to_string()))
            }
        };
        Some(Token::new(kind, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use tea_diagnostics::CollectingListener;

    fn kinds(source: &str, mode: ScanMode) -> Vec<TokenKind> {
        let reporter = Reporter::new();
        Scanner::new(source, &reporter)
            .with_mode(mode)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn code(source: &str) -> Vec<TokenKind> {
        kinds(source, ScanMode::Code)
    }

    fn scan_with_errors(source: &str) -> (Vec<Token>, Vec<String>) {
        let reporter = Reporter::new();
        let listener = Rc::new(CollectingListener::new());
        reporter.add_listener(listener.clone());
        let tokens = Scanner::new(source, &reporter).with_mode(ScanMode::Code).tokenize();
        (tokens, listener.messages())
    }

    #[test]
    fn numeric_literals_round_trip() {
        let cases = [
            ("123", NumberLit::Int(123)),
            ("123L", NumberLit::Long(123)),
            ("1.5f", NumberLit::Float(1.5)),
            ("1.5d", NumberLit::Double(1.5)),
            ("1.5", NumberLit::Double(1.5)),
            ("0x7B", NumberLit::Int(123)),
            ("1e10", NumberLit::Double(1e10)),
        ];
        for (text, expected) in cases {
            assert_eq!(code(text), vec![TokenKind::Number(expected), TokenKind::Eof], "scanning {}", text);
        }
    }

    #[test]
    fn text_and_code_regions_alternate() {
        let toks = kinds("Hi <% name %>!", ScanMode::Text);
        assert_eq!(
            toks,
            vec![
                TokenKind::Text("Hi ".into()),
                TokenKind::Ident("name".into()),
                TokenKind::Text("!".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn boundary_markers_only_when_enabled() {
        let reporter = Reporter::new();
        let toks: Vec<_> = Scanner::new("a<%b%>c", &reporter)
            .emit_comments(true)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            toks,
            vec![
                TokenKind::Text("a".into()),
                TokenKind::EnterCode,
                TokenKind::Ident("b".into()),
                TokenKind::EnterText,
                TokenKind::Text("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn multi_char_operators_disambiguate() {
        assert_eq!(
            code("< <= <=> . .. ... * *. ? ?. ?["),
            vec![
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Spaceship,
                TokenKind::Dot,
                TokenKind::DotDot,
                TokenKind::Ellipsis,
                TokenKind::Star,
                TokenKind::StarDot,
                TokenKind::Question,
                TokenKind::QuestionDot,
                TokenKind::QuestionBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn range_bounds_are_not_floats() {
        assert_eq!(
            code("1..5"),
            vec![
                TokenKind::Number(NumberLit::Int(1)),
                TokenKind::DotDot,
                TokenKind::Number(NumberLit::Int(5)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reserved_words_and_identifiers() {
        assert_eq!(
            code("foreach forever isa"),
            vec![TokenKind::Foreach, TokenKind::Ident("forever".into()), TokenKind::Isa, TokenKind::Eof]
        );
    }

    #[test]
    fn string_escapes_decode() {
        assert_eq!(
            code(r#""a\tb\"c" 'it\'s'"#),
            vec![TokenKind::String("a\tb\"c".into()), TokenKind::String("it's".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn close_tag_inside_string_is_text() {
        assert_eq!(code(r#""50%> done""#), vec![TokenKind::String("50%> done".into()), TokenKind::Eof]);
    }

    #[test]
    fn newline_in_string_is_recoverable() {
        let (tokens, errors) = scan_with_errors("\"abc\nx");
        assert_eq!(tokens[0].kind, TokenKind::String("abc".into()));
        assert_eq!(tokens[1].kind, TokenKind::Ident("x".into()));
        assert_eq!(errors, vec!["Line break in string literal".to_string()]);
    }

    #[test]
    fn malformed_number_is_consumed_and_flagged() {
        let (tokens, errors) = scan_with_errors("123abc + 1");
        assert_eq!(tokens[0].kind, TokenKind::Number(NumberLit::Int(123)));
        assert_eq!(tokens[0].info.detail, Some(3));
        assert_eq!(tokens[1].kind, TokenKind::Plus);
        assert_eq!(errors, vec!["Invalid number: 123abc".to_string()]);
    }

    #[test]
    fn comments_are_skipped_by_default() {
        assert_eq!(code("a // note\n/* block */ b"), vec![
            TokenKind::Ident("a".into()),
            TokenKind::Ident("b".into()),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn unterminated_comment_reports() {
        let (tokens, errors) = scan_with_errors("a /* never closed");
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors, vec!["Unterminated comment".to_string()]);
    }

    #[test]
    fn illegal_character_reports_and_continues() {
        let (tokens, errors) = scan_with_errors("a @ b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(errors, vec!["Illegal character: '@'".to_string()]);
    }

    #[test]
    fn eof_is_sticky_and_pushback_unbounded() {
        let reporter = Reporter::new();
        let mut scanner = Scanner::new("a b", &reporter).with_mode(ScanMode::Code);
        let a = scanner.read_token();
        let b = scanner.read_token();
        let eof1 = scanner.read_token();
        let eof2 = scanner.read_token();
        assert!(eof1.is_eof());
        assert_eq!(eof1, eof2);

        scanner.unread_token(eof1);
        scanner.unread_token(b.clone());
        scanner.unread_token(a.clone());
        assert_eq!(scanner.peek_token(), &a);
        assert_eq!(scanner.read_token(), a);
        assert_eq!(scanner.read_token(), b);
        assert!(scanner.read_token().is_eof());
    }

    #[test]
    fn tokens_carry_line_numbers() {
        let reporter = Reporter::new();
        let tokens = Scanner::new("line1\n<% a\n  b %>", &reporter).tokenize();
        assert_eq!(tokens[0].info.line, 1);
        assert_eq!(tokens[1].info.line, 2);
        assert_eq!(tokens[2].info.line, 3);
    }
}

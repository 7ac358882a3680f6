// File: src/lexer.rs
//
// Lexical analyzer (scanner) for the Kat programming language.
// Converts raw source bytes into a lazy stream of tokens for the parser.
//
// Supports:
// - Keywords: let, const, if, else, for, fn, struct, self, import, return, true, false
// - Identifiers, integer and float literals
// - String literals with escape sequences
// - Operators: + - * / % = == != ! < <= > >= ++ -- ? :
// - Punctuation: ( ) { } [ ] , . ;
// - Newlines as explicit EOL tokens (statements are line-terminated)

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Literals
    Integer,
    Float,
    String,
    Identifier,

    // Keywords
    Let,
    Const,
    If,
    Else,
    For,
    Fn,
    Struct,
    SelfKw,
    Import,
    Return,
    True,
    False,

    // Single character
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Bang,
    Less,
    Greater,
    Question,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Double character
    PlusPlus,
    MinusMinus,
    EqualEqual,
    BangEqual,
    LessEqual,
    GreaterEqual,

    // Special
    Eol,
    Eof,
    Invalid,
}

impl TokenKind {
    /// Human readable name used in parse diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Let => "`let`",
            TokenKind::Const => "`const`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::For => "`for`",
            TokenKind::Fn => "`fn`",
            TokenKind::Struct => "`struct`",
            TokenKind::SelfKw => "`self`",
            TokenKind::Import => "`import`",
            TokenKind::Return => "`return`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Assign => "`=`",
            TokenKind::Bang => "`!`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::Question => "`?`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::EqualEqual => "`==`",
            TokenKind::BangEqual => "`!=`",
            TokenKind::LessEqual => "`<=`",
            TokenKind::GreaterEqual => "`>=`",
            TokenKind::Eol => "end of line",
            TokenKind::Eof => "end of input",
            TokenKind::Invalid => "invalid character",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A scanned token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The lexeme; for string literals this is the unescaped contents
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token { kind, text: text.into(), line, column }
    }

    pub fn location(&self) -> crate::errors::SourceLocation {
        crate::errors::SourceLocation::new(self.line, self.column)
    }
}

/// Fixed keyword table; anything else is an identifier
fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "fn" => TokenKind::Fn,
        "struct" => TokenKind::Struct,
        "self" => TokenKind::SelfKw,
        "import" => TokenKind::Import,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

/// Byte-oriented scanner that produces one token per call.
///
/// The scanner keeps no lookahead buffer beyond the byte it is looking at;
/// two-character operators are recognized by peeking one byte ahead.
/// Unrecognized bytes become `Invalid` tokens and the parser decides what
/// to do with them. After the end of input every call returns `Eof`.
pub struct Lexer<'src> {
    input: &'src [u8],
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    pub fn from_bytes(input: &'src [u8]) -> Self {
        Lexer { input, pos: 0, line: 1, column: 1, finished: false }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(byte)
    }

    fn lexeme(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Scan the next token
    pub fn next_token(&mut self) -> Token {
        while let Some(b' ' | b'\t' | b'\r') = self.peek_byte() {
            self.bump();
        }

        let (line, column, start) = (self.line, self.column, self.pos);

        let Some(byte) = self.bump() else {
            return Token::new(TokenKind::Eof, "", line, column);
        };

        let simple = |kind: TokenKind| Token::new(kind, (byte as char).to_string(), line, column);

        match byte {
            b'\n' => Token::new(TokenKind::Eol, "\\n", line, column),
            b'"' => self.scan_string(line, column),
            b'0'..=b'9' => self.scan_number(start, line, column),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while let Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') = self.peek_byte() {
                    self.bump();
                }
                let text = self.lexeme(start);
                let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
                Token::new(kind, text, line, column)
            }
            b'+' => self.either(b'+', TokenKind::PlusPlus, TokenKind::Plus, start, line, column),
            b'-' => self.either(b'-', TokenKind::MinusMinus, TokenKind::Minus, start, line, column),
            b'=' => self.either(b'=', TokenKind::EqualEqual, TokenKind::Assign, start, line, column),
            b'!' => self.either(b'=', TokenKind::BangEqual, TokenKind::Bang, start, line, column),
            b'<' => self.either(b'=', TokenKind::LessEqual, TokenKind::Less, start, line, column),
            b'>' => {
                self.either(b'=', TokenKind::GreaterEqual, TokenKind::Greater, start, line, column)
            }
            b'*' => simple(TokenKind::Star),
            b'/' => simple(TokenKind::Slash),
            b'%' => simple(TokenKind::Percent),
            b'?' => simple(TokenKind::Question),
            b':' => simple(TokenKind::Colon),
            b';' => simple(TokenKind::Semicolon),
            b',' => simple(TokenKind::Comma),
            b'.' => simple(TokenKind::Dot),
            b'(' => simple(TokenKind::LParen),
            b')' => simple(TokenKind::RParen),
            b'{' => simple(TokenKind::LBrace),
            b'}' => simple(TokenKind::RBrace),
            b'[' => simple(TokenKind::LBracket),
            b']' => simple(TokenKind::RBracket),
            _ => Token::new(TokenKind::Invalid, self.lexeme(start), line, column),
        }
    }

    /// One-byte lookahead for two-character operators
    fn either(
        &mut self,
        second: u8,
        double: TokenKind,
        single: TokenKind,
        start: usize,
        line: usize,
        column: usize,
    ) -> Token {
        let kind = if self.peek_byte() == Some(second) {
            self.bump();
            double
        } else {
            single
        };
        Token::new(kind, self.lexeme(start), line, column)
    }

    /// Digits with at most one `.`; a second `.` ends the literal
    fn scan_number(&mut self, start: usize, line: usize, column: usize) -> Token {
        let mut seen_dot = false;
        while let Some(byte) = self.peek_byte() {
            match byte {
                b'0'..=b'9' => {
                    self.bump();
                }
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.bump();
                }
                _ => break,
            }
        }
        let kind = if seen_dot { TokenKind::Float } else { TokenKind::Integer };
        Token::new(kind, self.lexeme(start), line, column)
    }

    /// An unterminated string runs to the end of input
    fn scan_string(&mut self, line: usize, column: usize) -> Token {
        let mut bytes = Vec::new();
        while let Some(byte) = self.bump() {
            match byte {
                b'"' => break,
                b'\\' => match self.bump() {
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(b'r') => bytes.push(b'\r'),
                    Some(other) => bytes.push(other),
                    None => bytes.push(b'\\'),
                },
                other => bytes.push(other),
            }
        }
        Token::new(TokenKind::String, String::from_utf8_lossy(&bytes).into_owned(), line, column)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token including the final `Eof`, then stops
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

/// Tokenizes a whole source string eagerly; mostly useful for tests and tools
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("let const if else for fn struct self import return true false name"),
            vec![
                TokenKind::Let,
                TokenKind::Const,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::Fn,
                TokenKind::Struct,
                TokenKind::SelfKw,
                TokenKind::Import,
                TokenKind::Return,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("++ -- == != <= >= + - = ! < >"),
            vec![
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Assign,
                TokenKind::Bang,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_is_a_token_and_resets_column() {
        let tokens = tokenize("a\n  b");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!(tokens[1].kind, TokenKind::Eol);
        assert_eq!(tokens[2].text, "b");
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_carriage_return_and_tabs_are_whitespace() {
        assert_eq!(kinds("a\t\r\nb"), vec![
            TokenKind::Identifier,
            TokenKind::Eol,
            TokenKind::Identifier,
            TokenKind::Eof
        ]);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.14");
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].text, "3.14");
    }

    #[test]
    fn test_second_dot_ends_number() {
        let tokens = tokenize("1.2.3");
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].text, "1.2");
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[2].kind, TokenKind::Integer);
        assert_eq!(tokens[2].text, "3");
    }

    #[test]
    fn test_string_with_escapes() {
        let tokens = tokenize(r#""a\"b\n""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a\"b\n");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_string_extends_to_end_of_input() {
        let tokens = tokenize("let s = \"never closed\nlet x = 1");
        assert_eq!(tokens[3].kind, TokenKind::String);
        assert_eq!(tokens[3].text, "never closed\nlet x = 1");
        assert_eq!(tokens[4].kind, TokenKind::Eof);
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_invalid_character_produces_invalid_token() {
        let tokens = tokenize("a @ b");
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].text, "@");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_eof_repeats_after_end() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}

// File: src/parser.rs
//
// Precedence-climbing (Pratt) parser for the Kat programming language.
// Transforms the scanner's token stream into an Abstract Syntax Tree (AST).
//
// Every token kind may own a prefix parselet (the start of an expression)
// and/or an infix parselet (an operator that binds a left-hand expression)
// together with a binding power. Statement keywords dispatch to dedicated
// statement parsers before falling back to an expression statement.
//
// Associativity rules:
// - left-associative operators parse their right operand at their own power
// - assignment and the ternary else-arm re-enter at (power - 1), which makes
//   them right-associative
//
// The parser keeps exactly one token of lookahead (`peek`) next to the token
// it has just consumed (`current`). Any syntax error is fatal.

use crate::ast::{BinaryOp, Block, Expr, FunctionTarget, PostfixOp, PrefixOp, Program, Stmt};
use crate::errors::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};
use std::rc::Rc;

pub type ParseResult<T> = Result<T, ParseError>;

type PrefixParselet<'src> = fn(&mut Parser<'src>) -> ParseResult<Expr>;
type InfixParselet<'src> = fn(&mut Parser<'src>, Expr) -> ParseResult<Expr>;
type StatementParselet<'src> = fn(&mut Parser<'src>) -> ParseResult<Stmt>;

/// Binding powers, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assignment,
    Conditional,
    Comparison,
    Sum,
    Product,
    Prefix,
    Postfix,
    Call,
    Index,
}

impl Precedence {
    /// One step down; used to make an operator right-associative
    fn lower(self) -> Precedence {
        match self {
            Precedence::Lowest | Precedence::Assignment => Precedence::Lowest,
            Precedence::Conditional => Precedence::Assignment,
            Precedence::Comparison => Precedence::Conditional,
            Precedence::Sum => Precedence::Comparison,
            Precedence::Product => Precedence::Sum,
            Precedence::Prefix => Precedence::Product,
            Precedence::Postfix => Precedence::Prefix,
            Precedence::Call => Precedence::Postfix,
            Precedence::Index => Precedence::Call,
        }
    }
}

/// Infix binding power of a token kind; `Lowest` means "not an infix operator"
fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign => Precedence::Assignment,
        TokenKind::Question => Precedence::Conditional,
        TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::Less
        | TokenKind::Greater
        | TokenKind::LessEqual
        | TokenKind::GreaterEqual => Precedence::Comparison,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::PlusPlus | TokenKind::MinusMinus => Precedence::Postfix,
        TokenKind::LParen | TokenKind::LBrace => Precedence::Call,
        TokenKind::LBracket | TokenKind::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        _ => return None,
    };
    Some(op)
}

/// Parse a whole source unit
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(Lexer::new(source)).parse_program()
}

/// Parser state: the scanner, the consumed token and one token of lookahead
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    peek: Token,
    /// Set while parsing `if`/`for` headers, where `{` opens the body
    no_struct_literal: bool,
}

impl<'src> Parser<'src> {
    /// Creates a new parser reading from the given scanner
    pub fn new(mut lexer: Lexer<'src>) -> Self {
        let peek = lexer.next_token();
        Parser {
            lexer,
            current: Token::new(TokenKind::Eol, "", 1, 1),
            peek,
            no_struct_literal: false,
        }
    }

    /// Consume the lookahead token and make it current
    fn advance(&mut self) -> &Token {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
        &self.current
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        if found.kind == TokenKind::Invalid {
            return ParseError::InvalidCharacter {
                lexeme: found.text.clone(),
                location: found.location(),
            };
        }
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: match found.kind {
                TokenKind::Eol | TokenKind::Eof => found.kind.describe().to_string(),
                _ => format!("`{}`", found.text),
            },
            location: found.location(),
        }
    }

    /// Consume the next token if it has the given kind, fail otherwise
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.peek.kind != kind {
            return Err(self.unexpected(kind.describe(), &self.peek));
        }
        Ok(self.advance().clone())
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        if self.peek.kind != TokenKind::Identifier {
            return Err(self.unexpected(what, &self.peek));
        }
        Ok(self.advance().text.clone())
    }

    fn skip_eols(&mut self) {
        while self.peek.kind == TokenKind::Eol {
            self.advance();
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek.kind, TokenKind::Eol | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn expect_statement_end(&self) -> ParseResult<()> {
        match self.peek.kind {
            TokenKind::Eol | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement", &self.peek)),
        }
    }

    fn with_struct_literals<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.no_struct_literal, false);
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }

    fn without_struct_literals<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.no_struct_literal, true);
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }

    /// Comma separated items up to `close`; newlines are allowed anywhere
    /// inside the brackets and a trailing comma is accepted
    fn parse_list<T>(
        &mut self,
        close: TokenKind,
        item: impl Fn(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        self.skip_eols();
        while self.peek.kind != close {
            items.push(item(self)?);
            self.skip_eols();
            if self.peek.kind == TokenKind::Comma {
                self.advance();
                self.skip_eols();
            } else {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // --- PROGRAM AND STATEMENTS ---

    /// Parse statements until end of input
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut body = Vec::new();
        loop {
            self.skip_terminators();
            if self.peek.kind == TokenKind::Eof {
                break;
            }
            let stmt = self.parse_statement()?;
            self.expect_statement_end()?;
            body.push(stmt);
        }
        Ok(Program { body })
    }

    fn statement_rule(kind: TokenKind) -> Option<StatementParselet<'src>> {
        let rule: StatementParselet<'src> = match kind {
            TokenKind::Let => Self::parse_let,
            TokenKind::Const => Self::parse_const,
            TokenKind::Struct => Self::parse_struct,
            TokenKind::Fn => Self::parse_function_statement,
            TokenKind::If => Self::parse_if,
            TokenKind::For => Self::parse_for,
            TokenKind::Return => Self::parse_return,
            TokenKind::LBrace => Self::parse_block_statement,
            _ => return None,
        };
        Some(rule)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match Self::statement_rule(self.peek.kind) {
            Some(rule) => rule(self),
            None => Ok(Stmt::Expression { expr: self.parse_expression(Precedence::Lowest)? }),
        }
    }

    /// Shared by `let` and `const`: `<keyword> <target> = <value>`
    fn parse_binding(&mut self) -> ParseResult<(Token, Expr, Expr)> {
        let token = self.advance().clone();
        let target = self.parse_expression(Precedence::Assignment)?;
        self.expect(TokenKind::Assign)?;
        self.skip_eols();
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok((token, target, value))
    }

    fn parse_let(&mut self) -> ParseResult<Stmt> {
        let (token, target, value) = self.parse_binding()?;
        Ok(Stmt::Let { token, target, value })
    }

    fn parse_const(&mut self) -> ParseResult<Stmt> {
        let (token, target, value) = self.parse_binding()?;
        Ok(Stmt::Const { token, target, value })
    }

    /// `struct Name { a, b }`; commas between fields are optional when
    /// fields sit on separate lines
    fn parse_struct(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone();
        let name = self.expect_identifier("struct name")?;
        self.skip_eols();
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        loop {
            self.skip_eols();
            if self.peek.kind == TokenKind::RBrace {
                break;
            }
            fields.push(self.expect_identifier("field name")?);
            if self.peek.kind == TokenKind::Comma {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Stmt::Struct { token, name, fields })
    }

    /// `fn name(...) {}` or `fn Receiver.method(...) {}`; a `fn` followed
    /// directly by `(` is an anonymous function used as an expression
    fn parse_function_statement(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone();

        if self.peek.kind == TokenKind::LParen {
            let literal = self.parse_function_literal()?;
            let expr = self.parse_infix(literal, Precedence::Lowest)?;
            return Ok(Stmt::Expression { expr });
        }

        let name = self.expect_identifier("function name")?;
        let target = if self.peek.kind == TokenKind::Dot {
            self.advance();
            let method = self.expect_identifier("method name")?;
            FunctionTarget::Method { receiver: name, method }
        } else {
            FunctionTarget::Name(name)
        };

        let params = self.parse_params()?;
        let body = Rc::new(self.parse_block()?);

        Ok(Stmt::Function { token, target, params, body })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<String>> {
        self.expect(TokenKind::LParen)?;
        self.parse_list(TokenKind::RParen, |p| match p.peek.kind {
            TokenKind::Identifier | TokenKind::SelfKw => Ok(p.advance().text.clone()),
            _ => Err(p.unexpected("parameter name", &p.peek)),
        })
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let token = self.expect(TokenKind::LBrace)?;
        let body = self.with_struct_literals(|p| {
            let mut body = Vec::new();
            loop {
                p.skip_terminators();
                match p.peek.kind {
                    TokenKind::RBrace => break,
                    TokenKind::Eof => return Err(p.unexpected("`}`", &p.peek)),
                    _ => {}
                }
                let stmt = p.parse_statement()?;
                p.expect_statement_end()?;
                body.push(stmt);
            }
            Ok(body)
        })?;
        self.expect(TokenKind::RBrace)?;
        Ok(Block { token, body })
    }

    fn parse_block_statement(&mut self) -> ParseResult<Stmt> {
        Ok(Stmt::Block(self.parse_block()?))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone();
        let condition = self.without_struct_literals(|p| p.parse_expression(Precedence::Lowest))?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.peek.kind == TokenKind::Else {
            self.advance();
            if self.peek.kind == TokenKind::If {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };

        Ok(Stmt::If { token, condition, then_branch, else_branch })
    }

    /// A leading `let` selects the classic three-part form
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone();

        if self.peek.kind == TokenKind::Let {
            let init = Box::new(self.parse_let()?);
            self.expect(TokenKind::Semicolon)?;
            let condition =
                self.without_struct_literals(|p| p.parse_expression(Precedence::Lowest))?;
            self.expect(TokenKind::Semicolon)?;
            let post = self.without_struct_literals(|p| p.parse_expression(Precedence::Lowest))?;
            let body = self.parse_block()?;
            return Ok(Stmt::ClassicFor { token, init, condition, post, body });
        }

        let condition = self.without_struct_literals(|p| p.parse_expression(Precedence::Lowest))?;
        let body = self.parse_block()?;
        Ok(Stmt::ModernFor { token, condition, body })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone();
        let value = match self.peek.kind {
            TokenKind::Eol | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
            _ => Some(self.parse_expression(Precedence::Lowest)?),
        };
        Ok(Stmt::Return { token, value })
    }

    // --- EXPRESSIONS ---

    fn prefix_rule(kind: TokenKind) -> Option<PrefixParselet<'src>> {
        let rule: PrefixParselet<'src> = match kind {
            TokenKind::Integer => Self::parse_integer,
            TokenKind::Float => Self::parse_float,
            TokenKind::String => Self::parse_string,
            TokenKind::True | TokenKind::False => Self::parse_boolean,
            TokenKind::Identifier => Self::parse_identifier,
            TokenKind::SelfKw => Self::parse_self,
            TokenKind::Minus | TokenKind::Bang | TokenKind::PlusPlus | TokenKind::MinusMinus => {
                Self::parse_prefix
            }
            TokenKind::LParen => Self::parse_group,
            TokenKind::LBracket => Self::parse_array,
            TokenKind::LBrace => Self::parse_map,
            TokenKind::Fn => Self::parse_function_literal,
            TokenKind::Import => Self::parse_import,
            _ => return None,
        };
        Some(rule)
    }

    fn infix_rule(kind: TokenKind) -> Option<InfixParselet<'src>> {
        let rule: InfixParselet<'src> = match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual
            | TokenKind::EqualEqual
            | TokenKind::BangEqual => Self::parse_binary,
            TokenKind::Assign => Self::parse_assign,
            TokenKind::Question => Self::parse_ternary,
            TokenKind::PlusPlus | TokenKind::MinusMinus => Self::parse_postfix,
            TokenKind::LParen => Self::parse_call,
            TokenKind::LBracket => Self::parse_index,
            TokenKind::Dot => Self::parse_member,
            TokenKind::LBrace => Self::parse_struct_literal,
            _ => return None,
        };
        Some(rule)
    }

    fn peek_precedence(&self) -> Precedence {
        if self.no_struct_literal && self.peek.kind == TokenKind::LBrace {
            return Precedence::Lowest;
        }
        infix_precedence(self.peek.kind)
    }

    /// Parse an expression whose operators all bind tighter than `min`
    pub fn parse_expression(&mut self, min: Precedence) -> ParseResult<Expr> {
        self.advance();
        let token = &self.current;
        let prefix = match Self::prefix_rule(token.kind) {
            Some(rule) => rule,
            None => {
                return Err(match token.kind {
                    TokenKind::Eol | TokenKind::Eof | TokenKind::Invalid => {
                        self.unexpected("expression", token)
                    }
                    _ => ParseError::NoPrefixParselet {
                        lexeme: token.text.clone(),
                        location: token.location(),
                    },
                })
            }
        };
        let left = prefix(self)?;
        self.parse_infix(left, min)
    }

    /// The climbing loop: fold infix operators into `left` while they bind
    /// tighter than `min`
    fn parse_infix(&mut self, mut left: Expr, min: Precedence) -> ParseResult<Expr> {
        while self.peek.kind != TokenKind::Eol && self.peek_precedence() > min {
            self.advance();
            let infix = Self::infix_rule(self.current.kind).ok_or_else(|| {
                ParseError::NoInfixParselet {
                    lexeme: self.current.text.clone(),
                    location: self.current.location(),
                }
            })?;
            left = infix(self, left)?;
        }
        Ok(left)
    }

    fn parse_integer(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let value = token.text.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
            lexeme: token.text.clone(),
            location: token.location(),
        })?;
        Ok(Expr::Integer { token, value })
    }

    fn parse_float(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let value = token.text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
            lexeme: token.text.clone(),
            location: token.location(),
        })?;
        Ok(Expr::Float { token, value })
    }

    fn parse_string(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let value = token.text.clone();
        Ok(Expr::Str { token, value })
    }

    fn parse_boolean(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let value = token.kind == TokenKind::True;
        Ok(Expr::Boolean { token, value })
    }

    fn parse_identifier(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let name = token.text.clone();
        Ok(Expr::Identifier { token, name })
    }

    fn parse_self(&mut self) -> ParseResult<Expr> {
        Ok(Expr::SelfRef { token: self.current.clone() })
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let op = match token.kind {
            TokenKind::Minus => PrefixOp::Negate,
            TokenKind::Bang => PrefixOp::Not,
            TokenKind::PlusPlus => PrefixOp::Increment,
            _ => PrefixOp::Decrement,
        };
        let right = Box::new(self.parse_expression(Precedence::Prefix)?);
        Ok(Expr::Prefix { token, op, right })
    }

    fn parse_group(&mut self) -> ParseResult<Expr> {
        self.with_struct_literals(|p| {
            p.skip_eols();
            let expr = p.parse_expression(Precedence::Lowest)?;
            p.skip_eols();
            p.expect(TokenKind::RParen)?;
            Ok(expr)
        })
    }

    fn parse_array(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let elements = self.with_struct_literals(|p| {
            p.parse_list(TokenKind::RBracket, |p| p.parse_expression(Precedence::Lowest))
        })?;
        Ok(Expr::Array { token, elements })
    }

    fn parse_map(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let entries = self.with_struct_literals(|p| {
            p.parse_list(TokenKind::RBrace, |p| {
                let key = p.parse_expression(Precedence::Conditional)?;
                p.expect(TokenKind::Colon)?;
                p.skip_eols();
                let value = p.parse_expression(Precedence::Lowest)?;
                Ok((key, value))
            })
        })?;
        Ok(Expr::Map { token, entries })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        let params = self.parse_params()?;
        let body = Rc::new(self.parse_block()?);
        Ok(Expr::Function { token, params, body })
    }

    fn parse_import(&mut self) -> ParseResult<Expr> {
        let token = self.current.clone();
        self.expect(TokenKind::LParen)?;
        let path = self.with_struct_literals(|p| p.parse_expression(Precedence::Lowest))?;
        self.expect(TokenKind::RParen)?;
        Ok(Expr::Import { token, path: Box::new(path) })
    }

    fn parse_binary(&mut self, left: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let op = binary_op(token.kind).ok_or_else(|| ParseError::NoInfixParselet {
            lexeme: token.text.clone(),
            location: token.location(),
        })?;
        self.skip_eols();
        let right = self.parse_expression(infix_precedence(token.kind))?;
        Ok(Expr::Binary { token, op, left: Box::new(left), right: Box::new(right) })
    }

    /// Right-associative; the target must be a name or a member access
    fn parse_assign(&mut self, left: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let assignable = matches!(
            left,
            Expr::Identifier { .. } | Expr::Binary { op: BinaryOp::Member, .. }
        );
        if !assignable {
            return Err(ParseError::InvalidSyntax {
                message: "invalid assignment target".to_string(),
                location: token.location(),
            });
        }
        self.skip_eols();
        let right = self.parse_expression(Precedence::Assignment.lower())?;
        Ok(Expr::Binary { token, op: BinaryOp::Assign, left: Box::new(left), right: Box::new(right) })
    }

    fn parse_ternary(&mut self, condition: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let then_arm = self.with_struct_literals(|p| {
            p.skip_eols();
            let arm = p.parse_expression(Precedence::Lowest)?;
            p.skip_eols();
            Ok(arm)
        })?;
        self.expect(TokenKind::Colon)?;
        self.skip_eols();
        let else_arm = self.parse_expression(Precedence::Conditional.lower())?;
        Ok(Expr::Ternary {
            token,
            condition: Box::new(condition),
            then_arm: Box::new(then_arm),
            else_arm: Box::new(else_arm),
        })
    }

    fn parse_postfix(&mut self, left: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let op = match token.kind {
            TokenKind::PlusPlus => PostfixOp::Increment,
            _ => PostfixOp::Decrement,
        };
        Ok(Expr::Postfix { token, op, left: Box::new(left) })
    }

    fn parse_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let args = self.with_struct_literals(|p| {
            p.parse_list(TokenKind::RParen, |p| p.parse_expression(Precedence::Lowest))
        })?;
        Ok(Expr::Call { token, callee: Box::new(callee), args })
    }

    fn parse_index(&mut self, left: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let index = self.with_struct_literals(|p| {
            p.skip_eols();
            let index = p.parse_expression(Precedence::Lowest)?;
            p.skip_eols();
            Ok(index)
        })?;
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Index { token, left: Box::new(left), index: Box::new(index) })
    }

    fn parse_member(&mut self, left: Expr) -> ParseResult<Expr> {
        let token = self.current.clone();
        let name_token = self.expect(TokenKind::Identifier)?;
        let right = Expr::Identifier { name: name_token.text.clone(), token: name_token };
        Ok(Expr::Binary { token, op: BinaryOp::Member, left: Box::new(left), right: Box::new(right) })
    }

    /// `Name { field: value }`; only valid directly after a struct name
    fn parse_struct_literal(&mut self, left: Expr) -> ParseResult<Expr> {
        let name = match left {
            Expr::Identifier { name, .. } => name,
            other => {
                return Err(ParseError::InvalidSyntax {
                    message: "struct literal requires a struct name".to_string(),
                    location: other.token().location(),
                })
            }
        };
        let token = self.current.clone();
        let fields = self.with_struct_literals(|p| {
            p.parse_list(TokenKind::RBrace, |p| {
                let field = p.expect_identifier("field name")?;
                p.expect(TokenKind::Colon)?;
                p.skip_eols();
                let value = p.parse_expression(Precedence::Lowest)?;
                Ok((field, value))
            })
        })?;
        Ok(Expr::StructLiteral { token, name, fields })
    }
}

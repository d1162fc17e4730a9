//! Expression text parser.
//!
//! Hand-written tokenizer and precedence-climbing parser for the supported
//! expression subset. Precedence, loosest first: OR, AND, NOT, comparison /
//! IN, `|`, `^`, `&`, shifts, additive, multiplicative, unary minus, `->`
//! member access, primary.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::{CompareOp, Value};
use crate::rowql::sql::expr::{BinaryOp, Expr, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Symbol(&'static str),
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            chars: text.char_indices().peekable(),
            text,
        }
    }

    fn tokenize(mut self) -> SqlResult<Vec<(usize, Token)>> {
        let mut tokens = Vec::new();
        while let Some(&(pos, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                c if c.is_ascii_digit() => tokens.push((pos, self.lex_number(pos)?)),
                c if c.is_alphabetic() || c == '_' => tokens.push((pos, self.lex_ident(pos))),
                '\'' => tokens.push((pos, self.lex_string(pos)?)),
                _ => tokens.push((pos, self.lex_symbol(pos, ch)?)),
            }
        }
        Ok(tokens)
    }

    fn lex_number(&mut self, start: usize) -> SqlResult<Token> {
        let mut end = start;
        let mut is_float = false;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() {
                end = pos + ch.len_utf8();
                self.chars.next();
            } else if ch == '.' && !is_float {
                // A dot only continues the number if a digit follows;
                // otherwise it is the module access dot.
                let mut lookahead = self.chars.clone();
                lookahead.next();
                match lookahead.peek() {
                    Some(&(_, next)) if next.is_ascii_digit() => {
                        is_float = true;
                        end = pos + 1;
                        self.chars.next();
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }
        let slice = &self.text[start..end];
        if is_float {
            slice
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| SqlError::parse_error(format!("invalid number '{}'", slice), Some(start)))
        } else {
            slice
                .parse::<i64>()
                .map(Token::Int)
                .map_err(|_| SqlError::parse_error(format!("invalid number '{}'", slice), Some(start)))
        }
    }

    fn lex_ident(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                end = pos + ch.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        Token::Ident(self.text[start..end].to_string())
    }

    fn lex_string(&mut self, start: usize) -> SqlResult<Token> {
        self.chars.next(); // opening quote
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => {
                    // '' escapes a quote inside the literal
                    if let Some(&(_, '\'')) = self.chars.peek() {
                        out.push('\'');
                        self.chars.next();
                    } else {
                        return Ok(Token::Str(out));
                    }
                }
                Some((_, c)) => out.push(c),
                None => {
                    return Err(SqlError::parse_error(
                        "unterminated string literal",
                        Some(start),
                    ))
                }
            }
        }
    }

    fn lex_symbol(&mut self, pos: usize, ch: char) -> SqlResult<Token> {
        self.chars.next();
        let two = |lexer: &mut Self, expect: char, yes: &'static str, no: &'static str| {
            if let Some(&(_, next)) = lexer.chars.peek() {
                if next == expect {
                    lexer.chars.next();
                    return yes;
                }
            }
            no
        };
        let sym = match ch {
            '(' => "(",
            ')' => ")",
            ',' => ",",
            '.' => ".",
            '+' => "+",
            '*' => "*",
            '/' => "/",
            '%' => "%",
            '&' => "&",
            '|' => "|",
            '^' => "^",
            '-' => two(self, '>', "->", "-"),
            '=' => two(self, '=', "==", "="),
            '!' => {
                if two(self, '=', "!=", "!") == "!=" {
                    "!="
                } else {
                    return Err(SqlError::parse_error("expected '=' after '!'", Some(pos)));
                }
            }
            '<' => {
                if let Some(&(_, next)) = self.chars.peek() {
                    match next {
                        '=' => {
                            self.chars.next();
                            "<="
                        }
                        '>' => {
                            self.chars.next();
                            "<>"
                        }
                        '<' => {
                            self.chars.next();
                            "<<"
                        }
                        _ => "<",
                    }
                } else {
                    "<"
                }
            }
            '>' => {
                if let Some(&(_, next)) = self.chars.peek() {
                    match next {
                        '=' => {
                            self.chars.next();
                            ">="
                        }
                        '>' => {
                            self.chars.next();
                            ">>"
                        }
                        _ => ">",
                    }
                } else {
                    ">"
                }
            }
            other => {
                return Err(SqlError::parse_error(
                    format!("unexpected character '{}'", other),
                    Some(pos),
                ))
            }
        };
        Ok(Token::Symbol(sym))
    }
}

/// Parses one expression; trailing tokens are a parse error.
pub(crate) fn parse_expression(text: &str) -> SqlResult<Expr> {
    let tokens = Lexer::new(text).tokenize()?;
    if tokens.is_empty() {
        return Err(SqlError::parse_error("empty expression", None));
    }
    let mut parser = Parser { tokens, index: 0 };
    let expr = parser.parse_or()?;
    if let Some((pos, _)) = parser.tokens.get(parser.index) {
        return Err(SqlError::parse_error(
            format!("unexpected trailing input in '{}'", text),
            Some(*pos),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    index: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(_, t)| t)
    }

    fn position(&self) -> Option<usize> {
        self.tokens.get(self.index).map(|(p, _)| *p)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(_, t)| t.clone());
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn consume_symbol(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Some(Token::Symbol(s)) if *s == sym) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn consume_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(id)) if id.eq_ignore_ascii_case(word)) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, sym: &'static str) -> SqlResult<()> {
        if self.consume_symbol(sym) {
            Ok(())
        } else {
            Err(SqlError::parse_error(
                format!("expected '{}'", sym),
                self.position(),
            ))
        }
    }

    fn parse_or(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_and()?;
        while self.consume_keyword("OR") {
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_not()?;
        while self.consume_keyword("AND") {
            let right = self.parse_not()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> SqlResult<Expr> {
        if self.consume_keyword("NOT") {
            let inner = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(inner),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> SqlResult<Expr> {
        let left = self.parse_bitor()?;
        let op = if self.consume_symbol("=") || self.consume_symbol("==") {
            BinaryOp::Compare(CompareOp::Eq)
        } else if self.consume_symbol("!=") || self.consume_symbol("<>") {
            BinaryOp::Compare(CompareOp::NotEq)
        } else if self.consume_symbol("<=") {
            BinaryOp::Compare(CompareOp::LtEq)
        } else if self.consume_symbol(">=") {
            BinaryOp::Compare(CompareOp::GtEq)
        } else if self.consume_symbol("<") {
            BinaryOp::Compare(CompareOp::Lt)
        } else if self.consume_symbol(">") {
            BinaryOp::Compare(CompareOp::Gt)
        } else if self.consume_keyword("IN") {
            BinaryOp::In
        } else if matches!(self.peek(), Some(Token::Ident(id)) if id.eq_ignore_ascii_case("NOT"))
            && matches!(self.tokens.get(self.index + 1), Some((_, Token::Ident(id))) if id.eq_ignore_ascii_case("IN"))
        {
            self.index += 2;
            BinaryOp::NotIn
        } else {
            return Ok(left);
        };
        let right = self.parse_bitor()?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_bitor(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_bitxor()?;
        while self.consume_symbol("|") {
            let right = self.parse_bitxor()?;
            left = Expr::Binary {
                op: BinaryOp::BitOr,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_bitand()?;
        while self.consume_symbol("^") {
            let right = self.parse_bitand()?;
            left = Expr::Binary {
                op: BinaryOp::BitXor,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_shift()?;
        while self.consume_symbol("&") {
            let right = self.parse_shift()?;
            left = Expr::Binary {
                op: BinaryOp::BitAnd,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.consume_symbol("<<") {
                BinaryOp::Shl
            } else if self.consume_symbol(">>") {
                BinaryOp::Shr
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.consume_symbol("+") {
                BinaryOp::Add
            } else if self.consume_symbol("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.consume_symbol("*") {
                BinaryOp::Mul
            } else if self.consume_symbol("/") {
                BinaryOp::Div
            } else if self.consume_symbol("%") {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> SqlResult<Expr> {
        if self.consume_symbol("-") {
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(inner),
            });
        }
        self.parse_member()
    }

    fn parse_member(&mut self) -> SqlResult<Expr> {
        let mut base = self.parse_primary()?;
        while self.consume_symbol("->") {
            let field = match self.advance() {
                Some(Token::Ident(id)) => id,
                Some(Token::Str(s)) => s,
                _ => {
                    return Err(SqlError::parse_error(
                        "expected member name after '->'",
                        self.position(),
                    ))
                }
            };
            base = Expr::Member {
                base: Box::new(base),
                field,
            };
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> SqlResult<Expr> {
        let pos = self.position();
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(v)) => Ok(Expr::Literal(Value::Float(v))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Symbol("*")) => Ok(Expr::Star),
            Some(Token::Symbol("(")) => {
                let first = self.parse_or()?;
                if self.consume_symbol(",") {
                    let mut items = vec![first];
                    loop {
                        items.push(self.parse_or()?);
                        if !self.consume_symbol(",") {
                            break;
                        }
                    }
                    self.expect_symbol(")")?;
                    Ok(Expr::Tuple(items))
                } else {
                    self.expect_symbol(")")?;
                    Ok(first)
                }
            }
            Some(Token::Ident(id)) => {
                if id.eq_ignore_ascii_case("NULL") {
                    return Ok(Expr::Literal(Value::Null));
                }
                if id.eq_ignore_ascii_case("TRUE") {
                    return Ok(Expr::Literal(Value::Bool(true)));
                }
                if id.eq_ignore_ascii_case("FALSE") {
                    return Ok(Expr::Literal(Value::Bool(false)));
                }
                // module.function(...) call
                if self.consume_symbol(".") {
                    let func = match self.advance() {
                        Some(Token::Ident(name)) => name,
                        _ => {
                            return Err(SqlError::parse_error(
                                "expected function name after '.'",
                                self.position(),
                            ))
                        }
                    };
                    self.expect_symbol("(")?;
                    let args = self.parse_args()?;
                    return Ok(Expr::Call {
                        module: Some(id),
                        name: func,
                        args,
                    });
                }
                // bare function call
                if self.consume_symbol("(") {
                    let args = self.parse_args()?;
                    return Ok(Expr::Call {
                        module: None,
                        name: id.to_ascii_lowercase(),
                        args,
                    });
                }
                Ok(Expr::Column(id))
            }
            other => Err(SqlError::parse_error(
                format!("unexpected token {:?}", other),
                pos,
            )),
        }
    }

    fn parse_args(&mut self) -> SqlResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.consume_symbol(")") {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.consume_symbol(",") {
                continue;
            }
            self.expect_symbol(")")?;
            return Ok(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_with_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => match *right {
                Expr::Binary {
                    op: BinaryOp::Mul, ..
                } => {}
                other => panic!("expected Mul on the right, got {:?}", other),
            },
            other => panic!("expected Add at the top, got {:?}", other),
        }
    }

    #[test]
    fn parses_string_literal_with_escaped_quote() {
        let expr = parse_expression("'it''s'").unwrap();
        match expr {
            Expr::Literal(Value::Str(s)) => assert_eq!(s, "it's"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_member_chain_and_call() {
        assert!(parse_expression("a->b->c").is_ok());
        assert!(parse_expression("to_int(x) + 1").is_ok());
        assert!(parse_expression("math.sqrt(x * x)").is_ok());
        assert!(parse_expression("count(*)").is_ok());
    }

    #[test]
    fn bitwise_binds_looser_than_shift_and_arithmetic() {
        let expr = parse_expression("1 | 2 << 3 + 4").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::BitOr,
                right,
                ..
            } => match *right {
                Expr::Binary {
                    op: BinaryOp::Shl, ..
                } => {}
                other => panic!("expected Shl under BitOr, got {:?}", other),
            },
            other => panic!("expected BitOr at the top, got {:?}", other),
        }
        assert!(parse_expression("x & 255 = 0").is_ok());
    }

    #[test]
    fn parses_in_and_not_in() {
        assert!(parse_expression("x IN (1, 2, 3)").is_ok());
        assert!(parse_expression("x NOT IN ('a', 'b')").is_ok());
        assert!(parse_expression("'b' in name").is_ok());
    }

    #[test]
    fn rejects_trailing_input_and_bad_tokens() {
        assert!(parse_expression("1 +").is_err());
        assert!(parse_expression("1 1").is_err());
        assert!(parse_expression("'unterminated").is_err());
        assert!(parse_expression("").is_err());
        assert!(parse_expression("a ? b").is_err());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(parse_expression("x > 1 and not (y < 2 or z = 3)").is_ok());
        assert!(parse_expression("NULL").is_ok());
        assert!(parse_expression("true OR false").is_ok());
    }
}

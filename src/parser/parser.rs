// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Recursive-descent parser for filter expressions
//!
//! Precedence, low to high: OR, AND, NOT, comparison (=, <>, !=, <, >, <=,
//! >=, [NOT] LIKE, [NOT] IN, IS [NOT] NULL), additive (+, -),
//! multiplicative (*, /, %), unary (+, -), primary.

use crate::core::{parse_date, Error, Result, Value};

use super::ast::{ArithOp, CmpOp, Expr, UnaryOp};
use super::lexer::Lexer;
use super::token::{Token, TokenType};

/// Parse expression text into an AST
///
/// The whole input must be consumed; trailing tokens are a syntax error.
pub fn parse(input: &str) -> Result<Expr> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Recursive-descent parser over the token stream
struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        let mut parser = Self {
            lexer,
            current,
            peek,
        };
        parser.check_error_token()?;
        Ok(parser)
    }

    /// Advance to the next token
    fn advance(&mut self) -> Result<()> {
        self.current = std::mem::replace(&mut self.peek, self.lexer.next_token());
        self.check_error_token()
    }

    /// Turn lexer error tokens into syntax errors
    fn check_error_token(&self) -> Result<()> {
        if self.current.token_type == TokenType::Error {
            return Err(self.syntax_error(
                self.current
                    .error
                    .clone()
                    .unwrap_or_else(|| "invalid token".to_string()),
            ));
        }
        Ok(())
    }

    /// Build a syntax error at the current token
    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Error::syntax(
            message,
            self.current.position.line,
            self.current.position.column,
        )
    }

    /// Error for an unexpected current token
    fn unexpected(&self, expected: &str) -> Error {
        let found = if self.current.is_eof() {
            "end of input".to_string()
        } else {
            format!("'{}'", self.current.literal)
        };
        self.syntax_error(format!("expected {}, found {}", expected, found))
    }

    fn expect_eof(&self) -> Result<()> {
        if self.current.is_eof() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    /// Consume a punctuator or fail
    fn expect_punctuator(&mut self, punct: &str) -> Result<()> {
        if self.current.is_punctuator(punct) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    /// Consume a keyword or fail
    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.current.is_keyword(keyword) {
            self.advance()
        } else {
            Err(self.unexpected(keyword))
        }
    }

    // =========================================================================
    // Grammar rules
    // =========================================================================

    /// expression := orExpression
    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    /// orExpression := andExpression (OR andExpression)*
    fn parse_or(&mut self) -> Result<Expr> {
        let first = self.parse_and()?;
        if !self.current.is_keyword("OR") {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.current.is_keyword("OR") {
            self.advance()?;
            operands.push(self.parse_and()?);
        }
        Ok(Expr::Or(operands))
    }

    /// andExpression := notExpression (AND notExpression)*
    fn parse_and(&mut self) -> Result<Expr> {
        let first = self.parse_not()?;
        if !self.current.is_keyword("AND") {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.current.is_keyword("AND") {
            self.advance()?;
            operands.push(self.parse_not()?);
        }
        Ok(Expr::And(operands))
    }

    /// notExpression := [NOT] comparisonExpression
    fn parse_not(&mut self) -> Result<Expr> {
        if self.current.is_keyword("NOT") {
            self.advance()?;
            let operand = self.parse_comparison()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison()
    }

    /// comparisonExpression := additiveExpression comparison-tail?
    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;

        // IS [NOT] NULL
        if self.current.is_keyword("IS") {
            self.advance()?;
            let negated = if self.current.is_keyword("NOT") {
                self.advance()?;
                true
            } else {
                false
            };
            self.expect_keyword("NULL")?;
            return Ok(Expr::IsNull {
                operand: Box::new(left),
                negated,
            });
        }

        // NOT LIKE / NOT IN
        if self.current.is_keyword("NOT")
            && (self.peek.is_keyword("LIKE") || self.peek.is_keyword("IN"))
        {
            self.advance()?;
            if self.current.is_keyword("LIKE") {
                self.advance()?;
                let pattern = self.parse_additive()?;
                return Ok(Expr::Like {
                    left: Box::new(left),
                    pattern: Box::new(pattern),
                    negated: true,
                });
            }
            self.advance()?;
            let values = self.parse_in_list()?;
            return Ok(Expr::In {
                left: Box::new(left),
                values,
                negated: true,
            });
        }

        if self.current.is_keyword("LIKE") {
            self.advance()?;
            let pattern = self.parse_additive()?;
            return Ok(Expr::Like {
                left: Box::new(left),
                pattern: Box::new(pattern),
                negated: false,
            });
        }

        if self.current.is_keyword("IN") {
            self.advance()?;
            let values = self.parse_in_list()?;
            return Ok(Expr::In {
                left: Box::new(left),
                values,
                negated: false,
            });
        }

        if self.current.token_type == TokenType::Operator {
            let op = match self.current.literal.as_str() {
                "=" => Some(CmpOp::Eq),
                "<>" | "!=" => Some(CmpOp::Ne),
                "<" => Some(CmpOp::Lt),
                "<=" => Some(CmpOp::Le),
                ">" => Some(CmpOp::Gt),
                ">=" => Some(CmpOp::Ge),
                _ => None,
            };
            if let Some(op) = op {
                self.advance()?;
                let right = self.parse_additive()?;
                return Ok(Expr::Comparison {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
        }

        Ok(left)
    }

    /// inList := '(' expression (',' expression)* ')'
    fn parse_in_list(&mut self) -> Result<Vec<Expr>> {
        self.expect_punctuator("(")?;
        let mut values = vec![self.parse_expression()?];
        while self.current.is_punctuator(",") {
            self.advance()?;
            values.push(self.parse_expression()?);
        }
        self.expect_punctuator(")")?;
        Ok(values)
    }

    /// additiveExpression := multiplicativeExpression ((+|-) multiplicativeExpression)*
    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = if self.current.is_operator("+") {
                ArithOp::Add
            } else if self.current.is_operator("-") {
                ArithOp::Sub
            } else {
                break;
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// multiplicativeExpression := unaryExpression ((*|/|%) unaryExpression)*
    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = if self.current.is_operator("*") {
                ArithOp::Mul
            } else if self.current.is_operator("/") {
                ArithOp::Div
            } else if self.current.is_operator("%") {
                ArithOp::Mod
            } else {
                break;
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// unaryExpression := [+|-] primaryExpression
    fn parse_unary(&mut self) -> Result<Expr> {
        if self.current.is_operator("+") {
            self.advance()?;
            let operand = self.parse_primary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Plus,
                operand: Box::new(operand),
            });
        }
        if self.current.is_operator("-") {
            self.advance()?;
            let operand = self.parse_primary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    /// primaryExpression := '(' expression ')' | functionCall | column | literal
    fn parse_primary(&mut self) -> Result<Expr> {
        match self.current.token_type {
            TokenType::Punctuator if self.current.is_punctuator("(") => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect_punctuator(")")?;
                Ok(expr)
            }

            TokenType::Identifier => {
                let name = self.current.literal.clone();
                if self.peek.is_punctuator("(") {
                    self.advance()?; // to '('
                    self.advance()?; // past '('
                    let args = self.parse_argument_list()?;
                    Ok(Expr::FunctionCall { name, args })
                } else {
                    self.advance()?;
                    Ok(Expr::Column(name))
                }
            }

            TokenType::String => {
                let value = Value::text(self.current.literal.clone());
                self.advance()?;
                Ok(Expr::Literal(value))
            }

            TokenType::Integer => {
                let parsed = self.current.literal.parse::<i64>().map_err(|_| {
                    self.syntax_error(format!(
                        "integer literal '{}' out of range",
                        self.current.literal
                    ))
                })?;
                self.advance()?;
                Ok(Expr::Literal(Value::integer(parsed)))
            }

            TokenType::Float => {
                let parsed = self.current.literal.parse::<f64>().map_err(|_| {
                    self.syntax_error(format!(
                        "invalid numeric literal '{}'",
                        self.current.literal
                    ))
                })?;
                self.advance()?;
                Ok(Expr::Literal(Value::float(parsed)))
            }

            TokenType::Date => {
                let parsed = parse_date(&self.current.literal).map_err(|_| {
                    self.syntax_error(format!(
                        "invalid date literal '#{}#'",
                        self.current.literal
                    ))
                })?;
                self.advance()?;
                Ok(Expr::Literal(Value::date(parsed)))
            }

            TokenType::Keyword => {
                if self.current.is_keyword("TRUE") {
                    self.advance()?;
                    Ok(Expr::Literal(Value::boolean(true)))
                } else if self.current.is_keyword("FALSE") {
                    self.advance()?;
                    Ok(Expr::Literal(Value::boolean(false)))
                } else if self.current.is_keyword("NULL") {
                    self.advance()?;
                    Ok(Expr::Literal(Value::null_unknown()))
                } else {
                    Err(self.unexpected("an expression"))
                }
            }

            _ => Err(self.unexpected("an expression")),
        }
    }

    /// argumentList := (expression (',' expression)*)? ')'
    fn parse_argument_list(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.current.is_punctuator(")") {
            self.advance()?;
            return Ok(args);
        }

        args.push(self.parse_expression()?);
        while self.current.is_punctuator(",") {
            self.advance()?;
            args.push(self.parse_expression()?);
        }
        self.expect_punctuator(")")?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comparison() {
        let expr = parse("Age > 25").unwrap();
        match expr {
            Expr::Comparison { op, left, right } => {
                assert_eq!(op, CmpOp::Gt);
                assert_eq!(left.as_column(), Some("Age"));
                assert_eq!(right.as_literal(), Some(&Value::integer(25)));
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_and_or_precedence() {
        // OR binds looser than AND
        let expr = parse("a = 1 OR b = 2 AND c = 3").unwrap();
        match expr {
            Expr::Or(operands) => {
                assert_eq!(operands.len(), 2);
                assert!(matches!(operands[1], Expr::And(_)));
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_not() {
        let expr = parse("NOT Active = true").unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn test_parse_like_and_not_like() {
        let expr = parse("Name LIKE 'A*'").unwrap();
        assert!(matches!(expr, Expr::Like { negated: false, .. }));

        let expr = parse("Name NOT LIKE 'A*'").unwrap();
        assert!(matches!(expr, Expr::Like { negated: true, .. }));
    }

    #[test]
    fn test_parse_in_list() {
        let expr = parse("Age IN (25, 30, 35)").unwrap();
        match expr {
            Expr::In {
                values, negated, ..
            } => {
                assert_eq!(values.len(), 3);
                assert!(!negated);
            }
            other => panic!("unexpected AST: {:?}", other),
        }

        let expr = parse("Age NOT IN (25)").unwrap();
        assert!(matches!(expr, Expr::In { negated: true, .. }));
    }

    #[test]
    fn test_parse_is_null() {
        let expr = parse("Name IS NULL").unwrap();
        assert!(matches!(expr, Expr::IsNull { negated: false, .. }));

        let expr = parse("Name IS NOT NULL").unwrap();
        assert!(matches!(expr, Expr::IsNull { negated: true, .. }));
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        // * binds tighter than +
        let expr = parse("a + b * c = 7").unwrap();
        match expr {
            Expr::Comparison { left, .. } => match *left {
                Expr::Arithmetic { op, ref right, .. } => {
                    assert_eq!(op, ArithOp::Add);
                    assert!(matches!(
                        **right,
                        Expr::Arithmetic {
                            op: ArithOp::Mul,
                            ..
                        }
                    ));
                }
                ref other => panic!("unexpected AST: {:?}", other),
            },
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse("LEN(Name) > 3").unwrap();
        match expr {
            Expr::Comparison { left, .. } => match *left {
                Expr::FunctionCall { ref name, ref args } => {
                    assert_eq!(name, "LEN");
                    assert_eq!(args.len(), 1);
                }
                ref other => panic!("unexpected AST: {:?}", other),
            },
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_parenthesized() {
        let expr = parse("(a = 1 OR b = 2) AND c = 3").unwrap();
        match expr {
            Expr::And(operands) => assert!(matches!(operands[0], Expr::Or(_))),
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            parse("x = 'abc'").is_ok() && parse("x = 3.5").is_ok(),
            true
        );
        let expr = parse("x = NULL").unwrap();
        match expr {
            Expr::Comparison { right, .. } => assert!(right.as_literal().unwrap().is_null()),
            other => panic!("unexpected AST: {:?}", other),
        }
        let expr = parse("d = #2024-05-01#").unwrap();
        match expr {
            Expr::Comparison { right, .. } => {
                assert_eq!(
                    right.as_literal().unwrap().data_type(),
                    crate::core::DataType::Date
                )
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("Age >").unwrap_err();
        match err {
            Error::Syntax { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column >= 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(parse("Age > 5 extra").is_err());
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse("x = -5").unwrap();
        match expr {
            Expr::Comparison { right, .. } => assert!(matches!(
                *right,
                Expr::Unary {
                    op: UnaryOp::Minus,
                    ..
                }
            )),
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_bracketed_column() {
        let expr = parse("[First Name] = 'Alice'").unwrap();
        match expr {
            Expr::Comparison { left, .. } => assert_eq!(left.as_column(), Some("First Name")),
            other => panic!("unexpected AST: {:?}", other),
        }
    }
}

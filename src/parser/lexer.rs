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

//! Lexer for the filter-expression language
//!
//! Tokenizes expression text into identifiers, keywords, literals, and
//! operators. Quoted column names are unescaped here: bracket names support
//! `\]` and `\\` escapes, backtick names are taken verbatim.

use super::token::{is_keyword, Position, Token, TokenType};

/// Lexer for tokenizing filter expressions
pub struct Lexer {
    /// Input string
    input: Vec<char>,
    /// Current position in input (points to current char)
    position: usize,
    /// Current reading position in input (after current char)
    read_position: usize,
    /// Current character under examination
    ch: char,
    /// Current position tracking
    pos: Position,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut lexer = Self {
            input: chars,
            position: 0,
            read_position: 0,
            ch: '\0',
            pos: Position::new(0, 1, 1),
        };
        lexer.read_char();
        lexer
    }

    /// Read the next character
    fn read_char(&mut self) {
        // Update position before changing character
        if self.ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else if self.ch != '\0' {
            self.pos.column += 1;
        }

        if self.read_position >= self.input.len() {
            self.ch = '\0'; // EOF
        } else {
            self.ch = self.input[self.read_position];
            self.position = self.read_position;
            self.read_position += 1;
        }

        self.pos.offset = self.position;
    }

    /// Peek at the next character without advancing
    fn peek_char(&self) -> char {
        if self.read_position >= self.input.len() {
            '\0'
        } else {
            self.input[self.read_position]
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let pos = self.pos;

        match self.ch {
            '\0' => Token::eof(pos),

            // String literal (single quotes, '' escapes a quote)
            '\'' => self.read_string_literal(pos),

            // Date literal (#...#)
            '#' => self.read_date_literal(pos),

            // Bracket-quoted column name ([Col Name], \] and \\ escapes)
            '[' => self.read_bracket_identifier(pos),

            // Backtick-quoted column name
            '`' => self.read_backtick_identifier(pos),

            // Number literal
            c if c.is_ascii_digit() => self.read_number(pos),

            // Operators
            '=' => {
                self.read_char();
                Token::new(TokenType::Operator, "=", pos)
            }
            '<' => {
                self.read_char();
                match self.ch {
                    '>' => {
                        self.read_char();
                        Token::new(TokenType::Operator, "<>", pos)
                    }
                    '=' => {
                        self.read_char();
                        Token::new(TokenType::Operator, "<=", pos)
                    }
                    _ => Token::new(TokenType::Operator, "<", pos),
                }
            }
            '>' => {
                self.read_char();
                if self.ch == '=' {
                    self.read_char();
                    Token::new(TokenType::Operator, ">=", pos)
                } else {
                    Token::new(TokenType::Operator, ">", pos)
                }
            }
            '!' => {
                self.read_char();
                if self.ch == '=' {
                    self.read_char();
                    Token::new(TokenType::Operator, "!=", pos)
                } else {
                    Token::error("expected '=' after '!'", "!", pos)
                }
            }
            '+' | '-' | '*' | '/' | '%' => {
                let op = self.ch.to_string();
                self.read_char();
                Token::new(TokenType::Operator, op, pos)
            }

            // Punctuators
            '(' | ')' | ',' => {
                let punct = self.ch.to_string();
                self.read_char();
                Token::new(TokenType::Punctuator, punct, pos)
            }

            // Identifier or keyword
            c if c.is_alphabetic() || c == '_' => {
                let word = self.read_identifier();
                if is_keyword(&word) {
                    Token::new(TokenType::Keyword, word, pos)
                } else {
                    Token::new(TokenType::Identifier, word, pos)
                }
            }

            other => {
                self.read_char();
                Token::error(
                    format!("unexpected character '{}'", other),
                    other.to_string(),
                    pos,
                )
            }
        }
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while self.ch.is_whitespace() {
            self.read_char();
        }
    }

    /// Read a bare identifier (letters, digits, underscores)
    fn read_identifier(&mut self) -> String {
        let mut word = String::new();
        while self.ch.is_alphanumeric() || self.ch == '_' {
            word.push(self.ch);
            self.read_char();
        }
        word
    }

    /// Read a number literal (integer or float, with optional exponent)
    fn read_number(&mut self, pos: Position) -> Token {
        let mut literal = String::new();
        let mut is_float = false;

        while self.ch.is_ascii_digit() {
            literal.push(self.ch);
            self.read_char();
        }

        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            is_float = true;
            literal.push(self.ch);
            self.read_char();
            while self.ch.is_ascii_digit() {
                literal.push(self.ch);
                self.read_char();
            }
        }

        if self.ch == 'e' || self.ch == 'E' {
            let next = self.peek_char();
            if next.is_ascii_digit() || next == '+' || next == '-' {
                is_float = true;
                literal.push(self.ch);
                self.read_char();
                if self.ch == '+' || self.ch == '-' {
                    literal.push(self.ch);
                    self.read_char();
                }
                while self.ch.is_ascii_digit() {
                    literal.push(self.ch);
                    self.read_char();
                }
            }
        }

        if is_float {
            Token::new(TokenType::Float, literal, pos)
        } else {
            Token::new(TokenType::Integer, literal, pos)
        }
    }

    /// Read a string literal delimited by single quotes; '' escapes a quote
    fn read_string_literal(&mut self, pos: Position) -> Token {
        self.read_char(); // consume opening quote
        let mut literal = String::new();

        loop {
            match self.ch {
                '\0' => return Token::error("unterminated string literal", literal, pos),
                '\'' => {
                    if self.peek_char() == '\'' {
                        literal.push('\'');
                        self.read_char();
                        self.read_char();
                    } else {
                        self.read_char(); // consume closing quote
                        return Token::new(TokenType::String, literal, pos);
                    }
                }
                c => {
                    literal.push(c);
                    self.read_char();
                }
            }
        }
    }

    /// Read a date literal delimited by '#'
    fn read_date_literal(&mut self, pos: Position) -> Token {
        self.read_char(); // consume opening '#'
        let mut literal = String::new();

        loop {
            match self.ch {
                '\0' => return Token::error("unterminated date literal", literal, pos),
                '#' => {
                    self.read_char(); // consume closing '#'
                    return Token::new(TokenType::Date, literal, pos);
                }
                c => {
                    literal.push(c);
                    self.read_char();
                }
            }
        }
    }

    /// Read a bracket-quoted column name, unescaping `\]` and `\\`
    fn read_bracket_identifier(&mut self, pos: Position) -> Token {
        self.read_char(); // consume '['
        let mut literal = String::new();

        loop {
            match self.ch {
                '\0' => return Token::error("unterminated bracketed column name", literal, pos),
                '\\' => {
                    let next = self.peek_char();
                    if next == ']' || next == '\\' {
                        literal.push(next);
                        self.read_char();
                        self.read_char();
                    } else {
                        literal.push('\\');
                        self.read_char();
                    }
                }
                ']' => {
                    self.read_char(); // consume ']'
                    return Token::new(TokenType::Identifier, literal, pos);
                }
                c => {
                    literal.push(c);
                    self.read_char();
                }
            }
        }
    }

    /// Read a backtick-quoted column name (no escapes)
    fn read_backtick_identifier(&mut self, pos: Position) -> Token {
        self.read_char(); // consume '`'
        let mut literal = String::new();

        loop {
            match self.ch {
                '\0' => return Token::error("unterminated backticked column name", literal, pos),
                '`' => {
                    self.read_char(); // consume '`'
                    return Token::new(TokenType::Identifier, literal, pos);
                }
                c => {
                    literal.push(c);
                    self.read_char();
                }
            }
        }
    }
}

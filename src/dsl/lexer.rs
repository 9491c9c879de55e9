//! Scanner for the composition notation.
//!
//! Produces one [`Token`] per call to [`Scanner::scan`]. Whitespace and both
//! comment styles come back as tokens in their own right; unrecognized
//! characters come back as [`TokenKind::Illegal`] and are never skipped.

use super::token::{Token, TokenKind};

pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Scan the next token. Returns [`TokenKind::Eof`] forever once the
    /// input is exhausted.
    pub fn scan(&mut self) -> Token {
        if self.is_at_end() {
            return self.token(TokenKind::Eof, String::new(), self.line, self.col);
        }

        let line = self.line;
        let col = self.col;
        let ch = self.peek();

        if is_whitespace(ch) {
            return self.scan_whitespace(line, col);
        }
        if ch.is_ascii_digit() || ch == '.' {
            return self.scan_number(line, col);
        }
        if ch.is_ascii_alphabetic() {
            return self.scan_ident(line, col);
        }
        if ch == '"' || ch == '\'' {
            return self.scan_string(line, col);
        }
        if ch == '/' {
            match self.peek_next() {
                Some('/') => return self.scan_line_comment(line, col),
                Some('*') => return self.scan_block_comment(line, col),
                _ => {}
            }
        }

        self.advance();
        match ch {
            '{' => self.token(TokenKind::BraceOpen, ch.to_string(), line, col),
            '}' => self.token(TokenKind::BraceClose, ch.to_string(), line, col),
            ';' => self.token(TokenKind::Semicolon, ch.to_string(), line, col),
            _ => self.token(TokenKind::Illegal, ch.to_string(), line, col),
        }
    }

    fn token(&self, kind: TokenKind, literal: String, line: usize, col: usize) -> Token {
        Token {
            kind,
            literal,
            line,
            col,
        }
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn scan_whitespace(&mut self, line: usize, col: usize) -> Token {
        let mut s = String::new();
        while !self.is_at_end() && is_whitespace(self.peek()) {
            s.push(self.advance());
        }
        self.token(TokenKind::Whitespace, s, line, col)
    }

    fn scan_number(&mut self, line: usize, col: usize) -> Token {
        let mut s = String::new();
        let mut is_float = false;
        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            if self.peek() == '.' {
                is_float = true;
            }
            s.push(self.advance());
        }
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Number
        };
        self.token(kind, s, line, col)
    }

    fn scan_ident(&mut self, line: usize, col: usize) -> Token {
        let mut s = String::new();
        while !self.is_at_end() && is_ident_char(self.peek()) {
            s.push(self.advance());
        }
        let kind = TokenKind::keyword(&s).unwrap_or(TokenKind::Identifier);
        self.token(kind, s, line, col)
    }

    fn scan_string(&mut self, line: usize, col: usize) -> Token {
        let quote = self.advance();
        let mut s = String::new();
        let mut escaped = false;
        let mut closed = false;
        while !self.is_at_end() {
            let ch = self.advance();
            if ch == '\\' && !escaped {
                escaped = true;
                continue;
            }
            if ch == quote && !escaped {
                closed = true;
                break;
            }
            s.push(ch);
            escaped = false;
        }
        if closed {
            self.token(TokenKind::Str, s, line, col)
        } else {
            // unterminated; the opening quote marks it as such downstream
            self.token(TokenKind::Illegal, format!("{quote}{s}"), line, col)
        }
    }

    fn scan_line_comment(&mut self, line: usize, col: usize) -> Token {
        self.advance(); // '/'
        self.advance(); // '/'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '\n' {
            s.push(self.advance());
        }
        self.token(TokenKind::Comment, s, line, col)
    }

    fn scan_block_comment(&mut self, line: usize, col: usize) -> Token {
        self.advance(); // '/'
        self.advance(); // '*'
        let mut s = String::new();
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            s.push(self.advance());
        }
        self.token(TokenKind::Comment, s, line, col)
    }
}

fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\r' || ch == '\n'
}

fn is_ident_char(ch: char) -> bool {
    // '-' admits negative-octave note names like "Bb-1"
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '#' || ch == '^' || ch == '-'
}

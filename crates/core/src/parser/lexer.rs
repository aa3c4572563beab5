//! Content stream tokenizer.
//!
//! Splits decoded content stream bytes into operands and operator keywords.
//! Only what operators need is recognised: numbers, names, strings, arrays,
//! dictionaries, `true`/`false`/`null` and keywords. Inline image data
//! (`BI` ... `ID` ... `EI`) is skipped.

use crate::error::{PdfError, Result};
use crate::model::objects::Operand;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum LexToken {
    Int(i64),
    Real(f64),
    Bool(bool),
    Null,
    /// Name without the leading `/`
    Name(SmolStr),
    String(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    /// Operator keyword, case preserved
    Keyword(SmolStr),
}

/// Tokenizer over one buffer of decoded content stream bytes.
pub struct ContentLexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ContentLexer<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position in the buffer
    pub const fn tell(&self) -> usize {
        self.pos
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance_one(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Read the next token and its starting position.
    pub fn next_token(&mut self) -> Option<Result<(usize, LexToken)>> {
        self.skip_whitespace();
        if self.at_end() {
            return None;
        }

        let token_pos = self.pos;
        let b = self.peek()?;

        let result = match b {
            b'/' => Ok(self.parse_name()),
            b'(' => self.parse_string(),
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    Ok(LexToken::DictStart)
                } else {
                    self.parse_hex_string()
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Ok(LexToken::DictEnd)
                } else {
                    self.pos += 1;
                    Err(PdfError::TokenError {
                        pos: token_pos,
                        msg: "unbalanced '>'".into(),
                    })
                }
            }
            b'[' => {
                self.pos += 1;
                Ok(LexToken::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                Ok(LexToken::ArrayEnd)
            }
            b'+' | b'-' | b'.' => {
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') {
                    self.parse_number(token_pos)
                } else {
                    Ok(self.parse_keyword())
                }
            }
            c if c.is_ascii_digit() => self.parse_number(token_pos),
            _ => Ok(self.parse_keyword()),
        };

        Some(result.map(|token| (token_pos, token)))
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                self.skip_comment();
            } else if is_whitespace(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.advance_one() {
            if b == b'\n' || b == b'\r' {
                break;
            }
        }
    }

    fn parse_name(&mut self) -> LexToken {
        self.pos += 1; // skip '/'
        let mut name = Vec::with_capacity(16);

        while let Some(b) = self.peek() {
            if is_keyword_end(b) {
                break;
            }
            if b == b'#' {
                let c1 = self.peek_at(1);
                let c2 = self.peek_at(2);
                if let (Some(h1), Some(h2)) = (c1.and_then(hex_value), c2.and_then(hex_value)) {
                    self.pos += 3;
                    name.push((h1 << 4) | h2);
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }

        LexToken::Name(SmolStr::new(String::from_utf8_lossy(&name)))
    }

    fn parse_number(&mut self, start_pos: usize) -> Result<LexToken> {
        let mut negative = false;
        if self.peek() == Some(b'-') {
            negative = true;
            self.pos += 1;
        } else if self.peek() == Some(b'+') {
            self.pos += 1;
        }

        let mut int_part: i64 = 0;
        let mut has_int = false;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            has_int = true;
            int_part = int_part.saturating_mul(10).saturating_add(i64::from(b - b'0'));
            self.pos += 1;
        }

        let mut has_dot = false;
        let mut frac = 0.0;
        let mut scale = 1.0;
        if self.peek() == Some(b'.') {
            has_dot = true;
            self.pos += 1;
            while let Some(b) = self.peek() {
                if !b.is_ascii_digit() {
                    break;
                }
                scale /= 10.0;
                frac += f64::from(b - b'0') * scale;
                self.pos += 1;
            }
        }

        if !has_int && scale == 1.0 {
            return Err(PdfError::TokenError {
                pos: start_pos,
                msg: "invalid number".into(),
            });
        }

        if has_dot {
            let value = int_part as f64 + frac;
            Ok(LexToken::Real(if negative { -value } else { value }))
        } else {
            Ok(LexToken::Int(if negative { -int_part } else { int_part }))
        }
    }

    fn parse_string(&mut self) -> Result<LexToken> {
        self.pos += 1; // skip '('
        let mut result = Vec::with_capacity(32);
        let mut depth = 1;

        while depth > 0 {
            match self.advance_one() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance_one() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(c) if (b'0'..b'8').contains(&c) => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d) if (b'0'..b'8').contains(&d) => {
                                    self.pos += 1;
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(LexToken::String(result))
    }

    fn parse_hex_string(&mut self) -> Result<LexToken> {
        self.pos += 1; // skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance_one() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => {
                    let Some(nibble) = hex_value(c) else {
                        return Err(PdfError::TokenError {
                            pos: self.pos - 1,
                            msg: "invalid hex digit".into(),
                        });
                    };
                    match pending.take() {
                        Some(high) => result.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // An odd trailing digit is followed by an implicit 0.
        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(LexToken::String(result))
    }

    fn parse_keyword(&mut self) -> LexToken {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_keyword_end(b) {
                break;
            }
            self.pos += 1;
        }
        // A lone delimiter such as '{' or ')' still has to make progress.
        if self.pos == start {
            self.pos += 1;
        }

        match &self.data[start..self.pos] {
            b"true" => LexToken::Bool(true),
            b"false" => LexToken::Bool(false),
            b"null" => LexToken::Null,
            bytes => LexToken::Keyword(SmolStr::new(String::from_utf8_lossy(bytes))),
        }
    }

    /// Skip inline image data up to and including the `EI` keyword.
    ///
    /// Called right after the `ID` keyword.
    fn skip_inline_data(&mut self) {
        // Exactly one whitespace byte separates ID from the data.
        if matches!(self.peek(), Some(b) if is_whitespace(b)) {
            self.pos += 1;
        }
        while !self.at_end() {
            let preceded_by_space = self.pos == 0 || is_whitespace(self.data[self.pos - 1]);
            if preceded_by_space
                && self.peek() == Some(b'E')
                && self.peek_at(1) == Some(b'I')
                && self.peek_at(2).is_none_or(is_keyword_end)
            {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }
}

/// Item produced by [`ContentParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    /// An operand preceding an operator
    Operand(Operand),
    /// An operator keyword (BT, SC, scn, ...)
    Operator(SmolStr),
    /// An inline image; its dictionary and data are skipped
    InlineImage,
}

/// Context frame for nested arrays and dictionaries
enum Frame {
    Array(Vec<Operand>),
    Dict(Vec<Operand>),
}

/// Assembles lexer tokens into operands and operators.
pub struct ContentParser<'a> {
    lexer: ContentLexer<'a>,
    stack: Vec<Frame>,
    /// Start position of the outermost open array or dict
    frame_pos: usize,
    failed: bool,
}

impl<'a> ContentParser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: ContentLexer::new(data),
            stack: Vec::new(),
            frame_pos: 0,
            failed: false,
        }
    }

    /// Push a finished operand into the innermost frame, or return it when
    /// no array or dict is open.
    fn emit(&mut self, operand: Operand) -> Option<Operand> {
        match self.stack.last_mut() {
            Some(Frame::Array(items)) | Some(Frame::Dict(items)) => {
                items.push(operand);
                None
            }
            None => Some(operand),
        }
    }

    fn build_dict(items: Vec<Operand>) -> FxHashMap<SmolStr, Operand> {
        let mut dict = FxHashMap::default();
        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            if let Operand::Name(key) = key {
                dict.insert(key, value);
            }
        }
        dict
    }

    fn next_item(&mut self) -> Option<Result<(usize, ContentToken)>> {
        loop {
            let (pos, token) = match self.lexer.next_token()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };
            if self.stack.is_empty() {
                self.frame_pos = pos;
            }

            let operand = match token {
                LexToken::Int(n) => Operand::Int(n),
                LexToken::Real(n) => Operand::Real(n),
                LexToken::Bool(b) => Operand::Bool(b),
                LexToken::Null => Operand::Null,
                LexToken::Name(name) => Operand::Name(name),
                LexToken::String(s) => Operand::String(s),
                LexToken::ArrayStart => {
                    self.stack.push(Frame::Array(Vec::new()));
                    continue;
                }
                LexToken::DictStart => {
                    self.stack.push(Frame::Dict(Vec::new()));
                    continue;
                }
                LexToken::ArrayEnd => match self.stack.pop() {
                    Some(Frame::Array(items)) => Operand::Array(items),
                    _ => {
                        return Some(Err(PdfError::TokenError {
                            pos,
                            msg: "unbalanced ']'".into(),
                        }));
                    }
                },
                LexToken::DictEnd => match self.stack.pop() {
                    Some(Frame::Dict(items)) => Operand::Dict(Self::build_dict(items)),
                    _ => {
                        return Some(Err(PdfError::TokenError {
                            pos,
                            msg: "unbalanced '>>'".into(),
                        }));
                    }
                },
                LexToken::Keyword(keyword) => {
                    if !self.stack.is_empty() {
                        return Some(Err(PdfError::TokenError {
                            pos,
                            msg: format!("operator {keyword} inside array or dictionary"),
                        }));
                    }
                    if keyword == "BI" {
                        self.skip_inline_image();
                        return Some(Ok((pos, ContentToken::InlineImage)));
                    }
                    return Some(Ok((pos, ContentToken::Operator(keyword))));
                }
            };

            if let Some(operand) = self.emit(operand) {
                return Some(Ok((self.frame_pos, ContentToken::Operand(operand))));
            }
        }
    }

    /// Skip an inline image dictionary and its data.
    fn skip_inline_image(&mut self) {
        while let Some(result) = self.lexer.next_token() {
            match result {
                Ok((_, LexToken::Keyword(keyword))) if keyword == "ID" => {
                    self.lexer.skip_inline_data();
                    return;
                }
                Ok(_) => {}
                Err(_) => return,
            }
        }
    }
}

impl Iterator for ContentParser<'_> {
    type Item = Result<(usize, ContentToken)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_item();
        match item {
            Some(Err(_)) => self.failed = true,
            None if !self.stack.is_empty() => {
                self.failed = true;
                self.stack.clear();
                return Some(Err(PdfError::UnexpectedEof));
            }
            _ => {}
        }
        item
    }
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn is_keyword_end(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

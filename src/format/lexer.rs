//! Format Lexer
//!
//! Tokenizes query format strings. Two escape characters introduce
//! directives: `^` for markup selection, `%` for conversions. Everything else
//! is a literal byte.

use crate::error::{ErrorCode, Result};

/// What a select directive looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Element,     // ^e
    Attribute,   // ^a
    Comment,     // ^C
    Instruction, // ^P
    Any,         // ^*
}

impl Target {
    /// Whether the select consumes a name argument
    #[inline]
    pub fn takes_name(self) -> bool {
        matches!(self, Target::Element | Target::Attribute | Target::Instruction)
    }
}

/// Size modifier of a numeric conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Size {
    #[default]
    Default,
    Long,       // l, ll
    Short,      // h
    Byte,       // hh
    LongDouble, // L, q
}

/// Base accepted by an integer conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    /// `0x` prefix means hex, a leading `0` means octal
    Auto,
    Hex,
    Octal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Str,             // s
    Path,            // p
    Int(Radix),      // d i
    Unsigned(Radix), // u x X o
    Char,            // c
    Float,           // e E f g G
    Callback,        // F
}

/// A parsed `%` conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spec {
    pub conversion: Conversion,
    pub size: Size,
    /// Maximum number of source characters to read
    pub width: Option<usize>,
    /// `a` modifier: allocate the output
    pub alloc: bool,
}

/// Format token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Select { target: Target, optional: bool },
    Close,
    Convert(Spec),
}

/// Format lexer
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Get the next token, `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        self.pos += 1;

        let token = match c {
            b'^' => match self.peek() {
                Some(b'^') => {
                    self.pos += 1;
                    Token::Literal(b'^')
                }
                None | Some(b'%') => Token::Close,
                Some(_) => self.read_select()?,
            },
            b'%' => {
                if self.peek() == Some(b'%') {
                    self.pos += 1;
                    Token::Literal(b'%')
                } else {
                    Token::Convert(self.read_spec()?)
                }
            }
            _ => Token::Literal(c),
        };
        Ok(Some(token))
    }

    fn read_select(&mut self) -> Result<Token> {
        let optional = self.peek() == Some(b'o');
        if optional {
            self.pos += 1;
        }
        let target = match self.peek() {
            Some(b'e') => Target::Element,
            Some(b'a') => Target::Attribute,
            Some(b'C') => Target::Comment,
            Some(b'P') => Target::Instruction,
            Some(b'*') => Target::Any,
            _ => return Err(ErrorCode::UnknownXmlInstruction),
        };
        self.pos += 1;
        Ok(Token::Select { target, optional })
    }

    fn read_spec(&mut self) -> Result<Spec> {
        let mut size = Size::Default;
        let mut width: Option<usize> = None;
        let mut alloc = false;

        // Modifiers
        loop {
            match self.peek() {
                Some(b'a') => alloc = true,
                Some(d @ b'0'..=b'9') => {
                    let digit = (d - b'0') as usize;
                    width = Some(width.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                }
                Some(b'l') => {
                    size = Size::Long;
                    if self.peek_at(1) == Some(b'l') {
                        self.pos += 1;
                    }
                }
                Some(b'h') => {
                    size = Size::Short;
                    if self.peek_at(1) == Some(b'h') {
                        self.pos += 1;
                        size = Size::Byte;
                    }
                }
                Some(b'L' | b'q') => size = Size::LongDouble,
                _ => break,
            }
            self.pos += 1;
        }

        let conversion = match self.peek() {
            Some(b's') => Conversion::Str,
            Some(b'p') => Conversion::Path,
            Some(b'd') => Conversion::Int(Radix::Decimal),
            Some(b'i') => Conversion::Int(Radix::Auto),
            Some(b'u') => Conversion::Unsigned(Radix::Decimal),
            Some(b'x' | b'X') => Conversion::Unsigned(Radix::Hex),
            Some(b'o') => Conversion::Unsigned(Radix::Octal),
            Some(b'c') => Conversion::Char,
            Some(b'e' | b'E' | b'f' | b'g' | b'G') => Conversion::Float,
            Some(b'F') => Conversion::Callback,
            _ => return Err(ErrorCode::UnknownXmlInstruction),
        };
        self.pos += 1;

        Ok(Spec {
            conversion,
            size,
            width: width.filter(|&w| w > 0),
            alloc,
        })
    }
}

/// Tokenize a whole format string
pub fn tokenize(format: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(format);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

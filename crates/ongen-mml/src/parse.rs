//! MML tokenizer and parser.
//!
//! Turns a string into a flat list of [`Statement`]s without interpreting
//! state; [`Compiler`](crate::Compiler) walks the list to produce commands.

use crate::error::MmlError;

/// Semitone offsets of `c d e f g a b`.
const NOTE_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// One parsed MML statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    /// A note: semitone within the octave (accidentals applied, may be -1
    /// or 12), explicit length divisor, and dot count.
    Note {
        /// Semitone offset from C.
        semitone: i32,
        /// Length divisor (`4` = quarter note), `None` for the default.
        length: Option<i32>,
        /// Number of dots (0-2).
        dots: u8,
    },
    /// A rest with optional length and dots.
    Rest {
        /// Length divisor, `None` for the default.
        length: Option<i32>,
        /// Number of dots (0-2).
        dots: u8,
    },
    /// `l` default length.
    Length(i32),
    /// `o` octave.
    Octave(i32),
    /// `q` gate time in sixteenths.
    Gate(i32),
    /// `@` timbre number.
    Timbre(i32),
    /// `v` volume (0-15).
    Volume(i32),
    /// `k` detune.
    Detune(i32),
    /// `<` one octave up.
    OctaveUp,
    /// `>` one octave down.
    OctaveDown,
    /// `%n` or `sn`: parsed and ignored.
    Ignored(char, i32),
}

/// A statement and the byte position it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned {
    /// Byte position in the input.
    pub pos: usize,
    /// The statement.
    pub statement: Statement,
}

/// Single-pass parser over ASCII input.
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Optional `-` followed by one to three digits.
    fn number(&mut self) -> Option<i32> {
        let start = self.pos;
        let negative = self.eat(b'-');
        let mut value = 0i32;
        let mut digits = 0;
        while digits < 3 {
            match self.peek() {
                Some(b @ b'0'..=b'9') => {
                    value = value * 10 + i32::from(b - b'0');
                    digits += 1;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        Some(if negative { -value } else { value })
    }

    fn numbered(&mut self, command: char, start: usize) -> Result<i32, MmlError> {
        self.number().ok_or(MmlError::MissingNumber {
            pos: start,
            command,
        })
    }

    fn dots(&mut self) -> u8 {
        let mut dots = 0;
        while dots < 2 && self.eat(b'.') {
            dots += 1;
        }
        dots
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn statement(&mut self) -> Result<Option<Spanned>, MmlError> {
        self.skip_ws();
        let start = self.pos;
        let Some(byte) = self.peek() else {
            return Ok(None);
        };
        self.pos += 1;

        let statement = match byte {
            b'c' | b'd' | b'e' | b'f' | b'g' | b'a' | b'b' => {
                let index = (i32::from(byte) - i32::from(b'c')).rem_euclid(7) as usize;
                let mut semitone = NOTE_SEMITONES[index];
                if self.eat(b'+') {
                    semitone += 1;
                } else if self.eat(b'-') {
                    semitone -= 1;
                }
                let length = self.number();
                let dots = self.dots();
                Statement::Note {
                    semitone,
                    length,
                    dots,
                }
            }
            b'r' => {
                let length = self.number();
                let dots = self.dots();
                Statement::Rest { length, dots }
            }
            b'l' => Statement::Length(self.numbered('l', start)?),
            b'o' => Statement::Octave(self.numbered('o', start)?),
            b'q' => Statement::Gate(self.numbered('q', start)?),
            b'@' => Statement::Timbre(self.numbered('@', start)?),
            b'v' => Statement::Volume(self.numbered('v', start)?),
            b'k' => Statement::Detune(self.numbered('k', start)?),
            b'%' | b's' => Statement::Ignored(byte as char, self.numbered(byte as char, start)?),
            b'<' => Statement::OctaveUp,
            b'>' => Statement::OctaveDown,
            other => {
                return Err(MmlError::UnexpectedChar {
                    pos: start,
                    ch: other as char,
                });
            }
        };

        Ok(Some(Spanned {
            pos: start,
            statement,
        }))
    }
}

/// Parse `mml` into statements.
///
/// # Errors
///
/// Returns [`MmlError::UnexpectedChar`] for a character that starts no
/// statement and [`MmlError::MissingNumber`] for a numbered command without
/// its number.
pub fn parse(mml: &str) -> Result<Vec<Spanned>, MmlError> {
    let mut parser = Parser::new(mml);
    let mut statements = Vec::new();
    while let Some(spanned) = parser.statement()? {
        statements.push(spanned);
    }
    Ok(statements)
}

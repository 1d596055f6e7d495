// Copyright 2022 Oxide Computer Company

//! Streaming tokeniser for the interpreter's command language.
//!
//! Bytes come from an injected reader, so the scanner can be driven from a
//! buffer under test just as well as from standard input. Every token
//! records the 1-based offset of its first byte in the overall stream, and
//! a token that ends because the input ran out does not latch the
//! end-of-file condition: `at_eof` only reports true once the end has been
//! consumed looking for the next token.

use crate::digits;
use crate::strings;
use std::fmt;
use std::io::{Bytes, Read};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Kind {
    //
    // operators
    //
    New,
    Del,
    Query,
    Redir,

    //
    // words
    //
    Ident(String),
    Number(String),

    /// End of input.
    Eof,

    /// A byte with no place in the language, or a malformed comment.
    Unknown,

    /// The token text could not be stored.
    OutOfMemory,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::New => write!(f, "keyword NEW"),
            Kind::Del => write!(f, "keyword DEL"),
            Kind::Query => write!(f, "operator ?"),
            Kind::Redir => write!(f, "operator >"),
            Kind::Ident(x) => write!(f, "identifier '{}'", x),
            Kind::Number(x) => write!(f, "number '{}'", x),
            Kind::Eof => write!(f, "end of input"),
            Kind::Unknown => write!(f, "unknown token"),
            Kind::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token this is.
    pub kind: Kind,

    /// Offset of the token's first byte, counting the stream from 1.
    pub beg: u64,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.beg, self.kind)
    }
}

pub struct Scanner<R: Read> {
    pub show_tokens: bool,

    input: Bytes<R>,
    peeked: Option<u8>,
    count: u64,
    eof: bool,
}

/// ASCII whitespace, vertical tab included.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

impl<R: Read> Scanner<R> {
    pub fn new(input: R) -> Self {
        Scanner {
            show_tokens: false,
            input: input.bytes(),
            peeked: None,
            count: 0,
            eof: false,
        }
    }

    /// True once a read past the last byte has been consumed. Guaranteed
    /// false right after any token other than `Eof` or an unterminated
    /// comment.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        if self.show_tokens {
            println!("{}", token);
        }
        token
    }

    fn read_raw(&mut self) -> Option<u8> {
        self.input.next().and_then(Result::ok)
    }

    fn peek(&mut self) -> Option<u8> {
        if self.peeked.is_none() {
            self.peeked = self.read_raw();
        }
        self.peeked
    }

    fn bump(&mut self) -> Option<u8> {
        let b = match self.peeked.take() {
            Some(b) => Some(b),
            None => self.read_raw(),
        };
        match b {
            Some(b) => {
                self.count += 1;
                Some(b)
            }
            None => {
                self.eof = true;
                None
            }
        }
    }

    fn scan(&mut self) -> Token {
        loop {
            let beg = self.count + 1;
            match self.bump() {
                None => return Token { kind: Kind::Eof, beg },
                Some(b) if is_space(b) => continue,
                Some(b'$') => {
                    if !self.discard_comment() {
                        return Token { kind: Kind::Unknown, beg };
                    }
                }
                Some(b'>') => return Token { kind: Kind::Redir, beg },
                Some(b'?') => return Token { kind: Kind::Query, beg },
                Some(b) if digits::is_digit(b) => return self.number(b, beg),
                Some(b) if b.is_ascii_alphabetic() => return self.word(b, beg),
                Some(_) => return Token { kind: Kind::Unknown, beg },
            }
        }
    }

    /// Consumes a comment body after its opening `$`. The next byte must be
    /// a second `$`; everything up to and including the closing `$$` is
    /// discarded. `false` if the comment is malformed or unterminated.
    fn discard_comment(&mut self) -> bool {
        if self.bump() != Some(b'$') {
            return false;
        }
        loop {
            match self.bump() {
                None => return false,
                Some(b'$') => match self.bump() {
                    Some(b'$') => return true,
                    None => return false,
                    Some(_) => {}
                },
                Some(_) => {}
            }
        }
    }

    /// Maximal run of digit-alphabet bytes.
    fn number(&mut self, first: u8, beg: u64) -> Token {
        let mut text = String::new();
        if !strings::push(&mut text, first as char) {
            return Token { kind: Kind::OutOfMemory, beg };
        }
        while let Some(b) = self.peek() {
            if !digits::is_digit(b) {
                break;
            }
            self.bump();
            if !strings::push(&mut text, b as char) {
                return Token { kind: Kind::OutOfMemory, beg };
            }
        }
        Token { kind: Kind::Number(text), beg }
    }

    /// Maximal alphanumeric run starting with a letter; the reserved words
    /// are reclassified as operators.
    fn word(&mut self, first: u8, beg: u64) -> Token {
        let mut text = String::new();
        if !strings::push(&mut text, first as char) {
            return Token { kind: Kind::OutOfMemory, beg };
        }
        while let Some(b) = self.peek() {
            if !b.is_ascii_alphanumeric() {
                break;
            }
            self.bump();
            if !strings::push(&mut text, b as char) {
                return Token { kind: Kind::OutOfMemory, beg };
            }
        }
        match text.as_str() {
            "NEW" => Token { kind: Kind::New, beg },
            "DEL" => Token { kind: Kind::Del, beg },
            _ => Token { kind: Kind::Ident(text), beg },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Kind> {
        let mut scanner = Scanner::new(input.as_bytes());
        let mut out = Vec::new();
        loop {
            let token = scanner.next_token();
            let done = token.kind == Kind::Eof;
            out.push(token.kind);
            if done {
                return out;
            }
        }
    }

    fn tokens(input: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(input.as_bytes());
        let mut out = Vec::new();
        loop {
            let token = scanner.next_token();
            let done = token.kind == Kind::Eof;
            out.push(token.clone());
            if done {
                return out;
            }
        }
    }

    #[test]
    fn scans_operators_and_words() {
        assert_eq!(
            kinds("NEW a 123>456 12345? DEL b ?9"),
            vec![
                Kind::New,
                Kind::Ident("a".into()),
                Kind::Number("123".into()),
                Kind::Redir,
                Kind::Number("456".into()),
                Kind::Number("12345".into()),
                Kind::Query,
                Kind::Del,
                Kind::Ident("b".into()),
                Kind::Query,
                Kind::Number("9".into()),
                Kind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_cover_pseudo_digits() {
        assert_eq!(
            kinds("1:;2"),
            vec![Kind::Number("1:;2".into()), Kind::Eof]
        );
    }

    #[test]
    fn reserved_words_are_exact() {
        assert_eq!(
            kinds("NEWs new DELTA"),
            vec![
                Kind::Ident("NEWs".into()),
                Kind::Ident("new".into()),
                Kind::Ident("DELTA".into()),
                Kind::Eof,
            ]
        );
    }

    #[test]
    fn idents_stop_at_non_alphanumerics() {
        assert_eq!(
            kinds("ab1>c"),
            vec![
                Kind::Ident("ab1".into()),
                Kind::Redir,
                Kind::Ident("c".into()),
                Kind::Eof,
            ]
        );
    }

    #[test]
    fn offsets_are_one_based_byte_positions() {
        let toks = tokens("NEW a 12>3");
        let begs: Vec<u64> = toks.iter().map(|t| t.beg).collect();
        assert_eq!(begs, vec![1, 5, 7, 9, 10, 11]);
    }

    #[test]
    fn comments_are_whitespace() {
        assert_eq!(
            kinds("1 $$ anything >?$ 2 $$ 3"),
            vec![Kind::Number("1".into()), Kind::Number("3".into()), Kind::Eof]
        );
        assert_eq!(kinds("$$$$5"), vec![Kind::Number("5".into()), Kind::Eof]);
    }

    #[test]
    fn comment_offsets_skip_the_body() {
        let toks = tokens("$$ x $$ 7");
        assert_eq!(toks[0].kind, Kind::Number("7".into()));
        assert_eq!(toks[0].beg, 9);
    }

    #[test]
    fn malformed_comment_is_unknown_at_the_dollar() {
        let toks = tokens("  $x");
        assert_eq!(toks[0].kind, Kind::Unknown);
        assert_eq!(toks[0].beg, 3);
    }

    #[test]
    fn unterminated_comment_hits_end_of_input() {
        let mut scanner = Scanner::new("$$ no close".as_bytes());
        let token = scanner.next_token();
        assert_eq!(token.kind, Kind::Unknown);
        assert!(scanner.at_eof());
    }

    #[test]
    fn stray_bytes_are_unknown() {
        let toks = tokens("12 @");
        assert_eq!(toks[1].kind, Kind::Unknown);
        assert_eq!(toks[1].beg, 4);
    }

    #[test]
    fn word_at_end_of_input_does_not_latch_eof() {
        let mut scanner = Scanner::new("123".as_bytes());
        assert_eq!(scanner.next_token().kind, Kind::Number("123".into()));
        assert!(!scanner.at_eof());
        assert_eq!(scanner.next_token().kind, Kind::Eof);
        assert!(scanner.at_eof());
    }
}

// SPDX: CC0-1.0

use crate::eval::{Func, Var};
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Int,
    Var(Var),
    Func(Func),
    Plus,
    Minus,
    Slash,
    Caret,
    OpenParen,
    CloseParen,

    // unsupported tokens
    XStar,
    XEqual,
    XGreater,
    XLess,
    XPipe,
    XComma,
    XDot,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Int
            | Self::Var(_)
            | Self::Func(_)
            | Self::Plus
            | Self::Minus
            | Self::Slash
            | Self::Caret
            | Self::OpenParen
            | Self::CloseParen => false,

            // unsupported tokens
            Self::XStar
            | Self::XEqual
            | Self::XGreater
            | Self::XLess
            | Self::XPipe
            | Self::XComma
            | Self::XDot
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    UnknownName,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::UnknownName => write!(f, "unknown name"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>, // contains only ascii characters
    cur: Peekable<CharIndices<'src>>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            has_errored: false,
        }
    }

    pub fn src(&self) -> &'src Arc<String> {
        self.src
    }

    fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_ascii_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Plus,
            '-' => TokTyp::Minus,
            '/' => TokTyp::Slash,
            '^' => TokTyp::Caret,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            '*' => TokTyp::XStar,
            '=' => TokTyp::XEqual,
            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '|' => TokTyp::XPipe,
            ',' => TokTyp::XComma,
            '.' => TokTyp::XDot,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        };
        self.cur.next(); // consume because we only peeked
        Some(Tok {
            typ,
            // @unicode
            loc: SubStr::new(Arc::clone(self.src), idx, 1),
        })
    }

    fn consume_run<P>(&mut self, next_idx: usize, predicate: P) -> SubStr
    where
        P: Fn(char) -> bool,
    {
        // @unicode
        let mut loc = SubStr::new(Arc::clone(self.src), next_idx, 0);
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                loc.shift_right(1);
                self.cur.next();
            } else {
                break;
            }
        }
        loc
    }

    // maximal munch over the fixed name set, so that "xy" lexes as two
    // variables and "sin" never splits into unknown single letters
    fn consume_name(&mut self, next_idx: usize, next_chr: char) -> Result<Tok, LexErr> {
        const FUNCS: [(&str, Func); 4] = [
            ("ln", Func::Ln),
            ("abs", Func::Abs),
            ("sin", Func::Sin),
            ("cos", Func::Cos),
        ];

        let rest = &self.src[next_idx..];
        for (name, func) in FUNCS {
            if rest.starts_with(name) {
                for _ in 0..name.len() {
                    self.cur.next();
                }
                return Ok(Tok {
                    typ: TokTyp::Func(func),
                    loc: SubStr::new(Arc::clone(self.src), next_idx, name.len()),
                });
            }
        }

        let var = match next_chr {
            'x' => Some(Var::X),
            'y' => Some(Var::Y),
            _ => None,
        };
        if let Some(var) = var {
            self.cur.next();
            return Ok(Tok {
                typ: TokTyp::Var(var),
                loc: SubStr::new(Arc::clone(self.src), next_idx, 1),
            });
        }

        let loc = self.consume_run(next_idx, |chr| chr.is_ascii_alphabetic());
        Err(LexErr {
            typ: LexErrTyp::UnknownName,
            loc,
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let ret = if let Some(tok) = self.consume_unambiguous() {
            Ok(tok)
        } else if next_chr.is_ascii_digit() {
            let loc = self.consume_run(next_idx, |chr| chr.is_ascii_digit());
            Ok(Tok {
                typ: TokTyp::Int,
                loc,
            })
        } else if next_chr.is_ascii_alphabetic() {
            self.consume_name(next_idx, next_chr)
        } else {
            Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                // @unicode
                loc: SubStr::new(Arc::clone(self.src), next_idx, 1),
            })
        };

        let ret = match ret {
            Ok(tok) if tok.typ.is_unsupported() => Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }),
            other => other,
        };
        if ret.is_err() {
            self.has_errored = true;
        }
        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Result<Tok, LexErr>> {
        let src = Arc::new(String::from(src));
        Lexer::new(&src).collect()
    }

    fn lex_typs(src: &str) -> Vec<TokTyp> {
        lex(src)
            .into_iter()
            .map(|tok| tok.unwrap().typ)
            .collect()
    }

    #[test]
    fn empty_and_whitespace() {
        assert!(lex("").is_empty());
        assert!(lex("  \t ").is_empty());
    }

    #[test]
    fn polynomial() {
        assert_eq!(
            lex_typs("2x^2+y"),
            vec![
                TokTyp::Int,
                TokTyp::Var(Var::X),
                TokTyp::Caret,
                TokTyp::Int,
                TokTyp::Plus,
                TokTyp::Var(Var::Y),
            ]
        );
    }

    #[test]
    fn adjacent_variables() {
        assert_eq!(lex_typs("xy"), vec![TokTyp::Var(Var::X), TokTyp::Var(Var::Y)]);
    }

    #[test]
    fn function_names() {
        assert_eq!(
            lex_typs("sin(x)cos(y)"),
            vec![
                TokTyp::Func(Func::Sin),
                TokTyp::OpenParen,
                TokTyp::Var(Var::X),
                TokTyp::CloseParen,
                TokTyp::Func(Func::Cos),
                TokTyp::OpenParen,
                TokTyp::Var(Var::Y),
                TokTyp::CloseParen,
            ]
        );
        assert_eq!(lex_typs("ln")[0], TokTyp::Func(Func::Ln));
        assert_eq!(lex_typs("abs")[0], TokTyp::Func(Func::Abs));
    }

    #[test]
    fn whitespace_between_tokens() {
        assert_eq!(
            lex_typs(" x + y "),
            vec![TokTyp::Var(Var::X), TokTyp::Plus, TokTyp::Var(Var::Y)]
        );
    }

    #[test]
    fn unknown_name() {
        let toks = lex("tan");
        assert_eq!(toks.len(), 1);
        let err = toks[0].clone().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::UnknownName);
        assert_eq!(err.loc.get(), "tan");
    }

    #[test]
    fn explicit_multiplication_is_unsupported() {
        let toks = lex("2*x");
        assert_eq!(toks.len(), 2); // stops after the error
        let err = toks[1].clone().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::Unsupported(TokTyp::XStar));
    }

    #[test]
    fn invalid_character() {
        let toks = lex("x%");
        let err = toks[1].clone().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::InvalidChar);
    }
}

// SPDX: CC0-1.0

// recursive descent over the token stream; one nonterminal per method.
// parenthesis matching is depth-aware, so nested groups like sin(x+(y))
// parse correctly.

use crate::{
    eval::{Expr, Factor, FactorTyp, Sign, Term},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    Number,
};
use core::{fmt, iter::Peekable, num::ParseFloatError};
use std::sync::Arc;

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ExpectedFactor,
    ExpectedOpenParen,
    ExpectedExponent,
    UnclosedParen,
    UnmatchedCloseParen,
    UnexpectedToken,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ExpectedFactor => write!(f, "expected a factor"),
            Self::ExpectedOpenParen => write!(f, "expected '('"),
            Self::ExpectedExponent => write!(f, "expected a single-digit exponent"),
            Self::UnclosedParen => write!(f, "unclosed parenthesis"),
            Self::UnmatchedCloseParen => write!(f, "unmatched ')'"),
            Self::UnexpectedToken => write!(f, "unexpected token"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

pub fn parse(lexer: Lexer<'_>) -> Result<Expr, ParseErr> {
    let src = Arc::clone(lexer.src());
    let mut parser = Parser {
        src,
        toks: lexer.peekable(),
    };
    let expr = parser.expression()?;
    match parser.next_tok()? {
        None => Ok(expr),
        Some(tok) => {
            let typ = if let TokTyp::CloseParen = tok.typ {
                ParseErrTyp::UnmatchedCloseParen
            } else {
                ParseErrTyp::UnexpectedToken
            };
            Err(ParseErr { typ, loc: tok.loc })
        }
    }
}

struct Parser<'src> {
    src: Arc<String>,
    toks: Peekable<Lexer<'src>>,
}

const fn can_start_factor(typ: TokTyp) -> bool {
    matches!(
        typ,
        TokTyp::Int | TokTyp::Var(_) | TokTyp::Func(_) | TokTyp::OpenParen | TokTyp::Slash
    )
}

impl Parser<'_> {
    fn peek_typ(&mut self) -> Result<Option<TokTyp>, ParseErr> {
        match self.toks.peek() {
            None => Ok(None),
            Some(Ok(tok)) => Ok(Some(tok.typ)),
            Some(Err(err)) => {
                let err = err.clone();
                self.toks.next();
                Err(err.into())
            }
        }
    }

    fn next_tok(&mut self) -> Result<Option<Tok>, ParseErr> {
        self.toks.next().transpose().map_err(Into::into)
    }

    fn end_err(&self, typ: ParseErrTyp) -> ParseErr {
        ParseErr {
            typ,
            loc: SubStr::new(Arc::clone(&self.src), self.src.len(), 0),
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseErr> {
        let mut terms = Vec::new();
        let mut sign = Sign::Plus;
        loop {
            terms.push(self.term(sign)?);
            match self.peek_typ()? {
                Some(TokTyp::Plus) => {
                    self.next_tok()?;
                    sign = Sign::Plus;
                }
                Some(TokTyp::Minus) => {
                    self.next_tok()?;
                    sign = Sign::Minus;
                }
                _ => break,
            }
        }
        Ok(Expr { terms })
    }

    fn term(&mut self, sign: Sign) -> Result<Term, ParseErr> {
        let mut factors = vec![self.factor()?];
        while let Some(typ) = self.peek_typ()? {
            if can_start_factor(typ) {
                factors.push(self.factor()?);
            } else {
                break;
            }
        }
        Ok(Term { sign, factors })
    }

    fn factor(&mut self) -> Result<Factor, ParseErr> {
        let tok = match self.next_tok()? {
            Some(tok) => tok,
            None => return Err(self.end_err(ParseErrTyp::ExpectedFactor)),
        };
        match tok.typ {
            TokTyp::Int => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                Ok(Factor {
                    typ: FactorTyp::Literal(num),
                    loc: tok.loc,
                })
            }

            TokTyp::Var(var) => {
                let power = self.exponent()?;
                Ok(Factor {
                    typ: FactorTyp::Var { var, power },
                    loc: tok.loc,
                })
            }

            TokTyp::Func(func) => {
                let power = if func.takes_exponent() {
                    self.exponent()?
                } else {
                    1
                };
                let arg = self.call_arg()?;
                Ok(Factor {
                    typ: FactorTyp::Call { func, power, arg },
                    loc: tok.loc,
                })
            }

            TokTyp::OpenParen => {
                let inner = self.expression()?;
                self.expect_close(&tok)?;
                Ok(Factor {
                    typ: FactorTyp::Group(inner),
                    loc: tok.loc,
                })
            }

            TokTyp::Slash => {
                let inner = self.call_arg()?;
                Ok(Factor {
                    typ: FactorTyp::Quotient(inner),
                    loc: tok.loc,
                })
            }

            TokTyp::Plus | TokTyp::Minus | TokTyp::Caret | TokTyp::CloseParen => Err(ParseErr {
                typ: ParseErrTyp::ExpectedFactor,
                loc: tok.loc,
            }),

            TokTyp::XStar
            | TokTyp::XEqual
            | TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XPipe
            | TokTyp::XComma
            | TokTyp::XDot
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => unreachable!("unsupported token survived lexing"),
        }
    }

    // '^' followed by exactly one digit; absent means power 1
    fn exponent(&mut self) -> Result<u8, ParseErr> {
        match self.peek_typ()? {
            Some(TokTyp::Caret) => {}
            _ => return Ok(1),
        }
        self.next_tok()?;
        let tok = match self.next_tok()? {
            Some(tok) => tok,
            None => return Err(self.end_err(ParseErrTyp::ExpectedExponent)),
        };
        match tok.typ {
            TokTyp::Int if tok.loc.len() == 1 => Ok(tok.loc.get().as_bytes()[0] - b'0'),
            _ => Err(ParseErr {
                typ: ParseErrTyp::ExpectedExponent,
                loc: tok.loc,
            }),
        }
    }

    fn call_arg(&mut self) -> Result<Expr, ParseErr> {
        let open = match self.next_tok()? {
            Some(tok) if matches!(tok.typ, TokTyp::OpenParen) => tok,
            Some(tok) => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ExpectedOpenParen,
                    loc: tok.loc,
                })
            }
            None => return Err(self.end_err(ParseErrTyp::ExpectedOpenParen)),
        };
        let inner = self.expression()?;
        self.expect_close(&open)?;
        Ok(inner)
    }

    fn expect_close(&mut self, open: &Tok) -> Result<(), ParseErr> {
        match self.next_tok()? {
            Some(tok) if matches!(tok.typ, TokTyp::CloseParen) => Ok(()),
            Some(tok) => Err(ParseErr {
                typ: ParseErrTyp::UnexpectedToken,
                loc: tok.loc,
            }),
            None => Err(ParseErr {
                typ: ParseErrTyp::UnclosedParen,
                loc: open.loc.clone(),
            }),
        }
    }
}

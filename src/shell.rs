// SPDX: CC0-1.0

use crate::{
    eval::{Expr, Factor, FactorTyp, Sign},
    lex::SubStr,
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Func,
    Place,
    Click,
    Clear,
    View,
    Ast,
    Plot,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Func,
            Self::Place,
            Self::Click,
            Self::Clear,
            Self::View,
            Self::Ast,
            Self::Plot,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Func => "list available functions and cycle the selection",
            Self::Place => "place a curve seed at world coordinates",
            Self::Click => "place a curve seed at canvas pixel coordinates",
            Self::Clear => "remove all placed curves",
            Self::View => "set view center and scale",
            Self::Ast => "print the parsed form of the current function (for debugging)",
            Self::Plot => "trace all placed curves and plot them with gnuplot",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Func => "func",
            Self::Place => "place",
            Self::Click => "click",
            Self::Clear => "clear",
            Self::View => "view",
            Self::Ast => "ast",
            Self::Plot => "plot",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s: &str = s;
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len())
    )?;
    Ok(())
}

pub fn dump_expr<W: Write>(mut out: W, expr: &Expr, title: core::fmt::Arguments) -> io::Result<()> {
    writeln!(out, "{title}:")?;
    if expr.terms.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    write_expr(&mut out, expr, 1)
}

fn write_expr<W: Write>(out: &mut W, expr: &Expr, depth: usize) -> io::Result<()> {
    let pad = "  ".repeat(depth);
    for term in &expr.terms {
        let sign = match term.sign {
            Sign::Plus => '+',
            Sign::Minus => '-',
        };
        writeln!(out, "{pad}term {sign}")?;
        for factor in &term.factors {
            write_factor(out, factor, depth + 1)?;
        }
    }
    Ok(())
}

fn write_factor<W: Write>(out: &mut W, factor: &Factor, depth: usize) -> io::Result<()> {
    let pad = "  ".repeat(depth);
    match &factor.typ {
        FactorTyp::Literal(num) => writeln!(out, "{pad}literal {num}"),
        FactorTyp::Var { var, power } => writeln!(out, "{pad}{var}^{power}"),
        FactorTyp::Group(inner) => {
            writeln!(out, "{pad}group")?;
            write_expr(out, inner, depth + 1)
        }
        FactorTyp::Quotient(inner) => {
            writeln!(out, "{pad}divide by")?;
            write_expr(out, inner, depth + 1)
        }
        FactorTyp::Call { func, power, arg } => {
            writeln!(out, "{pad}{func}^{power} of")?;
            write_expr(out, arg, depth + 1)
        }
    }
}

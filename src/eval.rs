// SPDX: CC0-1.0

use crate::{lex::SubStr, Number};
use core::fmt;

// values this close to zero are treated as zero by division and ln, so
// evaluation fails instead of blowing up
pub const NEAR_ZERO: Number = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Var {
    X,
    Y,
}

impl Var {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    Ln,
    Abs,
    Sin,
    Cos,
}

impl Func {
    pub const ALL: [Func; 4] = [Self::Ln, Self::Abs, Self::Sin, Self::Cos];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ln => "ln",
            Self::Abs => "abs",
            Self::Sin => "sin",
            Self::Cos => "cos",
        }
    }

    // abs(...) is the one call without an exponent form
    pub const fn takes_exponent(&self) -> bool {
        match self {
            Self::Ln | Self::Sin | Self::Cos => true,
            Self::Abs => false,
        }
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub const fn multiplier(&self) -> Number {
        match self {
            Self::Plus => 1.0,
            Self::Minus => -1.0,
        }
    }
}

// a flat sum of signed terms; each term is a running product of factors
#[derive(Clone, Debug)]
pub struct Expr {
    pub terms: Vec<Term>,
}

#[derive(Clone, Debug)]
pub struct Term {
    pub sign: Sign,
    pub factors: Vec<Factor>,
}

#[derive(Clone, Debug)]
pub struct Factor {
    pub typ: FactorTyp,
    pub loc: SubStr,
}

#[derive(Clone, Debug)]
pub enum FactorTyp {
    Literal(Number),
    Var { var: Var, power: u8 },
    Group(Expr),
    // divides the running product by the parenthesized value
    Quotient(Expr),
    // ln(e)^p means (ln e)^p, not ln(e^p); same for sin and cos
    Call { func: Func, power: u8, arg: Expr },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainErrTyp {
    DivisorNearZero,
    LogNearZero,
}

impl fmt::Display for DomainErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisorNearZero => write!(f, "division by a value too close to zero"),
            Self::LogNearZero => write!(f, "logarithm of a value too close to zero"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DomainErr {
    pub typ: DomainErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for DomainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

pub fn eval(expr: &Expr, x: Number, y: Number) -> Result<Number, DomainErr> {
    let mut sum = 0.0;
    for term in &expr.terms {
        sum += term.sign.multiplier() * eval_term(term, x, y)?;
    }
    Ok(sum)
}

fn eval_term(term: &Term, x: Number, y: Number) -> Result<Number, DomainErr> {
    let mut product = 1.0;
    for factor in &term.factors {
        match &factor.typ {
            FactorTyp::Literal(num) => product *= num,

            FactorTyp::Var { var, power } => {
                let coord = match var {
                    Var::X => x,
                    Var::Y => y,
                };
                product *= coord.powi(i32::from(*power));
            }

            FactorTyp::Group(inner) => product *= eval(inner, x, y)?,

            FactorTyp::Quotient(inner) => {
                let divisor = eval(inner, x, y)?;
                if divisor.abs() < NEAR_ZERO {
                    return Err(DomainErr {
                        typ: DomainErrTyp::DivisorNearZero,
                        loc: factor.loc.clone(),
                    });
                }
                product /= divisor;
            }

            FactorTyp::Call { func, power, arg } => {
                let arg = eval(arg, x, y)?;
                let val = match func {
                    Func::Ln => {
                        if arg.abs() < NEAR_ZERO {
                            return Err(DomainErr {
                                typ: DomainErrTyp::LogNearZero,
                                loc: factor.loc.clone(),
                            });
                        }
                        arg.ln()
                    }
                    Func::Abs => arg.abs(),
                    Func::Sin => arg.sin(),
                    Func::Cos => arg.cos(),
                };
                product *= val.powi(i32::from(*power));
            }
        }
    }
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, parse};
    use std::sync::Arc;

    fn compile(src: &str) -> Expr {
        let src = Arc::new(String::from(src));
        parse::parse(Lexer::new(&src)).unwrap()
    }

    fn run(src: &str, x: Number, y: Number) -> Result<Number, DomainErr> {
        eval(&compile(src), x, y)
    }

    fn assert_close(actual: Number, expected: Number) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn known_values() {
        assert_close(run("x^2+y^2", 3.0, 4.0).unwrap(), 25.0);
        assert_close(run("2x", 5.0, 0.0).unwrap(), 10.0);
        assert_close(run("x-y", 3.0, 1.0).unwrap(), 2.0);
        assert_close(run("sin(x)", 0.0, 0.0).unwrap(), 0.0);
        assert_close(run("abs(x)", -5.0, 0.0).unwrap(), 5.0);
    }

    #[test]
    fn implicit_multiplication() {
        assert_close(run("xy", 3.0, 4.0).unwrap(), 12.0);
        assert_close(run("2(x+y)", 1.0, 2.0).unwrap(), 6.0);
        assert_close(run("x^2y", 2.0, 3.0).unwrap(), 12.0);
    }

    #[test]
    fn sign_propagation() {
        assert_close(run("x-y+2", 3.0, 1.0).unwrap(), 4.0);
        assert_close(run("1-2-3", 0.0, 0.0).unwrap(), -4.0);
    }

    #[test]
    fn zero_exponent() {
        assert_close(run("x^0", 7.0, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn quotient() {
        let x = 5.0;
        assert_close(run("/(x)", x, 0.0).unwrap(), 1.0 / x);
        assert_close(run("2/(y)", 0.0, 4.0).unwrap(), 0.5);
    }

    #[test]
    fn quotient_near_zero_is_undefined() {
        for x in [0.0, 0.009, -0.009] {
            let err = run("/(x)", x, 0.0).unwrap_err();
            assert_eq!(err.typ, DomainErrTyp::DivisorNearZero);
        }
        assert!(run("/(x)", 0.01, 0.0).is_ok());
    }

    #[test]
    fn log() {
        assert_close(run("ln(x)", 1.0, 0.0).unwrap(), 0.0);
        let x = 7.5;
        assert_close(run("ln(x)", x, 0.0).unwrap(), x.ln());
    }

    #[test]
    fn log_near_zero_is_undefined() {
        for x in [0.0, 0.005, -0.005] {
            let err = run("ln(x)", x, 0.0).unwrap_err();
            assert_eq!(err.typ, DomainErrTyp::LogNearZero);
        }
    }

    #[test]
    fn call_exponent_applies_to_result() {
        let x = 7.389;
        let ln = run("ln(x)", x, 0.0).unwrap();
        assert_close(run("ln^2(x)", x, 0.0).unwrap(), ln * ln);
    }

    #[test]
    fn trig_identity() {
        for x in [-2.0, 0.3, 1.7] {
            assert_close(run("sin^2(x)+cos^2(x)", x, 0.0).unwrap(), 1.0);
        }
    }

    #[test]
    fn parenthesis_round_trip() {
        let cases = ["x", "2x+y", "sin(x)cos(y)", "x^2-3y"];
        for case in cases {
            let wrapped = format!("({case})");
            let plain = run(case, 1.25, -0.75).unwrap();
            assert_close(run(&wrapped, 1.25, -0.75).unwrap(), plain);
        }
    }

    #[test]
    fn nested_domain_error_short_circuits() {
        let err = run("1+sin(/(y))", 0.0, 0.0).unwrap_err();
        assert_eq!(err.typ, DomainErrTyp::DivisorNearZero);
    }

    #[test]
    fn deterministic() {
        let expr = compile("2x^3-sin(y)+/(x)");
        let a = eval(&expr, 1.5, 2.5).unwrap();
        let b = eval(&expr, 1.5, 2.5).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(a.is_finite());
    }
}

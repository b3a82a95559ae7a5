// SPDX: CC0-1.0

pub mod curves;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod registry;
pub mod shell;
pub mod trace;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

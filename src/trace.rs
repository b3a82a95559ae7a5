// SPDX: CC0-1.0

use crate::{
    eval::{self, Expr},
    Number, Point,
};

// pixels per world unit at scale 1.0
pub const PIXELS_PER_UNIT: Number = 40.0;

// pan/zoom state shared by every coordinate conversion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub x_center: Number,
    pub y_center: Number,
    pub scale: Number, // must be > 0
}

impl View {
    // world step per one-pixel advance in screen x
    pub fn step(&self) -> Number {
        1.0 / (PIXELS_PER_UNIT * self.scale)
    }

    pub fn to_screen(&self, canvas: Canvas, world: Point<Number>) -> Point<Number> {
        Point {
            x: Number::from(canvas.width) / 2.0
                - (self.x_center - world.x) * self.scale * PIXELS_PER_UNIT,
            y: Number::from(canvas.height) / 2.0
                + (self.y_center - world.y) * self.scale * PIXELS_PER_UNIT,
        }
    }

    pub fn to_world(&self, canvas: Canvas, screen: Point<Number>) -> Point<Number> {
        Point {
            x: self.x_center
                - (Number::from(canvas.width) / 2.0 - screen.x) / (PIXELS_PER_UNIT * self.scale),
            y: self.y_center
                + (Number::from(canvas.height) / 2.0 - screen.y) / (PIXELS_PER_UNIT * self.scale),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn contains(&self, p: Point<Number>) -> bool {
        p.x >= 0.0
            && p.x <= Number::from(self.width)
            && p.y >= 0.0
            && p.y <= Number::from(self.height)
    }
}

// screen-space line from one evaluated point to the next
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub x1: Number,
    pub y1: Number,
    pub x2: Number,
    pub y2: Number,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    const fn signum(self) -> Number {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

// one explicit-Euler integration pass from a seed point; ends at the first
// domain error or the first step that would leave the canvas
#[derive(Debug)]
pub struct Pass<'e> {
    expr: &'e Expr,
    view: View,
    canvas: Canvas,
    dir: Direction,
    x: Number,
    y: Number,
    step: Number,
    done: bool,
}

impl<'e> Pass<'e> {
    fn new(expr: &'e Expr, seed: Point<Number>, view: View, canvas: Canvas, dir: Direction) -> Self {
        Self {
            expr,
            view,
            canvas,
            dir,
            x: seed.x,
            y: seed.y,
            step: view.step(),
            done: false,
        }
    }
}

pub fn forward(expr: &Expr, seed: Point<Number>, view: View, canvas: Canvas) -> Pass<'_> {
    Pass::new(expr, seed, view, canvas, Direction::Forward)
}

pub fn backward(expr: &Expr, seed: Point<Number>, view: View, canvas: Canvas) -> Pass<'_> {
    Pass::new(expr, seed, view, canvas, Direction::Backward)
}

impl Iterator for Pass<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.done {
            return None;
        }

        let deriv = match eval::eval(self.expr, self.x, self.y) {
            Ok(val) if val.is_finite() => val,
            // the curve reached its domain boundary
            _ => {
                self.done = true;
                return None;
            }
        };

        let from = self.view.to_screen(
            self.canvas,
            Point {
                x: self.x,
                y: self.y,
            },
        );
        // one-pixel tangent stub; screen y grows downward
        let to = Point {
            x: from.x + self.dir.signum(),
            y: from.y - self.dir.signum() * deriv,
        };
        if !self.canvas.contains(from) || !self.canvas.contains(to) {
            self.done = true;
            return None;
        }

        self.x += self.dir.signum() * self.step;
        self.y += self.dir.signum() * self.step * deriv;

        Some(Segment {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, parse};
    use std::sync::Arc;

    const CANVAS: Canvas = Canvas {
        width: 1024,
        height: 768,
    };
    const VIEW: View = View {
        x_center: 0.0,
        y_center: 0.0,
        scale: 1.0,
    };
    const ORIGIN: Point<Number> = Point { x: 0.0, y: 0.0 };

    fn compile(src: &str) -> Expr {
        let src = Arc::new(String::from(src));
        parse::parse(Lexer::new(&src)).unwrap()
    }

    fn assert_close(actual: Number, expected: Number) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn screen_world_round_trip() {
        let view = View {
            x_center: 1.5,
            y_center: -2.0,
            scale: 2.0,
        };
        let world = Point { x: 0.25, y: 3.5 };
        let screen = view.to_screen(CANVAS, world);
        let back = view.to_world(CANVAS, screen);
        assert_close(back.x, world.x);
        assert_close(back.y, world.y);
    }

    #[test]
    fn screen_mapping_is_exact() {
        // the original's formula, reproduced coordinate for coordinate
        let screen = VIEW.to_screen(CANVAS, Point { x: 1.0, y: 2.0 });
        assert_close(screen.x, 512.0 + 40.0);
        assert_close(screen.y, 384.0 - 80.0);
    }

    #[test]
    fn euler_forward_matches_recurrence() {
        // dy/dx = x from (0,0): y' accumulates step by step
        let expr = compile("x");
        let segments: Vec<Segment> = forward(&expr, ORIGIN, VIEW, CANVAS).take(12).collect();
        assert_eq!(segments.len(), 12);

        let step = 1.0 / (PIXELS_PER_UNIT * VIEW.scale);
        let (mut x, mut y) = (0.0, 0.0);
        for seg in &segments {
            let deriv = x;
            let px = Number::from(CANVAS.width) / 2.0 + x * PIXELS_PER_UNIT;
            let py = Number::from(CANVAS.height) / 2.0 - y * PIXELS_PER_UNIT;
            assert_close(seg.x1, px);
            assert_close(seg.y1, py);
            assert_close(seg.x2, px + 1.0);
            assert_close(seg.y2, py - deriv);
            x += step;
            y += step * deriv;
        }
    }

    #[test]
    fn retracing_is_deterministic() {
        let expr = compile("x-y");
        let seed = Point { x: 0.5, y: -0.25 };
        let a: Vec<Segment> = forward(&expr, seed, VIEW, CANVAS).collect();
        let b: Vec<Segment> = forward(&expr, seed, VIEW, CANVAS).collect();
        assert_eq!(a, b);
        let a: Vec<Segment> = backward(&expr, seed, VIEW, CANVAS).collect();
        let b: Vec<Segment> = backward(&expr, seed, VIEW, CANVAS).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn stops_at_canvas_edge() {
        // dy/dx = 0 from the center: one segment per pixel column until the
        // right edge, give or take one column of float rounding at the
        // boundary, and never an endpoint outside the canvas
        let view = View {
            x_center: 0.0,
            y_center: 0.0,
            scale: 0.8,
        };
        let expr = compile("0");
        let segments: Vec<Segment> = forward(&expr, ORIGIN, view, CANVAS).collect();
        let n = segments.len();
        assert!((511..=512).contains(&n), "unexpected pass length {n}");
        for seg in &segments {
            assert!(CANVAS.contains(Point { x: seg.x1, y: seg.y1 }));
            assert!(CANVAS.contains(Point { x: seg.x2, y: seg.y2 }));
        }
    }

    #[test]
    fn seed_outside_view_emits_nothing() {
        let expr = compile("x");
        let seed = Point { x: 100.0, y: 0.0 };
        assert_eq!(forward(&expr, seed, VIEW, CANVAS).count(), 0);
    }

    #[test]
    fn domain_error_ends_pass_immediately() {
        let expr = compile("/(y)");
        assert_eq!(forward(&expr, ORIGIN, VIEW, CANVAS).count(), 0);
    }

    #[test]
    fn log_domain_bounds_backward_pass() {
        // tracing ln(x) backward from x=1 must stop near x=0.01, well
        // before the canvas edge would end the pass
        let expr = compile("ln(x)");
        let seed = Point { x: 1.0, y: 0.0 };
        let n = backward(&expr, seed, VIEW, CANVAS).count();
        assert!(n > 30 && n < 45, "unexpected pass length {n}");
    }

    #[test]
    fn passes_are_independent() {
        let expr = compile("x");
        let seed = Point { x: 0.0, y: 1.0 };
        let fwd: Vec<Segment> = forward(&expr, seed, VIEW, CANVAS).take(5).collect();
        let bwd: Vec<Segment> = backward(&expr, seed, VIEW, CANVAS).take(5).collect();
        assert_eq!(fwd[0].x1, bwd[0].x1);
        assert_eq!(fwd[0].y1, bwd[0].y1);
        assert_close(fwd[0].x2, fwd[0].x1 + 1.0);
        assert_close(bwd[0].x2, bwd[0].x1 - 1.0);
    }
}

// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use integral_curve::{
    curves::{CurveSet, Seed},
    eval::{Expr, Func, Var},
    lex::{LexErrTyp, Lexer, TokTyp},
    parse::{self, ParseErr, ParseErrTyp},
    registry::Registry,
    shell::{self, Command},
    trace::{self, Canvas, View},
    Number, Point,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs,
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
    sync::Arc,
};

const CANVAS: Canvas = Canvas {
    width: 1024,
    height: 768,
};
const MAX_CURVES: usize = 100;

const FUNCTIONS_FILE: &str = "functions.txt";
const DEFAULT_FUNCTIONS: &str = "x
x-y
2x+1
x^2y
sin(x)cos(y)
/(y)
ln(x)
abs(y)-x
";

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn output_gnuplot_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "gnuplot"
    )
}

fn output_data_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "data"
    )
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    registry: Registry,
    compiled: Option<Arc<Expr>>, // parsed form of the selected function
    curves: CurveSet,
    view: View,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let listing =
        fs::read_to_string(FUNCTIONS_FILE).unwrap_or_else(|_| String::from(DEFAULT_FUNCTIONS));
    let registry = Registry::from_lines(&listing)
        .with_context(|| format!("no expressions found in {FUNCTIONS_FILE}"))?;

    let mut state = State {
        registry,
        compiled: None,
        curves: CurveSet::with_capacity(MAX_CURVES),
        view: View {
            x_center: 0.0,
            y_center: 0.0,
            scale: 1.0,
        },
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        writeln!(stdout, "f'(x,y) = {}", state.registry.current())?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Func => cycle_function(&mut stdout, &mut state)?,

                Command::Place => place_curve(&mut stdout, &mut state)?,

                Command::Click => click_curve(&mut stdout, &mut state)?,

                Command::Clear => {
                    state.curves.clear();
                    writeln!(stdout, "removed all curves")?;
                }

                Command::View => set_view(&mut stdout, &mut state)?,

                Command::Ast => {
                    if let Some(expr) = compile_current(&mut stdout, &mut state)? {
                        shell::dump_expr(&mut stdout, &expr, format_args!("expression tree"))?;
                    }
                }

                Command::Plot => plot_curves(&mut stdout, &mut state)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn cycle_function<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    for (i, func) in state.registry.iter().enumerate() {
        let marker = if i == state.registry.selected() {
            '*'
        } else {
            ' '
        };
        writeln!(out, " {marker} {func}")?;
    }
    writeln!(out)?;

    let choice = shell::input(&mut out, "?cycle (n)ext, (p)rev, blank to keep = ")?;
    match choice.as_str() {
        "n" => {
            state.registry.cycle_next();
            state.compiled = None;
        }
        "p" => {
            state.registry.cycle_prev();
            state.compiled = None;
        }
        "" => {}
        _ => writeln!(out, "unknown choice, keeping current function")?,
    }
    writeln!(out, "f'(x,y) = {}", state.registry.current())?;
    Ok(())
}

fn compile_current<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<Option<Arc<Expr>>> {
    if let Some(ref expr) = state.compiled {
        return Ok(Some(Arc::clone(expr)));
    }
    let src = Arc::clone(state.registry.current());
    match parse::parse(Lexer::new(&src)) {
        Ok(expr) => {
            let expr = Arc::new(expr);
            state.compiled = Some(Arc::clone(&expr));
            Ok(Some(expr))
        }
        Err(err) => {
            report_parse_err(&mut out, &err)?;
            Ok(None)
        }
    }
}

fn report_parse_err<W: Write>(mut out: W, err: &ParseErr) -> anyhow::Result<()> {
    writeln!(out)?;
    shell::underline(&mut out, &err.loc)?;
    writeln!(out, "parse error: {}", err.typ)?;

    match &err.typ {
        ParseErrTyp::LexErr(lex_err) => match lex_err {
            LexErrTyp::InvalidChar => {
                writeln!(
                    out,
                    "note: available tokens are digits, x, y, ln, abs, sin, cos, and the symbols +-/^()"
                )?;
            }
            LexErrTyp::UnknownName => suggest_name(&mut out, err.loc.get())?,
            LexErrTyp::Unsupported(typ) => match typ {
                TokTyp::XStar => {
                    writeln!(out, "note: multiplication is implicit, write 2x rather than 2*x")?;
                }
                TokTyp::XGreater | TokTyp::XLess => {
                    writeln!(out, "note: expected an expression but found an inequality")?;
                }
                TokTyp::XEqual => {
                    writeln!(out, "note: expected an expression but found an equation")?;
                }
                TokTyp::XPipe => {
                    writeln!(out, "note: use the 'abs' function to compute absolute value")?;
                }
                TokTyp::XDot => {
                    writeln!(out, "note: only integer literals are supported")?;
                }
                _ => {}
            },
        },

        ParseErrTyp::ExpectedExponent => {
            writeln!(out, "note: an exponent is a single digit 0-9")?;
        }

        ParseErrTyp::ExpectedOpenParen => {
            writeln!(
                out,
                "note: ln, abs, sin, cos and / take a parenthesized argument"
            )?;
        }

        ParseErrTyp::ParseNum(_)
        | ParseErrTyp::ExpectedFactor
        | ParseErrTyp::UnclosedParen
        | ParseErrTyp::UnmatchedCloseParen
        | ParseErrTyp::UnexpectedToken => {}
    }
    Ok(())
}

fn suggest_name<W: Write>(mut out: W, unknown: &str) -> anyhow::Result<()> {
    let unknown = unknown.to_ascii_lowercase();
    let most_similar = Func::ALL
        .iter()
        .map(|f| f.name())
        .chain([Var::X.name(), Var::Y.name()])
        .map(|name| (strsim::normalized_damerau_levenshtein(&unknown, name), name))
        .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc });
    if let Some((sim, name)) = most_similar {
        if sim > 0.3 {
            writeln!(out, "note: '{name}' has a similar name")?;
        }
    }
    Ok(())
}

fn read_coordinate<W: Write>(
    mut out: W,
    prompt: impl core::fmt::Display,
) -> anyhow::Result<Option<Number>> {
    match shell::read_fromstr::<_, Number>(&mut out, prompt, false)? {
        Ok(Some(val)) if val.is_finite() => Ok(Some(val)),
        Ok(Some(_)) => {
            writeln!(out, "error: coordinates must be finite")?;
            Ok(None)
        }
        Ok(None) | Err(_) => Ok(None),
    }
}

fn place_curve<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let expr = match compile_current(&mut out, state)? {
        Some(expr) => expr,
        None => return Ok(()),
    };

    let x = match read_coordinate(&mut out, "?x = ")? {
        Some(val) => val,
        None => return Ok(()),
    };
    let y = match read_coordinate(&mut out, "?y = ")? {
        Some(val) => val,
        None => return Ok(()),
    };

    state.curves.place(Seed {
        point: Point { x, y },
        expr,
    });
    writeln!(
        out,
        "placed curve {count} of up to {cap}",
        count = state.curves.len(),
        cap = state.curves.capacity()
    )?;
    Ok(())
}

fn click_curve<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let expr = match compile_current(&mut out, state)? {
        Some(expr) => expr,
        None => return Ok(()),
    };

    let px = match read_coordinate(&mut out, "?pixel x = ")? {
        Some(val) => val,
        None => return Ok(()),
    };
    let py = match read_coordinate(&mut out, "?pixel y = ")? {
        Some(val) => val,
        None => return Ok(()),
    };
    let screen = Point { x: px, y: py };
    if !CANVAS.contains(screen) {
        writeln!(
            out,
            "error: point is outside the {w}x{h} canvas",
            w = CANVAS.width,
            h = CANVAS.height
        )?;
        return Ok(());
    }

    let point = state.view.to_world(CANVAS, screen);
    state.curves.place(Seed { point, expr });
    writeln!(
        out,
        "placed curve at ({x}, {y})",
        x = point.x,
        y = point.y
    )?;
    Ok(())
}

fn set_view<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(
        out,
        "view: center ({xc}, {yc}), scale {s}",
        xc = state.view.x_center,
        yc = state.view.y_center,
        s = state.view.scale
    )?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("x center", &mut state.view.x_center),
        ("y center", &mut state.view.y_center),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) if new.is_finite() => *dst = new,
            Ok(Some(_)) => {
                writeln!(out, "error: center must be finite")?;
                return Ok(());
            }
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: scale must be positive")?;
    match shell::read_fromstr::<_, Number>(
        &mut out,
        format_args!("?scale (is {cur}) = ", cur = state.view.scale),
        true,
    )? {
        Ok(Some(new)) if new.is_finite() && new > 0.0 => state.view.scale = new,
        Ok(Some(_)) => writeln!(out, "error: scale must be a positive finite number")?,
        Ok(None) => {}
        Err(_) => {}
    }

    Ok(())
}

fn plot_curves<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    if state.curves.is_empty() {
        writeln!(out, "error: no curves placed (try 'place' or 'click')")?;
        return Ok(());
    }

    // set up gnuplot
    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }
    let now = Local::now();
    let data_path = output_data_filename(now);
    let gnuplot_path = output_gnuplot_filename(now);
    let svg_path = output_svg_filename(now);
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );

    // every redraw re-traces every seed from scratch
    let mut segments: usize = 0;
    for seed in state.curves.iter() {
        for seg in trace::forward(&seed.expr, seed.point, state.view, CANVAS) {
            writeln!(data, "{} {} {} {}", seg.x1, seg.y1, seg.x2, seg.y2)
                .context("failed to write to output data file")?;
            segments += 1;
        }
        for seg in trace::backward(&seed.expr, seed.point, state.view, CANVAS) {
            writeln!(data, "{} {} {} {}", seg.x1, seg.y1, seg.x2, seg.y2)
                .context("failed to write to output data file")?;
            segments += 1;
        }
    }
    data.flush()?;
    data.get_mut().sync_data()?;
    drop(data);

    if segments == 0 {
        writeln!(out, "no curve segments fall within the canvas")?;
        return Ok(());
    }
    writeln!(
        out,
        "traced {segments} segments from {count} curves",
        count = state.curves.len()
    )?;

    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    // set output info
    writeln!(
        gnuplot,
        "set terminal svg size {w},{h} enhanced",
        w = CANVAS.width,
        h = CANVAS.height
    )?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    // segments are in screen coordinates, y axis pointing down
    writeln!(gnuplot, "set xrange[0:{w}]", w = CANVAS.width)?;
    writeln!(gnuplot, "set yrange[{h}:0]", h = CANVAS.height)?;

    // configure appearence
    writeln!(gnuplot, r#"set title "{data_path}""#)?;
    writeln!(gnuplot, "set title noenhanced")?;
    writeln!(gnuplot, "set style arrow 2 nohead lc '#b8860b'")?;
    writeln!(gnuplot, r#"set xlabel "screen x""#)?;
    writeln!(gnuplot, r#"set ylabel "screen y""#)?;
    writeln!(gnuplot, "set tics out nomirror")?;

    writeln!(gnuplot, r#"plot '{data_path}' \"#)?;
    writeln!(gnuplot, r#"  using 1:2:($3-$1):($4-$2) \"#)?;
    writeln!(gnuplot, r#"  with vectors arrowstyle 2 \"#)?;
    writeln!(gnuplot, r#"  title "integral curves""#)?;

    // display window
    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    // done with the file
    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    // spawn gnuplot and provide the path to the file
    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${{PATH}}?)")?;

    state.gnuplot = Some(child);

    Ok(())
}

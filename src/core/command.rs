//! Purpose: Assemble engine command text from typed parts.
//! Exports: `quote`, `validate_block_name`, `define_block`, `PlotStyle`,
//! `PlotSource`, `PlotElement`, `plot_command`.
//! Role: The only place command syntax is spelled out; sessions and figures
//! send what this module builds.
//! Invariants: Block names are `[A-Za-z_][A-Za-z0-9_]*`; anything else is
//! rejected before a single byte reaches the engine.
//! Invariants: Quoted strings never contain raw quotes, backslashes, or
//! newlines.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

/// Double-quoted engine string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

pub fn validate_block_name(name: &str) -> Result<(), Error> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|ch| ch.is_ascii_alphabetic() || ch == '_')
        .unwrap_or(false);
    if !head_ok || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid data block name {name:?}"))
            .with_hint("Block names are letters, digits, and underscores, not starting with a digit."));
    }
    Ok(())
}

/// Frame serialized lines as a named here-document block.
pub fn define_block(name: &str, lines: &[String]) -> Result<Vec<String>, Error> {
    validate_block_name(name)?;
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("${name} << EOD"));
    out.extend(lines.iter().cloned());
    out.push("EOD".to_string());
    Ok(out)
}

/// Engine plotting style keywords.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlotStyle {
    Lines,
    Points,
    LinesPoints,
    Dots,
    Impulses,
    Steps,
    Boxes,
    Image,
    Pm3d,
}

impl PlotStyle {
    pub fn keyword(self) -> &'static str {
        match self {
            PlotStyle::Lines => "lines",
            PlotStyle::Points => "points",
            PlotStyle::LinesPoints => "linespoints",
            PlotStyle::Dots => "dots",
            PlotStyle::Impulses => "impulses",
            PlotStyle::Steps => "steps",
            PlotStyle::Boxes => "boxes",
            PlotStyle::Image => "image",
            PlotStyle::Pm3d => "pm3d",
        }
    }
}

impl fmt::Display for PlotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for PlotStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(PlotStyle::Lines),
            "points" => Ok(PlotStyle::Points),
            "linespoints" => Ok(PlotStyle::LinesPoints),
            "dots" => Ok(PlotStyle::Dots),
            "impulses" => Ok(PlotStyle::Impulses),
            "steps" => Ok(PlotStyle::Steps),
            "boxes" => Ok(PlotStyle::Boxes),
            "image" => Ok(PlotStyle::Image),
            "pm3d" => Ok(PlotStyle::Pm3d),
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown plot style {other:?}"))
                .with_hint(
                    "Use one of: lines, points, linespoints, dots, impulses, steps, boxes, image, pm3d.",
                )),
        }
    }
}

/// Where one plot clause takes its data from.
#[derive(Clone, Debug, PartialEq)]
pub enum PlotSource {
    Block(String),
    Function(String),
    File(PathBuf),
}

/// One clause of a `plot`/`splot` command.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotElement {
    source: PlotSource,
    using: Option<String>,
    style: Option<PlotStyle>,
    title: Option<String>,
    options: Option<String>,
}

impl PlotElement {
    pub fn block(name: impl Into<String>) -> Self {
        Self::new(PlotSource::Block(name.into()))
    }

    pub fn function(expr: impl Into<String>) -> Self {
        Self::new(PlotSource::Function(expr.into()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(PlotSource::File(path.into()))
    }

    fn new(source: PlotSource) -> Self {
        Self {
            source,
            using: None,
            style: None,
            title: None,
            options: None,
        }
    }

    pub fn with_using(mut self, using: impl Into<String>) -> Self {
        self.using = Some(using.into());
        self
    }

    pub fn with_style(mut self, style: PlotStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Free-form trailing options, appended verbatim.
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn render(&self) -> Result<String, Error> {
        let mut parts = Vec::new();
        match &self.source {
            PlotSource::Block(name) => {
                validate_block_name(name)?;
                parts.push(format!("${name}"));
            }
            PlotSource::Function(expr) => parts.push(expr.clone()),
            PlotSource::File(path) => parts.push(quote(&path_text(path))),
        }
        if let Some(using) = &self.using {
            parts.push(format!("using {using}"));
        }
        if let Some(style) = self.style {
            parts.push(format!("with {style}"));
        }
        if let Some(title) = &self.title {
            parts.push(format!("title {}", quote(title)));
        }
        if let Some(options) = &self.options {
            parts.push(options.clone());
        }
        Ok(parts.join(" "))
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Join clauses into one `plot` (or `splot`) command line.
pub fn plot_command(elements: &[PlotElement], three_d: bool) -> Result<String, Error> {
    if elements.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("a plot command needs at least one element"));
    }
    let clauses = elements
        .iter()
        .map(PlotElement::render)
        .collect::<Result<Vec<_>, _>>()?;
    let verb = if three_d { "splot" } else { "plot" };
    Ok(format!("{verb} {}", clauses.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::{PlotElement, PlotStyle, define_block, plot_command, quote, validate_block_name};
    use crate::core::error::ErrorKind;

    #[test]
    fn quote_escapes_specials() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a \"b\" \\c"), "\"a \\\"b\\\" \\\\c\"");
        assert_eq!(quote("two\nlines"), "\"two\\nlines\"");
    }

    #[test]
    fn block_names_follow_the_identifier_rule() {
        assert!(validate_block_name("data_1").is_ok());
        assert!(validate_block_name("_tmp").is_ok());
        for bad in ["", "1data", "a-b", "a b", "a$b"] {
            let err = validate_block_name(bad).expect_err("invalid");
            assert_eq!(err.kind(), ErrorKind::Usage);
        }
    }

    #[test]
    fn define_block_frames_lines_verbatim() {
        let lines = vec![" 1 4".to_string(), " 2 5".to_string()];
        assert_eq!(
            define_block("data", &lines).expect("frame"),
            vec!["$data << EOD", " 1 4", " 2 5", "EOD"]
        );
    }

    #[test]
    fn element_renders_all_clause_parts() {
        let element = PlotElement::block("data")
            .with_using("1:2")
            .with_style(PlotStyle::Lines)
            .with_title("sine")
            .with_options("lw 2");
        assert_eq!(
            element.render().expect("render"),
            "$data using 1:2 with lines title \"sine\" lw 2"
        );
    }

    #[test]
    fn function_and_file_sources_render() {
        assert_eq!(
            PlotElement::function("sin(x)").render().expect("render"),
            "sin(x)"
        );
        assert_eq!(
            PlotElement::file("out/points.dat")
                .with_style(PlotStyle::Points)
                .render()
                .expect("render"),
            "\"out/points.dat\" with points"
        );
    }

    #[test]
    fn plot_command_joins_clauses() {
        let elements = [
            PlotElement::block("data").with_style(PlotStyle::Lines),
            PlotElement::function("sin(x)"),
        ];
        assert_eq!(
            plot_command(&elements, false).expect("plot"),
            "plot $data with lines, sin(x)"
        );
        assert_eq!(
            plot_command(&elements[..1], true).expect("splot"),
            "splot $data with lines"
        );
    }

    #[test]
    fn empty_plot_is_a_usage_error() {
        let err = plot_command(&[], false).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}

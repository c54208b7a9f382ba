//! Purpose: Assemble one figure's command script: settings, data blocks,
//! plot command.
//! Exports: `Figure`, `Multiplot`.
//! Role: Deterministic script builder between the pure core and a live
//! session; shape errors surface when data is attached, not at render time.
//! Invariants: Script order is settings, blocks, plot command.
//! Invariants: Block names are unique within a figure.

use crate::api::session::Session;
use crate::core::command::{self, PlotElement, PlotStyle};
use crate::core::datablock::{DataInput, Value, column};
use crate::core::error::{Error, ErrorKind};
use crate::core::palette;

#[derive(Debug)]
pub struct Figure {
    three_d: bool,
    settings: Vec<String>,
    blocks: Vec<(String, Vec<String>)>,
    elements: Vec<PlotElement>,
    auto_blocks: usize,
}

impl Figure {
    pub fn new() -> Self {
        Self::with_dimensions(false)
    }

    pub fn new_3d() -> Self {
        Self::with_dimensions(true)
    }

    fn with_dimensions(three_d: bool) -> Self {
        Self {
            three_d,
            settings: Vec::new(),
            blocks: Vec::new(),
            elements: Vec::new(),
            auto_blocks: 0,
        }
    }

    /// Append a `set` option; an empty value sets a bare flag.
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.settings.push(format!("set {key}"));
        } else {
            self.settings.push(format!("set {key} {value}"));
        }
        self
    }

    /// Append an arbitrary command line ahead of the plot command.
    pub fn raw(&mut self, line: impl Into<String>) -> &mut Self {
        self.settings.push(line.into());
        self
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.set("title", &command::quote(title))
    }

    pub fn palette(&mut self, name: &str) -> Result<&mut Self, Error> {
        let line = palette::palette(name)?;
        self.settings.push(line);
        Ok(self)
    }

    pub fn linetypes(&mut self, name: &str) -> Result<&mut Self, Error> {
        self.settings.extend(palette::linetypes(name)?);
        Ok(self)
    }

    /// Attach a named data block, serializing (and shape-checking) now.
    pub fn data(&mut self, name: &str, input: &DataInput) -> Result<&mut Self, Error> {
        command::validate_block_name(name)?;
        if self.blocks.iter().any(|(existing, _)| existing == name) {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message(format!("data block ${name} is already attached")));
        }
        let lines = input.render()?;
        self.blocks.push((name.to_string(), lines));
        Ok(self)
    }

    pub fn element(&mut self, element: PlotElement) -> &mut Self {
        self.elements.push(element);
        self
    }

    /// Attach an x/y pair under an auto-named block and plot it.
    pub fn plot_xy(
        &mut self,
        x: &[f64],
        y: &[f64],
        style: PlotStyle,
        title: Option<&str>,
    ) -> Result<&mut Self, Error> {
        let input = DataInput::Columns(vec![xy_column(x), xy_column(y)]);
        self.auto_blocks += 1;
        let name = format!("data{}", self.auto_blocks);
        self.data(&name, &input)?;
        let mut element = PlotElement::block(&name)
            .with_using("1:2")
            .with_style(style);
        if let Some(title) = title {
            element = element.with_title(title);
        }
        Ok(self.element(element))
    }

    /// The full command script, in emission order.
    pub fn script(&self) -> Result<Vec<String>, Error> {
        if self.elements.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("figure has no plot elements")
                .with_hint("Attach data and an element, or use plot_xy."));
        }
        let mut lines = self.settings.clone();
        for (name, block) in &self.blocks {
            lines.extend(command::define_block(name, block)?);
        }
        lines.push(command::plot_command(&self.elements, self.three_d)?);
        Ok(lines)
    }

    /// Send the script over a live session.
    pub fn render_to(&self, session: &mut Session) -> Result<(), Error> {
        session.send_lines(self.script()?)
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}

fn xy_column(values: &[f64]) -> Vec<Value> {
    column(values.iter().copied())
}

/// A grid of figures emitted inside one multiplot block.
pub struct Multiplot {
    rows: usize,
    cols: usize,
    title: Option<String>,
    figures: Vec<Figure>,
}

impl Multiplot {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            title: None,
            figures: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push(&mut self, figure: Figure) -> &mut Self {
        self.figures.push(figure);
        self
    }

    pub fn script(&self) -> Result<Vec<String>, Error> {
        if self.figures.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("multiplot has no figures"));
        }
        let capacity = self.rows * self.cols;
        if self.figures.len() > capacity {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "{} figures exceed the {}x{} layout",
                self.figures.len(),
                self.rows,
                self.cols
            )));
        }
        let mut header = format!("set multiplot layout {},{}", self.rows, self.cols);
        if let Some(title) = &self.title {
            header.push_str(&format!(" title {}", command::quote(title)));
        }
        let mut lines = vec![header];
        for figure in &self.figures {
            lines.extend(figure.script()?);
        }
        lines.push("unset multiplot".to_string());
        Ok(lines)
    }

    pub fn render_to(&self, session: &mut Session) -> Result<(), Error> {
        session.send_lines(self.script()?)
    }
}

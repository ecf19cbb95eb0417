//! Open/close markup for every [`Element`] kind.
//!
//! Nothing here knows about the element stack. A [`Scope`] hands in the element's own frame
//! state and, where it matters, its parent's; the document owns both.

use std::fmt::Write;

use crate::{
    class::{DocumentClass, SectionMarkup},
    data::{Alignment, Element, TextStyle},
};

use super::{
    escape::{escape_url, inline_code_delimiter, sanitize_citation_key},
    primitives::{write_command_close, write_label, write_line_terminator, LINE_BREAK},
    OutputGenerator, Res,
};

/// Default width of a single graphic, as a fraction of the line
const DEFAULT_GRAPHIC_WIDTH: f32 = 0.9;

/// Mutable per-element state, kept between open and close
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameState {
    /// floats: decided on open, so the closing environment matches
    pub page_wide: bool,
    /// sections: native command or emulation, decided on open
    pub section: Option<SectionMarkup>,
    /// floats and sections: whether the label anchor is already out
    pub label_written: bool,
    pub captioned: bool,
    pub tabular_open: bool,
    pub cells: usize,
    pub sub_figures: usize,
    /// graphic reference, relative to the document folder
    pub graphic: Option<String>,
    /// raw text collected by code elements
    pub buffer: String,
}

pub struct Scope<'a> {
    pub own: &'a mut FrameState,
    pub parent: Option<(&'a Element, &'a mut FrameState)>,
}

impl Scope<'_> {
    fn parent_element(&self) -> Option<&Element> {
        self.parent.as_ref().map(|(element, _)| *element)
    }

    fn parent_state(&mut self) -> Option<&mut FrameState> {
        self.parent.as_mut().map(|(_, state)| &mut **state)
    }
}

/// Whether a float should be rendered across all columns
pub fn spans_page(element: &Element, class: &DocumentClass) -> bool {
    element.float_size() == Some(crate::data::FloatSize::AllColumns) && class.is_multi_column()
}

fn float_environment(base: &str, page_wide: bool) -> String {
    if page_wide {
        format!("{base}*")
    } else {
        base.to_owned()
    }
}

fn write_line<W: Write + ?Sized>(output: &mut W, line: &str) -> Res {
    output.write_str(line)?;
    write_line_terminator(output)?;
    Ok(())
}

fn write_column_spec<W: Write + ?Sized>(output: &mut W, columns: &[Alignment]) -> Res {
    output.write_char('|')?;
    for alignment in columns {
        output.write_char(alignment.column_char())?;
        output.write_char('|')?;
    }
    Ok(())
}

/// Writes the float's label, unless its caption already did
fn write_pending_label<W: Write + ?Sized>(output: &mut W, element: &Element, state: &mut FrameState) -> Res {
    if !state.label_written && write_label(element.label(), output, false)? {
        write_line_terminator(output)?;
    }
    state.label_written = true;
    Ok(())
}

fn width_fraction(width: f32) -> String {
    let width = if width.is_finite() { width } else { DEFAULT_GRAPHIC_WIDTH };
    let width = format!("{:.3}", width.clamp(0.0, 1.0));
    width.trim_end_matches('0').trim_end_matches('.').to_owned()
}

impl<'a> OutputGenerator<Scope<'a>> for Element {
    fn write_open<W: Write + ?Sized>(&self, output: &mut W, scope: &mut Scope<'a>) -> Res {
        match self {
            Element::Section { .. } => {
                output.write_str(LINE_BREAK)?;
            }
            Element::SectionTitle => {
                let markup = scope.parent_state().and_then(|p| p.section);
                match markup {
                    Some(SectionMarkup::Native(level)) => {
                        write!(output, "\\{}{{", level.command())?;
                    }
                    Some(SectionMarkup::Emulated) | None => {
                        output.write_str("\\par\\noindent\\textbf{")?;
                    }
                }
            }
            Element::Table { .. } | Element::Figure { .. } | Element::FigureSeries { .. } => {
                let base = match self {
                    Element::Table { .. } => "table",
                    _ => "figure",
                };
                let environment = float_environment(base, scope.own.page_wide);
                write_line(output, &format!("\\begin{{{environment}}}[htbp]"))?;
                write_line(output, "\\centering")?;
                if let Element::Figure { width, .. } = self {
                    let width = width_fraction(width.unwrap_or(DEFAULT_GRAPHIC_WIDTH));
                    let graphic = scope.own.graphic.as_deref().unwrap_or_default();
                    write_line(
                        output,
                        &format!("\\includegraphics[width={width}\\linewidth]{{{graphic}}}"),
                    )?;
                }
            }
            Element::TableRow { .. } => {
                let columns = match scope.parent_element() {
                    Some(Element::Table { columns, .. }) => columns.clone(),
                    _ => vec![],
                };
                if let Some(table) = scope.parent_state() {
                    if !table.tabular_open {
                        table.tabular_open = true;
                        output.write_str("\\begin{tabular}{")?;
                        write_column_spec(output, &columns)?;
                        write_command_close(output)?;
                        write_line(output, "\\hline")?;
                    }
                }
            }
            Element::TableCell { span, alignment } => {
                let first = match scope.parent_state() {
                    Some(row) => {
                        row.cells += 1;
                        row.cells == 1
                    }
                    None => true,
                };
                if !first {
                    output.write_str(" & ")?;
                }
                if span.cols() > 1 {
                    let alignment = alignment.unwrap_or_default().column_char();
                    let left = if first { "|" } else { "" };
                    write!(output, "\\multicolumn{{{}}}{{{left}{alignment}|}}{{", span.cols())?;
                }
                if span.rows() > 1 {
                    write!(output, "\\multirow{{{}}}{{*}}{{", span.rows())?;
                }
            }
            Element::SubFigure { .. } => {
                let per_row = match scope.parent_element() {
                    Some(Element::FigureSeries { per_row, .. }) => (*per_row).max(1),
                    _ => 1,
                };
                let index = match scope.parent_state() {
                    Some(series) => {
                        series.sub_figures += 1;
                        series.sub_figures - 1
                    }
                    None => 0,
                };
                if index > 0 {
                    if index % per_row == 0 {
                        write_line(output, "\\par\\medskip")?;
                    } else {
                        write_line(output, "\\hfill")?;
                    }
                }
                // a little less than an even share, so rounding never wraps the row
                let width = width_fraction(0.98 / per_row as f32);
                write_line(output, &format!("\\begin{{minipage}}[b]{{{width}\\linewidth}}"))?;
                write_line(output, "\\centering")?;
                let graphic = scope.own.graphic.as_deref().unwrap_or_default();
                write_line(output, &format!("\\includegraphics[width=\\linewidth]{{{graphic}}}"))?;
            }
            Element::Caption => {
                let parent = scope.parent_element();
                let sub_figure = matches!(parent, Some(Element::SubFigure { .. }));
                let table = matches!(parent, Some(Element::Table { .. }));
                if table {
                    // \caption can't live inside a tabular; rows after it start a new one
                    if let Some(state) = scope.parent_state().filter(|state| state.tabular_open) {
                        write_line(output, "\\hline\\end{tabular}")?;
                        state.tabular_open = false;
                    }
                }
                if sub_figure {
                    output.write_str("\\figureSeriesElementCaption{")?;
                } else {
                    output.write_str("\\caption{")?;
                }
            }
            Element::Code { .. } => {
                write_line(output, "\\begin{codeFloat}[htbp]")?;
            }
            Element::CodeBody | Element::InlineCode => {
                // written on close, once the whole body is known
            }
            Element::Equation { .. } => {
                write_line(output, "\\begin{equation}")?;
            }
            Element::InlineMath => output.write_str("\\(")?,
            Element::Citation { keys } => {
                let keys: Vec<_> = keys
                    .iter()
                    .map(|key| sanitize_citation_key(key))
                    .filter(|key| !key.is_empty())
                    .collect();
                write!(output, "\\cite{{{}}}", keys.join(","))?;
            }
            Element::Href { url } => {
                write!(output, "\\href{{{}}}{{", escape_url(url.as_str()))?;
            }
            Element::Styled(style) => match style {
                TextStyle::Bold => output.write_str("\\textbf{")?,
                TextStyle::Italic => output.write_str("\\textit{")?,
                TextStyle::Monospace => output.write_str("\\texttt{")?,
                TextStyle::Underlined => output.write_str("\\textUnderline{")?,
                TextStyle::Color(color) => write!(output, "\\textcolor{{{}}}{{", color.markup_name())?,
            },
            Element::SubScript => output.write_str("\\textsubscript{")?,
            Element::SuperScript => output.write_str("\\textsuperscript{")?,
            Element::Enumeration => write_line(output, "\\begin{enumerate}")?,
            Element::Itemization => write_line(output, "\\begin{itemize}")?,
            Element::Item => output.write_str("\\item ")?,
        }
        Ok(())
    }

    fn write_close<W: Write + ?Sized>(&self, output: &mut W, scope: &mut Scope<'a>) -> Res {
        match self {
            Element::Section { .. } => {
                output.write_str(LINE_BREAK)?;
            }
            Element::SectionTitle => {
                let Some((section, state)) = scope.parent.as_mut() else {
                    write_command_close(output)?;
                    return Ok(());
                };
                let emulated = !matches!(state.section, Some(SectionMarkup::Native(_)));
                if emulated {
                    output.write_str("}\\par")?;
                    write_line_terminator(output)?;
                } else {
                    write_command_close(output)?;
                }
                if write_label(section.label(), output, emulated)? {
                    write_line_terminator(output)?;
                }
                state.label_written = true;
            }
            Element::Table { .. } => {
                if scope.own.tabular_open {
                    write_line(output, "\\hline\\end{tabular}")?;
                }
                write_pending_label(output, self, scope.own)?;
                let environment = float_environment("table", scope.own.page_wide);
                write_line(output, &format!("\\end{{{environment}}}"))?;
            }
            Element::Figure { .. } | Element::FigureSeries { .. } => {
                write_pending_label(output, self, scope.own)?;
                let environment = float_environment("figure", scope.own.page_wide);
                write_line(output, &format!("\\end{{{environment}}}"))?;
            }
            Element::TableRow { header } => {
                output.write_str("\\\\")?;
                if *header {
                    output.write_str("\\hline")?;
                }
                write_line_terminator(output)?;
            }
            Element::TableCell { span, .. } => {
                if span.rows() > 1 {
                    output.write_char('}')?;
                }
                if span.cols() > 1 {
                    output.write_char('}')?;
                }
            }
            Element::SubFigure { .. } => {
                write_pending_label(output, self, scope.own)?;
                write_line(output, "\\end{minipage}")?;
            }
            Element::Caption => {
                output.write_char('}')?;
                if let Some((owner, state)) = scope.parent.as_mut() {
                    // the anchor must follow the caption, that's where the number is assigned
                    if !state.label_written {
                        write_label(owner.label(), output, false)?;
                        state.label_written = true;
                    }
                    state.captioned = true;
                }
                write_line_terminator(output)?;
            }
            Element::Code { .. } => {
                write_pending_label(output, self, scope.own)?;
                write_line(output, "\\end{codeFloat}")?;
            }
            Element::CodeBody => {
                output.write_str("\\begin{lstlisting}")?;
                if let Some(Element::Code {
                    language: Some(language),
                    ..
                }) = scope.parent_element()
                {
                    write!(output, "[language={language}]")?;
                }
                output.write_str(LINE_BREAK)?;
                let body = scope.own.buffer.trim_end_matches(['\r', '\n']);
                output.write_str(body)?;
                output.write_str(LINE_BREAK)?;
                write_line(output, "\\end{lstlisting}")?;
            }
            Element::InlineCode => {
                let code = scope.own.buffer.replace(['\r', '\n'], " ");
                let delimiter = inline_code_delimiter(&code)?;
                write!(output, "\\lstinline{delimiter}{code}{delimiter}")?;
            }
            Element::Equation { .. } => {
                write_line_terminator(output)?;
                if write_label(self.label(), output, false)? {
                    write_line_terminator(output)?;
                }
                write_line(output, "\\end{equation}")?;
            }
            Element::InlineMath => output.write_str("\\)")?,
            Element::Citation { .. } => {}
            Element::Href { .. }
            | Element::Styled(_)
            | Element::SubScript
            | Element::SuperScript => output.write_char('}')?,
            Element::Enumeration => write_line(output, "\\end{enumerate}")?,
            Element::Itemization => write_line(output, "\\end{itemize}")?,
            Element::Item => write_line_terminator(output)?,
        }
        Ok(())
    }
}

use std::path::PathBuf;

use url::Url;

use crate::flags::{Feature, UsageFlags};

/// An anchor that can be referenced from anywhere in the same document.
///
/// Uniqueness of ids is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    id: String,
}

impl Label {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FloatSize {
    /// fits into a single column
    #[default]
    Column,
    /// spans all columns of the page
    AllColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub const fn column_char(self) -> char {
        match self {
            Alignment::Left => 'l',
            Alignment::Center => 'c',
            Alignment::Right => 'r',
        }
    }
}

/// How many rows and columns a table cell covers. Both are at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    rows: usize,
    cols: usize,
}

impl Default for CellSpan {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

impl CellSpan {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// An RGB text color. The markup name is derived from the value, so equal colors share one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorStyle {
    rgb: u32,
}

impl ColorStyle {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            rgb: (red as u32) << 16 | (green as u32) << 8 | blue as u32,
        }
    }

    pub const fn from_hex(rgb: u32) -> Self {
        Self {
            rgb: rgb & 0xFF_FF_FF,
        }
    }

    /// Six upper-case, zero-padded hex digits
    pub fn hex(&self) -> String {
        format!("{:06X}", self.rgb)
    }

    pub fn markup_name(&self) -> String {
        format!("tdColor{}", self.hex())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextStyle {
    Bold,
    Italic,
    Monospace,
    Underlined,
    Color(ColorStyle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    /// the number of the referenced element
    #[default]
    Number,
    /// the page the referenced element is on
    Page,
    /// the number, prefixed with the element's kind name
    Auto,
}

/// Math symbols that do not have a plain-text spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathSymbol {
    LessOrEqual,
    GreaterOrEqual,
    NotEqual,
    Approximately,
    Infinity,
    Times,
    EmptySet,
    Naturals,
    Integers,
    Reals,
    LessSimilar,
    Therefore,
}

impl MathSymbol {
    pub const fn command(self) -> &'static str {
        match self {
            MathSymbol::LessOrEqual => "\\leq",
            MathSymbol::GreaterOrEqual => "\\geq",
            MathSymbol::NotEqual => "\\neq",
            MathSymbol::Approximately => "\\approx",
            MathSymbol::Infinity => "\\infty",
            MathSymbol::Times => "\\times",
            MathSymbol::EmptySet => "\\varnothing",
            MathSymbol::Naturals => "\\mathbb{N}",
            MathSymbol::Integers => "\\mathbb{Z}",
            MathSymbol::Reals => "\\mathbb{R}",
            MathSymbol::LessSimilar => "\\lesssim",
            MathSymbol::Therefore => "\\therefore",
        }
    }

    /// Symbols only available with the AMS symbol fonts
    pub const fn needs_ams(self) -> bool {
        matches!(
            self,
            MathSymbol::EmptySet
                | MathSymbol::Naturals
                | MathSymbol::Integers
                | MathSymbol::Reals
                | MathSymbol::LessSimilar
                | MathSymbol::Therefore
        )
    }
}

/// Every kind of node a document body can contain.
///
/// Elements are opened and closed in stack order through [`crate::Document`].
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A section. Its first child must be a [`Element::SectionTitle`].
    Section { label: Option<Label> },
    SectionTitle,
    Table {
        size: FloatSize,
        columns: Vec<Alignment>,
        label: Option<Label>,
    },
    TableRow { header: bool },
    TableCell {
        span: CellSpan,
        /// alignment override, only used by cells spanning several columns
        alignment: Option<Alignment>,
    },
    Figure {
        size: FloatSize,
        graphic: PathBuf,
        /// fraction of the available line width
        width: Option<f32>,
        label: Option<Label>,
    },
    FigureSeries {
        size: FloatSize,
        per_row: usize,
        label: Option<Label>,
    },
    SubFigure {
        graphic: PathBuf,
        label: Option<Label>,
    },
    Caption,
    Code {
        language: Option<String>,
        label: Option<Label>,
    },
    CodeBody,
    InlineCode,
    Equation { label: Option<Label> },
    InlineMath,
    Citation { keys: Vec<String> },
    Href { url: Url },
    Styled(TextStyle),
    SubScript,
    SuperScript,
    Enumeration,
    Itemization,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ElementKind {
    Section,
    SectionTitle,
    Table,
    TableRow,
    TableCell,
    Figure,
    FigureSeries,
    SubFigure,
    Caption,
    Code,
    CodeBody,
    InlineCode,
    Equation,
    InlineMath,
    Citation,
    Href,
    Styled,
    SubScript,
    SuperScript,
    Enumeration,
    Itemization,
    Item,
}

/// How appended text is treated inside an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// escaped; a line break starts a new paragraph
    Escaped,
    /// escaped; a line break is a single space (captions, titles, cells)
    SingleParagraph,
    /// written as-is (math)
    Raw,
    /// collected and written as-is on close (code)
    Buffered,
    /// no text allowed
    Forbidden,
    /// whatever the parent does
    Inherit,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Section { .. } => ElementKind::Section,
            Element::SectionTitle => ElementKind::SectionTitle,
            Element::Table { .. } => ElementKind::Table,
            Element::TableRow { .. } => ElementKind::TableRow,
            Element::TableCell { .. } => ElementKind::TableCell,
            Element::Figure { .. } => ElementKind::Figure,
            Element::FigureSeries { .. } => ElementKind::FigureSeries,
            Element::SubFigure { .. } => ElementKind::SubFigure,
            Element::Caption => ElementKind::Caption,
            Element::Code { .. } => ElementKind::Code,
            Element::CodeBody => ElementKind::CodeBody,
            Element::InlineCode => ElementKind::InlineCode,
            Element::Equation { .. } => ElementKind::Equation,
            Element::InlineMath => ElementKind::InlineMath,
            Element::Citation { .. } => ElementKind::Citation,
            Element::Href { .. } => ElementKind::Href,
            Element::Styled(_) => ElementKind::Styled,
            Element::SubScript => ElementKind::SubScript,
            Element::SuperScript => ElementKind::SuperScript,
            Element::Enumeration => ElementKind::Enumeration,
            Element::Itemization => ElementKind::Itemization,
            Element::Item => ElementKind::Item,
        }
    }

    /// Flags this element sets on its document when it is opened
    pub fn features(&self) -> UsageFlags {
        let none = UsageFlags::empty();
        match self {
            Element::Table { .. } => none.with(Feature::Table),
            Element::TableCell { span, .. } => {
                let mut flags = none;
                if span.rows() > 1 {
                    flags.set(Feature::MultiRowCell);
                }
                if span.cols() > 1 {
                    flags.set(Feature::MultiColCell);
                }
                flags
            }
            Element::Figure { .. } => none.with(Feature::Figure),
            Element::FigureSeries { .. } => none.with(Feature::FigureSeries),
            Element::Code { .. } | Element::InlineCode => none.with(Feature::Code),
            Element::SubScript | Element::SuperScript => {
                none.with(Feature::TextSubOrSuperScript)
            }
            Element::Styled(TextStyle::Underlined) => none.with(Feature::Underlined),
            Element::Styled(TextStyle::Color(_)) => none.with(Feature::Colors),
            _ => none,
        }
    }

    pub fn label(&self) -> Option<&Label> {
        match self {
            Element::Section { label }
            | Element::Table { label, .. }
            | Element::Figure { label, .. }
            | Element::FigureSeries { label, .. }
            | Element::SubFigure { label, .. }
            | Element::Code { label, .. }
            | Element::Equation { label } => label.as_ref(),
            _ => None,
        }
    }

    pub fn float_size(&self) -> Option<FloatSize> {
        match self {
            Element::Table { size, .. }
            | Element::Figure { size, .. }
            | Element::FigureSeries { size, .. } => Some(*size),
            _ => None,
        }
    }
}

impl ElementKind {
    pub const fn text_mode(self) -> TextMode {
        match self {
            ElementKind::Section | ElementKind::Item => TextMode::Escaped,
            ElementKind::SectionTitle | ElementKind::Caption | ElementKind::TableCell => {
                TextMode::SingleParagraph
            }
            ElementKind::Equation | ElementKind::InlineMath => TextMode::Raw,
            ElementKind::CodeBody | ElementKind::InlineCode => TextMode::Buffered,
            ElementKind::Styled
            | ElementKind::SubScript
            | ElementKind::SuperScript
            | ElementKind::Href => TextMode::Inherit,
            ElementKind::Table
            | ElementKind::TableRow
            | ElementKind::Figure
            | ElementKind::FigureSeries
            | ElementKind::SubFigure
            | ElementKind::Code
            | ElementKind::Citation
            | ElementKind::Enumeration
            | ElementKind::Itemization => TextMode::Forbidden,
        }
    }

    /// Floats and other block constructs, which can't be nested into running text
    pub const fn is_block(self) -> bool {
        matches!(
            self,
            ElementKind::Section
                | ElementKind::Table
                | ElementKind::Figure
                | ElementKind::FigureSeries
                | ElementKind::Code
                | ElementKind::Equation
        )
    }

    pub const fn is_inline(self) -> bool {
        matches!(
            self,
            ElementKind::InlineCode
                | ElementKind::InlineMath
                | ElementKind::Citation
                | ElementKind::Href
                | ElementKind::Styled
                | ElementKind::SubScript
                | ElementKind::SuperScript
        )
    }

    pub const fn has_caption(self) -> bool {
        matches!(
            self,
            ElementKind::Table
                | ElementKind::Figure
                | ElementKind::FigureSeries
                | ElementKind::SubFigure
                | ElementKind::Code
        )
    }

    /// Whether `child` may be opened directly inside `parent` (`None` is the document itself).
    ///
    /// `parent_mode` is the parent's effective text mode, with [`TextMode::Inherit`] already resolved.
    pub fn accepts(parent: Option<ElementKind>, parent_mode: TextMode, child: ElementKind) -> bool {
        use ElementKind as K;
        match child {
            K::Section => matches!(parent, None | Some(K::Section)),
            K::SectionTitle => parent == Some(K::Section),
            K::TableRow => parent == Some(K::Table),
            K::TableCell => parent == Some(K::TableRow),
            K::SubFigure => parent == Some(K::FigureSeries),
            K::CodeBody => parent == Some(K::Code),
            K::Caption => parent.is_some_and(K::has_caption),
            K::Item => matches!(parent, Some(K::Enumeration | K::Itemization)),
            K::Enumeration | K::Itemization => {
                matches!(parent, None | Some(K::Section | K::Item))
            }
            block if block.is_block() => matches!(parent, None | Some(K::Section | K::Item)),
            inline if inline.is_inline() => {
                matches!(parent_mode, TextMode::Escaped | TextMode::SingleParagraph)
                    // code and math must not hide inside each other's delimiters
                    && !matches!(parent, Some(K::InlineCode | K::InlineMath))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! features {
        {$name:ident, $element:expr, [$($feature:expr), *]} => {
            #[test]
            fn $name() {
                // arrange
                let element = $element;

                // act
                let flags = element.features();

                // assert
                let expected: UsageFlags = [$($feature), *].into_iter().collect();
                assert_eq!(flags, expected);
            }
        };
    }

    features! {table_sets_table, Element::Table { size: FloatSize::Column, columns: vec![Alignment::Left], label: None }, [Feature::Table]}
    features! {plain_cell_sets_nothing, Element::TableCell { span: CellSpan::default(), alignment: None }, []}
    features! {wide_cell, Element::TableCell { span: CellSpan::new(1, 2), alignment: None }, [Feature::MultiColCell, Feature::Table]}
    features! {tall_cell, Element::TableCell { span: CellSpan::new(3, 1), alignment: None }, [Feature::MultiRowCell, Feature::Table]}
    features! {big_cell, Element::TableCell { span: CellSpan::new(2, 2), alignment: None }, [Feature::MultiRowCell, Feature::MultiColCell]}
    features! {series_sets_figure, Element::FigureSeries { size: FloatSize::Column, per_row: 2, label: None }, [Feature::FigureSeries]}
    features! {inline_code, Element::InlineCode, [Feature::Code]}
    features! {subscript, Element::SubScript, [Feature::TextSubOrSuperScript]}
    features! {underline, Element::Styled(TextStyle::Underlined), [Feature::Underlined]}
    features! {color, Element::Styled(TextStyle::Color(ColorStyle::rgb(1, 2, 3))), [Feature::Colors]}
    features! {bold, Element::Styled(TextStyle::Bold), []}
    features! {section, Element::Section { label: None }, []}

    #[test]
    fn color_hex_is_padded() {
        // arrange
        let color = ColorStyle::rgb(0, 0x0A, 0xFF);

        // act
        let hex = color.hex();

        // assert
        assert_eq!(hex, "000AFF");
        assert_eq!(color.markup_name(), "tdColor000AFF");
    }

    #[test]
    fn cell_span_is_at_least_one() {
        let span = CellSpan::new(0, 0);
        assert_eq!((span.rows(), span.cols()), (1, 1));
    }

    #[test]
    fn nesting_rules() {
        use ElementKind as K;
        assert!(K::accepts(None, TextMode::Escaped, K::Section));
        assert!(!K::accepts(None, TextMode::Escaped, K::TableRow));
        assert!(K::accepts(Some(K::Table), TextMode::Forbidden, K::Caption));
        assert!(!K::accepts(Some(K::Section), TextMode::Escaped, K::Caption));
        assert!(K::accepts(Some(K::Caption), TextMode::SingleParagraph, K::Styled));
        assert!(!K::accepts(Some(K::Figure), TextMode::Forbidden, K::Styled));
        assert!(!K::accepts(Some(K::InlineMath), TextMode::Raw, K::InlineCode));
        assert!(!K::accepts(Some(K::Caption), TextMode::SingleParagraph, K::Table));
    }

    #[test]
    fn blocks_and_inlines_by_placement() {
        use ElementKind as K;
        let kinds = [
            K::Table,
            K::Figure,
            K::FigureSeries,
            K::Code,
            K::Equation,
            K::InlineCode,
            K::InlineMath,
            K::Citation,
            K::Href,
            K::Styled,
            K::SubScript,
            K::SuperScript,
        ];
        for kind in kinds {
            assert_ne!(kind.is_block(), kind.is_inline(), "{kind}");
            assert!(K::accepts(Some(K::Item), TextMode::Escaped, kind), "{kind} in an item");
            assert_eq!(
                K::accepts(Some(K::Caption), TextMode::SingleParagraph, kind),
                kind.is_inline(),
                "{kind} in a caption"
            );
        }
        assert!(!K::TableRow.is_block() && !K::TableRow.is_inline());
    }
}

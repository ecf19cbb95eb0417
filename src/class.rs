//! Document class descriptors: immutable, created before a document opens any element.

use std::sync::Arc;

use once_cell::sync::Lazy;

/// Native sectioning commands, from the coarsest to the finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionLevel {
    Part,
    Chapter,
    Section,
    SubSection,
    SubSubSection,
    Paragraph,
    SubParagraph,
}

impl SectionLevel {
    const ALL: [SectionLevel; 7] = [
        SectionLevel::Part,
        SectionLevel::Chapter,
        SectionLevel::Section,
        SectionLevel::SubSection,
        SectionLevel::SubSubSection,
        SectionLevel::Paragraph,
        SectionLevel::SubParagraph,
    ];

    pub const fn command(self) -> &'static str {
        match self {
            SectionLevel::Part => "part",
            SectionLevel::Chapter => "chapter",
            SectionLevel::Section => "section",
            SectionLevel::SubSection => "subsection",
            SectionLevel::SubSubSection => "subsubsection",
            SectionLevel::Paragraph => "paragraph",
            SectionLevel::SubParagraph => "subparagraph",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    pub const fn option(self) -> &'static str {
        match self {
            PaperSize::A4 => "a4paper",
            PaperSize::Letter => "letterpaper",
        }
    }
}

/// Font packages loaded by every document of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPalette {
    pub packages: Vec<String>,
}

static DEFAULT_PALETTE: Lazy<Arc<FontPalette>> = Lazy::new(|| {
    Arc::new(FontPalette {
        packages: vec!["lmodern".to_owned(), "textcomp".to_owned()],
    })
});

impl FontPalette {
    /// Shared default palette, created on first use
    pub fn default_palette() -> Arc<FontPalette> {
        Arc::clone(&DEFAULT_PALETTE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentClass {
    pub name: String,
    pub options: Vec<String>,
    pub paper: PaperSize,
    pub columns: u8,
    pub highest_section: SectionLevel,
    pub lowest_section: SectionLevel,
    pub fonts: Arc<FontPalette>,
    /// Class specific preamble lines, written after everything else
    pub setup: Vec<String>,
}

/// What a section at some depth turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionMarkup {
    Native(SectionLevel),
    Emulated,
}

impl DocumentClass {
    pub fn article() -> Self {
        Self {
            name: "article".to_owned(),
            options: vec![],
            paper: PaperSize::A4,
            columns: 1,
            highest_section: SectionLevel::Section,
            lowest_section: SectionLevel::SubSubSection,
            fonts: FontPalette::default_palette(),
            setup: vec![],
        }
    }

    pub fn report() -> Self {
        Self {
            name: "report".to_owned(),
            highest_section: SectionLevel::Chapter,
            ..Self::article()
        }
    }

    pub fn ieeetran() -> Self {
        Self {
            name: "IEEEtran".to_owned(),
            options: vec!["conference".to_owned()],
            paper: PaperSize::Letter,
            columns: 2,
            setup: vec!["\\IEEEoverridecommandlockouts".to_owned()],
            ..Self::article()
        }
    }

    /// Markup used for a section nested at `depth` (top-level sections have depth 0)
    pub fn section_markup(&self, depth: usize) -> SectionMarkup {
        let level = self.highest_section.index() + depth;
        if level > self.lowest_section.index() {
            return SectionMarkup::Emulated;
        }
        SectionLevel::from_index(level).map_or(SectionMarkup::Emulated, SectionMarkup::Native)
    }

    pub fn is_multi_column(&self) -> bool {
        self.columns > 1
    }

    /// Options for `\documentclass`: the paper size, then the class options
    pub fn class_options(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.paper.option()).chain(self.options.iter().map(String::as_str))
    }
}

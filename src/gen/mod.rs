pub mod element;
pub mod escape;
pub mod preamble;
pub mod primitives;

use std::fmt::Write;

use crate::{data::ElementKind, path_engine::PathError};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{}", .0)]
    Fmt(#[from] std::fmt::Error),
    #[error("{}", .0)]
    Io(#[from] std::io::Error),
    #[error("{}", .0)]
    Path(#[from] PathError),
    #[error("Inline code contains every usable delimiter character, it has to be written as a code block")]
    NoInlineDelimiter,
    #[error("{child} can't be placed inside {}", parent.map_or("the document".to_owned(), |p| p.to_string()))]
    InvalidChild {
        parent: Option<ElementKind>,
        child: ElementKind,
    },
    #[error("Tried to close {requested}, but {open} is the innermost open element")]
    UnbalancedClose {
        open: ElementKind,
        requested: ElementKind,
    },
    #[error("Tried to close {requested}, but nothing is open")]
    NothingOpen { requested: ElementKind },
    #[error("{} already has a caption", .0)]
    SecondCaption(ElementKind),
    #[error("A section has to start with its title")]
    UntitledSection,
    #[error("Text can't be written into {}", .0)]
    TextNotAllowed(ElementKind),
    #[error("Math symbols need math mode")]
    NotInMath,
    #[error("Document was finished while {} were still open", .0.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", "))]
    UnclosedElements(Vec<ElementKind>),
}

pub type Res = Result<(), GenerationError>;

/// Generates the markup of a single element kind.
///
/// Implementors are pure: everything they need is in `self` and the state they are given,
/// and everything they produce goes to `output`.
pub trait OutputGenerator<State> {
    fn write_open<W: Write + ?Sized>(&self, output: &mut W, state: &mut State) -> Res;

    fn write_close<W: Write + ?Sized>(&self, output: &mut W, state: &mut State) -> Res;
}

//! The document: the open-element stack, the flags, and everything written on finish.

use std::{
    fmt::Write as _,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use itertools::Itertools;

use crate::{
    class::DocumentClass,
    config::{GraphicFormat, ResolvedConfig},
    data::{ColorStyle, Element, ElementKind, Label, MathSymbol, ReferenceMode, TextMode, TextStyle},
    flags::{Feature, UsageFlags},
    gen::{
        element::{spans_page, FrameState, Scope},
        escape::{sanitize_citation_key, write_escaped},
        preamble::{self, PreambleInput},
        primitives::{write_comment_line, write_line_terminator, write_reference, LINE_BREAK},
        GenerationError, OutputGenerator, Res,
    },
    path_engine::{preamble_path, relative_reference, CheckedEngine, PathEngine, PathError},
    resources::ResourceCopier,
    toolchain::{document_folder, Dependency, FileType, Toolchain},
    util::{BodySink, FmtToIo},
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("A document can't be built without a document class")]
    MissingDocumentClass,
    #[error("A document can't be built without a main file")]
    MissingMainFile,
    #[error("{}", .0)]
    Io(#[from] std::io::Error),
    #[error("{}", .0)]
    Path(#[from] PathError),
    #[error("{}", .0)]
    Generation(#[from] GenerationError),
}

/// Body writer of a document written straight to its main file
pub type FileBody = FmtToIo<BufWriter<File>>;

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    class: Option<DocumentClass>,
    main_file: Option<PathBuf>,
    config: Option<ResolvedConfig>,
    path_engine: Option<Box<dyn PathEngine>>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: DocumentClass) -> Self {
        self.class = Some(class);
        self
    }

    /// The main `.tex` file. Its folder is where everything else goes.
    pub fn main_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.main_file = Some(path.into());
        self
    }

    pub fn config(mut self, config: ResolvedConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn path_engine(mut self, engine: impl PathEngine + 'static) -> Self {
        self.path_engine = Some(Box::new(engine));
        self
    }

    /// Creates the main file and starts writing the document into it
    pub fn build(self) -> Result<Document<FileBody>, BuildError> {
        let main_file = self.main_file.as_deref().ok_or(BuildError::MissingMainFile)?;
        if self.class.is_none() {
            return Err(BuildError::MissingDocumentClass);
        }
        let file = File::create(main_file)?;
        self.build_with_body(FmtToIo::new(BufWriter::new(file)))
    }

    /// Starts writing the document body into `body`. The main file is still used to place
    /// the preamble and to resolve relative paths.
    pub fn build_with_body<W: BodySink>(self, body: W) -> Result<Document<W>, BuildError> {
        let class = self.class.ok_or(BuildError::MissingDocumentClass)?;
        let main_file = self.main_file.ok_or(BuildError::MissingMainFile)?;
        let folder = document_folder(&main_file).to_owned();
        let preamble_file = folder.join(
            preamble_path(&main_file)?
                .file_name()
                .ok_or_else(|| PathError::NoFileName(main_file.clone()))?,
        );

        let mut document = Document {
            body,
            main_file,
            folder,
            preamble_file,
            class,
            config: self.config.unwrap_or_default(),
            engine: self.path_engine.unwrap_or_else(|| Box::new(CheckedEngine)),
            flags: UsageFlags::empty(),
            stack: Vec::new(),
            serial: 0,
            colors: Vec::new(),
            citations: Vec::new(),
            dependencies: Vec::new(),
        };
        document.write_header()?;
        Ok(document)
    }
}

/// Proof that an element is open. Closing consumes it, so every element closes at most once.
#[derive(Debug)]
#[must_use = "an element has to be closed with Document::close"]
pub struct ElementHandle {
    serial: u64,
    kind: ElementKind,
}

impl ElementHandle {
    pub fn kind(&self) -> ElementKind {
        self.kind
    }
}

#[derive(Debug)]
struct Frame {
    element: Element,
    state: FrameState,
    serial: u64,
    children: usize,
}

/// What a finished document left behind
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub main_file: PathBuf,
    pub preamble_file: PathBuf,
    pub flags: UsageFlags,
    /// everything the main file needs to compile, the preamble first
    pub dependencies: Vec<Dependency>,
    /// whether the toolchain produced a PDF
    pub compiled: bool,
}

/// A LaTeX document being written.
///
/// Elements are opened and closed in stack order; all markup is streamed into the body as it
/// comes. The preamble only gets written by [`Document::finish`], when every flag is final.
pub struct Document<W: BodySink> {
    body: W,
    main_file: PathBuf,
    folder: PathBuf,
    preamble_file: PathBuf,
    class: DocumentClass,
    config: ResolvedConfig,
    engine: Box<dyn PathEngine>,
    flags: UsageFlags,
    stack: Vec<Frame>,
    serial: u64,
    /// distinct, in the order they were met
    colors: Vec<ColorStyle>,
    citations: Vec<String>,
    dependencies: Vec<Dependency>,
}

impl<W: BodySink> std::fmt::Debug for Document<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("main_file", &self.main_file)
            .field("class", &self.class.name)
            .field("flags", &self.flags)
            .field("open", &self.stack.iter().map(|f| f.element.kind()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<W: BodySink> Document<W> {
    fn write_header(&mut self) -> Res {
        let options = self.class.class_options().join(",");
        write!(self.body, "\\documentclass[{options}]{{{}}}", self.class.name)?;
        write_line_terminator(&mut self.body)?;
        let preamble = relative_reference(&self.folder, &self.preamble_file, true)?;
        write!(self.body, "\\input{{{preamble}}}")?;
        write_line_terminator(&mut self.body)?;
        self.body.write_str("\\begin{document}")?;
        write_line_terminator(&mut self.body)?;
        Ok(())
    }

    pub fn class(&self) -> &DocumentClass {
        &self.class
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn main_file(&self) -> &Path {
        &self.main_file
    }

    /// Flags set so far. Only final once the document is finished.
    pub fn flags(&self) -> UsageFlags {
        self.flags
    }

    /// Kinds of the currently open elements, outermost first
    pub fn open_elements(&self) -> impl Iterator<Item = ElementKind> + '_ {
        self.stack.iter().map(|frame| frame.element.kind())
    }

    /// Text mode in effect at the top of the stack, inherited modes resolved
    fn text_mode(&self) -> TextMode {
        self.stack
            .iter()
            .rev()
            .map(|frame| frame.element.kind().text_mode())
            .find(|mode| *mode != TextMode::Inherit)
            .unwrap_or(TextMode::Escaped)
    }

    fn section_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|frame| frame.element.kind() == ElementKind::Section)
            .count()
    }

    fn check_child(&self, child: &Element) -> Res {
        let kind = child.kind();
        let parent = self.stack.last();
        let parent_kind = parent.map(|frame| frame.element.kind());
        if !ElementKind::accepts(parent_kind, self.text_mode(), kind) {
            return Err(GenerationError::InvalidChild {
                parent: parent_kind,
                child: kind,
            });
        }
        let Some(parent) = parent else {
            return Ok(());
        };
        match (parent.element.kind(), kind) {
            (ElementKind::Section, ElementKind::SectionTitle) if parent.children > 0 => {
                Err(GenerationError::InvalidChild {
                    parent: parent_kind,
                    child: kind,
                })
            }
            (ElementKind::Section, other) if parent.children == 0 && other != ElementKind::SectionTitle => {
                Err(GenerationError::UntitledSection)
            }
            (owner, ElementKind::Caption) if parent.state.captioned => {
                Err(GenerationError::SecondCaption(owner))
            }
            _ => Ok(()),
        }
    }

    /// Resolves a graphic against the document folder and registers it.
    /// A graphic that isn't there is still referenced, so the document shows where it belongs.
    fn resolve_graphic(&mut self, path: &Path) -> Result<String, GenerationError> {
        let resolved = self.engine.graphic(&self.folder, path);
        let reference = relative_reference(&self.folder, &resolved.absolute, true)?;
        match resolved.problem {
            Some(problem) => {
                log::warn!("Graphic {} {problem}, the document won't compile", path.display());
            }
            None => {
                let format = resolved
                    .absolute
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(GraphicFormat::from_extension)
                    .unwrap_or(self.config.config.graphic_format);
                self.register(resolved.absolute, FileType::Graphic(format));
            }
        }
        Ok(reference)
    }

    fn register(&mut self, path: PathBuf, kind: FileType) {
        if !self.dependencies.iter().any(|dep| dep.path == path) {
            self.dependencies.push(Dependency { path, kind });
        }
    }

    /// Opens `element` inside the innermost open one, writing its opening markup
    pub fn open(&mut self, element: Element) -> Result<ElementHandle, GenerationError> {
        self.check_child(&element)?;

        let mut state = FrameState {
            page_wide: spans_page(&element, &self.class),
            ..Default::default()
        };
        match &element {
            Element::Section { .. } => {
                state.section = Some(self.class.section_markup(self.section_depth()));
            }
            Element::Figure { graphic, .. } | Element::SubFigure { graphic, .. } => {
                state.graphic = Some(self.resolve_graphic(graphic)?);
            }
            Element::Styled(TextStyle::Color(color)) => {
                if !self.colors.contains(color) {
                    self.colors.push(*color);
                }
            }
            Element::Citation { keys } => {
                for key in keys {
                    let key = sanitize_citation_key(key);
                    if !key.is_empty() && !self.citations.iter().any(|known| *known == key) {
                        self.citations.push(key.into_owned());
                    }
                }
            }
            _ => {}
        }
        self.flags.set_all(element.features());

        let mut scope = Scope {
            own: &mut state,
            parent: self
                .stack
                .last_mut()
                .map(|frame| (&frame.element, &mut frame.state)),
        };
        element.write_open(&mut self.body, &mut scope)?;

        if let Some(parent) = self.stack.last_mut() {
            parent.children += 1;
        }
        self.serial += 1;
        let handle = ElementHandle {
            serial: self.serial,
            kind: element.kind(),
        };
        log::trace!("Opened {} at depth {}", handle.kind, self.stack.len());
        self.stack.push(Frame {
            element,
            state,
            serial: handle.serial,
            children: 0,
        });
        Ok(handle)
    }

    /// Closes the innermost open element, which has to be the one `handle` was given for
    pub fn close(&mut self, handle: ElementHandle) -> Res {
        let Some(mut frame) = self.stack.pop() else {
            return Err(GenerationError::NothingOpen {
                requested: handle.kind,
            });
        };
        if frame.serial != handle.serial {
            let open = frame.element.kind();
            self.stack.push(frame);
            return Err(GenerationError::UnbalancedClose {
                open,
                requested: handle.kind,
            });
        }
        if frame.element.kind() == ElementKind::Section && frame.children == 0 {
            self.stack.push(frame);
            return Err(GenerationError::UntitledSection);
        }

        let mut scope = Scope {
            own: &mut frame.state,
            parent: self
                .stack
                .last_mut()
                .map(|parent| (&parent.element, &mut parent.state)),
        };
        frame.element.write_close(&mut self.body, &mut scope)?;
        log::trace!("Closed {}", handle.kind);
        Ok(())
    }

    /// Opens `element`, lets `content` fill it, and closes it
    pub fn with<F>(&mut self, element: Element, content: F) -> Res
    where
        F: FnOnce(&mut Self) -> Res,
    {
        let handle = self.open(element)?;
        content(self)?;
        self.close(handle)
    }

    /// Opens and immediately closes `element`, for elements that need no content
    pub fn leaf(&mut self, element: Element) -> Res {
        let handle = self.open(element)?;
        self.close(handle)
    }

    fn top_kind(&self) -> Option<ElementKind> {
        self.stack.last().map(|frame| frame.element.kind())
    }

    /// Appends text to the innermost open element, the way that element treats text
    pub fn text(&mut self, text: &str) -> Res {
        if let Some(frame) = self.stack.last() {
            if frame.element.kind() == ElementKind::Section && frame.children == 0 {
                return Err(GenerationError::UntitledSection);
            }
        }
        match self.text_mode() {
            TextMode::Escaped => write_escaped(&mut self.body, text, false)?,
            TextMode::SingleParagraph => write_escaped(&mut self.body, text, true)?,
            TextMode::Raw => self.body.write_str(text)?,
            TextMode::Buffered => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.state.buffer.push_str(text);
                }
            }
            TextMode::Forbidden | TextMode::Inherit => {
                return Err(self.text_not_allowed());
            }
        }
        Ok(())
    }

    fn text_not_allowed(&self) -> GenerationError {
        // the document itself always takes text, so something is open here
        GenerationError::TextNotAllowed(self.top_kind().unwrap_or(ElementKind::Section))
    }

    /// A paragraph break; a single space where only one paragraph fits
    pub fn line_break(&mut self) -> Res {
        match self.text_mode() {
            TextMode::Escaped => {
                self.body.write_str(LINE_BREAK)?;
                self.body.write_str(LINE_BREAK)?;
            }
            TextMode::SingleParagraph => self.body.write_char(' ')?,
            TextMode::Raw => self.body.write_str(LINE_BREAK)?,
            TextMode::Buffered => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.state.buffer.push('\n');
                }
            }
            TextMode::Forbidden | TextMode::Inherit => return Err(self.text_not_allowed()),
        }
        Ok(())
    }

    /// Refers to a label written somewhere in this document
    pub fn reference(&mut self, label: &Label, mode: ReferenceMode) -> Res {
        match self.text_mode() {
            TextMode::Escaped | TextMode::SingleParagraph | TextMode::Raw => {
                write_reference(label, mode, &mut self.body)?;
                Ok(())
            }
            _ => Err(self.text_not_allowed()),
        }
    }

    /// A comment line in the emitted markup. Ends the current line.
    pub fn comment(&mut self, text: &str) -> Res {
        match self.text_mode() {
            TextMode::Buffered => Err(self.text_not_allowed()),
            _ => {
                write_comment_line(text, &mut self.body)?;
                Ok(())
            }
        }
    }

    /// A math symbol. Only valid in math mode.
    pub fn symbol(&mut self, symbol: MathSymbol) -> Res {
        if self.text_mode() != TextMode::Raw {
            return Err(GenerationError::NotInMath);
        }
        if symbol.needs_ams() {
            self.flags.set(Feature::AmsSymbols);
        }
        self.body.write_str(symbol.command())?;
        // so a following letter doesn't become part of the command name
        self.body.write_char(' ')?;
        Ok(())
    }

    fn write_bibliography(&mut self) -> Res {
        if self.citations.is_empty() {
            return Ok(());
        }
        let Some(database) = self.config.config.bibliography.clone() else {
            log::warn!(
                "{} citations, but no bibliography database is configured",
                self.citations.len()
            );
            return Ok(());
        };
        let database = self.folder.join(database);
        let reference = relative_reference(&self.folder, &database, true)?;
        write!(
            self.body,
            "\\bibliographystyle{{{}}}",
            self.config.config.bibliography_style
        )?;
        write_line_terminator(&mut self.body)?;
        write!(self.body, "\\bibliography{{{reference}}}")?;
        write_line_terminator(&mut self.body)?;
        self.register(database, FileType::Bibliography);
        Ok(())
    }

    /// Ends the body, writes the preamble, and compiles if that was asked for.
    ///
    /// Compilation problems are logged, never returned: the document is complete either way.
    pub fn finish(self) -> Result<DocumentReport, GenerationError> {
        self.finish_into().map(|(report, _)| report)
    }

    /// Same as [`Document::finish`], giving the body writer back
    pub fn finish_into(mut self) -> Result<(DocumentReport, W), GenerationError> {
        if !self.stack.is_empty() {
            return Err(GenerationError::UnclosedElements(
                self.open_elements().collect(),
            ));
        }
        self.write_bibliography()?;
        self.body.write_str("\\end{document}")?;
        write_line_terminator(&mut self.body)?;
        self.body.finish()?;

        // body is closed: flags are final from here on
        let mut dependencies = vec![Dependency {
            path: self.preamble_file.clone(),
            kind: FileType::TexInclude,
        }];
        let mut preamble = String::new();
        {
            let mut copier = ResourceCopier::new(&self.folder, &mut dependencies);
            preamble::synthesize(
                &mut preamble,
                PreambleInput {
                    flags: self.flags,
                    colors: &self.colors,
                    class: &self.class,
                    graphic_format: self.config.config.graphic_format,
                },
                &mut copier,
            )?;
            copier.finish();
        }
        std::fs::write(&self.preamble_file, preamble)?;
        log::info!("Wrote {}", self.preamble_file.display());
        for dependency in std::mem::take(&mut self.dependencies) {
            if !dependencies.iter().any(|known| known.path == dependency.path) {
                dependencies.push(dependency);
            }
        }

        let compiled = self.compile(&dependencies);
        let report = DocumentReport {
            main_file: self.main_file,
            preamble_file: self.preamble_file,
            flags: self.flags,
            dependencies,
            compiled,
        };
        Ok((report, self.body))
    }

    fn compile(&self, dependencies: &[Dependency]) -> bool {
        if !self.config.config.compile {
            return false;
        }
        let Some(toolchain) = self.config.toolchain.as_available() else {
            log::debug!("No toolchain, {} stays uncompiled", self.main_file.display());
            return false;
        };
        match toolchain.compile(&self.main_file, dependencies) {
            Ok(true) => {
                log::info!("Compiled {}", self.main_file.display());
                true
            }
            Ok(false) => {
                log::warn!(
                    "Compiling {} produced no PDF",
                    self.main_file.display()
                );
                false
            }
            Err(err) => {
                log::warn!("Could not compile {}: {err}", self.main_file.display());
                false
            }
        }
    }
}

use std::collections::VecDeque;

/// A [`std::fmt::Write`] target the document can flush once the body is complete.
pub trait BodySink: std::fmt::Write {
    /// Flushes whatever is buffered, reporting the first error met while writing
    fn finish(&mut self) -> std::io::Result<()>;
}

impl BodySink for String {
    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Adapts an [`std::io::Write`] to [`std::fmt::Write`], keeping the io errors that
/// [`std::fmt::Error`] can't carry.
#[derive(Debug)]
pub struct FmtToIo<W>(W, VecDeque<std::io::Error>);

impl<W> FmtToIo<W> {
    pub fn new(io: W) -> Self
    where
        W: std::io::Write,
    {
        Self(io, VecDeque::new())
    }

    pub fn get_error(&mut self) -> Option<std::io::Error> {
        self.1.pop_front()
    }

    pub fn get_all_errors(&mut self) -> impl Iterator<Item = std::io::Error> + '_ {
        self.1.drain(..)
    }

    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: std::io::Write> std::fmt::Write for FmtToIo<W> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if let Err(err) = self.0.write_all(s.as_bytes()) {
            self.1.push_back(err);
            return Err(std::fmt::Error);
        }
        Ok(())
    }
}

impl<W: std::io::Write> BodySink for FmtToIo<W> {
    fn finish(&mut self) -> std::io::Result<()> {
        if let Some(err) = self.get_error() {
            // later errors are almost always consequences of the first one
            let dropped = self.get_all_errors().count();
            if dropped > 0 {
                log::debug!("{dropped} more write errors after: {err}");
            }
            return Err(err);
        }
        self.0.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use super::*;

    struct Broken;

    impl std::io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk is gone"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn passes_text_through() {
        // arrange
        let mut sink = FmtToIo::new(Vec::new());

        // act
        write!(sink, "\\section{{{}}}", "A").unwrap();
        sink.finish().unwrap();

        // assert
        assert_eq!(sink.into_inner(), b"\\section{A}");
    }

    #[test]
    fn keeps_io_errors() {
        // arrange
        let mut sink = FmtToIo::new(Broken);

        // act
        let written = sink.write_str("text");
        let _ = sink.write_str("more");
        let finished = sink.finish();

        // assert
        assert!(written.is_err());
        let err = finished.expect_err("the io error must come back");
        assert_eq!(err.to_string(), "disk is gone");
        assert!(sink.get_error().is_none());
    }
}

use std::{
    borrow::Cow,
    fmt::{self, Write},
};

use once_cell::sync::Lazy;
use regex::Regex;

use super::GenerationError;

/// Replacement for a character that means something to LaTeX, if it does
fn special(c: char) -> Option<&'static str> {
    Some(match c {
        '\\' => "\\textbackslash{}",
        '{' => "\\{",
        '}' => "\\}",
        '$' => "\\$",
        '&' => "\\&",
        '%' => "\\%",
        '#' => "\\#",
        '_' => "\\_",
        '~' => "\\textasciitilde{}",
        '^' => "\\textasciicircum{}",
        '<' => "\\textless{}",
        '>' => "\\textgreater{}",
        '|' => "\\textbar{}",
        _ => return None,
    })
}

/// Writes plain text so that it typesets as itself.
///
/// With `fold_lines`, every line break becomes a single space; captions and titles can't
/// hold more than one paragraph.
pub fn write_escaped<W: Write + ?Sized>(output: &mut W, text: &str, fold_lines: bool) -> fmt::Result {
    let mut last = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((ind, c)) = chars.next() {
        let replacement = match c {
            '\r' | '\n' if fold_lines => {
                // "\r\n" is a single break
                if c == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
                    chars.next();
                }
                " "
            }
            c => match special(c) {
                Some(replacement) => replacement,
                None => continue,
            },
        };
        output.write_str(&text[last..ind])?;
        output.write_str(replacement)?;
        last = chars.peek().map_or(text.len(), |(next, _)| *next);
    }
    output.write_str(&text[last..])
}

/// Same as [`write_escaped`], allocating only if something actually changes
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| special(c).is_some()) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    // writing into a String can't fail
    let _ = write_escaped(&mut escaped, text, false);
    Cow::Owned(escaped)
}

/// Characters the markup itself reserves, so they never delimit inline code
const RESERVED_DELIMITERS: [char; 4] = ['[', '%', '{', '}'];

/// Picks the delimiter for an inline code span: the lowest printable ASCII character that is
/// neither a letter, whitespace nor reserved, and does not occur in `code`.
pub fn inline_code_delimiter(code: &str) -> Result<char, GenerationError> {
    (33u8..=126)
        .map(char::from)
        .filter(|c| !c.is_ascii_alphabetic() && !c.is_ascii_whitespace())
        .filter(|c| !RESERVED_DELIMITERS.contains(c))
        .find(|c| !code.contains(*c))
        .ok_or(GenerationError::NoInlineDelimiter)
}

static CITATION_KEY_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9:._/\-]").expect("static pattern"));

/// Strips everything BibTeX can't take in a citation key
pub fn sanitize_citation_key(key: &str) -> Cow<'_, str> {
    CITATION_KEY_JUNK.replace_all(key.trim(), "")
}

/// Escapes the characters that break a URL inside `\href`
pub fn escape_url(url: &str) -> Cow<'_, str> {
    if !url.contains(['%', '#', '\\']) {
        return Cow::Borrowed(url);
    }
    let mut escaped = String::with_capacity(url.len() + 8);
    for c in url.chars() {
        if matches!(c, '%' | '#' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! escaped {
        {$name:ident, $input:expr, $fold:expr, $expected:expr} => {
            #[test]
            fn $name() {
                // arrange
                let mut output = String::new();

                // act
                write_escaped(&mut output, $input, $fold).expect("Should be able to write");

                // assert
                assert_eq!(output, $expected);
            }
        };
    }

    escaped! {plain, "nothing special here", false, "nothing special here"}
    escaped! {specials, "50% of $x & y_1 #2", false, r"50\% of \$x \& y\_1 \#2"}
    escaped! {braces, "{a}", false, r"\{a\}"}
    escaped! {backslash, r"C:\tmp", false, r"C:\textbackslash{}tmp"}
    escaped! {tilde_caret, "~^", false, r"\textasciitilde{}\textasciicircum{}"}
    escaped! {unicode, "Моя сторінка ≥ 2", false, "Моя сторінка ≥ 2"}
    escaped! {keeps_breaks, "a\nb", false, "a\nb"}
    escaped! {folds_breaks, "a\nb\r\nc", true, "a b c"}
    escaped! {folds_and_escapes, "1%\n2", true, r"1\% 2"}

    #[test]
    fn escape_borrows_when_clean() {
        assert!(matches!(escape("clean text"), Cow::Borrowed(_)));
        assert_eq!(escape("a_b"), r"a\_b");
    }

    #[test]
    fn delimiter_is_lowest_free() {
        // '!' is the lowest candidate
        assert_eq!(inline_code_delimiter("let x = 1;").unwrap(), '!');
        assert_eq!(inline_code_delimiter("x != y").unwrap(), '"');
    }

    #[test]
    fn delimiter_never_reserved_or_contained() {
        // arrange
        let candidates: String = (33u8..=126)
            .map(char::from)
            .filter(|c| !c.is_ascii_alphabetic())
            .collect();

        // act / assert
        for cut in 0..candidates.len() {
            let code = &candidates[..cut];
            if let Ok(delimiter) = inline_code_delimiter(code) {
                assert!(!code.contains(delimiter), "{delimiter} occurs in {code}");
                assert!(!RESERVED_DELIMITERS.contains(&delimiter));
                assert!(!delimiter.is_ascii_alphabetic());
            }
        }
        assert!(matches!(
            inline_code_delimiter(&candidates),
            Err(GenerationError::NoInlineDelimiter)
        ));
    }

    #[test]
    fn delimiter_falls_back_to_digits() {
        let code = "!\"#$&'()*+,-./";
        assert_eq!(inline_code_delimiter(code).unwrap(), '0');
    }

    #[test]
    fn delimiter_exhausted() {
        // arrange
        let code: String = (33u8..=126).map(char::from).collect();

        // act
        let result = inline_code_delimiter(&code);

        // assert
        assert!(matches!(result, Err(GenerationError::NoInlineDelimiter)));
    }

    #[test]
    fn citation_keys() {
        assert_eq!(sanitize_citation_key(" WGT2015:tsp "), "WGT2015:tsp");
        assert_eq!(sanitize_citation_key("a b{c}%"), "abc");
    }

    #[test]
    fn urls() {
        assert_eq!(escape_url("https://a.org/x"), "https://a.org/x");
        assert_eq!(escape_url("https://a.org/x#y%20"), r"https://a.org/x\#y\%20");
    }
}

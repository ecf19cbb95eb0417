//! The preamble, written once the body is complete and every flag is final.

use std::fmt::Write;

use crate::{
    class::DocumentClass,
    config::GraphicFormat,
    data::ColorStyle,
    flags::{Feature, UsageFlags},
    resources::{self, ResourceCopier},
};

use super::{primitives::write_line_terminator, Res};

/// Everything the preamble is derived from
#[derive(Debug, Clone, Copy)]
pub struct PreambleInput<'a> {
    pub flags: UsageFlags,
    /// distinct colors, in the order they were met
    pub colors: &'a [ColorStyle],
    pub class: &'a DocumentClass,
    pub graphic_format: GraphicFormat,
}

fn write_package<W: Write + ?Sized>(output: &mut W, options: Option<&str>, name: &str) -> Res {
    match options {
        Some(options) => write!(output, "\\usepackage[{options}]{{{name}}}")?,
        None => write!(output, "\\usepackage{{{name}}}")?,
    }
    write_line_terminator(output)?;
    Ok(())
}

/// Copies bundled packages and requires the ones that made it into the folder
fn require_bundled<W: Write + ?Sized>(
    output: &mut W,
    copier: &mut ResourceCopier<'_>,
    names: &[&str],
    options: Option<&str>,
) -> Res {
    for name in copier.copy(names) {
        write_package(output, options, resources::package_name(name))?;
    }
    Ok(())
}

/// Writes the whole preamble, ending with `\endinput`.
///
/// Packages come in a fixed order, each only if some element asked for it. Bundled style
/// packages are copied next to the document through `copier`, which also registers them as
/// dependencies; a package that can't be copied is left out with a warning.
pub fn synthesize<W: Write + ?Sized>(
    output: &mut W,
    input: PreambleInput<'_>,
    copier: &mut ResourceCopier<'_>,
) -> Res {
    let flags = input.flags;
    let has = |feature| flags.is_set(feature);

    resources::write_snippet(resources::FONT_SETUP, output)?;
    for package in &input.class.fonts.packages {
        write_package(output, None, package)?;
    }

    if has(Feature::Table) || has(Feature::Colors) || has(Feature::Code) {
        resources::write_snippet(resources::COLOR_SETUP, output)?;
    }

    if has(Feature::Figure) || has(Feature::Table) {
        write_package(output, Some("font=small"), "caption")?;
    }

    if has(Feature::Table) {
        resources::write_snippet(resources::TABLE_SETUP, output)?;
        if has(Feature::MultiColCell) {
            write_package(output, None, "hhline")?;
        }
        if has(Feature::MultiRowCell) {
            write_package(output, None, "multirow")?;
        }
    }

    if has(Feature::Figure) {
        write_package(output, None, "graphicx")?;
    }

    if has(Feature::AmsSymbols) {
        write_package(output, None, "amssymb")?;
    }

    if has(Feature::FigureSeries) {
        require_bundled(output, copier, &[resources::FIGURE_SERIES], None)?;
    }

    if has(Feature::Code) {
        resources::write_snippet(resources::LISTING_SETUP, output)?;
    }

    if has(Feature::TextSubOrSuperScript) {
        write_package(output, None, "fixltx2e")?;
    }

    if has(Feature::Underlined) {
        require_bundled(output, copier, &[resources::TEXT_UNDERLINE], Some("breakable"))?;
    }

    write_package(output, Some("hidelinks"), "hyperref")?;
    if input.graphic_format.needs_url_breaking() {
        write_package(output, None, "breakurl")?;
    }

    require_bundled(
        output,
        copier,
        &[resources::ORDINAL_COUNTER, resources::ALPHA_COUNTER],
        None,
    )?;

    if has(Feature::Colors) {
        let mut defined: Vec<&ColorStyle> = Vec::with_capacity(input.colors.len());
        for color in input.colors {
            if defined.contains(&color) {
                continue;
            }
            defined.push(color);
            write!(
                output,
                "\\definecolor{{{}}}{{HTML}}{{{}}}",
                color.markup_name(),
                color.hex()
            )?;
            write_line_terminator(output)?;
        }
    }

    // last, so the class can override anything above
    for line in &input.class.setup {
        output.write_str(line)?;
        write_line_terminator(output)?;
    }

    output.write_str("\\endinput")?;
    write_line_terminator(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const CONDITIONAL: [&str; 13] = [
        "xcolor",
        "caption",
        "array",
        "hhline",
        "multirow",
        "graphicx",
        "amssymb",
        "figureSeries",
        "listings",
        "fixltx2e",
        "textUnderline",
        "breakurl",
        "definecolor",
    ];

    fn preamble(flags: UsageFlags, colors: &[ColorStyle], folder: &Path) -> String {
        let class = DocumentClass::article();
        let mut dependencies = Vec::new();
        let mut copier = ResourceCopier::new(folder, &mut dependencies);
        let mut output = String::new();
        synthesize(
            &mut output,
            PreambleInput {
                flags,
                colors,
                class: &class,
                graphic_format: GraphicFormat::Pdf,
            },
            &mut copier,
        )
        .expect("Should be able to write the preamble");
        output
    }

    #[test]
    fn minimal() {
        // arrange
        let folder = tempfile::tempdir().unwrap();

        // act
        let output = preamble(UsageFlags::empty(), &[], folder.path());

        // assert
        for package in CONDITIONAL {
            assert!(!output.contains(package), "{package} in a plain preamble:\n{output}");
        }
        assert!(output.contains("fontenc"));
        assert!(output.contains("\\usepackage[hidelinks]{hyperref}"));
        assert!(output.contains("\\usepackage{ordinalCounter}"));
        assert!(output.contains("\\usepackage{alphaCounter}"));
        assert!(output.trim_end().ends_with("\\endinput%"));
    }

    #[test]
    fn multi_column_table() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let flags = UsageFlags::empty().with(Feature::MultiColCell);

        // act
        let output = preamble(flags, &[], folder.path());

        // assert
        assert!(output.contains("\\usepackage[table]{xcolor}"));
        assert!(output.contains("{caption}"));
        assert!(output.contains("\\usepackage{array}"));
        assert!(output.contains("\\usepackage{hhline}"));
        assert!(!output.contains("multirow"));
        assert!(!output.contains("graphicx"));
        assert!(!output.contains("amssymb"));
    }

    #[test]
    fn fixed_order() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let flags: UsageFlags = Feature::ALL.into_iter().collect();
        let colors = [ColorStyle::rgb(0x12, 0x34, 0x56)];

        // act
        let output = preamble(flags, &colors, folder.path());

        // assert
        let positions: Vec<usize> = [
            "fontenc",
            "xcolor",
            "caption",
            "array",
            "hhline",
            "multirow",
            "graphicx",
            "amssymb",
            "{figureSeries}",
            "listings",
            "fixltx2e",
            "{textUnderline}",
            "hyperref",
            "{ordinalCounter}",
            "{alphaCounter}",
            "\\definecolor",
            "\\endinput",
        ]
        .iter()
        .map(|needle| {
            output
                .find(needle)
                .unwrap_or_else(|| panic!("{needle} missing from:\n{output}"))
        })
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{output}");
        assert!(output.contains("\\usepackage[breakable]{textUnderline}"));
    }

    #[test]
    fn colors_defined_once() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let red = ColorStyle::rgb(255, 0, 0);
        let blue = ColorStyle::rgb(0, 0, 10);

        // act
        let output = preamble(
            UsageFlags::empty().with(Feature::Colors),
            &[red, blue, red],
            folder.path(),
        );

        // assert
        assert_eq!(output.matches("\\definecolor{tdColorFF0000}{HTML}{FF0000}").count(), 1);
        assert!(output.contains("\\definecolor{tdColor00000A}{HTML}{00000A}"));
    }

    #[test]
    fn eps_breaks_urls() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let class = DocumentClass::ieeetran();
        let mut dependencies = Vec::new();
        let mut output = String::new();

        // act
        synthesize(
            &mut output,
            PreambleInput {
                flags: UsageFlags::empty(),
                colors: &[],
                class: &class,
                graphic_format: GraphicFormat::Eps,
            },
            &mut ResourceCopier::new(folder.path(), &mut dependencies),
        )
        .unwrap();

        // assert
        let breakurl = output.find("{breakurl}").expect("breakurl should be there");
        let setup = output.find("\\IEEEoverridecommandlockouts").expect("class setup");
        assert!(breakurl > output.find("hyperref").unwrap());
        assert!(setup < output.find("\\endinput").unwrap());
        assert_eq!(dependencies.len(), 2);
    }

    #[test]
    fn missing_folder_leaves_bundled_out() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let missing = folder.path().join("gone");

        // act
        let output = preamble(UsageFlags::empty().with(Feature::FigureSeries), &[], &missing);

        // assert
        assert!(!output.contains("{figureSeries}"));
        assert!(output.contains("graphicx"));
        assert!(output.contains("\\endinput"));
    }
}

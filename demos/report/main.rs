use std::error::Error;

use texdoc::{
    path_engine::PrimitiveEngine, Alignment, CellSpan, ColorStyle, Config,
    DocumentBuilder, DocumentClass, Element, FloatSize, GraphicFormat, Label, MathSymbol,
    ReferenceMode, TextStyle,
};

fn main() -> Result<(), Box<dyn Error>> {
    //! Writes a two-column paper using most of the element kinds there are
    //!
    //! Graphics are referenced, but not provided; `pdflatex` will complain about them.
    let main_file = demos_util::setup_io("demos/report/output", "report.tex")?;
    std::fs::write(
        main_file.with_file_name("refs.bib"),
        "@book{ABCC2006:TSP,\n  author = {Applegate, David L. and Bixby, Robert E. and Chv{\\'a}tal, Va{\\v{s}}ek and Cook, William J.},\n  title = {The Traveling Salesman Problem: A Computational Study},\n  publisher = {Princeton University Press},\n  year = {2006}\n}\n",
    )?;
    let config = Config {
        graphic_format: GraphicFormat::Pdf,
        bibliography: Some("refs.bib".into()),
        ..Default::default()
    };
    let mut document = DocumentBuilder::new()
        .class(DocumentClass::ieeetran())
        .main_file(main_file)
        .config(config.resolve())
        // graphics are not there, and that's fine for a demo
        .path_engine(PrimitiveEngine)
        .build()?;

    let setup = Label::new("sec:setup");
    let progress = Label::new("fig:progress");

    let intro = document.open(Element::Section { label: None })?;
    document.with(Element::SectionTitle, |d| d.text("Introduction"))?;
    document.text("The Traveling Salesperson Problem ")?;
    document.leaf(Element::Citation {
        keys: vec!["ABCC2006:TSP".to_owned()],
    })?;
    document.text(" asks for the shortest round trip through ")?;
    document.with(Element::InlineMath, |d| d.text("n"))?;
    document.text(" cities. We compare two algorithms, set up as in Section ")?;
    document.reference(&setup, ReferenceMode::Number)?;
    document.text(", and ")?;
    document.with(Element::Styled(TextStyle::Color(ColorStyle::rgb(0xB0, 0x1C, 0x2E))), |d| {
        d.text("highlight")
    })?;
    document.text(" the ")?;
    document.with(Element::Styled(TextStyle::Underlined), |d| d.text("better one"))?;
    document.text(".")?;
    document.close(intro)?;

    let setup_section = document.open(Element::Section {
        label: Some(setup.clone()),
    })?;
    document.with(Element::SectionTitle, |d| d.text("Setup"))?;
    document.with(Element::Equation { label: Some(Label::new("eq:gap")) }, |d| {
        d.text(r"\mathit{gap} = \frac{f - f^*}{f^*} ")?;
        d.symbol(MathSymbol::GreaterOrEqual)?;
        d.text("0,\\quad f^* ")?;
        d.symbol(MathSymbol::Integers)
    })?;
    document.with(
        Element::Code {
            language: Some("Python".to_owned()),
            label: Some(Label::new("lst:swap")),
        },
        |d| {
            d.with(Element::Caption, |d| d.text("The swap move"))?;
            d.with(Element::CodeBody, |d| {
                d.text("def swap(tour, i, j):\n    tour[i], tour[j] = tour[j], tour[i]\n")
            })
        },
    )?;
    document.text("The move is applied with ")?;
    document.with(Element::InlineCode, |d| d.text("swap(tour, i, j)"))?;
    document.text(", the population size is ")?;
    document.with(Element::InlineMath, |d| d.text("\\mu = 16"))?;
    document.text(", and every run gets 2 x 10")?;
    document.with(Element::SuperScript, |d| d.text("4"))?;
    document.text(" objective function evaluations.")?;
    document.close(setup_section)?;

    let results = document.open(Element::Section { label: None })?;
    document.with(Element::SectionTitle, |d| d.text("Results"))?;
    document.with(
        Element::Table {
            size: FloatSize::AllColumns,
            columns: vec![Alignment::Left, Alignment::Right, Alignment::Right],
            label: Some(Label::new("tab:gaps")),
        },
        |d| {
            d.with(Element::Caption, |d| d.text("Median gaps after\n20000 FEs"))?;
            d.with(Element::TableRow { header: true }, |d| {
                d.with(Element::TableCell { span: CellSpan::new(2, 1), alignment: None }, |d| {
                    d.text("algorithm")
                })?;
                d.with(
                    Element::TableCell {
                        span: CellSpan::new(1, 2),
                        alignment: Some(Alignment::Center),
                    },
                    |d| d.text("instance"),
                )
            })?;
            for row in [["", "eil51", "berlin52"], ["ea", "1.5%", "2.1%"], ["rls", "9.9%", "7.5%"]] {
                d.with(Element::TableRow { header: false }, |d| {
                    for cell in row {
                        d.with(Element::TableCell { span: CellSpan::default(), alignment: None }, |d| {
                            d.text(cell)
                        })?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        },
    )?;
    document.with(
        Element::FigureSeries {
            size: FloatSize::AllColumns,
            per_row: 2,
            label: Some(progress.clone()),
        },
        |d| {
            for (instance, label) in [("eil51", "fig:progress:eil51"), ("berlin52", "fig:progress:berlin52")] {
                d.with(
                    Element::SubFigure {
                        graphic: format!("graphics/{instance}.pdf").into(),
                        label: Some(Label::new(label)),
                    },
                    |d| d.with(Element::Caption, |d| d.text(instance)),
                )?;
            }
            d.with(Element::Caption, |d| d.text("Progress over time"))
        },
    )?;
    document.text("Figure ")?;
    document.reference(&progress, ReferenceMode::Number)?;
    document.text(" shows how both algorithms progress. Notes:")?;
    document.with(Element::Itemization, |d| {
        for note in ["the EA wins on both instances", "both stay within 10% of the optimum"] {
            d.with(Element::Item, |d| d.text(note))?;
        }
        Ok(())
    })?;
    document.comment("generated by the report demo")?;
    document.close(results)?;

    let report = document.finish()?;
    println!("{report:#?}");
    Ok(())
}

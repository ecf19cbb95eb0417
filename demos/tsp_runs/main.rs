use std::error::Error;

use texdoc::{
    experiment::{DimensionKind, Direction, ExperimentLoader, Number, NumberParser},
    Alignment, Config, DocumentBuilder, DocumentClass, Element, FloatSize, Label, ReferenceMode,
};

fn main() -> Result<(), Box<dyn Error>> {
    //! Loads a few TSP runs and writes a short report on them
    //!
    //! Set `TEXDOC_COMPILE` to also run `pdflatex` on the result.
    let main_file = demos_util::setup_io("demos/tsp_runs/output", "tsp_runs.tex")?;

    let set = ExperimentLoader::new("demos/tsp_runs/results")
        .dimensions(|builder| {
            let mut fes = builder.create_dimension();
            fes.name("FEs")
                .description("consumed objective function evaluations")
                .direction(Direction::Increasing)
                .kind(DimensionKind::IterationCount)
                .parser(NumberParser::POSITIVE_INTEGER);
            fes.close()?;
            let mut length = builder.create_dimension();
            length
                .name("f")
                .description("tour length")
                .direction(Direction::Decreasing)
                .kind(DimensionKind::Quality)
                .parser(NumberParser::NON_NEGATIVE_INTEGER);
            length.close()
        })
        .instances(|builder| {
            for (name, cities, optimum) in [("eil51", 51, 426.0), ("berlin52", 52, 7542.0)] {
                let mut instance = builder.create_instance();
                instance
                    .name(name)
                    .feature("n", cities, Some("number of cities"))
                    .feature("symmetric", true, None)
                    .lower_bound(optimum)
                    .upper_bound(optimum);
                instance.close()?;
            }
            Ok(())
        })
        .load()?;

    let config = Config {
        compile: std::env::var_os("TEXDOC_COMPILE").is_some(),
        ..Default::default()
    };
    let mut document = DocumentBuilder::new()
        .class(DocumentClass::article())
        .main_file(main_file)
        .config(config.resolve())
        .build()?;

    let results = Label::new("tab:results");
    let section = document.open(Element::Section { label: None })?;
    document.with(Element::SectionTitle, |d| d.text("Final tour lengths"))?;
    document.text("Best tour length of every run, relative to the optimum, is shown in Table ")?;
    document.reference(&results, ReferenceMode::Number)?;
    document.text(".")?;

    document.with(
        Element::Table {
            size: FloatSize::Column,
            columns: vec![Alignment::Left, Alignment::Left, Alignment::Right, Alignment::Right],
            label: Some(results.clone()),
        },
        |d| {
            d.with(Element::Caption, |d| d.text("Best tour lengths per run"))?;
            d.with(Element::TableRow { header: true }, |d| {
                for title in ["algorithm", "instance", "best", "gap"] {
                    d.with(Element::TableCell { span: Default::default(), alignment: None }, |d| {
                        d.text(title)
                    })?;
                }
                Ok(())
            })?;
            for experiment in &set.experiments {
                for run in &experiment.runs {
                    let best = run
                        .points
                        .iter()
                        .filter_map(|point| point.get(1).copied().map(Number::as_f64))
                        .fold(f64::INFINITY, f64::min);
                    let optimum = set
                        .instance(&run.instance)
                        .and_then(|instance| instance.lower_bound)
                        .unwrap_or(best);
                    let best_text = best.to_string();
                    let gap = format!("{:.1}%", 100.0 * (best - optimum) / optimum);
                    d.with(Element::TableRow { header: false }, |d| {
                        let cells = [
                            experiment.name.as_str(),
                            run.instance.as_str(),
                            best_text.as_str(),
                            gap.as_str(),
                        ];
                        for cell in cells {
                            d.with(Element::TableCell { span: Default::default(), alignment: None }, |d| {
                                d.text(cell)
                            })?;
                        }
                        Ok(())
                    })?;
                }
            }
            Ok(())
        },
    )?;
    document.close(section)?;

    let report = document.finish()?;
    println!("{report:#?}");
    Ok(())
}

use std::{fs, path::Path};

use texdoc::experiment::{
    DimensionKind, Direction, ExperimentLoader, LoadFailure, Number, NumberParser,
};

fn tsp_loader(root: impl AsRef<Path>) -> ExperimentLoader {
    ExperimentLoader::new(root.as_ref())
        .dimensions(|builder| {
            let mut fes = builder.create_dimension();
            fes.name("FEs")
                .direction(Direction::Increasing)
                .kind(DimensionKind::IterationCount)
                .parser(NumberParser::POSITIVE_INTEGER);
            fes.close()?;
            let mut length = builder.create_dimension();
            length
                .name("f")
                .direction(Direction::Decreasing)
                .kind(DimensionKind::Quality)
                .parser(NumberParser::NON_NEGATIVE_INTEGER);
            length.close()
        })
        .instances(|builder| {
            for (name, optimum) in [("eil51", 426.0), ("berlin52", 7542.0)] {
                let mut instance = builder.create_instance();
                instance.name(name).lower_bound(optimum);
                instance.close()?;
            }
            Ok(())
        })
}

#[test]
fn loads_demo_results() {
    // act
    let set = tsp_loader("demos/tsp_runs/results").load().unwrap();

    // assert
    let names: Vec<_> = set.experiments.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["ea", "rls"]);
    assert_eq!(set.experiments[0].runs.len(), 3);
    assert_eq!(set.experiments[1].runs.len(), 2);

    // instance folders are read in name order
    let ea = &set.experiments[0];
    assert_eq!(ea.runs[0].instance, "berlin52");
    assert_eq!(ea.runs[0].points.len(), 4);
    assert_eq!(
        ea.runs[0].points[3],
        vec![Number::Integer(20000), Number::Integer(7702)]
    );
    assert_eq!(ea.runs[0].parameters.get("mu").map(String::as_str), Some("16"));
    assert_eq!(set.instance("eil51").and_then(|i| i.lower_bound), Some(426.0));
}

#[test]
fn broken_run_is_reported_with_its_path() {
    // arrange
    let root = tempfile::tempdir().unwrap();
    let folder = root.path().join("ea/eil51");
    fs::create_dir_all(&folder).unwrap();
    fs::write(
        folder.join("run1.txt"),
        "SECTION_LOG_DATA\n1 1240\n0 980\nSECTION_END\n",
    )
    .unwrap();

    // act
    let err = tsp_loader(root.path()).load().unwrap_err();

    // assert
    match err.failures.as_slice() {
        [LoadFailure::Scan { path, .. }] => assert_eq!(path, &folder.join("run1.txt")),
        other => panic!("unexpected failures: {other:?}"),
    }
}

#[test]
fn unterminated_section() {
    // arrange
    let root = tempfile::tempdir().unwrap();
    let folder = root.path().join("rls/berlin52");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("run1.log"), "SECTION_LOG_DATA\n1 28870\n").unwrap();

    // act
    let err = tsp_loader(root.path()).load().unwrap_err();

    // assert
    assert_eq!(err.failures.len(), 1);
    assert!(err.to_string().contains("run1.log"), "{err}");
}

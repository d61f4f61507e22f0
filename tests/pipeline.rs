mod support;

use std::collections::HashSet;
use std::time::Duration;

use hwyla::recognition::{
    ClassifierWorker, RecognitionError, RecognitionSession, SessionError, SessionState,
    StrokeSample, SymbolCatalog, SymbolClassifier, SymbolId, normalize,
};
use support::{ScriptedEngine, assert_close};

fn identity_table(classes: u32) -> Vec<SymbolId> {
    (0..classes).map(SymbolId).collect()
}

fn draw(
    session: &mut RecognitionSession<SymbolClassifier<ScriptedEngine>>,
    samples: &[(f64, f64, f64)],
) -> Result<Option<hwyla::recognition::ClassificationResult>, SessionError> {
    session.begin_stroke()?;
    for &sample in samples {
        session.add_sample(StrokeSample::from(sample))?;
    }
    session.end_stroke()
}

#[test]
fn single_stroke_is_normalized_and_ranked() {
    let engine = ScriptedEngine::ranking(10, &[3, 7, 1]);
    let probe = engine.clone();
    let classifier = SymbolClassifier::new(engine, identity_table(10)).unwrap();
    let mut session = RecognitionSession::new(classifier, 3);

    let result = draw(&mut session, &[(0.0, 0.0, 0.0), (10.0, 10.0, 0.0), (20.0, 10.0, 10.0)])
        .unwrap()
        .expect("drawing was classified");

    assert_eq!(
        result.symbol_ids(),
        vec![SymbolId(3), SymbolId(7), SymbolId(1)]
    );
    let input = probe.last_input();
    let expected = [[0.0, 0.0, 0.0], [0.01, 1.0, 0.0], [0.01, 1.0, 1.0]];
    assert_eq!(input.len(), expected.len());
    for (row, want) in input.iter().zip(expected.iter()) {
        for (actual, expected) in row.iter().zip(want.iter()) {
            assert_close(*actual, *expected);
        }
    }
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn later_strokes_classify_the_whole_drawing() {
    let engine = ScriptedEngine::ranking(5, &[2, 0]);
    let probe = engine.clone();
    let classifier = SymbolClassifier::new(engine, identity_table(5)).unwrap();
    let mut session = RecognitionSession::new(classifier, 2);

    draw(&mut session, &[(0.0, 0.0, 0.0), (10.0, 4.0, 0.0)]).unwrap();
    draw(&mut session, &[(50.0, 0.0, 4.0), (60.0, 4.0, 4.0)]).unwrap();

    assert_eq!(probe.invocations(), 2);
    let input = probe.last_input();
    assert_eq!(input.len(), 4);
    // Time gap between strokes is kept.
    assert_close(input[2][0], 0.04);
    assert_close(input[3][1], 1.0);
    assert_close(input[3][2], 1.0);
    assert_eq!(session.drawing().strokes().len(), 2);
}

#[test]
fn reset_discards_the_drawing_without_classifying() {
    let engine = ScriptedEngine::ranking(4, &[1]);
    let probe = engine.clone();
    let classifier = SymbolClassifier::new(engine, identity_table(4)).unwrap();
    let mut session = RecognitionSession::new(classifier, 1);

    session.begin_stroke().unwrap();
    session
        .add_sample(StrokeSample::new(0.0, 1.0, 1.0))
        .unwrap();
    session.reset();

    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.drawing().is_empty());
    assert_eq!(session.end_stroke().unwrap(), None);
    assert_eq!(probe.invocations(), 0);
}

#[test]
fn results_are_k_distinct_symbols_in_score_order() {
    let scores = vec![0.05, 0.4, 0.1, 0.9, 0.3, 0.2, 0.6, 0.8, 0.0, 0.7];
    let classifier = SymbolClassifier::new(ScriptedEngine::new(scores.clone()), identity_table(10))
        .unwrap();
    let mut session = RecognitionSession::new(classifier, 5);

    let result = draw(&mut session, &[(0.0, 0.0, 0.0), (5.0, 3.0, 8.0)])
        .unwrap()
        .unwrap();

    let ids = result.symbol_ids();
    assert_eq!(ids.len(), 5);
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 5);
    let ranked_scores: Vec<f32> = ids.iter().map(|id| scores[id.0 as usize]).collect();
    assert!(ranked_scores.windows(2).all(|pair| pair[0] >= pair[1]));
    for (rank, ranked) in result.ranked().iter().enumerate() {
        assert_eq!(ranked.rank, rank);
    }
}

#[test]
fn embedded_catalog_drives_the_class_table() {
    let catalog = SymbolCatalog::embedded().unwrap();
    let classes = catalog.len();
    let engine = ScriptedEngine::ranking(classes, &[classes - 1, 0]);
    let classifier = SymbolClassifier::new(engine, catalog.class_table()).unwrap();
    let mut session = RecognitionSession::new(classifier, 2);

    let result = draw(&mut session, &[(0.0, 3.0, 3.0), (16.0, 9.0, 1.0)])
        .unwrap()
        .unwrap();

    let best = catalog.get(result.best().unwrap()).unwrap();
    assert_eq!(best.id, catalog.class_table()[classes - 1]);
    assert!(catalog.get(result.symbol_ids()[1]).is_some());
}

#[test]
fn class_table_must_match_model_output() {
    let err = SymbolClassifier::new(ScriptedEngine::ranking(3, &[0]), identity_table(4))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RecognitionError::InvalidModelOutput {
            expected: 4,
            actual: 3
        }
    ));
}

#[test]
fn worker_serves_a_session_from_its_own_thread() {
    let worker = ClassifierWorker::spawn(
        || SymbolClassifier::new(ScriptedEngine::ranking(6, &[4, 5]), identity_table(6)),
        Duration::from_secs(5),
    )
    .unwrap();
    let mut session = RecognitionSession::new(worker, 2);

    session.begin_stroke().unwrap();
    for sample in [(0.0, 0.0, 0.0), (8.0, 2.0, 2.0), (16.0, 4.0, 0.0)] {
        session.add_sample(sample.into()).unwrap();
    }
    let result = session.end_stroke().unwrap().unwrap();

    assert_eq!(result.symbol_ids(), vec![SymbolId(4), SymbolId(5)]);
}

#[test]
fn normalize_matches_session_input() {
    let samples: Vec<StrokeSample> = [(0.0, 0.0, 0.0), (10.0, 10.0, 0.0), (20.0, 10.0, 10.0)]
        .into_iter()
        .map(StrokeSample::from)
        .collect();
    let points = normalize(&samples).unwrap();
    assert_eq!(points.len(), 3);
    assert_close(points[1].dt, 0.01);
    assert_close(points[2].nx, 1.0);
    assert_close(points[2].ny, 1.0);
}

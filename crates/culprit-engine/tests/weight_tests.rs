use culprit_engine::feature::{log_linearly_scaled, FeatureValue, MetaFeatureValue};
use culprit_engine::utils::error::EngineError;
use culprit_engine::weight::{MetaWeight, Weight, WeightEntry};
use pretty_assertions::assert_eq;

fn model_weights() -> MetaWeight {
    MetaWeight::default()
        .with(
            "TouchCrashedFileMeta",
            MetaWeight::default()
                .with("MinDistance", 2.0)
                .with("TopFrameIndex", 1.0)
                .with("TouchCrashedFile", 0.0),
        )
        .with("TouchCrashedDirectory", 0.5)
        .with("TouchCrashedComponent", 0.000001)
}

fn feature_values() -> MetaFeatureValue {
    MetaFeatureValue::new("WrapperMetaFeature")
        .with_meta(
            MetaFeatureValue::new("TouchCrashedFileMeta")
                .with_value(FeatureValue::new("MinDistance", -0.5))
                .with_value(FeatureValue::new("TopFrameIndex", -0.25))
                .with_value(FeatureValue::zero("TouchCrashedFile")),
        )
        .with_value(FeatureValue::new("TouchCrashedDirectory", -1.0))
        .with_value(FeatureValue::new("Unweighted", -3.0))
}

#[test]
fn test_weight_is_zero() {
    for (w, e) in [(0.0, 0.1), (0.05, 0.1), (-0.05, 0.1), (0.1, 0.1), (-2.0, 1.0), (1e-9, 1e-8)] {
        assert_eq!(Weight(w).is_zero(e), w.abs() < e, "w={} e={}", w, e);
    }
}

#[test]
fn test_weight_norms() {
    assert_eq!(Weight(-3.0).l0(), 1.0);
    assert_eq!(Weight(0.0).l0(), 0.0);
    assert_eq!(Weight(-3.0).l1(), 3.0);
    assert_eq!(Weight(-3.0).quadrance(), 9.0);
    assert_eq!(Weight(2.0) * Weight(0.25), 0.5);
    assert_eq!(Weight(2.0) * -0.25, -0.5);
}

#[test]
fn test_zero_weight_silences_log_zero() {
    assert_eq!(Weight(0.0) * f64::NEG_INFINITY, 0.0);
    assert_eq!(Weight(0.5) * f64::NEG_INFINITY, f64::NEG_INFINITY);
}

#[test]
fn test_dot_ignores_missing_keys() {
    let score = model_weights().dot(&feature_values()).unwrap();
    // 2 * -0.5 + 1 * -0.25 + 0 * -inf + 0.5 * -1.0; component has no value
    assert_eq!(score, -1.75);
}

#[test]
fn test_dot_is_pure() {
    let weights = model_weights();
    let features = feature_values();
    let first = weights.dot(&features).unwrap();
    let second = weights.dot(&features).unwrap();
    assert_eq!(first, second);
    assert_eq!(weights, model_weights());
    assert_eq!(features, feature_values());
}

#[test]
fn test_dot_shape_mismatch() {
    let weights = MetaWeight::default().with("TouchCrashedFileMeta", 1.0);
    let result = weights.dot(&feature_values());
    assert_eq!(
        result,
        Err(EngineError::WeightShapeMismatch {
            key: "TouchCrashedFileMeta".to_string()
        })
    );
}

#[test]
fn test_drop_zero_weights_is_idempotent() {
    let mut once = model_weights();
    once.drop_zero_weights(1e-5);

    let mut twice = once.clone();
    twice.drop_zero_weights(1e-5);

    assert_eq!(once, twice);
    assert!(once.get("TouchCrashedComponent").is_none());
    let Some(WeightEntry::Meta(file_meta)) = once.get("TouchCrashedFileMeta") else {
        panic!("file meta weights dropped");
    };
    assert_eq!(file_meta.len(), 2);
}

#[test]
fn test_drop_zero_weights_removes_empty_subtrees() {
    let mut weights = MetaWeight::default()
        .with("Meta", MetaWeight::default().with("A", 0.0).with("B", 0.0))
        .with("C", 1.0);
    assert!(!weights.is_zero(1e-5));
    weights.drop_zero_weights(1e-5);
    assert_eq!(weights, MetaWeight::default().with("C", 1.0));
}

#[test]
fn test_meta_weight_norms() {
    let weights = model_weights();
    assert_eq!(weights.l0(), 4.0);
    assert!((weights.l1() - 3.500001).abs() < 1e-12);
    assert!((weights.quadrance() - (4.0 + 1.0 + 0.25 + 1e-12)).abs() < 1e-12);
}

#[test]
fn test_meta_weight_from_toml() {
    let weights: MetaWeight = toml::from_str(
        r#"
        TouchCrashedDirectory = 1.0

        [TouchCrashedFileMeta]
        MinDistance = 0.8
        "#,
    )
    .unwrap();

    let expected = MetaWeight::default()
        .with("TouchCrashedDirectory", 1.0)
        .with("TouchCrashedFileMeta", MetaWeight::default().with("MinDistance", 0.8));
    assert_eq!(weights, expected);
}

#[test]
fn test_min_distance_scaling_is_monotonic() {
    let max = 50.0;
    let values: Vec<f64> = (0..=60).map(|d| log_linearly_scaled(f64::from(d), max)).collect();

    assert_eq!(values[0], 0.0);
    for pair in values.windows(2) {
        assert!(pair[1] <= pair[0]);
        assert!(!pair[1].is_nan());
    }
    assert!(values[50..].iter().all(|value| *value == f64::NEG_INFINITY));
}

use super::*;

fn four_instance_dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.add(Instance::labeled("A").with_feature("f1", 1.0));
    dataset.add(Instance::labeled("A").with_feature("f1", 1.0).with_feature("f2", 1.0));
    dataset.add(Instance::labeled("B").with_feature("f2", 1.0));
    dataset.add(Instance::labeled("B").with_feature("f2", 2.0));
    dataset.make_alphabets();
    dataset.make_vectors();
    let labels = dataset.label_alphabet().tokens().to_vec();
    dataset.set_one_hot_distributions(&labels);
    dataset
}

fn trained_model(dataset: &Dataset) -> EmModel {
    let mut model =
        EmModel::new(dataset.label_alphabet().clone(), EmConfig::new()).unwrap();
    model.train(dataset).unwrap();
    model
}

#[test]
fn four_instance_scenario_learns_feature_class_affinity() {
    let dataset = four_instance_dataset();
    let model = trained_model(&dataset);

    let a = dataset.label_alphabet().index("A").unwrap();
    let b = dataset.label_alphabet().index("B").unwrap();
    let f1 = dataset.feature_alphabet().index("f1").unwrap();
    let f2 = dataset.feature_alphabet().index("f2").unwrap();

    assert!(model.theta(a, f1) > model.theta(a, f2));
    assert!(model.theta(b, f2) > model.theta(b, f1));
}

#[test]
fn four_instance_scenario_self_accuracy() {
    let dataset = four_instance_dataset();
    let model = trained_model(&dataset);
    assert!(model.test(&dataset).unwrap() >= 0.75);
}

#[test]
fn theta_rows_positive_and_finite() {
    let dataset = four_instance_dataset();
    let model = trained_model(&dataset);

    for class in 0..model.num_classes() {
        assert!(model.prior(class) > 0.0);
        assert!(model.prior(class).is_finite());
        for word in 0..model.num_words() {
            let theta = model.theta(class, word);
            assert!(theta > 0.0 && theta < 1.0, "theta = {theta}");
            assert!(theta.is_finite());
        }
    }
}

#[test]
fn smoothed_counts_match_hand_computation() {
    // wordCount[A][f1] = 2, [A][f2] = 1, [B][f1] = 0, [B][f2] = 3.
    let dataset = four_instance_dataset();
    let model = trained_model(&dataset);

    let a = dataset.label_alphabet().index("A").unwrap();
    let b = dataset.label_alphabet().index("B").unwrap();
    let f1 = dataset.feature_alphabet().index("f1").unwrap();
    let f2 = dataset.feature_alphabet().index("f2").unwrap();

    assert!((model.theta(a, f1) - 3.0 / 5.0).abs() < 1e-12);
    assert!((model.theta(a, f2) - 2.0 / 5.0).abs() < 1e-12);
    assert!((model.theta(b, f1) - 1.0 / 5.0).abs() < 1e-12);
    assert!((model.theta(b, f2) - 4.0 / 5.0).abs() < 1e-12);
    assert!((model.prior(a) - 0.5).abs() < 1e-12);
    assert!((model.prior(b) - 0.5).abs() < 1e-12);
}

#[test]
fn train_rejects_empty_alphabets() {
    let mut empty = Dataset::new();
    empty.add(Instance::labeled("A").with_feature("f1", 1.0));

    // No alphabets generated: zero classes and zero features.
    let mut model = EmModel::new(Alphabet::new(), EmConfig::new()).unwrap();
    let err = model.train(&empty).unwrap_err();
    assert!(matches!(err, SemisupError::InvalidModelState { .. }));

    // Labels known but no features.
    let mut labels_only = Alphabet::new();
    labels_only.add("A");
    let mut model = EmModel::new(labels_only, EmConfig::new()).unwrap();
    let err = model.train(&empty).unwrap_err();
    assert!(matches!(err, SemisupError::InvalidModelState { .. }));
}

#[test]
fn config_rejects_non_positive_lambda() {
    assert!(EmModel::new(Alphabet::new(), EmConfig::new().with_lambda(0.0)).is_err());
    assert!(EmModel::new(Alphabet::new(), EmConfig::new().with_lambda(-1.0)).is_err());
    assert!(EmModel::new(Alphabet::new(), EmConfig::new().with_lambda(f64::NAN)).is_err());
}

#[test]
fn label_sets_normalized_soft_distributions() {
    let mut dataset = four_instance_dataset();
    let model = trained_model(&dataset.clone());
    model.label(&mut dataset).unwrap();

    for instance in dataset.instances() {
        let total: f64 = instance.class_probabilities().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        for p in instance.class_probabilities().values() {
            assert!((0.0..=1.0 + 1e-12).contains(p));
        }
    }

    // The first instance only contains f1, so A must dominate.
    let first = &dataset.instances()[0];
    assert!(first.class_probability("A") > first.class_probability("B"));
}

#[test]
fn out_of_vocabulary_words_are_skipped() {
    let dataset = four_instance_dataset();
    let model = trained_model(&dataset);

    let mut instance = Instance::unlabeled();
    // Dimension far outside the training vocabulary.
    instance.set_dimension(100, 3.0);
    let scores = model.class_log_scores(&instance);
    assert!(scores.iter().all(|s| s.is_finite()));
    // Scores reduce to the priors alone.
    assert!((scores[0] - model.prior(0).log10()).abs() < 1e-12);
}

#[test]
fn zero_iterations_matches_labeled_only_baseline() {
    let mut labeled = four_instance_dataset();
    let label_alphabet = labeled.label_alphabet().clone();
    let feature_alphabet = labeled.feature_alphabet().clone();

    // Unlabeled pool that would shift the parameters if it were used.
    let mut unlabeled = Dataset::new();
    unlabeled.add(Instance::unlabeled().with_feature("f1", 5.0).with_feature("f2", 5.0));

    let mut test = four_instance_dataset();

    let config = EmConfig::new().with_iterations(0).with_lambda(0.3);
    let em_accuracy = run_em(
        &mut labeled,
        &mut unlabeled,
        &mut test,
        &label_alphabet,
        &feature_alphabet,
        &config,
    )
    .unwrap();

    let baseline = trained_model(&four_instance_dataset())
        .test(&four_instance_dataset())
        .unwrap();
    assert_eq!(em_accuracy, baseline);
}

#[test]
fn em_iterations_preserve_perfectly_separated_data() {
    let mut labeled = four_instance_dataset();
    let label_alphabet = labeled.label_alphabet().clone();
    let feature_alphabet = labeled.feature_alphabet().clone();

    let mut unlabeled = Dataset::new();
    unlabeled.add(Instance::unlabeled().with_feature("f1", 2.0));
    unlabeled.add(Instance::unlabeled().with_feature("f2", 2.0));

    let mut test = four_instance_dataset();

    let config = EmConfig::new().with_iterations(5);
    let accuracy = run_em(
        &mut labeled,
        &mut unlabeled,
        &mut test,
        &label_alphabet,
        &feature_alphabet,
        &config,
    )
    .unwrap();
    assert!(accuracy >= 0.75);

    // The E-step left normalized soft distributions on the pool.
    for instance in unlabeled.instances() {
        let total: f64 = instance.class_probabilities().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_requires_hard_labels() {
    let dataset = four_instance_dataset();
    let model = trained_model(&dataset);

    let mut blind = dataset.clone();
    blind.hide_labels();
    assert!(model.test(&blind).is_err());

    assert!(model.test(&Dataset::new()).is_err());
}

#[test]
fn arg_max_prefers_first_on_ties() {
    assert_eq!(arg_max(&[-1.0, -1.0]), 0);
    assert_eq!(arg_max(&[-5.0, -1.0, -3.0]), 1);
}

use super::*;
use crate::error::SemisupError;

fn toy_dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.add(Instance::labeled("A").with_feature("f1", 1.0));
    dataset.add(Instance::labeled("A").with_feature("f1", 1.0).with_feature("f2", 1.0));
    dataset.add(Instance::labeled("B").with_feature("f2", 1.0));
    dataset.add(Instance::labeled("B").with_feature("f2", 2.0));
    dataset
}

#[test]
fn alphabet_round_trips_every_token() {
    let mut alphabet = Alphabet::new();
    for token in ["zero", "one", "two", "zero"] {
        alphabet.add(token);
    }
    assert_eq!(alphabet.len(), 3);
    for token in ["zero", "one", "two"] {
        let index = alphabet.index(token).unwrap();
        assert_eq!(alphabet.token(index).unwrap(), token);
    }
}

#[test]
fn alphabet_indices_are_dense_and_insertion_ordered() {
    let mut alphabet = Alphabet::new();
    alphabet.add("c");
    alphabet.add("a");
    alphabet.add("b");
    assert_eq!(alphabet.tokens(), &["c", "a", "b"]);
    for (expected, token) in alphabet.tokens().iter().enumerate() {
        assert_eq!(alphabet.index(token).unwrap(), expected);
    }
}

#[test]
fn alphabet_lookup_misses_are_errors() {
    let mut alphabet = Alphabet::new();
    alphabet.add("known");
    assert!(matches!(
        alphabet.index("unknown"),
        Err(SemisupError::KeyNotFound { .. })
    ));
    assert!(matches!(
        alphabet.token(5),
        Err(SemisupError::IndexNotFound { .. })
    ));
}

#[test]
fn make_alphabets_collects_labels_then_features() {
    let mut dataset = toy_dataset();
    dataset.add(Instance::unlabeled().with_feature("f3", 1.0));
    dataset.make_alphabets();

    assert_eq!(dataset.num_classes(), 2);
    assert_eq!(dataset.num_dimensions(), 3);
    // Unlabeled instances contribute no label token.
    assert!(!dataset.label_alphabet().contains("f3"));
}

#[test]
fn alphabets_are_reproducible_across_identical_builds() {
    let build = || {
        let mut instance = Instance::labeled("A");
        for name in ["h", "c", "f", "a", "e", "b", "d", "g"] {
            instance.add_feature(name, 1.0);
        }
        let mut dataset = Dataset::new();
        dataset.add(instance);
        dataset.add(Instance::labeled("B").with_feature("z", 1.0).with_feature("y", 1.0));
        dataset.make_alphabets();
        dataset
    };

    let first = build();
    let second = build();
    assert_eq!(
        first.feature_alphabet().tokens(),
        second.feature_alphabet().tokens()
    );
    assert_eq!(
        first.label_alphabet().tokens(),
        second.label_alphabet().tokens()
    );
}

#[test]
fn make_alphabets_is_idempotent() {
    let mut dataset = toy_dataset();
    dataset.make_alphabets();
    let before: Vec<String> = dataset.feature_alphabet().tokens().to_vec();
    dataset.make_alphabets();
    assert_eq!(dataset.feature_alphabet().tokens(), before.as_slice());
}

#[test]
fn vectors_within_alphabet_range() {
    let mut dataset = toy_dataset();
    dataset.make_alphabets();
    dataset.make_vectors();

    let dims = dataset.num_dimensions();
    for instance in dataset.instances() {
        for (&index, _) in instance.vector() {
            assert!(index < dims);
        }
    }
}

#[test]
fn unknown_features_are_silently_dropped_from_vectors() {
    let mut dataset = toy_dataset();
    dataset.make_alphabets();
    // A feature the alphabet has never seen.
    dataset.instances_mut()[0].add_feature("novel", 4.0);
    dataset.make_vectors();

    let instance = &dataset.instances()[0];
    assert_eq!(instance.vector().len(), 1);
    let f1 = dataset.feature_alphabet().index("f1").unwrap();
    assert_eq!(instance.dimension(f1), Some(1.0));
}

#[test]
fn vectors_are_rebuilt_not_accumulated() {
    let mut dataset = toy_dataset();
    dataset.make_alphabets();
    dataset.make_vectors();
    dataset.make_vectors();
    assert_eq!(dataset.instances()[0].vector().len(), 1);
}

#[test]
fn pop_random_is_seed_deterministic() {
    let mut first = toy_dataset();
    let mut second = toy_dataset();

    let popped_first = first.pop_random(2, 99).unwrap();
    let popped_second = second.pop_random(2, 99).unwrap();

    assert_eq!(popped_first.len(), 2);
    for (a, b) in popped_first.iter().zip(&popped_second) {
        assert_eq!(a.label(), b.label());
        assert_eq!(a.features(), b.features());
    }
    assert_eq!(first.len(), 2);
}

#[test]
fn pop_random_rejects_oversized_requests() {
    let mut dataset = toy_dataset();
    let err = dataset.pop_random(10, 0).unwrap_err();
    assert!(matches!(
        err,
        SemisupError::InsufficientData {
            requested: 10,
            available: 4
        }
    ));
    // The dataset is untouched on failure.
    assert_eq!(dataset.len(), 4);
}

#[test]
fn split_round_robin_partitions_every_instance() {
    let mut dataset = Dataset::new();
    for i in 0..10 {
        dataset.add(Instance::labeled(format!("c{}", i % 2)).with_feature("f", f64::from(i)));
    }

    let splits = dataset.split(3).unwrap();
    assert_eq!(splits.len(), 3);

    let total: usize = splits.iter().map(|s| s.test.len()).sum();
    assert_eq!(total, dataset.len());

    let sizes: Vec<usize> = splits.iter().map(|s| s.test.len()).collect();
    let max = sizes.iter().max().unwrap();
    let min = sizes.iter().min().unwrap();
    assert!(max - min <= 1);

    for split in &splits {
        assert_eq!(split.pool.len() + split.test.len(), dataset.len());
    }
}

#[test]
fn split_seeded_partitions_every_instance() {
    let mut dataset = Dataset::new();
    for i in 0..20 {
        dataset.add(Instance::labeled("x").with_feature("f", f64::from(i)));
    }
    let splits = dataset.split_seeded(4, 7).unwrap();
    let total: usize = splits.iter().map(|s| s.test.len()).sum();
    assert_eq!(total, 20);
}

#[test]
fn split_rejects_zero_folds() {
    let dataset = toy_dataset();
    assert!(dataset.split(0).is_err());
    assert!(dataset.split_seeded(0, 1).is_err());
}

#[test]
fn split_sizes_draws_disjoint_subsets() {
    let dataset = toy_dataset();
    let (first, second) = dataset.split_sizes(1, 2, 5).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
    assert!(dataset.split_sizes(3, 2, 5).is_err());
}

#[test]
fn hide_and_restore_labels_round_trip() {
    let mut dataset = toy_dataset();
    let before: Vec<Option<String>> = dataset
        .instances()
        .iter()
        .map(|i| i.label().map(String::from))
        .collect();

    dataset.hide_labels();
    assert!(dataset.instances().iter().all(|i| i.label().is_none()));
    assert!(dataset.instances().iter().all(|i| i.scratch().is_some()));

    dataset.restore_labels();
    let after: Vec<Option<String>> = dataset
        .instances()
        .iter()
        .map(|i| i.label().map(String::from))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn one_hot_distributions_cover_labeled_instances_only() {
    let mut dataset = toy_dataset();
    dataset.add(Instance::unlabeled().with_feature("f1", 1.0));
    dataset.make_alphabets();
    let labels = dataset.label_alphabet().tokens().to_vec();
    dataset.set_one_hot_distributions(&labels);

    let first = &dataset.instances()[0];
    assert_eq!(first.class_probability("A"), 1.0);
    assert_eq!(first.class_probability("B"), 0.0);

    let unlabeled = dataset.instances().last().unwrap();
    assert!(unlabeled.class_probabilities().is_empty());
}

#[test]
fn from_parts_concatenates_in_order() {
    let first = toy_dataset();
    let second = toy_dataset();
    let combined = Dataset::from_parts(&[&first, &second]);
    assert_eq!(combined.len(), 8);
    assert_eq!(combined.instances()[0].label(), Some("A"));
    assert_eq!(combined.instances()[4].label(), Some("A"));
}

#[test]
fn discard_features_prunes_by_document_frequency() {
    let mut dataset = toy_dataset();
    // f1 appears in 2 instances, f2 in 3.
    dataset.discard_features(3, usize::MAX);
    for instance in dataset.instances() {
        assert!(!instance.features().contains_key("f1"));
    }
    assert!(dataset.instances()[2].features().contains_key("f2"));
}

#[test]
fn normalize_scales_features_to_unit_length() {
    let mut instance = Instance::labeled("A")
        .with_feature("x", 3.0)
        .with_feature("y", 4.0);
    assert!((instance.length() - 5.0).abs() < 1e-12);
    assert!((instance.total_mass() - 7.0).abs() < 1e-12);
    instance.normalize();
    assert!((instance.length() - 1.0).abs() < 1e-12);
}

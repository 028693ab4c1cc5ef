//! End-to-end pipeline test: load a training table, tune the branching
//! factor, fit and persist the final model, then score an unseen table and
//! export the predictions.

use std::fs;
use std::path::Path;

use pathovar::config::ReferenceConfig;
use pathovar::dataset::loader::load_table;
use pathovar::dataset::schema::{OrganismReference, ResolutionMode, resolve_schema};
use pathovar::dataset::view::build_training_view;
use pathovar::forest::ForestTrainer;
use pathovar::predict::{PredictOptions, predict};
use pathovar::training::{ModelArtifact, train_final};
use pathovar::tuning::{TuneOptions, tune};
use tempfile::tempdir;

fn write_reference_lists(dir: &Path) -> ReferenceConfig {
    let short = dir.join("short_codes.txt");
    let long = dir.join("long_names.txt");
    fs::write(&short, "organism_a\norganism_b\norganism_c\n").unwrap();
    fs::write(&long, "Alpha Organism\nBeta Organism\nGamma Organism\n").unwrap();
    ReferenceConfig {
        short_code_list: short,
        long_name_list: long,
    }
}

fn write_training_csv(path: &Path, rows: usize) {
    let mut text = String::from(
        "coordinate,allele_id,GeneSymbol,Chromosome,significance,organism_a,organism_b,organism_c\n",
    );
    for i in 0..rows {
        let pathogenic = i % 2 == 1;
        let significance = if pathogenic { "Pathogenic" } else { "Benign" };
        let conserved: f64 = if pathogenic { 0.9 } else { 0.1 };
        text.push_str(&format!(
            "1:{},A>T,GENE{},1,{},{:.3},{:.3},0.4\n",
            100 + i,
            i,
            significance,
            conserved + (i as f64) * 1e-3,
            1.0 - conserved,
        ));
    }
    fs::write(path, text).unwrap();
}

fn write_unseen_csv(path: &Path) {
    // Different column order from training, plus one record with a missing
    // conservation value.
    fs::write(
        path,
        "organism_c,coordinate,allele_id,organism_a,organism_b,GeneSymbol,Chromosome\n\
         0.4,9:900,G>C,0.95,0.05,BRCA2,13\n\
         0.4,9:901,T>A,0.05,0.95,MLH1,3\n\
         0.4,9:902,A>G,,0.5,PMS2,7\n",
    )
    .unwrap();
}

#[test]
fn full_pipeline_from_csv_to_export() {
    let dir = tempdir().unwrap();
    let config = write_reference_lists(dir.path());
    let reference = OrganismReference::load(&config).unwrap();

    let train_path = dir.path().join("train.csv");
    write_training_csv(&train_path, 20);
    let training = load_table(&train_path).unwrap();

    let schema = resolve_schema(&training, &reference, ResolutionMode::ShortCode, &[]).unwrap();
    assert_eq!(
        schema.feature_names,
        vec!["organism_a", "organism_b", "organism_c"]
    );
    let view = build_training_view(&training, &schema).unwrap();
    assert_eq!(view.classes, vec!["Benign", "Pathogenic"]);

    let trainer = ForestTrainer {
        n_trees: 25,
        seed: 17,
        ..ForestTrainer::default()
    };
    // Three features give a very small grid; the tuner must handle it cleanly.
    let outcome = tune(&trainer, &view, &TuneOptions::default()).unwrap();
    assert!((1..=3).contains(&outcome.best_mtry));
    assert!(!outcome.round1.is_empty());
    assert!(!outcome.round2.is_empty());
    for candidate in outcome.round1.iter().chain(&outcome.round2) {
        assert!((0.0..=1.0).contains(&candidate.mean_accuracy));
    }

    let artifact = train_final(&trainer, &view, outcome.best_mtry).unwrap();
    let model_path = dir.path().join("model.json");
    artifact.save(&model_path).unwrap();
    let loaded = ModelArtifact::load(&model_path).unwrap();

    let unseen_path = dir.path().join("unseen.csv");
    write_unseen_csv(&unseen_path);
    let unseen = load_table(&unseen_path).unwrap();

    let export_path = dir.path().join("predictions.csv");
    let options = PredictOptions {
        resolution: ResolutionMode::ShortCode,
        include_allele_id: true,
        additional_columns: vec!["GeneSymbol".into(), "Chromosome".into()],
        export_path: Some(export_path.clone()),
        ..PredictOptions::default()
    };
    let table = predict(&loaded, &unseen, &reference, &options).unwrap();

    assert_eq!(table.rows.len(), 3);
    for row in &table.rows {
        assert!((0.0..=1.0).contains(&row.score));
    }
    // Strongly conserved in training-pathogenic direction vs. the opposite.
    assert!(table.rows[0].score > table.rows[1].score);

    // Persisted and in-memory models must agree exactly.
    let in_memory = predict(&artifact, &unseen, &reference, &options).unwrap();
    assert_eq!(table, in_memory);

    let text = fs::read_to_string(&export_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "score,coordinate,allele_id,GeneSymbol,Chromosome"
    );
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("9:900"));
    assert!(lines[1].contains("BRCA2"));
}

#[test]
fn prediction_with_long_name_resolution_mode() {
    let dir = tempdir().unwrap();
    let config = write_reference_lists(dir.path());
    let reference = OrganismReference::load(&config).unwrap();

    let train_path = dir.path().join("train.csv");
    write_training_csv(&train_path, 16);
    let training = load_table(&train_path).unwrap();
    let schema = resolve_schema(&training, &reference, ResolutionMode::ShortCode, &[]).unwrap();
    let view = build_training_view(&training, &schema).unwrap();
    let trainer = ForestTrainer {
        n_trees: 15,
        seed: 3,
        ..ForestTrainer::default()
    };
    let artifact = train_final(&trainer, &view, 2).unwrap();

    // The unseen table keeps the short-code feature names the model was
    // trained on, and additionally asks for long-name resolution with the
    // short-code columns supplied as extras.
    let unseen_path = dir.path().join("unseen.csv");
    fs::write(
        &unseen_path,
        "coordinate,organism_a,organism_b,organism_c\n5:500,0.92,0.08,0.4\n",
    )
    .unwrap();
    let unseen = load_table(&unseen_path).unwrap();
    let options = PredictOptions {
        resolution: ResolutionMode::LongName,
        extra_feature_names: vec![
            "organism_a".into(),
            "organism_b".into(),
            "organism_c".into(),
        ],
        ..PredictOptions::default()
    };
    let table = predict(&artifact, &unseen, &reference, &options).unwrap();
    assert_eq!(table.rows.len(), 1);
    assert!((0.0..=1.0).contains(&table.rows[0].score));
}

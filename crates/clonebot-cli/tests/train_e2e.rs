//! End-to-end pipeline check: synthetic recording files through loading,
//! encoding, training, checkpointing and ONNX export.

use std::{fs, path::PathBuf};

use clonebot_data::{Dataset, expand_data_pattern};
use clonebot_net::{Checkpoint, PolicyNetwork, TrainConfig, Trainer};
use clonebot_onnx::{OnnxSession, model_from_policy, write_model};
use clonebot_schema::{ACTION_LEN, EncoderConfig, FEATURE_LEN};
use rand::Rng as _;
use rand_pcg::Pcg64Mcg;
use serde_json::json;

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("clonebot-e2e-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn synthetic_recording(frames: usize) -> serde_json::Value {
    let frames: Vec<serde_json::Value> = (0..frames)
        .map(|i| {
            json!({
                "health": 50.0,
                "armor": 25.0,
                "position": { "x": 100.0, "y": -200.0, "z": 50.0 },
                "velocity": { "x": 150.0, "y": 0.0, "z": 0.0 },
                "current_weapon_id": 10.0,
                "primary_ammo": 30.0,
                "on_ground": true,
                "visible_entities": [
                    {
                        "is_enemy": true,
                        "distance": 1024.0,
                        "horizontal_angle": 45.0,
                        "vertical_angle": 0.0,
                        "health": 80.0
                    }
                ],
                "movement": { "x": 225.0, "y": 0.0, "z": 0.0 },
                "aim_delta": { "yaw": 45.0, "pitch": -22.5 },
                "buttons": if i % 2 == 0 { 1 } else { 0 }
            })
        })
        .collect();
    json!({ "frames": frames })
}

#[test]
fn test_recording_to_onnx_pipeline() {
    let dir = workdir("pipeline");
    let recording_path = dir.join("recording.json");
    fs::write(
        &recording_path,
        serde_json::to_string(&synthetic_recording(100)).unwrap(),
    )
    .unwrap();

    let paths = expand_data_pattern(recording_path.to_str().unwrap()).unwrap();
    assert_eq!(paths.len(), 1);

    let (dataset, report) = Dataset::load_files(&paths, &EncoderConfig::default());
    assert_eq!(report.files_loaded, 1);
    assert_eq!(report.frames_extracted, 100);
    assert_eq!(dataset.len(), 100);

    // Known normalization of the self-state prefix.
    let sample = dataset.samples()[0];
    assert_eq!(sample.features.len(), FEATURE_LEN);
    assert!((sample.features[0] - 0.5).abs() < 1e-6, "health");
    assert!((sample.features[1] - 0.25).abs() < 1e-6, "armor");
    assert!((sample.features[8] - 0.2).abs() < 1e-6, "weapon id");
    assert!((sample.features[9] - 0.3).abs() < 1e-6, "ammo");
    assert_eq!(sample.actions.len(), ACTION_LEN);
    // Full-rate yaw turn normalizes to the clamp boundary.
    assert!((sample.actions[3] - 0.5).abs() < 1e-6, "yaw");
    assert_eq!(sample.actions[5], 1.0, "attack button");

    let mut rng = Pcg64Mcg::new(1234);
    let (train, val) = dataset.split(0.2, &mut rng);
    assert_eq!(val.len(), 20);

    let network = PolicyNetwork::random(FEATURE_LEN, &[32, 16], 0.2, &mut rng);
    let mut trainer = Trainer::new(network, 0.001);
    let config = TrainConfig {
        epochs: 1,
        batch_size: 10,
        checkpoint_dir: dir.clone(),
    };
    let report = trainer
        .fit(train.samples(), val.samples(), &config, &mut rng)
        .unwrap();
    assert_eq!(report.epochs_run, 1);
    assert!(dir.join("best_model.json").exists());

    let onnx_path = dir.join("behavior_clone.onnx");
    write_model(&model_from_policy(trainer.network()), &onnx_path).unwrap();
    let session = OnnxSession::open(&onnx_path, FEATURE_LEN).unwrap();
    assert_eq!(session.output_dim(), ACTION_LEN);

    let native = trainer.network().predict(&sample.features);
    let exported = session.predict(&sample.features).unwrap();
    for (a, e) in exported.iter().zip(&native) {
        assert!((a - e).abs() < 1e-4);
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_checkpoint_restores_identical_predictions() {
    let dir = workdir("checkpoint");
    let mut rng = Pcg64Mcg::new(7);
    let network = PolicyNetwork::random(FEATURE_LEN, &[16], 0.0, &mut rng);
    let mut trainer = Trainer::new(network, 0.001);

    let samples: Vec<_> = (0..20)
        .map(|_| {
            let mut features = [0.0f32; FEATURE_LEN];
            for v in &mut features {
                *v = rng.random_range(-1.0..1.0);
            }
            let mut actions = [0.0f32; ACTION_LEN];
            actions[0] = 0.5;
            actions[5] = 1.0;
            clonebot_schema::Sample { features, actions }
        })
        .collect();

    let config = TrainConfig {
        epochs: 1,
        batch_size: 5,
        checkpoint_dir: dir.clone(),
    };
    trainer.fit(&samples, &[], &config, &mut rng).unwrap();

    let restored = Checkpoint::load(&dir.join("best_model.json")).unwrap();
    let input = samples[0].features;
    assert_eq!(
        restored.network.predict(&input),
        trainer.network().predict(&input)
    );
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_zero_match_pattern_yields_no_files() {
    let dir = workdir("no-match");
    let pattern = dir.join("*.json");
    let paths = expand_data_pattern(pattern.to_str().unwrap()).unwrap();
    assert!(paths.is_empty());
    // Nothing downstream ran, so no artifacts either.
    assert!(!dir.join("best_model.json").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_trainer_exits_nonzero_on_zero_match_pattern() {
    let dir = workdir("cli-no-match");
    let pattern = dir.join("*.json");
    let out_dir = dir.join("models");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_clonebot-train"))
        .args([
            "--data",
            pattern.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no recording files found"),
        "unexpected stderr: {stderr}"
    );
    // The run failed before any artifact could be written.
    assert!(!out_dir.exists());
    fs::remove_dir_all(&dir).unwrap();
}

use std::path::Path;

fn run(args: &[&str]) -> anyhow::Result<u8> {
    gr00t::run(std::iter::once("gr00t").chain(args.iter().copied()))
}

fn write_checkpoint(dir: &Path) {
    std::fs::write(dir.join("config.json"), r#"{"model_args": {}}"#).unwrap();
    std::fs::create_dir_all(dir.join("experiment_cfg")).unwrap();
    std::fs::write(
        dir.join("experiment_cfg").join("metadata.json"),
        r#"{"gr1": {"modality_config": {"delta_indices": [0], "modality_keys": ["state.left_arm"]}}}"#,
    )
    .unwrap();
}

#[test]
fn check_dataset_fails_on_empty_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().to_str().unwrap();

    assert_eq!(run(&["check-dataset", path]).unwrap(), 1);
    assert_eq!(run(&["check-dataset", "--recursive", path]).unwrap(), 1);
}

#[test]
fn eval_stops_at_missing_data_source() {
    let tmp = tempfile::tempdir().unwrap();
    write_checkpoint(tmp.path());

    let exit_code = run(&["eval", tmp.path().to_str().unwrap(), "--device", "cpu"]).unwrap();

    assert_eq!(exit_code, 1);
    assert!(!tmp.path().join("test_results.json").exists());
}

#[test]
fn eval_without_kernel_stubs_fails_to_construct() {
    let tmp = tempfile::tempdir().unwrap();
    write_checkpoint(tmp.path());

    let err = run(&[
        "eval",
        tmp.path().to_str().unwrap(),
        "--no-flash-attn-stubs",
    ])
    .unwrap_err();

    assert!(err.to_string().contains("flash_attn"), "{err}");
}

#[test]
fn eval_rejects_missing_config() {
    let tmp = tempfile::tempdir().unwrap();

    let err = run(&["eval", tmp.path().to_str().unwrap()]).unwrap_err();

    assert!(err.to_string().contains("config.json"), "{err}");
}

use spreadsheet_export::cli;

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn sample_flag_writes_a_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.xlsx");
    let output_arg = output.to_str().unwrap();

    let written = cli::run(&args(&["spreadsheet-export", "--sample", output_arg]))
        .await
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), written);
    assert_eq!(&bytes[..4], b"PK\x03\x04");
}

#[tokio::test]
async fn json_input_file_is_converted() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells.json");
    let output = dir.path().join("cells.xlsx");
    std::fs::write(&input, r#"[{ "cell": "a1", "value": "x" }, { "cell": "b2", "value": 3 }]"#).unwrap();

    cli::run(&args(&[
        "spreadsheet-export",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]))
    .await
    .unwrap();

    assert_eq!(&std::fs::read(&output).unwrap()[..2], b"PK");
}

#[tokio::test]
async fn wrong_argument_count_is_an_error() {
    let err = cli::run(&args(&["spreadsheet-export", "--sample"]))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Usage: spreadsheet-export"));

    assert!(cli::run(&[]).await.is_err());
}

#[tokio::test]
async fn unconvertible_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.json");
    let output = dir.path().join("bad.xlsx");
    std::fs::write(&input, r#"{ "nonsense": true }"#).unwrap();

    let result = cli::run(&args(&[
        "spreadsheet-export",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]))
    .await;

    assert!(result.is_err());
    assert!(!output.exists());
}

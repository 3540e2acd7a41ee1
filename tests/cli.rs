mod common;

use common::{TestWorkspace, datadepth_cmd, fixture_path};
use datadepth::schema::{InferredType, Schema};
use predicates::str::contains;

fn path_str(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 path")
}

fn profile_orders(workspace: &TestWorkspace) -> std::path::PathBuf {
    let schema_path = workspace.join("orders.json");
    datadepth_cmd()
        .args([
            "profile",
            "-i",
            path_str(&fixture_path("orders.csv")),
            "-s",
            path_str(&schema_path),
        ])
        .assert()
        .success()
        .stdout(contains("ordered_at"))
        .stdout(contains("4 categories"));
    schema_path
}

#[test]
fn profile_without_schema_path_prints_json() {
    let output = datadepth_cmd()
        .args(["profile", "-i", path_str(&fixture_path("scenario.csv"))])
        .output()
        .expect("run profile");
    assert!(output.status.success());
    let schema = Schema::from_json_str(&String::from_utf8_lossy(&output.stdout)).expect("schema");
    assert_eq!(schema.headers(), vec!["a", "b"]);
    assert_eq!(schema.schema_version.as_deref(), Some("1.0.0"));
}

#[test]
fn no_header_flag_synthesizes_names() {
    let output = datadepth_cmd()
        .args(["prof", "-i", path_str(&fixture_path("scenario.csv")), "--no-header"])
        .output()
        .expect("run profile");
    assert!(output.status.success());
    let schema = Schema::from_json_str(&String::from_utf8_lossy(&output.stdout)).expect("schema");
    assert_eq!(schema.headers(), vec!["col_0", "col_1"]);
    assert_eq!(schema.row_count, 4);
    assert_eq!(schema.columns[0].inferred_type(), InferredType::Categorical);
}

#[test]
fn tab_separated_input_is_detected_by_extension() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("pets.tsv", "name\tage\nrex\t3\nfido\t5\nmax\t7\n");
    let output = datadepth_cmd()
        .args(["profile", "-i", path_str(&input)])
        .output()
        .expect("run profile");
    assert!(output.status.success());
    let schema = Schema::from_json_str(&String::from_utf8_lossy(&output.stdout)).expect("schema");
    assert_eq!(schema.headers(), vec!["name", "age"]);
    assert_eq!(schema.columns[1].inferred_type(), InferredType::Numeric);
}

#[test]
fn ragged_csv_fails_naming_the_row() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("ragged.csv", "a,b\n1,2\n3,4,5\n");
    datadepth_cmd()
        .args(["profile", "-i", path_str(&input)])
        .assert()
        .failure()
        .stderr(contains("Malformed input at row 3"));
}

#[test]
fn generate_writes_header_and_requested_rows() {
    let workspace = TestWorkspace::new();
    let schema_path = profile_orders(&workspace);
    let output_path = workspace.join("synthetic.csv");
    datadepth_cmd()
        .args([
            "generate",
            "-s",
            path_str(&schema_path),
            "-n",
            "25",
            "-o",
            path_str(&output_path),
        ])
        .assert()
        .success();

    let contents = workspace.read("synthetic.csv");
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["order_id", "customer", "city", "amount", "ordered_at", "comment"]
    );
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .expect("records");
    assert_eq!(rows.len(), 25);
    for row in &rows {
        assert!(["Oslo", "Lima", "Pune", "Kyoto"].contains(&&row[2]));
        let id: i64 = row[0].parse().expect("integer id");
        assert!((1..=120).contains(&id));
    }
}

#[test]
fn same_seed_gives_same_bytes_and_prefixes_agree() {
    let workspace = TestWorkspace::new();
    let schema_path = profile_orders(&workspace);
    let run = |rows: &str, seed: &str| {
        let output = datadepth_cmd()
            .args(["gen", "-s", path_str(&schema_path), "-n", rows, "--seed", seed])
            .output()
            .expect("run generate");
        assert!(output.status.success());
        String::from_utf8(output.stdout).expect("utf-8 output")
    };

    let first = run("40", "7");
    assert_eq!(first, run("40", "7"));
    assert_ne!(first, run("40", "8"));

    let short = run("10", "7");
    let prefix = first.lines().take(11).collect::<Vec<_>>();
    assert_eq!(short.lines().collect::<Vec<_>>(), prefix);
}

#[test]
fn quantile_model_and_tsv_output() {
    let workspace = TestWorkspace::new();
    let schema_path = profile_orders(&workspace);
    let output_path = workspace.join("synthetic.tsv");
    datadepth_cmd()
        .args([
            "generate",
            "-s",
            path_str(&schema_path),
            "-n",
            "5",
            "--numeric-model",
            "quantile",
            "--no-header",
            "-o",
            path_str(&output_path),
        ])
        .assert()
        .success();
    let contents = workspace.read("synthetic.tsv");
    assert_eq!(contents.lines().count(), 5);
    assert!(contents.lines().all(|line| line.split('\t').count() == 6));
}

#[test]
fn config_file_selects_numeric_model_and_rejects_unknown_keys() {
    let workspace = TestWorkspace::new();
    let schema_path = profile_orders(&workspace);
    let good = workspace.write("good.yaml", "generate:\n  numeric_model: quantile\n");
    datadepth_cmd()
        .args([
            "preview",
            "-s",
            path_str(&schema_path),
            "--config",
            path_str(&good),
        ])
        .assert()
        .success();

    let bad = workspace.write("bad.yaml", "generate:\n  model: quantile\n");
    datadepth_cmd()
        .args(["gen", "-s", path_str(&schema_path), "-n", "1", "--config", path_str(&bad)])
        .assert()
        .failure()
        .stderr(contains("Parsing config YAML"));
}

#[test]
fn preview_prints_five_rows() {
    let workspace = TestWorkspace::new();
    let schema_path = profile_orders(&workspace);
    let output = datadepth_cmd()
        .args(["preview", "-s", path_str(&schema_path)])
        .output()
        .expect("run preview");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2 + 5, "{stdout}");
    assert!(lines[0].starts_with("order_id"));
    assert!(lines[1].starts_with("---"));
}

#[test]
fn generate_refuses_schema_with_violations() {
    let workspace = TestWorkspace::new();
    let schema = r#"{
        "row_count": 2,
        "source_had_header": true,
        "columns": [
            {"name": "x", "inferred_type": "numeric", "nullable": false, "null_rate": 0.0,
             "statistics": {"numeric": {"count": 2, "min": 5.0, "max": 1.0, "mean": 3.0,
                "std_dev": 1.0, "p25": 2.0, "p50": 3.0, "p75": 4.0}}}
        ]
    }"#;
    let path = workspace.write("bad.json", schema);
    datadepth_cmd()
        .args(["generate", "-s", path_str(&path), "-n", "3"])
        .assert()
        .failure()
        .stderr(contains("Schema failed validation with 1 violation(s)"));
}

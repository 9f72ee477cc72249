//! End-to-end tests: CSV file in, matrices, tables and reports out.

use approx::assert_relative_eq;
use retention::cohort::{CategoryActivity, Observed, PeriodKind};
use retention::data::{
    ActivityTable, CategoryTable, ClientId, LoadConfig, detect_columns, load_csv,
};
use retention::output::{ExportFormat, Exporter};
use retention::{AnalysisConfig, CohortAnalysis, ValueType};
use std::io::Write;
use std::path::PathBuf;

fn write_csv(name: &str, lines: &[&str]) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}

/// Weekly sales, deliberately out of order, with float-formatted client codes.
fn weekly_sales(name: &str) -> PathBuf {
    write_csv(
        &format!("retention_weekly_sales_{name}.csv"),
        &[
            "Год-неделя;Код клиента;Сумма",
            "2024/03;196107.0;10",
            "2024/01;196107;20",
            "2024/01;200;5",
            "2024/01;201;5",
            "2024/02;200;7",
            "2024/02;300;1",
            "2024/03;300;4",
            "2024/03;;4",
            "2024/04;400;9",
        ],
    )
}

fn analysis(name: &str, config: &AnalysisConfig) -> CohortAnalysis {
    let load = LoadConfig {
        delimiter: b';',
        ..LoadConfig::default()
    };
    let frame = load_csv(weekly_sales(name), &load).unwrap();
    let columns = detect_columns(&frame);
    let table = ActivityTable::new(
        frame,
        columns.require_period().unwrap(),
        columns.require_client().unwrap(),
    )
    .unwrap();
    CohortAnalysis::run(&table, config).unwrap()
}

#[test]
fn test_csv_to_matrices() {
    let analysis = analysis("matrices", &AnalysisConfig::default());

    assert_eq!(analysis.periods(), ["2024/01", "2024/02", "2024/03", "2024/04"]);
    assert_eq!(analysis.period_kind(), PeriodKind::Week);

    // 2024/01: {196107, 200, 201}; 2024/02: {300}; 2024/03: {}; 2024/04: {400}
    assert_eq!(analysis.cohort_matrix().diagonal(), vec![3, 1, 0, 1]);
    assert_eq!(analysis.cohort_matrix().to_rows()[0], vec![3, 1, 1, 0]);
    assert_eq!(analysis.accumulation_matrix().to_rows()[0], vec![3, 1, 2, 2]);
    assert_relative_eq!(
        analysis.percent_matrix().cell("2024/01", "2024/03").unwrap(),
        200.0 / 3.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        analysis.inflow_matrix().cell("2024/01", "2024/03").unwrap(),
        100.0 / 3.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_churn_and_queries() {
    let analysis = analysis("churn", &AnalysisConfig::default());
    let churn = analysis.churn_table();

    let first = churn.get("2024/01").unwrap();
    assert_eq!(first.cumulative_return, Observed::Computed(2));
    assert_eq!(first.churn_count, Observed::Computed(1));
    assert_eq!(churn.get("2024/04").unwrap().churn_count, Observed::NotObservable);

    let queries = analysis.queries();
    assert_eq!(queries.churn_clients("2024/01"), vec![ClientId::from("201")]);
    assert_eq!(
        queries.accumulation_clients("2024/01", "2024/03"),
        vec![ClientId::from("196107"), ClientId::from("200")]
    );
    assert_eq!(
        queries.inflow_clients("2024/01", "2024/03"),
        vec![ClientId::from("196107")]
    );
}

#[test]
fn test_records_value_type() {
    let config = AnalysisConfig {
        value_type: ValueType::Records,
    };
    let analysis = analysis("records", &config);

    assert_eq!(analysis.cohort_matrix().diagonal(), vec![3, 2, 2, 1]);
    assert_eq!(analysis.cohort_matrix().to_rows()[0], vec![3, 0, 0, 0]);
    assert_eq!(
        analysis.churn_table().get("2024/01").unwrap().churn_count,
        Observed::Computed(1)
    );
}

#[test]
fn test_network_churn_from_category_file() {
    let analysis = analysis("network", &AnalysisConfig::default());
    let path = write_csv(
        "retention_weekly_categories.csv",
        &[
            "category;period;client",
            "bags;2024/04;201",
            "shoes;2024/01;201",
        ],
    );
    let load = LoadConfig {
        delimiter: b';',
        ..LoadConfig::default()
    };
    let frame = load_csv(path, &load).unwrap();
    let columns = detect_columns(&frame);
    let table = CategoryTable::new(
        frame,
        columns.require_category().unwrap(),
        columns.period.clone(),
        columns.require_client().unwrap(),
    )
    .unwrap();
    let categories = CategoryActivity::from_table(&table).unwrap();

    let network = analysis.network_churn(&categories);
    let first = network.get("2024/01").unwrap();
    assert_eq!(first.present_count, Observed::Computed(1));
    assert_eq!(first.network_churn, Observed::Computed(0));

    let presence = analysis.category_presence(&categories, "2024/01").unwrap();
    assert_eq!(presence.categories, vec!["bags", "shoes"]);
    assert_eq!(presence.total, 1);
}

#[test]
fn test_export_and_report() {
    let analysis = analysis("export", &AnalysisConfig::default());
    let dir = std::env::temp_dir().join("retention_end_to_end");
    std::fs::create_dir_all(&dir).unwrap();

    analysis
        .churn_table()
        .export_to_file(&dir.join("churn.csv"), ExportFormat::Csv)
        .unwrap();
    let csv = std::fs::read_to_string(dir.join("churn.csv")).unwrap();
    assert!(csv.lines().last().unwrap().ends_with("-,-,-,-"));

    let report = analysis.report("weekly.csv", 2).unwrap();
    report.write_to(&dir.join("report.json")).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["dataset"], "weekly.csv");
    assert_eq!(json["period_kind"], "week");
    assert_eq!(json["contents"]["overview"]["period_count"], 4);

    std::fs::remove_dir_all(dir).ok();
}

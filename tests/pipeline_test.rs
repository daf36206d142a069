// ==========================================
// 端到端管道测试
// ==========================================
// 测试范围: 源表文件 → 并行加载 → 引擎 → CSV 报表 / 汇总 JSON
// ==========================================

mod helpers;

use helpers::sku_builder::{as_of, config};
use helpers::source_files::write_source_dir;
use rust_decimal_macros::dec;
use siop_burndown::engine::{BurnDownEngine, EngineError};
use siop_burndown::importer::{MemorySource, ParallelSourceLoader};
use siop_burndown::report::{write_summary_json, CsvReportWriter};
use siop_burndown::{run_pipeline, RunSummary};

#[tokio::test]
async fn test_directory_pipeline_end_to_end() {
    siop_burndown::logging::init_test();
    let dir = write_source_dir();
    let engine = BurnDownEngine::new(config()).unwrap();
    let source = ParallelSourceLoader::from_directory(dir.path(), as_of()).unwrap();

    let output = run_pipeline(&source, &engine).await.unwrap();
    let summary = &output.run.summary;

    assert_eq!(summary.total, 4);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.is_balanced());
    assert_eq!(output.orphan_usage_rows, 1);
    assert_eq!(output.orphan_demand_rows, 1);
    assert!(output
        .run
        .errors
        .iter()
        .all(|e| matches!(e, EngineError::Validation { .. })));

    let csv = CsvReportWriter.render(&output.rows).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "sku,bucket,category,quantity,burn_down_horizon");
    for expected in [
        "A100,Past Due,Safety Stock,20,6-12 Months",
        "A100,2026-01,Unclassified,10,6-12 Months",
        "A100,2026-02,Open Demand Coverage,30,6-12 Months",
        "A100,2026-08,Unclassified,10,6-12 Months",
        "B200,Never,Excess-Buyer,50,Never",
        "H300,Past Due,Safety Stock,5,0-6 Months",
        "H300,Past Due,Open Demand Coverage,10,0-6 Months",
        "H300,2026-01,Hold,5,0-6 Months",
        "H300,2026-05,Hold,5,0-6 Months",
    ] {
        assert!(lines.contains(&expected), "missing line: {}", expected);
    }
    assert!(!csv.contains("A100,2026-02,Unclassified"));
    assert!(!csv.contains("2026-09"));
}

#[tokio::test]
async fn test_pipeline_values_inventory_by_unit_cost() {
    let dir = write_source_dir();
    let engine = BurnDownEngine::new(config()).unwrap();
    let source = ParallelSourceLoader::from_directory(dir.path(), as_of()).unwrap();
    let output = run_pipeline(&source, &engine).await.unwrap();
    let summary = &output.run.summary;

    // A100: 120 × 2.5 = 300; H300: 40 × 4 = 160; B200 无成本
    assert_eq!(summary.total_value, dec!(460));
    assert_eq!(summary.unvalued, 1);
    assert_eq!(summary.value_by_horizon.get("6-12 Months"), Some(&dec!(300)));
    assert_eq!(summary.value_by_horizon.get("0-6 Months"), Some(&dec!(160)));
    assert_eq!(summary.value_by_category.get("Safety Stock"), Some(&dec!(70)));

    // 报表列不变
    let csv = CsvReportWriter.render(&output.rows).unwrap();
    assert!(csv.starts_with("sku,bucket,category,quantity,burn_down_horizon\n"));
}

#[tokio::test]
async fn test_pipeline_output_is_deterministic() {
    let dir = write_source_dir();

    let mut rendered = Vec::new();
    for _ in 0..2 {
        let engine = BurnDownEngine::new(config()).unwrap();
        let source = ParallelSourceLoader::from_directory(dir.path(), as_of()).unwrap();
        let output = run_pipeline(&source, &engine).await.unwrap();
        rendered.push(CsvReportWriter.render(&output.rows).unwrap());
    }

    assert_eq!(rendered[0], rendered[1]);
}

#[tokio::test]
async fn test_pipeline_files_written() {
    let dir = write_source_dir();
    let engine = BurnDownEngine::new(config()).unwrap();
    let source = ParallelSourceLoader::from_directory(dir.path(), as_of()).unwrap();
    let output = run_pipeline(&source, &engine).await.unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let report_path = out_dir.path().join("burn_down.csv");
    let summary_path = out_dir.path().join("burn_down.csv.summary.json");

    let written = CsvReportWriter.write_file(&report_path, &output.rows).unwrap();
    write_summary_json(&summary_path, &output.run.summary).unwrap();

    assert_eq!(written, output.rows.len());
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(report.lines().count(), output.rows.len() + 1);

    let raw = std::fs::read_to_string(&summary_path).unwrap();
    let summary: RunSummary = serde_json::from_str(&raw).unwrap();
    assert_eq!(summary.run_id, output.run.summary.run_id);
    assert_eq!(summary.as_of, as_of());
    assert_eq!(summary.total, 4);
}

#[tokio::test]
async fn test_empty_source_writes_header_only() {
    let engine = BurnDownEngine::new(config()).unwrap();
    let source = MemorySource::new(Vec::new());
    let output = run_pipeline(&source, &engine).await.unwrap();

    assert_eq!(output.run.summary.total, 0);
    assert!(output.rows.is_empty());
    assert_eq!(
        CsvReportWriter.render(&output.rows).unwrap(),
        "sku,bucket,category,quantity,burn_down_horizon\n"
    );
}

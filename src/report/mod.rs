// ==========================================
// 库存消耗分析系统 - 报表层
// ==========================================
// 职责: 分配结果扁平化 + CSV/JSON 输出
// ==========================================

pub mod csv_writer;
pub mod report_row;

pub use csv_writer::{write_summary_json, CsvReportWriter, ReportError, ReportResult};
pub use report_row::{build_report, build_rows, ReportRow, REPORT_COLUMNS};

// ==========================================
// 库存消耗分析系统 - CSV 报表输出
// ==========================================
// 职责: 报表行 → CSV（下游透视表直接读取）; 运行汇总 → JSON
// ==========================================

use crate::domain::summary::RunSummary;
use crate::report::report_row::{ReportRow, REPORT_COLUMNS};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

/// 报表输出错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报表写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 序列化失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

pub struct CsvReportWriter;

impl CsvReportWriter {
    /// 写入任意输出流
    ///
    /// 无数据行时仍写出表头
    pub fn write_to<W: Write>(&self, writer: W, rows: &[ReportRow]) -> ReportResult<usize> {
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(REPORT_COLUMNS)?;
        for row in rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(rows.len())
    }

    /// 写入文件
    #[instrument(skip(self, rows), fields(path = %path.as_ref().display(), count = rows.len()))]
    pub fn write_file<P: AsRef<Path>>(&self, path: P, rows: &[ReportRow]) -> ReportResult<usize> {
        let file = File::create(path.as_ref())?;
        let written = self.write_to(BufWriter::new(file), rows)?;
        info!(rows = written, "报表已写出");
        Ok(written)
    }

    /// 渲染为字符串（测试/嵌入调用方使用）
    pub fn render(&self, rows: &[ReportRow]) -> ReportResult<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, rows)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// 运行汇总写为 JSON 文件
pub fn write_summary_json<P: AsRef<Path>>(path: P, summary: &RunSummary) -> ReportResult<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}

// ==========================================
// 库存消耗分析系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv) / SQLite 数据表
// ==========================================

use crate::db::{open_sqlite_connection, table_exists};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::record_source_trait::{FileParser, RawRow};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use rusqlite::types::ValueRef;
use std::fs::File;
use std::path::{Path, PathBuf};

/// 支持的文件扩展名（按优先级）
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 表头与数据行组装为 RawRow, 跳过完全空白的行
fn push_row<I>(headers: &[String], values: I, records: &mut Vec<RawRow>)
where
    I: Iterator<Item = String>,
{
    let mut row_map = RawRow::new();
    for (col_idx, value) in values.enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if !header.is_empty() {
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }
    }
    if row_map.values().all(|v| v.is_empty()) {
        return;
    }
    records.push(row_map);
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            push_row(&headers, record.iter().map(str::to_string), &mut records);
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// 单元格 → 文本; 整数值浮点去掉 ".0"
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => ndt.date().format("%Y-%m-%d").to_string(),
            None => cell.to_string(),
        },
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut records = Vec::new();
        for data_row in rows {
            push_row(&headers, data_row.iter().map(cell_to_string), &mut records);
        }

        Ok(records)
    }
}

// ==========================================
// SQLite 数据表解析器
// ==========================================
pub struct SqliteTableParser {
    db_path: PathBuf,
}

impl SqliteTableParser {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// 读取整张表为原始行记录
    ///
    /// 表名仅允许字母/数字/下划线
    pub fn parse_table(&self, table: &str) -> ImportResult<Vec<RawRow>> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ImportError::InvalidTableName(table.to_string()));
        }
        ensure_exists(&self.db_path)?;

        let conn = open_sqlite_connection(&self.db_path.to_string_lossy())?;
        if !table_exists(&conn, table)? {
            return Err(ImportError::TableNotFound(table.to_string()));
        }

        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", table))?;
        let headers: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = headers.len();

        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(value_to_string(row.get_ref(idx)?));
            }
            push_row(&headers, values.into_iter(), &mut records);
        }

        Ok(records)
    }
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(_) => String::new(),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_raw_records(path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// 在目录中按表名查找数据文件（如 inventory.csv / inventory.xlsx）
    pub fn locate(dir: &Path, table: &str) -> Option<PathBuf> {
        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", table, ext)))
            .find(|p| p.is_file())
    }
}

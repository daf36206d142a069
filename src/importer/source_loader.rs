// ==========================================
// 库存消耗分析系统 - 并行数据源加载器
// ==========================================
// 职责: 并行读取库存/用量/需求三张表, 汇合后组装 SkuRecord
// 并发: 每张表一个阻塞任务 (spawn_blocking), join_all 作为屏障
// 红线: 屏障处返回第一个读取错误, 其余错误仅记录日志
// ==========================================

use crate::config::DEFAULT_LOOKBACK_MONTHS;
use crate::db::{open_sqlite_connection, table_exists};
use crate::domain::sku::SkuRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapper, TABLE_DEMAND, TABLE_INVENTORY, TABLE_USAGE};
use crate::importer::file_parser::{SqliteTableParser, UniversalFileParser};
use crate::importer::record_assembler::{LoadOutcome, RecordAssembler};
use crate::importer::record_source_trait::{RawRow, RecordSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

// ==========================================
// TableLocator - 单张源表位置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum TableLocator {
    /// CSV / Excel 文件
    File(PathBuf),
    /// SQLite 数据表
    Sqlite { db_path: PathBuf, table: String },
}

impl TableLocator {
    /// 读取整张表（阻塞）
    pub fn read(&self) -> ImportResult<Vec<RawRow>> {
        match self {
            TableLocator::File(path) => UniversalFileParser.parse(path),
            TableLocator::Sqlite { db_path, table } => {
                SqliteTableParser::new(db_path.clone()).parse_table(table)
            }
        }
    }

    /// 首个数据行的行号（文件含表头, 数据自第 2 行起）
    fn first_row_number(&self) -> usize {
        match self {
            TableLocator::File(_) => 2,
            TableLocator::Sqlite { .. } => 1,
        }
    }
}

// ==========================================
// ParallelSourceLoader
// ==========================================
#[derive(Debug, Clone)]
pub struct ParallelSourceLoader {
    inventory: TableLocator,
    usage: Option<TableLocator>,
    demand: Option<TableLocator>,
    as_of: NaiveDate,
    lookback_months: u32,
}

impl ParallelSourceLoader {
    pub fn new(
        inventory: TableLocator,
        usage: Option<TableLocator>,
        demand: Option<TableLocator>,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            inventory,
            usage,
            demand,
            as_of,
            lookback_months: DEFAULT_LOOKBACK_MONTHS,
        }
    }

    /// 用量月份网格的回看月数（应与引擎配置一致）
    pub fn with_lookback_months(mut self, lookback_months: u32) -> Self {
        self.lookback_months = lookback_months;
        self
    }

    /// 从目录加载: inventory.* 必需, usage.* / demand.* 可缺省
    pub fn from_directory(dir: &Path, as_of: NaiveDate) -> ImportResult<Self> {
        if !dir.is_dir() {
            return Err(ImportError::FileNotFound(dir.display().to_string()));
        }

        let inventory = UniversalFileParser::locate(dir, TABLE_INVENTORY).ok_or_else(|| {
            ImportError::FileNotFound(dir.join("inventory.{csv,xlsx,xls}").display().to_string())
        })?;

        let optional = |table: &str| {
            let found = UniversalFileParser::locate(dir, table);
            if found.is_none() {
                warn!(dir = %dir.display(), table = table, "数据文件缺失, 按空表处理");
            }
            found.map(TableLocator::File)
        };

        Ok(Self::new(
            TableLocator::File(inventory),
            optional(TABLE_USAGE),
            optional(TABLE_DEMAND),
            as_of,
        ))
    }

    /// 从 SQLite 库加载: inventory 表必需, usage / demand 表可缺省
    pub fn from_sqlite(db_path: &Path, as_of: NaiveDate) -> ImportResult<Self> {
        if !db_path.is_file() {
            return Err(ImportError::FileNotFound(db_path.display().to_string()));
        }
        let conn = open_sqlite_connection(&db_path.to_string_lossy())?;

        let locator = |table: &str| TableLocator::Sqlite {
            db_path: db_path.to_path_buf(),
            table: table.to_string(),
        };

        if !table_exists(&conn, TABLE_INVENTORY)? {
            return Err(ImportError::TableNotFound(TABLE_INVENTORY.to_string()));
        }

        let mut optional = Vec::with_capacity(2);
        for table in [TABLE_USAGE, TABLE_DEMAND] {
            if table_exists(&conn, table)? {
                optional.push(Some(locator(table)));
            } else {
                warn!(db = %db_path.display(), table = table, "数据表缺失, 按空表处理");
                optional.push(None);
            }
        }
        let demand = optional.pop().flatten();
        let usage = optional.pop().flatten();

        Ok(Self::new(locator(TABLE_INVENTORY), usage, demand, as_of))
    }

    fn mapped<T>(
        rows: Vec<RawRow>,
        locator: Option<&TableLocator>,
        map: impl Fn(&RawRow, usize) -> ImportResult<T>,
    ) -> ImportResult<Vec<T>> {
        let first = locator.map(TableLocator::first_row_number).unwrap_or(1);
        rows.iter()
            .enumerate()
            .map(|(idx, row)| map(row, first + idx))
            .collect()
    }
}

#[async_trait]
impl RecordSource for ParallelSourceLoader {
    #[instrument(skip(self), fields(as_of = %self.as_of))]
    async fn load_records(&self) -> ImportResult<LoadOutcome> {
        let specs = [
            (TABLE_INVENTORY, Some(self.inventory.clone())),
            (TABLE_USAGE, self.usage.clone()),
            (TABLE_DEMAND, self.demand.clone()),
        ];

        let tasks = specs.into_iter().map(|(table, locator)| async move {
            let rows = match locator {
                None => Vec::new(),
                Some(locator) => tokio::task::spawn_blocking(move || locator.read()).await??,
            };
            info!(table = table, rows = rows.len(), "数据表读取完成");
            Ok::<Vec<RawRow>, ImportError>(rows)
        });

        // 屏障: 三张表全部读完再继续
        let results = join_all(tasks).await;

        let mut tables = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (table, result) in [TABLE_INVENTORY, TABLE_USAGE, TABLE_DEMAND]
            .into_iter()
            .zip(results)
        {
            match result {
                Ok(rows) => tables.push(rows),
                Err(err) => {
                    error!(table = table, error = %err, "数据表读取失败");
                    first_error.get_or_insert(err);
                    tables.push(Vec::new());
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let demand_rows = tables.pop().unwrap_or_default();
        let usage_rows = tables.pop().unwrap_or_default();
        let inventory_rows = tables.pop().unwrap_or_default();

        let mapper = FieldMapper;
        let inventory = Self::mapped(inventory_rows, Some(&self.inventory), |r, n| {
            mapper.map_inventory(r, n)
        })?;
        let usage = Self::mapped(usage_rows, self.usage.as_ref(), |r, n| mapper.map_usage(r, n))?;
        let demand =
            Self::mapped(demand_rows, self.demand.as_ref(), |r, n| mapper.map_demand(r, n))?;

        let outcome = RecordAssembler::new(self.as_of, self.lookback_months).assemble(inventory, usage, demand);
        info!(
            records = outcome.records.len(),
            rejected = outcome.rejected_count(),
            orphan_usage = outcome.orphan_usage_rows,
            orphan_demand = outcome.orphan_demand_rows,
            "数据源加载完成"
        );
        Ok(outcome)
    }
}

// ==========================================
// MemorySource - 已组装好的记录（嵌入调用方使用）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<SkuRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<SkuRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn load_records(&self) -> ImportResult<LoadOutcome> {
        Ok(LoadOutcome {
            records: self.records.clone(),
            ..Default::default()
        })
    }
}

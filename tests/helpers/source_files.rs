// ==========================================
// 测试数据文件 - 三张源表 CSV
// ==========================================

use std::path::Path;
use tempfile::TempDir;

pub const INVENTORY_CSV: &str = "\
sku,on_hand,status,buyer,family,lead_time_days,poc,unit_cost
A100,120,A,,RAW,60,100,2.5
B200,50,A,B01,RAW,30,100,
,15,A,,RAW,30,100,9
H300,40,H,,FG,30,100,4
";

pub const DEMAND_CSV: &str = "\
sku,order_id,quantity,due_date,opened_on
A100,WO-1,30,2026-02-20,2025-11-02
H300,WO-9,10,2025-12-01,2025-10-15
ZZZ,WO-0,5,2026-03-01,
";

/// 2025-01 ~ 2025-12 的用量行: A100 每月 10, B200 每月 0, H300 每月 5
pub fn usage_csv() -> String {
    let mut text = String::from("sku,period,quantity\n");
    for month in 1..=12 {
        text.push_str(&format!("A100,2025-{:02},10\n", month));
        text.push_str(&format!("B200,2025-{:02},0\n", month));
        text.push_str(&format!("H300,2025-{:02},5\n", month));
    }
    text.push_str("GHOST,2025-06,3\n");
    text
}

/// 在临时目录写出 inventory.csv / usage.csv / demand.csv
pub fn write_source_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "inventory.csv", INVENTORY_CSV);
    write(dir.path(), "usage.csv", &usage_csv());
    write(dir.path(), "demand.csv", DEMAND_CSV);
    dir
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

// ==========================================
// 集成测试公共辅助
// ==========================================

#![allow(dead_code)]

pub mod sku_builder;
pub mod source_files;

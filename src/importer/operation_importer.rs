// ==========================================
// 服装流水线平衡系统 - 工序导入器
// ==========================================
// 流程: 文件解析 → 字段映射 → 去重 → 按顺序重新编号
// 规则:
// - 单行映射失败不终止导入，记录为警告并跳过该行
// - 重复ID追加行号后缀
// - 全部行无效时报 NoOperations
// ==========================================

use crate::domain::operation::{reindex_operations, Operation};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, instrument, warn};

/// 导入警告（行级）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportWarning {
    pub row: usize,
    pub message: String,
}

/// 导入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationImportOutcome {
    pub operations: Vec<Operation>,
    pub warnings: Vec<ImportWarning>,
    pub total_rows: usize,
}

pub struct OperationImporter {
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl OperationImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    /// 从文件导入工序
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<OperationImportOutcome> {
        let records = self.parser.parse(file_path.as_ref())?;
        let outcome = self.import_records(&records)?;
        info!(
            operations = outcome.operations.len(),
            warnings = outcome.warnings.len(),
            "工序导入完成"
        );
        Ok(outcome)
    }

    /// 从已解析的行记录导入工序
    pub fn import_records(&self, records: &[HashMap<String, String>]) -> ImportResult<OperationImportOutcome> {
        let mut operations = Vec::with_capacity(records.len());
        let mut warnings = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for (idx, record) in records.iter().enumerate() {
            let row_number = idx + 1;
            match self.mapper.map_to_operation(record, row_number) {
                Ok(mut op) => {
                    if !seen_ids.insert(op.id.clone()) {
                        let renamed = unique_id(&op.id, row_number, &seen_ids);
                        warnings.push(ImportWarning {
                            row: row_number,
                            message: format!("工序ID重复: {}，已改为 {}", op.id, renamed),
                        });
                        seen_ids.insert(renamed.clone());
                        op.id = renamed;
                    }
                    operations.push(op);
                }
                Err(e) => {
                    warn!(row = row_number, error = %e, "跳过无效行");
                    warnings.push(ImportWarning {
                        row: row_number,
                        message: e.to_string(),
                    });
                }
            }
        }

        if operations.is_empty() {
            return Err(ImportError::NoOperations);
        }

        reindex_operations(&mut operations);

        Ok(OperationImportOutcome {
            operations,
            warnings,
            total_rows: records.len(),
        })
    }
}

/// 重复ID追加行号后缀；后缀仍冲突时继续追加序号
fn unique_id(id: &str, row_number: usize, taken: &HashSet<String>) -> String {
    let base = format!("{}-{}", id, row_number);
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

impl Default for OperationImporter {
    fn default() -> Self {
        Self::new()
    }
}

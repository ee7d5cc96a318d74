// ==========================================
// 服装流水线平衡系统 - 机器目录导入器
// ==========================================
// 流程: 文件解析 → 字段映射 → 按ID合并
// 规则:
// - 单行映射失败记录为警告并跳过
// - 同一ID出现多次时后出现的行覆盖先前的行（保留首次出现的位置）
// - 全部行无效时报 NoMachines
// ==========================================

use crate::domain::machine::Machine;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use crate::importer::operation_importer::ImportWarning;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument, warn};

/// 机器目录导入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineImportOutcome {
    pub machines: Vec<Machine>,
    pub warnings: Vec<ImportWarning>,
    pub total_rows: usize,
}

pub struct MachineImporter {
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl MachineImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<MachineImportOutcome> {
        let records = self.parser.parse(file_path.as_ref())?;
        let outcome = self.import_records(&records)?;
        info!(
            machines = outcome.machines.len(),
            warnings = outcome.warnings.len(),
            "机器目录导入完成"
        );
        Ok(outcome)
    }

    pub fn import_records(&self, records: &[RawRecord]) -> ImportResult<MachineImportOutcome> {
        let mut machines: Vec<Machine> = Vec::with_capacity(records.len());
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut warnings = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let row_number = idx + 1;
            match self.mapper.map_to_machine(record, row_number) {
                Ok(machine) => match position.get(&machine.id) {
                    Some(&existing) => {
                        warnings.push(ImportWarning {
                            row: row_number,
                            message: format!("机器ID重复: {}，以本行为准", machine.id),
                        });
                        machines[existing] = machine;
                    }
                    None => {
                        position.insert(machine.id.clone(), machines.len());
                        machines.push(machine);
                    }
                },
                Err(e) => {
                    warn!(row = row_number, error = %e, "跳过无效机器行");
                    warnings.push(ImportWarning {
                        row: row_number,
                        message: e.to_string(),
                    });
                }
            }
        }

        if machines.is_empty() {
            return Err(ImportError::NoMachines);
        }

        Ok(MachineImportOutcome {
            machines,
            warnings,
            total_rows: records.len(),
        })
    }
}

impl Default for MachineImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_duplicate_machine_id_keeps_last_row_in_first_position() {
        let records = vec![
            create_row(&[("code", "PIQ"), ("nom", "Piqueuse"), ("vitesse", "4000")]),
            create_row(&[("code", "SUR"), ("nom", "Surjeteuse")]),
            create_row(&[("code", "PIQ"), ("nom", "Piqueuse plate"), ("vitesse", "4500")]),
        ];

        let outcome = MachineImporter::new().import_records(&records).unwrap();

        assert_eq!(outcome.machines.len(), 2);
        assert_eq!(outcome.machines[0].name, "Piqueuse plate");
        assert_eq!(outcome.machines[0].speed, Some(4500.0));
        assert_eq!(outcome.machines[1].id, "SUR");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].row, 3);
    }

    #[test]
    fn test_all_rows_invalid() {
        let records = vec![create_row(&[("vitesse", "4000")])];
        let err = MachineImporter::new().import_records(&records).unwrap_err();
        assert!(matches!(err, ImportError::NoMachines));
    }
}

// ==========================================
// 服装流水线平衡系统 - 工序导入层
// ==========================================
// 职责: 工序表 (CSV / Excel) → Operation 列表；机器目录表 → Machine 列表
// 红线: 导入不计算工时，只做映射与编号
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod machine_importer;
pub mod operation_importer;

pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use machine_importer::{MachineImportOutcome, MachineImporter};
pub use operation_importer::{ImportWarning, OperationImportOutcome, OperationImporter};

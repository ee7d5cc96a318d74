// ==========================================
// 服装流水线平衡系统 - 导入错误类型
// ==========================================
// 说明: 单行映射错误不终止导入，由导入器转为告警；
//       文件级错误（找不到/格式/解析）直接返回
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件级 =====
    #[error("导入文件不存在: {0}")]
    FileNotFound(String),

    #[error("导入文件格式不支持: {0}（可用 .xlsx / .xls / .csv）")]
    UnsupportedFormat(String),

    #[error("导入文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作簿为空: {0}")]
    EmptyWorkbook(String),

    // ===== 行级 =====
    #[error("第 {row} 行无法映射: {message}")]
    FieldMappingError { row: usize, message: String },

    #[error("第 {row} 行字段 {field} 取值非法: {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("工序表中没有可用的工序行")]
    NoOperations,

    #[error("机器目录表中没有可用的机器行")]
    NoMachines,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

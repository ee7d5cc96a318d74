// ==========================================
// 服装流水线平衡系统 - 导入文件解析
// ==========================================
// 支持: Excel (.xlsx/.xls，取第一个工作表) / CSV (逗号或分号分隔)
// 输出: 行记录 HashMap<列名, 值>，值已去首尾空白，空白行跳过
// 说明: 同名列只保留第一列（工艺表常见重复的"备注"列）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

/// 原始行记录
pub type RawRecord = HashMap<String, String>;

/// 文件解析 Trait
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 值>）
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>>;
}

/// 文件存在且扩展名在允许列表内
fn check_file(path: &Path, allowed: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let ext = extension_of(path);
    if allowed.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFormat(ext))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 表头 + 数据行 → 行记录
fn assemble_records<R, C>(headers: &[String], rows: R) -> Vec<RawRecord>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = String>,
{
    let mut records = Vec::new();
    for row in rows {
        let mut record = RawRecord::new();
        for (header, value) in headers.iter().zip(row) {
            if header.is_empty() {
                continue;
            }
            record.entry(header.clone()).or_insert_with(|| value.trim().to_string());
        }
        if record.values().any(|v| !v.is_empty()) {
            records.push(record);
        }
    }
    records
}

// ==========================================
// CSV Parser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 根据表头行判断分隔符（法文 Excel 导出常用分号）
    fn detect_delimiter(content: &str) -> u8 {
        let header = content.lines().next().unwrap_or("");
        if header.matches(';').count() > header.matches(',').count() {
            b';'
        } else {
            b','
        }
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        check_file(file_path, &["csv"])?;

        let content = std::fs::read_to_string(file_path)?;
        let content = content.trim_start_matches('\u{feff}');
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(Self::detect_delimiter(content))
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let rows = reader
            .records()
            .map(|row| row.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assemble_records(&headers, rows))
    }
}

// ==========================================
// Excel Parser
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        check_file(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::EmptyWorkbook(file_path.display().to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| ImportError::EmptyWorkbook(format!("{} / {}", file_path.display(), sheet_name)))?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let data = rows.map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        Ok(assemble_records(&headers, data))
    }
}

// ==========================================
// 按扩展名分派
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRecord>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_raw_records(path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn create_csv(content: &str) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = create_csv("ordre,machine,longueur\n1,Piqueuse,120\n2,Surjeteuse,80\n");

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("machine"), Some(&"Piqueuse".to_string()));
        assert_eq!(records[1].get("longueur"), Some(&"80".to_string()));
    }

    #[test]
    fn test_csv_parser_semicolon_delimiter() {
        let temp_file = create_csv("ordre;machine;longueur\n1;Piqueuse;12,5\n");

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("longueur"), Some(&"12,5".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_records(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skips_blank_rows_and_duplicate_columns() {
        let temp_file = create_csv("ordre,machine,remarque,remarque\n1,Piqueuse,a,b\n,,,\n2,Surjeteuse,,c\n");

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("remarque"), Some(&"a".to_string()));
        assert_eq!(records[1].get("remarque"), Some(&"".to_string()));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser.parse("gamme.txt");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}

// ==========================================
// 服装流水线平衡系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 工序 / 机器目录字段映射 + 类型转换
// 规则:
// - 列名不区分大小写/重音，空格与连字符视为下划线
// - 数值接受小数逗号（"12,5" = 12.5）
// - 空值视为缺失（取默认值）
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::operation::Operation;
use crate::engine::keyword_matcher::normalize;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

// ===== 列名别名（归一化后） =====
const ID_ALIASES: &[&str] = &["id", "ref", "reference", "code_operation"];
const ORDER_ALIASES: &[&str] = &["ordre", "order", "sequence", "seq", "num", "no"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "designation", "libelle", "operation"];
const MACHINE_ID_ALIASES: &[&str] = &["machine_id", "id_machine", "code_machine"];
const MACHINE_NAME_ALIASES: &[&str] = &["machine", "machine_name", "nom_machine", "type_machine"];
const LENGTH_ALIASES: &[&str] = &["longueur", "length", "long", "longueur_cm"];
const STITCH_ALIASES: &[&str] = &["pas", "pas_mm", "stitch_length", "stitch_length_mm", "pas_de_point"];
const RPM_ALIASES: &[&str] = &["rpm", "vitesse", "speed", "tr_min"];
const SPEED_FACTOR_ALIASES: &[&str] = &["coef_vitesse", "speed_factor"];
const GUIDE_FACTOR_ALIASES: &[&str] = &["coef_guide", "guide_factor", "guidage"];
const END_PRECISION_ALIASES: &[&str] = &["precision_fin", "end_precision", "end_precision_constant"];
const START_STOP_ALIASES: &[&str] = &["arret_depart", "start_stop", "start_stop_constant"];
const MAJORATION_ALIASES: &[&str] = &["majoration", "allowance"];
const MANUAL_TIME_ALIASES: &[&str] = &["temps_manuel", "manual_time", "manual_time_override"];
const FORCED_TIME_ALIASES: &[&str] = &["temps_force", "forced_time"];
const GROUP_ALIASES: &[&str] = &["groupe", "group", "group_id"];

// ===== 机器目录列名别名 =====
const CATALOG_ID_ALIASES: &[&str] = &["id", "machine_id", "code", "code_machine"];
const CATALOG_NAME_ALIASES: &[&str] = &["nom", "name", "machine", "designation", "libelle"];
const CATALOG_CLASS_ALIASES: &[&str] = &["classe", "class", "categorie", "famille", "type"];
const CATALOG_SPEED_ALIASES: &[&str] = &["vitesse", "speed", "rpm", "tr_min"];
const CATALOG_COFS_ALIASES: &[&str] = &["cofs", "coef", "majoration", "allowance"];

pub struct FieldMapper;

impl FieldMapper {
    /// 映射一行记录为工序
    ///
    /// # 参数
    /// - row: 原始行（列名 → 值）
    /// - row_number: 源文件行号（从 1 开始，不含表头），同时作为缺省顺序
    pub fn map_to_operation(&self, row: &HashMap<String, String>, row_number: usize) -> ImportResult<Operation> {
        let row = normalize_row(row);

        let machine_id = get_string(&row, MACHINE_ID_ALIASES);
        let machine_name = get_string(&row, MACHINE_NAME_ALIASES);
        if machine_id.is_none() && machine_name.is_none() && get_string(&row, LENGTH_ALIASES).is_none() {
            return Err(ImportError::FieldMappingError {
                row: row_number,
                message: "缺少机器与长度".to_string(),
            });
        }

        let order = match parse_f64(&row, ORDER_ALIASES, "ordre", row_number)? {
            Some(v) if v >= 1.0 => v.round() as u32,
            Some(v) => {
                return Err(ImportError::TypeConversionError {
                    row: row_number,
                    field: "ordre".to_string(),
                    message: format!("顺序必须 >= 1: {}", v),
                })
            }
            None => row_number as u32,
        };

        let mut op = Operation::new(
            get_string(&row, ID_ALIASES).unwrap_or_else(|| format!("OP{}", row_number)),
            order,
            "",
            parse_f64(&row, LENGTH_ALIASES, "longueur", row_number)?.unwrap_or(0.0),
        );
        op.machine_name = machine_name;
        op.machine_id = machine_id;
        op.description = get_string(&row, DESCRIPTION_ALIASES).unwrap_or_default();
        op.stitch_length_mm = parse_f64(&row, STITCH_ALIASES, "pas", row_number)?;
        op.rpm = parse_f64(&row, RPM_ALIASES, "rpm", row_number)?;
        op.speed_factor = parse_f64(&row, SPEED_FACTOR_ALIASES, "coef_vitesse", row_number)?;
        op.guide_factor = parse_f64(&row, GUIDE_FACTOR_ALIASES, "coef_guide", row_number)?;
        op.end_precision_constant = parse_f64(&row, END_PRECISION_ALIASES, "precision_fin", row_number)?;
        op.start_stop_constant = parse_f64(&row, START_STOP_ALIASES, "arret_depart", row_number)?;
        op.majoration = parse_f64(&row, MAJORATION_ALIASES, "majoration", row_number)?;
        op.manual_time_override = parse_f64(&row, MANUAL_TIME_ALIASES, "temps_manuel", row_number)?;
        op.forced_time = parse_f64(&row, FORCED_TIME_ALIASES, "temps_force", row_number)?;
        op.group_id = get_string(&row, GROUP_ALIASES);
        Ok(op)
    }

    /// 映射一行机器目录记录
    ///
    /// 名称必填；ID 缺省为 M{行号}；数值参数缺省留空（计算时取默认值）
    pub fn map_to_machine(&self, row: &HashMap<String, String>, row_number: usize) -> ImportResult<Machine> {
        let row = normalize_row(row);

        let name = get_string(&row, CATALOG_NAME_ALIASES).ok_or_else(|| ImportError::FieldMappingError {
            row: row_number,
            message: "缺少机器名称".to_string(),
        })?;

        let mut machine = Machine::new(
            get_string(&row, CATALOG_ID_ALIASES).unwrap_or_else(|| format!("M{}", row_number)),
            name,
        );
        machine.class = get_string(&row, CATALOG_CLASS_ALIASES);
        machine.speed = parse_f64(&row, CATALOG_SPEED_ALIASES, "vitesse", row_number)?;
        machine.speed_factor = parse_f64(&row, SPEED_FACTOR_ALIASES, "coef_vitesse", row_number)?;
        machine.cofs = parse_f64(&row, CATALOG_COFS_ALIASES, "cofs", row_number)?;
        Ok(machine)
    }
}

/// 列名归一化: 小写、去重音，空格/连字符/点 → 下划线（连续下划线合并）
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    for c in normalize(header).chars() {
        match c {
            ' ' | '-' | '.' | '_' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
            '(' | ')' | '°' => {}
            _ => out.push(c),
        }
    }
    out.trim_matches('_').to_string()
}

/// 数值解析（接受小数逗号）
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };
    candidate.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_row(row: &HashMap<String, String>) -> HashMap<String, String> {
    row.iter()
        .map(|(k, v)| (normalize_header(k), v.trim().to_string()))
        .collect()
}

/// 按别名顺序取第一个非空值
fn get_string(row: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|v| !v.is_empty())
        .cloned()
}

fn parse_f64(
    row: &HashMap<String, String>,
    aliases: &[&str],
    field: &str,
    row_number: usize,
) -> ImportResult<Option<f64>> {
    match get_string(row, aliases) {
        None => Ok(None),
        Some(value) => parse_decimal(&value)
            .map(Some)
            .ok_or_else(|| ImportError::TypeConversionError {
                row: row_number,
                field: field.to_string(),
                message: format!("无法解析为数值: {}", value),
            }),
    }
}

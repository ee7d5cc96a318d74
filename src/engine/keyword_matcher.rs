// ==========================================
// 服装流水线平衡系统 - 机器关键字匹配
// ==========================================
// 职责: 机器分类 / 机器引用解析 / 标准时间条目匹配 / 机器标签归一化
// 说明: 启发式字符串匹配集中在此处，数值核心只消费匹配结果
// ==========================================
// 关键字表（归一化后：小写、去重音）:
// - 手工: 名称等于 "man"，或包含 "manuel" / "manual"
// - 计件: button/bouton, bartack/tack/bride, hole, eyelet/oeillet, pose
// - 其余且额定转速 > 0: 连续缝
// 标准时间条目匹配: 得分 >= MIN_MATCH_SCORE 才采纳，同分取表中靠前者
// ==========================================

use crate::domain::machine::{Machine, MANUAL_MACHINE_NAME};
use crate::domain::operation::Operation;
use crate::domain::standard_time::StandardTimeEntry;
use crate::domain::types::{CounterFamily, MachineKind};

/// 标准时间条目最低匹配得分
pub const MIN_MATCH_SCORE: u32 = 1;

/// 参与匹配的最短词长
const MIN_TOKEN_LEN: usize = 3;

/// 名称/类别包含匹配时，被包含一方的最短长度
const MIN_CONTAINED_LEN: usize = 4;

/// 手工机器关键字（包含即命中）
const MANUAL_KEYWORDS: &[&str] = &["manuel", "manual"];

/// 计件机器关键字表（按顺序匹配，先命中者优先）
const COUNTER_KEYWORDS: &[(CounterFamily, &[&str])] = &[
    (CounterFamily::Button, &["button", "bouton"]),
    (CounterFamily::Bartack, &["bartack", "tack", "bride"]),
    (CounterFamily::Hole, &["hole"]),
    (CounterFamily::Eyelet, &["eyelet", "oeillet"]),
    (CounterFamily::Pose, &["pose"]),
];

// ==========================================
// Trait: MachineMatcher
// ==========================================
// 用途: 标准工时计算器与工序平衡器的匹配接口
pub trait MachineMatcher {
    /// 按名称与额定转速分类
    fn classify(&self, machine_name: &str, nominal_speed_rpm: f64) -> MachineKind;

    /// 解析工序的机器引用（ID → 名称/类别），无法解析时返回 None
    fn resolve_machine<'a>(&self, operation: &Operation, catalog: &'a [Machine]) -> Option<&'a Machine>;

    /// 为计件机器选取最匹配的标准时间条目
    fn best_standard_time<'a>(
        &self,
        machine_name: &str,
        table: &'a [StandardTimeEntry],
    ) -> Option<&'a StandardTimeEntry>;

    /// 机器标签归一化（空白/手工变体统一为 "MAN"）
    fn normalize_machine_label(&self, label: &str) -> String;
}

// ==========================================
// KeywordMatcher - 关键字匹配实现
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher;

impl KeywordMatcher {
    pub fn new() -> Self {
        Self
    }

    /// 是否为手工机器名称
    pub fn is_manual_name(&self, name: &str) -> bool {
        let normalized = normalize(name);
        normalized.is_empty()
            || normalized == MANUAL_MACHINE_NAME.to_lowercase()
            || MANUAL_KEYWORDS.iter().any(|kw| normalized.contains(kw))
    }

    /// 计件机器族（无命中返回 None）
    pub fn counter_family(&self, name: &str) -> Option<CounterFamily> {
        let normalized = normalize(name);
        COUNTER_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| normalized.contains(kw)))
            .map(|(family, _)| *family)
    }

    /// 机器名与条目名称的关键字重叠得分
    ///
    /// 规则:
    /// - 每个机器名词语若与条目词语相等或互相包含（较短者 >= 4 字符）: +1
    /// - 两者归一化后完全相等: +2
    /// - 两者属于同一计件机器族: +1
    pub fn match_score(&self, machine_name: &str, label: &str) -> u32 {
        let machine_norm = normalize(machine_name);
        let label_norm = normalize(label);
        if machine_norm.is_empty() || label_norm.is_empty() {
            return 0;
        }

        let machine_tokens = tokens(&machine_norm);
        let label_tokens = tokens(&label_norm);

        let mut score = machine_tokens
            .iter()
            .filter(|t| {
                label_tokens.iter().any(|l| {
                    l == *t
                        || (l.len() >= 4 && t.contains(l.as_str()))
                        || (t.len() >= 4 && l.contains(t.as_str()))
                })
            })
            .count() as u32;

        if machine_norm == label_norm {
            score += 2;
        }

        if let (Some(a), Some(b)) = (self.counter_family(machine_name), self.counter_family(label)) {
            if a == b {
                score += 1;
            }
        }

        score
    }
}

impl MachineMatcher for KeywordMatcher {
    fn classify(&self, machine_name: &str, nominal_speed_rpm: f64) -> MachineKind {
        // 手工优先于计件关键字
        if self.is_manual_name(machine_name) {
            return MachineKind::Manual;
        }
        if let Some(family) = self.counter_family(machine_name) {
            return MachineKind::Counter(family);
        }
        if nominal_speed_rpm > 0.0 && nominal_speed_rpm.is_finite() {
            MachineKind::ContinuousSeam
        } else {
            MachineKind::Manual
        }
    }

    fn resolve_machine<'a>(&self, operation: &Operation, catalog: &'a [Machine]) -> Option<&'a Machine> {
        // 1. 按 ID
        if let Some(id) = operation.machine_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(machine) = catalog.iter().find(|m| m.id.trim().eq_ignore_ascii_case(id)) {
                return Some(machine);
            }
        }

        // 2. 按名称/类别（不区分大小写）
        let reference = normalize(operation.machine_label());
        if reference.is_empty() {
            return None;
        }

        let exact = catalog.iter().find(|m| {
            normalize(&m.name) == reference
                || m.class.as_deref().map(normalize).as_deref() == Some(reference.as_str())
        });
        if exact.is_some() {
            return exact;
        }

        catalog.iter().find(|m| {
            let name_hit = contains_either(&normalize(&m.name), &reference);
            let class_hit = m
                .class
                .as_deref()
                .map(|class| contains_either(&normalize(class), &reference))
                .unwrap_or(false);
            name_hit || class_hit
        })
    }

    fn best_standard_time<'a>(
        &self,
        machine_name: &str,
        table: &'a [StandardTimeEntry],
    ) -> Option<&'a StandardTimeEntry> {
        let mut best: Option<(&StandardTimeEntry, u32)> = None;
        for entry in table {
            let score = self.match_score(machine_name, &entry.label);
            if score < MIN_MATCH_SCORE {
                continue;
            }
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((entry, score)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    fn normalize_machine_label(&self, label: &str) -> String {
        let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.is_manual_name(&collapsed) {
            MANUAL_MACHINE_NAME.to_string()
        } else {
            collapsed
        }
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 归一化: 小写、去除法语重音、压缩空白
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' | 'í' => out.push('i'),
            'ô' | 'ö' | 'ó' => out.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'ç' => out.push('c'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            _ => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 任一方包含另一方（被包含一方长度不足时不计）
fn contains_either(a: &str, b: &str) -> bool {
    (b.chars().count() >= MIN_CONTAINED_LEN && a.contains(b))
        || (a.chars().count() >= MIN_CONTAINED_LEN && b.contains(a))
}

fn tokens(normalized: &str) -> Vec<String> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TimeUnit;

    #[test]
    fn test_classify_manual_takes_precedence() {
        let m = KeywordMatcher::new();
        assert_eq!(m.classify("MAN", 0.0), MachineKind::Manual);
        assert_eq!(m.classify("Pose bouton manuel", 3000.0), MachineKind::Manual);
        assert_eq!(m.classify("", 3000.0), MachineKind::Manual);
    }

    #[test]
    fn test_classify_counter_families() {
        let m = KeywordMatcher::new();
        assert_eq!(
            m.classify("Boutonnière", 2000.0),
            MachineKind::Counter(CounterFamily::Button)
        );
        assert_eq!(
            m.classify("Machine à brides", 2000.0),
            MachineKind::Counter(CounterFamily::Bartack)
        );
        assert_eq!(
            m.classify("Œillet", 0.0),
            MachineKind::Counter(CounterFamily::Eyelet)
        );
    }

    #[test]
    fn test_classify_continuous_requires_speed() {
        let m = KeywordMatcher::new();
        assert_eq!(m.classify("Piqueuse", 4000.0), MachineKind::ContinuousSeam);
        assert_eq!(m.classify("Table de repassage", 0.0), MachineKind::Manual);
    }

    #[test]
    fn test_resolve_by_id_then_name() {
        let m = KeywordMatcher::new();
        let catalog = vec![
            Machine::new("M1", "Piqueuse plate").with_speed(4000.0),
            Machine::new("M2", "Surjeteuse").with_class("OVERLOCK"),
        ];

        let mut op = Operation::new("op", 1, "surjeteuse", 10.0);
        assert_eq!(m.resolve_machine(&op, &catalog).map(|x| x.id.as_str()), Some("M2"));

        op.machine_id = Some("m1".to_string());
        assert_eq!(m.resolve_machine(&op, &catalog).map(|x| x.id.as_str()), Some("M1"));

        let op = Operation::new("op", 1, "piqueuse", 10.0);
        assert_eq!(m.resolve_machine(&op, &catalog).map(|x| x.id.as_str()), Some("M1"));

        let op = Operation::new("op", 1, "overlock", 10.0);
        assert_eq!(m.resolve_machine(&op, &catalog).map(|x| x.id.as_str()), Some("M2"));

        let op = Operation::new("op", 1, "Inconnue", 10.0);
        assert!(m.resolve_machine(&op, &catalog).is_none());
    }

    #[test]
    fn test_best_standard_time() {
        let m = KeywordMatcher::new();
        let table = vec![
            StandardTimeEntry::new("Pose bouton", 5.0, TimeUnit::Sec),
            StandardTimeEntry::new("Boutonnière", 4.0, TimeUnit::Sec),
            StandardTimeEntry::new("Bride", 3.0, TimeUnit::Sec),
        ];
        let hit = m.best_standard_time("Boutonnière", &table).unwrap();
        assert_eq!(hit.label, "Boutonnière");

        let hit = m.best_standard_time("Bartack juki", &table).unwrap();
        assert_eq!(hit.label, "Bride");

        assert!(m.best_standard_time("Piqueuse", &table).is_none());
    }

    #[test]
    fn test_normalize_machine_label() {
        let m = KeywordMatcher::new();
        assert_eq!(m.normalize_machine_label("   "), "MAN");
        assert_eq!(m.normalize_machine_label("Manuel"), "MAN");
        assert_eq!(m.normalize_machine_label(" Piqueuse   plate "), "Piqueuse plate");
    }
}

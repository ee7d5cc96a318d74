// ==========================================
// 仓储层 + 配置管理 集成测试
// ==========================================
// 测试目标: 验证文件数据库上的持久化与跨实例可见性
// 覆盖范围: 机器目录 / 标准时间 / 布局模板 / config_kv
// ==========================================


use garment_line_balancing::config::{config_keys, ConfigManager};
use garment_line_balancing::db::open_sqlite_connection;
use garment_line_balancing::domain::fabric::{FabricPenaltyValues, FabricSettings};
use garment_line_balancing::domain::{
    FabricLevel, LayoutTemplate, LineSettings, Machine, ManualLink, StandardTimeEntry, TimeUnit, Workstation,
};
use garment_line_balancing::repository::{
    LayoutTemplateRepository, MachineCatalogRepository, RepositoryError, StandardTimeRepository,
};
use std::sync::{Arc, Mutex};
use test_helpers::{assert_close, create_piqueuse, create_test_db};

#[test]
fn test_machine_catalog_persists_across_instances() {
    println!("\n=== 测试：机器目录跨实例持久化 ===");

    let (_temp_file, db_path) = create_test_db().unwrap();

    {
        let repo = MachineCatalogRepository::new(&db_path).unwrap();
        let count = repo
            .upsert_batch(&[
                create_piqueuse(),
                Machine::new("M2", "Surjeteuse").with_speed(6000.0).with_cofs(1.15),
            ])
            .unwrap();
        assert_eq!(count, 2);
    }

    let repo = MachineCatalogRepository::new(&db_path).unwrap();
    let machines = repo.list_all().unwrap();
    assert_eq!(machines.len(), 2);
    // 按名称排序
    assert_eq!(machines[0].name, "Piqueuse");
    assert_eq!(machines[1].cofs, Some(1.15));
    assert_eq!(machines[0].speed_factor, None);

    // 覆盖更新
    repo.upsert(&create_piqueuse().with_speed(4500.0)).unwrap();
    assert_eq!(repo.find_by_id("M1").unwrap().unwrap().speed, Some(4500.0));

    assert_eq!(repo.delete("M2").unwrap(), 1);
    assert!(repo.find_by_id("M2").unwrap().is_none());
}

#[test]
fn test_machine_with_blank_id_is_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = MachineCatalogRepository::new(&db_path).unwrap();

    let result = repo.upsert(&Machine::new("  ", "Piqueuse"));
    assert!(result.is_err());
    assert!(repo.list_all().unwrap().is_empty());
}

#[test]
fn test_standard_time_units_round_trip_through_sqlite() {
    println!("\n=== 测试：标准时间单位存取 ===");

    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = StandardTimeRepository::new(&db_path).unwrap();

    repo.upsert(&StandardTimeEntry::new("Bouton", 6.0, TimeUnit::Sec)).unwrap();
    repo.upsert(&StandardTimeEntry::new("Bride", 0.2, TimeUnit::Min)).unwrap();

    let entries = repo.list_all().unwrap();
    assert_eq!(entries.len(), 2);
    let bouton = entries.iter().find(|e| e.label == "Bouton").unwrap();
    assert_eq!(bouton.unit, TimeUnit::Sec);
    assert_close(bouton.minutes(), 0.1);

    let invalid = repo.upsert(&StandardTimeEntry::new("Oeillet", f64::NAN, TimeUnit::Sec));
    assert!(invalid.is_err());
}

#[test]
fn test_repositories_share_one_connection() {
    println!("\n=== 测试：多个仓储共享连接 ===");

    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));

    let machines = MachineCatalogRepository::from_connection(conn.clone()).unwrap();
    let layouts = LayoutTemplateRepository::from_connection(conn.clone()).unwrap();
    let config = ConfigManager::from_connection(conn).unwrap();

    machines.upsert(&create_piqueuse()).unwrap();
    config.set_global_config_value(config_keys::CYCLE_TIME_MIN, "0.75").unwrap();
    layouts
        .save(&LayoutTemplate::new("Ligne A", vec![Workstation::numbered(1, "Piqueuse")], vec![]))
        .unwrap();

    // 独立连接可以看到全部写入
    let other = MachineCatalogRepository::new(&db_path).unwrap();
    assert_eq!(other.list_all().unwrap().len(), 1);
    let other_config = ConfigManager::new(&db_path).unwrap();
    assert_close(other_config.load_line_settings().unwrap().cycle_time_min, 0.75);
    let other_layouts = LayoutTemplateRepository::new(&db_path).unwrap();
    assert_eq!(other_layouts.list().unwrap().len(), 1);
}

#[test]
fn test_layout_template_overwrite_keeps_identity() {
    println!("\n=== 测试：同名布局模板覆盖 ===");

    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = LayoutTemplateRepository::new(&db_path).unwrap();

    let first = repo
        .save(&LayoutTemplate::new("Ligne A", vec![Workstation::numbered(1, "Piqueuse")], vec![]))
        .unwrap();

    let link = ManualLink {
        id: "L1".to_string(),
        from_station_id: "P1".to_string(),
        to_station_id: "P2".to_string(),
        label: Some("navette".to_string()),
    };
    let second = repo
        .save(&LayoutTemplate::new(
            "Ligne A",
            vec![Workstation::numbered(1, "Piqueuse"), Workstation::numbered(2, "MAN")],
            vec![link],
        ))
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.stations.len(), 2);
    assert_eq!(second.links[0].label.as_deref(), Some("navette"));
    assert_eq!(repo.list().unwrap().len(), 1);

    let blank = repo.save(&LayoutTemplate::new("   ", vec![], vec![]));
    assert!(matches!(blank, Err(RepositoryError::FieldValueError { .. })));

    assert_eq!(repo.delete_by_name("Ligne A").unwrap(), 1);
    assert!(repo.find_by_name("Ligne A").unwrap().is_none());
}

#[test]
fn test_config_manager_settings_round_trip() {
    println!("\n=== 测试：配置读写 ===");

    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    // 空库返回默认值
    assert_eq!(config.load_line_settings().unwrap(), LineSettings::default());
    assert_eq!(config.load_fabric_settings().unwrap(), FabricSettings::default());

    let settings = LineSettings {
        cycle_time_min: 0.8,
        headcount: 24,
        presence_time_min: 450.0,
        efficiency_pct: 85.0,
    };
    config.save_line_settings(&settings).unwrap();

    let fabric = FabricSettings {
        enabled: true,
        selected_level: FabricLevel::Hard,
        values: FabricPenaltyValues {
            easy: 0.0,
            medium: 3.0,
            hard: 6.0,
        },
    };
    config.save_fabric_settings(&fabric).unwrap();

    let reopened = ConfigManager::new(&db_path).unwrap();
    assert_eq!(reopened.load_line_settings().unwrap(), settings);
    assert_eq!(reopened.load_fabric_settings().unwrap(), fabric);
}

#[test]
fn test_invalid_config_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    config.set_global_config_value(config_keys::MACHINE_COFS, "abc").unwrap();
    config.set_global_config_value(config_keys::CYCLE_TIME_MIN, "NaN").unwrap();
    config.set_global_config_value(config_keys::GUIDE_FACTOR_OPTIONS, "1.0, x, -2").unwrap();

    assert_close(config.load_time_defaults().unwrap().machine_cofs, 1.12);
    assert_close(config.load_line_settings().unwrap().cycle_time_min, 1.0);
    assert_eq!(config.get_guide_factor_options().unwrap(), vec![1.0]);
}

#[test]
fn test_config_snapshot_restores_into_fresh_database() {
    println!("\n=== 测试：配置快照迁移 ===");

    let (_source_file, source_path) = create_test_db().unwrap();
    let source = ConfigManager::new(&source_path).unwrap();
    source.set_global_config_value(config_keys::CYCLE_TIME_MIN, "0.6").unwrap();
    source.set_global_config_value(config_keys::STATION_TOLERANCE, "1.2").unwrap();
    let snapshot = source.get_config_snapshot().unwrap();

    let (_target_file, target_path) = create_test_db().unwrap();
    let target = ConfigManager::new(&target_path).unwrap();
    let restored = target.restore_config_from_snapshot(&snapshot).unwrap();

    assert_eq!(restored, 2);
    assert_close(target.load_line_settings().unwrap().cycle_time_min, 0.6);
    assert_close(target.load_balancing_config().unwrap().station_tolerance, 1.2);
}

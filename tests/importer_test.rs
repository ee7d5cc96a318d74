// ==========================================
// 工序导入 集成测试
// ==========================================
// 测试目标: 验证 CSV 工序表 → Operation → 流水线
// 覆盖范围: 法文表头、分号分隔、小数逗号、坏行告警、重复ID
// ==========================================


use garment_line_balancing::engine::LinePipeline;
use garment_line_balancing::importer::{ImportError, MachineImporter, OperationImporter};
use test_helpers::{assert_close, create_piqueuse, create_test_inputs, write_csv};

#[test]
fn test_import_french_semicolon_csv() {
    println!("\n=== 测试：导入法文分号 CSV ===");

    let csv = write_csv(
        "\u{feff}Ordre;Désignation;Machine;Longueur (cm);Pas (mm);RPM;Temps forcé\n\
         2;Surpiquer col;Piqueuse;120;4;4000;\n\
         1;Assembler épaules;Surjeteuse;45,5;3,5;;\n\
         3;Contrôle;MAN;;;;0,25\n",
    );

    let outcome = OperationImporter::new().import_file(csv.path()).unwrap();

    assert_eq!(outcome.total_rows, 3);
    assert!(outcome.warnings.is_empty());

    let ops = &outcome.operations;
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].description, "Assembler épaules");
    assert_eq!(ops[0].order, 1);
    assert_close(ops[0].length, 45.5);
    assert_eq!(ops[0].stitch_length_mm, Some(3.5));
    assert_eq!(ops[0].rpm, None);
    assert_eq!(ops[1].machine_name.as_deref(), Some("Piqueuse"));
    assert_eq!(ops[1].rpm, Some(4000.0));
    assert_eq!(ops[2].forced_time, Some(0.25));
    // 缺省ID按源行号生成
    assert_eq!(ops[2].id, "OP3");
}

#[test]
fn test_bad_rows_become_warnings() {
    println!("\n=== 测试：坏行转为告警 ===");

    let csv = write_csv(
        "id,ordre,machine,longueur\n\
         A,1,Piqueuse,80\n\
         B,2,Piqueuse,abc\n\
         A,3,Surjeteuse,60\n\
         ,,,\n\
         C,0,MAN,10\n",
    );

    let outcome = OperationImporter::new().import_file(csv.path()).unwrap();

    // 空白行被解析器跳过
    assert_eq!(outcome.total_rows, 4);
    let ids: Vec<&str> = outcome.operations.iter().map(|op| op.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "A-3"]);
    assert_eq!(outcome.warnings.len(), 3);
    assert!(outcome.warnings.iter().any(|w| w.row == 2));
    assert!(outcome.warnings.iter().any(|w| w.row == 3 && w.message.contains("A-3")));
}

#[test]
fn test_file_without_operations_is_an_error() {
    let csv = write_csv("ordre,commentaire\n1,rien\n");
    let result = OperationImporter::new().import_file(csv.path());
    assert!(matches!(result, Err(ImportError::NoOperations)));
}

#[test]
fn test_unsupported_extension() {
    let result = OperationImporter::new().import_file("gamme.txt");
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}

#[test]
fn test_imported_operations_feed_pipeline() {
    println!("\n=== 测试：导入结果进入流水线 ===");

    let csv = write_csv(
        "ordre,machine,longueur,pas,rpm\n\
         1,Piqueuse,120,4,4000\n\
         2,Piqueuse,120,4,4000\n",
    );
    let outcome = OperationImporter::new().import_file(csv.path()).unwrap();

    let mut inputs = create_test_inputs(outcome.operations, 0.5);
    inputs.machines = vec![create_piqueuse()];
    let snapshot = LinePipeline::default().initialize(inputs);

    for op in &snapshot.inputs.operations {
        assert_close(op.computed_time, 0.787724);
    }
    // 每道工序已超过 1.15 × 节拍，各自成站
    assert_eq!(snapshot.stations.len(), 2);
    assert_eq!(snapshot.total_required_workforce(), 4);
}

#[test]
fn test_import_machine_catalog_csv() {
    println!("\n=== 测试：机器目录 CSV ===");

    let csv = write_csv("\u{feff}Code machine;Désignation;Catégorie;Vitesse;Coef vitesse\n\
                         PIQ;Piqueuse plate;Piqueuse;4500;0,9\n\
                         REC;Recouvreuse;;abc;\n\
                         BAR;Bartack;Bartack;;\n");

    let outcome = MachineImporter::new().import_file(csv.path()).unwrap();

    assert_eq!(outcome.total_rows, 3);
    let ids: Vec<&str> = outcome.machines.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["PIQ", "BAR"]);
    assert_close(outcome.machines[0].speed.unwrap(), 4500.0);
    assert_close(outcome.machines[0].speed_factor.unwrap(), 0.9);
    assert_eq!(outcome.machines[1].class.as_deref(), Some("Bartack"));
    // 第二行转速非法
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].row, 2);
}

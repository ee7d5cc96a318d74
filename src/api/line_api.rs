// ==========================================
// 服装流水线平衡系统 - 产线 API
// ==========================================
// 职责: 持有当前快照，串联 配置/仓储/导入 与 重算流水线
// 规则:
// - 每次变更生成完整新快照后原子替换
// - 先校验（流水线）再持久化，持久化失败时快照不替换
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::fabric::FabricSettings;
use crate::domain::layout::LayoutTemplate;
use crate::domain::line::LineSettings;
use crate::domain::machine::Machine;
use crate::domain::operation::Operation;
use crate::domain::standard_time::StandardTimeEntry;
use crate::domain::types::BalancingMode;
use crate::engine::pipeline::{LineEvent, LineInputs, LinePipeline, LineSnapshot};
use crate::importer::{ImportWarning, MachineImporter, OperationImporter};
use crate::repository::{
    LayoutTemplateRepository, LayoutTemplateSummary, MachineCatalogRepository, StandardTimeRepository,
};

// ==========================================
// DTO 定义
// ==========================================

/// 导入工序响应
#[derive(Debug, Clone, Serialize)]
pub struct ImportOperationsResponse {
    pub imported: usize,
    pub total_rows: usize,
    pub warnings: Vec<ImportWarning>,
    pub snapshot: LineSnapshot,
}

/// 导入机器目录响应
#[derive(Debug, Clone, Serialize)]
pub struct ImportMachinesResponse {
    pub imported: usize,
    pub total_rows: usize,
    pub warnings: Vec<ImportWarning>,
    pub snapshot: LineSnapshot,
}

// ==========================================
// LineApi
// ==========================================

/// 产线 API
///
/// 职责：
/// 1. 工序装载/导入
/// 2. 产线参数、面料、机器目录、标准时间的修改与持久化
/// 3. 自动/手工模式切换与手工编辑
/// 4. 布局模板保存/应用
pub struct LineApi {
    pipeline: LinePipeline,
    state: Mutex<LineSnapshot>,
    config_manager: Arc<ConfigManager>,
    machine_repo: Arc<MachineCatalogRepository>,
    standard_time_repo: Arc<StandardTimeRepository>,
    layout_repo: Arc<LayoutTemplateRepository>,
    importer: OperationImporter,
    machine_importer: MachineImporter,
}

impl LineApi {
    /// 创建新的 LineApi 实例（从配置与仓储加载初始输入）
    pub fn new(
        config_manager: Arc<ConfigManager>,
        machine_repo: Arc<MachineCatalogRepository>,
        standard_time_repo: Arc<StandardTimeRepository>,
        layout_repo: Arc<LayoutTemplateRepository>,
    ) -> ApiResult<Self> {
        let time_defaults = config_manager.load_time_defaults()?;
        let balancing = config_manager.load_balancing_config()?;
        let pipeline = LinePipeline::new(time_defaults, balancing);

        let inputs = LineInputs {
            operations: Vec::new(),
            machines: machine_repo.list_all()?,
            standard_times: standard_time_repo.list_all()?,
            fabric: config_manager.load_fabric_settings()?,
            settings: config_manager.load_line_settings()?,
        };
        info!(
            machines = inputs.machines.len(),
            standard_times = inputs.standard_times.len(),
            cycle_time_min = inputs.settings.cycle_time_min,
            "产线 API 初始化"
        );
        let initial = pipeline.initialize(inputs);

        Ok(Self {
            pipeline,
            state: Mutex::new(initial),
            config_manager,
            machine_repo,
            standard_time_repo,
            layout_repo,
            importer: OperationImporter::new(),
            machine_importer: MachineImporter::new(),
        })
    }

    /// 打开数据库文件并构建全部依赖（共享同一连接）
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        Self::new(
            Arc::new(ConfigManager::from_connection(conn.clone())?),
            Arc::new(MachineCatalogRepository::from_connection(conn.clone())?),
            Arc::new(StandardTimeRepository::from_connection(conn.clone())?),
            Arc::new(LayoutTemplateRepository::from_connection(conn)?),
        )
    }

    fn lock_state(&self) -> ApiResult<MutexGuard<'_, LineSnapshot>> {
        self.state
            .lock()
            .map_err(|e| ApiError::InternalError(format!("快照锁获取失败: {}", e)))
    }

    /// 应用事件；persist 成功后才替换快照
    fn transition<F>(&self, event: LineEvent, persist: F) -> ApiResult<LineSnapshot>
    where
        F: FnOnce(&LineSnapshot) -> ApiResult<()>,
    {
        let mut state = self.lock_state()?;
        let next = self.pipeline.apply(&state, event)?;
        persist(&next)?;
        *state = next.clone();
        Ok(next)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 当前快照（副本）
    pub fn snapshot(&self) -> ApiResult<LineSnapshot> {
        Ok(self.lock_state()?.clone())
    }

    pub fn mode(&self) -> ApiResult<BalancingMode> {
        Ok(self.lock_state()?.mode)
    }

    pub fn guide_factor_options(&self) -> ApiResult<Vec<f64>> {
        Ok(self.config_manager.get_guide_factor_options()?)
    }

    // ==========================================
    // 通用事件入口
    // ==========================================

    /// 应用任意事件（不持久化）
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn apply(&self, event: LineEvent) -> ApiResult<LineSnapshot> {
        self.transition(event, |_| Ok(()))
    }

    // ==========================================
    // 工序
    // ==========================================

    pub fn load_operations(&self, operations: Vec<Operation>) -> ApiResult<LineSnapshot> {
        self.apply(LineEvent::OperationsReplaced(operations))
    }

    /// 从 CSV / Excel 导入工序并替换当前工序表
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_operations<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportOperationsResponse> {
        let outcome = self.importer.import_file(file_path)?;
        let imported = outcome.operations.len();
        let snapshot = self.apply(LineEvent::OperationsReplaced(outcome.operations))?;
        Ok(ImportOperationsResponse {
            imported,
            total_rows: outcome.total_rows,
            warnings: outcome.warnings,
            snapshot,
        })
    }

    // ==========================================
    // 产线参数 / 面料（持久化到 config_kv）
    // ==========================================

    pub fn set_cycle_time(&self, cycle_time_min: f64) -> ApiResult<LineSnapshot> {
        self.transition(LineEvent::CycleTimeChanged(cycle_time_min), |next| {
            Ok(self.config_manager.save_line_settings(&next.inputs.settings)?)
        })
    }

    pub fn set_line_settings(&self, settings: LineSettings) -> ApiResult<LineSnapshot> {
        self.transition(LineEvent::LineSettingsChanged(settings), |next| {
            Ok(self.config_manager.save_line_settings(&next.inputs.settings)?)
        })
    }

    pub fn set_fabric_settings(&self, fabric: FabricSettings) -> ApiResult<LineSnapshot> {
        self.transition(LineEvent::FabricSettingsChanged(fabric), |next| {
            Ok(self.config_manager.save_fabric_settings(&next.inputs.fabric)?)
        })
    }

    // ==========================================
    // 机器目录 / 标准时间（持久化到仓储）
    // ==========================================

    pub fn upsert_machine(&self, machine: Machine) -> ApiResult<LineSnapshot> {
        let to_save = machine.clone();
        self.transition(LineEvent::MachineUpserted(machine), |_| {
            Ok(self.machine_repo.upsert(&to_save)?)
        })
    }

    /// 从 CSV / Excel 导入机器目录（按ID合并入库，未出现的机器保留）
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_machines<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportMachinesResponse> {
        let outcome = self.machine_importer.import_file(file_path)?;
        let imported = self.machine_repo.upsert_batch(&outcome.machines)?;
        let machines = self.machine_repo.list_all()?;
        let snapshot = self.apply(LineEvent::MachinesReplaced(machines))?;
        Ok(ImportMachinesResponse {
            imported,
            total_rows: outcome.total_rows,
            warnings: outcome.warnings,
            snapshot,
        })
    }

    pub fn upsert_standard_time(&self, entry: StandardTimeEntry) -> ApiResult<LineSnapshot> {
        self.standard_time_repo.upsert(&entry)?;
        let entries = self.standard_time_repo.list_all()?;
        self.apply(LineEvent::StandardTimesReplaced(entries))
    }

    // ==========================================
    // 模式切换
    // ==========================================

    pub fn enter_manual_mode(&self) -> ApiResult<LineSnapshot> {
        self.apply(LineEvent::EnterManual)
    }

    pub fn exit_manual_mode(&self) -> ApiResult<LineSnapshot> {
        self.apply(LineEvent::ExitManual)
    }

    // ==========================================
    // 布局模板
    // ==========================================

    /// 以当前布局保存模板（手工模式取可摆放单元，自动模式取工位）
    pub fn save_layout_template(&self, name: &str) -> ApiResult<LayoutTemplate> {
        let snapshot = self.snapshot()?;
        let stations = match snapshot.mode {
            BalancingMode::Manual => snapshot.units.iter().map(|u| u.station.clone()).collect(),
            BalancingMode::Automatic => snapshot.stations.clone(),
        };
        let template = LayoutTemplate::new(name.trim(), stations, snapshot.links);
        let saved = self.layout_repo.save(&template)?;
        info!(name = %saved.name, stations = saved.stations.len(), "布局模板已保存");
        Ok(saved)
    }

    /// 按名称应用模板（需要手工模式）
    pub fn apply_layout_template(&self, name: &str) -> ApiResult<LineSnapshot> {
        let template = self
            .layout_repo
            .find_by_name(name)?
            .ok_or_else(|| ApiError::NotFound(format!("布局模板{}不存在", name)))?;
        self.apply(LineEvent::LayoutApplied {
            stations: template.stations,
            links: template.links,
        })
    }

    pub fn list_layout_templates(&self) -> ApiResult<Vec<LayoutTemplateSummary>> {
        Ok(self.layout_repo.list()?)
    }

    pub fn delete_layout_template(&self, name: &str) -> ApiResult<()> {
        match self.layout_repo.delete_by_name(name)? {
            0 => Err(ApiError::NotFound(format!("布局模板{}不存在", name))),
            _ => Ok(()),
        }
    }
}

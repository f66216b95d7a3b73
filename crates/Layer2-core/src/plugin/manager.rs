//! Plugin Manager - 플러그인 엔진 파사드
//!
//! 발견 → 추출 → 해석 → 스케줄 → 초기화 흐름을 하나의 핸들로 묶습니다.
//! 모든 작업은 `PluginContext`의 run-loop 위에서 실행되며, 엔진 상태는
//! `RefCell` 하나에 모여 있습니다. 플러그인 코드(생성자, 훅, 질의)를
//! 호출하는 동안에는 상태 borrow를 잡지 않습니다.
//!
//! ```ignore
//! let manager = PluginManager::new(ctx, Box::new(ManifestLoader::new(factories)));
//! manager.add_root(builtin_plugins_dir()?, PluginScope::Builtin);
//! manager.load_plugins();
//! run_loop.run().await;
//! ```

use super::alias::AliasIndex;
use super::capacity::CapacityMonitor;
use super::context::PluginContext;
use super::discovery::{DiscoveryTask, PluginScanner, PluginScope};
use super::executor::ExecutorStats;
use super::loader::ModuleLoader;
use super::metadata::PluginRecord;
use super::placement::{PlacedElement, PlacementGateway};
use super::registry::PluginInstanceRegistry;
use super::resolver::{DependencyResolver, RegionRoot, ResolvedDeps};
use super::scheduler::ScheduleDiagnostic;
use super::traits::{Plugin, PluginModule, PluginStatus};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tessera_foundation::{LoaderSettings, Result, SourceId, LOADER_SECTION};
use tracing::info;

// ============================================================================
// Engine - 공유 상태
// ============================================================================

/// 엔진 내부 상태
#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) aliases: AliasIndex,

    /// 모듈 이름 -> 발견 작업 (재로드에 사용)
    pub(crate) tasks: HashMap<String, DiscoveryTask>,

    pub(crate) search_roots: Vec<PathBuf>,

    /// 설정에서 읽은 비활성화 목록 (짧은 이름)
    pub(crate) disabled: Vec<String>,
    pub(crate) disabled_set: HashSet<String>,

    pub(crate) resolved: HashMap<String, ResolvedDeps>,
    pub(crate) schedule_order: Vec<String>,
    pub(crate) diagnostics: Vec<ScheduleDiagnostic>,
    pub(crate) skipped: Vec<SkippedPlugin>,

    pub(crate) instances: PluginInstanceRegistry,
    pub(crate) placement: PlacementGateway,
    pub(crate) statuses: HashMap<String, PluginStatus>,

    /// import 단계 동안 해제를 미루는 거부된 모듈
    pub(crate) deferred: Vec<Rc<dyn PluginModule>>,

    pub(crate) stats: ExecutorStats,
}

/// 엔진 (run-loop 콜백이 공유)
pub(crate) struct Engine {
    pub(crate) ctx: Rc<PluginContext>,
    pub(crate) settings: LoaderSettings,
    pub(crate) scanner: RefCell<PluginScanner>,
    pub(crate) resolver: RefCell<DependencyResolver>,
    pub(crate) loader: RefCell<Box<dyn ModuleLoader>>,
    pub(crate) state: RefCell<EngineState>,
}

impl Engine {
    /// 토큰을 정규 ID로 (모르면 토큰 그대로)
    pub(crate) fn resolve_id(&self, token: &str) -> String {
        self.state
            .borrow()
            .aliases
            .resolve_id(token)
            .unwrap_or(token)
            .to_string()
    }

    pub(crate) fn set_status(&self, id: &str, status: PluginStatus) {
        self.state
            .borrow_mut()
            .statuses
            .insert(id.to_string(), status);
    }
}

// ============================================================================
// 보고용 타입
// ============================================================================

/// 추출 단계에서 건너뛴 모듈
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPlugin {
    pub import_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    pub reason: String,
}

/// 계획의 한 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub id: String,
    pub import_path: String,
    pub placement: String,
    pub priority: i64,
    pub index: i64,
    /// 해석된 의존성 (정규 ID)
    pub deps: Vec<String>,
}

/// 인스턴스 생성 없이 계산한 초기화 계획
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanReport {
    pub order: Vec<PlanEntry>,
    pub diagnostics: Vec<ScheduleDiagnostic>,
    pub skipped: Vec<SkippedPlugin>,
    pub search_roots: Vec<PathBuf>,
}

/// 플러그인 시스템 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginSummary {
    /// 검증을 통과한 플러그인
    pub total: usize,
    pub live: usize,
    pub failed: usize,
    pub unscheduled: usize,
    pub disabled: usize,
    pub skipped: usize,
}

// ============================================================================
// PluginManager
// ============================================================================

/// 플러그인 매니저 - 전체 플러그인 엔진 관리
#[derive(Clone)]
pub struct PluginManager {
    engine: Rc<Engine>,
}

impl PluginManager {
    /// 새 매니저 생성 (`[plugin_loader]` 설정 사용)
    pub fn new(ctx: Rc<PluginContext>, loader: Box<dyn ModuleLoader>) -> Self {
        let settings: LoaderSettings = ctx.config().section(&[LOADER_SECTION]);
        Self::with_settings(ctx, loader, settings)
    }

    /// 설정으로 생성
    pub fn with_settings(
        ctx: Rc<PluginContext>,
        loader: Box<dyn ModuleLoader>,
        settings: LoaderSettings,
    ) -> Self {
        let settings = settings.normalized();
        let engine = Engine {
            scanner: RefCell::new(PluginScanner::new(&settings)),
            resolver: RefCell::new(DependencyResolver::new(settings.strict_dependencies)),
            loader: RefCell::new(loader),
            state: RefCell::new(EngineState::default()),
            settings,
            ctx,
        };
        Self {
            engine: Rc::new(engine),
        }
    }

    /// 리전 루트 교체
    pub fn with_region_roots(self, roots: Vec<RegionRoot>) -> Self {
        let resolver = self.engine.resolver.borrow().clone().with_region_roots(roots);
        *self.engine.resolver.borrow_mut() = resolver;
        self
    }

    /// 플러그인 루트 추가 (추가한 순서대로 스캔)
    pub fn add_root(&self, path: impl Into<PathBuf>, scope: PluginScope) {
        self.engine.scanner.borrow_mut().add_root(path, scope);
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.engine.settings
    }

    pub fn context(&self) -> &Rc<PluginContext> {
        &self.engine.ctx
    }

    // ========================================================================
    // 시작
    // ========================================================================

    /// 스캔 후 import/초기화 단계를 run-loop에 예약하고 용량 모니터를 시작
    pub fn load_plugins(&self) {
        let tasks = self.engine.scan();
        self.engine.start_import(tasks);
        self.start_capacity_monitor();
    }

    /// 스캔/추출/해석/스케줄만 동기 실행 (인스턴스 생성 없음, 설정 기록 없음)
    pub fn plan(&self) -> PlanReport {
        let tasks = self.engine.scan();
        for task in &tasks {
            self.engine.import_one(task);
        }
        let order = self.engine.finish_import(false);

        let st = self.engine.state.borrow();
        PlanReport {
            order: order
                .iter()
                .map(|record| PlanEntry {
                    id: record.id.clone(),
                    import_path: record.import_path.clone(),
                    placement: record.placement.clone(),
                    priority: record.priority,
                    index: record.index,
                    deps: st
                        .resolved
                        .get(&record.id)
                        .map(|d| d.ids.clone())
                        .unwrap_or_default(),
                })
                .collect(),
            diagnostics: st.diagnostics.clone(),
            skipped: st.skipped.clone(),
            search_roots: st.search_roots.clone(),
        }
    }

    // ========================================================================
    // 라이프사이클
    // ========================================================================

    /// 플러그인 비활성화 (ID, 짧은 이름, 모듈 이름). 인스턴스가 있었으면 true
    pub fn disable(&self, token: &str) -> bool {
        self.engine.disable(token)
    }

    /// 레코드로 플러그인 활성화 (초기화 한 단계를 예약)
    pub fn enable(&self, id: &str, record: PluginRecord) -> Result<()> {
        self.engine.enable(id, record)
    }

    /// 분리 → 비활성화 → 모듈 재로드 → 재추출 → 활성화
    pub fn reload(&self, token: &str) -> Result<()> {
        self.engine.reload(token)
    }

    /// 배치한 요소만 분리
    pub fn detach(&self, token: &str) -> bool {
        self.engine.detach(token)
    }

    /// 모든 플러그인 비활성화 (로드 순서의 역순)
    pub fn shutdown(&self) {
        let ids: Vec<String> = self
            .engine
            .state
            .borrow()
            .instances
            .load_order()
            .into_iter()
            .rev()
            .collect();
        for id in &ids {
            self.engine.detach(id);
            self.engine.disable(id);
        }
        info!("Shut down {} plugins", ids.len());
    }

    // ========================================================================
    // 용량 모니터
    // ========================================================================

    /// 용량 모니터를 timeout 소스로 등록
    pub fn start_capacity_monitor(&self) -> SourceId {
        let mut monitor = CapacityMonitor::new(self.engine.settings.capacity_max_attempts);
        let engine = Rc::clone(&self.engine);
        self.engine.ctx.run_loop().timeout_add(
            Duration::from_millis(self.engine.settings.capacity_interval_ms),
            move || engine.capacity_pass(&mut monitor),
        )
    }

    /// 용량 검사 한 번 (계속 검사해야 하면 Continue)
    pub fn check_capacity(&self, monitor: &mut CapacityMonitor) -> ControlFlow<()> {
        self.engine.capacity_pass(monitor)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn record(&self, token: &str) -> Option<PluginRecord> {
        self.engine.state.borrow().aliases.resolve(token).cloned()
    }

    pub fn is_live(&self, token: &str) -> bool {
        let id = self.engine.resolve_id(token);
        self.engine.state.borrow().instances.contains(&id)
    }

    /// 살아 있는 플러그인 (로드 순서)
    pub fn live_ids(&self) -> Vec<String> {
        self.engine.state.borrow().instances.load_order()
    }

    /// 마지막 스케줄 결과
    pub fn schedule_order(&self) -> Vec<String> {
        self.engine.state.borrow().schedule_order.clone()
    }

    pub fn diagnostics(&self) -> Vec<ScheduleDiagnostic> {
        self.engine.state.borrow().diagnostics.clone()
    }

    pub fn skipped(&self) -> Vec<SkippedPlugin> {
        self.engine.state.borrow().skipped.clone()
    }

    pub fn status(&self, token: &str) -> Option<PluginStatus> {
        let id = self.engine.resolve_id(token);
        self.engine.state.borrow().statuses.get(&id).copied()
    }

    pub fn resolved_deps(&self, token: &str) -> Option<ResolvedDeps> {
        let id = self.engine.resolve_id(token);
        self.engine.state.borrow().resolved.get(&id).cloned()
    }

    pub fn last_placed(&self) -> Option<String> {
        self.engine
            .state
            .borrow()
            .placement
            .last_placed()
            .map(str::to_string)
    }

    pub fn placed(&self, token: &str) -> Option<PlacedElement> {
        let id = self.engine.resolve_id(token);
        self.engine.state.borrow().placement.placed(&id).cloned()
    }

    pub fn search_roots(&self) -> Vec<PathBuf> {
        self.engine.state.borrow().search_roots.clone()
    }

    pub fn stats(&self) -> ExecutorStats {
        self.engine.state.borrow().stats
    }

    /// 살아 있는 인스턴스에 접근
    ///
    /// 클로저 안에서 매니저를 다시 호출하면 안 됩니다 (상태 borrow 중).
    pub fn with_instance<R>(&self, token: &str, f: impl FnOnce(&dyn Plugin) -> R) -> Option<R> {
        let id = self.engine.resolve_id(token);
        let st = self.engine.state.borrow();
        st.instances.get(&id).map(|live| f(live.plugin.as_ref()))
    }

    /// 플러그인 시스템 요약
    pub fn summary(&self) -> PluginSummary {
        let st = self.engine.state.borrow();
        let count = |status: PluginStatus| st.statuses.values().filter(|s| **s == status).count();

        PluginSummary {
            total: st.aliases.len(),
            live: st.instances.len(),
            failed: count(PluginStatus::Failed),
            unscheduled: count(PluginStatus::Unschedulable),
            disabled: count(PluginStatus::Disabled),
            skipped: st.skipped.len(),
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("summary", &self.summary())
            .finish()
    }
}

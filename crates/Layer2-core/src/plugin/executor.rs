//! Cooperative Batch Executor - 청크 단위 import/초기화
//!
//! 두 단계 모두 run-loop 소스 하나로 실행됩니다. 소스는 호출될 때마다
//! 청크 하나를 처리하고 남은 작업이 있으면 `Continue`를 반환해 다음 턴에
//! 다시 호출됩니다. 내부에서 루프를 돌며 전부 처리하지 않으므로 한 턴의
//! 작업량은 플러그인 수와 무관하게 청크 크기로 제한됩니다.
//!
//! ```text
//! scan ─► [import 20] ─► [import 20] ─► [import 7 + resolve + schedule]
//!                                             │
//!          startup_finished ◄─ [init 5] ◄─ ... ◄─ [init 5]
//! ```
//!
//! N개의 작업은 정확히 ceil(N / chunk) 번의 호출로 처리됩니다.

use super::discovery::DiscoveryTask;
use super::extractor::{extract, Extraction, SkipReason};
use super::manager::{Engine, SkippedPlugin};
use super::metadata::PluginRecord;
use super::scheduler;
use super::traits::{PluginCapability, PluginModule, PluginStatus, WidgetSpec};
use serde::Serialize;
use std::ops::ControlFlow;
use std::rc::Rc;
use tessera_foundation::{Error, Result};
use tracing::{debug, error, info, warn};

/// `NotReady` 배치를 다시 시도하는 최대 턴 수
pub const PLACEMENT_RETRIES: u32 = 10;

/// 실행 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutorStats {
    /// import 단계 소스 호출 수
    pub import_invocations: usize,

    /// 초기화 단계 소스 호출 수 (enable 포함)
    pub init_invocations: usize,
}

// ============================================================================
// ChunkCursor
// ============================================================================

/// 고정 크기 청크로 소비되는 작업 목록
#[derive(Debug)]
pub struct ChunkCursor<T> {
    items: Vec<T>,
    cursor: usize,
    chunk_size: usize,
    invocations: usize,
}

impl<T: Clone> ChunkCursor<T> {
    pub fn new(items: Vec<T>, chunk_size: usize) -> Self {
        Self {
            items,
            cursor: 0,
            chunk_size: chunk_size.max(1),
            invocations: 0,
        }
    }

    /// 다음 청크 (최대 chunk_size개)
    pub fn next_chunk(&mut self) -> Vec<T> {
        let end = (self.cursor + self.chunk_size).min(self.items.len());
        let chunk = self.items[self.cursor..end].to_vec();
        self.cursor = end;
        self.invocations += 1;
        chunk
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Import 단계
// ============================================================================

impl Engine {
    /// 루트 스캔. 비활성화 목록은 여기서 한 번만 읽음
    pub(crate) fn scan(&self) -> Vec<DiscoveryTask> {
        let disabled: Vec<String> = self.ctx.get_config(&["plugins", "disabled"], Vec::new());
        let output = self.scanner.borrow().scan();

        for e in &output.errors {
            error!("{}", e);
        }

        let mut st = self.state.borrow_mut();
        st.disabled_set = disabled.iter().cloned().collect();
        st.disabled = disabled;
        st.aliases.clear();
        st.skipped.clear();
        st.statuses.clear();
        st.search_roots = output.search_roots;
        st.tasks = output
            .tasks
            .iter()
            .map(|t| (t.module_name.clone(), t.clone()))
            .collect();
        output.tasks
    }

    /// 작업 하나 import + 검증
    pub(crate) fn import_one(&self, task: &DiscoveryTask) {
        let loaded = self.loader.borrow_mut().load(task);
        let module = match loaded {
            Ok(module) => module,
            Err(e) => {
                error!("Failed to load plugin module {}: {}", task.import_path, e);
                self.record_skip(task, None, e.to_string());
                return;
            }
        };

        let outcome = {
            let st = self.state.borrow();
            extract(&module, task, &self.ctx, &st.disabled_set)
        };

        match outcome {
            Ok(Extraction::Registered(record)) => {
                let id = record.id.clone();
                let inserted = {
                    let mut st = self.state.borrow_mut();
                    let inserted = st.aliases.insert(*record);
                    if inserted {
                        st.statuses.insert(id.clone(), PluginStatus::Registered);
                    }
                    inserted
                };
                if inserted {
                    debug!("Validated plugin {} from {}", id, task.import_path);
                } else {
                    self.record_skip(task, Some(id), "duplicate plugin id".to_string());
                    self.defer(task, module);
                }
            }
            Ok(Extraction::Skipped { plugin, reason }) => {
                let label = plugin.as_deref().unwrap_or(&task.import_path);
                match reason {
                    SkipReason::MissingMetadata | SkipReason::MissingFactory => {
                        warn!("Skipping plugin {}: {}", label, reason)
                    }
                    _ => debug!("Skipping plugin {}: {}", label, reason),
                }
                self.record_skip(task, plugin, reason.to_string());
                self.defer(task, module);
            }
            Err(e) => {
                error!("Invalid plugin module {}: {}", task.import_path, e);
                self.record_skip(task, e.plugin().map(str::to_string), e.to_string());
                self.defer(task, module);
            }
        }
    }

    fn record_skip(&self, task: &DiscoveryTask, plugin: Option<String>, reason: String) {
        self.state.borrow_mut().skipped.push(SkippedPlugin {
            import_path: task.import_path.clone(),
            plugin,
            reason,
        });
    }

    /// 거부된 모듈은 단계가 끝날 때까지 해제를 미룸
    fn defer(&self, task: &DiscoveryTask, module: Rc<dyn PluginModule>) {
        self.loader.borrow_mut().unload(task);
        self.state.borrow_mut().deferred.push(module);
    }

    /// 해석 + 스케줄 + (선택) 설정 기록. 초기화 순서를 반환
    pub(crate) fn finish_import(&self, persist: bool) -> Vec<PluginRecord> {
        let released = std::mem::take(&mut self.state.borrow_mut().deferred);
        if !released.is_empty() {
            debug!("Releasing {} rejected modules", released.len());
        }
        drop(released);

        let mut st = self.state.borrow_mut();
        st.resolved = self.resolver.borrow().resolve_all(&st.aliases);

        let records: Vec<PluginRecord> = st.aliases.records().cloned().collect();
        let schedule = scheduler::schedule(&records, &st.resolved);

        for diagnostic in &schedule.diagnostics {
            for e in diagnostic.to_errors() {
                error!("{}", e);
            }
        }
        for id in schedule.unscheduled() {
            st.statuses
                .insert(id.to_string(), PluginStatus::Unschedulable);
        }
        st.schedule_order = schedule.ids().into_iter().map(str::to_string).collect();
        st.diagnostics = schedule.diagnostics.clone();

        info!(
            "Validated {} plugins, {} scheduled, {} skipped",
            st.aliases.len(),
            schedule.order.len(),
            st.skipped.len()
        );

        if persist {
            let enabled = st.aliases.ids().to_vec();
            let disabled = st.disabled.clone();
            drop(st);

            let mut config = self.ctx.config_mut();
            if let Err(e) = config
                .update(&["plugins", "enabled"], enabled)
                .and_then(|_| config.update(&["plugins", "disabled"], disabled))
            {
                error!("Failed to persist plugin lists: {}", e);
            }
        }

        schedule.order
    }

    /// import 단계 예약
    pub(crate) fn start_import(self: &Rc<Self>, tasks: Vec<DiscoveryTask>) {
        if tasks.is_empty() {
            info!("No plugins discovered");
            let order = self.finish_import(true);
            self.start_init(order);
            return;
        }

        let mut cursor = ChunkCursor::new(tasks, self.settings.import_chunk_size);
        let engine = Rc::clone(self);
        self.ctx
            .run_loop()
            .idle_add(move || engine.import_step(&mut cursor));
    }

    fn import_step(self: &Rc<Self>, cursor: &mut ChunkCursor<DiscoveryTask>) -> ControlFlow<()> {
        let chunk = cursor.next_chunk();
        self.state.borrow_mut().stats.import_invocations += 1;
        debug!(
            "Import chunk {}: {} modules ({} remaining)",
            cursor.invocations(),
            chunk.len(),
            cursor.remaining()
        );

        for task in &chunk {
            self.import_one(task);
        }

        if cursor.has_more() {
            return ControlFlow::Continue(());
        }

        let order = self.finish_import(true);
        self.start_init(order);
        ControlFlow::Break(())
    }

    // ========================================================================
    // 초기화 단계
    // ========================================================================

    /// 초기화 단계 예약. 끝나면 startup_finished 설정
    pub(crate) fn start_init(self: &Rc<Self>, order: Vec<PluginRecord>) {
        if order.is_empty() {
            self.finish_startup();
            return;
        }

        let mut cursor = ChunkCursor::new(order, self.settings.init_chunk_size);
        let engine = Rc::clone(self);
        self.ctx.run_loop().idle_add(move || {
            let flow = engine.init_step(&mut cursor);
            if flow.is_break() {
                engine.finish_startup();
            }
            flow
        });
    }

    /// 청크 하나 초기화
    pub(crate) fn init_step(
        self: &Rc<Self>,
        cursor: &mut ChunkCursor<PluginRecord>,
    ) -> ControlFlow<()> {
        let chunk = cursor.next_chunk();
        self.state.borrow_mut().stats.init_invocations += 1;
        debug!(
            "Init chunk {}: {} plugins ({} remaining)",
            cursor.invocations(),
            chunk.len(),
            cursor.remaining()
        );

        for record in &chunk {
            if let Err(e) = self.initialize(record) {
                error!("{}", e);
                self.set_status(&record.id, PluginStatus::Failed);
            }
        }

        if cursor.has_more() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    fn finish_startup(&self) {
        self.ctx.set_startup_finished(true);
        info!(
            "Plugin startup finished: {} plugins running",
            self.state.borrow().instances.len()
        );
    }

    /// 생성 → 시작 훅 → 등록 → 배치
    pub(crate) fn initialize(self: &Rc<Self>, record: &PluginRecord) -> Result<()> {
        if self.state.borrow().instances.contains(&record.id) {
            warn!("Plugin {} is already running, skipping initialization", record.id);
            return Ok(());
        }

        let mut plugin = (record.factory)(&self.ctx)
            .map_err(|e| Error::initialization(record.id.clone(), e.to_string()))?;

        for capability in [PluginCapability::OnStart, PluginCapability::OnEnable] {
            if !plugin.supports(capability) {
                continue;
            }
            let result = match capability {
                PluginCapability::OnStart => plugin.on_start(),
                _ => plugin.on_enable(),
            };
            result.map_err(|e| {
                Error::initialization(record.id.clone(), format!("{} failed: {}", capability, e))
            })?;
        }

        let spec = if !record.is_background() && plugin.supports(PluginCapability::SetWidget) {
            plugin.set_widget()
        } else {
            None
        };

        let generation = {
            let mut st = self.state.borrow_mut();
            let generation = st
                .instances
                .register(record.clone(), plugin)
                .ok_or_else(|| Error::initialization(record.id.clone(), "already running"))?;
            st.statuses
                .insert(record.id.clone(), PluginStatus::Active);
            generation
        };

        if let Some(spec) = spec {
            self.place(record.clone(), spec, generation, PLACEMENT_RETRIES);
        }
        Ok(())
    }

    /// 배치. 컨테이너가 아직 없으면 이후 턴에 재시도
    fn place(self: &Rc<Self>, record: PluginRecord, spec: WidgetSpec, generation: u64, retries: u32) {
        let result = {
            let mut st = self.state.borrow_mut();
            if st.instances.generation(&record.id) != Some(generation) {
                debug!("Plugin {} was replaced before placement, dropping widgets", record.id);
                return;
            }
            st.placement.place(&self.ctx, &record, &spec)
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_retryable() && retries > 0 => {
                debug!("{}, retrying placement of {} later", e, record.id);
                let engine = Rc::clone(self);
                self.ctx.run_loop().idle_add(move || {
                    engine.place(record.clone(), spec.clone(), generation, retries - 1);
                    ControlFlow::Break(())
                });
            }
            Err(e) => error!("Failed to place plugin {}: {}", record.id, e),
        }
    }
}

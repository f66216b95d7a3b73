//! Lifecycle Manager - 런타임 비활성화 / 활성화 / 재로드
//!
//! 활성화는 시작 단계와 같은 초기화 경로(`init_step`)를 run-loop에 한 번
//! 예약할 뿐이고, 재로드는 "비활성화 + 한 플러그인 재발견 + 활성화"입니다.

use super::executor::ChunkCursor;
use super::extractor::{extract, Extraction};
use super::manager::Engine;
use super::metadata::PluginRecord;
use super::placement;
use super::traits::{PluginCapability, PluginStatus};
use std::rc::Rc;
use tessera_foundation::{Error, Result};
use tracing::{debug, error, info, warn};

/// 비활성화 훅 실행 순서
const TEARDOWN: [PluginCapability; 3] = [
    PluginCapability::OnDisable,
    PluginCapability::OnStop,
    PluginCapability::Disable,
];

impl Engine {
    /// 비활성화. 살아 있는 인스턴스가 있었으면 true
    pub(crate) fn disable(&self, token: &str) -> bool {
        let id = self.resolve_id(token);
        let live = self.state.borrow_mut().instances.unregister(&id);
        let Some(mut live) = live else {
            warn!("Plugin {} is not running, nothing to disable", token);
            return false;
        };

        for capability in TEARDOWN {
            if !live.plugin.supports(capability) {
                continue;
            }
            let result = match capability {
                PluginCapability::OnDisable => live.plugin.on_disable(),
                PluginCapability::OnStop => live.plugin.on_stop(),
                _ => live.plugin.disable(),
            };
            if let Err(e) = result {
                error!("{}", Error::hook(id.clone(), capability.hook_name(), e.to_string()));
            }
        }

        self.set_status(&id, PluginStatus::Disabled);
        info!("Disabled plugin {}", id);
        true
    }

    /// 배치한 요소 분리
    pub(crate) fn detach(&self, token: &str) -> bool {
        let id = self.resolve_id(token);
        self.state.borrow_mut().placement.detach(&id)
    }

    /// 레코드 검증 후 초기화 한 단계 예약
    pub(crate) fn enable(self: &Rc<Self>, id: &str, record: PluginRecord) -> Result<()> {
        if record.id != id {
            return Err(Error::validation(
                id,
                format!("record belongs to {}", record.id),
            ));
        }
        if placement::container_attr(&record.placement).is_none() {
            return Err(Error::validation(
                id,
                format!("unknown placement '{}'", record.placement),
            ));
        }

        {
            let mut st = self.state.borrow_mut();
            if st.instances.contains(id) {
                return Err(Error::validation(id, "plugin is already running"));
            }
            st.aliases.replace(record.clone());
            st.statuses.insert(id.to_string(), PluginStatus::Registered);
        }

        debug!("Scheduling initialization of {}", id);
        let mut cursor = ChunkCursor::new(vec![record], 1);
        let engine = Rc::clone(self);
        self.ctx
            .run_loop()
            .idle_add(move || engine.init_step(&mut cursor));
        Ok(())
    }

    /// 분리 → 비활성화 → 모듈 재로드 → 재추출/해석 → 활성화
    pub(crate) fn reload(self: &Rc<Self>, token: &str) -> Result<()> {
        let (old, task) = {
            let st = self.state.borrow();
            let record = st
                .aliases
                .resolve(token)
                .ok_or_else(|| Error::NotFound(format!("plugin {}", token)))?;
            let task = st
                .tasks
                .get(&record.module_name)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("module of plugin {}", record.id)))?;
            (record.clone(), task)
        };
        let id = old.id.clone();
        info!("Reloading plugin {}", id);

        if !old.is_background() {
            self.detach(&id);
        }
        self.disable(&id);

        let module = self.loader.borrow_mut().reload(&task)?;
        let outcome = {
            let st = self.state.borrow();
            extract(&module, &task, &self.ctx, &st.disabled_set)?
        };
        let record = match outcome {
            Extraction::Registered(record) => *record,
            Extraction::Skipped { reason, .. } => {
                return Err(Error::validation(id, format!("reload skipped: {}", reason)));
            }
        };
        if record.id != id {
            return Err(Error::validation(
                id,
                format!("reloaded module now declares id {}", record.id),
            ));
        }

        let deps = {
            let mut st = self.state.borrow_mut();
            st.aliases.replace(record.clone());
            let deps = self.resolver.borrow().resolve(&record, &st.aliases);
            st.resolved.insert(id.clone(), deps.clone());
            deps
        };

        if !deps.is_satisfiable() {
            self.set_status(&id, PluginStatus::Unschedulable);
            return Err(Error::dependency(
                id,
                format!("unresolved dependencies: {}", deps.unresolved.join(", ")),
            ));
        }
        for dep in &deps.ids {
            if !self.state.borrow().instances.contains(dep) {
                warn!("Plugin {} reloaded while its dependency {} is not running", id, dep);
            }
        }

        self.enable(&id, record)
    }
}

//! 통합 테스트 공용 하네스
//!
//! 임시 디렉토리에 디스크립터를 쓰고, 헤드리스 컨테이너와 기록용 플러그인으로
//! 엔진 전체를 run-loop 위에서 구동합니다.

#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;
use tessera_core::plugin::{
    factory_fn, FactoryTable, ManifestLoader, Plugin, PluginCapability, PluginFactory,
    PluginManager, PluginScope, WidgetSpec,
};
use tessera_core::ui::{HeadlessBox, HeadlessLabel, HeadlessToolkit, WidgetRef};
use tessera_core::PluginContext;
use tessera_foundation::{ConfigStore, Error, LoaderSettings, MemoryNotifier, Notifier, RunLoop};

/// "<short>:<hook>" 형식의 이벤트 기록
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// 상단 패널이 만드는 컨테이너
pub const TOP_REGIONS: [&str; 3] = [
    "top_panel_box_left",
    "top_panel_box_center",
    "top_panel_box_right",
];

// ============================================================================
// Recorder - 훅 호출을 기록하는 플러그인
// ============================================================================

pub struct Recorder {
    name: String,
    log: EventLog,
    widths: Vec<f64>,
    capabilities: Vec<PluginCapability>,
    /// 기록 후 에러를 반환할 훅
    fail_on: Vec<String>,
}

impl Recorder {
    fn push(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}:{}", self.name, hook));
    }

    fn hook(&self, hook: &str) -> tessera_foundation::Result<()> {
        self.push(hook);
        if self.fail_on.iter().any(|h| h == hook) {
            return Err(Error::Internal(format!("{} exploded", hook)));
        }
        Ok(())
    }
}

impl Plugin for Recorder {
    fn capabilities(&self) -> &[PluginCapability] {
        &self.capabilities
    }

    fn on_start(&mut self) -> tessera_foundation::Result<()> {
        self.hook("on_start")
    }

    fn on_stop(&mut self) -> tessera_foundation::Result<()> {
        self.hook("on_stop")
    }

    fn on_disable(&mut self) -> tessera_foundation::Result<()> {
        self.hook("on_disable")
    }

    fn disable(&mut self) -> tessera_foundation::Result<()> {
        self.hook("disable")
    }

    fn set_widget(&mut self) -> Option<WidgetSpec> {
        self.push("set_widget");
        let widgets: Vec<WidgetRef> = self
            .widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let label: WidgetRef = HeadlessLabel::new(format!("{}_{}", self.name, i), *width);
                label
            })
            .collect();
        Some(WidgetSpec::append(widgets))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn recorder(name: &str, log: &EventLog, widths: Vec<f64>) -> PluginFactory {
    failing_recorder(name, log, widths, &[])
}

/// `fail_on`에 있는 훅이 에러를 반환하는 기록용 플러그인
pub fn failing_recorder(
    name: &str,
    log: &EventLog,
    widths: Vec<f64>,
    fail_on: &[&str],
) -> PluginFactory {
    let name = name.to_string();
    let fail_on: Vec<String> = fail_on.iter().map(|h| h.to_string()).collect();
    let log = Rc::clone(log);
    factory_fn(move |_ctx| {
        Ok(Box::new(Recorder {
            name: name.clone(),
            log: Rc::clone(&log),
            widths: widths.clone(),
            capabilities: vec![
                PluginCapability::OnStart,
                PluginCapability::OnStop,
                PluginCapability::OnDisable,
                PluginCapability::Disable,
                PluginCapability::SetWidget,
            ],
            fail_on: fail_on.clone(),
        }))
    })
}

/// 생성 시 컨테이너를 등록하는 리전 루트
struct Panel;

impl Plugin for Panel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub dir: TempDir,
    pub ctx: Rc<PluginContext>,
    pub run_loop: RunLoop,
    pub notifier: Rc<MemoryNotifier>,
    pub log: EventLog,
    pub regions: HashMap<&'static str, Rc<HeadlessBox>>,
    pub overflow: Rc<HeadlessBox>,
    factories: FactoryTable,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config("")
    }

    pub fn with_config(config: &str) -> Self {
        let run_loop = RunLoop::new();
        let notifier = Rc::new(MemoryNotifier::new());
        let config = ConfigStore::parse(config).unwrap();
        let ctx = PluginContext::new(
            config,
            Rc::new(HeadlessToolkit),
            Rc::clone(&notifier) as Rc<dyn Notifier>,
            run_loop.clone(),
        );

        let regions = TOP_REGIONS
            .iter()
            .map(|attr| (*attr, HeadlessBox::new(*attr)))
            .collect();

        Self {
            dir: TempDir::new().unwrap(),
            ctx,
            run_loop,
            notifier,
            log: Rc::new(RefCell::new(Vec::new())),
            regions,
            overflow: HeadlessBox::new("systray_overflow"),
            factories: FactoryTable::new(),
        }
    }

    /// 디스크립터 파일 작성 (루트 기준 상대 경로)
    pub fn descriptor(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// 기록용 플러그인 팩토리 등록
    pub fn recording(&mut self, key: &str, widths: Vec<f64>) -> &mut Self {
        let factory = recorder(key, &self.log, widths);
        self.factories.register(key, factory);
        self
    }

    /// 지정한 훅이 실패하는 기록용 플러그인 등록
    pub fn recording_failing(&mut self, key: &str, widths: Vec<f64>, hooks: &[&str]) -> &mut Self {
        let factory = failing_recorder(key, &self.log, widths, hooks);
        self.factories.register(key, factory);
        self
    }

    pub fn factory(&mut self, key: &str, factory: PluginFactory) -> &mut Self {
        self.factories.register(key, factory);
        self
    }

    /// 상단 패널 리전 루트 팩토리 등록
    pub fn panel(&mut self, key: &str) -> &mut Self {
        let regions: Vec<_> = self
            .regions
            .iter()
            .map(|(attr, region)| (*attr, Rc::clone(region)))
            .collect();
        let overflow = Rc::clone(&self.overflow);
        let log = Rc::clone(&self.log);
        self.factories.register(
            key,
            factory_fn(move |ctx| {
                for (attr, region) in &regions {
                    ctx.register_container(*attr, Rc::clone(region) as tessera_core::ContainerRef);
                }
                ctx.register_overflow_container(Rc::clone(&overflow) as Rc<dyn tessera_core::OverflowContainer>);
                log.borrow_mut().push("top_panel:created".to_string());
                Ok(Box::new(Panel))
            }),
        );
        self
    }

    /// 생성자가 실패하는 팩토리 등록
    pub fn failing(&mut self, key: &str) -> &mut Self {
        self.factories.register(
            key,
            factory_fn(|_ctx| Err(Error::Internal("constructor exploded".to_string()))),
        );
        self
    }

    pub fn manager(&mut self) -> PluginManager {
        self.manager_with(LoaderSettings::default())
    }

    pub fn manager_with(&mut self, settings: LoaderSettings) -> PluginManager {
        let factories = std::mem::replace(&mut self.factories, FactoryTable::new());
        let manager = PluginManager::with_settings(
            Rc::clone(&self.ctx),
            Box::new(ManifestLoader::new(factories)),
            settings,
        );
        manager.add_root(self.dir.path(), PluginScope::Extra);
        manager
    }

    pub fn region(&self, attr: &str) -> &Rc<HeadlessBox> {
        &self.regions[attr]
    }

    /// 특정 훅이 기록된 횟수
    pub fn count(&self, event: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == event).count()
    }

    pub fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

/// `[plugin]` 디스크립터
pub fn plugin_toml(id: &str, container: &str, extra: &str) -> String {
    format!(
        "[plugin]\nid = \"{}\"\ncontainer = \"{}\"\n{}\n",
        id, container, extra
    )
}

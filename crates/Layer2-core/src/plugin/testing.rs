//! 단위 테스트 공용 헬퍼

use super::context::PluginContext;
use super::metadata::{PluginMetadata, PluginRecord};
use super::traits::{factory_fn, Plugin, PluginCapability, PluginFactory, StaticModule, WidgetSpec};
use crate::ui::HeadlessToolkit;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_foundation::{ConfigStore, MemoryNotifier, RunLoop};

pub(crate) fn context() -> Rc<PluginContext> {
    PluginContext::new(
        ConfigStore::in_memory(),
        Rc::new(HeadlessToolkit),
        Rc::new(MemoryNotifier::new()),
        RunLoop::new(),
    )
}

pub(crate) fn noop_factory() -> PluginFactory {
    factory_fn(|_ctx| Ok(Box::new(Probe::default())))
}

/// 모듈 이름을 직접 지정한 레코드
pub(crate) fn record(id: &str, module_name: &str) -> PluginRecord {
    let metadata = PluginMetadata::new(id);
    let module = Rc::new(StaticModule::new(metadata.clone(), noop_factory()));
    PluginRecord::new(metadata, module_name, module_name, module, noop_factory())
}

/// 모듈 이름 = 짧은 이름
pub(crate) fn record_from(metadata: PluginMetadata) -> PluginRecord {
    let module_name = metadata.short_name().to_string();
    let module = Rc::new(StaticModule::new(metadata.clone(), noop_factory()));
    PluginRecord::new(metadata, module_name.clone(), module_name, module, noop_factory())
}

/// 호출된 훅을 기록하는 플러그인
#[derive(Default)]
pub(crate) struct Probe {
    pub calls: Rc<RefCell<Vec<&'static str>>>,
    pub capabilities: Vec<PluginCapability>,
    pub widgets: Option<WidgetSpec>,
}

impl Plugin for Probe {
    fn capabilities(&self) -> &[PluginCapability] {
        &self.capabilities
    }

    fn on_start(&mut self) -> tessera_foundation::Result<()> {
        self.calls.borrow_mut().push("on_start");
        Ok(())
    }

    fn on_stop(&mut self) -> tessera_foundation::Result<()> {
        self.calls.borrow_mut().push("on_stop");
        Ok(())
    }

    fn set_widget(&mut self) -> Option<WidgetSpec> {
        self.calls.borrow_mut().push("set_widget");
        self.widgets.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

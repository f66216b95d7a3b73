//! Plugin Context - 플러그인과 엔진이 공유하는 호스트
//!
//! 컨테이너 레지스트리, 설정 저장소, 알림, 툴킷, run-loop 핸들,
//! 그리고 "시작 완료" 플래그를 한곳에 모읍니다. 리전 루트 플러그인은
//! 생성 시점에 자신의 컨테이너를 여기에 등록합니다.

use crate::ui::{ContainerRef, OverflowContainer, Toolkit};
use serde::de::DeserializeOwned;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use tessera_foundation::{ConfigStore, Notification, Notifier, RunLoop};
use tracing::{debug, warn};

/// 플러그인 호스트
pub struct PluginContext {
    /// 컨테이너 속성 이름 -> 컨테이너
    containers: RefCell<HashMap<String, ContainerRef>>,

    /// 오버플로 (숨김 위젯) 컨테이너
    overflow: RefCell<Option<Rc<dyn OverflowContainer>>>,

    /// 초기화 단계가 모두 끝났는지
    startup_finished: Cell<bool>,

    config: RefCell<ConfigStore>,
    notifier: Rc<dyn Notifier>,
    toolkit: Rc<dyn Toolkit>,
    run_loop: RunLoop,
}

impl PluginContext {
    pub fn new(
        config: ConfigStore,
        toolkit: Rc<dyn Toolkit>,
        notifier: Rc<dyn Notifier>,
        run_loop: RunLoop,
    ) -> Rc<Self> {
        Rc::new(Self {
            containers: RefCell::new(HashMap::new()),
            overflow: RefCell::new(None),
            startup_finished: Cell::new(false),
            config: RefCell::new(config),
            notifier,
            toolkit,
            run_loop,
        })
    }

    // ========================================================================
    // 컨테이너
    // ========================================================================

    /// 컨테이너 등록 (같은 이름이면 교체)
    pub fn register_container(&self, attr: impl Into<String>, container: ContainerRef) {
        let attr = attr.into();
        debug!("Registered container {}", attr);
        if self.containers.borrow_mut().insert(attr.clone(), container).is_some() {
            warn!("Container {} was replaced", attr);
        }
    }

    pub fn unregister_container(&self, attr: &str) -> Option<ContainerRef> {
        self.containers.borrow_mut().remove(attr)
    }

    /// 컨테이너 조회 (아직 생성되지 않았으면 None)
    pub fn container(&self, attr: &str) -> Option<ContainerRef> {
        self.containers.borrow().get(attr).cloned()
    }

    pub fn has_container(&self, attr: &str) -> bool {
        self.containers.borrow().contains_key(attr)
    }

    /// 등록된 컨테이너 이름 (정렬)
    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn register_overflow_container(&self, overflow: Rc<dyn OverflowContainer>) {
        debug!("Registered overflow container");
        *self.overflow.borrow_mut() = Some(overflow);
    }

    pub fn overflow_container(&self) -> Option<Rc<dyn OverflowContainer>> {
        self.overflow.borrow().clone()
    }

    // ========================================================================
    // 시작 상태
    // ========================================================================

    pub fn startup_finished(&self) -> bool {
        self.startup_finished.get()
    }

    pub(crate) fn set_startup_finished(&self, finished: bool) {
        self.startup_finished.set(finished);
    }

    // ========================================================================
    // 설정
    // ========================================================================

    pub fn config(&self) -> Ref<'_, ConfigStore> {
        self.config.borrow()
    }

    pub fn config_mut(&self) -> RefMut<'_, ConfigStore> {
        self.config.borrow_mut()
    }

    /// 경로로 설정값 조회 (기본값 포함)
    pub fn get_config<T: DeserializeOwned>(&self, path: &[&str], default: T) -> T {
        self.config.borrow().get_or(path, default)
    }

    // ========================================================================
    // 서비스
    // ========================================================================

    pub fn notify(&self, title: &str, body: &str, icon: &str) {
        self.notifier.notify(Notification::new(title, body, icon));
    }

    pub fn notifier(&self) -> &Rc<dyn Notifier> {
        &self.notifier
    }

    pub fn toolkit(&self) -> &Rc<dyn Toolkit> {
        &self.toolkit
    }

    pub fn run_loop(&self) -> &RunLoop {
        &self.run_loop
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("containers", &self.container_names())
            .field("startup_finished", &self.startup_finished.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{HeadlessBox, HeadlessToolkit};
    use tessera_foundation::MemoryNotifier;

    fn context() -> Rc<PluginContext> {
        PluginContext::new(
            ConfigStore::parse("[panel.top]\nwidth = 1200").unwrap(),
            Rc::new(HeadlessToolkit),
            Rc::new(MemoryNotifier::new()),
            RunLoop::new(),
        )
    }

    #[test]
    fn test_container_registry() {
        let ctx = context();
        assert!(ctx.container("top_panel_box_left").is_none());

        ctx.register_container("top_panel_box_left", HeadlessBox::new("left"));
        assert!(ctx.has_container("top_panel_box_left"));
        assert_eq!(ctx.container_names(), vec!["top_panel_box_left"]);

        assert!(ctx.unregister_container("top_panel_box_left").is_some());
        assert!(!ctx.has_container("top_panel_box_left"));
    }

    #[test]
    fn test_config_access() {
        let ctx = context();
        assert_eq!(ctx.get_config(&["panel", "top", "width"], 0_i64), 1200);

        ctx.config_mut()
            .update(&["clock", "hide_in_systray"], true)
            .unwrap();
        assert!(ctx.get_config(&["clock", "hide_in_systray"], false));
    }
}

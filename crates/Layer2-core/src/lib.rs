//! tessera-core: Core Runtime for Tessera
//!
//! Layer2 - 플러그인 엔진 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: 발견, 검증, 의존성 스케줄링, 협력형 초기화, 라이프사이클
//! - `ui`: 툴킷 추상화 (컨테이너, 위젯, 헤드리스 구현)
//!
//! # 사용 예시
//!
//! ```ignore
//! use tessera_core::{FactoryTable, ManifestLoader, PluginContext, PluginManager, PluginScope};
//! use tessera_core::ui::HeadlessToolkit;
//!
//! let ctx = PluginContext::new(config, Rc::new(HeadlessToolkit), default_notifier(), run_loop.clone());
//! let factories = FactoryTable::new().with("clock", clock_factory());
//! let manager = PluginManager::new(ctx, Box::new(ManifestLoader::new(factories)));
//!
//! manager.add_root(builtin_plugins_dir()?, PluginScope::Builtin);
//! manager.load_plugins();
//! run_loop.run().await;
//! ```

pub mod plugin;
pub mod ui;

// Re-exports: Plugin Engine
pub use plugin::{
    factory_fn, CapacityMonitor, CapacityVerdict, DependencyResolver, ExecutorStats, FactoryTable,
    ManifestLoader, ModuleLoader, PlacementAction, PlanEntry, PlanReport, Plugin,
    PluginCapability, PluginContext, PluginFactory, PluginManager, PluginMetadata, PluginModule,
    PluginRecord, PluginScope, PluginStatus, PluginSummary, RegionRoot, ScheduleDiagnostic,
    SkippedPlugin, StaticLoader, StaticModule, WidgetSpec,
};

// Re-exports: UI
pub use ui::{Container, ContainerRef, Group, OverflowContainer, Toolkit, Widget, WidgetRef};

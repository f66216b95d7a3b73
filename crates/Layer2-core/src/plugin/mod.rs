//! # Plugin Engine
//!
//! 패널 플러그인의 발견, 검증, 의존성 해석, 협력형 초기화,
//! 런타임 라이프사이클을 담당합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PluginManager                          │
//! │                                                             │
//! │  PluginScanner ─► ModuleLoader ─► extract ─► AliasIndex     │
//! │   (discovery)      (loader)     (extractor)   (alias)       │
//! │                                                  │          │
//! │             DependencyResolver ◄─────────────────┘          │
//! │                    │                                        │
//! │                    ▼                                        │
//! │               schedule (Kahn) ─► init chunks ─► Registry    │
//! │                                       │                     │
//! │                                       ▼                     │
//! │                              PlacementGateway ─► Container  │
//! │                                                             │
//! │  CapacityMonitor (timeout) ─► disable + detach + notify     │
//! └─────────────────────────────────────────────────────────────┘
//!                 모두 PluginContext의 RunLoop 위에서 실행
//! ```
//!
//! ## 단계
//!
//! 1. **Discovery**: 루트 디렉토리에서 디스크립터 파일을 찾아 import 작업 생성
//! 2. **Import/검증**: 청크(기본 20) 단위로 모듈을 로드하고 레코드 추출
//! 3. **해석/스케줄**: 의존성 토큰을 정규 ID로, 위상 정렬로 초기화 순서 결정
//! 4. **초기화**: 청크(기본 5) 단위로 생성 → 시작 훅 → 등록 → 배치
//! 5. **런타임**: disable / enable / reload, 용량 모니터

mod alias;
mod capacity;
mod context;
mod discovery;
mod executor;
mod extractor;
mod lifecycle;
mod loader;
mod manager;
mod metadata;
mod placement;
mod registry;
mod resolver;
mod scheduler;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use alias::AliasIndex;
pub use capacity::{
    CapacityMonitor, CapacityVerdict, CAPACITY_REGIONS, NOTIFY_ICON, NOTIFY_TITLE,
    PANEL_WIDTH_PATH,
};
pub use context::PluginContext;
pub use discovery::{is_identifier, DiscoveryOutput, DiscoveryTask, PluginScanner, PluginScope};
pub use executor::{ChunkCursor, ExecutorStats, PLACEMENT_RETRIES};
pub use extractor::{extract, Extraction, SkipReason};
pub use loader::{FactoryTable, ManifestLoader, ManifestModule, ModuleLoader, StaticLoader};
pub use manager::{PlanEntry, PlanReport, PluginManager, PluginSummary, SkippedPlugin};
pub use metadata::{short_name, PluginMetadata, PluginRecord, BACKGROUND};
pub use placement::{
    container_attr, resolve_target, PlacedElement, PlacedIn, PlacementGateway, Target,
    PLACEMENT_TABLE,
};
pub use registry::{LiveInstance, PluginInstanceRegistry};
pub use resolver::{DependencyResolver, RegionRoot, ResolvedDeps, DEFAULT_REGION_ROOTS};
pub use scheduler::{schedule, Schedule, ScheduleDiagnostic};
pub use traits::{
    factory_fn, PlacementAction, Plugin, PluginCapability, PluginFactory, PluginModule,
    PluginStatus, StaticModule, WidgetSpec,
};

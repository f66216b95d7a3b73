//! Plugin traits - 핵심 플러그인 인터페이스

use super::context::PluginContext;
use super::metadata::PluginMetadata;
use crate::ui::WidgetRef;
use std::any::Any;
use std::rc::Rc;
use tessera_foundation::Result;

// ============================================================================
// PluginCapability - 플러그인이 구현한 훅 열거
// ============================================================================

/// 플러그인이 제공하는 선택적 훅
///
/// 엔진은 훅을 호출하기 전에 항상 `capabilities()`에 포함되었는지 확인합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginCapability {
    /// 생성 직후
    OnStart,

    /// 활성화 시
    OnEnable,

    /// 중지 시 (비활성화 두 번째 단계)
    OnStop,

    /// 비활성화 첫 단계
    OnDisable,

    /// 비활성화 마지막 단계
    Disable,

    /// 배치할 위젯 제공
    SetWidget,
}

impl PluginCapability {
    /// 로그용 훅 이름
    pub fn hook_name(&self) -> &'static str {
        match self {
            Self::OnStart => "on_start",
            Self::OnEnable => "on_enable",
            Self::OnStop => "on_stop",
            Self::OnDisable => "on_disable",
            Self::Disable => "disable",
            Self::SetWidget => "set_widget",
        }
    }
}

impl std::fmt::Display for PluginCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hook_name())
    }
}

// ============================================================================
// PluginStatus - 플러그인 상태
// ============================================================================

/// 플러그인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// 검증 통과, 아직 초기화 전
    Registered,

    /// 인스턴스 생성 완료
    Active,

    /// 비활성화됨
    Disabled,

    /// 생성자 또는 시작 훅 실패
    Failed,

    /// 의존성 문제로 스케줄되지 않음
    Unschedulable,
}

impl std::fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginStatus::Registered => write!(f, "registered"),
            PluginStatus::Active => write!(f, "active"),
            PluginStatus::Disabled => write!(f, "disabled"),
            PluginStatus::Failed => write!(f, "failed"),
            PluginStatus::Unschedulable => write!(f, "unschedulable"),
        }
    }
}

// ============================================================================
// WidgetSpec - set_widget 반환값
// ============================================================================

/// 배치 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementAction {
    /// 플러그인 그룹 박스에 추가
    #[default]
    Append,

    /// 대상 컨테이너의 콘텐츠로 설정
    SetContent,
}

/// 플러그인이 배치를 요청하는 위젯 목록
#[derive(Clone, Default)]
pub struct WidgetSpec {
    pub widgets: Vec<WidgetRef>,
    pub action: PlacementAction,
}

impl WidgetSpec {
    pub fn append(widgets: Vec<WidgetRef>) -> Self {
        Self {
            widgets,
            action: PlacementAction::Append,
        }
    }

    pub fn set_content(widget: WidgetRef) -> Self {
        Self {
            widgets: vec![widget],
            action: PlacementAction::SetContent,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

impl std::fmt::Debug for WidgetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.widgets.iter().map(|w| w.name()).collect();
        f.debug_struct("WidgetSpec")
            .field("widgets", &names)
            .field("action", &self.action)
            .finish()
    }
}

// ============================================================================
// Plugin trait - 플러그인 인스턴스
// ============================================================================

/// 플러그인 인스턴스
///
/// 모든 훅은 기본 구현이 비어 있고, 실제로 호출되는 훅은
/// `capabilities()`가 선언한 것뿐입니다.
///
/// ```ignore
/// struct Clock { label: WidgetRef }
///
/// impl Plugin for Clock {
///     fn capabilities(&self) -> &[PluginCapability] {
///         &[PluginCapability::SetWidget]
///     }
///     fn set_widget(&mut self) -> Option<WidgetSpec> {
///         Some(WidgetSpec::append(vec![self.label.clone()]))
///     }
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Plugin {
    /// 구현한 훅 목록
    fn capabilities(&self) -> &[PluginCapability] {
        &[]
    }

    fn supports(&self, capability: PluginCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_enable(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_disable(&mut self) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        Ok(())
    }

    /// 배치할 위젯 (None이면 배치 없음)
    fn set_widget(&mut self) -> Option<WidgetSpec> {
        None
    }

    /// 다운캐스팅용
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// PluginModule - 로드된 모듈 계약
// ============================================================================

/// 인스턴스 생성자
pub type PluginFactory = Rc<dyn Fn(&Rc<PluginContext>) -> Result<Box<dyn Plugin>>>;

/// 로드된 플러그인 모듈
///
/// 메타데이터 질의와 팩토리 질의 두 가지를 노출해야 유효한 플러그인입니다.
pub trait PluginModule {
    /// 메타데이터 질의. `Ok(None)`이면 모듈이 질의를 노출하지 않음
    fn metadata(&self, ctx: &PluginContext) -> Result<Option<PluginMetadata>>;

    /// 팩토리 질의
    fn factory(&self, ctx: &PluginContext) -> Option<PluginFactory>;
}

/// 컴파일된 모듈 (정적 로더, 테스트용)
#[derive(Clone, Default)]
pub struct StaticModule {
    metadata: Option<PluginMetadata>,
    factory: Option<PluginFactory>,
}

impl StaticModule {
    pub fn new(metadata: PluginMetadata, factory: PluginFactory) -> Self {
        Self {
            metadata: Some(metadata),
            factory: Some(factory),
        }
    }

    /// 메타데이터만 노출 (팩토리 누락)
    pub fn metadata_only(metadata: PluginMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            factory: None,
        }
    }
}

impl PluginModule for StaticModule {
    fn metadata(&self, _ctx: &PluginContext) -> Result<Option<PluginMetadata>> {
        Ok(self.metadata.clone())
    }

    fn factory(&self, _ctx: &PluginContext) -> Option<PluginFactory> {
        self.factory.clone()
    }
}

/// 클로저를 팩토리로 감싸기
pub fn factory_fn<F>(f: F) -> PluginFactory
where
    F: Fn(&Rc<PluginContext>) -> Result<Box<dyn Plugin>> + 'static,
{
    Rc::new(f)
}

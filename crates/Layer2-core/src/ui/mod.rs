//! UI - 툴킷 추상화
//!
//! 엔진은 실제 위젯 툴킷을 모릅니다. 호스트가 아래 트레이트를 구현한
//! 컨테이너를 `PluginContext`에 등록하고, 배치 게이트웨이는 이 트레이트로만
//! 위젯을 붙이고 뗍니다.
//!
//! - `Widget` - 배치 가능한 요소 (이름, 자연 폭)
//! - `Container` - 위젯을 담는 영역 (append / set_content / remove)
//! - `OverflowContainer` - 숨김 위젯 영역 (시스템 트레이 오버플로)
//! - `Toolkit` - 플러그인별 그룹 박스 생성
//!
//! `headless` 모듈은 화면 없이 동작하는 구현을 제공합니다 (CLI, 테스트).

pub mod headless;

use std::any::Any;
use std::rc::Rc;

pub use headless::{HeadlessBox, HeadlessLabel, HeadlessToolkit};

/// 공유 위젯 참조
pub type WidgetRef = Rc<dyn Widget>;

/// 공유 컨테이너 참조
pub type ContainerRef = Rc<dyn Container>;

/// 배치 가능한 UI 요소
pub trait Widget {
    /// 디버깅/로그용 이름
    fn name(&self) -> String;

    /// 자연 폭 (px)
    fn natural_width(&self) -> f64 {
        0.0
    }

    fn as_any(&self) -> &dyn Any;
}

/// 위젯을 담는 영역
pub trait Container {
    fn name(&self) -> String;

    /// 자식 위젯 추가
    fn append(&self, widget: &WidgetRef);

    /// 단일 콘텐츠 설정 (기존 콘텐츠 대체)
    fn set_content(&self, widget: &WidgetRef);

    /// 위젯 제거. 자식이나 콘텐츠가 아니면 false
    fn remove(&self, widget: &WidgetRef) -> bool;

    /// 모든 자식 제거
    fn remove_all(&self);

    /// 현재 할당된 폭 (px)
    fn allocated_width(&self) -> f64;
}

/// 숨김 위젯 영역
pub trait OverflowContainer {
    fn add_hidden_widget(&self, widget: &WidgetRef);

    fn remove_hidden_widget(&self, widget: &WidgetRef) -> bool;
}

/// 같은 객체를 가리키는 위젯/컨테이너 뷰 쌍
#[derive(Clone)]
pub struct Group {
    pub widget: WidgetRef,
    pub container: ContainerRef,
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.widget.name())
            .finish()
    }
}

/// 위젯 팩토리
pub trait Toolkit {
    /// 이름 붙은 그룹 박스 생성
    fn new_group(&self, name: &str) -> Group;
}

/// 두 위젯 참조가 같은 객체인지 (vtable 무시)
pub fn same_widget(a: &WidgetRef, b: &WidgetRef) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

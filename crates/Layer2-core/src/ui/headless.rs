//! Headless toolkit
//!
//! 화면 없이 위젯 트리만 유지하는 구현. 박스의 할당 폭은 자식들의
//! 자연 폭 합계입니다.

use super::{
    same_widget, Container, ContainerRef, Group, OverflowContainer, Toolkit, Widget, WidgetRef,
};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ============================================================================
// HeadlessLabel
// ============================================================================

/// 고정 폭 라벨
#[derive(Debug)]
pub struct HeadlessLabel {
    name: String,
    width: Cell<f64>,
}

impl HeadlessLabel {
    pub fn new(name: impl Into<String>, width: f64) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            width: Cell::new(width),
        })
    }

    pub fn set_width(&self, width: f64) {
        self.width.set(width);
    }
}

impl Widget for HeadlessLabel {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn natural_width(&self) -> f64 {
        self.width.get()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// HeadlessBox
// ============================================================================

/// 자식 목록과 단일 콘텐츠 슬롯을 가진 박스
#[derive(Default)]
pub struct HeadlessBox {
    name: String,
    children: RefCell<Vec<WidgetRef>>,
    content: RefCell<Option<WidgetRef>>,
    hidden: RefCell<Vec<WidgetRef>>,
}

impl HeadlessBox {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            ..Default::default()
        })
    }

    /// 자식 이름 목록 (추가 순서)
    pub fn child_names(&self) -> Vec<String> {
        self.children.borrow().iter().map(|w| w.name()).collect()
    }

    pub fn children(&self) -> Vec<WidgetRef> {
        self.children.borrow().clone()
    }

    pub fn content(&self) -> Option<WidgetRef> {
        self.content.borrow().clone()
    }

    /// 오버플로 영역으로 쓰일 때 숨겨진 위젯 이름
    pub fn hidden_names(&self) -> Vec<String> {
        self.hidden.borrow().iter().map(|w| w.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.children.borrow().len() + usize::from(self.content.borrow().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 같은 박스의 위젯/컨테이너 뷰
    pub fn into_group(self: Rc<Self>) -> Group {
        let widget: WidgetRef = self.clone();
        let container: ContainerRef = self;
        Group { widget, container }
    }
}

impl std::fmt::Debug for HeadlessBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessBox")
            .field("name", &self.name)
            .field("children", &self.child_names())
            .finish()
    }
}

impl Widget for HeadlessBox {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn natural_width(&self) -> f64 {
        self.allocated_width()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Container for HeadlessBox {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn append(&self, widget: &WidgetRef) {
        self.children.borrow_mut().push(Rc::clone(widget));
    }

    fn set_content(&self, widget: &WidgetRef) {
        *self.content.borrow_mut() = Some(Rc::clone(widget));
    }

    fn remove(&self, widget: &WidgetRef) -> bool {
        let mut content = self.content.borrow_mut();
        if content.as_ref().is_some_and(|c| same_widget(c, widget)) {
            *content = None;
            return true;
        }

        let mut children = self.children.borrow_mut();
        let before = children.len();
        children.retain(|c| !same_widget(c, widget));
        children.len() != before
    }

    fn remove_all(&self) {
        self.children.borrow_mut().clear();
        *self.content.borrow_mut() = None;
    }

    fn allocated_width(&self) -> f64 {
        let children: f64 = self
            .children
            .borrow()
            .iter()
            .map(|w| w.natural_width())
            .sum();
        let content = self
            .content
            .borrow()
            .as_ref()
            .map(|w| w.natural_width())
            .unwrap_or(0.0);
        children + content
    }
}

impl OverflowContainer for HeadlessBox {
    fn add_hidden_widget(&self, widget: &WidgetRef) {
        self.hidden.borrow_mut().push(Rc::clone(widget));
    }

    fn remove_hidden_widget(&self, widget: &WidgetRef) -> bool {
        let mut hidden = self.hidden.borrow_mut();
        let before = hidden.len();
        hidden.retain(|w| !same_widget(w, widget));
        hidden.len() != before
    }
}

// ============================================================================
// HeadlessToolkit
// ============================================================================

/// `HeadlessBox` 그룹을 만드는 툴킷
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessToolkit;

impl Toolkit for HeadlessToolkit {
    fn new_group(&self, name: &str) -> Group {
        HeadlessBox::new(name).into_group()
    }
}

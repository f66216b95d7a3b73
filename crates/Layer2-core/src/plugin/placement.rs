//! Placement Gateway - 배치 문자열을 컨테이너로 연결
//!
//! 배치 문자열은 고정 테이블로 컨테이너 속성 이름에 매핑됩니다.
//! 매핑되지 않은 문자열은 검증 에러, 아직 등록되지 않은 컨테이너는
//! 재시도 가능한 `NotReady`, `background`는 배치 없음입니다.
//!
//! 숨김 플러그인의 위젯은 오버플로 컨테이너로 보내고, 위젯이 여러 개면
//! 하나의 그룹으로 묶어 함께 붙이고 뗍니다.

use super::context::PluginContext;
use super::metadata::{PluginRecord, BACKGROUND};
use super::traits::{PlacementAction, WidgetSpec};
use crate::ui::{ContainerRef, Group, OverflowContainer, WidgetRef};
use std::collections::HashMap;
use std::rc::Rc;
use tessera_foundation::{Error, Result};
use tracing::{debug, warn};

/// 배치 문자열 -> 컨테이너 속성
pub const PLACEMENT_TABLE: &[(&str, &str)] = &[
    ("top-panel", "top_panel"),
    ("top-panel-left", "top_panel_box_left"),
    ("top-panel-box-widgets-left", "top_panel_box_widgets_left"),
    ("top-panel-center", "top_panel_box_center"),
    ("top-panel-right", "top_panel_box_right"),
    ("top-panel-systray", "top_panel_box_systray"),
    ("top-panel-after-systray", "top_panel_box_for_buttons"),
    ("bottom-panel", "bottom_panel"),
    ("bottom-panel-left", "bottom_panel_box_left"),
    ("bottom-panel-center", "bottom_panel_box_center"),
    ("bottom-panel-right", "bottom_panel_box_right"),
    ("left-panel", "left_panel"),
    ("left-panel-top", "left_panel_box_top"),
    ("left-panel-center", "left_panel_box_center"),
    ("left-panel-bottom", "left_panel_box_bottom"),
    ("right-panel", "right_panel"),
    ("right-panel-top", "right_panel_box_top"),
    ("right-panel-center", "right_panel_box_center"),
    ("right-panel-bottom", "right_panel_box_bottom"),
    (BACKGROUND, BACKGROUND),
];

/// 배치 문자열의 컨테이너 속성 이름
pub fn container_attr(placement: &str) -> Option<&'static str> {
    PLACEMENT_TABLE
        .iter()
        .find(|(name, _)| *name == placement)
        .map(|(_, attr)| *attr)
}

/// 배치 대상
#[derive(Clone)]
pub enum Target {
    Background,
    Container(ContainerRef),
}

/// 배치 대상 조회
pub fn resolve_target(ctx: &PluginContext, placement: &str, plugin: &str) -> Result<Target> {
    let attr = container_attr(placement).ok_or_else(|| {
        Error::Placement(format!("'{}' for plugin {}", placement, plugin))
    })?;
    if attr == BACKGROUND {
        return Ok(Target::Background);
    }
    ctx.container(attr)
        .map(Target::Container)
        .ok_or_else(|| Error::NotReady(format!("{} (plugin {})", attr, plugin)))
}

// ============================================================================
// PlacedElement
// ============================================================================

/// 위젯이 붙은 곳
#[derive(Clone)]
pub enum PlacedIn {
    Container(ContainerRef),
    Overflow(Rc<dyn OverflowContainer>),
}

/// 플러그인별로 배치한 요소
#[derive(Clone)]
pub struct PlacedElement {
    pub placed_in: PlacedIn,
    pub element: WidgetRef,
}

impl PlacedElement {
    fn detach(&self) -> bool {
        match &self.placed_in {
            PlacedIn::Container(c) => c.remove(&self.element),
            PlacedIn::Overflow(o) => o.remove_hidden_widget(&self.element),
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.placed_in, PlacedIn::Overflow(_))
    }
}

impl std::fmt::Debug for PlacedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.placed_in {
            PlacedIn::Container(c) => c.name(),
            PlacedIn::Overflow(_) => "<overflow>".to_string(),
        };
        f.debug_struct("PlacedElement")
            .field("target", &target)
            .field("element", &self.element.name())
            .finish()
    }
}

// ============================================================================
// PlacementGateway
// ============================================================================

/// 배치 게이트웨이
#[derive(Default)]
pub struct PlacementGateway {
    /// 플러그인 ID -> 배치한 요소
    placed: HashMap<String, PlacedElement>,

    /// 플러그인 ID -> `<short>_box` 그룹
    groups: HashMap<String, Group>,

    /// 일반 영역 배치 순서 (마지막이 가장 최근)
    history: Vec<String>,
}

impl PlacementGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 플러그인 위젯 배치
    pub fn place(&mut self, ctx: &PluginContext, record: &PluginRecord, spec: &WidgetSpec) -> Result<()> {
        if spec.is_empty() {
            debug!("Plugin {} returned no widgets", record.id);
            return Ok(());
        }

        let target = match resolve_target(ctx, &record.placement, &record.id)? {
            Target::Background => {
                debug!("Plugin {} is a background plugin, nothing to place", record.id);
                return Ok(());
            }
            Target::Container(container) => container,
        };

        if self.is_hidden(ctx, record) {
            match ctx.overflow_container() {
                Some(overflow) => {
                    self.place_hidden(ctx, record, spec, overflow);
                    return Ok(());
                }
                None => warn!(
                    "Plugin {} is hidden but no overflow container is registered, placing it normally",
                    record.id
                ),
            }
        }

        let element = match spec.action {
            PlacementAction::Append => self.append_to_group(ctx, record, spec, &target),
            PlacementAction::SetContent => {
                for widget in &spec.widgets {
                    target.set_content(widget);
                }
                // 마지막 set_content가 남음
                Rc::clone(&spec.widgets[spec.widgets.len() - 1])
            }
        };

        debug!("Placed plugin {} into {}", record.id, target.name());
        self.placed.insert(
            record.id.clone(),
            PlacedElement {
                placed_in: PlacedIn::Container(target),
                element,
            },
        );
        self.history.retain(|id| *id != record.id);
        self.history.push(record.id.clone());
        Ok(())
    }

    fn is_hidden(&self, ctx: &PluginContext, record: &PluginRecord) -> bool {
        record.hidden || ctx.get_config(&[record.id.as_str(), "hide_in_systray"], false)
    }

    fn append_to_group(
        &mut self,
        ctx: &PluginContext,
        record: &PluginRecord,
        spec: &WidgetSpec,
        target: &ContainerRef,
    ) -> WidgetRef {
        let group = match self.groups.get(&record.id) {
            Some(group) => {
                group.container.remove_all();
                group.clone()
            }
            None => {
                let group = ctx
                    .toolkit()
                    .new_group(&format!("{}_box", record.short_name));
                target.append(&group.widget);
                self.groups.insert(record.id.clone(), group.clone());
                group
            }
        };

        for widget in &spec.widgets {
            group.container.append(widget);
        }
        group.widget
    }

    fn place_hidden(
        &mut self,
        ctx: &PluginContext,
        record: &PluginRecord,
        spec: &WidgetSpec,
        overflow: Rc<dyn OverflowContainer>,
    ) {
        let element = if spec.widgets.len() == 1 {
            Rc::clone(&spec.widgets[0])
        } else {
            let group = ctx
                .toolkit()
                .new_group(&format!("{}_overflow_box", record.short_name));
            for widget in &spec.widgets {
                group.container.append(widget);
            }
            group.widget
        };

        overflow.add_hidden_widget(&element);
        self.history.retain(|id| *id != record.id);
        debug!("Placed plugin {} into the overflow container", record.id);
        self.placed.insert(
            record.id.clone(),
            PlacedElement {
                placed_in: PlacedIn::Overflow(overflow),
                element,
            },
        );
    }

    /// 배치한 요소 분리. 분리한 것이 있으면 true
    pub fn detach(&mut self, id: &str) -> bool {
        self.groups.remove(id);
        self.history.retain(|placed| placed != id);
        let Some(placed) = self.placed.remove(id) else {
            return false;
        };

        let removed = placed.detach();
        if removed {
            debug!("Detached {:?} of plugin {}", placed, id);
        } else {
            warn!("Element of plugin {} was already gone from its container", id);
        }
        removed
    }

    pub fn placed(&self, id: &str) -> Option<&PlacedElement> {
        self.placed.get(id)
    }

    /// 아직 붙어 있는 가장 최근 일반 배치
    pub fn last_placed(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }
}

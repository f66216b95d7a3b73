//! 내장 플러그인 팩토리
//!
//! 디스크립터의 `factory` 키(생략 시 모듈 이름)로 아래 팩토리를 찾습니다.
//!
//! | key          | 역할                                            |
//! |--------------|-------------------------------------------------|
//! | `top_panel`  | 상단 패널 영역 컨테이너와 오버플로 영역 등록    |
//! | `label`      | 고정 폭 라벨 하나를 배치                        |
//! | `heartbeat`  | 배치 없는 백그라운드 서비스                     |

use std::any::Any;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tessera_core::plugin::{factory_fn, FactoryTable, Plugin, PluginCapability, WidgetSpec};
use tessera_core::ui::{HeadlessBox, HeadlessLabel, WidgetRef};
use tessera_core::PluginContext;
use tessera_foundation::Result;
use tracing::info;

/// 상단 패널이 만드는 영역 컨테이너
pub const TOP_PANEL_REGIONS: &[&str] = &[
    "top_panel_box_left",
    "top_panel_box_widgets_left",
    "top_panel_box_center",
    "top_panel_box_right",
    "top_panel_box_systray",
    "top_panel_box_for_buttons",
];

/// 라벨 기본 폭 (px)
const DEFAULT_LABEL_WIDTH: f64 = 48.0;

static LABELS: AtomicUsize = AtomicUsize::new(0);

/// 내장 팩토리 테이블
pub fn factories() -> FactoryTable {
    FactoryTable::new()
        .with("top_panel", factory_fn(|ctx| Ok(Box::new(TopPanel::new(ctx)))))
        .with("label", factory_fn(|ctx| Ok(Box::new(Label::new(ctx)))))
        .with("heartbeat", factory_fn(|_ctx| Ok(Box::new(Heartbeat::default()))))
}

// ============================================================================
// TopPanel - 리전 루트
// ============================================================================

struct TopPanel;

impl TopPanel {
    fn new(ctx: &Rc<PluginContext>) -> Self {
        ctx.register_container("top_panel", HeadlessBox::new("top_panel"));
        for attr in TOP_PANEL_REGIONS {
            ctx.register_container(*attr, HeadlessBox::new(*attr));
        }
        ctx.register_overflow_container(HeadlessBox::new("systray_overflow"));
        Self
    }
}

impl Plugin for TopPanel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Label - 단일 위젯
// ============================================================================

struct Label {
    widget: WidgetRef,
}

impl Label {
    fn new(ctx: &Rc<PluginContext>) -> Self {
        let width = ctx.get_config(&["label", "width"], DEFAULT_LABEL_WIDTH);
        let n = LABELS.fetch_add(1, Ordering::Relaxed);
        Self {
            widget: HeadlessLabel::new(format!("label_{}", n), width),
        }
    }
}

impl Plugin for Label {
    fn capabilities(&self) -> &[PluginCapability] {
        &[PluginCapability::SetWidget]
    }

    fn set_widget(&mut self) -> Option<WidgetSpec> {
        Some(WidgetSpec::append(vec![Rc::clone(&self.widget)]))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Heartbeat - 백그라운드 서비스
// ============================================================================

#[derive(Default)]
struct Heartbeat {
    started: Option<Instant>,
}

impl Plugin for Heartbeat {
    fn capabilities(&self) -> &[PluginCapability] {
        &[PluginCapability::OnStart, PluginCapability::OnStop]
    }

    fn on_start(&mut self) -> Result<()> {
        self.started = Some(Instant::now());
        info!("Heartbeat service started");
        Ok(())
    }

    fn on_stop(&mut self) -> Result<()> {
        if let Some(started) = self.started.take() {
            info!("Heartbeat service stopped after {:?}", started.elapsed());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

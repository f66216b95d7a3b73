//! Capacity Monitor - 상단 패널 공간 예산 검사
//!
//! 시작이 끝난 뒤 좌/중/우 영역의 할당 폭이 패널 폭의 1/3을 넘으면
//! 마지막으로 배치된 플러그인을 비활성화하고 사용자에게 알립니다.
//! 한 번의 평가에서 교정 조치는 최대 한 번이며, 조치 후에는 멈춥니다.

use super::context::PluginContext;
use super::manager::Engine;
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// 검사 대상 (컨테이너 속성, 표시 이름)
pub const CAPACITY_REGIONS: &[(&str, &str)] = &[
    ("top_panel_box_right", "Top Panel: Right Space"),
    ("top_panel_box_center", "Top Panel: Center Space"),
    ("top_panel_box_left", "Top Panel: Left Space"),
];

/// 패널 폭 설정 경로
pub const PANEL_WIDTH_PATH: &[&str] = &["panel", "top", "width"];

/// 알림 제목 / 아이콘
pub const NOTIFY_TITLE: &str = "Plugin Loader";
pub const NOTIFY_ICON: &str = "plugins-symbolic";

/// 한 번의 평가 결과
#[derive(Debug, Clone, PartialEq)]
pub enum CapacityVerdict {
    /// 영역 컨테이너가 아직 없음 (시도 횟수를 쓰지 않음)
    ContainersMissing,
    /// 최대 시도 횟수 도달
    Exhausted,
    /// 시작이 아직 끝나지 않음
    StartupPending,
    /// 패널 폭 설정이 없거나 0 이하
    WidthUnavailable,
    /// 모든 영역이 예산 안
    WithinBudget,
    /// 예산 초과
    Violation {
        region: String,
        label: String,
        allocated: f64,
        max: f64,
    },
}

impl CapacityVerdict {
    /// 다음 주기에 다시 검사해야 하는지
    pub fn keeps_running(&self) -> bool {
        !matches!(self, Self::Exhausted | Self::Violation { .. })
    }
}

/// 용량 모니터
#[derive(Debug, Clone)]
pub struct CapacityMonitor {
    regions: Vec<(String, String)>,
    max_attempts: u32,
    attempts: u32,
}

impl CapacityMonitor {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            regions: CAPACITY_REGIONS
                .iter()
                .map(|(attr, label)| (attr.to_string(), label.to_string()))
                .collect(),
            max_attempts,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 한 번 평가
    pub fn evaluate(&mut self, ctx: &PluginContext) -> CapacityVerdict {
        if self.regions.iter().any(|(attr, _)| !ctx.has_container(attr)) {
            return CapacityVerdict::ContainersMissing;
        }
        if self.attempts >= self.max_attempts {
            return CapacityVerdict::Exhausted;
        }
        self.attempts += 1;

        if !ctx.startup_finished() {
            return CapacityVerdict::StartupPending;
        }

        let width: f64 = ctx.get_config(PANEL_WIDTH_PATH, 0.0);
        if width <= 0.0 {
            return CapacityVerdict::WidthUnavailable;
        }

        let max = width / 3.0;
        for (attr, label) in &self.regions {
            let Some(container) = ctx.container(attr) else {
                continue;
            };
            let allocated = container.allocated_width();
            if allocated > max {
                return CapacityVerdict::Violation {
                    region: attr.clone(),
                    label: label.clone(),
                    allocated,
                    max,
                };
            }
        }
        CapacityVerdict::WithinBudget
    }
}

impl Engine {
    /// 평가 후 필요하면 교정 조치
    pub(crate) fn capacity_pass(&self, monitor: &mut CapacityMonitor) -> ControlFlow<()> {
        let verdict = monitor.evaluate(&self.ctx);
        match &verdict {
            CapacityVerdict::Exhausted => {
                warn!("Layout capacity check reached max attempts, stopping");
            }
            CapacityVerdict::WidthUnavailable => {
                warn!("Panel width not configured or invalid, skipping capacity check");
            }
            CapacityVerdict::Violation {
                label,
                allocated,
                max,
                ..
            } => {
                warn!(
                    "Space violation detected in {}. Allocated: {:.2}px, Max: {:.2}px",
                    label, allocated, max
                );
                self.retract_last_placed(label);
            }
            other => debug!("Capacity check: {:?}", other),
        }

        if verdict.keeps_running() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    fn retract_last_placed(&self, label: &str) {
        let last = self
            .state
            .borrow()
            .placement
            .last_placed()
            .map(str::to_string);
        let Some(id) = last else {
            warn!("No plugin has been placed, nothing to retract for {}", label);
            return;
        };

        self.disable(&id);
        self.detach(&id);
        self.ctx.notify(
            NOTIFY_TITLE,
            &format!(
                "{} disabled due to violation in {}. Removed element for layout stability.",
                id, label
            ),
            NOTIFY_ICON,
        );
    }
}

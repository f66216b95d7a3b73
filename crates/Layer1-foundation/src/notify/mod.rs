//! Notify - 데스크톱 알림
//!
//! 엔진은 용량 모니터의 교정 조치만 사용자에게 알립니다.
//! 실제 전달은 `notify-send`에 위임하고, 없으면 로그로 대체합니다.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::Command;
use std::rc::Rc;
use tracing::{debug, error, info};

/// 알림 한 건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: icon.into(),
        }
    }
}

/// 알림 전달자
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

// ============================================================================
// DesktopNotifier - notify-send
// ============================================================================

/// `notify-send` 기반 알림
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: PathBuf,
}

impl DesktopNotifier {
    /// PATH에서 notify-send 탐색
    pub fn detect() -> Option<Self> {
        which::which("notify-send")
            .ok()
            .map(|program| Self { program })
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: Notification) {
        let spawned = Command::new(&self.program)
            .arg("-i")
            .arg(&notification.icon)
            .arg(&notification.title)
            .arg(&notification.body)
            .spawn();

        match spawned {
            Ok(mut child) => {
                // 조정 스레드를 막지 않도록 별도 스레드에서 회수
                std::thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        debug!("notify-send did not exit cleanly: {}", e);
                    }
                });
            }
            Err(e) => error!("Failed to run {}: {}", self.program.display(), e),
        }
    }
}

// ============================================================================
// LogNotifier / MemoryNotifier
// ============================================================================

/// 로그로만 남기는 알림 (notify-send가 없을 때)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        info!("[{}] {}", notification.title, notification.body);
    }
}

/// 알림을 메모리에 기록 (헤드리스 실행, 테스트)
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 보낸 알림
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        info!("[{}] {}", notification.title, notification.body);
        self.sent.borrow_mut().push(notification);
    }
}

/// 사용 가능한 최선의 알림 전달자
pub fn default_notifier() -> Rc<dyn Notifier> {
    match DesktopNotifier::detect() {
        Some(notifier) => Rc::new(notifier),
        None => {
            debug!("notify-send not found, notifications go to the log");
            Rc::new(LogNotifier)
        }
    }
}

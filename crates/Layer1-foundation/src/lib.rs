//! # tessera-foundation
//!
//! Foundation layer for Tessera:
//! - Error: 중앙 에러 타입 (플러그인 단위 실패 분류)
//! - Config: TOML 설정 저장소, 플러그인 로더 설정
//! - RunLoop: 단일 스레드 협력형 실행 루프
//! - Notify: 데스크톱 알림
//! - Paths: 플러그인 루트 디렉토리
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  tessera-core (plugin engine)                           │
//! │        │ idle_add / timeout_add     │ get_or / update   │
//! │        ▼                            ▼                   │
//! │   RunLoop (one thread)        ConfigStore (config.toml) │
//! │        │                                                │
//! │        └──► Notifier (notify-send | log)                │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod paths;
pub mod runloop;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{ConfigStore, LoaderSettings, APP_DIR, CONFIG_FILE, LOADER_SECTION};

// ============================================================================
// RunLoop (실행 루프)
// ============================================================================
pub use runloop::{RunLoop, SourceFn, SourceId};

// ============================================================================
// Notify (알림)
// ============================================================================
pub use notify::{
    default_notifier, DesktopNotifier, LogNotifier, MemoryNotifier, Notification, Notifier,
};

// ============================================================================
// Paths (경로)
// ============================================================================
pub use paths::{builtin_plugins_dir, user_plugins_dir, BUILTIN_PLUGINS_ENV};

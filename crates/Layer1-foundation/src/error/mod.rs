//! Error types for Tessera
//!
//! 모든 에러를 중앙에서 관리
//!
//! 플러그인 엔진의 실패는 항상 해당 플러그인 하나로 격리됩니다.
//! 어떤 에러도 패널 프로세스 전체를 종료시키지 않습니다.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Tessera 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 플러그인 엔진 관련
    // ========================================================================
    /// 디렉토리를 읽을 수 없음 (스캔은 계속 진행)
    #[error("Discovery error at {}: {message}", path.display())]
    Discovery { path: PathBuf, message: String },

    /// 계약 함수 누락, 잘못된 deps 목록, 알 수 없는 배치 문자열
    #[error("Validation error in plugin {plugin}: {message}")]
    Validation { plugin: String, message: String },

    /// 해결되지 않은 의존성 또는 순환 의존성
    #[error("Dependency error in plugin {plugin}: {message}")]
    Dependency { plugin: String, message: String },

    /// 생성자 또는 시작 훅 실패
    #[error("Initialization of plugin {plugin} failed: {message}")]
    Initialization { plugin: String, message: String },

    /// 비활성화/활성화 훅 실패
    #[error("Hook {hook} of plugin {plugin} failed: {message}")]
    LifecycleHook {
        plugin: String,
        hook: String,
        message: String,
    },

    /// 플러그인 코드가 반환하는 일반 에러
    #[error("Plugin error: {0}")]
    Plugin(String),

    // ========================================================================
    // 배치 (Placement) 관련
    // ========================================================================
    /// 매핑되지 않은 배치 문자열 (하드 에러)
    #[error("Invalid placement: {0}")]
    Placement(String),

    /// 컨테이너가 아직 생성되지 않음 (나중에 재시도 가능)
    #[error("Container not ready: {0}")]
    NotReady(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotReady(_))
    }

    /// 특정 플러그인에 귀속되는 에러라면 해당 플러그인 ID
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Error::Validation { plugin, .. }
            | Error::Dependency { plugin, .. }
            | Error::Initialization { plugin, .. }
            | Error::LifecycleHook { plugin, .. } => Some(plugin),
            _ => None,
        }
    }

    /// Discovery 에러 생성 헬퍼
    pub fn discovery(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Validation 에러 생성 헬퍼
    pub fn validation(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Dependency 에러 생성 헬퍼
    pub fn dependency(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Dependency {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Initialization 에러 생성 헬퍼
    pub fn initialization(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Initialization {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// LifecycleHook 에러 생성 헬퍼
    pub fn hook(
        plugin: impl Into<String>,
        hook: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::LifecycleHook {
            plugin: plugin.into(),
            hook: hook.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

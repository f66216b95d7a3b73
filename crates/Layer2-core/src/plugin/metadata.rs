//! Plugin Metadata - 플러그인 자기 기술 정보
//!
//! 모듈의 메타데이터 질의가 반환하는 값과, 추출 후 엔진이 보관하는
//! 플러그인 레코드를 정의합니다.
//!
//! ```toml
//! [plugin]
//! id = "org.tessera.plugins.clock"
//! container = "top-panel-center"
//! priority = 10
//! index = 2
//! deps = ["top_panel", "calendar"]
//! ```

use super::traits::{PluginFactory, PluginModule};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tessera_foundation::{Error, Result};

/// 배치 없이 실행되는 플러그인의 배치 문자열
pub const BACKGROUND: &str = "background";

fn default_container() -> String {
    BACKGROUND.to_string()
}

fn default_true() -> bool {
    true
}

/// 플러그인 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// 정규 ID (점으로 구분된 이름)
    pub id: String,

    /// 배치 문자열
    #[serde(default = "default_container")]
    pub container: String,

    /// 높을수록 먼저 초기화
    #[serde(default)]
    pub priority: i64,

    /// 같은 priority 안에서 낮을수록 먼저
    #[serde(default)]
    pub index: i64,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 의존성 토큰 (ID, 짧은 이름, 모듈 이름)
    #[serde(default)]
    pub deps: Vec<String>,

    /// 오버플로 영역으로 보낼지 여부
    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 팩토리 테이블 키 (없으면 모듈 이름)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
}

impl PluginMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            container: default_container(),
            priority: 0,
            index: 0,
            enabled: true,
            deps: Vec::new(),
            hidden: false,
            name: None,
            version: None,
            description: None,
            factory: None,
        }
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = index;
        self
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// 짧은 이름 (ID의 마지막 세그먼트)
    pub fn short_name(&self) -> &str {
        short_name(&self.id)
    }

    /// 구조 검증 (배치 문자열의 유효성은 배치 게이트웨이가 판단)
    pub fn validate(&self) -> Result<()> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(Error::validation("<unknown>", "metadata has an empty id"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::validation(id, "id must not contain whitespace"));
        }
        if id.starts_with('.') || id.ends_with('.') {
            return Err(Error::validation(id, "id must not start or end with '.'"));
        }
        if self.container.trim().is_empty() {
            return Err(Error::validation(id, "container must not be empty"));
        }
        if let Some(pos) = self.deps.iter().position(|d| d.trim().is_empty()) {
            return Err(Error::validation(
                id,
                format!("deps entry {} is empty", pos),
            ));
        }
        Ok(())
    }
}

/// 정규 ID의 마지막 세그먼트
pub fn short_name(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

// ============================================================================
// PluginRecord - 검증을 통과한 플러그인
// ============================================================================

/// 추출 단계를 통과한 플러그인 레코드
#[derive(Clone)]
pub struct PluginRecord {
    pub id: String,
    pub short_name: String,
    pub module_name: String,
    pub import_path: String,
    pub placement: String,
    pub priority: i64,
    pub index: i64,
    pub deps: Vec<String>,
    pub hidden: bool,

    /// 로드된 모듈 (재로드 전까지 유지)
    pub module: Rc<dyn PluginModule>,

    /// 인스턴스 생성자
    pub factory: PluginFactory,
}

impl PluginRecord {
    pub fn new(
        metadata: PluginMetadata,
        module_name: impl Into<String>,
        import_path: impl Into<String>,
        module: Rc<dyn PluginModule>,
        factory: PluginFactory,
    ) -> Self {
        Self {
            id: metadata.id.clone(),
            short_name: metadata.short_name().to_string(),
            module_name: module_name.into(),
            import_path: import_path.into(),
            placement: metadata.container.clone(),
            priority: metadata.priority,
            index: metadata.index,
            deps: metadata.deps.clone(),
            hidden: metadata.hidden,
            module,
            factory,
        }
    }

    pub fn is_background(&self) -> bool {
        self.placement == BACKGROUND
    }
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("id", &self.id)
            .field("module_name", &self.module_name)
            .field("placement", &self.placement)
            .field("priority", &self.priority)
            .field("index", &self.index)
            .field("deps", &self.deps)
            .finish()
    }
}

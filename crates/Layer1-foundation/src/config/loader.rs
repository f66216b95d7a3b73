//! Loader Settings - 플러그인 로더 설정
//!
//! `[plugin_loader]` 섹션. 모든 필드는 생략 가능합니다.

use serde::{Deserialize, Serialize};

/// 설정 섹션 이름
pub const LOADER_SECTION: &str = "plugin_loader";

/// 플러그인 로더 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// import/검증 단계의 청크 크기 (run-loop 한 턴당 처리 개수)
    pub import_chunk_size: usize,

    /// 초기화 단계의 청크 크기
    pub init_chunk_size: usize,

    /// 스캔에서 제외할 디렉토리 이름
    pub ignored_dirs: Vec<String>,

    /// 플러그인 디스크립터 확장자
    pub extension: String,

    /// 레이아웃 용량 검사 최대 시도 횟수
    pub capacity_max_attempts: u32,

    /// 레이아웃 용량 검사 주기 (ms)
    pub capacity_interval_ms: u64,

    /// 해결되지 않은 의존성을 하드 에러로 취급
    pub strict_dependencies: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            import_chunk_size: 20,
            init_chunk_size: 5,
            ignored_dirs: vec!["examples".to_string(), "__pycache__".to_string()],
            extension: "toml".to_string(),
            capacity_max_attempts: 30,
            capacity_interval_ms: 100,
            strict_dependencies: true,
        }
    }
}

impl LoaderSettings {
    /// 0 청크 크기는 진행이 불가능하므로 최소 1로 보정
    pub fn normalized(mut self) -> Self {
        self.import_chunk_size = self.import_chunk_size.max(1);
        self.init_chunk_size = self.init_chunk_size.max(1);
        self
    }

    pub fn with_import_chunk_size(mut self, size: usize) -> Self {
        self.import_chunk_size = size;
        self
    }

    pub fn with_init_chunk_size(mut self, size: usize) -> Self {
        self.init_chunk_size = size;
        self
    }

    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }
}

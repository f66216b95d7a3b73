//! Config - 통합 설정 관리
//!
//! - `store.rs` - ConfigStore (TOML, 경로 기반 조회/갱신)
//! - `loader.rs` - 플러그인 로더 설정 (청크 크기, 무시 디렉토리 등)

mod loader;
mod store;

pub use loader::{LoaderSettings, LOADER_SECTION};
pub use store::{ConfigStore, APP_DIR, CONFIG_FILE};

//! Paths - 플러그인 루트 디렉토리 탐색

use crate::config::APP_DIR;
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

/// 내장 플러그인 디렉토리를 강제 지정하는 환경 변수
pub const BUILTIN_PLUGINS_ENV: &str = "TESSERA_BUILTIN_PLUGINS";

/// 사용자 플러그인 디렉토리 (~/.local/share/tessera/plugins)
pub fn user_plugins_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| Error::Config("Cannot find data directory".to_string()))?;
    Ok(dir.join(APP_DIR).join("plugins"))
}

/// 내장 플러그인 디렉토리
///
/// 우선순위: 환경 변수 → 설치 경로(`<prefix>/share/tessera/plugins`) → 개발 경로
pub fn builtin_plugins_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(BUILTIN_PLUGINS_ENV) {
        let dir = PathBuf::from(dir);
        debug!("Using {} = {}", BUILTIN_PLUGINS_ENV, dir.display());
        return Ok(dir);
    }

    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(bin_dir) = exe.parent() {
            candidates.push(bin_dir.join("..").join("share").join(APP_DIR).join("plugins"));
            candidates.push(bin_dir.join("plugins"));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("plugins"));
    }

    for (i, path) in candidates.iter().enumerate() {
        if path.is_dir() {
            if i > 0 {
                warn!("Falling back to dev plugin path: {}", path.display());
            }
            return Ok(path.clone());
        }
    }

    Err(Error::NotFound(
        "Plugins directory not found in any known location".to_string(),
    ))
}

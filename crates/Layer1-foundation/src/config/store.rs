//! Config Store - TOML 설정 저장소
//!
//! 호스트가 플러그인 엔진에 제공하는 "경로로 값 조회 (기본값 포함)" 기능.
//! 파일 기반일 경우 `update` 호출 시 즉시 디스크에 기록합니다.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 애플리케이션 디렉토리 이름
pub const APP_DIR: &str = "tessera";

/// 설정 파일명
pub const CONFIG_FILE: &str = "config.toml";

/// TOML 설정 저장소
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    /// 백업 파일 경로 (None이면 메모리 전용)
    path: Option<PathBuf>,

    /// 루트 테이블
    root: toml::Table,
}

impl ConfigStore {
    /// 메모리 전용 저장소
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 기본 설정 파일 경로 (~/.config/tessera/config.toml)
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?;
        Ok(dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// 파일에서 로드 (파일이 없으면 빈 설정)
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let root = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            content.parse::<toml::Table>()?
        } else {
            debug!("Config file {} not found, starting empty", path.display());
            toml::Table::new()
        };

        Ok(Self {
            path: Some(path),
            root,
        })
    }

    /// 문자열에서 파싱 (메모리 전용)
    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self {
            path: None,
            root: content.parse::<toml::Table>()?,
        })
    }

    /// 백업 파일 경로
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 경로로 값 조회
    pub fn get(&self, path: &[&str]) -> Option<&toml::Value> {
        let (first, rest) = path.split_first()?;
        let mut value = self.root.get(*first)?;
        for key in rest {
            value = value.as_table()?.get(*key)?;
        }
        Some(value)
    }

    /// 경로로 값 조회 (없거나 타입이 맞지 않으면 기본값)
    pub fn get_or<T: DeserializeOwned>(&self, path: &[&str], default: T) -> T {
        match self.get(path) {
            Some(value) => match value.clone().try_into::<T>() {
                Ok(v) => v,
                Err(e) => {
                    warn!("Config value {} has an unexpected type: {}", path.join("."), e);
                    default
                }
            },
            None => default,
        }
    }

    /// 섹션 전체를 타입으로 역직렬화 (없으면 Default)
    pub fn section<T: DeserializeOwned + Default>(&self, path: &[&str]) -> T {
        self.get_or(path, T::default())
    }

    // ========================================================================
    // 갱신
    // ========================================================================

    /// 경로에 값 기록 (중간 테이블 자동 생성, 파일 기반이면 저장)
    pub fn update<T: Serialize>(&mut self, path: &[&str], value: T) -> Result<()> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| Error::Config("Empty config path".to_string()))?;

        let mut table = &mut self.root;
        for key in parents {
            let entry = table
                .entry(key.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            if !entry.is_table() {
                warn!("Config key {} is not a table, replacing it", key);
                *entry = toml::Value::Table(toml::Table::new());
            }
            table = entry
                .as_table_mut()
                .ok_or_else(|| Error::Internal(format!("Config key {} is not a table", key)))?;
        }

        table.insert(last.to_string(), toml::Value::try_from(value)?);

        if self.path.is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// 파일에 저장 (메모리 전용이면 아무것도 하지 않음)
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(&self.root)?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}

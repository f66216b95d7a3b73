//! Metadata Extractor - 로드된 모듈 검증
//!
//! 모듈의 메타데이터 질의와 팩토리 질의를 호출해 `PluginRecord`를 만듭니다.
//! 질의 누락, `enabled = false`, 사용자 비활성화 목록은 에러가 아닌 건너뜀입니다.

use super::context::PluginContext;
use super::discovery::DiscoveryTask;
use super::metadata::PluginRecord;
use super::placement;
use super::traits::PluginModule;
use std::collections::HashSet;
use std::rc::Rc;
use tessera_foundation::{Error, Result};

/// 건너뛴 이유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 메타데이터 질의 없음
    MissingMetadata,
    /// 팩토리 질의 없음
    MissingFactory,
    /// 메타데이터가 `enabled = false`
    DisabledByMetadata,
    /// 설정의 `plugins.disabled` 목록에 있음
    DisabledByUser,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingMetadata => write!(f, "no metadata query"),
            SkipReason::MissingFactory => write!(f, "no factory query"),
            SkipReason::DisabledByMetadata => write!(f, "disabled in metadata"),
            SkipReason::DisabledByUser => write!(f, "disabled in config"),
        }
    }
}

/// 추출 결과
#[derive(Debug)]
pub enum Extraction {
    Registered(Box<PluginRecord>),
    Skipped {
        /// 알 수 있으면 플러그인 ID
        plugin: Option<String>,
        reason: SkipReason,
    },
}

/// 모듈에서 레코드 추출
///
/// `disabled`는 짧은 이름 집합입니다.
pub fn extract(
    module: &Rc<dyn PluginModule>,
    task: &DiscoveryTask,
    ctx: &PluginContext,
    disabled: &HashSet<String>,
) -> Result<Extraction> {
    let Some(metadata) = module.metadata(ctx)? else {
        return Ok(Extraction::Skipped {
            plugin: None,
            reason: SkipReason::MissingMetadata,
        });
    };
    metadata.validate()?;

    let Some(factory) = module.factory(ctx) else {
        return Ok(Extraction::Skipped {
            plugin: Some(metadata.id),
            reason: SkipReason::MissingFactory,
        });
    };

    if !metadata.enabled {
        return Ok(Extraction::Skipped {
            plugin: Some(metadata.id),
            reason: SkipReason::DisabledByMetadata,
        });
    }
    if disabled.contains(metadata.short_name()) {
        return Ok(Extraction::Skipped {
            plugin: Some(metadata.id),
            reason: SkipReason::DisabledByUser,
        });
    }

    if placement::container_attr(&metadata.container).is_none() {
        return Err(Error::validation(
            metadata.id.clone(),
            format!("unknown placement '{}'", metadata.container),
        ));
    }

    Ok(Extraction::Registered(Box::new(PluginRecord::new(
        metadata,
        task.module_name.clone(),
        task.import_path.clone(),
        Rc::clone(module),
        factory,
    ))))
}

//! Plugin Registry - 살아 있는 플러그인 인스턴스 저장소
//!
//! 항목은 생성자와 시작 훅이 모두 성공한 플러그인에만 존재합니다.
//! 비활성화/재로드 시 교체 인스턴스를 넣기 전에 먼저 제거됩니다.

use super::metadata::PluginRecord;
use super::traits::Plugin;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 살아 있는 인스턴스 정보
pub struct LiveInstance {
    /// 플러그인 인스턴스
    pub plugin: Box<dyn Plugin>,

    /// 생성에 사용된 레코드
    pub record: PluginRecord,

    /// 로드 순서
    pub load_order: usize,

    /// 등록 세대 (재등록 시 증가)
    pub generation: u64,
}

/// 플러그인 인스턴스 레지스트리
#[derive(Default)]
pub struct PluginInstanceRegistry {
    /// 플러그인 ID -> 인스턴스
    instances: HashMap<String, LiveInstance>,

    /// 로드 카운터
    load_counter: usize,

    generation: u64,
}

impl PluginInstanceRegistry {
    /// 새 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 인스턴스 등록. 같은 ID가 살아 있으면 None
    pub fn register(&mut self, record: PluginRecord, plugin: Box<dyn Plugin>) -> Option<u64> {
        if self.instances.contains_key(&record.id) {
            warn!("Plugin {} already has a live instance", record.id);
            return None;
        }

        self.load_counter += 1;
        self.generation += 1;
        let id = record.id.clone();
        info!("Started plugin {} (load order {})", id, self.load_counter);

        self.instances.insert(
            id,
            LiveInstance {
                plugin,
                record,
                load_order: self.load_counter,
                generation: self.generation,
            },
        );
        Some(self.generation)
    }

    /// 인스턴스 제거
    pub fn unregister(&mut self, id: &str) -> Option<LiveInstance> {
        let removed = self.instances.remove(id);
        if removed.is_some() {
            debug!("Removed live instance of {}", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&LiveInstance> {
        self.instances.get(id)
    }

    /// 현재 등록 세대
    pub fn generation(&self, id: &str) -> Option<u64> {
        self.instances.get(id).map(|i| i.generation)
    }

    /// 존재 여부 확인
    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// 인스턴스 수
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// 로드 순서에 따라 정렬된 ID 목록
    pub fn load_order(&self) -> Vec<String> {
        let mut entries: Vec<_> = self.instances.values().collect();
        entries.sort_by_key(|i| i.load_order);
        entries.iter().map(|i| i.record.id.clone()).collect()
    }

    /// 모든 인스턴스 제거 (로드 순서의 역순)
    pub fn drain(&mut self) -> Vec<LiveInstance> {
        let mut all: Vec<_> = self.instances.drain().map(|(_, i)| i).collect();
        all.sort_by_key(|i| std::cmp::Reverse(i.load_order));
        all
    }
}

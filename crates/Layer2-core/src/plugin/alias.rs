//! Alias Index - ID / 짧은 이름 / 모듈 이름 조회
//!
//! 세 종류의 토큰은 모두 같은 레코드로 해석됩니다. 조회 순서는
//! 정규 ID, 짧은 이름, 모듈 이름이며 각 별칭은 먼저 등록한 쪽이 차지합니다.

use super::metadata::PluginRecord;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 플러그인 레코드와 별칭 테이블
#[derive(Debug, Default)]
pub struct AliasIndex {
    records: HashMap<String, PluginRecord>,

    /// 등록 순서 (발견 순서)
    order: Vec<String>,

    by_short: HashMap<String, String>,
    by_module: HashMap<String, String>,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드 등록. 같은 ID가 이미 있으면 false
    pub fn insert(&mut self, record: PluginRecord) -> bool {
        if self.records.contains_key(&record.id) {
            warn!(
                "Plugin id {} from module {} is already registered, dropping it",
                record.id, record.import_path
            );
            return false;
        }

        self.bind_aliases(&record);
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        true
    }

    /// 같은 ID의 레코드 교체 (재로드). 별칭도 다시 계산
    pub fn replace(&mut self, record: PluginRecord) {
        if !self.records.contains_key(&record.id) {
            self.insert(record);
            return;
        }

        let id = record.id.clone();
        self.by_short.retain(|_, target| *target != id);
        self.by_module.retain(|_, target| *target != id);
        self.bind_aliases(&record);
        self.records.insert(id, record);
    }

    fn bind_aliases(&mut self, record: &PluginRecord) {
        bind(&mut self.by_short, &record.short_name, &record.id, "short name");
        bind(&mut self.by_module, &record.module_name, &record.id, "module name");
    }

    /// 토큰을 정규 ID로 해석
    pub fn resolve_id(&self, token: &str) -> Option<&str> {
        if let Some((id, _)) = self.records.get_key_value(token) {
            return Some(id.as_str());
        }
        self.by_short
            .get(token)
            .or_else(|| self.by_module.get(token))
            .map(String::as_str)
    }

    /// 토큰을 레코드로 해석
    pub fn resolve(&self, token: &str) -> Option<&PluginRecord> {
        self.resolve_id(token).and_then(|id| self.records.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&PluginRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// 등록 순서대로의 레코드
    pub fn records(&self) -> impl Iterator<Item = &PluginRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
        self.by_short.clear();
        self.by_module.clear();
    }
}

fn bind(table: &mut HashMap<String, String>, alias: &str, id: &str, kind: &str) {
    match table.get(alias) {
        Some(existing) if existing != id => {
            debug!(
                "{} {} already refers to {}, not rebinding to {}",
                kind, alias, existing, id
            );
        }
        Some(_) => {}
        None => {
            table.insert(alias.to_string(), id.to_string());
        }
    }
}

//! Dependency Resolver - 의존성 토큰을 정규 ID로 해석
//!
//! 선언된 토큰은 별칭 인덱스로 해석하고, 리전 루트가 소유한 영역에
//! 배치되는 플러그인에는 그 루트를 암묵적 의존성으로 주입합니다.
//! 루트 컨테이너가 만들어지기 전에 위젯을 붙이려는 경쟁을 막기 위함입니다.

use super::alias::AliasIndex;
use super::metadata::PluginRecord;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 기본 리전 루트 (배치 접두사, 루트 플러그인 토큰)
pub const DEFAULT_REGION_ROOTS: &[(&str, &str)] = &[
    ("top-panel", "top_panel"),
    ("bottom-panel", "bottom_panel"),
    ("left-panel", "left_panel"),
    ("right-panel", "right_panel"),
];

/// 배치 영역과 그 영역을 만드는 플러그인
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRoot {
    /// 배치 문자열 접두사 (예: "top-panel")
    pub prefix: String,

    /// 루트 플러그인 토큰 (ID, 짧은 이름, 모듈 이름 중 하나)
    pub root: String,
}

impl RegionRoot {
    pub fn new(prefix: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
        }
    }

    /// 배치가 이 영역 안인지 (정확히 일치하거나 "prefix-"로 시작)
    pub fn owns(&self, placement: &str) -> bool {
        placement
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
    }
}

/// 한 플러그인의 해석된 의존성
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDeps {
    /// 정규 ID (중복 없음, 선언 순서)
    pub ids: Vec<String>,

    /// 해석하지 못한 토큰 (strict 모드에서만 유지)
    pub unresolved: Vec<String>,
}

impl ResolvedDeps {
    pub fn is_satisfiable(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// 의존성 해석기
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    region_roots: Vec<RegionRoot>,
    strict: bool,
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DependencyResolver {
    pub fn new(strict: bool) -> Self {
        Self {
            region_roots: DEFAULT_REGION_ROOTS
                .iter()
                .map(|(prefix, root)| RegionRoot::new(*prefix, *root))
                .collect(),
            strict,
        }
    }

    pub fn with_region_roots(mut self, roots: Vec<RegionRoot>) -> Self {
        self.region_roots = roots;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// 한 플러그인 해석
    pub fn resolve(&self, record: &PluginRecord, aliases: &AliasIndex) -> ResolvedDeps {
        let mut resolved = ResolvedDeps::default();

        for token in &record.deps {
            match aliases.resolve_id(token) {
                Some(id) => push_unique(&mut resolved.ids, id),
                None if self.strict => {
                    warn!("Plugin {} depends on unknown plugin '{}'", record.id, token);
                    resolved.unresolved.push(token.clone());
                }
                None => warn!(
                    "Plugin {} depends on unknown plugin '{}', ignoring it",
                    record.id, token
                ),
            }
        }

        for region in self.region_roots.iter().filter(|r| r.owns(&record.placement)) {
            match aliases.resolve_id(&region.root) {
                Some(root_id) if root_id == record.id => {}
                Some(root_id) => {
                    debug!("Plugin {} depends on region root {}", record.id, root_id);
                    push_unique(&mut resolved.ids, root_id);
                }
                None => debug!(
                    "Region root {} for plugin {} is not registered",
                    region.root, record.id
                ),
            }
        }

        resolved
    }

    /// 모든 레코드 해석
    pub fn resolve_all(&self, aliases: &AliasIndex) -> HashMap<String, ResolvedDeps> {
        aliases
            .records()
            .map(|record| (record.id.clone(), self.resolve(record, aliases)))
            .collect()
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::metadata::PluginMetadata;
    use crate::plugin::testing::{record, record_from};

    fn index(records: Vec<PluginRecord>) -> AliasIndex {
        let mut index = AliasIndex::new();
        for r in records {
            index.insert(r);
        }
        index
    }

    #[test]
    fn test_region_owns() {
        let top = RegionRoot::new("top-panel", "top_panel");
        assert!(top.owns("top-panel"));
        assert!(top.owns("top-panel-right"));
        assert!(!top.owns("top-panelx"));
        assert!(!top.owns("bottom-panel-left"));
    }

    #[test]
    fn test_tokens_resolve_through_aliases() {
        let aliases = index(vec![
            record("org.x.calendar", "calendar_mod"),
            record("org.x.clock", "clock"),
            record_from(PluginMetadata::new("org.x.bar").with_deps(["calendar", "clock", "org.x.calendar"])),
        ]);
        let bar = aliases.get("org.x.bar").unwrap();

        let deps = DependencyResolver::default().resolve(bar, &aliases);
        assert_eq!(deps.ids, vec!["org.x.calendar", "org.x.clock"]);
        assert!(deps.is_satisfiable());
    }

    #[test]
    fn test_region_root_injected() {
        let aliases = index(vec![
            record_from(PluginMetadata::new("org.x.top_panel").with_container("top-panel")),
            record_from(PluginMetadata::new("org.x.clock").with_container("top-panel-center")),
            record_from(PluginMetadata::new("org.x.dock").with_container("bottom-panel")),
        ]);
        let resolver = DependencyResolver::default();

        let clock = resolver.resolve(aliases.get("org.x.clock").unwrap(), &aliases);
        assert_eq!(clock.ids, vec!["org.x.top_panel"]);

        // 자기 자신은 주입하지 않음
        let root = resolver.resolve(aliases.get("org.x.top_panel").unwrap(), &aliases);
        assert!(root.ids.is_empty());

        // 루트가 없으면 주입 없음
        let dock = resolver.resolve(aliases.get("org.x.dock").unwrap(), &aliases);
        assert!(dock.ids.is_empty());
        assert!(dock.is_satisfiable());
    }

    #[test]
    fn test_unresolved_strict_vs_lenient() {
        let aliases = index(vec![record_from(
            PluginMetadata::new("a.three").with_deps(["missing.id"]),
        )]);
        let three = aliases.get("a.three").unwrap();

        let strict = DependencyResolver::new(true).resolve(three, &aliases);
        assert_eq!(strict.unresolved, vec!["missing.id"]);

        let lenient = DependencyResolver::new(false).resolve(three, &aliases);
        assert!(lenient.ids.is_empty());
        assert!(lenient.unresolved.is_empty());
    }
}

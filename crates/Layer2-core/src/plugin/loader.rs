//! Module Loader - 디스크립터를 플러그인 모듈로 변환
//!
//! 플러그인 코드는 바이너리에 컴파일되어 `FactoryTable`에 이름으로
//! 등록되고, 디스크 위의 디스크립터가 메타데이터와 팩토리 키를 제공합니다.
//!
//! ```toml
//! # plugins/core/clock.toml
//! [plugin]
//! id = "org.tessera.plugins.clock"
//! container = "top-panel-center"
//! factory = "label"              # 생략 시 모듈 이름 (clock)
//! ```
//!
//! 로드된 모듈은 import 경로로 캐시되고, `reload`는 캐시를 무시하고
//! 파일을 다시 읽습니다.

use super::context::PluginContext;
use super::discovery::DiscoveryTask;
use super::metadata::PluginMetadata;
use super::traits::{PluginFactory, PluginModule};
use serde::Deserialize;
use std::collections::HashMap;
use std::rc::Rc;
use tessera_foundation::{Error, Result};
use tracing::{debug, trace};

/// 모듈 로더
pub trait ModuleLoader {
    /// 모듈 로드 (캐시 사용)
    fn load(&mut self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>>;

    /// 소스에서 강제로 다시 로드
    fn reload(&mut self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>>;

    /// 캐시에서 제거 (검증에 실패한 모듈)
    fn unload(&mut self, task: &DiscoveryTask);
}

// ============================================================================
// FactoryTable - 컴파일된 플러그인 생성자
// ============================================================================

/// 이름 -> 팩토리
#[derive(Clone, Default)]
pub struct FactoryTable {
    factories: HashMap<String, PluginFactory>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: PluginFactory) {
        let name = name.into();
        trace!("Registered factory {}", name);
        self.factories.insert(name, factory);
    }

    pub fn with(mut self, name: impl Into<String>, factory: PluginFactory) -> Self {
        self.register(name, factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<PluginFactory> {
        self.factories.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryTable")
            .field("factories", &self.names())
            .finish()
    }
}

// ============================================================================
// ManifestModule - 디스크립터 파일 기반 모듈
// ============================================================================

#[derive(Debug, Deserialize)]
struct Descriptor {
    plugin: Option<PluginMetadata>,
}

/// 디스크립터에서 로드된 모듈
pub struct ManifestModule {
    module_name: String,
    metadata: Option<PluginMetadata>,
    factories: Rc<FactoryTable>,
}

impl ManifestModule {
    /// 디스크립터 내용 파싱
    pub fn parse(
        module_name: impl Into<String>,
        content: &str,
        factories: Rc<FactoryTable>,
    ) -> Result<Self> {
        let module_name = module_name.into();
        let descriptor: Descriptor = toml::from_str(content)
            .map_err(|e| Error::validation(module_name.clone(), e.to_string()))?;
        Ok(Self {
            module_name,
            metadata: descriptor.plugin,
            factories,
        })
    }

    fn factory_key(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.factory.as_deref())
            .unwrap_or(&self.module_name)
    }
}

impl PluginModule for ManifestModule {
    fn metadata(&self, _ctx: &PluginContext) -> Result<Option<PluginMetadata>> {
        Ok(self.metadata.clone())
    }

    fn factory(&self, _ctx: &PluginContext) -> Option<PluginFactory> {
        self.factories.get(self.factory_key())
    }
}

// ============================================================================
// ManifestLoader
// ============================================================================

/// 디스크립터 파일 로더
pub struct ManifestLoader {
    factories: Rc<FactoryTable>,
    cache: HashMap<String, Rc<dyn PluginModule>>,
}

impl ManifestLoader {
    pub fn new(factories: FactoryTable) -> Self {
        Self {
            factories: Rc::new(factories),
            cache: HashMap::new(),
        }
    }

    pub fn factories(&self) -> &FactoryTable {
        &self.factories
    }

    pub fn is_cached(&self, import_path: &str) -> bool {
        self.cache.contains_key(import_path)
    }

    fn read(&self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>> {
        let content = std::fs::read_to_string(&task.path).map_err(|e| {
            Error::validation(
                task.module_name.clone(),
                format!("Failed to read {}: {}", task.path.display(), e),
            )
        })?;
        let module =
            ManifestModule::parse(task.module_name.clone(), &content, Rc::clone(&self.factories))?;
        Ok(Rc::new(module))
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&mut self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>> {
        if let Some(module) = self.cache.get(&task.import_path) {
            return Ok(Rc::clone(module));
        }
        let module = self.read(task)?;
        debug!("Loaded module {} from {}", task.import_path, task.path.display());
        self.cache
            .insert(task.import_path.clone(), Rc::clone(&module));
        Ok(module)
    }

    fn reload(&mut self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>> {
        self.cache.remove(&task.import_path);
        let module = self.read(task)?;
        debug!("Reloaded module {}", task.import_path);
        self.cache
            .insert(task.import_path.clone(), Rc::clone(&module));
        Ok(module)
    }

    fn unload(&mut self, task: &DiscoveryTask) {
        self.cache.remove(&task.import_path);
    }
}

// ============================================================================
// StaticLoader - 컴파일된 모듈
// ============================================================================

/// import 경로 -> 모듈 (파일 시스템 없이 사용)
#[derive(Default)]
pub struct StaticLoader {
    modules: HashMap<String, Rc<dyn PluginModule>>,
    reloads: usize,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, import_path: impl Into<String>, module: Rc<dyn PluginModule>) -> Self {
        self.insert(import_path, module);
        self
    }

    pub fn insert(&mut self, import_path: impl Into<String>, module: Rc<dyn PluginModule>) {
        self.modules.insert(import_path.into(), module);
    }

    /// 지금까지의 reload 호출 수
    pub fn reload_count(&self) -> usize {
        self.reloads
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&mut self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>> {
        self.modules
            .get(&task.import_path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("module {}", task.import_path)))
    }

    fn reload(&mut self, task: &DiscoveryTask) -> Result<Rc<dyn PluginModule>> {
        self.reloads += 1;
        self.load(task)
    }

    fn unload(&mut self, _task: &DiscoveryTask) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::discovery::PluginScope;
    use crate::plugin::testing::{context, noop_factory};
    use tempfile::TempDir;

    fn task(dir: &TempDir, name: &str, content: &str) -> DiscoveryTask {
        let path = dir.path().join(format!("{}.toml", name));
        std::fs::write(&path, content).unwrap();
        DiscoveryTask {
            module_name: name.to_string(),
            import_path: name.to_string(),
            root: dir.path().to_path_buf(),
            path,
            scope: PluginScope::Extra,
        }
    }

    #[test]
    fn test_factory_defaults_to_module_name() {
        let temp = TempDir::new().unwrap();
        let ctx = context();
        let mut loader = ManifestLoader::new(FactoryTable::new().with("clock", noop_factory()));

        let clock = task(&temp, "clock", "[plugin]\nid = \"org.x.clock\"");
        let module = loader.load(&clock).unwrap();
        assert_eq!(module.metadata(&ctx).unwrap().unwrap().id, "org.x.clock");
        assert!(module.factory(&ctx).is_some());

        let other = task(&temp, "other", "[plugin]\nid = \"org.x.other\"");
        assert!(loader.load(&other).unwrap().factory(&ctx).is_none());
    }

    #[test]
    fn test_explicit_factory_key() {
        let temp = TempDir::new().unwrap();
        let ctx = context();
        let mut loader = ManifestLoader::new(FactoryTable::new().with("label", noop_factory()));

        let t = task(&temp, "cpu", "[plugin]\nid = \"org.x.cpu\"\nfactory = \"label\"");
        assert!(loader.load(&t).unwrap().factory(&ctx).is_some());
    }

    #[test]
    fn test_missing_plugin_table() {
        let temp = TempDir::new().unwrap();
        let ctx = context();
        let mut loader = ManifestLoader::new(FactoryTable::new());

        let t = task(&temp, "notes", "title = \"not a plugin\"");
        assert!(loader.load(&t).unwrap().metadata(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_malformed_descriptor_is_validation_error() {
        let temp = TempDir::new().unwrap();
        let mut loader = ManifestLoader::new(FactoryTable::new());

        let t = task(&temp, "bad", "[plugin]\nid = \"a.b\"\ndeps = 3");
        assert!(matches!(loader.load(&t), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_reload_rereads_file() {
        let temp = TempDir::new().unwrap();
        let ctx = context();
        let mut loader = ManifestLoader::new(FactoryTable::new());

        let t = task(&temp, "clock", "[plugin]\nid = \"a.clock\"\npriority = 1");
        loader.load(&t).unwrap();
        assert!(loader.is_cached("clock"));

        std::fs::write(&t.path, "[plugin]\nid = \"a.clock\"\npriority = 9").unwrap();
        let cached = loader.load(&t).unwrap();
        assert_eq!(cached.metadata(&ctx).unwrap().unwrap().priority, 1);

        let fresh = loader.reload(&t).unwrap();
        assert_eq!(fresh.metadata(&ctx).unwrap().unwrap().priority, 9);

        loader.unload(&t);
        assert!(!loader.is_cached("clock"));
    }
}

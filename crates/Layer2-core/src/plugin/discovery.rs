//! Plugin Discovery - 플러그인 디스크립터 발견
//!
//! 플러그인 루트들을 재귀적으로 스캔해 디스크립터 파일(`*.toml`)마다
//! 하나의 import 작업을 만듭니다.
//!
//! ```text
//! plugins/                    (root, prefix "")
//! ├── core/
//! │   ├── clock.toml          → core.clock
//! │   └── _private.toml       (skipped: '_' prefix)
//! ├── examples/               (skipped: ignored dir)
//! └── my-widgets/             (not an identifier → new search root)
//!     └── weather.toml        → weather
//! ```
//!
//! 루트와 디렉토리 항목은 항상 이름순으로 방문하므로 결과가 결정적입니다.
//! 같은 모듈 이름은 처음 발견된 것만 유지합니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tessera_foundation::{Error, LoaderSettings};
use tracing::{debug, error, info};

// ============================================================================
// DiscoveryTask - 발견된 import 작업
// ============================================================================

/// 플러그인 루트의 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginScope {
    /// 설치 디렉토리에 포함된 플러그인
    Builtin,
    /// 사용자 데이터 디렉토리 (~/.local/share/tessera/plugins)
    User,
    /// 명령줄이나 임베더가 추가한 루트
    Extra,
}

impl std::fmt::Display for PluginScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginScope::Builtin => write!(f, "builtin"),
            PluginScope::User => write!(f, "user"),
            PluginScope::Extra => write!(f, "extra"),
        }
    }
}

/// 하나의 디스크립터 파일에 대한 import 작업
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTask {
    /// 파일 이름 (확장자 제외)
    pub module_name: String,

    /// 검색 루트 기준 점 구분 경로
    pub import_path: String,

    /// import 경로의 기준이 되는 검색 루트
    pub root: PathBuf,

    /// 디스크립터 파일 경로
    pub path: PathBuf,

    pub scope: PluginScope,
}

/// 스캔 결과
#[derive(Debug, Default)]
pub struct DiscoveryOutput {
    /// 발견 순서대로의 import 작업
    pub tasks: Vec<DiscoveryTask>,

    /// 식별자가 아닌 디렉토리로 인해 추가된 검색 루트
    pub search_roots: Vec<PathBuf>,

    /// 읽을 수 없었던 디렉토리 (스캔은 계속됨)
    pub errors: Vec<Error>,
}

// ============================================================================
// PluginScanner
// ============================================================================

/// 플러그인 루트 스캐너
#[derive(Debug, Clone)]
pub struct PluginScanner {
    roots: Vec<(PathBuf, PluginScope)>,
    extension: String,
    ignored_dirs: Vec<String>,
}

impl PluginScanner {
    pub fn new(settings: &LoaderSettings) -> Self {
        Self {
            roots: Vec::new(),
            extension: settings.extension.trim_start_matches('.').to_string(),
            ignored_dirs: settings.ignored_dirs.clone(),
        }
    }

    /// 루트 추가 (추가한 순서대로 스캔)
    pub fn add_root(&mut self, path: impl Into<PathBuf>, scope: PluginScope) {
        self.roots.push((path.into(), scope));
    }

    pub fn with_root(mut self, path: impl Into<PathBuf>, scope: PluginScope) -> Self {
        self.add_root(path, scope);
        self
    }

    /// 모든 루트 스캔
    pub fn scan(&self) -> DiscoveryOutput {
        let mut output = DiscoveryOutput::default();
        let mut seen = HashSet::new();

        for (root, scope) in &self.roots {
            if !root.is_dir() {
                debug!("Plugin root {} does not exist, skipping", root.display());
                continue;
            }
            let walk = Walk {
                root,
                scope: *scope,
                prefix: Vec::new(),
            };
            self.scan_dir(root, &walk, &mut output, &mut seen);
        }

        info!(
            "Discovered {} plugin descriptors ({} extra search roots)",
            output.tasks.len(),
            output.search_roots.len()
        );
        output
    }

    fn scan_dir(
        &self,
        dir: &Path,
        walk: &Walk<'_>,
        output: &mut DiscoveryOutput,
        seen: &mut HashSet<String>,
    ) {
        let entries = match read_sorted(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to scan plugin directory {}: {}", dir.display(), e);
                output.errors.push(Error::discovery(dir, e.to_string()));
                return;
            }
        };

        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('_') || name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                if self.ignored_dirs.iter().any(|d| d == name) {
                    debug!("Skipping ignored directory {}", path.display());
                    continue;
                }

                if is_identifier(name) {
                    let mut prefix = walk.prefix.clone();
                    prefix.push(name.to_string());
                    let nested = Walk {
                        root: walk.root,
                        scope: walk.scope,
                        prefix,
                    };
                    self.scan_dir(&path, &nested, output, seen);
                } else {
                    // 점 경로로 표현할 수 없으므로 독립된 검색 루트로 취급
                    debug!("Registering {} as an additional search root", path.display());
                    output.search_roots.push(path.clone());
                    let nested = Walk {
                        root: &path,
                        scope: walk.scope,
                        prefix: Vec::new(),
                    };
                    self.scan_dir(&path, &nested, output, seen);
                }
                continue;
            }

            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(module_name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if !seen.insert(module_name.to_string()) {
                debug!(
                    "Module {} at {} shadowed by an earlier discovery",
                    module_name,
                    path.display()
                );
                continue;
            }

            let import_path = if walk.prefix.is_empty() {
                module_name.to_string()
            } else {
                format!("{}.{}", walk.prefix.join("."), module_name)
            };

            output.tasks.push(DiscoveryTask {
                module_name: module_name.to_string(),
                import_path,
                root: walk.root.to_path_buf(),
                path: path.clone(),
                scope: walk.scope,
            });
        }
    }
}

/// 재귀 중인 검색 위치
struct Walk<'a> {
    root: &'a Path,
    scope: PluginScope,
    prefix: Vec<String>,
}

fn read_sorted(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// 점 경로의 세그먼트로 쓸 수 있는 이름인지
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

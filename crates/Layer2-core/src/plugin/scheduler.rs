//! Topological Scheduler - 결정적 초기화 순서
//!
//! Kahn 알고리즘. 준비 목록은 (priority 내림차순, index 오름차순)으로
//! 정렬되며 동률은 목록에 들어온 순서를 따릅니다 (초기 목록은 발견 순서).
//! 준비 목록이 비었을 때 남은 노드는 스케줄되지 않고 진단으로 보고됩니다.
//!
//! ```text
//! a.one ──► a.two            schedule: [a.one, a.two]
//! a.three ──► "missing.id"   MissingDependency { a.three, missing.id }
//! b.x ◄──► b.y               Cycle { [b.x, b.y] }
//! c.z ──► b.x                Blocked { c.z, on: [b.x] }
//! ```

use super::metadata::PluginRecord;
use super::resolver::ResolvedDeps;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tessera_foundation::Error;

/// 스케줄되지 못한 이유
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleDiagnostic {
    /// 해석되지 않은 의존성 토큰
    MissingDependency { plugin: String, token: String },

    /// 순환 의존성 (발견 순서)
    Cycle { plugins: Vec<String> },

    /// 스케줄되지 못한 다른 플러그인에 의존
    Blocked { plugin: String, on: Vec<String> },
}

impl ScheduleDiagnostic {
    /// 이 진단에 걸린 플러그인들
    pub fn plugins(&self) -> Vec<&str> {
        match self {
            Self::MissingDependency { plugin, .. } | Self::Blocked { plugin, .. } => {
                vec![plugin.as_str()]
            }
            Self::Cycle { plugins } => plugins.iter().map(String::as_str).collect(),
        }
    }

    /// 플러그인별 Dependency 에러로 변환
    pub fn to_errors(&self) -> Vec<Error> {
        match self {
            Self::MissingDependency { plugin, token } => vec![Error::dependency(
                plugin.clone(),
                format!("unresolved dependency '{}'", token),
            )],
            Self::Cycle { plugins } => plugins
                .iter()
                .map(|p| {
                    Error::dependency(p.clone(), format!("dependency cycle: {}", plugins.join(" -> ")))
                })
                .collect(),
            Self::Blocked { plugin, on } => vec![Error::dependency(
                plugin.clone(),
                format!("blocked on unscheduled {}", on.join(", ")),
            )],
        }
    }
}

impl std::fmt::Display for ScheduleDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDependency { plugin, token } => {
                write!(f, "{}: unresolved dependency '{}'", plugin, token)
            }
            Self::Cycle { plugins } => write!(f, "cycle: {}", plugins.join(" -> ")),
            Self::Blocked { plugin, on } => {
                write!(f, "{}: blocked on {}", plugin, on.join(", "))
            }
        }
    }
}

/// 스케줄 결과
#[derive(Debug, Default)]
pub struct Schedule {
    pub order: Vec<PluginRecord>,
    pub diagnostics: Vec<ScheduleDiagnostic>,
}

impl Schedule {
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(|r| r.id.as_str()).collect()
    }

    /// 스케줄되지 못한 플러그인 (발견 순서, 중복 없음)
    pub fn unscheduled(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.diagnostics
            .iter()
            .flat_map(|d| d.plugins())
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

/// 정렬 키 (priority 내림차순, index 오름차순)
fn ready_key(record: &PluginRecord) -> (std::cmp::Reverse<i64>, i64) {
    (std::cmp::Reverse(record.priority), record.index)
}

/// 레코드(발견 순서)와 해석된 의존성으로 스케줄 계산
pub fn schedule(records: &[PluginRecord], deps: &HashMap<String, ResolvedDeps>) -> Schedule {
    let position: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut indegree: Vec<usize> = vec![0; records.len()];

    for (i, record) in records.iter().enumerate() {
        let Some(resolved) = deps.get(&record.id) else {
            continue;
        };
        for dep in &resolved.ids {
            match position.get(dep.as_str()) {
                Some(&d) => {
                    dependents[d].push(i);
                    indegree[i] += 1;
                }
                // 별칭 인덱스에 없는 ID는 영원히 해소되지 않음
                None => indegree[i] += 1,
            }
        }
        indegree[i] += resolved.unresolved.len();
    }

    let mut ready: Vec<usize> = (0..records.len()).filter(|&i| indegree[i] == 0).collect();
    ready.sort_by_key(|&i| ready_key(&records[i]));

    let mut order = Vec::with_capacity(records.len());
    let mut scheduled = vec![false; records.len()];

    while !ready.is_empty() {
        let next = ready.remove(0);
        scheduled[next] = true;
        order.push(records[next].clone());

        for &dependent in &dependents[next] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                // 같은 키 중에서는 맨 뒤
                let key = ready_key(&records[dependent]);
                let at = ready.partition_point(|&r| ready_key(&records[r]) <= key);
                ready.insert(at, dependent);
            }
        }
    }

    let diagnostics = diagnose(records, deps, &position, &scheduled);
    Schedule { order, diagnostics }
}

/// 준비 목록이 빈 뒤 남은 노드 분석
fn diagnose(
    records: &[PluginRecord],
    deps: &HashMap<String, ResolvedDeps>,
    position: &HashMap<&str, usize>,
    scheduled: &[bool],
) -> Vec<ScheduleDiagnostic> {
    let remaining: Vec<usize> = (0..records.len()).filter(|&i| !scheduled[i]).collect();
    if remaining.is_empty() {
        return Vec::new();
    }

    // 남은 노드 사이의 간선 (의존 대상 방향)
    let edges: Vec<Vec<usize>> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            if scheduled[i] {
                return Vec::new();
            }
            deps.get(&record.id)
                .map(|r| {
                    r.ids
                        .iter()
                        .filter_map(|d| position.get(d.as_str()).copied())
                        .filter(|&d| !scheduled[d])
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let mut in_cycle = vec![false; records.len()];
    let mut diagnostics = Vec::new();

    for component in strongly_connected(&remaining, &edges) {
        let cyclic = component.len() > 1 || edges[component[0]].contains(&component[0]);
        if !cyclic {
            continue;
        }
        let mut members = component;
        members.sort_unstable();
        for &m in &members {
            in_cycle[m] = true;
        }
        diagnostics.push(ScheduleDiagnostic::Cycle {
            plugins: members.iter().map(|&m| records[m].id.clone()).collect(),
        });
    }

    for &i in &remaining {
        let record = &records[i];
        let resolved = deps.get(&record.id);

        let missing: Vec<String> = resolved
            .map(|r| {
                let unknown_ids = r
                    .ids
                    .iter()
                    .filter(|d| !position.contains_key(d.as_str()))
                    .cloned();
                r.unresolved.iter().cloned().chain(unknown_ids).collect()
            })
            .unwrap_or_default();
        for token in &missing {
            diagnostics.push(ScheduleDiagnostic::MissingDependency {
                plugin: record.id.clone(),
                token: token.clone(),
            });
        }

        if in_cycle[i] || !missing.is_empty() {
            continue;
        }
        let on: Vec<String> = edges[i].iter().map(|&d| records[d].id.clone()).collect();
        diagnostics.push(ScheduleDiagnostic::Blocked {
            plugin: record.id.clone(),
            on,
        });
    }

    diagnostics
}

/// Tarjan SCC (남은 노드만)
fn strongly_connected(nodes: &[usize], edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct State<'a> {
        edges: &'a [Vec<usize>],
        counter: usize,
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        components: Vec<Vec<usize>>,
    }

    fn visit(state: &mut State<'_>, v: usize) {
        state.index[v] = Some(state.counter);
        state.lowlink[v] = state.counter;
        state.counter += 1;
        state.stack.push(v);
        state.on_stack[v] = true;

        for &w in &state.edges[v] {
            match state.index[w] {
                None => {
                    visit(state, w);
                    state.lowlink[v] = state.lowlink[v].min(state.lowlink[w]);
                }
                Some(w_index) if state.on_stack[w] => {
                    state.lowlink[v] = state.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(state.lowlink[v]) == state.index[v] {
            let mut component = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            state.components.push(component);
        }
    }

    let n = edges.len();
    let mut state = State {
        edges,
        counter: 0,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        components: Vec::new(),
    };

    for &v in nodes {
        if state.index[v].is_none() {
            visit(&mut state, v);
        }
    }

    // 발견 순서가 빠른 구성요소부터
    state
        .components
        .sort_by_key(|c| c.iter().copied().min().unwrap_or(usize::MAX));
    state.components
}

//! Run Loop - 단일 스레드 협력형 실행 루프
//!
//! 패널의 모든 코어 컴포넌트는 하나의 조정 스레드에서 실행됩니다.
//! 작업은 소스(콜백)로 등록되고, 콜백은 `ControlFlow::Continue(())`를 반환해
//! 다음 턴에 다시 호출되도록 양보하거나 `ControlFlow::Break(())`로 제거됩니다.
//!
//! ```text
//! ┌──────────────── turn ────────────────┐
//! │ idle #1 → Continue ──► requeued       │
//! │ idle #2 → Break    ──► dropped        │
//! │ timeout #3 (not due) ──► untouched    │
//! │ (sources added here run next turn)    │
//! └───────────────────────────────────────┘
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::trace;

/// 소스 콜백
pub type SourceFn = Box<dyn FnMut() -> ControlFlow<()>>;

/// 등록된 소스 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source-{}", self.0)
    }
}

struct Source {
    id: SourceId,
    /// None이면 idle 소스
    interval: Option<Duration>,
    deadline: Instant,
    callback: SourceFn,
}

impl Source {
    fn is_ready(&self, now: Instant) -> bool {
        self.deadline <= now
    }
}

#[derive(Default)]
struct Inner {
    next_id: Cell<u64>,
    sources: RefCell<Vec<Source>>,
    /// 디스패치 중에 제거 요청된 소스
    removed: RefCell<HashSet<SourceId>>,
    quit: Cell<bool>,
}

/// 단일 스레드 run-loop 핸들 (복제 시 같은 루프를 가리킴)
#[derive(Clone, Default)]
pub struct RunLoop {
    inner: Rc<Inner>,
}

impl RunLoop {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 소스 등록
    // ========================================================================

    /// idle 소스 등록 (다음 턴부터 매 턴 호출)
    pub fn idle_add<F>(&self, callback: F) -> SourceId
    where
        F: FnMut() -> ControlFlow<()> + 'static,
    {
        self.push(None, Box::new(callback))
    }

    /// 타임아웃 소스 등록 (interval마다 호출)
    pub fn timeout_add<F>(&self, interval: Duration, callback: F) -> SourceId
    where
        F: FnMut() -> ControlFlow<()> + 'static,
    {
        self.push(Some(interval), Box::new(callback))
    }

    fn push(&self, interval: Option<Duration>, callback: SourceFn) -> SourceId {
        let id = SourceId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let deadline = Instant::now() + interval.unwrap_or_default();
        self.inner.sources.borrow_mut().push(Source {
            id,
            interval,
            deadline,
            callback,
        });
        trace!("Added {} (interval: {:?})", id, interval);
        id
    }

    /// 소스 제거. 디스패치 중인 소스도 안전하게 제거됩니다.
    pub fn remove(&self, id: SourceId) {
        let mut sources = self.inner.sources.borrow_mut();
        let before = sources.len();
        sources.retain(|s| s.id != id);
        if sources.len() == before {
            self.inner.removed.borrow_mut().insert(id);
        }
    }

    /// `run()` 종료 요청
    pub fn quit(&self) {
        self.inner.quit.set(true);
    }

    /// 등록된 소스 수
    pub fn pending(&self) -> usize {
        self.inner.sources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    // ========================================================================
    // 실행
    // ========================================================================

    /// 한 턴 실행. 준비된 소스를 각각 최대 한 번 디스패치하고 그 수를 반환
    pub fn iterate(&self) -> usize {
        let now = Instant::now();
        let pending = std::mem::take(&mut *self.inner.sources.borrow_mut());
        let mut kept = Vec::with_capacity(pending.len());
        let mut dispatched = 0;

        for mut source in pending {
            if self.inner.removed.borrow_mut().remove(&source.id) {
                continue;
            }
            if !source.is_ready(now) {
                kept.push(source);
                continue;
            }

            dispatched += 1;
            let flow = (source.callback)();

            if self.inner.removed.borrow_mut().remove(&source.id) {
                continue;
            }
            if flow.is_continue() {
                if let Some(interval) = source.interval {
                    source.deadline = Instant::now() + interval;
                }
                kept.push(source);
            } else {
                trace!("Removed {} after Break", source.id);
            }
        }

        let mut sources = self.inner.sources.borrow_mut();
        let added = std::mem::take(&mut *sources);
        kept.extend(added);
        *sources = kept;
        dispatched
    }

    /// 즉시 실행 가능한 작업이 없어질 때까지 반복 (미래의 타임아웃은 기다리지 않음)
    pub fn run_until_idle(&self) -> usize {
        let mut turns = 0;
        while !self.inner.quit.get() && self.has_ready(Instant::now()) {
            self.iterate();
            turns += 1;
        }
        turns
    }

    /// 소스가 모두 사라지거나 `quit()`이 호출될 때까지 실행
    pub async fn run(&self) {
        self.inner.quit.set(false);
        loop {
            if self.inner.quit.get() || self.is_empty() {
                break;
            }

            if self.has_ready(Instant::now()) {
                self.iterate();
                tokio::task::yield_now().await;
            } else if let Some(deadline) = self.next_deadline() {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            }
        }
    }

    fn has_ready(&self, now: Instant) -> bool {
        self.inner.sources.borrow().iter().any(|s| s.is_ready(now))
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.inner.sources.borrow().iter().map(|s| s.deadline).min()
    }
}

impl std::fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLoop")
            .field("pending", &self.pending())
            .field("quit", &self.inner.quit.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_continue_and_break() {
        let run_loop = RunLoop::new();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        run_loop.idle_add(move || {
            counter.set(counter.get() + 1);
            if counter.get() < 3 {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });

        assert_eq!(run_loop.run_until_idle(), 3);
        assert_eq!(calls.get(), 3);
        assert!(run_loop.is_empty());
    }

    #[test]
    fn test_sources_added_during_turn_run_next_turn() {
        let run_loop = RunLoop::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_loop = run_loop.clone();
        let log = Rc::clone(&order);
        run_loop.idle_add(move || {
            log.borrow_mut().push("outer");
            let nested = Rc::clone(&log);
            inner_loop.idle_add(move || {
                nested.borrow_mut().push("inner");
                ControlFlow::Break(())
            });
            ControlFlow::Break(())
        });

        assert_eq!(run_loop.iterate(), 1);
        assert_eq!(*order.borrow(), vec!["outer"]);
        assert_eq!(run_loop.iterate(), 1);
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_remove_during_dispatch() {
        let run_loop = RunLoop::new();
        let calls = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<SourceId>>> = Rc::new(Cell::new(None));

        let handle = run_loop.clone();
        let slot = Rc::clone(&id_slot);
        let counter = Rc::clone(&calls);
        let id = run_loop.idle_add(move || {
            counter.set(counter.get() + 1);
            if let Some(id) = slot.get() {
                handle.remove(id);
            }
            ControlFlow::Continue(())
        });
        id_slot.set(Some(id));

        run_loop.run_until_idle();
        assert_eq!(calls.get(), 1);
        assert!(run_loop.is_empty());
    }

    #[test]
    fn test_future_timeout_not_dispatched_by_run_until_idle() {
        let run_loop = RunLoop::new();
        run_loop.timeout_add(Duration::from_secs(3600), || ControlFlow::Break(()));

        assert_eq!(run_loop.run_until_idle(), 0);
        assert_eq!(run_loop.pending(), 1);
    }

    #[tokio::test]
    async fn test_run_drives_timeouts() {
        let run_loop = RunLoop::new();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        run_loop.timeout_add(Duration::from_millis(5), move || {
            counter.set(counter.get() + 1);
            if counter.get() < 2 {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });

        run_loop.run().await;
        assert_eq!(calls.get(), 2);
    }
}

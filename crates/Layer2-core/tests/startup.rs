//! 시작 경로 통합 테스트 (발견 → 검증 → 스케줄 → 초기화 → 배치)

mod common;

use common::{plugin_toml, Harness};
use std::ops::ControlFlow;
use std::rc::Rc;
use tessera_core::plugin::{PlacedIn, PluginStatus, ScheduleDiagnostic};
use tessera_core::ui::{Container, HeadlessBox};
use tessera_foundation::LoaderSettings;

#[test]
fn test_missing_dependency_is_never_instantiated() {
    let mut h = Harness::new();
    h.descriptor("one.toml", &plugin_toml("a.one", "background", ""));
    h.descriptor("two.toml", &plugin_toml("a.two", "background", "deps = [\"a.one\"]"));
    h.descriptor(
        "three.toml",
        &plugin_toml("a.three", "background", "deps = [\"missing.id\"]"),
    );
    h.recording("one", vec![]).recording("two", vec![]).recording("three", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(manager.schedule_order(), vec!["a.one", "a.two"]);
    assert_eq!(manager.live_ids(), vec!["a.one", "a.two"]);
    assert!(!manager.is_live("a.three"));
    assert_eq!(h.count("three:on_start"), 0);
    assert_eq!(manager.status("a.three"), Some(PluginStatus::Unschedulable));
    assert_eq!(
        manager.diagnostics(),
        vec![ScheduleDiagnostic::MissingDependency {
            plugin: "a.three".to_string(),
            token: "missing.id".to_string(),
        }]
    );
    assert!(h.ctx.startup_finished());
}

#[test]
fn test_chunked_phases_invocation_counts() {
    let mut h = Harness::new();
    for i in 0..47 {
        h.descriptor(
            &format!("bulk/p{:02}.toml", i),
            &plugin_toml(&format!("bulk.p{:02}", i), "background", "factory = \"bulk\""),
        );
    }
    h.recording("bulk", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    assert!(!h.ctx.startup_finished());
    h.run_loop.run_until_idle();

    let stats = manager.stats();
    assert_eq!(stats.import_invocations, 3);
    assert_eq!(stats.init_invocations, 10);

    let mut live = manager.live_ids();
    live.sort();
    let expected: Vec<String> = (0..47).map(|i| format!("bulk.p{:02}", i)).collect();
    assert_eq!(live, expected);
    assert_eq!(h.count("bulk:on_start"), 47);
    assert!(h.ctx.startup_finished());
}

#[test]
fn test_one_chunk_per_turn() {
    let mut h = Harness::new();
    for i in 0..4 {
        h.descriptor(
            &format!("p{}.toml", i),
            &plugin_toml(&format!("x.p{}", i), "background", "factory = \"bulk\""),
        );
    }
    h.recording("bulk", vec![]);

    let settings = LoaderSettings::default()
        .with_import_chunk_size(3)
        .with_init_chunk_size(2);
    let manager = h.manager_with(settings);
    manager.load_plugins();

    h.run_loop.iterate();
    assert_eq!(manager.stats().import_invocations, 1);
    h.run_loop.iterate();
    assert_eq!(manager.stats().import_invocations, 2);
    assert_eq!(manager.stats().init_invocations, 0);
    h.run_loop.iterate();
    assert_eq!(manager.live_ids().len(), 2);
    assert!(!h.ctx.startup_finished());
    h.run_loop.iterate();
    assert_eq!(manager.live_ids().len(), 4);
    assert!(h.ctx.startup_finished());
}

#[test]
fn test_priority_and_region_root_ordering() {
    let mut h = Harness::new();
    h.descriptor(
        "panel/top_panel.toml",
        &plugin_toml("org.t.top_panel", "top-panel", ""),
    );
    h.descriptor(
        "widgets/clock.toml",
        &plugin_toml("org.t.clock", "top-panel-center", "priority = 50"),
    );
    h.descriptor(
        "widgets/battery.toml",
        &plugin_toml("org.t.battery", "top-panel-right", "priority = 50\nindex = -1"),
    );
    h.descriptor(
        "widgets/notes.toml",
        &plugin_toml("org.t.notes", "background", "priority = 10"),
    );
    h.panel("top_panel")
        .recording("clock", vec![40.0])
        .recording("battery", vec![30.0])
        .recording("notes", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    // 리전 루트는 priority와 무관하게 그 영역의 위젯보다 먼저
    assert_eq!(
        manager.schedule_order(),
        vec!["org.t.notes", "org.t.top_panel", "org.t.battery", "org.t.clock"]
    );
    assert_eq!(
        manager.resolved_deps("clock").unwrap().ids,
        vec!["org.t.top_panel"]
    );
    assert_eq!(h.region("top_panel_box_center").child_names(), vec!["clock_box"]);
    assert_eq!(h.region("top_panel_box_right").child_names(), vec!["battery_box"]);
    assert_eq!(h.region("top_panel_box_right").allocated_width(), 30.0);
    assert_eq!(manager.last_placed().as_deref(), Some("org.t.clock"));
    assert!(manager.placed("notes").is_none());
}

#[test]
fn test_hidden_widgets_routed_to_overflow() {
    let mut h = Harness::with_config("[\"org.t.volume\"]\nhide_in_systray = true\n");
    h.descriptor(
        "top_panel.toml",
        &plugin_toml("org.t.top_panel", "top-panel", "priority = 100"),
    );
    h.descriptor(
        "network.toml",
        &plugin_toml("org.t.network", "top-panel-right", "hidden = true\nindex = 1"),
    );
    h.descriptor(
        "volume.toml",
        &plugin_toml("org.t.volume", "top-panel-right", "index = 2"),
    );
    h.descriptor(
        "clock.toml",
        &plugin_toml("org.t.clock", "top-panel-center", "index = 0"),
    );
    h.panel("top_panel")
        .recording("network", vec![10.0, 12.0])
        .recording("volume", vec![8.0])
        .recording("clock", vec![40.0]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(
        h.overflow.hidden_names(),
        vec!["network_overflow_box", "volume_0"]
    );
    assert!(h.region("top_panel_box_right").is_empty());
    assert!(manager.placed("network").unwrap().is_hidden());
    assert!(matches!(
        manager.placed("clock").unwrap().placed_in,
        PlacedIn::Container(_)
    ));
    // 오버플로 배치는 용량 교정 대상이 아님
    assert_eq!(manager.last_placed().as_deref(), Some("org.t.clock"));
}

#[test]
fn test_persisted_plugin_lists() {
    let mut h = Harness::with_config("[plugins]\ndisabled = [\"weather\"]\n");
    h.descriptor("clock.toml", &plugin_toml("org.t.clock", "background", ""));
    h.descriptor("weather.toml", &plugin_toml("org.t.weather", "background", ""));
    h.descriptor(
        "legacy.toml",
        &plugin_toml("org.t.legacy", "background", "enabled = false"),
    );
    h.recording("clock", vec![]).recording("weather", vec![]).recording("legacy", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    let enabled: Vec<String> = h.ctx.get_config(&["plugins", "enabled"], Vec::new());
    let disabled: Vec<String> = h.ctx.get_config(&["plugins", "disabled"], Vec::new());
    assert_eq!(enabled, vec!["org.t.clock"]);
    assert_eq!(disabled, vec!["weather"]);

    assert_eq!(manager.live_ids(), vec!["org.t.clock"]);
    assert_eq!(manager.skipped().len(), 2);
    assert_eq!(manager.summary().skipped, 2);
}

#[test]
fn test_invalid_modules_are_skipped_not_fatal() {
    let mut h = Harness::new();
    h.descriptor("broken.toml", "[plugin\nid = ");
    h.descriptor("nofactory.toml", &plugin_toml("org.t.nofactory", "background", ""));
    h.descriptor("nowhere.toml", &plugin_toml("org.t.nowhere", "somewhere-else", ""));
    h.descriptor("notes.txt", "not a descriptor");
    h.descriptor("ok.toml", &plugin_toml("org.t.ok", "background", ""));
    h.descriptor("boom.toml", &plugin_toml("org.t.boom", "background", ""));
    h.recording("ok", vec![]).recording("nowhere", vec![]).failing("boom");

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(manager.live_ids(), vec!["org.t.ok"]);
    assert_eq!(manager.status("boom"), Some(PluginStatus::Failed));
    assert_eq!(manager.status("ok"), Some(PluginStatus::Active));

    let skipped: Vec<String> = manager
        .skipped()
        .into_iter()
        .map(|s| s.import_path)
        .collect();
    assert_eq!(skipped, vec!["broken", "nofactory", "nowhere"]);

    let summary = manager.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.live, 1);
    assert_eq!(summary.failed, 1);
    assert!(h.ctx.startup_finished());
}

#[test]
fn test_cycle_reported_and_rest_still_runs() {
    let mut h = Harness::new();
    h.descriptor("x.toml", &plugin_toml("c.x", "background", "deps = [\"y\"]"));
    h.descriptor("y.toml", &plugin_toml("c.y", "background", "deps = [\"x\"]"));
    h.descriptor("z.toml", &plugin_toml("c.z", "background", "deps = [\"c.x\"]"));
    h.descriptor("solo.toml", &plugin_toml("c.solo", "background", ""));
    h.recording("x", vec![]).recording("y", vec![]).recording("z", vec![]).recording("solo", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(manager.live_ids(), vec!["c.solo"]);
    assert_eq!(
        manager.diagnostics(),
        vec![
            ScheduleDiagnostic::Cycle {
                plugins: vec!["c.x".to_string(), "c.y".to_string()],
            },
            ScheduleDiagnostic::Blocked {
                plugin: "c.z".to_string(),
                on: vec!["c.x".to_string()],
            },
        ]
    );
    assert_eq!(manager.summary().unscheduled, 3);
}

#[test]
fn test_plan_has_no_side_effects() {
    let mut h = Harness::new();
    h.descriptor("one.toml", &plugin_toml("a.one", "background", ""));
    h.descriptor("two.toml", &plugin_toml("a.two", "background", "deps = [\"one\"]"));
    h.recording("one", vec![]).recording("two", vec![]);

    let manager = h.manager();
    let plan = manager.plan();

    let order: Vec<&str> = plan.order.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(order, vec!["a.one", "a.two"]);
    assert_eq!(plan.order[1].deps, vec!["a.one"]);
    assert!(plan.diagnostics.is_empty());

    assert!(h.events().is_empty());
    assert!(manager.live_ids().is_empty());
    assert!(h.ctx.config().get(&["plugins", "enabled"]).is_none());
    assert_eq!(h.run_loop.pending(), 0);
}

#[test]
fn test_non_identifier_directory_is_search_root() {
    let mut h = Harness::new();
    h.descriptor(
        "third-party/weather/forecast.toml",
        &plugin_toml("org.t.forecast", "background", ""),
    );
    h.recording("forecast", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(manager.record("forecast").unwrap().import_path, "weather.forecast");
    assert_eq!(manager.search_roots(), vec![h.dir.path().join("third-party")]);
    assert!(manager.is_live("org.t.forecast"));
}

#[test]
fn test_placement_retried_until_container_appears() {
    let mut h = Harness::new();
    h.descriptor(
        "dock.toml",
        &plugin_toml("org.t.dock", "bottom-panel-left", ""),
    );
    h.recording("dock", vec![20.0]);
    let manager = h.manager();

    // 컨테이너는 몇 턴 뒤에 등록됨
    let late = HeadlessBox::new("bottom_panel_box_left");
    let ctx = Rc::clone(&h.ctx);
    let region = Rc::clone(&late);
    let mut turns = 0;
    h.run_loop.idle_add(move || {
        turns += 1;
        if turns < 4 {
            return ControlFlow::Continue(());
        }
        ctx.register_container("bottom_panel_box_left", Rc::clone(&region) as tessera_core::ContainerRef);
        ControlFlow::Break(())
    });

    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(late.child_names(), vec!["dock_box"]);
    assert_eq!(manager.last_placed().as_deref(), Some("org.t.dock"));
}

#[test]
fn test_shared_short_name_places_into_own_regions() {
    let mut h = Harness::new();
    h.descriptor(
        "top_panel.toml",
        &plugin_toml("org.t.top_panel", "top-panel", "priority = 100"),
    );
    h.descriptor(
        "a_clock.toml",
        &plugin_toml("org.a.clock", "top-panel-left", ""),
    );
    h.descriptor(
        "b_clock.toml",
        &plugin_toml("org.b.clock", "top-panel-right", ""),
    );
    h.panel("top_panel")
        .recording("a_clock", vec![40.0])
        .recording("b_clock", vec![25.0]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(
        manager.live_ids(),
        vec!["org.t.top_panel", "org.a.clock", "org.b.clock"]
    );
    let left = h.region("top_panel_box_left");
    let right = h.region("top_panel_box_right");
    assert_eq!(left.child_names(), vec!["clock_box"]);
    assert_eq!(left.allocated_width(), 40.0);
    assert_eq!(right.child_names(), vec!["clock_box"]);
    assert_eq!(right.allocated_width(), 25.0);

    // 짧은 이름은 먼저 등록된 플러그인을 가리킴
    assert_eq!(manager.record("clock").unwrap().id, "org.a.clock");

    assert!(manager.detach("org.b.clock"));
    assert!(right.is_empty());
    assert_eq!(left.allocated_width(), 40.0);
}

#[test]
fn test_failing_start_hook_marks_failed_and_chunk_continues() {
    let mut h = Harness::new();
    h.descriptor("one.toml", &plugin_toml("a.one", "background", "index = 1"));
    h.descriptor("two.toml", &plugin_toml("a.two", "background", "index = 2"));
    h.descriptor("three.toml", &plugin_toml("a.three", "background", "index = 3"));
    h.recording("one", vec![])
        .recording_failing("two", vec![], &["on_start"])
        .recording("three", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    // 세 플러그인 모두 한 청크
    assert_eq!(manager.stats().init_invocations, 1);
    assert_eq!(h.count("two:on_start"), 1);
    assert_eq!(h.count("three:on_start"), 1);

    assert_eq!(manager.status("a.two"), Some(PluginStatus::Failed));
    assert!(!manager.is_live("a.two"));
    assert_eq!(manager.live_ids(), vec!["a.one", "a.three"]);
    assert_eq!(manager.summary().failed, 1);
    assert!(h.ctx.startup_finished());
}

#[test]
fn test_duplicate_id_is_reported_as_skipped() {
    let mut h = Harness::new();
    h.descriptor("first.toml", &plugin_toml("a.dup", "background", ""));
    h.descriptor("second.toml", &plugin_toml("a.dup", "background", ""));
    h.recording("first", vec![]).recording("second", vec![]);

    let manager = h.manager();
    manager.load_plugins();
    h.run_loop.run_until_idle();

    assert_eq!(manager.live_ids(), vec!["a.dup"]);
    assert_eq!(h.count("first:on_start"), 1);
    assert_eq!(h.count("second:on_start"), 0);
    assert_eq!(manager.record("a.dup").unwrap().module_name, "first");

    let skipped = manager.skipped();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].import_path, "second");
    assert_eq!(skipped[0].plugin.as_deref(), Some("a.dup"));
    assert_eq!(manager.summary().skipped, 1);
    assert_eq!(manager.plan().skipped.len(), 1);
}

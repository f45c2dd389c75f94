//! Reconciliation cycle contracts
//!
//! Verifies the controller's cycle algorithm end to end over in-memory
//! collaborators: change detection, fan-out, history ordering and the
//! no-op behavior of an unchanged address.

mod common;

use common::{creds, harness, RecordingGateway, ScriptedAddressSource};
use hostsync_core::traits::HistoryAction;
use hostsync_core::StateStore;

#[tokio::test]
async fn first_observation_updates_every_host() {
    let source = ScriptedAddressSource::steady("203.0.113.9");
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway.clone());

    h.hosts.add("home.example.net", creds()).await;

    let report = h.controller.run_cycle().await.unwrap();

    assert!(report.address_changed, "first observation counts as a change");
    assert_eq!(report.updated(), 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(gateway.calls(), vec![(
        "home.example.net".to_string(),
        "203.0.113.9".to_string()
    )]);

    let state = h.state.load().await.unwrap();
    assert_eq!(state.current_address.as_deref(), Some("203.0.113.9"));
    assert!(state.last_check.is_some());

    let host = h.hosts.get(1).await.unwrap();
    assert_eq!(host.last_status, Some(true));
    assert_eq!(host.last_error, None);
    assert!(host.last_update.is_some());
}

#[tokio::test]
async fn address_change_is_recorded_before_host_updates() {
    let source = ScriptedAddressSource::steady("198.51.100.4");
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway);

    h.hosts.add("a.example.net", creds()).await;
    h.hosts.add("b.example.net", creds()).await;

    h.controller.run_cycle().await.unwrap();

    let entries = h.history.entries().await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].action, HistoryAction::IpChanged);
    assert!(entries[0].details.contains("from none to 198.51.100.4"));
    assert_eq!(entries[1].action, HistoryAction::HostUpdated);
    assert_eq!(entries[1].hostname.as_deref(), Some("a.example.net"));
    assert_eq!(entries[2].action, HistoryAction::HostUpdated);
    assert_eq!(entries[2].hostname.as_deref(), Some("b.example.net"));
}

#[tokio::test]
async fn unchanged_address_touches_nothing_but_last_check() {
    let source = ScriptedAddressSource::steady("203.0.113.9");
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway.clone());

    h.hosts.add("home.example.net", creds()).await;

    h.controller.run_cycle().await.unwrap();
    let first_check = h.state.load().await.unwrap().last_check.unwrap();
    let calls_after_first = gateway.call_count();
    let history_after_first = h.history.len().await;

    let report = h.controller.run_cycle().await.unwrap();

    assert!(!report.address_changed);
    assert!(report.outcomes.is_empty());
    assert_eq!(gateway.call_count(), calls_after_first, "no provider traffic");
    assert_eq!(h.history.len().await, history_after_first, "no history noise");

    let state = h.state.load().await.unwrap();
    assert_eq!(state.current_address.as_deref(), Some("203.0.113.9"));
    assert!(state.last_check.unwrap() >= first_check, "last_check advanced");
}

#[tokio::test]
async fn new_address_fans_out_to_all_hosts_again() {
    let source = ScriptedAddressSource::sequence(vec![Ok("192.0.2.1"), Ok("192.0.2.2")]);
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway.clone());

    h.hosts.add("a.example.net", creds()).await;
    h.hosts.add("b.example.net", creds()).await;

    h.controller.run_cycle().await.unwrap();
    let report = h.controller.run_cycle().await.unwrap();

    assert!(report.address_changed);
    assert_eq!(report.updated(), 2);
    assert_eq!(gateway.call_count(), 4);
    assert_eq!(
        h.state.load().await.unwrap().current_address.as_deref(),
        Some("192.0.2.2")
    );

    // Two cycles, each with its own change entry ahead of the host entries.
    let entries = h.history.entries().await;
    let changes: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.action == HistoryAction::IpChanged)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(changes, vec![0, 3]);
    assert!(entries[3].details.contains("from 192.0.2.1 to 192.0.2.2"));
}

#[tokio::test]
async fn failed_lookup_skips_the_cycle_untouched() {
    let source = ScriptedAddressSource::sequence(vec![Err("connect timeout")]);
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway.clone());

    h.hosts.add("home.example.net", creds()).await;

    let report = h.controller.run_cycle().await.unwrap();

    assert!(report.skipped.is_some());
    assert_eq!(gateway.call_count(), 0);
    assert!(h.history.is_empty().await);

    let state = h.state.load().await.unwrap();
    assert!(state.is_initial(), "a failed lookup is not an observation");
    assert_eq!(state.last_check, None);

    let host = h.hosts.get(1).await.unwrap();
    assert_eq!(host.last_status, None, "hosts are untouched on a skip");
}

#[tokio::test]
async fn events_mirror_the_cycle() {
    use hostsync_core::controller::ControllerEvent;

    let source = ScriptedAddressSource::steady("203.0.113.9");
    let gateway = RecordingGateway::new();
    let mut h = harness(source, gateway);

    h.hosts.add("home.example.net", creds()).await;
    h.controller.run_cycle().await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = h.events.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            ControllerEvent::AddressChanged {
                previous: None,
                current: "203.0.113.9".into(),
            },
            ControllerEvent::HostUpdated {
                hostname: "home.example.net".into(),
                address: "203.0.113.9".into(),
            },
            ControllerEvent::CycleCompleted {
                updated: 1,
                failed: 0,
            },
        ]
    );
}

#[tokio::test]
async fn status_reflects_state_without_credentials() {
    let source = ScriptedAddressSource::steady("203.0.113.9");
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway);

    h.hosts.add("home.example.net", creds()).await;
    h.controller.run_cycle().await.unwrap();

    let status = h.controller.status().await.unwrap();
    assert_eq!(status.current_address.as_deref(), Some("203.0.113.9"));
    assert!(status.last_check.is_some());
    assert_eq!(status.hosts.len(), 1);
    assert_eq!(status.hosts[0].last_status, Some(true));

    let json = serde_json::to_string(&status).unwrap();
    assert!(!json.contains("dynhost-secret"));
}

#[tokio::test]
async fn empty_registry_completes_quietly() {
    let source = ScriptedAddressSource::steady("203.0.113.9");
    let gateway = RecordingGateway::new();
    let h = harness(source, gateway.clone());

    let report = h.controller.run_cycle().await.unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(gateway.call_count(), 0);
    assert!(h.state.load().await.unwrap().last_check.is_some());
}

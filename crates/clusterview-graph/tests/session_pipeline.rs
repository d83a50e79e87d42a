use clusterview_core::{Account, AccountLink, Cluster, ClusterId, ClusterPayload, IntegrityIssue};
use clusterview_events::{Event, EventBus, LayoutOutcome};
use clusterview_graph::{
    GraphSession, GraphSettings, HitResult, HitTester, Interaction, SizeTier, Vec2,
};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn fixture_clusters() -> anyhow::Result<Vec<Cluster>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/clusters.json");
    let raw = fs::read_to_string(path)?;
    Ok(ClusterPayload::from_json(&raw)?)
}

fn seeded_settings() -> GraphSettings {
    let mut settings = GraphSettings::default();
    settings.layout.seed = Some(2024);
    settings.layout.iterations = 80;
    settings
}

/// Star-shaped cluster with `count` accounts.
fn synthetic_cluster(id: i64, count: usize) -> Cluster {
    let hub = format!("hub-{id}");
    let mut accounts = vec![Account::new(hub.clone(), 0, 50_000.0)];
    let mut links = Vec::new();
    for i in 1..count {
        let address = format!("acct-{id}-{i}");
        links.push(AccountLink::new(hub.clone(), address.clone(), 25.0));
        accounts.push(Account::new(address, 1, 25.0));
    }
    Cluster::new(id, accounts, links)
}

#[test]
fn test_fixture_renders_end_to_end() -> anyhow::Result<()> {
    let clusters = fixture_clusters()?;
    let bus = EventBus::new();
    let mut session = GraphSession::new(seeded_settings(), bus.clone());

    session.redraw(&clusters);
    let frame = session
        .wait_for_layout(Duration::from_secs(30))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no frame committed"))?;

    assert_eq!(frame.outcome, LayoutOutcome::Stopped);
    assert_eq!(frame.nodes.len(), 7);
    assert_eq!(frame.edges.len(), 4);
    assert_eq!(
        frame.issues,
        vec![IntegrityIssue::DanglingLink {
            cluster: ClusterId(12),
            link: format!(
                "{}-{}",
                "HN7cABqLq46Es1jh92dQQisAq662SmxELLLsHHe4YWrH",
                "GhostAccountNotInThisCluster1111111111111111"
            ),
            missing: "GhostAccountNotInThisCluster1111111111111111".into(),
        }]
    );

    // Whale volume wraps to the smallest node size.
    let whale = frame
        .node("5zsbHMxdgLUPMFPHTwCykxbbmQ6R7dd8T9vhzWKfuTdm")
        .ok_or_else(|| anyhow::anyhow!("missing whale"))?;
    assert_eq!(whale.size, 10.0);
    assert_eq!(whale.label, "5zsb...uTdm");

    // Largest cluster first, all small tier on one row.
    let order: Vec<i64> = frame.placements.iter().map(|p| p.cluster.0).collect();
    assert_eq!(order, vec![11, 12, 13]);
    assert!(frame.placements.iter().all(|p| p.tier == SizeTier::Small && p.row == 0));
    assert_eq!(frame.placements[0].after.min, Vec2::ZERO);

    // Small canvas against 600px padding: fit clamps to the minimum zoom.
    assert_eq!(frame.viewport.zoom, 0.15);

    let events = bus.drain();
    let committed = events
        .iter()
        .position(|e| matches!(e, Event::FrameCommitted { generation: 1, .. }));
    let stopped = events
        .iter()
        .position(|e| matches!(e, Event::LayoutStopped { generation: 1, .. }));
    let packed = events
        .iter()
        .position(|e| matches!(e, Event::PackComplete { generation: 1, .. }));
    assert!(stopped < packed && packed < committed);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::IntegrityIssue { cluster: ClusterId(12), .. })));
    Ok(())
}

#[test]
fn test_tiers_and_rows_with_large_clusters() -> anyhow::Result<()> {
    let clusters = vec![
        synthetic_cluster(1, 3),
        synthetic_cluster(2, 120),
        synthetic_cluster(3, 8),
        synthetic_cluster(4, 45),
    ];
    let mut settings = seeded_settings();
    settings.layout.iterations = 30;
    let mut session = GraphSession::new(settings, EventBus::new());

    session.redraw(&clusters);
    let frame = session
        .wait_for_layout(Duration::from_secs(60))
        .ok_or_else(|| anyhow::anyhow!("no frame committed"))?;

    let slots: Vec<(i64, SizeTier, usize, usize)> = frame
        .placements
        .iter()
        .map(|p| (p.cluster.0, p.tier, p.row, p.column))
        .collect();
    assert_eq!(
        slots,
        vec![
            (2, SizeTier::ExtraLarge, 0, 0),
            (4, SizeTier::Large, 1, 0),
            (3, SizeTier::Small, 1, 2),
            (1, SizeTier::Small, 1, 3),
        ]
    );

    let eight = &frame.placements[2];
    let three = &frame.placements[3];
    assert!((three.after.min.x - eight.after.max.x - 120.0).abs() < 1e-2);

    for (i, a) in frame.placements.iter().enumerate() {
        for b in &frame.placements[i + 1..] {
            assert!(!a.after.intersects(&b.after));
        }
    }
    Ok(())
}

#[test]
fn test_hover_tooltip_on_committed_frame() -> anyhow::Result<()> {
    let clusters = fixture_clusters()?;
    let bus = EventBus::new();
    let mut session = GraphSession::new(seeded_settings(), bus.clone());
    session.redraw(&clusters);
    let frame = session
        .wait_for_layout(Duration::from_secs(30))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no frame committed"))?;

    let tester = HitTester::from_frame(&frame);
    let target = frame
        .node("EdCNh8EzETJLFphW8yvdY7rDd8zBiyweiz8DU5gUUUka")
        .ok_or_else(|| anyhow::anyhow!("missing node"))?;
    let rendered = frame.rendered_position(target);

    let mut interaction = Interaction::new(bus);
    let tooltip = interaction
        .pointer_move(&frame, &tester, rendered, Vec2::new(16.0, 32.0), 2.0)
        .clone();
    assert!(tooltip.visible);
    assert_eq!(tooltip.address, target.id);
    assert_eq!(tooltip.volume_label, "$48,210.75");
    assert!((tooltip.x - (16.0 + rendered.x / 2.0 + 2.0)).abs() < 1e-3);

    interaction.tap(&HitResult::None);
    assert!(!interaction.tooltip().visible);
    Ok(())
}

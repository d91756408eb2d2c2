//! Integration tests for the elo-sim rating engine
//!
//! These tests validate the system working end to end, including:
//! - Registration, concurrent simulation and reporting
//! - Rating conservation of wins and losses under contention
//! - Self-pairing rejection
//! - Backing store failures and recovery

mod fixtures;

use elo_sim::config::AppConfig;
use elo_sim::error::EloSimError;
use elo_sim::rating::win_chance;
use elo_sim::service::EloSim;
use elo_sim::store::{FaultInjectingRecordStore, InMemoryRecordStore, RecordStore};
use std::sync::Arc;
use std::time::Duration;

use fixtures::{alternating_pairing, create_test_sim, flat_config, test_config, total_games};

#[tokio::test]
async fn test_parity_match_moves_sixteen_points() {
    let sim = create_test_sim(flat_config(1, 32.0), Arc::new(InMemoryRecordStore::new()), 2).await;

    assert_eq!(win_chance(1000, 1000), 0.5);

    let applied = sim.store().apply_outcome(1, 2, true).await.unwrap();
    assert_eq!((applied.after.side_a, applied.after.side_b), (1016, 984));

    let winner = sim.store().get(1).await.unwrap();
    let loser = sim.store().get(2).await.unwrap();
    assert_eq!((winner.rating, winner.wins, winner.losses), (1016, 1, 0));
    assert_eq!((loser.rating, loser.wins, loser.losses), (984, 0, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_lost_updates_under_contention() {
    let mut config = test_config(2024);
    config.simulation.workers = 64;
    let mut sim = create_test_sim(config, Arc::new(InMemoryRecordStore::new()), 50).await;

    let summary = sim.run(5000).await.unwrap();

    assert_eq!(summary.attempted, 5000);
    assert_eq!(summary.recorded + summary.failed, 5000);
    assert_eq!(summary.failed, 0);

    let competitors = sim.store().snapshot_all().await.unwrap();
    assert_eq!(competitors.len(), 50);
    assert_eq!(total_games(&competitors), 2 * summary.recorded);

    let wins: u64 = competitors.iter().map(|c| c.wins).sum();
    let losses: u64 = competitors.iter().map(|c| c.losses).sum();
    assert_eq!(wins, losses);

    for competitor in &competitors {
        assert!(
            (600..=2400).contains(&competitor.rating),
            "competitor {} out of bounds at {}",
            competitor.id,
            competitor.rating
        );
        assert!(!competitor.in_match);
    }

    let report = sim.final_report().await.unwrap();
    assert_eq!(report.total_matches, summary.recorded);
    assert_eq!(sim.history().total_matches().await, summary.recorded);
    assert!(report.unique_matches <= 50 * 49 / 2);
    assert_eq!(report.rating_brackets.iter().sum::<u64>(), 50);

    sim.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_self_pairing_is_never_recorded() {
    let (strategy, pairing) = alternating_pairing();
    let mut sim = EloSim::builder(test_config(5))
        .pairing(pairing)
        .build()
        .unwrap();
    sim.add_competitors(8).await.unwrap();

    let summary = sim.run(400).await.unwrap();

    assert_eq!(summary.recorded, 400);
    assert!(strategy.calls() >= 800);
    for recorded in sim.history().matches().await {
        assert_ne!(recorded.side_a, recorded.side_b);
    }
    assert!(sim.metrics().matches().self_pairings_rejected_total.get() >= 400);
}

#[tokio::test]
async fn test_report_is_idempotent_after_drain() {
    let mut sim = create_test_sim(test_config(9), Arc::new(InMemoryRecordStore::new()), 12).await;
    sim.run(300).await.unwrap();

    let first = sim.final_report().await.unwrap();
    let second = sim.final_report().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn test_seeded_single_worker_runs_are_reproducible() {
    let run = || async {
        let mut config = test_config(77);
        config.simulation.workers = 1;
        let mut sim = create_test_sim(config, Arc::new(InMemoryRecordStore::new()), 10).await;
        sim.run(200).await.unwrap();
        sim.store().snapshot_all().await.unwrap()
    };

    let first = run().await;
    let second = run().await;

    let ratings = |population: &[elo_sim::CompetitorSnapshot]| {
        population
            .iter()
            .map(|c| (c.id, c.rating, c.wins, c.losses))
            .collect::<Vec<_>>()
    };
    assert_eq!(ratings(&first), ratings(&second));
}

#[tokio::test]
async fn test_insufficient_population() {
    let mut sim = create_test_sim(test_config(1), Arc::new(InMemoryRecordStore::new()), 1).await;

    let result = sim.run(10).await;
    tokio_test::assert_err!(&result);
    assert_eq!(
        result,
        Err(EloSimError::InsufficientPopulation { population: 1 })
    );
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let toml = r#"
        [rating]
        min_rating = 2400
        max_rating = 600
    "#;
    let error = AppConfig::from_toml_str(toml).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<EloSimError>(),
        Some(EloSimError::InvalidConfig { .. })
    ));

    let mut config = test_config(1);
    config.simulation.workers = 0;
    assert!(matches!(
        EloSim::new(config),
        Err(EloSimError::InvalidConfig { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_store_outage_fails_matches_without_partial_updates() {
    let backend = Arc::new(FaultInjectingRecordStore::new());
    let mut sim = create_test_sim(test_config(3), backend.clone(), 10).await;

    backend.set_available(false);
    let summary = sim.run(50).await.unwrap();

    assert_eq!(summary.recorded, 0);
    assert_eq!(summary.failed, 50);
    assert_eq!(summary.failures.get("store_unavailable"), Some(&50));

    let competitors = sim.store().snapshot_all().await.unwrap();
    assert_eq!(total_games(&competitors), 0);
    assert!(competitors.iter().all(|c| c.rating == 1000 && !c.in_match));

    backend.set_available(true);
    let summary = sim.run(50).await.unwrap();
    assert_eq!(summary.recorded, 50);

    let report = sim.final_report().await.unwrap();
    assert_eq!(report.total_matches, 50);
    assert_eq!(report.failed_matches, 50);
}

#[tokio::test]
async fn test_matches_and_competitors_are_persisted() {
    let backend = Arc::new(InMemoryRecordStore::new());
    let mut sim = create_test_sim(test_config(4), backend.clone(), 6).await;

    let summary = sim.run(40).await.unwrap();

    let records = tokio_test::assert_ok!(backend.record_count().await);
    assert_eq!(records as u64, 6 + summary.recorded);

    let persisted = sim.history().load_persisted(1).await.unwrap();
    assert!(persisted.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_backend_still_drains() {
    let backend = Arc::new(InMemoryRecordStore::with_latency(Duration::from_millis(1)));
    let mut sim = create_test_sim(test_config(6), backend, 10).await;

    let summary = sim.run(100).await.unwrap();

    assert_eq!(summary.recorded, 100);
    let competitors = sim.store().snapshot_all().await.unwrap();
    assert_eq!(total_games(&competitors), 200);
}

#[tokio::test]
async fn test_shutdown_stops_the_store() {
    let mut sim = create_test_sim(test_config(8), Arc::new(InMemoryRecordStore::new()), 4).await;
    sim.run(20).await.unwrap();

    sim.shutdown().await.unwrap();

    assert!(matches!(
        sim.final_report().await,
        Err(EloSimError::StoreUnavailable { .. })
    ));
    let text = sim.metrics().gather_text().unwrap();
    assert!(text.contains("elo_sim_matches_recorded_total 20"));
}

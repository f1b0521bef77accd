// Integration tests for the swipe engine: controller, coordinator and store together

use std::sync::Arc;
use std::time::Duration;
use swipe_engine::core::{
    CardConfig, CoordinatorError, DecisionOutcome, DiscoveryController, Feedback,
    LikeMatchCoordinator, MatchNotifier, PointerTarget, Screen,
};
use swipe_engine::models::{Decision, Profile, ProfileId};
use swipe_engine::services::{LikeMatchStore, MemoryStore};

fn create_profile(id: &str) -> Profile {
    Profile {
        id: ProfileId::from(id),
        name: format!("User {}", id),
        age: 29,
        gender: Some("male".to_string()),
        city: Some("Lisbon".to_string()),
        bio: Some("Coffee and surfing".to_string()),
        interests: vec!["surfing".to_string()],
        is_online: false,
        last_seen: None,
        photo_ids: vec![format!("{}-1", id), format!("{}-2", id)],
    }
}

fn setup() -> (Arc<MemoryStore>, LikeMatchCoordinator) {
    let store = Arc::new(MemoryStore::new());
    let coordinator = LikeMatchCoordinator::new(
        store.clone() as Arc<dyn LikeMatchStore>,
        MatchNotifier::new(16),
        Duration::from_secs(2),
    );
    (store, coordinator)
}

fn controller_for(viewer: &str, ids: &[&str]) -> DiscoveryController {
    DiscoveryController::new(
        ProfileId::from(viewer),
        ids.iter().map(|id| create_profile(id)).collect(),
        CardConfig::default(),
    )
}

fn current_id(controller: &DiscoveryController) -> Option<String> {
    match controller.screen() {
        Screen::Browsing(profile) => Some(profile.id.to_string()),
        _ => None,
    }
}

#[tokio::test]
async fn test_integration_mutual_like_celebrates() {
    let (store, coordinator) = setup();
    let mut events = coordinator.notifier().subscribe();

    // B liked A in an earlier session
    coordinator
        .record_decision(&"b".into(), &"a".into(), Decision::Like)
        .await
        .unwrap();

    let mut controller = controller_for("a", &["b", "c"]);
    controller.pointer_down(200.0, 400.0, PointerTarget::Card);
    controller.pointer_move(380.0, 410.0);
    let ticket = controller.pointer_up().unwrap().expect("drag crossed the like threshold");

    assert_eq!(ticket.decision, Decision::Like);
    // Queue advanced before the network call
    assert_eq!(current_id(&controller).as_deref(), Some("c"));

    let result = ticket.dispatch(&coordinator).await;
    let feedback = controller.complete(&ticket, result);

    assert_eq!(feedback, Feedback::Matched("b".into()));
    assert_eq!(controller.celebration(), Some(&ProfileId::from("b")));
    assert_eq!(store.match_count().await, 1);

    let event = events.try_recv().unwrap();
    assert_eq!(event.profile_a_id.as_str(), "a");
    assert_eq!(event.profile_b_id.as_str(), "b");
}

#[tokio::test]
async fn test_integration_failed_like_rolls_back() {
    let (store, coordinator) = setup();
    let mut controller = controller_for("viewer", &["a", "b", "c"]);

    let ticket = controller.press(Decision::Like).unwrap().unwrap();
    assert_eq!(current_id(&controller).as_deref(), Some("b"));

    store.set_failing(true);
    let result = ticket.dispatch(&coordinator).await;
    assert!(matches!(result, Err(CoordinatorError::Transport(_))));

    let feedback = controller.complete(&ticket, result);

    let Feedback::RolledBack(error) = feedback else {
        panic!("expected a rollback");
    };
    assert_eq!(error.profile_id.as_str(), "a");
    assert_eq!(error.decision, Decision::Like);
    assert_eq!(current_id(&controller).as_deref(), Some("a"));
    assert!(!controller.queue().is_decided(&"a".into()));
    assert!(controller.error().is_some());
    assert!(controller.exiting_cards().is_empty());

    // Retrying once the store is back succeeds
    store.set_failing(false);
    let retry = controller.press(error.decision).unwrap().unwrap();
    let result = retry.dispatch(&coordinator).await;
    assert_eq!(controller.complete(&retry, result), Feedback::Recorded);
    assert!(controller.error().is_none());
    assert_eq!(store.like_count().await, 1);
}

#[tokio::test]
async fn test_integration_out_of_order_failure_rolls_back_only_its_profile() {
    let (store, coordinator) = setup();
    let mut controller = controller_for("viewer", &["a", "b", "c"]);

    let first = controller.press(Decision::Like).unwrap().unwrap();
    let second = controller.press(Decision::Pass).unwrap().unwrap();
    assert_eq!(current_id(&controller).as_deref(), Some("c"));

    // Second call succeeds, first one fails afterwards
    let result = second.dispatch(&coordinator).await;
    assert_eq!(controller.complete(&second, result), Feedback::Recorded);

    store.set_failing(true);
    let result = first.dispatch(&coordinator).await;
    assert!(matches!(controller.complete(&first, result), Feedback::RolledBack(_)));

    assert!(!controller.queue().is_decided(&"a".into()));
    assert!(controller.queue().is_decided(&"b".into()));
    assert_eq!(current_id(&controller).as_deref(), Some("a"));
}

#[tokio::test]
async fn test_integration_repeat_like_is_idempotent() {
    let (store, coordinator) = setup();

    let first = coordinator
        .record_decision(&"a".into(), &"b".into(), Decision::Like)
        .await
        .unwrap();
    let second = coordinator
        .record_decision(&"a".into(), &"b".into(), Decision::SuperLike)
        .await
        .unwrap();

    assert_eq!(first, DecisionOutcome::Liked { is_match: false });
    assert_eq!(second, DecisionOutcome::AlreadyLiked);
    assert_eq!(store.like_count().await, 1);
    assert_eq!(store.match_count().await, 0);
}

#[tokio::test]
async fn test_integration_already_liked_shows_notice() {
    let (_store, coordinator) = setup();
    coordinator
        .record_decision(&"viewer".into(), &"a".into(), Decision::Like)
        .await
        .unwrap();

    let mut controller = controller_for("viewer", &["a", "b"]);
    let ticket = controller.press(Decision::Like).unwrap().unwrap();
    let result = ticket.dispatch(&coordinator).await;

    assert_eq!(controller.complete(&ticket, result), Feedback::AlreadyLiked("a".into()));
    assert_eq!(controller.already_liked_notice(), Some(&ProfileId::from("a")));
    assert!(controller.celebration().is_none());
}

#[tokio::test]
async fn test_integration_match_is_symmetric_in_call_order() {
    for (first, second) in [("a", "b"), ("b", "a")] {
        let (store, coordinator) = setup();

        let one = coordinator
            .record_decision(&first.into(), &second.into(), Decision::Like)
            .await
            .unwrap();
        let two = coordinator
            .record_decision(&second.into(), &first.into(), Decision::Like)
            .await
            .unwrap();

        assert!(!one.is_match());
        assert!(two.is_match());

        let for_a = store.matches_for(&"a".into()).await.unwrap();
        let for_b = store.matches_for(&"b".into()).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a, for_b);
        assert_eq!(for_a[0].pair.profile_a().as_str(), "a");
    }
}

#[tokio::test(start_paused = true)]
async fn test_integration_concurrent_reciprocal_super_likes() {
    let (store, coordinator) = setup();
    let mut events = coordinator.notifier().subscribe();

    // Latency lines both calls up step by step
    store.set_latency(Duration::from_millis(10));

    let a: ProfileId = "a".into();
    let b: ProfileId = "b".into();
    let (left, right) = tokio::join!(
        coordinator.record_decision(&a, &b, Decision::SuperLike),
        coordinator.record_decision(&b, &a, Decision::SuperLike),
    );

    assert!(left.unwrap().is_match());
    assert!(right.unwrap().is_match());
    assert_eq!(store.like_count().await, 2);
    assert_eq!(store.match_count().await, 1);

    assert!(events.try_recv().is_ok());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_integration_slow_store_times_out_and_rolls_back() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = LikeMatchCoordinator::new(
        store.clone() as Arc<dyn LikeMatchStore>,
        MatchNotifier::default(),
        Duration::from_millis(500),
    );
    store.set_latency(Duration::from_secs(10));

    let mut controller = controller_for("viewer", &["a", "b"]);
    let ticket = controller.press(Decision::Pass).unwrap().unwrap();
    let result = ticket.dispatch(&coordinator).await;

    let err = result.as_ref().unwrap_err();
    assert!(matches!(err, CoordinatorError::Timeout(_)));
    assert!(err.is_retryable());

    assert!(matches!(controller.complete(&ticket, result), Feedback::RolledBack(_)));
    assert_eq!(current_id(&controller).as_deref(), Some("a"));
}

#[tokio::test]
async fn test_integration_result_after_unmount_is_dropped() {
    let (store, coordinator) = setup();
    let mut controller = controller_for("viewer", &["a", "b"]);

    let ticket = controller.press(Decision::Like).unwrap().unwrap();
    controller.unmount();

    store.set_failing(true);
    let result = ticket.dispatch(&coordinator).await;

    assert_eq!(controller.complete(&ticket, result), Feedback::Stale);
    assert_eq!(controller.screen(), Screen::Unmounted);
    assert!(controller.error().is_none());
}

#[tokio::test]
async fn test_integration_undo_then_redecide() {
    let (store, coordinator) = setup();
    let mut controller = controller_for("viewer", &["a", "b"]);

    let ticket = controller.press(Decision::Pass).unwrap().unwrap();
    let result = ticket.dispatch(&coordinator).await;
    assert_eq!(controller.complete(&ticket, result), Feedback::Recorded);

    assert_eq!(controller.undo().unwrap().as_str(), "a");
    assert_eq!(current_id(&controller).as_deref(), Some("a"));

    let ticket = controller.press(Decision::Like).unwrap().unwrap();
    let result = ticket.dispatch(&coordinator).await;
    assert_eq!(controller.complete(&ticket, result), Feedback::Recorded);

    // Undo is local; the persisted pass is not removed
    let decided = store.decided_targets(&"viewer".into()).await.unwrap();
    assert_eq!(decided, vec![ProfileId::from("a")]);
}

#[tokio::test]
async fn test_integration_exhaustion_and_reset() {
    let (_store, coordinator) = setup();
    let mut controller = controller_for("viewer", &["a", "b"]);

    for decision in [Decision::Like, Decision::Pass] {
        let ticket = controller.press(decision).unwrap().unwrap();
        let result = ticket.dispatch(&coordinator).await;
        controller.complete(&ticket, result);
    }

    assert_eq!(controller.screen(), Screen::Exhausted);
    assert!(controller.press(Decision::Like).unwrap().is_none());

    controller.reset(Some(vec![create_profile("c")]));
    assert_eq!(current_id(&controller).as_deref(), Some("c"));
    assert!(controller.queue().last_decision().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_integration_timeout_after_like_insert_matches_on_retry() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = LikeMatchCoordinator::new(
        store.clone() as Arc<dyn LikeMatchStore>,
        MatchNotifier::default(),
        Duration::from_millis(1000),
    );
    let mut events = coordinator.notifier().subscribe();
    let a: ProfileId = "a".into();
    let b: ProfileId = "b".into();

    coordinator.record_decision(&b, &a, Decision::Like).await.unwrap();

    // The like insert lands at 800ms, the reciprocal lookup would at 1200ms
    store.set_latency(Duration::from_millis(400));
    let result = coordinator.record_decision(&a, &b, Decision::Like).await;
    assert!(matches!(result, Err(CoordinatorError::Timeout(_))));
    assert_eq!(store.like_count().await, 2);
    assert_eq!(store.match_count().await, 0);

    store.set_latency(Duration::ZERO);
    let retry = coordinator.record_decision(&a, &b, Decision::Like).await.unwrap();
    assert_eq!(retry, DecisionOutcome::Liked { is_match: true });

    let other_side = coordinator.record_decision(&b, &a, Decision::Like).await.unwrap();
    assert_eq!(other_side, DecisionOutcome::AlreadyLiked);

    assert_eq!(store.match_count().await, 1);
    assert!(events.try_recv().is_ok());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_integration_failed_match_insert_is_completed_by_other_side() {
    let (store, coordinator) = setup();
    let mut events = coordinator.notifier().subscribe();
    let a: ProfileId = "a".into();
    let b: ProfileId = "b".into();

    coordinator.record_decision(&b, &a, Decision::SuperLike).await.unwrap();

    // find, insert, reciprocal find, then the match insert fails
    store.fail_call(4);
    let result = coordinator.record_decision(&a, &b, Decision::Like).await;
    assert!(matches!(result, Err(CoordinatorError::Transport(_))));
    assert_eq!(store.match_count().await, 0);

    let outcome = coordinator.record_decision(&b, &a, Decision::SuperLike).await.unwrap();
    assert_eq!(outcome, DecisionOutcome::Liked { is_match: true });
    assert_eq!(store.match_count().await, 1);
    assert_eq!(store.matches_for(&a).await.unwrap(), store.matches_for(&b).await.unwrap());
    assert!(events.try_recv().is_ok());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_integration_retry_after_partial_failure_celebrates() {
    let (store, coordinator) = setup();
    coordinator
        .record_decision(&"b".into(), &"a".into(), Decision::Like)
        .await
        .unwrap();

    let mut controller = controller_for("a", &["b", "c"]);
    let ticket = controller.press(Decision::Like).unwrap().unwrap();

    // Like is stored, the reciprocal lookup fails
    store.fail_call(3);
    let result = ticket.dispatch(&coordinator).await;
    assert!(matches!(controller.complete(&ticket, result), Feedback::RolledBack(_)));
    assert_eq!(current_id(&controller).as_deref(), Some("b"));

    let retry = controller.press(Decision::Like).unwrap().unwrap();
    let result = retry.dispatch(&coordinator).await;

    assert_eq!(controller.complete(&retry, result), Feedback::Matched("b".into()));
    assert_eq!(controller.celebration(), Some(&ProfileId::from("b")));
    assert_eq!(store.match_count().await, 1);
}

#[tokio::test]
async fn test_integration_failed_pass_does_not_undo_later_like() {
    let (store, coordinator) = setup();
    let mut controller = controller_for("viewer", &["a", "b"]);

    let pass = controller.press(Decision::Pass).unwrap().unwrap();
    controller.undo().unwrap();
    let like = controller.press(Decision::Like).unwrap().unwrap();

    store.fail_call(1);
    let result = pass.dispatch(&coordinator).await;
    assert!(matches!(controller.complete(&pass, result), Feedback::Failed(_)));
    assert!(controller.queue().is_decided(&"a".into()));

    let result = like.dispatch(&coordinator).await;
    assert_eq!(controller.complete(&like, result), Feedback::Recorded);

    assert!(controller.queue().liked().contains(&ProfileId::from("a")));
    assert_eq!(current_id(&controller).as_deref(), Some("b"));
    assert_eq!(store.like_count().await, 1);
}

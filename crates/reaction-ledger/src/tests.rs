use crate::{
    MemoryStore, ReactionBinding, ReactionFilter, ReactionLedger, ReactionRow, ReadDegraded,
    Rejection, RemoteStore, StoreError,
};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use storefront_core::{
    ActorId, IdentityColumn, ReactionState, ReactionSubject, Session, StorefrontConfig,
};
use tokio::sync::Notify;

fn shopper() -> Session {
    Session::authenticated("u1", "user")
}

fn ledger_over(store: &Arc<MemoryStore>) -> ReactionLedger<MemoryStore> {
    ReactionLedger::new(Arc::clone(store))
}

#[tokio::test]
async fn like_then_unlike_round_trips_count() {
    let store = Arc::new(MemoryStore::new());
    let binding = ReactionBinding::mount(ledger_over(&store), ReactionSubject::product("P1"), 4);
    binding.refresh(&shopper()).await;
    assert_eq!(binding.snapshot(), ReactionState::mounted(4));

    assert_eq!(binding.toggle(&shopper()).await, Ok(true));
    assert_eq!(
        binding.snapshot(),
        ReactionState { liked: true, count: 5, pending: false }
    );
    assert_eq!(store.count_for(&ReactionSubject::product("P1")), 1);

    assert_eq!(binding.toggle(&shopper()).await, Ok(false));
    assert_eq!(binding.snapshot(), ReactionState::mounted(4));
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn anonymous_toggle_is_rejected_without_touching_state() {
    let store = Arc::new(MemoryStore::new());
    let binding = ReactionBinding::mount(ledger_over(&store), ReactionSubject::brand("B1"), 7);

    for session in [Session::Anonymous, Session::Unresolved] {
        assert_eq!(
            binding.toggle(&session).await,
            Err(Rejection::NotAuthenticated)
        );
        assert_eq!(binding.snapshot(), ReactionState::mounted(7));
    }
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn blank_subject_id_is_invalid() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger_over(&store);
    let current = ReactionState::mounted(1);

    let result = ledger
        .toggle(&ReactionSubject::product("  "), &shopper(), current)
        .await;
    assert_eq!(result, Err(Rejection::InvalidSubject));
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn overlapping_toggle_on_same_binding_is_rejected() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_write_gate(Arc::clone(&gate)));
    let binding = ReactionBinding::mount(ledger_over(&store), ReactionSubject::product("P1"), 4);
    let session = shopper();

    let (first, (second, during)) = tokio::join!(binding.toggle(&session), async {
        let second = binding.toggle(&session).await;
        let during = binding.snapshot();
        gate.notify_one();
        (second, during)
    });

    assert_eq!(second, Err(Rejection::AlreadyPending));
    assert!(during.pending);
    assert!(!during.liked);
    assert_eq!(during.count, 4);

    assert_eq!(first, Ok(true));
    assert_eq!(
        binding.snapshot(),
        ReactionState { liked: true, count: 5, pending: false }
    );
    assert_eq!(store.all_rows().len(), 1);
}

#[tokio::test]
async fn two_views_of_one_subject_share_the_pending_latch() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_write_gate(Arc::clone(&gate)));
    let ledger = ledger_over(&store);
    let subject = ReactionSubject::product("P1");
    let left = ReactionBinding::mount(ledger.clone(), subject.clone(), 2);
    let right = ReactionBinding::mount(ledger.clone(), subject.clone(), 2);
    let session = shopper();

    let (a, (b, pending_during)) = tokio::join!(left.toggle(&session), async {
        let b = right.toggle(&session).await;
        let pending = ledger.is_pending(&subject, &ActorId::new("u1"));
        gate.notify_one();
        (b, pending)
    });

    assert_eq!(a, Ok(true));
    assert_eq!(b, Err(Rejection::AlreadyPending));
    assert!(pending_during);
    assert_eq!(right.snapshot(), ReactionState::mounted(2));
    assert!(!ledger.is_pending(&subject, &ActorId::new("u1")));
}

#[tokio::test]
async fn different_subjects_toggle_independently() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_write_gate(Arc::clone(&gate)));
    let ledger = ledger_over(&store);
    let product = ReactionBinding::mount(ledger.clone(), ReactionSubject::product("X1"), 0);
    let brand = ReactionBinding::mount(ledger.clone(), ReactionSubject::brand("X1"), 0);
    let session = shopper();

    let (p, b, ()) = tokio::join!(product.toggle(&session), brand.toggle(&session), async {
        gate.notify_waiters();
    });

    assert_eq!(p, Ok(true));
    assert_eq!(b, Ok(true));
    assert_eq!(store.all_rows().len(), 2);
}

#[tokio::test]
async fn failed_add_rolls_back() {
    let store = Arc::new(MemoryStore::new());
    store.fail_writes(true);
    let binding = ReactionBinding::mount(ledger_over(&store), ReactionSubject::brand("B1"), 3);

    let err = binding.toggle(&shopper()).await.unwrap_err();
    assert!(matches!(err, Rejection::ToggleFailed(StoreError::Transport(_))));
    assert_eq!(err.to_string(), "toggle-failed");
    assert_eq!(
        err.notice(&StorefrontConfig::default()).as_deref(),
        Some("Something went wrong, please try again.")
    );
    assert_eq!(binding.snapshot(), ReactionState::mounted(3));
    assert!(store.all_rows().is_empty());

    store.fail_writes(false);
    assert_eq!(binding.toggle(&shopper()).await, Ok(true));
}

#[tokio::test]
async fn failed_remove_rolls_back() {
    let store = Arc::new(MemoryStore::new());
    let subject = ReactionSubject::product("P9");
    let binding = ReactionBinding::mount(ledger_over(&store), subject.clone(), 10);
    binding.toggle(&shopper()).await.unwrap();
    let liked = binding.snapshot();

    store.fail_writes(true);
    assert!(matches!(
        binding.toggle(&shopper()).await,
        Err(Rejection::ToggleFailed(_))
    ));
    assert_eq!(binding.snapshot(), liked);
    assert_eq!(store.count_for(&subject), 1);
}

#[tokio::test]
async fn abandoned_toggle_restores_state_and_releases_latch() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_write_gate(Arc::clone(&gate)));
    let ledger = ledger_over(&store);
    let subject = ReactionSubject::product("P1");
    let binding = ReactionBinding::mount(ledger.clone(), subject.clone(), 4);
    let session = shopper();

    tokio::select! {
        biased;
        _ = binding.toggle(&session) => panic!("write gate was never opened"),
        _ = tokio::task::yield_now() => {}
    }

    assert_eq!(binding.snapshot(), ReactionState::mounted(4));
    assert!(!ledger.is_pending(&subject, &ActorId::new("u1")));
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn count_saturates_at_zero() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger_over(&store);
    let drifted = ReactionState { liked: true, count: 0, pending: false };

    let next = ledger
        .toggle(&ReactionSubject::product("P1"), &shopper(), drifted)
        .await
        .unwrap();
    assert_eq!(next, ReactionState::mounted(0));
}

#[tokio::test]
async fn ledger_refuses_state_already_pending() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger_over(&store);
    let in_flight = ReactionState { liked: false, count: 2, pending: true };

    let result = ledger
        .toggle(&ReactionSubject::brand("B1"), &shopper(), in_flight)
        .await;
    assert_eq!(result, Err(Rejection::AlreadyPending));
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn add_populates_only_the_subject_column() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger_over(&store);
    ledger
        .toggle(&ReactionSubject::brand("B1"), &shopper(), ReactionState::mounted(0))
        .await
        .unwrap();

    let rows = store.all_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].brand_id.as_deref(), Some("B1"));
    assert_eq!(rows[0].product_id, None);
    assert_eq!(rows[0].actor, ActorId::new("u1"));
}

#[tokio::test]
async fn load_is_scoped_by_kind_and_actor() {
    let store = Arc::new(MemoryStore::new());
    let u1 = ActorId::new("u1");
    store
        .seed(ReactionRow::for_subject(&ReactionSubject::product("X1"), &u1, Utc::now()))
        .unwrap();
    let ledger = ledger_over(&store);

    let product = ledger.load(&ReactionSubject::product("X1"), &shopper(), 1).await;
    let brand = ledger.load(&ReactionSubject::brand("X1"), &shopper(), 1).await;
    let other = ledger
        .load(&ReactionSubject::product("X1"), &Session::authenticated("u2", "user"), 1)
        .await;
    let anonymous = ledger.load(&ReactionSubject::product("X1"), &Session::Anonymous, 1).await;

    assert!(product.liked);
    assert!(!brand.liked);
    assert!(!other.liked);
    assert!(!anonymous.liked);
    assert_eq!(product.count, 1);
}

#[tokio::test]
async fn read_failure_degrades_to_not_liked() {
    let store = Arc::new(MemoryStore::new());
    let subject = ReactionSubject::product("P1");
    store
        .seed(ReactionRow::for_subject(&subject, &ActorId::new("u1"), Utc::now()))
        .unwrap();
    store.fail_reads(true);
    let ledger = ledger_over(&store);

    let degraded = ledger.try_load(&subject, &ActorId::new("u1")).await;
    assert!(matches!(degraded, Err(ReadDegraded(StoreError::Transport(_)))));

    let state = ledger.load(&subject, &shopper(), 5).await;
    assert_eq!(state, ReactionState::mounted(5));
}

#[tokio::test]
async fn refresh_follows_session_resolution() {
    let store = Arc::new(MemoryStore::new());
    let subject = ReactionSubject::brand("B2");
    store
        .seed(ReactionRow::for_subject(&subject, &ActorId::new("u1"), Utc::now()))
        .unwrap();
    let binding = ReactionBinding::mount(ledger_over(&store), subject, 9);

    binding.refresh(&Session::Unresolved).await;
    assert!(!binding.snapshot().liked);

    binding.refresh(&shopper()).await;
    assert!(binding.snapshot().liked);

    binding.refresh(&Session::Anonymous).await;
    assert!(!binding.snapshot().liked);
    assert_eq!(binding.snapshot().count, 9);
}

#[tokio::test]
async fn refresh_landing_mid_toggle_is_discarded() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_write_gate(Arc::clone(&gate)));
    let subject = ReactionSubject::product("P1");
    let binding = ReactionBinding::mount(ledger_over(&store), subject.clone(), 4);

    let outer_session = shopper();
    let (toggled, ()) = tokio::join!(binding.toggle(&outer_session), async {
        binding.refresh(&shopper()).await;
        let during = binding.snapshot();
        assert!(during.pending);
        assert_eq!(during.count, 4);
        gate.notify_one();
    });

    assert_eq!(toggled, Ok(true));
    assert_eq!(
        binding.snapshot(),
        ReactionState { liked: true, count: 5, pending: false }
    );
    assert_eq!(store.count_for(&subject), 1);
}

#[tokio::test]
async fn toggle_completing_during_refresh_wins() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_read_gate(Arc::clone(&gate)));
    let subject = ReactionSubject::product("P1");
    let binding = ReactionBinding::mount(ledger_over(&store), subject.clone(), 4);

    let outer_session = shopper();
    let ((), toggled) = tokio::join!(binding.refresh(&outer_session), async {
        let toggled = binding.toggle(&shopper()).await;
        gate.notify_one();
        toggled
    });

    assert_eq!(toggled, Ok(true));
    assert_eq!(
        binding.snapshot(),
        ReactionState { liked: true, count: 5, pending: false }
    );
    assert_eq!(store.count_for(&subject), 1);

    assert_eq!(binding.toggle(&shopper()).await, Ok(false));
    assert_eq!(binding.snapshot(), ReactionState::mounted(4));
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn older_refresh_does_not_overwrite_newer_one() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(MemoryStore::with_read_gate(Arc::clone(&gate)));
    let subject = ReactionSubject::brand("B3");
    store
        .seed(ReactionRow::for_subject(&subject, &ActorId::new("u1"), Utc::now()))
        .unwrap();
    let binding = ReactionBinding::mount(ledger_over(&store), subject, 2);

    let outer_session = shopper();
    tokio::join!(binding.refresh(&outer_session), async {
        binding.refresh(&Session::Anonymous).await;
        assert!(!binding.snapshot().liked);
        gate.notify_one();
    });

    assert_eq!(binding.snapshot(), ReactionState::mounted(2));
}

#[tokio::test]
async fn alternating_success_sequences_track_parity() {
    let mut rng = rand::thread_rng();

    for _ in 0..50 {
        let start: u64 = rng.gen_range(0..100);
        let n: usize = rng.gen_range(0..16);
        let store = Arc::new(MemoryStore::new());
        let binding =
            ReactionBinding::mount(ledger_over(&store), ReactionSubject::product("P1"), start);

        for _ in 0..n {
            binding.toggle(&shopper()).await.unwrap();
        }

        let state = binding.snapshot();
        assert_eq!(state.liked, n % 2 == 1);
        let expected = if n % 2 == 1 { start + 1 } else { start };
        assert_eq!(state.count, expected);
        assert!(!state.pending);
    }
}

#[tokio::test]
async fn random_failures_never_commit() {
    let mut rng = rand::thread_rng();
    let store = Arc::new(MemoryStore::new());
    let binding = ReactionBinding::mount(ledger_over(&store), ReactionSubject::brand("B1"), 0);
    let mut model = ReactionState::mounted(0);

    for _ in 0..200 {
        let fail = rng.gen_bool(0.3);
        store.fail_writes(fail);
        let before = binding.snapshot();
        match binding.toggle(&shopper()).await {
            Ok(liked) => {
                assert!(!fail);
                model = if model.liked { model.after_remove() } else { model.after_add() };
                assert_eq!(liked, model.liked);
            }
            Err(Rejection::ToggleFailed(_)) => {
                assert!(fail);
                assert_eq!(binding.snapshot(), before);
            }
            Err(other) => panic!("unexpected rejection: {other}"),
        }
        assert_eq!(binding.snapshot(), model);
    }
}

#[test]
fn rejection_reasons_are_stable_strings() {
    assert_eq!(Rejection::NotAuthenticated.to_string(), "not-authenticated");
    assert_eq!(Rejection::InvalidSubject.to_string(), "invalid-subject");
    assert_eq!(Rejection::AlreadyPending.to_string(), "already-pending");
    assert_eq!(Rejection::AlreadyPending.notice(&StorefrontConfig::default()), None);
}

#[test]
fn row_with_both_columns_is_malformed() {
    let mut row = ReactionRow::for_subject(
        &ReactionSubject::product("P1"),
        &ActorId::new("u1"),
        Utc::now(),
    );
    row.validate().unwrap();
    row.brand_id = Some("B1".into());
    assert!(matches!(row.validate(), Err(StoreError::Malformed(_))));
}

#[tokio::test]
async fn delete_only_matches_its_own_column() {
    let store = MemoryStore::new();
    let u1 = ActorId::new("u1");
    store
        .seed(ReactionRow::for_subject(&ReactionSubject::product("X1"), &u1, Utc::now()))
        .unwrap();
    store
        .seed(ReactionRow::for_subject(&ReactionSubject::brand("X1"), &u1, Utc::now()))
        .unwrap();

    let filter = ReactionFilter::new(&ReactionSubject::brand("X1"), &u1);
    assert_eq!(filter.column, IdentityColumn::BrandId);
    assert_eq!(store.delete(&filter).await, Ok(1));
    assert_eq!(store.all_rows()[0].product_id.as_deref(), Some("X1"));
}

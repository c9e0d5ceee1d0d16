// tests/concurrent_claims.rs
//
// Many display surfaces claiming the same notification at once: exactly one
// wins, the rest see AlreadyClaimed.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use grub_guardians::location::LocationDirectory;
use grub_guardians::store::MemoryStore;
use grub_guardians::{BoardError, FoodBoard, LifecycleError, NewNotification};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_concurrent_claim_succeeds() {
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 20, 15, 0).unwrap();
    let board = Arc::new(FoodBoard::new(
        Arc::new(MemoryStore::new()),
        LocationDirectory::campus_seed(),
    ));
    let n = board
        .post(NewNotification::new("Gulab Jamun").at("hJ"), now)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let board = board.clone();
        let id = n.id().clone();
        handles.push(tokio::spawn(async move { board.claim(&id, now).await }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(c) => {
                assert!(c.is_claimed());
                wins += 1;
            }
            Err(BoardError::Lifecycle(LifecycleError::AlreadyClaimed(_))) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 31);
    assert_eq!(board.claimed_on(now.date_naive()).await.unwrap(), 1);
}

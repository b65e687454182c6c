//! History recorded into a Fjall store survives closing and reopening it.

use std::sync::Arc;

use trail_history::{AuditOptions, FixedActor, History};
use trail_integration_tests::{Timeline, t};
use trail_store::{FjallStore, SnapshotStore};
use trail_types::{Event, attributes};

#[test]
fn test_trail_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let (post, before) = {
        let store = Arc::new(FjallStore::open(dir.path()).unwrap());
        let tl = Timeline::with_actor(store, Arc::new(FixedActor::new("alice")));
        let mut post = tl.create("Post", "1", attributes! { "title" => "a" }, 0);
        tl.update(&mut post, attributes! { "title" => "b" }, 10);
        tl.update(&mut post, attributes! { "title" => "c" }, 20);
        let before = tl
            .history
            .audit_trail(&post, &AuditOptions::default())
            .unwrap();
        (post, before)
    };

    let store = Arc::new(FjallStore::open(dir.path()).unwrap());
    let history = History::new(store.clone());
    let after = history
        .audit_trail(&post, &AuditOptions::default())
        .unwrap();
    assert_eq!(after, before);
    assert_eq!(after.len(), 3);
    assert!(after.iter().all(|e| e.changed_by.as_deref() == Some("alice")));

    let state = history.state_at(&post, t(15)).unwrap();
    assert_eq!(state.attributes, attributes! { "title" => "a" });
}

#[test]
fn test_ids_keep_increasing_after_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let (mut post, last_id) = {
        let store = Arc::new(FjallStore::open(dir.path()).unwrap());
        let tl = Timeline::new(store.clone());
        let mut post = tl.create("Post", "1", attributes! { "n" => 1 }, 0);
        tl.update(&mut post, attributes! { "n" => 2 }, 10);
        let last_id = store.list_for(&post.owner).unwrap().last().unwrap().id;
        (post, last_id)
    };

    let store = Arc::new(FjallStore::open(dir.path()).unwrap());
    let tl = Timeline::new(store.clone());
    tl.update(&mut post, attributes! { "n" => 3 }, 20);
    tl.destroy(&post, 30);

    let versions = store.list_for(&post.owner).unwrap();
    let events: Vec<Event> = versions.iter().map(|v| v.event).collect();
    assert_eq!(
        events,
        vec![Event::Create, Event::Update, Event::Update, Event::Destroy]
    );
    assert!(versions[2].id > last_id);
    assert!(versions.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn test_owners_listed_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(FjallStore::open(dir.path()).unwrap());
        let tl = Timeline::new(store);
        tl.create("Post", "2", attributes! { "n" => 1 }, 0);
        tl.create("Author", "9", attributes! { "n" => 1 }, 1);
    }

    let store = FjallStore::open(dir.path()).unwrap();
    let owners: Vec<String> = store
        .owners()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(owners, vec!["Author#9", "Post#2"]);
}

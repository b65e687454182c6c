//! Full record → reconstruct scenarios, run against every store backend.

use std::sync::Arc;

use trail_history::{AuditOptions, Change, FixedActor, HistoryError, StateSource};
use trail_integration_tests::{Timeline, all_stores, t};
use trail_types::{Event, OwnerRef, Value, attributes};

fn change(attribute: &str, before: impl Into<Value>, after: impl Into<Value>) -> Change {
    Change {
        attribute: attribute.to_string(),
        before: Some(before.into()),
        after: Some(after.into()),
    }
}

#[test]
fn test_lifecycle_trail_on_every_store() {
    for (name, store) in all_stores() {
        let tl = Timeline::new(store);
        let mut post = tl.create("Post", "1", attributes! { "name" => "A", "status" => "new" }, 0);
        tl.update(&mut post, attributes! { "name" => "A", "status" => "active" }, 10);
        tl.update(&mut post, attributes! { "name" => "B", "status" => "active" }, 20);

        let trail = tl
            .history
            .audit_trail(&post, &AuditOptions::ignoring_nothing())
            .unwrap();
        let summary: Vec<(Event, Vec<Change>)> =
            trail.into_iter().map(|e| (e.event, e.changes)).collect();
        assert_eq!(
            summary,
            vec![
                (Event::Update, vec![change("name", "A", "B")]),
                (Event::Update, vec![change("status", "new", "active")]),
                (
                    Event::Create,
                    vec![
                        Change {
                            attribute: "name".into(),
                            before: None,
                            after: Some("A".into()),
                        },
                        Change {
                            attribute: "status".into(),
                            before: None,
                            after: Some("new".into()),
                        },
                    ]
                ),
            ],
            "store: {name}"
        );
    }
}

#[test]
fn test_destroy_is_newest_entry_on_every_store() {
    for (name, store) in all_stores() {
        let tl = Timeline::with_actor(store, Arc::new(FixedActor::new("alice")));
        let mut post = tl.create("Post", "1", attributes! { "title" => "draft" }, 0);
        tl.update(&mut post, attributes! { "title" => "final" }, 10);
        tl.destroy(&post, 20);

        let trail = tl
            .history
            .audit_trail(&post, &AuditOptions::default())
            .unwrap();
        let events: Vec<Event> = trail.iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![Event::Destroy, Event::Update, Event::Create],
            "store: {name}"
        );

        // Destroy snapshot equals the live state: nothing changed across it.
        assert!(trail[0].changes.is_empty(), "store: {name}");
        assert_eq!(trail[0].changed_at, t(20));
        assert_eq!(trail[0].changed_by.as_deref(), Some("alice"));
        assert_eq!(trail[1].changes, vec![change("title", "draft", "final")]);
    }
}

#[test]
fn test_state_at_walks_history_on_every_store() {
    for (name, store) in all_stores() {
        let tl = Timeline::new(store);
        let mut post = tl.create("Post", "1", attributes! { "v" => 1 }, 0);
        tl.update(&mut post, attributes! { "v" => 2 }, 10);
        tl.update(&mut post, attributes! { "v" => 3 }, 20);

        // Before anything existed.
        let err = tl.history.state_at(&post, t(-5)).unwrap_err();
        assert!(
            matches!(err, HistoryError::NotFoundAtTimestamp { .. }),
            "store: {name}"
        );

        // Latest version strictly before t(15) is the update at t(10), whose
        // snapshot holds the state it replaced.
        let state = tl.history.state_at(&post, t(15)).unwrap();
        assert_eq!(state.attributes, attributes! { "v" => 1 }, "store: {name}");
        assert!(matches!(state.source, StateSource::Version { created_at, .. } if created_at == t(10)));

        let state = tl.history.state_at(&post, t(25)).unwrap();
        assert_eq!(state.source, StateSource::Live);
        assert_eq!(state.attributes, attributes! { "v" => 3 });
    }
}

#[test]
fn test_entities_do_not_share_history() {
    for (name, store) in all_stores() {
        let tl = Timeline::new(store.clone());
        let mut post = tl.create("Post", "1", attributes! { "n" => 0 }, 0);
        let mut other = tl.create("Post", "10", attributes! { "n" => 100 }, 1);
        let mut comment = tl.create("Comment", "1", attributes! { "n" => 0 }, 2);

        for i in 1..=3i64 {
            tl.update(&mut post, attributes! { "n" => i }, 10 * i);
            tl.update(&mut other, attributes! { "n" => 100 + i }, 10 * i + 1);
        }
        tl.update(&mut comment, attributes! { "n" => 7 }, 50);

        assert_eq!(store.list_for(&post.owner).unwrap().len(), 4, "store: {name}");
        assert_eq!(store.list_for(&other.owner).unwrap().len(), 4);
        assert_eq!(store.list_for(&comment.owner).unwrap().len(), 2);

        let trail = tl
            .history
            .audit_trail(&comment, &AuditOptions::default())
            .unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].changes, vec![change("n", 0, 7)]);

        let owners = store.owners().unwrap();
        assert_eq!(
            owners,
            vec![
                OwnerRef::new("Comment", "1"),
                OwnerRef::new("Post", "1"),
                OwnerRef::new("Post", "10"),
            ]
        );
    }
}

#[test]
fn test_ignored_attribute_never_reported() {
    for (name, store) in all_stores() {
        let tl = Timeline::new(store);
        let mut post = tl.create(
            "Post",
            "1",
            attributes! { "body" => "x", "updated_at" => t(0) },
            0,
        );
        tl.update(&mut post, attributes! { "body" => "x", "updated_at" => t(10) }, 10);
        tl.update(&mut post, attributes! { "body" => "y", "updated_at" => t(20) }, 20);

        let trail = tl
            .history
            .audit_trail(&post, &AuditOptions::default())
            .unwrap();
        assert_eq!(trail.len(), 3, "store: {name}");
        for entry in &trail {
            assert!(entry.changes.iter().all(|c| c.attribute != "updated_at"));
        }
        assert_eq!(trail[0].changes, vec![change("body", "x", "y")]);
        assert!(trail[1].changes.is_empty());
    }
}

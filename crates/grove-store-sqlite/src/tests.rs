//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use grove_core::{
  Classify, Failure,
  change::{ChangeKind, ChangeQuery},
  group::Inclusion,
  identity::Identity,
  path::{Path, PathQuery},
  post::{Mutation, OccurrenceOp, PostWrite, WriteMode},
  store::{Direction, OccurrenceFilter, PostQuery, PostStore},
  uid::Uid,
};
use serde_json::json;
use tokio::task::JoinSet;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn path(s: &str) -> Path { Path::parse(s).unwrap() }

fn uid(s: &str) -> Uid { Uid::parse(s).unwrap() }

fn user(id: i64) -> Identity { Identity { id, god: false, realm: None } }

fn god(realm: &str) -> Identity {
  Identity { id: 999, god: true, realm: Some(realm.into()) }
}

fn doc(document: serde_json::Value) -> PostWrite {
  PostWrite { document: Some(document), ..PostWrite::default() }
}

fn failure(err: &Error) -> Failure { err.failure() }

// ─── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn declare_is_idempotent() {
  let s = store().await;
  let a = s.declare_location(path("a.b")).await.unwrap();
  let b = s.declare_location(path("a.b")).await.unwrap();
  assert_eq!(a.id, b.id);
  assert_eq!(s.locations(PathQuery::everything()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_declares_yield_one_row() {
  let s = store().await;
  let mut tasks = JoinSet::new();
  for _ in 0..16 {
    let s = s.clone();
    tasks.spawn(async move { s.declare_location(path("x.y.z")).await });
  }
  let mut ids = Vec::new();
  while let Some(joined) = tasks.join_next().await {
    ids.push(joined.unwrap().unwrap().id);
  }
  ids.dedup();
  assert_eq!(ids.len(), 1);

  let rows = s
    .locations(PathQuery::parse("x.y.z").unwrap())
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn wildcard_returns_node_and_descendants_only() {
  let s = store().await;
  for p in ["x", "x.a", "x.a.b", "xy", "y.x", "w.x"] {
    s.declare_location(path(p)).await.unwrap();
  }
  let found: Vec<String> = s
    .locations(PathQuery::parse("x.*").unwrap())
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.path.to_string())
    .collect();
  assert_eq!(found, ["x", "x.a", "x.a.b"]);
}

#[tokio::test]
async fn alternation_and_ancestor_queries() {
  let s = store().await;
  for p in ["a", "a.b", "a.b.c", "a.c.c", "a.d.c"] {
    s.declare_location(path(p)).await.unwrap();
  }
  let alt: Vec<String> = s
    .locations(PathQuery::parse("a.b|c.c").unwrap())
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.path.to_string())
    .collect();
  assert_eq!(alt, ["a.b.c", "a.c.c"]);

  let covering: Vec<String> = s
    .locations(PathQuery::parse("^a.b.c").unwrap())
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.path.to_string())
    .collect();
  assert_eq!(covering, ["a", "a.b", "a.b.c"]);
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_until_declared() {
  let s = store().await;
  assert_eq!(s.is_included(1, path("a.b")).await.unwrap(), Inclusion::Unknown);
  s.declare_location(path("a.b")).await.unwrap();
  assert_eq!(s.is_included(1, path("a.b")).await.unwrap(), Inclusion::Denied);
}

#[tokio::test]
async fn grants_reach_existing_and_future_descendants() {
  let s = store().await;
  s.declare_location(path("a.b.old")).await.unwrap();
  s.allow_subtree(7, path("a.b")).await.unwrap();

  assert_eq!(s.is_included(7, path("a.b")).await.unwrap(), Inclusion::Granted);
  assert_eq!(s.is_included(7, path("a.b.old")).await.unwrap(), Inclusion::Granted);

  s.declare_location(path("a.b.c.d")).await.unwrap();
  assert_eq!(s.is_included(7, path("a.b.c.d")).await.unwrap(), Inclusion::Granted);

  s.declare_location(path("a.x")).await.unwrap();
  assert_eq!(s.is_included(7, path("a.x")).await.unwrap(), Inclusion::Denied);
}

#[tokio::test]
async fn deny_undoes_allow() {
  let s = store().await;
  s.declare_location(path("a.b.c")).await.unwrap();
  s.allow_subtree(3, path("a.b")).await.unwrap();
  assert_eq!(s.allow_subtree(3, path("a.b")).await.unwrap(), 0);

  s.deny_subtree(3, path("a.b")).await.unwrap();
  for p in ["a.b", "a.b.c"] {
    assert_eq!(s.is_included(3, path(p)).await.unwrap(), Inclusion::Denied);
  }
  // No grant left to inherit.
  s.declare_location(path("a.b.new")).await.unwrap();
  assert_eq!(s.is_included(3, path("a.b.new")).await.unwrap(), Inclusion::Denied);
}

#[tokio::test]
async fn memberships_are_idempotent() {
  let s = store().await;
  s.declare_membership(1, 2).await.unwrap();
  s.declare_membership(1, 2).await.unwrap();
  assert!(s.remove_membership(1, 2).await.unwrap());
  assert!(!s.remove_membership(1, 2).await.unwrap());
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get() {
  let s = store().await;
  let t = s
    .upsert(uid("post:a.b"), doc(json!({"text": "hi"})), user(1))
    .await
    .unwrap();
  assert!(t.created());
  assert_eq!(t.kind(), Some(ChangeKind::Create));
  assert_eq!(t.after.version, 1);
  assert_eq!(t.after.realm, "a");
  assert_eq!(t.after.created_by, 1);

  let got = s.get_post(t.after.uid(), None).await.unwrap().unwrap();
  assert_eq!(got, t.after);
}

#[tokio::test]
async fn create_with_version_is_forbidden() {
  let s = store().await;
  let write = PostWrite { version: Some(1), ..doc(json!({})) };
  let err = s.upsert(uid("post:a"), write, user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Forbidden);
}

#[tokio::test]
async fn update_only_requires_existing() {
  let s = store().await;
  let write = PostWrite { mode: WriteMode::UpdateOnly, ..doc(json!({})) };
  let err = s.upsert(uid("post:a"), write, user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::NotFound);
}

#[tokio::test]
async fn create_only_refuses_an_existing_target() {
  let s = store().await;
  let write = PostWrite { external_id: Some("e1".into()), ..doc(json!({})) };
  s.upsert(uid("post:a"), write, user(1)).await.unwrap();

  let write = PostWrite {
    external_id: Some("e1".into()),
    mode: WriteMode::CreateOnly,
    ..doc(json!({"v": 2}))
  };
  let err = s.upsert(uid("post:a"), write, user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Conflict);

  let write = PostWrite { mode: WriteMode::CreateOnly, ..doc(json!({})) };
  assert!(s.upsert(uid("post:a"), write, user(1)).await.unwrap().created());
}

#[tokio::test]
async fn every_accepted_write_bumps_version_by_one() {
  let s = store().await;
  let created = s.upsert(uid("post:a.b"), doc(json!({"n": 0})), user(1)).await.unwrap();
  let target = created.after.uid();

  let mut last = created.after.version;
  for n in 1..4 {
    let t = s.upsert(target.clone(), doc(json!({"n": n})), user(1)).await.unwrap();
    assert_eq!(t.after.version, last + 1);
    last = t.after.version;
  }

  let t = s
    .mutate(target.clone(), Mutation::AddTags(vec!["x".into()]), user(1))
    .await
    .unwrap();
  assert_eq!(t.after.version, last + 1);
}

#[tokio::test]
async fn stale_version_conflicts_without_merge() {
  let s = store().await;
  let t = s.upsert(uid("post:a"), doc(json!({"v": 1})), user(1)).await.unwrap();
  s.upsert(t.after.uid(), doc(json!({"v": 2})), user(1)).await.unwrap();

  let stale = PostWrite { version: Some(1), ..doc(json!({"v": 3})) };
  let err = s.upsert(t.after.uid(), stale, user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Conflict);

  let current = s.get_post(t.after.uid(), None).await.unwrap().unwrap();
  assert_eq!(current.document, json!({"v": 2}));
}

#[tokio::test]
async fn merges_on_a_stale_base_are_absorbed() {
  let s = store().await;
  let t = s.upsert(uid("post:a.b"), doc(json!({"text": "ding"})), user(1)).await.unwrap();
  assert_eq!(t.after.version, 1);

  let merge = |patch| PostWrite {
    document: Some(patch),
    merge: true,
    version: Some(1),
    ..PostWrite::default()
  };
  let a = s.upsert(t.after.uid(), merge(json!({"text2": "dong"})), user(1)).await.unwrap();
  assert_eq!(a.after.version, 2);
  let b = s.upsert(t.after.uid(), merge(json!({"text3": "bong"})), user(1)).await.unwrap();
  assert_eq!(b.after.version, 3);
  assert_eq!(
    b.after.document,
    json!({"text": "ding", "text2": "dong", "text3": "bong"})
  );
}

#[tokio::test]
async fn noop_merge_keeps_version() {
  let s = store().await;
  let t = s.upsert(uid("post:a"), doc(json!({"a": {"b": 1}})), user(1)).await.unwrap();
  let again = PostWrite { merge: true, ..doc(json!({"a": {"b": 1}})) };
  let n = s.upsert(t.after.uid(), again, user(1)).await.unwrap();
  assert_eq!(n.after.version, 1);
  assert!(n.change.is_none());
  assert_eq!(n.after.document, json!({"a": {"b": 1}}));
}

#[tokio::test]
async fn strangers_cannot_overwrite() {
  let s = store().await;
  let t = s.upsert(uid("post:a"), doc(json!({"owner": "y"})), user(2)).await.unwrap();

  let err = s.upsert(t.after.uid(), doc(json!({"owner": "x"})), user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Forbidden);
  let current = s.get_post(t.after.uid(), None).await.unwrap().unwrap();
  assert_eq!(current.document, json!({"owner": "y"}));

  let by_god = s.upsert(t.after.uid(), doc(json!({"owner": "g"})), god("a")).await.unwrap();
  assert_eq!(by_god.after.document, json!({"owner": "g"}));
  assert_eq!(by_god.after.created_by, 2);

  let err = s.upsert(t.after.uid(), doc(json!({})), god("other")).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Forbidden);
}

#[tokio::test]
async fn soft_delete_and_undelete() {
  let s = store().await;
  let t = s.upsert(uid("post:a.b"), doc(json!({})), user(1)).await.unwrap();
  let target = t.after.uid();

  let del = s.mutate(target.clone(), Mutation::Delete, user(1)).await.unwrap();
  assert_eq!(del.kind(), Some(ChangeKind::Delete));
  assert!(s.get_post(target.clone(), Some(user(1))).await.unwrap().is_none());
  assert!(s.get_post(target.clone(), Some(god("a"))).await.unwrap().is_none());

  let err = s.mutate(target.clone(), Mutation::Undelete, user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Forbidden);
  assert!(s.get_post(target.clone(), None).await.unwrap().is_none());

  // Deleted posts are absent to their owner.
  let err = s.upsert(target.clone(), doc(json!({"x": 1})), user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::NotFound);

  let back = s.mutate(target.clone(), Mutation::Undelete, god("a")).await.unwrap();
  assert_eq!(back.kind(), Some(ChangeKind::Create));
  assert!(s.get_post(target, None).await.unwrap().is_some());
}

#[tokio::test]
async fn external_id_upserts() {
  let s = store().await;
  let with = |ext: &str, n: i64| PostWrite {
    external_id: Some(ext.into()),
    ..doc(json!({"n": n}))
  };

  let first = s.upsert(uid("post:a.b"), with("e1", 1), user(1)).await.unwrap();
  let second = s.upsert(uid("post:a.b"), with("e1", 2), user(1)).await.unwrap();
  assert_eq!(first.after.id, second.after.id);
  assert!(!second.created());
  assert_eq!(second.after.document, json!({"n": 2}));

  let err = s.upsert(uid("post:a.c"), with("e1", 3), user(1)).await.unwrap_err();
  assert_eq!(failure(&err), Failure::Conflict);

  let other = s.upsert(uid("post:a.b"), with("e2", 4), user(1)).await.unwrap();
  assert_ne!(other.after.id, first.after.id);

  let mut q = PostQuery::new(Uid::parse_scope("post:a.b").unwrap());
  q.external_id = Some("e1".into());
  assert_eq!(s.count_posts(q, None).await.unwrap(), 1);
}

#[tokio::test]
async fn paths_stay_in_realm_and_canonical_stays() {
  let s = store().await;
  let t = s.upsert(uid("post:a.b"), doc(json!({})), user(1)).await.unwrap();
  let target = t.after.uid();

  let attached = s
    .mutate(target.clone(), Mutation::AttachPath(path("a.c")), user(1))
    .await
    .unwrap();
  assert_eq!(attached.after.paths, [path("a.b"), path("a.c")]);

  let again = s
    .mutate(target.clone(), Mutation::AttachPath(path("a.c")), user(1))
    .await
    .unwrap();
  assert!(again.change.is_none());

  let err = s
    .mutate(target.clone(), Mutation::AttachPath(path("z.c")), user(1))
    .await
    .unwrap_err();
  assert_eq!(failure(&err), Failure::Forbidden);

  let err = s
    .mutate(target.clone(), Mutation::DetachPath(path("a.b")), user(1))
    .await
    .unwrap_err();
  assert_eq!(failure(&err), Failure::Forbidden);

  // Reachable through the secondary path too.
  let via_secondary = Uid::new("post", &path("a.c"), Some(t.after.id));
  assert!(s.get_post(via_secondary, None).await.unwrap().is_some());

  let detached = s
    .mutate(target, Mutation::DetachPath(path("a.c")), user(1))
    .await
    .unwrap();
  assert_eq!(detached.after.paths, [path("a.b")]);
}

#[tokio::test]
async fn tags_are_normalised_sets() {
  let s = store().await;
  let t = s.upsert(uid("post:a"), doc(json!({})), user(1)).await.unwrap();
  let target = t.after.uid();

  let t = s
    .mutate(target.clone(), Mutation::AddTags(vec!["Red".into(), "b-lue".into()]), user(1))
    .await
    .unwrap();
  assert_eq!(t.after.tags, ["blue", "red"]);

  let noop = s
    .mutate(target.clone(), Mutation::AddTags(vec!["RED".into()]), user(1))
    .await
    .unwrap();
  assert!(noop.change.is_none());

  let noop = s
    .mutate(target.clone(), Mutation::RemoveTags(vec!["green".into()]), user(1))
    .await
    .unwrap();
  assert!(noop.change.is_none());

  let mut q = PostQuery::new(Uid::parse_scope("post:a.*").unwrap());
  q.tags = vec!["red".into(), "blue".into()];
  assert_eq!(s.count_posts(q.clone(), None).await.unwrap(), 1);
  q.tags.push("green".into());
  assert_eq!(s.count_posts(q, None).await.unwrap(), 0);
}

#[tokio::test]
async fn occurrences_append_and_filter() {
  let s = store().await;
  let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();
  let t = s.upsert(uid("post:a"), doc(json!({})), user(1)).await.unwrap();
  let target = t.after.uid();

  let t = s
    .mutate(
      target.clone(),
      Mutation::Occurrences {
        label: "due".into(),
        op:    OccurrenceOp::Append(vec![at(200), at(100)]),
      },
      user(1),
    )
    .await
    .unwrap();
  assert_eq!(t.after.occurrences["due"], [at(100), at(200)]);

  let mut q = PostQuery::new(Uid::parse_scope("*:*").unwrap());
  q.occurrence = Some(OccurrenceFilter {
    label: "due".into(),
    from:  Some(at(150)),
    to:    None,
  });
  assert_eq!(s.count_posts(q.clone(), None).await.unwrap(), 1);
  q.occurrence = Some(OccurrenceFilter {
    label: "due".into(),
    from:  Some(at(300)),
    to:    None,
  });
  assert_eq!(s.count_posts(q, None).await.unwrap(), 0);

  let cleared = s
    .mutate(
      target,
      Mutation::Occurrences { label: "due".into(), op: OccurrenceOp::Remove(vec![]) },
      user(1),
    )
    .await
    .unwrap();
  assert!(cleared.after.occurrences.is_empty());
}

#[tokio::test]
async fn touch_moves_updated_at_only() {
  let s = store().await;
  let t = s.upsert(uid("post:a"), doc(json!({})), user(1)).await.unwrap();
  let touched = s.mutate(t.after.uid(), Mutation::Touch, user(1)).await.unwrap();
  assert_eq!(touched.after.version, 1);
  assert!(touched.change.is_none());
  assert!(touched.after.updated_at >= t.after.updated_at);
}

#[tokio::test]
async fn queries_page_and_filter() {
  let s = store().await;
  for i in 0..5 {
    s.upsert(uid("post:a.b"), doc(json!({"i": i})), user(1)).await.unwrap();
  }
  s.upsert(uid("post.comment:a.b"), doc(json!({})), user(2)).await.unwrap();
  s.upsert(uid("post:a.x"), doc(json!({})), user(1)).await.unwrap();

  let mut q = PostQuery::new(Uid::parse_scope("post:a.b").unwrap());
  q.limit = 2;
  let page = s.query_posts(q.clone(), None).await.unwrap();
  assert_eq!(page.items.len(), 2);
  assert!(!page.last_page);
  assert!(page.items[0].id > page.items[1].id);

  q.offset = 4;
  let page = s.query_posts(q.clone(), None).await.unwrap();
  assert_eq!(page.items.len(), 1);
  assert!(page.last_page);

  q.offset = usize::MAX;
  let page = s.query_posts(q.clone(), None).await.unwrap();
  assert!(page.items.is_empty());
  assert!(page.last_page);
  assert_eq!(page.offset, usize::MAX);

  q.offset = 0;
  q.limit = 10;
  q.direction = Direction::Asc;
  let page = s.query_posts(q, None).await.unwrap();
  assert_eq!(page.items.len(), 5);
  assert!(page.items[0].id < page.items[1].id);

  let all = PostQuery::new(Uid::parse_scope("post|post.comment:a.*").unwrap());
  assert_eq!(s.count_posts(all, None).await.unwrap(), 7);

  let mut mine = PostQuery::new(Uid::parse_scope("*:a.*").unwrap());
  mine.created_by = Some(2);
  assert_eq!(s.count_posts(mine, None).await.unwrap(), 1);
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn restricted_posts_need_ownership_grant_or_privilege() {
  let s = store().await;
  let write = PostWrite { restricted: Some(true), ..doc(json!({"secret": 1})) };
  let t = s.upsert(uid("post:a.b.c"), write, user(1)).await.unwrap();
  let target = t.after.uid();

  assert!(s.get_post(target.clone(), None).await.unwrap().is_none());
  assert!(s.get_post(target.clone(), Some(user(2))).await.unwrap().is_none());
  assert!(s.get_post(target.clone(), Some(user(1))).await.unwrap().is_some());
  assert!(s.get_post(target.clone(), Some(god("a"))).await.unwrap().is_some());
  assert!(s.get_post(target.clone(), Some(god("b"))).await.unwrap().is_none());

  s.declare_membership(5, 2).await.unwrap();
  s.allow_subtree(5, path("a.b")).await.unwrap();
  assert!(s.get_post(target.clone(), Some(user(2))).await.unwrap().is_some());

  let ids = vec![t.after.id];
  assert!(s.get_posts(ids.clone(), Some(user(3))).await.unwrap().is_empty());
  assert_eq!(s.get_posts(ids, Some(user(2))).await.unwrap().len(), 1);

  s.deny_subtree(5, path("a")).await.unwrap();
  assert!(s.get_post(target, Some(user(2))).await.unwrap().is_none());
}

// ─── Changes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_lists_transitions_in_order() {
  let s = store().await;
  let t = s.upsert(uid("post:a.b"), doc(json!({"v": 1})), user(1)).await.unwrap();
  s.upsert(t.after.uid(), doc(json!({"v": 2})), user(1)).await.unwrap();
  s.mutate(t.after.uid(), Mutation::Delete, user(1)).await.unwrap();
  s.upsert(uid("post:z"), doc(json!({})), user(1)).await.unwrap();

  let query = ChangeQuery {
    scope: Uid::parse_scope("post:a.*").unwrap(),
    since: None,
    limit: None,
  };
  let feed = s.changes(query.clone(), user(1)).await.unwrap();
  let kinds: Vec<_> = feed.iter().map(|c| c.kind).collect();
  assert_eq!(kinds, [ChangeKind::Create, ChangeKind::Update, ChangeKind::Delete]);
  assert!(feed.iter().all(|c| c.post_uid == t.after.uid().to_string()));

  let since = ChangeQuery { since: Some(feed[0].id), limit: Some(1), ..query };
  let tail = s.changes(since, user(1)).await.unwrap();
  assert_eq!(tail.len(), 1);
  assert_eq!(tail[0].id, feed[1].id);
}

#[tokio::test]
async fn feed_hides_restricted_posts() {
  let s = store().await;
  let write = PostWrite { restricted: Some(true), ..doc(json!({})) };
  s.upsert(uid("post:a"), write, user(1)).await.unwrap();
  let query = ChangeQuery { scope: Uid::parse_scope("*").unwrap(), since: None, limit: None };
  assert_eq!(s.changes(query.clone(), user(1)).await.unwrap().len(), 1);
  assert!(s.changes(query, user(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn changes_cannot_be_rewritten() {
  let s = store().await;
  s.upsert(uid("post:a"), doc(json!({})), user(1)).await.unwrap();

  let err = s.execute_raw("UPDATE changes SET kind = 'delete'").await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(grove_core::Error::ImmutabilityViolation)
  ));
  let err = s.execute_raw("DELETE FROM changes").await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(grove_core::Error::ImmutabilityViolation)
  ));
}

// ─── Readmarks ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn readmarks_track_unread_posts() {
  let s = store().await;
  let first = s.upsert(uid("post:a.b"), doc(json!({})), user(1)).await.unwrap();
  s.upsert(uid("post:a.b.c"), doc(json!({})), user(1)).await.unwrap();

  let mark = s.set_readmark(user(9), path("a.b"), first.after.id).await.unwrap();
  assert_eq!(mark.unread_count, 1);

  let third = s.upsert(uid("post:a.b.d"), doc(json!({})), user(1)).await.unwrap();
  s.upsert(uid("post:a.z"), doc(json!({})), user(1)).await.unwrap();
  let marks = s.readmarks(user(9), PathQuery::parse("a.b").unwrap()).await.unwrap();
  assert_eq!(marks[0].unread_count, 2);

  s.mutate(third.after.uid(), Mutation::Delete, user(1)).await.unwrap();
  let marks = s.readmarks(user(9), PathQuery::parse("^a.b.d").unwrap()).await.unwrap();
  assert_eq!(marks.len(), 1);
  assert_eq!(marks[0].unread_count, 1);

  // Moving the cursor backwards is allowed.
  let mark = s.set_readmark(user(9), path("a.b"), 0).await.unwrap();
  assert_eq!(mark.unread_count, 2);
  assert!(s.readmarks(user(8), PathQuery::everything()).await.unwrap().is_empty());
}

//! Rendering of path, klass and visibility constraints into SQL.
//!
//! Each constraint becomes one `WHERE` condition with positional `?`
//! parameters, collected in the order the conditions are pushed.

use grove_core::{
  identity::Identity,
  path::{LabelMatch, PathQuery},
  uid::KlassQuery,
};
use rusqlite::types::Value;

#[derive(Debug, Default)]
pub struct Filter {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl Filter {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, cond: impl Into<String>) {
    self.conds.push(cond.into());
  }

  pub fn push_with(
    &mut self,
    cond: impl Into<String>,
    params: impl IntoIterator<Item = Value>,
  ) {
    self.conds.push(cond.into());
    self.params.extend(params);
  }

  /// Constrain the location aliased `alias` to match `query`.
  pub fn location(&mut self, alias: &str, query: &PathQuery) {
    for (i, term) in query.predicate().iter().enumerate() {
      let col = format!("{alias}.label_{i}");
      match term {
        LabelMatch::Equals(v) => {
          self.push_with(format!("{col} = ?"), [Value::Text(v.clone())]);
        }
        LabelMatch::In(vs) => {
          let marks = vec!["?"; vs.len()].join(", ");
          self.push_with(
            format!("{col} IN ({marks})"),
            vs.iter().cloned().map(Value::Text),
          );
        }
        LabelMatch::AncestorOrEqual(v) => {
          self.push_with(format!("({col} IS NULL OR {col} = ?)"), [
            Value::Text(v.clone()),
          ]);
        }
        LabelMatch::Absent => self.push(format!("{col} IS NULL")),
        LabelMatch::Unconstrained => {}
      }
    }
  }

  /// Constrain post `p` to be attached to at least one location matching
  /// `query`.
  pub fn post_paths(&mut self, query: &PathQuery) {
    let mut inner = Filter::new();
    inner.location("sl", query);
    if inner.conds.is_empty() {
      return;
    }
    let (cond, params) = inner.into_parts();
    self.push_with(
      format!(
        "EXISTS (SELECT 1 FROM posts_locations spl \
         JOIN locations sl ON sl.id = spl.location_id \
         WHERE spl.post_id = p.id AND {cond})"
      ),
      params,
    );
  }

  pub fn klass(&mut self, column: &str, klass: &KlassQuery) {
    if let KlassQuery::OneOf(ks) = klass {
      let marks = vec!["?"; ks.len()].join(", ");
      self.push_with(
        format!("{column} IN ({marks})"),
        ks.iter().cloned().map(Value::Text),
      );
    }
  }

  /// Restrict post `p` to what `viewer` may read.
  ///
  /// Unrestricted posts are public. A restricted post is visible to its
  /// creator, to members of a group granted on one of its locations and to
  /// identities privileged in its realm.
  pub fn visible_to(&mut self, viewer: Option<&Identity>, include_deleted: bool) {
    if !include_deleted {
      self.push("p.deleted = 0");
    }
    let Some(viewer) = viewer else {
      self.push("p.restricted = 0");
      return;
    };
    let god_realm = if viewer.god { viewer.realm.clone() } else { None };
    self.push_with(
      "(p.restricted = 0 OR p.created_by = ? OR p.realm = ? OR EXISTS (\
         SELECT 1 FROM posts_locations vpl \
         JOIN group_locations vgl ON vgl.location_id = vpl.location_id \
         JOIN group_memberships vgm ON vgm.group_id = vgl.group_id \
         WHERE vpl.post_id = p.id AND vgm.identity_id = ?))",
      [
        Value::Integer(viewer.id),
        god_realm.map_or(Value::Null, Value::Text),
        Value::Integer(viewer.id),
      ],
    );
  }

  /// The conditions joined with `AND` (`1` when there are none) and their
  /// parameters.
  pub fn into_parts(self) -> (String, Vec<Value>) {
    let cond = if self.conds.is_empty() {
      "1".to_owned()
    } else {
      self.conds.join(" AND ")
    };
    (cond, self.params)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exact_path_pins_every_position() {
    let mut f = Filter::new();
    f.location("l", &PathQuery::parse("a.b").unwrap());
    let (cond, params) = f.into_parts();
    assert!(cond.starts_with("l.label_0 = ? AND l.label_1 = ? AND l.label_2 IS NULL"));
    assert!(cond.ends_with("l.label_9 IS NULL"));
    assert_eq!(params, [Value::Text("a".into()), Value::Text("b".into())]);
  }

  #[test]
  fn wildcard_leaves_tail_open() {
    let mut f = Filter::new();
    f.location("l", &PathQuery::parse("a.*").unwrap());
    let (cond, _) = f.into_parts();
    assert_eq!(cond, "l.label_0 = ?");
  }

  #[test]
  fn everything_renders_no_condition() {
    let mut f = Filter::new();
    f.post_paths(&PathQuery::everything());
    f.klass("p.klass", &KlassQuery::Any);
    assert_eq!(f.into_parts().0, "1");
  }

  #[test]
  fn anonymous_viewers_see_public_posts_only() {
    let mut f = Filter::new();
    f.visible_to(None, false);
    assert_eq!(f.into_parts().0, "p.deleted = 0 AND p.restricted = 0");
  }
}

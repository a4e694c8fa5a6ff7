//! The two static collections the API serves, loaded once at startup.
//!
//! Records are opaque JSON objects. Key order is preserved end to end so a
//! record is returned exactly as it appears in its source file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};

/// An account holder record, exposed verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(pub Map<String, Value>);

impl User {
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }
}

/// A bank transaction or event record, tied to a user through `user_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Activity(pub Map<String, Value>);

impl Activity {
    pub fn user_id(&self) -> Option<&Value> {
        self.0.get("user_id")
    }

    /// Whether this activity belongs to the user named by a decoded path segment.
    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id().is_some_and(|v| loose_eq(v, user_id))
    }
}

/// Immutable in-memory copy of both collections.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    users: Vec<User>,
    activities: Vec<Activity>,
}

impl Dataset {
    pub fn new(users: Vec<User>, activities: Vec<Activity>) -> Self {
        Self { users, activities }
    }

    /// Reads both files. All or nothing: any missing or malformed file fails
    /// the whole load.
    pub fn load(users_path: impl AsRef<Path>, activities_path: impl AsRef<Path>) -> Result<Self> {
        let users_path = users_path.as_ref();
        let activities_path = activities_path.as_ref();

        let users = parse_users(&read(users_path)?)
            .map_err(|reason| Error::Dataset { path: users_path.to_owned(), reason })?;
        let activities = parse_activities(&read(activities_path)?)
            .map_err(|reason| Error::Dataset { path: activities_path.to_owned(), reason })?;

        info!(
            users = users.len(),
            activities = activities.len(),
            users_file = %users_path.display(),
            activities_file = %activities_path.display(),
            "dataset loaded"
        );
        Ok(Self::new(users, activities))
    }

    /// Parses both collections from in-memory JSON with the same rules as
    /// [`Dataset::load`]. Errors name the collection instead of a file.
    pub fn from_json(users: &str, activities: &str) -> Result<Self> {
        let users = parse_users(users)
            .map_err(|reason| Error::Dataset { path: "users".into(), reason })?;
        let activities = parse_activities(activities)
            .map_err(|reason| Error::Dataset { path: "activities".into(), reason })?;
        Ok(Self::new(users, activities))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Activities whose `user_id` loosely equals `user_id`, in source order.
    /// An unknown user and a user without activities both yield nothing.
    pub fn activities_for<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Activity> + 'a {
        self.activities.iter().filter(move |a| a.belongs_to(user_id))
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Dataset {
        path: path.to_owned(),
        reason: e.to_string(),
    })
}

fn parse_users(json: &str) -> Result<Vec<User>, String> {
    parse_records(json)
}

fn parse_activities(json: &str) -> Result<Vec<Activity>, String> {
    let activities: Vec<Activity> = parse_records(json)?;
    match activities.iter().position(|a| a.user_id().is_none()) {
        Some(index) => Err(format!("record {index} has no `user_id` field")),
        None => Ok(activities),
    }
}

/// A top-level array whose every element is an object.
fn parse_records<T: for<'de> Deserialize<'de>>(json: &str) -> Result<Vec<T>, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let Value::Array(items) = value else {
        return Err("expected a top-level JSON array".to_owned());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(format!("record {index} is not a JSON object"));
            }
            serde_json::from_value(item).map_err(|e| format!("record {index}: {e}"))
        })
        .collect()
}

/// Compares a stored `user_id` with a decoded path segment, coercing between
/// string and number the way a loosely typed client would expect.
///
/// - string: exact match;
/// - number: the segment, trimmed, must parse to the same number
///   (`"1"`, `" 1"`, `"1.0"` and `"01"` all equal `1`);
/// - boolean: compared numerically as `1` or `0`;
/// - null, arrays and objects never match. A loosely typed client would
///   stringify an array (`[1]` equals `"1"`); stored ids are never arrays in
///   practice, so that coercion is not reproduced.
pub fn loose_eq(stored: &Value, segment: &str) -> bool {
    match stored {
        Value::String(s) => s == segment,
        Value::Number(n) => n.as_f64().is_some_and(|n| parse_number(segment) == Some(n)),
        Value::Bool(b) => parse_number(segment) == Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

fn parse_number(segment: &str) -> Option<f64> {
    let trimmed = segment.trim();
    // Rust also accepts "inf" and "NaN", which no JSON number can equal anyway.
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USERS: &str = r#"[{"id":1,"name":"A"},{"id":2,"name":"B"}]"#;
    const ACTIVITIES: &str = r#"[
        {"id":10,"user_id":1,"amount":5},
        {"id":11,"user_id":2,"amount":7},
        {"id":12,"user_id":1,"amount":3}
    ]"#;

    fn ids<'a>(activities: impl Iterator<Item = &'a Activity>) -> Vec<Value> {
        activities.map(|a| a.0["id"].clone()).collect()
    }

    #[test]
    fn filters_in_source_order() {
        let data = Dataset::from_json(USERS, ACTIVITIES).unwrap();
        assert_eq!(ids(data.activities_for("1")), vec![json!(10), json!(12)]);
        assert_eq!(ids(data.activities_for("2")), vec![json!(11)]);
        assert!(data.activities_for("3").next().is_none());
    }

    #[test]
    fn users_keep_order_and_key_order() {
        let data = Dataset::from_json(r#"[{"name":"Z","id":9},{"id":1}]"#, "[]").unwrap();
        assert_eq!(data.users()[0].id(), Some(&json!(9)));
        assert_eq!(serde_json::to_string(&data.users()[0]).unwrap(), r#"{"name":"Z","id":9}"#);
    }

    #[test]
    fn loose_equality_coerces_numbers() {
        assert!(loose_eq(&json!(1), "1"));
        assert!(loose_eq(&json!(1), " 1 "));
        assert!(loose_eq(&json!(1), "1.0"));
        assert!(loose_eq(&json!(1), "01"));
        assert!(loose_eq(&json!(2.5), "2.5"));
        assert!(!loose_eq(&json!(1), "one"));
        assert!(!loose_eq(&json!(0), ""));
    }

    #[test]
    fn loose_equality_on_strings_is_exact() {
        assert!(loose_eq(&json!("u-1"), "u-1"));
        assert!(loose_eq(&json!("1"), "1"));
        assert!(!loose_eq(&json!("1"), "01"));
        assert!(!loose_eq(&json!("1"), " 1"));
    }

    #[test]
    fn loose_equality_on_other_types() {
        assert!(loose_eq(&json!(true), "1"));
        assert!(loose_eq(&json!(false), "0"));
        assert!(!loose_eq(&json!(true), "true"));
        assert!(!loose_eq(&Value::Null, "null"));
        assert!(!loose_eq(&json!([1]), "1"));
        assert!(!loose_eq(&json!({"id": 1}), "1"));
    }

    #[test]
    fn string_and_number_ids_mix() {
        let data = Dataset::from_json("[]", r#"[{"user_id":"7"},{"user_id":7},{"user_id":"07"}]"#).unwrap();
        assert_eq!(data.activities_for("7").count(), 2);
        assert_eq!(data.activities_for("07").count(), 2);
    }

    #[test]
    fn rejects_non_array_document() {
        let err = Dataset::from_json(r#"{"id":1}"#, "[]").unwrap_err();
        assert!(err.to_string().contains("top-level JSON array"), "{err}");
    }

    #[test]
    fn rejects_non_object_record() {
        let err = Dataset::from_json("[1]", "[]").unwrap_err();
        assert!(err.to_string().contains("record 0 is not a JSON object"), "{err}");
    }

    #[test]
    fn rejects_activity_without_user_id() {
        let err = Dataset::from_json("[]", r#"[{"user_id":1},{"id":2}]"#).unwrap_err();
        assert!(err.to_string().contains("record 1 has no `user_id` field"), "{err}");
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            Dataset::from_json("[", "[]"),
            Err(Error::Dataset { .. })
        ));
    }

    #[test]
    fn load_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("users.json");
        let activities = dir.path().join("bankActivities.json");
        fs::write(&users, USERS).unwrap();
        fs::write(&activities, ACTIVITIES).unwrap();

        let data = Dataset::load(&users, &activities).unwrap();
        assert_eq!(data.users().len(), 2);
        assert_eq!(data.activities().len(), 3);
    }

    #[test]
    fn load_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("users.json");
        fs::write(&users, USERS).unwrap();
        let missing = dir.path().join("bankActivities.json");

        match Dataset::load(&users, &missing) {
            Err(Error::Dataset { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected dataset error, got {other:?}"),
        }
    }
}

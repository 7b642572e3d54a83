use assert_matches::assert_matches;
use serde_json::json;

use super::*;

fn goal_json() -> Value {
    json!({
        "slug": "read",
        "title": "Read more",
        "curval": 5,
        "goalval": 100.5,
        "goaldate": 1767225600,
        "rate": 1.0,
        "losedate": 1760000000,
        "safebuf": 3,
        "lost": false,
        "won": null,
        "tags": ["books"],
        "unknown_field": {"ignored": true}
    })
}

#[test]
fn it_parses_a_goal_and_ignores_unknown_fields() {
    let goal = Goal::parse(goal_json()).unwrap();

    assert_eq!(goal.slug, "read");
    assert_eq!(goal.display_title(), "Read more");
    assert_eq!(goal.curval, Some(5.0));
    assert_eq!(goal.goalval, Some(100.5));
    assert_eq!(goal.safebuf, Some(3));
    assert_eq!(goal.won, None);
    assert_eq!(goal.datapoints, None);
    assert_eq!(goal.status(), GoalStatus::Active);
}

#[test]
fn it_round_trips_slug_value_and_target() {
    let goal = Goal::parse(goal_json()).unwrap();
    let serialized = serde_json::to_value(&goal).unwrap();

    assert_eq!(serialized["slug"], "read");
    assert_eq!(serialized["curval"].as_f64(), Some(5.0));
    assert_eq!(serialized["goalval"].as_f64(), Some(100.5));
    assert_eq!(serialized["goaldate"].as_i64(), Some(1767225600));

    let reparsed = Goal::parse(serialized).unwrap();
    assert_eq!(reparsed, goal);
}

#[test]
fn it_rejects_a_goal_without_slug() {
    let mut raw = goal_json();
    raw.as_object_mut().unwrap().remove("slug");

    assert_matches!(Goal::parse(raw), Err(BeeminderError::Validation(msg)) if msg.contains("slug"));
}

#[test]
fn it_rejects_an_empty_slug() {
    assert_matches!(
        Goal::parse(json!({"slug": "  "})),
        Err(BeeminderError::Validation(_))
    );
}

#[test]
fn it_rejects_a_non_numeric_current_value() {
    let mut raw = goal_json();
    raw["curval"] = json!("five");

    assert_matches!(Goal::parse(raw), Err(BeeminderError::Validation(_)));
}

#[test]
fn it_accepts_a_goal_whose_value_fields_are_absent() {
    // Fresh goals come back without curval/goalval; only their type is checked.
    let goal = Goal::parse(json!({"slug": "read"})).unwrap();

    assert_eq!(goal.curval, None);
    assert_eq!(goal.goalval, None);
    assert_eq!(goal.datapoints, None);
}

#[test]
fn it_rejects_a_goal_with_a_valueless_datapoint() {
    let mut raw = goal_json();
    raw["datapoints"] = json!([{"id": "a", "value": 1}, {"id": "b"}]);

    assert_matches!(Goal::parse(raw), Err(BeeminderError::Validation(msg)) if msg.contains("value"));
}

#[test]
fn it_attaches_the_parent_slug_to_nested_datapoints() {
    let mut raw = goal_json();
    raw["datapoints"] = json!([
        {"id": "a", "value": 1, "timestamp": 100},
        {"id": "b", "value": 2.5, "timestamp": 300, "comment": "late"},
    ]);
    raw["last_datapoint"] = json!({"id": "b", "value": 2.5, "timestamp": 300});

    let goal = Goal::parse(raw).unwrap();
    let points = goal.datapoints.as_ref().unwrap();

    assert_eq!(points.len(), 2);
    assert!(points.iter().all(|p| p.goal_slug == "read"));
    assert_eq!(goal.last_datapoint.unwrap().goal_slug, "read");
}

#[test]
fn it_orders_datapoints_newest_first() {
    let mut raw = goal_json();
    raw["datapoints"] = json!([
        {"id": "a", "value": 1, "timestamp": 100},
        {"id": "none", "value": 9},
        {"id": "c", "value": 3, "timestamp": 300},
        {"id": "b", "value": 2, "timestamp": 200},
    ]);
    let goal = Goal::parse(raw).unwrap();

    let ids: Vec<_> = goal
        .recent_datapoints()
        .iter()
        .map(|p| p.id.clone().unwrap())
        .collect();
    assert_eq!(ids, ["c", "b", "a", "none"]);
}

#[test]
fn it_rejects_a_datapoint_without_value() {
    assert_matches!(
        Datapoint::parse("read", json!({"id": "x", "timestamp": 1})),
        Err(BeeminderError::Validation(msg)) if msg.contains("value")
    );
}

#[test]
fn it_parses_a_full_goal_list() {
    let goals = parse_goals(json!([
        {"slug": "read", "curval": 5},
        {"slug": "write", "curval": 2},
    ]))
    .unwrap();

    let slugs: Vec<_> = goals.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, ["read", "write"]);
}

#[test]
fn it_skips_a_malformed_goal_in_a_list() {
    let goals = parse_goals(json!([
        {"slug": "read", "curval": 5},
        {"title": "no slug here"},
        {"slug": "write", "curval": "two"},
        {"slug": "run", "curval": 1},
    ]))
    .unwrap();

    let slugs: Vec<_> = goals.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, ["read", "run"]);
}

#[test]
fn it_rejects_a_list_response_that_is_not_an_array() {
    assert_matches!(
        parse_goals(json!({"errors": "nope"})),
        Err(BeeminderError::Validation(_))
    );
    assert_matches!(
        parse_datapoints("read", json!("x")),
        Err(BeeminderError::Validation(_))
    );
}

#[test]
fn it_parses_a_user() {
    let user = User::parse(json!({
        "username": "alice",
        "goals": ["read", "write"],
        "timezone": "Europe/Rome",
        "created_at": 1
    }))
    .unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.goals, ["read", "write"]);

    assert_matches!(User::parse(json!({"goals": []})), Err(BeeminderError::Validation(_)));
}

#[test]
fn it_parses_user_entered_values() {
    assert_eq!(parse_value(" 2.5 ").unwrap(), 2.5);
    assert_eq!(parse_value("-3").unwrap(), -3.0);
    assert_matches!(parse_value("abc"), Err(BeeminderError::Validation(_)));
    assert_matches!(parse_value(""), Err(BeeminderError::Validation(_)));
    assert_matches!(parse_value("NaN"), Err(BeeminderError::Validation(_)));
    assert_matches!(parse_value("inf"), Err(BeeminderError::Validation(_)));
}

#[test]
fn it_builds_the_datapoint_form() {
    let form = NewDatapoint::new(1.5)
        .with_comment("morning run")
        .with_timestamp(1700000000)
        .to_form();

    assert_eq!(form.get("value").map(String::as_str), Some("1.5"));
    assert_eq!(form.get("comment").map(String::as_str), Some("morning run"));
    assert_eq!(form.get("timestamp").map(String::as_str), Some("1700000000"));
    assert!(!form.contains_key("daystamp"));
    assert!(!form.contains_key("requestid"));
}

#[test]
fn it_drops_blank_comments() {
    let form = NewDatapoint::new(2.0).with_comment("   ").to_form();
    assert_eq!(form.len(), 1);
    assert_eq!(form["value"], "2");
}

#[test]
fn it_validates_new_datapoints() {
    assert!(NewDatapoint::new(1.0).with_daystamp("20240131").validate().is_ok());
    assert_matches!(
        NewDatapoint::new(f64::NAN).validate(),
        Err(BeeminderError::Validation(_))
    );
    assert_matches!(
        NewDatapoint::new(1.0).with_daystamp("2024-01-31").validate(),
        Err(BeeminderError::Validation(_))
    );
}

#[test]
fn it_ranks_goal_status() {
    let mut goal = Goal::parse(json!({"slug": "x", "won": true, "frozen": true})).unwrap();
    assert_eq!(goal.status(), GoalStatus::Won);
    goal.lost = Some(true);
    assert_eq!(goal.status(), GoalStatus::Lost);
    assert_eq!(goal.status().to_string(), "LOST");
}

#[test]
fn it_reads_both_batch_result_shapes() {
    let split = parse_batch(
        "read",
        json!({
            "successes": [{"id": "a", "value": 1}, {"id": "b", "value": 2}],
            "errors": [{"error": "bad timestamp"}]
        }),
    )
    .unwrap();
    assert_eq!(split.created.len(), 2);
    assert!(split.created.iter().all(|p| p.goal_slug == "read"));
    assert_eq!(split.errors, vec![json!({"error": "bad timestamp"})]);

    let bare = parse_batch("read", json!([{"id": "a", "value": 1}])).unwrap();
    assert_eq!(bare.created.len(), 1);
    assert!(bare.errors.is_empty());

    assert_matches!(parse_batch("read", json!("ok")), Err(BeeminderError::Validation(_)));
}

#[test]
fn it_serializes_batch_entries_without_unset_fields() {
    let entry = NewDatapoint::new(3.0).with_daystamp("20240131");
    assert_eq!(
        serde_json::to_value(&entry).unwrap(),
        json!({"value": 3.0, "daystamp": "20240131"})
    );
}

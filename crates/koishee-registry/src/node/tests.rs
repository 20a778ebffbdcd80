//! Unit tests for the etcd wire model.

use rstest::rstest;

use super::*;

#[rstest]
#[case("set", Action::Set)]
#[case("delete", Action::Delete)]
#[case("expire", Action::Unhandled(String::from("expire")))]
#[case("compareAndSwap", Action::Unhandled(String::from("compareAndSwap")))]
#[case("SET", Action::Unhandled(String::from("SET")))]
fn classifies_actions(#[case] name: &str, #[case] expected: Action) {
    assert_eq!(Action::from(name), expected);
    assert_eq!(Action::from(name).as_str(), name);
}

#[test]
fn decodes_watch_response() {
    let body = r#"{
        "action": "set",
        "node": {
            "key": "/skydns/local/skydns/services/web/1",
            "value": "{\"host\":\"10.0.0.1\"}",
            "modifiedIndex": 42,
            "createdIndex": 40
        },
        "prevNode": {
            "key": "/skydns/local/skydns/services/web/1",
            "value": "{}",
            "modifiedIndex": 40,
            "createdIndex": 40
        }
    }"#;
    let notification: Notification = serde_json::from_str(body).expect("decode");
    assert_eq!(notification.action, Action::Set);
    assert_eq!(notification.node.key, "/skydns/local/skydns/services/web/1");
    assert_eq!(notification.node.modified_index, 42);
    assert_eq!(notification.node.created_index, 40);
    assert!(!notification.node.dir);
    let previous = notification.prev_node.expect("previous node");
    assert_eq!(previous.value.as_deref(), Some("{}"));
}

#[test]
fn decodes_delete_without_value() {
    let body = r#"{"action":"delete","node":{"key":"/skydns/local/skydns/a","modifiedIndex":7}}"#;
    let notification: Notification = serde_json::from_str(body).expect("decode");
    assert_eq!(notification.action, Action::Delete);
    assert!(notification.node.value.is_none());
}

#[test]
fn keeps_unknown_action_name() {
    let body = r#"{"action":"compareAndDelete","node":{"key":"/skydns/a"}}"#;
    let notification: Notification = serde_json::from_str(body).expect("decode");
    assert_eq!(
        notification.action,
        Action::Unhandled(String::from("compareAndDelete"))
    );
}

#[test]
fn leaves_flatten_nested_directories_in_key_order() {
    let tree = RegistryNode::directory(
        "/skydns/local/skydns",
        vec![
            RegistryNode::directory(
                "/skydns/local/skydns/web",
                vec![
                    RegistryNode::leaf("/skydns/local/skydns/web/2", "{}"),
                    RegistryNode::leaf("/skydns/local/skydns/web/1", "{}"),
                ],
            ),
            RegistryNode::leaf("/skydns/local/skydns/db", "{}"),
            RegistryNode::directory("/skydns/local/skydns/empty", Vec::new()),
        ],
    );
    let keys: Vec<&str> = tree.leaves().iter().map(|node| node.key.as_str()).collect();
    assert_eq!(
        keys,
        [
            "/skydns/local/skydns/db",
            "/skydns/local/skydns/web/1",
            "/skydns/local/skydns/web/2",
        ]
    );
}

#[test]
fn leaf_root_is_its_own_leaf() {
    let node = RegistryNode::leaf("/skydns/local/skydns", "{}");
    assert_eq!(node.leaves(), vec![&node]);
}

#[test]
fn resume_index_prefers_reported_index() {
    let snapshot = Snapshot::new(RegistryNode::directory("/skydns", Vec::new()), Some(99));
    assert_eq!(snapshot.resume_index(), Some(99));
}

#[test]
fn resume_index_falls_back_to_highest_modification() {
    let tree = RegistryNode::directory(
        "/skydns",
        vec![
            RegistryNode::leaf("/skydns/a", "{}").with_modified_index(5),
            RegistryNode::leaf("/skydns/b", "{}").with_modified_index(12),
        ],
    );
    assert_eq!(Snapshot::new(tree, None).resume_index(), Some(12));
}

#[test]
fn resume_index_is_absent_for_unindexed_snapshot() {
    let snapshot = Snapshot::new(RegistryNode::directory("/skydns", Vec::new()), None);
    assert_eq!(snapshot.resume_index(), None);
}

use super::*;

#[test]
fn sample_roster_has_one_streamer_and_unique_ids() {
    let roster = sample_roster();
    assert_eq!(roster.iter().filter(|u| u.is_streamer()).count(), 1);
    let ids: HashSet<_> = roster.iter().map(|u| u.id).collect();
    assert_eq!(ids.len(), roster.len());
}

#[test]
fn subscriber_months_reads_role() {
    let user = ChatUser::new("sub").with_role(Role::Vip).with_role(Role::Subscriber { months: 7 });
    assert_eq!(user.subscriber_months(), Some(7));
    assert_eq!(ChatUser::new("guest").subscriber_months(), None);
}

#[test]
fn role_serializes_with_kind_tag() {
    let json = serde_json::to_value(Role::Subscriber { months: 2 }).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "subscriber", "months": 2 }));
    let back: Role = serde_json::from_value(serde_json::json!({ "kind": "moderator" })).unwrap();
    assert_eq!(back, Role::Moderator);
}

mod common;

use architect_client::{
    ClientConfig, ClientError, Entity, EntityType, Envelope, Id, Method, Registry, RelatedType, RelationValue,
    WireCase,
};
use common::{fixture, Call, RecordingTransport};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

async fn wait_hydrated(entity: &Entity, field: &str) {
    for _ in 0..200 {
        if entity.is_hydrated(field) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("relation '{}' never hydrated", field);
}

#[tokio::test]
async fn fetch_all_unwraps_results_envelope() {
    let f = fixture(ClientConfig::default());
    f.transport.route(
        Method::Get,
        "http://localhost:8080/parent",
        json!({"results": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]}),
    );

    let list = f.client.fetch_all(&f.evaluation, &[]).await.unwrap().into_many().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.at(0).unwrap().get("name"), Some(&json!("A")));
    assert_eq!(list.get(&Id::Int(2)).unwrap().get("name"), Some(&json!("B")));
}

#[tokio::test]
async fn fetch_all_with_filter_and_entry_point_envelope() {
    let f = fixture(ClientConfig::default());
    f.transport.route(
        Method::Get,
        "http://localhost:8080/parent?term=fall",
        json!({"parent": [{"id": 7}]}),
    );

    let list = f
        .client
        .fetch_all(&f.evaluation, &[("term", "fall")])
        .await
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(list.keys().cloned().collect::<Vec<_>>(), vec![Id::Int(7)]);
}

#[tokio::test]
async fn fetch_one_uses_key_envelope() {
    let f = fixture(ClientConfig::default());
    f.transport
        .route(Method::Get, "/api/school/3", json!({"data": {"id": 3, "name": "North"}}));

    let school = f.client.fetch_one(&f.school, 3).await.unwrap().into_one().unwrap();
    assert_eq!(school.id(), Some(&Id::Int(3)));
    assert_eq!(school.get("name"), Some(&json!("North")));
    assert_eq!(school.url(), "/api/school/3");
}

#[tokio::test]
async fn fetch_under_parent_and_with_relations() {
    let f = fixture(ClientConfig::default());
    let mut parent = Entity::new(&f.school);
    parent.set_id(Some(Id::Int(3)));
    f.transport
        .route(Method::Get, "/api/school/3/student_record", json!([{"id": 1}, {"id": 2}]));
    f.transport
        .route(Method::Get, "/api/student_record?with=school,grades", json!([{"id": 5}]));

    let children = f.client.fetch_under(&f.student, &parent).await.unwrap().into_many().unwrap();
    assert_eq!(children.len(), 2);

    let eager = f
        .client
        .with(&f.student, ["school", "grades", "school"])
        .get()
        .await
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(eager.len(), 1);
}

#[tokio::test]
async fn fetch_under_unsaved_parent_sends_nothing() {
    let f = fixture(ClientConfig::default());
    let err = f
        .client
        .fetch_under(&f.student, &Entity::new(&f.school))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MissingIdentity(_)));
    assert!(f.transport.calls().is_empty());
}

#[tokio::test]
async fn query_failure_propagates() {
    let f = fixture(ClientConfig::default());
    let err = f.client.fetch_one(&f.school, 99).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn relations_hydrate_in_background() {
    let f = fixture(ClientConfig::default());
    let student = f
        .client
        .materialize(
            &f.student,
            json!({
                "id": 1,
                "name": "Ada",
                "school": {"id": 3, "name": "North", "district": {"id": 9}},
                "grades": [{"id": 1, "value": "A"}, {"id": 2, "value": "B"}]
            }),
        )
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(student.get("name"), Some(&json!("Ada")));

    wait_hydrated(&student, "school").await;
    wait_hydrated(&student, "grades").await;
    let school = student.related_one("school").unwrap();
    assert_eq!(school.get("name"), Some(&json!("North")));
    assert_eq!(school.entity_type().name(), "School");
    wait_hydrated(&school, "district").await;
    assert_eq!(school.related_one("district").unwrap().id(), Some(&Id::Int(9)));

    let grades = student.related_many("grades").unwrap();
    assert_eq!(grades.at(1).unwrap().get("value"), Some(&json!("B")));
}

#[tokio::test]
async fn materialize_with_relations_hydrates_before_returning() {
    let f = fixture(ClientConfig::default());
    let student = f
        .client
        .materialize_with_relations(
            &f.student,
            json!({"id": 1, "school": {"id": 3, "district": {"id": 9}}}),
        )
        .await
        .unwrap()
        .into_one()
        .unwrap();
    let school = student.related_one("school").unwrap();
    assert!(school.is_hydrated("district"));
}

#[tokio::test]
async fn failed_hydration_keeps_raw_payload() {
    let f = fixture(ClientConfig::default());
    let student = f
        .client
        .materialize_with_relations(&f.student, json!({"id": 1, "school": 5}))
        .await
        .unwrap()
        .into_one()
        .unwrap();
    assert!(matches!(student.relation("school"), Some(RelationValue::Raw(v)) if v == json!(5)));
}

#[test]
fn dangling_named_relation_fails_at_startup() {
    let orphan = EntityType::builder("Orphan")
        .relation("parent", RelatedType::named("Ghost"))
        .envelope(Envelope::Bare)
        .build()
        .unwrap();
    let registry = Registry::new().with(&orphan).unwrap();
    let err = architect_client::Client::new(RecordingTransport::new(), registry, ClientConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::Config(_)));
}

#[tokio::test]
async fn materialize_rejects_bad_shapes() {
    let f = fixture(ClientConfig::default());
    let err = f.client.materialize(&f.student, json!([{"name": "no id"}])).unwrap_err();
    assert!(matches!(err, ClientError::MissingIdentity(_)));
    let err = f.client.materialize(&f.student, json!("text")).unwrap_err();
    assert!(matches!(err, ClientError::Materialization(_)));
}

#[tokio::test]
async fn save_creates_then_updates() {
    let f = fixture(ClientConfig::default());
    f.transport.route(
        Method::Post,
        "/api/student_record",
        json!({"status": "success", "item": {"id": 42}}),
    );
    f.transport.route(
        Method::Put,
        "/api/student_record/42",
        json!({"status": "success", "item": {"id": 42, "name": "Ada L."}}),
    );

    let mut student = Entity::new(&f.student);
    student.set("name", json!("Ada"));
    student.save(&f.client).await;
    assert_eq!(student.id(), Some(&Id::Int(42)));

    student.set("name", json!("Ada L."));
    student.save(&f.client).await;
    assert_eq!(student.id(), Some(&Id::Int(42)));

    assert_eq!(
        f.transport.calls(),
        vec![
            Call {
                method: Method::Post,
                url: "/api/student_record".into(),
                body: Some(json!({"name": "Ada"})),
            },
            Call {
                method: Method::Put,
                url: "/api/student_record/42".into(),
                body: Some(json!({"id": 42, "name": "Ada L."})),
            },
        ]
    );
}

#[tokio::test]
async fn save_failures_leave_instance_unchanged() {
    let f = fixture(ClientConfig::default());
    let mut student = Entity::new(&f.student);
    student.save(&f.client).await;
    assert!(student.id().is_none());

    f.transport.route(
        Method::Post,
        "/api/student_record",
        json!({"status": "error", "message": "name required"}),
    );
    student.save(&f.client).await;
    assert!(student.id().is_none());
    assert_eq!(f.transport.calls().len(), 2);
}

#[tokio::test]
async fn delete_clears_identity_on_success_only() {
    let f = fixture(ClientConfig::default());
    let mut fresh = Entity::new(&f.student);
    fresh.delete(&f.client).await;
    assert!(f.transport.calls().is_empty());

    f.transport
        .route(Method::Delete, "/api/student_record/1", json!({"success": true}));
    f.transport
        .route(Method::Delete, "/api/student_record/2", json!({"success": false}));

    let mut one = Entity::new(&f.student);
    one.set_id(Some(Id::Int(1)));
    one.delete(&f.client).await;
    assert!(one.id().is_none());

    let mut two = Entity::new(&f.student);
    two.set_id(Some(Id::Int(2)));
    two.delete(&f.client).await;
    assert_eq!(two.id(), Some(&Id::Int(2)));

    let mut three = Entity::new(&f.student);
    three.set_id(Some(Id::Int(3)));
    three.delete(&f.client).await;
    assert_eq!(three.id(), Some(&Id::Int(3)));
}

#[tokio::test]
async fn bulk_and_single_type_level_deletes() {
    let f = fixture(ClientConfig::default());
    f.transport
        .route(Method::Post, "/api/student_record/delete", json!({"deleted": 2}));
    f.transport
        .route(Method::Delete, "/api/student_record/5", json!({"success": true}));

    let reply = f
        .client
        .delete_many(&f.student, &[Id::Int(1), Id::Int(2)])
        .await
        .unwrap();
    assert_eq!(reply, json!({"deleted": 2}));
    assert_eq!(f.transport.calls()[0].body, Some(json!({"ids": [1, 2]})));

    let reply = f.client.delete_by_id(&f.student, 5).await.unwrap();
    assert_eq!(reply, json!({"success": true}));
}

#[tokio::test]
async fn camel_case_wire_maps_to_snake_case_fields() {
    let f = fixture(ClientConfig {
        wire_case: WireCase::Camel,
        ..ClientConfig::default()
    });
    f.transport
        .route(Method::Get, "/api/grade", json!([{"id": 1, "letterGrade": "A"}]));
    f.transport.route(
        Method::Post,
        "/api/grade",
        json!({"status": "success", "item": {"id": 2}}),
    );

    let grade_type = f.client.entity_type("Grade").unwrap();
    let grades = f.client.fetch_all(&grade_type, &[]).await.unwrap().into_many().unwrap();
    assert_eq!(grades.at(0).unwrap().get("letter_grade"), Some(&json!("A")));

    let mut grade = Entity::new(&grade_type);
    grade.set("letter_grade", json!("B"));
    grade.save(&f.client).await;
    assert_eq!(grade.id(), Some(&Id::Int(2)));
    assert_eq!(f.transport.calls()[1].body, Some(json!({"letterGrade": "B"})));
}

#[tokio::test]
async fn camel_case_wire_round_trips_nested_relation_records() {
    let f = fixture(ClientConfig {
        wire_case: WireCase::Camel,
        ..ClientConfig::default()
    });
    f.transport.route(
        Method::Put,
        "/api/student_record/1",
        json!({"status": "success", "item": {"id": 1}}),
    );

    let mut student = f
        .client
        .materialize_with_relations(&f.student, json!({"id": 1, "school": {"id": 3, "foundedYear": 1901}}))
        .await
        .unwrap()
        .into_one()
        .unwrap();
    let school = student.related_one("school").unwrap();
    assert_eq!(school.to_payload(), json!({"id": 3, "founded_year": 1901}));

    student.save(&f.client).await;
    assert_eq!(
        f.transport.calls()[0].body,
        Some(json!({"id": 1, "school": {"id": 3, "foundedYear": 1901}}))
    );
}

#[tokio::test]
async fn duplicate_gets_independent_relation_slots() {
    let f = fixture(ClientConfig::default());
    let original = f
        .client
        .materialize_with_relations(&f.student, json!({"id": 1, "school": {"id": 3}}))
        .await
        .unwrap()
        .into_one()
        .unwrap();
    let mut copy = f.client.duplicate(&original).unwrap();
    assert_eq!(copy.to_payload(), original.to_payload());

    copy.set("school", json!({"id": 4}));
    assert_eq!(original.related_one("school").unwrap().id(), Some(&Id::Int(3)));
}

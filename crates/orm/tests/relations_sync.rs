mod common;

use common::{database, dev, prod, Post, Profile, Tag, User};
use tessera_orm::testing::RecordingConnection;
use tessera_orm::{Environment, LinkKey, ModelExtensions, OrmError, Row, SyncPlan, Value};
use uuid::Uuid;

fn post(id: i64) -> Post {
    Post {
        id: Some(id),
        user_id: 3,
        title: "Sets".to_string(),
        ..Post::default()
    }
}

fn tag_rows(ids: &[i64]) -> Vec<Row> {
    ids.iter().map(|id| Row::new().with("tag_id", *id)).collect()
}

#[tokio::test]
async fn test_has_one_follows_parent_foreign_key() {
    let connection = RecordingConnection::mysql();
    connection.push_rows(vec![Row::new().with("id", 5).with("bio", "Analyst")]);
    let db = dev(&connection);
    let user = User {
        id: Some(3),
        profile_id: Some(5),
        ..User::default()
    };

    let profile = user.has_one::<Profile>("profile_id").resolve(&db).await.unwrap().unwrap();

    assert_eq!(profile.bio.as_deref(), Some("Analyst"));
    let statement = connection.last_statement().unwrap();
    assert_eq!(statement.sql, "SELECT * FROM profiles WHERE id = ? LIMIT ?");
    assert_eq!(statement.binds, vec![Value::Int(5), Value::Int(1)]);
}

#[tokio::test]
async fn test_has_one_with_null_key_is_none() {
    let connection = RecordingConnection::mysql();
    let db = dev(&connection);
    let user = User::default();

    assert!(user.has_one::<Profile>("profile_id").resolve(&db).await.unwrap().is_none());
    assert!(connection.statements().is_empty());

    let err = user.has_one::<Profile>("avatar_id").resolve(&db).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_has_many_uses_parent_primary_key() {
    let connection = RecordingConnection::mysql();
    connection.push_rows(vec![
        Row::new().with("id", 10).with("user_id", 3).with("title", "One"),
        Row::new().with("id", 11).with("user_id", 3).with("title", "Two"),
    ]);
    let db = dev(&connection);
    let user = User {
        id: Some(3),
        ..User::default()
    };

    let posts = user.has_many::<Post>("user_id").resolve(&db).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].title, "Two");
    assert_eq!(connection.sql_log(), vec!["SELECT * FROM posts WHERE user_id = ?"]);
}

#[tokio::test]
async fn test_belongs_to_many_joins_through_prefixed_junction() {
    let connection = RecordingConnection::postgres();
    connection.push_rows(vec![Row::new().with("id", 1).with("name", "rust")]);
    let db = database(&connection, Environment::Development, "shop_");

    let tags = post(9)
        .belongs_to_many::<Tag>("post_tag", "post_id", "tag_id")
        .resolve(&db)
        .await
        .unwrap();

    assert_eq!(tags.len(), 1);
    let statement = connection.last_statement().unwrap();
    assert_eq!(
        statement.sql,
        "SELECT shop_tags.* FROM shop_tags \
         INNER JOIN shop_post_tag ON shop_post_tag.tag_id = shop_tags.id \
         WHERE shop_post_tag.post_id = $1"
    );
    assert_eq!(statement.binds, vec![Value::Int(9)]);
}

#[tokio::test]
async fn test_attach_reuses_one_insert() {
    let connection = RecordingConnection::mysql();
    let db = dev(&connection);
    let related = post(9).related("post_tag", "post_id", "tag_id");

    assert_eq!(related.attach(&db, Vec::<i64>::new()).await.unwrap(), 0);
    assert!(connection.statements().is_empty());

    assert_eq!(related.attach(&db, [7, 8]).await.unwrap(), 2);
    let statements = connection.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements
        .iter()
        .all(|s| s.sql == "INSERT INTO post_tag (post_id, tag_id) VALUES (?, ?)"));
    assert_eq!(statements[0].binds, vec![Value::Int(9), Value::Int(7)]);
    assert_eq!(statements[1].binds, vec![Value::Int(9), Value::Int(8)]);
}

#[tokio::test]
async fn test_sync_deletes_missing_and_inserts_new() {
    let connection = RecordingConnection::mysql();
    connection.push_rows(tag_rows(&[1, 2, 3]));
    let db = dev(&connection);

    let plan = post(9)
        .related("post_tag", "post_id", "tag_id")
        .sync(&db, [2, 3, 4])
        .await
        .unwrap();

    assert_eq!(
        plan,
        SyncPlan {
            detach: vec![LinkKey::Int(1)],
            attach: vec![LinkKey::Int(4)],
        }
    );
    let statements = connection.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0].sql, "SELECT tag_id FROM post_tag WHERE post_id = ?");
    assert_eq!(statements[1].sql, "DELETE FROM post_tag WHERE post_id = ? AND tag_id IN (?)");
    assert_eq!(statements[1].binds, vec![Value::Int(9), Value::Int(1)]);
    assert_eq!(statements[2].sql, "INSERT INTO post_tag (post_id, tag_id) VALUES (?, ?)");
    assert_eq!(statements[2].binds, vec![Value::Int(9), Value::Int(4)]);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let connection = RecordingConnection::mysql();
    connection.push_rows(tag_rows(&[2, 3, 4]));
    let db = dev(&connection);

    let plan = post(9)
        .related("post_tag", "post_id", "tag_id")
        .sync(&db, [4, 3, 2, 2])
        .await
        .unwrap();

    assert!(plan.is_noop());
    assert_eq!(connection.statements().len(), 1);
}

#[tokio::test]
async fn test_sync_to_empty_set_detaches_everything() {
    let connection = RecordingConnection::postgres();
    connection.push_rows(tag_rows(&[5, 6]));
    let db = dev(&connection);

    let plan = post(9)
        .related("post_tag", "post_id", "tag_id")
        .sync(&db, Vec::<i64>::new())
        .await
        .unwrap();

    assert_eq!(plan.detach.len(), 2);
    let last = connection.last_statement().unwrap();
    assert_eq!(last.sql, "DELETE FROM post_tag WHERE post_id = $1 AND tag_id IN ($2, $3)");
}

#[tokio::test]
async fn test_sync_without_parent_key() {
    let connection = RecordingConnection::mysql();
    let unsaved = Post::default();

    let err = unsaved
        .related("post_tag", "post_id", "tag_id")
        .sync(&dev(&connection), [1])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Configuration(_)));

    let plan = unsaved
        .related("post_tag", "post_id", "tag_id")
        .sync(&prod(&connection), [1])
        .await
        .unwrap();
    assert!(plan.is_noop());
    assert!(connection.statements().is_empty());
}

fn code_rows(codes: &[&str]) -> Vec<Row> {
    codes.iter().map(|code| Row::new().with("tag_code", *code)).collect()
}

#[tokio::test]
async fn test_sync_compares_text_keys_verbatim() {
    let connection = RecordingConnection::mysql();
    connection.push_rows(code_rows(&["7"]));
    let db = dev(&connection);

    let plan = post(9)
        .related("post_tag", "post_id", "tag_code")
        .sync(&db, ["007", "0042"])
        .await
        .unwrap();

    assert_eq!(plan.detach, vec![LinkKey::Text("7".into())]);
    assert_eq!(plan.attach.len(), 2);
    let statements = connection.statements();
    assert_eq!(statements[1].binds, vec![Value::Int(9), Value::from("7")]);
    assert_eq!(statements[2].binds, vec![Value::Int(9), Value::from("0042")]);
    assert_eq!(statements[3].binds, vec![Value::Int(9), Value::from("007")]);
}

#[tokio::test]
async fn test_sync_binds_uuid_keys_natively() {
    let kept = Uuid::from_u128(1);
    let dropped = Uuid::from_u128(2);
    let added = Uuid::from_u128(3);
    let connection = RecordingConnection::postgres();
    connection.push_rows(vec![
        Row::new().with("tag_id", kept),
        Row::new().with("tag_id", dropped),
    ]);
    let db = dev(&connection);

    let plan = post(9)
        .related("post_tag", "post_id", "tag_id")
        .sync(&db, [kept, added])
        .await
        .unwrap();

    assert_eq!(plan.detach.len(), 1);
    assert_eq!(plan.attach.len(), 1);
    let statements = connection.statements();
    assert_eq!(statements[1].sql, "DELETE FROM post_tag WHERE post_id = $1 AND tag_id IN ($2)");
    assert_eq!(statements[1].binds, vec![Value::Int(9), Value::Uuid(dropped)]);
    assert_eq!(statements[2].binds, vec![Value::Int(9), Value::Uuid(added)]);
}

#[tokio::test]
async fn test_sync_matches_uuids_stored_as_text() {
    let id = Uuid::from_u128(0xabc);
    let connection = RecordingConnection::mysql();
    connection.push_rows(vec![Row::new().with("tag_id", id.hyphenated().to_string())]);
    let db = dev(&connection);

    let plan = post(9)
        .related("post_tag", "post_id", "tag_id")
        .sync(&db, [id])
        .await
        .unwrap();

    assert!(plan.is_noop());
    assert_eq!(connection.statements().len(), 1);
}

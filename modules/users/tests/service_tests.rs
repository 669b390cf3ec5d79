mod common;

use common::{module, module_with, new_user, test_user};
use users::config::UsersConfig;
use users::contract::model::{UniqueField, UserPatch};
use users::domain::error::{DomainError, UserKey};

#[tokio::test]
async fn create_assigns_id_and_defaults() {
    let m = module().await;
    let svc = m.service();

    let user = svc.create_user(test_user()).await.unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.username, "testuser");
    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.full_name, "Test User");
    assert!(user.is_active);
    assert_eq!(user.created_at, user.updated_at);

    let second = svc
        .create_user(new_user("another", "another@example.com", "Another One"))
        .await
        .unwrap();
    assert!(second.id > user.id);
}

#[tokio::test]
async fn get_is_idempotent_and_matches_created() {
    let m = module().await;
    let svc = m.service();
    let created = svc.create_user(test_user()).await.unwrap();

    let first = svc.get_user(created.id).await.unwrap();
    let second = svc.get_user(created.id).await.unwrap();
    assert_eq!(first, created);
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_user_mentions_the_id() {
    let m = module().await;
    let err = m.service().get_user(999).await.unwrap_err();
    assert_eq!(
        err,
        DomainError::NotFound {
            key: UserKey::Id(999)
        }
    );
    assert!(err.to_string().contains("999"));
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected_by_field() {
    let m = module().await;
    let svc = m.service();
    svc.create_user(test_user()).await.unwrap();

    let err = svc
        .create_user(new_user("testuser", "other@example.com", "Other"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::already_exists(UniqueField::Username, "testuser")
    );

    let err = svc
        .create_user(new_user("otheruser", "test@example.com", "Other"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::already_exists(UniqueField::Email, "test@example.com")
    );

    assert_eq!(svc.get_all_active_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
    let m = module().await;
    let svc = m.service();

    for bad in [
        new_user("ab", "ab@example.com", "Too Short"),
        new_user("has space", "space@example.com", "Bad Chars"),
        new_user("validname", "not-an-email", "Bad Email"),
        new_user("validname", "valid@example.com", "   "),
        new_user("validname", "valid@example.com", &"x".repeat(101)),
        new_user(&"u".repeat(51), "long@example.com", "Too Long"),
    ] {
        let err = svc.create_user(bad).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }), "{err:?}");
    }

    assert!(svc.get_all_active_users().await.unwrap().is_empty());
    assert_eq!(svc.metrics().created_total(), 0);
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let m = module().await;
    let svc = m.service();
    let created = svc.create_user(test_user()).await.unwrap();

    let updated = svc
        .update_user(
            created.id,
            UserPatch {
                full_name: Some("Renamed User".into()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.username, created.username);
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.full_name, "Renamed User");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    assert_eq!(svc.get_user(created.id).await.unwrap(), updated);
}

#[tokio::test]
async fn update_to_own_values_is_not_a_conflict() {
    let m = module().await;
    let svc = m.service();
    let created = svc.create_user(test_user()).await.unwrap();

    let same = svc
        .update_user(
            created.id,
            UserPatch {
                username: Some(created.username.clone()),
                email: Some(created.email.clone()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.username, created.username);
}

#[tokio::test]
async fn update_into_taken_email_conflicts() {
    let m = module().await;
    let svc = m.service();
    svc.create_user(test_user()).await.unwrap();
    let other = svc
        .create_user(new_user("other", "other@example.com", "Other User"))
        .await
        .unwrap();

    let err = svc
        .update_user(
            other.id,
            UserPatch {
                email: Some("test@example.com".into()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::already_exists(UniqueField::Email, "test@example.com")
    );
    assert_eq!(svc.get_user(other.id).await.unwrap().email, "other@example.com");
}

#[tokio::test]
async fn update_of_missing_user_is_not_found() {
    let m = module().await;
    let err = m
        .service()
        .update_user(42, UserPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn deactivate_hides_from_active_list_but_keeps_record() {
    let m = module().await;
    let svc = m.service();
    let a = svc.create_user(test_user()).await.unwrap();
    let b = svc
        .create_user(new_user("second", "second@example.com", "Second User"))
        .await
        .unwrap();

    svc.deactivate_user(a.id).await.unwrap();

    let fetched = svc.get_user(a.id).await.unwrap();
    assert!(!fetched.is_active);
    assert!(fetched.updated_at > a.updated_at);

    let active = svc.get_all_active_users().await.unwrap();
    assert_eq!(active.iter().map(|u| u.id).collect::<Vec<_>>(), vec![b.id]);

    // Deactivating twice still succeeds.
    svc.deactivate_user(a.id).await.unwrap();
    assert!(matches!(
        svc.deactivate_user(999).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn reactivation_through_update() {
    let m = module().await;
    let svc = m.service();
    let user = svc.create_user(test_user()).await.unwrap();
    svc.deactivate_user(user.id).await.unwrap();

    let back = svc
        .update_user(
            user.id,
            UserPatch {
                is_active: Some(true),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(back.is_active);
    assert_eq!(svc.get_all_active_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn name_search_is_case_sensitive_and_includes_inactive() {
    let m = module().await;
    let svc = m.service();
    let john = svc
        .create_user(new_user("john", "john@example.com", "John Smith"))
        .await
        .unwrap();
    let johnny = svc
        .create_user(new_user("johnny", "johnny@example.com", "Johnny Walker"))
        .await
        .unwrap();
    svc.create_user(new_user("mary", "mary@example.com", "Mary Jones"))
        .await
        .unwrap();
    svc.deactivate_user(johnny.id).await.unwrap();

    let found = svc.search_users_by_name("John").await.unwrap();
    assert_eq!(
        found.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![john.id, johnny.id]
    );

    assert!(svc.search_users_by_name("john").await.unwrap().is_empty());
    assert!(svc.search_users_by_name("Nobody").await.unwrap().is_empty());
    assert_eq!(svc.search_users_by_name("").await.unwrap().len(), 3);
}

#[tokio::test]
async fn async_lookup_matches_sync_lookup() {
    let m = module().await;
    let svc = m.service();
    svc.create_user(test_user()).await.unwrap();

    let sync = svc.get_user_by_username("testuser").await.unwrap();
    let pending = svc.get_user_by_username_async("testuser");
    let asynced = pending.await.unwrap();
    assert_eq!(sync, asynced);

    let err = svc.get_user_by_username_async("ghost").await.unwrap_err();
    assert_eq!(
        err,
        DomainError::NotFound {
            key: UserKey::Username("ghost".into())
        }
    );
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn async_lookup_after_shutdown_is_unavailable() {
    let m = module().await;
    let svc = m.service();
    svc.create_user(test_user()).await.unwrap();
    m.shutdown().await;

    let err = svc.get_user_by_username_async("testuser").await.unwrap_err();
    assert!(matches!(err, DomainError::Unavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn cache_serves_repeat_reads() {
    let m = module().await;
    let svc = m.service();
    let user = svc.create_user(test_user()).await.unwrap();
    svc.clear_cache();

    svc.get_user(user.id).await.unwrap();
    svc.get_user(user.id).await.unwrap();

    let stats = svc.cache_stats();
    assert!(stats.enabled);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn disabled_cache_still_returns_fresh_data() {
    let mut cfg = UsersConfig::default();
    cfg.cache.enabled = false;
    let m = module_with(cfg).await;
    let svc = m.service();
    let user = svc.create_user(test_user()).await.unwrap();

    svc.deactivate_user(user.id).await.unwrap();
    assert!(!svc.get_user(user.id).await.unwrap().is_active);
    let stats = svc.cache_stats();
    assert!(!stats.enabled);
    assert_eq!(stats.entries, 0);
}

#[tokio::test]
async fn custom_validation_limits_apply() {
    let mut cfg = UsersConfig::default();
    cfg.validation.min_username_len = 5;
    let m = module_with(cfg).await;

    let err = m
        .service()
        .create_user(new_user("abcd", "abcd@example.com", "Four"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "username"));
}

//! Tests for the front-end request handlers

use async_trait::async_trait;
use imagine_gate::config::SerializerConfig;
use imagine_gate::core::job::{DEFAULT_NEGATIVE, LOGO_NEGATIVE, LOGO_SUFFIX};
use imagine_gate::core::{
    AuthorizationStore, ComputeError, Image, ImageGenerator, JobSerializer, Preset,
    WhitelistError, WhitelistOutcome,
};
use imagine_gate::infra::InMemoryBackend;
use imagine_gate::runtime::{
    health, imagine, lookup, manage_add, manage_remove, manage_update, redo, whitelist_page,
    ApiError,
};
use imagine_gate::util::PermissionTier;

const OWNER: u64 = 1;

/// Returns the prompts it was called with, so callers can see what ran.
struct PromptEcho;

#[async_trait]
impl ImageGenerator for PromptEcho {
    async fn generate(&self, positive: &str, negative: &str) -> Result<Image, ComputeError> {
        Ok(Image::new(format!("{positive}|{negative}").into_bytes()))
    }
}

fn store() -> AuthorizationStore {
    AuthorizationStore::open(InMemoryBackend::new(), OWNER).unwrap()
}

fn serializer() -> JobSerializer {
    JobSerializer::new(SerializerConfig::new(), PromptEcho).unwrap()
}

#[test]
fn test_manage_add_defaults_to_user_tier() {
    let store = store();
    assert_eq!(
        manage_add(&store, OWNER, 2, None, 5.0).unwrap(),
        WhitelistOutcome::Added
    );
    assert_eq!(store.get(2).unwrap().tier, PermissionTier::User);
}

#[test]
fn test_manage_commands_reject_self_target() {
    let store = store();
    assert_eq!(
        manage_add(&store, OWNER, OWNER, None, 5.0),
        Err(ApiError::SelfTarget)
    );
    assert_eq!(manage_remove(&store, OWNER, OWNER), Err(ApiError::SelfTarget));
    assert_eq!(
        manage_update(&store, OWNER, OWNER, PermissionTier::User, 5.0),
        Err(ApiError::SelfTarget)
    );
    assert_eq!(store.get(OWNER).unwrap().tier, PermissionTier::Sudo);
}

#[test]
fn test_manage_commands_need_moderator() {
    let store = store();
    manage_add(&store, OWNER, 2, None, 5.0).unwrap();

    assert_eq!(
        manage_add(&store, 2, 3, None, 6.0),
        Err(ApiError::CommandNotAllowed)
    );
    assert_eq!(manage_remove(&store, 99, 2), Err(ApiError::CommandNotAllowed));
    assert_eq!(lookup(&store, 2, OWNER), Err(ApiError::CommandNotAllowed));
    assert!(matches!(
        whitelist_page(&store, 2, 0, 10),
        Err(ApiError::CommandNotAllowed)
    ));
}

#[test]
fn test_store_rejections_pass_through() {
    let store = store();
    manage_add(&store, OWNER, 2, Some(PermissionTier::Moderator), 5.0).unwrap();

    assert_eq!(
        manage_add(&store, 2, 3, Some(PermissionTier::Sudo), 6.0),
        Err(ApiError::Whitelist(WhitelistError::NotPermitted))
    );
    assert_eq!(
        manage_remove(&store, 2, 3),
        Err(ApiError::Whitelist(WhitelistError::NotWhitelisted))
    );
    assert_eq!(
        manage_update(&store, 2, OWNER, PermissionTier::User, 6.0),
        Err(ApiError::Whitelist(WhitelistError::NotPermitted))
    );
}

#[test]
fn test_lookup() {
    let store = store();
    manage_add(&store, OWNER, 2, None, 5.0).unwrap();

    let entry = lookup(&store, OWNER, 2).unwrap();
    assert_eq!(entry.granted_by, OWNER);
    assert_eq!(entry.granted_at, 5.0);
    assert_eq!(lookup(&store, OWNER, 3), Err(ApiError::NotFound));
}

#[test]
fn test_whitelist_page_sorts_and_wraps() {
    let store = store();
    for user in 10..15 {
        manage_add(&store, OWNER, user, None, 5.0).unwrap();
    }
    manage_add(&store, OWNER, 20, Some(PermissionTier::Moderator), 5.0).unwrap();

    let first = whitelist_page(&store, OWNER, 0, 3).unwrap();
    assert_eq!(first.page_count, 3);
    assert_eq!(first.page, 0);
    let tiers: Vec<_> = first.entries.iter().map(|e| e.tier).collect();
    assert_eq!(
        tiers,
        vec![
            PermissionTier::Sudo,
            PermissionTier::Moderator,
            PermissionTier::User
        ]
    );

    let last = whitelist_page(&store, OWNER, -1, 3).unwrap();
    assert_eq!(last.page, 2);
    assert_eq!(last.entries.len(), 1);

    let wrapped = whitelist_page(&store, OWNER, 3, 3).unwrap();
    assert_eq!(wrapped.page, 0);
    assert_eq!(wrapped.entries, first.entries);
}

#[tokio::test]
async fn test_imagine_requires_whitelist() {
    let store = store();
    let serializer = serializer();

    let result = imagine(
        &store,
        &serializer,
        7,
        Preset::Realistic {
            prompt: "a cat".into(),
        },
        1.0,
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotAllowed)));
    assert_eq!(serializer.stats().submitted, 0);
}

#[tokio::test]
async fn test_imagine_and_redo() {
    let store = store();
    let serializer = serializer();
    manage_add(&store, OWNER, 2, None, 5.0).unwrap();

    let response = imagine(
        &store,
        &serializer,
        2,
        Preset::Logo {
            prompt: "a fox".into(),
        },
        6.0,
    )
    .await
    .unwrap();

    let expected = format!("a fox{LOGO_SUFFIX}|{LOGO_NEGATIVE}");
    assert_eq!(response.image.bytes, expected.as_bytes());
    assert_eq!(response.jobs_ahead, 0);
    assert_eq!(response.redo.display.positive, "a fox");
    assert_eq!(response.redo.submitted_by, 2);

    // Another whitelisted user may redo; an outsider may not.
    let again = redo(&store, &serializer, OWNER, &response.redo, 7.0)
        .await
        .unwrap();
    assert_eq!(again.image, response.image);
    assert_eq!(again.redo.id, response.redo.id);

    manage_remove(&store, OWNER, 2).unwrap();
    assert!(matches!(
        redo(&store, &serializer, 2, &response.redo, 8.0).await,
        Err(ApiError::NotAllowed)
    ));
    assert_eq!(serializer.stats().completed, 2);
}

#[tokio::test]
async fn test_raw_preset_default_negative() {
    let store = store();
    let serializer = serializer();

    let response = imagine(
        &store,
        &serializer,
        OWNER,
        Preset::Raw {
            positive: "mountains".into(),
            negative: None,
        },
        1.0,
    )
    .await
    .unwrap();
    assert_eq!(
        response.image.bytes,
        format!("mountains|{DEFAULT_NEGATIVE}").as_bytes()
    );
    assert_eq!(response.redo.display.negative, None);
}

#[test]
fn test_health() {
    let store = store();
    let serializer = serializer();
    manage_add(&store, OWNER, 2, None, 5.0).unwrap();

    let h = health(&store, &serializer);
    assert!(h.ok);
    assert_eq!(h.queue_depth, 0);
    assert_eq!(h.whitelisted, 2);
}

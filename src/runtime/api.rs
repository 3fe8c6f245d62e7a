//! Request handlers called by the chat front end.
//!
//! These wrap the store and the serializer with the command-level rules of
//! the bot: management commands need tier 2, nobody may target themselves,
//! and listing is paged. Formatting the results is left to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    AuthorizationStore, Image, JobError, JobSerializer, Preset, RedoToken, WhitelistEntry,
    WhitelistError, WhitelistOutcome,
};
use crate::util::serde::{ActorId, PermissionTier, UnixSeconds};

/// Errors surfaced to the chat front end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Caller is not whitelisted for image generation.
    #[error("you are not allowed to use imagine commands")]
    NotAllowed,
    /// Caller lacks tier 2 for management commands.
    #[error("you are not allowed to use this command")]
    CommandNotAllowed,
    /// Caller targeted themselves.
    #[error("you cannot target yourself")]
    SelfTarget,
    /// Looked-up actor is not whitelisted.
    #[error("user not found")]
    NotFound,
    /// Rejected by the store.
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),
    /// Job failed.
    #[error(transparent)]
    Job(#[from] JobError),
}

/// One page of the whitelist listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistPage {
    /// Entries on this page, highest tier first.
    pub entries: Vec<WhitelistEntry>,
    /// Zero-based page index actually returned.
    pub page: usize,
    /// Total number of pages.
    pub page_count: usize,
}

/// Result of an image request.
#[derive(Debug, Clone)]
pub struct ImagineResponse {
    /// Generated image.
    pub image: Image,
    /// Token to run the same request again.
    pub redo: RedoToken,
    /// Jobs already admitted when this one was submitted.
    pub jobs_ahead: usize,
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Jobs admitted but not yet completed.
    pub queue_depth: usize,
    /// Whitelisted actors.
    pub whitelisted: usize,
}

fn require_manager(store: &AuthorizationStore, caller: ActorId) -> Result<(), ApiError> {
    match store.get(caller) {
        Some(entry) if entry.tier.can_manage() => Ok(()),
        _ => Err(ApiError::CommandNotAllowed),
    }
}

fn require_other(caller: ActorId, target: ActorId) -> Result<(), ApiError> {
    if caller == target {
        Err(ApiError::SelfTarget)
    } else {
        Ok(())
    }
}

/// Whitelist `target`; the tier defaults to [`PermissionTier::User`].
///
/// # Errors
///
/// `CommandNotAllowed`, `SelfTarget`, or the store's rejection.
pub fn manage_add(
    store: &AuthorizationStore,
    caller: ActorId,
    target: ActorId,
    tier: Option<PermissionTier>,
    at: UnixSeconds,
) -> Result<WhitelistOutcome, ApiError> {
    require_manager(store, caller)?;
    require_other(caller, target)?;
    Ok(store.add(target, tier.unwrap_or(PermissionTier::User), caller, at)?)
}

/// Remove `target` from the whitelist.
///
/// # Errors
///
/// `CommandNotAllowed`, `SelfTarget`, or the store's rejection.
pub fn manage_remove(
    store: &AuthorizationStore,
    caller: ActorId,
    target: ActorId,
) -> Result<WhitelistOutcome, ApiError> {
    require_manager(store, caller)?;
    require_other(caller, target)?;
    Ok(store.remove(target, caller)?)
}

/// Set the tier of `target`.
///
/// # Errors
///
/// `CommandNotAllowed`, `SelfTarget`, or the store's rejection.
pub fn manage_update(
    store: &AuthorizationStore,
    caller: ActorId,
    target: ActorId,
    tier: PermissionTier,
    at: UnixSeconds,
) -> Result<WhitelistOutcome, ApiError> {
    require_manager(store, caller)?;
    require_other(caller, target)?;
    Ok(store.update(target, tier, caller, at)?)
}

/// Entry of `target`, for managers.
///
/// # Errors
///
/// `CommandNotAllowed` or `NotFound`.
pub fn lookup(
    store: &AuthorizationStore,
    caller: ActorId,
    target: ActorId,
) -> Result<WhitelistEntry, ApiError> {
    require_manager(store, caller)?;
    store.get(target).ok_or(ApiError::NotFound)
}

/// Page `page` of the whitelist, highest tier first. The page index wraps
/// around, so paging past either end cycles.
///
/// # Errors
///
/// `CommandNotAllowed` when the caller is below tier 2.
pub fn whitelist_page(
    store: &AuthorizationStore,
    caller: ActorId,
    page: isize,
    page_size: usize,
) -> Result<WhitelistPage, ApiError> {
    require_manager(store, caller)?;

    let mut entries = store.snapshot();
    entries.sort_by(|a, b| b.tier.cmp(&a.tier));

    let page_size = page_size.max(1);
    let page_count = entries.len().div_ceil(page_size);
    if page_count == 0 {
        return Ok(WhitelistPage {
            entries: Vec::new(),
            page: 0,
            page_count: 0,
        });
    }

    let page = wrap_page(page, page_count);
    let entries = entries
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .collect();
    Ok(WhitelistPage {
        entries,
        page,
        page_count,
    })
}

fn wrap_page(page: isize, page_count: usize) -> usize {
    let count = isize::try_from(page_count).unwrap_or(isize::MAX);
    usize::try_from(page.rem_euclid(count)).unwrap_or_default()
}

/// Generate an image for `caller` from `preset`.
///
/// # Errors
///
/// `NotAllowed` if the caller is not whitelisted, or the job failure.
pub async fn imagine(
    store: &AuthorizationStore,
    serializer: &JobSerializer,
    caller: ActorId,
    preset: Preset,
    at: UnixSeconds,
) -> Result<ImagineResponse, ApiError> {
    if !store.can_invoke(caller) {
        return Err(ApiError::NotAllowed);
    }
    let (job, display) = preset.into_job(caller, at);
    let redo = RedoToken::capture_with_display(&job, display);
    let jobs_ahead = serializer.queue_depth();
    let image = serializer.submit(job).await?;
    Ok(ImagineResponse {
        image,
        redo,
        jobs_ahead,
    })
}

/// Run a captured request again on behalf of `caller`.
///
/// The caller's own standing is checked, not the original submitter's.
///
/// # Errors
///
/// `NotAllowed` if the caller is not whitelisted, or the job failure.
pub async fn redo(
    store: &AuthorizationStore,
    serializer: &JobSerializer,
    caller: ActorId,
    token: &RedoToken,
    at: UnixSeconds,
) -> Result<ImagineResponse, ApiError> {
    if !store.can_invoke(caller) {
        return Err(ApiError::NotAllowed);
    }
    let jobs_ahead = serializer.queue_depth();
    let image = serializer.redo(token, caller, at).await?;
    Ok(ImagineResponse {
        image,
        redo: token.clone(),
        jobs_ahead,
    })
}

/// Return a health payload.
#[must_use]
pub fn health(store: &AuthorizationStore, serializer: &JobSerializer) -> Health {
    Health {
        ok: true,
        queue_depth: serializer.queue_depth(),
        whitelisted: store.len(),
    }
}

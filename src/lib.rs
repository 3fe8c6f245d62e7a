//! # Imagine Gate
//!
//! Access control and single-flight scheduling for a shared image generation
//! model.
//!
//! A chat bot that fronts one GPU-bound diffusion model needs two things
//! before it can accept requests from many users:
//!
//! - **Who may ask**: a persisted, three-tier whitelist. Tier 1 may generate
//!   images, tier 2 may additionally manage tier-1 users, tier 3 may manage
//!   everyone up to tier 2. Nobody may grant or touch a tier above their own.
//! - **One at a time**: the model cannot run two generations concurrently.
//!   Requests queue behind a single execution permit while a live counter
//!   tells users how many jobs are ahead of them. Finished requests can be
//!   re-run from a redo token carrying the exact original prompts.
//!
//! ## AuthorizationStore
//!
//! ```rust,ignore
//! use imagine_gate::core::AuthorizationStore;
//! use imagine_gate::infra::JsonFileBackend;
//! use imagine_gate::util::PermissionTier;
//!
//! // Creates whitelist.json with the owner at tier 3 on first start.
//! // A corrupt document is reported, never overwritten.
//! let store = AuthorizationStore::open(JsonFileBackend::new("whitelist.json"), owner_id)?;
//!
//! store.add(friend_id, PermissionTier::User, owner_id, now)?;
//! assert!(store.can_invoke(friend_id));
//! ```
//!
//! ## JobSerializer
//!
//! ```rust,ignore
//! use imagine_gate::config::SerializerConfig;
//! use imagine_gate::core::{Job, JobSerializer};
//!
//! let serializer = JobSerializer::new(SerializerConfig::new(), my_generator)?;
//!
//! let job = Job::new("a lighthouse at dusk", "blurry", user_id, now);
//! let token = serializer.make_redo_token(&job);
//! println!("{} jobs ahead of you", serializer.queue_depth());
//! let image = serializer.submit(job).await?;
//!
//! // Same prompts, fresh generation.
//! let again = serializer.redo(&token, user_id, later).await?;
//! ```
//!
//! ## Wiring
//!
//! `builders::build_gate` assembles both components from a `GateConfig`, and
//! `runtime::api` holds the command-level handlers (self-targeting checks,
//! paged listing, presets) a chat front end calls into.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Whitelist, job serializer and their shared types.
pub mod core;
/// Configuration models for the gate and the compute worker.
pub mod config;
/// Builders to construct the gate from configuration.
pub mod builders;
/// Persistence backends for the whitelist.
pub mod infra;
/// Handlers exposed to the chat front end.
pub mod runtime;
/// Shared utilities.
pub mod util;

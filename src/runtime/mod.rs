//! Request handlers exposed to the chat front end.

pub mod api;

pub use api::{
    health, imagine, lookup, manage_add, manage_remove, manage_update, redo, whitelist_page,
    ApiError, Health, ImagineResponse, WhitelistPage,
};

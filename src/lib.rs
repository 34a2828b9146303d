//! whitelist-engine - named, togglable whitelist groups.
//!
//! Each group holds two independent many-to-many relation sets: tagged
//! entity references (users, channels, servers, roles, members) and
//! named exception records (commands or modules exempted from blocking).
//! Consumers ask "is this entity, for this exception name, covered by
//! any enabled group" and manage membership in bulk.
//!
//! The crate exposes method-call operations only; command parsing and
//! presentation live with the embedding application. Entity identifiers
//! stay raw except where a listing passes them through the
//! [`render::EntityRenderer`] hook.
//!
//! ```no_run
//! use whitelist_engine::{Database, EntityKind, ExceptionKind, WhitelistService};
//!
//! # async fn example() -> Result<(), whitelist_engine::DbError> {
//! let db = Database::new("whitelist.db").await?;
//! let svc = WhitelistService::new(db);
//!
//! svc.create_group("vip").await?;
//! svc.add_members("vip", EntityKind::User, &[111]).await?;
//! svc.add_exceptions("vip", ExceptionKind::Command, &["play"]).await?;
//!
//! assert!(
//!     svc.is_exempted_anywhere_enabled("play", ExceptionKind::Command, 111, EntityKind::User)
//!         .await?
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod page;
pub mod render;
pub mod service;
pub mod types;

pub use config::{Config, ConfigError, DatabaseConfig};
pub use db::{Database, DbError, Exception, ExceptionUsage, Group, Member};
pub use render::{EntityRenderer, RawRenderer};
pub use service::{Listing, WhitelistService};
pub use types::{EntityKind, ExceptionKind};

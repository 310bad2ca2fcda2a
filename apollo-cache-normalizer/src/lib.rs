//! Normalizes GraphQL results into an entity-keyed client cache store.
//!
//! A result tree is flattened so that every object reached through a field with
//! sub-selections is stored exactly once, under its data identity, and every place that held
//! the object holds its identity instead:
//!
//! ```text
//! { id: "abcd", nestedObj: { stringField: "x" } }
//!
//! abcd           => { id: "abcd", nestedObj: "abcd.nestedObj" }
//! abcd.nestedObj => { stringField: "x" }
//! ```
//!
//! Objects carrying an `id` are stored under it; other objects get an identity derived from
//! their parent's identity and the field (and list index) they were reached through.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(unreachable_pub)]

pub mod json_ext;

mod configuration;
mod error;
mod identity;
mod normalize;
mod spec;
mod store;

pub use configuration::Configuration;
pub use configuration::ConfigurationError;
pub use configuration::RecordKeys;
pub use error::Error;
pub use error::NormalizeError;
pub use error::Shape;
pub use identity::DEFAULT_ID_FIELD;
pub use identity::DataId;
pub use identity::IdField;
pub use identity::IdentityKind;
pub use identity::IdentityResolver;
pub use identity::ROOT_QUERY;
pub use identity::resolve_identity;
pub use normalize::Normalizer;
pub use spec::Query;
pub use spec::Selection;
pub use spec::SpecError;
pub use store::Store;

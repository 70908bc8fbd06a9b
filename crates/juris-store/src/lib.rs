//! # juris-store
//!
//! Read side of the notification service. [`RecipientQuery`] applies the
//! eligibility windows; [`SupabaseStore`] talks to PostgREST; [`InMemoryStore`]
//! is a test double with the same filtering rules.

pub mod memory;
pub mod query;
pub mod supabase;

pub use memory::InMemoryStore;
pub use query::{RecipientBatch, RecipientQuery, WeeklyBatch};
pub use supabase::SupabaseStore;

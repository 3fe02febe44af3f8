//! Record store traits.
//!
//! These traits abstract over the relational store (PostgreSQL in
//! production, an in-memory map in tests). Every implementation must keep
//! the invariants stated on each method; the services rely on them.

use crate::analytics::DateRange;
use crate::drug::{Drug, DrugDeletion, DrugId, ValidDrugPatch};
use crate::error::Result;
use crate::sale::{NewSale, Sale};
use crate::user::{Role, User, UserId, UserRecord};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Drug inventory storage.
pub trait DrugRepository: Send + Sync {
    /// All drugs, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn list_drugs(&self) -> impl Future<Output = Result<Vec<Drug>>> + Send;

    /// One drug, if it exists.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn get_drug(&self, id: DrugId) -> impl Future<Output = Result<Option<Drug>>> + Send;

    /// Insert a validated drug.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn insert_drug(&self, drug: &Drug) -> impl Future<Output = Result<Drug>> + Send;

    /// Apply a validated patch to the current row, atomically.
    ///
    /// The read and the write must not interleave with a concurrent sale's
    /// stock decrement.
    ///
    /// # Errors
    ///
    /// - Drug absent → `PharmacyError::NotFound`
    /// - Store unreachable → `PharmacyError::Internal`
    fn update_drug(
        &self,
        id: DrugId,
        patch: &ValidDrugPatch,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Drug>> + Send;

    /// Delete a drug together with every sale item that references it.
    ///
    /// Parent sale totals are left untouched.
    ///
    /// # Errors
    ///
    /// - Drug absent → `PharmacyError::NotFound`
    /// - Store unreachable → `PharmacyError::Internal`
    fn delete_drug(&self, id: DrugId) -> impl Future<Output = Result<DrugDeletion>> + Send;

    /// Number of drugs in inventory.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn count_drugs(&self) -> impl Future<Output = Result<u64>> + Send;
}

/// Sale storage.
pub trait SaleRepository: Send + Sync {
    /// Create a sale atomically.
    ///
    /// Implementations must read the referenced drugs, run
    /// [`plan_sale`](crate::sale::plan_sale) on them, insert the sale and its
    /// items, and decrement stock as one all-or-nothing unit. Concurrent
    /// calls against the same drug must serialize so that stock is never
    /// observably negative; a race lost at write time is reported as
    /// `PharmacyError::InsufficientStock` with nothing persisted.
    ///
    /// # Errors
    ///
    /// Everything [`plan_sale`](crate::sale::plan_sale) reports, plus
    /// `PharmacyError::Internal` for store failures.
    fn create_sale(&self, sale: &NewSale) -> impl Future<Output = Result<Sale>> + Send;

    /// All sales with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn list_sales(&self) -> impl Future<Output = Result<Vec<Sale>>> + Send;

    /// Sales (with items) created inside the inclusive window.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn sales_between(&self, range: DateRange) -> impl Future<Output = Result<Vec<Sale>>> + Send;
}

/// Staff account storage.
pub trait UserRepository: Send + Sync {
    /// All accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// One account by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn get_user(&self, id: UserId) -> impl Future<Output = Result<Option<User>>> + Send;

    /// One account with its password hash, by email.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>>> + Send;

    /// Insert an account.
    ///
    /// # Errors
    ///
    /// - Email already used → `PharmacyError::Conflict`
    /// - Store unreachable → `PharmacyError::Internal`
    fn insert_user(&self, record: &UserRecord) -> impl Future<Output = Result<User>> + Send;

    /// Change an account's role.
    ///
    /// # Errors
    ///
    /// - Account absent → `PharmacyError::NotFound`
    /// - Store unreachable → `PharmacyError::Internal`
    fn update_role(&self, id: UserId, role: Role) -> impl Future<Output = Result<User>> + Send;
}

/// A persisted sign-in session.
///
/// Only the digest of the bearer token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// SHA-256 of the bearer token, hex encoded
    pub token_hash: String,
    /// Account
    pub user_id: UserId,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}

/// Session storage.
pub trait SessionRepository: Send + Sync {
    /// Persist a new session.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn create_session(&self, session: &Session) -> impl Future<Output = Result<()>> + Send;

    /// Look up a session by token digest (expired sessions included).
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn find_session(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = Result<Option<Session>>> + Send;

    /// Remove a session. Removing an unknown session is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn delete_session(&self, token_hash: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Everything the HTTP layer needs from one store.
pub trait PharmacyStore:
    DrugRepository + SaleRepository + UserRepository + SessionRepository + Clone + 'static
{
    /// Cheap round-trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}

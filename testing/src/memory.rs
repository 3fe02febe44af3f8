//! In-memory implementation of every repository trait.

use chrono::{DateTime, Utc};
use pharmacy_core::analytics::DateRange;
use pharmacy_core::drug::{Drug, DrugDeletion, DrugId, ValidDrugPatch};
use pharmacy_core::repository::{
    DrugRepository, PharmacyStore, SaleRepository, Session, SessionRepository, UserRepository,
};
use pharmacy_core::sale::{plan_sale, NewSale, Sale};
use pharmacy_core::user::{Role, User, UserId, UserRecord};
use pharmacy_core::{PharmacyError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    drugs: Vec<Drug>,
    sales: Vec<Sale>,
    users: Vec<UserRecord>,
    sessions: HashMap<String, Session>,
}

/// In-memory store.
///
/// All state sits behind one mutex, so each operation (a sale creation in
/// particular) is atomic with respect to every other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| PharmacyError::Internal("in-memory store lock poisoned".to_string()))
    }

    /// Insert a drug row as-is.
    ///
    /// # Errors
    ///
    /// Only if the lock is poisoned.
    pub fn seed_drug(&self, drug: Drug) -> Result<Drug> {
        self.lock()?.drugs.push(drug.clone());
        Ok(drug)
    }

    /// Insert an account row as-is.
    ///
    /// # Errors
    ///
    /// Only if the lock is poisoned.
    pub fn seed_user(&self, record: UserRecord) -> Result<User> {
        let user = record.user.clone();
        self.lock()?.users.push(record);
        Ok(user)
    }

    /// Insert a sale row as-is, bypassing stock checks.
    ///
    /// # Errors
    ///
    /// Only if the lock is poisoned.
    pub fn seed_sale(&self, sale: Sale) -> Result<Sale> {
        self.lock()?.sales.push(sale.clone());
        Ok(sale)
    }

    /// Current stock of a drug, if it exists.
    ///
    /// # Errors
    ///
    /// Only if the lock is poisoned.
    pub fn stock_of(&self, id: DrugId) -> Result<Option<i32>> {
        Ok(self
            .lock()?
            .drugs
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.quantity))
    }

    /// Number of stored sessions, expired ones included.
    ///
    /// # Errors
    ///
    /// Only if the lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.sessions.len())
    }
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    // later inserts win ties
    rows.reverse();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

impl DrugRepository for InMemoryStore {
    fn list_drugs(&self) -> impl Future<Output = Result<Vec<Drug>>> + Send {
        let drugs = self
            .lock()
            .map(|state| newest_first(state.drugs.clone(), |d| d.created_at));
        async move { drugs }
    }

    fn get_drug(&self, id: DrugId) -> impl Future<Output = Result<Option<Drug>>> + Send {
        let drug = self
            .lock()
            .map(|state| state.drugs.iter().find(|d| d.id == id).cloned());
        async move { drug }
    }

    fn insert_drug(&self, drug: &Drug) -> impl Future<Output = Result<Drug>> + Send {
        let result = self.seed_drug(drug.clone());
        async move { result }
    }

    fn update_drug(
        &self,
        id: DrugId,
        patch: &ValidDrugPatch,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Drug>> + Send {
        let result = self.lock().and_then(|mut state| {
            let drug = state
                .drugs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| PharmacyError::not_found("Drug", id))?;
            patch.apply(drug, now);
            Ok(drug.clone())
        });
        async move { result }
    }

    fn delete_drug(&self, id: DrugId) -> impl Future<Output = Result<DrugDeletion>> + Send {
        let result = self.lock().and_then(|mut state| {
            let position = state
                .drugs
                .iter()
                .position(|d| d.id == id)
                .ok_or_else(|| PharmacyError::not_found("Drug", id))?;
            state.drugs.remove(position);

            let mut deleted_sale_items = 0u64;
            for sale in &mut state.sales {
                let before = sale.items.len();
                sale.items.retain(|item| item.drug_id != id);
                deleted_sale_items += (before - sale.items.len()) as u64;
            }

            Ok(DrugDeletion {
                drug_id: id,
                deleted_sale_items,
            })
        });
        async move { result }
    }

    fn count_drugs(&self) -> impl Future<Output = Result<u64>> + Send {
        let count = self.lock().map(|state| state.drugs.len() as u64);
        async move { count }
    }
}

impl SaleRepository for InMemoryStore {
    fn create_sale(&self, sale: &NewSale) -> impl Future<Output = Result<Sale>> + Send {
        let result = self.lock().and_then(|mut state| {
            let catalog: HashMap<DrugId, Drug> = state
                .drugs
                .iter()
                .filter(|d| sale.lines.iter().any(|line| line.drug_id == d.id))
                .map(|d| (d.id, d.clone()))
                .collect();

            let plan = plan_sale(&sale.lines, &catalog)?;
            for (drug_id, decrement) in &plan.decrements {
                if let Some(drug) = state.drugs.iter_mut().find(|d| d.id == *drug_id) {
                    drug.quantity -= decrement;
                    drug.updated_at = sale.created_at;
                }
            }

            let record = plan.into_sale(sale.id, sale.created_at);
            state.sales.push(record.clone());
            Ok(record)
        });
        async move { result }
    }

    fn list_sales(&self) -> impl Future<Output = Result<Vec<Sale>>> + Send {
        let sales = self
            .lock()
            .map(|state| newest_first(state.sales.clone(), |s| s.created_at));
        async move { sales }
    }

    fn sales_between(&self, range: DateRange) -> impl Future<Output = Result<Vec<Sale>>> + Send {
        let sales = self.lock().map(|state| {
            let in_range: Vec<Sale> = state
                .sales
                .iter()
                .filter(|s| range.contains(s.created_at))
                .cloned()
                .collect();
            newest_first(in_range, |s| s.created_at)
        });
        async move { sales }
    }
}

impl UserRepository for InMemoryStore {
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send {
        let users = self.lock().map(|state| {
            let users: Vec<User> = state.users.iter().map(|r| r.user.clone()).collect();
            newest_first(users, |u| u.created_at)
        });
        async move { users }
    }

    fn get_user(&self, id: UserId) -> impl Future<Output = Result<Option<User>>> + Send {
        let user = self.lock().map(|state| {
            state
                .users
                .iter()
                .find(|r| r.user.id == id)
                .map(|r| r.user.clone())
        });
        async move { user }
    }

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>>> + Send {
        let record = self
            .lock()
            .map(|state| state.users.iter().find(|r| r.user.email == email).cloned());
        async move { record }
    }

    fn insert_user(&self, record: &UserRecord) -> impl Future<Output = Result<User>> + Send {
        let result = self.lock().and_then(|mut state| {
            if state.users.iter().any(|r| r.user.email == record.user.email) {
                return Err(PharmacyError::Conflict("User already exists".to_string()));
            }
            state.users.push(record.clone());
            Ok(record.user.clone())
        });
        async move { result }
    }

    fn update_role(&self, id: UserId, role: Role) -> impl Future<Output = Result<User>> + Send {
        let result = self.lock().and_then(|mut state| {
            let record = state
                .users
                .iter_mut()
                .find(|r| r.user.id == id)
                .ok_or_else(|| PharmacyError::not_found("User", id))?;
            record.user.role = role;
            Ok(record.user.clone())
        });
        async move { result }
    }
}

impl SessionRepository for InMemoryStore {
    fn create_session(&self, session: &Session) -> impl Future<Output = Result<()>> + Send {
        let result = self.lock().map(|mut state| {
            state
                .sessions
                .insert(session.token_hash.clone(), session.clone());
        });
        async move { result }
    }

    fn find_session(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = Result<Option<Session>>> + Send {
        let session = self
            .lock()
            .map(|state| state.sessions.get(token_hash).cloned());
        async move { session }
    }

    fn delete_session(&self, token_hash: &str) -> impl Future<Output = Result<()>> + Send {
        let result = self.lock().map(|mut state| {
            state.sessions.remove(token_hash);
        });
        async move { result }
    }
}

impl PharmacyStore for InMemoryStore {
    fn ping(&self) -> impl Future<Output = Result<()>> + Send {
        let result = self.lock().map(|_| ());
        async move { result }
    }
}

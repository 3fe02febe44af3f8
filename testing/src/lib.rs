//! # Pharmacy Testing
//!
//! Test doubles and fixtures for the pharmacy point-of-sale.
//!
//! This crate provides:
//! - [`mocks::FixedClock`]: deterministic, manually advanced time
//! - [`InMemoryStore`]: every repository trait over one locked map
//! - [`fixtures`]: principals, drugs and accounts for common scenarios
//!
//! ## Example
//!
//! ```
//! use pharmacy_core::service::SalesService;
//! use pharmacy_core::sale::{CreateSale, SaleLine};
//! use pharmacy_testing::{fixtures, mocks::test_clock, InMemoryStore};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = InMemoryStore::new();
//! let drug = store.seed_drug(fixtures::drug("Paracetamol", "2.50", 10)).unwrap();
//! let sales = SalesService::new(store.clone(), Arc::new(test_clock()));
//!
//! let sale = sales
//!     .create(
//!         &fixtures::clerk(),
//!         CreateSale { items: vec![SaleLine { drug_id: drug.id, quantity: 4 }] },
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(sale.total.to_string(), "10.00");
//! # });
//! ```

mod memory;

pub use memory::InMemoryStore;

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use pharmacy_core::environment::Clock;
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until [`FixedClock::advance`] or
    /// [`FixedClock::set`] moves it. Clones share the same instant.
    ///
    /// # Example
    ///
    /// ```
    /// use pharmacy_testing::mocks::FixedClock;
    /// use pharmacy_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// assert_eq!(time1, clock.now());
    ///
    /// clock.advance(Duration::hours(1));
    /// assert_eq!(clock.now(), time1 + Duration::hours(1));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock to `time`.
        pub fn set(&self, time: DateTime<Utc>) {
            if let Ok(mut guard) = self.time.write() {
                *guard = time;
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            if let Ok(mut guard) = self.time.write() {
                *guard += by;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .read()
                .map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
        }
    }

    /// Create a default fixed clock for tests (2026-03-15 14:30:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-03-15T14:30:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Principals, records and request bodies for common scenarios.
pub mod fixtures {
    use chrono::Utc;
    use pharmacy_core::drug::{Drug, DrugId};
    use pharmacy_core::user::{Principal, Role, User, UserId, UserRecord};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    /// An administrator principal with a fresh id.
    #[must_use]
    pub fn admin() -> Principal {
        Principal {
            user_id: UserId::new(),
            role: Role::Admin,
        }
    }

    /// A sales-clerk principal with a fresh id.
    #[must_use]
    pub fn clerk() -> Principal {
        Principal {
            user_id: UserId::new(),
            role: Role::Sales,
        }
    }

    /// A drug row with the given name, price and stock.
    ///
    /// An unparseable `price` becomes zero.
    #[must_use]
    pub fn drug(name: &str, price: &str, quantity: i32) -> Drug {
        let now = Utc::now();
        let price = Decimal::from_str(price).map(pharmacy_core::money::to_currency);
        Drug {
            id: DrugId::new(),
            name: name.to_string(),
            category: None,
            price: price.unwrap_or_default(),
            quantity,
            expiry_date: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A stored account with an opaque (non-verifiable) password hash.
    #[must_use]
    pub fn user_record(name: &str, email: &str, role: Role) -> UserRecord {
        UserRecord {
            user: User {
                id: UserId::new(),
                name: name.to_string(),
                email: email.to_string(),
                role,
                created_at: Utc::now(),
            },
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$placeholder$placeholder".to_string(),
        }
    }
}

/// Install a test subscriber that honours `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Create a staff account from the command line.
//!
//! Used to bootstrap the first administrator, since `POST /api/users`
//! itself requires one.
//!
//! ```bash
//! PHARMACY_USER_PASSWORD='…' cargo run --bin create-user -- \
//!     --name "Head Pharmacist" --email admin@pharmacy.example --role ADMIN
//! ```

use clap::Parser;
use pharmacy_auth::AuthService;
use pharmacy_core::environment::SystemClock;
use pharmacy_core::user::NewUser;
use pharmacy_core::PharmacyError;
use pharmacy_server::{init_tracing, open_store, Config};
use std::process::ExitCode;
use std::sync::Arc;

/// Create a pharmacy staff account.
#[derive(Debug, Parser)]
#[command(name = "create-user", version, about)]
struct Args {
    /// Display name
    #[arg(long)]
    name: String,

    /// Sign-in email
    #[arg(long)]
    email: String,

    /// ADMIN or SALES
    #[arg(long, default_value = "SALES")]
    role: String,

    /// Password (at least 8 characters)
    #[arg(long, env = "PHARMACY_USER_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env();

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Could not open the store");
            return ExitCode::FAILURE;
        }
    };

    let auth = AuthService::new(
        store.clone(),
        Arc::new(SystemClock),
        config.auth.auth_config(),
    );
    let result = auth
        .register(NewUser {
            name: args.name,
            email: args.email,
            password: args.password,
            role: Some(args.role),
        })
        .await;
    store.close().await;

    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Account created");
            ExitCode::SUCCESS
        }
        Err(PharmacyError::Conflict(message)) => {
            tracing::error!(%message, "An account with this email already exists");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Account not created");
            ExitCode::FAILURE
        }
    }
}

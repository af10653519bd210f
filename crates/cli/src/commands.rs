//! CLI commands

use anyhow::Result;
use clap::Subcommand;
use portal_client::{AuthApi, Credentials, RegistrationRequest, User, UserRole};
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the access token
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a new account
    Register {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// customer, designer, admin or tailor
        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Show the logged in user
    Whoami,

    /// Forget the stored access token
    Logout,

    /// Report whether an access token is stored
    Status,
}

impl Commands {
    pub async fn execute(self, api: &AuthApi, session_file: PathBuf) -> Result<()> {
        match self {
            Commands::Login { email, password } => {
                let credentials = Credentials::new(email, password);
                let response = api.login(&credentials).await?;
                info!(session = %session_file.display(), "Stored access token");
                println!(
                    "Logged in as {} ({} token saved)",
                    credentials.email, response.token_type
                );
                Ok(())
            }
            Commands::Register {
                email,
                password,
                first_name,
                last_name,
                role,
            } => {
                let request = RegistrationRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                    role,
                };
                let user = api.register(&request).await?;
                println!("Registered {}", describe(&user));
                Ok(())
            }
            Commands::Whoami => {
                let user = api.current_user().await?;
                println!("{}", serde_json::to_string_pretty(&user)?);
                Ok(())
            }
            Commands::Logout => {
                api.logout();
                println!("Logged out");
                Ok(())
            }
            Commands::Status => {
                if api.is_authenticated() {
                    println!("Logged in (session: {})", session_file.display());
                } else {
                    println!("Not logged in");
                }
                Ok(())
            }
        }
    }
}

fn describe(user: &User) -> String {
    match user.full_name() {
        Some(name) => format!("{name} <{}> as {}", user.email, user.role),
        None => format!("{} as {}", user.email, user.role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_user() {
        let user: User = serde_json::from_value(json!({
            "id": "1",
            "email": "t@example.com",
            "first_name": "Test",
            "role": "tailor"
        }))
        .unwrap();
        assert_eq!(describe(&user), "Test <t@example.com> as tailor");

        let user: User = serde_json::from_value(json!({"id": "2", "email": "c@example.com"})).unwrap();
        assert_eq!(describe(&user), "c@example.com as customer");
    }
}

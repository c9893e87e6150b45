use inquire::{Confirm, Password, PasswordDisplayMode, Text};

use super::credentials::{Credentials, delete_credentials, load_credentials, save_credentials};
use super::http_client::{ApiClient, ApiFailure};
use crate::types::User;

#[derive(serde::Serialize)]
struct RegisterRequest {
    email: String,
    password: String,
    password_confirmation: String,
    terms: bool,
}

#[derive(serde::Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(serde::Deserialize)]
struct SessionResponse {
    token: String,
    user: User,
}

fn normalize_server_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');

    // Strip trailing API paths to avoid duplication when constructing request URLs
    let url = url
        .trim_end_matches("/api/v1")
        .trim_end_matches("/api")
        .trim_end_matches('/');

    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    // Default to http:// for localhost/127.0.0.1, https:// for others
    if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
        format!("http://{}", url)
    } else {
        format!("https://{}", url)
    }
}

fn prompt_server(server: Option<String>, non_interactive: bool) -> anyhow::Result<String> {
    let server = if let Some(s) = server {
        if s.trim().is_empty() {
            anyhow::bail!("Server URL cannot be empty");
        }
        s
    } else if non_interactive {
        anyhow::bail!("--server is required in non-interactive mode");
    } else {
        Text::new("Server URL:").prompt()?
    };
    Ok(normalize_server_url(&server))
}

fn print_field_errors(failure: &ApiFailure) {
    if failure.fields.is_empty() {
        eprintln!("Error: {}", failure.message);
    } else {
        for (field, message) in &failure.fields {
            eprintln!("  {field}: {message}");
        }
    }
}

pub fn run_register(server: Option<String>, non_interactive: bool) -> anyhow::Result<()> {
    if non_interactive {
        anyhow::bail!("Registration is interactive; run without --non-interactive");
    }

    let server_url = prompt_server(server, false)?;
    let client = ApiClient::anonymous(&server_url)?;

    loop {
        let email = Text::new("Email:").prompt()?;
        let password = Password::new("Password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;
        let password_confirmation = Password::new("Confirm password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;
        let terms = Confirm::new("Accept the terms of service?")
            .with_default(false)
            .prompt()?;

        let request = RegisterRequest {
            email,
            password,
            password_confirmation,
            terms,
        };

        match client.post::<SessionResponse, _>("/register", &request) {
            Ok(session) => {
                save_credentials(&Credentials {
                    server_url: server_url.clone(),
                    token: session.token,
                })?;
                println!();
                println!(
                    "Registered as {} ({}) on {}",
                    session.user.display_name, session.user.email, server_url
                );
                println!();
                return Ok(());
            }
            Err(failure) if !failure.fields.is_empty() => {
                println!();
                print_field_errors(&failure);
                println!();
            }
            Err(failure) => return Err(failure.into()),
        }
    }
}

pub fn run_login(server: Option<String>, non_interactive: bool) -> anyhow::Result<()> {
    if non_interactive {
        anyhow::bail!("Login is interactive; run without --non-interactive");
    }

    let server_url = prompt_server(server, false)?;
    let client = ApiClient::anonymous(&server_url)?;

    loop {
        let email = Text::new("Email:").prompt()?;
        let password = Password::new("Password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;

        match client.post::<SessionResponse, _>("/login", &LoginRequest { email, password }) {
            Ok(session) => {
                save_credentials(&Credentials {
                    server_url: server_url.clone(),
                    token: session.token,
                })?;
                println!();
                println!("Logged in to {}", server_url);
                println!();
                return Ok(());
            }
            Err(failure) if !failure.fields.is_empty() => {
                println!();
                print_field_errors(&failure);
                println!();
            }
            Err(failure) => return Err(failure.into()),
        }
    }
}

pub fn run_logout() -> anyhow::Result<()> {
    // Best effort: revoke the session server-side before discarding it.
    if let Ok(creds) = load_credentials() {
        if let Ok(client) = ApiClient::new(&creds) {
            let _ = client.post::<serde_json::Value, _>("/logout", &serde_json::json!({}));
        }
    }

    if delete_credentials()? {
        println!();
        println!("Logged out successfully.");
        println!();
    } else {
        println!();
        println!("No credentials found.");
        println!();
    }
    Ok(())
}

//! Token Validator - command line entry point
//!
//! Validates one token (argument or stdin) against the environment
//! configuration and prints its claims as JSON.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use token_validator::{Config, JwtValidator, ValidationContext, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(&config.tracing_config()).context("failed to initialize tracing")?;

    let raw = match std::env::args().nth(1) {
        Some(token) => token,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read token from stdin")?;
            input
        }
    };

    let fetcher = Arc::new(config.http_fetcher().context("failed to create JWKS client")?);
    let validator = JwtValidator::new(config.validator_config(fetcher));
    let context = ValidationContext::new();

    info!(
        correlation_id = %context.correlation_id(),
        trusts = validator.config().signatures().len(),
        "Validating token"
    );

    match validator.validate(raw.trim(), &context).await {
        Some(validated) => {
            println!("{}", serde_json::to_string_pretty(validated.claims())?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("token rejected");
            Ok(ExitCode::FAILURE)
        }
    }
}

use std::time::Duration;

use reqwest::Client;

use crate::prelude::*;

/// Build a client with a bounded request timeout.
pub fn try_new(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

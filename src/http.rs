use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Build the HTTP client shared by every provider and overlay source in a run.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("usb-photo-frame/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| Error::Config(format!("failed to create HTTP client: {err}")))
}

pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    get_json_with(client.get(url), url).await
}

/// Send a prepared GET (e.g. with auth headers) and decode its JSON body.
pub async fn get_json_with<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T> {
    let body = send(request, url).await?;
    serde_json::from_slice(&body).map_err(|err| Error::decode(url, err))
}

pub async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    send(client.get(url), url).await
}

async fn send(request: RequestBuilder, url: &str) -> Result<Vec<u8>> {
    debug!(url, "GET");
    let response = request
        .send()
        .await
        .map_err(|err| Error::transport(url, err))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status,
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| Error::transport(url, err))?;
    Ok(bytes.to_vec())
}

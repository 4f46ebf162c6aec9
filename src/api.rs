pub mod mempool;

// std
use std::time::Duration;
// crates.io
use serde::de::DeserializeOwned;
use tokio::time;
// self
use crate::{
	http::{Http, Response},
	prelude::*,
};

#[derive(Debug)]
pub struct Api<H> {
	pub base_uri: String,
	pub http: H,
}
impl<H> Api<H>
where
	H: Http,
{
	const RETRIES: u32 = 3;
	const RETRY_DELAY_MS: u64 = 50;

	async fn get_json<D>(&self, path: &str) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let uri = format!("{}/{path}", self.base_uri);

		for i in 1..=Self::RETRIES {
			match self.http.get(&uri).await {
				Ok(r) => return r.json(),
				Err(e) => {
					tracing::error!(
						"attempt {i}/{} failed for {uri}: {e:?}, retrying in {}ms",
						Self::RETRIES,
						Self::RETRY_DELAY_MS,
					);
					time::sleep(Duration::from_millis(Self::RETRY_DELAY_MS)).await;
				},
			}
		}

		Err(ApiError::ExceededMaxRetries { retries: Self::RETRIES })?
	}

	async fn post_text(&self, path: &str, body: String) -> Result<String> {
		let uri = format!("{}/{path}", self.base_uri);

		for i in 1..=Self::RETRIES {
			match self.http.post(&uri, body.clone()).await {
				Ok(r) => return Ok(r.text()),
				Err(e) => {
					tracing::error!(
						"attempt {i}/{} failed for {uri}: {e:?}, retrying in {}ms",
						Self::RETRIES,
						Self::RETRY_DELAY_MS,
					);
					time::sleep(Duration::from_millis(Self::RETRY_DELAY_MS)).await;
				},
			}
		}

		Err(ApiError::ExceededMaxRetries { retries: Self::RETRIES })?
	}
}

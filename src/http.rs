// crates.io
use bytes::Bytes;
use reqwest::Client as RClient;
use serde::de::DeserializeOwned;
// self
use crate::prelude::*;

/// Transport seam of the API client; tests substitute canned responses for
/// the network here.
pub trait Http {
	async fn get(&self, uri: &str) -> Result<Bytes>;

	async fn post(&self, uri: &str, body: String) -> Result<Bytes>;
}

pub trait Response
where
	Self: AsRef<[u8]>,
{
	fn json<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let s = self.as_ref();

		match serde_json::from_slice(s) {
			Ok(d) => Ok(d),
			Err(e) => {
				tracing::error!("{}", String::from_utf8_lossy(s));

				Err(e)?
			},
		}
	}

	fn text(&self) -> String {
		String::from_utf8_lossy(self.as_ref()).into()
	}
}
impl Response for Bytes {}

#[derive(Debug)]
pub struct Client(pub RClient);
impl Http for Client {
	async fn get(&self, uri: &str) -> Result<Bytes> {
		Ok(self.0.get(uri).send().await?.bytes().await?)
	}

	async fn post(&self, uri: &str, body: String) -> Result<Bytes> {
		Ok(self.0.post(uri).body(body).send().await?.bytes().await?)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("[api] exceeded maximum retries: {retries}")]
	ExceededMaxRetries { retries: u32 },
}

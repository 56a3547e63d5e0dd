// Copyright (C) 2022-2024 Webb Technologies Inc.
//
// Tangle is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Tangle is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should receive a copy of the GNU General Public License
// If not, see <http://www.gnu.org/licenses/>.

use std::time::Duration;

use ethers::providers::{HttpClientError, JsonRpcError, RetryPolicy};
use router_relayer_utils::probe;

/// Implements [RetryPolicy] that will retry requests that errored with
/// status code 429 i.e. TOO_MANY_REQUESTS
///
/// Public Acala/Karura EVM RPC nodes sit behind load balancers that answer
/// with rate limit errors in several shapes, all of which are retried.
#[derive(Debug)]
pub struct HttpRetryPolicy {
    err_regex: regex::Regex,
}

impl Default for HttpRetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRetryPolicy {
    /// Creates the policy.
    pub fn new() -> Self {
        Self {
            err_regex: regex::Regex::new(
                r"(?mixU)\b(?:rate|limit|429|Too \s Many \s Requests)\b",
            )
            .expect("Valid Regex"),
        }
    }

    /// Boxed policy, as expected by the `RetryClient` builder.
    pub fn boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

fn should_retry_json_rpc_error(err: &JsonRpcError) -> bool {
    let JsonRpcError { code, message, .. } = err;
    if *code == 429 {
        return true;
    }

    // `exceeded project rate limit`
    if *code == -32005 {
        return true;
    }

    if *code == -32016 && message.contains("rate limit") {
        return true;
    }

    match message.as_str() {
        // load balancer hiccup, the next node usually has the block.
        "header not found" => true,
        "daily request count exceeded, request rate limited" => true,
        _ => false,
    }
}

// the body of a failed response that is not valid JSON-RPC.
fn should_retry_unparsed_response(text: &str, err_regex: &regex::Regex) -> bool {
    // some providers send invalid JSON RPC in the error case (no `id:u64`), but the
    // text should be a `JsonRpcError`
    #[derive(serde::Deserialize)]
    struct Resp {
        error: JsonRpcError,
    }

    if let Ok(resp) = serde_json::from_str::<Resp>(text) {
        return should_retry_json_rpc_error(&resp.error);
    }

    let err_text = text.to_lowercase();
    let should_retry = err_regex.is_match(&err_text) || err_text.is_empty();

    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Retry,
        should_retry = should_retry,
        error = %err_text,
    );
    should_retry
}

impl RetryPolicy<HttpClientError> for HttpRetryPolicy {
    fn should_retry(&self, error: &HttpClientError) -> bool {
        tracing::debug!("should_retry: {:?}", error);
        match error {
            HttpClientError::ReqwestError(err) => {
                err.status() == Some(http::StatusCode::TOO_MANY_REQUESTS)
            }
            HttpClientError::JsonRpcError(err) => {
                should_retry_json_rpc_error(err)
            }
            HttpClientError::SerdeJson { text, .. } => {
                should_retry_unparsed_response(text, &self.err_regex)
            }
        }
    }

    fn backoff_hint(&self, error: &HttpClientError) -> Option<Duration> {
        const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

        if let HttpClientError::JsonRpcError(json_rpc_error) = error {
            if let Some(data) = &json_rpc_error.data {
                // some providers send the requested backoff in the error response
                let Some(backoff_seconds) =
                    data.get("rate").and_then(|v| v.get("backoff_seconds"))
                else {
                    return Some(DEFAULT_BACKOFF);
                };
                if let Some(seconds) = backoff_seconds.as_u64() {
                    return Some(Duration::from_secs(seconds));
                }
                if let Some(seconds) = backoff_seconds.as_f64() {
                    return Some(Duration::from_secs(seconds as u64 + 1));
                }
            }
        }

        Some(DEFAULT_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(code: i64, message: &str) -> HttpClientError {
        HttpClientError::JsonRpcError(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        })
    }

    fn unparsed(text: &str) -> HttpClientError {
        HttpClientError::SerdeJson {
            err: serde_json::from_str::<u8>("x").unwrap_err(),
            text: text.to_string(),
        }
    }

    #[test]
    fn retries_rate_limits() {
        let policy = HttpRetryPolicy::new();
        assert!(policy.should_retry(&rpc_error(429, "too many requests")));
        assert!(policy.should_retry(&rpc_error(-32005, "limit exceeded")));
        assert!(policy.should_retry(&rpc_error(-32000, "header not found")));
        assert!(policy.should_retry(&unparsed("429 Too Many Requests")));
    }

    #[test]
    fn does_not_retry_reverts() {
        let policy = HttpRetryPolicy::new();
        assert!(!policy.should_retry(&rpc_error(3, "execution reverted")));
        assert!(!policy.should_retry(&unparsed("<html>bad gateway</html>")));
    }

    #[test]
    fn backoff_hint_from_error_data() {
        let policy = HttpRetryPolicy::new();
        let err = HttpClientError::JsonRpcError(JsonRpcError {
            code: -32005,
            message: "daily request count exceeded, request rate limited"
                .into(),
            data: Some(serde_json::json!({ "rate": { "backoff_seconds": 30 } })),
        });
        assert_eq!(policy.backoff_hint(&err), Some(Duration::from_secs(30)));
        assert_eq!(
            policy.backoff_hint(&rpc_error(429, "x")),
            Some(Duration::from_secs(5))
        );
    }
}

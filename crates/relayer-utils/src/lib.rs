// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ethers::providers::{
    Http, MiddlewareError, Provider, ProviderError, RetryClient,
};
use serde_json::json;

pub mod clickable_link;

/// A module used for debugging relayer lifecycle, tx queue or routing state.
pub mod probe;
/// Retry functionality
pub mod retry;

/// EVM provider used across the relayer, every request goes through the
/// retry policy configured in the context.
pub type EvmProvider = Provider<RetryClient<Http>>;
/// EVM provider with the relayer's signing wallet attached.
pub type EvmClient = ethers::middleware::SignerMiddleware<
    std::sync::Arc<EvmProvider>,
    ethers::signers::LocalWallet,
>;
/// Type alias for runtime config of the Acala/Karura substrate client.
pub type AcalaRuntimeConfig = subxt::PolkadotConfig;

/// An enum of all possible errors that could be encountered during the execution of the
/// router relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Error in the underlying Http server.
    #[error(transparent)]
    Axum(#[from] axum::Error),
    /// HTTP Error
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    /// Elliptic Curve error.
    #[error(transparent)]
    EllipticCurve(#[from] ethers::core::k256::elliptic_curve::Error),
    /// Hex decoding error.
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// Basic error for the substrate runtime.
    #[error(transparent)]
    Subxt(#[from] subxt::Error),
    /// Error in Http Provider (ethers client).
    #[error(transparent)]
    EthersProvider(#[from] ProviderError),
    /// Smart contract error.
    #[error(transparent)]
    EthersContractCall(#[from] ethers::contract::ContractError<EvmProvider>),
    /// Smart contract error.
    #[error(transparent)]
    EthersContractCallWithSigner(
        #[from] ethers::contract::ContractError<EvmClient>,
    ),
    /// Error from the signer middleware while sending a transaction.
    #[error(transparent)]
    EthersSigner(
        #[from]
        ethers::middleware::signer::SignerMiddlewareError<
            std::sync::Arc<EvmProvider>,
            ethers::signers::LocalWallet,
        >,
    ),
    /// Ether wallet errors.
    #[error(transparent)]
    EtherWalletError(#[from] ethers::signers::WalletError),
    /// Ethers currency conversion error
    #[error(transparent)]
    Conversion(#[from] ethers::utils::ConversionError),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// Chain not configured or not enabled.
    #[error("Chain Not Found: {}", chain_id)]
    ChainNotFound {
        /// The chain id (or name) of the chain.
        chain_id: String,
    },
    /// Missing Secrets in the config, the private key or the rpc url.
    #[error("Missing required private-key in the config")]
    MissingSecrets,
    /// The signing key could not be turned into a substrate signer.
    #[error("Invalid signing key: {}", _0)]
    InvalidSigningKey(String),
    /// The signed VAA bytes could not be decoded.
    #[error("Invalid VAA: {}", _0)]
    InvalidVaa(String),
    /// Relay precondition or relay transaction failure.
    #[error("{msg}")]
    Relay {
        /// Human readable reason.
        msg: String,
        /// Request params that led to the failure.
        params: Option<serde_json::Value>,
    },
    /// Routing precondition failure, unsupported pool or token, empty router.
    #[error("{msg}")]
    Route {
        /// Human readable reason.
        msg: String,
        /// Request params that led to the failure.
        params: Option<serde_json::Value>,
    },
    /// Catch-all structured relayer error.
    #[error("{msg}")]
    Relayer {
        /// Human readable reason.
        msg: String,
        /// Extra context for the caller.
        params: Option<serde_json::Value>,
    },
    /// Gas estimation for a transaction that must not be skipped failed.
    #[error("failed to estimate gas limit: {reason}")]
    GasEstimation {
        /// The revert reason, or the rpc error message.
        reason: String,
    },
    /// The batch extrinsic was rejected by the validity check or the dispatch dry run.
    #[error("batch extrinsic dry run failed: {reason}")]
    BatchDryRun {
        /// Hex encoded signed extrinsic.
        extrinsic: String,
        /// Decoded module error message.
        reason: String,
    },
    /// The batch extrinsic was finalized with a failed status.
    #[error("batch extrinsic {tx_hash} failed: {reason}")]
    BatchFailed {
        /// The extrinsic hash.
        tx_hash: String,
        /// Revert reason recovered by replaying the calls.
        reason: String,
    },
    /// The transaction was sent, but its receipt did not show up in time.
    #[error("timed out waiting for the receipt of {tx_hash}")]
    ReceiptTimeout {
        /// Hash of the broadcast transaction.
        tx_hash: String,
    },
    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    TransactionReverted {
        /// Hash of the mined transaction.
        tx_hash: String,
    },
    /// The transaction was dropped from the mempool before being mined.
    #[error("transaction {tx_hash} dropped from the mempool")]
    TransactionDropped {
        /// Hash of the broadcast transaction.
        tx_hash: String,
    },
    /// The transaction queue worker is gone.
    #[error("Transaction queue closed")]
    QueueClosed,
}

impl Error {
    /// Shorthand for a [`Error::Relay`] without params.
    pub fn relay(msg: impl Into<String>) -> Self {
        Self::Relay {
            msg: msg.into(),
            params: None,
        }
    }

    /// Shorthand for a [`Error::Route`] without params.
    pub fn route(msg: impl Into<String>) -> Self {
        Self::Route {
            msg: msg.into(),
            params: None,
        }
    }

    /// Attaches request params to relay, route and relayer errors.
    /// Other variants are returned untouched.
    pub fn with_params(self, value: serde_json::Value) -> Self {
        match self {
            Self::Relay { msg, .. } => Self::Relay {
                msg,
                params: Some(value),
            },
            Self::Route { msg, .. } => Self::Route {
                msg,
                params: Some(value),
            },
            Self::Relayer { msg, .. } => Self::Relayer {
                msg,
                params: Some(value),
            },
            other => other,
        }
    }

    /// Name of the error class reported in the 500 envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Relay { .. }
            | Self::GasEstimation { .. }
            | Self::TransactionReverted { .. } => "RelayError",
            Self::Route { .. } => "RouteError",
            Self::Relayer { .. }
            | Self::BatchDryRun { .. }
            | Self::BatchFailed { .. }
            | Self::ReceiptTimeout { .. }
            | Self::TransactionDropped { .. } => "RelayerError",
            _ => "Error",
        }
    }

    /// Structured params carried by the error, if any.
    pub fn params(&self) -> Option<serde_json::Value> {
        match self {
            Self::Relay { params, .. }
            | Self::Route { params, .. }
            | Self::Relayer { params, .. } => params.clone(),
            Self::BatchDryRun { extrinsic, reason } => {
                Some(json!({ "extrinsic": extrinsic, "reason": reason }))
            }
            Self::BatchFailed { tx_hash, reason } => {
                Some(json!({ "txHash": tx_hash, "reason": reason }))
            }
            Self::ReceiptTimeout { tx_hash }
            | Self::TransactionReverted { tx_hash }
            | Self::TransactionDropped { tx_hash } => {
                Some(json!({ "txHash": tx_hash }))
            }
            _ => None,
        }
    }
}

/// A type alias for the result for the router relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Extracts a human readable revert reason out of a middleware (or
/// provider) error, falling back to the error message itself.
pub fn revert_reason<E: MiddlewareError>(error: &E) -> String {
    error
        .as_error_response()
        .and_then(|e| e.decode_revert_data::<String>())
        .unwrap_or_else(|| error.to_string())
}

/// Extracts a human readable revert reason out of a contract error.
pub fn contract_revert_reason<M: ethers::providers::Middleware>(
    error: &ethers::contract::ContractError<M>,
) -> String {
    error
        .decode_revert::<String>()
        .unwrap_or_else(|| error.to_string())
}

impl From<Error> for HandlerError {
    fn from(value: Error) -> Self {
        let mut body = json!({
            "msg": value.to_string(),
            "error": value.kind(),
        });
        if let Some(params) = value.params() {
            body["params"] = params;
        }
        HandlerError(StatusCode::INTERNAL_SERVER_ERROR, body)
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub struct HandlerError(
    /// HTTP status code for response
    pub StatusCode,
    /// JSON response body
    pub serde_json::Value,
);

impl HandlerError {
    /// 400 envelope listing every invalid field.
    pub fn invalid_params(errors: Vec<String>) -> Self {
        HandlerError(
            StatusCode::BAD_REQUEST,
            json!({ "msg": "invalid request params!", "error": errors }),
        )
    }

    /// 404 envelope for an unmatched method and path.
    pub fn not_supported(method: &str, path: &str) -> Self {
        HandlerError(
            StatusCode::NOT_FOUND,
            json!({ "error": format!("{method} {path} not supported") }),
        )
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

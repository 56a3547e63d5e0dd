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

//! Retry logic for async calls

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;

use crate::probe;

/// Constant with Max Retry Count is a backoff policy which always returns
/// a constant duration, until it exceeds the maximum retry count.
#[derive(Debug, Clone)]
pub struct ConstantWithMaxRetryCount {
    interval: Duration,
    max_retry_count: usize,
    count: usize,
}

impl ConstantWithMaxRetryCount {
    /// Creates a new Constant backoff with `interval` and `max_retry_count`.
    /// `interval` is the duration to wait between retries, and `max_retry_count` is the maximum
    /// number of retries, after which we return `None` to indicate that we should stop retrying.
    pub fn new(interval: Duration, max_retry_count: usize) -> Self {
        Self {
            interval,
            max_retry_count,
            count: 0,
        }
    }
}

impl Backoff for ConstantWithMaxRetryCount {
    fn next_backoff(&mut self) -> Option<Duration> {
        (self.count < self.max_retry_count).then(|| {
            self.count += 1;
            self.interval
        })
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// How many times, and how far apart, [`retry`] runs an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    /// Total number of attempts, the first one included.
    pub times: usize,
    /// Fixed delay between two attempts.
    pub interval: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            times: 10,
            interval: Duration::from_secs(5),
        }
    }
}

impl RetryOptions {
    fn backoff(&self) -> ConstantWithMaxRetryCount {
        ConstantWithMaxRetryCount::new(
            self.interval,
            self.times.saturating_sub(1),
        )
    }
}

/// Runs `op` until it succeeds, at most `options.times` times, sleeping
/// `options.interval` between attempts.
///
/// Attempts are strictly sequential. Once the attempts are exhausted the
/// last error is returned as is.
pub async fn retry<T, E, F, Fut>(
    options: RetryOptions,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    backoff::future::retry_notify(
        options.backoff(),
        || {
            let fut = op();
            async move { fut.await.map_err(backoff::Error::transient) }
        },
        |err: E, wait: Duration| {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Retry,
                error = %err,
                wait = ?wait,
            );
        },
    )
    .await
}

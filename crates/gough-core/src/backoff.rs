// Copyright 2026 The Gough Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded retry with exponential backoff, used by every outbound call in
//! the workspace (worker-to-control HTTP, power backends, blob presigning).

use std::time::Duration;

use tokio::time::sleep;

/// An iterator of doubling delays starting at `initial`, capped at `max`,
/// with no jitter (matching the reference node crate's fixed-interval
/// retry helper — this workspace has no byzantine-timing concerns that
/// would call for jitter).
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    next: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial, max }
    }

    /// The backoff policy used by every `Transient`-classified call in this
    /// workspace: start at 500ms, cap at 60s, per spec §4.1/§5.
    pub fn standard() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(60))
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        self.next = (self.next * 2).min(self.max);
        Some(current)
    }
}

/// Retries `future_fn` up to `max_attempts` times (the first call plus
/// `max_attempts - 1` retries), sleeping between attempts per `backoff`.
/// Returns the last error if every attempt fails.
pub async fn retry_with_backoff<T, E, Fut>(
    max_attempts: usize,
    mut backoff: impl Iterator<Item = Duration>,
    mut future_fn: impl FnMut() -> Fut,
) -> Result<T, E>
where
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match future_fn().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                let delay = backoff.next().unwrap_or(Duration::from_secs(60));
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_and_caps() {
        let mut b = ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(2));
        assert_eq!(b.next(), Some(Duration::from_millis(500)));
        assert_eq!(b.next(), Some(Duration::from_secs(1)));
        assert_eq!(b.next(), Some(Duration::from_secs(2)));
        assert_eq!(b.next(), Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let mut calls = 0;
        let result: Result<u32, &str> = retry_with_backoff(
            3,
            ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(4)),
            || {
                calls += 1;
                let calls = calls;
                async move {
                    if calls < 3 {
                        Err("not yet")
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<u32, &str> = retry_with_backoff(
            2,
            ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(2)),
            || {
                calls += 1;
                async move { Err("nope") }
            },
        )
        .await;
        assert_eq!(result, Err("nope"));
        assert_eq!(calls, 2);
    }
}

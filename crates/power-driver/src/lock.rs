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

//! Per-BMC serialization: §5 requires at most one in-flight power call per
//! BMC. `BmcLocks` hands out a keyed `tokio::sync::Mutex` guard per address
//! so two jobs targeting different BMCs never block each other, while two
//! calls against the same BMC queue.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct BmcLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BmcLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the serialization lock for `address`, creating it on first
    /// use. Holding the returned guard is what guarantees only one call is
    /// in flight against this BMC at a time.
    pub async fn acquire(&self, address: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks.entry(address.to_string()).or_default().clone()
        };
        entry.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_address_serializes() {
        let locks = Arc::new(BmcLocks::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let l1 = locks.clone();
        let o1 = order.clone();
        let t1 = tokio::spawn(async move {
            let _g = l1.acquire("bmc-1").await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            o1.lock().await.push(1);
        });

        tokio::time::sleep(Duration::from_millis(5)).await;

        let l2 = locks.clone();
        let o2 = order.clone();
        let t2 = tokio::spawn(async move {
            let _g = l2.acquire("bmc-1").await;
            o2.lock().await.push(2);
        });

        t1.await.unwrap();
        t2.await.unwrap();
        assert_eq!(*order.lock().await, vec![1, 2]);
    }
}

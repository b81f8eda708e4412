// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background cache trimmer
//!
//! A dedicated long-lived thread that compacts the predicate cache on a
//! fixed interval: compact, sleep, repeat. Compaction failures are logged
//! and swallowed; they never stop the loop or the process. Shutdown is
//! cooperative: the sleep is a condvar wait, so cancellation takes effect
//! before the next interval elapses, and an in-flight compaction is allowed
//! to finish.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use super::cache::PredicateCache;

/// Shared shutdown signal: flag plus the condvar that interrupts the sleep
struct Signal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

/// Periodically compacts a [`PredicateCache`] from a background thread
pub struct CacheTrimmer {
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl CacheTrimmer {
    /// Start trimming the cache every `interval`, reclaiming `fraction` of
    /// the entries per sweep (0.5 reclaims about half)
    pub fn start(cache: Arc<PredicateCache>, interval: Duration, fraction: f64) -> Self {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            condvar: Condvar::new(),
        });

        let thread_signal = Arc::clone(&signal);
        let handle = std::thread::Builder::new()
            .name("rowsift-cache-trim".to_string())
            .spawn(move || {
                loop {
                    match catch_unwind(AssertUnwindSafe(|| cache.compact(fraction))) {
                        Ok(evicted) => {
                            debug!("cache trim evicted {} predicate(s)", evicted)
                        }
                        Err(_) => warn!("cache compaction failed; continuing"),
                    }

                    let mut stopped = thread_signal.stopped.lock();
                    if *stopped {
                        break;
                    }
                    let _ = thread_signal
                        .condvar
                        .wait_for(&mut stopped, interval);
                    if *stopped {
                        break;
                    }
                }
            })
            .expect("failed to spawn cache trimmer thread");

        Self {
            signal,
            handle: Some(handle),
        }
    }

    /// Stop the trimmer and wait for the thread to exit
    ///
    /// Idempotent; the current compaction, if any, runs to completion.
    pub fn shutdown(&mut self) {
        {
            let mut stopped = self.signal.stopped.lock();
            *stopped = true;
        }
        self.signal.condvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CacheTrimmer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

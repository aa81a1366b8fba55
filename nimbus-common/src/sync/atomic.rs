// Copyright 2025 OPPO.
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

use std::sync::atomic::{AtomicBool as StdAtomicBool, AtomicI64 as StdAtomicI64, Ordering};

const ATOMIC_ORDERING: Ordering = Ordering::SeqCst;

pub struct AtomicLong(StdAtomicI64);

impl AtomicLong {
    pub fn new(value: i64) -> Self {
        Self(StdAtomicI64::new(value))
    }

    pub fn get(&self) -> i64 {
        self.0.load(ATOMIC_ORDERING)
    }

    pub fn set(&self, value: i64) {
        self.0.store(value, ATOMIC_ORDERING)
    }

    pub fn get_and_add(&self, value: i64) -> i64 {
        self.0.fetch_add(value, ATOMIC_ORDERING)
    }

    pub fn incr(&self) {
        self.0.fetch_add(1, ATOMIC_ORDERING);
    }

    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, ATOMIC_ORDERING) + 1
    }
}

impl Default for AtomicLong {
    fn default() -> Self {
        Self::new(0)
    }
}

// Event counter with clear-and-read semantics; the periodic status line
// reads the count for one interval and resets it in a single swap.
pub struct AtomicCounter(StdAtomicI64);

impl AtomicCounter {
    pub fn new() -> Self {
        Self(StdAtomicI64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, ATOMIC_ORDERING);
    }

    pub fn add(&self, value: i64) {
        self.0.fetch_add(value, ATOMIC_ORDERING);
    }

    pub fn get(&self) -> i64 {
        self.0.load(ATOMIC_ORDERING)
    }

    pub fn clear(&self) -> i64 {
        self.0.swap(0, ATOMIC_ORDERING)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AtomicFlag(StdAtomicBool);

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self(StdAtomicBool::new(value))
    }

    pub fn get(&self) -> bool {
        self.0.load(ATOMIC_ORDERING)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, ATOMIC_ORDERING)
    }
}

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

#![allow(clippy::should_implement_trait)]

use crate::FsResult;
use std::time::Duration;

// The smallest unit supported is milliseconds, so DurationUnit saves the number of milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Default)]
pub struct DurationUnit(u64);

impl DurationUnit {
    pub const MILLISECONDS: u64 = 1;
    pub const SECONDS: u64 = 1000 * Self::MILLISECONDS;
    pub const MINUTE: u64 = 60 * Self::SECONDS;
    pub const HOUR: u64 = 60 * Self::MINUTE;
    pub const DAY: u64 = 24 * Self::HOUR;

    pub fn new(ms: u64) -> Self {
        DurationUnit(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    pub fn as_seconds(&self) -> u64 {
        self.0 / Self::SECONDS
    }

    // Parse a human-readable duration, for example "500ms", "3s", "10m", "1h", "1d".
    // A bare number is interpreted as milliseconds.
    pub fn from_str(dur_str: &str) -> FsResult<Self> {
        let str = dur_str.trim().to_lowercase();
        if str.is_empty() {
            return crate::err_box!("Empty duration string");
        }

        let (num, unit) = match str.find(|c: char| !c.is_ascii_digit()) {
            None => (str.as_str(), ""),
            Some(pos) => str.split_at(pos),
        };

        let value: u64 = match num.parse() {
            Ok(v) => v,
            Err(_) => return crate::err_box!("Invalid duration string: {}", dur_str),
        };

        let ms = match unit {
            "" | "ms" => value * Self::MILLISECONDS,
            "s" => value * Self::SECONDS,
            "m" => value * Self::MINUTE,
            "h" => value * Self::HOUR,
            "d" => value * Self::DAY,
            _ => return crate::err_box!("Unknown duration unit: {}", dur_str),
        };

        Ok(DurationUnit(ms))
    }
}

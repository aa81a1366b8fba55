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

use crate::utils::epoch_mills;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// Describes a chunkserver, which is the basic unit of roster management.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkServerInfo {
    pub id: i32,
    pub address: String,
    pub disk_quota: i64,
    pub data_size: i64,
    pub block_num: i64,
    pub buffers: i32,
    pub last_heartbeat: u64,
    pub is_dead: bool,
}

impl ChunkServerInfo {
    pub fn new(id: i32, address: impl Into<String>, disk_quota: i64) -> Self {
        Self {
            id,
            address: address.into(),
            disk_quota,
            data_size: 0,
            block_num: 0,
            buffers: 0,
            last_heartbeat: epoch_mills(),
            is_dead: false,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.is_dead
    }

    pub fn simple_string(&self) -> String {
        format!(
            "{},{},{}",
            self.id,
            self.address,
            if self.is_dead { "dead" } else { "alive" }
        )
    }
}

impl Default for ChunkServerInfo {
    fn default() -> Self {
        Self::new(-1, "", 0)
    }
}

impl PartialEq for ChunkServerInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for ChunkServerInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.id, self.address)
    }
}

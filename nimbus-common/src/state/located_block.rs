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

use serde::{Deserialize, Serialize};

// A block id paired with the chunkserver addresses a client can reach it at.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocatedBlock {
    pub block_id: i64,
    pub block_size: i64,
    pub chains: Vec<String>,
}

impl LocatedBlock {
    pub fn new(block_id: i64, block_size: i64, chains: Vec<String>) -> Self {
        Self {
            block_id,
            block_size,
            chains,
        }
    }
}

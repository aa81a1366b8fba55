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
use std::collections::HashSet;

// The authoritative record of one block. `replica` holds the chunkservers
// believed to own a complete copy, `pulling` the chunkservers instructed
// to acquire one; a chunkserver is never in both at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMeta {
    pub block_id: i64,
    // 0 means the size has not been learned yet.
    pub block_size: i64,
    // -1 means the block is still open for writing.
    pub version: i64,
    pub replica: HashSet<i32>,
    pub pulling: HashSet<i32>,
    pub expect_replica_num: i32,
    // An outstanding replica-count adjustment is in flight.
    pub pending_change: bool,
}

impl BlockMeta {
    pub fn new(block_id: i64, expect_replica_num: i32) -> Self {
        Self {
            block_id,
            block_size: 0,
            version: -1,
            replica: HashSet::new(),
            pulling: HashSet::new(),
            expect_replica_num,
            pending_change: false,
        }
    }

    pub fn replica_num(&self) -> i32 {
        self.replica.len() as i32
    }

    pub fn is_stable(&self) -> bool {
        !self.pending_change
    }
}

#[cfg(test)]
mod tests {
    use crate::nameserver::meta::BlockMeta;

    #[test]
    fn new_block() {
        let block = BlockMeta::new(7, 3);
        assert_eq!(block.block_id, 7);
        assert_eq!(block.block_size, 0);
        assert_eq!(block.version, -1);
        assert_eq!(block.expect_replica_num, 3);
        assert!(block.replica.is_empty());
        assert!(block.pulling.is_empty());
        assert!(block.is_stable());
    }
}

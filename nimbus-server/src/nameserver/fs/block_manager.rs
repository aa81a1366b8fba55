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

use crate::nameserver::meta::BlockMeta;
use nimbus_common::error::FsError;
use nimbus_common::state::FileInfo;
use nimbus_common::FsResult;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

// Outcome of reconciling one reported replica against the block map.
// A rejected report tells the chunkserver to delete its local copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockUpdate {
    Accepted { more_replica_num: i32 },
    Rejected,
}

// Manage all blocks in the cluster: the id allocator, the map from block
// id to its record, and the per-destination queue of pending pull
// commands. All access goes through one mutex (`SyncBlockManager`);
// operations are short map lookups and small set edits.
pub struct BlockManager {
    next_block_id: i64,
    block_map: HashMap<i64, BlockMeta>,
    // Pull commands owed to each destination chunkserver, handed over
    // at most once by `get_pull_blocks`.
    pending_pulls: HashMap<i32, HashSet<i64>>,
    default_replica_num: i32,
}

impl BlockManager {
    pub fn new(default_replica_num: i32) -> Self {
        Self {
            next_block_id: 1,
            block_map: HashMap::new(),
            pending_pulls: HashMap::new(),
            default_replica_num,
        }
    }

    pub fn new_block_id(&mut self) -> i64 {
        let id = self.next_block_id;
        self.next_block_id += 1;
        id
    }

    pub fn block_num(&self) -> usize {
        self.block_map.len()
    }

    // Hard links are unsupported, an id can only be registered once.
    pub fn add_new_block(&mut self, block_id: i64) -> FsResult<()> {
        if self.block_map.contains_key(&block_id) {
            return Err(FsError::block_exists(block_id));
        }

        self.block_map
            .insert(block_id, BlockMeta::new(block_id, self.default_replica_num));
        debug!("Init block info: #{}", block_id);

        if self.next_block_id <= block_id {
            self.next_block_id = block_id + 1;
        }
        Ok(())
    }

    pub fn get_block(&self, block_id: i64) -> FsResult<BlockMeta> {
        match self.block_map.get(&block_id) {
            Some(v) => Ok(v.clone()),
            None => Err(FsError::block_not_found(block_id)),
        }
    }

    pub fn get_replica_location(&self, block_id: i64) -> FsResult<HashSet<i32>> {
        match self.block_map.get(&block_id) {
            Some(v) => Ok(v.replica.clone()),
            None => Err(FsError::block_not_found(block_id)),
        }
    }

    // A removed block is never resurrected: later reports for the id are
    // rejected by `update_block_info`.
    pub fn remove_block(&mut self, block_id: i64) {
        let block = match self.block_map.remove(&block_id) {
            None => {
                warn!("RemoveBlock #{} not found", block_id);
                return;
            }
            Some(v) => v,
        };

        // Queued pulls reference the record's pulling set; drop them with it.
        if !block.pulling.is_empty() {
            for pulls in self.pending_pulls.values_mut() {
                pulls.remove(&block_id);
            }
            self.pending_pulls.retain(|_, v| !v.is_empty());
        }
    }

    pub fn remove_blocks_for_file(&mut self, file_info: &FileInfo) {
        for block_id in &file_info.blocks {
            self.remove_block(*block_id);
            info!("Remove block #{} for {}", block_id, file_info.name);
        }
    }

    pub fn set_block_version(&mut self, block_id: i64, version: i64) -> FsResult<()> {
        match self.block_map.get_mut(&block_id) {
            Some(v) => {
                v.version = version;
                Ok(())
            }
            None => Err(FsError::block_not_found(block_id)),
        }
    }

    pub fn mark_block_stable(&mut self, block_id: i64) -> FsResult<()> {
        match self.block_map.get_mut(&block_id) {
            Some(v) => {
                v.pending_change = false;
                Ok(())
            }
            None => Err(FsError::block_not_found(block_id)),
        }
    }

    pub fn change_replica_num(&mut self, block_id: i64, replica_num: i32) -> FsResult<()> {
        match self.block_map.get_mut(&block_id) {
            Some(v) => {
                v.expect_replica_num = replica_num;
                Ok(())
            }
            None => Err(FsError::block_not_found(block_id)),
        }
    }

    // Seed a freshly allocated block with a chosen chunkserver. Used by
    // block allocation only; no reconciliation or repair planning runs.
    pub fn add_replica(&mut self, block_id: i64, cs_id: i32) -> FsResult<()> {
        match self.block_map.get_mut(&block_id) {
            Some(v) => {
                v.replica.insert(cs_id);
                Ok(())
            }
            None => Err(FsError::block_not_found(block_id)),
        }
    }

    // Reconcile one reported replica. Decision order: existence, version,
    // size, admission, repair. Only the repair step consults
    // `pending_change`; at most one change per block is ever in flight.
    pub fn update_block_info(
        &mut self,
        block_id: i64,
        cs_id: i32,
        block_size: i64,
        block_version: i64,
    ) -> BlockUpdate {
        let block = match self.block_map.get_mut(&block_id) {
            None => {
                // The normal race with unlink.
                debug!("UpdateBlockInfo #{} has been removed", block_id);
                return BlockUpdate::Rejected;
            }
            Some(v) => v,
        };

        // Version -1 on either side is a wildcard.
        if block.version >= 0 && block_version >= 0 && block.version != block_version {
            info!(
                "Block #{} on slow chunkserver {}, stored version {}, reported version {}, drop it",
                block_id, cs_id, block.version, block_version
            );
            return BlockUpdate::Rejected;
        }

        if block_size != 0 && block.block_size != block_size {
            if block.block_size != 0 {
                // Two sealed sizes for one block means the index is corrupt;
                // continuing would compound the damage.
                panic!(
                    "Block #{} size mismatch, stored {}, reported {} by chunkserver {}",
                    block_id, block.block_size, block_size, cs_id
                );
            }
            info!(
                "Block #{} size update, {} to {}",
                block_id, block.block_size, block_size
            );
            block.block_size = block_size;
        }

        // A puller reporting the block has completed its pull; promote it
        // to holder before the repair decision runs. Reports and pull
        // reports may arrive in any order.
        if block.pulling.remove(&cs_id) {
            if let Some(pulls) = self.pending_pulls.get_mut(&cs_id) {
                pulls.remove(&block_id);
                if pulls.is_empty() {
                    self.pending_pulls.remove(&cs_id);
                }
            }
            info!(
                "Block #{} pull finished, learned from report of chunkserver {}",
                block_id, cs_id
            );
        }

        block.replica.insert(cs_id);

        // A downsize with no pulls left has settled; stabilize so the
        // repair decision below can run again.
        if block.pending_change && block.pulling.is_empty() {
            block.pending_change = false;
        }

        let cur_replica_num = block.replica_num();
        let expect_replica_num = block.expect_replica_num;

        if block.pending_change || cur_replica_num == expect_replica_num {
            return BlockUpdate::Accepted {
                more_replica_num: 0,
            };
        }

        if cur_replica_num > expect_replica_num {
            info!(
                "Block #{} has too many replicas, cur={} expect={}, drop on chunkserver {}",
                block_id, cur_replica_num, expect_replica_num, cs_id
            );
            block.replica.remove(&cs_id);
            block.pending_change = true;
            return BlockUpdate::Rejected;
        }

        let more_replica_num = expect_replica_num - cur_replica_num;
        info!(
            "Need to add {} new replicas for #{} cur={} expect={}",
            more_replica_num, block_id, cur_replica_num, expect_replica_num
        );
        BlockUpdate::Accepted { more_replica_num }
    }

    // Queue a pull command for `dst_cs`. Idempotent: a destination that
    // is already pulling (or already holds the block) is not queued again.
    pub fn mark_pull_block(&mut self, dst_cs: i32, block_id: i64) -> bool {
        let block = match self.block_map.get_mut(&block_id) {
            None => {
                warn!("MarkPullBlock #{} not found", block_id);
                return false;
            }
            Some(v) => v,
        };

        if block.pulling.contains(&dst_cs) || block.replica.contains(&dst_cs) {
            return false;
        }

        block.pulling.insert(dst_cs);
        block.pending_change = true;
        self.pending_pulls
            .entry(dst_cs)
            .or_default()
            .insert(block_id);
        info!("Add replicate info dst cs {}, block #{}", dst_cs, block_id);
        true
    }

    // The destination finished pulling: promote it puller -> holder. A
    // call for an unknown block is ignored, the block was unlinked mid-pull.
    pub fn unmark_pull_block(&mut self, cs_id: i32, block_id: i64) {
        let block = match self.block_map.get_mut(&block_id) {
            None => {
                warn!("UnmarkPullBlock, block #{} not found", block_id);
                return;
            }
            Some(v) => v,
        };

        block.pulling.remove(&cs_id);
        if block.pulling.is_empty() && block.pending_change {
            block.pending_change = false;
            info!("Block #{} on cs {} finish replicate", block_id, cs_id);
        }
        block.replica.insert(cs_id);
    }

    // Hand over every pull command owed to `dst_cs`, paired with the
    // block's current replica set as pull sources. At-most-once: the
    // returned entries are removed from the queue.
    pub fn get_pull_blocks(&mut self, dst_cs: i32) -> Vec<(i64, HashSet<i32>)> {
        let block_ids = match self.pending_pulls.remove(&dst_cs) {
            None => return vec![],
            Some(v) => v,
        };

        let mut blocks = Vec::with_capacity(block_ids.len());
        for block_id in block_ids {
            // The block may have been unlinked while the pull sat queued.
            if let Some(block) = self.block_map.get(&block_id) {
                blocks.push((block_id, block.replica.clone()));
            }
        }
        blocks
    }

    // A chunkserver died: forget it as holder and puller of every block
    // it was known to own, and drop the pulls it will never receive.
    pub fn deal_dead_blocks(&mut self, dead_cs: i32, block_ids: &[i64]) {
        info!(
            "Replicate {} blocks of dead chunkserver: {}",
            block_ids.len(),
            dead_cs
        );

        for block_id in block_ids {
            // may have been unlinked, not in the block map
            if let Some(block) = self.block_map.get_mut(block_id) {
                block.replica.remove(&dead_cs);
                block.pulling.remove(&dead_cs);
                // The block may still be under-replicated here; the next
                // report from a live holder re-triggers repair.
                if block.pulling.is_empty() && block.pending_change {
                    block.pending_change = false;
                }
            }
        }

        self.pending_pulls.remove(&dead_cs);
    }
}

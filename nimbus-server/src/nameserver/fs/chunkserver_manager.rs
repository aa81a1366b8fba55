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

use indexmap::IndexMap;
use nimbus_common::error::FsError;
use nimbus_common::state::ChunkServerInfo;
use nimbus_common::utils::epoch_mills;
use nimbus_common::FsResult;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};

// The chunkserver roster: address <-> id mapping, heartbeat liveness,
// and the cs -> blocks direction of the location index. The block map
// holds the reverse direction; the two reconcile only through explicit
// operations, never by traversing back-references under the other's lock.
pub struct ChunkServerManager {
    next_chunkserver_id: i32,
    chunkservers: IndexMap<i32, ChunkServerInfo>,
    address_map: HashMap<String, i32>,
    // Number of connected chunkservers.
    chunkserver_num: i32,
    blocks: HashMap<i32, HashSet<i64>>,
}

impl Default for ChunkServerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkServerManager {
    pub fn new() -> Self {
        Self {
            next_chunkserver_id: 1,
            chunkservers: IndexMap::new(),
            address_map: HashMap::new(),
            chunkserver_num: 0,
            blocks: HashMap::new(),
        }
    }

    // Register a chunkserver, or revive a known address that re-reports.
    pub fn add_chunk_server(&mut self, addr: &str, disk_quota: i64) -> i32 {
        if let Some(id) = self.address_map.get(addr) {
            let id = *id;
            if let Some(info) = self.chunkservers.get_mut(&id) {
                if info.is_dead {
                    self.chunkserver_num += 1;
                }
                info.is_dead = false;
                info.disk_quota = disk_quota;
                info.last_heartbeat = epoch_mills();
            }
            info!("Chunkserver re-register: {} id={}", addr, id);
            return id;
        }

        let id = self.next_chunkserver_id;
        self.next_chunkserver_id += 1;

        self.chunkservers
            .insert(id, ChunkServerInfo::new(id, addr, disk_quota));
        self.address_map.insert(addr.to_string(), id);
        self.chunkserver_num += 1;
        info!("Chunkserver register: {} id={}", addr, id);
        id
    }

    pub fn get_chunkserver_id(&self, addr: &str) -> Option<i32> {
        self.address_map.get(addr).copied()
    }

    // Dead chunkservers resolve to no address: their replicas are
    // unreachable and must not be handed out as pull sources.
    pub fn get_chunk_server_addr(&self, id: i32) -> Option<String> {
        match self.chunkservers.get(&id) {
            Some(v) if v.is_live() => Some(v.address.clone()),
            _ => None,
        }
    }

    pub fn handle_heartbeat(
        &mut self,
        addr: &str,
        block_num: i64,
        data_size: i64,
        buffers: i32,
    ) {
        let id = match self.address_map.get(addr) {
            Some(v) => *v,
            None => {
                // An unregistered chunkserver heartbeats; it will register
                // through its next block report.
                debug!("Heartbeat from unknown chunkserver {}", addr);
                return;
            }
        };

        if let Some(info) = self.chunkservers.get_mut(&id) {
            if info.is_dead {
                info.is_dead = false;
                self.chunkserver_num += 1;
            }
            info.last_heartbeat = epoch_mills();
            info.block_num = block_num;
            info.data_size = data_size;
            info.buffers = buffers;
        }
    }

    // Live chunkservers ordered by ascending data size, enough to pick a
    // write pipeline or repair destinations from. Equally loaded servers
    // are shuffled so repeated allocations spread out. Fails when fewer
    // than `num` are alive.
    pub fn get_chunk_server_chains(&self, num: i32) -> FsResult<Vec<(i32, String)>> {
        if num <= 0 {
            return Ok(vec![]);
        }

        let mut live: Vec<&ChunkServerInfo> =
            self.chunkservers.values().filter(|v| v.is_live()).collect();
        if (live.len() as i32) < num {
            return Err(FsError::no_chunk_server(num, live.len()));
        }

        live.shuffle(&mut rand::thread_rng());
        live.sort_by_key(|v| v.data_size);
        Ok(live
            .into_iter()
            .map(|v| (v.id, v.address.clone()))
            .collect())
    }

    pub fn add_block(&mut self, cs_id: i32, block_id: i64) {
        self.blocks.entry(cs_id).or_default().insert(block_id);
    }

    pub fn remove_block(&mut self, cs_id: i32, block_id: i64) {
        if let Some(set) = self.blocks.get_mut(&cs_id) {
            set.remove(&block_id);
        }
    }

    pub fn inc_chunk_server_num(&mut self) {
        self.chunkserver_num += 1;
    }

    pub fn get_chunk_server_num(&self) -> i32 {
        self.chunkserver_num
    }

    pub fn list_chunk_servers(&self) -> Vec<ChunkServerInfo> {
        self.chunkservers.values().cloned().collect()
    }

    // Declare every chunkserver dead whose heartbeat is older than
    // `lost_ms`, and surrender the blocks each one was known to hold so
    // the caller can route them into the block map's dead handling.
    pub fn remove_expired(&mut self, lost_ms: u64) -> Vec<(i32, Vec<i64>)> {
        let now = epoch_mills();
        let mut expired = vec![];

        for (id, info) in self.chunkservers.iter_mut() {
            if info.is_live() && now > info.last_heartbeat + lost_ms {
                warn!(
                    "Chunkserver {} has no heartbeat for more than {} ms and will be removed",
                    info.address, lost_ms
                );
                info.is_dead = true;
                self.chunkserver_num -= 1;

                let blocks = self
                    .blocks
                    .remove(id)
                    .map(|v| v.into_iter().collect())
                    .unwrap_or_default();
                expired.push((*id, blocks));
            }
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use crate::nameserver::fs::ChunkServerManager;

    #[test]
    fn register_and_resolve() {
        let mut cm = ChunkServerManager::new();
        let id1 = cm.add_chunk_server("cs1:8825", 1 << 30);
        let id2 = cm.add_chunk_server("cs2:8825", 1 << 30);
        assert_ne!(id1, id2);

        assert_eq!(cm.get_chunkserver_id("cs1:8825"), Some(id1));
        assert_eq!(cm.get_chunk_server_addr(id2).unwrap(), "cs2:8825");
        assert_eq!(cm.get_chunk_server_num(), 2);

        // Re-registration keeps the id.
        assert_eq!(cm.add_chunk_server("cs1:8825", 1 << 30), id1);
    }

    #[test]
    fn chains_ordered_by_load() {
        let mut cm = ChunkServerManager::new();
        let id1 = cm.add_chunk_server("cs1:8825", 1 << 30);
        let id2 = cm.add_chunk_server("cs2:8825", 1 << 30);
        cm.handle_heartbeat("cs1:8825", 10, 4096, 0);
        cm.handle_heartbeat("cs2:8825", 1, 128, 0);

        let chains = cm.get_chunk_server_chains(2).unwrap();
        assert_eq!(chains[0].0, id2);
        assert_eq!(chains[1].0, id1);

        assert!(cm.get_chunk_server_chains(3).is_err());
    }

    #[test]
    fn expired_chunkserver_surrenders_blocks() {
        let mut cm = ChunkServerManager::new();
        let id = cm.add_chunk_server("cs1:8825", 1 << 30);
        cm.add_block(id, 7);
        cm.add_block(id, 9);

        // Nothing has timed out yet.
        assert!(cm.remove_expired(60_000).is_empty());

        std::thread::sleep(std::time::Duration::from_millis(5));
        let expired = cm.remove_expired(1);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, id);
        assert_eq!(expired[0].1.len(), 2);
        assert_eq!(cm.get_chunk_server_num(), 0);
        assert!(cm.get_chunk_server_addr(id).is_none());
    }
}

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

use crate::nameserver::fs::{
    BlockManager, BlockMapLoader, BlockUpdate, ChunkServerManager, SafeModeGate,
};
use crate::nameserver::meta::{NameSpace, PATH_SEPARATOR};
use crate::nameserver::{SyncBlockManager, SyncChunkServerManager};
use nimbus_common::conf::{ClusterConf, NameserverConf};
use nimbus_common::error::FsError;
use nimbus_common::proto::{status, BlockReportRequest, BlockReportResponse, ReplicaInfo};
use nimbus_common::state::{ChunkServerInfo, FileInfo, LocatedBlock};
use nimbus_common::sync::{ArcMutex, ArcRwLock};
use nimbus_common::FsResult;
use log::{info, warn};
use std::sync::Arc;

// Composes the namespace, the block map and the chunkserver roster into
// the protocol operations. Each subsystem keeps its own lock; no
// operation calls into the namespace or the roster while holding the
// block map mutex, inputs and outputs are copied across the boundary.
#[derive(Clone)]
pub struct NameSystem {
    pub namespace: Arc<dyn NameSpace>,
    pub block_manager: SyncBlockManager,
    pub cs_manager: SyncChunkServerManager,
    pub safe_mode: SafeModeGate,
    pub conf: Arc<NameserverConf>,
}

impl NameSystem {
    pub fn new(conf: &ClusterConf, namespace: Arc<dyn NameSpace>) -> FsResult<Self> {
        let block_manager = ArcMutex::new(BlockManager::new(conf.nameserver.default_replica_num));
        let cs_manager = ArcRwLock::new(ChunkServerManager::new());

        BlockMapLoader::load(namespace.as_ref(), &block_manager)?;

        let fs = Self {
            namespace,
            block_manager,
            cs_manager,
            safe_mode: SafeModeGate::new(),
            conf: Arc::new(conf.nameserver.clone()),
        };
        Ok(fs)
    }

    // Liveness accounting only happens for chunkservers on the current
    // metadata epoch; the returned version tells stale peers to resync.
    pub fn heart_beat(
        &self,
        addr: &str,
        namespace_version: i64,
        block_num: i64,
        data_size: i64,
        buffers: i32,
    ) -> i64 {
        let version = self.namespace.version();
        if namespace_version == version {
            let mut cm = self.cs_manager.write();
            cm.handle_heartbeat(addr, block_num, data_size, buffers);
        }
        version
    }

    pub fn create_file(&self, path: &str, flags: i32, mode: u32) -> FsResult<()> {
        self.namespace
            .create_file(path, flags, mode, self.conf.default_replica_num)
    }

    /// Allocate a new block for an open file and seed its replica set
    /// with a freshly chosen chunkserver chain.
    pub fn add_block(&self, path: &str) -> FsResult<LocatedBlock> {
        let mut file_info = match self.namespace.get_file_info(path) {
            None => {
                warn!("AddBlock file not found: {}", path);
                return Err(FsError::file_not_found(path));
            }
            Some(v) => v,
        };

        let replica_num = file_info.replicas;
        let chains = {
            let cm = self.cs_manager.read();
            cm.get_chunk_server_chains(replica_num)?
        };

        let new_block_id = {
            let mut bm = self.block_manager.lock();
            let id = bm.new_block_id();
            bm.add_new_block(id)?;
            // Seed the chosen chunkservers directly; the planner only
            // reacts to real reports.
            for (cs_id, _) in chains.iter().take(replica_num as usize) {
                bm.add_replica(id, *cs_id)?;
            }
            id
        };
        info!("AddBlock new block for {} id=#{}", path, new_block_id);

        let chosen: Vec<String> = chains
            .iter()
            .take(replica_num as usize)
            .map(|(_, addr)| addr.clone())
            .collect();

        file_info.blocks.push(new_block_id);
        file_info.version = -1;
        if let Err(e) = self.namespace.update_file_info(&file_info) {
            // The stranded block record is harmless: no file points at it
            // and the next restart recovers over it.
            warn!("Update file info fail: {}, {}", path, e);
            return Err(FsError::update_collision(path));
        }

        Ok(LocatedBlock::new(new_block_id, 0, chosen))
    }

    pub fn finish_block(&self, block_id: i64, block_version: i64) -> FsResult<()> {
        let mut bm = self.block_manager.lock();
        bm.set_block_version(block_id, block_version)?;
        bm.mark_block_stable(block_id)?;
        Ok(())
    }

    /// Resolve every readable replica of every block of the file.
    /// Blocks with no resolvable replica are skipped; replicas still
    /// under construction are hidden.
    pub fn get_file_location(&self, path: &str) -> FsResult<Vec<LocatedBlock>> {
        let file_info = match self.namespace.get_file_info(path) {
            None => return Err(FsError::file_not_found(path)),
            Some(v) => v,
        };

        let mut blocks = Vec::with_capacity(file_info.blocks.len());
        for block_id in &file_info.blocks {
            let block = {
                let bm = self.block_manager.lock();
                match bm.get_block(*block_id) {
                    Ok(v) => v,
                    Err(_) => {
                        warn!("GetFileLocation get block fail #{}", block_id);
                        continue;
                    }
                }
            };

            let cm = self.cs_manager.read();
            let mut chains = vec![];
            for cs_id in &block.replica {
                if block.pulling.contains(cs_id) {
                    info!("Replica under construction #{} on {}", block_id, cs_id);
                    continue;
                }
                match cm.get_chunk_server_addr(*cs_id) {
                    Some(addr) => chains.push(addr),
                    None => info!("Resolve chunkserver {} fail for #{}", cs_id, block_id),
                }
            }
            drop(cm);

            blocks.push(LocatedBlock::new(*block_id, block.block_size, chains));
        }

        Ok(blocks)
    }

    // File size is the sum of its block sizes; blocks the map no longer
    // knows contribute 0.
    pub fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let mut file_info = match self.namespace.get_file_info(path) {
            None => return Err(FsError::file_not_found(path)),
            Some(v) => v,
        };

        let bm = self.block_manager.lock();
        let mut file_size = 0;
        for block_id in &file_info.blocks {
            if let Ok(block) = bm.get_block(*block_id) {
                file_size += block.block_size;
            }
        }
        drop(bm);

        file_info.size = file_size;
        Ok(file_info)
    }

    pub fn list_directory(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        self.namespace.list_directory(path)
    }

    pub fn rename(&self, oldpath: &str, newpath: &str) -> FsResult<()> {
        let replaced = self.namespace.rename(oldpath, newpath)?;
        if let Some(file_info) = replaced {
            let mut bm = self.block_manager.lock();
            bm.remove_blocks_for_file(&file_info);
        }
        Ok(())
    }

    pub fn unlink(&self, path: &str) -> FsResult<()> {
        let file_info = self.namespace.remove_file(path)?;
        let mut bm = self.block_manager.lock();
        bm.remove_blocks_for_file(&file_info);
        Ok(())
    }

    pub fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<()> {
        if path.is_empty() || !path.starts_with(PATH_SEPARATOR) {
            return Err(FsError::invalid_path(path, "not an absolute path"));
        }

        let removed = self.namespace.delete_directory(path, recursive)?;
        let mut bm = self.block_manager.lock();
        for file_info in &removed {
            bm.remove_blocks_for_file(file_info);
        }
        Ok(())
    }

    pub fn change_replica_num(&self, path: &str, replica_num: i32) -> FsResult<()> {
        let mut file_info = match self.namespace.get_file_info(path) {
            None => {
                warn!("Change replica num not found: {}", path);
                return Err(FsError::file_not_found(path));
            }
            Some(v) => v,
        };

        file_info.replicas = replica_num;
        self.namespace.update_file_info(&file_info)?;

        let mut bm = self.block_manager.lock();
        for block_id in &file_info.blocks {
            bm.change_replica_num(*block_id, replica_num)?;
        }
        info!("Change {} replica num to {}", path, replica_num);
        Ok(())
    }

    pub fn pull_block_report(&self, cs_id: i32, blocks: &[i64]) {
        let mut bm = self.block_manager.lock();
        for block_id in blocks {
            bm.unmark_pull_block(cs_id, *block_id);
        }
    }

    pub fn sys_stat(&self) -> Vec<ChunkServerInfo> {
        let cm = self.cs_manager.read();
        cm.list_chunk_servers()
    }

    /// Reconcile one chunkserver's reported inventory against the block
    /// map, plan repair for divergent blocks, and hand back the pull
    /// commands owed to this chunkserver.
    pub fn block_report(&self, req: &BlockReportRequest) -> BlockReportResponse {
        let ns_version = self.namespace.version();
        let mut response = BlockReportResponse {
            sequence_id: req.sequence_id,
            status: status::OK,
            namespace_version: ns_version,
            chunkserver_id: req.chunkserver_id,
            ..Default::default()
        };

        if req.namespace_version != ns_version {
            if req.blocks.is_empty() {
                let id = {
                    let mut cm = self.cs_manager.write();
                    cm.add_chunk_server(&req.chunkserver_addr, req.disk_quota)
                };
                response.chunkserver_id = id;
            } else {
                // The whole inventory belongs to a stale epoch.
                for block in &req.blocks {
                    response.obsolete_blocks.push(block.block_id);
                }
                info!(
                    "Unknown chunkserver namespace version {} id={}",
                    req.namespace_version, req.chunkserver_id
                );
            }
            return response;
        }

        let mut cs_id = req.chunkserver_id;
        let old_id = {
            let cm = self.cs_manager.read();
            cm.get_chunkserver_id(&req.chunkserver_addr)
        };

        match old_id {
            None => {
                if !req.is_complete {
                    // A partial inventory cannot register a new peer.
                    response.status = status::PARTIAL_REPORT;
                    return response;
                }
                let mut cm = self.cs_manager.write();
                cs_id = cm.add_chunk_server(&req.chunkserver_addr, req.disk_quota);
            }

            Some(old) if cs_id == -1 => {
                cs_id = old;
                let mut cm = self.cs_manager.write();
                cm.inc_chunk_server_num();
                let cs_num = cm.get_chunk_server_num();
                drop(cm);
                info!(
                    "Reconnect chunkserver {} {}, cs_num={}",
                    cs_id, req.chunkserver_addr, cs_num
                );
            }

            Some(old) if cs_id != old => {
                warn!(
                    "Chunkserver {} id mismatch, old: {} new: {}",
                    req.chunkserver_addr, old, cs_id
                );
                response.status = status::PROTOCOL_MISMATCH;
                return response;
            }

            Some(_) => (),
        }

        for block in &req.blocks {
            let update = {
                let mut bm = self.block_manager.lock();
                bm.update_block_info(block.block_id, cs_id, block.block_size, block.version)
            };

            let more_replica_num = match update {
                BlockUpdate::Rejected => {
                    response.obsolete_blocks.push(block.block_id);
                    let mut cm = self.cs_manager.write();
                    cm.remove_block(cs_id, block.block_id);
                    info!("Obsolete block: #{}", block.block_id);
                    continue;
                }
                BlockUpdate::Accepted { more_replica_num } => {
                    let mut cm = self.cs_manager.write();
                    cm.add_block(cs_id, block.block_id);
                    more_replica_num
                }
            };

            if !self.safe_mode.is_on() && more_replica_num > 0 {
                self.plan_pulls(block.block_id, more_replica_num);
            }
        }

        // Recover replicas: hand over the pulls owed to this chunkserver.
        let pull_blocks = {
            let mut bm = self.block_manager.lock();
            bm.get_pull_blocks(cs_id)
        };
        if !pull_blocks.is_empty() {
            let cm = self.cs_manager.read();
            for (block_id, sources) in pull_blocks {
                let mut chunkserver_address = vec![];
                for src in sources {
                    if let Some(addr) = cm.get_chunk_server_addr(src) {
                        chunkserver_address.push(addr);
                    }
                }
                info!("Add pull block: #{} dst cs: {}", block_id, cs_id);
                response.new_replicas.push(ReplicaInfo {
                    block_id,
                    chunkserver_address,
                });
            }
        }

        response.chunkserver_id = cs_id;
        response
    }

    // Choose repair destinations for an under-replicated block: take the
    // roster's chain, skip existing holders, and queue pulls until the
    // deficit is covered or the chain runs out.
    fn plan_pulls(&self, block_id: i64, more_replica_num: i32) {
        let chains = {
            let cm = self.cs_manager.read();
            match cm.get_chunk_server_chains(more_replica_num) {
                Ok(v) => v,
                Err(e) => {
                    warn!("No chain for block #{}: {}", block_id, e);
                    return;
                }
            }
        };

        let mut bm = self.block_manager.lock();
        let replica_location = match bm.get_replica_location(block_id) {
            Ok(v) => v,
            // Unlinked while the chain was being chosen.
            Err(_) => return,
        };

        let mut num = 0;
        for (dst_cs, _) in chains {
            if num >= more_replica_num {
                break;
            }
            if replica_location.contains(&dst_cs) {
                continue;
            }
            if bm.mark_pull_block(dst_cs, block_id) {
                num += 1;
            }
        }

        // No suitable chunkserver: stabilize instead of leaving the block
        // permanently pending.
        if num == 0 {
            let _ = bm.mark_block_stable(block_id);
        }
    }
}

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

use crate::nameserver::meta::NameSpace;
use crate::nameserver::SyncBlockManager;
use nimbus_common::FsResult;
use log::info;

// Rebuilds the block map from the namespace walk at startup. Replica
// sets start empty and are populated by the first round of block
// reports; only the namespace is durable.
pub struct BlockMapLoader;

impl BlockMapLoader {
    pub fn load(namespace: &dyn NameSpace, block_manager: &SyncBlockManager) -> FsResult<usize> {
        let mut loaded = 0;
        for file in namespace.walk() {
            // One short critical section per file; the walk itself runs
            // outside the block map lock.
            let mut bm = block_manager.lock();
            for block_id in &file.blocks {
                bm.add_new_block(*block_id)?;
                bm.set_block_version(*block_id, file.version)?;
                bm.change_replica_num(*block_id, file.replicas)?;
                bm.mark_block_stable(*block_id)?;
                loaded += 1;
            }
        }

        info!("Recovered {} blocks from the namespace", loaded);
        Ok(loaded)
    }
}

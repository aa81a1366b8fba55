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

use crate::nameserver::{SyncBlockManager, SyncChunkServerManager};
use nimbus_common::error::FsError;
use nimbus_common::executor::LoopTask;
use nimbus_common::sync::AtomicFlag;
use log::warn;
use std::sync::Arc;

// Periodically expires chunkservers that stopped heartbeating and routes
// their block inventory into the block map's dead handling.
pub struct HeartbeatChecker {
    cs_manager: SyncChunkServerManager,
    block_manager: SyncBlockManager,
    chunkserver_lost_ms: u64,
    stop: Arc<AtomicFlag>,
}

impl HeartbeatChecker {
    pub fn new(
        cs_manager: SyncChunkServerManager,
        block_manager: SyncBlockManager,
        chunkserver_lost_ms: u64,
        stop: Arc<AtomicFlag>,
    ) -> Self {
        Self {
            cs_manager,
            block_manager,
            chunkserver_lost_ms,
            stop,
        }
    }
}

impl LoopTask for HeartbeatChecker {
    type Error = FsError;

    fn run(&self) -> Result<(), Self::Error> {
        // The roster sweep and the block-map cleanup take their locks in
        // sequence, never nested.
        let expired = {
            let mut cm = self.cs_manager.write();
            cm.remove_expired(self.chunkserver_lost_ms)
        };

        for (cs_id, block_ids) in expired {
            warn!(
                "Chunkserver {} expired, dealing {} dead blocks",
                cs_id,
                block_ids.len()
            );
            let mut bm = self.block_manager.lock();
            bm.deal_dead_blocks(cs_id, &block_ids);
        }

        Ok(())
    }

    fn terminate(&self) -> bool {
        self.stop.get()
    }
}

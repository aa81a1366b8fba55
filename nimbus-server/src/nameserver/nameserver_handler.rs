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

use crate::nameserver::fs::NameSystem;
use crate::nameserver::NameserverMetrics;
use nimbus_common::proto::*;
use log::{info, warn};
use std::sync::Arc;

// The protocol surface: one method per RPC operation. Each method echoes
// the request `sequence_id`, maps errors onto the wire status taxonomy,
// and bumps the matching event counter.
#[derive(Clone)]
pub struct NameserverHandler {
    pub(crate) fs: NameSystem,
    pub(crate) metrics: Arc<NameserverMetrics>,
}

impl NameserverHandler {
    pub fn new(fs: NameSystem, metrics: Arc<NameserverMetrics>) -> Self {
        Self { fs, metrics }
    }

    pub fn clone_fs(&self) -> NameSystem {
        self.fs.clone()
    }

    pub fn heart_beat(&self, req: HeartBeatRequest) -> HeartBeatResponse {
        self.metrics.heart_beat.inc();
        let namespace_version = self.fs.heart_beat(
            &req.chunkserver_addr,
            req.namespace_version,
            req.block_num,
            req.data_size,
            req.buffers,
        );

        HeartBeatResponse {
            sequence_id: req.sequence_id,
            status: status::OK,
            namespace_version,
        }
    }

    pub fn block_report(&self, req: BlockReportRequest) -> BlockReportResponse {
        self.metrics.block_report.inc();
        self.metrics.report_blocks.add(req.blocks.len() as i64);
        info!(
            "Report from {}, {}, {} blocks",
            req.chunkserver_id,
            req.chunkserver_addr,
            req.blocks.len()
        );

        self.fs.block_report(&req)
    }

    pub fn pull_block_report(&self, req: PullBlockReportRequest) -> PullBlockReportResponse {
        self.metrics.pull_block_report.inc();
        self.fs.pull_block_report(req.chunkserver_id, &req.blocks);

        PullBlockReportResponse {
            sequence_id: req.sequence_id,
            status: status::OK,
        }
    }

    pub fn create_file(&self, req: CreateFileRequest) -> CreateFileResponse {
        self.metrics.create_file.inc();
        let status = match self.fs.create_file(&req.file_name, req.flags, req.mode) {
            Ok(()) => status::OK,
            Err(e) => {
                warn!("Create file {} fail: {}", req.file_name, e);
                e.status()
            }
        };

        CreateFileResponse {
            sequence_id: req.sequence_id,
            status,
        }
    }

    pub fn add_block(&self, req: AddBlockRequest) -> AddBlockResponse {
        self.metrics.add_block.inc();
        let mut response = AddBlockResponse {
            sequence_id: req.sequence_id,
            ..Default::default()
        };

        match self.fs.add_block(&req.file_name) {
            Ok(block) => {
                response.block = Some(block);
                response.status = status::OK;
            }
            Err(e) => {
                warn!("AddBlock for {} failed: {}", req.file_name, e);
                response.status = e.status();
            }
        }
        response
    }

    pub fn finish_block(&self, req: FinishBlockRequest) -> FinishBlockResponse {
        let status = match self.fs.finish_block(req.block_id, req.block_version) {
            Ok(()) => status::OK,
            Err(e) => {
                warn!("FinishBlock #{} fail: {}", req.block_id, e);
                e.status()
            }
        };

        FinishBlockResponse {
            sequence_id: req.sequence_id,
            status,
        }
    }

    pub fn get_file_location(&self, req: FileLocationRequest) -> FileLocationResponse {
        self.metrics.get_location.inc();
        let mut response = FileLocationResponse {
            sequence_id: req.sequence_id,
            ..Default::default()
        };

        match self.fs.get_file_location(&req.file_name) {
            Ok(blocks) => {
                // Success if the file exists, however many blocks resolved.
                response.blocks = blocks;
                response.status = status::OK;
            }
            Err(e) => {
                info!("GetFileLocation {}: {}", req.file_name, e);
                response.status = e.status();
            }
        }
        response
    }

    pub fn list_directory(&self, req: ListDirectoryRequest) -> ListDirectoryResponse {
        self.metrics.list_dir.inc();
        let mut response = ListDirectoryResponse {
            sequence_id: req.sequence_id,
            ..Default::default()
        };

        match self.fs.list_directory(&req.path) {
            Ok(files) => {
                response.files = files;
                response.status = status::OK;
            }
            Err(e) => {
                info!("ListDirectory {}: {}", req.path, e);
                response.status = e.status();
            }
        }
        response
    }

    pub fn stat(&self, req: StatRequest) -> StatResponse {
        let mut response = StatResponse {
            sequence_id: req.sequence_id,
            ..Default::default()
        };

        match self.fs.stat(&req.path) {
            Ok(file_info) => {
                info!("Stat: {} return: {}", req.path, file_info.size);
                response.file_info = Some(file_info);
                response.status = status::OK;
            }
            Err(e) => {
                warn!("Stat {}: {}", req.path, e);
                response.status = e.status();
            }
        }
        response
    }

    pub fn rename(&self, req: RenameRequest) -> RenameResponse {
        let status = match self.fs.rename(&req.oldpath, &req.newpath) {
            Ok(()) => status::OK,
            Err(e) => {
                warn!("Rename {} -> {} fail: {}", req.oldpath, req.newpath, e);
                e.status()
            }
        };

        RenameResponse {
            sequence_id: req.sequence_id,
            status,
        }
    }

    pub fn unlink(&self, req: UnlinkRequest) -> UnlinkResponse {
        self.metrics.unlink.inc();
        let status = match self.fs.unlink(&req.path) {
            Ok(()) => status::OK,
            Err(e) => {
                info!("Unlink {}: {}", req.path, e);
                e.status()
            }
        };
        info!("Unlink: {} return {}", req.path, status);

        UnlinkResponse {
            sequence_id: req.sequence_id,
            status,
        }
    }

    pub fn delete_directory(&self, req: DeleteDirectoryRequest) -> DeleteDirectoryResponse {
        let status = match self.fs.delete_directory(&req.path, req.recursive) {
            Ok(()) => status::OK,
            Err(e) => {
                warn!("DeleteDirectory {} fail: {}", req.path, e);
                e.status()
            }
        };

        DeleteDirectoryResponse {
            sequence_id: req.sequence_id,
            status,
        }
    }

    pub fn change_replica_num(&self, req: ChangeReplicaNumRequest) -> ChangeReplicaNumResponse {
        let status = match self.fs.change_replica_num(&req.file_name, req.replica_num) {
            Ok(()) => status::OK,
            Err(e) => {
                warn!(
                    "Change {} replica num to {} fail: {}",
                    req.file_name, req.replica_num, e
                );
                e.status()
            }
        };

        ChangeReplicaNumResponse {
            sequence_id: req.sequence_id,
            status,
        }
    }

    pub fn sys_stat(&self, req: SysStatRequest) -> SysStatResponse {
        SysStatResponse {
            sequence_id: req.sequence_id,
            status: status::OK,
            chunkservers: self.fs.sys_stat(),
        }
    }
}

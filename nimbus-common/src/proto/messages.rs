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

use crate::state::{ChunkServerInfo, FileInfo, LocatedBlock};
use serde::{Deserialize, Serialize};

// Every response echoes the request `sequence_id` and carries a `status`
// from the taxonomy in `proto::status`.

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeartBeatRequest {
    pub sequence_id: i64,
    pub chunkserver_addr: String,
    pub namespace_version: i64,
    pub block_num: i64,
    pub data_size: i64,
    pub buffers: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeartBeatResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub namespace_version: i64,
}

// One block of the reporting chunkserver's local inventory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportBlockInfo {
    pub block_id: i64,
    pub block_size: i64,
    pub version: i64,
}

impl ReportBlockInfo {
    pub fn new(block_id: i64, block_size: i64, version: i64) -> Self {
        Self {
            block_id,
            block_size,
            version,
        }
    }
}

// A pull instruction: the destination fetches `block_id` from one of the
// source addresses.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplicaInfo {
    pub block_id: i64,
    pub chunkserver_address: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockReportRequest {
    pub sequence_id: i64,
    pub chunkserver_id: i32,
    pub chunkserver_addr: String,
    pub namespace_version: i64,
    pub is_complete: bool,
    pub disk_quota: i64,
    pub blocks: Vec<ReportBlockInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockReportResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub namespace_version: i64,
    pub chunkserver_id: i32,
    // Blocks the chunkserver must delete.
    pub obsolete_blocks: Vec<i64>,
    // Blocks the chunkserver must pull from the listed sources.
    pub new_replicas: Vec<ReplicaInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PullBlockReportRequest {
    pub sequence_id: i64,
    pub chunkserver_id: i32,
    pub blocks: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PullBlockReportResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateFileRequest {
    pub sequence_id: i64,
    pub file_name: String,
    pub flags: i32,
    pub mode: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateFileResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddBlockRequest {
    pub sequence_id: i64,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddBlockResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub block: Option<LocatedBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FinishBlockRequest {
    pub sequence_id: i64,
    pub block_id: i64,
    pub block_version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FinishBlockResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileLocationRequest {
    pub sequence_id: i64,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileLocationResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub blocks: Vec<LocatedBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListDirectoryRequest {
    pub sequence_id: i64,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListDirectoryResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatRequest {
    pub sequence_id: i64,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub file_info: Option<FileInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameRequest {
    pub sequence_id: i64,
    pub oldpath: String,
    pub newpath: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnlinkRequest {
    pub sequence_id: i64,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnlinkResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeleteDirectoryRequest {
    pub sequence_id: i64,
    pub path: String,
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeleteDirectoryResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChangeReplicaNumRequest {
    pub sequence_id: i64,
    pub file_name: String,
    pub replica_num: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChangeReplicaNumResponse {
    pub sequence_id: i64,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SysStatRequest {
    pub sequence_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SysStatResponse {
    pub sequence_id: i64,
    pub status: i32,
    pub chunkservers: Vec<ChunkServerInfo>,
}

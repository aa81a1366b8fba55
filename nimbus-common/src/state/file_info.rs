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

// File metadata kept by the namespace. The nameserver core only reads
// and writes `blocks`, `version` and `replicas`; everything else is
// owned by the namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    pub entry_id: i64,
    pub name: String,
    pub mode: u32,
    pub size: i64,
    pub ctime: u64,
    // The configured replication factor.
    pub replicas: i32,
    // -1 means the file is open for writing.
    pub version: i64,
    pub blocks: Vec<i64>,
}

impl Default for FileInfo {
    fn default() -> Self {
        Self {
            entry_id: 0,
            name: "".to_string(),
            mode: 0o644,
            size: 0,
            ctime: 0,
            replicas: 3,
            version: -1,
            blocks: vec![],
        }
    }
}

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

use crate::nameserver::fs::{BlockManager, ChunkServerManager};
use nimbus_common::sync::{ArcMutex, ArcRwLock};

pub mod meta;

pub mod fs;

mod nameserver_handler;
pub use self::nameserver_handler::*;

mod nameserver_metrics;
pub use self::nameserver_metrics::*;

mod nameserver_server;
pub use self::nameserver_server::*;

pub type SyncBlockManager = ArcMutex<BlockManager>;
pub type SyncChunkServerManager = ArcRwLock<ChunkServerManager>;

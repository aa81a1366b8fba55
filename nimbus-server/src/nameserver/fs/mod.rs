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

mod block_manager;
pub use self::block_manager::*;

mod block_map_loader;
pub use self::block_map_loader::BlockMapLoader;

mod chunkserver_manager;
pub use self::chunkserver_manager::ChunkServerManager;

mod heartbeat_checker;
pub use self::heartbeat_checker::HeartbeatChecker;

mod name_system;
pub use self::name_system::NameSystem;

mod safe_mode;
pub use self::safe_mode::SafeModeGate;

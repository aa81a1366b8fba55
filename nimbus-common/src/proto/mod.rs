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

mod messages;
pub use self::messages::*;

// Response status taxonomy, preserved for wire compatibility.
pub mod status {
    pub const OK: i32 = 0;
    // A partial block report arrived from a chunkserver the roster has never seen.
    pub const PARTIAL_REPORT: i32 = 403;
    pub const NOT_FOUND: i32 = 404;
    // The namespace update lost the race with a concurrent writer.
    pub const UPDATE_COLLISION: i32 = 826;
    // Generic failure: no chunkserver chain, invalid path, allocation failure.
    pub const FAILED: i32 = 886;
    pub const PROTOCOL_MISMATCH: i32 = -1;
}

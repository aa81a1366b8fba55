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

use crate::utils::{DurationUnit, LogConf};
use crate::{err_box, FsResult};
use serde::{Deserialize, Serialize};

// nameserver configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NameserverConf {
    pub hostname: String,
    pub rpc_port: u16,
    pub web_port: u16,

    // Replication factor applied to newly created files.
    pub default_replica_num: i32,

    // How long repair stays suppressed after startup.
    pub safemode_interval: String,
    #[serde(skip)]
    pub safemode_interval_unit: DurationUnit,

    // How often the heartbeat checker scans the roster.
    pub chunkserver_check_interval: String,
    #[serde(skip)]
    pub chunkserver_check_interval_unit: DurationUnit,

    // A chunkserver silent for longer than this is declared dead.
    pub chunkserver_lost_interval: String,
    #[serde(skip)]
    pub chunkserver_lost_interval_unit: DurationUnit,

    // How often the one-line counter summary is logged.
    pub status_log_interval: String,
    #[serde(skip)]
    pub status_log_interval_unit: DurationUnit,

    pub log: LogConf,
}

impl NameserverConf {
    pub fn init(&mut self) -> FsResult<()> {
        self.safemode_interval_unit = DurationUnit::from_str(&self.safemode_interval)?;
        self.chunkserver_check_interval_unit =
            DurationUnit::from_str(&self.chunkserver_check_interval)?;
        self.chunkserver_lost_interval_unit =
            DurationUnit::from_str(&self.chunkserver_lost_interval)?;
        self.status_log_interval_unit = DurationUnit::from_str(&self.status_log_interval)?;

        if self.chunkserver_check_interval_unit > self.chunkserver_lost_interval_unit {
            return err_box!(
                "chunkserver_lost_interval must be greater than chunkserver_check_interval"
            );
        }

        if self.default_replica_num < 1 {
            return err_box!(
                "default_replica_num must be positive, actual: {}",
                self.default_replica_num
            );
        }

        Ok(())
    }

    pub fn safemode_interval_ms(&self) -> u64 {
        self.safemode_interval_unit.as_millis()
    }

    pub fn chunkserver_check_interval_ms(&self) -> u64 {
        self.chunkserver_check_interval_unit.as_millis()
    }

    pub fn chunkserver_lost_interval_ms(&self) -> u64 {
        self.chunkserver_lost_interval_unit.as_millis()
    }

    pub fn status_log_interval_ms(&self) -> u64 {
        self.status_log_interval_unit.as_millis()
    }
}

impl Default for NameserverConf {
    fn default() -> Self {
        let mut conf = Self {
            hostname: "localhost".to_string(),
            rpc_port: 8828,
            web_port: 8838,

            default_replica_num: 3,

            safemode_interval: "60s".to_string(),
            safemode_interval_unit: Default::default(),

            chunkserver_check_interval: "10s".to_string(),
            chunkserver_check_interval_unit: Default::default(),

            chunkserver_lost_interval: "2m".to_string(),
            chunkserver_lost_interval_unit: Default::default(),

            status_log_interval: "1s".to_string(),
            status_log_interval_unit: Default::default(),

            log: Default::default(),
        };

        conf.init().unwrap();
        conf
    }
}

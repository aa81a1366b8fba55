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

use crate::conf::NameserverConf;
use crate::utils::LogConf;
use crate::FsResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::read_to_string;

// Cluster configuration files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClusterConf {
    // Whether it is in unit test state. In this state background tasks are
    // not started, which facilitates unit tests to drive the protocol by hand.
    pub testing: bool,

    pub cluster_id: String,

    pub nameserver: NameserverConf,

    pub log: LogConf,
}

impl ClusterConf {
    pub const ENV_NAMESERVER_HOSTNAME: &'static str = "NIMBUS_NAMESERVER_HOSTNAME";
    pub const ENV_CONF_FILE: &'static str = "NIMBUS_CONF_FILE";

    pub fn from<T: AsRef<str>>(path: T) -> FsResult<Self> {
        let str = read_to_string(path.as_ref())?;
        let mut conf = toml::from_str::<Self>(&str)?;

        // Check the environment variable configuration.
        if let Ok(v) = env::var(Self::ENV_NAMESERVER_HOSTNAME) {
            conf.nameserver.hostname = v;
        }

        conf.nameserver.init()?;

        Ok(conf)
    }

    pub fn nameserver_addr(&self) -> String {
        format!("{}:{}", self.nameserver.hostname, self.nameserver.rpc_port)
    }

    pub fn to_pretty_toml(&self) -> FsResult<String> {
        match toml::to_string_pretty(self) {
            Ok(v) => Ok(v),
            Err(e) => crate::err_box!(e),
        }
    }
}

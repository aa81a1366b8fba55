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

use crate::nameserver::fs::{HeartbeatChecker, NameSystem};
use crate::nameserver::meta::NameSpace;
use crate::nameserver::{NameserverHandler, NameserverMetrics, StatusLogger};
use nimbus_common::conf::ClusterConf;
use nimbus_common::executor::ScheduledExecutor;
use nimbus_common::sync::AtomicFlag;
use nimbus_common::utils::{epoch_mills, Logger};
use nimbus_common::FsResult;
use log::info;
use std::sync::Arc;

// Wires the pieces of the nameserver together: recovery of the block
// map from the namespace, the safemode timer, the heartbeat checker and
// the status logger. The RPC transport hands each request to a
// `NameserverHandler` obtained from `handler()`.
pub struct Nameserver {
    pub start_time: u64,
    fs: NameSystem,
    metrics: Arc<NameserverMetrics>,
    stop: Arc<AtomicFlag>,
    conf: ClusterConf,
}

impl Nameserver {
    pub fn with_conf(conf: ClusterConf, namespace: Arc<dyn NameSpace>) -> FsResult<Self> {
        Logger::init(conf.log.clone());

        let fs = NameSystem::new(&conf, namespace)?;
        let metrics = NameserverMetrics::new();
        let stop = Arc::new(AtomicFlag::new(false));

        let server = Self {
            start_time: epoch_mills(),
            fs,
            metrics,
            stop,
            conf,
        };

        // Unit tests drive the protocol by hand and leave safemode
        // explicitly.
        if !server.conf.testing {
            server.start_tasks()?;
        }

        info!("Nameserver started, cluster_id={}", server.conf.cluster_id);
        Ok(server)
    }

    fn start_tasks(&self) -> FsResult<()> {
        let ns_conf = &self.conf.nameserver;

        self.fs.safe_mode.start_timer(ns_conf.safemode_interval_ms())?;

        let checker = HeartbeatChecker::new(
            self.fs.cs_manager.clone(),
            self.fs.block_manager.clone(),
            ns_conf.chunkserver_lost_interval_ms(),
            self.stop.clone(),
        );
        ScheduledExecutor::new(
            "chunkserver-check",
            ns_conf.chunkserver_check_interval_ms(),
        )
        .start(checker)?;

        let status_logger = StatusLogger::new(self.metrics.clone(), self.stop.clone());
        ScheduledExecutor::new("status-log", ns_conf.status_log_interval_ms())
            .start(status_logger)?;

        Ok(())
    }

    pub fn handler(&self) -> NameserverHandler {
        NameserverHandler::new(self.fs.clone(), self.metrics.clone())
    }

    pub fn clone_fs(&self) -> NameSystem {
        self.fs.clone()
    }

    pub fn conf(&self) -> &ClusterConf {
        &self.conf
    }

    pub fn shutdown(&self) {
        self.stop.set(true);
        info!("Nameserver shutdown");
    }
}

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

use nimbus_common::error::FsError;
use nimbus_common::executor::LoopTask;
use nimbus_common::sync::{AtomicCounter, AtomicFlag};
use log::info;
use std::sync::Arc;

// Per-operation event counters. Reset-and-read is atomic per counter:
// the status line reports one interval's worth of events.
#[derive(Default)]
pub struct NameserverMetrics {
    pub create_file: AtomicCounter,
    pub list_dir: AtomicCounter,
    pub get_location: AtomicCounter,
    pub add_block: AtomicCounter,
    pub unlink: AtomicCounter,
    pub block_report: AtomicCounter,
    pub report_blocks: AtomicCounter,
    pub heart_beat: AtomicCounter,
    pub pull_block_report: AtomicCounter,
}

impl NameserverMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

// Logs the one-line counter summary each interval.
pub struct StatusLogger {
    metrics: Arc<NameserverMetrics>,
    stop: Arc<AtomicFlag>,
}

impl StatusLogger {
    pub fn new(metrics: Arc<NameserverMetrics>, stop: Arc<AtomicFlag>) -> Self {
        Self { metrics, stop }
    }
}

impl LoopTask for StatusLogger {
    type Error = FsError;

    fn run(&self) -> Result<(), Self::Error> {
        let m = &self.metrics;
        info!(
            "[Status] create {} list {} get_loc {} add_block {} unlink {} report {} {} heartbeat {}",
            m.create_file.clear(),
            m.list_dir.clear(),
            m.get_location.clear(),
            m.add_block.clear(),
            m.unlink.clear(),
            m.block_report.clear(),
            m.report_blocks.clear(),
            m.heart_beat.clear()
        );
        Ok(())
    }

    fn terminate(&self) -> bool {
        self.stop.get()
    }
}

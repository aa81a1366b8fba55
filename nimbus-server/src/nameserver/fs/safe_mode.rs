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

use nimbus_common::executor::ScheduledExecutor;
use nimbus_common::sync::AtomicFlag;
use nimbus_common::FsResult;
use log::info;
use std::sync::Arc;

// The startup window during which block reports are absorbed but repair
// is not initiated: chunkservers are still re-reporting their inventory,
// and pulls planned from a half-known cluster would be wasted.
#[derive(Clone)]
pub struct SafeModeGate {
    flag: Arc<AtomicFlag>,
}

impl SafeModeGate {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicFlag::new(true)),
        }
    }

    pub fn is_on(&self) -> bool {
        self.flag.get()
    }

    pub fn leave(&self) {
        if self.flag.get() {
            self.flag.set(false);
            info!("Nameserver leave safemode");
        }
    }

    // Fires once after `interval_ms` and clears the flag.
    pub fn start_timer(&self, interval_ms: u64) -> FsResult<()> {
        let gate = self.clone();
        ScheduledExecutor::new("safemode-timer", interval_ms).delay(move || gate.leave())
    }
}

impl Default for SafeModeGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::nameserver::fs::SafeModeGate;

    #[test]
    fn timer_clears_flag() {
        let gate = SafeModeGate::new();
        assert!(gate.is_on());

        gate.start_timer(10).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(!gate.is_on());
    }
}

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

use crate::utils::epoch_mills;
use crate::FsResult;
use log::warn;
use std::fmt::Display;
use std::thread;
use std::time::Duration;

// A periodically executed background task.
pub trait LoopTask {
    type Error: Display;

    fn run(&self) -> Result<(), Self::Error>;

    fn terminate(&self) -> bool;
}

// Schedules execution threads
pub struct ScheduledExecutor {
    interval_ms: u64,
    thread_name: String,
}

impl ScheduledExecutor {
    pub fn new(thread_name: impl Into<String>, interval_ms: u64) -> Self {
        Self {
            thread_name: thread_name.into(),
            interval_ms,
        }
    }

    pub fn start<T>(self, task: T) -> FsResult<()>
    where
        T: LoopTask + Send + 'static,
    {
        let name = self.thread_name.to_string();
        let builder = thread::Builder::new().name(name.clone());
        let interval_ms = self.interval_ms;
        builder.spawn(move || {
            Self::loop0(interval_ms, name, task);
        })?;

        Ok(())
    }

    // Run the task once after the interval elapses, then exit the thread.
    pub fn delay<F>(self, task: F) -> FsResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let builder = thread::Builder::new().name(self.thread_name.clone());
        let interval_ms = self.interval_ms;
        builder.spawn(move || {
            thread::sleep(Duration::from_millis(interval_ms));
            task();
        })?;

        Ok(())
    }

    pub fn loop0<T>(interval_ms: u64, name: String, task: T)
    where
        T: LoopTask + Send + 'static,
    {
        let mut next_ms = epoch_mills() + interval_ms;
        while !task.terminate() {
            if epoch_mills() >= next_ms {
                if let Err(e) = task.run() {
                    // An error occurs only logging.
                    warn!("Scheduler thread {}, run fail: {}", name, e);
                }
                next_ms = epoch_mills() + interval_ms;
            }

            let wait_ms = next_ms.saturating_sub(epoch_mills());
            if wait_ms >= 1 {
                thread::sleep(Duration::from_millis(wait_ms))
            }
        }
    }
}

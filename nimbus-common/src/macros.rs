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

// Create an error message and add the thread, file and line information.
#[macro_export]
macro_rules! err_msg {
    ($e:expr) => ({
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("unknown");
        format!("[{}] ERROR: {}({}:{})", name, $e, file!(), line!())
    });

    ($f:tt, $($arg:expr),+) => ({
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("unknown");
        format!("[{}] ERROR: {}({}:{})", name, format!($f, $($arg),+), file!(), line!())
    });
}

// Convert the error type and add the thread id, file name and line number that occurred.
// There are two forms as follows:
// 1. String error: err_box!("{}", "error")
// 2. Error error: err_box!(std::error::Error)
#[macro_export]
macro_rules! err_box {
    ($e:expr) => ({
        Err($crate::err_msg!($e).into())
    });

    ($f:tt, $($arg:expr),+) => ({
        $crate::err_box!(format!($f, $($arg),+))
    });
}

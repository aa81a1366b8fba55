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

use crate::proto::status;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::io;
use thiserror::Error;

// Uniformly defined file system error codes.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, IntoPrimitive, FromPrimitive)]
pub enum ErrorKind {
    IO = 1,
    FileAlreadyExists = 2,
    FileNotFound = 3,
    BlockNotFound = 4,
    BlockExists = 5,
    InvalidPath = 6,
    DirNotEmpty = 7,
    NoChunkServer = 8,
    UpdateCollision = 9,
    PartialReport = 10,
    ProtocolMismatch = 11,

    #[num_enum(default)]
    Common = 10000,
}

#[derive(Debug, Error)]
pub enum FsError {
    // io error.
    #[error("{0}")]
    IO(io::Error),

    // The file already exists
    #[error("{0}")]
    FileAlreadyExists(String),

    // The file does not exist
    #[error("{0}")]
    FileNotFound(String),

    // The block is not in the block map.
    #[error("{0}")]
    BlockNotFound(String),

    // The block id has already been registered.
    #[error("{0}")]
    BlockExists(String),

    // The path is incorrect.
    #[error("{0}")]
    InvalidPath(String),

    // The directory is not empty
    #[error("{0}")]
    DirNotEmpty(String),

    // No chunkserver chain can be assembled.
    #[error("{0}")]
    NoChunkServer(String),

    // The namespace update lost the race with a concurrent writer.
    #[error("{0}")]
    UpdateCollision(String),

    // A partial block report arrived from an unregistered chunkserver.
    #[error("{0}")]
    PartialReport(String),

    // The peer violated the report protocol.
    #[error("{0}")]
    ProtocolMismatch(String),

    // Other errors that are not defined.
    #[error("{0}")]
    Common(String),
}

impl FsError {
    pub fn common<T: AsRef<str>>(error: T) -> Self {
        Self::Common(error.as_ref().to_string())
    }

    pub fn file_not_found(path: impl AsRef<str>) -> Self {
        Self::FileNotFound(format!("File {} not found", path.as_ref()))
    }

    pub fn file_exists(path: impl AsRef<str>) -> Self {
        Self::FileAlreadyExists(format!("File {} already exists", path.as_ref()))
    }

    pub fn block_not_found(block_id: i64) -> Self {
        Self::BlockNotFound(format!("Block #{} not found", block_id))
    }

    pub fn block_exists(block_id: i64) -> Self {
        Self::BlockExists(format!("Block #{} already exists", block_id))
    }

    pub fn invalid_path(path: impl AsRef<str>, ext_msg: impl AsRef<str>) -> Self {
        Self::InvalidPath(format!(
            "Path {} is invalid, {}",
            path.as_ref(),
            ext_msg.as_ref()
        ))
    }

    pub fn dir_not_empty(path: impl AsRef<str>) -> Self {
        Self::DirNotEmpty(format!("Directory {} is not empty", path.as_ref()))
    }

    pub fn no_chunk_server(want: i32, have: usize) -> Self {
        Self::NoChunkServer(format!(
            "Cannot assemble a chain of {} chunkservers, {} alive",
            want, have
        ))
    }

    pub fn update_collision(path: impl AsRef<str>) -> Self {
        Self::UpdateCollision(format!("Update file info fail: {}", path.as_ref()))
    }

    pub fn partial_report(addr: impl AsRef<str>) -> Self {
        Self::PartialReport(format!(
            "Partial report from unknown chunkserver {}",
            addr.as_ref()
        ))
    }

    pub fn protocol_mismatch(msg: impl Into<String>) -> Self {
        Self::ProtocolMismatch(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::IO(_) => ErrorKind::IO,
            FsError::FileAlreadyExists(_) => ErrorKind::FileAlreadyExists,
            FsError::FileNotFound(_) => ErrorKind::FileNotFound,
            FsError::BlockNotFound(_) => ErrorKind::BlockNotFound,
            FsError::BlockExists(_) => ErrorKind::BlockExists,
            FsError::InvalidPath(_) => ErrorKind::InvalidPath,
            FsError::DirNotEmpty(_) => ErrorKind::DirNotEmpty,
            FsError::NoChunkServer(_) => ErrorKind::NoChunkServer,
            FsError::UpdateCollision(_) => ErrorKind::UpdateCollision,
            FsError::PartialReport(_) => ErrorKind::PartialReport,
            FsError::ProtocolMismatch(_) => ErrorKind::ProtocolMismatch,
            FsError::Common(_) => ErrorKind::Common,
        }
    }

    // Map onto the wire status taxonomy; every code is preserved for
    // compatibility with existing chunkservers and clients.
    pub fn status(&self) -> i32 {
        match self.kind() {
            ErrorKind::FileNotFound => status::NOT_FOUND,
            ErrorKind::UpdateCollision => status::UPDATE_COLLISION,
            ErrorKind::PartialReport => status::PARTIAL_REPORT,
            ErrorKind::ProtocolMismatch => status::PROTOCOL_MISMATCH,
            _ => status::FAILED,
        }
    }
}

impl From<String> for FsError {
    fn from(value: String) -> Self {
        FsError::Common(value)
    }
}

impl From<&str> for FsError {
    fn from(value: &str) -> Self {
        FsError::Common(value.to_string())
    }
}

impl From<io::Error> for FsError {
    fn from(value: io::Error) -> Self {
        Self::IO(value)
    }
}

impl From<toml::de::Error> for FsError {
    fn from(value: toml::de::Error) -> Self {
        Self::Common(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, FsError};
    use crate::proto::status;

    #[test]
    fn status_mapping() {
        assert_eq!(FsError::file_not_found("/a").status(), status::NOT_FOUND);
        assert_eq!(FsError::update_collision("/a").status(), status::UPDATE_COLLISION);
        assert_eq!(FsError::partial_report("cs1:8825").status(), status::PARTIAL_REPORT);
        assert_eq!(
            FsError::protocol_mismatch("id mismatch").status(),
            status::PROTOCOL_MISMATCH
        );
        assert_eq!(FsError::no_chunk_server(3, 1).status(), status::FAILED);
    }

    #[test]
    fn err_box_creates_common() {
        fn failing() -> crate::FsResult<()> {
            crate::err_box!("bad state {}", 1)
        }

        let e = failing().unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Common);
        assert!(e.to_string().contains("bad state 1"));
    }
}

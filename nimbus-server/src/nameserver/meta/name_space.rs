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
use nimbus_common::state::FileInfo;
use nimbus_common::sync::AtomicLong;
use nimbus_common::utils::epoch_mills;
use nimbus_common::FsResult;
use log::info;
use std::collections::BTreeMap;
use std::sync::RwLock;

pub const PATH_SEPARATOR: &str = "/";

// The hierarchical file store the nameserver core runs against. It owns
// its own synchronization and durability; the core never holds the block
// map mutex across a call into it.
pub trait NameSpace: Send + Sync {
    // Metadata epoch; chunkservers carrying a stale version are forced
    // to resynchronize.
    fn version(&self) -> i64;

    fn create_file(&self, path: &str, flags: i32, mode: u32, replicas: i32) -> FsResult<()>;

    fn get_file_info(&self, path: &str) -> Option<FileInfo>;

    fn update_file_info(&self, file_info: &FileInfo) -> FsResult<()>;

    // Returns the file the destination replaced, to be unlinked by the caller.
    fn rename(&self, oldpath: &str, newpath: &str) -> FsResult<Option<FileInfo>>;

    fn remove_file(&self, path: &str) -> FsResult<FileInfo>;

    // Returns every file removed, to be unlinked by the caller.
    fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<Vec<FileInfo>>;

    fn list_directory(&self, path: &str) -> FsResult<Vec<FileInfo>>;

    // The startup walk: a finite sequence of every file record, consumed
    // by the recovery loader to rebuild the block map.
    fn walk(&self) -> Box<dyn Iterator<Item = FileInfo> + '_>;
}

// In-memory namespace. File records are keyed by absolute path in a
// sorted map, so directory listing and recursive deletion are prefix
// scans; directories exist implicitly.
pub struct MemNameSpace {
    version: i64,
    files: RwLock<BTreeMap<String, FileInfo>>,
    next_entry_id: AtomicLong,
}

impl MemNameSpace {
    pub fn new() -> Self {
        let version = epoch_mills() as i64;
        info!("Namespace version: {}", version);

        Self {
            version,
            files: RwLock::new(BTreeMap::new()),
            next_entry_id: AtomicLong::new(1),
        }
    }

    fn check_path(path: &str) -> FsResult<()> {
        if path.is_empty() || !path.starts_with(PATH_SEPARATOR) {
            return Err(FsError::invalid_path(path, "not an absolute path"));
        }
        Ok(())
    }

    fn dir_prefix(path: &str) -> String {
        if path.ends_with(PATH_SEPARATOR) {
            path.to_string()
        } else {
            format!("{}{}", path, PATH_SEPARATOR)
        }
    }
}

impl Default for MemNameSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl NameSpace for MemNameSpace {
    fn version(&self) -> i64 {
        self.version
    }

    fn create_file(&self, path: &str, _flags: i32, mode: u32, replicas: i32) -> FsResult<()> {
        Self::check_path(path)?;

        let mut files = self.files.write().unwrap();
        if files.contains_key(path) {
            return Err(FsError::file_exists(path));
        }

        let info = FileInfo {
            entry_id: self.next_entry_id.next(),
            name: path.to_string(),
            mode,
            size: 0,
            ctime: epoch_mills(),
            replicas,
            version: 0,
            blocks: vec![],
        };
        files.insert(path.to_string(), info);
        Ok(())
    }

    fn get_file_info(&self, path: &str) -> Option<FileInfo> {
        let files = self.files.read().unwrap();
        files.get(path).cloned()
    }

    fn update_file_info(&self, file_info: &FileInfo) -> FsResult<()> {
        let mut files = self.files.write().unwrap();
        match files.get_mut(&file_info.name) {
            Some(v) => {
                *v = file_info.clone();
                Ok(())
            }
            // The file vanished between get and update.
            None => Err(FsError::update_collision(&file_info.name)),
        }
    }

    fn rename(&self, oldpath: &str, newpath: &str) -> FsResult<Option<FileInfo>> {
        Self::check_path(oldpath)?;
        Self::check_path(newpath)?;

        let mut files = self.files.write().unwrap();
        let mut info = match files.remove(oldpath) {
            None => return Err(FsError::file_not_found(oldpath)),
            Some(v) => v,
        };

        info.name = newpath.to_string();
        let replaced = files.insert(newpath.to_string(), info);
        Ok(replaced)
    }

    fn remove_file(&self, path: &str) -> FsResult<FileInfo> {
        let mut files = self.files.write().unwrap();
        match files.remove(path) {
            Some(v) => Ok(v),
            None => Err(FsError::file_not_found(path)),
        }
    }

    fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<Vec<FileInfo>> {
        Self::check_path(path)?;
        let prefix = Self::dir_prefix(path);

        let mut files = self.files.write().unwrap();
        let names: Vec<String> = files
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();

        if !names.is_empty() && !recursive {
            return Err(FsError::dir_not_empty(path));
        }

        let mut removed = Vec::with_capacity(names.len());
        for name in names {
            if let Some(info) = files.remove(&name) {
                removed.push(info);
            }
        }
        Ok(removed)
    }

    fn list_directory(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        Self::check_path(path)?;

        let files = self.files.read().unwrap();

        // Listing a plain file returns the file itself.
        if let Some(v) = files.get(path) {
            return Ok(vec![v.clone()]);
        }

        let prefix = Self::dir_prefix(path);
        let list: Vec<FileInfo> = files
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains(PATH_SEPARATOR))
            .map(|(_, v)| v.clone())
            .collect();

        if list.is_empty() && path != PATH_SEPARATOR {
            return Err(FsError::file_not_found(path));
        }
        Ok(list)
    }

    fn walk(&self) -> Box<dyn Iterator<Item = FileInfo> + '_> {
        let files: Vec<FileInfo> = self.files.read().unwrap().values().cloned().collect();
        Box::new(files.into_iter())
    }
}

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

use nimbus_common::conf::ClusterConf;
use nimbus_common::proto::*;
use nimbus_common::sync::AtomicFlag;
use nimbus_common::FsResult;
use nimbus_server::nameserver::fs::{HeartbeatChecker, NameSystem};
use nimbus_server::nameserver::meta::MemNameSpace;
use nimbus_server::nameserver::meta::NameSpace;
use nimbus_server::nameserver::{Nameserver, NameserverHandler};
use nimbus_common::executor::LoopTask;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Test the nameserver protocol without a cluster startup. In testing
// mode background tasks are not started and safemode is left by hand.
fn new_handler() -> NameserverHandler {
    let conf = ClusterConf {
        testing: true,
        cluster_id: "nimbus-test".to_string(),
        ..Default::default()
    };

    let namespace = Arc::new(MemNameSpace::new());
    let server = Nameserver::with_conf(conf, namespace).unwrap();
    server.handler()
}

fn register(handler: &NameserverHandler, addr: &str) -> i32 {
    let fs = handler.clone_fs();
    let response = handler.block_report(BlockReportRequest {
        sequence_id: 1,
        chunkserver_id: -1,
        chunkserver_addr: addr.to_string(),
        namespace_version: fs.namespace.version(),
        is_complete: true,
        disk_quota: 1 << 30,
        blocks: vec![],
    });

    assert_eq!(response.status, status::OK);
    response.chunkserver_id
}

fn report_one(
    handler: &NameserverHandler,
    cs_id: i32,
    addr: &str,
    block: ReportBlockInfo,
) -> BlockReportResponse {
    let fs = handler.clone_fs();
    handler.block_report(BlockReportRequest {
        sequence_id: 1,
        chunkserver_id: cs_id,
        chunkserver_addr: addr.to_string(),
        namespace_version: fs.namespace.version(),
        is_complete: false,
        disk_quota: 1 << 30,
        blocks: vec![block],
    })
}

fn report_empty(handler: &NameserverHandler, cs_id: i32, addr: &str) -> BlockReportResponse {
    let fs = handler.clone_fs();
    handler.block_report(BlockReportRequest {
        sequence_id: 1,
        chunkserver_id: cs_id,
        chunkserver_addr: addr.to_string(),
        namespace_version: fs.namespace.version(),
        is_complete: false,
        disk_quota: 1 << 30,
        blocks: vec![],
    })
}

// Pre-seed a block the way earlier allocation and reports would have.
fn seed_block(fs: &NameSystem, block_id: i64, holders: &[i32]) -> FsResult<()> {
    let mut bm = fs.block_manager.lock();
    bm.add_new_block(block_id)?;
    for cs in holders {
        bm.add_replica(block_id, *cs)?;
    }
    drop(bm);

    let mut cm = fs.cs_manager.write();
    for cs in holders {
        cm.add_block(*cs, block_id);
    }
    Ok(())
}

#[test]
fn happy_allocation() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    let cs2 = register(&handler, "cs-b:8825");
    let cs3 = register(&handler, "cs-c:8825");

    let response = handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/f".to_string(),
        flags: 0,
        mode: 0o644,
    });
    assert_eq!(response.status, status::OK);

    let response = handler.add_block(AddBlockRequest {
        sequence_id: 2,
        file_name: "/f".to_string(),
    });
    assert_eq!(response.status, status::OK);
    assert_eq!(response.sequence_id, 2);

    let block = response.block.unwrap();
    assert_eq!(block.block_id, 1);
    assert_eq!(block.chains.len(), 3);
    for addr in ["cs-a:8825", "cs-b:8825", "cs-c:8825"] {
        assert!(block.chains.contains(&addr.to_string()));
    }

    // The index is seeded with the chosen chain.
    let meta = fs.block_manager.lock().get_block(1)?;
    for cs in [cs1, cs2, cs3] {
        assert!(meta.replica.contains(&cs));
    }
    assert!(meta.pulling.is_empty());

    // The file now points at the open block.
    let info = fs.namespace.get_file_info("/f").unwrap();
    assert_eq!(info.blocks, vec![1]);
    assert_eq!(info.version, -1);

    Ok(())
}

#[test]
fn version_promotion() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    register(&handler, "cs-a:8825");
    register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/f".to_string(),
        flags: 0,
        mode: 0o644,
    });
    let block = handler
        .add_block(AddBlockRequest {
            sequence_id: 2,
            file_name: "/f".to_string(),
        })
        .block
        .unwrap();

    let response = handler.finish_block(FinishBlockRequest {
        sequence_id: 3,
        block_id: block.block_id,
        block_version: 42,
    });
    assert_eq!(response.status, status::OK);

    let meta = fs.block_manager.lock().get_block(block.block_id)?;
    assert_eq!(meta.version, 42);
    assert!(!meta.pending_change);

    // Sealing an unknown block fails.
    let response = handler.finish_block(FinishBlockRequest {
        sequence_id: 4,
        block_id: 999,
        block_version: 1,
    });
    assert_eq!(response.status, status::FAILED);

    Ok(())
}

#[test]
fn under_replication_repair() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    let cs2 = register(&handler, "cs-b:8825");
    let cs5 = register(&handler, "cs-e:8825");
    fs.safe_mode.leave();

    seed_block(&fs, 7, &[cs1, cs2])?;

    // A report from a holder notices the deficit and queues a pull for
    // the one chunkserver that holds nothing.
    let response = report_one(&handler, cs1, "cs-a:8825", ReportBlockInfo::new(7, 0, -1));
    assert_eq!(response.status, status::OK);
    assert!(response.obsolete_blocks.is_empty());

    let meta = fs.block_manager.lock().get_block(7)?;
    assert!(meta.pulling.contains(&cs5));
    assert!(meta.pending_change);

    // The destination's next report carries the pull instruction with
    // the current holders as sources.
    let response = report_empty(&handler, cs5, "cs-e:8825");
    assert_eq!(response.new_replicas.len(), 1);
    let replica = &response.new_replicas[0];
    assert_eq!(replica.block_id, 7);
    assert_eq!(replica.chunkserver_address.len(), 2);
    for addr in ["cs-a:8825", "cs-b:8825"] {
        assert!(replica.chunkserver_address.contains(&addr.to_string()));
    }

    // At-most-once: the instruction is not handed out again.
    let response = report_empty(&handler, cs5, "cs-e:8825");
    assert!(response.new_replicas.is_empty());

    // The pull report closes the loop.
    let response = handler.pull_block_report(PullBlockReportRequest {
        sequence_id: 9,
        chunkserver_id: cs5,
        blocks: vec![7],
    });
    assert_eq!(response.status, status::OK);

    let meta = fs.block_manager.lock().get_block(7)?;
    assert_eq!(meta.replica_num(), 3);
    assert!(meta.pulling.is_empty());
    assert!(!meta.pending_change);

    Ok(())
}

#[test]
fn dead_chunkserver_recovery() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    let cs2 = register(&handler, "cs-b:8825");
    let cs3 = register(&handler, "cs-c:8825");
    let cs4 = register(&handler, "cs-d:8825");
    fs.safe_mode.leave();

    seed_block(&fs, 9, &[cs1, cs2, cs3])?;

    // Everyone but cs2 keeps heartbeating.
    thread::sleep(Duration::from_millis(50));
    for addr in ["cs-a:8825", "cs-c:8825", "cs-d:8825"] {
        handler.heart_beat(HeartBeatRequest {
            sequence_id: 1,
            chunkserver_addr: addr.to_string(),
            namespace_version: fs.namespace.version(),
            ..Default::default()
        });
    }

    let checker = HeartbeatChecker::new(
        fs.cs_manager.clone(),
        fs.block_manager.clone(),
        25,
        Arc::new(AtomicFlag::new(false)),
    );
    checker.run()?;

    let meta = fs.block_manager.lock().get_block(9)?;
    assert!(!meta.replica.contains(&cs2));
    assert_eq!(meta.replica_num(), 2);
    assert!(!meta.pending_change);

    // The next report from a live holder re-triggers repair; the only
    // candidate left is cs4.
    let response = report_one(&handler, cs1, "cs-a:8825", ReportBlockInfo::new(9, 0, -1));
    assert_eq!(response.status, status::OK);

    let meta = fs.block_manager.lock().get_block(9)?;
    assert!(meta.pulling.contains(&cs4));
    assert!(meta.pending_change);

    Ok(())
}

#[test]
fn over_replication_downsize() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    let cs2 = register(&handler, "cs-b:8825");
    let cs3 = register(&handler, "cs-c:8825");
    fs.safe_mode.leave();

    seed_block(&fs, 11, &[cs1, cs2, cs3])?;
    fs.block_manager.lock().change_replica_num(11, 2)?;

    // The reporting holder is told to drop its copy.
    let response = report_one(&handler, cs1, "cs-a:8825", ReportBlockInfo::new(11, 0, -1));
    assert_eq!(response.obsolete_blocks, vec![11]);

    let meta = fs.block_manager.lock().get_block(11)?;
    assert!(!meta.replica.contains(&cs1));
    assert_eq!(meta.replica_num(), 2);
    assert!(meta.pending_change);

    // A follow-up report observes the settled downsize and stabilizes.
    let response = report_one(&handler, cs2, "cs-b:8825", ReportBlockInfo::new(11, 0, -1));
    assert!(response.obsolete_blocks.is_empty());

    let meta = fs.block_manager.lock().get_block(11)?;
    assert_eq!(meta.replica_num(), 2);
    assert!(!meta.pending_change);

    Ok(())
}

#[test]
fn namespace_version_mismatch_with_inventory() {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let blocks: Vec<ReportBlockInfo> = (1..=4)
        .map(|id| ReportBlockInfo::new(id, 0, -1))
        .collect();

    let response = handler.block_report(BlockReportRequest {
        sequence_id: 1,
        chunkserver_id: -1,
        chunkserver_addr: "cs-x:8825".to_string(),
        namespace_version: fs.namespace.version() - 2,
        is_complete: true,
        disk_quota: 1 << 30,
        blocks,
    });

    assert_eq!(response.status, status::OK);
    assert_eq!(response.obsolete_blocks, vec![1, 2, 3, 4]);
    assert_eq!(response.namespace_version, fs.namespace.version());
    // Nothing was registered or recorded.
    assert_eq!(fs.block_manager.lock().block_num(), 0);
    assert!(fs.cs_manager.read().get_chunkserver_id("cs-x:8825").is_none());
}

#[test]
fn registration_does_not_touch_blocks() {
    let handler = new_handler();
    let fs = handler.clone_fs();

    // Empty report from an unknown peer on the current version registers
    // it without mutating any block record.
    let id = register(&handler, "cs-a:8825");
    assert!(id > 0);
    assert_eq!(fs.block_manager.lock().block_num(), 0);

    // A stale empty report also registers and learns the current version.
    let response = handler.block_report(BlockReportRequest {
        sequence_id: 1,
        chunkserver_id: -1,
        chunkserver_addr: "cs-b:8825".to_string(),
        namespace_version: fs.namespace.version() - 1,
        is_complete: true,
        disk_quota: 1 << 30,
        blocks: vec![],
    });
    assert_eq!(response.namespace_version, fs.namespace.version());
    assert!(response.chunkserver_id > 0);
    assert_eq!(fs.block_manager.lock().block_num(), 0);
}

#[test]
fn partial_report_from_unknown_peer() {
    let handler = new_handler();

    let response = report_one(&handler, -1, "cs-x:8825", ReportBlockInfo::new(1, 0, -1));
    assert_eq!(response.status, status::PARTIAL_REPORT);
}

#[test]
fn chunkserver_id_mismatch() {
    let handler = new_handler();
    let cs1 = register(&handler, "cs-a:8825");

    let response = report_empty(&handler, cs1 + 100, "cs-a:8825");
    assert_eq!(response.status, status::PROTOCOL_MISMATCH);
}

#[test]
fn safemode_suppresses_repair() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    let cs2 = register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    seed_block(&fs, 7, &[cs1, cs2])?;

    // Safemode is still on: the deficit is observed but no pull is planned.
    let response = report_one(&handler, cs1, "cs-a:8825", ReportBlockInfo::new(7, 0, -1));
    assert_eq!(response.status, status::OK);

    let meta = fs.block_manager.lock().get_block(7)?;
    assert!(meta.pulling.is_empty());
    assert!(!meta.pending_change);

    Ok(())
}

#[test]
fn unlink_rejects_late_reports() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/doomed".to_string(),
        flags: 0,
        mode: 0o644,
    });
    let block = handler
        .add_block(AddBlockRequest {
            sequence_id: 2,
            file_name: "/doomed".to_string(),
        })
        .block
        .unwrap();

    let response = handler.unlink(UnlinkRequest {
        sequence_id: 3,
        path: "/doomed".to_string(),
    });
    assert_eq!(response.status, status::OK);
    assert!(fs.block_manager.lock().get_block(block.block_id).is_err());

    // Unlinking twice is a clean 404.
    let response = handler.unlink(UnlinkRequest {
        sequence_id: 4,
        path: "/doomed".to_string(),
    });
    assert_eq!(response.status, status::NOT_FOUND);

    // The replica that still sits on disk is declared obsolete.
    let response = report_one(
        &handler,
        cs1,
        "cs-a:8825",
        ReportBlockInfo::new(block.block_id, 0, -1),
    );
    assert_eq!(response.obsolete_blocks, vec![block.block_id]);

    Ok(())
}

#[test]
fn change_replica_num_updates_every_block() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    register(&handler, "cs-a:8825");
    register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/f".to_string(),
        flags: 0,
        mode: 0o644,
    });
    let b1 = handler
        .add_block(AddBlockRequest {
            sequence_id: 2,
            file_name: "/f".to_string(),
        })
        .block
        .unwrap();
    let b2 = handler
        .add_block(AddBlockRequest {
            sequence_id: 3,
            file_name: "/f".to_string(),
        })
        .block
        .unwrap();

    let response = handler.change_replica_num(ChangeReplicaNumRequest {
        sequence_id: 4,
        file_name: "/f".to_string(),
        replica_num: 5,
    });
    assert_eq!(response.status, status::OK);

    let bm = fs.block_manager.lock();
    assert_eq!(bm.get_block(b1.block_id)?.expect_replica_num, 5);
    assert_eq!(bm.get_block(b2.block_id)?.expect_replica_num, 5);
    drop(bm);

    assert_eq!(fs.namespace.get_file_info("/f").unwrap().replicas, 5);

    // A missing file is a 404.
    let response = handler.change_replica_num(ChangeReplicaNumRequest {
        sequence_id: 5,
        file_name: "/missing".to_string(),
        replica_num: 2,
    });
    assert_eq!(response.status, status::NOT_FOUND);

    Ok(())
}

#[test]
fn stat_and_location() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    let cs1 = register(&handler, "cs-a:8825");
    let cs2 = register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/f".to_string(),
        flags: 0,
        mode: 0o644,
    });
    let b1 = handler
        .add_block(AddBlockRequest {
            sequence_id: 2,
            file_name: "/f".to_string(),
        })
        .block
        .unwrap();
    let b2 = handler
        .add_block(AddBlockRequest {
            sequence_id: 3,
            file_name: "/f".to_string(),
        })
        .block
        .unwrap();

    // Learn the sizes from reports.
    report_one(
        &handler,
        cs1,
        "cs-a:8825",
        ReportBlockInfo::new(b1.block_id, 4096, -1),
    );
    report_one(
        &handler,
        cs2,
        "cs-b:8825",
        ReportBlockInfo::new(b2.block_id, 1024, -1),
    );

    let response = handler.stat(StatRequest {
        sequence_id: 4,
        path: "/f".to_string(),
    });
    assert_eq!(response.status, status::OK);
    assert_eq!(response.file_info.unwrap().size, 5120);

    let response = handler.get_file_location(FileLocationRequest {
        sequence_id: 5,
        file_name: "/f".to_string(),
    });
    assert_eq!(response.status, status::OK);
    assert_eq!(response.blocks.len(), 2);
    assert_eq!(response.blocks[0].block_size, 4096);
    // Every seeded replica resolves to an address.
    assert_eq!(response.blocks[0].chains.len(), 3);

    let response = handler.get_file_location(FileLocationRequest {
        sequence_id: 6,
        file_name: "/missing".to_string(),
    });
    assert_eq!(response.status, status::NOT_FOUND);

    Ok(())
}

#[test]
fn delete_directory_unlinks_blocks() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    register(&handler, "cs-a:8825");
    register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/dir/1.log".to_string(),
        flags: 0,
        mode: 0o644,
    });
    let block = handler
        .add_block(AddBlockRequest {
            sequence_id: 2,
            file_name: "/dir/1.log".to_string(),
        })
        .block
        .unwrap();

    // Invalid paths are rejected outright.
    let response = handler.delete_directory(DeleteDirectoryRequest {
        sequence_id: 3,
        path: "".to_string(),
        recursive: true,
    });
    assert_eq!(response.status, status::FAILED);

    let response = handler.delete_directory(DeleteDirectoryRequest {
        sequence_id: 4,
        path: "/dir".to_string(),
        recursive: false,
    });
    assert_eq!(response.status, status::FAILED);

    let response = handler.delete_directory(DeleteDirectoryRequest {
        sequence_id: 5,
        path: "/dir".to_string(),
        recursive: true,
    });
    assert_eq!(response.status, status::OK);
    assert!(fs.block_manager.lock().get_block(block.block_id).is_err());

    Ok(())
}

#[test]
fn rename_unlinks_replaced_file() -> FsResult<()> {
    let handler = new_handler();
    let fs = handler.clone_fs();

    register(&handler, "cs-a:8825");
    register(&handler, "cs-b:8825");
    register(&handler, "cs-c:8825");

    for name in ["/src", "/dst"] {
        handler.create_file(CreateFileRequest {
            sequence_id: 1,
            file_name: name.to_string(),
            flags: 0,
            mode: 0o644,
        });
    }
    let dst_block = handler
        .add_block(AddBlockRequest {
            sequence_id: 2,
            file_name: "/dst".to_string(),
        })
        .block
        .unwrap();

    let response = handler.rename(RenameRequest {
        sequence_id: 3,
        oldpath: "/src".to_string(),
        newpath: "/dst".to_string(),
    });
    assert_eq!(response.status, status::OK);

    // The overwritten file's blocks are gone with it.
    assert!(fs
        .block_manager
        .lock()
        .get_block(dst_block.block_id)
        .is_err());
    assert!(fs.namespace.get_file_info("/src").is_none());

    Ok(())
}

#[test]
fn recovery_rebuilds_block_map() -> FsResult<()> {
    let namespace = Arc::new(MemNameSpace::new());
    namespace.create_file("/a", 0, 0o644, 2)?;

    let mut info = namespace.get_file_info("/a").unwrap();
    info.blocks = vec![3, 8];
    info.version = 7;
    namespace.update_file_info(&info)?;

    let conf = ClusterConf {
        testing: true,
        ..Default::default()
    };
    let fs = NameSystem::new(&conf, namespace)?;

    let bm = fs.block_manager.lock();
    assert_eq!(bm.block_num(), 2);
    for id in [3, 8] {
        let meta = bm.get_block(id)?;
        assert_eq!(meta.version, 7);
        assert_eq!(meta.expect_replica_num, 2);
        assert!(meta.replica.is_empty());
        assert!(!meta.pending_change);
    }
    drop(bm);

    // The allocator was raised past every recovered id.
    assert_eq!(fs.block_manager.lock().new_block_id(), 9);

    Ok(())
}

#[test]
fn add_block_without_chunkservers() {
    let handler = new_handler();

    handler.create_file(CreateFileRequest {
        sequence_id: 1,
        file_name: "/f".to_string(),
        flags: 0,
        mode: 0o644,
    });

    let response = handler.add_block(AddBlockRequest {
        sequence_id: 2,
        file_name: "/f".to_string(),
    });
    assert_eq!(response.status, status::FAILED);

    let response = handler.add_block(AddBlockRequest {
        sequence_id: 3,
        file_name: "/missing".to_string(),
    });
    assert_eq!(response.status, status::NOT_FOUND);
}

#[test]
fn heart_beat_reports_version() {
    let handler = new_handler();
    let fs = handler.clone_fs();

    register(&handler, "cs-a:8825");
    let response = handler.heart_beat(HeartBeatRequest {
        sequence_id: 1,
        chunkserver_addr: "cs-a:8825".to_string(),
        namespace_version: fs.namespace.version(),
        block_num: 12,
        data_size: 4096,
        buffers: 1,
    });
    assert_eq!(response.status, status::OK);
    assert_eq!(response.namespace_version, fs.namespace.version());

    // A stale heartbeat still learns the current version.
    let response = handler.heart_beat(HeartBeatRequest {
        sequence_id: 2,
        chunkserver_addr: "cs-a:8825".to_string(),
        namespace_version: fs.namespace.version() - 1,
        ..Default::default()
    });
    assert_eq!(response.namespace_version, fs.namespace.version());

    let servers = handler
        .sys_stat(SysStatRequest { sequence_id: 3 })
        .chunkservers;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].data_size, 4096);
    assert_eq!(servers[0].block_num, 12);
}

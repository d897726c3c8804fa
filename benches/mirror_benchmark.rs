use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mrkbackup::backup::{codec, BackupRecord, TreeSynchronizer};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_tree(root: &Path, dirs: usize, files_per_dir: usize, file_size: usize) {
    let contents = vec![b'x'; file_size];
    for d in 0..dirs {
        let dir = root.join(format!("dir_{}", d)).join("nested");
        fs::create_dir_all(&dir).unwrap();
        for f in 0..files_per_dir {
            fs::write(dir.join(format!("file_{}.dat", f)), &contents).unwrap();
        }
    }
}

fn bench_mirror(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_mirror");
    group.sample_size(20);

    for &(dirs, files) in &[(4, 25), (16, 25), (32, 50)] {
        let source = TempDir::new().unwrap();
        create_tree(source.path(), dirs, files, 4096);
        let destination = TempDir::new().unwrap();
        let sync = TreeSynchronizer::new();

        group.bench_with_input(
            BenchmarkId::new("files", dirs * files),
            &(dirs, files),
            |b, _| {
                b.iter(|| {
                    let report = sync
                        .mirror(black_box(source.path()), black_box(destination.path()))
                        .unwrap();
                    black_box(report)
                })
            },
        );
    }

    group.finish();
}

fn bench_record_codec(c: &mut Criterion) {
    let record = BackupRecord::new("documents", "/home/u/documents")
        .with_storage_location("/srv/backups/QwErTyUiOpAsDfGhJkLzXc");
    let bytes = codec::encode_record(&record).unwrap();

    c.bench_function("record_encode", |b| {
        b.iter(|| codec::encode_record(black_box(&record)).unwrap())
    });
    c.bench_function("record_decode", |b| {
        b.iter(|| codec::decode_record(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, bench_mirror, bench_record_codec);
criterion_main!(benches);

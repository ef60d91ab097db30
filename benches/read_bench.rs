use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::{Read, Write};
use tempfile::NamedTempFile;
use zip_vfs::Archive;

fn generate_compressible_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

/// Writes a minimal single-entry archive (DEFLATE if `compress`, else
/// STORE) and returns the temp file backing it.
fn build_single_entry_zip(data: &[u8], compress: bool) -> NamedTempFile {
    let (stored_bytes, method) = if compress {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        (encoder.finish().unwrap(), 8u16)
    } else {
        (data.to_vec(), 0u16)
    };

    let name = "bench.bin";
    let mut buf = Vec::new();
    let offset = buf.len() as u32;
    buf.extend_from_slice(&0x0403_4B50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&method.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // crc, unchecked against real data here
    buf.extend_from_slice(&(stored_bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&stored_bytes);

    let cd_start = buf.len() as u32;
    buf.extend_from_slice(&0x0201_4B50u32.to_le_bytes());
    buf.extend_from_slice(&(3u16 << 8).to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&method.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(stored_bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&offset.to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    let cd_size = buf.len() as u32 - cd_start;

    buf.extend_from_slice(&0x0605_4B50u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&cd_size.to_le_bytes());
    buf.extend_from_slice(&cd_start.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());

    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(&buf).unwrap();
    temp.flush().unwrap();
    temp
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{}MB", bytes / (1024 * 1024))
    } else {
        format!("{}KB", bytes / 1024)
    }
}

fn bench_read_compressible_data(c: &mut Criterion) {
    let sizes = vec![100 * 1024, 1024 * 1024, 10 * 1024 * 1024];

    for size in sizes {
        let mut group = c.benchmark_group(format!("read_compressible_{}", format_size(size)));
        group.throughput(Throughput::Bytes(size as u64));

        let data = generate_compressible_data(size);

        let zip_deflate = build_single_entry_zip(&data, true);
        group.bench_function(BenchmarkId::new("deflate", size), |b| {
            b.iter(|| {
                let mut archive = Archive::open(zip_deflate.path()).unwrap();
                let mut file = archive.open_read("bench.bin").unwrap();
                let mut buf = Vec::new();
                file.read_to_end(black_box(&mut buf)).unwrap();
            });
        });

        let zip_store = build_single_entry_zip(&data, false);
        group.bench_function(BenchmarkId::new("store", size), |b| {
            b.iter(|| {
                let mut archive = Archive::open(zip_store.path()).unwrap();
                let mut file = archive.open_read("bench.bin").unwrap();
                let mut buf = Vec::new();
                file.read_to_end(black_box(&mut buf)).unwrap();
            });
        });

        group.finish();
    }
}

fn bench_backward_seek(c: &mut Criterion) {
    let data = vec![0u8; 1024 * 1024];
    let zip_deflate = build_single_entry_zip(&data, true);

    let mut group = c.benchmark_group("deflate_backward_seek");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("read_all_then_rewind", |b| {
        b.iter(|| {
            let mut archive = Archive::open(zip_deflate.path()).unwrap();
            let mut file = archive.open_read("bench.bin").unwrap();
            let mut buf = vec![0u8; data.len()];
            file.read_exact(&mut buf).unwrap();
            file.seek(0).unwrap();
            file.read_exact(black_box(&mut buf)).unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_read_compressible_data, bench_backward_seek);
criterion_main!(benches);

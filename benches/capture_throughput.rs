//! Capture hot-path benchmark suite.
//!
//! Benchmarks the per-chunk append path at different chunk sizes, plus
//! the cost of chunks arriving after an overflow (which must be nearly
//! free).
//!
//! Run with: cargo bench --bench capture_throughput
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use danmaku_capture::{CaptureBuffer, DEFAULT_CAPACITY};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CHUNK_SIZES: &[usize] = &[512, 4 * 1024, 64 * 1024];

/// Total bytes fed per iteration.
const TOTAL_BYTES: usize = 1 << 20;

// ============================================================================
// Benchmark: Append Throughput
// ============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    group.throughput(Throughput::Bytes(TOTAL_BYTES as u64));

    for &chunk_size in CHUNK_SIZES {
        let chunk = vec![0u8; chunk_size];
        group.bench_with_input(
            BenchmarkId::new("chunk", chunk_size),
            &chunk,
            |b, chunk| {
                b.iter(|| {
                    let mut buffer = CaptureBuffer::new(DEFAULT_CAPACITY);
                    let mut fed = 0usize;
                    while fed < TOTAL_BYTES {
                        buffer.append(chunk);
                        fed += chunk.len();
                    }
                    buffer.finalize()
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Post-Overflow Skip
// ============================================================================

fn bench_overflow_skip(c: &mut Criterion) {
    let chunk = vec![0u8; 64 * 1024];

    c.bench_function("overflow_skip", |b| {
        b.iter(|| {
            // Capacity smaller than the first chunk: overflow immediately,
            // then measure the skip cost for the rest of the stream.
            let mut buffer = CaptureBuffer::new(1024);
            let mut fed = 0usize;
            while fed < TOTAL_BYTES {
                buffer.append(&chunk);
                fed += chunk.len();
            }
            buffer.finalize()
        });
    });
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_append, bench_overflow_skip);
criterion_main!(benches);

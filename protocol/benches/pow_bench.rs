// Proof-of-work and chain benchmarks for the ledger protocol.
//
// Covers proof checking, proof search at a few difficulties, canonical block
// hashing, and full chain validation as the chain grows.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ledger_protocol::consensus::{is_valid_chain_with, proof_of_work_with, Difficulty};
use ledger_protocol::storage::{hash_block, Chain};
use ledger_protocol::Transaction;

/// Builds a valid chain of `len` blocks, each holding `txs` transfers.
fn build_chain(len: usize, txs: u64, difficulty: &Difficulty) -> Chain {
    let mut chain = Chain::new(0);
    while chain.len() < len {
        let transactions = (0..txs)
            .map(|i| Transaction::new("alice", "bob", i + 1))
            .collect();
        let proof = proof_of_work_with(chain.tip().proof, difficulty);
        chain.forge(proof, None, transactions, chain.len() as u64);
    }
    chain
}

fn bench_proof_check(c: &mut Criterion) {
    let difficulty = Difficulty::default();
    let proof = proof_of_work_with(100, &difficulty);

    c.bench_function("pow/check", |b| {
        b.iter(|| difficulty.accepts(100, proof));
    });
}

fn bench_proof_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow/search");
    group.sample_size(10);

    for suffix in ["0", "00", "000", "0000"] {
        let difficulty = Difficulty::new(suffix).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(suffix), &difficulty, |b, d| {
            b.iter(|| proof_of_work_with(100, d));
        });
    }

    group.finish();
}

fn bench_block_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("block/hash");
    let difficulty = Difficulty::new("0").unwrap();

    for txs in [0u64, 10, 100] {
        let chain = build_chain(2, txs, &difficulty);
        let block = chain.tip().clone();
        group.throughput(Throughput::Elements(txs.max(1)));
        group.bench_with_input(BenchmarkId::from_parameter(txs), &block, |b, block| {
            b.iter(|| hash_block(block));
        });
    }

    group.finish();
}

fn bench_chain_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/validate");
    let difficulty = Difficulty::new("0").unwrap();

    for len in [10usize, 100, 1_000] {
        let chain = build_chain(len, 4, &difficulty);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &chain, |b, chain| {
            b.iter(|| is_valid_chain_with(chain.blocks(), &difficulty));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_proof_check,
    bench_proof_search,
    bench_block_hash,
    bench_chain_validation,
);
criterion_main!(benches);

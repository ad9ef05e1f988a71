//! Reply decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use maildns_proto::{DnsReply, MessageBuilder, MxWalker, Name, RecordType, ResourceRecord};
use std::str::FromStr;

fn mx_reply(count: u16) -> Vec<u8> {
    let domain = Name::from_str("example.com").unwrap();
    let mut builder = MessageBuilder::response(1, &domain, RecordType::MX);
    for i in 0..count {
        let exchange = Name::from_str(&format!("mx{i}.mail.example.com")).unwrap();
        builder = builder.answer(ResourceRecord::mx(domain.clone(), 300, 10 * (i % 3), exchange));
    }
    builder.build().unwrap()
}

fn parsing_benchmarks(c: &mut Criterion) {
    let wire = mx_reply(12);

    let mut group = c.benchmark_group("mx_reply");
    group.throughput(Throughput::Bytes(wire.len() as u64));

    group.bench_function("dns_reply", |b| {
        b.iter(|| DnsReply::parse(black_box(&wire)).unwrap());
    });

    group.bench_function("mx_walker", |b| {
        b.iter(|| MxWalker::new(black_box(&wire)).unwrap().count());
    });

    group.finish();

    c.bench_function("name_from_str", |b| {
        b.iter(|| Name::from_str(black_box("mx0.mail.example.com.")).unwrap());
    });
}

criterion_group!(benches, parsing_benchmarks);
criterion_main!(benches);

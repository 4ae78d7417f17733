use std::thread;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use exchange::{Exchange, ExchangeConfig};
use order_book::{BookConfig, Order, OrderBook, Side};

/// Alternating bids and asks straddling 100.0 so roughly half of them cross.
fn orders(n: u64) -> Vec<Order> {
    let mut s: u64 = 0x9E37_79B9_7F4A_7C15; // fixed seed
    (0..n)
        .map(|i| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            let offset = (s >> 33) % 200;
            let price = 99.0 + offset as f64 / 100.0;
            let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            Order::new((i % 64) as u32, 0, side, price, 1 + (s >> 60), i / 16).with_id(i + 1)
        })
        .collect()
}

fn bench_match_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_orders");
    for n in [64u64, 1024, 8192] {
        let batch = orders(n);
        group.bench_function(format!("crossed_{n}"), |b| {
            b.iter_batched(
                || {
                    let mut book = OrderBook::new(BookConfig::default()).unwrap();
                    for o in &batch {
                        book.add_order(o.clone());
                    }
                    book
                },
                |mut book| black_box(book.match_orders(1)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_uncrossed_book(c: &mut Criterion) {
    // Bids strictly below asks: the early exit path
    let mut book = OrderBook::new(BookConfig::default()).unwrap();
    for i in 0..1024u64 {
        book.add_order(Order::new(1, 0, Side::Buy, 90.0 - i as f64 * 0.01, 5, 0).with_id(2 * i + 1));
        book.add_order(Order::new(2, 0, Side::Sell, 110.0 + i as f64 * 0.01, 5, 0).with_id(2 * i + 2));
    }
    c.bench_function("match_orders_uncrossed_2048", |b| b.iter(|| black_box(book.match_orders(1))));
}

fn bench_concurrent_submission(c: &mut Criterion) {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 512;

    c.bench_function("submit_then_process_8x512", |b| {
        b.iter_batched(
            || Exchange::new(ExchangeConfig { num_instruments: 3, ..Default::default() }).unwrap(),
            |mut ex| {
                let handle = ex.submission();
                thread::scope(|s| {
                    for t in 0..THREADS {
                        s.spawn(move || {
                            for i in 0..PER_THREAD {
                                let side = if (t + i) % 2 == 0 { Side::Buy } else { Side::Sell };
                                let price = handle.price((i % 3) as u32).unwrap_or(100.0);
                                let order = Order::new(t as u32, (i % 3) as u32, side, price, 5, 0);
                                handle.submit_order(order);
                            }
                        });
                    }
                });
                black_box(ex.process_tick(0))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_match_orders, bench_uncrossed_book, bench_concurrent_submission);
criterion_main!(benches);

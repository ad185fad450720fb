use std::sync::mpsc::channel;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use store::{
    consts::consts::PersonId,
    model::{person::Person, statement::ListFilter},
    store::store::test_utils::{spawn_store, test_options},
};
use threadpool::ThreadPool;

const CLIENT_THREADS: [usize; 3] = [1, 2, 4];
const POOL_SIZE: usize = 4;

const SAMPLE_SIZE: u64 = 1_000;

const INPUT_SIZE: criterion::BatchSize = criterion::BatchSize::LargeInput;

/*
    How this bench is configured:
    1. `iter_batched` is used so the clone of the request manager does not affect the benchmark
    2. The store is shared within the same group input, which avoids cross-input state effects
    3. Change log writes are off, the file system flush would otherwise dominate the numbers
    4. The store is shut down between inputs so records do not accumulate across inputs
*/
pub fn upsert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_upsert");

    let pool = ThreadPool::new(POOL_SIZE);

    for client_threads in CLIENT_THREADS.iter() {
        let rm = spawn_store(test_options());

        group.throughput(Throughput::Elements(SAMPLE_SIZE));

        group.bench_with_input(
            BenchmarkId::from_parameter(client_threads),
            client_threads,
            |b, &client_threads| {
                b.iter_batched(
                    || rm.clone(),
                    |rm| {
                        let (test_tx, test_rx) = channel::<i32>();

                        for thread_index in 0..client_threads {
                            let local_rm = rm.clone();
                            let local_tx = test_tx.clone();

                            pool.execute(move || {
                                let local_actions = SAMPLE_SIZE / client_threads as u64;

                                for index in 0..local_actions {
                                    local_rm
                                        .send_upsert(Person::new_test(
                                            &format!("First-{}-{}", thread_index, index),
                                            &format!("Last-{}-{}", thread_index, index),
                                        ))
                                        .expect("Should not timeout");
                                }

                                local_tx.send(1).expect("Should not timeout");
                            });
                        }

                        test_rx
                            .iter()
                            .take(client_threads)
                            .fold(0, |a: i32, b: i32| a + b);
                    },
                    INPUT_SIZE,
                )
            },
        );

        rm.send_shutdown_request().expect("Should not timeout");
    }

    group.finish();
}

pub fn list_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_list");

    let pool = ThreadPool::new(POOL_SIZE);

    for client_threads in CLIENT_THREADS.iter() {
        let rm = spawn_store(test_options());

        for i in 0..SAMPLE_SIZE {
            rm.send_upsert(Person::new_test(&format!("First-{}", i), "Last"))
                .expect("Should not timeout");
        }

        // Half the records are favourites, so the filtered list does real work
        for i in (0..SAMPLE_SIZE).step_by(2) {
            rm.send_toggle_favourite(PersonId::new(
                format!("First-{}", i),
                "Last".to_string(),
            ))
            .expect("Should not timeout");
        }

        group.throughput(Throughput::Elements(SAMPLE_SIZE));

        group.bench_with_input(
            BenchmarkId::from_parameter(client_threads),
            client_threads,
            |b, &client_threads| {
                b.iter_batched(
                    || rm.clone(),
                    |rm| {
                        let (test_tx, test_rx) = channel::<Vec<Vec<Person>>>();

                        for _ in 0..client_threads {
                            let local_rm = rm.clone();
                            let local_tx = test_tx.clone();

                            pool.execute(move || {
                                let results = vec![
                                    local_rm
                                        .send_list(ListFilter::All)
                                        .expect("Should not timeout"),
                                    local_rm
                                        .send_list(ListFilter::FavouritesOnly)
                                        .expect("Should not timeout"),
                                ];

                                local_tx.send(results).expect("Should not timeout");
                            });
                        }

                        // Collect all the results, and let the test handle the drop
                        return test_rx
                            .iter()
                            .take(client_threads)
                            .collect::<Vec<Vec<Vec<Person>>>>();
                    },
                    INPUT_SIZE,
                )
            },
        );

        rm.send_shutdown_request().expect("Should not timeout");
    }

    group.finish();
}

criterion_group!(benches, upsert_benchmark, list_benchmark);

criterion_main!(benches);

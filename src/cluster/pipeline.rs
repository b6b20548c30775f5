//! Worker pool that fans sense induction out over the loaded graph

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::WhispersConfig;
use crate::graph::Graph;
use crate::io::BeWriter;

use super::{whispers, Cluster};

/// Finished clusters waiting for the writer; producers block when it fills.
const QUEUE_CAPACITY: usize = 1024;

const PROGRESS_POLL: Duration = Duration::from_secs(1);

/// Totals reported by a clustering run.
#[derive(Debug, Clone, Copy)]
pub struct RunTotals {
    pub nodes: usize,
    pub clusters: usize,
    pub elapsed_secs: f64,
}

/// Cluster every token of `graph` and stream the results to `output`.
///
/// The graph is shared read-only across `num_workers` threads, each owning a
/// contiguous token range (the last takes the remainder). Clusters flow
/// through a bounded queue to a single writer thread; after all workers are
/// joined a sentinel cluster tells the writer to finish, and it is joined
/// last.
pub fn run(
    graph: &Graph,
    config: &WhispersConfig,
    num_workers: usize,
    output: &str,
) -> Result<RunTotals> {
    let node_count = graph.size();
    let num_workers = num_workers.max(1);
    let batch_size = node_count / num_workers;

    let file = File::create(output).with_context(|| format!("creating cluster file {output}"))?;
    let writer = BeWriter::new(BufWriter::new(file));

    let progress = AtomicUsize::new(0);
    let total_clusters = AtomicUsize::new(0);
    let started = Instant::now();

    thread::scope(|scope| -> Result<()> {
        let (tx, rx) = sync_channel::<Cluster>(QUEUE_CAPACITY);

        let mut workers = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let tx = tx.clone();
            let progress = &progress;
            let batch_start = worker_id * batch_size;
            let batch_end = if worker_id == num_workers - 1 {
                node_count
            } else {
                batch_start + batch_size
            };
            workers.push(scope.spawn(move || {
                run_worker(graph, config, worker_id, batch_start, batch_end, tx, progress)
            }));
        }

        let total_clusters = &total_clusters;
        let writer_thread = scope.spawn(move || write_clusters(writer, rx, total_clusters));

        loop {
            if progress.load(Ordering::Acquire) >= node_count
                || workers.iter().all(|worker| worker.is_finished())
            {
                break;
            }
            thread::sleep(PROGRESS_POLL);
            log::info!(
                "clustered {} / {} tokens",
                progress.load(Ordering::Acquire),
                node_count
            );
        }

        for worker in workers {
            worker.join().expect("cluster worker panicked");
        }
        // a failed send means the writer already died; its join has the cause
        let _ = tx.send(Cluster::sentinel());
        drop(tx);
        writer_thread.join().expect("cluster writer panicked")?;
        Ok(())
    })?;

    Ok(RunTotals {
        nodes: node_count,
        clusters: total_clusters.load(Ordering::Acquire),
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

fn run_worker(
    graph: &Graph,
    config: &WhispersConfig,
    worker_id: usize,
    batch_start: usize,
    batch_end: usize,
    clusters: SyncSender<Cluster>,
    progress: &AtomicUsize,
) {
    log::debug!("worker {worker_id}: tokens {batch_start} -> {batch_end}");
    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64))),
        None => Box::new(rand::rng()),
    };

    for node in batch_start..batch_end {
        for cluster in whispers::induce_token(graph, node as i32, config, &mut rng) {
            if clusters.send(cluster).is_err() {
                // the writer is gone; the run is already failing
                log::warn!("worker {worker_id}: cluster sink disconnected, stopping");
                return;
            }
        }
        progress.fetch_add(1, Ordering::Relaxed);
    }
}

fn write_clusters<W: Write>(
    mut writer: BeWriter<W>,
    clusters: Receiver<Cluster>,
    total: &AtomicUsize,
) -> Result<()> {
    while let Ok(cluster) = clusters.recv() {
        if cluster.is_sentinel() {
            break;
        }
        write_record(&mut writer, &cluster)?;
        total.fetch_add(1, Ordering::Relaxed);
    }
    writer.flush()
}

/// Big-endian record: base node, sense id, member count, then one
/// `(node, weight)` pair per member.
fn write_record<W: Write>(writer: &mut BeWriter<W>, cluster: &Cluster) -> Result<()> {
    writer.write_i32(cluster.base_node)?;
    writer.write_i32(cluster.sense_id)?;
    writer.write_i32(cluster.members.len() as i32)?;
    for &(node, weight) in &cluster.members {
        writer.write_i32(node)?;
        writer.write_f32(weight)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse the big-endian cluster file layout back into records.
    fn parse_records(bytes: &[u8]) -> Vec<Cluster> {
        let mut records = Vec::new();
        let mut at = 0;
        let take_i32 = |at: &mut usize| {
            let value = i32::from_be_bytes(bytes[*at..*at + 4].try_into().unwrap());
            *at += 4;
            value
        };
        while at < bytes.len() {
            let base_node = take_i32(&mut at);
            let sense_id = take_i32(&mut at);
            let count = take_i32(&mut at);
            let mut members = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let node = take_i32(&mut at);
                let weight = f32::from_be_bytes(bytes[at..at + 4].try_into().unwrap());
                at += 4;
                members.push((node, weight));
            }
            records.push(Cluster {
                base_node,
                sense_id,
                members,
            });
        }
        records
    }

    fn two_cliques() -> Graph {
        // two tight five-cliques bridged through nothing: every token's ego
        // network is a clique and yields exactly one sense
        let mut g = Graph::new();
        for group in 0..2 {
            let base = group * 5;
            for a in base..base + 5 {
                for b in a + 1..base + 5 {
                    g.add_edge(a, b, 0.9 - 0.01 * (a + b) as f32);
                }
            }
        }
        g.sort_edges();
        g
    }

    #[test]
    fn sentinel_stops_the_writer_without_a_record() {
        let mut bytes = Vec::new();
        {
            let writer = BeWriter::new(&mut bytes);
            let (tx, rx) = sync_channel::<Cluster>(4);
            tx.send(Cluster {
                base_node: 3,
                sense_id: 1,
                members: vec![(7, 0.5)],
            })
            .unwrap();
            tx.send(Cluster::sentinel()).unwrap();
            // a record after the sentinel must never be written
            tx.send(Cluster {
                base_node: 9,
                sense_id: 1,
                members: vec![],
            })
            .unwrap();
            drop(tx);

            let total = AtomicUsize::new(0);
            write_clusters(writer, rx, &total).unwrap();
            assert_eq!(total.load(Ordering::Acquire), 1);
        }

        let records = parse_records(&bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].base_node, 3);
        assert_eq!(records[0].sense_id, 1);
        assert_eq!(records[0].members, vec![(7, 0.5)]);
    }

    #[test]
    fn record_layout_is_big_endian() {
        let mut bytes = Vec::new();
        {
            let mut writer = BeWriter::new(&mut bytes);
            write_record(
                &mut writer,
                &Cluster {
                    base_node: 1,
                    sense_id: 2,
                    members: vec![(3, 1.0)],
                },
            )
            .unwrap();
        }
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 2]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 1]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 3]);
        assert_eq!(&bytes[16..20], &1.0f32.to_be_bytes());
    }

    #[test]
    fn pipeline_covers_every_token_across_workers() {
        let graph = two_cliques();
        let config = WhispersConfig {
            min_cluster: 2,
            seed: Some(11),
            ..WhispersConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("senses.clusters");
        let output = output.to_str().unwrap();

        let totals = run(&graph, &config, 3, output).unwrap();
        assert_eq!(totals.nodes, 10);

        let records = parse_records(&std::fs::read(output).unwrap());
        assert_eq!(records.len(), totals.clusters);

        // every token produced its clique as a single sense
        let mut seen: Vec<i32> = records.iter().map(|r| r.base_node).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<i32>>());
        for record in &records {
            assert_eq!(record.sense_id, 1);
            assert_eq!(record.members.len(), 4);
            assert!(record
                .members
                .iter()
                .all(|&(node, _)| node / 5 == record.base_node / 5));
        }
    }

    #[test]
    fn small_graphs_tolerate_more_workers_than_nodes() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1, 0.5);
        graph.sort_edges();

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("senses.clusters");

        let totals = run(
            &graph,
            &WhispersConfig::default(),
            8,
            output.to_str().unwrap(),
        )
        .unwrap();
        assert_eq!(totals.nodes, 2);
        assert_eq!(totals.clusters, 0);
    }
}

use anyhow::Result;
use border_replay::{
    Buffer, BufferError, ReplayBuffer, ReplayBufferConfig, Sample, SampleId, Transition,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread,
};
use test_log::test;

fn config(capacity: usize, batch_size: usize) -> ReplayBufferConfig {
    ReplayBufferConfig::default()
        .capacity(capacity)
        .batch_size(batch_size)
        .seed(42)
}

/// Buffer with `alpha = 1`, where the priority of a sample is its error plus epsilon.
fn buffer_with_priorities(ps: &[f64], batch_size: usize) -> Result<(ReplayBuffer<usize>, Vec<SampleId>)> {
    let mut buffer = ReplayBuffer::build(&config(ps.len(), batch_size).alpha(1.0))?;
    let mut ids = vec![];
    for (i, &p) in ps.iter().enumerate() {
        let id = buffer.add(Sample::new(i));
        buffer.set_td_error(id, p)?;
        buffer.update(id)?;
        ids.push(id);
    }
    Ok((buffer, ids))
}

fn assert_tree_consistent<T>(buffer: &ReplayBuffer<T>) {
    let tree = buffer.sum_tree();
    let nodes = tree.nodes();
    for i in 0..(tree.capacity() - 1) {
        assert_eq!(nodes[i], nodes[2 * i + 1] + nodes[2 * i + 2], "node {}", i);
    }

    let leaf_sum: f64 = nodes[(tree.capacity() - 1)..].iter().sum();
    let sample_sum: f64 = tree.iter().map(|s| s.priority()).sum();
    assert!((tree.total() - leaf_sum).abs() < 1e-9);
    assert!((tree.total() - sample_sum).abs() < 1e-9);
}

#[test]
fn test_tree_sums_after_random_operations() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut buffer = ReplayBuffer::build(&config(7, 3))?;
    let mut ids = vec![];

    for _ in 0..500 {
        if ids.is_empty() || rng.gen_bool(0.4) {
            ids.push(buffer.add(Sample::new(0usize)));
        } else {
            let id = ids[rng.gen_range(0..ids.len())];
            let td_error = rng.gen_range(-5.0..5.0);
            // Evicted samples are rejected without touching the tree.
            if buffer.set_td_error(id, td_error).is_ok() {
                buffer.update(id)?;
            } else {
                assert!(buffer.update(id).is_err());
            }
        }
        if rng.gen_bool(0.1) {
            buffer.samples();
        }
        assert_tree_consistent(&buffer);
        assert!(buffer.len() <= buffer.capacity());
    }
    Ok(())
}

#[test]
fn test_fifo_eviction() -> Result<()> {
    let mut buffer = ReplayBuffer::build(&config(5, 2))?;
    let ids = (0..12)
        .map(|i| buffer.add(Sample::new(i)))
        .collect::<Vec<_>>();

    assert_eq!(buffer.len(), 5);
    let mut payloads = buffer
        .sum_tree()
        .iter()
        .map(|s| s.payload)
        .collect::<Vec<_>>();
    payloads.sort();
    assert_eq!(payloads, vec![7, 8, 9, 10, 11]);

    for &id in &ids[..7] {
        assert!(buffer.sample(id).is_none());
        let err = buffer.update(id).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BufferError>(),
            Some(&BufferError::UnknownSample(id))
        );
    }
    assert_tree_consistent(&buffer);
    Ok(())
}

#[test]
fn test_eviction_of_scored_samples() -> Result<()> {
    let (mut buffer, _) = buffer_with_priorities(&[1.0, 2.0, 3.0, 4.0], 2)?;
    assert!((buffer.total_priority() - 10.0).abs() < 1e-6);

    // The new sample gets the max priority, 4, and replaces the priority-1 sample.
    let id = buffer.add(Sample::new(4));
    assert!((buffer.total_priority() - 13.0).abs() < 1e-6);

    buffer.set_td_error(id, 5.0)?;
    buffer.update(id)?;
    assert!((buffer.total_priority() - 14.0).abs() < 1e-6);
    assert_tree_consistent(&buffer);
    Ok(())
}

#[test]
fn test_sampling_is_proportional() -> Result<()> {
    let ps = [1.0, 2.0, 3.0, 4.0];
    let (mut buffer, ids) = buffer_with_priorities(&ps, 10)?;
    let mut counts = HashMap::new();
    let n_batches = 2000;

    for _ in 0..n_batches {
        for &id in buffer.samples().ids() {
            *counts.entry(id).or_insert(0usize) += 1;
        }
    }

    let n = (n_batches * 10) as f64;
    for (&id, &p) in ids.iter().zip(ps.iter()) {
        let freq = *counts.get(&id).unwrap_or(&0) as f64 / n;
        assert!((freq - p / 10.0).abs() < 0.02, "{}: {}", id, freq);
    }
    Ok(())
}

#[test]
fn test_stratified_segments() -> Result<()> {
    // Cumulative ranges: [0, 1], (1, 3], (3, 6], (6, 10]
    let (mut buffer, ids) = buffer_with_priorities(&[1.0, 2.0, 3.0, 4.0], 2)?;

    for _ in 0..500 {
        let batch = buffer.samples();
        assert_eq!(batch.len(), 2);
        assert!(batch.ids()[0] != ids[3]);
        assert!(batch.ids()[1] == ids[2] || batch.ids()[1] == ids[3]);
    }
    Ok(())
}

#[test]
fn test_importance_sampling_weights() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let mut buffer = ReplayBuffer::build(&config(64, 16))?;
    for i in 0..64 {
        let id = buffer.add(Sample::new(i));
        buffer.set_td_error(id, rng.gen_range(0.0..10.0))?;
        buffer.update(id)?;
    }

    for _ in 0..100 {
        let batch = buffer.samples();
        let ws = batch.weights().unwrap();
        assert_eq!(ws.len(), batch.len());
        assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0));
        assert_eq!(ws.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1.0);

        // Lower priority, larger weight.
        let samples = buffer.batch_samples(&batch);
        for (a, b) in samples.iter().zip(samples.iter().skip(1)) {
            if a.priority() < b.priority() {
                assert!(a.importance_sampling_weight() >= b.importance_sampling_weight());
            }
        }
    }
    Ok(())
}

#[test]
fn test_beta_annealing() -> Result<()> {
    let mut buffer = ReplayBuffer::build(&config(16, 4).beta(0.4).beta_step_size(0.1))?;
    // Annealing also happens on an empty buffer.
    assert_eq!(buffer.beta(), 0.4);
    assert!(buffer.samples().is_empty());
    assert!((buffer.beta() - 0.5).abs() < 1e-12);

    for i in 0..16 {
        buffer.add(Sample::new(i));
    }
    for _ in 0..10 {
        let prev = buffer.beta();
        buffer.samples();
        assert!(buffer.beta() >= prev);
        assert!((buffer.beta() - (prev + 0.1).min(1.0)).abs() < 1e-12);
    }
    assert_eq!(buffer.beta(), 1.0);
    Ok(())
}

#[test]
fn test_priority_update_law() -> Result<()> {
    let mut buffer = ReplayBuffer::build(&config(16, 4).alpha(0.6))?;
    let ids = (0..16)
        .map(|i| buffer.add(Sample::new(i)))
        .collect::<Vec<_>>();

    for (k, &id) in ids.iter().enumerate() {
        let e = k as f64 - 8.0;
        buffer.set_td_error(id, e)?;
        buffer.update(id)?;
        let p = buffer.sample(id).unwrap().priority();
        assert!((p - (e.abs() + border_replay::EPSILON).powf(0.6)).abs() < 1e-12);
        assert!(buffer.max_priority() >= p);
    }

    // Zero error keeps the sample reachable.
    let id = ids[8];
    assert!(buffer.sample(id).unwrap().priority() > 0.0);
    Ok(())
}

#[test]
fn test_random_samples_ignore_priority() -> Result<()> {
    let (mut buffer, ids) = buffer_with_priorities(&[0.01, 0.01, 0.01, 100.0], 8)?;
    let mut counts = HashMap::new();
    for _ in 0..2000 {
        let batch = buffer.random_samples();
        assert_eq!(batch.len(), 8);
        assert!(batch.weights().is_none());
        for &id in batch.ids() {
            *counts.entry(id).or_insert(0usize) += 1;
        }
    }
    for id in ids {
        let freq = *counts.get(&id).unwrap_or(&0) as f64 / 16000.0;
        assert!((freq - 0.25).abs() < 0.02);
    }
    Ok(())
}

#[test]
fn test_invalid_config() {
    for config in [config(0, 4), config(4, 0), config(4, 4).alpha(f64::NAN)].iter() {
        let err = ReplayBuffer::<usize>::build(config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BufferError>(),
            Some(BufferError::InvalidConfig(_))
        ));
    }
}

#[test]
fn test_deterministic_given_seed() -> Result<()> {
    let draw = || -> Result<Vec<SampleId>> {
        let (mut buffer, _) = buffer_with_priorities(&[1.0, 5.0, 2.0, 7.0, 3.0], 3)?;
        Ok((0..20).flat_map(|_| buffer.samples().ids().to_vec()).collect())
    };
    assert_eq!(draw()?, draw()?);
    Ok(())
}

#[test]
fn test_transition_payload() -> Result<()> {
    let mut buffer = ReplayBuffer::build(&config(8, 2))?;
    let id = buffer.add(Sample::new(Transition::new(
        [0.0f32, 1.0],
        1usize,
        0.5,
        Some([1.0f32, 2.0]),
        false,
    )));
    let tr = &buffer.sample(id).unwrap().payload;
    assert_eq!(tr.action, 1);
    assert_eq!(tr.next_state, Some([1.0, 2.0]));
    Ok(())
}

#[test]
fn test_shared_between_threads() -> Result<()> {
    let buffer = Arc::new(Mutex::new(ReplayBuffer::build(&config(128, 8))?));

    let handles = (0..4)
        .map(|k| {
            let buffer = buffer.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let mut buffer = buffer.lock().unwrap();
                    buffer.add(Sample::new(k * 1000 + i));
                    if i % 10 == 0 {
                        let batch = buffer.samples();
                        for &id in batch.ids() {
                            buffer.set_td_error(id, 1.0).unwrap();
                        }
                        buffer.update_batch(&batch).unwrap();
                    }
                }
            })
        })
        .collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }

    let buffer = buffer.lock().unwrap();
    assert_eq!(buffer.len(), 128);
    assert_tree_consistent(&*buffer);
    Ok(())
}

//! 容量付き履歴バッファ

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use generation_strategy::StrategyKind;

use crate::HistoryRecord;

pub const DEFAULT_CAPACITY: usize = 50;

/// Append-only record store holding at most `capacity` records, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 記録を追加し、容量を超えた分を古い順に削除する。削除件数を返す。
    pub fn append(&mut self, record: HistoryRecord) -> usize {
        self.records.push_back(record);
        self.evict_overflow()
    }

    /// 容量を変更（設定の再読み込み時）。縮小時は古い記録を即座に削除する。
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        self.evict_overflow()
    }

    /// Copy of all records, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    /// Mean elapsed time of the retained runs for one strategy.
    pub fn average_elapsed_ms(&self, strategy: StrategyKind) -> Option<f64> {
        let (sum, count) = self
            .records
            .iter()
            .filter(|r| r.strategy == strategy)
            .fold((0.0, 0usize), |(sum, count), r| (sum + r.elapsed_ms, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    fn evict_overflow(&mut self) -> usize {
        let overflow = self.records.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.records.drain(..overflow);
            tracing::debug!(evicted = overflow, capacity = self.capacity, "history trimmed");
        }
        overflow
    }
}

/// `HistoryBuffer` behind a mutex, for callers that share it across tasks.
/// Append and eviction happen under one lock.
#[derive(Debug, Clone, Default)]
pub struct SharedHistory {
    inner: Arc<Mutex<HistoryBuffer>>,
}

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HistoryBuffer::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryBuffer> {
        // poisoning is ignored: append/evict never leave the buffer half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, record: HistoryRecord) -> usize {
        self.lock().append(record)
    }

    pub fn set_capacity(&self, capacity: usize) -> usize {
        self.lock().set_capacity(capacity)
    }

    pub fn snapshot(&self) -> Vec<HistoryRecord> {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(n: usize, strategy: StrategyKind) -> HistoryRecord {
        HistoryRecord {
            timestamp: Utc::now(),
            strategy,
            model: format!("model-{}", n),
            input_length: n,
            output_length: n * 2,
            elapsed_ms: n as f64,
        }
    }

    fn ids(buffer: &HistoryBuffer) -> Vec<usize> {
        buffer.snapshot().iter().map(|r| r.input_length).collect()
    }

    #[test]
    fn keeps_most_recent_records_oldest_first() {
        let mut buffer = HistoryBuffer::new(3);
        let mut evicted = 0;
        for n in 0..7 {
            evicted += buffer.append(record(n, StrategyKind::Library));
            assert!(buffer.len() <= buffer.capacity());
        }
        assert_eq!(evicted, 4);
        assert_eq!(ids(&buffer), vec![4, 5, 6]);
        assert_eq!(buffer.iter().last().map(|r| r.input_length), Some(6));
    }

    #[test]
    fn below_capacity_nothing_is_evicted() {
        let mut buffer = HistoryBuffer::default();
        assert_eq!(buffer.capacity(), 50);
        for n in 0..50 {
            assert_eq!(buffer.append(record(n, StrategyKind::Rest)), 0);
        }
        assert_eq!(buffer.len(), 50);
        assert_eq!(buffer.append(record(50, StrategyKind::Rest)), 1);
        assert_eq!(buffer.snapshot().first().map(|r| r.input_length), Some(1));
    }

    #[test]
    fn lowering_capacity_evicts_oldest() {
        let mut buffer = HistoryBuffer::new(10);
        for n in 0..8 {
            buffer.append(record(n, StrategyKind::Library));
        }
        assert_eq!(buffer.set_capacity(3), 5);
        assert_eq!(ids(&buffer), vec![5, 6, 7]);

        assert_eq!(buffer.set_capacity(5), 0);
        buffer.append(record(8, StrategyKind::Library));
        assert_eq!(ids(&buffer), vec![5, 6, 7, 8]);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut buffer = HistoryBuffer::new(0);
        assert_eq!(buffer.append(record(1, StrategyKind::Library)), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_buffer() {
        let mut buffer = HistoryBuffer::new(2);
        buffer.append(record(1, StrategyKind::Library));
        let mut snapshot = buffer.snapshot();
        snapshot[0].model = "changed".to_string();
        assert_eq!(buffer.snapshot()[0].model, "model-1");
    }

    #[test]
    fn average_per_strategy() {
        let mut buffer = HistoryBuffer::new(10);
        buffer.append(record(2, StrategyKind::Library));
        buffer.append(record(4, StrategyKind::Library));
        buffer.append(record(9, StrategyKind::Rest));
        assert_eq!(buffer.average_elapsed_ms(StrategyKind::Library), Some(3.0));
        assert_eq!(buffer.average_elapsed_ms(StrategyKind::Rest), Some(9.0));

        let empty = HistoryBuffer::new(1);
        assert_eq!(empty.average_elapsed_ms(StrategyKind::Rest), None);
    }

    #[test]
    fn shared_history_is_bounded_across_threads() {
        let shared = SharedHistory::new(5);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for n in 0..25 {
                        shared.append(record(t * 100 + n, StrategyKind::Rest));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.len(), 5);
        assert_eq!(shared.snapshot().len(), 5);
    }
}

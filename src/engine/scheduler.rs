//! Scheduler - deferred work on the engine's virtual clock
//!
//! Nothing in the engine sleeps. Work that must happen "later" (tearing down
//! a voice after its release tail, firing the next replay step) becomes a
//! task with a due time, and the engine runs due tasks as its clock passes
//! them. Tests drive the clock by hand, so timing is fully deterministic.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use crate::{keyboard::Note, synth::voice::VoiceId};

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Stop and drop a voice whose release tail is over
    Teardown(VoiceId),
    /// Start the replay voice for one recorded note
    PlaybackNote(Note),
    /// Release a replay voice after its fixed hold
    PlaybackRelease(VoiceId),
    /// The last replay voice has been released
    PlaybackFinished,
}

#[derive(Debug)]
struct Entry {
    due: f64,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Earlier due first, then insertion order
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run at engine time `at` (seconds).
    pub fn schedule(&mut self, at: f64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { due: at, seq, task }));
    }

    /// Due time of the earliest queued task.
    pub fn next_due(&self) -> Option<f64> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Remove and return the earliest task if it is due at or before `until`.
    pub fn pop_due(&mut self, until: f64) -> Option<(f64, Task)> {
        if self.next_due()? > until {
            return None;
        }
        self.queue
            .pop()
            .map(|Reverse(entry)| (entry.due, entry.task))
    }

    /// Keep only the tasks for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Task) -> bool) {
        self.queue.retain(|Reverse(entry)| keep(&entry.task));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.3, Task::Teardown(VoiceId(3)));
        scheduler.schedule(0.1, Task::Teardown(VoiceId(1)));
        scheduler.schedule(0.2, Task::Teardown(VoiceId(2)));

        assert_eq!(scheduler.next_due(), Some(0.1));
        let order: Vec<Task> = std::iter::from_fn(|| scheduler.pop_due(1.0))
            .map(|(_, task)| task)
            .collect();
        assert_eq!(
            order,
            vec![
                Task::Teardown(VoiceId(1)),
                Task::Teardown(VoiceId(2)),
                Task::Teardown(VoiceId(3)),
            ]
        );
    }

    #[test]
    fn equal_due_times_run_first_in_first_out() {
        let mut scheduler = Scheduler::new();
        for id in 0..5 {
            scheduler.schedule(0.5, Task::PlaybackRelease(VoiceId(id)));
        }
        for id in 0..5 {
            assert_eq!(
                scheduler.pop_due(0.5),
                Some((0.5, Task::PlaybackRelease(VoiceId(id))))
            );
        }
    }

    #[test]
    fn nothing_pops_before_its_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, Task::PlaybackFinished);
        assert_eq!(scheduler.pop_due(0.999), None);
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.pop_due(1.0).is_some());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn retain_filters_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.1, Task::Teardown(VoiceId(1)));
        scheduler.schedule(0.2, Task::PlaybackFinished);
        scheduler.retain(|task| matches!(task, Task::Teardown(_)));

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pop_due(1.0), Some((0.1, Task::Teardown(VoiceId(1)))));
    }
}

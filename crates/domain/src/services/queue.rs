use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use metrics::gauge;

use crate::model::NotificationPayload;

type Queue = Arc<Mutex<VecDeque<NotificationPayload>>>;

/// Per-destination outbound buffers.
///
/// Each destination owns its own lock; the outer map lock is only held to
/// look up or create a queue, so appends to different destinations never
/// contend. Append order within a destination is delivery order.
#[derive(Clone, Default)]
pub struct DestinationQueues {
    inner: Arc<RwLock<HashMap<String, Queue>>>,
}

impl DestinationQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the payload to its destination queue, creating the queue on
    /// first use. Returns the queue depth after the append.
    pub fn enqueue(&self, destination_id: &str, payload: NotificationPayload) -> usize {
        let queue = self.queue_for(destination_id);
        let mut guard = queue.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push_back(payload);
        let depth = guard.len();
        // Published under the lock so the last write is always the newest depth.
        record_depth(destination_id, depth);
        depth
    }

    /// Removes and returns everything queued for the destination, oldest first.
    pub fn drain(&self, destination_id: &str) -> Vec<NotificationPayload> {
        let Some(queue) = self.existing(destination_id) else {
            return Vec::new();
        };
        let mut guard = queue.lock().unwrap_or_else(PoisonError::into_inner);
        let drained: Vec<_> = guard.drain(..).collect();
        record_depth(destination_id, guard.len());
        drained
    }

    pub fn len(&self, destination_id: &str) -> usize {
        self.existing(destination_id)
            .map(|queue| queue.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, destination_id: &str) -> bool {
        self.len(destination_id) == 0
    }

    /// Destinations that have had a queue created, with their current depth.
    pub fn depths(&self) -> Vec<(String, usize)> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut depths: Vec<_> = map
            .iter()
            .map(|(id, queue)| {
                let depth = queue.lock().unwrap_or_else(PoisonError::into_inner).len();
                (id.clone(), depth)
            })
            .collect();
        depths.sort_by(|left, right| left.0.cmp(&right.0));
        depths
    }

    fn existing(&self, destination_id: &str) -> Option<Queue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(destination_id)
            .cloned()
    }

    fn queue_for(&self, destination_id: &str) -> Queue {
        if let Some(queue) = self.existing(destination_id) {
            return queue;
        }
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(destination_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }
}

fn record_depth(destination_id: &str, depth: usize) {
    gauge!("destination_queue_depth", "destination" => destination_id.to_owned())
        .set(depth as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::thread;

    fn payload(destination: &str, caption: &str) -> NotificationPayload {
        NotificationPayload {
            destination_id: destination.to_string(),
            image: "img".to_string(),
            caption: caption.to_string(),
        }
    }

    #[test]
    fn creates_queue_on_first_enqueue() {
        let queues = DestinationQueues::new();
        assert!(queues.is_empty("group-a"));
        assert_eq!(queues.enqueue("group-a", payload("group-a", "one")), 1);
        assert_eq!(queues.enqueue("group-a", payload("group-a", "two")), 2);
        assert_eq!(queues.len("group-a"), 2);
        assert_eq!(queues.len("group-b"), 0);
    }

    #[test]
    fn drain_preserves_append_order_and_empties() {
        let queues = DestinationQueues::new();
        for caption in ["one", "two", "three"] {
            queues.enqueue("group-a", payload("group-a", caption));
        }
        let drained: Vec<_> = queues
            .drain("group-a")
            .into_iter()
            .map(|p| p.caption)
            .collect();
        assert_eq!(drained, vec!["one", "two", "three"]);
        assert!(queues.is_empty("group-a"));
        assert!(queues.drain("unknown").is_empty());
    }

    #[test]
    fn concurrent_enqueues_lose_nothing_and_keep_per_writer_order() {
        let queues = DestinationQueues::new();
        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let queues = queues.clone();
                thread::spawn(move || {
                    for seq in 0..250 {
                        let destination = if writer % 2 == 0 { "even" } else { "odd" };
                        queues.enqueue(
                            destination,
                            payload(destination, &format!("{writer}:{seq}")),
                        );
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(queues.len("even"), 1000);
        assert_eq!(queues.len("odd"), 1000);

        let mut last_seen: HashMap<String, i32> = HashMap::new();
        for item in queues.drain("even") {
            let (writer, seq) = item.caption.split_once(':').unwrap();
            let seq: i32 = seq.parse().unwrap();
            let previous = last_seen.insert(writer.to_string(), seq).unwrap_or(-1);
            assert!(seq > previous);
        }
    }

    #[test]
    fn depths_lists_known_destinations() {
        let queues = DestinationQueues::new();
        queues.enqueue("b", payload("b", "x"));
        queues.enqueue("a", payload("a", "x"));
        queues.enqueue("a", payload("a", "y"));
        assert_eq!(
            queues.depths(),
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn depth_gauge_matches_queue_after_concurrent_enqueues() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let queues = DestinationQueues::new();

        thread::scope(|scope| {
            for writer in 0..8 {
                let queues = &queues;
                let recorder = &recorder;
                scope.spawn(move || {
                    metrics::with_local_recorder(recorder, || {
                        for seq in 0..100 {
                            queues.enqueue("shared", payload("shared", &format!("{writer}:{seq}")));
                        }
                    })
                });
            }
        });

        assert_eq!(queues.len("shared"), 800);
        let rendered = handle.render();
        assert!(
            rendered.contains("destination_queue_depth{destination=\"shared\"} 800"),
            "{rendered}"
        );

        metrics::with_local_recorder(&recorder, || queues.drain("shared"));
        assert!(handle
            .render()
            .contains("destination_queue_depth{destination=\"shared\"} 0"));
    }
}

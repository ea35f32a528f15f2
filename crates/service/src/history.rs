use parking_lot::Mutex;

use crate::HISTORY_CAPACITY;

struct Ring {
    slots: Vec<String>,
    head: usize,
    count: usize,
}

/// The bounded chat history: the most recent broadcasts, FIFO on overflow.
///
/// Lines are stored already shaped as `history$ <sender>: <text>\n` so the
/// conn replay path can send them verbatim. Written only by the say broadcast
/// path, read only by the conn replay path; hold time of the internal lock is
/// bounded to a copy.
pub struct History {
    capacity: usize,
    ring: Mutex<Ring>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ring: Mutex::new(Ring {
                slots: Vec::with_capacity(capacity),
                head: 0,
                count: 0,
            }),
        }
    }

    /// Append a formatted line, dropping the oldest one when full.
    pub fn push(&self, line: String) {
        let mut ring = self.ring.lock();
        let ring = &mut *ring;

        if ring.slots.len() < self.capacity {
            ring.slots.push(line);
        } else {
            ring.slots[ring.head] = line;
        }

        ring.head = (ring.head + 1) % self.capacity;
        ring.count = usize::min(ring.count + 1, self.capacity);
    }

    /// Stored lines, oldest to newest.
    pub fn snapshot(&self) -> Vec<String> {
        let ring = self.ring.lock();

        if ring.count < self.capacity {
            return ring.slots[..ring.count].to_vec();
        }

        // Full ring: head points at the oldest line.
        let mut lines = Vec::with_capacity(ring.count);
        for offset in 0..ring.count {
            lines.push(ring.slots[(ring.head + offset) % self.capacity].clone());
        }

        lines
    }

    pub fn len(&self) -> usize {
        self.ring.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

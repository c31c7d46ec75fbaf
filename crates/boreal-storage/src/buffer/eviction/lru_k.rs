//! LRU-K replacement policy.
//!
//! Tracks the last K access timestamps of every frame. The backward
//! k-distance of a frame is the age of its K-th most recent access; frames
//! with fewer than K recorded accesses have infinite distance and are
//! preferred victims. Within the infinite class, and among finite ties,
//! the frame whose *most recent* access is oldest goes first.
//!
//! Timestamps are a logical counter advanced under the latch, so they are
//! unique and totally ordered regardless of wall clock.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::super::frame::FrameId;
use super::Replacer;

struct LruKNode {
    /// Last K access timestamps, oldest first.
    history: VecDeque<u64>,
    evictable: bool,
}

struct LruKInner {
    nodes: HashMap<FrameId, LruKNode>,
    current_ts: u64,
    evictable_count: usize,
}

/// K-distance eviction over a fixed set of frames.
pub struct LruKReplacer {
    inner: Mutex<LruKInner>,
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    /// Creates a replacer for frames `0..num_frames` tracking `k` accesses.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "lru-k needs k >= 1");
        Self {
            inner: Mutex::new(LruKInner {
                nodes: HashMap::with_capacity(num_frames),
                current_ts: 0,
                evictable_count: 0,
            }),
            num_frames,
            k,
        }
    }

    fn check_bounds(&self, frame_id: FrameId) {
        assert!(
            frame_id.index() < self.num_frames,
            "frame {} out of range for replacer of {} frames",
            frame_id.index(),
            self.num_frames
        );
    }

    /// Appends the current logical timestamp to the frame's history,
    /// keeping only the most recent `k` entries.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is outside `0..num_frames`.
    pub fn record_access(&self, frame_id: FrameId) {
        self.check_bounds(frame_id);
        let inner = &mut *self.inner.lock();
        let ts = inner.current_ts;
        inner.current_ts += 1;

        let node = inner.nodes.entry(frame_id).or_insert_with(|| LruKNode {
            history: VecDeque::with_capacity(self.k),
            evictable: false,
        });
        node.history.push_back(ts);
        if node.history.len() > self.k {
            node.history.pop_front();
        }
    }

    /// Marks or unmarks the frame as an eviction candidate.
    ///
    /// Unknown (never accessed) frames are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is outside `0..num_frames`.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_bounds(frame_id);
        let inner = &mut *self.inner.lock();
        if let Some(node) = inner.nodes.get_mut(&frame_id) {
            if node.evictable != evictable {
                node.evictable = evictable;
                if evictable {
                    inner.evictable_count += 1;
                } else {
                    inner.evictable_count -= 1;
                }
            }
        }
    }

    /// Forgets the frame's history and evictability.
    pub fn remove(&self, frame_id: FrameId) {
        let inner = &mut *self.inner.lock();
        if let Some(node) = inner.nodes.remove(&frame_id) {
            if node.evictable {
                inner.evictable_count -= 1;
            }
        }
    }

    /// Picks the evictable frame with the largest backward k-distance,
    /// removes it, and erases its history.
    ///
    /// Frames with fewer than `k` accesses count as infinitely distant and
    /// win over any finite distance; the infinite class and finite ties
    /// both resolve to the earliest most-recent access.
    pub fn evict(&self) -> Option<FrameId> {
        let inner = &mut *self.inner.lock();
        let now = inner.current_ts;

        struct Candidate {
            frame_id: FrameId,
            infinite: bool,
            distance: u64,
            most_recent: u64,
        }

        let mut victim: Option<Candidate> = None;
        for (&frame_id, node) in &inner.nodes {
            if !node.evictable {
                continue;
            }
            let (Some(&oldest), Some(&most_recent)) = (node.history.front(), node.history.back())
            else {
                continue;
            };
            let infinite = node.history.len() < self.k;
            let candidate = Candidate {
                frame_id,
                infinite,
                distance: if infinite { u64::MAX } else { now - oldest },
                most_recent,
            };
            victim = Some(match victim {
                None => candidate,
                Some(best) => {
                    let candidate_wins = match (candidate.infinite, best.infinite) {
                        (true, false) => true,
                        (false, true) => false,
                        (true, true) => candidate.most_recent < best.most_recent,
                        (false, false) => {
                            candidate.distance > best.distance
                                || (candidate.distance == best.distance
                                    && candidate.most_recent < best.most_recent)
                        }
                    };
                    if candidate_wins {
                        candidate
                    } else {
                        best
                    }
                }
            });
        }

        let frame_id = victim?.frame_id;
        inner.nodes.remove(&frame_id);
        inner.evictable_count -= 1;
        Some(frame_id)
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.inner.lock().evictable_count
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&self, frame_id: FrameId) {
        LruKReplacer::record_access(self, frame_id);
    }

    fn pin(&self, frame_id: FrameId) {
        self.set_evictable(frame_id, false);
    }

    fn unpin(&self, frame_id: FrameId) {
        self.set_evictable(frame_id, true);
    }

    fn evict(&self) -> Option<FrameId> {
        LruKReplacer::evict(self)
    }

    fn remove(&self, frame_id: FrameId) {
        LruKReplacer::remove(self, frame_id);
    }

    fn size(&self) -> usize {
        LruKReplacer::size(self)
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruKReplacer")
            .field("num_frames", &self.num_frames)
            .field("k", &self.k)
            .field("evictable", &inner.evictable_count)
            .field("tracked", &inner.nodes.len())
            .finish()
    }
}

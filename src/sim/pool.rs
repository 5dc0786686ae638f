//! Recycling of retired shaft segments

use super::shaft::{ShaftGenerator, ShaftSegment};
use crate::consts::SEGMENT_POOL_CAPACITY;

/// Bounded free list of segments, wrapping the generator that refills them
#[derive(Debug, Clone)]
pub struct SegmentPool {
    generator: ShaftGenerator,
    free: Vec<ShaftSegment>,
    capacity: usize,
}

impl SegmentPool {
    pub fn new(generator: ShaftGenerator) -> Self {
        Self::with_capacity(generator, SEGMENT_POOL_CAPACITY)
    }

    pub fn with_capacity(generator: ShaftGenerator, capacity: usize) -> Self {
        Self {
            generator,
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn generator(&self) -> &ShaftGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut ShaftGenerator {
        &mut self.generator
    }

    /// Number of segments waiting for reuse
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Reuse a pooled segment at `y`, or generate a new one
    pub fn get(&mut self, y: f32, difficulty: f32) -> ShaftSegment {
        match self.free.pop() {
            Some(mut segment) => {
                segment.position.y = y;
                segment.passed = false;
                self.generator.populate(&mut segment, difficulty);
                log::debug!("Reused segment {} at y={}", segment.id, y);
                segment
            }
            None => self.generator.generate_segment(y, difficulty),
        }
    }

    /// Return a segment for reuse; drops it when the pool is full or it is
    /// already pooled
    pub fn release(&mut self, mut segment: ShaftSegment) {
        if self.free.iter().any(|s| s.id == segment.id) {
            log::warn!("Segment {} released twice, ignoring", segment.id);
            return;
        }
        if self.free.len() >= self.capacity {
            log::debug!("Segment pool full, dropping segment {}", segment.id);
            return;
        }
        segment.obstacles.clear();
        self.free.push(segment);
    }

    /// Empty the pool (game reset)
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

use crate::draw::model::{PenStyle, Segment, Stroke, SEGMENT_BATCH_POINTS};

/// Identifies a stroke independently of its position in the store, so a
/// handle held across an erase or undo never aliases a different stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrokeHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The building segment grew by one point.
    Extended { segment: usize },
    /// The segment at `sealed` reached the batch size and a continuation
    /// segment anchored at its last point was opened.
    Sealed { sealed: usize },
    /// Unknown or finished stroke.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    RestoredClear { restored: usize },
    RemovedStroke,
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
struct StrokeEntry {
    id: u64,
    open: bool,
    stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeStore {
    entries: Vec<StrokeEntry>,
    cleared_backup: Option<Vec<StrokeEntry>>,
    just_cleared: bool,
    next_id: u64,
}

impl StrokeStore {
    pub fn begin_stroke(&mut self, style: PenStyle) -> StrokeHandle {
        self.invalidate_clear_backup();
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(StrokeEntry {
            id,
            open: true,
            stroke: Stroke::new(style),
        });
        StrokeHandle(id)
    }

    pub fn append_point(&mut self, handle: StrokeHandle, point: (i32, i32)) -> AppendOutcome {
        let Some(entry) = self.open_entry_mut(handle) else {
            return AppendOutcome::Ignored;
        };
        let segments = &mut entry.stroke.segments;

        let needs_new_segment = !matches!(segments.last(), Some(Segment::Polyline { .. }));
        if needs_new_segment {
            segments.push(Segment::polyline(point));
            return AppendOutcome::Extended {
                segment: segments.len() - 1,
            };
        }

        let index = segments.len() - 1;
        let Some(Segment::Polyline { points }) = segments.last_mut() else {
            return AppendOutcome::Ignored;
        };
        points.push(point);
        if points.len() - 1 < SEGMENT_BATCH_POINTS {
            return AppendOutcome::Extended { segment: index };
        }

        segments.push(Segment::polyline(point));
        AppendOutcome::Sealed { sealed: index }
    }

    /// Replaces a stroke that never moved with a single dot marker.
    pub fn seal_as_dot(&mut self, handle: StrokeHandle, point: (i32, i32), radius: f32) -> bool {
        let Some(entry) = self.open_entry_mut(handle) else {
            return false;
        };
        let segments = &mut entry.stroke.segments;
        let unmoved = match segments.as_slice() {
            [] => true,
            [only] => only.steps() == 0,
            _ => false,
        };
        if !unmoved {
            return false;
        }
        segments.clear();
        segments.push(Segment::Dot {
            center: point,
            radius,
        });
        true
    }

    /// Seals the building segment; later appends through `handle` are ignored.
    pub fn finish_stroke(&mut self, handle: StrokeHandle) {
        if let Some(entry) = self.open_entry_mut(handle) {
            entry.open = false;
        }
    }

    pub fn undo_last(&mut self) -> UndoOutcome {
        if self.just_cleared {
            if let Some(backup) = self.cleared_backup.take().filter(|b| !b.is_empty()) {
                let restored = backup.len();
                self.entries = backup;
                self.just_cleared = false;
                tracing::info!(restored, "undo restored cleared strokes");
                return UndoOutcome::RestoredClear { restored };
            }
        }

        self.invalidate_clear_backup();
        match self.entries.pop() {
            Some(_) => UndoOutcome::RemovedStroke,
            None => UndoOutcome::Nothing,
        }
    }

    pub fn clear(&mut self) {
        let backup = std::mem::take(&mut self.entries);
        tracing::info!(strokes = backup.len(), "cleared canvas");
        self.cleared_backup = Some(backup);
        self.just_cleared = true;
    }

    /// Removes the most recent stroke whose ink lies within `buffer` pixels
    /// of `point`. At most one stroke is removed per call.
    pub fn erase_at(&mut self, point: (i32, i32), buffer: f32) -> Option<Stroke> {
        let (px, py) = (point.0 as f32, point.1 as f32);
        let index = self.entries.iter().rposition(|entry| {
            let width = entry.stroke.width;
            entry.stroke.segments.iter().any(|segment| {
                let Some((x0, y0, x1, y1)) = segment.ink_bounds(width) else {
                    return false;
                };
                let in_box = px >= x0 - buffer
                    && px <= x1 + buffer
                    && py >= y0 - buffer
                    && py <= y1 + buffer;
                in_box && segment.hit(width, point, buffer)
            })
        })?;
        Some(self.entries.remove(index).stroke)
    }

    pub fn strokes(&self) -> impl DoubleEndedIterator<Item = &Stroke> + ExactSizeIterator {
        self.entries.iter().map(|entry| &entry.stroke)
    }

    pub fn stroke(&self, handle: StrokeHandle) -> Option<&Stroke> {
        self.entry(handle).map(|entry| &entry.stroke)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn just_cleared(&self) -> bool {
        self.just_cleared
    }

    pub fn has_clear_backup(&self) -> bool {
        self.cleared_backup.is_some()
    }

    fn invalidate_clear_backup(&mut self) {
        self.just_cleared = false;
        self.cleared_backup = None;
    }

    fn entry(&self, handle: StrokeHandle) -> Option<&StrokeEntry> {
        // The handle in use is almost always the newest stroke.
        self.entries.iter().rev().find(|entry| entry.id == handle.0)
    }

    fn open_entry_mut(&mut self, handle: StrokeHandle) -> Option<&mut StrokeEntry> {
        self.entries
            .iter_mut()
            .rev()
            .find(|entry| entry.id == handle.0)
            .filter(|entry| entry.open)
    }
}

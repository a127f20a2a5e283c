use super::backend::MAX_TEXTURE_SLOTS;

/// Per-frame submission counters.
///
/// Reset by [`RenderContext::begin_frame`](super::RenderContext::begin_frame);
/// every non-empty kind flush adds one draw call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub vertices: u32,
    pub indices: u32,
    /// Quads appended (glyphs included). Triangles are not counted here.
    pub quads: u32,
    /// Highest number of occupied texture slots seen in a shape flush.
    pub active_texture_slots: u32,
    /// Slots permanently taken by the engine (the white texture).
    pub reserved_texture_slots: u32,
    /// Flush events (explicit, overflow, atlas switch, target switch) that
    /// submitted at least one draw.
    pub flushes: u32,
}

impl RenderStats {
    pub const fn max_texture_slots() -> u32 {
        MAX_TEXTURE_SLOTS as u32
    }

    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for RenderStats {
    fn default() -> Self {
        Self {
            draw_calls: 0,
            vertices: 0,
            indices: 0,
            quads: 0,
            active_texture_slots: 0,
            reserved_texture_slots: 1,
            flushes: 0,
        }
    }
}

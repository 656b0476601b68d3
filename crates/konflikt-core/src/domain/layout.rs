//! Screen layout domain entity.
//!
//! The layout manager maintains a unified 2-D coordinate plane in which all
//! screens are positioned.  The server screen is anchored at (0, 0); clients
//! are packed to its right, top-aligned.  Adjacency is always derived from
//! the current positions, never stored.

use std::collections::HashMap;

use crate::protocol::messages::{AdjacencyInfo, ScreenInfo};

/// The four edges of a rectangular screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// One screen in the plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenEntry {
    pub instance_id: String,
    pub display_name: String,
    pub machine_id: String,
    /// Top-left corner in the shared plane; may be negative.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_server: bool,
    pub online: bool,
}

impl ScreenEntry {
    /// Rightmost x coordinate (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottommost y coordinate (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    fn to_screen_info(&self) -> ScreenInfo {
        ScreenInfo {
            instance_id: self.instance_id.clone(),
            display_name: self.display_name.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            is_server: self.is_server,
            online: self.online,
        }
    }
}

/// Derived neighbour map with four optional slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    pub left: Option<String>,
    pub right: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
}

impl Adjacency {
    /// Converts to the wire representation.
    pub fn to_info(&self) -> AdjacencyInfo {
        AdjacencyInfo {
            left: self.left.clone(),
            right: self.right.clone(),
            top: self.top.clone(),
            bottom: self.bottom.clone(),
        }
    }
}

/// Result of an edge-crossing query: the target screen and the landing
/// position in that screen's local coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTarget {
    pub target: ScreenEntry,
    pub new_x: i32,
    pub new_y: i32,
}

/// The screen arrangement.
///
/// All mutating operations keep the invariant that no two online screens
/// overlap: positions are assigned by packing, never chosen freely.  No
/// operation fails; unknown ids yield `None` or are ignored.
#[derive(Debug, Default)]
pub struct LayoutManager {
    screens: HashMap<String, ScreenEntry>,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces the server screen at (0, 0).
    pub fn set_server_screen(
        &mut self,
        instance_id: &str,
        display_name: &str,
        machine_id: &str,
        width: i32,
        height: i32,
    ) {
        self.screens.insert(
            instance_id.to_string(),
            ScreenEntry {
                instance_id: instance_id.to_string(),
                display_name: display_name.to_string(),
                machine_id: machine_id.to_string(),
                x: 0,
                y: 0,
                width,
                height,
                is_server: true,
                online: true,
            },
        );
    }

    /// Registers a client screen and returns the placed entry.
    ///
    /// New screens are inserted to the right of the rightmost existing
    /// screen, top-aligned.  A re-registration of a known id refreshes the
    /// entry's name and geometry and then re-packs the whole row, so a
    /// client that reconnects with new geometry keeps its slot instead of
    /// leaving a stale gap behind.
    pub fn register_client(
        &mut self,
        instance_id: &str,
        display_name: &str,
        machine_id: &str,
        width: i32,
        height: i32,
    ) -> ScreenEntry {
        if let Some(existing) = self.screens.get_mut(instance_id) {
            existing.display_name = display_name.to_string();
            existing.machine_id = machine_id.to_string();
            existing.width = width;
            existing.height = height;
            existing.online = true;
            self.arrange_screens();
            return self.screens[instance_id].clone();
        }

        let x = self
            .screens
            .values()
            .map(ScreenEntry::right)
            .max()
            .unwrap_or(0);

        let entry = ScreenEntry {
            instance_id: instance_id.to_string(),
            display_name: display_name.to_string(),
            machine_id: machine_id.to_string(),
            x,
            y: 0,
            width,
            height,
            is_server: false,
            online: true,
        };
        self.screens.insert(instance_id.to_string(), entry.clone());
        entry
    }

    /// Removes a client screen and re-packs the remaining screens
    /// left-to-right by their prior x order, all top-aligned at y = 0.
    pub fn unregister_client(&mut self, instance_id: &str) {
        if self.screens.remove(instance_id).is_some() {
            self.arrange_screens();
        }
    }

    /// Toggles a screen's online flag.  Does not re-arrange.
    pub fn set_online(&mut self, instance_id: &str, online: bool) {
        if let Some(screen) = self.screens.get_mut(instance_id) {
            screen.online = online;
        }
    }

    /// Looks up a screen by id.
    pub fn screen(&self, instance_id: &str) -> Option<&ScreenEntry> {
        self.screens.get(instance_id)
    }

    /// All screens sorted by x position, left to right.
    pub fn screens(&self) -> Vec<ScreenEntry> {
        let mut layout: Vec<ScreenEntry> = self.screens.values().cloned().collect();
        layout.sort_by_key(|s| s.x);
        layout
    }

    /// The layout in wire form, for `layout_update` broadcasts.
    pub fn to_screen_infos(&self) -> Vec<ScreenInfo> {
        self.screens().iter().map(ScreenEntry::to_screen_info).collect()
    }

    /// Derives the neighbour map for one screen.
    ///
    /// `A` is left-of `B` iff `A.x + A.width == B.x` and their vertical
    /// extents overlap by at least one pixel; the other slots follow the
    /// same rule rotated.
    pub fn adjacency(&self, instance_id: &str) -> Adjacency {
        let mut adj = Adjacency::default();
        let Some(screen) = self.screens.get(instance_id) else {
            return adj;
        };

        for (id, other) in &self.screens {
            if id == instance_id {
                continue;
            }
            let horizontal_overlap = other.x < screen.right() && screen.x < other.right();
            let vertical_overlap = other.y < screen.bottom() && screen.y < other.bottom();

            if other.right() == screen.x && vertical_overlap {
                adj.left = Some(id.clone());
            }
            if screen.right() == other.x && vertical_overlap {
                adj.right = Some(id.clone());
            }
            if other.bottom() == screen.y && horizontal_overlap {
                adj.top = Some(id.clone());
            }
            if screen.bottom() == other.y && horizontal_overlap {
                adj.bottom = Some(id.clone());
            }
        }

        adj
    }

    /// Resolves an edge crossing from `from_id` at cursor position
    /// `(cursor_x, cursor_y)` (in the shared plane) into a landing position
    /// on the neighbouring screen.
    ///
    /// The landing coordinate is inset two pixels from the entry edge so the
    /// very next mouse move cannot immediately re-trigger a transition in
    /// the opposite direction.  Offline and missing targets yield `None`.
    pub fn transition_target(
        &self,
        from_id: &str,
        edge: Edge,
        cursor_x: i32,
        cursor_y: i32,
    ) -> Option<TransitionTarget> {
        let from = self.screens.get(from_id)?;
        let adj = self.adjacency(from_id);

        let target_id = match edge {
            Edge::Left => adj.left,
            Edge::Right => adj.right,
            Edge::Top => adj.top,
            Edge::Bottom => adj.bottom,
        }?;

        let target = self.screens.get(&target_id)?;
        if !target.online {
            return None;
        }

        let rel_y = (cursor_y - from.y).clamp(0, target.height - 1);
        let rel_x = (cursor_x - from.x).clamp(0, target.width - 1);

        let (new_x, new_y) = match edge {
            Edge::Left => (target.width - 2, rel_y),
            Edge::Right => (1, rel_y),
            Edge::Top => (rel_x, target.height - 2),
            Edge::Bottom => (rel_x, 1),
        };

        Some(TransitionTarget {
            target: target.clone(),
            new_x,
            new_y,
        })
    }

    /// Packs all screens left-to-right by their current x order, starting at
    /// x = 0, all at y = 0.  The server ends up first because it sits at
    /// x = 0 already.
    fn arrange_screens(&mut self) {
        let mut order: Vec<String> = {
            let mut entries: Vec<&ScreenEntry> = self.screens.values().collect();
            entries.sort_by_key(|s| s.x);
            entries.iter().map(|s| s.instance_id.clone()).collect()
        };
        // The server stays anchored first even if a stale x ordering would
        // place a client at or before 0.
        if let Some(pos) = order
            .iter()
            .position(|id| self.screens[id].is_server)
        {
            let server = order.remove(pos);
            order.insert(0, server);
        }

        let mut current_x = 0;
        for id in order {
            let screen = self.screens.get_mut(&id).expect("id from iteration");
            screen.x = current_x;
            screen.y = 0;
            current_x += screen.width;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn server_layout() -> LayoutManager {
        let mut layout = LayoutManager::new();
        layout.set_server_screen("server-01", "workstation", "c0ffee00", 1920, 1080);
        layout
    }

    // ── set_server_screen ─────────────────────────────────────────────────────

    #[test]
    fn test_server_alone_is_at_origin() {
        let layout = server_layout();
        let screens = layout.screens();
        assert_eq!(screens.len(), 1);
        let s = &screens[0];
        assert_eq!((s.x, s.y, s.width, s.height), (0, 0, 1920, 1080));
        assert!(s.is_server);
        assert!(s.online);
    }

    // ── register_client ───────────────────────────────────────────────────────

    #[test]
    fn test_register_client_places_right_of_server() {
        let mut layout = server_layout();
        let entry = layout.register_client("lappy-7f3a", "lappy", "ab12cd34", 1280, 720);
        assert_eq!((entry.x, entry.y), (1920, 0));
        assert!(!entry.is_server);
    }

    #[test]
    fn test_second_client_placed_after_rightmost() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        let entry = layout.register_client("c2", "two", "m2", 2560, 1440);
        assert_eq!(entry.x, 1920 + 1280);
        assert_eq!(entry.y, 0);
    }

    #[test]
    fn test_reregistration_with_new_geometry_keeps_slot_and_repacks() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        layout.register_client("c2", "two", "m2", 1920, 1080);

        // c1 comes back wider; c2 must shift right rather than overlap.
        layout.register_client("c1", "one", "m1", 2560, 1440);

        let c1 = layout.screen("c1").unwrap();
        let c2 = layout.screen("c2").unwrap();
        assert_eq!(c1.x, 1920, "c1 keeps its slot next to the server");
        assert_eq!(c1.width, 2560);
        assert_eq!(c2.x, 1920 + 2560, "c2 packed after the widened c1");
    }

    #[test]
    fn test_no_two_screens_overlap_after_registrations() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        layout.register_client("c2", "two", "m2", 2560, 1440);
        layout.register_client("c3", "three", "m3", 800, 600);

        let screens = layout.screens();
        for a in &screens {
            for b in &screens {
                if a.instance_id == b.instance_id {
                    continue;
                }
                let overlap = a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom();
                assert!(!overlap, "{} overlaps {}", a.instance_id, b.instance_id);
            }
        }
    }

    // ── unregister_client ─────────────────────────────────────────────────────

    #[test]
    fn test_unregister_middle_client_packs_remainder() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        layout.register_client("c2", "two", "m2", 1920, 1080);

        layout.unregister_client("c1");

        let server = layout.screen("server-01").unwrap();
        let c2 = layout.screen("c2").unwrap();
        assert_eq!(server.x, 0);
        assert_eq!(c2.x, 1920, "c2 slides left into the vacated slot");
        assert_eq!(c2.y, 0);
    }

    #[test]
    fn test_register_then_unregister_restores_layout() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        let before = layout.screens();

        layout.register_client("c2", "two", "m2", 1920, 1080);
        layout.unregister_client("c2");

        assert_eq!(layout.screens(), before);
    }

    #[test]
    fn test_unregister_unknown_id_is_a_no_op() {
        let mut layout = server_layout();
        let before = layout.screens();
        layout.unregister_client("nobody");
        assert_eq!(layout.screens(), before);
    }

    // ── set_online ────────────────────────────────────────────────────────────

    #[test]
    fn test_set_online_toggles_flag_without_rearranging() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        layout.register_client("c2", "two", "m2", 1920, 1080);
        let c2_x_before = layout.screen("c2").unwrap().x;

        layout.set_online("c1", false);

        assert!(!layout.screen("c1").unwrap().online);
        assert_eq!(layout.screen("c2").unwrap().x, c2_x_before);
    }

    // ── adjacency ─────────────────────────────────────────────────────────────

    #[test]
    fn test_adjacency_left_right_pair() {
        let mut layout = server_layout();
        layout.register_client("lappy-7f3a", "lappy", "m1", 1280, 720);

        let server_adj = layout.adjacency("server-01");
        let client_adj = layout.adjacency("lappy-7f3a");

        assert_eq!(server_adj.right.as_deref(), Some("lappy-7f3a"));
        assert_eq!(client_adj.left.as_deref(), Some("server-01"));
        assert_eq!(server_adj.left, None);
        assert_eq!(client_adj.right, None);
    }

    #[test]
    fn test_adjacency_requires_vertical_overlap() {
        let mut layout = LayoutManager::new();
        layout.set_server_screen("s", "s", "m", 1920, 1080);
        // Place a screen whose left edge is collinear but entirely below.
        layout.screens.insert(
            "below".to_string(),
            ScreenEntry {
                instance_id: "below".to_string(),
                display_name: "below".to_string(),
                machine_id: "m".to_string(),
                x: 1920,
                y: 2000,
                width: 1920,
                height: 1080,
                is_server: false,
                online: true,
            },
        );
        assert_eq!(layout.adjacency("s").right, None);
    }

    #[test]
    fn test_adjacency_unknown_id_is_empty() {
        let layout = server_layout();
        assert_eq!(layout.adjacency("nobody"), Adjacency::default());
    }

    // ── transition_target ─────────────────────────────────────────────────────

    #[test]
    fn test_right_transition_lands_one_pixel_in() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);

        let t = layout
            .transition_target("server-01", Edge::Right, 1919, 400)
            .expect("adjacent online target");
        assert_eq!(t.target.instance_id, "c1");
        assert_eq!(t.new_x, 1);
        assert_eq!(t.new_y, 400);
    }

    #[test]
    fn test_right_transition_clamps_y_to_target_height() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);

        // Cursor near the server's bottom, below the 720-tall client.
        let t = layout
            .transition_target("server-01", Edge::Right, 1919, 1000)
            .unwrap();
        assert_eq!(t.new_y, 719);
    }

    #[test]
    fn test_left_transition_lands_two_pixels_from_right_edge() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);

        let t = layout
            .transition_target("c1", Edge::Left, 1920, 300)
            .expect("server is the left neighbour");
        assert_eq!(t.target.instance_id, "server-01");
        assert_eq!(t.new_x, 1918, "width - 2 inset");
        assert_eq!(t.new_y, 300);
    }

    #[test]
    fn test_transition_to_offline_target_is_none() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        layout.set_online("c1", false);

        assert!(layout.transition_target("server-01", Edge::Right, 1919, 400).is_none());
    }

    #[test]
    fn test_transition_with_no_neighbour_is_none() {
        let layout = server_layout();
        assert!(layout.transition_target("server-01", Edge::Right, 1919, 400).is_none());
        assert!(layout.transition_target("server-01", Edge::Top, 500, 0).is_none());
    }

    #[test]
    fn test_transition_from_unknown_screen_is_none() {
        let layout = server_layout();
        assert!(layout.transition_target("nobody", Edge::Right, 0, 0).is_none());
    }

    // ── wire conversion ───────────────────────────────────────────────────────

    #[test]
    fn test_to_screen_infos_is_sorted_left_to_right() {
        let mut layout = server_layout();
        layout.register_client("c1", "one", "m1", 1280, 720);
        layout.register_client("c2", "two", "m2", 1920, 1080);

        let infos = layout.to_screen_infos();
        let xs: Vec<i32> = infos.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![0, 1920, 3200]);
        assert!(infos[0].is_server);
    }
}

use std::hash::Hash;

use ratatui::widgets::TableState;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use tracing::debug;

use crate::action::{TreeAction, TreeEvent};
use crate::edit::{Removal, TreeEdit};
use crate::input::{ContentInput, InputAction, InputOutcome};
use crate::label::{PositionLabel, label_all};
use crate::model::TreeModel;
use crate::style::TreeScrollPolicy;

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// A visible node row with metadata used for rendering and navigation.
#[derive(Clone)]
pub struct VisibleNode<Id> {
    pub(crate) id: Id,
    pub(crate) level: u16,
    pub(crate) parent: Option<Id>,
    pub(crate) has_children: bool,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
}

/// Presenter state: selection, visible rows, derived labels, the invalid
/// marker and the inline input.
///
/// Only ids are held here; the tree itself stays with the model.
pub struct MessageTreeState<Id> {
    list_state: TableState,
    // Cached visible rows to avoid recomputing DFS every render.
    visible_nodes: Vec<VisibleNode<Id>>,
    // Fast lookup from node id to visible row index.
    visible_index: FxHashMap<Id, usize>,
    // Position labels for every node, rebuilt together with the rows.
    labels: FxHashMap<Id, PositionLabel>,
    // Marks whether rows and labels must be rebuilt.
    dirty: bool,
    invalid: Option<Id>,
    input: Option<ContentInput<Id>>,
    edit_on_create: bool,
    draw_lines: bool,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

impl<Id: Copy + Eq + Hash> Default for MessageTreeState<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq + Hash> MessageTreeState<Id> {
    /// Creates a new empty state with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a state with preallocated capacity for the given number of nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list_state: TableState::default(),
            visible_nodes: Vec::with_capacity(capacity),
            visible_index: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            labels: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            dirty: true,
            invalid: None,
            input: None,
            edit_on_create: true,
            draw_lines: true,
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::new(),
        }
    }

    #[cfg(feature = "keymap")]
    pub const fn keymap(&self) -> &TreeKeyBindings {
        &self.keymap
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    pub(crate) const fn list_state(&self) -> &TableState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut TableState {
        &mut self.list_state
    }

    pub(crate) fn visible_nodes(&self) -> &[VisibleNode<Id>] {
        &self.visible_nodes
    }

    fn visible_index_of(&self, id: Id) -> Option<usize> {
        self.visible_index.get(&id).copied()
    }

    /// Returns the node's position label as of the last rebuild.
    pub fn label_of(&self, id: Id) -> Option<&PositionLabel> {
        self.labels.get(&id)
    }

    /// Returns the node currently marked as failing validation.
    pub const fn invalid_id(&self) -> Option<Id> {
        self.invalid
    }

    /// Returns the open inline input, if any.
    pub const fn input(&self) -> Option<&ContentInput<Id>> {
        self.input.as_ref()
    }

    pub const fn is_editing(&self) -> bool {
        self.input.is_some()
    }

    /// Whether newly created nodes open the inline input right away.
    pub const fn edit_on_create(&self) -> bool {
        self.edit_on_create
    }

    pub const fn set_edit_on_create(&mut self, enabled: bool) {
        self.edit_on_create = enabled;
    }

    /// Returns whether guide lines are drawn.
    #[inline]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    /// Enables or disables drawing of guide lines.
    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Marks rows and labels as dirty.
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Selects the first visible row.
    pub const fn select_first(&mut self) {
        self.list_state.select_first();
    }

    /// Selects the last visible row.
    pub const fn select_last(&mut self) {
        self.list_state.select_last();
    }

    /// Scrolls the view down by the given number of rows.
    pub fn scroll_down_by(&mut self, amount: u16) {
        self.list_state.scroll_down_by(amount);
    }

    /// Scrolls the view up by the given number of rows.
    pub fn scroll_up_by(&mut self, amount: u16) {
        self.list_state.scroll_up_by(amount);
    }

    /// Moves selection to the previous visible row.
    pub fn select_prev(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(selected.saturating_sub(1)));
    }

    /// Moves selection to the next visible row.
    pub fn select_next(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        let new_selected = (selected + 1).min(self.visible_nodes.len().saturating_sub(1));
        self.list_state.select(Some(new_selected));
    }

    /// Adjusts scroll offset so the selection is within the viewport.
    pub fn ensure_selection_visible(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let offset = self.list_state.offset();
        if selected < offset {
            *self.list_state.offset_mut() = selected;
        } else if selected >= offset + viewport_height {
            *self.list_state.offset_mut() = selected + 1 - viewport_height;
        }
    }

    /// Adjusts selection visibility according to the provided scroll policy.
    pub fn ensure_selection_visible_with_policy(
        &mut self,
        viewport_height: usize,
        policy: TreeScrollPolicy,
    ) {
        match policy {
            TreeScrollPolicy::KeepInView => self.ensure_selection_visible(viewport_height),
            TreeScrollPolicy::CenterOnSelect => {
                self.ensure_selection_visible_centered(viewport_height);
            }
        }
    }

    fn ensure_selection_visible_centered(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let total = self.visible_nodes.len();
        if total <= viewport_height {
            *self.list_state.offset_mut() = 0;
            return;
        }

        // Center selection, then clamp to valid scroll range.
        let half = viewport_height / 2;
        let max_offset = total.saturating_sub(viewport_height);
        *self.list_state.offset_mut() = selected.saturating_sub(half).min(max_offset);
    }

    /// Returns the id of the currently selected node, if any.
    pub fn selected_id(&self) -> Option<Id> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.id))
    }

    /// Returns the parent id of the currently selected node, if any.
    pub fn selected_parent_id(&self) -> Option<Id> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).and_then(|node| node.parent))
    }

    /// Returns the number of visible nodes in the current view.
    pub const fn visible_len(&self) -> usize {
        self.visible_nodes.len()
    }

    /// Returns the visible node ids in display order.
    pub fn visible_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.visible_nodes.iter().map(|node| node.id)
    }

    /// Returns the depth level of the currently selected node.
    pub fn selected_level(&self) -> Option<u16> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.level))
    }

    /// Selects the node if it is visible under the current collapse state.
    pub fn select_by_id<T: TreeModel<Id = Id>>(&mut self, model: &T, id: Id) -> bool {
        self.ensure_visible_nodes(model);
        if let Some(idx) = self.visible_index_of(id) {
            self.list_state.select(Some(idx));
            true
        } else {
            false
        }
    }

    /// Expands the node's ancestors, then selects it.
    pub fn reveal_and_select<T: TreeEdit<Id = Id>>(&mut self, model: &mut T, id: Id) -> bool {
        if !model.contains(id) {
            return false;
        }
        model.reveal(id);
        self.invalidate();
        self.select_by_id(model, id)
    }

    /// Ensures the visible rows and labels are up to date (if marked dirty).
    ///
    /// The selection keeps following the same node; if it got hidden, the
    /// nearest visible ancestor is selected instead.
    pub fn ensure_visible_nodes<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        if !self.dirty {
            return;
        }
        let selected = self.selected_id();
        self.update_visible_nodes(model);
        if let Some(id) = selected {
            self.reselect_nearest(model, id);
        }
    }

    fn reselect_nearest<T: TreeModel<Id = Id>>(&mut self, model: &T, id: Id) {
        let mut cursor = Some(id);
        while let Some(candidate) = cursor {
            if let Some(idx) = self.visible_index_of(candidate) {
                self.list_state.select(Some(idx));
                return;
            }
            cursor = model.parent(candidate);
        }
    }

    /// Marks the node as failing validation, reveals and selects it.
    pub fn mark_invalid<T: TreeEdit<Id = Id>>(&mut self, model: &mut T, id: Id) {
        if self.reveal_and_select(model, id) {
            self.invalid = Some(id);
        }
    }

    /// Flags the node as failing validation without moving the selection.
    pub const fn set_invalid(&mut self, id: Id) {
        self.invalid = Some(id);
    }

    /// Clears the validation marker.
    pub const fn clear_invalid(&mut self) {
        self.invalid = None;
    }

    /// Drops every reference to nodes that no longer exist.
    pub fn forget(&mut self, removed: &[Id]) {
        if self.invalid.is_some_and(|id| removed.contains(&id)) {
            self.invalid = None;
        }
        if self.input.as_ref().is_some_and(|input| removed.contains(&input.id())) {
            self.input = None;
        }
        for id in removed {
            self.labels.remove(id);
        }
        self.dirty = true;
    }

    /// Opens the inline input on `id` with its current content.
    pub fn begin_edit<T: TreeEdit<Id = Id>>(&mut self, model: &T, id: Id) -> bool {
        let Some(content) = model.node_content(id) else {
            return false;
        };
        self.input = Some(ContentInput::new(id, content));
        true
    }

    /// Writes the open input back to the model.
    pub fn commit_edit<T: TreeEdit<Id = Id>>(&mut self, model: &mut T) -> bool {
        let Some(input) = self.input.take() else {
            return false;
        };
        let id = input.id();
        model.replace_content(id, input.into_buffer())
    }

    /// Discards the open input.
    pub fn cancel_edit(&mut self) {
        self.input = None;
    }

    /// Applies a keystroke to the open input.
    pub fn handle_input<T: TreeEdit<Id = Id>>(&mut self, model: &mut T, action: InputAction) -> bool {
        let Some(input) = self.input.as_mut() else {
            return false;
        };
        match input.apply(action) {
            InputOutcome::Editing => {
                // Typing into the offending message clears its error styling.
                if self.invalid == Some(input.id()) {
                    self.invalid = None;
                }
                true
            }
            InputOutcome::Commit => self.commit_edit(model),
            InputOutcome::Cancel => {
                self.cancel_edit();
                true
            }
        }
    }

    /// Handles a navigation action; structural actions are forwarded.
    pub fn handle_action<T: TreeModel<Id = Id>, C>(
        &mut self,
        model: &T,
        action: TreeAction<C>,
    ) -> TreeEvent<C> {
        self.ensure_visible_nodes(model);
        self.handle_action_inner(model, action)
    }

    /// Applies structural actions to a mutable model and updates state.
    pub fn handle_edit_action<T: TreeEdit<Id = Id>, C>(
        &mut self,
        model: &mut T,
        action: TreeAction<C>,
    ) -> bool {
        self.ensure_visible_nodes(model);
        match action {
            TreeAction::AddRoot => {
                let id = model.insert_root();
                self.focus_created(model, id);
                true
            }
            TreeAction::AddChild => {
                let Some(parent_id) = self.selected_id() else {
                    return false;
                };
                model.set_collapsed(parent_id, false);
                let Some(id) = model.insert_child(parent_id) else {
                    return false;
                };
                self.focus_created(model, id);
                true
            }
            TreeAction::RemoveNode => {
                let Some(node_id) = self.selected_id() else {
                    return false;
                };
                self.remove(model, node_id)
            }
            TreeAction::ToggleCollapsed => {
                if let Some(selected_idx) = self.list_state.selected()
                    && let Some(node) = self.visible_nodes.get(selected_idx)
                    && node.has_children
                {
                    let node_id = node.id;
                    model.toggle_collapsed(node_id);
                    self.invalidate();
                    return true;
                }
                false
            }
            TreeAction::SelectChild => {
                let Some(node_id) = self.selected_id() else {
                    return false;
                };
                let Some(&first) = model.children(node_id).first() else {
                    return false;
                };
                model.set_collapsed(node_id, false);
                self.invalidate();
                self.select_by_id(model, first)
            }
            TreeAction::CollapseAll => {
                model.set_all_collapsed(true);
                self.invalidate();
                true
            }
            TreeAction::ExpandAll => {
                model.set_all_collapsed(false);
                self.invalidate();
                true
            }
            TreeAction::EditNode => {
                let Some(node_id) = self.selected_id() else {
                    return false;
                };
                self.begin_edit(model, node_id)
            }
            TreeAction::SelectPrev
            | TreeAction::SelectNext
            | TreeAction::SelectParent
            | TreeAction::SelectFirst
            | TreeAction::SelectLast
            | TreeAction::ToggleGuides
            | TreeAction::Custom(_) => false,
        }
    }

    /// Removes `id` through the model and drops the state that referred to it.
    pub fn remove<T: TreeEdit<Id = Id>>(&mut self, model: &mut T, id: Id) -> bool {
        match model.remove_node(id) {
            Removal::Detached(removed) => {
                let fallback = self.removal_fallback(model, id);
                self.forget(&removed);
                self.ensure_visible_nodes(model);
                if let Some(fallback) = fallback {
                    self.reselect_nearest(model, fallback);
                }
                true
            }
            Removal::Cleared(root) => {
                // The last root stays; reopen its now empty input.
                if let Some(input) = self.input.as_mut().filter(|input| input.id() == root) {
                    input.clear();
                } else if self.edit_on_create {
                    self.commit_edit(model);
                    self.begin_edit(model, root);
                }
                self.select_by_id(model, root);
                true
            }
            Removal::Missing => false,
        }
    }

    // Row that should take the selection after the node at `id` was removed:
    // the previous visible row, or the next one when removing the first row.
    fn removal_fallback<T: TreeModel<Id = Id>>(&self, model: &T, id: Id) -> Option<Id> {
        let idx = self.visible_index_of(id)?;
        let subtree_end = self.visible_nodes[idx + 1..]
            .iter()
            .position(|node| node.level <= self.visible_nodes[idx].level)
            .map_or(self.visible_nodes.len(), |offset| idx + 1 + offset);
        let candidate = if idx > 0 {
            self.visible_nodes.get(idx - 1)
        } else {
            self.visible_nodes.get(subtree_end)
        };
        candidate.map(|node| node.id).filter(|&id| model.contains(id))
    }

    fn focus_created<T: TreeEdit<Id = Id>>(&mut self, model: &mut T, id: Id) {
        self.invalidate();
        self.select_by_id(model, id);
        if self.edit_on_create {
            self.begin_edit(model, id);
        }
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action and handles navigation.
    pub fn handle_key<T: TreeModel<Id = Id>>(&mut self, model: &T, key: KeyEvent) -> TreeEvent<()> {
        self.ensure_visible_nodes(model);
        let Some(action) = self.keymap.resolve(key) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action_inner(model, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles navigation.
    pub fn handle_key_with<T, C, F>(&mut self, model: &T, key: KeyEvent, custom: F) -> TreeEvent<C>
    where
        T: TreeModel<Id = Id>,
        F: Fn(KeyEvent) -> Option<C>,
    {
        self.ensure_visible_nodes(model);
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action_inner(model, action)
    }

    fn handle_action_inner<T: TreeModel<Id = Id>, C>(
        &mut self,
        model: &T,
        action: TreeAction<C>,
    ) -> TreeEvent<C> {
        if matches!(&action, TreeAction::Custom(_) | TreeAction::AddRoot) {
            return TreeEvent::Action(action);
        }

        if self.visible_nodes.is_empty() {
            return TreeEvent::Unhandled;
        }

        match action {
            TreeAction::SelectPrev => {
                self.select_prev();
                TreeEvent::Handled
            }
            TreeAction::SelectNext => {
                self.select_next();
                TreeEvent::Handled
            }
            TreeAction::SelectParent => {
                self.select_parent();
                TreeEvent::Handled
            }
            TreeAction::SelectChild => {
                if self.select_first_child(model) {
                    TreeEvent::Handled
                } else {
                    TreeEvent::Action(action)
                }
            }
            TreeAction::SelectFirst => {
                self.select_first();
                TreeEvent::Handled
            }
            TreeAction::SelectLast => {
                self.select_last();
                TreeEvent::Handled
            }
            TreeAction::ToggleGuides => {
                self.draw_lines = !self.draw_lines;
                TreeEvent::Handled
            }
            TreeAction::ToggleCollapsed
            | TreeAction::CollapseAll
            | TreeAction::ExpandAll
            | TreeAction::AddRoot
            | TreeAction::AddChild
            | TreeAction::RemoveNode
            | TreeAction::EditNode
            | TreeAction::Custom(_) => TreeEvent::Action(action),
        }
    }

    fn update_visible_nodes<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        self.visible_nodes.clear();
        self.visible_index.clear();
        let hint = model.size_hint();
        self.visible_nodes
            .reserve(hint.saturating_sub(self.visible_nodes.capacity()));
        let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
        for root in model.roots().iter().copied() {
            self.build_visible_nodes(model, root, 0, None, &mut is_tail_stack);
        }
        self.labels = label_all(model);
        self.dirty = false;
        self.clamp_selection();
        debug!(rows = self.visible_nodes.len(), "rebuilt message rows");
    }

    fn build_visible_nodes<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        node_id: Id,
        level: u16,
        parent: Option<Id>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let children = model.children(node_id);
        let has_children = !children.is_empty();
        let idx = self.visible_nodes.len();
        self.visible_nodes.push(VisibleNode {
            id: node_id,
            level,
            parent,
            has_children,
            is_tail_stack: is_tail_stack.clone(),
        });
        self.visible_index.insert(node_id, idx);

        if !has_children || model.is_collapsed(node_id) {
            return;
        }

        for (i, child) in children.iter().copied().enumerate() {
            let is_last = i == children.len().saturating_sub(1);
            is_tail_stack.push(is_last);
            self.build_visible_nodes(model, child, level + 1, Some(node_id), is_tail_stack);
            is_tail_stack.pop();
        }
    }

    const fn clamp_selection(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }

        match self.list_state.selected() {
            Some(selected) if selected >= self.visible_nodes.len() => {
                self.list_state
                    .select(Some(self.visible_nodes.len().saturating_sub(1)));
            }
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn select_parent(&mut self) {
        let Some(selected_idx) = self.list_state.selected() else {
            return;
        };

        let Some(parent_id) = self
            .visible_nodes
            .get(selected_idx)
            .and_then(|node| node.parent)
        else {
            return;
        };

        if let Some(parent_idx) = self.visible_index_of(parent_id) {
            self.list_state.select(Some(parent_idx));
        }
    }

    // Selects the first child when it is already visible.
    fn select_first_child<T: TreeModel<Id = Id>>(&mut self, model: &T) -> bool {
        let Some(node_id) = self.selected_id() else {
            return false;
        };
        let Some(&first) = model.children(node_id).first() else {
            return false;
        };
        match self.visible_index_of(first) {
            Some(idx) => {
                self.list_state.select(Some(idx));
                true
            }
            None => false,
        }
    }
}

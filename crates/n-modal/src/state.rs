// SPDX-License-Identifier: MIT

//! The state tree.
//!
//! Every modal state (Normal, Insert, a pending motion, …) is a [`Node`]
//! in an arena owned by [`Vim`]. A node has at most one active child,
//! which receives the keys. Finished states kept alive for `.`, `gv` or a
//! Visual operator hang off the fields of the kind that holds them.
//!
//! | Operation         | Effect                                                   |
//! |-------------------|----------------------------------------------------------|
//! | `push(p, c)`      | `p.suspend(c)`, link `c` as the active child, `c.enter()` |
//! | `pop(c)`          | unlink, `c.leave()`, `parent.resume(c)`                   |
//! | `adopt(p, c)`     | link a popped `c` held in one of `p`'s fields             |
//! | `unparent(c)`     | drop `c` and its subtree, releasing surface marks         |
//!
//! Pushing onto a node that already has an active child, or popping a
//! node whose child is still active, is a usage error: it is logged and
//! the stray child is popped first.

use std::fmt;

use n_keys::KeyEvent;
use n_text::{MarkId, TextSurface};
use slotmap::{SlotMap, new_key_type};
use tracing::{trace, warn};

use crate::command::Command;
use crate::command_bar::CommandBar;
use crate::host::Host;
use crate::insert::{CharPending, Insert, Replace};
use crate::iter::TextIter;
use crate::motion::MotionState;
use crate::normal::Normal;
use crate::vim::Vim;
use crate::visual::Visual;

new_key_type! {
    /// Handle of a node in the state tree.
    pub struct StateId;
}

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// Per-kind data of a node.
#[derive(Debug)]
pub(crate) enum Kind {
    Root,
    Normal(Normal),
    Insert(Insert),
    Replace(Replace),
    Visual(Visual),
    Motion(MotionState),
    Command(Command),
    CommandBar(CommandBar),
    CharPending(CharPending),
    InsertLiteral,
}

/// Which kind a node is, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTag {
    Root,
    Normal,
    Insert,
    Replace,
    Visual,
    Motion,
    Command,
    CommandBar,
    CharPending,
    InsertLiteral,
}

impl Kind {
    pub(crate) const fn tag(&self) -> KindTag {
        match self {
            Self::Root => KindTag::Root,
            Self::Normal(_) => KindTag::Normal,
            Self::Insert(_) => KindTag::Insert,
            Self::Replace(_) => KindTag::Replace,
            Self::Visual(_) => KindTag::Visual,
            Self::Motion(_) => KindTag::Motion,
            Self::Command(_) => KindTag::Command,
            Self::CommandBar(_) => KindTag::CommandBar,
            Self::CharPending(_) => KindTag::CharPending,
            Self::InsertLiteral => KindTag::InsertLiteral,
        }
    }

    /// Surface marks this node created and must release.
    fn owned_marks(&self) -> Vec<MarkId> {
        match self {
            Self::Visual(visual) => visual.marks().to_vec(),
            Self::Command(command) => command.range_marks(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Root => "root",
            Self::Normal => "normal",
            Self::Insert => "insert",
            Self::Replace => "replace",
            Self::Visual => "visual",
            Self::Motion => "motion",
            Self::Command => "command",
            Self::CommandBar => "command-bar",
            Self::CharPending => "char-pending",
            Self::InsertLiteral => "insert-literal",
        })
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One state in the tree.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<StateId>,
    pub(crate) child: Option<StateId>,
    count: usize,
    count_set: bool,
    pub(crate) can_repeat: bool,
    /// Remembered visual column for `j`/`k`; inherited when unset.
    pub(crate) column: Option<usize>,
    /// Register chosen with `"x`; inherited when unset.
    pub(crate) register: Option<char>,
    pub(crate) kind: Kind,
}

impl Node {
    const fn new(kind: Kind) -> Self {
        Self {
            parent: None,
            child: None,
            count: 1,
            count_set: false,
            can_repeat: false,
            column: None,
            register: None,
            kind,
        }
    }

    /// The count, 1 when unset.
    #[must_use]
    pub(crate) const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub(crate) const fn count_set(&self) -> bool {
        self.count_set
    }

    /// `0` unsets the count.
    pub(crate) fn set_count(&mut self, count: usize) {
        self.count = count.max(1);
        self.count_set = count != 0;
    }

    pub(crate) const fn tag(&self) -> KindTag {
        self.kind.tag()
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

macro_rules! kind_accessors {
    ($($get:ident, $get_mut:ident => $variant:ident($ty:ty);)*) => {
        $(
            pub(crate) fn $get(&self, id: StateId) -> Option<&$ty> {
                match self.nodes.get(id).map(|node| &node.kind) {
                    Some(Kind::$variant(data)) => Some(data),
                    _ => None,
                }
            }

            pub(crate) fn $get_mut(&mut self, id: StateId) -> Option<&mut $ty> {
                match self.nodes.get_mut(id).map(|node| &mut node.kind) {
                    Some(Kind::$variant(data)) => Some(data),
                    _ => None,
                }
            }
        )*
    };
}

/// Arena of nodes.
#[derive(Debug, Default)]
pub(crate) struct Tree {
    nodes: SlotMap<StateId, Node>,
}

impl Tree {
    pub(crate) fn insert(&mut self, kind: Kind) -> StateId {
        self.nodes.insert(Node::new(kind))
    }

    pub(crate) fn get(&self, id: StateId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: StateId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn contains(&self, id: StateId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn tag(&self, id: StateId) -> Option<KindTag> {
        self.nodes.get(id).map(Node::tag)
    }

    pub(crate) fn parent(&self, id: StateId) -> Option<StateId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub(crate) fn child(&self, id: StateId) -> Option<StateId> {
        self.nodes.get(id).and_then(|node| node.child)
    }

    pub(crate) fn count(&self, id: StateId) -> usize {
        self.nodes.get(id).map_or(1, Node::count)
    }

    pub(crate) fn count_set(&self, id: StateId) -> bool {
        self.nodes.get(id).is_some_and(Node::count_set)
    }

    pub(crate) fn set_count(&mut self, id: StateId, count: usize) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_count(count);
        }
    }

    pub(crate) fn can_repeat(&self, id: StateId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.can_repeat)
    }

    pub(crate) fn set_can_repeat(&mut self, id: StateId, can_repeat: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.can_repeat = can_repeat;
        }
    }

    /// Innermost active descendant of `id` (or `id` itself).
    pub(crate) fn innermost(&self, mut id: StateId) -> StateId {
        while let Some(child) = self.child(id) {
            id = child;
        }
        id
    }

    /// `id` and its ancestors, innermost first.
    pub(crate) fn ancestors(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), |&id| self.parent(id))
    }

    /// Nearest ancestor (or `id` itself) of kind `tag`.
    pub(crate) fn find_ancestor(&self, id: StateId, tag: KindTag) -> Option<StateId> {
        self.ancestors(id).find(|&id| self.tag(id) == Some(tag))
    }

    /// Remove `id` and everything under it, returning the marks they owned.
    fn remove_subtree(&mut self, id: StateId) -> Vec<MarkId> {
        let mut marks = Vec::new();
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(id) {
                pending.extend(node.child);
                pending.extend(kind_children(&node.kind));
                marks.extend(node.kind.owned_marks());
            }
        }
        marks
    }

    kind_accessors! {
        normal, normal_mut => Normal(Normal);
        insert_state, insert_state_mut => Insert(Insert);
        replace, replace_mut => Replace(Replace);
        visual, visual_mut => Visual(Visual);
        motion, motion_mut => Motion(MotionState);
        command, command_mut => Command(Command);
        command_bar, command_bar_mut => CommandBar(CommandBar);
        char_pending, char_pending_mut => CharPending(CharPending);
    }
}

/// Nodes a kind refers to from its own fields.
fn kind_children(kind: &Kind) -> Vec<StateId> {
    match kind {
        Kind::Normal(normal) => normal.retained_states(),
        Kind::Visual(visual) => visual.command.into_iter().collect(),
        Kind::CommandBar(bar) => bar.command.into_iter().collect(),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Shared surface helpers
// ---------------------------------------------------------------------------

/// Extend both ends to whole lines, the trailing newline included unless
/// at the document end. Returns `(insert, bound)` in the original roles.
pub(crate) fn extend_lines<S: TextSurface + ?Sized>(surface: &S, insert: usize, bound: usize) -> (usize, usize) {
    let widen = |start: usize, end: usize| {
        let mut a = TextIter::new(surface, start);
        let mut b = TextIter::new(surface, end);
        a.set_line_start();
        if !b.ends_line() {
            b.forward_to_line_end();
        }
        if b.ends_line() && !b.is_end() {
            b.forward_char();
        }
        (a.offset(), b.offset())
    };

    if insert <= bound {
        widen(insert, bound)
    } else {
        let (bound, insert) = widen(bound, insert);
        (insert, bound)
    }
}

/// Select whole lines between `insert` and `bound`.
pub(crate) fn select_linewise<S: TextSurface + ?Sized>(surface: &mut S, insert: usize, bound: usize) {
    let (insert, bound) = extend_lines(surface, insert, bound);
    surface.select(insert, bound);
}

/// Back off a newline the cursor sits on, unless the line is empty.
pub(crate) fn keep_on_char<S: TextSurface + ?Sized>(surface: &mut S) {
    let mut it = TextIter::new(&*surface, surface.cursor());
    if it.ends_line() && !it.starts_line() {
        it.backward_char();
        let offset = it.offset();
        surface.place_cursor(offset);
    }
}

// ---------------------------------------------------------------------------
// Tree operations and lifecycle dispatch
// ---------------------------------------------------------------------------

impl<S: TextSurface, H: Host> Vim<S, H> {
    /// Create a detached node.
    pub(crate) fn create(&mut self, kind: Kind) -> StateId {
        self.tree.insert(kind)
    }

    /// Innermost active state.
    pub(crate) fn current(&self) -> StateId {
        self.tree.innermost(self.root)
    }

    /// Make `child` the active child of `parent` and enter it.
    pub(crate) fn push(&mut self, parent: StateId, child: StateId) {
        if let Some(stray) = self.tree.child(parent) {
            warn!(
                parent = %self.tag_of(parent),
                stray = %self.tag_of(stray),
                "pushing onto a state that already has an active child, popping it first"
            );
            self.pop(stray);
        }

        if let Some(node) = self.tree.get_mut(parent) {
            node.child = Some(child);
        }
        if let Some(node) = self.tree.get_mut(child) {
            node.parent = Some(parent);
        }

        trace!(parent = %self.tag_of(parent), child = %self.tag_of(child), "push");
        self.suspend(parent, child);
        self.enter(child);
    }

    /// Leave `id` and hand it to its parent's `resume`.
    pub(crate) fn pop(&mut self, id: StateId) {
        if !self.tree.contains(id) {
            return;
        }

        if let Some(grandchild) = self.tree.child(id) {
            warn!(
                state = %self.tag_of(id),
                child = %self.tag_of(grandchild),
                "popping a state with an active child, popping the child first"
            );
            self.pop(grandchild);
        }

        let parent = self.tree.parent(id);
        if let Some(parent) = parent {
            match self.tree.get_mut(parent) {
                Some(node) if node.child == Some(id) => node.child = None,
                Some(_) => warn!(state = %self.tag_of(id), "popping a state that is not the active child"),
                None => {}
            }
        }

        trace!(state = %self.tag_of(id), "pop");
        self.leave(id);

        match parent {
            Some(parent) if self.tree.contains(parent) => self.resume(parent, id),
            _ => {}
        }
    }

    /// Link `child` under `parent` for a node the parent holds in one of
    /// its own fields (`.` repeat, `gv`, a Visual or command-bar command).
    pub(crate) fn adopt(&mut self, parent: StateId, child: StateId) {
        if let Some(node) = self.tree.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Drop `id` and its subtree.
    pub(crate) fn unparent(&mut self, id: StateId) {
        if let Some(parent) = self.tree.parent(id) {
            if let Some(node) = self.tree.get_mut(parent) {
                if node.child == Some(id) {
                    node.child = None;
                }
            }
            self.forget_retained(parent, id);
        }

        for mark in self.tree.remove_subtree(id) {
            self.surface.delete_mark(mark);
        }
    }

    /// Clear any kind-specific slot of `parent` that refers to `id`.
    fn forget_retained(&mut self, parent: StateId, id: StateId) {
        if let Some(normal) = self.tree.normal_mut(parent) {
            normal.forget(id);
        } else if let Some(visual) = self.tree.visual_mut(parent) {
            if visual.command == Some(id) {
                visual.command = None;
            }
        } else if let Some(bar) = self.tree.command_bar_mut(parent) {
            if bar.command == Some(id) {
                bar.command = None;
            }
        }
    }

    pub(crate) fn tag_of(&self, id: StateId) -> KindTag {
        self.tree.tag(id).unwrap_or(KindTag::Root)
    }

    // -----------------------------------------------------------------------
    // Inherited values
    // -----------------------------------------------------------------------

    /// Visual column for `j`/`k`: the nearest ancestor's, else the cursor's.
    pub(crate) fn visual_column(&self, id: StateId) -> usize {
        self.tree
            .ancestors(id)
            .find_map(|id| self.tree.get(id).and_then(|node| node.column))
            .unwrap_or_else(|| self.surface.visual_column(self.surface.cursor()))
    }

    pub(crate) fn set_visual_column(&mut self, id: StateId, column: Option<usize>) {
        if let Some(node) = self.tree.get_mut(id) {
            node.column = column;
        }
    }

    /// Remember the cursor's column on `id`.
    pub(crate) fn track_visual_column(&mut self, id: StateId) {
        let column = self.surface.visual_column(self.surface.cursor());
        self.set_visual_column(id, Some(column));
    }

    /// Register chosen on `id` or an ancestor.
    pub(crate) fn current_register(&self, id: StateId) -> Option<char> {
        self.tree
            .ancestors(id)
            .find_map(|id| self.tree.get(id).and_then(|node| node.register))
    }

    pub(crate) fn set_current_register(&mut self, id: StateId, register: Option<char>) {
        if let Some(node) = self.tree.get_mut(id) {
            node.register = register;
        }
    }

    pub(crate) fn register_value(&mut self, id: StateId) -> Option<std::rc::Rc<str>> {
        let name = self.current_register(id);
        self.ctx.register_value(&mut self.surface, name)
    }

    pub(crate) fn set_register_value(&mut self, id: StateId, text: &str, write: crate::registers::RegisterWrite) {
        let name = self.current_register(id);
        self.ctx.set_register_value(&mut self.surface, name, text, write);
    }

    /// Push a jump at `offset`.
    pub(crate) fn push_jump(&mut self, offset: usize) {
        self.ctx.jumplist.push(&mut self.surface, offset);
    }

    // -----------------------------------------------------------------------
    // Lifecycle dispatch
    // -----------------------------------------------------------------------

    fn enter(&mut self, id: StateId) {
        match self.tag_of(id) {
            KindTag::Normal => self.normal_enter(),
            KindTag::Insert => self.insert_enter(id),
            KindTag::Replace => self.replace_enter(id),
            KindTag::Visual => self.visual_enter(id),
            KindTag::CommandBar => self.command_bar_enter(id),
            _ => {}
        }
    }

    fn suspend(&mut self, id: StateId, to: StateId) {
        trace!(state = %self.tag_of(id), to = %self.tag_of(to), "suspend");
    }

    fn leave(&mut self, id: StateId) {
        match self.tag_of(id) {
            KindTag::Insert => self.insert_leave(id),
            KindTag::Replace => self.replace_leave(id),
            KindTag::Visual => self.visual_leave(id),
            KindTag::Motion => self.motion_leave(id),
            KindTag::Command => self.command_leave(id),
            KindTag::CommandBar => self.command_bar_leave(id),
            _ => {}
        }
    }

    fn resume(&mut self, id: StateId, from: StateId) {
        match self.tag_of(id) {
            KindTag::Root => self.root_resume(from),
            KindTag::Normal => self.normal_resume(id, from),
            KindTag::Insert => self.insert_resume(id, from),
            KindTag::Replace => self.replace_resume(id, from),
            KindTag::Visual => self.visual_resume(id, from),
            KindTag::Motion => self.motion_resume(id, from),
            KindTag::Command => self.command_resume(id, from),
            _ => self.unparent(from),
        }
    }

    /// Route `key` to `id`'s grammar.
    pub(crate) fn dispatch(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let string = key.to_vim_string();
        trace!(state = %self.tag_of(id), key = %string.escape_debug(), "keypress");

        match self.tag_of(id) {
            KindTag::Normal => self.normal_keypress(id, key, &string),
            KindTag::Insert => self.insert_keypress(id, key),
            KindTag::Replace => self.replace_keypress(id, key),
            KindTag::Visual => self.visual_keypress(id, key, &string),
            KindTag::Motion => self.motion_keypress(id, key, &string),
            KindTag::CommandBar => self.command_bar_keypress(id, key, &string),
            KindTag::CharPending => self.char_pending_keypress(id, key),
            KindTag::InsertLiteral => self.insert_literal_keypress(id, key),
            KindTag::Root | KindTag::Command => false,
        }
    }

    /// Feed a synthetic key to the innermost state under `id`.
    pub(crate) fn synthesize(&mut self, id: StateId, key: KeyEvent) -> bool {
        let target = self.tree.innermost(id);
        self.dispatch(target, &key)
    }

    /// Re-run a finished state (`.`, Visual operators).
    pub(crate) fn repeat_state(&mut self, id: StateId) {
        trace!(state = %self.tag_of(id), "repeat");
        match self.tag_of(id) {
            KindTag::Insert => self.insert_repeat(id),
            KindTag::Replace => self.replace_repeat(id),
            KindTag::Visual => self.visual_repeat(id),
            KindTag::Motion => self.motion_repeat(id),
            KindTag::Command => self.command_repeat(id),
            _ => {}
        }
    }

    /// Append the command preview of `id` and its active descendants.
    pub(crate) fn append_command(&self, id: StateId, out: &mut String) {
        match self.tree.get(id).map(|node| &node.kind) {
            Some(Kind::Normal(normal)) => out.push_str(normal.command_text()),
            Some(Kind::Motion(motion)) => out.push_str(motion.command_text()),
            Some(Kind::Insert(_) | Kind::Replace(_) | Kind::CommandBar(_)) => out.clear(),
            _ => {}
        }
        if let Some(child) = self.tree.child(id) {
            self.append_command(child, out);
        }
    }

    /// Mode label shown in the command bar.
    pub(crate) fn label(&self, id: StateId) -> Option<&'static str> {
        match self.tree.get(id).map(|node| &node.kind) {
            Some(Kind::Insert(_)) => Some("-- INSERT --"),
            Some(Kind::Replace(_)) => Some("-- REPLACE --"),
            Some(Kind::Visual(visual)) => Some(visual.mode().label()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::insert::CharPending;

    #[test]
    fn count_zero_means_unset() {
        let mut node = Node::new(Kind::InsertLiteral);
        node.set_count(3);
        assert_eq!((node.count(), node.count_set()), (3, true));
        node.set_count(0);
        assert_eq!((node.count(), node.count_set()), (1, false));
    }

    #[test]
    fn linewise_extension_keeps_roles() {
        let s = RopeSurface::new("one\ntwo\nthree");
        assert_eq!(extend_lines(&s, 1, 5), (0, 8));
        assert_eq!(extend_lines(&s, 5, 1), (8, 0));
        assert_eq!(extend_lines(&s, 9, 10), (8, 13));
    }

    #[test]
    fn push_onto_occupied_parent_pops_the_stray_child() {
        let mut vim = Vim::new(RopeSurface::new("abc\n"));
        let normal = vim.current();

        let first = vim.create(Kind::CharPending(CharPending::default()));
        let second = vim.create(Kind::CharPending(CharPending::default()));
        vim.push(normal, first);
        vim.push(normal, second);

        assert!(!vim.tree.contains(first));
        assert_eq!(vim.tree.child(normal), Some(second));
        assert_eq!(vim.tree.parent(second), Some(normal));
    }

    #[test]
    fn pop_with_active_child_pops_the_child_first() {
        let mut vim = Vim::new(RopeSurface::new("abc\n"));
        let normal = vim.current();

        let outer = vim.create(Kind::CharPending(CharPending::default()));
        let inner = vim.create(Kind::CharPending(CharPending::default()));
        vim.push(normal, outer);
        vim.push(outer, inner);
        vim.pop(outer);

        assert!(!vim.tree.contains(inner));
        assert!(!vim.tree.contains(outer));
        assert_eq!(vim.current(), normal);
    }

    #[test]
    fn unparent_drops_the_subtree() {
        let mut vim = Vim::new(RopeSurface::new("abc\n"));
        let before = vim.tree.len();
        let normal = vim.current();

        let outer = vim.create(Kind::CharPending(CharPending::default()));
        let inner = vim.create(Kind::CharPending(CharPending::default()));
        vim.push(normal, outer);
        vim.push(outer, inner);
        vim.unparent(outer);

        assert_eq!(vim.tree.len(), before);
        assert_eq!(vim.tree.child(normal), None);
    }

    #[test]
    fn register_and_column_are_inherited() {
        let mut vim = Vim::new(RopeSurface::new("\tabc\n"));
        let normal = vim.current();
        let child = vim.create(Kind::CharPending(CharPending::default()));
        vim.push(normal, child);

        vim.set_current_register(normal, Some('a'));
        assert_eq!(vim.current_register(child), Some('a'));

        assert_eq!(vim.visual_column(child), 0);
        vim.set_visual_column(normal, Some(8));
        assert_eq!(vim.visual_column(child), 8);
    }
}

//! Gesture interpretation ("Smart Tool").
//!
//! `SmartTool` turns pointer events and tool commands into board changes.
//! It keeps the current selection and drag bookkeeping. Positions come in
//! with every event and go out as one of:
//! - `Commit`: a final position for the history
//! - `Preview`: shown while a drag is in progress, never recorded
//! - `Rollback`: show the last committed position again
//! - `NoOp`: nothing to redraw
//!
//! A tile holding a union can be selected as a whole or one member at a
//! time; `HighlightKind` carries that choice between events. The rule engine
//! never sees it: moving one member of a union on its own is an editor
//! operation with no game action behind it.

use crate::actions::Action;
use crate::engine::{self, IllegalAction};
use crate::piece::{Color, Piece, PieceKind};
use crate::position::{Position, RequiredAction};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::ops::Sub;
use tracing::debug;

/// A point in screen coordinates, also used as an offset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Sub for ScreenPoint {
    type Output = ScreenPoint;

    fn sub(self, other: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A raw pointer event. `tile` is `None` outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub tile: Option<Tile>,
    pub screen: ScreenPoint,
}

/// Everything the tool reacts to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ToolEvent {
    Pointer(PointerEvent),
    /// The pointer left the board or the gesture was interrupted
    Cancel,
    /// Remove the selected piece(s)
    DeleteSelected,
    /// Put a new piece on the selected tile
    AddPiece { color: Color, kind: PieceKind },
    /// Promote the pending pawn
    Promote(PieceKind),
}

/// Which pieces on the highlighted tile gestures act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightKind {
    Both,
    OnlyWhite,
    OnlyBlack,
    /// Left behind by a tool command rather than picked by the user
    Lingering,
}

impl HighlightKind {
    /// The single color selected, if the selection is partial
    pub fn only(self) -> Option<Color> {
        match self {
            HighlightKind::OnlyWhite => Some(Color::White),
            HighlightKind::OnlyBlack => Some(Color::Black),
            HighlightKind::Both | HighlightKind::Lingering => None,
        }
    }

    pub fn matches(self, piece: &Piece) -> bool {
        self.only().map_or(true, |color| piece.color == color)
    }
}

/// A final position, with the game actions that led to it.
///
/// `actions` is `None` for edits the rule engine can't express, like moving
/// one member of a union or adding a piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub position: Position,
    pub actions: Option<Vec<Action>>,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    NoOp,
    Commit(Commit),
    Preview(Position),
    Rollback,
}

/// Selection and drag state between events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartTool {
    highlight: Option<(Tile, HighlightKind)>,
    drag_start: Option<Tile>,
    drag_anchor: Option<ScreenPoint>,
    drag_delta: Option<ScreenPoint>,
    dragging: Vec<Piece>,
    hover: Option<Tile>,
}

impl SmartTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlight(&self) -> Option<(Tile, HighlightKind)> {
        self.highlight
    }

    pub fn drag_start(&self) -> Option<Tile> {
        self.drag_start
    }

    /// Offset of the pointer since the drag started
    pub fn drag_delta(&self) -> Option<ScreenPoint> {
        self.drag_delta
    }

    /// Pieces following the pointer
    pub fn dragging(&self) -> &[Piece] {
        &self.dragging
    }

    pub fn hover(&self) -> Option<Tile> {
        self.hover
    }

    /// Forget selection and drag, e.g. after the board was replaced
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Tile to mark as a possible destination.
    ///
    /// Only shown when something is selected, the pointer hovers another
    /// tile and the selected tile is not empty.
    pub fn placement_hint(&self, position: &Position) -> Option<Tile> {
        let (selected, _) = self.highlight?;
        let hover = self.hover?;
        if hover == selected || !position.is_occupied(selected) {
            return None;
        }
        Some(hover)
    }

    pub fn handle(&mut self, event: ToolEvent, position: &Position) -> ToolOutput {
        match event {
            ToolEvent::Pointer(pointer) => match pointer.kind {
                PointerKind::Down => self.pointer_down(pointer, position),
                PointerKind::Move => self.pointer_move(pointer),
                PointerKind::Up => self.pointer_up(pointer, position),
            },
            ToolEvent::Cancel => {
                self.clear_drag();
                ToolOutput::Rollback
            }
            ToolEvent::DeleteSelected => self.delete_selected(position),
            ToolEvent::AddPiece { color, kind } => self.add_piece(color, kind, position),
            ToolEvent::Promote(kind) => match engine::apply(Action::Promote(kind), position) {
                Ok(next) => ToolOutput::Commit(Commit {
                    position: next,
                    actions: Some(vec![Action::Promote(kind)]),
                }),
                Err(err) => {
                    debug!(%err, "Promotion rejected");
                    ToolOutput::Rollback
                }
            },
        }
    }

    // ==================== Pointer ====================

    fn pointer_down(&mut self, pointer: PointerEvent, position: &Position) -> ToolOutput {
        self.clear_drag();
        let Some(tile) = pointer.tile else {
            return ToolOutput::NoOp;
        };
        self.drag_start = Some(tile);
        self.drag_anchor = Some(pointer.screen);
        self.drag_delta = Some(ScreenPoint::default());

        // Mid-chain the piece in hand can be dragged from where it was lifted
        if let Some(piece) = position.lifted().first() {
            if piece.tile == tile {
                self.dragging = position.lifted().to_vec();
                return ToolOutput::Preview(position.clone());
            }
            return ToolOutput::NoOp;
        }

        // A press away from the selection starts a drag of its own; released
        // in place it still counts as the second click of a click-to-move
        let kind = match self.highlight {
            Some((selected, kind)) if selected == tile => kind,
            _ => HighlightKind::Both,
        };
        match lift_for(position, tile, kind) {
            Ok((lifted, _)) => {
                self.dragging = lifted.lifted().to_vec();
                ToolOutput::Preview(lifted)
            }
            Err(_) => ToolOutput::NoOp,
        }
    }

    fn pointer_move(&mut self, pointer: PointerEvent) -> ToolOutput {
        match self.drag_anchor {
            Some(anchor) => self.drag_delta = Some(pointer.screen - anchor),
            None => self.hover = pointer.tile,
        }
        ToolOutput::NoOp
    }

    fn pointer_up(&mut self, pointer: PointerEvent, position: &Position) -> ToolOutput {
        let start = self.drag_start;
        let dragged = !self.dragging.is_empty();
        self.clear_drag();

        match (start, pointer.tile) {
            (None, _) => ToolOutput::NoOp,
            // Released outside the board
            (Some(_), None) => ToolOutput::Rollback,
            (Some(from), Some(to)) if from == to => self.click(to, position),
            (Some(from), Some(to)) if dragged => {
                let kind = match self.highlight {
                    Some((selected, kind)) if selected == from => kind,
                    _ => HighlightKind::Both,
                };
                self.resolve_move(from, kind, to, position)
            }
            _ => ToolOutput::Rollback,
        }
    }

    fn click(&mut self, tile: Tile, position: &Position) -> ToolOutput {
        if let Some(piece) = position.lifted().first() {
            if piece.tile == tile {
                return ToolOutput::Rollback;
            }
            return self.place_hand(position.clone(), Some(Vec::new()), tile);
        }

        match self.highlight {
            None => {
                self.highlight = Some((tile, HighlightKind::Both));
                ToolOutput::Rollback
            }
            Some((selected, kind)) if selected == tile => {
                self.highlight = next_selection(kind, tile, position);
                ToolOutput::Rollback
            }
            Some((selected, kind)) => self.resolve_move(selected, kind, tile, position),
        }
    }

    fn resolve_move(
        &mut self,
        from: Tile,
        kind: HighlightKind,
        to: Tile,
        position: &Position,
    ) -> ToolOutput {
        if !position.is_settled() {
            return self.place_hand(position.clone(), Some(Vec::new()), to);
        }
        match lift_for(position, from, kind) {
            Ok((lifted, actions)) => self.place_hand(lifted, actions, to),
            Err(err) => {
                debug!(%from, %err, "Lift rejected");
                self.highlight = None;
                ToolOutput::Rollback
            }
        }
    }

    /// Place whatever is in hand on `to` and classify the result
    fn place_hand(
        &mut self,
        hand: Position,
        actions: Option<Vec<Action>>,
        to: Tile,
    ) -> ToolOutput {
        match engine::apply(Action::Place(to), &hand) {
            Ok(next) => {
                // A take-over keeps the move going from the contested tile
                self.highlight = next
                    .lifted()
                    .first()
                    .map(|piece| (piece.tile, HighlightKind::Both));
                let actions = actions.map(|mut actions| {
                    actions.push(Action::Place(to));
                    actions
                });
                ToolOutput::Commit(Commit {
                    position: next,
                    actions,
                })
            }
            Err(err) => {
                debug!(%to, %err, "Place rejected");
                self.highlight = None;
                ToolOutput::Rollback
            }
        }
    }

    fn clear_drag(&mut self) {
        self.drag_start = None;
        self.drag_anchor = None;
        self.drag_delta = None;
        self.dragging.clear();
    }

    // ==================== Tool commands ====================

    fn delete_selected(&mut self, position: &Position) -> ToolOutput {
        let Some((tile, kind)) = self.highlight else {
            return ToolOutput::Rollback;
        };
        let mut next = position.clone();
        next.remove_matching(tile, |piece| kind.matches(piece));
        ToolOutput::Commit(Commit {
            position: next,
            actions: None,
        })
    }

    fn add_piece(&mut self, color: Color, kind: PieceKind, position: &Position) -> ToolOutput {
        let Some((tile, _)) = self.highlight else {
            return ToolOutput::NoOp;
        };
        let mut next = position.clone();
        if let Err(err) = next.put_piece(color, kind, tile) {
            debug!(%err, "Cannot add piece");
            return ToolOutput::NoOp;
        }
        self.highlight = Some((tile, HighlightKind::Lingering));
        ToolOutput::Commit(Commit {
            position: next,
            actions: None,
        })
    }
}

/// Selection after clicking the selected tile again
fn next_selection(
    kind: HighlightKind,
    tile: Tile,
    position: &Position,
) -> Option<(Tile, HighlightKind)> {
    let union = position.is_union(tile);
    match kind {
        HighlightKind::Lingering => Some((tile, HighlightKind::Both)),
        HighlightKind::Both if union => Some((tile, HighlightKind::OnlyWhite)),
        HighlightKind::OnlyWhite if union => Some((tile, HighlightKind::OnlyBlack)),
        _ => None,
    }
}

/// Lift the selected piece(s), along with the game actions that did it
fn lift_for(
    position: &Position,
    tile: Tile,
    kind: HighlightKind,
) -> Result<(Position, Option<Vec<Action>>), IllegalAction> {
    match kind.only() {
        None => engine::apply(Action::Lift(tile), position)
            .map(|lifted| (lifted, Some(vec![Action::Lift(tile)]))),
        Some(color) => lift_one(position, tile, color).map(|lifted| (lifted, None)),
    }
}

/// Lift only the piece of `color` on `tile`, even out of a union. The
/// result expects a placement for that piece.
fn lift_one(position: &Position, tile: Tile, color: Color) -> Result<Position, IllegalAction> {
    if position.victory().is_over() {
        return Err(IllegalAction::GameOver);
    }
    if !tile.in_bounds() {
        return Err(IllegalAction::OffBoard(tile));
    }
    if !position.is_settled() {
        return Err(IllegalAction::HandFull);
    }
    if position.required() != RequiredAction::Lift {
        return Err(IllegalAction::LiftWhenNotAllowed(position.required()));
    }

    let mut next = position.clone();
    let piece = match next.take_piece(tile, color) {
        Some(piece) => piece,
        None if next.is_occupied(tile) => return Err(IllegalAction::NotYourPiece(tile)),
        None => return Err(IllegalAction::EmptyTile(tile)),
    };
    if piece.kind == PieceKind::Rook {
        next.castling.revoke_corner(color, tile);
    }
    next.turn = color;
    next.required = RequiredAction::Place;
    next.lifted.push(piece);
    Ok(next)
}

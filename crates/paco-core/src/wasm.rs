//! WebAssembly bindings for the Paco board.
//!
//! This module exposes a `PlayClient` to JavaScript through wasm-bindgen.
//! Positions, actions and events cross the boundary as JSON.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::Action;
#[cfg(feature = "wasm")]
use crate::client::PlayClient;
#[cfg(feature = "wasm")]
use crate::engine;
#[cfg(feature = "wasm")]
use crate::gesture::{PointerEvent, PointerKind, ScreenPoint, ToolEvent};
#[cfg(feature = "wasm")]
use crate::position::Position;
#[cfg(feature = "wasm")]
use crate::tile::Tile;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed board wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmBoard {
    client: PlayClient,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmBoard {
    /// Create a board. `synchronized` boards send their moves and accept
    /// remote histories; others are free editors.
    #[wasm_bindgen(constructor)]
    pub fn new(position_json: Option<String>, synchronized: bool) -> Result<WasmBoard, JsValue> {
        let initial = match position_json {
            Some(json) => {
                let position: Position = serde_json::from_str(&json)
                    .map_err(|e| JsValue::from_str(&format!("Invalid position JSON: {}", e)))?;
                position
                    .validate()
                    .map_err(|e| JsValue::from_str(&format!("Invalid position: {}", e)))?;
                position
            }
            None => Position::initial(),
        };

        let client = if synchronized {
            PlayClient::synchronized(initial)
        } else {
            PlayClient::local(initial)
        };
        Ok(WasmBoard { client })
    }

    /// Feed a pointer event. `kind` is "down", "move" or "up"; `x`/`y` are
    /// the tile under the pointer, negative when off the board. Returns the
    /// indexed actions to send as JSON.
    #[wasm_bindgen(js_name = pointer)]
    pub fn pointer(
        &mut self,
        kind: &str,
        x: i8,
        y: i8,
        screen_x: f32,
        screen_y: f32,
    ) -> Result<String, JsValue> {
        let kind = match kind {
            "down" => PointerKind::Down,
            "move" => PointerKind::Move,
            "up" => PointerKind::Up,
            other => return Err(JsValue::from_str(&format!("Unknown pointer kind: {}", other))),
        };
        let event = ToolEvent::Pointer(PointerEvent {
            kind,
            tile: Tile::checked(x, y),
            screen: ScreenPoint::new(screen_x, screen_y),
        });
        let sent = self.client.handle(event);
        Ok(serde_json::to_string(&sent).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Feed a tool command as JSON, e.g. `"DeleteSelected"` or
    /// `{"Promote":"Queen"}`
    #[wasm_bindgen(js_name = command)]
    pub fn command(&mut self, event_json: &str) -> Result<String, JsValue> {
        let event: ToolEvent = serde_json::from_str(event_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid command JSON: {}", e)))?;
        let sent = self.client.handle(event);
        Ok(serde_json::to_string(&sent).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Position to draw, as JSON
    #[wasm_bindgen(js_name = getDisplayed)]
    pub fn get_displayed(&self) -> String {
        serde_json::to_string(self.client.displayed()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Selection, drag and hint state for rendering, as JSON
    #[wasm_bindgen(js_name = getToolState)]
    pub fn get_tool_state(&self) -> String {
        let tool = self.client.tool();
        let state = serde_json::json!({
            "highlight": tool.highlight(),
            "dragStart": tool.drag_start(),
            "dragDelta": tool.drag_delta(),
            "dragging": tool.dragging(),
            "hint": tool.placement_hint(self.client.displayed()),
        });
        state.to_string()
    }

    /// Legal next actions on the displayed position as JSON array
    #[wasm_bindgen(js_name = getLegalActions)]
    pub fn get_legal_actions(&self) -> String {
        let actions = engine::legal_actions(self.client.head());
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }

    #[wasm_bindgen(js_name = undo)]
    pub fn undo(&mut self) -> bool {
        self.client.undo()
    }

    #[wasm_bindgen(js_name = redo)]
    pub fn redo(&mut self) -> bool {
        self.client.redo()
    }

    /// Take in the full remote action history (JSON array), returns the
    /// outcome as JSON
    #[wasm_bindgen(js_name = receiveHistory)]
    pub fn receive_history(&mut self, history_json: &str) -> Result<String, JsValue> {
        let history: Vec<Action> = serde_json::from_str(history_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid history JSON: {}", e)))?;
        let outcome = self
            .client
            .receive(&history)
            .map_err(|e| JsValue::from_str(&format!("Sync failed: {}", e)))?;
        Ok(serde_json::to_string(&outcome).unwrap_or_else(|_| "null".to_string()))
    }

    /// Replace the game with a fresh full state
    #[wasm_bindgen(js_name = resetGame)]
    pub fn reset_game(&mut self, position_json: &str, history_json: &str) -> Result<(), JsValue> {
        let initial: Position = serde_json::from_str(position_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid position JSON: {}", e)))?;
        initial
            .validate()
            .map_err(|e| JsValue::from_str(&format!("Invalid position: {}", e)))?;
        let history: Vec<Action> = serde_json::from_str(history_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid history JSON: {}", e)))?;
        self.client
            .reset(initial, &history)
            .map_err(|e| JsValue::from_str(&format!("Reset failed: {}", e)))
    }

    /// Whether the game has ended
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.client.head().victory().is_over()
    }
}

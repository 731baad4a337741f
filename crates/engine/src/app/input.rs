use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKey {
    ToggleLayer1,
    ToggleLayer2,
    ToggleLayer3,
    ToggleSubregions,
    CycleSlugcat,
    Save,
    Reload,
    ClosePanel,
    SelectPrevious,
    SelectNext,
    AssignLayer1,
    AssignLayer2,
    AssignLayer3,
    ToggleLineage,
    Increment,
    Decrement,
    AddEntry,
    DeleteEntry,
    CycleSubregion,
    CycleCreature,
}

const KEY_COUNT: usize = 20;

impl EditorKey {
    pub const ALL: [EditorKey; KEY_COUNT] = [
        EditorKey::ToggleLayer1,
        EditorKey::ToggleLayer2,
        EditorKey::ToggleLayer3,
        EditorKey::ToggleSubregions,
        EditorKey::CycleSlugcat,
        EditorKey::Save,
        EditorKey::Reload,
        EditorKey::ClosePanel,
        EditorKey::SelectPrevious,
        EditorKey::SelectNext,
        EditorKey::AssignLayer1,
        EditorKey::AssignLayer2,
        EditorKey::AssignLayer3,
        EditorKey::ToggleLineage,
        EditorKey::Increment,
        EditorKey::Decrement,
        EditorKey::AddEntry,
        EditorKey::DeleteEntry,
        EditorKey::CycleSubregion,
        EditorKey::CycleCreature,
    ];

    const fn index(self) -> usize {
        match self {
            EditorKey::ToggleLayer1 => 0,
            EditorKey::ToggleLayer2 => 1,
            EditorKey::ToggleLayer3 => 2,
            EditorKey::ToggleSubregions => 3,
            EditorKey::CycleSlugcat => 4,
            EditorKey::Save => 5,
            EditorKey::Reload => 6,
            EditorKey::ClosePanel => 7,
            EditorKey::SelectPrevious => 8,
            EditorKey::SelectNext => 9,
            EditorKey::AssignLayer1 => 10,
            EditorKey::AssignLayer2 => 11,
            EditorKey::AssignLayer3 => 12,
            EditorKey::ToggleLineage => 13,
            EditorKey::Increment => 14,
            EditorKey::Decrement => 15,
            EditorKey::AddEntry => 16,
            EditorKey::DeleteEntry => 17,
            EditorKey::CycleSubregion => 18,
            EditorKey::CycleCreature => 19,
        }
    }

    pub fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        let key = match code {
            KeyCode::F1 => EditorKey::ToggleLayer1,
            KeyCode::F2 => EditorKey::ToggleLayer2,
            KeyCode::F3 => EditorKey::ToggleLayer3,
            KeyCode::KeyV => EditorKey::ToggleSubregions,
            KeyCode::KeyC => EditorKey::CycleSlugcat,
            KeyCode::F5 => EditorKey::Save,
            KeyCode::F9 => EditorKey::Reload,
            KeyCode::Escape => EditorKey::ClosePanel,
            KeyCode::ArrowUp => EditorKey::SelectPrevious,
            KeyCode::ArrowDown => EditorKey::SelectNext,
            KeyCode::Digit1 | KeyCode::Numpad1 => EditorKey::AssignLayer1,
            KeyCode::Digit2 | KeyCode::Numpad2 => EditorKey::AssignLayer2,
            KeyCode::Digit3 | KeyCode::Numpad3 => EditorKey::AssignLayer3,
            KeyCode::KeyL => EditorKey::ToggleLineage,
            KeyCode::Equal | KeyCode::NumpadAdd => EditorKey::Increment,
            KeyCode::Minus | KeyCode::NumpadSubtract => EditorKey::Decrement,
            KeyCode::KeyN => EditorKey::AddEntry,
            KeyCode::Delete | KeyCode::Backspace => EditorKey::DeleteEntry,
            KeyCode::KeyS => EditorKey::CycleSubregion,
            KeyCode::KeyT => EditorKey::CycleCreature,
            _ => return None,
        };
        Some(key)
    }
}

/// Keys whose press edge was seen since the last snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEdges {
    pressed: [bool; KEY_COUNT],
}

impl KeyEdges {
    pub fn set(&mut self, key: EditorKey, pressed: bool) {
        self.pressed[key.index()] = pressed;
    }

    pub fn is_pressed(&self, key: EditorKey) -> bool {
        self.pressed[key.index()]
    }

    pub fn any(&self) -> bool {
        self.pressed.iter().any(|pressed| *pressed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KeyStates {
    down: [bool; KEY_COUNT],
    edges: KeyEdges,
}

impl KeyStates {
    pub(crate) fn handle(&mut self, key: EditorKey, state: ElementState) {
        let slot = key.index();
        match state {
            ElementState::Pressed => {
                if !self.down[slot] {
                    self.edges.set(key, true);
                }
                self.down[slot] = true;
            }
            ElementState::Released => self.down[slot] = false,
        }
    }

    pub(crate) fn take_edges(&mut self) -> KeyEdges {
        std::mem::take(&mut self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_index_matches_position_in_all() {
        for (position, key) in EditorKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), position);
        }
    }

    #[test]
    fn held_key_reports_a_single_edge() {
        let mut states = KeyStates::default();
        states.handle(EditorKey::Save, ElementState::Pressed);
        states.handle(EditorKey::Save, ElementState::Pressed);
        assert!(states.take_edges().is_pressed(EditorKey::Save));
        states.handle(EditorKey::Save, ElementState::Pressed);
        assert!(!states.take_edges().is_pressed(EditorKey::Save));
        states.handle(EditorKey::Save, ElementState::Released);
        states.handle(EditorKey::Save, ElementState::Pressed);
        assert!(states.take_edges().is_pressed(EditorKey::Save));
    }

    #[test]
    fn function_keys_map_to_layer_toggles() {
        assert_eq!(
            EditorKey::from_physical_key(PhysicalKey::Code(KeyCode::F2)),
            Some(EditorKey::ToggleLayer2)
        );
        assert_eq!(
            EditorKey::from_physical_key(PhysicalKey::Code(KeyCode::NumpadSubtract)),
            Some(EditorKey::Decrement)
        );
        assert_eq!(
            EditorKey::from_physical_key(PhysicalKey::Code(KeyCode::KeyQ)),
            None
        );
    }
}

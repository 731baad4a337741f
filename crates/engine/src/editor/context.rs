use crate::world::{Layer, LayerSet, WorldData};

/// State that lives as long as one loaded world: the world itself plus the
/// view toggles every widget reads.
#[derive(Debug)]
pub struct EditorContext {
    pub world: WorldData,
    pub layers: LayerSet,
    pub preview_slugcat: String,
    pub show_subregions: bool,
}

impl EditorContext {
    pub fn new(world: WorldData, default_slugcat: &str) -> Self {
        let preview_slugcat = world
            .roster()
            .iter()
            .find(|name| name.eq_ignore_ascii_case(default_slugcat))
            .or_else(|| world.roster().first())
            .cloned()
            .unwrap_or_else(|| default_slugcat.to_string());
        Self {
            world,
            layers: LayerSet::default(),
            preview_slugcat,
            show_subregions: false,
        }
    }

    /// Moves the preview to the next roster entry, wrapping.
    pub fn cycle_slugcat(&mut self) -> &str {
        let roster = self.world.roster();
        if !roster.is_empty() {
            let next = roster
                .iter()
                .position(|name| name.eq_ignore_ascii_case(&self.preview_slugcat))
                .map_or(0, |index| (index + 1) % roster.len());
            self.preview_slugcat = roster[next].clone();
        }
        &self.preview_slugcat
    }

    pub fn toggle_layer(&mut self, layer: Layer) -> bool {
        self.layers.toggle(layer)
    }

    /// `1-3`, `1-2`, `-` style summary of interactive layers.
    pub fn interactive_layers_label(&self) -> String {
        let labels: Vec<String> = Layer::ALL
            .iter()
            .filter(|layer| self.layers.is_interactive(**layer))
            .map(|layer| (layer.index() + 1).to_string())
            .collect();
        if labels.is_empty() {
            "-".to_string()
        } else {
            labels.join(",")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::test_support::{seeded_options, write_world};

    #[test]
    fn preview_slugcat_cycles_through_roster() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let world = WorldData::load(&write_world(&temp), &seeded_options()).expect("load");
        let mut context = EditorContext::new(world, "red");
        assert_eq!(context.preview_slugcat, "Red");
        assert_eq!(context.cycle_slugcat(), "Gourmand");

        context.preview_slugcat = "Inv".to_string();
        assert_eq!(context.cycle_slugcat(), "White");
    }

    #[test]
    fn layer_label_lists_interactive_layers() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let world = WorldData::load(&write_world(&temp), &seeded_options()).expect("load");
        let mut context = EditorContext::new(world, "White");
        assert_eq!(context.interactive_layers_label(), "1,2,3");
        context.toggle_layer(Layer::Layer2);
        assert_eq!(context.interactive_layers_label(), "1,3");
    }
}

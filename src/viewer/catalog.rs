use serde::Serialize;

use crate::config::AnimationEntry;

/// UI-facing record of one selectable animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationDescriptor {
    pub id: String,
    pub display_name: String,
    /// The asset was fetched successfully at least once.
    pub loaded: bool,
    /// This is the animation being shown (or optimistically, being loaded).
    pub active: bool,
}

/// The list of descriptors; keeps at most one of them active.
#[derive(Debug, Clone, Default)]
pub struct AnimationCatalog {
    descriptors: Vec<AnimationDescriptor>,
}

impl AnimationCatalog {
    #[must_use]
    pub fn from_entries(entries: &[AnimationEntry]) -> Self {
        Self {
            descriptors: entries
                .iter()
                .map(|e| AnimationDescriptor {
                    id: e.id.clone(),
                    display_name: e.display_name.clone(),
                    loaded: false,
                    active: false,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn descriptors(&self) -> &[AnimationDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AnimationDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn active(&self) -> Option<&AnimationDescriptor> {
        self.descriptors.iter().find(|d| d.active)
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.get(id).is_some_and(|d| d.active)
    }

    /// Marks `id` active and every other descriptor inactive.
    pub fn set_active(&mut self, id: &str) {
        for d in &mut self.descriptors {
            d.active = d.id == id;
        }
    }

    /// Clears the active flag on `id` only.
    pub fn clear_active(&mut self, id: &str) {
        if let Some(d) = self.descriptors.iter_mut().find(|d| d.id == id) {
            d.active = false;
        }
    }

    pub fn clear_all_active(&mut self) {
        for d in &mut self.descriptors {
            d.active = false;
        }
    }

    pub fn mark_loaded(&mut self, id: &str) {
        if let Some(d) = self.descriptors.iter_mut().find(|d| d.id == id) {
            d.loaded = true;
        }
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.active).count()
    }
}

pub mod catalog;

pub use catalog::{SoundId, ThemeId};

use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Selection {
    Activated,
    Deactivated,
    /// Premium item; nothing changed and the caller should show the upsell.
    Restricted,
}

/// Active ambient sounds and the selected theme. Premium items never become
/// active.
#[derive(Debug, Clone, Default)]
pub struct AmbienceSelector {
    active: BTreeSet<SoundId>,
    theme: ThemeId,
}

impl AmbienceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_sound(&mut self, sound: SoundId) -> Selection {
        if sound.is_premium() {
            return Selection::Restricted;
        }
        if self.active.remove(&sound) {
            Selection::Deactivated
        } else {
            self.active.insert(sound);
            Selection::Activated
        }
    }

    pub fn select_theme(&mut self, theme: ThemeId) -> Selection {
        if theme.is_premium() {
            return Selection::Restricted;
        }
        self.theme = theme;
        Selection::Activated
    }

    pub fn active_sounds(&self) -> Vec<SoundId> {
        self.active.iter().copied().collect()
    }

    pub fn is_active(&self, sound: SoundId) -> bool {
        self.active.contains(&sound)
    }

    pub fn theme(&self) -> ThemeId {
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_flips_membership() {
        let mut selector = AmbienceSelector::new();
        assert_eq!(selector.toggle_sound(SoundId::Rain), Selection::Activated);
        assert_eq!(selector.toggle_sound(SoundId::Birds), Selection::Activated);
        assert_eq!(selector.active_sounds(), vec![SoundId::Rain, SoundId::Birds]);

        assert_eq!(selector.toggle_sound(SoundId::Rain), Selection::Deactivated);
        assert!(!selector.is_active(SoundId::Rain));
        assert!(selector.is_active(SoundId::Birds));
    }

    #[test]
    fn premium_items_never_activate() {
        let mut selector = AmbienceSelector::new();
        selector.select_theme(ThemeId::Night);

        assert_eq!(selector.toggle_sound(SoundId::Custom), Selection::Restricted);
        assert_eq!(selector.select_theme(ThemeId::Custom), Selection::Restricted);

        assert!(selector.active_sounds().is_empty());
        assert_eq!(selector.theme(), ThemeId::Night);
    }

    #[test]
    fn catalog_ids_parse() {
        assert_eq!("whitenoise".parse::<SoundId>().unwrap(), SoundId::WhiteNoise);
        assert_eq!("default".parse::<ThemeId>().unwrap(), ThemeId::Ocean);
        assert!("jazz".parse::<SoundId>().is_err());
        assert!(ThemeId::Custom.is_premium());
        assert!(!ThemeId::Minimal.is_premium());
    }
}

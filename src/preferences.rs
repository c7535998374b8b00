//! User interface preferences

use std::sync::Arc;
use tracing::info;

use crate::models::Theme;
use crate::storage::{get_json, set_json, KeyValueStore};
use crate::Result;

const THEME_KEY: &str = "theme";

pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored theme, dark when nothing has been saved yet.
    pub async fn theme(&self) -> Result<Theme> {
        Ok(get_json(self.store.as_ref(), THEME_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn toggle_theme(&self) -> Result<Theme> {
        let theme = self.theme().await?.toggled();
        set_json(self.store.as_ref(), THEME_KEY, &theme).await?;
        info!(?theme, "Theme changed");
        Ok(theme)
    }
}

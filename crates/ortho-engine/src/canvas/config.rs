use crate::paint::Color;

/// Environment variable that turns on `zoom_affects_rendering`.
pub const ZOOM_RENDER_ENV: &str = "ORTHO_ZOOM_RENDER";

/// Canvas configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Width of the logical region kept visible, in logical units.
    pub logical_extent: f32,
    /// Width / height of the logical region.
    pub target_aspect: f32,
    /// Unit cells per grid side.
    pub grid_cells: u32,
    pub clear_color: Color,
    pub grid_color: Color,
    pub shape_color: Color,
    /// Logical translation of each triangle instance.
    pub shape_offsets: Vec<[f32; 2]>,
    pub initial_zoom: f32,
    /// Fold the zoom scale into the rendered view matrix. Off by default:
    /// zoom is tracked and reported without changing the picture.
    pub zoom_affects_rendering: bool,
    /// Preferred window size in device pixels.
    pub size_hint: (u32, u32),
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            logical_extent: 10.0,
            target_aspect: 1.0,
            grid_cells: 10,
            clear_color: Color::BLACK,
            grid_color: Color::WHITE,
            shape_color: Color::GREEN,
            shape_offsets: default_shape_offsets(),
            initial_zoom: 1.0,
            zoom_affects_rendering: false,
            size_hint: (800, 800),
        }
    }
}

/// 3x3 lattice with spacing 2 around the origin.
pub fn default_shape_offsets() -> Vec<[f32; 2]> {
    const STEPS: [f32; 3] = [-2.0, 0.0, 2.0];
    STEPS
        .iter()
        .flat_map(|&y| STEPS.iter().map(move |&x| [x, y]))
        .collect()
}

impl CanvasConfig {
    pub fn with_logical_extent(mut self, extent: f32) -> Self {
        self.logical_extent = extent;
        self
    }

    pub fn with_grid_cells(mut self, cells: u32) -> Self {
        self.grid_cells = cells;
        self
    }

    pub fn with_shape_offsets(mut self, offsets: Vec<[f32; 2]>) -> Self {
        self.shape_offsets = offsets;
        self
    }

    pub fn with_zoom_affects_rendering(mut self, enabled: bool) -> Self {
        self.zoom_affects_rendering = enabled;
        self
    }

    /// Applies `ORTHO_ZOOM_RENDER` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Unrecognized values are logged and
    /// ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ZOOM_RENDER_ENV) {
            match parse_flag(&raw) {
                Some(enabled) => {
                    log::info!("{ZOOM_RENDER_ENV}={raw}: zoom affects rendering = {enabled}");
                    self.zoom_affects_rendering = enabled;
                }
                None => log::warn!("ignoring {ZOOM_RENDER_ENV}={raw:?}: expected 1/0 or true/false"),
            }
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_reference_scene() {
        let config = CanvasConfig::default();
        assert_eq!(config.size_hint, (800, 800));
        assert_eq!(config.logical_extent, 10.0);
        assert_eq!(config.clear_color, Color::BLACK);
        assert_eq!(config.shape_color, Color::GREEN);
        assert!(!config.zoom_affects_rendering);

        assert_eq!(config.shape_offsets.len(), 9);
        assert_eq!(config.shape_offsets[0], [-2.0, -2.0]);
        assert_eq!(config.shape_offsets[4], [0.0, 0.0]);
        assert_eq!(config.shape_offsets[8], [2.0, 2.0]);
    }

    #[test]
    fn env_flag_enables_zoom_rendering() {
        let config = CanvasConfig::default()
            .with_overrides_from(|key| (key == ZOOM_RENDER_ENV).then(|| "1".to_string()));
        assert!(config.zoom_affects_rendering);

        let config = CanvasConfig::default()
            .with_zoom_affects_rendering(true)
            .with_overrides_from(|_| Some("off".to_string()));
        assert!(!config.zoom_affects_rendering);
    }

    #[test]
    fn unknown_flag_value_is_ignored() {
        let config = CanvasConfig::default()
            .with_zoom_affects_rendering(true)
            .with_overrides_from(|_| Some("maybe".to_string()));
        assert!(config.zoom_affects_rendering);

        let untouched = CanvasConfig::default().with_overrides_from(|_| None);
        assert_eq!(untouched, CanvasConfig::default());
    }
}

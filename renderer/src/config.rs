//! Shading stage configuration

/// Color blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// No blending (opaque)
    #[default]
    Opaque,
    /// Source-over alpha blending
    Alpha,
}

/// Per-stage render state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageConfig {
    /// Early depth test against the target's depth buffer
    pub depth_test: bool,
    pub blend: BlendMode,
}

impl StageConfig {
    /// Parse space-separated options: `depth`, `nodepth`, `blend=alpha`,
    /// `blend=opaque`. Unknown tokens are ignored; later tokens win.
    pub fn from_options(options: &str) -> Self {
        let mut config = Self::default();

        for token in options.split_whitespace() {
            match token {
                "depth" => config.depth_test = true,
                "nodepth" => config.depth_test = false,
                _ => {
                    if let Some(mode) = token.strip_prefix("blend=") {
                        if let Some(blend) = parse_blend(mode) {
                            config.blend = blend;
                        }
                    }
                }
            }
        }

        config
    }

    #[inline]
    pub fn blend_enabled(&self) -> bool {
        self.blend == BlendMode::Alpha
    }
}

fn parse_blend(mode: &str) -> Option<BlendMode> {
    if mode.eq_ignore_ascii_case("alpha") {
        Some(BlendMode::Alpha)
    } else if mode.eq_ignore_ascii_case("opaque") {
        Some(BlendMode::Opaque)
    } else {
        None
    }
}

use std::hash::{DefaultHasher, Hash, Hasher};

use macroquad::color::Color as Rgba;

use crate::model::Color;

pub const FLUID_COLORS: [(&str, Rgba); 32] = [
    ("red",        Rgba::new(1.0  , 0.0  , 0.0  , 1.0  )),
    ("blue",       Rgba::new(0.0  , 0.0  , 1.0  , 1.0  )),
    ("yellow",     Rgba::new(1.0  , 1.0  , 0.0  , 1.0  )),
    ("green",      Rgba::new(0.0  , 0.5  , 0.0  , 1.0  )),
    ("purple",     Rgba::new(0.627, 0.125, 0.941, 1.0  )),
    ("orange",     Rgba::new(1.0  , 0.647, 0.0  , 1.0  )),
    ("cyan",       Rgba::new(0.0  , 1.0  , 1.0  , 1.0  )),
    ("magenta",    Rgba::new(1.0  , 0.0  , 1.0  , 1.0  )),
    ("lime",       Rgba::new(0.0  , 1.0  , 0.0  , 1.0  )),
    ("pink",       Rgba::new(1.0  , 0.752, 0.796, 1.0  )),
    ("brown",      Rgba::new(0.647, 0.164, 0.164, 1.0  )),
    ("navy",       Rgba::new(0.0  , 0.0  , 0.5  , 1.0  )),
    ("turquoise",  Rgba::new(0.250, 0.878, 0.815, 1.0  )),
    ("olive",      Rgba::new(0.5  , 0.5  , 0.0  , 1.0  )),
    ("maroon",     Rgba::new(0.5  , 0.0  , 0.0  , 1.0  )),
    ("aqua",       Rgba::new(0.498, 1.0  , 0.831, 1.0  )),
    ("teal",       Rgba::new(0.0  , 0.5  , 0.5  , 1.0  )),
    ("gold",       Rgba::new(1.0  , 0.843, 0.0  , 1.0  )),
    ("silver",     Rgba::new(0.75 , 0.75 , 0.75 , 1.0  )),
    ("coral",      Rgba::new(1.0  , 0.498, 0.313, 1.0  )),
    ("violet",     Rgba::new(0.933, 0.509, 0.933, 1.0  )),
    ("mint",       Rgba::new(0.596, 1.0  , 0.596, 1.0  )),
    ("beige",      Rgba::new(0.960, 0.960, 0.862, 1.0  )),
    ("salmon",     Rgba::new(0.980, 0.501, 0.447, 1.0  )),
    ("sandybrown", Rgba::new(0.956, 0.643, 0.376, 1.0  )),
    ("indigo",     Rgba::new(0.294, 0.0  , 0.509, 1.0  )),
    ("crimson",    Rgba::new(0.862, 0.078, 0.235, 1.0  )),
    ("khaki",      Rgba::new(0.941, 0.901, 0.549, 1.0  )),
    ("plum",       Rgba::new(0.866, 0.627, 0.866, 1.0  )),
    ("chocolate",  Rgba::new(0.823, 0.411, 0.117, 1.0  )),
    ("darkgreen",  Rgba::new(0.0  , 0.392, 0.0  , 1.0  )),
    ("darkorange", Rgba::new(1.0  , 0.549, 0.0  , 1.0  )),
];

pub fn color_names() -> impl Iterator<Item = &'static str> {
    FLUID_COLORS.iter().map(|(name, _)| *name)
}

/// Draw color for a liquid. Unknown names still get a stable palette entry.
pub fn fluid_color(color: &Color) -> Rgba {
    let name = color.name().to_ascii_lowercase();
    if let Some((_, rgba)) = FLUID_COLORS.iter().find(|(known, _)| *known == name) {
        return *rgba;
    }
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    FLUID_COLORS[(hasher.finish() % FLUID_COLORS.len() as u64) as usize].1
}

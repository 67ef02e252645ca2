use rand::Rng;
use system::Color;

/// Colors handed out to new sessions. Two sessions may end up with the same
/// color; that's only cosmetic.
pub const PALETTE: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
    "#F8B739", "#52B788", "#E63946", "#457B9D",
];

pub fn pick_color() -> Color {
    pick_color_with(&mut rand::thread_rng())
}

pub fn pick_color_with<R: Rng + ?Sized>(rng: &mut R) -> Color {
    PALETTE[rng.gen_range(0..PALETTE.len())].to_string()
}

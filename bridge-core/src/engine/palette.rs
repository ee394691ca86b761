//! Genre → palette mapping: per-band RGB anchors, family- and count-constrained.

/// A color family a palette may be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// No constraint; anchors span the full hue wheel.
    Any,
    /// Warm reds.
    Red,
    /// Warm yellows/ambers.
    Yellow,
    /// Cool greens.
    Green,
    /// Cool cyans.
    Cyan,
    /// Cool blues/violets.
    Blue,
}

/// A palette of RGB anchor points the scene policy interpolates across.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Anchors as `(r, g, b)` in `0..=255`.
    pub anchors: Vec<(u8, u8, u8)>,
    /// The color family this palette belongs to.
    pub family: Family,
}

impl Palette {
    fn new(family: Family, anchors: Vec<(u8, u8, u8)>) -> Self {
        Self { anchors, family }
    }

    /// Interpolates between two adjacent anchors at phase `t ∈ [0, 1]`.
    #[must_use]
    pub fn sample(&self, t: f32) -> (u8, u8, u8) {
        if self.anchors.is_empty() {
            return (255, 255, 255);
        }
        if self.anchors.len() == 1 {
            return self.anchors[0];
        }
        let t = t.clamp(0.0, 1.0) * (self.anchors.len() - 1) as f32;
        let idx = t.floor() as usize;
        let frac = t - idx as f32;
        let a = self.anchors[idx.min(self.anchors.len() - 1)];
        let b = self.anchors[(idx + 1).min(self.anchors.len() - 1)];
        (
            lerp(a.0, b.0, frac),
            lerp(a.1, b.1, frac),
            lerp(a.2, b.2, frac),
        )
    }

    /// Re-samples this palette down to `count` anchors (1/3/5/8/12), evenly
    /// spaced across the existing anchor span.
    #[must_use]
    pub fn with_anchor_count(&self, count: usize) -> Self {
        let count = count.max(1);
        let anchors = (0..count)
            .map(|i| {
                let t = if count == 1 {
                    0.0
                } else {
                    i as f32 / (count - 1) as f32
                };
                self.sample(t)
            })
            .collect();
        Self {
            anchors,
            family: self.family,
        }
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round().clamp(0.0, 255.0) as u8
}

/// Looks up the palette for a genre name, falling back to "edm" for unknown
/// or empty input — the engine must never crash on a bad genre string.
#[must_use]
pub fn palette_for_genre(genre: &str) -> Palette {
    match genre.to_ascii_lowercase().as_str() {
        "edm" => Palette::new(
            Family::Any,
            vec![(255, 0, 128), (0, 200, 255), (140, 0, 255), (255, 255, 0)],
        ),
        "rock" => Palette::new(
            Family::Red,
            vec![(255, 30, 0), (255, 120, 0), (180, 0, 0)],
        ),
        "jazz" => Palette::new(
            Family::Yellow,
            vec![(255, 180, 60), (255, 220, 140), (200, 120, 30)],
        ),
        "ambient" => Palette::new(
            Family::Blue,
            vec![(20, 40, 120), (60, 100, 200), (10, 200, 220)],
        ),
        "chill" => Palette::new(
            Family::Cyan,
            vec![(0, 200, 180), (0, 140, 220), (100, 255, 220)],
        ),
        "forest" => Palette::new(
            Family::Green,
            vec![(20, 140, 40), (80, 200, 60), (10, 90, 30)],
        ),
        _ => palette_for_genre("edm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_genre_falls_back_to_edm() {
        let fallback = palette_for_genre("edm");
        let unknown = palette_for_genre("not-a-real-genre");
        assert_eq!(fallback.anchors, unknown.anchors);
    }

    #[test]
    fn with_anchor_count_resamples_to_the_requested_size() {
        let palette = palette_for_genre("edm").with_anchor_count(8);
        assert_eq!(palette.anchors.len(), 8);
    }

    #[test]
    fn sample_interpolates_between_adjacent_anchors() {
        let palette = Palette::new(Family::Any, vec![(0, 0, 0), (255, 255, 255)]);
        assert_eq!(palette.sample(0.0), (0, 0, 0));
        assert_eq!(palette.sample(1.0), (255, 255, 255));
        let mid = palette.sample(0.5);
        assert!(mid.0 > 100 && mid.0 < 155);
    }
}

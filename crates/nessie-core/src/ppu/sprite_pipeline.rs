use super::sprite::{SecondaryOam, SpriteAttributes};

/// One sprite's output unit for the current scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct SpriteSlot {
    /// Pattern bitplane 0, shifted left once per dot after X expires.
    pattern_low: u8,
    pattern_high: u8,
    attributes: SpriteAttributes,
    /// Dots left before the shifters start.
    x_counter: u8,
    sprite0: bool,
}

/// Sprite pixel produced for a single dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub(crate) struct SpritePixel {
    pub(crate) palette: u8,
    /// `0` is transparent.
    pub(crate) color: u8,
    pub(crate) behind_background: bool,
    pub(crate) sprite0: bool,
}

/// Eight sprite shifters with their X counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpritePipeline {
    slots: [SpriteSlot; SecondaryOam::CAPACITY],
    active: usize,
}

impl SpritePipeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Loads the sprites evaluated and fetched during the previous scanline.
    ///
    /// Horizontally flipped rows are bit-reversed so that shifting left
    /// always walks the sprite left to right.
    pub(crate) fn load(&mut self, secondary: &SecondaryOam) {
        self.clear();
        self.active = secondary.len();
        for (i, sprite) in secondary.sprites().iter().enumerate() {
            let [mut low, mut high] = secondary.pattern(i);
            if sprite.attributes.contains(SpriteAttributes::FLIP_HORIZONTAL) {
                low = low.reverse_bits();
                high = high.reverse_bits();
            }
            self.slots[i] = SpriteSlot {
                pattern_low: low,
                pattern_high: high,
                attributes: sprite.attributes,
                x_counter: sprite.x,
                sprite0: secondary.sprite0 && i == 0,
            };
        }
    }

    /// Samples the frontmost opaque sprite pixel and advances every slot by
    /// one dot.
    pub(crate) fn sample_and_shift(&mut self) -> SpritePixel {
        let mut chosen: Option<SpritePixel> = None;

        for slot in self.slots.iter_mut().take(self.active) {
            if slot.x_counter > 0 {
                slot.x_counter -= 1;
                continue;
            }

            let color = ((slot.pattern_high >> 7) << 1) | (slot.pattern_low >> 7);
            if chosen.is_none() && color != 0 {
                chosen = Some(SpritePixel {
                    palette: slot.attributes.palette(),
                    color,
                    behind_background: slot
                        .attributes
                        .contains(SpriteAttributes::PRIORITY_BEHIND_BACKGROUND),
                    sprite0: slot.sprite0,
                });
            }

            slot.pattern_low <<= 1;
            slot.pattern_high <<= 1;
        }

        chosen.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::sprite::Sprite;

    fn secondary(entries: &[([u8; 4], [u8; 2])], sprite0: bool) -> SecondaryOam {
        let mut oam = SecondaryOam::default();
        for (slot, (bytes, pattern)) in entries.iter().enumerate() {
            oam.push(Sprite::from_bytes(bytes), 0);
            oam.set_pattern(slot, 0, pattern[0]);
            oam.set_pattern(slot, 1, pattern[1]);
        }
        oam.sprite0 = sprite0;
        oam
    }

    #[test]
    fn x_counter_delays_output() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load(&secondary(&[([0, 0, 0b01, 2], [0x80, 0x00])], false));
        assert_eq!(pipeline.sample_and_shift().color, 0);
        assert_eq!(pipeline.sample_and_shift().color, 0);
        let pixel = pipeline.sample_and_shift();
        assert_eq!((pixel.color, pixel.palette), (1, 1));
        assert_eq!(pipeline.sample_and_shift().color, 0);
    }

    #[test]
    fn lower_slot_wins_and_flags_sprite0() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load(&secondary(
            &[([0, 0, 0x20, 0], [0x80, 0x80]), ([0, 0, 0x02, 0], [0x80, 0x00])],
            true,
        ));
        let pixel = pipeline.sample_and_shift();
        assert_eq!(pixel.color, 3);
        assert!(pixel.behind_background);
        assert!(pixel.sprite0);
    }

    #[test]
    fn horizontal_flip_reverses_the_row() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load(&secondary(&[([0, 0, 0x40, 0], [0x01, 0x00])], false));
        assert_eq!(pipeline.sample_and_shift().color, 1);
        assert_eq!(pipeline.sample_and_shift().color, 0);
    }

    #[test]
    fn transparent_front_sprite_lets_the_next_one_through() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load(&secondary(
            &[([0, 0, 0, 0], [0x00, 0x00]), ([0, 0, 0x03, 0], [0x00, 0x80])],
            true,
        ));
        let pixel = pipeline.sample_and_shift();
        assert_eq!((pixel.color, pixel.palette, pixel.sprite0), (2, 3, false));
    }
}

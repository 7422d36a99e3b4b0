use crate::shapes::rect::RectF32;

const STRIDES: [u32; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;
const ANCHOR_OFFSET: f32 = 0.5;
pub const INPUT_SIZE: u32 = 128;
pub const NUM_ANCHORS: usize = 896;

/// SSD anchors for the short-range BlazeFace model.
///
/// Layers sharing a stride are merged, so each cell of the 16x16 grid gets
/// 2 anchors and each cell of the 8x8 grid gets 6, for 896 in total. The
/// model uses fixed-size anchors, so only the centres carry information.
/// Centres are normalised to `[0, 1]`.
pub fn gen_anchors() -> Vec<RectF32> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    let mut layer_id = 0;
    while layer_id < STRIDES.len() {
        let stride = STRIDES[layer_id];

        let mut last_same_stride_layer = layer_id;
        let mut per_cell = 0;
        while last_same_stride_layer < STRIDES.len() && STRIDES[last_same_stride_layer] == stride
        {
            per_cell += ANCHORS_PER_LAYER;
            last_same_stride_layer += 1;
        }

        let grid = INPUT_SIZE.div_ceil(stride);
        for y in 0..grid {
            for x in 0..grid {
                let xc = (x as f32 + ANCHOR_OFFSET) / grid as f32;
                let yc = (y as f32 + ANCHOR_OFFSET) / grid as f32;
                for _ in 0..per_cell {
                    anchors.push(RectF32::from_center(xc, yc, 1., 1.));
                }
            }
        }

        layer_id = last_same_stride_layer;
    }

    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_count() {
        assert_eq!(gen_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchor_layout() {
        let anchors = gen_anchors();

        // first layer: 16x16 grid, 2 per cell
        assert_eq!(anchors[0], anchors[1]);
        assert_eq!(anchors[0].x, 0.5 / 16.);
        assert_eq!(anchors[2].x, 1.5 / 16.);
        assert_eq!(anchors[32].y, 1.5 / 16.);

        // second layer starts after 512 anchors: 8x8 grid, 6 per cell
        assert_eq!(anchors[512].x, 0.5 / 8.);
        assert_eq!(anchors[517].x, 0.5 / 8.);
        assert_eq!(anchors[518].x, 1.5 / 8.);
        assert_eq!(anchors[NUM_ANCHORS - 1].x, 7.5 / 8.);
        assert_eq!(anchors[NUM_ANCHORS - 1].y, 7.5 / 8.);
    }
}

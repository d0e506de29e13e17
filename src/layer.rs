//! Display layers: how an engine-owned bitmap is placed on screen.
//!
//! The engine keeps one `Layer` per thing it shows (two mask layers, the
//! overlay, every glow sprite) and hands the host a z-ordered `DisplayList`
//! each frame. Bitmaps stay owned by the engine; the list only borrows them.

use crate::bitmap::Bitmap;
use crate::color::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Subtract,
}

/// Placement and blending parameters of one on-screen bitmap
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub x: i32,
    pub y: i32,
    /// Origin inside the bitmap that lands on (x, y)
    pub ox: i32,
    pub oy: i32,
    pub zoom_x: f32,
    pub zoom_y: f32,
    pub opacity: u8,
    pub tone: Tone,
    pub blend: BlendMode,
    pub z: i32,
    pub visible: bool,
}

impl Layer {
    pub fn new(blend: BlendMode, z: i32) -> Self {
        Layer {
            x: 0,
            y: 0,
            ox: 0,
            oy: 0,
            zoom_x: 1.0,
            zoom_y: 1.0,
            opacity: 255,
            tone: Tone::default(),
            blend,
            z,
            visible: true,
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom_x = zoom;
        self.zoom_y = zoom;
    }
}

/// A bitmap together with the layer that shows it
#[derive(Debug, Clone)]
pub struct Sprite {
    pub bitmap: Bitmap,
    pub layer: Layer,
}

impl Sprite {
    pub fn new(bitmap: Bitmap, layer: Layer) -> Self {
        Sprite { bitmap, layer }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayItem<'a> {
    pub bitmap: &'a Bitmap,
    pub layer: &'a Layer,
}

/// Everything the engine wants drawn this frame, back to front
#[derive(Debug, Default)]
pub struct DisplayList<'a> {
    items: Vec<DisplayItem<'a>>,
}

impl<'a> DisplayList<'a> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, bitmap: &'a Bitmap, layer: &'a Layer) {
        self.items.push(DisplayItem { bitmap, layer });
    }

    /// Stable sort by z so equal z values keep insertion order
    pub fn sorted(mut self) -> Self {
        self.items.sort_by_key(|item| item.layer.z);
        self
    }

    pub fn items(&self) -> &[DisplayItem<'a>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_list_orders_by_z() {
        let bmp = Bitmap::new(1, 1);
        let top = Layer::new(BlendMode::Normal, 99999);
        let glow = Layer::new(BlendMode::Add, 2);
        let mask = Layer::new(BlendMode::Subtract, 99998);

        let mut list = DisplayList::new();
        list.push(&bmp, &top);
        list.push(&bmp, &glow);
        list.push(&bmp, &mask);
        let list = list.sorted();

        let zs: Vec<i32> = list.items().iter().map(|i| i.layer.z).collect();
        assert_eq!(zs, vec![2, 99998, 99999]);
    }

    #[test]
    fn test_layer_defaults() {
        let layer = Layer::new(BlendMode::Add, 2).at(10, -4);
        assert_eq!((layer.x, layer.y), (10, -4));
        assert_eq!(layer.opacity, 255);
        assert!(layer.visible);
        assert_eq!(layer.zoom_x, 1.0);
    }
}

use std::{collections::HashMap, fs::File, io::Read, time::Duration};

use smithay::input::pointer::CursorIcon;
use tracing::warn;
use xcursor::{
    CursorTheme,
    parser::{Image, parse_xcursor},
};

/// Cursor shown while a pointer grab is active, with its desktop-shell wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrabCursor {
    None = 0,
    ResizeTop = 1,
    ResizeBottom = 2,
    Arrow = 3,
    ResizeLeft = 4,
    ResizeTopLeft = 5,
    ResizeBottomLeft = 6,
    Move = 7,
    ResizeRight = 8,
    ResizeTopRight = 9,
    ResizeBottomRight = 10,
    Busy = 11,
}

impl GrabCursor {
    /// Resize cursors share their bit layout with the resize edge mask.
    pub fn from_edges(bits: u32) -> Self {
        match bits {
            1 => GrabCursor::ResizeTop,
            2 => GrabCursor::ResizeBottom,
            4 => GrabCursor::ResizeLeft,
            5 => GrabCursor::ResizeTopLeft,
            6 => GrabCursor::ResizeBottomLeft,
            8 => GrabCursor::ResizeRight,
            9 => GrabCursor::ResizeTopRight,
            10 => GrabCursor::ResizeBottomRight,
            _ => GrabCursor::Arrow,
        }
    }

    pub fn wire_value(self) -> u32 {
        self as u32
    }

    pub fn icon(self) -> Option<CursorIcon> {
        let icon = match self {
            GrabCursor::None => return None,
            GrabCursor::ResizeTop => CursorIcon::NResize,
            GrabCursor::ResizeBottom => CursorIcon::SResize,
            GrabCursor::Arrow => CursorIcon::Default,
            GrabCursor::ResizeLeft => CursorIcon::WResize,
            GrabCursor::ResizeTopLeft => CursorIcon::NwResize,
            GrabCursor::ResizeBottomLeft => CursorIcon::SwResize,
            GrabCursor::Move => CursorIcon::Move,
            GrabCursor::ResizeRight => CursorIcon::EResize,
            GrabCursor::ResizeTopRight => CursorIcon::NeResize,
            GrabCursor::ResizeBottomRight => CursorIcon::SeResize,
            GrabCursor::Busy => CursorIcon::Wait,
        };
        Some(icon)
    }
}

/// Loads and caches xcursor images for the grab cursors.
pub struct CursorThemeManager {
    theme: CursorTheme,
    cache: HashMap<CursorIcon, Vec<Image>>,
    size: u32,
}

impl CursorThemeManager {
    pub fn load(name: &str, size: u32) -> Self {
        Self {
            theme: CursorTheme::load(name),
            cache: HashMap::new(),
            size,
        }
    }

    pub fn image(&mut self, cursor: GrabCursor, time: Duration) -> Option<Image> {
        let icon = cursor.icon()?;
        let theme = &self.theme;
        let images = self.cache.entry(icon).or_insert_with(|| {
            load_cursor(theme, icon).unwrap_or_else(|err| {
                warn!(cursor = icon.name(), "Unable to load xcursor ({err}), using fallback cursor");
                vec![fallback_cursor_image()]
            })
        });
        frame(time.as_millis() as u32, self.size, &images[..])
    }
}

fn load_cursor(theme: &CursorTheme, icon: CursorIcon) -> Result<Vec<Image>, String> {
    let path = std::iter::once(icon.name())
        .chain(icon.alt_names().iter().copied())
        .find_map(|name| theme.load_icon(name))
        .ok_or_else(|| format!("theme has no `{}` cursor", icon.name()))?;

    let mut file = File::open(path).map_err(|err| format!("failed to open cursor file: {err}"))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|err| format!("failed to read cursor file: {err}"))?;

    let images = parse_xcursor(&data).ok_or_else(|| "failed to parse cursor data".to_owned())?;
    if images.is_empty() {
        return Err("cursor file has no images".to_owned());
    }
    Ok(images)
}

fn nearest_images(size: u32, images: &[Image]) -> impl Iterator<Item = &Image> {
    let nearest = images
        .iter()
        .min_by_key(|image| (size as i32 - image.size as i32).abs());

    images.iter().filter(move |image| {
        nearest.is_some_and(|n| image.width == n.width && image.height == n.height)
    })
}

fn frame(mut millis: u32, size: u32, images: &[Image]) -> Option<Image> {
    let total_delay = nearest_images(size, images).fold(0, |acc, image| acc + image.delay);

    if total_delay == 0 {
        return nearest_images(size, images).next().cloned();
    }

    millis %= total_delay;

    for image in nearest_images(size, images) {
        if millis < image.delay {
            return Some(image.clone());
        }
        millis -= image.delay;
    }

    None
}

fn fallback_cursor_image() -> Image {
    const W: usize = 24;
    const H: usize = 24;

    let idx = |x: usize, y: usize| y * W + x;
    let mut pixels = vec![0u8; W * H * 4];

    for y in 0..16 {
        let right = (y / 2) + 1;
        for x in 0..=right {
            let edge = x == 0 || x == right || y == 15;
            let rgba = if edge {
                [255, 255, 255, 255]
            } else {
                [0, 0, 0, 255]
            };
            let p = idx(x, y) * 4;
            pixels[p..p + 4].copy_from_slice(&rgba);
        }
    }

    Image {
        size: W as u32,
        width: W as u32,
        height: H as u32,
        xhot: 1,
        yhot: 1,
        delay: 1,
        pixels_rgba: pixels,
        pixels_argb: Vec::new(),
    }
}

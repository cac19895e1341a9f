use crate::atlas::SpriteFrame;
use crate::interface::{Icon, Rect, StatsCard, ICONS, PLAYFIELD, TOP_BAR_H, WORLD_H, WORLD_W};
use crate::model::Facing;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Drawing operations the game needs from whatever shows it.
pub(crate) trait Renderer {
    fn draw_frame(&mut self, frame: &SpriteFrame, x: i32, y: i32);
    /// Restores the background under `area`.
    fn clear_region(&mut self, area: Rect);
    fn draw_icon(&mut self, icon: Icon, alpha: f32);
    /// Blacks out the play field, or restores its background.
    fn draw_overlay(&mut self, on: bool);
    fn draw_stats(&mut self, card: &StatsCard);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: i32, y: i32) -> Pixel {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return Pixel::default();
        }
        self.px[self.idx(x as u32, y as u32)]
    }
    fn put(&mut self, x: i32, y: i32, p: Pixel) {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        self.px[i] = p;
    }
    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }
    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, p: Pixel) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let (x0, x1) = ((cx - rx).floor() as i32, (cx + rx).ceil() as i32);
        let (y0, y1) = ((cy - ry).floor() as i32, (cy + ry).ceil() as i32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend_over(x, y, p);
                }
            }
        }
    }
}

/* -----------------------------
   World surface: the retained 320×240 play field
------------------------------ */

const SPRITE_BODY: Pixel = Pixel::rgba(250, 220, 70, 255);
const SPRITE_INK: Pixel = Pixel::rgba(20, 20, 24, 255);
const SPRITE_CHEEK: Pixel = Pixel::rgba(235, 70, 60, 255);
const RULE: Pixel = Pixel::rgba(150, 150, 160, 200);

/// Retained drawing target behind the terminal renderer. Like a canvas, it
/// keeps whatever was drawn until something paints over it.
pub(crate) struct Surface {
    pub(crate) canvas: PixelCanvas,
    pub(crate) overlay: bool,
    pub(crate) stats: Option<StatsCard>,
    icon_alpha: BTreeMap<Icon, f32>,
}

impl Surface {
    pub(crate) fn new() -> Self {
        let mut s = Self {
            canvas: PixelCanvas::new(WORLD_W as u32, WORLD_H as u32),
            overlay: false,
            stats: None,
            icon_alpha: BTreeMap::new(),
        };
        s.paint_background(Rect::new(0, 0, WORLD_W, WORLD_H));
        for x in 0..WORLD_W {
            s.canvas.put(x, TOP_BAR_H - 1, RULE);
            s.canvas.put(x, WORLD_H - TOP_BAR_H + 1, RULE);
        }
        s
    }

    pub(crate) fn icon_alpha(&self, icon: Icon) -> f32 {
        self.icon_alpha.get(&icon).copied().unwrap_or(0.5)
    }

    fn paint_background(&mut self, area: Rect) {
        for y in area.y..area.y + area.h {
            for x in area.x..area.x + area.w {
                self.canvas.put(x, y, background_at(x, y));
            }
        }
    }
}

/// A faint ball outline in the middle of the field, transparent elsewhere.
fn background_at(x: i32, y: i32) -> Pixel {
    let (cx, cy) = (WORLD_W as f32 / 2.0, (PLAYFIELD.y + PLAYFIELD.h / 2) as f32);
    let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
    let d = (dx * dx + dy * dy).sqrt();
    let radius = PLAYFIELD.h as f32 * 0.4;
    let on_ring = (d - radius).abs() < 1.0;
    let on_band = dy.abs() < 1.0 && d < radius;
    let on_button = (d - radius * 0.2).abs() < 1.0;
    if !(on_ring || on_band || on_button) {
        return Pixel::default();
    }
    if dy < 0.0 {
        Pixel::rgba(170, 60, 60, 64)
    } else {
        Pixel::rgba(140, 140, 150, 64)
    }
}

impl Renderer for Surface {
    fn draw_frame(&mut self, frame: &SpriteFrame, x: i32, y: i32) {
        let (w, h) = (frame.region.w as f32, frame.region.h as f32);
        let (x, y) = (x as f32, y as f32);
        let cx = x + w / 2.0;
        let cy = y + h * 0.62;

        // ears: tapering columns from the head up to black tips
        for (i, ear_x) in [x + w * 0.22, x + w * 0.78].into_iter().enumerate() {
            let lean = if i == 0 { -1.0 } else { 1.0 };
            let top = y;
            let base = y + h * 0.4;
            let rows = (base - top).max(1.0);
            let mut yy = top;
            while yy < base {
                let t = (yy - top) / rows;
                let half = (w * 0.09 * t).max(0.5);
                let ex = ear_x - lean * w * 0.1 * t;
                let p = if t < 0.35 { SPRITE_INK } else { SPRITE_BODY };
                let mut xx = ex - half;
                while xx <= ex + half {
                    self.canvas.blend_over(xx as i32, yy as i32, p);
                    xx += 1.0;
                }
                yy += 1.0;
            }
        }

        self.canvas
            .fill_ellipse(cx, cy, w * 0.38, h * 0.36, SPRITE_BODY);

        // the face slides toward where the pose looks
        let look = match frame.facing {
            Some(Facing::Left) => -1.0,
            Some(Facing::Right) => 1.0,
            None => 0.0,
        };
        let face_x = cx + look * w * 0.06;

        let eye_y = cy - h * 0.08;
        let eye_r = (w * 0.04).max(1.0);
        self.canvas
            .fill_ellipse(face_x - w * 0.14, eye_y, eye_r, eye_r, SPRITE_INK);
        self.canvas
            .fill_ellipse(face_x + w * 0.14, eye_y, eye_r, eye_r, SPRITE_INK);

        let cheek_r = (w * 0.05).max(1.0);
        self.canvas
            .fill_ellipse(face_x - w * 0.25, cy + h * 0.05, cheek_r, cheek_r, SPRITE_CHEEK);
        self.canvas
            .fill_ellipse(face_x + w * 0.25, cy + h * 0.05, cheek_r, cheek_r, SPRITE_CHEEK);
    }

    fn clear_region(&mut self, area: Rect) {
        self.paint_background(area);
    }

    fn draw_icon(&mut self, icon: Icon, alpha: f32) {
        self.icon_alpha.insert(icon, alpha);
        let b = icon.bounds();
        let region = icon.slot().region;
        self.paint_background(b);

        // keep the sheet region's aspect inside the 30×30 tile
        let scale = b.w as f32 / region.w.max(region.h).max(1) as f32;
        let (iw, ih) = (region.w as f32 * scale, region.h as f32 * scale);
        let (ix, iy) = (b.x as f32 + (b.w as f32 - iw) / 2.0, b.y as f32 + (b.h as f32 - ih) / 2.0);
        let a = (alpha.clamp(0.0, 1.0) * 255.0) as u8;
        let edge = Pixel::rgba(220, 220, 230, a);
        let (x0, y0) = (ix as i32, iy as i32);
        let (x1, y1) = ((ix + iw) as i32 - 1, (iy + ih) as i32 - 1);
        for x in x0..=x1 {
            self.canvas.blend_over(x, y0, edge);
            self.canvas.blend_over(x, y1, edge);
        }
        for y in y0..=y1 {
            self.canvas.blend_over(x0, y, edge);
            self.canvas.blend_over(x1, y, edge);
        }
    }

    fn draw_overlay(&mut self, on: bool) {
        self.overlay = on;
        self.stats = None;
        if on {
            for y in PLAYFIELD.y..PLAYFIELD.y + PLAYFIELD.h {
                for x in PLAYFIELD.x..PLAYFIELD.x + PLAYFIELD.w {
                    self.canvas.put(x, y, Pixel::default());
                }
            }
        } else {
            self.paint_background(PLAYFIELD);
        }
    }

    fn draw_stats(&mut self, card: &StatsCard) {
        self.stats = Some(card.clone());
    }
}

/* -----------------------------
   Terminal
------------------------------ */

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        Ok(true)
    }

    /// Cells the play field is stretched over; the last row is the key line.
    pub(crate) fn viewport(&self) -> Viewport {
        Viewport {
            cols: self.cols,
            rows: self.rows.saturating_sub(1),
        }
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Maps between terminal cells and world pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
}

impl Viewport {
    /// World position under the centre of a cell, if the cell shows the field.
    pub(crate) fn world_at(&self, col: u16, row: u16) -> Option<(f32, f32)> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let x = (col as f32 + 0.5) * WORLD_W as f32 / self.cols as f32;
        let y = (row as f32 + 0.5) * WORLD_H as f32 / self.rows as f32;
        Some((x, y))
    }

    pub(crate) fn cell_at(&self, x: f32, y: f32) -> (u16, u16) {
        let col = (x * self.cols as f32 / WORLD_W as f32) as u16;
        let row = (y * self.rows as f32 / WORLD_H as f32) as u16;
        (col.min(self.cols.saturating_sub(1)), row.min(self.rows.saturating_sub(1)))
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Samples the world surface into braille cells covering `view`.
pub(crate) fn surface_to_cells(
    surface: &Surface,
    out: &mut CellBuffer,
    view: Viewport,
    enable_color: bool,
    bg: Color,
) {
    let sub_w = view.cols as f32 * 2.0;
    let sub_h = view.rows as f32 * 4.0;
    let canvas = &surface.canvas;

    for cy in 0..view.rows as u32 {
        for cx in 0..view.cols as u32 {
            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let sx = (cx * 2 + dx) as f32 + 0.5;
                    let sy = (cy * 4 + dy) as f32 + 0.5;
                    let wx = (sx * canvas.w as f32 / sub_w) as i32;
                    let wy = (sy * canvas.h as f32 / sub_h) as i32;
                    let p = canvas.get(wx, wy);

                    // threshold: treat alpha as ink
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color && ink_count > 0 {
                let r = (sum_r / ink_count) as u8;
                let g = (sum_g / ink_count) as u8;
                let b = (sum_b / ink_count) as u8;
                Color::Rgb { r, g, b }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

/// Icon captions and the stats card, written as text over the braille field.
pub(crate) fn labels_overlay(buf: &mut CellBuffer, surface: &Surface, view: Viewport, bg: Color) {
    for slot in &ICONS {
        let b = slot.icon.bounds();
        let (col, row) = view.cell_at(
            b.x as f32 + b.w as f32 / 2.0,
            b.y as f32 + b.h as f32 / 2.0,
        );
        let len = slot.label.chars().count() as u16;
        let x = col.saturating_sub(len / 2);
        let fg = if surface.icon_alpha(slot.icon) >= 1.0 {
            Color::White
        } else {
            Color::DarkGrey
        };
        draw_text(buf, x, row, slot.label, fg, bg);
    }

    if let Some(card) = &surface.stats {
        let lines = [&card.hunger, &card.happy, &card.money];
        for (i, line) in lines.iter().enumerate() {
            let y = PLAYFIELD.y as f32 + PLAYFIELD.h as f32 * (0.3 + 0.2 * i as f32);
            let (col, row) = view.cell_at(WORLD_W as f32 / 2.0, y);
            let len = line.chars().count() as u16;
            draw_text(buf, col.saturating_sub(len / 2), row, line, Color::White, Color::Black);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::SpriteAtlas;

    fn inked(s: &Surface, area: Rect) -> usize {
        let mut n = 0;
        for y in area.y..area.y + area.h {
            for x in area.x..area.x + area.w {
                if s.canvas.get(x, y) != background_at(x, y) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn clearing_a_frame_leaves_no_trail() {
        let atlas = SpriteAtlas::builtin().unwrap();
        let frame = atlas.frames[0];
        let mut s = Surface::new();
        let at = frame.screen_rect(160, 144);
        s.draw_frame(&frame, at.x, at.y);
        assert!(inked(&s, at) > 0);
        s.clear_region(at);
        assert_eq!(inked(&s, at), 0);
    }

    /// Mean column of the dark pixels below the ear tips.
    fn face_column(s: &Surface, at: Rect) -> f32 {
        let (mut sum, mut n) = (0.0, 0.0);
        for y in at.y + at.h / 4..at.y + at.h {
            for x in at.x..at.x + at.w {
                if s.canvas.get(x, y) == SPRITE_INK {
                    sum += x as f32 + 0.5;
                    n += 1.0;
                }
            }
        }
        assert!(n > 0.0);
        sum / n
    }

    #[test]
    fn the_face_looks_the_way_the_frame_faces() {
        let atlas = SpriteAtlas::builtin().unwrap();
        for (i, right) in [(0, true), (6, false)] {
            let frame = atlas.frames[i];
            let at = frame.screen_rect(160, 144);
            let mut s = Surface::new();
            s.draw_frame(&frame, at.x, at.y);
            let mid = at.x as f32 + at.w as f32 / 2.0;
            let face = face_column(&s, at);
            if right {
                assert!(face > mid + 2.0, "frame {i}: face at {face}, middle {mid}");
            } else {
                assert!(face < mid - 2.0, "frame {i}: face at {face}, middle {mid}");
            }
        }
    }

    #[test]
    fn overlay_blanks_the_field_and_drops_stats() {
        let mut s = Surface::new();
        s.draw_stats(&StatsCard {
            hunger: "h".into(),
            happy: "p".into(),
            money: "m".into(),
        });
        s.draw_overlay(true);
        assert!(s.overlay);
        assert!(s.stats.is_none());
        assert!(s.canvas.get(160, 120).a == 0);
        s.draw_overlay(false);
        assert_eq!(inked(&s, PLAYFIELD), 0);
    }

    #[test]
    fn icons_remember_their_alpha() {
        let mut s = Surface::new();
        assert_eq!(s.icon_alpha(Icon::Feed), 0.5);
        s.draw_icon(Icon::Feed, 1.0);
        assert_eq!(s.icon_alpha(Icon::Feed), 1.0);
    }

    #[test]
    fn viewport_maps_cells_to_the_world() {
        let view = Viewport { cols: 80, rows: 24 };
        assert_eq!(view.world_at(0, 0), Some((2.0, 5.0)));
        assert_eq!(view.world_at(80, 0), None);
        assert_eq!(view.cell_at(319.0, 239.0), (79, 23));
        let (x, y) = view.world_at(3, 1).unwrap();
        assert_eq!(crate::interface::icon_at(x, y), Some(Icon::Feed));
    }

    #[test]
    fn braille_shows_drawn_pixels() {
        let mut s = Surface::new();
        let view = Viewport { cols: 40, rows: 12 };
        let mut buf = CellBuffer::new(40, 13);
        let atlas = SpriteAtlas::builtin().unwrap();
        let at = atlas.frames[0].screen_rect(160, 144);
        s.draw_frame(&atlas.frames[0], at.x, at.y);
        surface_to_cells(&s, &mut buf, view, true, Color::Black);
        let (col, row) = view.cell_at(160.0, 150.0);
        let c = buf.cells[buf.idx(col, row)];
        assert_ne!(c.ch, '\u{2800}');
    }
}

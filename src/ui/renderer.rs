/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer (array of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One terminal cell covers `PX_PER_COL × PX_PER_ROW` world units, so a
/// 16×16 tile is 4 columns by 2 rows. Objects draw themselves through the
/// `Canvas` impl, in world coordinates.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::math::Vector;
use crate::domain::object::{Canvas, Paint};
use crate::domain::tile::{TILE_HEIGHT, TILE_WIDTH};
use crate::sim::level::{
    tile_char, BLUE_GHOST, BLUE_SOLID, FOLIAGE, LAVA, LEDGE, ORANGE_GHOST, ORANGE_SOLID, SPIKE_LEFT, SPIKE_UP, WATER,
};
use crate::sim::stage::Stage;

const PX_PER_COL: f32 = 4.0;
const PX_PER_ROW: f32 = 8.0;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
/// HUD + message + help.
const RESERVED_ROWS: usize = 3;

const MESSAGE_FRAMES: u32 = 90;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every empty cell, also used for Clear,
    /// so terminals never show their own default between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            self.cells.get_mut(y * self.width + x)
        } else {
            None
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// One char per column, clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Tile and paint styles ──

fn tile_style(id: u32) -> Cell {
    let ch = tile_char(id);
    match id {
        0 => Cell::BLANK,
        WATER => Cell::new(ch, Color::White, Color::Rgb { r: 30, g: 60, b: 160 }),
        LAVA => Cell::new(ch, Color::Yellow, Color::Rgb { r: 170, g: 40, b: 20 }),
        BLUE_SOLID => Cell::new(ch, Color::White, Color::Blue),
        BLUE_GHOST => Cell::new(ch, Color::Blue, Cell::BASE_BG),
        ORANGE_SOLID => Cell::new(ch, Color::Black, Color::Rgb { r: 230, g: 130, b: 30 }),
        ORANGE_GHOST => Cell::new(ch, Color::Rgb { r: 230, g: 130, b: 30 }, Cell::BASE_BG),
        SPIKE_UP..=SPIKE_LEFT => Cell::new(ch, Color::Grey, Cell::BASE_BG),
        FOLIAGE => Cell::new(ch, Color::Green, Cell::BASE_BG),
        LEDGE => Cell::new(ch, Color::DarkYellow, Cell::BASE_BG),
        _ => Cell::new(ch, Color::Rgb { r: 150, g: 110, b: 70 }, Color::Rgb { r: 70, g: 50, b: 35 }),
    }
}

fn paint_color(paint: Paint) -> Color {
    match paint {
        Paint::Hero => Color::Yellow,
        Paint::Enemy => Color::Red,
        Paint::Projectile => Color::White,
        Paint::Platform => Color::Cyan,
        Paint::Hazard => Color::Magenta,
        Paint::Faded => Color::DarkGrey,
    }
}

// ── Canvas over the map area ──

/// Maps world coordinates onto the map rows of a frame buffer.
struct MapCanvas<'a> {
    buf: &'a mut FrameBuffer,
    /// World position of the top-left map cell.
    origin: Vector,
    rows: usize,
}

impl MapCanvas<'_> {
    fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let col = ((x - self.origin.x) / PX_PER_COL).floor();
        let row = ((y - self.origin.y) / PX_PER_ROW).floor();
        if col < 0.0 || row < 0.0 || col as usize >= self.buf.width || row as usize >= self.rows {
            return None;
        }
        Some((col as usize, MAP_ROW + row as usize))
    }
}

impl Canvas for MapCanvas<'_> {
    /// Colors every cell whose center lies inside the rect.
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: Paint) {
        let color = paint_color(paint);
        let first_col = ((x - self.origin.x) / PX_PER_COL - 0.5).ceil().max(0.0) as usize;
        let first_row = ((y - self.origin.y) / PX_PER_ROW - 0.5).ceil().max(0.0) as usize;
        let last_col = ((x + w - self.origin.x) / PX_PER_COL - 0.5).floor();
        let last_row = ((y + h - self.origin.y) / PX_PER_ROW - 0.5).floor();
        if last_col < 0.0 || last_row < 0.0 {
            return;
        }
        for row in first_row..=(last_row as usize).min(self.rows.saturating_sub(1)) {
            for col in first_col..=last_col as usize {
                if let Some(cell) = self.buf.get_mut(col, MAP_ROW + row) {
                    cell.bg = color;
                }
            }
        }
    }

    fn draw_glyph(&mut self, x: f32, y: f32, glyph: char, paint: Paint) {
        if let Some((col, row)) = self.cell_at(x, y) {
            if let Some(cell) = self.buf.get_mut(col, row) {
                cell.ch = glyph;
                cell.fg = paint_color(paint);
            }
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    message: String,
    message_timer: u32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// World size of the map area for the current terminal.
    pub fn view_size(&self) -> (f32, f32) {
        let rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        (self.term_w as f32 * PX_PER_COL, rows as f32 * PX_PER_ROW)
    }

    /// Show a line under the map for a short while.
    pub fn show_message(&mut self, text: impl Into<String>) {
        self.message = text.into();
        self.message_timer = MESSAGE_FRAMES;
    }

    pub fn render(&mut self, stage: &mut Stage) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        let (view_w, view_h) = self.view_size();
        if stage.camera.width != view_w || stage.camera.height != view_h {
            stage.resize_view(view_w, view_h);
        }

        self.front.clear();
        self.compose_hud(stage);
        let rows = self.compose_map(stage);
        self.compose_footer(rows);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave artifacts.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, stage: &Stage) {
        let bg = Color::Rgb { r: 20, g: 20, b: 60 };
        let hud = format!(
            " {}  Lives:{}  HP:{}  Frame:{} ",
            stage.name, stage.lives, stage.player.health, stage.frame
        );
        self.front.fill_row(HUD_ROW, bg);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, bg);
    }

    /// Tiles, then objects on top. Returns the number of map rows.
    fn compose_map(&mut self, stage: &Stage) -> usize {
        let rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1).min(self.front.height.saturating_sub(MAP_ROW));
        let origin = stage.camera.top_left();
        let visual = stage.visual();

        for row in 0..rows {
            let wy = origin.y + (row as f32 + 0.5) * PX_PER_ROW;
            let ty = (wy / TILE_HEIGHT).floor() as i32;
            for col in 0..self.front.width {
                let wx = origin.x + (col as f32 + 0.5) * PX_PER_COL;
                let tx = (wx / TILE_WIDTH).floor() as i32;
                let id = ["top", "middle", "bottom"]
                    .iter()
                    .map(|layer| visual.get_tile(layer, tx, ty))
                    .find(|&id| id != 0)
                    .unwrap_or(0);
                self.front.set(col, MAP_ROW + row, tile_style(id));
            }
        }

        let mut canvas = MapCanvas { buf: &mut self.front, origin, rows };
        stage.draw(&mut canvas);
        rows
    }

    fn compose_footer(&mut self, map_rows: usize) {
        let msg_row = MAP_ROW + map_rows;
        if self.message_timer > 0 {
            self.message_timer -= 1;
            let bg = Color::Rgb { r: 200, g: 180, b: 50 };
            self.front.fill_row(msg_row, bg);
            let text = format!(" {} ", self.message);
            self.front.put_str(0, msg_row, &text, Color::Black, bg);
        }

        let help = " Arrows/AD:Move  Z/Space:Jump  X:Fire  C:Switch  Esc:Quit";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Cell::BASE_BG);
    }
}

use crate::config::Settings;
use crate::machine::Machine;
use crate::model::{Item, MethodState, Payment, PaymentMethod, Rarity, PAYMENT_METHODS};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

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

// Catalog icons are emoji and occupy two terminal columns.
fn glyph_width(ch: char) -> u16 {
    match ch as u32 {
        0x1F300..=0x1FAFF | 0x2600..=0x27BF => 2,
        _ => 1,
    }
}

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
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let prev = CellBuffer::new(cols, rows);
        let cur = CellBuffer::new(cols, rows);

        Ok(Self {
            out,
            cols,
            rows,
            prev,
            cur,
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

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            // cell after a double-width glyph is covered by it
            let mut shadowed = false;
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if shadowed {
                    shadowed = false;
                    continue;
                }
                if glyph_width(c.ch) == 2 {
                    shadowed = true;
                }
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

/* -----------------------------
   Text helpers
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    let mut xx = x;
    for ch in s.chars() {
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
        let w = glyph_width(ch);
        if w == 2 {
            // keep the covered cell blank
            buf.set(xx + 1, y, Cell { ch: ' ', fg, bg });
        }
        xx = xx.saturating_add(w);
    }
}

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

pub(crate) fn format_mmss(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn rarity_color(r: Rarity) -> Color {
    match r {
        Rarity::Legendary => Color::Yellow,
        Rarity::Rare => Color::Magenta,
        Rarity::Common => Color::Cyan,
    }
}

/* -----------------------------
   Item grid
------------------------------ */

pub(crate) const GRID_COLS: usize = 5;
const CARD_W: u16 = 15;
const CARD_H: u16 = 4;
const GRID_X: u16 = 1;
const GRID_Y: u16 = 3;

fn truncated(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn draw_card(
    buf: &mut CellBuffer,
    x: u16,
    y: u16,
    item: &Item,
    under_cursor: bool,
    selected: bool,
    settings: &Settings,
) {
    let bg = Color::Black;
    let sold_out = item.stock == 0;

    let name_fg = if sold_out {
        Color::DarkGrey
    } else if under_cursor {
        Color::Yellow
    } else if selected {
        Color::Green
    } else if settings.enable_color {
        rarity_color(item.rarity)
    } else {
        Color::White
    };
    let dim = if sold_out { Color::DarkGrey } else { Color::Grey };

    let marker = if under_cursor {
        '>'
    } else if selected {
        '*'
    } else {
        ' '
    };
    let name = truncated(item.name, (CARD_W - 2) as usize);
    draw_text(buf, x, y, &format!("{marker}{name}"), name_fg, bg);

    let cost = format_mmss(item.time_cost_secs);
    let stock = if sold_out {
        "SOLD OUT".to_string()
    } else {
        format!("x{}", item.stock)
    };
    draw_text(buf, x + 1, y + 1, &format!("{cost:<6}{stock}"), dim, bg);
    draw_text(buf, x + 1, y + 2, item.category.label(), dim, bg);
}

/* -----------------------------
   Panels
------------------------------ */

fn draw_selection_panel(buf: &mut CellBuffer, m: &Machine, y: u16, settings: &Settings) {
    let bg = Color::Black;
    let fg = Color::White;
    let dim = Color::Grey;

    let Some(item) = m.selected_item() else {
        draw_text(
            buf,
            1,
            y,
            "Pick an item with the arrow keys, then press enter.",
            dim,
            bg,
        );
        return;
    };

    let line = format!(
        "{} {} - {}  (cost {})",
        item.icon,
        item.name,
        item.description,
        format_mmss(item.time_cost_secs)
    );
    let fg_sel = if settings.enable_color {
        rarity_color(item.rarity)
    } else {
        fg
    };
    draw_text(buf, 1, y, &line, fg_sel, bg);

    for (i, method) in PAYMENT_METHODS.iter().enumerate() {
        let chosen = m.selected_method() == Some(method.kind);
        let marker = if chosen { '>' } else { ' ' };
        let mut line = format!("{} {} {} - {}", marker, i + 1, method.name, method.description);
        if method.discount_pct() > 0 {
            line.push_str(&format!("  ({}% time discount!)", method.discount_pct()));
        }
        let col = if chosen { Color::Cyan } else { dim };
        draw_text(buf, 1, y + 2 + i as u16, &line, col, bg);
    }

    if let Some(kind) = m.selected_method() {
        let effective = PaymentMethod::of(kind).effective_cost(item);
        draw_text(
            buf,
            1,
            y + 7,
            &format!("s: start payment ({})", format_mmss(effective)),
            Color::Green,
            bg,
        );
    }
}

fn draw_processing_panel(
    buf: &mut CellBuffer,
    m: &Machine,
    p: &Payment,
    y: u16,
    frames: u64,
) {
    let bg = Color::Black;
    let red = Color::Red;
    let fg = Color::White;

    let name = m.item(p.item_id).map(|i| i.name).unwrap_or("?");
    draw_text(buf, 1, y, &format!("Payment in progress: {name}"), red, bg);

    let line = format!(
        "{} remaining  {} {:>3.0}%",
        format_mmss(p.remaining_secs),
        bar(p.progress / 100.0, 24),
        p.progress
    );
    draw_text(buf, 1, y + 1, &line, fg, bg);

    match p.state {
        MethodState::Wait => {
            draw_text(buf, 1, y + 3, "Simply wait. The machine hums.", Color::Grey, bg);
        }
        MethodState::Focus => {
            let pulse = if (frames / 8) % 2 == 0 { '◉' } else { '○' };
            draw_text(
                buf,
                1,
                y + 3,
                &format!("{pulse}  stay focused on the circle"),
                Color::Cyan,
                bg,
            );
        }
        MethodState::Click { count, target } => {
            let col = if count >= target { Color::Green } else { Color::Yellow };
            draw_text(
                buf,
                1,
                y + 3,
                &format!("Clicks: {count} / {target}  (hammer the space bar!)"),
                col,
                bg,
            );
        }
        MethodState::Breathe { phase, phase_ticks } => {
            // ring size tracks the phase
            let dots = match phase {
                crate::model::BreathPhase::Inhale => 2 + phase_ticks as usize * 2,
                crate::model::BreathPhase::Hold => 8,
                crate::model::BreathPhase::Exhale => 8usize.saturating_sub(phase_ticks as usize * 2),
            };
            let ring: String = std::iter::repeat('●').take(dots.max(1)).collect();
            draw_text(
                buf,
                1,
                y + 3,
                &format!("{:<12} {}", phase.label(), ring),
                Color::Blue,
                bg,
            );
        }
    }

    draw_text(buf, 1, y + 5, "esc: cancel payment", Color::Grey, bg);
}

fn draw_inventory(buf: &mut CellBuffer, m: &Machine, y: u16) {
    let bg = Color::Black;
    let label = format!("Collection ({}):", m.inventory().len());
    draw_text(buf, 1, y, &label, Color::White, bg);

    if m.inventory().is_empty() {
        draw_text(
            buf,
            (label.len() + 2) as u16,
            y,
            "no items yet, start investing your time",
            Color::Grey,
            bg,
        );
        return;
    }

    // most recent first, as many as fit
    let mut x = (label.len() + 2) as u16;
    for got in m.inventory().iter().rev() {
        if x + 3 >= buf.w {
            break;
        }
        draw_text(buf, x, y, &got.item.icon.to_string(), Color::White, bg);
        x += 3;
    }
}

/* -----------------------------
   Full frame
------------------------------ */

pub(crate) fn draw_ui(
    buf: &mut CellBuffer,
    m: &Machine,
    cursor_ix: usize,
    settings: &Settings,
    frames: u64,
) {
    let bg = Color::Black;

    draw_text(
        buf,
        1,
        0,
        "TIME VENDING MACHINE  |  pay with minutes, not money",
        Color::Cyan,
        bg,
    );

    let l = m.ledger();
    let stats = format!(
        "Invested {}  |  Items {}  |  Streak {}  |  {}",
        format_mmss(l.total_time_secs),
        l.items_purchased,
        l.current_streak,
        l.patience.label()
    );
    draw_text(buf, 1, 1, &stats, Color::Grey, bg);

    let selected_id = m.selected_item().map(|i| i.id);
    for (i, item) in m.items().iter().enumerate() {
        let col = (i % GRID_COLS) as u16;
        let row = (i / GRID_COLS) as u16;
        draw_card(
            buf,
            GRID_X + col * (CARD_W + 1),
            GRID_Y + row * CARD_H,
            item,
            i == cursor_ix && !m.is_processing(),
            selected_id == Some(item.id),
            settings,
        );
    }

    let panel_y = GRID_Y + 2 * CARD_H + 1;
    if let Some(p) = m.payment() {
        draw_processing_panel(buf, m, p, panel_y, frames);
    } else {
        draw_selection_panel(buf, m, panel_y, settings);
    }

    draw_inventory(buf, m, buf.h.saturating_sub(3));

    let help = if m.is_processing() {
        "Keys: space click | esc cancel | q quit"
    } else {
        "Keys: ←↑↓→ move | enter select | 1-4 method | s start | h help | q quit"
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, Color::Grey, bg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmss_matches_display_rules() {
        assert_eq!(format_mmss(0), "0:00");
        assert_eq!(format_mmss(48), "0:48");
        assert_eq!(format_mmss(60), "1:00");
        assert_eq!(format_mmss(605), "10:05");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.0, 4), "[    ]");
        assert_eq!(bar(1.0, 4), "[████]");
        assert_eq!(bar(0.5, 4), "[██  ]");
    }

    #[test]
    fn wide_glyphs_reserve_their_shadow_cell() {
        let mut buf = CellBuffer::new(10, 1);
        draw_text(&mut buf, 0, 0, "🍫ab", Color::White, Color::Black);
        assert_eq!(buf.cells[0].ch, '🍫');
        assert_eq!(buf.cells[1].ch, ' ');
        assert_eq!(buf.cells[2].ch, 'a');
        assert_eq!(buf.cells[3].ch, 'b');
    }
}

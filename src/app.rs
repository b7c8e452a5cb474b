use crate::config::{load_settings, project_paths, save_settings_atomic, Settings};
use crate::input::{collect_input_nonblocking, map_event_to_action, UiAction};
use crate::machine::Machine;
use crate::model::Scene;
use crate::render::{draw_text, draw_ui, Cell, Terminal, GRID_COLS};
use crossterm::style::Color;
use std::cmp::min;
use std::time::{Duration, Instant};

pub(crate) struct App {
    settings: Settings,
    machine: Machine,
    paths: crate::config::Paths,
    term: Terminal,
    scene: Scene,
    cursor: usize,
    payment_started: Option<Instant>,
    frames: u64,
    should_quit: bool,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let settings = load_settings(&paths.settings_path);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            machine: Machine::new(),
            paths,
            term,
            scene: Scene::Main,
            cursor: 0,
            payment_started: None,
            frames: 0,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.max(10).min(240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let tick_step = Duration::from_secs(1);

        let mut last_frame = Instant::now();
        let mut tick_accum = Duration::ZERO;

        while !self.should_quit {
            let _resized = self.term.resize_if_needed()?;

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                let processing = self.machine.is_processing();
                if let Some(action) = map_event_to_action(&self.scene, processing, ev) {
                    self.apply(action);
                    if self.should_quit {
                        break;
                    }
                }
            }

            // logic fixed-step, 1 Hz; countdown stays anchored to the wall
            // clock no matter how late the ticks land
            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            tick_accum = tick_accum.saturating_add(real_dt);

            while tick_accum >= tick_step {
                let elapsed = self
                    .payment_started
                    .map(|t| t.elapsed().as_secs())
                    .unwrap_or(0);
                self.machine.tick_second(elapsed);
                tick_accum = tick_accum.saturating_sub(tick_step);
                if !self.machine.is_processing() {
                    self.payment_started = None;
                }
            }

            // render
            self.render_frame()?;
            self.frames = self.frames.wrapping_add(1);

            // frame cap
            spin_sleep(frame_dt, Instant::now());
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Quit => self.should_quit = true,
            UiAction::HelpToggle => {
                self.scene = match self.scene {
                    Scene::Help => Scene::Main,
                    _ => Scene::Help,
                };
            }
            UiAction::Back => self.scene = Scene::Main,
            UiAction::CursorMove(dx, dy) => self.move_cursor(dx, dy),
            UiAction::SelectItem => {
                let id = self.machine.items()[self.cursor.min(self.machine.items().len() - 1)].id;
                self.machine.select_item(id);
            }
            UiAction::SelectMethod(kind) => self.machine.select_payment_method(kind),
            UiAction::StartPayment => {
                self.machine.start_payment();
                if self.machine.is_processing() {
                    self.payment_started = Some(Instant::now());
                }
            }
            UiAction::Click => self.machine.record_click(),
            UiAction::Cancel => {
                self.machine.cancel_payment();
                self.payment_started = None;
            }
        }
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let cols = GRID_COLS as i32;
        let len = self.machine.items().len() as i32;
        if len == 0 {
            return;
        }
        let mut col = self.cursor as i32 % cols;
        let mut row = self.cursor as i32 / cols;
        col = (col + dx).clamp(0, cols - 1);
        row = (row + dy).clamp(0, (len - 1) / cols);
        self.cursor = min(row * cols + col, len - 1) as usize;
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.term.cur.clear(Color::Black);

        draw_ui(
            &mut self.term.cur,
            &self.machine,
            self.cursor,
            &self.settings,
            self.frames,
        );

        if let Some(c) = self.machine.celebration() {
            let body = format!(
                "{}  You earned: {}\n\nTime well invested.",
                c.item.icon, c.item.name
            );
            self.draw_center_box("Payment Complete!", &body)?;
        }

        if let Scene::Help = self.scene {
            self.draw_center_box(
                "How it works",
                "Pay for items with your time, not money.\n\
    Arrow keys move, enter selects an item.\n\n\
    Pick how you pay:\n\
    1 Patient Wait       full price\n\
    2 Mindful Focus      full price\n\
    3 Click Challenge    20% off, hammer space to the target\n\
    4 Breathing Exercise 10% off, follow the rhythm\n\n\
    s starts the countdown; esc cancels it.\n\
    A missed click target forfeits the purchase.\n\n\
    Esc or h to close help.",
            )?;
        }

        self.term.present(true)?;
        Ok(())
    }

    fn draw_center_box(&mut self, title: &str, body: &str) -> anyhow::Result<()> {
        let w = self.term.cols;
        let h = self.term.rows;

        let bw = min(60, w.saturating_sub(4));
        let bh = min(18, h.saturating_sub(4));

        let x0 = (w - bw) / 2;
        let y0 = (h - bh) / 2;

        let fg = Color::White;
        let bg = Color::Black;

        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                self.term.cur.set(x, y, Cell { ch: ' ', fg, bg });
            }
        }

        // border
        for x in x0..x0 + bw {
            self.term.cur.set(x, y0, Cell { ch: '─', fg, bg });
            self.term.cur.set(x, y0 + bh - 1, Cell { ch: '─', fg, bg });
        }
        for y in y0..y0 + bh {
            self.term.cur.set(x0, y, Cell { ch: '│', fg, bg });
            self.term.cur.set(x0 + bw - 1, y, Cell { ch: '│', fg, bg });
        }
        self.term.cur.set(x0, y0, Cell { ch: '┌', fg, bg });
        self.term.cur.set(x0 + bw - 1, y0, Cell { ch: '┐', fg, bg });
        self.term.cur.set(x0, y0 + bh - 1, Cell { ch: '└', fg, bg });
        self.term
            .cur
            .set(x0 + bw - 1, y0 + bh - 1, Cell { ch: '┘', fg, bg });

        // title
        draw_text(&mut self.term.cur, x0 + 2, y0 + 1, title, fg, bg);

        // body
        let mut yy = y0 + 3;
        for line in body.lines() {
            if yy >= y0 + bh - 1 {
                break;
            }
            draw_text(&mut self.term.cur, x0 + 2, yy, line, fg, bg);
            yy += 1;
        }

        Ok(())
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

use std::cell::RefCell;
use std::collections::HashMap;

use macroquad::prelude::*;
use tube_sort::palette::fluid_color;
use tube_sort::{Slot, Tube, TubeId};

use crate::controls::{Button, HitItem, HitTestRegistry};

const REFERENCE_FONT_SIZE: u16 = 100;

/// Scales text to fit a box, remembering the size each string has at the reference font size.
struct TextFitter {
    measured: RefCell<HashMap<String, (f32, f32)>>,
}

impl TextFitter {
    fn new() -> Self {
        Self {
            measured: RefCell::new(HashMap::new()),
        }
    }

    /// Font size and baseline origin that center `text` inside `rect`.
    fn fit(&self, text: &str, rect: Rect) -> (f32, f32, f32) {
        let (width, height) = *self
            .measured
            .borrow_mut()
            .entry(text.to_string())
            .or_insert_with(|| {
                let dimensions = measure_text(text, None, REFERENCE_FONT_SIZE, 1.0);
                (dimensions.width.max(1.0), dimensions.height.max(1.0))
            });
        let scale = (rect.w / width).min(rect.h / height);
        let font_size = REFERENCE_FONT_SIZE as f32 * scale;
        let x = rect.x + (rect.w - width * scale) / 2.0;
        let y = rect.y + (rect.h + height * scale) / 2.0;
        (font_size, x, y)
    }
}

/// What the tube area should emphasise this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Highlights {
    pub selected: Option<TubeId>,
    pub next_move: Option<(TubeId, TubeId)>,
}

pub struct Renderer {
    text: TextFitter,
    hit_test: HitTestRegistry,
    viewport: Rect,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            text: TextFitter::new(),
            hit_test: HitTestRegistry::new(),
            viewport: Rect::new(0.0, 0.0, 800.0, 600.0),
        }
    }

    pub fn get_hit_test_registry(&self) -> &HitTestRegistry {
        &self.hit_test
    }

    pub fn autoset_viewport(&mut self) {
        self.viewport = Rect::new(0.0, 0.0, screen_width(), screen_height());
    }

    pub fn render_game(
        &mut self,
        tubes: &[Tube],
        buttons: &[Button],
        highlights: Highlights,
        status: &[String],
    ) {
        self.hit_test.clear();
        clear_background(BLACK);

        let Rect { x, y, w, h } = self.viewport;
        let padding = 10.0;
        let button_area_height = h * 0.1;
        let status_area_height = h * 0.05 * status.len().max(1) as f32;
        let tube_area_height = h - button_area_height - status_area_height - 2.0 * padding;

        self.render_button_lineup(buttons, Rect::new(x, y, w, button_area_height));
        self.render_tube_grid(
            tubes,
            highlights,
            8,
            Rect::new(x, y + button_area_height + padding, w, tube_area_height),
        );
        self.render_status(
            status,
            Rect::new(
                x,
                y + button_area_height + tube_area_height + 2.0 * padding,
                w,
                status_area_height,
            ),
        );
    }

    pub fn render_text(&self, text: &str, rect: Rect, color: Color) {
        let (font_size, x, y) = self.text.fit(text, rect);
        draw_text(text, x, y, font_size, color);
    }

    fn render_slot(&self, slot: &Slot, rect: Rect) {
        match slot {
            None => draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, GRAY),
            Some(color) => {
                draw_rectangle(rect.x, rect.y, rect.w, rect.h, fluid_color(color));
                draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, BLACK);
                let label = Rect::new(rect.x + rect.w * 0.1, rect.y + rect.h * 0.3, rect.w * 0.8, rect.h * 0.4);
                self.render_text(color.name(), label, BLACK);
            }
        }
    }

    fn render_tube(&mut self, tube: &Tube, id: TubeId, highlights: Highlights, rect: Rect) {
        self.hit_test.push(rect, HitItem::Tube { id });

        let label_height = rect.h * 0.1;
        self.render_text(&id.to_string(), Rect::new(rect.x, rect.y, rect.w, label_height), WHITE);

        let body = Rect::new(rect.x, rect.y + label_height, rect.w, rect.h - label_height);
        let slot_height = body.h / tube.get_capacity().max(1) as f32;
        // Slot 0 is the opening, drawn at the top.
        for (position, slot) in tube.get_slots().iter().enumerate() {
            let slot_y = body.y + position as f32 * slot_height;
            self.render_slot(slot, Rect::new(body.x, slot_y, body.w, slot_height));
        }
        draw_rectangle_lines(body.x, body.y, body.w, body.h, 3.0, DARKGRAY);

        if let Some((source, destination)) = highlights.next_move {
            if source == id {
                draw_rectangle_lines(body.x, body.y, body.w, body.h, 4.0, ORANGE);
            } else if destination == id {
                draw_rectangle_lines(body.x, body.y, body.w, body.h, 4.0, SKYBLUE);
            }
        }
        if highlights.selected == Some(id) {
            draw_rectangle_lines(body.x, body.y, body.w, body.h, 5.0, WHITE);
        }
    }

    fn render_tube_lineup(&mut self, tubes: &[Tube], first_id: TubeId, highlights: Highlights, rect: Rect) {
        let count = tubes.len() as f32;
        let spacing = 10.0;
        let tube_width = (rect.w - spacing * (count - 1.0)) / count;
        for (i, tube) in tubes.iter().enumerate() {
            let id = tube.id().unwrap_or(first_id + i);
            let tube_x = rect.x + i as f32 * (tube_width + spacing);
            self.render_tube(tube, id, highlights, Rect::new(tube_x, rect.y, tube_width, rect.h));
        }
    }

    fn render_tube_grid(&mut self, tubes: &[Tube], highlights: Highlights, max_columns: usize, rect: Rect) {
        if tubes.is_empty() {
            return;
        }
        let rows = tubes.len().div_ceil(max_columns);
        let spacing = 10.0;
        let row_height = (rect.h - spacing * (rows as f32 - 1.0)) / rows as f32;
        for (row, chunk) in tubes.chunks(max_columns).enumerate() {
            let row_y = rect.y + row as f32 * (row_height + spacing);
            self.render_tube_lineup(
                chunk,
                row * max_columns + 1,
                highlights,
                Rect::new(rect.x, row_y, rect.w, row_height),
            );
        }
    }

    fn render_status(&self, lines: &[String], rect: Rect) {
        if lines.is_empty() {
            return;
        }
        let line_height = rect.h / lines.len() as f32;
        for (i, line) in lines.iter().enumerate() {
            let line_y = rect.y + i as f32 * line_height;
            draw_text(line, rect.x + 10.0, line_y + line_height * 0.8, line_height * 0.8, LIGHTGRAY);
        }
    }

    fn render_button(&mut self, button: &Button, rect: Rect) {
        self.hit_test.push(rect, HitItem::Button { action: button.get_action() });

        draw_rectangle(rect.x, rect.y, rect.w, rect.h, button.get_color());
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, BLACK);
        self.render_text(button.get_label(), rect, WHITE);
    }

    fn render_button_lineup(&mut self, buttons: &[Button], rect: Rect) {
        let count = buttons.len() as f32;
        let spacing = 10.0;
        let button_width = (rect.w - spacing * (count - 1.0)) / count;
        for (i, button) in buttons.iter().enumerate() {
            let button_x = rect.x + i as f32 * (button_width + spacing);
            self.render_button(button, Rect::new(button_x, rect.y, button_width, rect.h));
        }
    }
}

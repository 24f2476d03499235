//! Drawing module - card grid, header and welcome screen
//!
//! Everything drawn with nannou lives here; egui panels are in `ui`.

use std::collections::HashMap;

use nannou::prelude::*;
use shared::{Theme, TimezoneRecord, ZoneDisplay};

use crate::cards::{remove_button_rect, Drag, GridLayout, CARD_HEIGHT, CARD_WIDTH};

/// How long a card highlights after its text changes, in seconds
pub const UPDATE_FLASH_SECS: f32 = 0.3;

const fn rgb(red: u8, green: u8, blue: u8) -> Srgb<u8> {
    Srgb {
        red,
        green,
        blue,
        standard: std::marker::PhantomData,
    }
}

fn with_alpha(color: Srgb<u8>, alpha: u8) -> Srgba<u8> {
    srgba(color.red, color.green, color.blue, alpha)
}

fn mix(a: Srgb<u8>, b: Srgb<u8>, t: f32) -> Srgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    rgb(lerp(a.red, b.red), lerp(a.green, b.green), lerp(a.blue, b.blue))
}

/// Colors for one theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Srgb<u8>,
    pub card_bg: Srgb<u8>,
    pub card_border: Srgb<u8>,
    /// Border of the host zone's card
    pub user_border: Srgb<u8>,
    /// Background tint during working hours
    pub working_bg: Srgb<u8>,
    pub time_text: Srgb<u8>,
    pub primary_text: Srgb<u8>,
    pub secondary_text: Srgb<u8>,
    pub badge_working: Srgb<u8>,
    pub badge_user: Srgb<u8>,
    pub accent: Srgb<u8>,
    pub shadow_alpha: u8,
}

impl Palette {
    pub const DARK: Palette = Palette {
        background: rgb(18, 22, 28),
        card_bg: rgb(35, 40, 50),
        card_border: rgb(80, 90, 110),
        user_border: rgb(120, 140, 180),
        working_bg: rgb(34, 50, 48),
        time_text: rgb(245, 240, 235),
        primary_text: rgb(220, 225, 235),
        secondary_text: rgb(160, 165, 175),
        badge_working: rgb(100, 200, 150),
        badge_user: rgb(120, 160, 255),
        accent: rgb(255, 179, 71),
        shadow_alpha: 70,
    };

    pub const LIGHT: Palette = Palette {
        background: rgb(242, 244, 248),
        card_bg: rgb(255, 255, 255),
        card_border: rgb(205, 210, 222),
        user_border: rgb(70, 110, 200),
        working_bg: rgb(232, 248, 240),
        time_text: rgb(28, 32, 40),
        primary_text: rgb(40, 45, 55),
        secondary_text: rgb(110, 116, 128),
        badge_working: rgb(30, 140, 90),
        badge_user: rgb(50, 100, 210),
        accent: rgb(220, 120, 20),
        shadow_alpha: 25,
    };

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::DARK,
            Theme::Light => Self::LIGHT,
        }
    }
}

/// Title bar across the grid area, with the offset banner under it
pub fn draw_header(draw: &Draw, layout: &GridLayout, palette: &Palette, banner: Option<&str>) {
    let y = layout.top + 60.0;
    draw.text("TIMEZONE BUDDY")
        .x_y(layout.center_x(), y)
        .w(layout.right - layout.left)
        .color(palette.primary_text)
        .font_size(20);

    if let Some(banner) = banner {
        draw.text(banner)
            .x_y(layout.center_x(), y - 30.0)
            .w(layout.right - layout.left)
            .color(palette.accent)
            .font_size(13);
    }
}

/// Shown when nothing is selected
pub fn draw_welcome(draw: &Draw, layout: &GridLayout, palette: &Palette) {
    let (x, y) = (layout.center_x(), layout.center_y());
    draw.text("🌍")
        .x_y(x, y + 60.0)
        .color(palette.primary_text)
        .font_size(48);
    draw.text("Welcome to TimeZone Buddy")
        .x_y(x, y)
        .w(500.0)
        .color(palette.primary_text)
        .font_size(22);
    draw.text("Search for a city on the left to add your first time zone.")
        .x_y(x, y - 36.0)
        .w(500.0)
        .color(palette.secondary_text)
        .font_size(14);
}

/// Per-card inputs to [`draw_zone_card`]
pub struct CardView<'a> {
    pub zone: &'a TimezoneRecord,
    pub display: &'a ZoneDisplay,
    pub rect: Rect,
    pub hovered: bool,
    pub dragging: bool,
    /// 1.0 right after the text changed, fading to 0.0
    pub flash: f32,
}

/// Draw all cards; the dragged one last so it floats above the rest
pub fn draw_cards(
    draw: &Draw,
    layout: &GridLayout,
    zones: &[TimezoneRecord],
    displays: &[ZoneDisplay],
    palette: &Palette,
    hovered: Option<usize>,
    drag: Option<&Drag>,
    changed_at: &HashMap<String, f32>,
    animation_time: f32,
) {
    let by_id: HashMap<&str, &ZoneDisplay> =
        displays.iter().map(|d| (d.zone_id.as_str(), d)).collect();
    let dragged_id = drag.filter(|d| d.is_active()).map(|d| d.zone_id.as_str());

    let mut floating = None;
    for (i, zone) in zones.iter().enumerate() {
        let Some(display) = by_id.get(zone.id.as_str()) else {
            continue;
        };
        let flash = changed_at
            .get(&zone.id)
            .map(|&t| 1.0 - ((animation_time - t) / UPDATE_FLASH_SECS).clamp(0.0, 1.0))
            .unwrap_or(0.0);
        let view = CardView {
            zone,
            display,
            rect: layout.card_rect(i),
            hovered: hovered == Some(i),
            dragging: dragged_id == Some(zone.id.as_str()),
            flash,
        };

        if view.dragging {
            // Leave a placeholder in the slot
            draw.rect()
                .xy(view.rect.xy())
                .wh(view.rect.wh())
                .no_fill()
                .stroke(with_alpha(palette.card_border, 160))
                .stroke_weight(1.5);
            floating = Some(view);
        } else {
            draw_zone_card(draw, &view, palette, animation_time);
        }
    }

    if let (Some(mut view), Some(drag)) = (floating, drag) {
        view.rect = view.rect.shift(drag.delta());
        draw_zone_card(draw, &view, palette, animation_time);
    }
}

/// Draw a single zone card
pub fn draw_zone_card(draw: &Draw, view: &CardView, palette: &Palette, animation_time: f32) {
    let rect = view.rect;
    let display = view.display;
    let (x, y) = (rect.x(), rect.y());

    // Shadow
    let lift = if view.dragging { 10.0 } else { 4.0 };
    draw.rect()
        .x_y(x + lift, y - lift)
        .w_h(CARD_WIDTH, CARD_HEIGHT)
        .color(srgba(0, 0, 0, palette.shadow_alpha));

    let bg = if display.is_working_hours {
        palette.working_bg
    } else {
        palette.card_bg
    };
    draw.rect()
        .x_y(x, y)
        .w_h(CARD_WIDTH, CARD_HEIGHT)
        .color(bg);

    let border = if display.is_user_zone {
        palette.user_border
    } else if view.hovered {
        mix(palette.card_border, palette.user_border, 0.5)
    } else {
        palette.card_border
    };
    draw.rect()
        .x_y(x, y)
        .w_h(CARD_WIDTH, CARD_HEIGHT)
        .no_fill()
        .stroke(border)
        .stroke_weight(if display.is_user_zone { 2.0 } else { 1.0 });

    // City and country
    let text_left = rect.left() + 16.0;
    draw.text(&view.zone.city)
        .x_y(x - 10.0, rect.top() - 22.0)
        .w(CARD_WIDTH - 52.0)
        .left_justify()
        .color(palette.primary_text)
        .font_size(16);
    draw.text(&view.zone.country)
        .x_y(x - 10.0, rect.top() - 42.0)
        .w(CARD_WIDTH - 52.0)
        .left_justify()
        .color(palette.secondary_text)
        .font_size(11);

    // The host zone has no remove control
    if !display.is_user_zone {
        let button = remove_button_rect(rect);
        let alpha = if view.hovered { 255 } else { 140 };
        draw.text("×")
            .xy(button.xy())
            .wh(button.wh())
            .color(with_alpha(palette.secondary_text, alpha))
            .font_size(18);
    }

    // Emoji, with the phase name beneath in case the font lacks the glyph
    draw.text(display.phase.emoji())
        .x_y(text_left + 18.0, y + 2.0)
        .color(palette.primary_text)
        .font_size(26);
    draw.text(display.phase.label())
        .x_y(text_left + 18.0, y - 22.0)
        .w(70.0)
        .color(palette.secondary_text)
        .font_size(9);

    // Time, lifted slightly while the update flash runs
    let time_color = mix(palette.time_text, palette.accent, view.flash * 0.6);
    draw.text(&display.time)
        .x_y(x + 30.0, y + 8.0 + view.flash * 3.0)
        .w(CARD_WIDTH - 90.0)
        .color(time_color)
        .font_size(30);
    draw.text(&display.date)
        .x_y(x + 30.0, y - 20.0)
        .w(CARD_WIDTH - 90.0)
        .color(palette.secondary_text)
        .font_size(12);

    draw_seconds_indicator(
        draw,
        pt2(x + CARD_WIDTH * 0.5 - 18.0, y + 8.0),
        display.seconds_phase_ms,
        palette,
        animation_time,
    );

    // Badges
    let mut badge_x = text_left;
    let badge_y = rect.bottom() + 20.0;
    if display.is_working_hours {
        badge_x += draw_badge(draw, badge_x, badge_y, "Working Hours", palette.badge_working);
    }
    if display.is_user_zone {
        draw_badge(draw, badge_x, badge_y, "Your Timezone", palette.badge_user);
    }
}

/// Pulsing dot offset by the zone's seconds phase
fn draw_seconds_indicator(
    draw: &Draw,
    pos: Point2,
    seconds_phase_ms: f64,
    palette: &Palette,
    animation_time: f32,
) {
    let period_ms = 1000.0;
    let t = ((animation_time as f64 * 1000.0 + seconds_phase_ms) % period_ms) / period_ms;
    let pulse = (t as f32 * TAU).sin() * 0.5 + 0.5;
    draw.ellipse()
        .xy(pos)
        .radius(2.5 + pulse * 1.5)
        .color(with_alpha(palette.accent, (90.0 + pulse * 165.0) as u8));
}

/// Draw a badge with its left edge at `x`; returns the width used
fn draw_badge(draw: &Draw, x: f32, y: f32, text: &str, color: Srgb<u8>) -> f32 {
    let width = text.chars().count() as f32 * 6.5 + 16.0;
    draw.rect()
        .x_y(x + width / 2.0, y)
        .w_h(width, 18.0)
        .color(with_alpha(color, 40));
    draw.text(text)
        .x_y(x + width / 2.0, y)
        .w(width)
        .color(color)
        .font_size(10);
    width + 6.0
}

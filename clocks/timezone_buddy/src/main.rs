//! TimeZone Buddy
//!
//! A grid of city cards showing the current time in each selected zone,
//! with an hour offset for planning ahead and a shareable link that
//! reproduces the selection elsewhere.

mod cards;
mod clipboard;
mod drawing;
mod settings;
mod ui;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nannou::prelude::*;
use nannou_egui::{self, Egui};
use shared::{
    offset_banner, system_timezone, Catalog, Clock, Command, Effect, FileStore, HttpRegistry,
    KeyValueStore, LaunchLocation, MemoryStore, RenderCache, Session, StateCodec,
    SystemClock, Ticker, VisitorRegistry, VisitorSync,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cards::{remove_button_rect, Drag, GridLayout};
use crate::clipboard::SystemClipboard;
use crate::drawing::Palette;
use crate::settings::Settings;
use crate::ui::{Modals, SearchState, Toasts};

const APP_NAME: &str = "timezone_buddy";
const SIDEBAR_WIDTH: f32 = 300.0;
const HEADER_HEIGHT: f32 = 110.0;

#[derive(Parser, Debug)]
#[command(name = "timezone-buddy", about = "World clock cards with shareable links")]
struct Cli {
    /// Share link (or bare token) to open with
    #[arg(long)]
    link: Option<String>,

    /// Directory for saved state instead of the platform data dir
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    nannou::app(model).update(update).run();
}

/// Application state
pub struct Model {
    session: Session,
    settings: Settings,
    clock: SystemClock,

    // Rendering
    cache: RenderCache,
    ticker: Ticker,
    /// App time at which each zone's text last changed
    changed_at: HashMap<String, f32>,

    // Interaction state
    drag: Option<Drag>,
    hovered: Option<usize>,
    pointer_over_ui: bool,
    text_input_focused: bool,
    clipboard: SystemClipboard,

    // UI state
    search: SearchState,
    modals: Modals,
    toasts: Toasts,

    // egui integration
    egui: Egui,
}

impl Model {
    fn layout(&self, window_rect: Rect) -> GridLayout {
        GridLayout::calculate(window_rect, SIDEBAR_WIDTH, HEADER_HEIGHT)
    }

    /// Send a command to the session and react to its effect
    fn dispatch(&mut self, command: Command, time: f32) {
        let outcome = self.session.dispatch(command, self.clock.now());
        match outcome.effect {
            Effect::Rebuild | Effect::TimesOnly => {
                self.refresh_times(time);
                self.hovered = None;
            }
            Effect::Reskin | Effect::Unchanged => {}
        }
        if let Some(notice) = outcome.notice {
            self.toasts.push(notice, time);
        }
    }

    /// Recompute every card and mark the ones whose text changed
    fn refresh_times(&mut self, time: f32) {
        let model = self.session.model();
        let changed = self.cache.refresh(
            model.zones(),
            self.clock.now(),
            model.hour_offset,
            self.session.host_zone(),
        );
        for id in changed {
            self.changed_at.insert(id, time);
        }
        self.changed_at
            .retain(|id, _| self.session.model().contains(id));
    }

    fn copy_share_link(&mut self, time: f32) {
        let notice = clipboard::copy_share_link_notice(
            &self.session,
            &self.settings.share_base_url,
            &mut self.clipboard,
        );
        self.toasts.push(notice, time);
    }

    fn open_dashboard(&mut self) {
        let dashboard = self.session.open_dashboard(self.clock.now());
        self.modals.dashboard = Some(dashboard);
    }
}

fn open_store(data_dir: Option<PathBuf>) -> Box<dyn KeyValueStore> {
    let opened = match data_dir {
        Some(dir) => FileStore::open(dir),
        None => FileStore::open_default(),
    };
    match opened {
        Ok(store) => {
            info!(dir = %store.dir().display(), "Using state directory");
            Box::new(store)
        }
        Err(e) => {
            warn!("Failed to open state directory, changes will not be kept: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn visitor_sync(settings: &Settings) -> VisitorSync {
    let registry = settings.registry.as_ref().map(|registry| {
        let key = settings.registry_key();
        if key.is_none() {
            warn!(var = %registry.key_env, "Registry key not set, writes may be rejected");
        }
        Arc::new(HttpRegistry::new(registry.url.clone(), key)) as Arc<dyn VisitorRegistry>
    });
    VisitorSync::new(registry)
}

fn model(app: &App) -> Model {
    app.set_exit_on_escape(false);
    let cli = Cli::parse();

    let window_id = app
        .new_window()
        .title("TimeZone Buddy")
        .size(1280, 800)
        .min_size(720, 480)
        .view(view)
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_moved(mouse_moved)
        .raw_event(raw_window_event)
        .build()
        .unwrap();

    let window = app.window(window_id).unwrap();
    let egui = Egui::from_window(&window);

    // Load configuration
    let settings: Settings = match shared::load_config(APP_NAME) {
        Ok(settings) => settings.unwrap_or_default(),
        Err(e) => {
            warn!("Failed to load settings, using defaults: {}", e);
            Settings::default()
        }
    };

    let host = system_timezone();
    info!(zone = %host.name(), "Detected host time zone");

    let clock = SystemClock;
    let codec = StateCodec::new(Catalog::builtin(), host.name());
    let location = LaunchLocation::from_link(cli.link.as_deref());
    let (session, notices) = Session::start(
        codec,
        open_store(cli.data_dir),
        Box::new(location),
        visitor_sync(&settings),
        clock.now(),
    );

    let mut toasts = Toasts::default();
    for notice in notices {
        toasts.push(notice, 0.0);
    }
    let modals = Modals {
        name_open: session.needs_user_name(),
        ..Default::default()
    };

    let mut model = Model {
        session,
        settings,
        clock,
        cache: RenderCache::new(),
        ticker: Ticker::every_second(),
        changed_at: HashMap::new(),
        drag: None,
        hovered: None,
        pointer_over_ui: false,
        text_input_focused: false,
        clipboard: SystemClipboard::default(),
        search: SearchState::default(),
        modals,
        toasts,
        egui,
    };
    model.refresh_times(0.0);
    model
}

fn update(app: &App, model: &mut Model, update: Update) {
    let time = app.time;

    if model.ticker.poll(model.clock.now()).is_some() {
        model.refresh_times(time);
    }
    model.session.poll_visitors();
    model.toasts.expire(time);

    // Begin egui frame
    model.egui.set_elapsed_time(update.since_start);
    let ctx = model.egui.begin_frame();
    ui::apply_theme(&ctx, model.session.model().theme);

    let panel = ui::draw_side_panel(
        &ctx,
        &mut model.search,
        &model.session,
        &model.settings,
        SIDEBAR_WIDTH,
    );
    let submitted_name = ui::draw_name_prompt(&ctx, &mut model.modals);
    ui::draw_about(&ctx, &mut model.modals.about_open);
    let dashboard_closed = model
        .modals
        .dashboard
        .as_ref()
        .map_or(false, |d| !ui::draw_dashboard(&ctx, d, model.session.visitor_list()));
    if dashboard_closed {
        model.modals.dashboard = None;
    }
    model.toasts.draw(&ctx);

    model.text_input_focused = ctx.wants_keyboard_input();
    model.pointer_over_ui = ctx.is_pointer_over_area() || ctx.wants_pointer_input();
    drop(ctx);

    // Apply UI results
    if let Some(command) = panel.command {
        model.dispatch(command, time);
    }
    if let Some(name) = submitted_name {
        let notice = model.session.submit_user_name(&name, model.clock.now());
        if model.session.user_name().is_some() {
            model.modals.name_open = false;
        }
        model.toasts.push(notice, time);
    }
    if panel.copy_link {
        model.copy_share_link(time);
    }
    if panel.open_about {
        model.modals.about_open = true;
    }
    if panel.open_dashboard {
        model.open_dashboard();
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let window_rect = app.window_rect();
    let palette = Palette::for_theme(model.session.model().theme);
    let layout = model.layout(window_rect);

    draw.background().color(palette.background);

    let banner = offset_banner(model.session.model().hour_offset);
    drawing::draw_header(&draw, &layout, &palette, banner.as_deref());

    let zones = model.session.model().zones();
    if zones.is_empty() {
        drawing::draw_welcome(&draw, &layout, &palette);
    } else {
        drawing::draw_cards(
            &draw,
            &layout,
            zones,
            model.cache.displays(),
            &palette,
            model.hovered,
            model.drag.as_ref(),
            &model.changed_at,
            app.time,
        );
    }

    // Render to frame
    draw.to_frame(app, &frame).unwrap();

    // Render egui on top
    model.egui.draw_to_frame(&frame).unwrap();
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    // Typing into a text field never triggers shortcuts
    if model.text_input_focused {
        return;
    }

    match key {
        // A - jump to city search
        Key::A => {
            model.search.focus_requested = true;
        }

        // T - toggle theme
        Key::T => {
            model.dispatch(Command::ToggleTheme, app.time);
        }

        // S - copy share link
        Key::S => {
            model.copy_share_link(app.time);
        }

        // Escape - close windows
        Key::Escape => {
            model.modals.close_dismissable();
        }

        _ => {}
    }
}

fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left || model.pointer_over_ui {
        return;
    }

    let pos = app.mouse.position();
    let layout = model.layout(app.window_rect());
    let zones = model.session.model().zones();
    let Some(index) = layout.hit_test(pos, zones.len()) else {
        return;
    };
    let zone = &zones[index];

    let is_user_zone = zone.timezone == model.session.host_zone();
    if !is_user_zone && remove_button_rect(layout.card_rect(index)).contains(pos) {
        let id = zone.id.clone();
        model.dispatch(Command::RemoveZone(id), app.time);
        return;
    }

    model.drag = Some(Drag::new(zone.id.clone(), pos));
}

fn mouse_released(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }
    let Some(drag) = model.drag.take() else {
        return;
    };

    let pos = app.mouse.position();
    let layout = model.layout(app.window_rect());
    let zones = model.session.model().zones();
    let target = layout
        .hit_test(pos, zones.len())
        .map(|i| zones[i].id.clone());

    if let Some(command) = drag.drop_on(target.as_deref()) {
        model.dispatch(command, app.time);
    }
}

fn mouse_moved(app: &App, model: &mut Model, pos: Point2) {
    if let Some(drag) = model.drag.as_mut() {
        drag.pointer = pos;
    }

    model.hovered = if model.pointer_over_ui {
        None
    } else {
        let layout = model.layout(app.window_rect());
        layout.hit_test(pos, model.session.model().len())
    };
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);

    if let nannou::winit::event::WindowEvent::Focused(true) = event {
        // Catch up immediately after the window was in the background
        model.ticker.reset();
    }
}
